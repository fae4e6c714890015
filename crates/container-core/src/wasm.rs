//! WebAssembly bindings for the Container engine.
//!
//! This module exposes the game engine to JavaScript through wasm-bindgen.
//! Everything crosses the boundary as JSON.

use wasm_bindgen::prelude::*;

use crate::bot::{Bot, BotStyle};
use crate::game::{GameOptions, GameState};
use crate::moves::Move;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// WASM-exposed game wrapper
#[wasm_bindgen]
pub struct WasmGame {
    state: GameState,
}

#[wasm_bindgen]
impl WasmGame {
    /// Create a new game; an empty seed picks a random one
    #[wasm_bindgen(constructor)]
    pub fn new(player_count: u8, seed: &str) -> Result<WasmGame, JsValue> {
        if !(2..=5).contains(&player_count) {
            return Err(JsValue::from_str("Must have 2-5 players"));
        }
        let seed = (!seed.is_empty()).then(|| seed.to_string());

        Ok(WasmGame {
            state: GameState::setup(player_count as usize, GameOptions::default(), seed),
        })
    }

    /// The state as seen by `viewer` (omit for a spectator view)
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self, viewer: Option<u8>) -> String {
        serde_json::to_string(&self.state.strip_secret(viewer)).unwrap_or_else(|_| "{}".to_string())
    }

    #[wasm_bindgen(js_name = getCurrentPlayer)]
    pub fn get_current_player(&self) -> Option<u8> {
        self.state.current_player
    }

    /// Legal moves for a player as JSON
    #[wasm_bindgen(js_name = availableMoves)]
    pub fn available_moves(&self, player: u8) -> String {
        serde_json::to_string(&self.state.available_moves(player))
            .unwrap_or_else(|_| "{}".to_string())
    }

    /// Apply a move from JSON, returns the new public log entries as JSON
    #[wasm_bindgen(js_name = applyMove)]
    pub fn apply_move(&mut self, player: u8, move_json: &str) -> Result<String, JsValue> {
        let mv: Move = serde_json::from_str(move_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid move JSON: {}", e)))?;

        match self.state.apply_move(player, mv) {
            Ok(entries) => Ok(serde_json::to_string(&entries).unwrap_or_else(|_| "[]".to_string())),
            Err(e) => Err(JsValue::from_str(&format!("Move failed: {}", e))),
        }
    }

    pub fn ended(&self) -> bool {
        self.state.ended()
    }

    /// Suggested move for a player, or `null` when it is not their turn
    #[wasm_bindgen(js_name = getBotMove)]
    pub fn get_bot_move(&self, player: u8) -> String {
        let mut bot = Bot::new(player, BotStyle::Trader);
        match bot.choose_move(&self.state) {
            Some(mv) => serde_json::to_string(&mv).unwrap_or_else(|_| "null".to_string()),
            None => "null".to_string(),
        }
    }
}
