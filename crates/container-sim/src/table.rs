//! Game table management.

use container_core::rng::fold_seed;
use container_core::{
    AvailableMoves, Bot, BotStyle, GameError, GameEvent, GameOptions, GameState, LogItem, Move,
    PlayerId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("A table seats 2-5 players, not {0}")]
    PlayerCount(usize),

    #[error("No player {0} at this table")]
    NoSuchPlayer(PlayerId),

    #[error("No bot is seated for player {0}")]
    NoBot(PlayerId),

    #[error("Bot for player {0} found no move")]
    BotStuck(PlayerId),

    #[error(transparent)]
    Game(#[from] GameError),
}

/// A redacted window of the log, with the moves each player had at its end
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogSlice {
    pub log: Vec<LogItem>,
    pub available_moves: Vec<Option<AvailableMoves>>,
}

/// One game with its seats and pending announcements
pub struct Table {
    pub game: GameState,
    bots: Vec<Option<Bot>>,
    messages: Vec<String>,
}

impl Table {
    pub fn new(players: usize, seed: String) -> Result<Self, TableError> {
        if !(2..=5).contains(&players) {
            return Err(TableError::PlayerCount(players));
        }
        let game = GameState::setup(players, GameOptions::default(), Some(seed));
        info!(players, seed = %game.seed, "table opened");

        Ok(Self {
            game,
            bots: (0..players).map(|_| None).collect(),
            messages: Vec::new(),
        })
    }

    /// A table where every seat is played by a seeded trader bot
    pub fn with_bots(players: usize, seed: String) -> Result<Self, TableError> {
        let base = fold_seed(&seed);
        let mut table = Self::new(players, seed)?;
        for player in 0..players as PlayerId {
            table.seat_bot(player, BotStyle::Trader, base.wrapping_add(player as u64))?;
            table.set_player_meta(player, format!("Trader {}", player + 1))?;
        }
        Ok(table)
    }

    pub fn seat_bot(&mut self, player: PlayerId, style: BotStyle, seed: u64) -> Result<(), TableError> {
        let seat = self
            .bots
            .get_mut(player as usize)
            .ok_or(TableError::NoSuchPlayer(player))?;
        *seat = Some(Bot::with_seed(player, style, seed));
        if let Some(p) = self.game.players.get_mut(player as usize) {
            p.is_ai = true;
        }
        Ok(())
    }

    pub fn set_player_meta(&mut self, player: PlayerId, name: impl Into<String>) -> Result<(), TableError> {
        let p = self
            .game
            .players
            .get_mut(player as usize)
            .ok_or(TableError::NoSuchPlayer(player))?;
        p.name = name.into();
        Ok(())
    }

    /// Apply a move and queue a `Round N` message for every round it started
    pub fn play(&mut self, player: PlayerId, mv: Move) -> Result<Vec<LogItem>, TableError> {
        let index = self.game.log.len();
        let entries = self.game.apply_move(player, mv)?;

        for item in self.game.log.get(index..).unwrap_or_default() {
            if let LogItem::Event {
                event: GameEvent::RoundStart { round },
            } = item
            {
                self.messages.push(format!("Round {round}"));
            }
        }
        Ok(entries)
    }

    /// Let the seated bot of the current player move
    pub fn play_bot(&mut self) -> Result<Option<Move>, TableError> {
        let Some(player) = self.game.current_player else {
            return Ok(None);
        };
        let bot = self
            .bots
            .get_mut(player as usize)
            .and_then(Option::as_mut)
            .ok_or(TableError::NoBot(player))?;
        let mv = bot
            .choose_move(&self.game)
            .ok_or(TableError::BotStuck(player))?;

        debug!(player, name = %mv.name(), "bot move");
        self.play(player, mv.clone())?;
        Ok(Some(mv))
    }

    /// Play bot moves until the game ends or `max_moves` have been made
    pub fn play_to_end(&mut self, max_moves: usize) -> Result<usize, TableError> {
        let mut moves = 0;
        while moves < max_moves && self.play_bot()?.is_some() {
            moves += 1;
        }
        info!(moves, ended = self.ended(), round = self.round(), "table finished");
        Ok(moves)
    }

    /// Take the pending messages
    pub fn messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    /// Rank of each player (1 is best): more money first, then more island cargo
    pub fn rankings(&self) -> Vec<usize> {
        let mut order: Vec<_> = self.game.players.iter().collect();
        order.sort_by(|a, b| {
            b.money
                .cmp(&a.money)
                .then(b.containers_on_island.len().cmp(&a.containers_on_island.len()))
        });

        self.game
            .players
            .iter()
            .map(|p| order.iter().position(|o| o.id == p.id).map_or(0, |i| i + 1))
            .collect()
    }

    /// Rebuild the game from its seed and move history
    pub fn replay(&mut self) -> Result<(), TableError> {
        self.game = self.game.replay()?;
        Ok(())
    }

    pub fn drop_player(&mut self, player: PlayerId) -> Result<(), TableError> {
        let p = self
            .game
            .players
            .get_mut(player as usize)
            .ok_or(TableError::NoSuchPlayer(player))?;
        p.is_dropped = true;
        info!(player, "player dropped");
        Ok(())
    }

    pub fn current_player(&self) -> Option<PlayerId> {
        self.game.current_player
    }

    pub fn round(&self) -> u32 {
        self.game.round
    }

    pub fn ended(&self) -> bool {
        self.game.ended()
    }

    pub fn log_length(&self) -> usize {
        self.game.log.len()
    }

    /// Log entries `start..end` as `viewer` sees them.
    ///
    /// With an `end`, the available moves are those of the game rebuilt from
    /// the first `end` entries.
    pub fn log_slice(
        &self,
        viewer: Option<PlayerId>,
        start: usize,
        end: Option<usize>,
    ) -> Result<LogSlice, TableError> {
        let stripped = self.game.strip_secret(viewer);
        let len = stripped.log.len();
        let end_index = end.unwrap_or(len).min(len);
        let log = stripped
            .log
            .get(start.min(end_index)..end_index)
            .map(<[LogItem]>::to_vec)
            .unwrap_or_default();

        let available_moves = match end {
            None => stripped.players.iter().map(|p| p.available_moves.clone()).collect(),
            Some(_) => {
                let prefix = self.game.log.get(..end_index).unwrap_or_default();
                let rebuilt = GameState::reconstruct(self.game.base_state(), prefix)?;
                rebuilt
                    .strip_secret(viewer)
                    .players
                    .into_iter()
                    .map(|p| p.available_moves)
                    .collect()
            }
        };

        Ok(LogSlice {
            log,
            available_moves,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(players: usize) -> Table {
        Table::with_bots(players, "table".to_string()).unwrap()
    }

    #[test]
    fn test_create_table() {
        let table = table(3);
        assert_eq!(table.game.player_count(), 3);
        assert_eq!(table.round(), 1);
        assert_eq!(table.log_length(), 1);
        assert_eq!(table.game.players[1].name, "Trader 2");
        assert!(table.game.players.iter().all(|p| p.is_ai));

        assert!(matches!(
            Table::new(6, "x".to_string()),
            Err(TableError::PlayerCount(6))
        ));
    }

    #[test]
    fn test_set_player_meta() {
        let mut table = Table::new(2, "meta".to_string()).unwrap();
        table.set_player_meta(0, "Alice").unwrap();
        assert_eq!(table.game.players[0].name, "Alice");
        assert_eq!(table.game.players[1].name, "Player 2");
        assert!(matches!(
            table.set_player_meta(4, "Nobody"),
            Err(TableError::NoSuchPlayer(4))
        ));
    }

    #[test]
    fn test_round_messages_are_collected_and_drained() {
        let mut table = Table::new(2, "rounds".to_string()).unwrap();
        for _ in 0..2 {
            let player = table.current_player().unwrap();
            table.play(player, Move::Pass).unwrap();
        }

        assert_eq!(table.round(), 2);
        assert_eq!(table.messages(), vec!["Round 2".to_string()]);
        assert!(table.messages().is_empty());
    }

    #[test]
    fn test_play_rejects_illegal_moves() {
        let mut table = Table::new(2, "illegal".to_string()).unwrap();
        let player = table.current_player().unwrap();
        let result = table.play(player, Move::PayLoan);
        assert!(matches!(result, Err(TableError::Game(GameError::Illegal(_)))));
    }

    #[test]
    fn test_seat_without_bot() {
        let mut table = Table::new(2, "empty".to_string()).unwrap();
        let player = table.current_player().unwrap();
        assert!(matches!(table.play_bot(), Err(TableError::NoBot(p)) if p == player));
    }

    #[test]
    fn test_rankings() {
        let mut table = table(3);
        table.game.players[0].money = 10;
        table.game.players[1].money = 30;
        table.game.players[2].money = 10;
        table.game.players[2].containers_on_island =
            table.game.containers_left.iter().take(2).copied().collect();

        assert_eq!(table.rankings(), vec![3, 1, 2]);
    }

    #[test]
    fn test_drop_player() {
        let mut table = table(2);
        table.drop_player(1).unwrap();
        assert!(table.game.players[1].is_dropped);
        assert!(table.drop_player(2).is_err());
    }

    #[test]
    fn test_bots_play_and_replay() {
        let mut table = table(3);
        let moves = table.play_to_end(300).unwrap();
        assert!(moves > 0);

        let before = table.game.clone();
        table.replay().unwrap();
        assert_eq!(table.game, before);
    }

    #[test]
    fn test_log_slice() {
        let mut table = table(3);
        table.play_to_end(40).unwrap();
        let len = table.log_length();

        let full = table.log_slice(Some(0), 0, None).unwrap();
        assert_eq!(full.log.len(), len);
        assert_eq!(full.available_moves.len(), 3);

        let head = table.log_slice(Some(0), 0, Some(1)).unwrap();
        assert_eq!(head.log, vec![LogItem::event(GameEvent::GameStart)]);
        let fresh = table.game.base_state();
        let starter = fresh.current_player.unwrap() as usize;
        assert_eq!(
            head.available_moves[starter].is_some(),
            fresh.players[starter].available_moves.is_some()
        );

        let window = table.log_slice(None, 1, Some(3)).unwrap();
        assert_eq!(window.log.len(), 2);
    }
}
