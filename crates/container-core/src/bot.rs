//! Convenience bot players.
//!
//! This module provides two styles of automated player:
//! - Random: any legal move with a random argument and price
//! - Trader: simple trading heuristics (loan when poor, repay when rich,
//!   ship cargo to the island, shop at a harbor right after sailing there)
//!
//! Neither style is meant to play well, only to keep a table moving.

use crate::game::{GameState, Phase};
use crate::moves::{AvailableMoves, Move, MoveName};
use crate::pieces::PlayerId;
use crate::player::{Chain, Player, ShipPosition, SHIP_CAPACITY};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Attempts before falling back to the first sensible move
const MAX_RETRIES: usize = 30;

/// Bot playing style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotStyle {
    Random,
    Trader,
}

/// A bot player that can decide on moves
pub struct Bot {
    pub player_id: PlayerId,
    pub style: BotStyle,
    rng: StdRng,
}

impl Bot {
    pub fn new(player_id: PlayerId, style: BotStyle) -> Self {
        Self {
            player_id,
            style,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(player_id: PlayerId, style: BotStyle, seed: u64) -> Self {
        Self {
            player_id,
            style,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose a legal move, or `None` if it is not this bot's turn
    pub fn choose_move(&mut self, game: &GameState) -> Option<Move> {
        if game.current_player != Some(self.player_id) {
            return None;
        }
        let player = game.get_player(self.player_id)?;
        let available = game.available_moves(self.player_id);
        if available.is_empty() {
            return None;
        }

        let chosen = match self.style {
            BotStyle::Random => self.choose_random(player, &available),
            BotStyle::Trader => self.choose_trader(game, player, &available),
        };
        chosen.or_else(|| fallback(&available))
    }

    fn choose_random(&mut self, player: &Player, available: &AvailableMoves) -> Option<Move> {
        let names: Vec<MoveName> = available
            .names()
            .into_iter()
            .filter(|name| *name != MoveName::Undo)
            .collect();
        let name = *names.choose(&mut self.rng)?;
        self.build(player, available, name)
    }

    fn choose_trader(
        &mut self,
        game: &GameState,
        player: &Player,
        available: &AvailableMoves,
    ) -> Option<Move> {
        let names = available.names();

        for retry in 0..MAX_RETRIES {
            if player.actions > 0 && player.money < 5 && available.get_loan {
                return Some(Move::GetLoan);
            }
            if player.money > 15 && available.pay_loan {
                return Some(Move::PayLoan);
            }

            if game.phase == Phase::Move
                && player.actions > 0
                && !player.ship.containers.is_empty()
                && !player.chain.is_buying_from_warehouse()
            {
                let destination = if player.ship.position == ShipPosition::OpenSea {
                    ShipPosition::Island
                } else {
                    ShipPosition::OpenSea
                };
                let mv = Move::Sail { destination };
                if available.permits(&mv).is_ok() {
                    return Some(mv);
                }
            }

            // Just docked at a harbor with goods for sale
            let name = if player.chain == Chain::Sailed
                && player.ship.containers.len() < SHIP_CAPACITY
                && available.buy_from_warehouse.is_some()
            {
                MoveName::BuyFromWarehouse
            } else {
                *names.choose(&mut self.rng)?
            };

            let Some(mv) = self.build(player, available, name) else {
                continue;
            };
            if self.sensible(game, player, &mv, retry, names.len()) {
                return Some(mv);
            }
        }
        None
    }

    /// Whether the trader is willing to make `mv`
    fn sensible(
        &self,
        game: &GameState,
        player: &Player,
        mv: &Move,
        retry: usize,
        options: usize,
    ) -> bool {
        match mv {
            Move::Undo | Move::GetLoan | Move::PayLoan => false,
            Move::Sail { destination } => match destination {
                ShipPosition::Island => !player.ship.containers.is_empty(),
                ShipPosition::Harbor { owner, .. } => game
                    .get_player(*owner)
                    .is_some_and(|o| !o.containers_on_warehouse_store.is_empty()),
                ShipPosition::OpenSea => player.chain != Chain::Sailed,
            },
            Move::ArrangeFactory { .. } => player.chain == Chain::Producing,
            Move::ArrangeWarehouse { .. } => player.chain.is_buying_from_factory(),
            Move::Produce { .. } => player.factories.len() >= 2,
            Move::BuyFromFactory { .. } => player.warehouses.len() >= 2,
            Move::Pass => retry >= 10 || player.actions == 0 || options <= 3,
            Move::BuyFactory { .. } => player.factories.len() != 3 && player.money >= 15,
            Move::BuyWarehouse => player.warehouses.len() != 3 && player.money >= 17,
            Move::DomesticSale { .. } => player.money <= 5,
            _ => true,
        }
    }

    /// A concrete move of kind `name` with a random argument and price
    fn build(&mut self, player: &Player, available: &AvailableMoves, name: MoveName) -> Option<Move> {
        let mv = match name {
            MoveName::DomesticSale => Move::DomesticSale {
                piece: *available.domestic_sale.as_ref()?.choose(&mut self.rng)?,
            },
            MoveName::BuyFromFactory => Move::BuyFromFactory {
                offer: *available.buy_from_factory.as_ref()?.choose(&mut self.rng)?,
                price: self.rng.gen_range(2..=4),
            },
            MoveName::BuyFromWarehouse => Move::BuyFromWarehouse {
                offer: *available.buy_from_warehouse.as_ref()?.choose(&mut self.rng)?,
            },
            MoveName::BuyFactory => Move::BuyFactory {
                color: *available.buy_factory.as_ref()?.choose(&mut self.rng)?,
            },
            MoveName::BuyWarehouse => Move::BuyWarehouse,
            MoveName::GetLoan => Move::GetLoan,
            MoveName::PayLoan => Move::PayLoan,
            MoveName::Produce => Move::Produce {
                color: *available.produce.as_ref()?.choose(&mut self.rng)?,
                price: self.rng.gen_range(1..=3),
            },
            MoveName::Sail => Move::Sail {
                destination: *available.sail.as_ref()?.choose(&mut self.rng)?,
            },
            MoveName::ArrangeFactory => Move::ArrangeFactory {
                piece: *available.arrange_factory.as_ref()?.choose(&mut self.rng)?,
                price: self.rng.gen_range(1..=3),
            },
            MoveName::ArrangeWarehouse => Move::ArrangeWarehouse {
                piece: *available.arrange_warehouse.as_ref()?.choose(&mut self.rng)?,
                price: self.rng.gen_range(2..=4),
            },
            MoveName::Bid => Move::Bid {
                price: self.bid_price(player),
            },
            MoveName::Accept => Move::Accept {
                bidder: *available.accept.as_ref()?.choose(&mut self.rng)?,
            },
            MoveName::Decline => Move::Decline,
            MoveName::Pass => Move::Pass,
            MoveName::Undo => Move::Undo,
        };
        available.permits(&mv).ok().map(|()| mv)
    }

    /// Random bid within what the player can still cover, halved when large
    fn bid_price(&mut self, player: &Player) -> u32 {
        let room = player.money - player.bid as i32;
        if room <= 0 {
            return 0;
        }
        let bid = self.rng.gen_range(0..room) as u32;
        if bid > 10 {
            (bid + 1) / 2
        } else {
            bid
        }
    }
}

/// First move that neither undoes nor borrows, else anything legal
fn fallback(available: &AvailableMoves) -> Option<Move> {
    let moves = available.moves(0);
    moves
        .iter()
        .find(|mv| !matches!(mv, Move::Undo | Move::GetLoan | Move::PayLoan))
        .or_else(|| moves.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameOptions;

    fn game(seed: &str) -> GameState {
        GameState::setup(3, GameOptions::default(), Some(seed.to_string()))
    }

    #[test]
    fn test_bot_creation() {
        let bot = Bot::new(1, BotStyle::Trader);
        assert_eq!(bot.player_id, 1);
        assert_eq!(bot.style, BotStyle::Trader);
    }

    #[test]
    fn test_bot_waits_for_its_turn() {
        let state = game("wait");
        let other = (state.current_player.unwrap() + 1) % 3;
        let mut bot = Bot::with_seed(other, BotStyle::Random, 1);
        assert_eq!(bot.choose_move(&state), None);
    }

    #[test]
    fn test_bot_moves_are_legal() {
        for style in [BotStyle::Random, BotStyle::Trader] {
            let mut state = game("legal");
            let mut bots: Vec<Bot> = (0..3).map(|p| Bot::with_seed(p, style, p as u64)).collect();

            for _ in 0..200 {
                let Some(current) = state.current_player else {
                    break;
                };
                let mv = bots[current as usize].choose_move(&state).unwrap();
                assert_ne!(mv, Move::Undo);
                state.apply_move(current, mv).unwrap();
            }
        }
    }

    #[test]
    fn test_trader_takes_loan_when_poor() {
        let mut state = game("poor");
        let me = state.current_player.unwrap();
        state.players[me as usize].money = 3;
        let mut bot = Bot::with_seed(me, BotStyle::Trader, 7);
        assert_eq!(bot.choose_move(&state), Some(Move::GetLoan));
    }

    #[test]
    fn test_trader_ships_cargo_to_island() {
        let mut state = game("cargo");
        let me = state.current_player.unwrap();
        let piece = state.containers_left.take_last().unwrap();
        state.players[me as usize].ship.containers.push(piece);
        let mut bot = Bot::with_seed(me, BotStyle::Trader, 7);
        assert_eq!(
            bot.choose_move(&state),
            Some(Move::Sail {
                destination: ShipPosition::Island
            })
        );
    }

    #[test]
    fn test_bid_price_never_exceeds_money() {
        let state = game("bids");
        let player = &state.players[0];
        let mut bot = Bot::with_seed(0, BotStyle::Trader, 3);
        for _ in 0..100 {
            assert!(bot.bid_price(player) < 20);
        }
    }
}
