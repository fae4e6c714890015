//! Game log entries.
//!
//! The log is the source of truth for a game: replaying its move entries
//! against a freshly seeded state rebuilds the state exactly.

use crate::game::Phase;
use crate::moves::Move;
use crate::pieces::PlayerId;
use serde::{Deserialize, Serialize};

/// Events emitted by the engine itself
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum GameEvent {
    GameStart,
    /// Interest paid or assets seized for a player's loans
    Upkeep {
        message: String,
    },
    RoundStart {
        round: u32,
    },
    GameEnd,
}

/// One entry of the game log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LogItem {
    Event {
        event: GameEvent,
    },
    /// The game entered this phase
    Phase {
        phase: Phase,
    },
    Move {
        player: PlayerId,
        #[serde(rename = "move")]
        mv: Move,
        /// Plain text description
        simple: String,
        /// Description with colored HTML spans
        pretty: String,
    },
}

impl LogItem {
    pub fn event(event: GameEvent) -> Self {
        LogItem::Event { event }
    }

    /// The player and move, if this is a move entry
    pub fn as_move(&self) -> Option<(PlayerId, &Move)> {
        match self {
            LogItem::Move { player, mv, .. } => Some((*player, mv)),
            _ => None,
        }
    }

    pub fn is_move_by(&self, player: PlayerId) -> bool {
        matches!(self.as_move(), Some((p, _)) if p == player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_item_json_shape() {
        let item = LogItem::Move {
            player: 2,
            mv: Move::Pass,
            simple: "Player 3 passed".to_string(),
            pretty: "Player 3 passed".to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "move");
        assert_eq!(json["player"], 2);
        assert_eq!(json["move"]["name"], "pass");

        let event = serde_json::to_value(LogItem::event(GameEvent::RoundStart { round: 3 })).unwrap();
        assert_eq!(event["type"], "event");
        assert_eq!(event["event"]["name"], "RoundStart");
        assert_eq!(event["event"]["round"], 3);
    }

    #[test]
    fn test_is_move_by() {
        let item = LogItem::Move {
            player: 1,
            mv: Move::GetLoan,
            simple: String::new(),
            pretty: String::new(),
        };
        assert!(item.is_move_by(1));
        assert!(!item.is_move_by(0));
        assert!(!LogItem::event(GameEvent::GameStart).is_move_by(1));
        assert_eq!(item.as_move(), Some((1, &Move::GetLoan)));
    }
}
