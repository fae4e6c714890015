//! Human-readable log lines.
//!
//! Each log entry carries two renderings of the same sentence: plain text and
//! a "pretty" one where player names and container colors are wrapped in
//! colored HTML spans. `Line` builds both at once.

use crate::pieces::ContainerColor;
use crate::player::{Player, ShipPosition};

/// Seat colors used to highlight player names
pub const PLAYER_COLORS: [&str; 5] = ["dodgerblue", "red", "yellow", "limegreen", "mediumorchid"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    simple: String,
    pretty: String,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: impl AsRef<str>) -> Self {
        self.simple.push_str(text.as_ref());
        self.pretty.push_str(text.as_ref());
        self
    }

    pub fn player(mut self, player: &Player) -> Self {
        let seat = PLAYER_COLORS[player.id as usize % PLAYER_COLORS.len()];
        self.simple.push_str(&player.name);
        self.pretty.push_str(&format!(
            "<span style=\"background-color: {seat}; font-weight: bold; padding: 0 3px;\">{}</span>",
            player.name
        ));
        self
    }

    pub fn color(mut self, color: ContainerColor) -> Self {
        self.simple.push_str(color.name());
        self.pretty.push_str(&format!(
            "<span style=\"background-color: {}; font-weight: bold; border: 1px solid black; padding: 0 3px;\">{}</span>",
            color.css(),
            color.name()
        ));
        self
    }

    /// "the open sea", "the island harbor" or "<owner>'s harbor"
    pub fn position(self, position: ShipPosition, players: &[Player]) -> Self {
        match position {
            ShipPosition::OpenSea => self.text("the open sea"),
            ShipPosition::Island => self.text("the island harbor"),
            ShipPosition::Harbor { owner, .. } => match players.get(owner as usize) {
                Some(owner) => self.player(owner).text("'s harbor"),
                None => self.text("an unknown harbor"),
            },
        }
    }

    /// `(simple, pretty)`
    pub fn finish(self) -> (String, String) {
        (self.simple, self.pretty)
    }
}
