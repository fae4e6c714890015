//! Results of a played game.

use container_core::PlayerId;
use serde::{Deserialize, Serialize};

use crate::table::Table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub player: PlayerId,
    pub name: String,
    pub rank: usize,
    /// Final score once the game has ended, otherwise cash in hand
    pub money: i32,
    pub island: usize,
    pub loans: usize,
    pub breakdown: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameReport {
    pub seed: String,
    pub players: usize,
    pub moves: usize,
    pub rounds: u32,
    pub ended: bool,
    pub log_length: usize,
    /// Best first
    pub standings: Vec<Standing>,
}

impl GameReport {
    pub fn from_table(table: &Table, moves: usize) -> Self {
        let game = &table.game;
        let mut standings: Vec<Standing> = game
            .players
            .iter()
            .zip(table.rankings())
            .map(|(p, rank)| Standing {
                player: p.id,
                name: p.name.clone(),
                rank,
                money: p.money,
                island: p.containers_on_island.len(),
                loans: p.loans.len(),
                breakdown: p.final_score_breakdown.clone(),
            })
            .collect();
        standings.sort_by_key(|s| s.rank);

        Self {
            seed: game.seed.clone(),
            players: game.player_count(),
            moves,
            rounds: game.round,
            ended: table.ended(),
            log_length: table.log_length(),
            standings,
        }
    }

    /// One line: seed, length and the leader
    pub fn summary(&self) -> String {
        let status = if self.ended { "finished" } else { "unfinished" };
        let leader = self
            .standings
            .first()
            .map(|s| format!(", leader {} (${})", s.name, s.money))
            .unwrap_or_default();
        format!(
            "seed {}: {} players, {status} after {} rounds and {} moves{leader}",
            self.seed, self.players, self.rounds, self.moves
        )
    }
}
