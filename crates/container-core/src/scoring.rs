//! End-game scoring.
//!
//! Island cargo is valued with the owner's point card, except the most
//! numerous color group, which is discounted entirely. Containers still in a
//! warehouse store or on the ship are worth a flat amount and each open loan
//! costs a penalty.

use crate::pieces::{ContainerColor, PointCard};
use crate::player::Player;
use serde::{Deserialize, Serialize};

pub const WAREHOUSE_CONTAINER_VALUE: i32 = 2;
pub const SHIP_CONTAINER_VALUE: i32 = 3;
pub const LOAN_PENALTY: i32 = 11;

/// Score of one color group on the island
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorScore {
    pub color: ContainerColor,
    pub count: usize,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandScore {
    /// One entry per point card color, in card order
    pub colors: Vec<ColorScore>,
    /// All five colors delivered, bonus values apply
    pub one_of_each: bool,
    /// The discounted group
    pub discounted: ContainerColor,
    pub penalty: i32,
}

impl IslandScore {
    pub fn total(&self) -> i32 {
        self.colors.iter().map(|c| c.value).sum::<i32>() - self.penalty
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub money: i32,
    pub island: Option<IslandScore>,
    pub warehouse: i32,
    pub ship: i32,
    pub loans: i32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i32 {
        self.money + self.island.as_ref().map_or(0, IslandScore::total) + self.warehouse + self.ship
            - self.loans
    }

    /// Display lines: money, one per card color, penalty, warehouse, ship, loans
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("${}", self.money)];
        match &self.island {
            Some(island) => {
                for c in &island.colors {
                    lines.push(format!("${} ({} x {})", c.value, c.color, c.count));
                }
                lines.push(format!("-${}", island.penalty));
            }
            None => lines.extend(std::iter::repeat("-".to_string()).take(6)),
        }
        lines.push(format!("${}", self.warehouse));
        lines.push(format!("${}", self.ship));
        lines.push(format!("-${}", self.loans));
        lines
    }
}

/// Score `player` against `card`
pub fn score_player(player: &Player, card: &PointCard) -> ScoreBreakdown {
    let island: Vec<ContainerColor> = player.containers_on_island.iter().map(|c| c.color).collect();
    ScoreBreakdown {
        money: player.money,
        island: score_island(&island, card),
        warehouse: player.containers_on_warehouse_store.len() as i32 * WAREHOUSE_CONTAINER_VALUE,
        ship: player.ship.containers.len() as i32 * SHIP_CONTAINER_VALUE,
        loans: player.loans.len() as i32 * LOAN_PENALTY,
    }
}

fn score_island(island: &[ContainerColor], card: &PointCard) -> Option<IslandScore> {
    // Groups in order of first delivery
    let mut groups: Vec<(ContainerColor, usize)> = Vec::new();
    for &color in island {
        match groups.iter_mut().find(|(c, _)| *c == color) {
            Some((_, count)) => *count += 1,
            None => groups.push((color, 1)),
        }
    }

    let one_of_each = groups.len() == ContainerColor::ALL.len();
    let unit_value = |color: ContainerColor| {
        let v = card.value_of(color);
        (if one_of_each { v.special_value } else { v.base_value }) as i32
    };

    let wild = card.wild_color();
    let (discounted, discounted_count) = groups.iter().copied().reduce(|a, b| {
        if a.1 != b.1 {
            return if a.1 > b.1 { a } else { b };
        }
        if a.0 == wild {
            a
        } else if b.0 == wild {
            b
        } else if card.value_of(a.0).base_value > card.value_of(b.0).base_value {
            b
        } else {
            a
        }
    })?;

    let colors = card
        .values
        .iter()
        .map(|v| {
            let count = groups
                .iter()
                .find(|(c, _)| *c == v.color)
                .map_or(0, |(_, n)| *n);
            ColorScore {
                color: v.color,
                count,
                value: count as i32 * unit_value(v.color),
            }
        })
        .collect();

    Some(IslandScore {
        colors,
        one_of_each,
        discounted,
        penalty: discounted_count as i32 * unit_value(discounted),
    })
}
