//! Pieces, supply pools and point cards.
//!
//! This module contains:
//! - The five container colors
//! - Piece records (containers, factories, warehouses, loans) with stable ids
//! - `Pool`, an id-keyed collection used for every shared supply
//! - The fixed deck of point cards dealt at setup

use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Player identifier (seat index, 0-4)
pub type PlayerId = u8;

/// Container colors, in the order the supply is laid out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContainerColor {
    Orange,
    Brown,
    White,
    Black,
    Tan,
}

impl ContainerColor {
    /// All colors in supply order
    pub const ALL: [ContainerColor; 5] = [
        ContainerColor::Orange,
        ContainerColor::Brown,
        ContainerColor::White,
        ContainerColor::Black,
        ContainerColor::Tan,
    ];

    /// Lowercase display name
    pub fn name(&self) -> &'static str {
        match self {
            ContainerColor::Orange => "orange",
            ContainerColor::Brown => "brown",
            ContainerColor::White => "white",
            ContainerColor::Black => "black",
            ContainerColor::Tan => "tan",
        }
    }

    /// CSS color used when rendering log lines
    pub fn css(&self) -> &'static str {
        match self {
            ContainerColor::Orange => "orange",
            ContainerColor::Brown => "brown",
            ContainerColor::White => "white",
            ContainerColor::Black => "#2F4F4F",
            ContainerColor::Tan => "tan",
        }
    }

    /// Position in `ALL`
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ContainerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! piece_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

piece_id!(
    /// Container id, rendered as `C<n>`
    ContainerId,
    "C"
);
piece_id!(
    /// Factory id, rendered as `F<n>`
    FactoryId,
    "F"
);
piece_id!(
    /// Warehouse id, rendered as `W<n>`
    WarehouseId,
    "W"
);
piece_id!(
    /// Loan id, rendered as `L<n>`
    LoanId,
    "L"
);
piece_id!(
    /// Ship id, rendered as `S<n>`
    ShipId,
    "S"
);

/// A single container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerPiece {
    pub id: ContainerId,
    pub color: ContainerColor,
}

/// A factory producing one color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactoryPiece {
    pub id: FactoryId,
    pub color: ContainerColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WarehousePiece {
    pub id: WarehouseId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoanPiece {
    pub id: LoanId,
}

/// Anything that lives in a `Pool`
pub trait Token: Clone {
    type Id: Copy + Ord + fmt::Debug + fmt::Display;

    fn id(&self) -> Self::Id;
}

impl Token for ContainerPiece {
    type Id = ContainerId;

    fn id(&self) -> ContainerId {
        self.id
    }
}

impl Token for FactoryPiece {
    type Id = FactoryId;

    fn id(&self) -> FactoryId {
        self.id
    }
}

impl Token for WarehousePiece {
    type Id = WarehouseId;

    fn id(&self) -> WarehouseId {
        self.id
    }
}

impl Token for LoanPiece {
    type Id = LoanId;

    fn id(&self) -> LoanId {
        self.id
    }
}

/// An id-keyed pool of pieces.
///
/// Removing a piece is an ownership transfer: `take` hands the piece out and
/// `give` puts it back. Iteration is always in ascending id order, so the
/// "first" piece of a color is the one with the lowest id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool<T: Token> {
    pieces: BTreeMap<T::Id, T>,
}

impl<T: Token> Default for Pool<T> {
    fn default() -> Self {
        Self {
            pieces: BTreeMap::new(),
        }
    }
}

impl<T: Token> Pool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.pieces.values()
    }

    /// Remove a piece by id
    pub fn take(&mut self, id: T::Id) -> Option<T> {
        self.pieces.remove(&id)
    }

    /// Return a piece to the pool
    pub fn give(&mut self, piece: T) {
        self.pieces.insert(piece.id(), piece);
    }

    /// Lowest-id piece matching `pred`
    pub fn first_where<F>(&self, pred: F) -> Option<&T>
    where
        F: Fn(&T) -> bool,
    {
        self.pieces.values().find(|p| pred(p))
    }

    /// Remove the lowest-id piece matching `pred`
    pub fn take_first_where<F>(&mut self, pred: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        let id = self.first_where(pred)?.id();
        self.take(id)
    }

    /// Remove the highest-id piece
    pub fn take_last(&mut self) -> Option<T> {
        self.pieces.pop_last().map(|(_, piece)| piece)
    }

    pub fn count_where<F>(&self, pred: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        self.pieces.values().filter(|p| pred(p)).count()
    }
}

impl Pool<ContainerPiece> {
    /// Whether at least one container of `color` is left
    pub fn has_color(&self, color: ContainerColor) -> bool {
        self.first_where(|c| c.color == color).is_some()
    }

    /// Number of distinct colors still present
    pub fn distinct_colors(&self) -> usize {
        ContainerColor::ALL
            .iter()
            .filter(|&&color| self.has_color(color))
            .count()
    }
}

impl Pool<FactoryPiece> {
    pub fn has_color(&self, color: ContainerColor) -> bool {
        self.first_where(|f| f.color == color).is_some()
    }
}

impl<T: Token> FromIterator<T> for Pool<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut pool = Pool::new();
        for piece in iter {
            pool.give(piece);
        }
        pool
    }
}

impl<T: Token + Serialize> Serialize for Pool<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.pieces.values())
    }
}

impl<'de, T: Token + Deserialize<'de>> Deserialize<'de> for Pool<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pieces = Vec::<T>::deserialize(deserializer)?;
        Ok(pieces.into_iter().collect())
    }
}

/// Value of one color on a point card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerValue {
    pub color: ContainerColor,
    /// Value per container normally
    pub base_value: u32,
    /// Value per container when the island holds all five colors
    pub special_value: u32,
}

/// A secret scoring card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointCard {
    pub values: [ContainerValue; 5],
}

impl PointCard {
    fn from_order(order: [ContainerColor; 5]) -> Self {
        const BASE: [u32; 5] = [10, 5, 6, 4, 2];
        const SPECIAL: [u32; 5] = [10, 10, 6, 4, 2];

        let mut values = [ContainerValue {
            color: order[0],
            base_value: 0,
            special_value: 0,
        }; 5];
        for (i, color) in order.into_iter().enumerate() {
            values[i] = ContainerValue {
                color,
                base_value: BASE[i],
                special_value: SPECIAL[i],
            };
        }

        Self { values }
    }

    /// The five cards of the game, in printed order
    pub fn deck() -> Vec<PointCard> {
        use ContainerColor::*;

        vec![
            Self::from_order([White, Orange, Tan, Brown, Black]),
            Self::from_order([Brown, Black, White, Orange, Tan]),
            Self::from_order([Black, White, Orange, Tan, Brown]),
            Self::from_order([Orange, Tan, Brown, Black, White]),
            Self::from_order([Tan, Brown, Black, White, Orange]),
        ]
    }

    /// The color whose value doubles with a full set (second entry)
    pub fn wild_color(&self) -> ContainerColor {
        self.values[1].color
    }

    pub fn value_of(&self, color: ContainerColor) -> ContainerValue {
        self.values
            .iter()
            .copied()
            .find(|v| v.color == color)
            .unwrap_or(ContainerValue {
                color,
                base_value: 0,
                special_value: 0,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(id: u32, color: ContainerColor) -> ContainerPiece {
        ContainerPiece {
            id: ContainerId(id),
            color,
        }
    }

    #[test]
    fn test_pool_take_and_give() {
        let mut pool: Pool<ContainerPiece> = (0..4)
            .map(|i| container(i, ContainerColor::Orange))
            .collect();

        let taken = pool.take(ContainerId(2)).unwrap();
        assert_eq!(taken.id, ContainerId(2));
        assert_eq!(pool.len(), 3);
        assert!(pool.take(ContainerId(2)).is_none());

        pool.give(taken);
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.take(ContainerId(2)), Some(taken));
    }

    #[test]
    fn test_pool_first_is_lowest_id() {
        let mut pool: Pool<ContainerPiece> = vec![
            container(9, ContainerColor::Tan),
            container(3, ContainerColor::Tan),
            container(1, ContainerColor::White),
        ]
        .into_iter()
        .collect();

        let tan = pool.take_first_where(|c| c.color == ContainerColor::Tan).unwrap();
        assert_eq!(tan.id, ContainerId(3));
        assert_eq!(pool.take_last().unwrap().id, ContainerId(9));
    }

    #[test]
    fn test_distinct_colors() {
        let pool: Pool<ContainerPiece> = vec![
            container(0, ContainerColor::Tan),
            container(1, ContainerColor::Tan),
            container(2, ContainerColor::Black),
        ]
        .into_iter()
        .collect();

        assert_eq!(pool.distinct_colors(), 2);
        assert!(pool.has_color(ContainerColor::Black));
        assert!(!pool.has_color(ContainerColor::Orange));
    }

    #[test]
    fn test_pool_serializes_as_sequence() {
        let pool: Pool<ContainerPiece> = vec![container(5, ContainerColor::Brown)]
            .into_iter()
            .collect();
        let json = serde_json::to_value(&pool).unwrap();
        assert!(json.is_array());

        let back: Pool<ContainerPiece> = serde_json::from_value(json).unwrap();
        assert_eq!(back, pool);
    }

    #[test]
    fn test_point_card_deck() {
        let deck = PointCard::deck();
        assert_eq!(deck.len(), 5);

        for card in &deck {
            let mut colors: Vec<_> = card.values.iter().map(|v| v.color).collect();
            colors.sort();
            assert_eq!(colors, ContainerColor::ALL.to_vec());
            assert_eq!(card.values[1].special_value, 10);
            assert_eq!(card.values[1].base_value, 5);
        }

        assert_eq!(deck[0].wild_color(), ContainerColor::Orange);
        assert_eq!(deck[0].value_of(ContainerColor::White).base_value, 10);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ContainerId(12).to_string(), "C12");
        assert_eq!(FactoryId(0).to_string(), "F0");
        assert_eq!(LoanId(3).to_string(), "L3");
    }
}
