//! Player state, ships and store contents.
//!
//! This module contains:
//! - `Player` with money, loans, factories, warehouses and both stores
//! - `Ship` and the `ShipPosition` it can occupy
//! - `Chain`, the per-player record of which free follow-up move is open

use crate::moves::{AvailableMoves, Move};
use crate::pieces::{
    ContainerColor, ContainerId, ContainerPiece, FactoryPiece, LoanPiece, PlayerId, PointCard,
    ShipId, WarehousePiece,
};
use serde::{Deserialize, Serialize};

/// Harbor slots each player owns
pub const HARBOR_SLOTS: u8 = 4;

/// Where a ship is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShipPosition {
    OpenSea,
    /// Docked at one of `owner`'s harbor slots (1-4)
    Harbor { owner: PlayerId, slot: u8 },
    Island,
}

impl ShipPosition {
    /// The player whose harbor this is, if docked
    pub fn harbor_owner(&self) -> Option<PlayerId> {
        match self {
            ShipPosition::Harbor { owner, .. } => Some(*owner),
            _ => None,
        }
    }
}

/// Most containers a ship can carry
pub const SHIP_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub id: ShipId,
    pub position: ShipPosition,
    pub containers: Vec<ContainerPiece>,
}

/// A container priced for sale on a factory or warehouse store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerOnStore {
    pub piece: ContainerPiece,
    pub price: u32,
    /// Already repriced this turn
    pub moved: bool,
}

impl ContainerOnStore {
    pub fn new(piece: ContainerPiece, price: u32) -> Self {
        Self {
            piece,
            price,
            moved: false,
        }
    }
}

/// Which chained follow-up the player's previous move opened.
///
/// Loans never change the chain, so taking a loan mid-chain keeps it open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Chain {
    #[default]
    Idle,
    Producing,
    ArrangingFactory,
    BuyingFromFactory {
        seller: PlayerId,
    },
    ArrangingWarehouse,
    BuyingFromWarehouse {
        seller: PlayerId,
    },
    Sailed,
}

impl Chain {
    /// Chain state after `mv`, or `None` if the move leaves it untouched
    pub fn after(mv: &Move) -> Option<Chain> {
        let chain = match mv {
            Move::GetLoan | Move::PayLoan => return None,
            Move::Produce { .. } => Chain::Producing,
            Move::ArrangeFactory { .. } => Chain::ArrangingFactory,
            Move::BuyFromFactory { offer, .. } => Chain::BuyingFromFactory {
                seller: offer.seller,
            },
            Move::ArrangeWarehouse { .. } => Chain::ArrangingWarehouse,
            Move::BuyFromWarehouse { offer } => Chain::BuyingFromWarehouse {
                seller: offer.seller,
            },
            Move::Sail { .. } => Chain::Sailed,
            _ => Chain::Idle,
        };
        Some(chain)
    }

    pub fn is_buying_from_factory(&self) -> bool {
        matches!(self, Chain::BuyingFromFactory { .. })
    }

    pub fn is_buying_from_warehouse(&self) -> bool {
        matches!(self, Chain::BuyingFromWarehouse { .. })
    }
}

/// A single player's state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_ai: bool,
    pub is_dropped: bool,
    /// Hidden from other players by `strip_secret`
    pub point_card: Option<PointCard>,
    pub factories: Vec<FactoryPiece>,
    pub warehouses: Vec<WarehousePiece>,
    pub ship: Ship,
    pub containers_on_factory_store: Vec<ContainerOnStore>,
    pub containers_on_warehouse_store: Vec<ContainerOnStore>,
    /// Delivered cargo, scored at game end
    pub containers_on_island: Vec<ContainerPiece>,
    pub money: i32,
    pub loans: Vec<LoanPiece>,
    /// Colors produced this turn
    pub produced: Vec<ContainerColor>,
    /// Legal moves, present only for the player to act
    pub available_moves: Option<AvailableMoves>,
    pub chain: Chain,
    pub actions: u8,
    pub did_domestic_sale: bool,
    pub bid: u32,
    pub additional_bid: u32,
    pub show_bid: bool,
    pub show_additional_bid: bool,
    pub final_score_breakdown: Option<Vec<String>>,
}

impl Player {
    pub fn new(id: PlayerId, point_card: PointCard, money: i32) -> Self {
        Self {
            id,
            name: format!("Player {}", id + 1),
            is_ai: false,
            is_dropped: false,
            point_card: Some(point_card),
            factories: Vec::new(),
            warehouses: Vec::new(),
            ship: Ship {
                id: ShipId(id as u32),
                position: ShipPosition::OpenSea,
                containers: Vec::new(),
            },
            containers_on_factory_store: Vec::new(),
            containers_on_warehouse_store: Vec::new(),
            containers_on_island: Vec::new(),
            money,
            loans: Vec::new(),
            produced: Vec::new(),
            available_moves: None,
            chain: Chain::Idle,
            actions: 0,
            did_domestic_sale: false,
            bid: 0,
            additional_bid: 0,
            show_bid: false,
            show_additional_bid: false,
            final_score_breakdown: None,
        }
    }

    /// Whether the player has at least `price` money
    pub fn can_pay(&self, price: u32) -> bool {
        i64::from(self.money) >= i64::from(price)
    }

    pub fn owns_factory(&self, color: ContainerColor) -> bool {
        self.factories.iter().any(|f| f.color == color)
    }

    pub fn factories_of(&self, color: ContainerColor) -> usize {
        self.factories.iter().filter(|f| f.color == color).count()
    }

    pub fn produced_of(&self, color: ContainerColor) -> usize {
        self.produced.iter().filter(|&&c| c == color).count()
    }

    /// Base plus additional bid
    pub fn total_bid(&self) -> u32 {
        self.bid + self.additional_bid
    }

    pub fn take_from_factory_store(&mut self, id: ContainerId) -> Option<ContainerOnStore> {
        take_from_store(&mut self.containers_on_factory_store, id)
    }

    pub fn take_from_warehouse_store(&mut self, id: ContainerId) -> Option<ContainerOnStore> {
        take_from_store(&mut self.containers_on_warehouse_store, id)
    }

    /// Reset per-turn allowances at the start of this player's turn
    pub fn begin_turn(&mut self, actions: u8) {
        self.actions = actions;
        self.produced.clear();
        for c in self
            .containers_on_factory_store
            .iter_mut()
            .chain(self.containers_on_warehouse_store.iter_mut())
        {
            c.moved = false;
        }
        self.did_domestic_sale = false;
        self.chain = Chain::Idle;
    }

    pub fn clear_bids(&mut self) {
        self.bid = 0;
        self.additional_bid = 0;
        self.show_bid = false;
        self.show_additional_bid = false;
    }

    /// Containers held anywhere by this player
    pub fn containers(&self) -> impl Iterator<Item = &ContainerPiece> {
        self.containers_on_factory_store
            .iter()
            .chain(self.containers_on_warehouse_store.iter())
            .map(|c| &c.piece)
            .chain(self.ship.containers.iter())
            .chain(self.containers_on_island.iter())
    }
}

fn take_from_store(store: &mut Vec<ContainerOnStore>, id: ContainerId) -> Option<ContainerOnStore> {
    let pos = store.iter().position(|c| c.piece.id == id)?;
    Some(store.remove(pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::StoreOffer;

    fn piece(id: u32, color: ContainerColor) -> ContainerPiece {
        ContainerPiece {
            id: ContainerId(id),
            color,
        }
    }

    fn test_player() -> Player {
        Player::new(0, PointCard::deck().remove(0), 20)
    }

    #[test]
    fn test_new_player_defaults() {
        let player = test_player();
        assert_eq!(player.name, "Player 1");
        assert_eq!(player.money, 20);
        assert_eq!(player.ship.position, ShipPosition::OpenSea);
        assert_eq!(player.chain, Chain::Idle);
        assert!(player.point_card.is_some());
    }

    #[test]
    fn test_take_from_store_preserves_order() {
        let mut player = test_player();
        player.containers_on_factory_store = vec![
            ContainerOnStore::new(piece(1, ContainerColor::Tan), 2),
            ContainerOnStore::new(piece(2, ContainerColor::Tan), 3),
            ContainerOnStore::new(piece(3, ContainerColor::Tan), 4),
        ];

        let taken = player.take_from_factory_store(ContainerId(2)).unwrap();
        assert_eq!(taken.price, 3);
        let left: Vec<_> = player
            .containers_on_factory_store
            .iter()
            .map(|c| c.piece.id)
            .collect();
        assert_eq!(left, vec![ContainerId(1), ContainerId(3)]);
        assert!(player.take_from_factory_store(ContainerId(2)).is_none());
    }

    #[test]
    fn test_begin_turn_resets_allowances() {
        let mut player = test_player();
        player.produced.push(ContainerColor::Tan);
        player.did_domestic_sale = true;
        player.chain = Chain::Producing;
        player.containers_on_warehouse_store.push(ContainerOnStore {
            piece: piece(4, ContainerColor::White),
            price: 3,
            moved: true,
        });

        player.begin_turn(2);

        assert_eq!(player.actions, 2);
        assert!(player.produced.is_empty());
        assert!(!player.did_domestic_sale);
        assert_eq!(player.chain, Chain::Idle);
        assert!(!player.containers_on_warehouse_store[0].moved);
    }

    #[test]
    fn test_chain_after_moves() {
        let offer = StoreOffer {
            seller: 2,
            piece: piece(0, ContainerColor::Orange),
        };
        assert_eq!(
            Chain::after(&Move::BuyFromFactory { offer, price: 3 }),
            Some(Chain::BuyingFromFactory { seller: 2 })
        );
        assert_eq!(Chain::after(&Move::GetLoan), None);
        assert_eq!(Chain::after(&Move::PayLoan), None);
        assert_eq!(Chain::after(&Move::Pass), Some(Chain::Idle));
        assert_eq!(
            Chain::after(&Move::Sail {
                destination: ShipPosition::OpenSea
            }),
            Some(Chain::Sailed)
        );
    }

    #[test]
    fn test_can_pay_with_negative_money() {
        let mut player = test_player();
        player.money = -3;
        assert!(!player.can_pay(0));
        player.money = 0;
        assert!(player.can_pay(0));
        assert!(!player.can_pay(1));
    }
}
