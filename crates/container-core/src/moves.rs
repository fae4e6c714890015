//! Moves players can make and the map of which ones are currently legal.
//!
//! Every move kind is one variant of `Move`, carrying its own argument and
//! any extra data (prices). `AvailableMoves` holds, per kind, the set of
//! legal arguments; prices are free choices and are not part of it.

use crate::game::IllegalMove;
use crate::pieces::{ContainerColor, ContainerPiece, PlayerId};
use crate::player::ShipPosition;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a move kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MoveName {
    DomesticSale,
    BuyFromFactory,
    BuyFromWarehouse,
    BuyFactory,
    BuyWarehouse,
    GetLoan,
    PayLoan,
    Produce,
    Sail,
    ArrangeFactory,
    ArrangeWarehouse,
    Bid,
    Accept,
    Decline,
    Pass,
    Undo,
}

impl MoveName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveName::DomesticSale => "domesticSale",
            MoveName::BuyFromFactory => "buyFromFactory",
            MoveName::BuyFromWarehouse => "buyFromWarehouse",
            MoveName::BuyFactory => "buyFactory",
            MoveName::BuyWarehouse => "buyWarehouse",
            MoveName::GetLoan => "getLoan",
            MoveName::PayLoan => "payLoan",
            MoveName::Produce => "produce",
            MoveName::Sail => "sail",
            MoveName::ArrangeFactory => "arrangeFactory",
            MoveName::ArrangeWarehouse => "arrangeWarehouse",
            MoveName::Bid => "bid",
            MoveName::Accept => "accept",
            MoveName::Decline => "decline",
            MoveName::Pass => "pass",
            MoveName::Undo => "undo",
        }
    }
}

impl fmt::Display for MoveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A container offered on another player's store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreOffer {
    pub seller: PlayerId,
    pub piece: ContainerPiece,
}

/// A move, tagged by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "camelCase")]
pub enum Move {
    /// Sell a container from your own store back to the supply for $2
    DomesticSale { piece: ContainerPiece },
    /// Buy from another factory store into your warehouse store at `price`
    BuyFromFactory { offer: StoreOffer, price: u32 },
    /// Buy from the warehouse store of the harbor you are docked at
    BuyFromWarehouse { offer: StoreOffer },
    BuyFactory { color: ContainerColor },
    BuyWarehouse,
    GetLoan,
    PayLoan,
    /// Produce one container of `color`, listed at `price`
    Produce { color: ContainerColor, price: u32 },
    Sail { destination: ShipPosition },
    ArrangeFactory { piece: ContainerPiece, price: u32 },
    ArrangeWarehouse { piece: ContainerPiece, price: u32 },
    Bid { price: u32 },
    Accept { bidder: PlayerId },
    Decline,
    Pass,
    Undo,
}

impl Move {
    pub fn name(&self) -> MoveName {
        match self {
            Move::DomesticSale { .. } => MoveName::DomesticSale,
            Move::BuyFromFactory { .. } => MoveName::BuyFromFactory,
            Move::BuyFromWarehouse { .. } => MoveName::BuyFromWarehouse,
            Move::BuyFactory { .. } => MoveName::BuyFactory,
            Move::BuyWarehouse => MoveName::BuyWarehouse,
            Move::GetLoan => MoveName::GetLoan,
            Move::PayLoan => MoveName::PayLoan,
            Move::Produce { .. } => MoveName::Produce,
            Move::Sail { .. } => MoveName::Sail,
            Move::ArrangeFactory { .. } => MoveName::ArrangeFactory,
            Move::ArrangeWarehouse { .. } => MoveName::ArrangeWarehouse,
            Move::Bid { .. } => MoveName::Bid,
            Move::Accept { .. } => MoveName::Accept,
            Move::Decline => MoveName::Decline,
            Move::Pass => MoveName::Pass,
            Move::Undo => MoveName::Undo,
        }
    }
}

/// Legal moves for one player, per kind.
///
/// `None` (or `false`) means the kind is not available at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvailableMoves {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domestic_sale: Option<Vec<ContainerPiece>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy_from_factory: Option<Vec<StoreOffer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy_from_warehouse: Option<Vec<StoreOffer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buy_factory: Option<Vec<ContainerColor>>,
    pub buy_warehouse: bool,
    pub get_loan: bool,
    pub pay_loan: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub produce: Option<Vec<ContainerColor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sail: Option<Vec<ShipPosition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrange_factory: Option<Vec<ContainerPiece>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrange_warehouse: Option<Vec<ContainerPiece>>,
    pub bid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept: Option<Vec<PlayerId>>,
    pub decline: bool,
    pub pass: bool,
    pub undo: bool,
}

/// `Some(items)` only when there is at least one item
pub(crate) fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

impl AvailableMoves {
    /// Kinds that can currently be played
    pub fn names(&self) -> Vec<MoveName> {
        let flags = [
            (MoveName::DomesticSale, self.domestic_sale.is_some()),
            (MoveName::BuyFromFactory, self.buy_from_factory.is_some()),
            (MoveName::BuyFromWarehouse, self.buy_from_warehouse.is_some()),
            (MoveName::BuyFactory, self.buy_factory.is_some()),
            (MoveName::BuyWarehouse, self.buy_warehouse),
            (MoveName::GetLoan, self.get_loan),
            (MoveName::PayLoan, self.pay_loan),
            (MoveName::Produce, self.produce.is_some()),
            (MoveName::Sail, self.sail.is_some()),
            (MoveName::ArrangeFactory, self.arrange_factory.is_some()),
            (MoveName::ArrangeWarehouse, self.arrange_warehouse.is_some()),
            (MoveName::Bid, self.bid),
            (MoveName::Accept, self.accept.is_some()),
            (MoveName::Decline, self.decline),
            (MoveName::Pass, self.pass),
            (MoveName::Undo, self.undo),
        ];
        flags
            .into_iter()
            .filter(|(_, available)| *available)
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }

    pub fn contains(&self, name: MoveName) -> bool {
        self.names().contains(&name)
    }

    /// Check that `mv` is one of these moves (argument compared by value)
    pub fn permits(&self, mv: &Move) -> Result<(), IllegalMove> {
        let name = mv.name();
        match mv {
            Move::DomesticSale { piece } => member(self.domestic_sale.as_deref(), piece, name),
            Move::BuyFromFactory { offer, .. } => {
                member(self.buy_from_factory.as_deref(), offer, name)
            }
            Move::BuyFromWarehouse { offer } => {
                member(self.buy_from_warehouse.as_deref(), offer, name)
            }
            Move::BuyFactory { color } => member(self.buy_factory.as_deref(), color, name),
            Move::BuyWarehouse => flag(self.buy_warehouse, name),
            Move::GetLoan => flag(self.get_loan, name),
            Move::PayLoan => flag(self.pay_loan, name),
            Move::Produce { color, .. } => member(self.produce.as_deref(), color, name),
            Move::Sail { destination } => member(self.sail.as_deref(), destination, name),
            Move::ArrangeFactory { piece, .. } => {
                member(self.arrange_factory.as_deref(), piece, name)
            }
            Move::ArrangeWarehouse { piece, .. } => {
                member(self.arrange_warehouse.as_deref(), piece, name)
            }
            Move::Bid { .. } => flag(self.bid, name),
            Move::Accept { bidder } => member(self.accept.as_deref(), bidder, name),
            Move::Decline => flag(self.decline, name),
            Move::Pass => flag(self.pass, name),
            Move::Undo => flag(self.undo, name),
        }
    }

    /// Every concrete move, using `price` wherever a price or bid is chosen
    pub fn moves(&self, price: u32) -> Vec<Move> {
        let mut moves = Vec::new();

        for piece in self.domestic_sale.iter().flatten() {
            moves.push(Move::DomesticSale { piece: *piece });
        }
        for offer in self.buy_from_factory.iter().flatten() {
            moves.push(Move::BuyFromFactory {
                offer: *offer,
                price,
            });
        }
        for offer in self.buy_from_warehouse.iter().flatten() {
            moves.push(Move::BuyFromWarehouse { offer: *offer });
        }
        for color in self.buy_factory.iter().flatten() {
            moves.push(Move::BuyFactory { color: *color });
        }
        if self.buy_warehouse {
            moves.push(Move::BuyWarehouse);
        }
        if self.get_loan {
            moves.push(Move::GetLoan);
        }
        if self.pay_loan {
            moves.push(Move::PayLoan);
        }
        for color in self.produce.iter().flatten() {
            moves.push(Move::Produce {
                color: *color,
                price,
            });
        }
        for destination in self.sail.iter().flatten() {
            moves.push(Move::Sail {
                destination: *destination,
            });
        }
        for piece in self.arrange_factory.iter().flatten() {
            moves.push(Move::ArrangeFactory {
                piece: *piece,
                price,
            });
        }
        for piece in self.arrange_warehouse.iter().flatten() {
            moves.push(Move::ArrangeWarehouse {
                piece: *piece,
                price,
            });
        }
        if self.bid {
            moves.push(Move::Bid { price });
        }
        for bidder in self.accept.iter().flatten() {
            moves.push(Move::Accept { bidder: *bidder });
        }
        if self.decline {
            moves.push(Move::Decline);
        }
        if self.pass {
            moves.push(Move::Pass);
        }
        if self.undo {
            moves.push(Move::Undo);
        }

        moves
    }
}

fn member<T: PartialEq>(options: Option<&[T]>, arg: &T, name: MoveName) -> Result<(), IllegalMove> {
    let options = options.ok_or(IllegalMove::MoveNotAvailable(name))?;
    if options.contains(arg) {
        Ok(())
    } else {
        Err(IllegalMove::WrongArgument(name))
    }
}

fn flag(available: bool, name: MoveName) -> Result<(), IllegalMove> {
    if available {
        Ok(())
    } else {
        Err(IllegalMove::MoveNotAvailable(name))
    }
}
