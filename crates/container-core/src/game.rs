//! Core game state machine.
//!
//! This module contains the `GameState` struct, setup, and the transition
//! engine: validation, per-move effects, the auction, upkeep, end detection,
//! undo by replay and redaction for viewers.

use crate::describe::Line;
use crate::log::{GameEvent, LogItem};
use crate::moves::{AvailableMoves, Move, MoveName, StoreOffer};
use crate::pieces::{
    ContainerColor, ContainerId, ContainerPiece, FactoryId, FactoryPiece, LoanId, LoanPiece,
    PlayerId, PointCard, Pool, WarehouseId, WarehousePiece,
};
use crate::player::{Chain, ContainerOnStore, Player, ShipPosition};
use crate::rng::{random_seed, GameRng};
use crate::scoring::score_player;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const STARTING_MONEY: i32 = 20;

/// Price of the container each player starts with
pub const STARTING_PRICE: u32 = 2;

pub const ACTIONS_PER_TURN: u8 = 2;

pub const MAX_LOANS: usize = 2;

pub const LOAN_AMOUNT: u32 = 10;

pub const MAX_WAREHOUSES: usize = 5;

/// The game ends when fewer colors than this remain in the supply
pub const MIN_SUPPLY_COLORS: usize = 4;

const DOMESTIC_SALE_PRICE: i32 = 2;

const CONTAINERS_PER_PLAYER: usize = 4;
const FACTORIES_PER_COLOR: usize = 5;
const WAREHOUSES_PER_PLAYER: usize = 5;
const LOANS_PER_PLAYER: usize = 2;

/// Game phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Ordinary turns
    Move,
    /// Bidding on the cargo of a ship at the island
    Bid,
    /// The auctioning player accepts a bid or buys the cargo themselves
    AcceptDecline,
    GameEnd,
}

/// A move the acting player may not make
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum IllegalMove {
    #[error("It is not your turn")]
    NotYourTurn,

    #[error("You are not allowed to run the command {0}")]
    MoveNotAvailable(MoveName),

    #[error("Wrong argument for the command {0}")]
    WrongArgument(MoveName),

    #[error("Can't bid more money than you have")]
    BidTooHigh,
}

/// Errors that can occur when applying moves
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error(transparent)]
    Illegal(#[from] IllegalMove),

    #[error("Game is over")]
    GameOver,

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Replay diverged at log entry {index}: {reason}")]
    ReplayDiverged { index: usize, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameOptions {
    pub beginner: bool,
}

impl Default for GameOptions {
    fn default() -> Self {
        Self { beginner: true }
    }
}

/// Pieces taken out of play by the bank during upkeep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeizedPieces {
    pub containers: Pool<ContainerPiece>,
    pub factories: Pool<FactoryPiece>,
    pub warehouses: Pool<WarehousePiece>,
}

/// The complete game state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub players: Vec<Player>,
    pub starting_player: PlayerId,
    /// `None` once the game has ended
    pub current_player: Option<PlayerId>,
    pub containers_left: Pool<ContainerPiece>,
    pub factories_left: Pool<FactoryPiece>,
    pub warehouses_left: Pool<WarehousePiece>,
    pub loans_left: Pool<LoanPiece>,
    pub seized: SeizedPieces,
    /// Owner of the ship being auctioned
    pub auctioning_player: Option<PlayerId>,
    /// Players tied for the highest bid
    pub highest_bidders: Vec<PlayerId>,
    pub phase: Phase,
    pub options: GameOptions,
    /// Starts at 1, advances when the starting player's turn comes round
    pub round: u32,
    pub log: Vec<LogItem>,
    /// Bid phase entries, published when the bidding closes
    pub hidden_log: Vec<LogItem>,
    pub seed: String,
}

impl GameState {
    /// Create a game for `player_count` players.
    ///
    /// Without a seed a random one is generated and stored, so the game can
    /// still be replayed.
    pub fn setup(player_count: usize, options: GameOptions, seed: Option<String>) -> Self {
        assert!(
            (2..=ContainerColor::ALL.len()).contains(&player_count),
            "Must have 2-5 players"
        );

        let seed = seed.unwrap_or_else(random_seed);
        let mut rng = GameRng::from_seed_str(&seed);

        let mut cards = PointCard::deck();
        rng.shuffle(&mut cards);

        let players: Vec<Player> = cards
            .into_iter()
            .take(player_count)
            .enumerate()
            .map(|(i, card)| Player::new(i as PlayerId, card, STARTING_MONEY))
            .collect();

        let per_color = player_count * CONTAINERS_PER_PLAYER;
        let containers_left = ContainerColor::ALL
            .into_iter()
            .enumerate()
            .flat_map(|(ci, color)| {
                (ci * per_color..(ci + 1) * per_color).map(move |i| ContainerPiece {
                    id: ContainerId(i as u32),
                    color,
                })
            })
            .collect();
        let factories_left = ContainerColor::ALL
            .into_iter()
            .enumerate()
            .flat_map(|(ci, color)| {
                (ci * FACTORIES_PER_COLOR..(ci + 1) * FACTORIES_PER_COLOR).map(move |i| {
                    FactoryPiece {
                        id: FactoryId(i as u32),
                        color,
                    }
                })
            })
            .collect();
        let warehouses_left = (0..player_count * WAREHOUSES_PER_PLAYER)
            .map(|i| WarehousePiece {
                id: WarehouseId(i as u32),
            })
            .collect();
        let loans_left = (0..player_count * LOANS_PER_PLAYER)
            .map(|i| LoanPiece { id: LoanId(i as u32) })
            .collect();

        let starting_player = rng.gen_range_usize(0..player_count) as PlayerId;

        let mut state = Self {
            players,
            starting_player,
            current_player: Some(starting_player),
            containers_left,
            factories_left,
            warehouses_left,
            loans_left,
            seized: SeizedPieces::default(),
            auctioning_player: None,
            highest_bidders: Vec::new(),
            phase: Phase::Move,
            options,
            round: 1,
            log: Vec::new(),
            hidden_log: Vec::new(),
            seed,
        };

        let mut colors = ContainerColor::ALL;
        rng.shuffle(&mut colors);

        for (player, color) in state.players.iter_mut().zip(colors) {
            if let Some(factory) = state.factories_left.take_first_where(|f| f.color == color) {
                player.factories.push(factory);
            }
            if let Some(container) = state.containers_left.take_first_where(|c| c.color == color) {
                player
                    .containers_on_factory_store
                    .push(ContainerOnStore::new(container, STARTING_PRICE));
            }
            if let Some(warehouse) = state.warehouses_left.take_last() {
                player.warehouses.push(warehouse);
            }
        }

        state.log.push(LogItem::event(GameEvent::GameStart));
        state.players[starting_player as usize].begin_turn(ACTIONS_PER_TURN);
        state.refresh_available();

        info!(
            players = player_count,
            starting_player,
            seed = %state.seed,
            "game created"
        );
        state
    }

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by ID
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    /// Containers of each color in the game
    pub fn containers_per_color(&self) -> usize {
        self.players.len() * CONTAINERS_PER_PLAYER
    }

    pub fn ended(&self) -> bool {
        self.phase == Phase::GameEnd
    }

    /// Combined bid of the first highest bidder
    pub fn highest_total_bid(&self) -> Option<u32> {
        let first = *self.highest_bidders.first()?;
        self.get_player(first).map(Player::total_bid)
    }

    /// Apply a move and return the public log entries it produced
    pub fn apply_move(&mut self, player: PlayerId, mv: Move) -> Result<Vec<LogItem>, GameError> {
        self.apply(player, mv, false)
    }

    /// Apply a move without the end-of-turn check, upkeep or undo.
    ///
    /// The state is left mid-reconstruction: the caller is responsible for
    /// advancing it afterwards.
    pub fn apply_move_fake(
        &mut self,
        player: PlayerId,
        mv: Move,
    ) -> Result<Vec<LogItem>, GameError> {
        self.apply(player, mv, true)
    }

    fn apply(&mut self, player: PlayerId, mv: Move, fake: bool) -> Result<Vec<LogItem>, GameError> {
        if self.ended() {
            return Err(GameError::GameOver);
        }
        self.validate(player, &mv)?;

        debug!(player, name = %mv.name(), phase = ?self.phase, fake, "applying move");

        if mv == Move::Undo {
            if !fake {
                self.undo()?;
            }
            return Ok(Vec::new());
        }

        let cost = self.action_cost(player, &mv);
        let before = self.log.len();

        match &mv {
            Move::DomesticSale { piece } => self.domestic_sale(player, &mv, *piece)?,
            Move::BuyFromFactory { offer, price } => {
                self.buy_from_factory(player, &mv, *offer, *price, cost)?
            }
            Move::BuyFromWarehouse { offer } => {
                self.buy_from_warehouse(player, &mv, *offer, cost)?
            }
            Move::BuyFactory { color } => self.buy_factory(player, &mv, *color, cost)?,
            Move::BuyWarehouse => self.buy_warehouse(player, &mv, cost)?,
            Move::GetLoan => self.get_loan(player, &mv)?,
            Move::PayLoan => self.pay_loan(player, &mv)?,
            Move::Produce { color, price } => self.produce(player, &mv, *color, *price, cost)?,
            Move::Sail { destination } => self.sail(player, &mv, *destination, cost)?,
            Move::ArrangeFactory { piece, price } => {
                self.arrange(player, &mv, *piece, *price, cost, StoreKind::Factory)?
            }
            Move::ArrangeWarehouse { piece, price } => {
                self.arrange(player, &mv, *piece, *price, cost, StoreKind::Warehouse)?
            }
            Move::Bid { price } => self.bid(player, &mv, *price)?,
            Move::Accept { bidder } => self.accept(player, &mv, *bidder, fake)?,
            Move::Decline => self.decline(player, &mv, fake)?,
            Move::Pass => {
                let line = Line::new().player(seat(&self.players, player)?).text(" passes");
                self.record(player, &mv, line);
                self.end_turn(fake)?;
            }
            Move::Undo => {}
        }

        let actor = seat_mut(&mut self.players, player)?;
        if let Some(chain) = Chain::after(&mv) {
            actor.chain = chain;
        }
        self.refresh_available();

        Ok(self.log.get(before..).map(<[LogItem]>::to_vec).unwrap_or_default())
    }

    /// Check `mv` against the legal moves of `player` without changing anything
    pub fn validate(&self, player: PlayerId, mv: &Move) -> Result<(), GameError> {
        if self.ended() {
            return Err(GameError::GameOver);
        }
        if self.current_player != Some(player) {
            return Err(IllegalMove::NotYourTurn.into());
        }
        let p = seat(&self.players, player)?;

        self.available_moves(player).permits(mv)?;

        match mv {
            Move::Bid { price } => {
                let total = price.checked_add(p.bid).ok_or(IllegalMove::BidTooHigh)?;
                if !p.can_pay(total) {
                    return Err(IllegalMove::BidTooHigh.into());
                }
            }
            Move::GetLoan if self.loans_left.is_empty() => {
                return Err(invariant("no loans left in the supply".to_string()));
            }
            Move::BuyWarehouse if self.warehouses_left.is_empty() => {
                return Err(invariant("no warehouses left in the supply".to_string()));
            }
            _ => {}
        }

        Ok(())
    }

    /// Actions `mv` consumes given the player's open chain (0 or 1)
    pub fn action_cost(&self, player: PlayerId, mv: &Move) -> u8 {
        let Some(p) = self.get_player(player) else {
            return 0;
        };
        let free = match mv {
            Move::BuyFromFactory { offer, .. } => {
                p.chain == Chain::BuyingFromFactory {
                    seller: offer.seller,
                }
            }
            Move::BuyFromWarehouse { offer } => {
                p.chain == Chain::Sailed
                    || p.chain
                        == Chain::BuyingFromWarehouse {
                            seller: offer.seller,
                        }
            }
            Move::Produce { .. } => p.chain == Chain::Producing,
            Move::ArrangeFactory { .. } => {
                matches!(p.chain, Chain::Producing | Chain::ArrangingFactory)
            }
            Move::ArrangeWarehouse { .. } => {
                p.chain.is_buying_from_factory() || p.chain == Chain::ArrangingWarehouse
            }
            Move::BuyFactory { .. } | Move::BuyWarehouse => false,
            Move::Sail { destination } => *destination == ShipPosition::Island,
            _ => true,
        };
        u8::from(!free)
    }

    // ==================== Move effects ====================

    fn domestic_sale(
        &mut self,
        player: PlayerId,
        mv: &Move,
        piece: ContainerPiece,
    ) -> Result<(), GameError> {
        let p = seat_mut(&mut self.players, player)?;
        let sold = if p.containers_on_factory_store.is_empty() {
            p.take_from_warehouse_store(piece.id)
        } else {
            p.take_from_factory_store(piece.id)
        }
        .ok_or_else(|| missing(piece.id, &p.name))?;

        p.money += DOMESTIC_SALE_PRICE;
        p.did_domestic_sale = true;
        self.containers_left.give(sold.piece);

        let line = Line::new()
            .player(seat(&self.players, player)?)
            .text(" sells a ")
            .color(piece.color)
            .text(format!(" container back to the supply for ${DOMESTIC_SALE_PRICE}"));
        self.record(player, mv, line);
        Ok(())
    }

    fn buy_from_factory(
        &mut self,
        player: PlayerId,
        mv: &Move,
        offer: StoreOffer,
        price: u32,
        cost: u8,
    ) -> Result<(), GameError> {
        let seller = seat_mut(&mut self.players, offer.seller)?;
        let bought = seller
            .take_from_factory_store(offer.piece.id)
            .ok_or_else(|| missing(offer.piece.id, &seller.name))?;
        seller.money += cash(bought.price);

        let buyer = seat_mut(&mut self.players, player)?;
        buyer.money -= cash(bought.price);
        buyer
            .containers_on_warehouse_store
            .push(ContainerOnStore::new(offer.piece, price));
        buyer.actions = buyer.actions.saturating_sub(cost);

        let line = Line::new()
            .player(seat(&self.players, player)?)
            .text(" buys a ")
            .color(offer.piece.color)
            .text(" container from ")
            .player(seat(&self.players, offer.seller)?)
            .text(format!(
                " for ${}, new price is ${price}",
                bought.price
            ));
        self.record(player, mv, line);
        Ok(())
    }

    fn buy_from_warehouse(
        &mut self,
        player: PlayerId,
        mv: &Move,
        offer: StoreOffer,
        cost: u8,
    ) -> Result<(), GameError> {
        let seller = seat_mut(&mut self.players, offer.seller)?;
        let bought = seller
            .take_from_warehouse_store(offer.piece.id)
            .ok_or_else(|| missing(offer.piece.id, &seller.name))?;
        seller.money += cash(bought.price);

        let buyer = seat_mut(&mut self.players, player)?;
        buyer.money -= cash(bought.price);
        buyer.ship.containers.push(offer.piece);
        buyer.actions = buyer.actions.saturating_sub(cost);

        let line = Line::new()
            .player(seat(&self.players, player)?)
            .text(" buys a ")
            .color(offer.piece.color)
            .text(" container from ")
            .player(seat(&self.players, offer.seller)?)
            .text(format!(" for ${}", bought.price));
        self.record(player, mv, line);
        Ok(())
    }

    fn buy_factory(
        &mut self,
        player: PlayerId,
        mv: &Move,
        color: ContainerColor,
        cost: u8,
    ) -> Result<(), GameError> {
        let factory = self
            .factories_left
            .take_first_where(|f| f.color == color)
            .ok_or_else(|| invariant(format!("no {color} factory left in the supply")))?;

        let p = seat_mut(&mut self.players, player)?;
        p.factories.push(factory);
        let price = p.factories.len() as i32 * 3;
        p.money -= price;
        p.actions = p.actions.saturating_sub(cost);

        let line = Line::new()
            .player(seat(&self.players, player)?)
            .text(" buys a ")
            .color(color)
            .text(format!(" factory for ${price}"));
        self.record(player, mv, line);
        Ok(())
    }

    fn buy_warehouse(&mut self, player: PlayerId, mv: &Move, cost: u8) -> Result<(), GameError> {
        let warehouse = self
            .warehouses_left
            .take_last()
            .ok_or_else(|| invariant("no warehouses left in the supply".to_string()))?;

        let p = seat_mut(&mut self.players, player)?;
        p.warehouses.push(warehouse);
        let price = p.warehouses.len() as i32 + 2;
        p.money -= price;
        p.actions = p.actions.saturating_sub(cost);

        let line = Line::new()
            .player(seat(&self.players, player)?)
            .text(format!(" buys a warehouse for ${price}"));
        self.record(player, mv, line);
        Ok(())
    }

    fn get_loan(&mut self, player: PlayerId, mv: &Move) -> Result<(), GameError> {
        let loan = self
            .loans_left
            .take_last()
            .ok_or_else(|| invariant("no loans left in the supply".to_string()))?;

        let p = seat_mut(&mut self.players, player)?;
        p.loans.push(loan);
        p.money += cash(LOAN_AMOUNT);

        let line = Line::new().player(p).text(" takes a loan");
        self.record(player, mv, line);
        Ok(())
    }

    fn pay_loan(&mut self, player: PlayerId, mv: &Move) -> Result<(), GameError> {
        let p = seat_mut(&mut self.players, player)?;
        let loan = p
            .loans
            .pop()
            .ok_or_else(|| invariant(format!("{} has no loan to pay", p.name)))?;
        p.money -= cash(LOAN_AMOUNT);
        self.loans_left.give(loan);

        let line = Line::new()
            .player(seat(&self.players, player)?)
            .text(" pays a loan");
        self.record(player, mv, line);
        Ok(())
    }

    fn produce(
        &mut self,
        player: PlayerId,
        mv: &Move,
        color: ContainerColor,
        price: u32,
        cost: u8,
    ) -> Result<(), GameError> {
        let piece = self
            .containers_left
            .take_first_where(|c| c.color == color)
            .ok_or_else(|| invariant(format!("no {color} container left in the supply")))?;

        let p = seat_mut(&mut self.players, player)?;
        p.containers_on_factory_store
            .push(ContainerOnStore::new(piece, price));
        p.produced.push(color);

        // Starting a run of production costs an action and $1 to the previous seat
        if cost > 0 {
            p.actions = p.actions.saturating_sub(cost);
            p.money -= 1;
            let before = self.player_before(player);
            seat_mut(&mut self.players, before)?.money += 1;
        }

        let line = Line::new()
            .player(seat(&self.players, player)?)
            .text(" produces a ")
            .color(color)
            .text(format!(" container, price is ${price}"));
        self.record(player, mv, line);
        Ok(())
    }

    fn sail(
        &mut self,
        player: PlayerId,
        mv: &Move,
        destination: ShipPosition,
        cost: u8,
    ) -> Result<(), GameError> {
        let p = seat_mut(&mut self.players, player)?;
        p.ship.position = destination;
        if destination == ShipPosition::Island {
            p.actions = 0;
        } else {
            p.actions = p.actions.saturating_sub(cost);
        }

        let line = Line::new()
            .player(seat(&self.players, player)?)
            .text(" sails to ")
            .position(destination, &self.players);
        self.record(player, mv, line);

        if destination == ShipPosition::Island {
            self.auctioning_player = Some(player);
            self.set_phase(Phase::Bid);
            self.next_player();
        }
        Ok(())
    }

    fn arrange(
        &mut self,
        player: PlayerId,
        mv: &Move,
        piece: ContainerPiece,
        price: u32,
        cost: u8,
        kind: StoreKind,
    ) -> Result<(), GameError> {
        let p = seat_mut(&mut self.players, player)?;
        let old = match kind {
            StoreKind::Factory => p.take_from_factory_store(piece.id),
            StoreKind::Warehouse => p.take_from_warehouse_store(piece.id),
        }
        .ok_or_else(|| missing(piece.id, &p.name))?;

        let repriced = ContainerOnStore {
            piece,
            price,
            moved: true,
        };
        match kind {
            StoreKind::Factory => p.containers_on_factory_store.push(repriced),
            StoreKind::Warehouse => p.containers_on_warehouse_store.push(repriced),
        }
        p.actions = p.actions.saturating_sub(cost);

        let line = Line::new()
            .player(seat(&self.players, player)?)
            .text(" changes the price of a ")
            .color(piece.color)
            .text(format!(
                " {} container from ${} to ${price}",
                kind.name(),
                old.price
            ));
        self.record(player, mv, line);
        Ok(())
    }

    fn bid(&mut self, player: PlayerId, mv: &Move, price: u32) -> Result<(), GameError> {
        let first_round = self.highest_bidders.is_empty();
        let p = seat_mut(&mut self.players, player)?;
        let line = if first_round {
            p.bid = price;
            Line::new().player(p).text(format!(" bids ${price}"))
        } else {
            p.additional_bid = price;
            Line::new().player(p).text(format!(" bids additional ${price}"))
        };
        self.record(player, mv, line);

        let auctioneer = self
            .auctioning_player
            .ok_or_else(|| invariant("bidding without an auctioning player".to_string()))?;

        if first_round {
            self.next_player();
        } else {
            // Only the tied players bid again
            for _ in 0..self.players.len() {
                self.next_player();
                let current = self.current_player;
                if current == Some(auctioneer)
                    || current.is_some_and(|c| self.highest_bidders.contains(&c))
                {
                    break;
                }
            }
        }

        if self.current_player != Some(auctioneer) {
            return Ok(());
        }

        if first_round {
            for p in self.players.iter_mut().filter(|p| p.id != auctioneer) {
                p.show_bid = true;
            }
            let highest = self.players.iter().map(|p| p.bid).max().unwrap_or(0);
            self.highest_bidders = self
                .players
                .iter()
                .filter(|p| p.id != auctioneer && p.bid == highest)
                .map(|p| p.id)
                .collect();

            if self.highest_bidders.len() > 1 {
                info!(tied = ?self.highest_bidders, bid = highest, "tied bids, second round");
                for _ in 0..self.players.len() {
                    if self
                        .current_player
                        .is_some_and(|c| self.highest_bidders.contains(&c))
                    {
                        break;
                    }
                    self.next_player();
                }
            } else {
                self.open_accept_decline();
            }
        } else {
            let highest = self
                .players
                .iter()
                .map(Player::total_bid)
                .max()
                .unwrap_or(0);
            self.highest_bidders = self
                .players
                .iter()
                .filter(|p| p.id != auctioneer && p.total_bid() == highest)
                .map(|p| p.id)
                .collect();
            for p in &mut self.players {
                p.show_additional_bid = true;
            }
            self.open_accept_decline();
        }
        Ok(())
    }

    fn open_accept_decline(&mut self) {
        let hidden = std::mem::take(&mut self.hidden_log);
        self.log.extend(hidden);
        self.set_phase(Phase::AcceptDecline);
    }

    fn accept(
        &mut self,
        player: PlayerId,
        mv: &Move,
        bidder: PlayerId,
        fake: bool,
    ) -> Result<(), GameError> {
        let cargo = std::mem::take(&mut seat_mut(&mut self.players, player)?.ship.containers);

        let winner = seat_mut(&mut self.players, bidder)?;
        let total = winner.total_bid();
        winner.containers_on_island.extend(cargo);
        winner.money -= cash(total);

        seat_mut(&mut self.players, player)?.money += cash(total) * 2;

        let line = Line::new()
            .player(seat(&self.players, player)?)
            .text(" accepts ")
            .player(seat(&self.players, bidder)?)
            .text("'s bid");
        self.record(player, mv, line);

        self.close_auction();
        self.end_turn(fake)
    }

    fn decline(&mut self, player: PlayerId, mv: &Move, fake: bool) -> Result<(), GameError> {
        let fee = self
            .highest_total_bid()
            .ok_or_else(|| invariant("declining without a highest bidder".to_string()))?;

        let p = seat_mut(&mut self.players, player)?;
        let cargo = std::mem::take(&mut p.ship.containers);
        p.containers_on_island.extend(cargo);
        p.money -= cash(fee);

        let line = Line::new().player(p).text(" declines all bids");
        self.record(player, mv, line);

        self.close_auction();
        self.end_turn(fake)
    }

    fn close_auction(&mut self) {
        for p in &mut self.players {
            p.clear_bids();
        }
        self.auctioning_player = None;
        self.highest_bidders.clear();
        self.set_phase(Phase::Move);
    }

    // ==================== Turn flow ====================

    fn record(&mut self, player: PlayerId, mv: &Move, line: Line) {
        let (simple, pretty) = line.finish();
        let item = LogItem::Move {
            player,
            mv: mv.clone(),
            simple,
            pretty,
        };
        if self.phase == Phase::Bid {
            self.hidden_log.push(item);
        } else {
            self.log.push(item);
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        info!(from = ?self.phase, to = ?phase, "phase change");
        self.phase = phase;
        self.log.push(LogItem::Phase { phase });
    }

    fn next_player(&mut self) {
        let count = self.players.len() as PlayerId;
        if let Some(current) = self.current_player {
            self.current_player = Some((current + 1) % count);
        }
    }

    fn player_before(&self, player: PlayerId) -> PlayerId {
        if player == 0 {
            self.players.len() as PlayerId - 1
        } else {
            player - 1
        }
    }

    /// Hand the turn on: check for the end of the game, else run upkeep
    fn end_turn(&mut self, fake: bool) -> Result<(), GameError> {
        self.next_player();
        if fake {
            return Ok(());
        }
        if self.containers_left.distinct_colors() < MIN_SUPPLY_COLORS {
            self.end_game()
        } else {
            self.upkeep()
        }
    }

    /// Charge loan interest for the new current player and reset their turn
    fn upkeep(&mut self) -> Result<(), GameError> {
        let Some(current) = self.current_player else {
            return Ok(());
        };
        let mut rng = GameRng::from_seed_str(&self.seed).for_context("upkeep", self.log.len());

        let loan_count = seat(&self.players, current)?.loans.len();
        let mut paid = 0;
        for _ in 0..loan_count {
            let p = seat_mut(&mut self.players, current)?;
            if p.money > 0 {
                p.money -= 1;
                paid += 1;
                continue;
            }
            self.note_interest(current, &mut paid)?;
            if let Some(message) = self.seize(current, &mut rng)? {
                warn!(player = current, %message, "assets seized");
                self.log
                    .push(LogItem::event(GameEvent::Upkeep { message }));
            }
        }
        self.note_interest(current, &mut paid)?;

        seat_mut(&mut self.players, current)?.begin_turn(ACTIONS_PER_TURN);

        if current == self.starting_player {
            self.round += 1;
            info!(round = self.round, "round start");
            self.log.push(LogItem::event(GameEvent::RoundStart {
                round: self.round,
            }));
        }
        Ok(())
    }

    fn note_interest(&mut self, player: PlayerId, paid: &mut u32) -> Result<(), GameError> {
        if *paid == 0 {
            return Ok(());
        }
        let name = &seat(&self.players, player)?.name;
        let message = format!("{name} pays ${paid} interest");
        self.log
            .push(LogItem::event(GameEvent::Upkeep { message }));
        *paid = 0;
        Ok(())
    }

    /// Seize assets for one unpaid interest payment.
    ///
    /// Order: an island container, then store containers (two from the
    /// warehouses, else one warehouse and one factory container, else factory
    /// containers), then a warehouse, then a factory. Seizing a warehouse or
    /// factory also clears one loan.
    fn seize(&mut self, player: PlayerId, rng: &mut GameRng) -> Result<Option<String>, GameError> {
        let p = seat_mut(&mut self.players, player)?;
        let name = p.name.clone();

        if let Some(i) = rng.choose_index(p.containers_on_island.len()) {
            let container = p.containers_on_island.remove(i);
            self.seized.containers.give(container);
            return Ok(Some(format!(
                "The bank seizes a {} container from {name}'s island",
                container.color
            )));
        }

        if !p.containers_on_warehouse_store.is_empty() || !p.containers_on_factory_store.is_empty() {
            let warehouse_count = p.containers_on_warehouse_store.len();
            let (message, taken) = if warehouse_count >= 2 {
                let c1 = remove_random(&mut p.containers_on_warehouse_store, rng);
                let c2 = remove_random(&mut p.containers_on_warehouse_store, rng);
                (
                    format!(
                        "The bank seizes a {} container and a {} container from {name}'s warehouses",
                        c1.color, c2.color
                    ),
                    vec![c1, c2],
                )
            } else if warehouse_count == 1 {
                let c1 = remove_random(&mut p.containers_on_warehouse_store, rng);
                if p.containers_on_factory_store.is_empty() {
                    (
                        format!(
                            "The bank seizes a {} container from {name}'s warehouses",
                            c1.color
                        ),
                        vec![c1],
                    )
                } else {
                    let c2 = remove_random(&mut p.containers_on_factory_store, rng);
                    (
                        format!(
                            "The bank seizes a {} container from {name}'s warehouses and a {} container from {name}'s factory",
                            c1.color, c2.color
                        ),
                        vec![c1, c2],
                    )
                }
            } else {
                let c1 = remove_random(&mut p.containers_on_factory_store, rng);
                if p.containers_on_factory_store.is_empty() {
                    (
                        format!(
                            "The bank seizes a {} container from {name}'s factory",
                            c1.color
                        ),
                        vec![c1],
                    )
                } else {
                    let c2 = remove_random(&mut p.containers_on_factory_store, rng);
                    (
                        format!(
                            "The bank seizes a {} container and a {} container from {name}'s factory",
                            c1.color, c2.color
                        ),
                        vec![c1, c2],
                    )
                }
            };
            for container in taken {
                self.seized.containers.give(container);
            }
            return Ok(Some(message));
        }

        if p.warehouses.len() > 2 {
            if let Some(warehouse) = p.warehouses.pop() {
                self.seized.warehouses.give(warehouse);
            }
            if let Some(loan) = p.loans.pop() {
                self.loans_left.give(loan);
            }
            return Ok(Some(format!("The bank seizes a warehouse from {name}")));
        }

        if p.factories.len() > 2 {
            if let Some(factory) = p.factories.pop() {
                self.seized.factories.give(factory);
            }
            if let Some(loan) = p.loans.pop() {
                self.loans_left.give(loan);
            }
            return Ok(Some(format!("The bank seizes a factory from {name}")));
        }

        Ok(None)
    }

    fn end_game(&mut self) -> Result<(), GameError> {
        self.current_player = None;
        self.set_phase(Phase::GameEnd);
        self.log.push(LogItem::event(GameEvent::GameEnd));

        for p in &mut self.players {
            let card = p
                .point_card
                .clone()
                .ok_or_else(|| invariant(format!("{} has no point card", p.name)))?;
            let score = score_player(p, &card);
            p.money = score.total();
            p.final_score_breakdown = Some(score.lines());
        }

        info!(
            scores = ?self.players.iter().map(|p| p.money).collect::<Vec<_>>(),
            "game over"
        );
        Ok(())
    }

    /// Store the legal moves of the player to act; everyone else has none
    fn refresh_available(&mut self) {
        let current = self.current_player.map(|c| (c, self.available_moves(c)));
        for p in &mut self.players {
            p.available_moves = None;
        }
        if let Some((c, moves)) = current {
            if let Some(p) = self.players.get_mut(c as usize) {
                p.available_moves = Some(moves);
            }
        }
    }

    // ==================== Replay ====================

    /// A fresh game with the same seed, options and player metadata
    pub fn base_state(&self) -> GameState {
        let mut base = Self::setup(
            self.players.len(),
            self.options,
            Some(self.seed.clone()),
        );
        for (fresh, old) in base.players.iter_mut().zip(&self.players) {
            fresh.name = old.name.clone();
            fresh.is_ai = old.is_ai;
            fresh.is_dropped = old.is_dropped;
        }
        base
    }

    /// Replay the move entries of `log` on top of `base`
    pub fn reconstruct(base: GameState, log: &[LogItem]) -> Result<GameState, GameError> {
        let mut state = base;
        for (index, item) in log.iter().enumerate() {
            if let Some((player, mv)) = item.as_move() {
                state
                    .apply_move(player, mv.clone())
                    .map_err(|e| GameError::ReplayDiverged {
                        index,
                        reason: e.to_string(),
                    })?;
            }
        }
        Ok(state)
    }

    /// Rebuild this game from its seed and full history, hidden entries included
    pub fn replay(&self) -> Result<GameState, GameError> {
        let history: Vec<LogItem> = self
            .log
            .iter()
            .chain(self.hidden_log.iter())
            .cloned()
            .collect();
        Self::reconstruct(self.base_state(), &history)
    }

    fn undo(&mut self) -> Result<(), GameError> {
        let mut log = self.log.clone();
        log.pop();

        let rebuilt = Self::reconstruct(self.base_state(), &log)?;

        let expected: Vec<_> = log.iter().filter_map(LogItem::as_move).collect();
        let actual: Vec<_> = rebuilt.log.iter().filter_map(LogItem::as_move).collect();
        if expected != actual {
            let index = expected
                .iter()
                .zip(&actual)
                .position(|(a, b)| a != b)
                .unwrap_or(expected.len().min(actual.len()));
            let reason = "rebuilt log does not match the recorded moves".to_string();
            error!(index, %reason, "undo failed");
            return Err(GameError::ReplayDiverged { index, reason });
        }

        info!(log_length = rebuilt.log.len(), "move undone");
        *self = rebuilt;
        Ok(())
    }

    // ==================== Views ====================

    /// The state as `viewer` may see it.
    ///
    /// Other players' point cards, money (until the end), unrevealed bids and
    /// move lists are hidden, as are the seed and the hidden log.
    pub fn strip_secret(&self, viewer: Option<PlayerId>) -> GameState {
        let ended = self.ended();
        let mut view = self.clone();
        view.seed = "secret".to_string();
        view.hidden_log.clear();

        for p in view.players.iter_mut().filter(|p| Some(p.id) != viewer) {
            p.point_card = None;
            if p.available_moves.is_some() {
                p.available_moves = Some(AvailableMoves::default());
            }
            if !ended {
                p.money = 0;
            }
            if !p.show_bid {
                p.bid = 0;
            }
            if !p.show_additional_bid {
                p.additional_bid = 0;
            }
        }
        view
    }
}

#[derive(Debug, Clone, Copy)]
enum StoreKind {
    Factory,
    Warehouse,
}

impl StoreKind {
    fn name(&self) -> &'static str {
        match self {
            StoreKind::Factory => "factory",
            StoreKind::Warehouse => "warehouse",
        }
    }
}

fn seat(players: &[Player], id: PlayerId) -> Result<&Player, GameError> {
    players
        .get(id as usize)
        .ok_or_else(|| invariant(format!("no player {id}")))
}

fn seat_mut(players: &mut [Player], id: PlayerId) -> Result<&mut Player, GameError> {
    players
        .get_mut(id as usize)
        .ok_or_else(|| invariant(format!("no player {id}")))
}

fn invariant(message: String) -> GameError {
    error!(%message, "invariant violated");
    GameError::Invariant(message)
}

fn missing(id: ContainerId, owner: &str) -> GameError {
    invariant(format!("container {id} is not in {owner}'s store"))
}

fn remove_random(store: &mut Vec<ContainerOnStore>, rng: &mut GameRng) -> ContainerPiece {
    let i = rng.gen_range_usize(0..store.len());
    store.remove(i).piece
}

/// Money amount for a price
fn cash(amount: u32) -> i32 {
    i32::try_from(amount).unwrap_or(i32::MAX)
}
