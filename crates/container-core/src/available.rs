//! Move legality.
//!
//! `GameState::available_moves` maps the state and a player to every move kind
//! that player may make, with the legal arguments for each. The engine
//! validates submitted moves against this map.

use crate::game::{GameState, Phase, ACTIONS_PER_TURN, LOAN_AMOUNT, MAX_LOANS, MAX_WAREHOUSES};
use crate::moves::{non_empty, AvailableMoves, StoreOffer};
use crate::pieces::{ContainerColor, ContainerPiece, PlayerId};
use crate::player::{Chain, Player, ShipPosition, HARBOR_SLOTS, SHIP_CAPACITY};

impl GameState {
    /// Legal moves for `player` in the current state
    pub fn available_moves(&self, player: PlayerId) -> AvailableMoves {
        let Some(p) = self.players.get(player as usize) else {
            return AvailableMoves::default();
        };

        match self.phase {
            Phase::Bid => AvailableMoves {
                bid: true,
                get_loan: p.loans.len() < MAX_LOANS,
                undo: self.can_undo(),
                ..Default::default()
            },
            Phase::AcceptDecline => AvailableMoves {
                accept: non_empty(self.highest_bidders.clone()),
                get_loan: p.loans.len() < MAX_LOANS,
                decline: self
                    .highest_total_bid()
                    .is_some_and(|total| p.can_pay(total)),
                undo: self.can_undo(),
                ..Default::default()
            },
            Phase::Move => self.moves_in_move_phase(p),
            Phase::GameEnd => AvailableMoves::default(),
        }
    }

    /// The last log entry is a move by the player to act
    pub(crate) fn can_undo(&self) -> bool {
        match (self.log.last(), self.current_player) {
            (Some(item), Some(current)) => item.is_move_by(current),
            _ => false,
        }
    }

    fn moves_in_move_phase(&self, p: &Player) -> AvailableMoves {
        let mut moves = AvailableMoves {
            domestic_sale: self.domestic_sales(p),
            buy_from_factory: self.factory_offers(p),
            buy_from_warehouse: self.warehouse_offers(p),
            buy_factory: self.buyable_factories(p),
            buy_warehouse: p.actions > 0
                && p.warehouses.len() < MAX_WAREHOUSES
                && p.can_pay(p.warehouses.len() as u32 + 3)
                && !self.warehouses_left.is_empty(),
            get_loan: p.loans.len() < MAX_LOANS,
            pay_loan: !p.loans.is_empty() && p.can_pay(LOAN_AMOUNT),
            produce: None,
            sail: self.sail_destinations(p),
            arrange_factory: None,
            arrange_warehouse: None,
            pass: true,
            ..Default::default()
        };

        if p.actions > 0 || matches!(p.chain, Chain::Producing | Chain::ArrangingFactory) {
            moves.arrange_factory = non_empty(
                p.containers_on_factory_store
                    .iter()
                    .filter(|c| !c.moved)
                    .map(|c| c.piece)
                    .collect(),
            );
        }

        if p.actions > 0
            || p.chain.is_buying_from_factory()
            || p.chain == Chain::ArrangingWarehouse
        {
            moves.arrange_warehouse = non_empty(
                p.containers_on_warehouse_store
                    .iter()
                    .filter(|c| !c.moved)
                    .map(|c| c.piece)
                    .collect(),
            );
        }

        if let Some(colors) = self.producible_colors(p) {
            // Mid-chain, producing again is the only option
            if p.chain == Chain::Producing {
                moves = AvailableMoves::default();
            }
            moves.produce = Some(colors);
        }

        moves.undo = self.can_undo();
        moves
    }

    fn domestic_sales(&self, p: &Player) -> Option<Vec<ContainerPiece>> {
        if p.actions != ACTIONS_PER_TURN || p.did_domestic_sale || self.round <= 1 {
            return None;
        }
        let store = if p.containers_on_factory_store.is_empty() {
            &p.containers_on_warehouse_store
        } else {
            &p.containers_on_factory_store
        };
        non_empty(store.iter().map(|c| c.piece).collect())
    }

    fn factory_offers(&self, p: &Player) -> Option<Vec<StoreOffer>> {
        let chained_seller = match p.chain {
            Chain::BuyingFromFactory { seller } => Some(seller),
            _ => None,
        };
        if p.actions == 0 && chained_seller.is_none() {
            return None;
        }
        if p.containers_on_warehouse_store.len() >= p.warehouses.len() {
            return None;
        }

        let sellers: Vec<&Player> = match (p.actions, chained_seller) {
            (0, Some(seller)) => self.players.get(seller as usize).into_iter().collect(),
            _ => self.players.iter().filter(|o| o.id != p.id).collect(),
        };

        non_empty(
            sellers
                .into_iter()
                .flat_map(|seller| {
                    seller
                        .containers_on_factory_store
                        .iter()
                        .filter(|c| p.can_pay(c.price))
                        .map(move |c| StoreOffer {
                            seller: seller.id,
                            piece: c.piece,
                        })
                })
                .collect(),
        )
    }

    fn warehouse_offers(&self, p: &Player) -> Option<Vec<StoreOffer>> {
        let chained = p.chain == Chain::Sailed || p.chain.is_buying_from_warehouse();
        if p.actions == 0 && !chained {
            return None;
        }
        if p.ship.containers.len() >= SHIP_CAPACITY {
            return None;
        }
        let seller = self.players.get(p.ship.position.harbor_owner()? as usize)?;

        non_empty(
            seller
                .containers_on_warehouse_store
                .iter()
                .filter(|c| p.can_pay(c.price))
                .map(|c| StoreOffer {
                    seller: seller.id,
                    piece: c.piece,
                })
                .collect(),
        )
    }

    fn buyable_factories(&self, p: &Player) -> Option<Vec<ContainerColor>> {
        if p.actions == 0 || !p.can_pay((p.factories.len() as u32 + 1) * 3) {
            return None;
        }
        non_empty(
            ContainerColor::ALL
                .into_iter()
                .filter(|&color| self.factories_left.has_color(color) && !p.owns_factory(color))
                .collect(),
        )
    }

    fn sail_destinations(&self, p: &Player) -> Option<Vec<ShipPosition>> {
        if p.actions == 0 {
            return None;
        }
        if p.ship.position != ShipPosition::OpenSea {
            return Some(vec![ShipPosition::OpenSea]);
        }

        let occupied: Vec<ShipPosition> = self.players.iter().map(|o| o.ship.position).collect();
        let mut destinations: Vec<ShipPosition> = (1..=HARBOR_SLOTS)
            .flat_map(|slot| {
                self.players
                    .iter()
                    .filter(|o| o.id != p.id)
                    .map(move |o| ShipPosition::Harbor { owner: o.id, slot })
            })
            .filter(|pos| !occupied.contains(pos))
            .collect();

        if !p.ship.containers.is_empty() {
            destinations.push(ShipPosition::Island);
        }
        non_empty(destinations)
    }

    fn producible_colors(&self, p: &Player) -> Option<Vec<ContainerColor>> {
        let may_start = p.produced.is_empty() && p.can_pay(1) && p.actions > 0;
        if !may_start && p.chain != Chain::Producing {
            return None;
        }
        if p.containers_on_factory_store.len() >= p.factories.len() * 2
            || p.produced.len() >= p.factories.len()
        {
            return None;
        }

        let mut colors: Vec<ContainerColor> = Vec::new();
        for factory in &p.factories {
            let color = factory.color;
            if !colors.contains(&color)
                && p.factories_of(color) > p.produced_of(color)
                && self.containers_left.has_color(color)
            {
                colors.push(color);
            }
        }
        non_empty(colors)
    }
}

#[cfg(test)]
mod tests {
    use crate::game::{GameOptions, GameState, Phase};
    use crate::moves::{Move, MoveName, StoreOffer};
    use crate::pieces::{
        ContainerColor, ContainerId, ContainerPiece, FactoryId, FactoryPiece, LoanId, LoanPiece,
        WarehouseId, WarehousePiece,
    };
    use crate::player::{Chain, ContainerOnStore, ShipPosition};

    fn game(players: usize) -> GameState {
        GameState::setup(players, GameOptions::default(), Some("available".to_string()))
    }

    fn piece(id: u32, color: ContainerColor) -> ContainerPiece {
        ContainerPiece {
            id: ContainerId(id),
            color,
        }
    }

    #[test]
    fn test_opening_moves() {
        let state = game(3);
        let current = state.current_player.unwrap();
        let moves = state.available_moves(current);

        assert!(moves.pass);
        assert!(moves.get_loan);
        assert!(!moves.pay_loan);
        assert!(!moves.undo);
        // Round 1: no domestic sale yet
        assert!(moves.domestic_sale.is_none());
        // Only one warehouse and an empty store, so one purchase fits
        assert!(moves.buy_from_factory.is_some());
        // One factory, one color to produce
        assert_eq!(moves.produce.as_ref().map(|c| c.len()), Some(1));
        assert!(moves.contains(MoveName::Sail));
    }

    #[test]
    fn test_sail_destinations_from_open_sea() {
        let mut state = game(3);
        let current = state.current_player.unwrap();
        let others: Vec<u8> = (0..3).filter(|&p| p != current).collect();
        state.players[others[0] as usize].ship.position = ShipPosition::Harbor {
            owner: others[1],
            slot: 1,
        };

        let sail = state.available_moves(current).sail.unwrap();
        assert_eq!(sail.len(), 7);
        assert_eq!(
            sail[0],
            ShipPosition::Harbor {
                owner: others[0],
                slot: 1
            }
        );
        assert!(!sail.contains(&ShipPosition::Harbor {
            owner: others[1],
            slot: 1
        }));
        assert!(!sail.contains(&ShipPosition::Island));

        state.players[current as usize]
            .ship
            .containers
            .push(piece(999, ContainerColor::Tan));
        let sail = state.available_moves(current).sail.unwrap();
        assert_eq!(sail.last(), Some(&ShipPosition::Island));
    }

    #[test]
    fn test_sail_from_harbor_only_to_open_sea() {
        let mut state = game(2);
        let current = state.current_player.unwrap();
        let other = 1 - current;
        state.players[current as usize].ship.position = ShipPosition::Harbor {
            owner: other,
            slot: 3,
        };
        assert_eq!(
            state.available_moves(current).sail,
            Some(vec![ShipPosition::OpenSea])
        );
    }

    #[test]
    fn test_produce_chain_replaces_other_moves() {
        let mut state = game(3);
        let current = state.current_player.unwrap();
        let color = state.players[current as usize].factories[0].color;
        state.players[current as usize].factories.push(FactoryPiece {
            id: FactoryId(99),
            color: if color == ContainerColor::Tan {
                ContainerColor::Orange
            } else {
                ContainerColor::Tan
            },
        });

        state
            .apply_move(current, Move::Produce { color, price: 2 })
            .unwrap();

        let moves = state.available_moves(current);
        assert_eq!(moves.names(), vec![MoveName::Produce, MoveName::Undo]);
        assert!(!moves.produce.unwrap().contains(&color));
    }

    #[test]
    fn test_buy_from_factory_chain_restricts_seller_without_actions() {
        let mut state = game(3);
        let current = state.current_player.unwrap();
        let seller = (current + 1) % 3;
        let p = &mut state.players[current as usize];
        p.actions = 0;
        p.chain = Chain::BuyingFromFactory { seller };
        p.warehouses.push(WarehousePiece { id: WarehouseId(99) });

        let offers = state.available_moves(current).buy_from_factory.unwrap();
        assert!(offers.iter().all(|o: &StoreOffer| o.seller == seller));
        assert_eq!(offers.len(), 1);
    }

    #[test]
    fn test_arrange_warehouse_skips_moved_containers() {
        let mut state = game(2);
        let current = state.current_player.unwrap();
        let p = &mut state.players[current as usize];
        p.containers_on_warehouse_store = vec![
            ContainerOnStore {
                piece: piece(500, ContainerColor::White),
                price: 3,
                moved: true,
            },
            ContainerOnStore::new(piece(501, ContainerColor::Black), 4),
        ];

        assert_eq!(
            state.available_moves(current).arrange_warehouse,
            Some(vec![piece(501, ContainerColor::Black)])
        );
    }

    #[test]
    fn test_bid_phase_moves() {
        let mut state = game(3);
        state.phase = Phase::Bid;
        let current = state.current_player.unwrap();
        let moves = state.available_moves(current);
        assert_eq!(moves.names(), vec![MoveName::GetLoan, MoveName::Bid]);

        state.players[current as usize].loans = vec![
            LoanPiece { id: LoanId(90) },
            LoanPiece { id: LoanId(91) },
        ];
        assert_eq!(state.available_moves(current).names(), vec![MoveName::Bid]);
    }

    #[test]
    fn test_game_end_has_no_moves() {
        let mut state = game(2);
        state.phase = Phase::GameEnd;
        assert!(state.available_moves(0).is_empty());
        assert!(state.available_moves(1).is_empty());
    }
}
