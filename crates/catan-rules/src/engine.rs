//! The game engine: validate, apply, score.
//!
//! `GameEngine` owns one [`Game`] and the random source used for everything
//! random in it. `apply` is the only way state changes: the action is
//! checked by the validator, applied in full, bonuses and the win condition
//! are recomputed, and the state invariants are verified. A rejected action
//! leaves the game untouched.

use crate::actions::{Action, CardData, GameEvent, TradeOffer};
use crate::board::{PlayerId, TileId, VertexId};
use crate::config::GameConfig;
use crate::deck::DevelopmentCard;
use crate::game::{CreateGameError, Game, GamePhase, RuleError, SetupPlacing};
use crate::legal::legal_actions;
use crate::player::PlayerSeat;
use crate::resources::{costs, plan_production, Resource, ResourceHand};
use crate::validate::{road_edge, validate};
use crate::view::{PrivateView, PublicView};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info};

/// Authoritative rules engine for one game
#[derive(Debug, Clone)]
pub struct GameEngine<R: Rng = StdRng> {
    game: Game,
    rng: R,
}

impl GameEngine<StdRng> {
    /// Start a game, seeded from `config.seed` or from entropy
    pub fn new(
        room_code: impl Into<String>,
        roster: &[PlayerSeat],
        config: GameConfig,
    ) -> Result<Self, CreateGameError> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(room_code, roster, config, rng)
    }
}

impl<R: Rng> GameEngine<R> {
    /// Start a game drawing all randomness from `rng`
    pub fn with_rng(
        room_code: impl Into<String>,
        roster: &[PlayerSeat],
        config: GameConfig,
        mut rng: R,
    ) -> Result<Self, CreateGameError> {
        let game = Game::new(room_code, roster, config, &mut rng)?;
        info!(
            room = %game.room_code,
            players = game.player_count(),
            layout = ?game.config.layout,
            "game created"
        );
        Ok(Self { game, rng })
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Check an action without applying it
    pub fn validate(&self, action: &Action) -> Result<(), RuleError> {
        validate(&self.game, action)
    }

    /// Validate and apply an action, returning what happened.
    ///
    /// # Panics
    ///
    /// Panics if the state invariants fail after an accepted action, which
    /// means the validator let through something it should not have.
    pub fn apply(&mut self, action: Action) -> Result<Vec<GameEvent>, RuleError> {
        if let Err(err) = validate(&self.game, &action) {
            debug!(
                room = %self.game.room_code,
                action = action.kind(),
                player = ?action.player(),
                kind = err.kind(),
                "action rejected"
            );
            return Err(err);
        }

        let kind = action.kind();
        let mut events = self.execute(action)?;
        events.extend(self.check_win_condition());

        if let Err(violation) = self.game.check_invariants() {
            error!(room = %self.game.room_code, action = kind, %violation, "invariant violated");
            panic!("invariant violated after {}: {}", kind, violation);
        }

        debug!(
            room = %self.game.room_code,
            action = kind,
            phase = self.game.phase.name(),
            events = events.len(),
            "action applied"
        );
        Ok(events)
    }

    /// Roll two dice from the engine's rng and apply the result
    pub fn roll_dice(&mut self) -> Result<Vec<GameEvent>, RuleError> {
        let value1 = self.rng.gen_range(1..=6);
        let value2 = self.rng.gen_range(1..=6);
        self.apply(Action::DiceRoll { value1, value2 })
    }

    /// Actions `player` could submit now (dice rolls excepted)
    pub fn legal_actions(&self, player: PlayerId) -> Vec<Action> {
        legal_actions(&self.game, player)
    }

    pub fn public_view(&self) -> PublicView {
        PublicView::of(&self.game)
    }

    pub fn private_view(&self, player: PlayerId) -> Option<PrivateView> {
        PrivateView::of(&self.game, player)
    }

    #[cfg(test)]
    pub(crate) fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    // ==================== Application ====================

    fn execute(&mut self, action: Action) -> Result<Vec<GameEvent>, RuleError> {
        match action {
            Action::DiceRoll { value1, value2 } => Ok(self.handle_dice(value1, value2)),
            Action::BuildSettlement { player_id, position } => Ok(self.build_settlement(player_id, position)),
            Action::BuildRoad { player_id, from, to } => self.build_road(player_id, from, to),
            Action::BuildCity { player_id, position } => Ok(self.build_city(player_id, position)),
            Action::BuyDevelopmentCard { player_id } => self.buy_development_card(player_id),
            Action::Trade {
                player_id,
                offering,
                requesting,
                target_player,
            } => Ok(match target_player {
                None => self.bank_trade(player_id, offering, requesting),
                Some(target) => self.propose_trade(player_id, target, offering, requesting),
            }),
            Action::AcceptTrade { .. } => self.accept_trade(),
            Action::RejectTrade { .. } => {
                let offer = self.game.pending_trade.take().ok_or(RuleError::NoPendingTrade)?;
                Ok(vec![GameEvent::TradeRejected {
                    from: offer.from,
                    to: offer.to,
                }])
            }
            Action::PlayDevelopmentCard {
                player_id,
                card_type,
                card_data,
            } => self.play_card(player_id, card_type, card_data),
            Action::MoveRobber {
                player_id,
                tile_position,
                steal_from,
            } => Ok(self.move_robber(player_id, tile_position, steal_from)),
            Action::Discard { player_id, discarding } => Ok(self.discard(player_id, discarding)),
            Action::EndTurn { .. } => Ok(self.end_turn(false)),
            Action::SkipTurn { .. } => Ok(self.end_turn(true)),
        }
    }

    /// Move a player's cards into the bank
    fn pay(&mut self, player: PlayerId, cost: &ResourceHand) {
        self.game.players[player as usize].resources.subtract(cost);
        self.game.bank.deposit(cost);
    }

    /// Move cards from the bank to a player
    fn grant(&mut self, player: PlayerId, hand: &ResourceHand) {
        self.game.bank.withdraw(hand);
        self.game.players[player as usize].resources.add_hand(hand);
    }

    fn handle_dice(&mut self, value1: u8, value2: u8) -> Vec<GameEvent> {
        let total = value1 + value2;
        let player = self.game.current_player;
        self.game.dice = Some((value1, value2));
        let mut events = vec![GameEvent::DiceRolled {
            player,
            values: (value1, value2),
            total,
        }];

        if total == 7 {
            let limit = self.game.config.discard_limit;
            let pending: Vec<PlayerId> = self
                .game
                .players
                .iter()
                .filter(|p| p.resources.total() > limit)
                .map(|p| p.id)
                .collect();
            if pending.is_empty() {
                self.game.phase = GamePhase::MoveRobber;
            } else {
                events.push(GameEvent::DiscardRequired {
                    players: pending.clone(),
                });
                self.game.phase = GamePhase::Discard { pending };
            }
            return events;
        }

        let plan = plan_production(
            &self.game.board,
            &self.game.ledger,
            &self.game.bank,
            self.game.player_count(),
            total,
        );
        // One withdrawal for the whole roll
        self.game.bank.withdraw(&plan.total());
        for (player, grant) in self.game.players.iter_mut().zip(plan.grants.iter()) {
            player.resources.add_hand(grant);
        }
        if !plan.withheld.is_empty() {
            debug!(room = %self.game.room_code, withheld = ?plan.withheld, "bank shortfall");
        }

        events.push(GameEvent::ResourcesProduced {
            grants: plan
                .grants
                .iter()
                .enumerate()
                .filter(|(_, g)| !g.is_empty())
                .map(|(i, g)| (i as PlayerId, *g))
                .collect(),
            withheld: plan.withheld,
        });
        self.game.phase = GamePhase::Main;
        events
    }

    fn build_settlement(&mut self, player_id: PlayerId, v: VertexId) -> Vec<GameEvent> {
        let setup_round = match self.game.phase {
            GamePhase::Setup { round, .. } => Some(round),
            _ => None,
        };
        if setup_round.is_none() {
            self.pay(player_id, &costs::settlement());
        }

        self.game.ledger.place_settlement(v, player_id);
        let player = &mut self.game.players[player_id as usize];
        player.settlements_remaining -= 1;
        player.victory_points += 1;
        let mut events = vec![GameEvent::SettlementBuilt {
            player: player_id,
            vertex: v,
        }];

        if let Some(round) = setup_round {
            if round == 2 {
                let mut income = ResourceHand::new();
                for &tile in self.game.board.tiles_touching_vertex(v) {
                    if let Some(resource) = self.game.board.tile(tile).and_then(|t| t.resource()) {
                        income.add(resource, 1);
                    }
                }
                if self.game.bank.can_supply(&income) && !income.is_empty() {
                    self.grant(player_id, &income);
                    events.push(GameEvent::ResourcesProduced {
                        grants: vec![(player_id, income)],
                        withheld: Vec::new(),
                    });
                }
            }
            self.game.phase = GamePhase::Setup {
                round,
                placing: SetupPlacing::Road { settlement: v },
            };
        }
        // A new settlement can cut an opponent's road
        events.extend(self.refresh_longest_road());
        events
    }

    fn build_road(&mut self, player_id: PlayerId, from: VertexId, to: VertexId) -> Result<Vec<GameEvent>, RuleError> {
        let edge = road_edge(&self.game, from, to)?;
        let in_setup = matches!(self.game.phase, GamePhase::Setup { .. });

        let free = if in_setup {
            true
        } else if self.game.free_roads > 0 {
            self.game.free_roads -= 1;
            true
        } else {
            self.pay(player_id, &costs::road());
            false
        };

        self.game.ledger.place_road(edge, player_id);
        self.game.players[player_id as usize].roads_remaining -= 1;
        let mut events = vec![GameEvent::RoadBuilt {
            player: player_id,
            edge,
            free,
        }];

        events.extend(self.refresh_longest_road());
        if in_setup {
            self.advance_setup();
        }
        Ok(events)
    }

    /// Snake order: seats ascending in round 1, descending in round 2
    fn advance_setup(&mut self) {
        let GamePhase::Setup { round, .. } = self.game.phase else {
            return;
        };
        let last_seat = (self.game.player_count() - 1) as PlayerId;
        let current = self.game.current_player;

        self.game.phase = match (round, current) {
            (1, seat) if seat < last_seat => {
                self.game.current_player = seat + 1;
                setup_phase(1)
            }
            (1, _) => setup_phase(2),
            (_, 0) => {
                self.game.turn_number = 1;
                info!(room = %self.game.room_code, "setup complete");
                GamePhase::Rolling
            }
            (_, seat) => {
                self.game.current_player = seat - 1;
                setup_phase(2)
            }
        };
    }

    fn build_city(&mut self, player_id: PlayerId, v: VertexId) -> Vec<GameEvent> {
        self.pay(player_id, &costs::city());
        self.game.ledger.upgrade_to_city(v, player_id);
        let player = &mut self.game.players[player_id as usize];
        player.settlements_remaining += 1;
        player.cities_remaining -= 1;
        player.victory_points += 1;
        vec![GameEvent::CityBuilt {
            player: player_id,
            vertex: v,
        }]
    }

    fn buy_development_card(&mut self, player_id: PlayerId) -> Result<Vec<GameEvent>, RuleError> {
        let card = self.game.deck.draw().ok_or(RuleError::DeckEmpty)?;
        self.pay(player_id, &costs::development_card());
        self.game.players[player_id as usize].bought_this_turn.add(card);
        Ok(vec![GameEvent::DevelopmentCardBought { player: player_id }])
    }

    fn bank_trade(&mut self, player_id: PlayerId, gave: ResourceHand, received: ResourceHand) -> Vec<GameEvent> {
        self.pay(player_id, &gave);
        self.grant(player_id, &received);
        vec![GameEvent::BankTradeCompleted {
            player: player_id,
            gave,
            received,
        }]
    }

    fn propose_trade(
        &mut self,
        from: PlayerId,
        to: PlayerId,
        offering: ResourceHand,
        requesting: ResourceHand,
    ) -> Vec<GameEvent> {
        let offer = TradeOffer {
            from,
            to,
            offering,
            requesting,
        };
        self.game.pending_trade = Some(offer.clone());
        vec![GameEvent::TradeProposed { offer }]
    }

    fn accept_trade(&mut self) -> Result<Vec<GameEvent>, RuleError> {
        let offer = self.game.pending_trade.take().ok_or(RuleError::NoPendingTrade)?;
        let players = &mut self.game.players;
        players[offer.from as usize].resources.subtract(&offer.offering);
        players[offer.to as usize].resources.add_hand(&offer.offering);
        players[offer.to as usize].resources.subtract(&offer.requesting);
        players[offer.from as usize].resources.add_hand(&offer.requesting);
        Ok(vec![GameEvent::TradeCompleted {
            from: offer.from,
            to: offer.to,
        }])
    }

    fn play_card(
        &mut self,
        player_id: PlayerId,
        card: DevelopmentCard,
        data: Option<CardData>,
    ) -> Result<Vec<GameEvent>, RuleError> {
        let idx = player_id as usize;
        if card == DevelopmentCard::VictoryPoint {
            let count = self.game.players[idx].reveal_victory_cards();
            return Ok(vec![GameEvent::VictoryPointsRevealed {
                player: player_id,
                count,
            }]);
        }

        self.game.players[idx].dev_cards.remove(card);
        self.game.dev_card_played = true;

        let events = match (card, data) {
            (DevelopmentCard::Knight, _) => {
                self.game.players[idx].played_knights += 1;
                self.game.phase = GamePhase::MoveRobber;
                let mut events = vec![GameEvent::KnightPlayed { player: player_id }];
                let min = self.game.config.largest_army_min;
                events.extend(self.game.bonuses.refresh_largest_army(&mut self.game.players, min));
                events
            }
            (DevelopmentCard::RoadBuilding, _) => {
                self.game.free_roads = self.game.players[idx].roads_remaining.min(2);
                vec![GameEvent::RoadBuildingPlayed { player: player_id }]
            }
            (DevelopmentCard::YearOfPlenty, Some(CardData::YearOfPlenty { resources })) => {
                let mut hand = ResourceHand::new();
                for resource in resources {
                    hand.add(resource, 1);
                }
                self.grant(player_id, &hand);
                vec![GameEvent::YearOfPlentyPlayed {
                    player: player_id,
                    resources,
                }]
            }
            (DevelopmentCard::Monopoly, Some(CardData::Monopoly { resource })) => {
                let total_taken = self.monopolize(player_id, resource);
                vec![GameEvent::MonopolyPlayed {
                    player: player_id,
                    resource,
                    total_taken,
                }]
            }
            _ => return Err(RuleError::InvalidCardData),
        };
        Ok(events)
    }

    fn monopolize(&mut self, player_id: PlayerId, resource: Resource) -> u32 {
        let mut taken = 0;
        for other in self.game.players.iter_mut().filter(|p| p.id != player_id) {
            taken += other.resources.get(resource);
            other.resources.set(resource, 0);
        }
        self.game.players[player_id as usize].resources.add(resource, taken);
        taken
    }

    fn move_robber(&mut self, thief: PlayerId, tile: TileId, victim: Option<PlayerId>) -> Vec<GameEvent> {
        let from = self.game.board.robber();
        self.game.board.move_robber(tile);
        let mut events = vec![GameEvent::RobberMoved {
            player: thief,
            from,
            to: tile,
        }];

        if let Some(victim) = victim {
            let stolen = self.game.players[victim as usize]
                .resources
                .steal_random(&mut self.rng);
            if let Some(resource) = stolen {
                self.game.players[thief as usize].resources.add(resource, 1);
            }
            events.push(GameEvent::ResourceStolen {
                thief,
                victim,
                resource: stolen,
            });
        }

        self.game.phase = GamePhase::Main;
        events
    }

    fn discard(&mut self, player_id: PlayerId, discarding: ResourceHand) -> Vec<GameEvent> {
        self.pay(player_id, &discarding);
        if let GamePhase::Discard { pending } = &mut self.game.phase {
            pending.retain(|p| *p != player_id);
            if pending.is_empty() {
                self.game.phase = GamePhase::MoveRobber;
            }
        }
        vec![GameEvent::CardsDiscarded {
            player: player_id,
            count: discarding.total(),
        }]
    }

    fn end_turn(&mut self, skipped: bool) -> Vec<GameEvent> {
        let player = self.game.current_player;
        self.game.players[player as usize].start_new_turn();
        self.game.pending_trade = None;
        self.game.free_roads = 0;
        self.game.dev_card_played = false;
        self.game.dice = None;

        let next_player = ((player as usize + 1) % self.game.player_count()) as PlayerId;
        self.game.current_player = next_player;
        self.game.turn_number += 1;
        self.game.phase = GamePhase::Rolling;

        vec![GameEvent::TurnEnded {
            player,
            next_player,
            skipped,
        }]
    }

    // ==================== Scoring ====================

    fn refresh_longest_road(&mut self) -> Option<GameEvent> {
        let min = self.game.config.longest_road_min;
        self.game.bonuses.refresh_longest_road(
            &self.game.board,
            &self.game.ledger,
            &mut self.game.players,
            min,
        )
    }

    /// First player in seat order at the threshold wins; hidden cards count
    fn check_win_condition(&mut self) -> Vec<GameEvent> {
        if self.game.is_finished() {
            return Vec::new();
        }
        let threshold = self.game.config.victory_points_to_win;
        let Some(winner) = self
            .game
            .players
            .iter()
            .find(|p| p.total_victory_points() >= threshold)
            .map(|p| p.id)
        else {
            return Vec::new();
        };

        let mut events = Vec::new();
        let revealed = self.game.players[winner as usize].reveal_victory_cards();
        if revealed > 0 {
            events.push(GameEvent::VictoryPointsRevealed {
                player: winner,
                count: revealed,
            });
        }
        let victory_points = self.game.players[winner as usize].victory_points;
        self.game.phase = GamePhase::Ended { winner };
        self.game.pending_trade = None;
        info!(room = %self.game.room_code, winner, victory_points, "game over");
        events.push(GameEvent::GameWon {
            player: winner,
            victory_points,
        });
        events
    }
}

fn setup_phase(round: u8) -> GamePhase {
    GamePhase::Setup {
        round,
        placing: SetupPlacing::Settlement,
    }
}
