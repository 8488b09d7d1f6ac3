//! The action validator.
//!
//! [`validate`] is a pure function of the game and an action: it never
//! mutates, and an action it accepts can always be applied without any
//! further checks. Turn ownership is checked first, then the phase, then the
//! rules specific to the action.

use crate::actions::{Action, CardData};
use crate::board::{EdgeId, PlayerId, TileId, VertexId};
use crate::deck::DevelopmentCard;
use crate::game::{Game, GamePhase, RuleError, SetupPlacing, SpatialViolation};
use crate::ledger::{EdgeBuilding, VertexBuilding};
use crate::player::Player;
use crate::resources::{costs, Resource, ResourceHand};

/// Check whether `action` is legal right now
pub fn validate(game: &Game, action: &Action) -> Result<(), RuleError> {
    if game.is_finished() {
        return Err(RuleError::GameOver);
    }
    if let Some(player) = action.player() {
        if game.player(player).is_none() {
            return Err(RuleError::UnknownPlayer(player));
        }
        if needs_turn(action) && player != game.current_player {
            return Err(RuleError::NotYourTurn);
        }
    }

    match action {
        Action::DiceRoll { value1, value2 } => {
            expect_phase(game, action, matches!(game.phase, GamePhase::Rolling))?;
            if !(1..=6).contains(value1) || !(1..=6).contains(value2) {
                return Err(RuleError::InvalidDice);
            }
            Ok(())
        }
        Action::BuildSettlement { player_id, position } => validate_settlement(game, action, *player_id, *position),
        Action::BuildRoad { player_id, from, to } => validate_road(game, action, *player_id, *from, *to),
        Action::BuildCity { player_id, position } => validate_city(game, action, *player_id, *position),
        Action::BuyDevelopmentCard { player_id } => {
            expect_phase(game, action, game.phase == GamePhase::Main)?;
            require_resources(player(game, *player_id), &costs::development_card())?;
            if game.deck.is_empty() {
                return Err(RuleError::DeckEmpty);
            }
            Ok(())
        }
        Action::Trade {
            player_id,
            offering,
            requesting,
            target_player,
        } => validate_trade(game, action, *player_id, offering, requesting, *target_player),
        Action::AcceptTrade { player_id } => {
            expect_phase(game, action, game.phase == GamePhase::Main)?;
            let offer = game
                .pending_trade
                .as_ref()
                .filter(|offer| offer.to == *player_id)
                .ok_or(RuleError::NoPendingTrade)?;
            require_resources(player(game, offer.from), &offer.offering)?;
            require_resources(player(game, offer.to), &offer.requesting)
        }
        Action::RejectTrade { player_id } => {
            expect_phase(game, action, game.phase == GamePhase::Main)?;
            match &game.pending_trade {
                Some(offer) if offer.to == *player_id || offer.from == *player_id => Ok(()),
                _ => Err(RuleError::NoPendingTrade),
            }
        }
        Action::PlayDevelopmentCard {
            player_id,
            card_type,
            card_data,
        } => validate_card(game, action, *player_id, *card_type, card_data.as_ref()),
        Action::MoveRobber {
            player_id,
            tile_position,
            steal_from,
        } => validate_robber(game, action, *player_id, *tile_position, *steal_from),
        Action::Discard { player_id, discarding } => {
            let GamePhase::Discard { pending } = &game.phase else {
                return Err(invalid_phase(game, action));
            };
            if !pending.contains(player_id) {
                return Err(RuleError::NotYourTurn);
            }
            let held = &player(game, *player_id).resources;
            let expected = held.total() / 2;
            if discarding.total() != expected || !held.can_afford(discarding) {
                return Err(RuleError::InvalidDiscardCount {
                    expected,
                    got: discarding.total(),
                });
            }
            Ok(())
        }
        Action::EndTurn { .. } => expect_phase(game, action, game.phase == GamePhase::Main),
        Action::SkipTurn { .. } => expect_phase(
            game,
            action,
            matches!(game.phase, GamePhase::Main | GamePhase::Rolling),
        ),
    }
}

/// Actions that respond to someone else's turn skip the turn check
fn needs_turn(action: &Action) -> bool {
    !matches!(
        action,
        Action::Discard { .. } | Action::AcceptTrade { .. } | Action::RejectTrade { .. }
    )
}

fn player(game: &Game, id: PlayerId) -> &Player {
    &game.players[id as usize]
}

fn invalid_phase(game: &Game, action: &Action) -> RuleError {
    RuleError::InvalidPhase {
        action: action.kind().to_string(),
        phase: game.phase.name().to_string(),
    }
}

fn expect_phase(game: &Game, action: &Action, allowed: bool) -> Result<(), RuleError> {
    if allowed {
        Ok(())
    } else {
        Err(invalid_phase(game, action))
    }
}

fn require_resources(player: &Player, cost: &ResourceHand) -> Result<(), RuleError> {
    if player.resources.can_afford(cost) {
        Ok(())
    } else {
        Err(RuleError::InsufficientResources)
    }
}

fn spatial(violation: SpatialViolation) -> RuleError {
    RuleError::SpatialRuleViolation(violation)
}

fn validate_settlement(game: &Game, action: &Action, player_id: PlayerId, v: VertexId) -> Result<(), RuleError> {
    let in_setup = match game.phase {
        GamePhase::Setup {
            placing: SetupPlacing::Settlement,
            ..
        } => true,
        GamePhase::Main => false,
        _ => return Err(invalid_phase(game, action)),
    };
    if !in_setup {
        let p = player(game, player_id);
        require_resources(p, &costs::settlement())?;
        if p.settlements_remaining == 0 {
            return Err(RuleError::NoPiecesRemaining);
        }
    }
    if !game.board.is_vertex(v) {
        return Err(spatial(SpatialViolation::UnknownLocation));
    }
    if game.ledger.building_at(v) != VertexBuilding::Empty {
        return Err(spatial(SpatialViolation::Occupied));
    }
    if !game.ledger.satisfies_distance_rule(&game.board, v) {
        return Err(spatial(SpatialViolation::TooClose));
    }
    if !in_setup && !game.ledger.touches_own_road(&game.board, v, player_id) {
        return Err(spatial(SpatialViolation::Disconnected));
    }
    Ok(())
}

/// Resolve a road's two corners to the edge between them
pub(crate) fn road_edge(game: &Game, from: VertexId, to: VertexId) -> Result<EdgeId, RuleError> {
    if !game.board.is_vertex(from) || !game.board.is_vertex(to) {
        return Err(spatial(SpatialViolation::UnknownLocation));
    }
    game.board
        .edge_between(from, to)
        .ok_or(spatial(SpatialViolation::NotAnEdge))
}

fn validate_road(
    game: &Game,
    action: &Action,
    player_id: PlayerId,
    from: VertexId,
    to: VertexId,
) -> Result<(), RuleError> {
    match game.phase {
        GamePhase::Setup {
            placing: SetupPlacing::Road { settlement },
            ..
        } => {
            let edge = road_edge(game, from, to)?;
            if game.ledger.road_at(edge) != EdgeBuilding::Empty {
                return Err(spatial(SpatialViolation::Occupied));
            }
            if !game.board.vertices_of_edge(edge).contains(&settlement) {
                return Err(spatial(SpatialViolation::Disconnected));
            }
            Ok(())
        }
        GamePhase::Main => {
            let p = player(game, player_id);
            if game.free_roads == 0 {
                require_resources(p, &costs::road())?;
            }
            if p.roads_remaining == 0 {
                return Err(RuleError::NoPiecesRemaining);
            }
            let edge = road_edge(game, from, to)?;
            if game.ledger.road_at(edge) != EdgeBuilding::Empty {
                return Err(spatial(SpatialViolation::Occupied));
            }
            if !game.ledger.road_connects(&game.board, edge, player_id) {
                return Err(spatial(SpatialViolation::Disconnected));
            }
            Ok(())
        }
        _ => Err(invalid_phase(game, action)),
    }
}

fn validate_city(game: &Game, action: &Action, player_id: PlayerId, v: VertexId) -> Result<(), RuleError> {
    expect_phase(game, action, game.phase == GamePhase::Main)?;
    let p = player(game, player_id);
    require_resources(p, &costs::city())?;
    if p.cities_remaining == 0 {
        return Err(RuleError::NoPiecesRemaining);
    }
    if !game.board.is_vertex(v) {
        return Err(spatial(SpatialViolation::UnknownLocation));
    }
    if game.ledger.building_at(v) != VertexBuilding::Settlement(player_id) {
        return Err(spatial(SpatialViolation::NotOwnSettlement));
    }
    Ok(())
}

/// How many cards `requesting` a bank trade of `offering` yields, if the
/// offer is an exact multiple of the player's ratios
pub fn bank_trade_yield(game: &Game, player_id: PlayerId, offering: &ResourceHand) -> Option<u32> {
    let mut units = 0;
    for resource in offering.kinds() {
        let ratio = game.ledger.trade_ratio(&game.board, player_id, resource);
        let count = offering.get(resource);
        if count % ratio != 0 {
            return None;
        }
        units += count / ratio;
    }
    Some(units)
}

fn validate_trade(
    game: &Game,
    action: &Action,
    player_id: PlayerId,
    offering: &ResourceHand,
    requesting: &ResourceHand,
    target: Option<PlayerId>,
) -> Result<(), RuleError> {
    expect_phase(game, action, game.phase == GamePhase::Main)?;
    if offering.is_empty() || requesting.is_empty() {
        return Err(RuleError::InvalidTrade);
    }
    if Resource::ALL
        .iter()
        .any(|r| offering.get(*r) > 0 && requesting.get(*r) > 0)
    {
        return Err(RuleError::InvalidTrade);
    }
    require_resources(player(game, player_id), offering)?;

    match target {
        None => {
            if bank_trade_yield(game, player_id, offering) != Some(requesting.total()) {
                return Err(RuleError::InvalidTrade);
            }
            if !game.bank.can_supply(requesting) {
                return Err(RuleError::InsufficientResources);
            }
            Ok(())
        }
        Some(target) => {
            let partner = game.player(target).ok_or(RuleError::UnknownPlayer(target))?;
            if target == player_id {
                return Err(RuleError::InvalidTrade);
            }
            require_resources(partner, requesting)
        }
    }
}

fn validate_card(
    game: &Game,
    action: &Action,
    player_id: PlayerId,
    card: DevelopmentCard,
    data: Option<&CardData>,
) -> Result<(), RuleError> {
    expect_phase(game, action, game.phase == GamePhase::Main)?;
    let p = player(game, player_id);

    if card == DevelopmentCard::VictoryPoint {
        if p.hidden_victory_points() == 0 {
            return Err(RuleError::CardNotHeld(card));
        }
        if p.total_victory_points() < game.config.victory_points_to_win {
            return Err(RuleError::VictoryThresholdNotReached);
        }
        return Ok(());
    }

    if game.dev_card_played {
        return Err(RuleError::CardAlreadyPlayed);
    }
    if p.dev_cards.count(card) == 0 {
        return Err(RuleError::CardNotHeld(card));
    }

    match (card, data) {
        (DevelopmentCard::RoadBuilding, _) => {
            if p.roads_remaining == 0 {
                return Err(RuleError::NoPiecesRemaining);
            }
        }
        (DevelopmentCard::YearOfPlenty, Some(CardData::YearOfPlenty { resources })) => {
            let mut wanted = ResourceHand::new();
            for r in resources {
                wanted.add(*r, 1);
            }
            if !game.bank.can_supply(&wanted) {
                return Err(RuleError::InsufficientResources);
            }
        }
        (DevelopmentCard::Monopoly, Some(CardData::Monopoly { .. })) => {}
        (DevelopmentCard::YearOfPlenty | DevelopmentCard::Monopoly, _) => {
            return Err(RuleError::InvalidCardData);
        }
        _ => {}
    }
    Ok(())
}

fn validate_robber(
    game: &Game,
    action: &Action,
    player_id: PlayerId,
    tile: TileId,
    steal_from: Option<PlayerId>,
) -> Result<(), RuleError> {
    expect_phase(game, action, game.phase == GamePhase::MoveRobber)?;
    if !game.board.is_tile(tile) || tile == game.board.robber() {
        return Err(RuleError::InvalidRobberTarget);
    }
    if let Some(victim) = steal_from {
        if game.player(victim).is_none() {
            return Err(RuleError::UnknownPlayer(victim));
        }
        if victim == player_id || !game.ledger.players_on_tile(&game.board, tile).contains(&victim) {
            return Err(RuleError::InvalidRobberTarget);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoardLayout, GameConfig};
    use crate::player::PlayerSeat;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn main_phase_game() -> Game {
        let roster = [PlayerSeat::new("a"), PlayerSeat::new("b"), PlayerSeat::new("c")];
        let config = GameConfig::default().with_layout(BoardLayout::Beginner);
        let mut game = Game::new("T", &roster, config, &mut StdRng::seed_from_u64(1)).unwrap();
        game.phase = GamePhase::Main;
        game.turn_number = 1;
        game
    }

    fn give(game: &mut Game, player: PlayerId, hand: ResourceHand) {
        game.bank.withdraw(&hand);
        game.players[player as usize].resources.add_hand(&hand);
    }

    #[test]
    fn test_turn_checked_before_phase() {
        let game = main_phase_game();
        let roll = Action::EndTurn { player_id: 1 };
        assert_eq!(validate(&game, &roll), Err(RuleError::NotYourTurn));
        assert_eq!(
            validate(&game, &Action::DiceRoll { value1: 3, value2: 4 }),
            Err(RuleError::InvalidPhase {
                action: "diceRoll".into(),
                phase: "main".into()
            })
        );
    }

    #[test]
    fn test_unknown_player() {
        let game = main_phase_game();
        assert_eq!(
            validate(&game, &Action::EndTurn { player_id: 9 }),
            Err(RuleError::UnknownPlayer(9))
        );
    }

    #[test]
    fn test_dice_range() {
        let mut game = main_phase_game();
        game.phase = GamePhase::Rolling;
        assert_eq!(
            validate(&game, &Action::DiceRoll { value1: 0, value2: 4 }),
            Err(RuleError::InvalidDice)
        );
        assert_eq!(
            validate(&game, &Action::DiceRoll { value1: 6, value2: 7 }),
            Err(RuleError::InvalidDice)
        );
        assert!(validate(&game, &Action::DiceRoll { value1: 6, value2: 6 }).is_ok());
    }

    #[test]
    fn test_settlement_rules_in_order() {
        let mut game = main_phase_game();
        let corners = *game.board.tile_vertices(TileId(0));
        let build = |v| Action::BuildSettlement {
            player_id: 0,
            position: v,
        };

        assert_eq!(validate(&game, &build(corners[0])), Err(RuleError::InsufficientResources));
        give(&mut game, 0, costs::settlement());

        game.ledger.place_settlement(corners[0], 1);
        assert_eq!(validate(&game, &build(corners[0])), Err(spatial(SpatialViolation::Occupied)));
        assert_eq!(validate(&game, &build(corners[1])), Err(spatial(SpatialViolation::TooClose)));
        assert_eq!(validate(&game, &build(corners[3])), Err(spatial(SpatialViolation::Disconnected)));

        let road = game.board.edge_between(corners[3], corners[4]).unwrap();
        game.ledger.place_road(road, 0);
        assert_eq!(validate(&game, &build(corners[3])), Ok(()));
        assert_eq!(
            validate(&game, &build(VertexId(99))),
            Err(spatial(SpatialViolation::UnknownLocation))
        );
    }

    #[test]
    fn test_road_needs_adjacent_corners_and_connection() {
        let mut game = main_phase_game();
        let corners = *game.board.tile_vertices(TileId(0));
        give(&mut game, 0, costs::road());

        let road = |from, to| Action::BuildRoad {
            player_id: 0,
            from,
            to,
        };
        assert_eq!(
            validate(&game, &road(corners[0], corners[2])),
            Err(spatial(SpatialViolation::NotAnEdge))
        );
        assert_eq!(
            validate(&game, &road(corners[0], corners[1])),
            Err(spatial(SpatialViolation::Disconnected))
        );
        game.ledger.place_settlement(corners[0], 0);
        assert_eq!(validate(&game, &road(corners[0], corners[1])), Ok(()));
        assert_eq!(validate(&game, &road(corners[1], corners[0])), Ok(()));
    }

    #[test]
    fn test_free_roads_skip_cost() {
        let mut game = main_phase_game();
        let corners = *game.board.tile_vertices(TileId(0));
        game.ledger.place_settlement(corners[0], 0);
        let action = Action::BuildRoad {
            player_id: 0,
            from: corners[0],
            to: corners[1],
        };
        assert_eq!(validate(&game, &action), Err(RuleError::InsufficientResources));
        game.free_roads = 2;
        assert_eq!(validate(&game, &action), Ok(()));
    }

    #[test]
    fn test_city_needs_own_settlement() {
        let mut game = main_phase_game();
        give(&mut game, 0, costs::city());
        let v = game.board.tile_vertices(TileId(3))[2];
        let city = Action::BuildCity {
            player_id: 0,
            position: v,
        };
        assert_eq!(validate(&game, &city), Err(spatial(SpatialViolation::NotOwnSettlement)));
        game.ledger.place_settlement(v, 1);
        assert_eq!(validate(&game, &city), Err(spatial(SpatialViolation::NotOwnSettlement)));
    }

    #[test]
    fn test_bank_trade_ratios() {
        let mut game = main_phase_game();
        give(&mut game, 0, ResourceHand::single(Resource::Wood, 8));
        let trade = |wood, ore| Action::Trade {
            player_id: 0,
            offering: ResourceHand::single(Resource::Wood, wood),
            requesting: ResourceHand::single(Resource::Ore, ore),
            target_player: None,
        };
        assert_eq!(validate(&game, &trade(4, 1)), Ok(()));
        assert_eq!(validate(&game, &trade(8, 2)), Ok(()));
        assert_eq!(validate(&game, &trade(3, 1)), Err(RuleError::InvalidTrade));
        assert_eq!(validate(&game, &trade(8, 1)), Err(RuleError::InvalidTrade));
        assert_eq!(validate(&game, &trade(12, 3)), Err(RuleError::InsufficientResources));

        let same_type = Action::Trade {
            player_id: 0,
            offering: ResourceHand::single(Resource::Wood, 4),
            requesting: ResourceHand::single(Resource::Wood, 1),
            target_player: None,
        };
        assert_eq!(validate(&game, &same_type), Err(RuleError::InvalidTrade));
    }

    #[test]
    fn test_player_trade_checks_both_hands() {
        let mut game = main_phase_game();
        give(&mut game, 0, ResourceHand::single(Resource::Brick, 1));
        let offer = |target| Action::Trade {
            player_id: 0,
            offering: ResourceHand::single(Resource::Brick, 1),
            requesting: ResourceHand::single(Resource::Sheep, 1),
            target_player: Some(target),
        };
        assert_eq!(validate(&game, &offer(1)), Err(RuleError::InsufficientResources));
        give(&mut game, 1, ResourceHand::single(Resource::Sheep, 1));
        assert_eq!(validate(&game, &offer(1)), Ok(()));
        assert_eq!(validate(&game, &offer(0)), Err(RuleError::InvalidTrade));
        assert_eq!(validate(&game, &offer(7)), Err(RuleError::UnknownPlayer(7)));
    }

    #[test]
    fn test_accept_requires_pending_offer_for_that_player() {
        let mut game = main_phase_game();
        assert_eq!(
            validate(&game, &Action::AcceptTrade { player_id: 1 }),
            Err(RuleError::NoPendingTrade)
        );
        game.pending_trade = Some(crate::actions::TradeOffer {
            from: 0,
            to: 1,
            offering: ResourceHand::new(),
            requesting: ResourceHand::new(),
        });
        assert_eq!(validate(&game, &Action::AcceptTrade { player_id: 1 }), Ok(()));
        assert_eq!(
            validate(&game, &Action::AcceptTrade { player_id: 2 }),
            Err(RuleError::NoPendingTrade)
        );
        assert_eq!(validate(&game, &Action::RejectTrade { player_id: 0 }), Ok(()));
    }

    #[test]
    fn test_card_rules() {
        let mut game = main_phase_game();
        let play = |card, data| Action::PlayDevelopmentCard {
            player_id: 0,
            card_type: card,
            card_data: data,
        };

        assert_eq!(
            validate(&game, &play(DevelopmentCard::Knight, None)),
            Err(RuleError::CardNotHeld(DevelopmentCard::Knight))
        );
        game.players[0].bought_this_turn.add(DevelopmentCard::Knight);
        assert_eq!(
            validate(&game, &play(DevelopmentCard::Knight, None)),
            Err(RuleError::CardNotHeld(DevelopmentCard::Knight))
        );

        game.players[0].dev_cards.add(DevelopmentCard::Monopoly);
        assert_eq!(
            validate(&game, &play(DevelopmentCard::Monopoly, None)),
            Err(RuleError::InvalidCardData)
        );
        let ore = Some(CardData::Monopoly { resource: Resource::Ore });
        assert_eq!(validate(&game, &play(DevelopmentCard::Monopoly, ore)), Ok(()));

        game.dev_card_played = true;
        assert_eq!(
            validate(&game, &play(DevelopmentCard::Monopoly, ore)),
            Err(RuleError::CardAlreadyPlayed)
        );
    }

    #[test]
    fn test_victory_point_reveal_needs_threshold() {
        let mut game = main_phase_game();
        game.players[0].dev_cards.add(DevelopmentCard::VictoryPoint);
        let reveal = Action::PlayDevelopmentCard {
            player_id: 0,
            card_type: DevelopmentCard::VictoryPoint,
            card_data: None,
        };
        assert_eq!(validate(&game, &reveal), Err(RuleError::VictoryThresholdNotReached));

        game.config.victory_points_to_win = 1;
        game.dev_card_played = true;
        assert_eq!(validate(&game, &reveal), Ok(()));
    }

    #[test]
    fn test_discard_count() {
        let mut game = main_phase_game();
        give(&mut game, 1, ResourceHand::with_amounts(3, 2, 2, 2, 0));
        game.phase = GamePhase::Discard { pending: vec![1] };

        let discard = |hand| Action::Discard {
            player_id: 1,
            discarding: hand,
        };
        assert_eq!(
            validate(&game, &discard(ResourceHand::with_amounts(3, 0, 0, 0, 0))),
            Err(RuleError::InvalidDiscardCount { expected: 4, got: 3 })
        );
        assert_eq!(
            validate(&game, &discard(ResourceHand::with_amounts(0, 0, 0, 0, 4))),
            Err(RuleError::InvalidDiscardCount { expected: 4, got: 4 })
        );
        assert_eq!(validate(&game, &discard(ResourceHand::with_amounts(3, 1, 0, 0, 0))), Ok(()));
        assert_eq!(
            validate(
                &game,
                &Action::Discard {
                    player_id: 2,
                    discarding: ResourceHand::new()
                }
            ),
            Err(RuleError::NotYourTurn)
        );
    }

    #[test]
    fn test_robber_target_rules() {
        let mut game = main_phase_game();
        game.phase = GamePhase::MoveRobber;
        let here = game.board.robber();
        let target = TileId(if here == TileId(5) { 6 } else { 5 });
        game.ledger.place_settlement(game.board.tile_vertices(target)[0], 1);

        let rob = |tile, victim| Action::MoveRobber {
            player_id: 0,
            tile_position: tile,
            steal_from: victim,
        };
        assert_eq!(validate(&game, &rob(here, None)), Err(RuleError::InvalidRobberTarget));
        assert_eq!(validate(&game, &rob(TileId(19), None)), Err(RuleError::InvalidRobberTarget));
        assert_eq!(validate(&game, &rob(target, Some(2))), Err(RuleError::InvalidRobberTarget));
        assert_eq!(validate(&game, &rob(target, Some(0))), Err(RuleError::InvalidRobberTarget));
        assert_eq!(validate(&game, &rob(target, Some(1))), Ok(()));
        assert_eq!(validate(&game, &rob(target, None)), Ok(()));
    }

    #[test]
    fn test_nothing_allowed_after_game_ends() {
        let mut game = main_phase_game();
        game.phase = GamePhase::Ended { winner: 0 };
        assert_eq!(
            validate(&game, &Action::EndTurn { player_id: 0 }),
            Err(RuleError::GameOver)
        );
    }
}
