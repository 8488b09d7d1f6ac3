//! Enumerating legal actions.
//!
//! Candidates are generated per phase and then filtered through
//! [`validate`], so this list can never disagree with the validator. Dice
//! rolls are not listed (use the engine's roll), open-ended player trades are
//! reduced to one-for-one proposals, and a pending discard is represented by
//! a single discard taken from the largest piles.

use crate::actions::{Action, CardData};
use crate::board::{PlayerId, TileId, VertexId};
use crate::deck::DevelopmentCard;
use crate::game::{Game, GamePhase, SetupPlacing};
use crate::ledger::VertexBuilding;
use crate::resources::{Resource, ResourceHand};
use crate::validate::validate;

/// Every action `player` could submit right now
pub fn legal_actions(game: &Game, player: PlayerId) -> Vec<Action> {
    if game.player(player).is_none() {
        return Vec::new();
    }
    candidates(game, player)
        .into_iter()
        .filter(|action| validate(game, action).is_ok())
        .collect()
}

fn candidates(game: &Game, player: PlayerId) -> Vec<Action> {
    let mut out = Vec::new();
    match &game.phase {
        GamePhase::Setup { placing, .. } => match placing {
            SetupPlacing::Settlement => {
                for v in 0..game.board.vertex_count() {
                    out.push(Action::BuildSettlement {
                        player_id: player,
                        position: VertexId(v as u8),
                    });
                }
            }
            SetupPlacing::Road { settlement } => {
                for &to in game.board.vertices_adjacent_to(*settlement) {
                    out.push(Action::BuildRoad {
                        player_id: player,
                        from: *settlement,
                        to,
                    });
                }
            }
        },
        GamePhase::Rolling => out.push(Action::SkipTurn { player_id: player }),
        GamePhase::Main => main_phase(game, player, &mut out),
        GamePhase::Discard { .. } => {
            let hand = game.players[player as usize].resources;
            out.push(Action::Discard {
                player_id: player,
                discarding: largest_piles(hand, hand.total() / 2),
            });
        }
        GamePhase::MoveRobber => {
            for tile in game.board.tiles() {
                out.push(robber_move(player, tile.id, None));
                for victim in game.ledger.players_on_tile(&game.board, tile.id) {
                    out.push(robber_move(player, tile.id, Some(victim)));
                }
            }
        }
        GamePhase::Ended { .. } => {}
    }
    out
}

fn main_phase(game: &Game, player: PlayerId, out: &mut Vec<Action>) {
    for v in game.ledger.legal_settlement_spots(&game.board, player) {
        out.push(Action::BuildSettlement {
            player_id: player,
            position: v,
        });
    }
    for e in game.ledger.legal_road_spots(&game.board, player) {
        let [from, to] = game.board.vertices_of_edge(e);
        out.push(Action::BuildRoad {
            player_id: player,
            from,
            to,
        });
    }
    for (v, building) in game.ledger.buildings() {
        if building == VertexBuilding::Settlement(player) {
            out.push(Action::BuildCity {
                player_id: player,
                position: v,
            });
        }
    }
    out.push(Action::BuyDevelopmentCard { player_id: player });

    let hand = game.players[player as usize].resources;
    for give in hand.kinds().collect::<Vec<_>>() {
        let ratio = game.ledger.trade_ratio(&game.board, player, give);
        for get in Resource::ALL.into_iter().filter(|r| *r != give) {
            out.push(Action::Trade {
                player_id: player,
                offering: ResourceHand::single(give, ratio),
                requesting: ResourceHand::single(get, 1),
                target_player: None,
            });
            for other in game.players.iter().filter(|p| p.id != player) {
                out.push(Action::Trade {
                    player_id: player,
                    offering: ResourceHand::single(give, 1),
                    requesting: ResourceHand::single(get, 1),
                    target_player: Some(other.id),
                });
            }
        }
    }

    for card in [
        DevelopmentCard::Knight,
        DevelopmentCard::RoadBuilding,
        DevelopmentCard::VictoryPoint,
    ] {
        out.push(play(player, card, None));
    }
    for (i, first) in Resource::ALL.into_iter().enumerate() {
        for second in Resource::ALL.into_iter().skip(i) {
            out.push(play(
                player,
                DevelopmentCard::YearOfPlenty,
                Some(CardData::YearOfPlenty {
                    resources: [first, second],
                }),
            ));
        }
        out.push(play(
            player,
            DevelopmentCard::Monopoly,
            Some(CardData::Monopoly { resource: first }),
        ));
    }

    out.push(Action::AcceptTrade { player_id: player });
    out.push(Action::RejectTrade { player_id: player });
    out.push(Action::EndTurn { player_id: player });
}

fn play(player: PlayerId, card: DevelopmentCard, data: Option<CardData>) -> Action {
    Action::PlayDevelopmentCard {
        player_id: player,
        card_type: card,
        card_data: data,
    }
}

fn robber_move(player: PlayerId, tile: TileId, victim: Option<PlayerId>) -> Action {
    Action::MoveRobber {
        player_id: player,
        tile_position: tile,
        steal_from: victim,
    }
}

/// `count` cards taken one at a time from whichever pile is largest
fn largest_piles(hand: ResourceHand, count: u32) -> ResourceHand {
    let mut left = hand;
    let mut taken = ResourceHand::new();
    for _ in 0..count {
        let Some(resource) = Resource::ALL
            .into_iter()
            .filter(|r| left.get(*r) > 0)
            .max_by_key(|r| left.get(*r))
        else {
            break;
        };
        left.subtract(&ResourceHand::single(resource, 1));
        taken.add(resource, 1);
    }
    taken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoardLayout, GameConfig};
    use crate::player::PlayerSeat;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn new_game() -> Game {
        let roster = [PlayerSeat::new("a"), PlayerSeat::new("b")];
        let config = GameConfig::default().with_layout(BoardLayout::Beginner);
        Game::new("L", &roster, config, &mut StdRng::seed_from_u64(4)).unwrap()
    }

    #[test]
    fn test_first_setup_settlement_anywhere() {
        let game = new_game();
        assert_eq!(legal_actions(&game, 0).len(), 54);
        assert!(legal_actions(&game, 1).is_empty());
    }

    #[test]
    fn test_setup_road_touches_settlement() {
        let mut game = new_game();
        let v = VertexId(20);
        game.phase = GamePhase::Setup {
            round: 1,
            placing: SetupPlacing::Road { settlement: v },
        };
        let actions = legal_actions(&game, 0);
        assert_eq!(actions.len(), game.board.vertices_adjacent_to(v).len());
        assert!(actions
            .iter()
            .all(|a| matches!(a, Action::BuildRoad { from, .. } if *from == v)));
    }

    #[test]
    fn test_main_phase_with_empty_hand_only_ends_turn() {
        let mut game = new_game();
        game.phase = GamePhase::Main;
        assert_eq!(legal_actions(&game, 0), vec![Action::EndTurn { player_id: 0 }]);
    }

    #[test]
    fn test_bank_trade_offered_when_affordable() {
        let mut game = new_game();
        game.phase = GamePhase::Main;
        let wood = ResourceHand::single(Resource::Wood, 4);
        game.bank.withdraw(&wood);
        game.players[0].resources.add_hand(&wood);

        let bank_trades = legal_actions(&game, 0)
            .into_iter()
            .filter(|a| matches!(a, Action::Trade { target_player: None, .. }))
            .count();
        assert_eq!(bank_trades, 4);
    }

    #[test]
    fn test_discard_candidate_is_half() {
        let mut game = new_game();
        let hand = ResourceHand::with_amounts(5, 0, 2, 0, 2);
        game.bank.withdraw(&hand);
        game.players[1].resources = hand;
        game.phase = GamePhase::Discard { pending: vec![1] };

        let actions = legal_actions(&game, 1);
        assert_eq!(actions.len(), 1);
        let Action::Discard { discarding, .. } = &actions[0] else {
            panic!("expected a discard");
        };
        assert_eq!(discarding.total(), 4);
        assert!(hand.can_afford(discarding));
    }
}
