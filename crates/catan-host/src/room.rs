//! Game room management.

use catan_rules::{
    Action, CreateGameError, GameConfig, GameEngine, GameEvent, GamePhase, PlayerId, PlayerSeat, RuleError,
};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Seat {0} does not exist")]
    NoSuchSeat(PlayerId),

    #[error("Seat {0} is already taken")]
    SeatTaken(PlayerId),

    #[error("Connection is not seated in this room")]
    NotSeated,

    #[error("Action is for player {claimed} but this connection plays seat {seat}")]
    SeatMismatch { claimed: PlayerId, seat: PlayerId },

    #[error("Dice are rolled by the host")]
    ClientDice,

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Create(#[from] CreateGameError),
}

impl RoomError {
    /// Machine-readable kind sent with a rejection
    pub fn kind(&self) -> &'static str {
        match self {
            RoomError::RoomNotFound => "RoomNotFound",
            RoomError::NoSuchSeat(_) => "NoSuchSeat",
            RoomError::SeatTaken(_) => "SeatTaken",
            RoomError::NotSeated => "NotSeated",
            RoomError::SeatMismatch { .. } => "SeatMismatch",
            RoomError::ClientDice => "ClientDice",
            RoomError::Rule(err) => err.kind(),
            RoomError::Create(_) => "CreateGame",
        }
    }
}

/// One game session: an engine plus which connection plays which seat.
pub struct GameRoom {
    pub code: String,
    engine: GameEngine,
    /// Connection to seat
    seats: HashMap<Uuid, PlayerId>,
}

impl GameRoom {
    pub fn new(code: String, roster: &[PlayerSeat], config: GameConfig) -> Result<Self, RoomError> {
        let engine = GameEngine::new(code.clone(), roster, config)?;
        Ok(Self {
            code,
            engine,
            seats: HashMap::new(),
        })
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    pub fn seat_count(&self) -> usize {
        self.engine.game().player_count()
    }

    pub fn seat_of(&self, connection: Uuid) -> Option<PlayerId> {
        self.seats.get(&connection).copied()
    }

    /// Seated connections and their seats
    pub fn connections(&self) -> impl Iterator<Item = (Uuid, PlayerId)> + '_ {
        self.seats.iter().map(|(c, s)| (*c, *s))
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Bind `connection` to `seat`; a connection may move to a free seat
    pub fn join(&mut self, connection: Uuid, seat: PlayerId) -> Result<(), RoomError> {
        if seat as usize >= self.seat_count() {
            return Err(RoomError::NoSuchSeat(seat));
        }
        if self.seats.iter().any(|(c, s)| *s == seat && *c != connection) {
            return Err(RoomError::SeatTaken(seat));
        }
        self.seats.insert(connection, seat);
        Ok(())
    }

    pub fn leave(&mut self, connection: Uuid) -> Option<PlayerId> {
        self.seats.remove(&connection)
    }

    /// Parse and apply an action on behalf of `connection`'s seat.
    ///
    /// A `diceRoll` is always rolled here; one carrying its own values is refused.
    pub fn submit(&mut self, connection: Uuid, payload: serde_json::Value) -> Result<Vec<GameEvent>, RoomError> {
        let seat = self.seat_of(connection).ok_or(RoomError::NotSeated)?;

        if payload.get("type").and_then(|t| t.as_str()) == Some("diceRoll") {
            if payload.get("value1").is_some() || payload.get("value2").is_some() {
                return Err(RoomError::ClientDice);
            }
            return self.roll_dice(connection);
        }

        let action = Action::from_json(payload)?;
        if let Some(claimed) = action.player().filter(|&claimed| claimed != seat) {
            return Err(RoomError::SeatMismatch { claimed, seat });
        }
        Ok(self.engine.apply(action)?)
    }

    pub fn roll_dice(&mut self, connection: Uuid) -> Result<Vec<GameEvent>, RoomError> {
        let seat = self.seat_of(connection).ok_or(RoomError::NotSeated)?;
        if seat != self.engine.game().current_player {
            return Err(RuleError::NotYourTurn.into());
        }
        Ok(self.engine.roll_dice()?)
    }

    /// End the current seat's turn on its behalf, if the phase allows it
    pub fn skip_current_turn(&mut self) -> Option<Vec<GameEvent>> {
        let game = self.engine.game();
        if !matches!(game.phase, GamePhase::Rolling | GamePhase::Main) {
            return None;
        }
        let player_id = game.current_player;
        self.engine.apply(Action::SkipTurn { player_id }).ok()
    }

    pub fn get_winner(&self) -> Option<(PlayerId, String)> {
        let game = self.engine.game();
        let winner = game.winner()?;
        let name = game.player(winner)?.name.clone();
        Some((winner, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catan_rules::BoardLayout;
    use serde_json::json;

    fn new_room() -> GameRoom {
        let roster = [PlayerSeat::new("Ah Kow"), PlayerSeat::new("Mei Ling")];
        let config = GameConfig::seeded(11).with_layout(BoardLayout::Beginner);
        GameRoom::new("ROOM01".to_string(), &roster, config).unwrap()
    }

    #[test]
    fn test_create_room() {
        let room = new_room();
        assert_eq!(room.seat_count(), 2);
        assert!(room.is_empty());

        let too_small = GameRoom::new("X".into(), &[PlayerSeat::new("solo")], GameConfig::default());
        assert!(matches!(too_small, Err(RoomError::Create(CreateGameError::PlayerCount(1)))));
    }

    #[test]
    fn test_join_and_leave() {
        let mut room = new_room();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        room.join(a, 0).unwrap();
        assert!(matches!(room.join(b, 0), Err(RoomError::SeatTaken(0))));
        assert!(matches!(room.join(b, 5), Err(RoomError::NoSuchSeat(5))));
        room.join(b, 1).unwrap();
        assert_eq!(room.seat_of(b), Some(1));

        assert_eq!(room.leave(a), Some(0));
        assert_eq!(room.seat_of(a), None);
        room.join(b, 0).unwrap();
        assert_eq!(room.connections().count(), 1);
    }

    #[test]
    fn test_cannot_act_for_another_seat() {
        let mut room = new_room();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        room.join(a, 0).unwrap();
        room.join(b, 1).unwrap();

        let spoofed = room.submit(b, json!({"type": "buildSettlement", "playerId": 0, "position": 3}));
        assert!(matches!(spoofed, Err(RoomError::SeatMismatch { claimed: 0, seat: 1 })));

        let stranger = room.submit(Uuid::new_v4(), json!({"type": "endTurn", "playerId": 0}));
        assert!(matches!(stranger, Err(RoomError::NotSeated)));

        let events = room
            .submit(a, json!({"type": "buildSettlement", "playerId": 0, "position": 3}))
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_rule_errors_keep_their_kind() {
        let mut room = new_room();
        let a = Uuid::new_v4();
        room.join(a, 0).unwrap();
        let err = room
            .submit(a, json!({"type": "buildCity", "playerId": 0, "position": 3}))
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidPhase");

        let err = room.submit(a, json!({"type": "fly", "playerId": 0})).unwrap_err();
        assert_eq!(err.kind(), "UnknownActionType");
    }

    #[test]
    fn test_client_cannot_choose_dice() {
        let mut room = new_room();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        room.join(a, 0).unwrap();
        room.join(b, 1).unwrap();
        for conn in [a, b, b, a] {
            for _ in 0..2 {
                let seat = room.seat_of(conn).unwrap();
                let action = room.engine().legal_actions(seat).into_iter().next().unwrap();
                room.submit(conn, serde_json::to_value(action).unwrap()).unwrap();
            }
        }

        let loaded = room.submit(a, json!({"type": "diceRoll", "value1": 6, "value2": 2}));
        assert!(matches!(loaded, Err(RoomError::ClientDice)));
        assert_eq!(room.engine().game().phase, GamePhase::Rolling);
        assert_eq!(room.engine().game().dice, None);

        let half = room.submit(a, json!({"type": "diceRoll", "value1": 6}));
        assert!(matches!(half, Err(RoomError::ClientDice)));
        assert_eq!(room.engine().game().dice, None);
    }

    #[test]
    fn test_dice_rolled_by_room_and_skip() {
        let mut room = new_room();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        room.join(a, 0).unwrap();
        room.join(b, 1).unwrap();

        // Snake draft: seats 0, 1, 1, 0
        for conn in [a, b, b, a] {
            let seat = room.seat_of(conn).unwrap();
            let action = room.engine().legal_actions(seat).into_iter().next().unwrap();
            room.submit(conn, serde_json::to_value(action).unwrap()).unwrap();
            let action = room.engine().legal_actions(seat).into_iter().next().unwrap();
            room.submit(conn, serde_json::to_value(action).unwrap()).unwrap();
        }
        assert_eq!(room.engine().game().phase, GamePhase::Rolling);

        assert!(matches!(room.roll_dice(b), Err(RoomError::Rule(RuleError::NotYourTurn))));
        let events = room.submit(a, json!({"type": "diceRoll"})).unwrap();
        assert!(matches!(events[0], GameEvent::DiceRolled { player: 0, .. }));

        if matches!(room.engine().game().phase, GamePhase::Main) {
            let skipped = room.skip_current_turn().unwrap();
            assert!(matches!(skipped[0], GameEvent::TurnEnded { skipped: true, .. }));
            assert_eq!(room.engine().game().current_player, 1);
        } else {
            assert!(room.skip_current_turn().is_none());
        }
    }
}
