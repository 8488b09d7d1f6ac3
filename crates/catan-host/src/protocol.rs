//! WebSocket protocol messages for the room host.

use catan_rules::{GameConfig, GameEvent, PlayerId, PlayerSeat, PrivateView, PublicView};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Create a room for a fixed roster; seats are claimed with `JoinRoom`
    CreateRoom {
        players: Vec<PlayerSeat>,
        /// Any `seed` given here is ignored
        #[serde(default)]
        config: Option<GameConfig>,
    },

    /// Bind this connection to a seat
    JoinRoom { room_code: String, seat: PlayerId },

    /// Submit a game action as its JSON payload
    SubmitAction { action: serde_json::Value },

    /// Roll the dice for this connection's seat
    RollDice,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Welcome message with the assigned connection ID
    Welcome { connection_id: Uuid },

    /// Room created successfully
    RoomCreated { room_code: String, seats: usize },

    /// This connection now plays `seat`
    Joined { room_code: String, seat: PlayerId },

    /// The submitted action was not applied
    ActionRejected { kind: String, message: String },

    /// What an accepted action did
    Events { events: Vec<GameEvent> },

    /// State everyone in the room may see
    PublicState { state: PublicView },

    /// State for this connection's seat only
    PrivateState { state: PrivateView },

    /// Game finished
    GameOver {
        winner: PlayerId,
        winner_name: String,
        final_state: PublicView,
    },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_message_wire_shape() {
        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "JoinRoom",
            "payload": {"roomCode": "KX7P2Q", "seat": 2}
        }))
        .unwrap();
        assert!(matches!(msg, ClientMessage::JoinRoom { ref room_code, seat: 2 } if room_code == "KX7P2Q"));

        let msg: ClientMessage = serde_json::from_value(json!({
            "type": "CreateRoom",
            "payload": {"players": [{"name": "Ah Kow"}, {"name": "Siti", "color": "blue"}]}
        }))
        .unwrap();
        let ClientMessage::CreateRoom { players, config } = msg else {
            panic!("expected CreateRoom");
        };
        assert_eq!(players.len(), 2);
        assert!(config.is_none());

        let ping: ClientMessage = serde_json::from_value(json!({"type": "Ping"})).unwrap();
        assert!(matches!(ping, ClientMessage::Ping));
    }

    #[test]
    fn test_server_message_wire_shape() {
        let msg = ServerMessage::ActionRejected {
            kind: "NotYourTurn".into(),
            message: "not your turn".into(),
        };
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "type": "ActionRejected",
                "payload": {"kind": "NotYourTurn", "message": "not your turn"}
            })
        );
        assert_eq!(serde_json::to_value(ServerMessage::Pong).unwrap(), json!({"type": "Pong"}));
    }
}
