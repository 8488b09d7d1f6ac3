//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::room::{GameRoom, RoomError};
use catan_rules::{GameConfig, GameEvent, PlayerSeat};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

const ROOM_CODE_LEN: usize = 6;
/// Room code alphabet without look-alike characters
const ROOM_CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Messages queued for delivery once the room lock is released
type Outbox = Vec<(Uuid, ServerMessage)>;

/// Server state shared across all connections.
pub struct ServerState {
    /// All active rooms by code
    pub rooms: DashMap<String, GameRoom>,
    /// Mapping from connection ID to its room code
    pub connection_rooms: DashMap<Uuid, String>,
    /// Mapping from connection ID to its message sender
    pub senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// Connection that created each room, until it disconnects
    pub room_creators: DashMap<String, Uuid>,
    /// Settings for rooms created without their own
    pub default_config: GameConfig,
}

impl ServerState {
    pub fn new(default_config: GameConfig) -> Self {
        Self {
            rooms: DashMap::new(),
            connection_rooms: DashMap::new(),
            senders: DashMap::new(),
            room_creators: DashMap::new(),
            default_config,
        }
    }

    /// Register a connection and return the receiving end of its outbox
    pub fn connect(&self, connection: Uuid) -> mpsc::UnboundedReceiver<ServerMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.insert(connection, tx);
        rx
    }

    /// Send a message to a specific connection.
    pub fn send_to(&self, connection: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&connection) {
            let _ = sender.send(msg);
        }
    }

    fn deliver(&self, outbox: Outbox) {
        for (connection, msg) in outbox {
            self.send_to(connection, msg);
        }
    }

    /// Create a room under a fresh code
    pub fn create_room(&self, roster: &[PlayerSeat], config: Option<GameConfig>) -> Result<String, RoomError> {
        let config = config.unwrap_or_else(|| self.default_config.clone());
        loop {
            let code = generate_room_code();
            match self.rooms.entry(code.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    slot.insert(GameRoom::new(code.clone(), roster, config)?);
                    return Ok(code);
                }
            }
        }
    }
}

fn generate_room_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_CHARS[rng.gen_range(0..ROOM_CODE_CHARS.len())] as char)
        .collect()
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Catan host listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(stream: TcpStream, addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let connection_id = Uuid::new_v4();
    let mut rx = state.connect(connection_id);

    let welcome = ServerMessage::Welcome { connection_id };
    ws_sender.send(Message::Text(serde_json::to_string(&welcome)?)).await?;

    // Forward the outbox to the socket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            match serde_json::to_string(&msg) {
                Ok(text) => {
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("Failed to encode message: {}", e),
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(client_msg) => handle_message(connection_id, client_msg, &state),
                Err(e) => {
                    warn!("Invalid message from {}: {}", connection_id, e);
                    state.send_to(
                        connection_id,
                        ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        },
                    );
                }
            },
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", connection_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", connection_id, e);
                break;
            }
            _ => {}
        }
    }

    handle_disconnect(connection_id, &state);
    state.senders.remove(&connection_id);
    send_task.abort();

    info!("Connection closed for {}", connection_id);
    Ok(())
}

/// Handle a client message.
pub fn handle_message(connection: Uuid, msg: ClientMessage, state: &ServerState) {
    match msg {
        ClientMessage::CreateRoom { players, config } => {
            // Seeds are for server-side use only
            let config = config.map(|config| GameConfig { seed: None, ..config });
            create_room_for(connection, &players, config, state);
        }

        ClientMessage::JoinRoom { room_code, seat } => {
            // One room per connection
            if let Some(previous) = state.connection_rooms.get(&connection).map(|r| r.clone()) {
                if previous != room_code {
                    leave_room(connection, &previous, state);
                }
            }

            let joined = match state.rooms.get_mut(&room_code) {
                Some(mut room) => room.join(connection, seat).map(|()| {
                    let engine = room.engine();
                    (engine.public_view(), engine.private_view(seat))
                }),
                None => Err(RoomError::RoomNotFound),
            };

            match joined {
                Ok((public, private)) => {
                    state.connection_rooms.insert(connection, room_code.clone());
                    info!(room = %room_code, seat, "connection {} seated", connection);
                    state.send_to(connection, ServerMessage::Joined { room_code, seat });
                    state.send_to(connection, ServerMessage::PublicState { state: public });
                    if let Some(private) = private {
                        state.send_to(connection, ServerMessage::PrivateState { state: private });
                    }
                }
                Err(e) => {
                    warn!("Join refused for {}: {}", connection, e);
                    state.send_to(connection, ServerMessage::Error { message: e.to_string() });
                }
            }
        }

        ClientMessage::SubmitAction { action } => {
            with_seated_room(connection, state, |room| room.submit(connection, action));
        }

        ClientMessage::RollDice => {
            with_seated_room(connection, state, |room| room.roll_dice(connection));
        }

        ClientMessage::Ping => {
            state.send_to(connection, ServerMessage::Pong);
        }
    }
}

fn create_room_for(connection: Uuid, players: &[PlayerSeat], config: Option<GameConfig>, state: &ServerState) {
    match state.create_room(players, config) {
        Ok(room_code) => {
            info!(room = %room_code, seats = players.len(), "room created");
            state.room_creators.insert(room_code.clone(), connection);
            state.send_to(
                connection,
                ServerMessage::RoomCreated {
                    room_code,
                    seats: players.len(),
                },
            );
        }
        Err(e) => state.send_to(connection, ServerMessage::Error { message: e.to_string() }),
    }
}

/// Run `apply` against the connection's room and publish or reject the result
fn with_seated_room<F>(connection: Uuid, state: &ServerState, apply: F)
where
    F: FnOnce(&mut GameRoom) -> Result<Vec<GameEvent>, RoomError>,
{
    let Some(room_code) = state.connection_rooms.get(&connection).map(|r| r.clone()) else {
        warn!("Action from {} outside any room", connection);
        state.send_to(
            connection,
            ServerMessage::Error {
                message: RoomError::NotSeated.to_string(),
            },
        );
        return;
    };

    let outbox = match state.rooms.get_mut(&room_code) {
        Some(mut room) => match apply(&mut room) {
            Ok(events) => publish(&room, &events),
            Err(e) => vec![(
                connection,
                ServerMessage::ActionRejected {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                },
            )],
        },
        None => vec![(
            connection,
            ServerMessage::Error {
                message: RoomError::RoomNotFound.to_string(),
            },
        )],
    };
    state.deliver(outbox);
}

/// Events, public state and each seat's private state for everyone seated
fn publish(room: &GameRoom, events: &[GameEvent]) -> Outbox {
    let engine = room.engine();
    let public = engine.public_view();
    let mut outbox = Vec::new();

    for (connection, seat) in room.connections() {
        let events = events.iter().map(|e| e.redacted_for(Some(seat))).collect();
        outbox.push((connection, ServerMessage::Events { events }));
        outbox.push((connection, ServerMessage::PublicState { state: public.clone() }));
        if let Some(private) = engine.private_view(seat) {
            outbox.push((connection, ServerMessage::PrivateState { state: private }));
        }
    }

    if let Some((winner, winner_name)) = room.get_winner() {
        if events.iter().any(|e| matches!(e, GameEvent::GameWon { .. })) {
            info!(room = %room.code, winner, "game over");
            for (connection, _) in room.connections() {
                outbox.push((
                    connection,
                    ServerMessage::GameOver {
                        winner,
                        winner_name: winner_name.clone(),
                        final_state: public.clone(),
                    },
                ));
            }
        }
    }
    outbox
}

fn leave_room(connection: Uuid, room_code: &str, state: &ServerState) {
    state.connection_rooms.remove(&connection);

    let (outbox, now_empty) = match state.rooms.get_mut(room_code) {
        Some(mut room) => {
            let seat = room.leave(connection);
            // Keep the game moving when the player whose turn it is goes away
            let current = room.engine().game().current_player;
            let outbox = match seat {
                Some(seat) if seat == current => room
                    .skip_current_turn()
                    .map(|events| publish(&room, &events))
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
            (outbox, room.is_empty())
        }
        None => (Vec::new(), false),
    };

    // Empty rooms are dropped whether or not the game finished
    if now_empty {
        close_room(room_code, state);
    }
    state.deliver(outbox);
}

fn close_room(room_code: &str, state: &ServerState) {
    if state.rooms.remove_if(room_code, |_, room| room.is_empty()).is_some() {
        state.room_creators.remove(room_code);
        info!(room = %room_code, "empty room closed");
    }
}

/// Handle connection disconnect.
fn handle_disconnect(connection: Uuid, state: &ServerState) {
    if let Some(room_code) = state.connection_rooms.get(&connection).map(|r| r.clone()) {
        leave_room(connection, &room_code, state);
    }

    // Rooms this connection created but nobody joined
    let created: Vec<String> = state
        .room_creators
        .iter()
        .filter(|entry| *entry.value() == connection)
        .map(|entry| entry.key().clone())
        .collect();
    for room_code in created {
        close_room(&room_code, state);
        state.room_creators.remove(&room_code);
    }
}
