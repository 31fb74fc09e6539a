use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::chat::{ClientMessage, ServerMessage},
    error::ServiceError,
    services::{
        chat_service,
        group_service::{load_group, require_member},
        room_events,
        user_service::{self, ActingUser},
    },
    state::{ConnectionId, RoomEvent, SharedState},
};

/// Internal error type for frame handling.
///
/// Service failures are reported to the client as `error` frames; a closed writer ends
/// the session.
#[derive(Debug, Error)]
enum SessionError {
    /// Writer channel closed; the connection must be terminated.
    #[error("connection closed")]
    ConnectionClosed,
    #[error("join the group first")]
    NotJoined,
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Handle the full lifecycle of a chat WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Room forwarders and direct replies share this writer.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let Some(actor) = handshake(&state, &mut receiver, &outbound_tx).await else {
        finalize(writer_task, outbound_tx).await;
        return;
    };
    let user_id = actor.id;
    let mut session = Session::new(state, actor, outbound_tx);
    info!(%user_id, connection = session.connection, "chat client connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Err(SessionError::ConnectionClosed) = session.handle_text(&text).await {
                    info!(%user_id, "connection closed while replying, terminating");
                    break;
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = session.tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                let _ = session.tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%user_id, error = %err, "websocket error");
                break;
            }
        }
    }

    info!(%user_id, "chat client disconnected");
    finalize(writer_task, session.close()).await;
}

/// Wait for the `identify` frame and answer `identified`.
///
/// Returns `None` when the client must be dropped: timeout, a first frame that is not a
/// valid `identify`, or an unknown user. Close and error frames are queued on `tx`.
async fn handshake<S>(
    state: &SharedState,
    receiver: &mut S,
    tx: &mpsc::UnboundedSender<Message>,
) -> Option<ActingUser>
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    let timeout = state.config().identification_timeout();
    let initial_message = match tokio::time::timeout(timeout, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => return None,
        Ok(Some(Ok(_))) => {
            warn!("first websocket frame was not text");
            let _ = tx.send(Message::Close(None));
            return None;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            return None;
        }
        Ok(None) | Err(_) => {
            warn!("websocket identification timed out");
            let _ = tx.send(Message::Close(None));
            return None;
        }
    };

    let user_id = match ClientMessage::from_json_str(&initial_message) {
        Ok(ClientMessage::Identify { user_id }) => user_id,
        Ok(_) => {
            warn!("first message was not identification");
            let _ = tx.send(Message::Close(None));
            return None;
        }
        Err(err) => {
            warn!(error = %err, "failed to parse chat message");
            let _ = tx.send(Message::Close(None));
            return None;
        }
    };

    let actor = match user_service::identify(state, user_id).await {
        Ok(actor) => actor,
        Err(err) => {
            warn!(%user_id, error = %err, "websocket identification refused");
            let _ = send_message_to_websocket(tx, &ServerMessage::error(err.to_string()));
            let _ = tx.send(Message::Close(None));
            return None;
        }
    };

    send_message_to_websocket(tx, &ServerMessage::Identified { user_id }).ok()?;
    Some(actor)
}

/// Identified connection and the group rooms it listens to.
struct Session {
    state: SharedState,
    actor: ActingUser,
    connection: ConnectionId,
    tx: mpsc::UnboundedSender<Message>,
    rooms: HashMap<Uuid, JoinHandle<()>>,
}

impl Session {
    fn new(state: SharedState, actor: ActingUser, tx: mpsc::UnboundedSender<Message>) -> Self {
        let connection = state.rooms().next_connection_id();
        Self {
            state,
            actor,
            connection,
            tx,
            rooms: HashMap::new(),
        }
    }

    /// Handle one text frame. Failures other than a closed writer become `error` frames.
    async fn handle_text(&mut self, text: &str) -> Result<(), SessionError> {
        let frame = match ClientMessage::from_json_str(text) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(user_id = %self.actor.id, error = %err, "failed to parse chat message");
                return self.reply(&ServerMessage::error("malformed message"));
            }
        };

        match self.dispatch(frame).await {
            Err(SessionError::ConnectionClosed) => Err(SessionError::ConnectionClosed),
            Err(err) => {
                debug!(user_id = %self.actor.id, error = %err, "chat frame refused");
                self.reply(&ServerMessage::error(err.to_string()))
            }
            Ok(()) => Ok(()),
        }
    }

    async fn dispatch(&mut self, frame: ClientMessage) -> Result<(), SessionError> {
        match frame {
            ClientMessage::Identify { .. } => {
                warn!(user_id = %self.actor.id, "ignoring duplicate identification message");
                Ok(())
            }
            ClientMessage::JoinGroups => {
                let store = self.state.store().await?;
                let groups: Vec<Uuid> = store
                    .list_member_groups(self.actor.id)
                    .await
                    .map_err(ServiceError::from)?
                    .into_iter()
                    .map(|group| group.id)
                    .collect();
                for group_id in &groups {
                    self.join(*group_id);
                }
                self.reply(&ServerMessage::GroupsJoined { groups })
            }
            ClientMessage::JoinGroup { group_id } => {
                let store = self.state.store().await?;
                let group = load_group(&store, group_id).await?;
                require_member(&group, self.actor.id)?;
                self.join(group_id);
                self.reply(&ServerMessage::GroupsJoined {
                    groups: vec![group_id],
                })
            }
            ClientMessage::LeaveGroup { group_id } => {
                self.leave(group_id);
                Ok(())
            }
            ClientMessage::SendMessage {
                group_id,
                text,
                kind,
                reply_to,
            } => {
                chat_service::send_message(&self.state, &self.actor, group_id, &text, kind, reply_to)
                    .await?;
                Ok(())
            }
            ClientMessage::MarkRead { message_id } => {
                chat_service::mark_read(&self.state, &self.actor, message_id, self.connection).await?;
                Ok(())
            }
            ClientMessage::TypingStart { group_id } => {
                let payload = ServerMessage::UserTyping {
                    group_id,
                    user_id: self.actor.id,
                    user_name: self.actor.name.clone(),
                };
                self.announce(group_id, &payload)
            }
            ClientMessage::TypingStop { group_id } => {
                let payload = ServerMessage::UserStoppedTyping {
                    group_id,
                    user_id: self.actor.id,
                };
                self.announce(group_id, &payload)
            }
            ClientMessage::AddReaction { message_id, emoji } => {
                chat_service::toggle_reaction(&self.state, &self.actor, message_id, &emoji).await?;
                Ok(())
            }
            ClientMessage::Unknown => {
                warn!(user_id = %self.actor.id, "ignoring unknown chat message type");
                Ok(())
            }
        }
    }

    /// Subscribe to a room and tell its other listeners that we are online.
    fn join(&mut self, group_id: Uuid) {
        if self.rooms.contains_key(&group_id) {
            return;
        }
        let events = self.state.rooms().subscribe(group_id);
        let forwarder = forward(events, self.connection, self.tx.clone());
        self.rooms.insert(group_id, forwarder);

        let payload = ServerMessage::UserOnline {
            group_id,
            user_id: self.actor.id,
            user_name: self.actor.name.clone(),
        };
        room_events::broadcast_from(&self.state, group_id, self.connection, &payload);
        debug!(%group_id, user_id = %self.actor.id, "joined room");
    }

    fn leave(&mut self, group_id: Uuid) {
        let Some(forwarder) = self.rooms.remove(&group_id) else {
            return;
        };
        forwarder.abort();
        let payload = ServerMessage::UserOffline {
            group_id,
            user_id: self.actor.id,
        };
        room_events::broadcast_from(&self.state, group_id, self.connection, &payload);
        self.state.rooms().prune(group_id);
        debug!(%group_id, user_id = %self.actor.id, "left room");
    }

    /// Presence-style event for a joined room, skipping this connection.
    fn announce(&self, group_id: Uuid, payload: &ServerMessage) -> Result<(), SessionError> {
        if !self.rooms.contains_key(&group_id) {
            return Err(SessionError::NotJoined);
        }
        room_events::broadcast_from(&self.state, group_id, self.connection, payload);
        Ok(())
    }

    fn reply(&self, payload: &ServerMessage) -> Result<(), SessionError> {
        send_message_to_websocket(&self.tx, payload)
    }

    /// Leave every room and hand back the writer channel.
    fn close(mut self) -> mpsc::UnboundedSender<Message> {
        let joined: Vec<Uuid> = self.rooms.keys().copied().collect();
        for group_id in joined {
            self.leave(group_id);
        }
        self.tx
    }
}

/// Relay room events to the connection writer until either side goes away.
fn forward(
    events: broadcast::Receiver<RoomEvent>,
    connection: ConnectionId,
    tx: mpsc::UnboundedSender<Message>,
) -> JoinHandle<()> {
    let mut events = BroadcastStream::new(events);
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Ok(event) if event.is_for(connection) => {
                    let frame = Message::Text(event.payload.to_string().into());
                    if tx.send(frame).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(connection, skipped, "room subscriber lagged; events dropped");
                }
            }
        }
    })
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// A serialization failure is logged and swallowed; a closed writer is reported as
/// [`SessionError::ConnectionClosed`].
fn send_message_to_websocket<T>(
    tx: &mpsc::UnboundedSender<Message>,
    value: &T,
) -> Result<(), SessionError>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(p) => p,
        Err(err) => {
            warn!(error = %err, "failed to serialize message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into()))
        .map_err(|_| SessionError::ConnectionClosed)
}

async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
