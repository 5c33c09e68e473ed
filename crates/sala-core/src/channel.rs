use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::errors::SalaError;
use crate::events::{EventEmitter, SalaEvent};
use crate::participants::ParticipantRoster;
use crate::protocol::{ClientMessage, ServerMessage};

/// A connected duplex message pair to the membership service.
pub struct MembershipConnection {
    pub tx: mpsc::UnboundedSender<ClientMessage>,
    pub rx: mpsc::UnboundedReceiver<ServerMessage>,
}

/// Transport seam for the membership service.
///
/// The production implementation is [`crate::socket::WebSocketConnector`];
/// tests plug in in-memory pairs.
#[async_trait]
pub trait MembershipConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<MembershipConnection, SalaError>;
}

struct ChannelState {
    open: bool,
    tx: Option<mpsc::UnboundedSender<ClientMessage>>,
    recv_task: Option<tokio::task::JoinHandle<()>>,
}

/// Session-scoped notification channel to the room membership service.
///
/// Opened once per room entry: connects, sends a single `joinRoom`,
/// then caches every inbound participant snapshot wholesale. Torn down
/// once per room exit; teardown is idempotent and any message landing
/// after disconnect is discarded. There is no reconnect policy — a
/// dropped connection simply stops delivering updates until a new
/// screen opens a fresh channel.
pub struct RoomMembershipChannel {
    connector: Arc<dyn MembershipConnector>,
    emitter: EventEmitter,
    roster: Arc<Mutex<ParticipantRoster>>,
    state: Arc<Mutex<ChannelState>>,
}

impl RoomMembershipChannel {
    pub fn new(connector: Arc<dyn MembershipConnector>, emitter: EventEmitter) -> Self {
        Self {
            connector,
            emitter,
            roster: Arc::new(Mutex::new(ParticipantRoster::new())),
            state: Arc::new(Mutex::new(ChannelState {
                open: false,
                tx: None,
                recv_task: None,
            })),
        }
    }

    /// Connect and announce the local user to the room.
    pub async fn open(&self, url: &str, room_id: &str, user_id: &str) -> Result<(), SalaError> {
        let mut st = self.state.lock().await;
        if st.open {
            return Err(SalaError::Channel("channel already open".to_string()));
        }

        let MembershipConnection { tx, mut rx } = self.connector.connect(url).await?;
        tx.send(ClientMessage::JoinRoom {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
        })
        .map_err(|_| SalaError::Channel("connection closed before join".to_string()))?;
        tracing::info!("joined room {room_id} as {user_id}");

        self.roster.lock().await.set_local_user_id(user_id.to_string());

        let roster = self.roster.clone();
        let emitter = self.emitter.clone();
        let state = self.state.clone();
        st.open = true;
        st.tx = Some(tx);
        st.recv_task = Some(tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                // anything arriving after disconnect is discarded
                if !state.lock().await.open {
                    break;
                }
                match msg {
                    ServerMessage::UpdateParticipants(snapshot) => {
                        roster.lock().await.replace(snapshot.clone());
                        emitter.emit(SalaEvent::ParticipantsUpdated(snapshot));
                    }
                }
            }
            tracing::debug!("membership receive loop ended");
        }));
        Ok(())
    }

    /// Tear the channel down. Safe to call repeatedly; only the first
    /// call does anything.
    pub async fn disconnect(&self) {
        let mut st = self.state.lock().await;
        if !st.open {
            return;
        }
        st.open = false;
        st.tx = None;
        if let Some(task) = st.recv_task.take() {
            task.abort();
        }
        drop(st);
        self.roster.lock().await.clear();
        tracing::info!("membership channel disconnected");
    }

    pub async fn is_open(&self) -> bool {
        self.state.lock().await.open
    }

    /// The latest participant snapshot.
    pub async fn participants(&self) -> Vec<crate::protocol::Participant> {
        self.roster.lock().await.participants().to_vec()
    }

    /// Whether a listed participant is the local user.
    pub async fn is_local(&self, user_id: &str) -> bool {
        self.roster.lock().await.is_local(user_id)
    }
}
