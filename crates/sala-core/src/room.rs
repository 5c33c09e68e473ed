use std::sync::Arc;

use tokio::sync::Mutex;

use crate::channel::{MembershipConnector, RoomMembershipChannel};
use crate::config::SalaConfig;
use crate::devices::{DeviceCatalog, DeviceKind, MediaPreferences};
use crate::errors::SalaError;
use crate::events::{EventEmitter, SalaEvent, SalaEventListener, ScreenState};
use crate::media::{LocalMediaSession, MediaBackend};
use crate::protocol::Participant;

/// The local user as announced to the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub user_id: String,
    pub name: String,
}

/// View-model for one room screen instance.
///
/// Drives the `Welcome -> InMeeting -> Exited` flow and owns the
/// device catalog, the local media session, and the membership
/// channel. `Exited` is terminal: rejoining requires a new session.
pub struct RoomSession {
    config: SalaConfig,
    room_id: String,
    emitter: EventEmitter,
    catalog: DeviceCatalog,
    media: LocalMediaSession,
    channel: RoomMembershipChannel,
    state: Arc<Mutex<ScreenState>>,
    identity: Arc<Mutex<Option<LocalIdentity>>>,
}

impl RoomSession {
    pub fn new(
        config: SalaConfig,
        room_id: impl Into<String>,
        backend: Arc<dyn MediaBackend>,
        connector: Arc<dyn MembershipConnector>,
    ) -> Self {
        let emitter = EventEmitter::new();
        let prefs = MediaPreferences {
            camera_enabled: config.camera_enabled_on_join,
            microphone_enabled: config.microphone_enabled_on_join,
            ..Default::default()
        };
        Self {
            catalog: DeviceCatalog::new(backend.clone(), emitter.clone()),
            media: LocalMediaSession::new(backend, emitter.clone(), prefs),
            channel: RoomMembershipChannel::new(connector, emitter.clone()),
            config,
            room_id: room_id.into(),
            emitter,
            state: Arc::new(Mutex::new(ScreenState::Welcome)),
            identity: Arc::new(Mutex::new(None)),
        }
    }

    /// Register a listener for session events.
    pub fn add_listener(&self, listener: Arc<dyn SalaEventListener>) {
        self.emitter.add_listener(listener);
    }

    /// Start the welcome screen: begin owning local capture so the
    /// self-preview reflects the join-time preferences.
    pub async fn activate(&self) {
        self.media.activate().await;
    }

    pub async fn state(&self) -> ScreenState {
        *self.state.lock().await
    }

    pub async fn local_identity(&self) -> Option<LocalIdentity> {
        self.identity.lock().await.clone()
    }

    /// Device configuration for the settings dialog.
    pub fn catalog(&self) -> &DeviceCatalog {
        &self.catalog
    }

    /// Camera/microphone toggles and device selection.
    pub fn media(&self) -> &LocalMediaSession {
        &self.media
    }

    /// The latest participant snapshot from the membership service.
    pub async fn participants(&self) -> Vec<Participant> {
        self.channel.participants().await
    }

    /// Whether a listed participant is the local user; the shell mutes
    /// playback of that tile.
    pub async fn is_local_participant(&self, user_id: &str) -> bool {
        self.channel.is_local(user_id).await
    }

    /// Enter the meeting.
    ///
    /// Rejects an empty name without any state change and without
    /// opening the membership channel; shells surface the error as a
    /// blocking notification. On success a fresh user id is assigned,
    /// devices are enumerated for the meeting screen, the channel
    /// announces the join, and the screen moves to `InMeeting` exactly
    /// once. Channel connect failure is not fatal to the join.
    pub async fn join(&self, name: &str) -> Result<(), SalaError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SalaError::Validation(
                "a name is required to join".to_string(),
            ));
        }

        let mut st = self.state.lock().await;
        if *st != ScreenState::Welcome {
            return Err(SalaError::Validation(
                "join is only allowed from the welcome screen".to_string(),
            ));
        }

        let user_id = uuid::Uuid::new_v4().to_string();

        // meeting screen device configuration: fresh enumeration with
        // the first device of each kind as the default selection
        self.catalog.refresh().await;
        self.media.activate().await;
        self.media
            .set_default_devices(
                self.catalog.first_id(DeviceKind::Camera),
                self.catalog.first_id(DeviceKind::Microphone),
                self.catalog.first_id(DeviceKind::Speaker),
            )
            .await;

        if let Err(e) = self
            .channel
            .open(&self.config.service_url, &self.room_id, &user_id)
            .await
        {
            tracing::warn!("membership channel unavailable: {e}");
        }

        *self.identity.lock().await = Some(LocalIdentity {
            user_id,
            name: name.to_string(),
        });
        *st = ScreenState::InMeeting;
        drop(st);
        self.emitter.emit(SalaEvent::ScreenChanged(ScreenState::InMeeting));
        tracing::info!("joined meeting as {name}");
        Ok(())
    }

    /// Exit the meeting. The channel is disconnected and the capture
    /// stream released exactly once each, no matter how often this is
    /// called.
    pub async fn leave(&self) {
        {
            let mut st = self.state.lock().await;
            if *st == ScreenState::Exited {
                return;
            }
            *st = ScreenState::Exited;
        }
        self.channel.disconnect().await;
        self.media.deactivate().await;
        self.emitter.emit(SalaEvent::ScreenChanged(ScreenState::Exited));
        tracing::info!("left the meeting");
    }
}
