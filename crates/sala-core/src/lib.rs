//! Sala meeting-client core.
//!
//! Pure Rust crate with no platform dependencies: screen state,
//! local capture lifecycle, device catalog, and the room membership
//! channel. Consumed by UI shells that plug in the platform's media
//! capabilities.

pub mod channel;
pub mod config;
pub mod devices;
pub mod errors;
pub mod events;
pub mod media;
pub mod participants;
pub mod protocol;
pub mod room;
pub mod socket;

pub use channel::{MembershipConnection, MembershipConnector, RoomMembershipChannel};
pub use config::SalaConfig;
pub use devices::{DeviceCatalog, DeviceInfo, DeviceKind, MediaPreferences};
pub use errors::SalaError;
pub use events::{SalaEvent, SalaEventListener, ScreenState};
pub use media::{
    CaptureConstraints, CaptureStream, LocalMediaSession, MediaBackend, NullMediaBackend,
    TrackConstraint,
};
pub use participants::ParticipantRoster;
pub use protocol::{ClientMessage, Participant, ServerMessage};
pub use room::{LocalIdentity, RoomSession};
pub use socket::WebSocketConnector;
