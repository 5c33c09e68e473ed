use serde::{Deserialize, Serialize};

/// A room occupant as reported by the membership service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: String,
    pub name: String,
}

/// Messages sent to the membership service.
///
/// Wire format matches the room service's event envelope:
/// `{"event":"joinRoom","data":{"roomId":"r1","userId":"u1"}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String, user_id: String },
}

/// Messages received from the membership service.
///
/// `updateParticipants` carries the full current participant list, not
/// a delta; the receiver replaces its cached view wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    UpdateParticipants(Vec<Participant>),
}
