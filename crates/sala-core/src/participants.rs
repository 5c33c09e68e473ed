use crate::protocol::Participant;

/// Cached view of the room's participant list.
///
/// Updated by the membership channel's receive loop. Each inbound
/// snapshot replaces the previous list wholesale; there is no merging
/// and the last message wins. The local user id is tracked so shells
/// can mute playback of the self-video tile.
#[derive(Debug, Clone, Default)]
pub struct ParticipantRoster {
    participants: Vec<Participant>,
    local_user_id: Option<String>,
}

impl ParticipantRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_local_user_id(&mut self, user_id: String) {
        self.local_user_id = Some(user_id);
    }

    pub fn local_user_id(&self) -> Option<&str> {
        self.local_user_id.as_deref()
    }

    /// Replace the cached list with a fresh snapshot.
    pub fn replace(&mut self, snapshot: Vec<Participant>) {
        self.participants = snapshot;
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant(&self, user_id: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    /// Whether a listed participant is the local user. The self tile's
    /// playback is muted so local audio never echoes.
    pub fn is_local(&self, user_id: &str) -> bool {
        self.local_user_id.as_deref() == Some(user_id)
    }

    pub fn count(&self) -> usize {
        self.participants.len()
    }

    pub fn clear(&mut self) {
        self.participants.clear();
        self.local_user_id = None;
    }
}
