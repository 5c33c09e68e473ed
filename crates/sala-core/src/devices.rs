use std::sync::{Arc, Mutex};

use crate::events::{EventEmitter, SalaEvent};
use crate::media::MediaBackend;

/// Which class of hardware a device descriptor refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Camera,
    Microphone,
    Speaker,
}

/// Immutable snapshot of a selectable camera/microphone/speaker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub kind: DeviceKind,
    /// Human-readable name; platforms may report it empty before the
    /// user has granted capture permission.
    pub label: String,
}

impl DeviceInfo {
    /// The label, or a placeholder when the platform reported none.
    pub fn label_or_default(&self) -> &str {
        if !self.label.is_empty() {
            return &self.label;
        }
        match self.kind {
            DeviceKind::Camera => "Unknown camera",
            DeviceKind::Microphone => "Unknown microphone",
            DeviceKind::Speaker => "Unknown speaker",
        }
    }
}

/// The user's camera/microphone preferences for a session.
///
/// Mutated only by explicit user action. Speaker selection is stored
/// but not wired to playback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPreferences {
    pub camera_enabled: bool,
    pub microphone_enabled: bool,
    pub selected_camera: Option<String>,
    pub selected_microphone: Option<String>,
    pub selected_speaker: Option<String>,
}

impl Default for MediaPreferences {
    fn default() -> Self {
        Self {
            camera_enabled: true,
            microphone_enabled: true,
            selected_camera: None,
            selected_microphone: None,
            selected_speaker: None,
        }
    }
}

/// Enumerates available media devices through the platform backend.
///
/// A refresh replaces the previous device set wholesale. Enumeration
/// failure is logged and leaves the catalog empty; unconstrained
/// capture remains the implicit fallback for consumers that request
/// media anyway. There is no retry, a new screen activation is the
/// only recovery path.
pub struct DeviceCatalog {
    backend: Arc<dyn MediaBackend>,
    emitter: EventEmitter,
    devices: Mutex<Vec<DeviceInfo>>,
}

impl DeviceCatalog {
    pub fn new(backend: Arc<dyn MediaBackend>, emitter: EventEmitter) -> Self {
        Self {
            backend,
            emitter,
            devices: Mutex::new(Vec::new()),
        }
    }

    /// Query the platform for the current device set.
    pub async fn refresh(&self) -> Vec<DeviceInfo> {
        match self.backend.enumerate_devices().await {
            Ok(list) => {
                *self.devices.lock().unwrap() = list.clone();
                self.emitter.emit(SalaEvent::DevicesChanged(list.clone()));
                list
            }
            Err(e) => {
                tracing::warn!("device enumeration failed: {e}");
                self.devices.lock().unwrap().clear();
                Vec::new()
            }
        }
    }

    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.devices.lock().unwrap().clone()
    }

    pub fn cameras(&self) -> Vec<DeviceInfo> {
        self.of_kind(DeviceKind::Camera)
    }

    pub fn microphones(&self) -> Vec<DeviceInfo> {
        self.of_kind(DeviceKind::Microphone)
    }

    pub fn speakers(&self) -> Vec<DeviceInfo> {
        self.of_kind(DeviceKind::Speaker)
    }

    /// Id of the first device of a kind, the default selection.
    pub fn first_id(&self, kind: DeviceKind) -> Option<String> {
        self.devices
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.kind == kind)
            .map(|d| d.id.clone())
    }

    fn of_kind(&self, kind: DeviceKind) -> Vec<DeviceInfo> {
        self.devices
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect()
    }
}
