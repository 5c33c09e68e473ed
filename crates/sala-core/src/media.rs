use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::devices::{DeviceInfo, MediaPreferences};
use crate::errors::SalaError;
use crate::events::{EventEmitter, SalaEvent};

/// Per-track capture constraint: disabled, any matching device, or a
/// specific device id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackConstraint {
    Off,
    Any,
    Device(String),
}

/// Constraints handed to the platform capture capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConstraints {
    pub video: TrackConstraint,
    pub audio: TrackConstraint,
}

impl CaptureConstraints {
    pub fn from_preferences(prefs: &MediaPreferences) -> Self {
        let track = |enabled: bool, selected: &Option<String>| {
            if !enabled {
                TrackConstraint::Off
            } else {
                match selected {
                    Some(id) => TrackConstraint::Device(id.clone()),
                    None => TrackConstraint::Any,
                }
            }
        };
        Self {
            video: track(prefs.camera_enabled, &prefs.selected_camera),
            audio: track(prefs.microphone_enabled, &prefs.selected_microphone),
        }
    }
}

/// An active handle to camera/microphone hardware.
///
/// Exclusively owned by the session that requested it. `stop` releases
/// every track; it must run before a replacement capture is requested
/// so two device handles are never held at once.
pub trait CaptureStream: Send + Sync {
    fn stop(&self);
}

/// Platform media capabilities consumed by the core.
///
/// The core never defines device enumeration or capture itself; shells
/// plug in whatever the platform provides.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, SalaError>;

    async fn open_capture(
        &self,
        constraints: CaptureConstraints,
    ) -> Result<Box<dyn CaptureStream>, SalaError>;
}

/// Backend for shells without a platform capture layer.
///
/// Enumerates no devices and refuses capture, which degrades the
/// preview to its disabled visual state.
pub struct NullMediaBackend;

#[async_trait]
impl MediaBackend for NullMediaBackend {
    async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, SalaError> {
        Ok(Vec::new())
    }

    async fn open_capture(
        &self,
        _constraints: CaptureConstraints,
    ) -> Result<Box<dyn CaptureStream>, SalaError> {
        Err(SalaError::Capture(
            "no media backend on this platform".to_string(),
        ))
    }
}

struct SessionState {
    prefs: MediaPreferences,
    stream: Option<Box<dyn CaptureStream>>,
    /// Bumped on every key change and on deactivation. An acquisition
    /// result whose generation no longer matches is superseded: its
    /// stream is stopped on arrival instead of installed.
    generation: u64,
    active: bool,
}

/// Owns the lifecycle of the local capture stream.
///
/// The stream is keyed by `(camera_enabled, microphone_enabled,
/// selected_camera, selected_microphone)`. Any key change releases the
/// current stream first, then requests a replacement when the camera
/// is enabled. Acquisition is fire-and-forget; last writer wins.
/// Capture failures are logged and leave the preview empty, there is
/// no retry. The installed preview is always muted for local playback
/// so self-video never echoes local audio.
pub struct LocalMediaSession {
    backend: Arc<dyn MediaBackend>,
    emitter: EventEmitter,
    state: Arc<Mutex<SessionState>>,
}

impl LocalMediaSession {
    pub fn new(backend: Arc<dyn MediaBackend>, emitter: EventEmitter, prefs: MediaPreferences) -> Self {
        Self {
            backend,
            emitter,
            state: Arc::new(Mutex::new(SessionState {
                prefs,
                stream: None,
                generation: 0,
                active: false,
            })),
        }
    }

    pub async fn preferences(&self) -> MediaPreferences {
        self.state.lock().await.prefs.clone()
    }

    pub async fn has_preview(&self) -> bool {
        self.state.lock().await.stream.is_some()
    }

    /// Whether local playback of the preview is muted. Always true
    /// while a preview is installed.
    pub async fn preview_muted(&self) -> bool {
        self.state.lock().await.stream.is_some()
    }

    /// Start owning capture. Until activation, preference changes are
    /// recorded without touching the hardware.
    pub async fn activate(&self) {
        {
            let mut st = self.state.lock().await;
            if st.active {
                return;
            }
            st.active = true;
        }
        self.apply().await;
    }

    /// Stop owning capture, releasing any held stream exactly once and
    /// cancelling the effect of any in-flight acquisition. Safe to call
    /// repeatedly.
    pub async fn deactivate(&self) {
        let mut st = self.state.lock().await;
        if !st.active {
            return;
        }
        st.active = false;
        st.generation += 1;
        if let Some(stream) = st.stream.take() {
            stream.stop();
            self.emitter.emit(SalaEvent::PreviewCleared);
        }
        tracing::debug!("media session deactivated");
    }

    pub async fn set_camera_enabled(&self, enabled: bool) {
        {
            let mut st = self.state.lock().await;
            if st.prefs.camera_enabled == enabled {
                return;
            }
            st.prefs.camera_enabled = enabled;
        }
        tracing::info!("camera enabled: {enabled}");
        self.apply().await;
    }

    pub async fn set_microphone_enabled(&self, enabled: bool) {
        {
            let mut st = self.state.lock().await;
            if st.prefs.microphone_enabled == enabled {
                return;
            }
            st.prefs.microphone_enabled = enabled;
        }
        tracing::info!("microphone enabled: {enabled}");
        self.apply().await;
    }

    pub async fn select_camera(&self, id: Option<String>) {
        {
            let mut st = self.state.lock().await;
            if st.prefs.selected_camera == id {
                return;
            }
            st.prefs.selected_camera = id;
        }
        self.apply().await;
    }

    pub async fn select_microphone(&self, id: Option<String>) {
        {
            let mut st = self.state.lock().await;
            if st.prefs.selected_microphone == id {
                return;
            }
            st.prefs.selected_microphone = id;
        }
        self.apply().await;
    }

    /// Speaker selection is stored but not wired to playback.
    pub async fn select_speaker(&self, id: Option<String>) {
        self.state.lock().await.prefs.selected_speaker = id;
    }

    /// Fill any still-unset device selections, typically with the first
    /// enumerated device of each kind. Reacquires at most once.
    pub async fn set_default_devices(
        &self,
        camera: Option<String>,
        microphone: Option<String>,
        speaker: Option<String>,
    ) {
        let changed = {
            let mut st = self.state.lock().await;
            let mut changed = false;
            if st.prefs.selected_camera.is_none() && camera.is_some() {
                st.prefs.selected_camera = camera;
                changed = true;
            }
            if st.prefs.selected_microphone.is_none() && microphone.is_some() {
                st.prefs.selected_microphone = microphone;
                changed = true;
            }
            if st.prefs.selected_speaker.is_none() && speaker.is_some() {
                st.prefs.selected_speaker = speaker;
            }
            changed
        };
        if changed {
            self.apply().await;
        }
    }

    /// Re-key the capture stream after a preference change.
    ///
    /// Releases the previous stream before the new request is issued,
    /// synchronously within this call. With the camera disabled nothing
    /// is requested; the preview stays cleared.
    async fn apply(&self) {
        let (constraints, generation) = {
            let mut st = self.state.lock().await;
            if !st.active {
                return;
            }
            st.generation += 1;
            if let Some(stream) = st.stream.take() {
                stream.stop();
                self.emitter.emit(SalaEvent::PreviewCleared);
            }
            if !st.prefs.camera_enabled {
                return;
            }
            (CaptureConstraints::from_preferences(&st.prefs), st.generation)
        };

        let backend = self.backend.clone();
        let state = self.state.clone();
        let emitter = self.emitter.clone();
        tokio::spawn(async move {
            match backend.open_capture(constraints).await {
                Ok(stream) => {
                    let mut st = state.lock().await;
                    if !st.active || st.generation != generation {
                        // Superseded while in flight; the handle must
                        // not outlive the key that requested it.
                        stream.stop();
                        return;
                    }
                    st.stream = Some(stream);
                    emitter.emit(SalaEvent::PreviewStarted);
                }
                Err(e) => {
                    tracing::warn!("media capture failed: {e}");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Counters {
        opened: AtomicUsize,
        stopped: AtomicUsize,
        stopped_ids: std::sync::Mutex<Vec<usize>>,
    }

    struct MockStream {
        id: usize,
        counters: Arc<Counters>,
    }

    impl CaptureStream for MockStream {
        fn stop(&self) {
            self.counters.stopped.fetch_add(1, Ordering::SeqCst);
            self.counters.stopped_ids.lock().unwrap().push(self.id);
        }
    }

    struct MockBackend {
        counters: Arc<Counters>,
        /// When present, open_capture parks until a permit is added.
        gate: Option<Arc<tokio::sync::Semaphore>>,
        fail: bool,
    }

    impl MockBackend {
        fn new() -> (Arc<Self>, Arc<Counters>) {
            let counters = Arc::new(Counters::default());
            (
                Arc::new(Self {
                    counters: counters.clone(),
                    gate: None,
                    fail: false,
                }),
                counters,
            )
        }

        fn gated() -> (Arc<Self>, Arc<Counters>, Arc<tokio::sync::Semaphore>) {
            let counters = Arc::new(Counters::default());
            let gate = Arc::new(tokio::sync::Semaphore::new(0));
            (
                Arc::new(Self {
                    counters: counters.clone(),
                    gate: Some(gate.clone()),
                    fail: false,
                }),
                counters,
                gate,
            )
        }
    }

    #[async_trait]
    impl MediaBackend for MockBackend {
        async fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>, SalaError> {
            Ok(Vec::new())
        }

        async fn open_capture(
            &self,
            _constraints: CaptureConstraints,
        ) -> Result<Box<dyn CaptureStream>, SalaError> {
            let id = self.counters.opened.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(gate) = &self.gate {
                let permit = gate.acquire().await.map_err(|_| {
                    SalaError::Capture("gate closed".to_string())
                })?;
                permit.forget();
            }
            if self.fail {
                return Err(SalaError::Capture("permission denied".to_string()));
            }
            Ok(Box::new(MockStream {
                id,
                counters: self.counters.clone(),
            }))
        }
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached in time");
    }

    async fn wait_for_preview(s: &LocalMediaSession) {
        for _ in 0..200 {
            if s.has_preview().await {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("preview never installed");
    }

    fn session(backend: Arc<MockBackend>) -> LocalMediaSession {
        LocalMediaSession::new(backend, EventEmitter::new(), MediaPreferences::default())
    }

    #[tokio::test]
    async fn activate_acquires_a_preview() {
        let (backend, counters) = MockBackend::new();
        let s = session(backend);
        s.activate().await;
        wait_until(|| counters.opened.load(Ordering::SeqCst) == 1).await;
        wait_for_preview(&s).await;
        assert_eq!(counters.stopped.load(Ordering::SeqCst), 0);
        assert!(s.preview_muted().await);
    }

    #[tokio::test]
    async fn toggle_sequence_holds_at_most_one_stream() {
        let (backend, counters) = MockBackend::new();
        let s = session(backend);
        s.activate().await;
        wait_until(|| counters.opened.load(Ordering::SeqCst) == 1).await;
        wait_for_preview(&s).await;

        s.set_camera_enabled(false).await;
        assert!(!s.has_preview().await);
        assert_eq!(counters.stopped.load(Ordering::SeqCst), 1);

        s.set_camera_enabled(true).await;
        wait_until(|| counters.opened.load(Ordering::SeqCst) == 2).await;
        wait_for_preview(&s).await;

        // every stream ever opened except the live one has been stopped
        assert_eq!(counters.opened.load(Ordering::SeqCst), 2);
        assert_eq!(counters.stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn camera_off_clears_preview_before_pending_acquisition_resolves() {
        let (backend, counters, gate) = MockBackend::gated();
        let s = session(backend);
        s.activate().await;
        wait_until(|| counters.opened.load(Ordering::SeqCst) == 1).await;

        // acquisition is still parked on the gate; switching the camera
        // off must clear immediately, not wait for it
        s.set_camera_enabled(false).await;
        assert!(!s.has_preview().await);

        gate.add_permits(1);
        wait_until(|| counters.stopped.load(Ordering::SeqCst) == 1).await;
        assert!(!s.has_preview().await);
        assert_eq!(*counters.stopped_ids.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn superseded_acquisition_never_overwrites_newer_key() {
        let (backend, counters, gate) = MockBackend::gated();
        let s = session(backend);
        s.activate().await;
        wait_until(|| counters.opened.load(Ordering::SeqCst) == 1).await;

        // re-key while the first request is still in flight
        s.select_camera(Some("cam2".to_string())).await;
        wait_until(|| counters.opened.load(Ordering::SeqCst) == 2).await;

        gate.add_permits(2);
        wait_until(|| counters.stopped.load(Ordering::SeqCst) == 1).await;
        wait_for_preview(&s).await;

        // the stale stream (first request) was stopped on arrival
        assert_eq!(*counters.stopped_ids.lock().unwrap(), vec![1]);
        assert_eq!(
            s.preferences().await.selected_camera.as_deref(),
            Some("cam2")
        );
    }

    #[tokio::test]
    async fn deactivate_releases_exactly_once() {
        let (backend, counters) = MockBackend::new();
        let s = session(backend);
        s.activate().await;
        wait_until(|| counters.opened.load(Ordering::SeqCst) == 1).await;
        wait_for_preview(&s).await;

        s.deactivate().await;
        s.deactivate().await;
        assert_eq!(counters.stopped.load(Ordering::SeqCst), 1);
        assert!(!s.has_preview().await);
    }

    #[tokio::test]
    async fn capture_failure_leaves_preview_empty() {
        let counters = Arc::new(Counters::default());
        let backend = Arc::new(MockBackend {
            counters: counters.clone(),
            gate: None,
            fail: true,
        });
        let s = session(backend);
        s.activate().await;
        wait_until(|| counters.opened.load(Ordering::SeqCst) == 1).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!s.has_preview().await);
        assert_eq!(counters.stopped.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn preference_changes_before_activation_do_not_touch_hardware() {
        let (backend, counters) = MockBackend::new();
        let s = session(backend);
        s.select_camera(Some("cam1".to_string())).await;
        s.set_microphone_enabled(false).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(counters.opened.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn constraints_follow_preferences() {
        let mut prefs = MediaPreferences::default();
        prefs.selected_camera = Some("cam1".to_string());
        prefs.microphone_enabled = false;
        let c = CaptureConstraints::from_preferences(&prefs);
        assert_eq!(c.video, TrackConstraint::Device("cam1".to_string()));
        assert_eq!(c.audio, TrackConstraint::Off);

        let c = CaptureConstraints::from_preferences(&MediaPreferences::default());
        assert_eq!(c.video, TrackConstraint::Any);
        assert_eq!(c.audio, TrackConstraint::Any);
    }
}
