use std::sync::Arc;

use crate::devices::DeviceInfo;
use crate::protocol::Participant;

/// Events emitted by the core to UI shells.
#[derive(Debug, Clone)]
pub enum SalaEvent {
    ScreenChanged(ScreenState),
    ParticipantsUpdated(Vec<Participant>),
    DevicesChanged(Vec<DeviceInfo>),
    PreviewStarted,
    PreviewCleared,
}

/// Which screen a room session is currently showing.
///
/// Transitions only move forward: `Welcome -> InMeeting -> Exited`.
/// `Exited` is terminal; re-entering a room requires a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Welcome,
    InMeeting,
    Exited,
}

/// Trait for receiving events from the core.
/// Implementations must be Send + Sync (called from tokio tasks).
pub trait SalaEventListener: Send + Sync {
    fn on_event(&self, event: SalaEvent);
}

/// Internal event emitter that dispatches to registered listeners.
#[derive(Clone)]
pub struct EventEmitter {
    listeners: Arc<std::sync::RwLock<Vec<Arc<dyn SalaEventListener>>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(std::sync::RwLock::new(Vec::new())),
        }
    }

    pub fn add_listener(&self, listener: Arc<dyn SalaEventListener>) {
        self.listeners.write().unwrap().push(listener);
    }

    pub fn emit(&self, event: SalaEvent) {
        let listeners = self.listeners.read().unwrap();
        for listener in listeners.iter() {
            listener.on_event(event.clone());
        }
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingListener {
        count: Arc<AtomicUsize>,
    }

    impl SalaEventListener for CountingListener {
        fn on_event(&self, _event: SalaEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn emitter_dispatches_to_listener() {
        let emitter = EventEmitter::new();
        let count = Arc::new(AtomicUsize::new(0));
        let listener = Arc::new(CountingListener { count: count.clone() });

        emitter.add_listener(listener);
        emitter.emit(SalaEvent::ScreenChanged(ScreenState::InMeeting));

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn emitter_dispatches_to_multiple_listeners() {
        let emitter = EventEmitter::new();
        let count1 = Arc::new(AtomicUsize::new(0));
        let count2 = Arc::new(AtomicUsize::new(0));

        emitter.add_listener(Arc::new(CountingListener { count: count1.clone() }));
        emitter.add_listener(Arc::new(CountingListener { count: count2.clone() }));

        emitter.emit(SalaEvent::PreviewCleared);

        assert_eq!(count1.load(Ordering::SeqCst), 1);
        assert_eq!(count2.load(Ordering::SeqCst), 1);
    }

    struct EventCapture {
        events: Arc<std::sync::Mutex<Vec<SalaEvent>>>,
    }

    impl SalaEventListener for EventCapture {
        fn on_event(&self, event: SalaEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn emitter_delivers_correct_events() {
        let emitter = EventEmitter::new();
        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let listener = Arc::new(EventCapture { events: events.clone() });

        emitter.add_listener(listener);
        emitter.emit(SalaEvent::ParticipantsUpdated(vec![Participant {
            user_id: "u1".to_string(),
            name: "Ann".to_string(),
        }]));

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        match &captured[0] {
            SalaEvent::ParticipantsUpdated(list) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].user_id, "u1");
            }
            _ => panic!("expected ParticipantsUpdated"),
        }
    }
}
