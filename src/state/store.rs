use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::catalog::{Model, Prompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryPhase {
    /// Never run, or the last generation completed.
    Idle,
    Generating,
    Errored,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarySnapshot {
    pub model: Model,
    pub prompt: Prompt,
    pub content: Option<String>,
    pub is_error: bool,
    pub is_generating: bool,
}

impl SummarySnapshot {
    pub fn new(model: Model, prompt: Prompt) -> Self {
        Self {
            model,
            prompt,
            content: None,
            is_error: false,
            is_generating: false,
        }
    }

    /// The error flag wins over the generating flag, since the default error
    /// policy leaves generating set.
    pub fn phase(&self) -> SummaryPhase {
        if self.is_error {
            SummaryPhase::Errored
        } else if self.is_generating {
            SummaryPhase::Generating
        } else {
            SummaryPhase::Idle
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Model,
    Prompt,
    Content,
    Error,
    Generating,
}

/// Synchronous change listener, called once per effective mutation in the
/// order mutations happen.
pub trait SummaryObserver: Send + Sync {
    fn on_change(&self, change: StateChange, snapshot: &SummarySnapshot);
}

/// Holds the observable summary state. Setters accept any value; writing the
/// current value again is a no-op and notifies nobody.
pub struct SummaryStore {
    current: SummarySnapshot,
    observers: Vec<Arc<dyn SummaryObserver>>,
    watch_tx: watch::Sender<SummarySnapshot>,
}

impl SummaryStore {
    pub fn new(model: Model, prompt: Prompt) -> Self {
        let current = SummarySnapshot::new(model, prompt);
        let (watch_tx, _) = watch::channel(current.clone());
        Self {
            current,
            observers: Vec::new(),
            watch_tx,
        }
    }

    pub fn snapshot(&self) -> &SummarySnapshot {
        &self.current
    }

    pub fn subscribe(&self) -> watch::Receiver<SummarySnapshot> {
        self.watch_tx.subscribe()
    }

    pub fn add_observer(&mut self, observer: Arc<dyn SummaryObserver>) {
        self.observers.push(observer);
    }

    pub fn set_model(&mut self, model: Model) -> bool {
        if self.current.model == model {
            return false;
        }
        self.current.model = model;
        self.notify(StateChange::Model);
        true
    }

    pub fn set_prompt(&mut self, prompt: Prompt) -> bool {
        if self.current.prompt == prompt {
            return false;
        }
        self.current.prompt = prompt;
        self.notify(StateChange::Prompt);
        true
    }

    pub fn set_content(&mut self, content: Option<String>) -> bool {
        if self.current.content == content {
            return false;
        }
        self.current.content = content;
        self.notify(StateChange::Content);
        true
    }

    pub fn set_error(&mut self, is_error: bool) -> bool {
        if self.current.is_error == is_error {
            return false;
        }
        self.current.is_error = is_error;
        self.notify(StateChange::Error);
        true
    }

    pub fn set_generating(&mut self, is_generating: bool) -> bool {
        if self.current.is_generating == is_generating {
            return false;
        }
        self.current.is_generating = is_generating;
        self.notify(StateChange::Generating);
        true
    }

    /// Content, error and generating back to their mount-time values.
    pub fn reset_generation(&mut self) {
        self.set_content(None);
        self.set_error(false);
        self.set_generating(false);
    }

    fn notify(&self, change: StateChange) {
        self.watch_tx.send_replace(self.current.clone());
        for observer in &self.observers {
            observer.on_change(change, &self.current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ChangeLog(Mutex<Vec<StateChange>>);

    impl SummaryObserver for ChangeLog {
        fn on_change(&self, change: StateChange, _snapshot: &SummarySnapshot) {
            self.0.lock().unwrap().push(change);
        }
    }

    fn store() -> SummaryStore {
        SummaryStore::new(Model::new("m", "model-a"), Prompt::new("p", "prompt-a"))
    }

    #[test]
    fn test_redundant_writes_do_not_notify() {
        let log = Arc::new(ChangeLog::default());
        let mut store = store();
        store.add_observer(log.clone());

        assert!(!store.set_error(false));
        assert!(!store.set_content(None));
        assert!(store.set_content(Some("draft".to_string())));
        assert!(!store.set_content(Some("draft".to_string())));

        assert_eq!(*log.0.lock().unwrap(), vec![StateChange::Content]);
    }

    #[test]
    fn test_watch_subscribers_see_latest_snapshot() {
        let mut store = store();
        let rx = store.subscribe();
        store.set_generating(true);
        store.set_model(Model::new("other", "model-b"));

        let seen = rx.borrow();
        assert!(seen.is_generating);
        assert_eq!(seen.model.content, "model-b");
        assert_eq!(seen.phase(), SummaryPhase::Generating);
    }

    #[test]
    fn test_phase_prefers_error() {
        let mut snapshot = SummarySnapshot::new(Model::new("m", "a"), Prompt::new("p", "b"));
        assert_eq!(snapshot.phase(), SummaryPhase::Idle);
        snapshot.is_generating = true;
        snapshot.is_error = true;
        assert_eq!(snapshot.phase(), SummaryPhase::Errored);
    }

    #[test]
    fn test_reset_generation_clears_all_three() {
        let mut store = store();
        store.set_content(Some("x".to_string()));
        store.set_error(true);
        store.set_generating(true);
        store.reset_generation();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.content, None);
        assert!(!snapshot.is_error);
        assert!(!snapshot.is_generating);
    }
}
