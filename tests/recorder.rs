use std::sync::{Arc, Mutex};

use eventvat::{Emitter, ManualScheduler, Scheduler, Store, StoreConfig, Value};

/// Captures every emitted event as `(name, args)`.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
}

impl Recorder {
    pub fn attach(emitter: &Emitter) -> Self {
        let recorder = Recorder::default();
        let sink = Arc::clone(&recorder.events);
        emitter.on_any(move |event, args| {
            sink.lock().unwrap().push((event.to_string(), args.to_vec()));
        });
        recorder
    }

    pub fn events(&self) -> Vec<(String, Vec<Value>)> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|(name, _)| name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|(n, _)| n == name).count()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

/// A store on a virtual clock with every event recorded.
pub fn recorded_store() -> (Store, Arc<ManualScheduler>, Recorder) {
    let emitter = Arc::new(Emitter::new());
    let recorder = Recorder::attach(&emitter);
    let scheduler = Arc::new(ManualScheduler::new());
    let store = Store::with_config(
        StoreConfig::new()
            .with_notifier(emitter)
            .with_scheduler(scheduler.clone()),
    );
    (store, scheduler, recorder)
}

#[test]
fn recorder_smoke() {
    let (store, scheduler, recorder) = recorded_store();
    store.set("k", 1, None);
    assert_eq!(recorder.names(), vec!["set k".to_string(), "set".to_string()]);
    assert_eq!(recorder.count("set"), 1);
    recorder.clear();
    assert!(recorder.events().is_empty());
    assert_eq!(scheduler.pending(), 0);
}
