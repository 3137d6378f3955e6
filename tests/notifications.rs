mod recorder;

use std::sync::{Arc, Mutex};

use eventvat::{Emitter, Store, StoreConfig, Value};
use recorder::recorded_store;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn set_emits_keyed_then_generic_event() {
    let (store, _, recorder) = recorded_store();
    store.set("foo", "bar", None);

    assert_eq!(
        recorder.events(),
        vec![
            ("set foo".to_string(), vec![Value::from("bar")]),
            ("set".to_string(), vec![Value::from("foo"), Value::from("bar")]),
        ]
    );
}

#[test]
fn set_with_ttl_announces_expire_first() {
    let (store, _, recorder) = recorded_store();
    store.set("foo", "bar", Some(10.0));
    assert_eq!(
        recorder.names(),
        names(&["expire foo", "expire", "set foo", "set"])
    );
}

#[test]
fn failed_commands_stay_silent() {
    let (store, _, recorder) = recorded_store();
    store.set("s", "text", None);
    recorder.clear();

    assert_eq!(store.get("missing"), None);
    assert_eq!(store.incr("s"), None);
    assert_eq!(store.append("missing", "x"), None);
    assert!(!store.rename("missing", "other"));
    assert!(!store.persist("s"));
    assert_eq!(store.hset("s", "f", 1), None);
    assert_eq!(store.del(&["missing"]), 0);
    assert!(!store.setnx("s", "again", None));

    assert!(recorder.events().is_empty(), "{:?}", recorder.events());
}

#[test]
fn internal_ttl_clears_do_not_emit_persist() {
    let (store, _, recorder) = recorded_store();
    store.set("n", 1, Some(5.0));
    store.incr("n");
    store.set("n", 2, None);
    assert_eq!(recorder.count("persist"), 0);
}

#[test]
fn incr_reports_both_layers() {
    let (store, _, recorder) = recorded_store();
    store.incr("n");
    assert_eq!(
        recorder.events(),
        vec![
            (
                "incrby n".to_string(),
                vec![Value::from(1), Value::from(1)]
            ),
            (
                "incrby".to_string(),
                vec![Value::from("n"), Value::from(1), Value::from(1)]
            ),
            ("incr n".to_string(), vec![Value::from(1)]),
            ("incr".to_string(), vec![Value::from("n"), Value::from(1)]),
        ]
    );
}

#[test]
fn mset_announces_after_every_write() {
    let emitter = Arc::new(Emitter::new());
    let store = Store::with_config(StoreConfig::new().with_notifier(emitter.clone()));

    let observed = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);
    let reader = store.clone();
    emitter.on("set a", move |_, _| {
        sink.lock().unwrap().push(reader.dump().get("b").cloned());
    });

    store.mset([("a", 1), ("b", 2)]);
    assert_eq!(*observed.lock().unwrap(), vec![Some(Value::from(2))]);
}

#[test]
fn mset_event_carries_flattened_pairs() {
    let (store, _, recorder) = recorded_store();
    store.mset([("a", Value::from(1)), ("b", Value::from("x"))]);

    assert_eq!(
        recorder.names(),
        names(&["set a", "set", "set b", "set", "mset"])
    );
    assert_eq!(
        recorder.events().last().unwrap().1,
        vec![Value::from("a"), Value::from(1), Value::from("b"), Value::from("x")]
    );
}

#[test]
fn msetnx_announces_set_and_setnx() {
    let (store, _, recorder) = recorded_store();
    assert!(store.msetnx([("a", 1)]));
    assert_eq!(
        recorder.names(),
        names(&["set a", "set", "setnx a", "setnx", "msetnx"])
    );
}

#[test]
fn hmset_announces_fields_then_batch() {
    let (store, _, recorder) = recorded_store();
    store.hmset("h", [("a", 1), ("b", 2)]);

    assert_eq!(
        recorder.names(),
        names(&["hset h", "hset", "hset h", "hset", "hmset h", "hmset"])
    );
    let events = recorder.events();
    assert_eq!(
        events[4].1,
        vec![Value::from("a"), Value::from(1), Value::from("b"), Value::from(2)]
    );
    assert_eq!(
        events[5].1,
        vec![
            Value::from("h"),
            Value::from("a"),
            Value::from(1),
            Value::from("b"),
            Value::from(2)
        ]
    );
}

#[test]
fn swap_announces_each_side() {
    let (store, _, recorder) = recorded_store();
    store.mset([("a", 1), ("b", 2)]);
    recorder.clear();

    store.swap("a", "b");
    assert_eq!(
        recorder.events(),
        vec![
            ("swap a".to_string(), vec![Value::from("b")]),
            ("swap b".to_string(), vec![Value::from("a")]),
            ("swap".to_string(), vec![Value::from("a"), Value::from("b")]),
        ]
    );
}

#[test]
fn read_commands_announce_results() {
    let (store, _, recorder) = recorded_store();
    store.set("foo", "bar", None);
    recorder.clear();

    store.exists("foo");
    store.ttl("foo");
    store.keys("f*");

    assert_eq!(
        recorder.events(),
        vec![
            ("exists foo".to_string(), vec![Value::Bool(true)]),
            (
                "exists".to_string(),
                vec![Value::from("foo"), Value::Bool(true)]
            ),
            ("ttl foo".to_string(), vec![Value::from(-1)]),
            ("ttl".to_string(), vec![Value::from("foo"), Value::from(-1)]),
            (
                "keys".to_string(),
                vec![Value::List(vec![Value::from("foo")]), Value::from("f*")]
            ),
        ]
    );
}

#[test]
fn listeners_can_be_removed() {
    let emitter = Arc::new(Emitter::new());
    let store = Store::with_config(StoreConfig::new().with_notifier(emitter.clone()));

    let hits = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&hits);
    let id = emitter.on("set", move |_, _| *sink.lock().unwrap() += 1);

    store.set("a", 1, None);
    assert!(emitter.off(id));
    store.set("b", 1, None);

    assert_eq!(*hits.lock().unwrap(), 1);
    assert_eq!(emitter.listener_count(), 0);
}

#[test]
fn listeners_may_call_back_into_the_store() {
    let emitter = Arc::new(Emitter::new());
    let store = Store::with_config(StoreConfig::new().with_notifier(emitter.clone()));

    let mirror = store.clone();
    emitter.on("set source", move |_, args| {
        mirror.set("copy", args[0].clone(), None);
    });

    store.set("source", "v", None);
    assert_eq!(store.get("copy"), Some(Value::from("v")));
}
