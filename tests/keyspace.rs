mod recorder;

use std::collections::HashSet;
use std::time::Duration;

use eventvat::{Kind, Scheduler, Store, StoreConfig, Value, VatError};
use recorder::recorded_store;

fn sorted(mut keys: Vec<String>) -> Vec<String> {
    keys.sort();
    keys
}

#[test]
fn missing_keys_report_sentinels() {
    let store = Store::new();
    assert_eq!(store.get("nope"), None);
    assert_eq!(store.type_of("nope"), Kind::None);
    assert_eq!(store.type_of("nope").to_string(), "none");
    assert_eq!(store.ttl("nope"), -1);
    assert!(!store.exists("nope"));
    assert_eq!(store.del(&["nope"]), 0);
}

#[test]
fn type_of_reports_each_kind() {
    let store = Store::new();
    store.set("s", "text", None);
    store.set("n", 1.5, None);
    store.set("b", false, None);
    store.set("l", vec![Value::from(1), Value::from("two")], None);
    store.hset("h", "f", 1);

    assert_eq!(store.type_of("s"), Kind::String);
    assert_eq!(store.type_of("n"), Kind::Number);
    assert_eq!(store.type_of("b"), Kind::Boolean);
    assert_eq!(store.type_of("l"), Kind::List);
    assert_eq!(store.type_of("h"), Kind::Hash);
}

#[test]
fn del_counts_only_existing_keys() {
    let (store, _, recorder) = recorded_store();
    store.set("foo", "bar", None);
    store.set("key2", "thing", None);
    recorder.clear();

    assert_eq!(store.del(&["foo", "missing", "key2"]), 2);
    assert_eq!(store.get("foo"), None);
    assert_eq!(store.get("key2"), None);
    assert_eq!(
        recorder.names(),
        vec!["del foo", "del", "del key2", "del"]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
    );
}

#[test]
fn keys_filters_by_glob() {
    let store = Store::new();
    for key in ["foo1", "foo2", "foobar", "ufoo"] {
        store.set(key, 1, None);
    }

    assert_eq!(sorted(store.keys("foo*")), vec!["foo1", "foo2", "foobar"]);
    assert_eq!(sorted(store.keys("foo?")), vec!["foo1", "foo2"]);
    assert_eq!(store.keys("*").len(), 4);
    assert!(store.keys("bar*").is_empty());
}

#[test]
fn rename_relocates_value() {
    let store = Store::new();
    store.set("a", "hello", None);

    assert!(store.rename("a", "b"));
    assert_eq!(store.get("a"), None);
    assert_eq!(store.get("b"), Some(Value::from("hello")));
    assert!(!store.rename("missing", "c"));
}

#[test]
fn rename_overwrites_destination_and_drops_ttls() {
    let (store, scheduler, _) = recorded_store();
    store.set("a", 1, Some(5.0));
    store.set("b", 2, Some(10.0));

    assert!(store.rename("a", "b"));
    assert_eq!(store.get("b"), Some(Value::from(1)));
    assert_eq!(store.ttl("b"), -1);
    assert_eq!(scheduler.pending(), 0);

    scheduler.advance(Duration::from_secs(20));
    assert_eq!(store.get("b"), Some(Value::from(1)));
}

#[test]
fn rename_onto_itself_keeps_the_key() {
    let store = Store::new();
    store.set("a", 1, None);
    assert!(store.rename("a", "a"));
    assert_eq!(store.get("a"), Some(Value::from(1)));
}

#[test]
fn renamenx_refuses_existing_destination() {
    let store = Store::new();
    store.set("a", 1, None);
    store.set("b", 2, None);

    assert!(!store.renamenx("a", "b"));
    assert_eq!(store.get("a"), Some(Value::from(1)));
    assert_eq!(store.get("b"), Some(Value::from(2)));

    assert!(store.renamenx("a", "c"));
    assert_eq!(store.get("a"), None);
    assert_eq!(store.get("c"), Some(Value::from(1)));
}

#[test]
fn move_key_transfers_between_stores() {
    let (source, scheduler, recorder) = recorded_store();
    let destination = Store::with_config(StoreConfig::new().with_name("other"));

    source.set("k", "v", Some(30.0));
    recorder.clear();

    assert!(source.move_key("k", &destination));
    assert!(!source.exists("k"));
    assert_eq!(destination.get("k"), Some(Value::from("v")));
    assert_eq!(destination.ttl("k"), -1);
    assert_eq!(scheduler.pending(), 0);
    assert!(recorder
        .events()
        .contains(&("move k".to_string(), vec![Value::from("other")])));

    assert!(!source.move_key("k", &destination));
}

#[test]
fn move_key_refuses_same_store() {
    let store = Store::new();
    store.set("k", 1, None);
    let alias = store.clone();
    assert!(!store.move_key("k", &alias));
    assert_eq!(store.get("k"), Some(Value::from(1)));
}

#[test]
fn stores_are_independent() {
    let a = Store::new();
    let b = Store::new();
    a.set("k", 1, None);
    assert_eq!(b.get("k"), None);

    let shared = a.clone();
    assert_eq!(shared.get("k"), Some(Value::from(1)));
}

#[test]
fn randomkey_picks_an_existing_key() {
    let store = Store::new();
    assert_eq!(store.randomkey(), None);

    let keys: HashSet<&str> = ["a", "b", "c"].into_iter().collect();
    for key in &keys {
        store.set(key, 1, None);
    }
    for _ in 0..20 {
        let key = store.randomkey().unwrap();
        assert!(keys.contains(key.as_str()));
    }
}

#[test]
fn swap_exchanges_values_and_clears_ttls() {
    let (store, scheduler, _) = recorded_store();
    store.set("a", 5, Some(10.0));
    store.set("b", "hi", None);

    assert!(store.swap("a", "b"));
    assert_eq!(store.get("a"), Some(Value::from("hi")));
    assert_eq!(store.get("b"), Some(Value::from(5)));
    assert_eq!(store.ttl("a"), -1);
    assert_eq!(store.ttl("b"), -1);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn swap_requires_both_keys() {
    let store = Store::new();
    store.set("a", 1, None);
    assert!(!store.swap("a", "missing"));
    assert_eq!(store.get("a"), Some(Value::from(1)));
    assert_eq!(store.get("missing"), None);
}

#[test]
fn findin_searches_strings_and_lists() {
    let store = Store::new();
    store.set("foo", "hello", None);
    store.set("list", vec![Value::from("x"), Value::from(2)], None);
    store.set("n", 3, None);

    assert_eq!(store.findin("foo", "ll"), Some(2));
    assert_eq!(store.findin("foo", "zz"), Some(-1));
    assert_eq!(store.findin("list", 2), Some(1));
    assert_eq!(store.findin("list", "y"), Some(-1));
    assert_eq!(store.findin("n", 3), None);
    assert_eq!(store.findin("missing", "x"), None);
}

#[test]
fn dump_snapshots_raw_values() {
    let store = Store::with_config(StoreConfig::new().with_entry("a", 1));
    store.hset("h", "f", "v");

    let dump = store.dump();
    assert_eq!(dump.len(), 2);
    assert_eq!(dump["a"], Value::from(1));
    assert_eq!(dump["h"].kind(), Kind::Hash);
}

#[test]
fn unimplemented_commands_always_error() {
    let store = Store::new();
    for _ in 0..2 {
        assert_eq!(store.sort("k"), Err(VatError::NotImplemented("sort")));
        assert_eq!(store.object("encoding"), Err(VatError::NotImplemented("object")));
        assert_eq!(store.getbit("k", 0), Err(VatError::NotImplemented("getbit")));
        assert_eq!(store.setbit("k", 0, true), Err(VatError::NotImplemented("setbit")));
        assert_eq!(
            store.setex("k", 1.0, Value::from(1)),
            Err(VatError::NotImplemented("setex"))
        );
        assert_eq!(store.dump_string(), Err(VatError::NotImplemented("dump_string")));
    }
    assert!(store.is_empty());
}
