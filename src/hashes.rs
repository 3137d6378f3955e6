use std::collections::HashMap;

use crate::entry::Entry;
use crate::storage::Store;
use crate::strings::{collect_pairs, flatten_pairs};
use crate::value::Value;

type Fields = HashMap<String, Value>;

impl Store {
    /// Runs `f` on the hash at `key`, creating an empty hash when the key is
    /// missing. `None` when `key` holds another kind.
    fn with_hash_or_create<R>(&self, key: &str, f: impl FnOnce(&mut Fields) -> R) -> Option<R> {
        let mut entry = self
            .inner
            .data
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Hash(HashMap::new())));
        match &mut entry.value {
            Value::Hash(fields) => Some(f(fields)),
            _ => None,
        }
    }

    fn with_hash_mut<R>(&self, key: &str, f: impl FnOnce(&mut Fields) -> R) -> Option<R> {
        let mut entry = self.inner.data.get_mut(key)?;
        match &mut entry.value {
            Value::Hash(fields) => Some(f(fields)),
            _ => None,
        }
    }

    fn with_hash<R>(&self, key: &str, f: impl FnOnce(&Fields) -> R) -> Option<R> {
        let entry = self.inner.data.get(key)?;
        match &entry.value {
            Value::Hash(fields) => Some(f(fields)),
            _ => None,
        }
    }

    pub fn hdel<F: AsRef<str>>(&self, key: &str, fields: &[F]) -> usize {
        let mut removed = 0;
        for field in fields {
            let field = field.as_ref();
            if self.with_hash_mut(key, |map| map.remove(field).is_some()) == Some(true) {
                self.notify("hdel", key, vec![Value::from(field)]);
                removed += 1;
            }
        }
        removed
    }

    pub fn hexists(&self, key: &str, field: &str) -> bool {
        let exists = self
            .with_hash(key, |map| map.contains_key(field))
            .unwrap_or(false);
        self.notify("hexists", key, vec![Value::from(field), Value::Bool(exists)]);
        exists
    }

    pub fn hget(&self, key: &str, field: &str) -> Option<Value> {
        let value = self.with_hash(key, |map| map.get(field).cloned()).flatten()?;
        self.notify("hget", key, vec![Value::from(field), value.clone()]);
        Some(value)
    }

    /// Every field and value; empty when `key` is missing or not a hash.
    pub fn hgetall(&self, key: &str) -> HashMap<String, Value> {
        let fields = self.with_hash(key, |map| map.clone()).unwrap_or_default();
        self.notify("hgetall", key, vec![Value::Hash(fields.clone())]);
        fields
    }

    pub fn hincr(&self, key: &str, field: &str) -> Option<f64> {
        let value = self.hincrby(key, field, 1.0)?;
        self.notify("hincr", key, vec![Value::from(field), Value::Number(value)]);
        Some(value)
    }

    pub fn hincrby(&self, key: &str, field: &str, delta: f64) -> Option<f64> {
        let value = self.hash_add(key, field, delta)?;
        self.notify(
            "hincrby",
            key,
            vec![Value::from(field), Value::Number(delta), Value::Number(value)],
        );
        Some(value)
    }

    pub fn hdecr(&self, key: &str, field: &str) -> Option<f64> {
        let value = self.hdecrby(key, field, 1.0)?;
        self.notify("hdecr", key, vec![Value::from(field), Value::Number(value)]);
        Some(value)
    }

    pub fn hdecrby(&self, key: &str, field: &str, delta: f64) -> Option<f64> {
        let value = self.hash_add(key, field, -delta)?;
        self.notify(
            "hdecrby",
            key,
            vec![Value::from(field), Value::Number(delta), Value::Number(value)],
        );
        Some(value)
    }

    /// A missing field counts as zero; a non-numeric field is left alone.
    fn hash_add(&self, key: &str, field: &str, delta: f64) -> Option<f64> {
        if !delta.is_finite() {
            return None;
        }
        self.with_hash_or_create(key, |map| {
            match map
                .entry(field.to_string())
                .or_insert(Value::Number(0.0))
            {
                Value::Number(n) => {
                    *n += delta;
                    Some(*n)
                }
                _ => None,
            }
        })
        .flatten()
    }

    pub fn hkeys(&self, key: &str) -> Vec<String> {
        let fields: Vec<String> = self
            .with_hash(key, |map| map.keys().cloned().collect())
            .unwrap_or_default();

        let listed = fields.iter().map(|f| Value::from(f.as_str())).collect();
        self.notify("hkeys", key, vec![Value::List(listed)]);
        fields
    }

    pub fn hlen(&self, key: &str) -> usize {
        let len = self.with_hash(key, |map| map.len()).unwrap_or(0);
        self.notify("hlen", key, vec![Value::from(len)]);
        len
    }

    pub fn hmget<F: AsRef<str>>(&self, key: &str, fields: &[F]) -> Vec<Option<Value>> {
        let values: Vec<Option<Value>> = fields
            .iter()
            .map(|field| self.hget(key, field.as_ref()))
            .collect();

        let listed = values.iter().cloned().map(Value::or_sentinel).collect();
        self.notify("hmget", key, vec![Value::List(listed)]);
        values
    }

    /// Sets every field before announcing any of them. Refuses the whole
    /// batch if `key` holds another kind or a value is not a scalar.
    pub fn hmset<I, F, V>(&self, key: &str, pairs: I) -> bool
    where
        I: IntoIterator<Item = (F, V)>,
        F: Into<String>,
        V: Into<Value>,
    {
        let pairs = collect_pairs(pairs);
        if pairs.iter().any(|(_, value)| !value.is_scalar()) {
            return false;
        }

        let applied = self.with_hash_or_create(key, |map| {
            for (field, value) in &pairs {
                map.insert(field.clone(), value.clone());
            }
        });
        if applied.is_none() {
            return false;
        }

        for (field, value) in &pairs {
            self.notify("hset", key, vec![Value::from(field.as_str()), value.clone()]);
        }
        self.notify("hmset", key, flatten_pairs(&pairs));
        true
    }

    /// Returns whether the field already existed, `None` when `key` holds
    /// another kind or `value` is not a scalar.
    pub fn hset(&self, key: &str, field: &str, value: impl Into<Value>) -> Option<bool> {
        let value = value.into();
        if !value.is_scalar() {
            return None;
        }

        let existed = self.with_hash_or_create(key, |map| {
            map.insert(field.to_string(), value.clone()).is_some()
        })?;

        self.notify("hset", key, vec![Value::from(field), value]);
        Some(existed)
    }

    pub fn hsetnx(&self, key: &str, field: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        if !value.is_scalar() {
            return false;
        }

        let inserted = self.with_hash_or_create(key, |map| {
            if map.contains_key(field) {
                false
            } else {
                map.insert(field.to_string(), value.clone());
                true
            }
        });
        if inserted != Some(true) {
            return false;
        }

        self.notify("hset", key, vec![Value::from(field), value.clone()]);
        self.notify("hsetnx", key, vec![Value::from(field), value]);
        true
    }

    pub fn hvals(&self, key: &str) -> Vec<Value> {
        let values: Vec<Value> = self
            .with_hash(key, |map| map.values().cloned().collect())
            .unwrap_or_default();

        self.notify("hvals", key, vec![Value::List(values.clone())]);
        values
    }
}
