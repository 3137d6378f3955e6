use crate::entry::Entry;
use crate::error::VatError;
use crate::storage::Store;
use crate::value::{Kind, Value};

impl Store {
    pub fn append(&self, key: &str, value: &str) -> Option<String> {
        let appended = {
            let mut entry = self.inner.data.get_mut(key)?;
            match &mut entry.value {
                Value::Str(current) => {
                    current.push_str(value);
                    current.clone()
                }
                _ => return None,
            }
        };

        self.clear_expiry(key);
        self.notify(
            "append",
            key,
            vec![Value::from(value), Value::from(appended.as_str())],
        );
        Some(appended)
    }

    pub fn decr(&self, key: &str) -> Option<f64> {
        let value = self.decrby(key, 1.0)?;
        self.notify("decr", key, vec![Value::Number(value)]);
        Some(value)
    }

    pub fn decrby(&self, key: &str, delta: f64) -> Option<f64> {
        let value = self.add(key, -delta)?;
        self.notify("decrby", key, vec![Value::Number(delta), Value::Number(value)]);
        Some(value)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let value = self.inner.data.get(key).map(|entry| entry.value.clone())?;
        self.notify("get", key, vec![value.clone()]);
        Some(value)
    }

    pub fn getbit(&self, _key: &str, _offset: usize) -> Result<bool, VatError> {
        Err(VatError::NotImplemented("getbit"))
    }

    /// Substring by char positions, `end` exclusive. Negative positions count
    /// from the end; `None` for `end` reads to the end of the string.
    pub fn getrange(&self, key: &str, start: i64, end: Option<i64>) -> Option<String> {
        let range = {
            let entry = self.inner.data.get(key)?;
            match &entry.value {
                Value::Str(current) => slice_chars(current, start, end),
                _ => return None,
            }
        };

        self.notify("getrange", key, vec![Value::from(range.as_str())]);
        Some(range)
    }

    /// Sets `key` and returns the string it held. Any other kind at `key`,
    /// or a value `set` would refuse, leaves the key untouched.
    pub fn getset(&self, key: &str, value: impl Into<Value>) -> Option<String> {
        let value = value.into();
        if !value.is_storable() {
            return None;
        }
        match self.kind_at(key) {
            Kind::None => {
                self.set(key, value, None);
                None
            }
            Kind::String => {
                let old = match self.get(key) {
                    Some(Value::Str(old)) => Some(old),
                    _ => None,
                };
                self.set(key, value, None);
                old
            }
            _ => None,
        }
    }

    pub fn incr(&self, key: &str) -> Option<f64> {
        let value = self.incrby(key, 1.0)?;
        self.notify("incr", key, vec![Value::Number(value)]);
        Some(value)
    }

    pub fn incrby(&self, key: &str, delta: f64) -> Option<f64> {
        let value = self.add(key, delta)?;
        self.notify("incrby", key, vec![Value::Number(delta), Value::Number(value)]);
        Some(value)
    }

    /// A missing key counts as zero. Anything but a number refuses.
    fn add(&self, key: &str, delta: f64) -> Option<f64> {
        if !delta.is_finite() {
            return None;
        }

        let value = {
            let mut entry = self
                .inner
                .data
                .entry(key.to_string())
                .or_insert_with(|| Entry::new(Value::Number(0.0)));
            match &mut entry.value {
                Value::Number(n) => {
                    *n += delta;
                    *n
                }
                _ => return None,
            }
        };

        self.clear_expiry(key);
        Some(value)
    }

    pub fn mget<K: AsRef<str>>(&self, keys: &[K]) -> Vec<Option<Value>> {
        let values: Vec<Option<Value>> = keys.iter().map(|key| self.get(key.as_ref())).collect();

        let listed = values.iter().cloned().map(Value::or_sentinel).collect();
        self.publish("mget", &[Value::List(listed)]);
        values
    }

    /// Writes every pair, then announces them. Listeners never observe a
    /// half-written batch. Refuses the whole batch if any value is a hash
    /// holding non-scalars.
    pub fn mset<I, K, V>(&self, pairs: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let pairs = collect_pairs(pairs);
        if !pairs.iter().all(|(_, value)| value.is_storable()) {
            return false;
        }

        for (key, value) in &pairs {
            self.replace_entry(key, Entry::new(value.clone()));
        }

        for (key, value) in &pairs {
            self.notify("set", key, vec![value.clone()]);
        }
        self.publish("mset", &flatten_pairs(&pairs));
        true
    }

    /// All or nothing: writes only when none of the keys exist.
    pub fn msetnx<I, K, V>(&self, pairs: I) -> bool
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let pairs = collect_pairs(pairs);
        if !pairs.iter().all(|(_, value)| value.is_storable())
            || pairs.iter().any(|(key, _)| self.contains(key))
        {
            return false;
        }

        for (key, value) in &pairs {
            self.replace_entry(key, Entry::new(value.clone()));
        }

        for (key, value) in &pairs {
            self.notify("set", key, vec![value.clone()]);
            self.notify("setnx", key, vec![value.clone()]);
        }
        self.publish("msetnx", &flatten_pairs(&pairs));
        true
    }

    /// Overwrites `key` whatever it held, dropping any TTL, then applies
    /// `ttl` seconds when given. Refuses a hash holding non-scalars.
    pub fn set(&self, key: &str, value: impl Into<Value>, ttl: Option<f64>) -> bool {
        let value = value.into();
        if !value.is_storable() {
            return false;
        }
        self.replace_entry(key, Entry::new(value.clone()));
        if let Some(seconds) = ttl {
            self.expire(key, seconds);
        }
        self.notify("set", key, vec![value]);
        true
    }

    pub fn setbit(&self, _key: &str, _offset: usize, _bit: bool) -> Result<bool, VatError> {
        Err(VatError::NotImplemented("setbit"))
    }

    pub fn setex(&self, _key: &str, _seconds: f64, _value: Value) -> Result<(), VatError> {
        Err(VatError::NotImplemented("setex"))
    }

    pub fn setnx(&self, key: &str, value: impl Into<Value>, ttl: Option<f64>) -> bool {
        if self.contains(key) {
            return false;
        }
        let value = value.into();
        if !self.set(key, value.clone(), ttl) {
            return false;
        }
        self.notify("setnx", key, vec![value]);
        true
    }

    /// Overwrites part of a string starting at char `offset` and returns the
    /// new length. An offset past the end appends without padding.
    pub fn setrange(&self, key: &str, offset: usize, value: &str) -> Option<usize> {
        let updated = {
            let mut entry = self.inner.data.get_mut(key)?;
            let Value::Str(current) = &mut entry.value else {
                return None;
            };
            let resume = offset.saturating_add(value.chars().count());
            let head: String = current.chars().take(offset).collect();
            let tail: String = current.chars().skip(resume).collect();
            *current = format!("{}{}{}", head, value, tail);
            current.clone()
        };

        self.clear_expiry(key);
        let len = updated.chars().count();
        self.notify("setrange", key, vec![Value::from(updated)]);
        Some(len)
    }

    pub fn strlen(&self, key: &str) -> Option<usize> {
        let len = match &self.inner.data.get(key)?.value {
            Value::Str(current) => current.chars().count(),
            _ => return None,
        };

        self.notify("strlen", key, vec![Value::from(len)]);
        Some(len)
    }
}

pub(crate) fn collect_pairs<I, K, V>(pairs: I) -> Vec<(String, Value)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

pub(crate) fn flatten_pairs(pairs: &[(String, Value)]) -> Vec<Value> {
    pairs
        .iter()
        .flat_map(|(key, value)| [Value::from(key.as_str()), value.clone()])
        .collect()
}

fn slice_chars(s: &str, start: i64, end: Option<i64>) -> String {
    let len = s.chars().count() as i64;
    let resolve = |i: i64| if i < 0 { (len + i).max(0) } else { i.min(len) };
    let from = resolve(start);
    let to = end.map_or(len, resolve);
    if from >= to {
        return String::new();
    }
    s.chars()
        .skip(from as usize)
        .take((to - from) as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_like_half_open_ranges() {
        assert_eq!(slice_chars("hello world", 0, Some(5)), "hello");
        assert_eq!(slice_chars("hello world", 6, None), "world");
        assert_eq!(slice_chars("hello world", -5, None), "world");
        assert_eq!(slice_chars("hello world", 0, Some(-6)), "hello");
        assert_eq!(slice_chars("hello", 3, Some(1)), "");
        assert_eq!(slice_chars("hello", 10, None), "");
        assert_eq!(slice_chars("héllo", 1, Some(2)), "é");
    }

    #[test]
    fn pairs_flatten_in_order() {
        let pairs = collect_pairs([("a", 1), ("b", 2)]);
        assert_eq!(
            flatten_pairs(&pairs),
            vec![
                Value::from("a"),
                Value::from(1),
                Value::from("b"),
                Value::from(2)
            ]
        );
    }
}
