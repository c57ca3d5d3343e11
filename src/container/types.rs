//! Container struct definition
//!
//! A Container owns an ordered map of items plus an optional snapshot of
//! those items taken at construction or at the last [`Container::save`].

use std::fmt;

use crate::error::{ContainerError, Result};
use crate::value::{next_index, Key, Map, Value};

/// Ordered key/value collection with snapshot/revert support
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Container {
    pub(crate) items: Map,
    /// `Some` once the container is booted; `revert` restores it
    pub(crate) snapshot: Option<Map>,
}

impl Container {
    /// Create an empty, booted container
    pub fn new() -> Self {
        Self::from_map(Map::new())
    }

    /// Create a container from a map, snapshotting it
    pub fn from_map(items: Map) -> Self {
        Self {
            snapshot: Some(items.clone()),
            items,
        }
    }

    /// Create a container from a value; only maps are accepted
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Map(items) => Ok(Self::from_map(items)),
            other => Err(ContainerError::InvalidArgument(format!(
                "Bad argument given: expected a map, got {}",
                other.type_name()
            ))),
        }
    }

    /// A new booted container holding a copy of the current items
    pub fn copy(&self) -> Self {
        Self::from_map(self.items.clone())
    }

    pub fn all(&self) -> &Map {
        &self.items
    }

    pub fn into_map(self) -> Map {
        self.items
    }

    /// The items as a single map value
    pub fn to_value(&self) -> Value {
        Value::Map(self.items.clone())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_booted(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.items.iter()
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    pub fn get(&self, key: impl Into<Key>) -> Option<&Value> {
        self.items.get(&key.into())
    }

    pub fn get_mut(&mut self, key: impl Into<Key>) -> Option<&mut Value> {
        self.items.get_mut(&key.into())
    }

    /// Like `get`, but an absent key is an error
    pub fn get_or_err(&self, key: impl Into<Key>) -> Result<&Value> {
        let key = key.into();
        self.items
            .get(&key)
            .ok_or(ContainerError::MissingOffset(key))
    }

    pub fn has_key(&self, key: impl Into<Key>) -> bool {
        self.items.contains_key(&key.into())
    }

    /// Whether any top-level value strictly equals `value`
    pub fn has(&self, value: &Value) -> bool {
        self.items.values().any(|v| v == value)
    }

    /// Key of the first top-level value strictly equal to `value`
    pub fn find(&self, value: &Value) -> Option<&Key> {
        self.items
            .iter()
            .find_map(|(k, v)| (v == value).then_some(k))
    }

    pub fn first_key(&self) -> Result<&Key> {
        self.items.first().map(|(k, _)| k).ok_or(ContainerError::Empty)
    }

    pub fn last_key(&self) -> Result<&Key> {
        self.items.last().map(|(k, _)| k).ok_or(ContainerError::Empty)
    }

    pub fn first(&self) -> Result<&Value> {
        self.items.first().map(|(_, v)| v).ok_or(ContainerError::Empty)
    }

    pub fn last(&self) -> Result<&Value> {
        self.items.last().map(|(_, v)| v).ok_or(ContainerError::Empty)
    }

    /// The entry right after the first one
    pub fn second(&self) -> Result<(&Key, &Value)> {
        self.items
            .get_index(1)
            .ok_or_else(|| ContainerError::OutOfRange("need at least two items".to_string()))
    }

    /// The entry right before the last one
    pub fn second_last(&self) -> Result<(&Key, &Value)> {
        self.items
            .len()
            .checked_sub(2)
            .and_then(|i| self.items.get_index(i))
            .ok_or_else(|| ContainerError::OutOfRange("need at least two items".to_string()))
    }

    // ------------------------------------------------------------------
    // Insertion and removal
    // ------------------------------------------------------------------

    /// Append under the next free integer key; fails once `i64::MAX` is used
    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        let index = next_index(&self.items).ok_or_else(|| {
            ContainerError::OutOfRange("no integer key left after i64::MAX".to_string())
        })?;
        self.items.insert(Key::Int(index), value.into());
        Ok(())
    }

    /// Set `key`; an existing key keeps its position
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        self.items.insert(key.into(), value.into());
    }

    pub fn pop(&mut self) -> Option<Value> {
        self.items.pop().map(|(_, v)| v)
    }

    /// Remove the first value; integer keys are renumbered from zero
    pub fn shift(&mut self) -> Option<Value> {
        let value = self.items.shift_remove_index(0).map(|(_, v)| v);
        if value.is_some() {
            self.renumber();
        }
        value
    }

    /// Prepend a value; integer keys are renumbered from zero
    pub fn unshift(&mut self, value: impl Into<Value>) {
        let rest = std::mem::take(&mut self.items);
        self.items = renumbered(std::iter::once((Key::Int(0), value.into())).chain(rest));
    }

    /// Remove `key`, keeping the order of the remaining items
    pub fn remove(&mut self, key: impl Into<Key>) -> Option<Value> {
        self.items.shift_remove(&key.into())
    }

    /// Remove `key`; reports whether it was present
    pub fn forget(&mut self, key: impl Into<Key>) -> bool {
        self.remove(key).is_some()
    }

    /// Remove the first entry holding `value`; reports whether one was found
    pub fn forget_value(&mut self, value: &Value) -> bool {
        match self.items.iter().position(|(_, v)| v == value) {
            Some(index) => {
                self.items.shift_remove_index(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    // ------------------------------------------------------------------
    // Descending into nested maps
    // ------------------------------------------------------------------

    /// Replace the items with the map stored under the first key
    pub fn descend_first(&mut self) -> Result<()> {
        let key = self.first_key()?.clone();
        self.take(key)
    }

    /// Replace the items with the map stored under the last key
    pub fn descend_last(&mut self) -> Result<()> {
        let key = self.last_key()?.clone();
        self.take(key)
    }

    /// Replace the items with the map stored under `key`
    pub fn take(&mut self, key: impl Into<Key>) -> Result<()> {
        let key = key.into();
        match self.items.get(&key) {
            Some(Value::Map(inner)) => {
                self.items = inner.clone();
                Ok(())
            }
            Some(other) => Err(ContainerError::InvalidArgument(format!(
                "Bad key: {} holds a {}, not a map",
                key,
                other.type_name()
            ))),
            None => Err(ContainerError::MissingOffset(key)),
        }
    }

    // ------------------------------------------------------------------
    // Visiting
    // ------------------------------------------------------------------

    /// Read-only visit of every top-level entry
    pub fn each<F: FnMut(&Key, &Value)>(&self, mut f: F) {
        for (k, v) in &self.items {
            f(k, v);
        }
    }

    /// Replace every top-level value with `f(value)`; keys are kept
    pub fn map<F: FnMut(&Value) -> Value>(&mut self, mut f: F) {
        for v in self.items.values_mut() {
            *v = f(v);
        }
    }

    /// Mutable visit of every top-level entry
    pub fn walk<F: FnMut(&Key, &mut Value)>(&mut self, mut f: F) {
        for (k, v) in self.items.iter_mut() {
            f(k, v);
        }
    }

    /// Mutable visit of every leaf (non-map value) at any depth
    pub fn walk_recursive<F: FnMut(&Key, &mut Value)>(&mut self, mut f: F) {
        walk_leaves_mut(&mut self.items, &mut f);
    }

    // ------------------------------------------------------------------
    // Snapshot
    // ------------------------------------------------------------------

    /// Take a new snapshot of the current items
    pub fn save(&mut self) {
        self.snapshot = Some(self.items.clone());
    }

    /// Restore the last snapshot; no-op on an un-booted container
    pub fn revert(&mut self) {
        if let Some(snapshot) = &self.snapshot {
            self.items = snapshot.clone();
        }
    }

    /// Whether the items differ from the snapshot, order included
    pub fn is_changed(&self) -> bool {
        match &self.snapshot {
            Some(snapshot) => !snapshot.iter().eq(self.items.iter()),
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Shape
    // ------------------------------------------------------------------

    /// Whether any key is a string
    pub fn is_assoc(&self) -> bool {
        self.items.keys().any(|k| !k.is_int())
    }

    /// Whether any value is a nested map
    pub fn is_multi(&self) -> bool {
        self.items.values().any(Value::is_map)
    }

    /// Join the display form of every top-level value
    pub fn implode(&self, delimiter: &str) -> String {
        self.items
            .values()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(delimiter)
    }

    /// Renumber integer keys from zero, keeping string keys
    pub(crate) fn renumber(&mut self) {
        self.items = renumbered(std::mem::take(&mut self.items));
    }
}

/// Renumber integer keys from zero in order, keeping string keys
pub(crate) fn renumbered<I: IntoIterator<Item = (Key, Value)>>(entries: I) -> Map {
    let mut next = 0i64;
    entries
        .into_iter()
        .map(|(k, v)| match k {
            Key::Int(_) => {
                next += 1;
                (Key::Int(next - 1), v)
            }
            key => (key, v),
        })
        .collect()
}

fn walk_leaves_mut<F: FnMut(&Key, &mut Value)>(map: &mut Map, f: &mut F) {
    for (k, v) in map.iter_mut() {
        match v {
            Value::Map(inner) => walk_leaves_mut(inner, f),
            leaf => f(k, leaf),
        }
    }
}

impl From<Map> for Container {
    fn from(items: Map) -> Self {
        Self::from_map(items)
    }
}

impl From<&Container> for Container {
    fn from(other: &Container) -> Self {
        other.copy()
    }
}

impl FromIterator<(Key, Value)> for Container {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Container {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.implode(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn container(json: serde_json::Value) -> Container {
        Container::from_value(Value::from(json)).unwrap()
    }

    #[test]
    fn test_container_new() {
        let c = Container::new();
        assert!(c.is_empty());
        assert!(c.is_booted());
        assert!(!Container::default().is_booted());
    }

    #[test]
    fn test_from_value_rejects_scalars() {
        assert!(Container::from_value(Value::Int(1)).is_err());
        assert!(Container::from_value(Value::from("x")).is_err());
    }

    #[test]
    fn test_push_uses_next_int_key() {
        let mut c = container(json!({"a": 1, "5": 2}));
        c.push("x").unwrap();
        assert_eq!(c.get(6), Some(&Value::from("x")));
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_push_after_max_int_key() {
        let mut c = Container::from_json_str(r#"{"9223372036854775807": 1}"#).unwrap();
        assert!(matches!(c.push(2), Err(ContainerError::OutOfRange(_))));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_insert_keeps_position() {
        let mut c = container(json!({"a": 1, "b": 2}));
        c.insert("a", 10);
        assert_eq!(c.first_key().unwrap(), &Key::from("a"));
        assert_eq!(c.get("a"), Some(&Value::Int(10)));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_pop_and_shift() {
        let mut c = container(json!(["a", "b", "c"]));
        assert_eq!(c.pop(), Some(Value::from("c")));
        assert_eq!(c.shift(), Some(Value::from("a")));
        assert_eq!(c.get(0), Some(&Value::from("b")));
        assert_eq!(c.len(), 1);

        let mut empty = Container::new();
        assert_eq!(empty.pop(), None);
        assert_eq!(empty.shift(), None);
    }

    #[test]
    fn test_unshift_renumbers() {
        let mut c = container(json!({"x": 1, "3": 2}));
        c.unshift("first");
        let keys: Vec<Key> = c.all().keys().cloned().collect();
        assert_eq!(keys, vec![Key::Int(0), Key::from("x"), Key::Int(1)]);
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_first_last_on_empty() {
        let c = Container::new();
        assert!(matches!(c.first_key(), Err(ContainerError::Empty)));
        assert!(matches!(c.last_key(), Err(ContainerError::Empty)));
        assert!(matches!(c.first(), Err(ContainerError::Empty)));
        assert!(matches!(c.last(), Err(ContainerError::Empty)));
    }

    #[test]
    fn test_second_and_second_last() {
        let c = container(json!({"a": 1, "b": 2, "c": 3}));
        assert_eq!(c.second().unwrap(), (&Key::from("b"), &Value::Int(2)));
        assert_eq!(c.second_last().unwrap(), (&Key::from("b"), &Value::Int(2)));

        let one = container(json!([1]));
        assert!(one.second().is_err());
        assert!(one.second_last().is_err());
    }

    #[test]
    fn test_get_or_err() {
        let c = container(json!({"a": 1}));
        assert!(c.get_or_err("a").is_ok());
        assert!(matches!(c.get_or_err("b"), Err(ContainerError::MissingOffset(_))));
    }

    #[test]
    fn test_find_and_has() {
        let c = container(json!({"a": 1, "b": "1"}));
        assert_eq!(c.find(&Value::from("1")), Some(&Key::from("b")));
        assert!(c.has(&Value::Int(1)));
        assert!(!c.has(&Value::Float(1.0)));
    }

    #[test]
    fn test_forget() {
        let mut c = container(json!({"a": 1, "b": 2, "c": 3}));
        assert!(c.forget("b"));
        assert!(!c.forget("b"));
        assert!(c.forget_value(&Value::Int(3)));
        assert!(!c.forget_value(&Value::Int(3)));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_take_and_descend() {
        let mut c = container(json!({"a": {"x": 1}, "b": 2}));
        c.descend_first().unwrap();
        assert_eq!(c.all(), container(json!({"x": 1})).all());

        let mut c = container(json!({"a": {"x": 1}, "b": 2}));
        assert!(matches!(c.descend_last(), Err(ContainerError::InvalidArgument(_))));
        assert!(matches!(c.take("zz"), Err(ContainerError::MissingOffset(_))));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_walk_recursive_visits_leaves() {
        let mut c = container(json!({"a": 1, "b": {"c": 2, "d": {"e": 3}}}));
        c.walk_recursive(|_, v| {
            if let Value::Int(n) = v {
                *n *= 10;
            }
        });
        assert_eq!(c.to_value(), Value::from(json!({"a": 10, "b": {"c": 20, "d": {"e": 30}}})));
    }

    #[test]
    fn test_map_keeps_keys() {
        let mut c = container(json!({"a": 1, "b": 2}));
        c.map(|v| Value::Int(v.as_i64().unwrap_or(0) + 1));
        assert_eq!(c.get("b"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_save_and_revert() {
        let mut c = container(json!({"a": 1}));
        c.insert("b", 2);
        assert!(c.is_changed());
        c.revert();
        assert_eq!(c.len(), 1);
        assert!(!c.is_changed());

        c.insert("b", 2);
        c.save();
        c.clear();
        c.revert();
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_revert_unbooted_is_noop() {
        let mut c = Container::default();
        c.push(1).unwrap();
        c.revert();
        assert_eq!(c.len(), 1);
        assert!(!c.is_changed());
    }

    #[test]
    fn test_removal_counts_as_change() {
        let mut c = container(json!({"a": 1, "b": 2}));
        c.forget("a");
        assert!(c.is_changed());
    }

    #[test]
    fn test_shape_checks() {
        assert!(container(json!({"a": 1})).is_assoc());
        assert!(!container(json!([1, 2])).is_assoc());
        assert!(container(json!([1, [2]])).is_multi());
        assert!(!container(json!([1, 2])).is_multi());
    }

    #[test]
    fn test_implode_and_display() {
        let c = container(json!(["a", 1, true, null]));
        assert_eq!(c.implode(","), "a,1,1,");
        assert_eq!(c.to_string(), "a 1 1 ");
    }
}
