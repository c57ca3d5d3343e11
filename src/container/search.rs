//! Recursive search, filtering and key removal over nested maps

use std::fmt;

use crate::container::Container;
use crate::error::{ContainerError, Result};
use crate::value::{list_map, Key, Map, Value};

/// What `select` looks for
pub enum Condition {
    /// Flatten the items, then keep leaves for which the predicate holds
    Predicate(Box<dyn Fn(&Value) -> bool>),
    /// Sub-maps containing the key, whatever its value
    Key(Key),
    /// Sub-maps matching every key/value pair, narrowed pair by pair
    Pairs(Vec<(Key, Value)>),
}

impl Condition {
    pub fn predicate<F: Fn(&Value) -> bool + 'static>(f: F) -> Self {
        Condition::Predicate(Box::new(f))
    }

    pub fn key(key: impl Into<Key>) -> Self {
        Condition::Key(key.into())
    }

    pub fn pair(key: impl Into<Key>, value: impl Into<Value>) -> Self {
        Condition::Pairs(vec![(key.into(), value.into())])
    }

    /// Add another pair to AND with the existing ones; only pair
    /// conditions can be extended
    pub fn and(self, key: impl Into<Key>, value: impl Into<Value>) -> Result<Self> {
        match self {
            Condition::Pairs(mut pairs) => {
                pairs.push((key.into(), value.into()));
                Ok(Condition::Pairs(pairs))
            }
            other => Err(ContainerError::InvalidArgument(format!(
                "only key/value pair conditions can be combined, not {:?}",
                other
            ))),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Predicate(_) => f.write_str("Predicate(..)"),
            Condition::Key(k) => f.debug_tuple("Key").field(k).finish(),
            Condition::Pairs(pairs) => f.debug_tuple("Pairs").field(pairs).finish(),
        }
    }
}

impl TryFrom<Value> for Condition {
    type Error = ContainerError;

    /// A string names a key, a map lists key/value pairs in order
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Str(s) => Ok(Condition::Key(Key::from(s))),
            Value::Map(pairs) => Ok(Condition::Pairs(pairs.into_iter().collect())),
            other => Err(ContainerError::InvalidArgument(format!(
                "condition can be a predicate, a key or a map of pairs, got {}",
                other.type_name()
            ))),
        }
    }
}

/// How matches found by `select` are keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyMode {
    /// Under the key the matching sub-map has in its parent; later matches
    /// overwrite earlier ones with the same parent key
    #[default]
    Parent,
    /// As a dense `0..n` list
    Sequential,
}

impl Container {
    /// Replace the items with every sub-map matching `condition`
    pub fn select(&mut self, condition: &Condition, mode: KeyMode) -> Result<()> {
        match condition {
            Condition::Predicate(f) => {
                self.flatten();
                self.items.retain(|_, v| f(v));
            }
            Condition::Key(key) => {
                if *key == Key::Str(String::new()) {
                    return Ok(());
                }
                self.items = collect_matches(&self.items, key, None, mode);
            }
            Condition::Pairs(pairs) => {
                let Some(((key, value), rest)) = pairs.split_first() else {
                    return Ok(());
                };
                let mut found = collect_matches(&self.items, key, Some(value), mode);
                for (key, value) in rest {
                    found.retain(|_, m| matches_pair(m, key, Some(value)));
                }
                self.items = found;
            }
        }
        log::debug!("select {:?} left {} items", condition, self.items.len());
        Ok(())
    }

    /// `select` with parent keys, then keep only the first match: its
    /// entries for a key or pairs condition, the first matching leaf for a
    /// predicate
    pub fn find_where(&mut self, condition: &Condition) -> Result<()> {
        self.select(condition, KeyMode::Parent)?;
        if let Condition::Predicate(_) = condition {
            if self.items.is_empty() {
                return Err(ContainerError::Empty);
            }
            self.items.truncate(1);
            return Ok(());
        }
        self.descend_first()
    }

    /// A new container with the entries for which `pred` holds.
    ///
    /// With `recursive`, nested maps are filtered first (bottom-up) and the
    /// predicate then sees the already-filtered maps.
    pub fn filter<F: Fn(&Value) -> bool>(&self, pred: F, recursive: bool) -> Container {
        let items = if recursive {
            filter_recursive(&self.items, &pred)
        } else {
            self.items
                .iter()
                .filter(|(_, v)| pred(v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        };
        Container::from_map(items)
    }

    /// Drop falsy entries in place
    pub fn truthy(&mut self, recursive: bool) {
        self.items = self.filter(Value::is_truthy, recursive).into_map();
    }

    /// Remove `key` at the top level, or at every depth when `recursive`.
    /// Returns how many entries were removed.
    pub fn without(&mut self, key: impl Into<Key>, recursive: bool) -> usize {
        let key = key.into();
        if recursive {
            remove_recursive(&mut self.items, &key)
        } else {
            usize::from(self.items.shift_remove(&key).is_some())
        }
    }

    /// Collapse nested maps into one level of leaves; later leaves win on key clash
    pub fn flatten(&mut self) {
        let mut flat = Map::new();
        collect_leaves(&self.items, &mut |k, v| {
            flat.insert(k.clone(), v.clone());
        });
        self.items = flat;
    }

    /// Replace the items with every leaf stored under `field`, at any depth
    pub fn pull(&mut self, field: impl Into<Key>) {
        let field = field.into();
        let mut pulled = Vec::new();
        collect_leaves(&self.items, &mut |k, v| {
            if *k == field {
                pulled.push(v.clone());
            }
        });
        self.items = list_map(pulled);
    }
}

fn matches_pair(map: &Value, key: &Key, value: Option<&Value>) -> bool {
    let Some(map) = map.as_map() else {
        return false;
    };
    match (map.get(key), value) {
        (Some(_), None) => true,
        (Some(found), Some(wanted)) => found == wanted,
        (None, _) => false,
    }
}

/// Pre-order walk over every map node, the root included
fn collect_matches(root: &Map, key: &Key, value: Option<&Value>, mode: KeyMode) -> Map {
    let mut out = Map::new();
    visit_maps(root, None, &mut |parent_key, node| {
        let hit = match value {
            None => node.contains_key(key),
            Some(wanted) => node.get(key) == Some(wanted),
        };
        if !hit {
            return;
        }
        let found = Value::Map(node.clone());
        match (mode, parent_key) {
            (KeyMode::Parent, Some(parent)) => {
                if out.insert(parent.clone(), found).is_some() {
                    log::warn!("select: match under '{}' overwrote an earlier match", parent);
                }
            }
            _ => {
                // Fallback keys are dense: the root is visited first.
                out.insert(Key::from(out.len()), found);
            }
        }
    });
    out
}

fn visit_maps<'a, F>(node: &'a Map, parent_key: Option<&'a Key>, f: &mut F)
where
    F: FnMut(Option<&'a Key>, &'a Map),
{
    f(parent_key, node);
    for (k, v) in node {
        if let Value::Map(child) = v {
            visit_maps(child, Some(k), f);
        }
    }
}

fn collect_leaves<F: FnMut(&Key, &Value)>(map: &Map, f: &mut F) {
    for (k, v) in map {
        match v {
            Value::Map(inner) => collect_leaves(inner, f),
            leaf => f(k, leaf),
        }
    }
}

fn filter_recursive<F: Fn(&Value) -> bool>(map: &Map, pred: &F) -> Map {
    map.iter()
        .map(|(k, v)| match v {
            Value::Map(inner) => (k.clone(), Value::Map(filter_recursive(inner, pred))),
            other => (k.clone(), other.clone()),
        })
        .filter(|(_, v)| pred(v))
        .collect()
}

fn remove_recursive(map: &mut Map, key: &Key) -> usize {
    let mut removed = usize::from(map.shift_remove(key).is_some());
    for v in map.values_mut() {
        if let Value::Map(inner) = v {
            removed += remove_recursive(inner, key);
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn container(json: serde_json::Value) -> Container {
        Container::from_value(Value::from(json)).unwrap()
    }

    fn value(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn sample() -> Container {
        container(json!({
            "a": {"k": 1, "x": 1},
            "b": {"k": 2, "y": 2},
            "c": {"z": 3}
        }))
    }

    #[test]
    fn test_select_by_key() {
        let mut c = sample();
        c.select(&Condition::key("k"), KeyMode::Parent).unwrap();
        assert_eq!(c.len(), 2);
        assert_eq!(c.get("a"), Some(&value(json!({"k": 1, "x": 1}))));
        assert_eq!(c.get("b"), Some(&value(json!({"k": 2, "y": 2}))));
    }

    #[test]
    fn test_select_by_pair() {
        let mut c = sample();
        c.select(&Condition::pair("k", 2), KeyMode::Parent).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("b"), Some(&value(json!({"k": 2, "y": 2}))));
    }

    #[test]
    fn test_select_pair_uses_strict_equality() {
        let mut c = sample();
        c.select(&Condition::pair("k", "2"), KeyMode::Parent).unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn test_select_sequential_keys() {
        let mut c = sample();
        c.select(&Condition::key("k"), KeyMode::Sequential).unwrap();
        let keys: Vec<Key> = c.all().keys().cloned().collect();
        assert_eq!(keys, vec![Key::Int(0), Key::Int(1)]);
    }

    #[test]
    fn test_select_pairs_are_anded() {
        let mut c = container(json!({
            "a": {"k": 1, "x": 1},
            "b": {"k": 1, "x": 2},
            "c": {"k": 2, "x": 1}
        }));
        let condition = Condition::pair("k", 1).and("x", 1).unwrap();
        c.select(&condition, KeyMode::Parent).unwrap();
        assert_eq!(c.len(), 1);
        assert!(c.has_key("a"));
    }

    #[test]
    fn test_later_pairs_do_not_rescan_nested_maps() {
        let mut c = container(json!({
            "a": {"k": 1, "inner": {"x": 1}}
        }));
        let condition = Condition::pair("k", 1).and("x", 1).unwrap();
        c.select(&condition, KeyMode::Parent).unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn test_select_finds_deep_matches() {
        let mut c = container(json!({
            "users": {
                "u1": {"role": "admin", "name": "ann"},
                "group": {"u2": {"role": "user", "name": "bob"}}
            }
        }));
        c.select(&Condition::key("role"), KeyMode::Parent).unwrap();
        assert_eq!(c.len(), 2);
        assert!(c.has_key("u1"));
        assert!(c.has_key("u2"));
    }

    #[test]
    fn test_select_root_match_is_appended() {
        let mut c = container(json!({"k": 1, "sub": {"k": 2}}));
        c.select(&Condition::key("k"), KeyMode::Parent).unwrap();
        assert_eq!(c.get(0), Some(&value(json!({"k": 1, "sub": {"k": 2}}))));
        assert_eq!(c.get("sub"), Some(&value(json!({"k": 2}))));
    }

    #[test]
    fn test_select_parent_key_collision_last_wins() {
        let mut c = container(json!({
            "left": {"item": {"k": 1}},
            "right": {"item": {"k": 2}}
        }));
        c.select(&Condition::key("k"), KeyMode::Parent).unwrap();
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("item"), Some(&value(json!({"k": 2}))));

        let mut c = container(json!({
            "left": {"item": {"k": 1}},
            "right": {"item": {"k": 2}}
        }));
        c.select(&Condition::key("k"), KeyMode::Sequential).unwrap();
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_select_key_matches_null_values() {
        let mut c = container(json!({"a": {"k": null}}));
        c.select(&Condition::key("k"), KeyMode::Parent).unwrap();
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_select_empty_conditions_are_noops() {
        let mut c = sample();
        c.select(&Condition::Pairs(Vec::new()), KeyMode::Parent).unwrap();
        c.select(&Condition::key(""), KeyMode::Parent).unwrap();
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_select_predicate_flattens() {
        let mut c = sample();
        c.select(&Condition::predicate(|v| v.as_i64() == Some(2)), KeyMode::Parent)
            .unwrap();
        // "k" from b overwrote "k" from a during flattening
        assert_eq!(c.get("k"), Some(&Value::Int(2)));
        assert_eq!(c.get("y"), Some(&Value::Int(2)));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_condition_from_value() {
        assert!(matches!(
            Condition::try_from(Value::from("k")).unwrap(),
            Condition::Key(_)
        ));
        match Condition::try_from(value(json!({"k": 1, "x": 2}))).unwrap() {
            Condition::Pairs(pairs) => {
                assert_eq!(pairs[0], (Key::from("k"), Value::Int(1)));
                assert_eq!(pairs[1], (Key::from("x"), Value::Int(2)));
            }
            other => panic!("Expected pairs, got {:?}", other),
        }
        assert!(matches!(
            Condition::try_from(Value::Int(3)),
            Err(ContainerError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_find_where() {
        let mut c = sample();
        c.find_where(&Condition::pair("k", 2)).unwrap();
        assert_eq!(c.to_value(), value(json!({"k": 2, "y": 2})));

        let mut c = sample();
        assert!(matches!(
            c.find_where(&Condition::key("missing")),
            Err(ContainerError::Empty)
        ));
    }

    #[test]
    fn test_find_where_predicate_keeps_first_leaf() {
        let mut c = sample();
        c.find_where(&Condition::predicate(|v| v.as_i64().is_some_and(|n| n >= 2)))
            .unwrap();
        assert_eq!(c.to_value(), value(json!({"k": 2})));

        let mut c = sample();
        assert!(matches!(
            c.find_where(&Condition::predicate(|v| v.is_map())),
            Err(ContainerError::Empty)
        ));
    }

    #[test]
    fn test_and_only_extends_pairs() {
        assert!(matches!(
            Condition::key("k").and("x", 9),
            Err(ContainerError::InvalidArgument(_))
        ));
        assert!(matches!(
            Condition::predicate(|_| true).and("x", 9),
            Err(ContainerError::InvalidArgument(_))
        ));

        let mut c = container(json!({"a": {"k": 1, "x": 1}, "b": {"k": 2, "x": 9}}));
        let condition = Condition::pair("k", 2).and("x", 9).unwrap();
        c.select(&condition, KeyMode::Parent).unwrap();
        assert_eq!(c.len(), 1);
        assert!(c.has_key("b"));
    }

    #[test]
    fn test_without_recursive() {
        let mut c = sample();
        assert_eq!(c.without("k", true), 2);
        assert_eq!(
            c.to_value(),
            value(json!({"a": {"x": 1}, "b": {"y": 2}, "c": {"z": 3}}))
        );
    }

    #[test]
    fn test_without_top_level_only() {
        let mut c = container(json!({"k": 0, "a": {"k": 1}}));
        assert_eq!(c.without("k", false), 1);
        assert_eq!(c.to_value(), value(json!({"a": {"k": 1}})));
        assert_eq!(c.without("missing", true), 0);
    }

    #[test]
    fn test_filter_top_level() {
        let c = container(json!({"a": 0, "b": 1, "c": {"d": 0}}));
        let filtered = c.filter(Value::is_truthy, false);
        assert_eq!(filtered.to_value(), value(json!({"b": 1, "c": {"d": 0}})));
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_filter_recursive_bottom_up() {
        let c = container(json!({"a": 0, "b": 1, "c": {"d": 0}, "e": {"f": "x", "g": ""}}));
        let filtered = c.filter(Value::is_truthy, true);
        assert_eq!(filtered.to_value(), value(json!({"b": 1, "e": {"f": "x"}})));
    }

    #[test]
    fn test_truthy_in_place() {
        let mut c = container(json!(["", "a", 0, null, false, "0", [1]]));
        c.truthy(false);
        assert_eq!(c.len(), 2);
        assert_eq!(c.get(1), Some(&Value::from("a")));
    }

    #[test]
    fn test_flatten() {
        let mut c = container(json!({"a": 1, "b": {"c": 2, "d": {"e": 3}}, "f": {}}));
        c.flatten();
        assert_eq!(c.to_value(), value(json!({"a": 1, "c": 2, "e": 3})));
    }

    #[test]
    fn test_pull() {
        let mut c = container(json!([
            {"id": 1, "name": "ann"},
            {"id": 2, "meta": {"name": "bob"}},
            {"id": 3}
        ]));
        c.pull("name");
        assert_eq!(c.to_value(), value(json!(["ann", "bob"])));
    }
}
