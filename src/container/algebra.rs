//! Reordering, slicing, merging and set-style views
//!
//! Mutating operations renumber integer keys the way list operations do:
//! string keys keep their names, integer keys are reassigned `0..` in order.

use std::cmp::Ordering;

use rand::seq::SliceRandom;
use regex::Regex;

use crate::container::types::renumbered;
use crate::container::Container;
use crate::error::{ContainerError, Result};
use crate::value::{list_map, Key, Map, Value};

impl Container {
    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    pub fn keys(&self) -> Container {
        Container::from_map(list_map(self.items.keys().map(Key::to_value)))
    }

    pub fn values(&self) -> Container {
        Container::from_map(list_map(self.items.values().cloned()))
    }

    /// Split the values into lists of `size`
    pub fn chunk(&self, size: usize) -> Result<Container> {
        if size == 0 {
            return Err(ContainerError::InvalidArgument(
                "chunk size must be positive".to_string(),
            ));
        }
        if size > self.len() {
            return Err(ContainerError::OutOfRange(format!(
                "chunk size {} exceeds length {}",
                size,
                self.len()
            )));
        }
        let values: Vec<Value> = self.items.values().cloned().collect();
        let chunks = values
            .chunks(size)
            .map(|chunk| Value::list(chunk.iter().cloned()));
        Ok(Container::from_map(list_map(chunks)))
    }

    /// Entries whose value also appears in `other` (or whose key and value
    /// both match when `assoc`)
    pub fn intersect(&self, other: &Container, assoc: bool) -> Container {
        self.items
            .iter()
            .filter(|(k, v)| {
                if assoc {
                    other.items.get(*k) == Some(*v)
                } else {
                    other.has(v)
                }
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Entries whose key appears in `other`
    pub fn intersect_key(&self, other: &Container) -> Container {
        self.items
            .iter()
            .filter(|(k, _)| other.items.contains_key(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Entries whose value does not appear in `other`
    pub fn diff(&self, other: &Container) -> Container {
        self.items
            .iter()
            .filter(|(_, v)| !other.has(v))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Entries whose key does not appear in `other`
    pub fn diff_key(&self, other: &Container) -> Container {
        self.items
            .iter()
            .filter(|(k, _)| !other.items.contains_key(*k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// The value under `key` of every nested map that has it
    pub fn column(&self, key: impl Into<Key>) -> Container {
        let key = key.into();
        let found = self
            .items
            .values()
            .filter_map(|v| v.as_map().and_then(|m| m.get(&key)).cloned());
        Container::from_map(list_map(found))
    }

    /// How often each value occurs; values must be integers or strings
    pub fn count_values(&self) -> Result<Container> {
        let mut counts = Map::new();
        for v in self.items.values() {
            let key = Key::try_from(v)?;
            let slot = counts.entry(key).or_insert(Value::Int(0));
            if let Value::Int(n) = slot {
                *n += 1;
            }
        }
        Ok(Container::from_map(counts))
    }

    /// Everything except the last `count` entries
    pub fn initial(&self, count: usize) -> Result<Container> {
        if count >= self.len() {
            return Err(ContainerError::OutOfRange(format!(
                "can not drop {} of {} items",
                count,
                self.len()
            )));
        }
        let keep = self.len() - count;
        Ok(self
            .items
            .iter()
            .take(keep)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// Everything from entry `index` on
    pub fn rest(&self, index: usize) -> Result<Container> {
        if index >= self.len() {
            return Err(ContainerError::OutOfRange(format!(
                "index {} past length {}",
                index,
                self.len()
            )));
        }
        Ok(self
            .items
            .iter()
            .skip(index)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    /// `quantity` distinct keys picked at random, in container order
    pub fn random_keys(&self, quantity: usize) -> Result<Vec<Key>> {
        if quantity == 0 || quantity > self.len() {
            return Err(ContainerError::OutOfRange(format!(
                "can not pick {} keys from {} items",
                quantity,
                self.len()
            )));
        }
        let mut rng = rand::rng();
        let mut picked = rand::seq::index::sample(&mut rng, self.len(), quantity).into_vec();
        picked.sort_unstable();
        Ok(picked
            .into_iter()
            .filter_map(|i| self.items.get_index(i).map(|(k, _)| k.clone()))
            .collect())
    }

    /// Sum of the top-level numbers; an integer when every value is one
    pub fn sum(&self) -> Result<Value> {
        let mut int_total: i64 = 0;
        let mut float_total: f64 = 0.0;
        let mut all_ints = true;
        for v in self.items.values() {
            match v {
                Value::Int(n) => {
                    float_total += *n as f64;
                    match int_total.checked_add(*n) {
                        Some(total) => int_total = total,
                        None => all_ints = false,
                    }
                }
                Value::Float(x) => {
                    float_total += x;
                    all_ints = false;
                }
                other => {
                    return Err(ContainerError::InvalidArgument(format!(
                        "can not sum a {}",
                        other.type_name()
                    )))
                }
            }
        }
        Ok(if all_ints {
            Value::Int(int_total)
        } else {
            Value::Float(float_total)
        })
    }

    /// A new container with `slice` semantics; see [`Container::cut`]
    pub fn slice(&self, offset: i64, length: Option<i64>, preserve_keys: bool) -> Container {
        let (start, end) = slice_bounds(self.len(), offset, length);
        let entries = self
            .items
            .iter()
            .skip(start)
            .take(end - start)
            .map(|(k, v)| (k.clone(), v.clone()));
        let items = if preserve_keys {
            entries.collect()
        } else {
            renumbered(entries)
        };
        Container::from_map(items)
    }

    // ------------------------------------------------------------------
    // In-place reshaping
    // ------------------------------------------------------------------

    /// Keep `length` entries starting at `offset`.
    ///
    /// A negative offset counts from the end, a negative length stops that
    /// many entries before the end, `None` runs to the end.
    pub fn cut(&mut self, offset: i64, length: Option<i64>, preserve_keys: bool) {
        self.items = self.slice(offset, length, preserve_keys).into_map();
    }

    /// Drop repeated values, keeping the first occurrence and its key
    pub fn unique(&mut self) {
        let mut seen: Vec<Value> = Vec::new();
        self.items.retain(|_, v| {
            if seen.contains(v) {
                false
            } else {
                seen.push(v.clone());
                true
            }
        });
    }

    /// Shuffle the values; keys become `0..n`
    pub fn shuffle(&mut self) {
        let mut values: Vec<Value> = std::mem::take(&mut self.items).into_values().collect();
        values.shuffle(&mut rand::rng());
        self.items = list_map(values);
    }

    pub fn reverse(&mut self, preserve_keys: bool) {
        let entries = std::mem::take(&mut self.items).into_iter().rev();
        self.items = if preserve_keys {
            entries.collect()
        } else {
            renumbered(entries)
        };
    }

    /// Re-key the values as `0..n`
    pub fn line_keys(&mut self) {
        self.items = list_map(std::mem::take(&mut self.items).into_values());
    }

    /// Swap keys and values. Every value must be an integer or a string;
    /// on duplicate values the last key wins.
    pub fn flip(&mut self) -> Result<()> {
        let flipped = self
            .items
            .iter()
            .map(|(k, v)| Ok((Key::try_from(v)?, k.to_value())))
            .collect::<Result<Map>>()?;
        self.items = flipped;
        Ok(())
    }

    /// Stable sort of the values; keys become `0..n`
    pub fn sort_by<F: FnMut(&Value, &Value) -> Ordering>(&mut self, compare: F) {
        let mut values: Vec<Value> = std::mem::take(&mut self.items).into_values().collect();
        values.sort_by(compare);
        self.items = list_map(values);
    }

    /// Sort entries by key, integers before strings
    pub fn sort_keys(&mut self) {
        self.items.sort_keys();
    }

    /// Keep scalar entries whose display form matches `pattern`
    pub fn grep(&mut self, pattern: &str) -> Result<()> {
        let re = Regex::new(pattern)
            .map_err(|e| ContainerError::InvalidArgument(format!("bad pattern: {}", e)))?;
        self.items
            .retain(|_, v| !v.is_map() && re.is_match(&v.to_string()));
        Ok(())
    }

    /// Grow to `|size|` entries with `value`: appended when `size` is
    /// positive, prepended when negative. Integer keys are renumbered.
    pub fn pad(&mut self, size: i64, value: impl Into<Value>) {
        let target = size.unsigned_abs() as usize;
        if target <= self.len() {
            return;
        }
        let value = value.into();
        let fill = (0..target - self.len()).map(|_| (Key::Int(0), value.clone()));
        let current = std::mem::take(&mut self.items);
        self.items = if size > 0 {
            renumbered(current.into_iter().chain(fill))
        } else {
            renumbered(fill.chain(current))
        };
    }

    /// Append `other`: integer keys are renumbered, string keys overwrite
    pub fn merge(&mut self, other: &Map) {
        let current = std::mem::take(&mut self.items);
        self.items = renumbered(
            current
                .into_iter()
                .chain(other.iter().map(|(k, v)| (k.clone(), v.clone()))),
        );
    }

    /// Merge `other` into the map stored under `key`; a scalar there is
    /// first wrapped into a one-element list
    pub fn merge_into(&mut self, key: impl Into<Key>, other: &Map) -> Result<()> {
        let key = key.into();
        let slot = self
            .items
            .get_mut(&key)
            .ok_or_else(|| ContainerError::InvalidArgument(format!("Bad key given: {}", key)))?;
        let inner = match std::mem::take(slot) {
            Value::Map(m) => m,
            scalar => list_map([scalar]),
        };
        let mut nested = Container::from_map(inner);
        nested.merge(other);
        *slot = Value::Map(nested.into_map());
        Ok(())
    }

    /// Use `keys` as keys for the current values
    pub fn combine_keys(&mut self, keys: &[Value]) -> Result<()> {
        let values: Vec<Value> = self.items.values().cloned().collect();
        self.items = zip_entries(keys, values)?;
        Ok(())
    }

    /// Use `values` as values for the current keys
    pub fn combine_values(&mut self, values: Vec<Value>) -> Result<()> {
        let keys: Vec<Value> = self.items.keys().map(Key::to_value).collect();
        self.items = zip_entries(&keys, values)?;
        Ok(())
    }

    /// Rebuild the items from parallel key and value lists
    pub fn combine(&mut self, keys: &[Value], values: Vec<Value>) -> Result<()> {
        self.items = zip_entries(keys, values)?;
        Ok(())
    }
}

fn zip_entries(keys: &[Value], values: Vec<Value>) -> Result<Map> {
    if keys.len() != values.len() {
        return Err(ContainerError::InvalidArgument(format!(
            "{} keys for {} values",
            keys.len(),
            values.len()
        )));
    }
    keys.iter()
        .zip(values)
        .map(|(k, v)| Ok((Key::try_from(k)?, v)))
        .collect()
}

fn slice_bounds(len: usize, offset: i64, length: Option<i64>) -> (usize, usize) {
    let n = len as i64;
    let start = if offset < 0 {
        n.saturating_add(offset).max(0)
    } else {
        offset.min(n)
    };
    let end = match length {
        None => n,
        Some(l) if l < 0 => n.saturating_add(l).max(start),
        Some(l) => start.saturating_add(l).min(n),
    };
    (start as usize, end as usize)
}
