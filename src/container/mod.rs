//! Container module
//!
//! A Container wraps an ordered key/value map and offers:
//! - Insertion and removal at both ends, lookups, snapshots (`types`)
//! - Recursive search, filtering and key removal (`search`)
//! - Slicing, merging, set-style views and reordering (`algebra`)
//! - JSON, file and encoded-string persistence (`persist`)

mod algebra;
mod persist;
mod search;
mod types;

pub use persist::{is_json, JsonStyle};
pub use search::{Condition, KeyMode};
pub use types::Container;
