//! JSON, file and encoded-string persistence

use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;

use base64::engine::general_purpose::STANDARD as base64_engine;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::container::Container;
use crate::error::{ContainerError, Result};
use crate::value::{legacy, serialize_map, Value};

/// zstd level used by `encrypt`
const COMPRESSION_LEVEL: i32 = 3;

/// Upper bound on the JSON a `decrypt` payload may expand to
pub(crate) const MAX_DECRYPTED_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonStyle {
    #[default]
    Compact,
    Pretty,
}

/// Whether `s` parses as a JSON object or array
pub fn is_json(s: &str) -> bool {
    matches!(serde_json::from_str::<Value>(s), Ok(Value::Map(_)))
}

impl Container {
    pub fn to_json(&self, style: JsonStyle) -> Result<String> {
        let encoded = match style {
            JsonStyle::Compact => serde_json::to_string(self)?,
            JsonStyle::Pretty => serde_json::to_string_pretty(self)?,
        };
        Ok(encoded)
    }

    /// Build a booted container from a JSON object or array
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Container::from_value(value)
    }

    /// Replace items and snapshot with the decoded JSON document
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        *self = Container::from_json_str(json)?;
        Ok(())
    }

    /// JSON when `source` parses as a JSON object or array, a file path otherwise
    pub fn from_source(source: &str) -> Result<Self> {
        if is_json(source) {
            Container::from_json_str(source)
        } else {
            Container::from_file(source)
        }
    }

    /// Write the items as JSON; the parent directory must already exist
    pub fn to_file(&self, path: impl AsRef<Path>, style: JsonStyle) -> Result<()> {
        let path = path.as_ref();
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = parent {
            if !dir.is_dir() {
                return Err(ContainerError::MissingParent(dir.display().to_string()));
            }
        }
        fs::write(path, self.to_json(style)?)?;
        log::debug!("wrote {} items to {}", self.len(), path.display());
        Ok(())
    }

    /// Read a JSON document, falling back to the legacy serialized format
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(ContainerError::PathNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;

        let container = if is_json(&content) {
            Container::from_json_str(&content)?
        } else {
            match legacy::decode(&content) {
                Ok(Value::Map(items)) => Container::from_map(items),
                Ok(other) => {
                    return Err(ContainerError::Decode(format!(
                        "{} holds a {}, not a map",
                        path.display(),
                        other.type_name()
                    )))
                }
                Err(_) => {
                    return Err(ContainerError::Decode(format!(
                        "{} is neither JSON nor the legacy format",
                        path.display()
                    )))
                }
            }
        };

        log::debug!("loaded {} items from {}", container.len(), path.display());
        Ok(container)
    }

    /// Obfuscate: flip keys and values, JSON-encode, compress, base64-encode.
    ///
    /// This is not encryption in any cryptographic sense.
    pub fn encrypt(&self) -> Result<String> {
        let mut flipped = self.copy();
        flipped.flip()?;
        let json = flipped.to_json(JsonStyle::Compact)?;
        let compressed = zstd::stream::encode_all(Cursor::new(json.into_bytes()), COMPRESSION_LEVEL)?;
        Ok(base64_engine.encode(compressed))
    }

    /// Inverse of [`Container::encrypt`]
    pub fn decrypt(payload: &str) -> Result<Self> {
        let compressed = base64_engine
            .decode(payload.trim())
            .map_err(|e| ContainerError::Decode(format!("bad base64: {}", e)))?;
        let decoder = zstd::stream::read::Decoder::new(Cursor::new(compressed))?;
        let mut json = Vec::new();
        decoder
            .take((MAX_DECRYPTED_BYTES + 1) as u64)
            .read_to_end(&mut json)?;
        if json.len() > MAX_DECRYPTED_BYTES {
            return Err(ContainerError::Decode(format!(
                "payload expands past {} bytes",
                MAX_DECRYPTED_BYTES
            )));
        }
        let json = String::from_utf8(json)
            .map_err(|e| ContainerError::Decode(format!("bad utf-8: {}", e)))?;
        let mut container = Container::from_json_str(&json)?;
        container.flip()?;
        container.save();
        Ok(container)
    }
}

impl Serialize for Container {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serialize_map(&self.items, serializer)
    }
}

impl<'de> Deserialize<'de> for Container {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Container::from_value(value).map_err(serde::de::Error::custom)
    }
}
