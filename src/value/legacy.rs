//! Decoder for the legacy serialized-object text format
//!
//! Older container files were written in a length-prefixed text format:
//!
//! ```text
//! a:2:{i:0;s:5:"hello";s:3:"key";d:1.5;}
//! ```
//!
//! Only the scalar tags (`N`, `b`, `i`, `d`, `s`) and arrays (`a`) are
//! understood. String lengths count bytes, so the payload may contain
//! quotes and semicolons.

use crate::error::{ContainerError, Result};
use crate::value::{Key, Map, Value};

/// Deepest array nesting accepted, matching serde_json's recursion limit
const MAX_DEPTH: usize = 128;

/// Decode a whole document. Trailing whitespace is allowed, anything else is not.
pub fn decode(input: &str) -> Result<Value> {
    let mut reader = Reader::new(input.as_bytes());
    let value = reader.value()?;
    if !reader.rest().iter().all(|b| b.is_ascii_whitespace()) {
        return Err(reader.error("trailing data after value"));
    }
    Ok(value)
}

/// Cheap check used when sniffing file content.
pub fn is_legacy(input: &str) -> bool {
    decode(input).is_ok()
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            depth: 0,
        }
    }

    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    fn error(&self, msg: &str) -> ContainerError {
        ContainerError::Decode(format!("legacy format at byte {}: {}", self.pos, msg))
    }

    fn next(&mut self) -> Result<u8> {
        let b = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| self.error("unexpected end of input"))?;
        self.pos += 1;
        Ok(b)
    }

    fn expect(&mut self, want: u8) -> Result<()> {
        let got = self.next()?;
        if got != want {
            self.pos -= 1;
            return Err(self.error(&format!("expected '{}'", want as char)));
        }
        Ok(())
    }

    /// Bytes up to (not including) `stop`, consuming the terminator.
    fn until(&mut self, stop: u8) -> Result<&'a str> {
        let start = self.pos;
        let len = self.rest().iter().position(|b| *b == stop).ok_or_else(|| {
            self.error(&format!("missing '{}'", stop as char))
        })?;
        self.pos += len + 1;
        std::str::from_utf8(&self.bytes[start..start + len]).map_err(|_| self.error("invalid utf-8"))
    }

    fn int(&mut self, stop: u8) -> Result<i64> {
        let text = self.until(stop)?;
        text.parse::<i64>()
            .map_err(|_| self.error(&format!("invalid integer '{}'", text)))
    }

    fn value(&mut self) -> Result<Value> {
        let tag = self.next()?;
        if tag == b'N' {
            self.expect(b';')?;
            return Ok(Value::Null);
        }
        self.expect(b':')?;
        match tag {
            b'b' => match self.until(b';')? {
                "0" => Ok(Value::Bool(false)),
                "1" => Ok(Value::Bool(true)),
                other => Err(self.error(&format!("invalid boolean '{}'", other))),
            },
            b'i' => Ok(Value::Int(self.int(b';')?)),
            b'd' => {
                let text = self.until(b';')?;
                let x = match text {
                    "INF" => f64::INFINITY,
                    "-INF" => f64::NEG_INFINITY,
                    "NAN" => f64::NAN,
                    _ => text
                        .parse::<f64>()
                        .map_err(|_| self.error(&format!("invalid float '{}'", text)))?,
                };
                Ok(Value::Float(x))
            }
            b's' => {
                let s = self.string()?;
                self.expect(b';')?;
                Ok(Value::Str(s))
            }
            b'a' => self.array(),
            b'O' | b'C' => Err(self.error("serialized objects are not supported")),
            other => Err(self.error(&format!("unknown tag '{}'", other as char))),
        }
    }

    /// `LEN:"payload"` with the leading `s:` already consumed.
    fn string(&mut self) -> Result<String> {
        let len = usize::try_from(self.int(b':')?).map_err(|_| self.error("negative length"))?;
        self.expect(b'"')?;
        let end = self.pos + len;
        let payload = self
            .bytes
            .get(self.pos..end)
            .ok_or_else(|| self.error("string shorter than its length"))?;
        let s = std::str::from_utf8(payload)
            .map_err(|_| self.error("invalid utf-8"))?
            .to_string();
        self.pos = end;
        self.expect(b'"')?;
        Ok(s)
    }

    fn array(&mut self) -> Result<Value> {
        let count = usize::try_from(self.int(b':')?).map_err(|_| self.error("negative count"))?;
        self.expect(b'{')?;
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;

        // Every entry takes at least four bytes (`i:0;` plus a value), so the
        // declared count never reserves more than the input can hold.
        let mut map = Map::with_capacity(count.min(self.rest().len() / 4));
        for _ in 0..count {
            let key = self.key()?;
            let value = self.value()?;
            map.insert(key, value);
        }
        self.expect(b'}')?;

        self.depth -= 1;
        Ok(Value::Map(map))
    }

    fn key(&mut self) -> Result<Key> {
        match self.next()? {
            b'i' => {
                self.expect(b':')?;
                Ok(Key::Int(self.int(b';')?))
            }
            b's' => {
                self.expect(b':')?;
                let s = self.string()?;
                self.expect(b';')?;
                Ok(Key::from(s))
            }
            _ => {
                self.pos -= 1;
                Err(self.error("array keys must be integers or strings"))
            }
        }
    }
}
