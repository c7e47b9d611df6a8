//! Cache wire format.
//!
//! Values are stored as JSON text. Two things need care:
//! - negative entries are the bare literal `NULL`, which is not valid JSON and
//!   so can never be produced by serializing a payload
//! - JSON has no representation for non-finite floats, so `Blob` floats that
//!   are infinite or NaN travel as reserved string tokens
//!
//! NaN is canonicalized: every NaN, whatever its sign or payload bits, is
//! written as `__NAN__` and read back as `f64::NAN`.

use serde::de::{self, DeserializeOwned, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::cache::{CacheError, CacheResult};

/// Raw value stored for a confirmed-absent key.
pub const NEGATIVE_MARKER: &str = "NULL";

pub const INFINITY_TOKEN: &str = "__INFINITY__";
pub const NEG_INFINITY_TOKEN: &str = "__NEG_INFINITY__";
pub const NAN_TOKEN: &str = "__NAN__";

/// A decoded cache entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    Value(T),
    Negative,
}

/// Serialize a value for storage.
pub fn encode_entry<T: Serialize>(value: &T) -> CacheResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Parse a stored value back, recognizing the negative marker.
pub fn decode_entry<T: DeserializeOwned>(raw: &str) -> CacheResult<Entry<T>> {
    if raw == NEGATIVE_MARKER {
        return Ok(Entry::Negative);
    }
    serde_json::from_str(raw)
        .map(Entry::Value)
        .map_err(CacheError::from)
}

/// Sentinel token for a non-finite float, `None` for finite values.
/// All NaNs share one token; sign and payload are not preserved.
pub fn encode_non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some(NAN_TOKEN)
    } else if value == f64::INFINITY {
        Some(INFINITY_TOKEN)
    } else if value == f64::NEG_INFINITY {
        Some(NEG_INFINITY_TOKEN)
    } else {
        None
    }
}

/// Float for a sentinel token, `None` for any other string.
pub fn decode_non_finite(token: &str) -> Option<f64> {
    match token {
        INFINITY_TOKEN => Some(f64::INFINITY),
        NEG_INFINITY_TOKEN => Some(f64::NEG_INFINITY),
        NAN_TOKEN => Some(f64::NAN),
        _ => None,
    }
}

/// Free-form structured data attached to a config (links, permissions).
///
/// Unlike `serde_json::Value` it can hold non-finite floats.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Blob {
    #[default]
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<Blob>),
    Object(BTreeMap<String, Blob>),
}

impl Blob {
    pub fn get(&self, key: &str) -> Option<&Blob> {
        match self {
            Blob::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Blob::Float(f) => Some(*f),
            Blob::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

/// Encode a blob into plain JSON, replacing non-finite floats with tokens.
pub fn encode(blob: &Blob) -> serde_json::Value {
    use serde_json::Value;
    match blob {
        Blob::Null => Value::Null,
        Blob::Bool(b) => Value::Bool(*b),
        Blob::Integer(i) => Value::from(*i),
        Blob::Float(f) => match encode_non_finite(*f) {
            Some(token) => Value::String(token.to_string()),
            None => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
        },
        Blob::String(s) => Value::String(s.clone()),
        Blob::Array(items) => Value::Array(items.iter().map(encode).collect()),
        Blob::Object(map) => Value::Object(
            map.iter().map(|(k, v)| (k.clone(), encode(v))).collect(),
        ),
    }
}

/// Decode plain JSON into a blob, turning sentinel tokens back into floats.
pub fn decode(value: serde_json::Value) -> Blob {
    use serde_json::Value;
    match value {
        Value::Null => Blob::Null,
        Value::Bool(b) => Blob::Bool(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Blob::Integer(i),
            None => Blob::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => match decode_non_finite(&s) {
            Some(f) => Blob::Float(f),
            None => Blob::String(s),
        },
        Value::Array(items) => Blob::Array(items.into_iter().map(decode).collect()),
        Value::Object(map) => Blob::Object(map.into_iter().map(|(k, v)| (k, decode(v))).collect()),
    }
}

impl From<serde_json::Value> for Blob {
    fn from(value: serde_json::Value) -> Self {
        decode(value)
    }
}

impl Serialize for Blob {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Blob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BlobVisitor)
    }
}

/// Builds a `Blob` from any self-describing format. TOML seed files can
/// spell `inf` and `nan` directly, so floats are taken as-is here.
struct BlobVisitor;

impl<'de> Visitor<'de> for BlobVisitor {
    type Value = Blob;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("any JSON-like value")
    }

    fn visit_unit<E: de::Error>(self) -> Result<Blob, E> {
        Ok(Blob::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Blob, E> {
        Ok(Blob::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Blob, D::Error> {
        Blob::deserialize(d)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Blob, E> {
        Ok(Blob::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Blob, E> {
        Ok(Blob::Integer(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Blob, E> {
        Ok(i64::try_from(v).map(Blob::Integer).unwrap_or(Blob::Float(v as f64)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Blob, E> {
        Ok(Blob::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Blob, E> {
        Ok(match decode_non_finite(v) {
            Some(f) => Blob::Float(f),
            None => Blob::String(v.to_string()),
        })
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Blob, E> {
        Ok(match decode_non_finite(&v) {
            Some(f) => Blob::Float(f),
            None => Blob::String(v),
        })
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Blob, A::Error> {
        let mut items: Vec<Blob> = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Blob::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Blob, A::Error> {
        let mut out = BTreeMap::new();
        while let Some((k, v)) = map.next_entry::<String, Blob>()? {
            out.insert(k, v);
        }
        Ok(Blob::Object(out))
    }
}
