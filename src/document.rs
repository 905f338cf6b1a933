//! Generic parsed schema input.
//!
//! A `Document` is what a loader hands to the compiler: null, bool, integer,
//! float, text, sequence or key-ordered mapping. Mapping iteration order is the
//! source order so diagnostics stay deterministic; mapping equality ignores it.
use std::fmt;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Text(String),
    Seq(Vec<Document>),
    Map(IndexMap<String, Document>),
}

/// Coarse value-kind tag; the type registry decides which kinds a type accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Text,
    Seq,
    Map,
}

impl ValueKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::Seq => "sequence",
            ValueKind::Map => "mapping",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Document {
    pub fn kind(&self) -> ValueKind {
        match self {
            Document::Null => ValueKind::Null,
            Document::Bool(_) => ValueKind::Bool,
            Document::Int(_) => ValueKind::Int,
            Document::Float(_) => ValueKind::Float,
            Document::Text(_) => ValueKind::Text,
            Document::Seq(_) => ValueKind::Seq,
            Document::Map(_) => ValueKind::Map,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Document::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Document::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Document::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Document]> {
        match self {
            Document::Seq(xs) => Some(xs),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Document>> {
        match self {
            Document::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Numeric view used by the ordering/equality contracts.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Document::Int(i) => Some(*i as f64),
            Document::Float(f) => Some(f.0),
            _ => None,
        }
    }

    /// Convert back to JSON for dumps. Non-finite floats become `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Document::Null => Value::Null,
            Document::Bool(b) => Value::Bool(*b),
            Document::Int(i) => Value::from(*i),
            Document::Float(f) => serde_json::Number::from_f64(f.0)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Document::Text(s) => Value::String(s.clone()),
            Document::Seq(xs) => Value::Array(xs.iter().map(Document::to_json).collect()),
            Document::Map(m) => {
                let mut out = serde_json::Map::new();
                for (k, v) in m {
                    out.insert(k.clone(), v.to_json());
                }
                Value::Object(out)
            }
        }
    }
}

// ------------------------------ Conversions ------------------------------- //

impl From<Value> for Document {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => Document::Null,
            Value::Bool(b) => Document::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Document::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Document::Float(OrderedFloat(u as f64))
                } else {
                    Document::Float(OrderedFloat(n.as_f64().unwrap_or(f64::NAN)))
                }
            }
            Value::String(s) => Document::Text(s),
            Value::Array(xs) => Document::Seq(xs.into_iter().map(Document::from).collect()),
            Value::Object(m) => {
                Document::Map(m.into_iter().map(|(k, v)| (k, Document::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Document {
    fn from(s: &str) -> Self { Document::Text(s.to_string()) }
}

impl From<i64> for Document {
    fn from(i: i64) -> Self { Document::Int(i) }
}

impl From<bool> for Document {
    fn from(b: bool) -> Self { Document::Bool(b) }
}

// ------------------------------- Display ---------------------------------- //

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Document::Null => f.write_str("null"),
            Document::Bool(b) => write!(f, "{b}"),
            Document::Int(i) => write!(f, "{i}"),
            Document::Float(x) => write!(f, "{}", x.0),
            Document::Text(s) => f.write_str(s),
            Document::Seq(xs) => {
                f.write_str("[")?;
                for (i, x) in xs.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{x}")?;
                }
                f.write_str("]")
            }
            Document::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

// ---------------------------- Deserialization ----------------------------- //

// Mapping keys: text as-is, scalar keys (YAML `1:` / `true:`) stringified.
struct MapKey(String);

impl<'de> Deserialize<'de> for MapKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl<'de> Visitor<'de> for KeyVisitor {
            type Value = MapKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a scalar mapping key")
            }
            fn visit_bool<E: de::Error>(self, v: bool) -> Result<MapKey, E> { Ok(MapKey(v.to_string())) }
            fn visit_i64<E: de::Error>(self, v: i64) -> Result<MapKey, E> { Ok(MapKey(v.to_string())) }
            fn visit_u64<E: de::Error>(self, v: u64) -> Result<MapKey, E> { Ok(MapKey(v.to_string())) }
            fn visit_f64<E: de::Error>(self, v: f64) -> Result<MapKey, E> { Ok(MapKey(v.to_string())) }
            fn visit_str<E: de::Error>(self, v: &str) -> Result<MapKey, E> { Ok(MapKey(v.to_string())) }
            fn visit_string<E: de::Error>(self, v: String) -> Result<MapKey, E> { Ok(MapKey(v)) }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DocVisitor;

        impl<'de> Visitor<'de> for DocVisitor {
            type Value = Document;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a schema document value")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Document, E> { Ok(Document::Null) }
            fn visit_none<E: de::Error>(self) -> Result<Document, E> { Ok(Document::Null) }
            fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Document, D2::Error> {
                Document::deserialize(d)
            }
            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Document, E> { Ok(Document::Bool(v)) }
            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Document, E> { Ok(Document::Int(v)) }
            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Document, E> {
                Ok(match i64::try_from(v) {
                    Ok(i) => Document::Int(i),
                    Err(_) => Document::Float(OrderedFloat(v as f64)),
                })
            }
            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Document, E> {
                Ok(Document::Float(OrderedFloat(v)))
            }
            fn visit_str<E: de::Error>(self, v: &str) -> Result<Document, E> {
                Ok(Document::Text(v.to_string()))
            }
            fn visit_string<E: de::Error>(self, v: String) -> Result<Document, E> {
                Ok(Document::Text(v))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Document, A::Error> {
                let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(el) = seq.next_element::<Document>()? {
                    out.push(el);
                }
                Ok(Document::Seq(out))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
                let mut out = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((MapKey(k), v)) = map.next_entry::<MapKey, Document>()? {
                    if out.contains_key(&k) {
                        return Err(de::Error::custom(format!("duplicate mapping key `{k}`")));
                    }
                    out.insert(k, v);
                }
                Ok(Document::Map(out))
            }
        }

        deserializer.deserialize_any(DocVisitor)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_conversion_keeps_key_order() {
        let doc = Document::from(json!({"z": 1, "a": 2, "m": 3}));
        let keys: Vec<&str> = doc.as_map().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn mapping_equality_ignores_order() {
        let a = Document::from(json!({"x": 1, "y": [true, null]}));
        let b = Document::from(json!({"y": [true, null], "x": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn display_is_flow_style() {
        let doc = Document::from(json!({"a": [1, 2.5, "s"], "b": null}));
        assert_eq!(doc.to_string(), "{a: [1, 2.5, s], b: null}");
    }

    #[test]
    fn deserialize_yaml_stringifies_scalar_keys() {
        let doc: Document = serde_yaml::from_str("1: one\ntrue: yes\nname: x\n").unwrap();
        let m = doc.as_map().unwrap();
        assert_eq!(m.get("1"), Some(&Document::Text("one".into())));
        assert!(m.contains_key("true"));
        assert!(m.contains_key("name"));
    }

    #[test]
    fn deserialize_rejects_collection_keys() {
        let err = serde_yaml::from_str::<Document>("? [a, b]\n: 1\n").unwrap_err();
        assert!(err.to_string().contains("scalar mapping key"));
    }

    #[test]
    fn huge_unsigned_becomes_float() {
        let doc: Document = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(doc.kind(), ValueKind::Float);
    }

    #[test]
    fn to_json_round_trips_nested_values() {
        let v = json!({"type": "map", "mapping": {"a": {"enum": [1, "b", false]}}});
        assert_eq!(Document::from(v.clone()).to_json(), v);
    }
}
