//! Builtin type registry.
//!
//! Maps a schema type name to its structural category, the value kinds a
//! literal of that type may have, and whether `range` / `length` make sense for
//! it. The registry is built once and only ever read afterwards.
use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::document::{Document, ValueKind};

/// Type used when a node declares neither `type` nor a structural key.
pub const DEFAULT_TYPE: TypeName = TypeName::Str;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeName {
    Str,
    Text,
    Symbol,
    Int,
    Float,
    Number,
    Bool,
    Timestamp,
    Date,
    Scalar,
    Any,
    None,
    Map,
    Seq,
}

impl TypeName {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeName::Str => "str",
            TypeName::Text => "text",
            TypeName::Symbol => "symbol",
            TypeName::Int => "int",
            TypeName::Float => "float",
            TypeName::Number => "number",
            TypeName::Bool => "bool",
            TypeName::Timestamp => "timestamp",
            TypeName::Date => "date",
            TypeName::Scalar => "scalar",
            TypeName::Any => "any",
            TypeName::None => "none",
            TypeName::Map => "map",
            TypeName::Seq => "seq",
        }
    }

    /// Registry entry for this name. Every variant is registered.
    pub fn def(self) -> &'static TypeDef {
        &REGISTRY[self.as_str()]
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural shape a resolved type imposes on its rule node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Scalar,
    Sequence,
    Mapping,
}

impl Category {
    pub fn is_collection(self) -> bool { !matches!(self, Category::Scalar) }
}

#[derive(Debug)]
pub struct TypeDef {
    pub name: TypeName,
    pub category: Category,
    /// Value kinds a literal (enum item, default, range bound) may take.
    pub accepts: &'static [ValueKind],
    /// `range` is allowed.
    pub ordered: bool,
    /// `length` is allowed.
    pub textual: bool,
}

const TEXT: &[ValueKind] = &[ValueKind::Text];
const TEXTISH: &[ValueKind] = &[ValueKind::Text, ValueKind::Int, ValueKind::Float];
const INT: &[ValueKind] = &[ValueKind::Int];
const NUMERIC: &[ValueKind] = &[ValueKind::Float, ValueKind::Int];
const BOOL: &[ValueKind] = &[ValueKind::Bool];
const SCALARS: &[ValueKind] = &[ValueKind::Bool, ValueKind::Int, ValueKind::Float, ValueKind::Text];
const ANY: &[ValueKind] = &[
    ValueKind::Null,
    ValueKind::Bool,
    ValueKind::Int,
    ValueKind::Float,
    ValueKind::Text,
    ValueKind::Seq,
    ValueKind::Map,
];
const NULL: &[ValueKind] = &[ValueKind::Null];
const MAP: &[ValueKind] = &[ValueKind::Map];
const SEQ: &[ValueKind] = &[ValueKind::Seq];

static REGISTRY: Lazy<IndexMap<&'static str, TypeDef>> = Lazy::new(|| {
    use Category::*;
    let defs = [
        (TypeName::Str, Scalar, TEXT, true, true),
        (TypeName::Text, Scalar, TEXTISH, true, true),
        (TypeName::Symbol, Scalar, TEXT, true, false),
        (TypeName::Int, Scalar, INT, true, false),
        (TypeName::Float, Scalar, NUMERIC, true, false),
        (TypeName::Number, Scalar, NUMERIC, true, false),
        (TypeName::Bool, Scalar, BOOL, false, false),
        (TypeName::Timestamp, Scalar, TEXT, true, false),
        (TypeName::Date, Scalar, TEXT, true, false),
        (TypeName::Scalar, Scalar, SCALARS, true, false),
        (TypeName::Any, Scalar, ANY, true, false),
        (TypeName::None, Scalar, NULL, false, false),
        (TypeName::Map, Mapping, MAP, false, false),
        (TypeName::Seq, Sequence, SEQ, false, false),
    ];
    defs.into_iter()
        .map(|(name, category, accepts, ordered, textual)| {
            (name.as_str(), TypeDef { name, category, accepts, ordered, textual })
        })
        .collect()
});

/// Look a type up by its schema spelling.
pub fn lookup(name: &str) -> Option<&'static TypeDef> {
    REGISTRY.get(name)
}

/// All builtin type names, in registration order.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    REGISTRY.keys().copied()
}

impl TypeDef {
    pub fn accepts(&self, value: &Document) -> bool {
        self.accepts.contains(&value.kind())
    }

    /// Ordering used for range bounds. Numbers compare numerically across
    /// int/float, text lexicographically; any other pairing is incomparable.
    pub fn compare(&self, a: &Document, b: &Document) -> Option<Ordering> {
        match (a, b) {
            (Document::Text(x), Document::Text(y)) => Some(x.cmp(y)),
            _ => {
                let (x, y) = (a.as_f64()?, b.as_f64()?);
                x.partial_cmp(&y)
            }
        }
    }

    /// Equality used for enum de-duplication: `1` and `1.0` are the same value.
    pub fn same_value(&self, a: &Document, b: &Document) -> bool {
        match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordered_float::OrderedFloat;

    #[test]
    fn every_name_resolves_to_itself() {
        for name in builtin_names() {
            let def = lookup(name).unwrap();
            assert_eq!(def.name.as_str(), name);
            assert!(std::ptr::eq(def.name.def(), def));
        }
        assert!(lookup("string").is_none());
    }

    #[test]
    fn categories() {
        assert_eq!(TypeName::Map.def().category, Category::Mapping);
        assert_eq!(TypeName::Seq.def().category, Category::Sequence);
        assert!(!TypeName::Any.def().category.is_collection());
    }

    #[test]
    fn float_accepts_integers_but_int_rejects_floats() {
        assert!(TypeName::Float.def().accepts(&Document::Int(3)));
        assert!(!TypeName::Int.def().accepts(&Document::Float(OrderedFloat(3.0))));
        assert!(!TypeName::Int.def().accepts(&Document::Bool(true)));
    }

    #[test]
    fn compare_mixed_numbers_and_refuse_mixed_kinds() {
        let def = TypeName::Number.def();
        assert_eq!(def.compare(&Document::Int(2), &Document::Float(OrderedFloat(1.5))), Some(Ordering::Greater));
        assert_eq!(TypeName::Any.def().compare(&Document::Int(1), &Document::from("a")), None);
    }

    #[test]
    fn numeric_equality_crosses_kinds() {
        let def = TypeName::Number.def();
        assert!(def.same_value(&Document::Int(1), &Document::Float(OrderedFloat(1.0))));
        assert!(!def.same_value(&Document::from("1"), &Document::Int(1)));
    }
}
