//! Shared parsing for `range` and `length` bound specs.
use std::cmp::Ordering;
use std::fmt::Display;

use indexmap::IndexMap;

use crate::document::Document;
use crate::error::{codes, RuleError};
use crate::rule::Bounds;

/// Diagnostic codes for one bound-spec flavour.
pub(super) struct BoundCodes {
    pub not_map: &'static str,
    pub undefined_key: &'static str,
    pub value_unmatch: &'static str,
    pub two_max: &'static str,
    pub two_min: &'static str,
    pub max_lt_min: &'static str,
    pub max_le_min_ex: &'static str,
    pub max_ex_le_min: &'static str,
    pub max_ex_le_min_ex: &'static str,
}

pub(super) const RANGE: BoundCodes = BoundCodes {
    not_map: codes::RANGE_NOTMAP,
    undefined_key: codes::RANGE_UNDEFINED_KEY,
    value_unmatch: codes::RANGE_TYPE_UNMATCH,
    two_max: codes::RANGE_TWOMAX,
    two_min: codes::RANGE_TWOMIN,
    max_lt_min: codes::RANGE_MAXLTMIN,
    max_le_min_ex: codes::RANGE_MAXLEMINEX,
    max_ex_le_min: codes::RANGE_MAXEXLEMIN,
    max_ex_le_min_ex: codes::RANGE_MAXEXLEMINEX,
};

pub(super) const LENGTH: BoundCodes = BoundCodes {
    not_map: codes::LENGTH_NOTMAP,
    undefined_key: codes::LENGTH_UNDEFINED_KEY,
    value_unmatch: codes::LENGTH_NOTINT,
    two_max: codes::LENGTH_TWOMAX,
    two_min: codes::LENGTH_TWOMIN,
    max_lt_min: codes::LENGTH_MAXLTMIN,
    max_le_min_ex: codes::LENGTH_MAXLEMINEX,
    max_ex_le_min: codes::LENGTH_MAXEXLEMIN,
    max_ex_le_min_ex: codes::LENGTH_MAXEXLEMINEX,
};

pub(super) fn as_spec<'a>(
    codes: &BoundCodes,
    v: &'a Document,
    path: &str,
) -> Result<&'a IndexMap<String, Document>, RuleError> {
    v.as_map().ok_or_else(|| RuleError::new(codes.not_map, format!("{v}"), path))
}

/// Read the four bound keys. `convert` returns `None` when a value has the
/// wrong kind; `expected` names what was wanted in that diagnostic.
pub(super) fn parse<T>(
    codes: &BoundCodes,
    spec: &IndexMap<String, Document>,
    path: &str,
    expected: &str,
    convert: impl Fn(&Document) -> Option<T>,
) -> Result<Bounds<T>, RuleError> {
    let mut b = Bounds::default();
    for (k, v) in spec {
        let slot = match k.as_str() {
            "max" => &mut b.max,
            "min" => &mut b.min,
            "max-ex" => &mut b.max_ex,
            "min-ex" => &mut b.min_ex,
            _ => return Err(RuleError::new(codes.undefined_key, format!("`{k}`"), path)),
        };
        let value = convert(v)
            .ok_or_else(|| RuleError::new(codes.value_unmatch, format!("{v} --> {expected}"), path))?;
        *slot = Some(value);
    }

    if b.max.is_some() && b.max_ex.is_some() {
        return Err(RuleError::new(codes.two_max, "both max and max-ex given", path));
    }
    if b.min.is_some() && b.min_ex.is_some() {
        return Err(RuleError::new(codes.two_min, "both min and min-ex given", path));
    }
    Ok(b)
}

/// Upper bound must not sit below the lower one; strictly above it when
/// either side is exclusive.
pub(super) fn check_order<T: Display>(
    codes: &BoundCodes,
    b: &Bounds<T>,
    path: &str,
    cmp: impl Fn(&T, &T) -> Result<Ordering, RuleError>,
) -> Result<(), RuleError> {
    let fail = |code: &'static str, hi: &T, op: &str, lo: &T| -> Result<(), RuleError> {
        Err(RuleError::new(code, format!("{hi} {op} {lo}"), path))
    };

    if let Some(max) = &b.max {
        if let Some(min) = &b.min {
            if cmp(max, min)? == Ordering::Less {
                return fail(codes.max_lt_min, max, "<", min);
            }
        } else if let Some(min_ex) = &b.min_ex {
            if cmp(max, min_ex)? != Ordering::Greater {
                return fail(codes.max_le_min_ex, max, "<=", min_ex);
            }
        }
    } else if let Some(max_ex) = &b.max_ex {
        if let Some(min) = &b.min {
            if cmp(max_ex, min)? != Ordering::Greater {
                return fail(codes.max_ex_le_min, max_ex, "<=", min);
            }
        } else if let Some(min_ex) = &b.min_ex {
            if cmp(max_ex, min_ex)? != Ordering::Greater {
                return fail(codes.max_ex_le_min_ex, max_ex, "<=", min_ex);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn spec(v: serde_json::Value) -> Document { Document::from(v) }

    fn ints(v: serde_json::Value) -> Result<Bounds<i64>, RuleError> {
        let doc = spec(v);
        let m = as_spec(&LENGTH, &doc, "/x")?;
        let b = parse(&LENGTH, m, "/x", "int", Document::as_i64)?;
        check_order(&LENGTH, &b, "/x", |a, b| Ok(a.cmp(b)))?;
        Ok(b)
    }

    #[test]
    fn accepts_equal_inclusive_bounds() {
        let b = ints(json!({"max": 3, "min": 3})).unwrap();
        assert_eq!((b.max, b.min), (Some(3), Some(3)));
    }

    #[test]
    fn exclusive_bounds_must_leave_room() {
        assert_eq!(ints(json!({"max": 3, "min-ex": 3})).unwrap_err().code, codes::LENGTH_MAXLEMINEX);
        assert_eq!(ints(json!({"max-ex": 3, "min": 3})).unwrap_err().code, codes::LENGTH_MAXEXLEMIN);
        assert_eq!(ints(json!({"max-ex": 3, "min-ex": 4})).unwrap_err().code, codes::LENGTH_MAXEXLEMINEX);
        assert!(ints(json!({"max-ex": 4, "min-ex": 3})).is_ok());
    }

    #[test]
    fn twin_bounds_and_stray_keys() {
        assert_eq!(ints(json!({"max": 3, "max-ex": 4})).unwrap_err().code, codes::LENGTH_TWOMAX);
        assert_eq!(ints(json!({"min": 3, "min-ex": 4})).unwrap_err().code, codes::LENGTH_TWOMIN);
        let err = ints(json!({"maximum": 3})).unwrap_err();
        assert_eq!(err.code, codes::LENGTH_UNDEFINED_KEY);
        assert!(err.detail.contains("maximum"));
    }

    #[test]
    fn wrong_kinds() {
        assert_eq!(ints(json!([1, 2])).unwrap_err().code, codes::LENGTH_NOTMAP);
        assert_eq!(ints(json!({"max": "3"})).unwrap_err().code, codes::LENGTH_NOTINT);
    }
}
