//! Post-construction check that the constraints attached to one rule are
//! legal together for its resolved category.
use tracing::trace;

use crate::error::{codes, DisplayPath, SchemaConflict};
use crate::rule::Rule;
use crate::types::Category;

pub fn check(rule: &Rule) -> Result<(), SchemaConflict> {
    trace!(path = %DisplayPath(&rule.path), ty = %rule.ty, "checking for conflicts");

    let path = rule.path.as_str();
    let conflict = |code: &'static str, what: &str| -> Result<(), SchemaConflict> {
        Err(SchemaConflict::new(code, format!("{} with {what}", rule.ty), path))
    };

    match rule.category() {
        Category::Sequence => {
            if rule.sequence.is_none() {
                return Err(SchemaConflict::new(codes::SEQ_NOSEQUENCE, "type seq declared without a sequence", path));
            }
            if rule.enum_.is_some() { return conflict(codes::SEQ_CONFLICT_ENUM, "enum"); }
            if rule.pattern.is_some() { return conflict(codes::SEQ_CONFLICT_PATTERN, "pattern"); }
            if rule.mapping.is_some() { return conflict(codes::SEQ_CONFLICT_MAPPING, "mapping"); }
            if rule.range.is_some() { return conflict(codes::SEQ_CONFLICT_RANGE, "range"); }
            if rule.length.is_some() { return conflict(codes::SEQ_CONFLICT_LENGTH, "length"); }
        }
        Category::Mapping => {
            let has_keys = rule.mapping.as_ref().is_some_and(|m| !m.is_empty());
            if !has_keys && rule.allow_empty_mapping != Some(true) {
                return Err(SchemaConflict::new(
                    codes::MAP_NOMAPPING,
                    "type map declared without a mapping (set allowempty to permit it)",
                    path,
                ));
            }
            if rule.enum_.is_some() { return conflict(codes::MAP_CONFLICT_ENUM, "enum"); }
            if rule.sequence.is_some() { return conflict(codes::MAP_CONFLICT_SEQUENCE, "sequence"); }
            if rule.range.is_some() { return conflict(codes::MAP_CONFLICT_RANGE, "range"); }
            if rule.length.is_some() { return conflict(codes::MAP_CONFLICT_LENGTH, "length"); }
        }
        Category::Scalar => {
            if rule.sequence.is_some() { return conflict(codes::SCALAR_CONFLICT_SEQUENCE, "sequence"); }
            if rule.mapping.is_some() { return conflict(codes::SCALAR_CONFLICT_MAPPING, "mapping"); }
            if rule.enum_.is_some() {
                if rule.range.is_some() { return conflict(codes::ENUM_CONFLICT_RANGE, "enum and range"); }
                if rule.length.is_some() { return conflict(codes::ENUM_CONFLICT_LENGTH, "enum and length"); }
                if rule.pattern.is_some() { return conflict(codes::ENUM_CONFLICT_PATTERN, "enum and pattern"); }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::rule::{Bounds, Pattern, RuleId};
    use crate::types::TypeName;
    use indexmap::IndexMap;

    fn rule(ty: TypeName) -> Rule {
        Rule::new(RuleId(0), None, String::new(), ty)
    }

    fn code(r: &Rule) -> &'static str { check(r).unwrap_err().code }

    #[test]
    fn sequence_needs_its_element() {
        assert_eq!(code(&rule(TypeName::Seq)), codes::SEQ_NOSEQUENCE);
        let mut r = rule(TypeName::Seq);
        r.sequence = Some(RuleId(1));
        assert!(check(&r).is_ok());
        r.pattern = Some(Pattern::new("x").unwrap());
        assert_eq!(code(&r), codes::SEQ_CONFLICT_PATTERN);
    }

    #[test]
    fn empty_mapping_needs_allowempty() {
        let mut r = rule(TypeName::Map);
        assert_eq!(code(&r), codes::MAP_NOMAPPING);
        r.allow_empty_mapping = Some(false);
        assert_eq!(code(&r), codes::MAP_NOMAPPING);
        r.allow_empty_mapping = Some(true);
        assert!(check(&r).is_ok());
        r.mapping = Some(IndexMap::from([("a".to_string(), RuleId(1))]));
        r.sequence = Some(RuleId(2));
        assert_eq!(code(&r), codes::MAP_CONFLICT_SEQUENCE);
    }

    #[test]
    fn enum_is_exclusive_with_each_bound_and_pattern() {
        let mut r = rule(TypeName::Int);
        r.enum_ = Some(vec![Document::Int(1)]);
        assert!(check(&r).is_ok());

        r.length = Some(Bounds::default());
        assert_eq!(code(&r), codes::ENUM_CONFLICT_LENGTH);
        r.length = None;
        r.pattern = Some(Pattern::new("1").unwrap());
        assert_eq!(code(&r), codes::ENUM_CONFLICT_PATTERN);
        r.range = Some(Bounds::default());
        assert_eq!(code(&r), codes::ENUM_CONFLICT_RANGE);
    }

    #[test]
    fn scalars_have_no_children() {
        let mut r = rule(TypeName::Str);
        r.mapping = Some(IndexMap::new());
        assert_eq!(code(&r), codes::SCALAR_CONFLICT_MAPPING);
        r.sequence = Some(RuleId(1));
        assert_eq!(code(&r), codes::SCALAR_CONFLICT_SEQUENCE);
    }
}
