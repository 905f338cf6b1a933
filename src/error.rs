//! Compile diagnostics.
//!
//! Two kinds, kept apart so callers can tell a malformed single constraint
//! ([`RuleError`]) from an illegal combination of valid ones
//! ([`SchemaConflict`]). Both carry a stable dotted code, a detail string with
//! the offending value(s), and the schema path of the node.
use std::fmt;

use thiserror::Error;

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Path as shown to schema authors; the document root is `/`.
pub(crate) struct DisplayPath<'a>(pub &'a str);

impl fmt::Display for DisplayPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() { f.write_str("/") } else { f.write_str(self.0) }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code} : {detail} : {}", DisplayPath(.path))]
pub struct RuleError {
    pub code: &'static str,
    pub detail: String,
    pub path: String,
}

impl RuleError {
    pub fn new(code: &'static str, detail: impl Into<String>, path: &str) -> Self {
        Self { code, detail: detail.into(), path: path.to_string() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code} : {detail} : {}", DisplayPath(.path))]
pub struct SchemaConflict {
    pub code: &'static str,
    pub detail: String,
    pub path: String,
}

impl SchemaConflict {
    pub fn new(code: &'static str, detail: impl Into<String>, path: &str) -> Self {
        Self { code, detail: detail.into(), path: path.to_string() }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("rule error: {0}")]
    Rule(#[from] RuleError),

    #[error("schema conflict: {0}")]
    Conflict(#[from] SchemaConflict),
}

impl CompileError {
    pub fn code(&self) -> &'static str {
        match self {
            CompileError::Rule(e) => e.code,
            CompileError::Conflict(e) => e.code,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            CompileError::Rule(e) => &e.path,
            CompileError::Conflict(e) => &e.path,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            CompileError::Rule(e) => &e.detail,
            CompileError::Conflict(e) => &e.detail,
        }
    }

    pub fn is_conflict(&self) -> bool { matches!(self, CompileError::Conflict(_)) }
}

/// Stable diagnostic codes.
pub mod codes {
    pub const TYPE_MISSING: &str = "type.missing";
    pub const TYPE_NOSTR: &str = "type.nostr";
    pub const TYPE_UNKNOWN: &str = "type.unknown";
    pub const KEY_UNKNOWN: &str = "key.unknown";

    pub const REQUIRED_NOTBOOL: &str = "required.notbool";

    pub const PATTERN_NOTSTR: &str = "pattern.notstr";
    pub const PATTERN_SYNTAXERR: &str = "pattern.syntaxerr";
    pub const MAP_PATTERN: &str = "map.pattern";

    pub const ENUM_NOTSEQ: &str = "enum.notseq";
    pub const ENUM_NOTSCALAR: &str = "enum.notscalar";
    pub const ENUM_TYPE_UNMATCH: &str = "enum.type.unmatch";
    pub const ENUM_DUPLICATE: &str = "enum.duplicate";

    pub const ASSERT_NOTSTR: &str = "assert.notstr";
    pub const ASSERT_NYI: &str = "assert.nyi";

    pub const RANGE_NOTMAP: &str = "range.notmap";
    pub const RANGE_NOTSCALAR: &str = "range.notscalar";
    pub const RANGE_TYPE_UNMATCH: &str = "range.type.unmatch";
    pub const RANGE_UNDEFINED_KEY: &str = "range.undefined-key";
    pub const RANGE_TWOMAX: &str = "range.twomax";
    pub const RANGE_TWOMIN: &str = "range.twomin";
    pub const RANGE_MAXLTMIN: &str = "range.maxltmin";
    pub const RANGE_MAXLEMINEX: &str = "range.maxleminex";
    pub const RANGE_MAXEXLEMIN: &str = "range.maxexlemin";
    pub const RANGE_MAXEXLEMINEX: &str = "range.maxexleminex";
    pub const RANGE_INCOMPARABLE: &str = "range.incomparable";

    pub const LENGTH_NOTMAP: &str = "length.notmap";
    pub const LENGTH_NOTTEXT: &str = "length.nottext";
    pub const LENGTH_NOTINT: &str = "length.notint";
    pub const LENGTH_UNDEFINED_KEY: &str = "length.undefined-key";
    pub const LENGTH_TWOMAX: &str = "length.twomax";
    pub const LENGTH_TWOMIN: &str = "length.twomin";
    pub const LENGTH_MAXLTMIN: &str = "length.maxltmin";
    pub const LENGTH_MAXLEMINEX: &str = "length.maxleminex";
    pub const LENGTH_MAXEXLEMIN: &str = "length.maxexlemin";
    pub const LENGTH_MAXEXLEMINEX: &str = "length.maxexleminex";

    pub const IDENT_NOTBOOL: &str = "ident.notbool";
    pub const IDENT_NOTSCALAR: &str = "ident.notscalar";
    pub const IDENT_ONROOT: &str = "ident.onroot";
    pub const IDENT_NOTMAP: &str = "ident.notmap";

    pub const UNIQUE_NOTBOOL: &str = "unique.notbool";
    pub const UNIQUE_NOTSCALAR: &str = "unique.notscalar";
    pub const UNIQUE_ONROOT: &str = "unique.onroot";

    pub const DEFAULT_NOTSCALAR: &str = "default.notscalar";
    pub const DEFAULT_TYPE_UNMATCH: &str = "default.type.unmatch";

    pub const ALLOWEMPTY_NOTBOOL: &str = "allowempty.notbool";

    pub const SEQUENCE_NOTSEQ: &str = "sequence.notseq";
    pub const SEQUENCE_NOELEM: &str = "sequence.noelem";
    pub const SEQUENCE_TOOMANY: &str = "sequence.toomany";

    pub const MAPPING_NOTMAP: &str = "mapping.notmap";
    pub const MAPPING_NOELEM: &str = "mapping.noelem";
    pub const MAPPING_REGEX_SYNTAXERR: &str = "mapping.regex.syntaxerr";

    pub const MATCHING_RULE_NOTALLOWED: &str = "matching-rule.notallowed";

    // Conflict validator.
    pub const SEQ_NOSEQUENCE: &str = "seq.nosequence";
    pub const SEQ_CONFLICT_ENUM: &str = "seq.conflict.enum";
    pub const SEQ_CONFLICT_PATTERN: &str = "seq.conflict.pattern";
    pub const SEQ_CONFLICT_MAPPING: &str = "seq.conflict.mapping";
    pub const SEQ_CONFLICT_RANGE: &str = "seq.conflict.range";
    pub const SEQ_CONFLICT_LENGTH: &str = "seq.conflict.length";
    pub const MAP_NOMAPPING: &str = "map.nomapping";
    pub const MAP_CONFLICT_ENUM: &str = "map.conflict.enum";
    pub const MAP_CONFLICT_SEQUENCE: &str = "map.conflict.sequence";
    pub const MAP_CONFLICT_RANGE: &str = "map.conflict.range";
    pub const MAP_CONFLICT_LENGTH: &str = "map.conflict.length";
    pub const SCALAR_CONFLICT_SEQUENCE: &str = "scalar.conflict.sequence";
    pub const SCALAR_CONFLICT_MAPPING: &str = "scalar.conflict.mapping";
    pub const ENUM_CONFLICT_RANGE: &str = "enum.conflict.range";
    pub const ENUM_CONFLICT_LENGTH: &str = "enum.conflict.length";
    pub const ENUM_CONFLICT_PATTERN: &str = "enum.conflict.pattern";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_code_detail_and_path() {
        let e = RuleError::new(codes::RANGE_MAXLTMIN, "10 < 11", "/mapping/age");
        assert_eq!(e.to_string(), "range.maxltmin : 10 < 11 : /mapping/age");
        let root = SchemaConflict::new(codes::MAP_NOMAPPING, "no mapping declared", "");
        assert_eq!(root.to_string(), "map.nomapping : no mapping declared : /");
    }

    #[test]
    fn compile_error_keeps_the_kind() {
        let e: CompileError = SchemaConflict::new(codes::SEQ_NOSEQUENCE, "x", "").into();
        assert!(e.is_conflict());
        assert_eq!(e.code(), "seq.nosequence");
        let e: CompileError = RuleError::new(codes::KEY_UNKNOWN, "foobar", "/a").into();
        assert!(!e.is_conflict());
        assert_eq!(e.path(), "/a");
    }
}
