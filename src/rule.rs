//! Compiled rule tree.
//!
//! Nodes live in a flat arena and refer to each other by [`RuleId`]. A node
//! owns its `sequence` child and its mapping children exclusively; `parent` is
//! a plain back-index, so there is no sharing and no cycle.
use std::fmt;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{json, Value};

use crate::document::Document;
use crate::types::{Category, TypeDef, TypeName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) usize);

/// Compiled regular expression that compares and prints by its source text.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Pattern)
    }
    pub fn as_str(&self) -> &str { self.0.as_str() }
    pub fn is_match(&self, text: &str) -> bool { self.0.is_match(text) }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool { self.as_str() == other.as_str() }
}

impl Eq for Pattern {}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.as_str())
    }
}

/// `min` / `max` / `min-ex` / `max-ex` bounds of a `range` or `length`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bounds<T> {
    pub min: Option<T>,
    pub max: Option<T>,
    pub min_ex: Option<T>,
    pub max_ex: Option<T>,
}

impl<T> Default for Bounds<T> {
    fn default() -> Self {
        Self { min: None, max: None, min_ex: None, max_ex: None }
    }
}

impl<T> Bounds<T> {
    fn to_json(&self, f: impl Fn(&T) -> Value) -> Value {
        let mut o = serde_json::Map::new();
        if let Some(v) = &self.max { o.insert("max".into(), f(v)); }
        if let Some(v) = &self.min { o.insert("min".into(), f(v)); }
        if let Some(v) = &self.max_ex { o.insert("max-ex".into(), f(v)); }
        if let Some(v) = &self.min_ex { o.insert("min-ex".into(), f(v)); }
        Value::Object(o)
    }
}

/// How alternative element schemas would be reconciled against one value.
/// Only `any` is enabled; the rest are reserved words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchingRule {
    Any,
    None,
    One,
    All,
}

impl MatchingRule {
    pub const ENABLED: &'static [MatchingRule] = &[MatchingRule::Any];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "any" => Some(MatchingRule::Any),
            "none" => Some(MatchingRule::None),
            "one" => Some(MatchingRule::One),
            "all" => Some(MatchingRule::All),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchingRule::Any => "any",
            MatchingRule::None => "none",
            MatchingRule::One => "one",
            MatchingRule::All => "all",
        }
    }

    pub fn is_enabled(self) -> bool { Self::ENABLED.contains(&self) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub id: RuleId,
    pub parent: Option<RuleId>,
    pub path: String,
    pub ty: TypeName,
    pub name: Option<String>,
    pub desc: Option<String>,
    pub required: bool,
    pub pattern: Option<Pattern>,
    pub enum_: Option<Vec<Document>>,
    pub assert_expr: Option<String>,
    pub range: Option<Bounds<Document>>,
    pub length: Option<Bounds<i64>>,
    pub ident: Option<bool>,
    pub unique: Option<bool>,
    pub default: Option<Document>,
    pub allow_empty_mapping: Option<bool>,
    pub matching_rule: Option<MatchingRule>,
    pub sequence: Option<RuleId>,
    /// Every mapping child, literal and regex-keyed, under its raw key text.
    pub mapping: Option<IndexMap<String, RuleId>>,
    /// Regex-keyed mapping children, in declaration order.
    pub regex_mapping: Vec<RuleId>,
    /// Set on regex-keyed mapping children: the key pattern they match.
    pub key_pattern: Option<Pattern>,
}

impl Rule {
    pub(crate) fn new(id: RuleId, parent: Option<RuleId>, path: String, ty: TypeName) -> Self {
        Self {
            id,
            parent,
            path,
            ty,
            name: None,
            desc: None,
            required: false,
            pattern: None,
            enum_: None,
            assert_expr: None,
            range: None,
            length: None,
            ident: None,
            unique: None,
            default: None,
            allow_empty_mapping: None,
            matching_rule: None,
            sequence: None,
            mapping: None,
            regex_mapping: Vec::new(),
            key_pattern: None,
        }
    }

    pub fn type_def(&self) -> &'static TypeDef { self.ty.def() }

    pub fn category(&self) -> Category { self.type_def().category }

    /// The document root sits at the empty path. A fragment compiled at a base
    /// path has no parent but is not the root.
    pub fn is_root(&self) -> bool { self.path.is_empty() }

    pub fn is_regex_keyed(&self) -> bool { self.key_pattern.is_some() }
}

/// Arena holding one compiled schema document. Index 0 is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTree {
    pub(crate) nodes: Vec<Rule>,
}

impl RuleTree {
    pub fn root(&self) -> &Rule { &self.nodes[0] }

    pub fn get(&self, id: RuleId) -> &Rule { &self.nodes[id.0] }

    pub fn len(&self) -> usize { self.nodes.len() }

    pub fn is_empty(&self) -> bool { self.nodes.is_empty() }

    /// Nodes in creation order (pre-order over the document).
    pub fn iter(&self) -> impl Iterator<Item = &Rule> + '_ { self.nodes.iter() }

    pub fn parent_of(&self, rule: &Rule) -> Option<&Rule> {
        rule.parent.map(|id| self.get(id))
    }

    pub fn sequence_item(&self, rule: &Rule) -> Option<&Rule> {
        rule.sequence.map(|id| self.get(id))
    }

    pub fn mapping_child(&self, rule: &Rule, key: &str) -> Option<&Rule> {
        rule.mapping.as_ref()?.get(key).map(|id| self.get(*id))
    }

    /// Literal-keyed mapping children with their keys.
    pub fn literal_children<'a>(&'a self, rule: &'a Rule) -> impl Iterator<Item = (&'a str, &'a Rule)> + 'a {
        rule.mapping
            .iter()
            .flat_map(|m| m.iter())
            .map(move |(k, id)| (k.as_str(), self.get(*id)))
            .filter(|(_, r)| !r.is_regex_keyed())
    }

    pub fn regex_children<'a>(&'a self, rule: &'a Rule) -> impl Iterator<Item = &'a Rule> + 'a {
        rule.regex_mapping.iter().map(move |id| self.get(*id))
    }

    /// Nested JSON rendering of the tree, in schema-like vocabulary.
    pub fn to_json(&self) -> Value {
        self.rule_json(self.root())
    }

    fn rule_json(&self, r: &Rule) -> Value {
        let mut o = json!({ "type": r.ty.as_str(), "path": r.path });
        if let Some(v) = &r.name { o["name"] = Value::from(v.clone()); }
        if let Some(v) = &r.desc { o["desc"] = Value::from(v.clone()); }
        if r.required { o["required"] = Value::Bool(true); }
        if let Some(p) = &r.pattern { o["pattern"] = Value::from(p.as_str()); }
        if let Some(xs) = &r.enum_ {
            o["enum"] = Value::Array(xs.iter().map(Document::to_json).collect());
        }
        if let Some(b) = &r.range { o["range"] = b.to_json(Document::to_json); }
        if let Some(b) = &r.length { o["length"] = b.to_json(|n| Value::from(*n)); }
        if let Some(v) = r.ident { o["ident"] = Value::Bool(v); }
        if let Some(v) = r.unique { o["unique"] = Value::Bool(v); }
        if let Some(v) = &r.default { o["default"] = v.to_json(); }
        if let Some(v) = r.allow_empty_mapping { o["allowempty"] = Value::Bool(v); }
        if let Some(m) = r.matching_rule { o["matching-rule"] = Value::from(m.as_str()); }
        if let Some(p) = &r.key_pattern { o["key-pattern"] = Value::from(p.as_str()); }
        if let Some(item) = self.sequence_item(r) {
            o["sequence"] = Value::Array(vec![self.rule_json(item)]);
        }
        if let Some(m) = &r.mapping {
            let mut props = serde_json::Map::new();
            for (k, id) in m {
                props.insert(k.clone(), self.rule_json(self.get(*id)));
            }
            o["mapping"] = Value::Object(props);
        }
        o
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_compare_by_source() {
        assert_eq!(Pattern::new("^a+$").unwrap(), Pattern::new("^a+$").unwrap());
        assert_ne!(Pattern::new("a").unwrap(), Pattern::new("b").unwrap());
        assert!(Pattern::new("(+").is_err());
    }

    #[test]
    fn matching_rule_vocabulary() {
        assert!(MatchingRule::parse("any").unwrap().is_enabled());
        for reserved in ["none", "one", "all"] {
            assert!(!MatchingRule::parse(reserved).unwrap().is_enabled());
        }
        assert!(MatchingRule::parse("foobar").is_none());
    }

    #[test]
    fn bounds_render_only_present_keys() {
        let b = Bounds { max: Some(10i64), min_ex: Some(1), ..Bounds::default() };
        assert_eq!(b.to_json(|n| Value::from(*n)), json!({"max": 10, "min-ex": 1}));
    }
}
