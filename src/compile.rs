//! Schema compiler: recursive descent from a [`Document`] to a [`RuleTree`].
//!
//! Per node:
//! 1. resolve the type (explicit `type`, else inferred from `sequence`/`mapping`,
//!    else the registry default);
//! 2. apply every key through its initializer, recursing into children;
//! 3. run the conflict validator on the finished node.
//!
//! Any failure aborts the whole document; no partial tree is returned.
mod bounds;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::conflict;
use crate::document::Document;
use crate::error::{codes, DisplayPath, Result, RuleError};
use crate::rule::{MatchingRule, Pattern, Rule, RuleId, RuleTree};
use crate::types::{self, Category, TypeName, DEFAULT_TYPE};

/// The closed set of keys a rule may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Type,
    Name,
    Desc,
    Required,
    Pattern,
    Enum,
    Assert,
    Range,
    Length,
    Ident,
    Unique,
    AllowEmpty,
    Default,
    Sequence,
    Mapping,
    MatchingRule,
}

impl Key {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "type" => Key::Type,
            "name" => Key::Name,
            "desc" => Key::Desc,
            "required" => Key::Required,
            "pattern" => Key::Pattern,
            "enum" => Key::Enum,
            "assert" => Key::Assert,
            "range" => Key::Range,
            "length" => Key::Length,
            "ident" => Key::Ident,
            "unique" => Key::Unique,
            "allowempty" => Key::AllowEmpty,
            "default" => Key::Default,
            "sequence" => Key::Sequence,
            "mapping" => Key::Mapping,
            "matching-rule" => Key::MatchingRule,
            _ => return None,
        })
    }
}

/// Mapping keys with this prefix declare a regex-matched family of keys.
pub const REGEX_KEY_PREFIX: &str = "regex;";

/// Compile a root schema document.
pub fn compile(doc: &Document) -> Result<RuleTree> {
    compile_at(doc, "")
}

/// Compile a document standing at `path`.
///
/// Only the empty path is the document root, so `unique` and `ident` are
/// refused there and nowhere else. A fragment compiled at a non-empty base
/// path is treated as a subtree: its top rule has no parent but is not the
/// document root.
pub fn compile_at(doc: &Document, path: &str) -> Result<RuleTree> {
    let mut compiler = Compiler { nodes: Vec::new() };
    compiler.node(doc, None, path.to_string(), None)?;
    debug!(path = %DisplayPath(path), rules = compiler.nodes.len(), "schema compiled");
    Ok(RuleTree { nodes: compiler.nodes })
}

struct Compiler {
    nodes: Vec<Rule>,
}

impl Compiler {
    fn rule(&self, id: RuleId) -> &Rule { &self.nodes[id.0] }

    fn rule_mut(&mut self, id: RuleId) -> &mut Rule { &mut self.nodes[id.0] }

    fn node(
        &mut self,
        doc: &Document,
        parent: Option<RuleId>,
        path: String,
        key_pattern: Option<Pattern>,
    ) -> Result<RuleId> {
        debug!(path = %DisplayPath(&path), "init rule");

        let empty = IndexMap::new();
        let schema = match doc {
            Document::Map(m) => m,
            Document::Null => &empty,
            other => {
                return Err(RuleError::new(
                    codes::TYPE_MISSING,
                    format!("rule is a {} (`{other}`), no type can be resolved", other.kind()),
                    &path,
                )
                .into());
            }
        };

        let ty = resolve_type(schema, &path)?;
        let id = RuleId(self.nodes.len());
        let mut rule = Rule::new(id, parent, path.clone(), ty);
        rule.key_pattern = key_pattern;
        self.nodes.push(rule);

        for (k, v) in schema {
            let key = Key::parse(k)
                .ok_or_else(|| RuleError::new(codes::KEY_UNKNOWN, format!("unknown key `{k}`"), &path))?;
            trace!(path = %DisplayPath(&path), key = k.as_str(), value = %v, "init key");
            match key {
                Key::Type => {}
                Key::Name => self.rule_mut(id).name = Some(v.to_string()),
                Key::Desc => self.rule_mut(id).desc = Some(v.to_string()),
                Key::Required => self.init_required(id, v, &path)?,
                Key::Pattern => self.init_pattern(id, v, &path)?,
                Key::Enum => self.init_enum(id, v, &path)?,
                Key::Assert => self.init_assert(id, v, &path)?,
                Key::Range => self.init_range(id, v, &path)?,
                Key::Length => self.init_length(id, v, &path)?,
                Key::Ident => self.init_ident(id, v, &path)?,
                Key::Unique => self.init_unique(id, v, &path)?,
                Key::AllowEmpty => self.init_allow_empty(id, v, &path)?,
                Key::Default => self.init_default(id, v, &path)?,
                Key::Sequence => self.init_sequence(id, v, &path)?,
                Key::Mapping => self.init_mapping(id, v, &path)?,
                Key::MatchingRule => self.init_matching_rule(id, v, &path)?,
            }
        }

        conflict::check(self.rule(id))?;
        Ok(id)
    }

    fn init_required(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let flag = v
            .as_bool()
            .ok_or_else(|| RuleError::new(codes::REQUIRED_NOTBOOL, format!("{v}"), path))?;
        self.rule_mut(id).required = flag;
        Ok(())
    }

    fn init_pattern(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let Some(src) = v.as_str() else {
            return Err(RuleError::new(codes::PATTERN_NOTSTR, format!("{v}"), path).into());
        };
        if self.rule(id).category() == Category::Mapping {
            return Err(RuleError::new(
                codes::MAP_PATTERN,
                format!("pattern not allowed inside map: {src}"),
                path,
            )
            .into());
        }
        let pattern = Pattern::new(src)
            .map_err(|e| RuleError::new(codes::PATTERN_SYNTAXERR, format!("{src} --> {e}"), path))?;
        self.rule_mut(id).pattern = Some(pattern);
        Ok(())
    }

    fn init_enum(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let Some(items) = v.as_seq() else {
            return Err(RuleError::new(codes::ENUM_NOTSEQ, format!("{v}"), path).into());
        };
        let def = self.rule(id).type_def();
        if def.category.is_collection() {
            return Err(RuleError::new(codes::ENUM_NOTSCALAR, format!("type {}", def.name), path).into());
        }

        let mut seen: Vec<&Document> = Vec::with_capacity(items.len());
        for item in items {
            if !def.accepts(item) {
                return Err(RuleError::new(
                    codes::ENUM_TYPE_UNMATCH,
                    format!("{item} --> {}", def.name),
                    path,
                )
                .into());
            }
            if seen.iter().any(|s| def.same_value(s, item)) {
                return Err(RuleError::new(codes::ENUM_DUPLICATE, format!("{item}"), path).into());
            }
            seen.push(item);
        }
        self.rule_mut(id).enum_ = Some(items.to_vec());
        Ok(())
    }

    // Reserved: parsed, never accepted.
    fn init_assert(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let Some(expr) = v.as_str() else {
            return Err(RuleError::new(codes::ASSERT_NOTSTR, format!("{v}"), path).into());
        };
        self.rule_mut(id).assert_expr = Some(expr.to_string());
        Err(RuleError::new(codes::ASSERT_NYI, format!("assert is not yet implemented: {expr}"), path).into())
    }

    fn init_range(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let spec = bounds::as_spec(&bounds::RANGE, v, path)?;
        let def = self.rule(id).type_def();
        if def.category.is_collection() || !def.ordered {
            return Err(RuleError::new(codes::RANGE_NOTSCALAR, format!("type {}", def.name), path).into());
        }
        let range = bounds::parse(&bounds::RANGE, spec, path, def.name.as_str(), |d| {
            def.accepts(d).then(|| d.clone())
        })?;
        bounds::check_order(&bounds::RANGE, &range, path, |a, b| {
            def.compare(a, b).ok_or_else(|| {
                RuleError::new(codes::RANGE_INCOMPARABLE, format!("{a} <> {b}"), path)
            })
        })?;
        self.rule_mut(id).range = Some(range);
        Ok(())
    }

    fn init_length(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let spec = bounds::as_spec(&bounds::LENGTH, v, path)?;
        let def = self.rule(id).type_def();
        if !def.textual {
            return Err(RuleError::new(codes::LENGTH_NOTTEXT, format!("type {}", def.name), path).into());
        }
        let length = bounds::parse(&bounds::LENGTH, spec, path, "int", Document::as_i64)?;
        bounds::check_order(&bounds::LENGTH, &length, path, |a, b| Ok(a.cmp(b)))?;
        self.rule_mut(id).length = Some(length);
        Ok(())
    }

    fn init_ident(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let flag = v
            .as_bool()
            .ok_or_else(|| RuleError::new(codes::IDENT_NOTBOOL, format!("{v}"), path))?;
        let rule = self.rule_mut(id);
        rule.ident = Some(flag);
        if flag {
            rule.required = true;
        }

        let rule = self.rule(id);
        if rule.category().is_collection() {
            return Err(RuleError::new(codes::IDENT_NOTSCALAR, format!("type {}", rule.ty), path).into());
        }
        if rule.is_root() {
            return Err(RuleError::new(codes::IDENT_ONROOT, "ident is not allowed on the root rule", path).into());
        }
        let in_map = rule
            .parent
            .is_some_and(|p| self.rule(p).category() == Category::Mapping);
        if !in_map {
            return Err(RuleError::new(codes::IDENT_NOTMAP, "ident is only allowed inside a map", path).into());
        }
        Ok(())
    }

    fn init_unique(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let flag = v
            .as_bool()
            .ok_or_else(|| RuleError::new(codes::UNIQUE_NOTBOOL, format!("{v}"), path))?;
        self.rule_mut(id).unique = Some(flag);

        let rule = self.rule(id);
        if rule.category().is_collection() {
            return Err(RuleError::new(codes::UNIQUE_NOTSCALAR, format!("type {}", rule.ty), path).into());
        }
        if rule.is_root() {
            return Err(RuleError::new(codes::UNIQUE_ONROOT, "unique is not allowed on the root rule", path).into());
        }
        Ok(())
    }

    fn init_default(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let def = self.rule(id).type_def();
        if def.category.is_collection() {
            return Err(RuleError::new(codes::DEFAULT_NOTSCALAR, format!("type {} : {v}", def.name), path).into());
        }
        if !def.accepts(v) {
            return Err(RuleError::new(
                codes::DEFAULT_TYPE_UNMATCH,
                format!("{v} --> {}", def.name),
                path,
            )
            .into());
        }
        self.rule_mut(id).default = Some(v.clone());
        Ok(())
    }

    fn init_allow_empty(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let flag = v
            .as_bool()
            .ok_or_else(|| RuleError::new(codes::ALLOWEMPTY_NOTBOOL, format!("{v}"), path))?;
        self.rule_mut(id).allow_empty_mapping = Some(flag);
        Ok(())
    }

    fn init_sequence(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let items: &[Document] = match v {
            Document::Seq(xs) => xs,
            Document::Null => &[],
            other => return Err(RuleError::new(codes::SEQUENCE_NOTSEQ, format!("{other}"), path).into()),
        };
        match items {
            [] => Err(RuleError::new(codes::SEQUENCE_NOELEM, format!("{v}"), path).into()),
            [elem] => {
                let child = self.node(elem, Some(id), format!("{path}/sequence/0"), None)?;
                self.rule_mut(id).sequence = Some(child);
                Ok(())
            }
            _ => Err(RuleError::new(
                codes::SEQUENCE_TOOMANY,
                format!("{} element schemas, exactly one is supported", items.len()),
                path,
            )
            .into()),
        }
    }

    fn init_mapping(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let entries = match v {
            Document::Map(m) if !m.is_empty() => m,
            Document::Map(_) | Document::Null => {
                return Err(RuleError::new(codes::MAPPING_NOELEM, format!("{v}"), path).into());
            }
            other => return Err(RuleError::new(codes::MAPPING_NOTMAP, format!("{other}"), path).into()),
        };

        let mut children = IndexMap::with_capacity(entries.len());
        let mut regex_children = Vec::new();
        for (key, child_doc) in entries {
            let child = match key.strip_prefix(REGEX_KEY_PREFIX) {
                Some(src) => {
                    debug!(path = %DisplayPath(path), regex = src, "regex mapping key");
                    let pattern = Pattern::new(src).map_err(|e| {
                        RuleError::new(
                            codes::MAPPING_REGEX_SYNTAXERR,
                            format!("unable to compile regex '{src}': {e}"),
                            path,
                        )
                    })?;
                    let child_path = format!("{path}/mapping;regex/{}", regex_body(src));
                    let child = self.node(child_doc, Some(id), child_path, Some(pattern))?;
                    regex_children.push(child);
                    child
                }
                None => self.node(child_doc, Some(id), format!("{path}/mapping/{key}"), None)?,
            };
            children.insert(key.clone(), child);
        }

        let rule = self.rule_mut(id);
        rule.mapping = Some(children);
        rule.regex_mapping = regex_children;
        Ok(())
    }

    fn init_matching_rule(&mut self, id: RuleId, v: &Document, path: &str) -> Result<()> {
        let chosen = v
            .as_str()
            .and_then(MatchingRule::parse)
            .filter(|m| m.is_enabled());
        let Some(chosen) = chosen else {
            let allowed: Vec<&str> = MatchingRule::ENABLED.iter().map(|m| m.as_str()).collect();
            return Err(RuleError::new(
                codes::MATCHING_RULE_NOTALLOWED,
                format!("rule `{v}` is not part of allowed rule set [{}]", allowed.join(", ")),
                path,
            )
            .into());
        };
        self.rule_mut(id).matching_rule = Some(chosen);
        Ok(())
    }
}

fn resolve_type(schema: &IndexMap<String, Document>, path: &str) -> std::result::Result<TypeName, RuleError> {
    match schema.get("type") {
        Some(Document::Text(name)) => types::lookup(name).map(|def| def.name).ok_or_else(|| {
            let known: Vec<&str> = types::builtin_names().collect();
            RuleError::new(codes::TYPE_UNKNOWN, format!("`{name}` is not one of [{}]", known.join(", ")), path)
        }),
        Some(other) => Err(RuleError::new(
            codes::TYPE_NOSTR,
            format!("key 'type' must be a string, got {}", other.kind()),
            path,
        )),
        None => Ok(schema
            .keys()
            .find_map(|k| match Key::parse(k) {
                Some(Key::Sequence) => Some(TypeName::Seq),
                Some(Key::Mapping) => Some(TypeName::Map),
                _ => None,
            })
            .unwrap_or(DEFAULT_TYPE)),
    }
}

/// Path segment for a regex key: the pattern minus its first and last
/// character, which are normally the wrapping parens. Distinct keys may share
/// a segment; children stay addressable by their raw key.
fn regex_body(src: &str) -> &str {
    let mut chars = src.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

// ------------------------------- Tests ------------------------------------ //
