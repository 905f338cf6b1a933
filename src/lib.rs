//! Compile kwalify-style schema descriptions into a checked rule tree.
//!
//! A schema document (parsed YAML/JSON, see [`Document`]) is turned into a
//! [`RuleTree`]: one [`Rule`] per schema position, each carrying its resolved
//! type and constraints. While compiling, every constraint is validated on its
//! own and every node is checked for constraints that cannot coexist. Any
//! problem aborts the compilation with a [`CompileError`] holding a stable
//! dotted code and the schema path.
//!
//! ```
//! use kwalify_rules::{compile, Document};
//! use serde_json::json;
//!
//! let doc = Document::from(json!({"type": "seq", "sequence": [{"type": "str"}]}));
//! let tree = compile(&doc).unwrap();
//! let item = tree.sequence_item(tree.root()).unwrap();
//! assert_eq!(item.ty.as_str(), "str");
//! ```
//!
//! Validating data against the tree, schema inclusion and partial schemas are
//! left to the caller.
pub mod cli;
pub mod compile;
pub mod conflict;
pub mod document;
pub mod error;
pub mod loader;
pub mod rule;
pub mod types;

pub use compile::{compile, compile_at};
pub use document::{Document, ValueKind};
pub use error::{codes, CompileError, RuleError, SchemaConflict};
pub use rule::{Bounds, MatchingRule, Pattern, Rule, RuleId, RuleTree};
pub use types::{Category, TypeDef, TypeName};
