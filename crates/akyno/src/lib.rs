//! Akyno grammar for tree-sitter.
//!
//! The crate bundles the `grammar.json` and `node-types.json` artifacts that
//! `tree-sitter generate` produces for Akyno, and loads them into a
//! [`Language`]:
//!
//! ```
//! let language = akyno::language().expect("Error loading Akyno grammar");
//! assert_eq!(language.name(), "akyno");
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]

use std::sync::LazyLock;

/// Core structures and parsing logic for Tree-sitter grammars.
///
/// This module defines the decoded shape of a `grammar.json` artifact. Every
/// other module builds upon these types.
pub mod grammar;

/// Loaded grammar handles and the errors raised while loading them.
pub mod language;

/// The `node-types.json` description of a language.
pub mod node_types;

/// Symbol and field numbering.
pub mod symbols;

/// Grammar validation and consistency checking utilities.
///
/// Validation protects the symbol tables from malformed artifacts. It
/// enforces Tree-sitter's invariants before a language is built.
pub mod validate;

pub use grammar::{parse_grammar, Grammar, GrammarError, Rule};
pub use language::{Language, LanguageFn, LoadError, LoadErrorKind};
pub use node_types::{parse_node_types, NodeTypeInfo};
pub use symbols::{FieldId, SymbolId, SymbolTable};
pub use validate::{validate, ValidationError};

/// The grammar identifier.
pub const NAME: &str = "akyno";

/// The name used in messages.
pub const DISPLAY_NAME: &str = "Akyno";

/// The TextMate scope of Akyno sources.
pub const SCOPE: &str = "source.akyno";

/// File extensions of Akyno sources.
pub const FILE_TYPES: &[&str] = &["akyno"];

/// The content of the [`grammar.json`] file for this grammar.
///
/// [`grammar.json`]: https://tree-sitter.github.io/tree-sitter/creating-parsers/3-writing-the-grammar.html
pub const GRAMMAR_JSON: &str = include_str!("grammar.json");

/// The content of the [`node-types.json`] file for this grammar.
///
/// [`node-types.json`]: https://tree-sitter.github.io/tree-sitter/using-parsers/6-static-node-types
pub const NODE_TYPES: &str = include_str!("node-types.json");

fn grammar_json() -> &'static str {
    GRAMMAR_JSON
}

/// The Akyno grammar, not yet loaded.
pub const LANGUAGE: LanguageFn = LanguageFn::new(NAME, DISPLAY_NAME, grammar_json);

static AKYNO: LazyLock<Result<Language, LoadError>> = LazyLock::new(|| Language::new(LANGUAGE));

/// Returns the loaded Akyno grammar.
///
/// The artifact is decoded and checked once; later calls share the result.
///
/// # Errors
///
/// Returns a [`LoadError`] reading `Error loading Akyno grammar` if the bundled
/// artifact is unusable.
pub fn language() -> Result<Language, LoadError> {
    AKYNO.clone()
}
