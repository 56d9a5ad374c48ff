//! Loaded grammar handles.
//!
//! A [`LanguageFn`] names a bundled `grammar.json` artifact without touching it.
//! [`Language::new`] decodes the artifact, checks it, and interns its symbols,
//! producing the handle every consumer of the grammar works against. Loading
//! is the smoke check bindings run first: any failure surfaces as a
//! [`LoadError`] reading `Error loading <Display> grammar`.

use crate::grammar::{parse_grammar, Grammar, GrammarError};
use crate::node_types::{self, NodeTypeInfo};
use crate::symbols::{FieldId, SymbolError, SymbolId, SymbolTable};
use crate::validate::{validate, ValidationError};
use std::fmt;
use std::sync::Arc;

/// A lazily loadable grammar: its identifier, human-readable name and artifact.
#[derive(Debug, Clone, Copy)]
pub struct LanguageFn {
    name: &'static str,
    display_name: &'static str,
    artifact: fn() -> &'static str,
}

impl LanguageFn {
    /// Creates a handle for the grammar `name`, whose `grammar.json` is
    /// returned by `artifact`.
    #[must_use]
    pub const fn new(
        name: &'static str,
        display_name: &'static str,
        artifact: fn() -> &'static str,
    ) -> Self {
        Self {
            name,
            display_name,
            artifact,
        }
    }

    /// The grammar identifier, as written in `grammar.json`.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The name used in messages, e.g. `Akyno`.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        self.display_name
    }

    /// The `grammar.json` artifact.
    #[must_use]
    pub fn artifact(&self) -> &'static str {
        (self.artifact)()
    }
}

/// A grammar artifact could not be turned into a [`Language`].
///
/// The message is fixed; the cause is available through
/// [`std::error::Error::source`] and [`LoadError::kind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Error loading {display_name} grammar")]
pub struct LoadError {
    display_name: String,
    #[source]
    kind: LoadErrorKind,
}

impl LoadError {
    fn new(display_name: &str, kind: impl Into<LoadErrorKind>) -> Self {
        Self {
            display_name: display_name.to_string(),
            kind: kind.into(),
        }
    }

    /// The name of the grammar that failed to load.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Why loading failed.
    #[must_use]
    pub fn kind(&self) -> &LoadErrorKind {
        &self.kind
    }
}

/// The cause of a [`LoadError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadErrorKind {
    /// The artifact is not a grammar.
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    /// The artifact describes a different grammar.
    #[error("expected grammar '{expected}', found '{found}'")]
    NameMismatch {
        /// The name the handle was created for.
        expected: String,
        /// The name recorded in the artifact.
        found: String,
    },

    /// The grammar is inconsistent.
    #[error("invalid grammar: {0}")]
    Validation(#[from] ValidationError),

    /// The grammar's symbols cannot be numbered.
    #[error(transparent)]
    Symbols(#[from] SymbolError),
}

/// A loaded, checked grammar.
///
/// Cloning is cheap: clones share the decoded grammar and its tables.
#[derive(Clone)]
pub struct Language(Arc<Inner>);

struct Inner {
    display_name: String,
    grammar: Grammar,
    symbols: SymbolTable,
    node_types: Vec<NodeTypeInfo>,
}

impl fmt::Debug for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name())
            .field("node_kind_count", &self.node_kind_count())
            .field("field_count", &self.field_count())
            .finish_non_exhaustive()
    }
}

impl Language {
    /// Loads the artifact behind `language_fn`.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the artifact cannot be decoded, names a
    /// grammar other than [`LanguageFn::name`], or fails validation.
    #[tracing::instrument(skip_all, fields(grammar = language_fn.name()))]
    pub fn new(language_fn: LanguageFn) -> Result<Self, LoadError> {
        let display_name = language_fn.display_name();
        let grammar = parse_grammar(language_fn.artifact())
            .map_err(|e| LoadError::new(display_name, e))?;
        if grammar.name != language_fn.name() {
            return Err(LoadError::new(
                display_name,
                LoadErrorKind::NameMismatch {
                    expected: language_fn.name().to_string(),
                    found: grammar.name,
                },
            ));
        }
        Self::from_grammar(display_name, grammar)
    }

    /// Loads a `grammar.json` document read at run time.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if `json` is not a valid grammar.
    pub fn from_json(display_name: &str, json: &str) -> Result<Self, LoadError> {
        let grammar = parse_grammar(json).map_err(|e| LoadError::new(display_name, e))?;
        Self::from_grammar(display_name, grammar)
    }

    /// Checks an already decoded grammar and builds its tables.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`] if the grammar fails validation or has too
    /// many symbols.
    pub fn from_grammar(display_name: &str, grammar: Grammar) -> Result<Self, LoadError> {
        validate(&grammar).map_err(|e| LoadError::new(display_name, e))?;
        let symbols = SymbolTable::build(&grammar).map_err(|e| LoadError::new(display_name, e))?;
        let node_types = node_types::generate(&grammar, &symbols);

        tracing::debug!(
            grammar = %grammar.name,
            symbols = symbols.len(),
            node_types = node_types.len(),
            "loaded grammar"
        );
        Ok(Self(Arc::new(Inner {
            display_name: display_name.to_string(),
            grammar,
            symbols,
            node_types,
        })))
    }

    /// The grammar identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.grammar.name
    }

    /// The name used in messages.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.0.display_name
    }

    /// The decoded grammar.
    #[must_use]
    pub fn grammar(&self) -> &Grammar {
        &self.0.grammar
    }

    /// The interned symbols and fields.
    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.0.symbols
    }

    /// Number of node kinds, excluding `ERROR`.
    #[must_use]
    pub fn node_kind_count(&self) -> usize {
        self.0.symbols.len()
    }

    /// The node kind with the given id.
    #[must_use]
    pub fn node_kind_for_id(&self, id: SymbolId) -> Option<&str> {
        self.0.symbols.get(id).map(|info| info.name.as_str())
    }

    /// The id of a visible node kind.
    #[must_use]
    pub fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<SymbolId> {
        self.0.symbols.id_for_node_kind(kind, named)
    }

    /// Whether nodes with the given kind id are named.
    #[must_use]
    pub fn node_kind_is_named(&self, id: SymbolId) -> bool {
        self.0.symbols.get(id).is_some_and(|info| info.named)
    }

    /// Whether nodes with the given kind id appear in trees.
    #[must_use]
    pub fn node_kind_is_visible(&self, id: SymbolId) -> bool {
        self.0.symbols.get(id).is_some_and(|info| info.visible)
    }

    /// Whether the given kind id is a supertype.
    #[must_use]
    pub fn node_kind_is_supertype(&self, id: SymbolId) -> bool {
        self.0.symbols.get(id).is_some_and(|info| info.supertype)
    }

    /// The direct subtypes of a supertype.
    #[must_use]
    pub fn subtypes_for_supertype(&self, supertype: SymbolId) -> &[SymbolId] {
        self.0.symbols.subtypes(supertype)
    }

    /// All supertype ids.
    #[must_use]
    pub fn supertypes(&self) -> Vec<SymbolId> {
        self.0.symbols.supertypes()
    }

    /// Number of fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.0.symbols.field_count()
    }

    /// The field name with the given id.
    #[must_use]
    pub fn field_name_for_id(&self, id: FieldId) -> Option<&str> {
        self.0.symbols.field_name(id)
    }

    /// The id of the named field.
    #[must_use]
    pub fn field_id_for_name(&self, name: &str) -> Option<FieldId> {
        self.0.symbols.field_id(name)
    }

    /// The symbol of the start rule.
    #[must_use]
    pub fn start_symbol(&self) -> SymbolId {
        self.0.symbols.start()
    }

    /// The `node-types.json` description of this language.
    #[must_use]
    pub fn node_types(&self) -> &[NodeTypeInfo] {
        &self.0.node_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Rule;
    use crate::symbols::ERROR_SYMBOL;
    use std::error::Error as _;

    fn broken() -> &'static str {
        "{"
    }

    fn other_grammar() -> &'static str {
        r#"{"name": "other", "rules": {"source_file": {"type": "STRING", "value": "x"}}}"#
    }

    #[test]
    fn loads_bundled_artifact() {
        let language = Language::new(crate::LANGUAGE).unwrap();
        assert_eq!(language.name(), "akyno");
        assert_eq!(language.display_name(), "Akyno");
        assert_eq!(language.node_kind_count(), 3);
        assert_eq!(language.node_kind_for_id(language.start_symbol()), Some("source_file"));
        assert_eq!(language.id_for_node_kind("hello", false), Some(1));
        assert!(!language.node_kind_is_named(1));
        assert!(language.node_kind_is_visible(1));
        assert!(!language.node_kind_is_visible(0));
        assert_eq!(language.field_count(), 0);
        assert!(language.supertypes().is_empty());
    }

    #[test]
    fn corrupt_artifact_reports_display_name() {
        let err = Language::new(LanguageFn::new("akyno", "Akyno", broken)).unwrap_err();
        assert_eq!(err.to_string(), "Error loading Akyno grammar");
        assert!(matches!(err.kind(), LoadErrorKind::Grammar(GrammarError::JsonParse(_))));
        assert!(err.source().is_some());
    }

    #[test]
    fn name_mismatch_is_a_load_error() {
        let err = Language::new(LanguageFn::new("akyno", "Akyno", other_grammar)).unwrap_err();
        assert_eq!(
            err.kind(),
            &LoadErrorKind::NameMismatch {
                expected: "akyno".to_string(),
                found: "other".to_string(),
            }
        );
        assert_eq!(
            err.source().unwrap().to_string(),
            "expected grammar 'akyno', found 'other'"
        );
    }

    #[test]
    fn validation_failures_are_load_errors() {
        let grammar = Grammar::new("bad").with_rule("source_file", Rule::symbol("missing"));
        let err = Language::from_grammar("Bad", grammar).unwrap_err();
        assert_eq!(err.to_string(), "Error loading Bad grammar");
        assert!(matches!(err.kind(), LoadErrorKind::Validation(_)));
    }

    #[test]
    fn field_and_error_queries() {
        let grammar = Grammar::new("pair")
            .with_rule(
                "source_file",
                Rule::seq([
                    Rule::field("key", Rule::symbol("word")),
                    Rule::string(":"),
                    Rule::field("value", Rule::symbol("word")),
                ]),
            )
            .with_rule("word", Rule::pattern("\\w+"));
        let language = Language::from_grammar("Pair", grammar).unwrap();
        let value = language.field_id_for_name("value").unwrap();
        assert_eq!(language.field_name_for_id(value), Some("value"));
        assert_eq!(language.field_count(), 2);
        assert_eq!(language.id_for_node_kind("ERROR", true), Some(ERROR_SYMBOL));
        assert_eq!(language.node_kind_for_id(ERROR_SYMBOL), Some("ERROR"));
        assert_eq!(language.node_kind_for_id(1000), None);
    }

    #[test]
    fn loads_grammar_without_source_file() {
        let json = r#"{
            "name": "lang",
            "word": "identifier",
            "rules": {
                "program": {"type": "REPEAT", "content": {"type": "SYMBOL", "name": "statement"}},
                "statement": {"type": "SEQ", "members": [
                    {"type": "STRING", "value": "let"},
                    {"type": "FIELD", "name": "name", "content": {"type": "SYMBOL", "name": "identifier"}}
                ]},
                "identifier": {"type": "PATTERN", "value": "[a-z]+"},
                "keyword_only": {"type": "STRING", "value": "let"}
            },
            "inline": ["keyword_only"]
        }"#;
        let language = Language::from_json("Lang", json).unwrap();
        assert_eq!(language.node_kind_for_id(language.start_symbol()), Some("program"));
        assert!(language.field_id_for_name("name").is_some());
    }

    #[test]
    fn clones_share_tables() {
        let language = Language::from_json("Akyno", crate::GRAMMAR_JSON).unwrap();
        let clone = language.clone();
        assert!(std::ptr::eq(language.grammar(), clone.grammar()));
        assert!(format!("{language:?}").contains("akyno"));
    }
}
