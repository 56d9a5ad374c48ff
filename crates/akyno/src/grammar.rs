//! Decoded `grammar.json` artifacts.
//!
//! `tree-sitter generate` writes the grammar it compiled to `src/grammar.json`.
//! [`Grammar`] is that document, decoded with [`serde_json`].

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

mod rules;

pub use rules::{Rule, RuleType, RuleValue};

/// The rule name `tree-sitter init` scaffolds as the entry point.
pub const DEFAULT_START_RULE: &str = "source_file";

/// A `grammar.json` document.
///
/// Top-level keys other than `name` and `rules` are optional.
///
/// See <https://tree-sitter.github.io/tree-sitter/assets/schemas/grammar.schema.json>
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Grammar {
    /// JSON schema URL.
    #[serde(rename = "$schema", default)]
    pub schema: Option<String>,

    /// Identifier of the grammar, e.g. `"akyno"`.
    pub name: String,

    /// Grammar this one extends.
    #[serde(default)]
    pub inherits: Option<String>,

    /// Rule bodies by rule name.
    pub rules: HashMap<String, Rule>,

    /// Tokens allowed between any two tokens (whitespace, comments).
    #[serde(default)]
    pub extras: Option<Vec<Rule>>,

    /// Tokens produced by an external scanner.
    #[serde(default)]
    pub externals: Option<Vec<Rule>>,

    /// Rules substituted into their callers instead of getting a node.
    #[serde(default)]
    pub inline: Option<Vec<String>>,

    /// Ordered precedence groups, highest first. Entries are `STRING` rules
    /// naming a level or `SYMBOL` rules ranking a whole rule.
    #[serde(default)]
    pub precedences: Option<Vec<Vec<Rule>>>,

    /// Rule sets whose LR conflicts are resolved at run time.
    #[serde(default)]
    pub conflicts: Option<Vec<Vec<String>>>,

    /// Reserved word sets by context name.
    #[serde(default)]
    pub reserved: Option<HashMap<String, Vec<Rule>>>,

    /// Keyword extraction token.
    #[serde(default)]
    pub word: Option<String>,

    /// Hidden rules exposed as abstract node kinds.
    #[serde(default)]
    pub supertypes: Option<Vec<String>>,
}

/// Decodes a `grammar.json` document.
///
/// # Errors
///
/// Returns [`GrammarError::JsonParse`] if `json` is malformed or does not have
/// the shape of a grammar.
pub fn parse_grammar(json: &str) -> Result<Grammar, GrammarError> {
    serde_json::from_str(json).map_err(|e| GrammarError::JsonParse(e.to_string()))
}

/// Possible errors raised while reading a grammar artifact.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrammarError {
    /// The document is not a grammar.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// The grammar file could not be read.
    #[error("cannot read {path}: {message}")]
    Io {
        /// The path that was being read.
        path: String,
        /// The underlying I/O error message.
        message: String,
    },
}

impl Grammar {
    /// Creates an empty grammar called `name`, to be filled with [`Grammar::with_rule`].
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            inherits: None,
            rules: HashMap::new(),
            extras: None,
            externals: None,
            inline: None,
            precedences: None,
            conflicts: None,
            reserved: None,
            word: None,
            supertypes: None,
        }
    }

    /// Adds (or replaces) the rule called `name`.
    #[must_use]
    pub fn with_rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.rules.insert(name.into(), rule);
        self
    }

    /// Reads and parses a `grammar.json` file.
    ///
    /// # Errors
    ///
    /// Returns [`GrammarError::Io`] if the file cannot be read and
    /// [`GrammarError::JsonParse`] if its contents are not a grammar.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GrammarError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| GrammarError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        parse_grammar(&json)
    }

    /// Returns the entry rule of the grammar.
    ///
    /// The JSON object holding the rules is decoded into a map, so declaration
    /// order is lost. The entry rule is therefore [`DEFAULT_START_RULE`] when the
    /// grammar defines it, and otherwise the only rule that no other rule refers
    /// to. Rules named by `word`, `supertypes`, `inline`, `conflicts` or
    /// `precedences` break ties between several such rules. Returns `None` when
    /// no single rule is left.
    #[must_use]
    pub fn start_rule(&self) -> Option<&str> {
        if let Some((name, _)) = self.rules.get_key_value(DEFAULT_START_RULE) {
            return Some(name);
        }

        let mut referenced = HashSet::new();
        for (name, rule) in &self.rules {
            referenced.extend(
                rule.referenced_symbols()
                    .into_iter()
                    .filter(|symbol| *symbol != name.as_str()),
            );
        }
        for extra in self.extras.iter().flatten() {
            referenced.extend(extra.referenced_symbols());
        }

        let roots: Vec<&str> = self
            .rules
            .keys()
            .map(String::as_str)
            .filter(|name| !referenced.contains(name))
            .collect();
        if let [root] = roots[..] {
            return Some(root);
        }

        let declared = self.declared_names();
        let mut undeclared = roots.into_iter().filter(|name| !declared.contains(name));
        let root = undeclared.next()?;
        undeclared.next().is_none().then_some(root)
    }

    /// Rule names listed outside `rules`: in `word`, `supertypes`, `inline`,
    /// `conflicts` and as `SYMBOL` entries of `precedences`.
    fn declared_names(&self) -> HashSet<&str> {
        let mut names: HashSet<&str> = self.word.as_deref().into_iter().collect();
        names.extend(self.supertypes.iter().flatten().map(String::as_str));
        names.extend(self.inline.iter().flatten().map(String::as_str));
        names.extend(self.conflicts.iter().flatten().flatten().map(String::as_str));
        names.extend(
            self.precedences
                .iter()
                .flatten()
                .flatten()
                .filter_map(Rule::symbol_name),
        );
        names
    }

    /// Rule names in the order used for symbol numbering: the start rule
    /// first, then every other rule sorted by name.
    #[must_use]
    pub fn rule_order(&self) -> Vec<&str> {
        let start = self.start_rule();
        let mut names: Vec<&str> = self
            .rules
            .keys()
            .map(String::as_str)
            .filter(|name| Some(*name) != start)
            .collect();
        names.sort_unstable();
        start.into_iter().chain(names).collect()
    }

    /// Returns `true` if `name` is hidden: tree-sitter omits rules starting
    /// with `_` from the syntax tree.
    #[must_use]
    pub fn is_hidden(name: &str) -> bool {
        name.starts_with('_')
    }

    /// Names declared in `externals`, which count as defined symbols.
    #[must_use]
    pub fn external_names(&self) -> Vec<&str> {
        self.externals
            .iter()
            .flatten()
            .filter_map(Rule::symbol_name)
            .collect()
    }

    /// Returns `true` if `name` is listed in `supertypes`.
    #[must_use]
    pub fn is_supertype(&self, name: &str) -> bool {
        self.supertypes
            .as_ref()
            .is_some_and(|names| names.iter().any(|s| s == name))
    }

    /// Returns `true` if `name` is listed in `inline`.
    #[must_use]
    pub fn is_inline(&self, name: &str) -> bool {
        self.inline
            .as_ref()
            .is_some_and(|names| names.iter().any(|s| s == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_minimal_document() {
        let json = r#"{
            "name": "greeting",
            "rules": {
                "source_file": {"type": "REPEAT", "content": {"type": "SYMBOL", "name": "word"}},
                "word": {"type": "PATTERN", "value": "[a-z]+"}
            },
            "precedences": [[{"type": "STRING", "value": "call"}, {"type": "SYMBOL", "name": "word"}]]
        }"#;

        let grammar = parse_grammar(json).unwrap();
        assert_eq!(grammar.name, "greeting");
        assert_eq!(grammar.rules.len(), 2);
        assert_eq!(grammar.start_rule(), Some("source_file"));
        assert_eq!(grammar.extras, None);
        assert_eq!(grammar.rule_order(), ["source_file", "word"]);
        assert_eq!(
            grammar.precedences,
            Some(vec![vec![Rule::string("call"), Rule::symbol("word")]])
        );
    }

    #[test]
    fn self_reference_keeps_a_rule_as_root() {
        let grammar = Grammar::new("sum").with_rule(
            "sum",
            Rule::prec_left(
                1,
                Rule::choice([
                    Rule::seq([Rule::symbol("sum"), Rule::string("+"), Rule::symbol("sum")]),
                    Rule::pattern("[0-9]+"),
                ]),
            ),
        );
        assert_eq!(grammar.start_rule(), Some("sum"));
    }

    #[test]
    fn parse_bundled_artifact() {
        let grammar = parse_grammar(crate::GRAMMAR_JSON).unwrap();
        assert_eq!(grammar.name, "akyno");
        assert_eq!(grammar.start_rule(), Some("source_file"));
        assert_eq!(
            grammar.rules[DEFAULT_START_RULE].string_value(),
            Some("hello")
        );
        assert_eq!(grammar.extras, Some(vec![Rule::pattern("\\s")]));
        assert_eq!(grammar.reserved, Some(HashMap::new()));
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = parse_grammar("{ \"name\": ").unwrap_err();
        assert!(matches!(err, GrammarError::JsonParse(_)));
        assert!(err.to_string().starts_with("JSON parse error"));
        assert!(!err.to_string().contains('\u{1b}'), "{err}");
    }

    #[test]
    fn missing_rules_is_a_parse_error() {
        assert!(matches!(
            parse_grammar(r#"{"name": "test"}"#),
            Err(GrammarError::JsonParse(_))
        ));
    }

    #[test]
    fn start_rule_falls_back_to_unreferenced_rule() {
        let grammar = Grammar::new("calc")
            .with_rule("program", Rule::repeat(Rule::symbol("number")))
            .with_rule("number", Rule::pattern("[0-9]+"));
        assert_eq!(grammar.start_rule(), Some("program"));
        assert_eq!(grammar.rule_order(), ["program", "number"]);
    }

    #[test]
    fn declared_rules_do_not_compete_for_start() {
        let mut grammar = Grammar::new("lang")
            .with_rule("program", Rule::repeat(Rule::symbol("keyword")))
            .with_rule("keyword", Rule::string("let"))
            .with_rule("identifier", Rule::pattern("[a-z]+"))
            .with_rule("_value", Rule::choice([Rule::symbol("keyword")]));
        grammar.word = Some("identifier".to_string());
        grammar.supertypes = Some(vec!["_value".to_string()]);
        assert_eq!(grammar.start_rule(), Some("program"));

        grammar.word = None;
        assert_eq!(grammar.start_rule(), None);
    }

    #[test]
    fn start_rule_is_ambiguous_with_two_roots() {
        let grammar = Grammar::new("calc")
            .with_rule("a", Rule::string("a"))
            .with_rule("b", Rule::string("b"));
        assert_eq!(grammar.start_rule(), None);
    }

    #[test]
    fn from_path_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = Grammar::from_path(dir.path().join("grammar.json")).unwrap_err();
        assert!(matches!(err, GrammarError::Io { .. }));
    }

    #[test]
    fn from_path_reads_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grammar.json");
        std::fs::write(&path, crate::GRAMMAR_JSON).unwrap();
        assert_eq!(Grammar::from_path(&path).unwrap().name, "akyno");
    }

    #[test]
    fn supertype_and_inline_lookups() {
        let mut grammar = Grammar::new("calc");
        grammar.supertypes = Some(vec!["_expression".to_string()]);
        grammar.inline = Some(vec!["_atom".to_string()]);
        assert!(grammar.is_supertype("_expression"));
        assert!(!grammar.is_supertype("_atom"));
        assert!(grammar.is_inline("_atom"));
        assert!(Grammar::is_hidden("_atom"));
        assert!(!Grammar::is_hidden("atom"));
    }
}
