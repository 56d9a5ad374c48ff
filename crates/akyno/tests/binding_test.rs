//! Loading the bundled Akyno grammar the way downstream bindings do.

use akyno::{Language, LanguageFn, LoadErrorKind};
use std::error::Error as _;

#[test]
fn test_can_load_grammar() {
    let language = akyno::language().expect("Error loading Akyno grammar");
    assert_eq!(language.name(), akyno::NAME);
    assert_eq!(language.display_name(), akyno::DISPLAY_NAME);
}

#[test]
fn language_fn_builds_an_independent_handle() {
    let fresh = Language::new(akyno::LANGUAGE).unwrap();
    let cached = akyno::language().unwrap();
    assert_eq!(fresh.grammar(), cached.grammar());
    assert_eq!(fresh.node_types(), cached.node_types());
}

fn empty() -> &'static str {
    ""
}

fn truncated() -> &'static str {
    &akyno::GRAMMAR_JSON[..akyno::GRAMMAR_JSON.len() / 2]
}

fn renamed() -> &'static str {
    r#"{"name": "kyno", "rules": {"source_file": {"type": "STRING", "value": "hello"}}}"#
}

fn dangling() -> &'static str {
    r#"{"name": "akyno", "rules": {"source_file": {"type": "SYMBOL", "name": "greeting"}}}"#
}

#[test]
fn corrupt_artifacts_fail_with_the_fixed_message() {
    for artifact in [empty as fn() -> &'static str, truncated] {
        let err = Language::new(LanguageFn::new("akyno", "Akyno", artifact)).unwrap_err();
        assert_eq!(err.to_string(), "Error loading Akyno grammar");
        assert!(matches!(err.kind(), LoadErrorKind::Grammar(_)));
    }
}

#[test]
fn wrong_grammar_name_fails_to_load() {
    let err = Language::new(LanguageFn::new("akyno", "Akyno", renamed)).unwrap_err();
    assert_eq!(err.to_string(), "Error loading Akyno grammar");
    assert!(matches!(err.kind(), LoadErrorKind::NameMismatch { .. }));
}

#[test]
fn inconsistent_grammar_fails_to_load() {
    let err = Language::new(LanguageFn::new("akyno", "Akyno", dangling)).unwrap_err();
    assert_eq!(
        err.source().unwrap().to_string(),
        "invalid grammar: undefined symbol 'greeting' referenced in rule 'source_file'"
    );
}

#[test]
fn bundled_node_types_match_the_grammar() {
    let language = akyno::language().unwrap();
    let bundled = akyno::parse_node_types(akyno::NODE_TYPES).unwrap();
    assert_eq!(language.node_types(), bundled.as_slice());
}

#[test]
fn node_kinds_resolve() {
    let language = akyno::language().unwrap();
    let source_file = language.id_for_node_kind("source_file", true).unwrap();
    assert_eq!(source_file, language.start_symbol());
    assert!(language.node_kind_is_named(source_file));
    assert!(language.node_kind_is_visible(source_file));
    assert!(!language.node_kind_is_supertype(source_file));
    assert!(language.subtypes_for_supertype(source_file).is_empty());
    assert_eq!(language.id_for_node_kind("source_file", false), None);
    assert_eq!(language.field_id_for_name("body"), None);
}

#[test]
fn language_is_shared_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Language>();

    let handles: Vec<_> = (0..4)
        .map(|_| std::thread::spawn(|| akyno::language().unwrap().node_kind_count()))
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 3);
    }
}

#[test]
fn metadata_constants() {
    assert_eq!(akyno::SCOPE, "source.akyno");
    assert!(akyno::FILE_TYPES.contains(&"akyno"));
    assert_eq!(akyno::LANGUAGE.name(), "akyno");
    assert_eq!(akyno::LANGUAGE.artifact(), akyno::GRAMMAR_JSON);
}
