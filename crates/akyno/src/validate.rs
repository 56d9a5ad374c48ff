//! Validation routines for Tree-sitter grammars.
//!
//! This module performs structural checks over parsed [`Grammar`](crate::grammar::Grammar)
//! definitions before a [`Language`](crate::Language) is built from them: the
//! grammar name, the shape of every rule, symbol references, and the names
//! listed in `inline`, `supertypes`, `conflicts` and `word`. A grammar that
//! passes is safe to intern into a symbol table.

use crate::grammar::{Grammar, Rule, RuleType};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Represents a validation failure encountered when checking a grammar.
///
/// Validation errors indicate issues such as undefined symbols, malformed
/// rules or invalid regular expressions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    /// The descriptive human-readable error message.
    pub message: String,
}

impl ValidationError {
    /// Creates a new [`ValidationError`] from a message string.
    fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

/// Performs semantic validation of a parsed [`Grammar`](crate::grammar::Grammar).
///
/// This function runs several consistency passes over the grammar:
///
/// - Checks the grammar name and that an entry rule exists.
/// - Checks that every rule is well formed and every pattern parses.
/// - Checks that all referenced symbols are defined.
/// - Warns about unreachable rules and mixed precedence levels.
///
/// # Errors
///
/// Returns a [`ValidationError`] for the first structural violation detected.
#[tracing::instrument(skip_all, fields(grammar = %grammar.name))]
pub fn validate(grammar: &Grammar) -> Result<(), ValidationError> {
    check_name(&grammar.name)?;

    if grammar.rules.is_empty() {
        return Err(ValidationError::new("grammar has no rules"));
    }
    let start = grammar
        .start_rule()
        .ok_or_else(|| ValidationError::new("cannot determine the start rule"))?;

    check_rule_shapes(grammar)?;
    check_undefined_symbols(grammar)?;
    check_declarations(grammar)?;

    check_unreachable_rules(grammar, start);
    check_precedence(grammar);

    Ok(())
}

fn check_name(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new(format!(
            "grammar name '{name}' is not a valid identifier"
        )))
    }
}

fn check_rule_shapes(grammar: &Grammar) -> Result<(), ValidationError> {
    for name in grammar.rule_order() {
        check_shape(&grammar.rules[name], name)?;
    }
    for extra in grammar.extras.iter().flatten() {
        check_shape(extra, "extras")?;
    }
    for external in grammar.externals.iter().flatten() {
        check_shape(external, "externals")?;
    }
    Ok(())
}

fn check_shape(rule: &Rule, context: &str) -> Result<(), ValidationError> {
    let fail = |what: &str| -> Result<(), ValidationError> {
        Err(ValidationError::new(format!(
            "{} rule in '{context}' {what}",
            rule.type_name()
        )))
    };

    match rule.rule_type {
        RuleType::Symbol if rule.name.is_none() => return fail("has no name"),
        RuleType::Field if rule.name.is_none() => return fail("has no name"),
        RuleType::Alias if rule.alias_value().is_none() => return fail("has no value"),
        RuleType::Choice | RuleType::Seq if rule.members.is_empty() => {
            return fail("has no members")
        }
        RuleType::String => match rule.string_value() {
            None => return fail("has no value"),
            Some("") => return fail("is empty"),
            Some(_) => {}
        },
        RuleType::Pattern => {
            let Some(source) = rule.pattern_value() else {
                return fail("has no value");
            };
            if let Err(e) = regex_syntax::Parser::new().parse(source) {
                return Err(ValidationError::new(format!(
                    "invalid pattern /{source}/ in '{context}': {e}"
                )));
            }
        }
        ty if ty.is_wrapper() && rule.content.is_none() => return fail("has no content"),
        _ => {}
    }

    for child in rule.children() {
        check_shape(child, context)?;
    }
    Ok(())
}

fn check_undefined_symbols(grammar: &Grammar) -> Result<(), ValidationError> {
    let defined = defined_symbols(grammar);

    for name in grammar.rule_order() {
        check_rule_symbols(&grammar.rules[name], &defined, name)?;
    }
    for extra in grammar.extras.iter().flatten() {
        check_rule_symbols(extra, &defined, "extras")?;
    }

    Ok(())
}

fn defined_symbols(grammar: &Grammar) -> HashSet<&str> {
    grammar
        .rules
        .keys()
        .map(String::as_str)
        .chain(grammar.external_names())
        .collect()
}

fn check_rule_symbols(
    rule: &Rule,
    defined: &HashSet<&str>,
    context: &str,
) -> Result<(), ValidationError> {
    match rule
        .referenced_symbols()
        .into_iter()
        .find(|name| !defined.contains(name))
    {
        Some(name) => Err(ValidationError::new(format!(
            "undefined symbol '{name}' referenced in rule '{context}'"
        ))),
        None => Ok(()),
    }
}

fn check_declarations(grammar: &Grammar) -> Result<(), ValidationError> {
    let require_rule = |name: &str, list: &str| {
        if grammar.rules.contains_key(name) {
            Ok(())
        } else {
            Err(ValidationError::new(format!(
                "{list} refers to undefined rule '{name}'"
            )))
        }
    };

    for name in grammar.inline.iter().flatten() {
        require_rule(name.as_str(), "inline")?;
    }
    for name in grammar.supertypes.iter().flatten() {
        require_rule(name.as_str(), "supertypes")?;
    }
    for name in grammar.conflicts.iter().flatten().flatten() {
        require_rule(name.as_str(), "conflicts")?;
    }
    if let Some(word) = &grammar.word {
        require_rule(word.as_str(), "word")?;
    }
    Ok(())
}

fn check_unreachable_rules(grammar: &Grammar, start: &str) {
    let mut reachable = HashSet::new();
    let mut to_visit = vec![start];
    for extra in grammar.extras.iter().flatten() {
        to_visit.extend(extra.referenced_symbols());
    }

    while let Some(rule_name) = to_visit.pop() {
        if !reachable.insert(rule_name) {
            continue;
        }
        if let Some(rule) = grammar.rules.get(rule_name) {
            to_visit.extend(rule.referenced_symbols());
        }
    }

    for rule_name in grammar.rule_order() {
        let declared_only = grammar.is_inline(rule_name)
            || grammar.word.as_deref() == Some(rule_name)
            || grammar.is_supertype(rule_name);
        if !reachable.contains(rule_name) && !declared_only {
            tracing::warn!(rule = rule_name, "unreachable rule");
        }
    }
}

fn check_precedence(grammar: &Grammar) {
    let mut prec_levels: HashMap<&str, BTreeSet<i32>> = HashMap::new();

    for (rule_name, rule) in &grammar.rules {
        rule.walk(&mut |nested| {
            if let Some(level) = nested.precedence() {
                prec_levels.entry(rule_name.as_str()).or_default().insert(level);
            }
        });
    }

    for (rule, levels) in &prec_levels {
        if levels.len() > 1 {
            tracing::warn!(rule = *rule, ?levels, "rule has multiple precedence levels");
        }
    }
}
