//! The `node-types.json` description of a language.
//!
//! Every tree-sitter grammar ships a `src/node-types.json` listing the kinds of
//! node a tree may contain and, for each named non-terminal, which fields and
//! children it can have. [`generate`] derives that listing from a grammar and
//! its [`SymbolTable`].

use crate::grammar::{Grammar, GrammarError, Rule, RuleType};
use crate::symbols::{SymbolKind, SymbolTable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One entry of `node-types.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTypeInfo {
    /// The node kind.
    #[serde(rename = "type")]
    pub kind: String,

    /// Whether the node kind is named.
    pub named: bool,

    /// Set on the start rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<bool>,

    /// Set on kinds that may appear anywhere as extras.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<bool>,

    /// Fields of a non-terminal, by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, FieldInfo>>,

    /// Named children of a non-terminal that are not in any field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<FieldInfo>,

    /// The kinds a supertype stands for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtypes: Option<Vec<NodeTypeRef>>,
}

/// A reference to a node kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeTypeRef {
    /// The node kind.
    #[serde(rename = "type")]
    pub kind: String,

    /// Whether the node kind is named.
    pub named: bool,
}

/// What may occupy a field (or the unnamed children) of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// More than one node may occupy it.
    pub multiple: bool,

    /// At least one node always occupies it.
    pub required: bool,

    /// The node kinds that may occupy it, sorted.
    pub types: Vec<NodeTypeRef>,
}

/// Decodes a `node-types.json` document.
///
/// # Errors
///
/// Returns [`GrammarError::JsonParse`] if `json` is not a node types listing.
pub fn parse_node_types(json: &str) -> Result<Vec<NodeTypeInfo>, GrammarError> {
    serde_json::from_str(json).map_err(|e| GrammarError::JsonParse(e.to_string()))
}

/// Encodes node types in the `node-types.json` layout. Absent properties are
/// left out rather than written as `null`.
///
/// # Errors
///
/// Returns the underlying [`serde_json::Error`] if encoding fails.
pub fn to_json(node_types: &[NodeTypeInfo]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(node_types)
}

/// Derives the node types of a grammar whose symbols are interned in `symbols`.
///
/// Entries are ordered supertypes first, then named kinds, then anonymous
/// kinds, each group sorted by kind.
#[must_use]
pub fn generate(grammar: &Grammar, symbols: &SymbolTable) -> Vec<NodeTypeInfo> {
    let summarizer = Summarizer { grammar, symbols };
    let extras: BTreeSet<&str> = grammar
        .extras
        .iter()
        .flatten()
        .filter_map(Rule::symbol_name)
        .collect();

    let mut entries: BTreeMap<NodeTypeRef, NodeTypeInfo> = BTreeMap::new();
    for (id, info) in symbols.iter() {
        let key = NodeTypeRef {
            kind: info.name.clone(),
            named: info.named,
        };
        let mut entry = NodeTypeInfo {
            kind: info.name.clone(),
            named: info.named,
            root: None,
            extra: extras.contains(info.name.as_str()).then_some(true),
            fields: None,
            children: None,
            subtypes: None,
        };

        match info.kind {
            SymbolKind::End | SymbolKind::Error => continue,
            SymbolKind::NonTerminal if info.supertype => {
                entry.subtypes = Some(
                    symbols
                        .subtypes(id)
                        .iter()
                        .filter_map(|&sub| symbols.get(sub))
                        .map(|sub| NodeTypeRef {
                            kind: sub.name.clone(),
                            named: sub.named,
                        })
                        .collect(),
                );
            }
            SymbolKind::NonTerminal if info.visible => {
                entry.root = (id == symbols.start()).then_some(true);
                let body = &grammar.rules[&info.name];
                summarizer.summarize_into(&mut entry, body);
            }
            SymbolKind::NonTerminal => continue,
            SymbolKind::Alias => {
                if let Some(body) = summarizer.aliased_rule_body(&info.name, info.named) {
                    summarizer.summarize_into(&mut entry, body);
                }
            }
            SymbolKind::Terminal | SymbolKind::External if !info.visible => continue,
            SymbolKind::Terminal | SymbolKind::External => {}
        }

        entries.entry(key).or_insert(entry);
    }

    let mut node_types: Vec<NodeTypeInfo> = entries.into_values().collect();
    node_types.sort_by(|a, b| {
        b.subtypes
            .is_some()
            .cmp(&a.subtypes.is_some())
            .then_with(|| b.named.cmp(&a.named))
            .then_with(|| a.kind.cmp(&b.kind))
    });
    node_types
}

/// How many nodes occupy a slot: `0`, `1`, or `2` meaning "several".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Quantity {
    min: u8,
    max: u8,
}

impl Quantity {
    const ONE: Self = Self { min: 1, max: 1 };

    fn then(self, other: Self) -> Self {
        Self {
            min: (self.min + other.min).min(2),
            max: (self.max + other.max).min(2),
        }
    }

    fn or(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    fn repeated(self, at_least_once: bool) -> Self {
        Self {
            min: if at_least_once { self.min } else { 0 },
            max: if self.max > 0 { 2 } else { 0 },
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    quantity: Quantity,
    types: BTreeSet<NodeTypeRef>,
}

impl Slot {
    fn merge(mut self, other: Slot, quantity: fn(Quantity, Quantity) -> Quantity) -> Slot {
        self.quantity = quantity(self.quantity, other.quantity);
        self.types.extend(other.types);
        self
    }

    fn into_field_info(self) -> Option<FieldInfo> {
        if self.types.is_empty() {
            return None;
        }
        Some(FieldInfo {
            multiple: self.quantity.max >= 2,
            required: self.quantity.min >= 1,
            types: self.types.into_iter().collect(),
        })
    }
}

/// The children a rule body can produce, grouped by field. Unfielded
/// anonymous nodes are not tracked.
#[derive(Debug, Clone, Default)]
struct Summary {
    fields: BTreeMap<String, Slot>,
    children: Slot,
}

impl Summary {
    fn occurrence(node: NodeTypeRef, field: Option<&str>) -> Self {
        let slot = Slot {
            quantity: Quantity::ONE,
            types: BTreeSet::from([node]),
        };
        let mut summary = Self::default();
        match field {
            Some(name) => {
                summary.fields.insert(name.to_string(), slot);
            }
            None if slot.types.iter().all(|t| t.named) => summary.children = slot,
            None => {}
        }
        summary
    }

    fn combine(mut self, other: Summary, quantity: fn(Quantity, Quantity) -> Quantity) -> Self {
        for name in other.fields.keys() {
            self.fields.entry(name.clone()).or_default();
        }
        let mut other_fields = other.fields;
        self.fields = std::mem::take(&mut self.fields)
            .into_iter()
            .map(|(name, slot)| {
                let rhs = other_fields.remove(&name).unwrap_or_default();
                (name, slot.merge(rhs, quantity))
            })
            .collect();
        self.children = self.children.merge(other.children, quantity);
        self
    }

    fn map_quantities(mut self, f: impl Fn(Quantity) -> Quantity) -> Self {
        for slot in self.fields.values_mut() {
            slot.quantity = f(slot.quantity);
        }
        self.children.quantity = f(self.children.quantity);
        self
    }
}

struct Summarizer<'a> {
    grammar: &'a Grammar,
    symbols: &'a SymbolTable,
}

impl<'a> Summarizer<'a> {
    fn summarize_into(&self, entry: &mut NodeTypeInfo, body: &'a Rule) {
        let summary = self.summarize(body, None, &mut Vec::new());
        entry.fields = Some(
            summary
                .fields
                .into_iter()
                .filter_map(|(name, slot)| slot.into_field_info().map(|info| (name, info)))
                .collect(),
        );
        entry.children = summary.children.into_field_info();
    }

    /// Finds the rule an alias renames, when it renames a non-terminal.
    fn aliased_rule_body(&self, alias: &str, named: bool) -> Option<&'a Rule> {
        let mut found = None;
        for name in self.grammar.rule_order() {
            self.grammar.rules[name].walk(&mut |rule| {
                let renamed = rule.alias_value() == Some(alias) && rule.named.unwrap_or(false) == named;
                if found.is_none() && renamed {
                    found = rule
                        .content
                        .as_deref()
                        .and_then(Rule::symbol_name)
                        .filter(|target| !self.symbols.is_lexical_rule(target))
                        .and_then(|target| self.grammar.rules.get(target));
                }
            });
        }
        found
    }

    fn summarize(&self, rule: &'a Rule, field: Option<&str>, visiting: &mut Vec<&'a str>) -> Summary {
        match rule.rule_type {
            RuleType::Blank | RuleType::Pattern | RuleType::Token | RuleType::ImmediateToken => {
                Summary::default()
            }
            RuleType::String => rule.string_value().map_or_else(Summary::default, |text| {
                Summary::occurrence(
                    NodeTypeRef {
                        kind: text.to_string(),
                        named: false,
                    },
                    field,
                )
            }),
            RuleType::Symbol => rule
                .symbol_name()
                .map_or_else(Summary::default, |name| self.summarize_symbol(name, field, visiting)),
            RuleType::Seq => rule
                .members
                .iter()
                .map(|member| self.summarize(member, field, visiting))
                .reduce(|acc, next| acc.combine(next, Quantity::then))
                .unwrap_or_default(),
            RuleType::Choice => rule
                .members
                .iter()
                .map(|member| self.summarize(member, field, visiting))
                .reduce(|acc, next| acc.combine(next, Quantity::or))
                .unwrap_or_default(),
            RuleType::Repeat | RuleType::Repeat1 => {
                let at_least_once = rule.rule_type == RuleType::Repeat1;
                self.summarize_content(rule, field, visiting)
                    .map_quantities(|q| q.repeated(at_least_once))
            }
            RuleType::Field => {
                let name = rule.name.as_deref().or(field);
                self.summarize_content(rule, name, visiting)
            }
            RuleType::Alias => rule.alias_value().map_or_else(Summary::default, |alias| {
                Summary::occurrence(
                    NodeTypeRef {
                        kind: alias.to_string(),
                        named: rule.named.unwrap_or(false),
                    },
                    field,
                )
            }),
            RuleType::Prec
            | RuleType::PrecLeft
            | RuleType::PrecRight
            | RuleType::PrecDynamic
            | RuleType::Reserved => self.summarize_content(rule, field, visiting),
        }
    }

    fn summarize_content(
        &self,
        rule: &'a Rule,
        field: Option<&str>,
        visiting: &mut Vec<&'a str>,
    ) -> Summary {
        rule.content
            .as_deref()
            .map_or_else(Summary::default, |content| self.summarize(content, field, visiting))
    }

    fn summarize_symbol(&self, name: &'a str, field: Option<&str>, visiting: &mut Vec<&'a str>) -> Summary {
        if let Some(info) = self.symbols.rule_symbol(name).and_then(|id| self.symbols.get(id)) {
            if info.visible || info.supertype {
                let node = NodeTypeRef {
                    kind: info.name.clone(),
                    named: info.named,
                };
                return Summary::occurrence(node, field);
            }
            if info.kind != SymbolKind::NonTerminal {
                return Summary::default();
            }
        }

        // Hidden and inlined rules contribute their own children.
        let Some(body) = self.grammar.rules.get(name) else {
            return Summary::default();
        };
        if visiting.contains(&name) {
            return Summary::default();
        }
        visiting.push(name);
        let summary = self.summarize(body, field, visiting);
        visiting.pop();
        summary
    }
}
