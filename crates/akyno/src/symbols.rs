//! Symbol and field interning.
//!
//! A loaded language addresses node kinds and fields by small integer ids,
//! numbered the way `tree-sitter generate` numbers them in `parser.c`:
//!
//! - id `0` is the builtin `end` symbol;
//! - terminals follow (named lexical rules, anonymous string literals, external tokens);
//! - non-terminals come next, hidden rules included but marked invisible;
//! - alias names that do not collide with an existing symbol come last.
//!
//! The builtin `ERROR` symbol lives outside that range at [`ERROR_SYMBOL`].
//! Rules are visited in [`Grammar::rule_order`], so numbering is deterministic.

use crate::grammar::{Grammar, Rule, RuleType};
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroU16;

/// Numeric id of a node kind.
pub type SymbolId = u16;

/// Numeric id of a field. Field ids start at 1.
pub type FieldId = NonZeroU16;

/// The builtin end-of-input symbol.
pub const END_SYMBOL: SymbolId = 0;

/// The builtin symbol used for error nodes.
pub const ERROR_SYMBOL: SymbolId = u16::MAX;

/// What a symbol stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// The builtin end-of-input symbol.
    End,
    /// A token matched by the lexer: a lexical rule or an anonymous string.
    Terminal,
    /// A token produced by an external scanner.
    External,
    /// A rule built from other symbols.
    NonTerminal,
    /// A node name introduced only through `alias`.
    Alias,
    /// The builtin error symbol.
    Error,
}

/// Metadata about one interned symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInfo {
    /// The node kind as it appears in trees (rule name, literal text or alias).
    pub name: String,
    /// What the symbol stands for.
    pub kind: SymbolKind,
    /// Whether nodes of this kind are named.
    pub named: bool,
    /// Whether nodes of this kind appear in trees.
    pub visible: bool,
    /// Whether this symbol is listed in the grammar's `supertypes`.
    pub supertype: bool,
}

/// Errors raised while interning a grammar's symbols.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SymbolError {
    /// Neither `source_file` nor a unique root rule exists.
    #[error("cannot determine the start rule")]
    NoStartRule,

    /// More symbols than a 16-bit id can address.
    #[error("grammar defines {0} symbols, more than a language can address")]
    TooManySymbols(usize),

    /// More fields than a 16-bit id can address.
    #[error("grammar defines {0} fields, more than a language can address")]
    TooManyFields(usize),
}

/// The interned symbols and fields of a grammar.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<SymbolInfo>,
    error: SymbolInfo,
    rule_symbols: HashMap<String, SymbolId>,
    lexical_rules: BTreeSet<String>,
    fields: Vec<String>,
    start: SymbolId,
    subtypes: HashMap<SymbolId, Vec<SymbolId>>,
}

impl SymbolTable {
    /// Interns every symbol and field of a validated grammar.
    ///
    /// # Errors
    ///
    /// Returns [`SymbolError`] if the start rule cannot be determined or the
    /// grammar needs more ids than fit in 16 bits.
    pub fn build(grammar: &Grammar) -> Result<Self, SymbolError> {
        let order = grammar.rule_order();
        let start_name = grammar.start_rule().ok_or(SymbolError::NoStartRule)?;

        let mut table = Self {
            symbols: Vec::new(),
            error: SymbolInfo {
                name: "ERROR".to_string(),
                kind: SymbolKind::Error,
                named: true,
                visible: true,
                supertype: false,
            },
            rule_symbols: HashMap::new(),
            lexical_rules: order
                .iter()
                .filter(|name| **name != start_name && is_lexical(&grammar.rules[**name]))
                .map(|name| (*name).to_string())
                .collect(),
            fields: Vec::new(),
            start: END_SYMBOL,
            subtypes: HashMap::new(),
        };

        table.push(SymbolInfo {
            name: "end".to_string(),
            kind: SymbolKind::End,
            named: false,
            visible: false,
            supertype: false,
        });

        // Terminals, in rule order.
        for name in &order {
            if table.lexical_rules.contains(*name) {
                let id = table.push(SymbolInfo {
                    name: (*name).to_string(),
                    kind: SymbolKind::Terminal,
                    named: true,
                    visible: !Grammar::is_hidden(name),
                    supertype: false,
                });
                table.rule_symbols.insert((*name).to_string(), id);
            } else {
                table.intern_strings(&grammar.rules[*name]);
            }
        }
        for extra in grammar.extras.iter().flatten() {
            table.intern_strings(extra);
        }
        for external in grammar.externals.iter().flatten() {
            match (external.symbol_name(), external.string_value()) {
                (Some(name), _) if !grammar.rules.contains_key(name) => {
                    let id = table.push(SymbolInfo {
                        name: name.to_string(),
                        kind: SymbolKind::External,
                        named: true,
                        visible: !Grammar::is_hidden(name),
                        supertype: false,
                    });
                    table.rule_symbols.insert(name.to_string(), id);
                }
                (None, Some(text)) => table.intern_anonymous(text),
                _ => {}
            }
        }

        // Non-terminals. Inlined rules are substituted into their callers.
        for name in &order {
            if table.lexical_rules.contains(*name) || grammar.is_inline(name) {
                continue;
            }
            let id = table.push(SymbolInfo {
                name: (*name).to_string(),
                kind: SymbolKind::NonTerminal,
                named: true,
                visible: *name == start_name || !Grammar::is_hidden(name),
                supertype: grammar.is_supertype(name),
            });
            table.rule_symbols.insert((*name).to_string(), id);
        }
        table.start = table
            .rule_symbol(start_name)
            .ok_or(SymbolError::NoStartRule)?;

        for name in &order {
            grammar.rules[*name].walk(&mut |rule| {
                if let Some(alias) = rule.alias_value() {
                    let named = rule.named.unwrap_or(false);
                    if table.find(alias, named).is_none() {
                        table.push(SymbolInfo {
                            name: alias.to_string(),
                            kind: SymbolKind::Alias,
                            named,
                            visible: true,
                            supertype: false,
                        });
                    }
                }
            });
        }

        let mut fields = BTreeSet::new();
        for rule in grammar.rules.values() {
            rule.walk(&mut |nested| {
                if nested.rule_type == RuleType::Field {
                    fields.extend(nested.name.clone());
                }
            });
        }
        table.fields = fields.into_iter().collect();

        for name in grammar.supertypes.iter().flatten() {
            let Some(&id) = table.rule_symbols.get(name) else {
                continue;
            };
            let members = table.subtype_members(grammar.rules[name].without_precedence());
            table.subtypes.insert(id, members);
        }

        // `ERROR_SYMBOL` must stay out of the dense range.
        if table.symbols.len() >= usize::from(ERROR_SYMBOL) {
            return Err(SymbolError::TooManySymbols(table.symbols.len()));
        }
        if table.fields.len() >= usize::from(u16::MAX) {
            return Err(SymbolError::TooManyFields(table.fields.len()));
        }

        tracing::debug!(
            symbols = table.symbols.len(),
            fields = table.fields.len(),
            start = start_name,
            "interned grammar symbols"
        );
        Ok(table)
    }

    fn push(&mut self, info: SymbolInfo) -> SymbolId {
        // Saturates past the addressable range; `build` rejects such tables.
        let id = SymbolId::try_from(self.symbols.len()).unwrap_or(ERROR_SYMBOL);
        self.symbols.push(info);
        id
    }

    fn intern_anonymous(&mut self, text: &str) {
        if self.find(text, false).is_none() {
            self.push(SymbolInfo {
                name: text.to_string(),
                kind: SymbolKind::Terminal,
                named: false,
                visible: true,
                supertype: false,
            });
        }
    }

    /// Interns the string literals of a non-lexical rule. The contents of
    /// `token(...)` and patterns become hidden auxiliary tokens, which have no
    /// node kind of their own.
    fn intern_strings(&mut self, rule: &Rule) {
        match rule.rule_type {
            RuleType::String => {
                if let Some(text) = rule.string_value() {
                    self.intern_anonymous(text);
                }
            }
            RuleType::Token | RuleType::ImmediateToken | RuleType::Pattern => {}
            _ => {
                for child in rule.children() {
                    self.intern_strings(child);
                }
            }
        }
    }

    fn subtype_members(&self, rule: &Rule) -> Vec<SymbolId> {
        let alternatives: Vec<&Rule> = if rule.rule_type == RuleType::Choice {
            rule.members.iter().map(Rule::without_precedence).collect()
        } else {
            vec![rule]
        };

        let mut members: Vec<SymbolId> = alternatives
            .into_iter()
            .filter_map(|alt| match alt.rule_type {
                RuleType::Symbol => alt
                    .symbol_name()
                    .and_then(|name| self.rule_symbols.get(name).copied()),
                RuleType::String => alt.string_value().and_then(|text| self.find(text, false)),
                RuleType::Alias => alt
                    .alias_value()
                    .and_then(|name| self.find(name, alt.named.unwrap_or(false))),
                _ => None,
            })
            .collect();
        members.sort_unstable();
        members.dedup();
        members
    }

    fn find(&self, kind: &str, named: bool) -> Option<SymbolId> {
        self.symbols
            .iter()
            .position(|s| s.name == kind && s.named == named && (s.visible || s.supertype))
            .and_then(|index| SymbolId::try_from(index).ok())
    }

    /// Number of symbols, excluding [`ERROR_SYMBOL`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if no symbol has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Looks up a symbol by id. [`ERROR_SYMBOL`] is always present.
    #[must_use]
    pub fn get(&self, id: SymbolId) -> Option<&SymbolInfo> {
        if id == ERROR_SYMBOL {
            Some(&self.error)
        } else {
            self.symbols.get(usize::from(id))
        }
    }

    /// Iterates over `(id, info)` pairs in id order, excluding [`ERROR_SYMBOL`].
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &SymbolInfo)> {
        (0..=SymbolId::MAX).zip(self.symbols.iter())
    }

    /// Resolves a node kind to the first visible (or supertype) symbol with
    /// that name and namedness.
    #[must_use]
    pub fn id_for_node_kind(&self, kind: &str, named: bool) -> Option<SymbolId> {
        if named && kind == self.error.name {
            return Some(ERROR_SYMBOL);
        }
        self.find(kind, named)
    }

    /// Returns the symbol interned for the rule called `name`.
    #[must_use]
    pub fn rule_symbol(&self, name: &str) -> Option<SymbolId> {
        self.rule_symbols.get(name).copied()
    }

    /// Returns `true` if the rule called `name` was extracted as a token.
    #[must_use]
    pub fn is_lexical_rule(&self, name: &str) -> bool {
        self.lexical_rules.contains(name)
    }

    /// The symbol of the grammar's start rule.
    #[must_use]
    pub fn start(&self) -> SymbolId {
        self.start
    }

    /// Number of fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Looks up a field name by id.
    #[must_use]
    pub fn field_name(&self, id: FieldId) -> Option<&str> {
        self.fields
            .get(usize::from(id.get()) - 1)
            .map(String::as_str)
    }

    /// Looks up a field id by name.
    #[must_use]
    pub fn field_id(&self, name: &str) -> Option<FieldId> {
        let index = self.fields.binary_search_by(|f| f.as_str().cmp(name)).ok()?;
        u16::try_from(index + 1).ok().and_then(FieldId::new)
    }

    /// Iterates over `(id, name)` pairs of all fields.
    pub fn fields(&self) -> impl Iterator<Item = (FieldId, &str)> {
        (1..=u16::MAX)
            .filter_map(FieldId::new)
            .zip(self.fields.iter().map(String::as_str))
    }

    /// The direct subtypes of a supertype symbol, sorted by id.
    #[must_use]
    pub fn subtypes(&self, supertype: SymbolId) -> &[SymbolId] {
        self.subtypes.get(&supertype).map_or(&[][..], Vec::as_slice)
    }

    /// All supertype symbols, sorted by id.
    #[must_use]
    pub fn supertypes(&self) -> Vec<SymbolId> {
        self.iter()
            .filter(|(_, info)| info.supertype)
            .map(|(id, _)| id)
            .collect()
    }
}

/// A rule is extracted as a token when its body, below any precedence
/// wrappers, is a single lexical construct.
fn is_lexical(rule: &Rule) -> bool {
    matches!(
        rule.without_precedence().rule_type,
        RuleType::String | RuleType::Pattern | RuleType::Token | RuleType::ImmediateToken
    )
}
