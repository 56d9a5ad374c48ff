//! Rule trees of a decoded `grammar.json`.
//!
//! `tree-sitter generate` lowers every `grammar.js` DSL call to a tagged JSON
//! object. [`Rule`] is that object; the constructors below rebuild the same
//! trees from Rust (`seq`, `choice`, `repeat`, ...).

use serde::Deserialize;

/// One node of a rule tree.
///
/// Which of the optional fields are set depends on [`Rule::rule_type`]:
/// wrappers carry `content`, `SEQ` and `CHOICE` carry `members`, literals and
/// precedence levels live in `value`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Rule {
    /// The `type` tag.
    #[serde(rename = "type")]
    pub rule_type: RuleType,

    /// Literal text, pattern source, alias name or precedence level.
    #[serde(default)]
    pub value: Option<RuleValue>,

    /// Referenced rule of a `SYMBOL`, field label of a `FIELD`.
    #[serde(default)]
    pub name: Option<String>,

    /// The wrapped rule of `REPEAT`, `PREC`, `FIELD`, `ALIAS`, `TOKEN`, ...
    #[serde(default)]
    pub content: Option<Box<Rule>>,

    /// Alternatives of a `CHOICE`, elements of a `SEQ`.
    #[serde(default)]
    pub members: Vec<Rule>,

    /// Namedness of the node an `ALIAS` produces.
    #[serde(default)]
    pub named: Option<bool>,

    /// Regex flags of a `PATTERN`, e.g. `"i"`.
    #[serde(default)]
    pub flags: Option<String>,

    /// Reserved word set selected by a `RESERVED` wrapper.
    #[serde(default)]
    pub context_name: Option<String>,
}

/// The `value` of a rule: text, or a precedence level.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    /// Literal text, pattern source, alias name or named precedence.
    String(String),

    /// Numeric precedence level.
    Integer(i32),
}

/// The `type` tag of a [`Rule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleType {
    /// Matches nothing.
    Blank,
    /// Literal text.
    String,
    /// Regular expression.
    Pattern,
    /// Reference to a rule.
    Symbol,
    /// Alternatives.
    Choice,
    /// Sequence.
    Seq,
    /// Zero or more.
    Repeat,
    /// One or more.
    Repeat1,
    /// Precedence level.
    Prec,
    /// Left-associative precedence.
    PrecLeft,
    /// Right-associative precedence.
    PrecRight,
    /// Precedence used to pick between conflicting parses at run time.
    PrecDynamic,
    /// Field label.
    Field,
    /// Renamed node.
    Alias,
    /// Content lexed as one token.
    Token,
    /// Token that may not follow extras.
    ImmediateToken,
    /// Reserved-word context.
    Reserved,
}

impl RuleType {
    /// Returns `true` for the precedence wrappers (`PREC`, `PREC_LEFT`, ...).
    #[must_use]
    pub fn is_precedence(self) -> bool {
        matches!(
            self,
            RuleType::Prec | RuleType::PrecLeft | RuleType::PrecRight | RuleType::PrecDynamic
        )
    }

    /// Returns `true` for rule types that wrap a single `content` rule.
    #[must_use]
    pub fn is_wrapper(self) -> bool {
        self.is_precedence()
            || matches!(
                self,
                RuleType::Repeat
                    | RuleType::Repeat1
                    | RuleType::Field
                    | RuleType::Alias
                    | RuleType::Token
                    | RuleType::ImmediateToken
                    | RuleType::Reserved
            )
    }
}

impl Rule {
    fn bare(rule_type: RuleType) -> Self {
        Self {
            rule_type,
            value: None,
            name: None,
            content: None,
            members: Vec::new(),
            named: None,
            flags: None,
            context_name: None,
        }
    }

    fn wrap(rule_type: RuleType, content: Rule) -> Self {
        Self {
            content: Some(Box::new(content)),
            ..Self::bare(rule_type)
        }
    }

    fn wrap_prec(rule_type: RuleType, level: i32, content: Rule) -> Self {
        Self {
            value: Some(RuleValue::Integer(level)),
            ..Self::wrap(rule_type, content)
        }
    }

    /// An empty production.
    #[must_use]
    pub fn blank() -> Self {
        Self::bare(RuleType::Blank)
    }

    /// A literal string token.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: Some(RuleValue::String(value.into())),
            ..Self::bare(RuleType::String)
        }
    }

    /// A regular-expression token.
    #[must_use]
    pub fn pattern(source: impl Into<String>) -> Self {
        Self {
            value: Some(RuleValue::String(source.into())),
            ..Self::bare(RuleType::Pattern)
        }
    }

    /// A reference to the rule called `name` (`$.name` in the DSL).
    #[must_use]
    pub fn symbol(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::bare(RuleType::Symbol)
        }
    }

    /// Members matched one after another.
    #[must_use]
    pub fn seq(members: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            members: members.into_iter().collect(),
            ..Self::bare(RuleType::Seq)
        }
    }

    /// Exactly one of the members.
    #[must_use]
    pub fn choice(members: impl IntoIterator<Item = Rule>) -> Self {
        Self {
            members: members.into_iter().collect(),
            ..Self::bare(RuleType::Choice)
        }
    }

    /// `choice(rule, blank())`, which is how `tree-sitter generate` encodes `optional`.
    #[must_use]
    pub fn optional(rule: Rule) -> Self {
        Self::choice([rule, Self::blank()])
    }

    /// Zero or more repetitions.
    #[must_use]
    pub fn repeat(rule: Rule) -> Self {
        Self::wrap(RuleType::Repeat, rule)
    }

    /// One or more repetitions.
    #[must_use]
    pub fn repeat1(rule: Rule) -> Self {
        Self::wrap(RuleType::Repeat1, rule)
    }

    /// Numeric precedence.
    #[must_use]
    pub fn prec(level: i32, rule: Rule) -> Self {
        Self::wrap_prec(RuleType::Prec, level, rule)
    }

    /// Left-associative precedence.
    #[must_use]
    pub fn prec_left(level: i32, rule: Rule) -> Self {
        Self::wrap_prec(RuleType::PrecLeft, level, rule)
    }

    /// Right-associative precedence.
    #[must_use]
    pub fn prec_right(level: i32, rule: Rule) -> Self {
        Self::wrap_prec(RuleType::PrecRight, level, rule)
    }

    /// Dynamic precedence, resolved at parse time.
    #[must_use]
    pub fn prec_dynamic(level: i32, rule: Rule) -> Self {
        Self::wrap_prec(RuleType::PrecDynamic, level, rule)
    }

    /// Labels the nodes produced by `rule` with the field `name`.
    #[must_use]
    pub fn field(name: impl Into<String>, rule: Rule) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::wrap(RuleType::Field, rule)
        }
    }

    /// Renames the node produced by `rule`.
    #[must_use]
    pub fn alias(rule: Rule, value: impl Into<String>, named: bool) -> Self {
        Self {
            value: Some(RuleValue::String(value.into())),
            named: Some(named),
            ..Self::wrap(RuleType::Alias, rule)
        }
    }

    /// Collapses `rule` into a single token.
    #[must_use]
    pub fn token(rule: Rule) -> Self {
        Self::wrap(RuleType::Token, rule)
    }

    /// A token that may not be preceded by extras.
    #[must_use]
    pub fn immediate_token(rule: Rule) -> Self {
        Self::wrap(RuleType::ImmediateToken, rule)
    }

    /// The `type` tag as it is spelled in `grammar.json`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        use RuleType as T;
        match self.rule_type {
            T::Blank => "BLANK",
            T::String => "STRING",
            T::Pattern => "PATTERN",
            T::Symbol => "SYMBOL",
            T::Choice => "CHOICE",
            T::Seq => "SEQ",
            T::Repeat => "REPEAT",
            T::Repeat1 => "REPEAT1",
            T::Prec => "PREC",
            T::PrecLeft => "PREC_LEFT",
            T::PrecRight => "PREC_RIGHT",
            T::PrecDynamic => "PREC_DYNAMIC",
            T::Field => "FIELD",
            T::Alias => "ALIAS",
            T::Token => "TOKEN",
            T::ImmediateToken => "IMMEDIATE_TOKEN",
            T::Reserved => "RESERVED",
        }
    }

    /// `STRING` and `PATTERN` rules match text directly.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self.rule_type, RuleType::String | RuleType::Pattern)
    }

    /// Whether this is a `SYMBOL` reference.
    #[must_use]
    pub fn is_symbol(&self) -> bool {
        self.rule_type == RuleType::Symbol
    }

    /// The rule a `SYMBOL` refers to.
    #[must_use]
    pub fn symbol_name(&self) -> Option<&str> {
        self.is_symbol().then_some(self.name.as_deref()).flatten()
    }

    /// The numeric level of a `PREC*` wrapper. Named precedences yield `None`.
    #[must_use]
    pub fn precedence(&self) -> Option<i32> {
        match (&self.value, self.rule_type.is_precedence()) {
            (Some(RuleValue::Integer(level)), true) => Some(*level),
            _ => None,
        }
    }

    /// The text of a `STRING`.
    #[must_use]
    pub fn string_value(&self) -> Option<&str> {
        self.text_if(RuleType::String)
    }

    /// The source of a `PATTERN`.
    #[must_use]
    pub fn pattern_value(&self) -> Option<&str> {
        self.text_if(RuleType::Pattern)
    }

    /// The node name an `ALIAS` produces.
    #[must_use]
    pub fn alias_value(&self) -> Option<&str> {
        self.text_if(RuleType::Alias)
    }

    /// Iterates over the directly nested rules: `content` first, then `members`.
    pub fn children(&self) -> impl Iterator<Item = &Rule> {
        self.content.as_deref().into_iter().chain(self.members.iter())
    }

    /// Visits this rule and every nested rule in pre-order.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Rule)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Collects the names of all `SYMBOL` rules nested in this rule, in visit order.
    #[must_use]
    pub fn referenced_symbols(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |rule| names.extend(rule.symbol_name()));
        names
    }

    /// Strips precedence wrappers, returning the first rule that is not one.
    #[must_use]
    pub fn without_precedence(&self) -> &Rule {
        let mut rule = self;
        while rule.rule_type.is_precedence() {
            match rule.content.as_deref() {
                Some(inner) => rule = inner,
                None => break,
            }
        }
        rule
    }

    fn text_if(&self, rule_type: RuleType) -> Option<&str> {
        match &self.value {
            Some(RuleValue::String(text)) if self.rule_type == rule_type => Some(text.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_literals() {
        let rule: Rule = serde_json::from_str(r#"{"type": "STRING", "value": "hello"}"#).unwrap();
        assert_eq!(rule, Rule::string("hello"));
        assert!(rule.is_terminal());
        assert_eq!(rule.type_name(), "STRING");

        let rule: Rule =
            serde_json::from_str(r#"{"type": "PATTERN", "value": "[a-z]+", "flags": "i"}"#).unwrap();
        assert_eq!(rule.pattern_value(), Some("[a-z]+"));
        assert_eq!(rule.string_value(), None);
        assert_eq!(rule.flags.as_deref(), Some("i"));
    }

    #[test]
    fn decodes_nested_wrappers() {
        let json = r#"{
            "type": "PREC_RIGHT",
            "value": 3,
            "content": {
                "type": "SEQ",
                "members": [
                    {"type": "FIELD", "name": "base", "content": {"type": "SYMBOL", "name": "term"}},
                    {"type": "STRING", "value": "^"},
                    {"type": "SYMBOL", "name": "term"}
                ]
            }
        }"#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.precedence(), Some(3));
        assert_eq!(
            rule,
            Rule::prec_right(
                3,
                Rule::seq([
                    Rule::field("base", Rule::symbol("term")),
                    Rule::string("^"),
                    Rule::symbol("term"),
                ])
            )
        );
    }

    #[test]
    fn named_precedence_has_no_level() {
        let rule: Rule = serde_json::from_str(
            r#"{"type": "PREC", "value": "unary", "content": {"type": "BLANK"}}"#,
        )
        .unwrap();
        assert_eq!(rule.precedence(), None);
        assert!(rule.rule_type.is_wrapper());
    }

    #[test]
    fn optional_is_choice_with_blank() {
        let rule = Rule::optional(Rule::symbol("x"));
        assert_eq!(rule.rule_type, RuleType::Choice);
        assert_eq!(rule.members.len(), 2);
        assert_eq!(rule.members[1].rule_type, RuleType::Blank);
    }

    #[test]
    fn children_yields_content_then_members() {
        let wrapped = Rule::repeat(Rule::symbol("item"));
        let names: Vec<_> = wrapped.children().filter_map(Rule::symbol_name).collect();
        assert_eq!(names, ["item"]);

        let seq = Rule::seq([Rule::symbol("a"), Rule::symbol("b")]);
        let names: Vec<_> = seq.children().filter_map(Rule::symbol_name).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn referenced_symbols_walks_nested_rules() {
        let rule = Rule::seq([
            Rule::field("left", Rule::symbol("expr")),
            Rule::string("+"),
            Rule::repeat(Rule::choice([Rule::symbol("term"), Rule::blank()])),
        ]);
        assert_eq!(rule.referenced_symbols(), ["expr", "term"]);
    }

    #[test]
    fn without_precedence_unwraps_nested_wrappers() {
        let rule = Rule::prec(2, Rule::prec_dynamic(-1, Rule::pattern("[0-9]+")));
        assert_eq!(rule.without_precedence().pattern_value(), Some("[0-9]+"));
        assert_eq!(rule.precedence(), Some(2));
    }

    #[test]
    fn alias_value_reads_target_name() {
        let rule = Rule::alias(Rule::symbol("identifier"), "name", true);
        assert_eq!(rule.alias_value(), Some("name"));
        assert_eq!(rule.named, Some(true));
        assert_eq!(rule.string_value(), None);
    }
}
