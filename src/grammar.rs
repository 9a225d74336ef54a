//! Grammar compiler: component F, plus the public API of §6.3 and the
//! configuration surface of SPEC_FULL §10.3.
//!
//! Splits REBNF source on `;` into `NAME := BODY` rule texts exactly the
//! way `EBNFParser.__init__` does in `brutus/ebnf.py` (plain string
//! splitting, not a tokenizer pass — the meta-lexer only ever sees a
//! rule *body*, never its `NAME :=` header). Lower-case names compile a
//! rule body through the parser-node builder (component E); upper-case
//! names register a terminal pattern on the target tokenizer instead.

use crate::cst::CSTNode;
use crate::error::GrammarError;
use crate::matcher::Matcher;
use crate::meta;
use crate::parser_node::{self, GroupCounters, ParserNode};
use crate::symbol::SymbolTable;
use crate::token::Token;
use crate::tokenizer::Tokenizer;
use crate::trace::Trace;
use std::collections::{HashMap, VecDeque};

/// Generous default recursion bound (§5's "implementations should bound
/// depth to avoid stack exhaustion"). Deeply nested bracket grammars or
/// deeply self-recursive rules beyond this trip `GrammarTooDeep` instead
/// of overflowing the call stack.
const DEFAULT_MAX_DEPTH: usize = 512;

/// An ordered `rule_name -> parser_node` mapping (spec §3 "Rule table").
/// The first rule inserted is the start rule; duplicate insertion fails.
pub(crate) struct RuleTable {
    order: Vec<String>,
    nodes: HashMap<String, ParserNode>,
}

impl RuleTable {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            nodes: HashMap::new(),
        }
    }

    fn insert(&mut self, name: String, node: ParserNode) -> Result<(), GrammarError> {
        if self.nodes.contains_key(&name) {
            return Err(GrammarError::DuplicateRule { name });
        }
        self.order.push(name.clone());
        self.nodes.insert(name, node);
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&ParserNode> {
        self.nodes.get(name)
    }

    fn start_rule(&self) -> Option<&str> {
        self.order.first().map(String::as_str)
    }
}

/// Split REBNF source into non-empty rule texts on `;`, mirroring
/// `[line for line in text.split(';') if line.strip()]`.
fn split_rules(text: &str) -> impl Iterator<Item = &str> {
    text.split(';').map(str::trim).filter(|s| !s.is_empty())
}

/// Split one rule text into `(name, body)` on the first `:=`.
fn split_definition(rule_text: &str) -> Result<(&str, &str), GrammarError> {
    let mut parts = rule_text.splitn(2, ":=");
    let name = parts.next().unwrap_or("").trim();
    let body = parts.next().ok_or_else(|| GrammarError::GrammarSyntax {
        rule: name.to_string(),
        message: "missing ':=' in rule definition".to_string(),
    })?;
    Ok((name, body.trim()))
}

/// A compiled grammar: an immutable rule table, symbol registry, and
/// target tokenizer, plus the small set of builder-style config knobs
/// named in §6.3/§10.3. Once compiled, a `Grammar` is read-only and may
/// be shared across threads by multiple readers (§5) — nothing here is
/// mutated during `parse`.
pub struct Grammar {
    rules: RuleTable,
    symbols: SymbolTable,
    target_tokenizer: Tokenizer,
    start_rule: String,
    collapse: bool,
    max_depth: usize,
    trace: Trace<&'static str>,
}

impl Grammar {
    /// Compile REBNF source text into symbols, a rule table, and a
    /// target tokenizer (spec §4.5).
    pub fn compile(text: &str) -> Result<Self, GrammarError> {
        let (meta_tokenizer, meta_symbols, _meta_table) = meta::build();

        let mut rules = RuleTable::new();
        let mut symbols = SymbolTable::new();
        let mut target_tokenizer = Tokenizer::new();
        // Whitespace between tokens of the *target* language is
        // insignificant unless a grammar author says otherwise, exactly
        // as `EBNFParser.__init__` seeds its tokenizer with
        // `add_lexer(r'\s+', None)` before any terminal rule from the
        // grammar is registered.
        target_tokenizer
            .add_rule(r"\s+", None)
            .expect("built-in whitespace pattern is valid");

        let mut counters = GroupCounters::new();

        for rule_text in split_rules(text) {
            let (name, body) = split_definition(rule_text)?;

            if !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase()) {
                compile_nonterminal(name, body, &mut rules, &mut symbols, &mut counters, &meta_tokenizer, &meta_symbols)?;
            } else if !name.is_empty() && name.chars().all(|c| c.is_ascii_uppercase()) {
                compile_terminal(name, body, &mut symbols, &mut target_tokenizer)?;
            } else {
                return Err(GrammarError::GrammarSyntax {
                    rule: name.to_string(),
                    message: "rule name must be all lower-case or all upper-case".to_string(),
                });
            }
        }

        let start_rule = rules
            .start_rule()
            .ok_or(GrammarError::NoStartRule)?
            .to_string();

        Ok(Self {
            rules,
            symbols,
            target_tokenizer,
            start_rule,
            collapse: true,
            max_depth: DEFAULT_MAX_DEPTH,
            trace: Trace::None,
        })
    }

    /// Tokenize `text` with the compiled target tokenizer, then match
    /// the start rule against the resulting token stream. A successful
    /// parse always returns an empty `remaining_tokens` — a non-empty
    /// remainder is reported as `UnconsumedInput` instead (spec §4.6,
    /// §8 invariant 7), so the second element of the tuple exists only
    /// to satisfy the public signature named in §6.3.
    pub fn parse(&self, text: &str) -> Result<(CSTNode, Vec<Token>), GrammarError> {
        let tokens = self.target_tokenizer.tokenize(text)?;
        let matcher = Matcher::new(
            &self.rules,
            &self.symbols,
            self.collapse,
            self.max_depth,
            self.trace,
        );
        let (node, pos) = matcher.parse_start(&self.start_rule, &tokens)?;
        if pos != tokens.len() {
            let remaining_preview = tokens[pos..]
                .iter()
                .take(5)
                .map(|t| t.lexeme.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            return Err(GrammarError::UnconsumedInput {
                rule: self.start_rule.clone(),
                remaining_preview,
            });
        }
        Ok((node, Vec::new()))
    }

    /// Toggle tree collapsing (§4.7). Enabled by default.
    pub fn set_collapse(&mut self, collapse: bool) {
        self.collapse = collapse;
    }

    /// The name of the start rule: the first rule defined in the source
    /// text (§3, §6.3).
    pub fn start_rule(&self) -> &str {
        &self.start_rule
    }

    /// Override the recursion-depth bound enforced during matching
    /// (§5). Exceeding it fails with `GrammarTooDeep`.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Attach a trace label (SPEC_FULL §10.1). Absence of a label
    /// (`Trace::None`, the default) means tracing is off.
    pub fn set_trace(&mut self, trace: Trace<&'static str>) {
        self.trace = trace;
    }
}

fn compile_nonterminal(
    name: &str,
    body: &str,
    rules: &mut RuleTable,
    symbols: &mut SymbolTable,
    counters: &mut GroupCounters,
    meta_tokenizer: &Tokenizer,
    meta_symbols: &meta::MetaSymbols,
) -> Result<(), GrammarError> {
    if rules.get(name).is_some() {
        return Err(GrammarError::DuplicateRule {
            name: name.to_string(),
        });
    }

    let meta_tokens = meta_tokenizer.tokenize(body)?;
    let mut deque: VecDeque<Token> = meta_tokens.into();
    let node = parser_node::build(name, &mut deque, None, counters, meta_symbols)?;
    if !deque.is_empty() {
        return Err(GrammarError::GrammarSyntax {
            rule: name.to_string(),
            message: "rule did not process correctly".to_string(),
        });
    }

    rules.insert(name.to_string(), node)?;
    symbols
        .intern(name, false)
        .map_err(|_| GrammarError::DuplicateSymbol {
            name: name.to_string(),
        })?;
    Ok(())
}

fn compile_terminal(
    name: &str,
    body: &str,
    symbols: &mut SymbolTable,
    target_tokenizer: &mut Tokenizer,
) -> Result<(), GrammarError> {
    if let Some(existing) = symbols.lookup(name) {
        return Err(if existing.is_terminal {
            GrammarError::RedefinedTerminal {
                name: name.to_string(),
            }
        } else {
            GrammarError::DuplicateSymbol {
                name: name.to_string(),
            }
        });
    }
    let symbol = symbols
        .intern(name, true)
        .expect("checked above: name is not yet registered");
    target_tokenizer
        .add_rule(body, Some(symbol))
        .map_err(|message| GrammarError::GrammarSyntax {
            rule: name.to_string(),
            message,
        })?;
    Ok(())
}
