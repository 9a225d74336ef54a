//! Parser-node builder: component E of the core.
//!
//! Folds the meta-tokens of one rule body into a [ParserNode] tree:
//! grouping constructs recurse into composite nodes, `OR` marks a node as
//! alternating, closing a group applies suffix rewriting, and anything
//! else becomes a leaf. Transcribed from `make_parser_node` in the
//! original implementation, generalized from Python list-popping into
//! Rust `VecDeque` draining.
//!
//! Alternation is tracked on a node by the separate `alternate` flag
//! below rather than by folding it into `kind`, mirroring
//! `ebnfparser4.py`'s `ParserNode.alternate` boolean living alongside its
//! `repeating`/`optional`/`oneormore` attributes. `kind` alone can be
//! rewritten more than once while a rule body is built (an opener's
//! bracket implies a quantity; a trailing suffix rewrites it again); a
//! flag kept outside of `kind` survives those rewrites intact.

use crate::error::GrammarError;
use crate::meta::MetaSymbols;
use crate::token::Token;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Sequence,
    Repeating,
    Optional,
    AtLeastOnce,
    Rule,
    Literal,
    Term,
    /// Marker child recording an `OR` separator inside an alternating
    /// node; used only to split alternatives at match time (spec §3).
    Or,
}

impl NodeKind {
    pub fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Rule | NodeKind::Literal | NodeKind::Term)
    }
}

/// One compiled grammar fragment: `(token, children[])`, tagged with a
/// [NodeKind] derived from the token's role rather than by inheritance.
#[derive(Debug, Clone)]
pub struct ParserNode {
    pub kind: NodeKind,
    /// Set when an `OR` token was seen directly inside this node's body;
    /// the matcher then splits `children` on the `Or` marker children and
    /// tries each alternative in order instead of matching them all as
    /// one sequence. Independent of `kind` so that it survives the
    /// opener/suffix rewrites applied to `kind` after this node is built
    /// (see module docs).
    pub alternate: bool,
    /// For leaves: the lexeme to match (rule name, literal text, or
    /// terminal symbol name). For composites: the rule/group name used in
    /// diagnostics.
    pub lexeme: String,
    pub children: Vec<ParserNode>,
}

impl ParserNode {
    fn leaf(kind: NodeKind, lexeme: String) -> Self {
        Self {
            kind,
            alternate: false,
            lexeme,
            children: Vec::new(),
        }
    }

    fn composite(kind: NodeKind, lexeme: String, children: Vec<ParserNode>) -> Self {
        Self {
            kind,
            alternate: false,
            lexeme,
            children,
        }
    }
}

/// Per-compile counters disambiguating synthetic group names
/// (`expr-1`, `expr-2`, ...). Scoped to one `Grammar::compile` call
/// rather than a process-wide global, fixing the latent bug spec §9
/// calls out in the original (see DESIGN.md Open Question 4).
#[derive(Default)]
pub struct GroupCounters {
    counts: HashMap<String, u32>,
}

impl GroupCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self, base: &str) -> u32 {
        let entry = self.counts.entry(base.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }
}

enum Opener {
    Group,
    Repeat,
    Optional,
    AtLeastOnce,
}

fn opener_for(meta: &MetaSymbols, token: &Token) -> Option<Opener> {
    if std::rc::Rc::ptr_eq(&token.symbol, &meta.start_group) {
        Some(Opener::Group)
    } else if std::rc::Rc::ptr_eq(&token.symbol, &meta.start_repeat) {
        Some(Opener::Repeat)
    } else if std::rc::Rc::ptr_eq(&token.symbol, &meta.start_optional) {
        Some(Opener::Optional)
    } else if std::rc::Rc::ptr_eq(&token.symbol, &meta.start_atl) {
        Some(Opener::AtLeastOnce)
    } else {
        None
    }
}

fn closer_for(opener: &Opener, meta: &MetaSymbols) -> std::rc::Rc<crate::symbol::Symbol> {
    match opener {
        Opener::Group => meta.end_group.clone(),
        Opener::Repeat => meta.end_repeat.clone(),
        Opener::Optional => meta.end_optional.clone(),
        Opener::AtLeastOnce => meta.end_atl.clone(),
    }
}

fn kind_for_opener(opener: &Opener) -> NodeKind {
    match opener {
        Opener::Group => NodeKind::Sequence,
        Opener::Repeat => NodeKind::Repeating,
        Opener::Optional => NodeKind::Optional,
        Opener::AtLeastOnce => NodeKind::AtLeastOnce,
    }
}

fn is_closer(meta: &MetaSymbols, token: &Token) -> bool {
    [
        &meta.end_group,
        &meta.end_repeat,
        &meta.end_optional,
        &meta.end_atl,
    ]
    .iter()
    .any(|s| std::rc::Rc::ptr_eq(&token.symbol, s))
}

fn suffix_kind(meta: &MetaSymbols, token: &Token) -> Option<NodeKind> {
    if std::rc::Rc::ptr_eq(&token.symbol, &meta.rep) {
        Some(NodeKind::Repeating)
    } else if std::rc::Rc::ptr_eq(&token.symbol, &meta.opt) {
        Some(NodeKind::Optional)
    } else if std::rc::Rc::ptr_eq(&token.symbol, &meta.atl) {
        Some(NodeKind::AtLeastOnce)
    } else {
        None
    }
}

/// Build the parser-node tree for one rule body.
///
/// `end_symbol` is the closer this recursion must terminate on; `None`
/// at the top level, where running out of tokens ends the build
/// successfully and any closer encountered is an error (there is nothing
/// open to close).
pub fn build(
    rule_name: &str,
    tokens: &mut VecDeque<Token>,
    end_symbol: Option<&std::rc::Rc<crate::symbol::Symbol>>,
    counters: &mut GroupCounters,
    meta: &MetaSymbols,
) -> Result<ParserNode, GrammarError> {
    let base_name = rule_name.split('-').next().unwrap_or(rule_name).to_string();
    let mut this = ParserNode::composite(NodeKind::Sequence, rule_name.to_string(), Vec::new());

    loop {
        let Some(first) = tokens.front() else {
            if end_symbol.is_some() {
                return Err(GrammarError::GrammarSyntax {
                    rule: rule_name.to_string(),
                    message: "unterminated rule".to_string(),
                });
            }
            return Ok(this);
        };

        if let Some(opener) = opener_for(meta, first) {
            tokens.pop_front();
            let index = counters.next(&base_name);
            let child_name = format!("{}-{}", base_name, index);
            let closer = closer_for(&opener, meta);
            let mut child = build(&child_name, tokens, Some(&closer), counters, meta)?;
            // Bracket openers (`{`/`[`/`<`) imply their quantity directly;
            // a plain group (`(`) carries no quantity of its own, so its
            // kind is whatever the recursion already resolved (Sequence,
            // or Repeating/Optional/AtLeastOnce from a trailing suffix
            // handled inside that recursive call, just below). Forcing it
            // here as well would clobber that suffix rewrite.
            if !matches!(opener, Opener::Group) {
                child.kind = kind_for_opener(&opener);
            }
            this.children.push(child);
            continue;
        }

        if is_closer(meta, first) {
            let closer_token = tokens.pop_front().unwrap();
            match end_symbol {
                Some(expected) if std::rc::Rc::ptr_eq(expected, &closer_token.symbol) => {}
                Some(expected) => {
                    return Err(GrammarError::GrammarSyntax {
                        rule: rule_name.to_string(),
                        message: format!(
                            "expected {} to close group, got {}",
                            expected.name, closer_token.symbol.name
                        ),
                    });
                }
                None => {
                    return Err(GrammarError::GrammarSyntax {
                        rule: rule_name.to_string(),
                        message: format!(
                            "unexpected closing {} at top level",
                            closer_token.symbol.name
                        ),
                    });
                }
            }

            let used_brackets = std::rc::Rc::ptr_eq(&closer_token.symbol, &meta.end_repeat)
                || std::rc::Rc::ptr_eq(&closer_token.symbol, &meta.end_optional);

            if let Some(next) = tokens.front() {
                if let Some(rewritten) = suffix_kind(meta, next) {
                    if used_brackets {
                        return Err(GrammarError::GrammarSyntax {
                            rule: rule_name.to_string(),
                            message: "illegal mix of brackets and suffixes".to_string(),
                        });
                    }
                    this.kind = rewritten;
                    tokens.pop_front();
                }
            }

            return Ok(this);
        }

        if std::rc::Rc::ptr_eq(&first.symbol, &meta.or) {
            this.alternate = true;
            this.children.push(ParserNode::leaf(NodeKind::Or, "|".to_string()));
            tokens.pop_front();
            continue;
        }

        let token = tokens.pop_front().unwrap();
        let leaf_kind = if std::rc::Rc::ptr_eq(&token.symbol, &meta.rule) {
            NodeKind::Rule
        } else if std::rc::Rc::ptr_eq(&token.symbol, &meta.literal) {
            NodeKind::Literal
        } else {
            NodeKind::Term
        };
        let lexeme = if leaf_kind == NodeKind::Literal {
            crate::meta::unquote(&token.lexeme).to_string()
        } else {
            token.lexeme.clone()
        };
        this.children.push(ParserNode::leaf(leaf_kind, lexeme));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta;

    fn build_rule(name: &str, body: &str) -> ParserNode {
        let (tokenizer, symbols, _table) = meta::build();
        let tokens = tokenizer.tokenize(body).unwrap();
        let mut deque: VecDeque<Token> = tokens.into();
        let mut counters = GroupCounters::new();
        build(name, &mut deque, None, &mut counters, &symbols).unwrap()
    }

    #[test]
    fn plain_sequence_of_leaves() {
        let node = build_rule("pair", "a b");
        assert_eq!(node.kind, NodeKind::Sequence);
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].kind, NodeKind::Rule);
        assert_eq!(node.children[0].lexeme, "a");
    }

    #[test]
    fn or_sets_the_alternate_flag() {
        let node = build_rule("r", r#""a" | "ab""#);
        assert_eq!(node.kind, NodeKind::Sequence);
        assert!(node.alternate);
        assert_eq!(node.children.len(), 3);
        assert_eq!(node.children[1].kind, NodeKind::Or);
    }

    #[test]
    fn group_suffix_equivalence_star_vs_braces() {
        let braces = build_rule("r", r#"{"a"}"#);
        let star = build_rule("r", r#"("a")*"#);
        assert_eq!(braces.children[0].kind, NodeKind::Repeating);
        assert_eq!(star.children[0].kind, NodeKind::Repeating);
    }

    #[test]
    fn group_preserves_suffix_rewrite_against_opener_overwrite() {
        // Regression test: a parenthesized group's own opener must not
        // clobber the quantity its closer already rewrote via a trailing
        // suffix (`("a")*` must behave exactly like `{"a"}`, not match
        // exactly once).
        let star = build_rule("r", r#"("a")*"#);
        assert_eq!(star.kind, NodeKind::Sequence);
        assert_eq!(star.children.len(), 1);
        assert_eq!(star.children[0].kind, NodeKind::Repeating);
        assert!(!star.children[0].alternate);
    }

    #[test]
    fn group_alternation_survives_opener_overwrite() {
        // Regression test: `(a|b)` inside the rule body must keep its
        // `alternate` flag after the outer opener processing runs,
        // instead of being clobbered back to a plain sequence.
        let node = build_rule("r", r#"("a"|"b")"#);
        assert_eq!(node.children.len(), 1);
        let group = &node.children[0];
        assert_eq!(group.kind, NodeKind::Sequence);
        assert!(group.alternate);
        assert_eq!(group.children.len(), 3);
    }

    #[test]
    fn bracket_group_alternation_and_suffix_combine() {
        // `("a"|"b")*` must both alternate per iteration and repeat
        // zero-or-more times.
        let node = build_rule("r", r#"("a"|"b")*"#);
        let group = &node.children[0];
        assert_eq!(group.kind, NodeKind::Repeating);
        assert!(group.alternate);
    }

    #[test]
    fn illegal_mix_of_brackets_and_suffix_is_rejected() {
        let (tokenizer, symbols, _table) = meta::build();
        let tokens = tokenizer.tokenize(r#"{"a"}*"#).unwrap();
        let mut deque: VecDeque<Token> = tokens.into();
        let mut counters = GroupCounters::new();
        let err = build("r", &mut deque, None, &mut counters, &symbols).unwrap_err();
        match err {
            GrammarError::GrammarSyntax { message, .. } => {
                assert!(message.contains("illegal mix"));
            }
            other => panic!("expected GrammarSyntax, got {:?}", other),
        }
    }

    #[test]
    fn per_rule_group_counters_are_independent() {
        let a = build_rule("expr", r#"("x") ("y")"#);
        let b = build_rule("expr", r#"("z")"#);
        assert_eq!(a.children[0].lexeme, "expr-1");
        assert_eq!(a.children[1].lexeme, "expr-2");
        assert_eq!(b.children[0].lexeme, "expr-1");
    }
}
