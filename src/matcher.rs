//! CST matcher: component G of the core, by far the largest piece.
//!
//! A recursive-descent engine over the [ParserNode] trees built by
//! component E, driven by a flat token slice and an index cursor rather
//! than the original's list-popping, since slice indexing backtracks for
//! free (just restore the index) without needing to clone token lists.
//!
//! Transcribed from `EBNFParser.match`/`match_terminal`/`match_nonterminal`/
//! `match_sequence`/`match_alternate`/`match_optional`/`match_repeating`/
//! `match_one_or_more` in `brutus/ebnf.py`, with the `(ok, node, tokens)`
//! Python control-flow triple realized as `Result<Outcome, GrammarError>`
//! where a recoverable non-match is `Outcome::NoMatch` (never a thrown
//! error) and a hard failure is `Err`.
//!
//! One structural difference from the source worth calling out: the
//! original always builds a one-child wrapper `CSTNode` per matched
//! parser-node and then immediately splices its `children` into the
//! caller's flat list (`found.extend(node.children)`), so a bracket
//! group's own wrapper node never survives into the output tree — only
//! a named rule's own wrapper (built once per `match_rule` call) does.
//! This file reproduces that splicing rule directly: composite children
//! nested *inside* the same rule (sequence/repeat/optional/at-least-once
//! groups) have their matched children inlined into the enclosing
//! sequence's flat list, while a `RULE` leaf crossing into another named
//! rule keeps that rule's own wrapper node (subject to collapsing,
//! §4.7).

use crate::cst::CSTNode;
use crate::error::GrammarError;
use crate::grammar::RuleTable;
use crate::parser_node::{NodeKind, ParserNode};
use crate::symbol::SymbolTable;
use crate::token::Token;
use crate::trace::Trace;

/// Outcome of matching one parser-node against the token stream starting
/// at some cursor. `NoMatch` is the internal, non-`Error` control signal
/// spec §7 requires: it must never escape as a hard error, only as this
/// variant, recovered by the nearest `ALTERNATING`/`OPTIONAL`/`REPEATING`
/// ancestor.
enum Outcome {
    Matched(CSTNode, usize),
    NoMatch,
}

/// Outcome of matching an ordered list of sibling parser-nodes (a
/// rule body, or the body of a bracket group) against the stream.
enum SeqOutcome {
    Matched(Vec<CSTNode>, usize),
    NoMatch,
}

pub(crate) struct Matcher<'g> {
    rules: &'g RuleTable,
    symbols: &'g SymbolTable,
    collapse: bool,
    max_depth: usize,
    trace: Trace<&'static str>,
}

/// Strip a synthetic group-name suffix (`expr-1` -> `expr`) to recover
/// the owning rule's base name, the same lookup key used for the output
/// wrapper's symbol (spec §4.4, §9 "Suffix rewriting").
fn base_name(lexeme: &str) -> &str {
    lexeme.split('-').next().unwrap_or(lexeme)
}

fn split_alternatives(children: &[ParserNode]) -> Vec<&[ParserNode]> {
    let mut groups = Vec::new();
    let mut start = 0;
    for (i, child) in children.iter().enumerate() {
        if child.kind == NodeKind::Or {
            groups.push(&children[start..i]);
            start = i + 1;
        }
    }
    groups.push(&children[start..]);
    groups
}

impl<'g> Matcher<'g> {
    pub(crate) fn new(
        rules: &'g RuleTable,
        symbols: &'g SymbolTable,
        collapse: bool,
        max_depth: usize,
        trace: Trace<&'static str>,
    ) -> Self {
        Self {
            rules,
            symbols,
            collapse,
            max_depth,
            trace,
        }
    }

    /// Match the start rule against the full token slice. A top-level
    /// `NoMatch` has nothing left to recover it — spec §7 has no internal
    /// signal that may surface publicly, so it is reported as
    /// `UnexpectedEndOfInput`, naming the rule that could not be matched.
    pub(crate) fn parse_start(
        &self,
        start_rule: &str,
        tokens: &[Token],
    ) -> Result<(CSTNode, usize), GrammarError> {
        match self.match_rule(start_rule, tokens, 0, 1)? {
            Outcome::Matched(node, pos) => Ok((node, pos)),
            Outcome::NoMatch => Err(GrammarError::UnexpectedEndOfInput {
                rule: start_rule.to_string(),
            }),
        }
    }

    fn match_rule(
        &self,
        name: &str,
        tokens: &[Token],
        pos: usize,
        depth: usize,
    ) -> Result<Outcome, GrammarError> {
        if depth > self.max_depth {
            return Err(GrammarError::GrammarTooDeep {
                rule: name.to_string(),
                depth,
            });
        }
        #[cfg(debug_assertions)]
        self.trace
            .entering_rule(depth, name, tokens.len().saturating_sub(pos));

        let root = self
            .rules
            .get(name)
            .ok_or_else(|| GrammarError::UnknownRule {
                name: name.to_string(),
            })?;
        let outcome = self.match_composite(root, tokens, pos, depth + 1)?;

        #[cfg(debug_assertions)]
        self.trace
            .matched(depth, name, matches!(outcome, Outcome::Matched(..)));

        Ok(outcome)
    }

    /// Dispatch a leaf parser-node (`RULE`/`LITERAL`/`TERM`) against the
    /// token at `pos`. Precondition: `pos < tokens.len()` (callers check
    /// this before dispatching, per spec §7's `UnexpectedEndOfInput`
    /// handling at the sequence level).
    fn match_leaf(
        &self,
        node: &ParserNode,
        tokens: &[Token],
        pos: usize,
        depth: usize,
    ) -> Result<Outcome, GrammarError> {
        match node.kind {
            NodeKind::Rule => match self.match_rule(&node.lexeme, tokens, pos, depth)? {
                Outcome::NoMatch => Ok(Outcome::NoMatch),
                Outcome::Matched(wrapper, new_pos) => {
                    let contributed = if self.collapse && wrapper.children.len() == 1 {
                        wrapper.children.into_iter().next().unwrap()
                    } else {
                        wrapper
                    };
                    Ok(Outcome::Matched(contributed, new_pos))
                }
            },
            NodeKind::Literal => {
                let token = &tokens[pos];
                if token.lexeme == node.lexeme {
                    Ok(Outcome::Matched(CSTNode::leaf(token.clone()), pos + 1))
                } else {
                    Ok(Outcome::NoMatch)
                }
            }
            NodeKind::Term => {
                let token = &tokens[pos];
                if token.symbol.name == node.lexeme {
                    Ok(Outcome::Matched(CSTNode::leaf(token.clone()), pos + 1))
                } else {
                    Ok(Outcome::NoMatch)
                }
            }
            _ => unreachable!("match_leaf called on a non-leaf parser-node"),
        }
    }

    /// Dispatch a composite parser-node (`SEQUENCE`/`REPEATING`/
    /// `OPTIONAL`/`ATLEASTONCE`), building its wrapper `CSTNode` on
    /// success. Used both for a named rule's own root node and for
    /// nested bracket groups — the two are indistinguishable here,
    /// matching the source's uniform treatment of both through
    /// `match_nonterminal`. Alternation is orthogonal to this dispatch:
    /// whatever `kind` says about how many times to attempt the body,
    /// [Matcher::match_body] decides, via `node.alternate`, whether one
    /// attempt means "match all children in order" or "try each
    /// `OR`-separated alternative in turn" (spec §3, §4.6).
    fn match_composite(
        &self,
        node: &ParserNode,
        tokens: &[Token],
        pos: usize,
        depth: usize,
    ) -> Result<Outcome, GrammarError> {
        if depth > self.max_depth {
            return Err(GrammarError::GrammarTooDeep {
                rule: node.lexeme.clone(),
                depth,
            });
        }
        match node.kind {
            NodeKind::Sequence => match self.match_body(node, tokens, pos, depth)? {
                SeqOutcome::Matched(children, new_pos) => Ok(Outcome::Matched(
                    self.wrap(node, children, tokens, pos),
                    new_pos,
                )),
                SeqOutcome::NoMatch => Ok(Outcome::NoMatch),
            },
            NodeKind::Repeating => {
                let mut children = Vec::new();
                let mut cursor = pos;
                loop {
                    match self.match_body(node, tokens, cursor, depth)? {
                        SeqOutcome::Matched(more, new_pos) => {
                            let progressed = new_pos > cursor;
                            children.extend(more);
                            cursor = new_pos;
                            if !progressed {
                                // A zero-width iteration matched; looping
                                // again would repeat it forever.
                                break;
                            }
                        }
                        SeqOutcome::NoMatch => break,
                    }
                }
                if children.is_empty() {
                    Ok(Outcome::NoMatch)
                } else {
                    Ok(Outcome::Matched(
                        self.wrap(node, children, tokens, pos),
                        cursor,
                    ))
                }
            }
            NodeKind::Optional => match self.match_body(node, tokens, pos, depth)? {
                SeqOutcome::Matched(children, new_pos) => Ok(Outcome::Matched(
                    self.wrap(node, children, tokens, pos),
                    new_pos,
                )),
                SeqOutcome::NoMatch => Ok(Outcome::NoMatch),
            },
            NodeKind::AtLeastOnce => match self.match_body(node, tokens, pos, depth)? {
                SeqOutcome::NoMatch => Err(GrammarError::RequiredGroupMissing {
                    rule: node.lexeme.clone(),
                }),
                SeqOutcome::Matched(first, first_pos) => {
                    let mut children = first;
                    let mut cursor = first_pos;
                    loop {
                        match self.match_body(node, tokens, cursor, depth)? {
                            SeqOutcome::Matched(more, new_pos) => {
                                let progressed = new_pos > cursor;
                                children.extend(more);
                                cursor = new_pos;
                                if !progressed {
                                    break;
                                }
                            }
                            SeqOutcome::NoMatch => break,
                        }
                    }
                    Ok(Outcome::Matched(
                        self.wrap(node, children, tokens, pos),
                        cursor,
                    ))
                }
            },
            _ => unreachable!("match_composite called on a leaf or marker parser-node"),
        }
    }

    /// Match one attempt of a composite node's body: if `node.alternate`
    /// is set (an `OR` token appeared directly in this node), split the
    /// children on their `Or` markers and try each alternative in order,
    /// first full match wins; otherwise match all children as one plain
    /// sequence. Called once per iteration by [Matcher::match_composite],
    /// so a node that is both alternating and repeating/optional/
    /// at-least-once (e.g. `("a"|"b")*`) re-chooses its alternative fresh
    /// on every iteration.
    fn match_body(
        &self,
        node: &ParserNode,
        tokens: &[Token],
        pos: usize,
        depth: usize,
    ) -> Result<SeqOutcome, GrammarError> {
        if node.alternate {
            for alternative in split_alternatives(&node.children) {
                match self.match_sequence_children(alternative, tokens, pos, depth)? {
                    matched @ SeqOutcome::Matched(..) => return Ok(matched),
                    SeqOutcome::NoMatch => continue,
                }
            }
            Ok(SeqOutcome::NoMatch)
        } else {
            self.match_sequence_children(&node.children, tokens, pos, depth)
        }
    }

    /// Match an ordered list of sibling parser-nodes (one rule body, or
    /// one bracket group's body) against the stream starting at `pos`.
    ///
    /// This is where the redesign of spec §9's ambiguous source behavior
    /// lives: an `OPTIONAL`/`REPEATING` child that matches zero times (or
    /// that has no tokens left to even attempt) does not abort the
    /// sequence — it contributes nothing and matching continues with the
    /// next sibling, per spec §4.6's OPTIONAL/REPEATING entries.
    fn match_sequence_children(
        &self,
        children: &[ParserNode],
        tokens: &[Token],
        start_pos: usize,
        depth: usize,
    ) -> Result<SeqOutcome, GrammarError> {
        let mut pos = start_pos;
        let mut found = Vec::new();

        for child in children {
            if pos >= tokens.len() {
                match child.kind {
                    NodeKind::AtLeastOnce => {
                        return Err(GrammarError::RequiredGroupMissing {
                            rule: child.lexeme.clone(),
                        });
                    }
                    NodeKind::Optional | NodeKind::Repeating => continue,
                    _ => return Ok(SeqOutcome::NoMatch),
                }
            }

            let outcome = if child.kind.is_leaf() {
                self.match_leaf(child, tokens, pos, depth + 1)?
            } else {
                self.match_composite(child, tokens, pos, depth + 1)?
            };

            match outcome {
                Outcome::Matched(matched, new_pos) => {
                    if child.kind.is_leaf() {
                        found.push(matched);
                    } else {
                        // Inline a nested group's own children directly;
                        // its wrapper node never survives (see module docs).
                        found.extend(matched.children);
                    }
                    pos = new_pos;
                }
                Outcome::NoMatch => match child.kind {
                    NodeKind::Optional | NodeKind::Repeating => continue,
                    _ => return Ok(SeqOutcome::NoMatch),
                },
            }
        }

        Ok(SeqOutcome::Matched(found, pos))
    }

    /// Build the wrapper `CSTNode` for a matched composite parser-node.
    /// Its symbol is the owning rule's own symbol (subgroup names like
    /// `expr-1` resolve to `expr`'s symbol, per spec §4.4/§9), and its
    /// span covers the matched children, falling back to a zero-width
    /// span at the current cursor when nothing was consumed.
    fn wrap(
        &self,
        node: &ParserNode,
        children: Vec<CSTNode>,
        tokens: &[Token],
        start_pos: usize,
    ) -> CSTNode {
        let symbol = self
            .symbols
            .lookup(base_name(&node.lexeme))
            .expect("rule symbol was interned when the rule was compiled");
        let (start, end) = match (children.first(), children.last()) {
            (Some(first), Some(last)) => (first.token.start, last.token.end),
            _ => {
                if start_pos < tokens.len() {
                    (tokens[start_pos].start, tokens[start_pos].start)
                } else if let Some(last) = tokens.last() {
                    (last.end, last.end)
                } else {
                    (0, 0)
                }
            }
        };
        CSTNode::new(Token::new(symbol, node.lexeme.clone(), start, end), children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Grammar;

    fn leaves_of(node: &CSTNode) -> Vec<String> {
        node.leaves().iter().map(|t| t.lexeme.clone()).collect()
    }

    #[test]
    fn sequence_matches_children_in_order() {
        let grammar = Grammar::compile(r#"pair := "a" "b"; CHAR := [a-zA-Z];"#).unwrap();
        let (cst, remaining) = grammar.parse("a b").unwrap();
        assert!(remaining.is_empty());
        assert_eq!(leaves_of(&cst), vec!["a", "b"]);
    }

    #[test]
    fn alternating_picks_first_matching_alternative() {
        let grammar = Grammar::compile(r#"r := "a" | "b"; CHAR := [a-zA-Z];"#).unwrap();
        let (cst, _) = grammar.parse("b").unwrap();
        assert_eq!(leaves_of(&cst), vec!["b"]);
    }

    #[test]
    fn optional_matches_zero_times_without_aborting_sequence() {
        let grammar = Grammar::compile(r#"r := "a" ["b"] "c"; CHAR := [a-zA-Z];"#).unwrap();
        let (cst, remaining) = grammar.parse("a c").unwrap();
        assert!(remaining.is_empty());
        assert_eq!(leaves_of(&cst), vec!["a", "c"]);
    }

    #[test]
    fn optional_matches_once_when_present() {
        let grammar = Grammar::compile(r#"r := "a" ["b"] "c"; CHAR := [a-zA-Z];"#).unwrap();
        let (cst, _) = grammar.parse("a b c").unwrap();
        assert_eq!(leaves_of(&cst), vec!["a", "b", "c"]);
    }

    #[test]
    fn repeating_matches_zero_or_more_without_aborting_sequence() {
        let grammar = Grammar::compile(r#"r := "a" {"b"} "c"; CHAR := [a-zA-Z];"#).unwrap();
        let (cst, remaining) = grammar.parse("a c").unwrap();
        assert!(remaining.is_empty());
        assert_eq!(leaves_of(&cst), vec!["a", "c"]);

        let (cst2, _) = grammar.parse("a b b b c").unwrap();
        assert_eq!(leaves_of(&cst2), vec!["a", "b", "b", "b", "c"]);
    }

    #[test]
    fn at_least_once_requires_one_match() {
        let grammar = Grammar::compile(r#"r := <"a">; CHAR := [a-zA-Z];"#).unwrap();
        let err = grammar.parse("").unwrap_err();
        assert!(matches!(err, GrammarError::RequiredGroupMissing { .. }));
    }

    #[test]
    fn at_least_once_matches_repeatedly() {
        let grammar = Grammar::compile(r#"r := <"a">; CHAR := [a-zA-Z];"#).unwrap();
        let (cst, remaining) = grammar.parse("a a a").unwrap();
        assert!(remaining.is_empty());
        assert_eq!(leaves_of(&cst), vec!["a", "a", "a"]);
    }

    #[test]
    fn rule_reference_collapses_single_child_wrapper() {
        let grammar =
            Grammar::compile(r#"expr := term; term := factor; factor := INTEGER; INTEGER := [0-9]+;"#)
                .unwrap();
        let (cst, _) = grammar.parse("7").unwrap();
        assert_eq!(cst.token.symbol.name, "INTEGER");
        assert_eq!(cst.token.lexeme, "7");
    }

    #[test]
    fn unconsumed_input_is_reported() {
        let grammar = Grammar::compile(r#"r := "a" | "ab"; CHAR := [a-zA-Z];"#).unwrap();
        let err = grammar.parse("ab").unwrap_err();
        assert!(matches!(err, GrammarError::UnconsumedInput { .. }));
    }
}
