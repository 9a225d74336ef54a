//! Error taxonomy unifying every failure kind named in the spec (§7).
//!
//! `Display` impls are hand-written, matching the teacher's ambient
//! choice of plain `Display`-based errors with no external error crate
//! and no backtrace capture.

use crate::position::Position;
use std::fmt::{self, Display, Formatter};

#[derive(Debug)]
pub enum GrammarError {
    DuplicateRule {
        name: String,
    },
    DuplicateSymbol {
        name: String,
    },
    RedefinedTerminal {
        name: String,
    },
    GrammarSyntax {
        rule: String,
        message: String,
    },
    LexicalError {
        offset: usize,
        position: Position,
        preview: String,
    },
    UnexpectedEndOfInput {
        rule: String,
    },
    RequiredGroupMissing {
        rule: String,
    },
    UnconsumedInput {
        rule: String,
        remaining_preview: String,
    },
    GrammarTooDeep {
        rule: String,
        depth: usize,
    },
    NoStartRule,
    UnknownRule {
        name: String,
    },
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::DuplicateRule { name } => {
                write!(f, "duplicate rule definition: {}", name)
            }
            GrammarError::DuplicateSymbol { name } => {
                write!(f, "duplicate symbol: {}", name)
            }
            GrammarError::RedefinedTerminal { name } => {
                write!(f, "terminal {} redefined", name)
            }
            GrammarError::GrammarSyntax { rule, message } => {
                write!(f, "grammar syntax error in rule {}: {}", rule, message)
            }
            GrammarError::LexicalError {
                position, preview, ..
            } => write!(f, "lexical error at {}: {:?}...", position, preview),
            GrammarError::UnexpectedEndOfInput { rule } => {
                write!(f, "unexpected end of input while matching {}", rule)
            }
            GrammarError::RequiredGroupMissing { rule } => {
                write!(f, "expected at least one match of {}", rule)
            }
            GrammarError::UnconsumedInput {
                rule,
                remaining_preview,
            } => write!(
                f,
                "unconsumed input after matching {}: {:?}...",
                rule, remaining_preview
            ),
            GrammarError::GrammarTooDeep { rule, depth } => write!(
                f,
                "recursion depth exceeded ({}) while matching {}",
                depth, rule
            ),
            GrammarError::NoStartRule => write!(f, "grammar has no start rule"),
            GrammarError::UnknownRule { name } => write!(f, "no rule named {}", name),
        }
    }
}

impl std::error::Error for GrammarError {}
