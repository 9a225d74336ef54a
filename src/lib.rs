//! A grammar-driven parser generator.
//!
//! Compiles an REBNF ("rule EBNF") meta-grammar into:
//!
//! - a *target tokenizer* derived from the grammar's own upper-case
//!   terminal definitions, plus an implicit whitespace-skip rule
//!   (grammar authors never need to declare `\s+` themselves), and
//! - a *rule table* of [ParserNode](parser_node::ParserNode) trees, one
//!   per lower-case non-terminal rule.
//!
//! [Grammar::parse] then runs a recursive-descent matcher over that
//! table to turn target-language text into a [CSTNode].
//!
//! ```
//! use rebnf::Grammar;
//!
//! let grammar = Grammar::compile(
//!     r#"
//!     expr := term {("+" | "-") term};
//!     term := factor {("*" | "/") factor};
//!     factor := INTEGER | "(" expr ")";
//!     INTEGER := [0-9]+;
//!     "#,
//! )
//! .unwrap();
//!
//! let (cst, remaining) = grammar.parse("2 + 3 * 4").unwrap();
//! assert!(remaining.is_empty());
//! assert_eq!(cst.token.symbol.name, "expr");
//! ```
//!
//! # Components
//!
//! | module | role |
//! |---|---|
//! | [symbol] | interned, pointer-equal grammar symbols |
//! | [token] | `(symbol, lexeme, span)` records |
//! | [position] | line/column lookup and error previews over source text |
//! | [tokenizer] | generic ordered-pattern lexer used for both meta- and target-language tokenizing |
//! | [meta] | the fixed REBNF meta-lexer |
//! | [parser_node] | folds one rule body's meta-tokens into a tree |
//! | [cst] | the matcher's output tree |
//! | [matcher] | recursive-descent matching of a token stream against a rule table |
//! | [error] | the unified error taxonomy |
//! | [trace] | optional debug-gated diagnostic trail |
//! | [grammar] | ties the above into the public [Grammar] API |

mod cst;
mod error;
mod grammar;
mod matcher;
mod meta;
mod parser_node;
mod position;
mod symbol;
mod token;
mod tokenizer;
mod trace;

pub use cst::CSTNode;
pub use error::GrammarError;
pub use grammar::Grammar;
pub use symbol::Symbol;
pub use token::Token;
pub use trace::Trace;
