//! Generic ordered-pattern tokenizer: component C of the core.
//!
//! Configuration is an ordered list of `(pattern, symbol_name_or_null)`
//! rules. At each position, patterns are tried strictly in insertion
//! order; the first pattern that matches *at* the current position wins
//! and the cursor advances by the match length. A `None` symbol means
//! "skip" (e.g. whitespace). Running out of rules that match at the
//! current position is a [crate::error::GrammarError::LexicalError].
//!
//! The anchoring technique (slice the remaining bytes, match, assert the
//! match starts at zero, advance by its end) is the same one the teacher
//! lineage uses in its regex-backed lexeme implementation.

use crate::error::GrammarError;
use crate::position::Source;
use crate::symbol::Symbol;
use crate::token::Token;
use regex::bytes::Regex;
use std::rc::Rc;

struct Rule {
    pattern: Regex,
    symbol: Option<Rc<Symbol>>,
}

/// An ordered-pattern lexer producing a flat token stream from text.
#[derive(Default)]
pub struct Tokenizer {
    rules: Vec<Rule>,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule. `pattern` is compiled as an unanchored regex, but
    /// the implementation anchors every attempt to the current cursor
    /// position by slicing the remaining input and requiring the match to
    /// start at offset zero.
    pub fn add_rule(&mut self, pattern: &str, symbol: Option<Rc<Symbol>>) -> Result<(), String> {
        let regex = Regex::new(pattern).map_err(|err| {
            format!("invalid pattern {:?} for tokenizer rule: {}", pattern, err)
        })?;
        self.rules.push(Rule {
            pattern: regex,
            symbol,
        });
        Ok(())
    }

    /// Tokenize `text` in full, skipping rules with no symbol. Fails with
    /// `LexicalError` at the first position where no rule matches.
    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>, GrammarError> {
        let bytes = text.as_bytes();
        let source = Source::new(text);
        let mut tokens = Vec::new();
        let mut pointer = 0usize;

        while pointer < bytes.len() {
            let matched = self.rules.iter().find_map(|rule| {
                let slice = &bytes[pointer..];
                let m = rule.pattern.find(slice)?;
                if m.start() != 0 {
                    return None;
                }
                Some((rule, m.end()))
            });

            match matched {
                Some((rule, len)) if len > 0 => {
                    let end = pointer + len;
                    if let Some(symbol) = &rule.symbol {
                        let lexeme = text[pointer..end].to_string();
                        tokens.push(Token::new(symbol.clone(), lexeme, pointer, end));
                    }
                    pointer = end;
                }
                _ => {
                    return Err(GrammarError::LexicalError {
                        offset: pointer,
                        position: source.position(pointer),
                        preview: source.preview(pointer, 20),
                    });
                }
            }
        }

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolTable;

    fn digits_tokenizer() -> (Tokenizer, Rc<Symbol>) {
        let mut table = SymbolTable::new();
        let ws = table.intern("WS", true).unwrap();
        let int = table.intern("INTEGER", true).unwrap();
        let mut tokenizer = Tokenizer::new();
        tokenizer.add_rule(r"\s+", None).unwrap();
        tokenizer.add_rule(r"[0-9]+", Some(int.clone())).unwrap();
        let _ = ws;
        (tokenizer, int)
    }

    #[test]
    fn skips_whitespace_and_tokenizes_runs() {
        let (tokenizer, int) = digits_tokenizer();
        let tokens = tokenizer.tokenize("12 345  6").unwrap();
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| Rc::ptr_eq(&t.symbol, &int)));
        assert_eq!(tokens[0].lexeme, "12");
        assert_eq!(tokens[1].lexeme, "345");
        assert_eq!(tokens[2].lexeme, "6");
    }

    #[test]
    fn first_matching_rule_wins() {
        let mut table = SymbolTable::new();
        let kw = table.intern("LET", true).unwrap();
        let ident = table.intern("IDENT", true).unwrap();
        let mut tokenizer = Tokenizer::new();
        tokenizer.add_rule("let", Some(kw.clone())).unwrap();
        tokenizer.add_rule("[a-z]+", Some(ident)).unwrap();
        let tokens = tokenizer.tokenize("let").unwrap();
        assert_eq!(tokens.len(), 1);
        assert!(Rc::ptr_eq(&tokens[0].symbol, &kw));
    }

    #[test]
    fn unmatched_input_is_lexical_error() {
        let (tokenizer, _) = digits_tokenizer();
        let err = tokenizer.tokenize("12#").unwrap_err();
        assert!(matches!(err, GrammarError::LexicalError { offset: 2, .. }));
    }
}
