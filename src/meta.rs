//! Meta-grammar (REBNF) lexer: component D of the core.
//!
//! A fixed instance of the generic [crate::tokenizer::Tokenizer],
//! configured with the REBNF meta-syntax rules in the exact order spec
//! §4.3 requires, plus handles for the reserved meta-lexer symbols the
//! parser-node builder (component E) dispatches on.

use crate::symbol::{Symbol, SymbolTable};
use crate::tokenizer::Tokenizer;
use std::rc::Rc;

/// The symbols the meta-lexer and parser-node builder need to recognize
/// by identity. All are terminal symbols of the meta-grammar itself, not
/// of any grammar the meta-grammar compiles.
pub struct MetaSymbols {
    pub rule: Rc<Symbol>,
    pub term: Rc<Symbol>,
    pub literal: Rc<Symbol>,
    pub start_repeat: Rc<Symbol>,
    pub end_repeat: Rc<Symbol>,
    pub start_group: Rc<Symbol>,
    pub end_group: Rc<Symbol>,
    pub start_optional: Rc<Symbol>,
    pub end_optional: Rc<Symbol>,
    pub start_atl: Rc<Symbol>,
    pub end_atl: Rc<Symbol>,
    pub or: Rc<Symbol>,
    pub define: Rc<Symbol>,
    pub end_define: Rc<Symbol>,
    pub rep: Rc<Symbol>,
    pub opt: Rc<Symbol>,
    pub atl: Rc<Symbol>,
}

impl MetaSymbols {
    fn intern(table: &mut SymbolTable) -> Self {
        let mut s = |name: &str| table.intern(name, true).expect("meta symbols are unique");
        Self {
            rule: s("RULE"),
            term: s("TERM"),
            literal: s("LITERAL"),
            start_repeat: s("STARTREPEAT"),
            end_repeat: s("ENDREPEAT"),
            start_group: s("STARTGROUP"),
            end_group: s("ENDGROUP"),
            start_optional: s("STARTOPTIONAL"),
            end_optional: s("ENDOPTIONAL"),
            start_atl: s("STARTATL"),
            end_atl: s("ENDATL"),
            or: s("OR"),
            define: s("DEFINE"),
            end_define: s("ENDDEFINE"),
            rep: s("REP"),
            opt: s("OPT"),
            atl: s("ATL"),
        }
    }
}

/// Build the fixed REBNF meta-lexer together with the symbol handles it
/// emits. Rule order matches spec §4.3 exactly: whitespace is skipped
/// first, then lower-case rule names, upper-case terminal names, quoted
/// literals, the eight bracket characters, `|`, `:=`/`;`, and finally the
/// suffix characters `*`/`?`/`+`.
///
/// The grammar compiler (component F) never actually feeds this lexer a
/// rule's `NAME := BODY ;` header — it splits those off with plain string
/// operations first, the same way the original implementation does — so
/// `DEFINE`/`ENDDEFINE` tokens are never produced in practice. They are
/// registered anyway for fidelity to §4.3's exact rule list.
pub fn build() -> (Tokenizer, MetaSymbols, SymbolTable) {
    let mut table = SymbolTable::new();
    let symbols = MetaSymbols::intern(&mut table);
    let mut tokenizer = Tokenizer::new();

    tokenizer.add_rule(r"\s+", None).unwrap();
    tokenizer.add_rule(r"[a-z]+", Some(symbols.rule.clone())).unwrap();
    tokenizer.add_rule(r"[A-Z]+", Some(symbols.term.clone())).unwrap();
    tokenizer
        .add_rule(r#""([^"]*)""#, Some(symbols.literal.clone()))
        .unwrap();
    tokenizer
        .add_rule(r"\{", Some(symbols.start_repeat.clone()))
        .unwrap();
    tokenizer
        .add_rule(r"\}", Some(symbols.end_repeat.clone()))
        .unwrap();
    tokenizer
        .add_rule(r"\(", Some(symbols.start_group.clone()))
        .unwrap();
    tokenizer
        .add_rule(r"\)", Some(symbols.end_group.clone()))
        .unwrap();
    tokenizer
        .add_rule(r"\[", Some(symbols.start_optional.clone()))
        .unwrap();
    tokenizer
        .add_rule(r"\]", Some(symbols.end_optional.clone()))
        .unwrap();
    tokenizer
        .add_rule(r"<", Some(symbols.start_atl.clone()))
        .unwrap();
    tokenizer
        .add_rule(r">", Some(symbols.end_atl.clone()))
        .unwrap();
    tokenizer.add_rule(r"\|", Some(symbols.or.clone())).unwrap();
    tokenizer
        .add_rule(r":=", Some(symbols.define.clone()))
        .unwrap();
    tokenizer
        .add_rule(r";", Some(symbols.end_define.clone()))
        .unwrap();
    tokenizer.add_rule(r"\*", Some(symbols.rep.clone())).unwrap();
    tokenizer.add_rule(r"\?", Some(symbols.opt.clone())).unwrap();
    tokenizer.add_rule(r"\+", Some(symbols.atl.clone())).unwrap();

    (tokenizer, symbols, table)
}

/// Strip the surrounding quotes a `LITERAL` token's lexeme was matched
/// with (the meta-lexer pattern captures them as part of the match; the
/// stored lexeme must have them removed, per spec §4.3).
pub fn unquote(lexeme: &str) -> &str {
    lexeme
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(lexeme)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_a_simple_rule_body() {
        let (tokenizer, symbols, _table) = build();
        let tokens = tokenizer.tokenize(r#"term {("+"|"-") term}"#).unwrap();
        let names: Vec<&str> = tokens.iter().map(|t| t.symbol.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "RULE",
                "STARTREPEAT",
                "STARTGROUP",
                "LITERAL",
                "OR",
                "LITERAL",
                "ENDGROUP",
                "RULE",
                "ENDREPEAT",
            ]
        );
        assert!(tokens[0].symbol.is_terminal);
        let _ = symbols;
    }

    #[test]
    fn literal_lexeme_keeps_quotes_until_unquoted() {
        let (tokenizer, _symbols, _table) = build();
        let tokens = tokenizer.tokenize(r#""ab""#).unwrap();
        assert_eq!(tokens[0].lexeme, r#""ab""#);
        assert_eq!(unquote(&tokens[0].lexeme), "ab");
    }

    #[test]
    fn suffix_characters_recognized() {
        let (tokenizer, _symbols, _table) = build();
        let tokens = tokenizer.tokenize(r#"(a)* [b]? <c>+"#).unwrap();
        let names: Vec<&str> = tokens.iter().map(|t| t.symbol.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "STARTGROUP",
                "RULE",
                "ENDGROUP",
                "REP",
                "STARTOPTIONAL",
                "RULE",
                "ENDOPTIONAL",
                "OPT",
                "STARTATL",
                "RULE",
                "ENDATL",
                "ATL",
            ]
        );
    }
}
