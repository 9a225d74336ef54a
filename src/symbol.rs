//! Symbol interning: component A of the core (see crate-level docs).
//!
//! A [Symbol] is identified by `(name, is_terminal)`. The [SymbolTable]
//! keeps exactly one canonical, ref-counted instance per name so that later
//! comparisons between symbols are pointer/id equality rather than string
//! comparison, per the "Symbol identity via interning" design note.

use std::collections::HashMap;
use std::fmt::{self, Display};
use std::rc::Rc;

#[derive(Debug, Eq)]
pub struct Symbol {
    pub name: String,
    pub is_terminal: bool,
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (self as *const Symbol).hash(state)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Registry of interned symbols for one compiled grammar.
///
/// Invariant: no symbol name is registered twice with a different kind
/// (see spec §4.1 / §3).
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, Rc<Symbol>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            symbols: HashMap::new(),
        }
    }

    /// Intern `name` as a symbol of the given kind. Returns the canonical
    /// handle. Fails if `name` is already registered with a different
    /// `is_terminal` kind.
    pub fn intern(&mut self, name: &str, is_terminal: bool) -> Result<Rc<Symbol>, String> {
        if let Some(existing) = self.symbols.get(name) {
            if existing.is_terminal != is_terminal {
                return Err(format!(
                    "symbol {} already registered as {}",
                    name,
                    if existing.is_terminal {
                        "terminal"
                    } else {
                        "non-terminal"
                    }
                ));
            }
            return Ok(existing.clone());
        }
        let symbol = Rc::new(Symbol {
            name: name.to_string(),
            is_terminal,
        });
        self.symbols.insert(name.to_string(), symbol.clone());
        Ok(symbol)
    }

    pub fn lookup(&self, name: &str) -> Option<Rc<Symbol>> {
        self.symbols.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_returns_same_handle() {
        let mut table = SymbolTable::new();
        let a = table.intern("expr", false).unwrap();
        let b = table.intern("expr", false).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn reinterning_with_different_kind_fails() {
        let mut table = SymbolTable::new();
        table.intern("FOO", true).unwrap();
        assert!(table.intern("FOO", false).is_err());
    }

    #[test]
    fn lookup_missing_is_none() {
        let table = SymbolTable::new();
        assert!(table.lookup("nope").is_none());
    }
}
