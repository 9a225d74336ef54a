//! Debug-gated, leveled diagnostic trace (SPEC_FULL.md §10.1).
//!
//! Functionally replaces the original implementation's `_report`/
//! `report()`/`logging.debug` calls with an indent-structured trail
//! through the recursive matcher, produced only when a caller opts in.
//! All emission happens only under `#[cfg(debug_assertions)]`, so
//! release builds pay zero cost.

use std::fmt::{self, Display, Formatter};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Trace<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}

impl<T: Display> Display for Trace<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Trace::None => Ok(()),
            Trace::Default(s) | Trace::Success(s) | Trace::Result(s) | Trace::Verbose(s) => {
                write!(f, "{}", s)
            }
        }
    }
}

impl<T> Trace<T> {
    pub fn order(&self) -> u8 {
        match self {
            Trace::None => 0,
            Trace::Default(_) => 1,
            Trace::Success(_) => 2,
            Trace::Result(_) => 3,
            Trace::Verbose(_) => 4,
        }
    }
}

impl Trace<&'static str> {
    #[cfg(debug_assertions)]
    pub fn entering_rule(&self, depth: usize, rule: &str, remaining_tokens: usize) {
        if self.order() >= Trace::Default(()).order() {
            println!(
                "[{}] {:>width$}entering rule {} ({} tokens left)",
                self,
                "",
                rule,
                remaining_tokens,
                width = depth * 2
            );
        }
    }

    #[cfg(debug_assertions)]
    pub fn matched(&self, depth: usize, what: &str, ok: bool) {
        if self.order() >= Trace::Success(()).order() {
            println!(
                "[{}] {:>width$}{} -> {}",
                self,
                "",
                what,
                if ok { "matched" } else { "no match" },
                width = depth * 2
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_monotonic() {
        assert!(Trace::<()>::None.order() < Trace::Default(()).order());
        assert!(Trace::Default(()).order() < Trace::Success(()).order());
        assert!(Trace::Success(()).order() < Trace::Result(()).order());
        assert!(Trace::Result(()).order() < Trace::Verbose(()).order());
    }
}
