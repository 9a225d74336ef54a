//! Byte offset to line/column resolution, used to render diagnostics.
//!
//! Grounded on `Code::obtain_line_breaks`/`obtain_position` from the
//! teacher lineage: line-break offsets are computed lazily and cached,
//! then a binary search over them turns an offset into a line/column pair.

use once_cell::unsync::OnceCell;
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Source text plus a lazily computed index of line-break offsets.
pub struct Source<'s> {
    pub value: &'s str,
    line_breaks: OnceCell<Vec<usize>>,
}

impl<'s> Source<'s> {
    pub fn new(value: &'s str) -> Self {
        Self {
            value,
            line_breaks: OnceCell::new(),
        }
    }

    fn line_breaks(&self) -> &Vec<usize> {
        self.line_breaks.get_or_init(|| {
            self.value
                .bytes()
                .enumerate()
                .filter_map(|(i, b)| if b == b'\n' { Some(i) } else { None })
                .collect()
        })
    }

    /// Resolve a byte offset into `value` into a 1-based line/column pair.
    pub fn position(&self, offset: usize) -> Position {
        let breaks = self.line_breaks();
        match breaks.binary_search(&offset) {
            Ok(line) | Err(line) => {
                let column = if line == 0 {
                    offset + 1
                } else {
                    offset - breaks[line - 1]
                };
                Position {
                    line: line + 1,
                    column,
                }
            }
        }
    }

    /// A short preview of the source starting at `offset`, for error
    /// messages (`LexicalError(offset, preview)`).
    pub fn preview(&self, offset: usize, max_len: usize) -> String {
        let rest = &self.value[offset.min(self.value.len())..];
        let end = rest
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(rest.len()))
            .find(|&i| i >= max_len)
            .unwrap_or(rest.len());
        rest[..end].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_on_first_line() {
        let source = Source::new("abc def");
        let pos = source.position(4);
        assert_eq!(pos, Position { line: 1, column: 5 });
    }

    #[test]
    fn position_after_newline() {
        let source = Source::new("ab\ncd\nef");
        let pos = source.position(6);
        assert_eq!(pos, Position { line: 3, column: 1 });
    }

    #[test]
    fn preview_truncates() {
        let source = Source::new("0123456789abcdef");
        assert_eq!(source.preview(2, 4), "2345");
    }
}
