//! Source positions for diagnostics.

use std::fmt;

/// A 1-based line/column pair.
///
/// `Position::default()` is the "unknown" sentinel (line 0, column 0)
/// used for synthetic nodes and for errors raised by native functions
/// before the interpreter attaches the call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Position { line, column }
    }

    /// Position of the first character of a source text.
    pub const fn start() -> Self {
        Position { line: 1, column: 1 }
    }

    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            f.write_str("?:?")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}
