/*!
# Source position types (Position, Span)

Location handles attached to operations by the front end and carried into
diagnostics.
*/

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    #[serde(default)]
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self { line, column, offset }
    }

    pub fn zero() -> Self {
        Self::new(0, 0, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Span in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn zero() -> Self {
        Self::new(Position::zero(), Position::zero())
    }

    /// Single-line span starting at `line:column`, `length` characters long.
    pub fn at(line: usize, column: usize, length: usize) -> Self {
        Self::new(
            Position::new(line, column, 0),
            Position::new(line, column + length, 0),
        )
    }

    /// Length on the starting line (0 for multi-line spans).
    pub fn len(&self) -> usize {
        if self.start.line == self.end.line {
            self.end.column.saturating_sub(self.start.column)
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
