use std::fmt;

/// A point in the source code. Lines start at 1, columns at 0 so that the
/// first advance of a scanner lands on column 1.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: u64,
    pub column: u64,
}

impl SourceLocation {
    pub fn new(line: u64, column: u64) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Inclusive span between two locations. Every token and AST node carries
/// one so reported errors can point back at the offending code.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SourceRange {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceRange {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Sentinel for code with no usable position, like REPL-synthesized
    /// nodes. Displays as [0:0].
    pub fn unknown() -> Self {
        Self::default()
    }

    /// Span covering self through other, used to give a parent node the
    /// full extent of its children.
    pub fn to(self, other: SourceRange) -> Self {
        Self {
            start: self.start,
            end: other.end,
        }
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.start == self.end {
            write!(f, "[{}]", self.start)
        } else if self.start.line == self.end.line {
            write!(f, "[{}-{}]", self.start, self.end.column)
        } else {
            write!(f, "[{}-{}]", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_single_location() {
        let range = SourceRange::new(SourceLocation::new(1, 5), SourceLocation::new(1, 5));
        assert_eq!(format!("{}", range), "[1:5]");
    }

    #[test]
    fn display_same_line() {
        let range = SourceRange::new(SourceLocation::new(3, 1), SourceLocation::new(3, 9));
        assert_eq!(format!("{}", range), "[3:1-9]");
    }

    #[test]
    fn display_multi_line() {
        let range = SourceRange::new(SourceLocation::new(2, 4), SourceLocation::new(5, 1));
        assert_eq!(format!("{}", range), "[2:4-5:1]");
    }

    #[test]
    fn merge_ranges() {
        let left = SourceRange::new(SourceLocation::new(1, 1), SourceLocation::new(1, 3));
        let right = SourceRange::new(SourceLocation::new(1, 7), SourceLocation::new(2, 2));
        let merged = left.to(right);
        assert_eq!(merged.start, SourceLocation::new(1, 1));
        assert_eq!(merged.end, SourceLocation::new(2, 2));
    }
}
