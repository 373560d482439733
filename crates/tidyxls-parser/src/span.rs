//! Byte ranges into formula source text.

use std::{fmt, ops::Range};

/// A half-open byte range `start..end` into the formula source.
///
/// Spans are carried by every token so that diagnostics can point at the
/// offending text. They never take part in classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span from a byte range.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end.max(range.start),
        }
    }

    /// Create an empty span positioned at `offset`.
    pub fn empty(offset: usize) -> Self {
        Self::new(offset..offset)
    }

    /// Get the start offset of the span
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end offset of the span
    pub fn end(&self) -> usize {
        self.end
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Create a union of two spans (encompassing both)
    pub fn union(&self, other: Span) -> Span {
        Self::new(self.start.min(other.start)..self.end.max(other.end))
    }

    /// Get the span as a standard range.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_union() {
        let a = Span::new(2..5);
        let b = Span::new(8..10);

        assert_eq!(a.union(b), Span::new(2..10));
        assert_eq!(b.union(a), Span::new(2..10));
    }

    #[test]
    fn test_span_len_and_empty() {
        assert_eq!(Span::new(3..7).len(), 4);
        assert!(Span::empty(4).is_empty());
        assert!(!Span::new(0..1).is_empty());
    }

    #[test]
    fn test_inverted_range_is_clamped() {
        #[allow(clippy::reversed_empty_ranges)]
        let span = Span::new(5..3);
        assert!(span.is_empty());
        assert_eq!(span.start(), 5);
    }
}
