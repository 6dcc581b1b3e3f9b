use std::{
    cmp::{max, min},
    ops::{Index, Range},
};

/// Represents an area within source text.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct Region {
    /// The beginning of the range, inclusive.
    pub begin: usize,
    /// The ending of the range, exclusive.
    pub end: usize,
}

impl Region {
    /// Create a new Region from the given range.
    pub fn new(position: Range<usize>) -> Self {
        Self {
            begin: position.start,
            end: position.end,
        }
    }

    /// Combine will merge the indices of two [`Region`] instances.
    pub fn combine(self, other: Self) -> Self {
        Self {
            begin: min(self.begin, other.begin),
            end: max(self.end, other.end),
        }
    }

    /// Access the literal value of a [`Region`].
    ///
    /// An out of bounds `Region` produces an empty string.
    pub fn literal<'source>(&self, source: &'source str) -> &'source str {
        source.get(self.begin..self.end).unwrap_or_default()
    }

    /// Return the one-indexed line on which this [`Region`] begins.
    pub fn line(&self, source: &str) -> usize {
        let until = min(self.begin, source.len());

        source
            .get(..until)
            .map(|s| s.matches('\n').count())
            .unwrap_or(0)
            + 1
    }
}

impl Index<Region> for str {
    type Output = str;

    fn index(&self, region: Region) -> &Self::Output {
        let Region { begin, end } = region;

        &self[begin..end]
    }
}

impl From<Range<usize>> for Region {
    fn from(value: Range<usize>) -> Self {
        Self {
            begin: value.start,
            end: value.end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine() {
        let combined = Region::new(5..10).combine(Region::new(8..15));

        assert_eq!(combined.begin, 5);
        assert_eq!(combined.end, 15);
    }

    #[test]
    fn test_literal() {
        let source = "Hello, Taylor!";

        assert_eq!(Region::new(7..13).literal(source), "Taylor");
        assert_eq!(Region::new(7..15).literal(source), "");
    }

    #[test]
    fn test_line() {
        let source = "one\ntwo\n<f:three />";

        assert_eq!(Region::new(0..3).line(source), 1);
        assert_eq!(Region::new(4..7).line(source), 2);
        assert_eq!(Region::new(8..20).line(source), 3);
    }
}
