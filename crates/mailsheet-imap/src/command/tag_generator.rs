//! Command tag generation.

use crate::types::Tag;

/// Produces sequential command tags: `A0000`, `A0001`, ...
///
/// One generator lives for the whole connection so that every command sent on
/// it gets a distinct tag.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    prefix: char,
    counter: u32,
}

impl TagGenerator {
    /// Creates a generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self { prefix, counter: 0 }
    }

    /// Returns the next tag.
    pub fn next(&mut self) -> Tag {
        let n = self.counter;
        self.counter = self.counter.wrapping_add(1);
        Tag(format!("{}{n:04}", self.prefix))
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_sequential_and_padded() {
        let mut tags = TagGenerator::default();
        assert_eq!(tags.next().as_str(), "A0000");
        assert_eq!(tags.next().as_str(), "A0001");
        assert_eq!(tags.next().as_str(), "A0002");
    }

    #[test]
    fn custom_prefix() {
        let mut tags = TagGenerator::new('x');
        assert_eq!(tags.next().as_str(), "x0000");
    }

    #[test]
    fn wide_counters_are_not_truncated() {
        let mut tags = TagGenerator::new('A');
        for _ in 0..12_345 {
            let _ = tags.next();
        }
        assert_eq!(tags.next().as_str(), "A12345");
    }
}
