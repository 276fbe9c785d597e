//! Source locations for the front end.
//!
//! A `Location` pins a point in the analyzed file by absolute character
//! offset, index on the line, and 1-based line number. Sub-lexed text (a
//! directive body, for example) is lexed with a non-zero base location so
//! that every symbol it produces still reports whole-file coordinates.

pub use text_size::{TextLen, TextRange, TextSize};

/// A point within a source file.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Location {
    /// Absolute character offset from the start of the file.
    pub index: TextSize,
    /// Character offset from the start of the line.
    pub index_on_line: u32,
    /// 1-based line number.
    pub line_number: u32,
}

impl Location {
    pub const FIRST: Self =
        Self { index: TextSize::new(0), index_on_line: 0, line_number: 1 };

    pub fn new(index: TextSize, index_on_line: u32, line_number: u32) -> Self {
        Self { index, index_on_line, line_number }
    }

    /// The location after consuming `text`, tracking line breaks.
    pub fn advanced_by(self, text: &str) -> Self {
        let mut index_on_line = self.index_on_line;
        let mut line_number = self.line_number;

        for c in text.chars() {
            if c == '\n' {
                line_number += 1;
                index_on_line = 0;
            } else {
                index_on_line += 1;
            }
        }

        Self { index: self.index + text.text_len(), index_on_line, line_number }
    }

    /// The range covering `len` characters starting here.
    pub fn range(self, len: TextSize) -> TextRange {
        TextRange::at(self.index, len)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::FIRST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_lines_and_columns() {
        let location = Location::FIRST.advanced_by("ab\ncde");
        assert_eq!(location.index, TextSize::new(6));
        assert_eq!(location.index_on_line, 3);
        assert_eq!(location.line_number, 2);
    }

    #[test]
    fn advance_over_empty_text_is_identity() {
        let location = Location::new(TextSize::new(7), 3, 2);
        assert_eq!(location.advanced_by(""), location);
    }

    #[test]
    fn range_starts_at_the_location() {
        let location = Location::new(TextSize::new(10), 4, 3);
        let range = location.range(TextSize::new(5));
        assert_eq!(range, TextRange::new(TextSize::new(10), TextSize::new(15)));
    }
}
