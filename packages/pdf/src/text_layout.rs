//! Positional tokens synthesized from plain text.
//!
//! `pdf-extract` returns text with the page layout flattened into spaces
//! and newlines. Treating that text as a monospace grid gives every word an
//! approximate position, which is enough for gap-based column detection:
//! a word at character column `c` of line `l` becomes a token spanning
//! `c * char_width .. (c + len) * char_width` at height `l * line_height`.
//! Form feeds separate pages.

use statement_table_extract::config::TextLayoutConfig;
use statement_table_models::{Page, PositionedToken};

/// Page separator emitted by `pdf-extract`.
pub const PAGE_BREAK: char = '\u{c}';

/// Converts laid-out text into pages of positioned tokens.
///
/// Pages with no words are dropped.
#[must_use]
pub fn tokens_from_text(text: &str, layout: &TextLayoutConfig) -> Vec<Page> {
    text.split(PAGE_BREAK)
        .map(|page| page_tokens(page, layout))
        .filter(|page| !page.is_empty())
        .collect()
}

fn page_tokens(page: &str, layout: &TextLayoutConfig) -> Page {
    let mut tokens = Vec::new();

    for (row, line) in page.lines().enumerate() {
        let y = grid(row) * layout.line_height;
        let mut word_start: Option<usize> = None;
        let mut word = String::new();

        for (column, c) in line.chars().chain(std::iter::once(' ')).enumerate() {
            if c.is_whitespace() {
                if let Some(start) = word_start.take() {
                    tokens.push(PositionedToken::new(
                        std::mem::take(&mut word),
                        grid(start) * layout.char_width,
                        grid(column) * layout.char_width,
                        y,
                    ));
                }
            } else {
                word_start.get_or_insert(column);
                word.push(c);
            }
        }
    }

    tokens
}

/// Grid index as a coordinate. Indices beyond `u32::MAX` saturate.
fn grid(index: usize) -> f64 {
    f64::from(u32::try_from(index).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_get_monospace_extents() {
        let layout = TextLayoutConfig::default();
        let pages = tokens_from_text("ab  cde\n\n x", &layout);

        assert_eq!(pages.len(), 1);
        let page = &pages[0];
        assert_eq!(page.len(), 3);
        assert_eq!(page[0], PositionedToken::new("ab", 0.0, 12.0, 0.0));
        assert_eq!(page[1], PositionedToken::new("cde", 24.0, 42.0, 0.0));
        assert_eq!(page[2], PositionedToken::new("x", 6.0, 12.0, 24.0));
    }

    #[test]
    fn form_feeds_split_pages_and_blank_pages_are_dropped() {
        let layout = TextLayoutConfig::default();
        let pages = tokens_from_text("one\u{c}  \n\u{c}two\nthree", &layout);

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0][0].text, "one");
        assert_eq!(pages[1].len(), 2);
        assert!((pages[1][1].vertical_position - 12.0).abs() < f64::EPSILON);
    }
}
