//! Clusters positional tokens into visual lines.

use std::cmp::Ordering;

use statement_table_models::{PositionedToken, TokenLine};

use crate::config::{DEFAULT_LINE_TOLERANCE, LOOSE_LINE_TOLERANCE};

/// Groups tokens whose vertical positions are within a tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineGrouper {
    tolerance: f64,
}

impl Default for LineGrouper {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_TOLERANCE)
    }
}

impl LineGrouper {
    /// Creates a grouper with the given vertical tolerance.
    #[must_use]
    pub const fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// The higher-tolerance alternate, for scans with slightly misaligned
    /// baselines.
    #[must_use]
    pub const fn loose() -> Self {
        Self::new(LOOSE_LINE_TOLERANCE)
    }

    /// Splits one page of tokens into lines, top to bottom.
    ///
    /// Tokens are ordered by vertical position, then horizontal start. A
    /// token joins the current line when it sits less than the tolerance
    /// below the previous token; otherwise it starts a new line. Each
    /// returned line is ordered left to right.
    #[must_use]
    pub fn group(&self, tokens: &[PositionedToken]) -> Vec<TokenLine> {
        let mut sorted: Vec<&PositionedToken> = tokens.iter().collect();
        sorted.sort_by(|a, b| {
            a.vertical_position
                .partial_cmp(&b.vertical_position)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.x_start.partial_cmp(&b.x_start).unwrap_or(Ordering::Equal))
        });

        let mut lines: Vec<TokenLine> = Vec::new();
        let mut current: TokenLine = Vec::new();
        let mut last_position = 0.0;

        for token in sorted {
            if !current.is_empty() && (token.vertical_position - last_position).abs() >= self.tolerance
            {
                lines.push(finish_line(std::mem::take(&mut current)));
            }
            last_position = token.vertical_position;
            current.push(token.clone());
        }
        if !current.is_empty() {
            lines.push(finish_line(current));
        }

        lines
    }
}

fn finish_line(mut line: TokenLine) -> TokenLine {
    line.sort_by(|a, b| a.x_start.partial_cmp(&b.x_start).unwrap_or(Ordering::Equal));
    line
}

/// Joins the tokens of a line with single spaces.
#[must_use]
pub fn line_text(line: &[PositionedToken]) -> String {
    line.iter()
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, x: f64, y: f64) -> PositionedToken {
        PositionedToken::new(text, x, x + 10.0, y)
    }

    #[test]
    fn empty_input_yields_no_lines() {
        assert!(LineGrouper::default().group(&[]).is_empty());
    }

    #[test]
    fn groups_by_vertical_tolerance_and_orders_left_to_right() {
        let tokens = vec![
            token("world", 60.0, 101.0),
            token("next", 10.0, 120.0),
            token("hello", 10.0, 100.0),
        ];
        let lines = LineGrouper::default().group(&tokens);

        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "hello world");
        assert_eq!(line_text(&lines[1]), "next");
    }

    #[test]
    fn slight_baseline_drift_needs_the_loose_grouper() {
        let tokens = vec![token("03-04-2025", 10.0, 100.0), token("TRF", 80.0, 107.0)];

        assert_eq!(LineGrouper::default().group(&tokens).len(), 2);
        assert_eq!(LineGrouper::loose().group(&tokens).len(), 1);
    }

    #[test]
    fn token_within_tolerance_of_previous_token_stays_on_line() {
        let tokens = vec![
            token("a", 10.0, 100.0),
            token("b", 30.0, 104.0),
            token("c", 50.0, 108.0),
        ];
        let lines = LineGrouper::default().group(&tokens);
        assert_eq!(lines.len(), 1);
        assert_eq!(line_text(&lines[0]), "a b c");
    }
}
