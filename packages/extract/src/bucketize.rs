//! Assigns tokens or character ranges to columns.
//!
//! Both entry points return a [`Row`] with exactly
//! `schema.column_count()` cells, or `None` when every cell is empty.

use statement_table_models::{ColumnSchema, PositionedToken, Row};

/// Buckets a line of positional tokens by horizontal midpoint.
///
/// A token lands in the bucket whose index equals the number of boundaries
/// its midpoint exceeds. Token texts in one bucket are joined with spaces in
/// line order.
#[must_use]
pub fn bucketize_tokens(line: &[PositionedToken], schema: &ColumnSchema<f64>) -> Option<Row> {
    let mut buckets = vec![String::new(); schema.column_count()];

    for token in line {
        let column = schema.column_of(token.midpoint());
        buckets[column].push_str(&token.text);
        buckets[column].push(' ');
    }

    finish(buckets)
}

/// Slices a fixed-width text line at character offsets.
///
/// Column `i` covers characters `[start, end)` of the schema's ranges; the
/// last column runs to the end of the line. Ranges past the end of a short
/// line yield empty cells.
#[must_use]
pub fn bucketize_text(line: &str, schema: &ColumnSchema<usize>) -> Option<Row> {
    let chars: Vec<char> = line.chars().collect();

    let buckets = schema
        .char_ranges()
        .into_iter()
        .map(|(start, end)| {
            let end = end.unwrap_or(chars.len()).min(chars.len());
            chars
                .get(start..end)
                .map(|slice| slice.iter().collect::<String>())
                .unwrap_or_default()
        })
        .collect();

    finish(buckets)
}

fn finish(buckets: Vec<String>) -> Option<Row> {
    let row = Row::new(buckets.into_iter().map(|b| b.trim().to_owned()).collect());
    (!row.is_blank()).then_some(row)
}
