//! Header-keyword boundary detection for positional token tables.
//!
//! Same idea as [`super::header`], but the header line is a run of
//! positioned tokens: each keyword is mapped back to the tokens it spans,
//! and boundaries fall halfway between one label's right edge and the next
//! label's left edge.

use statement_table_models::{ColumnSchema, Page, PositionedToken};

use super::header::find_labels;
use super::{BoundaryDetector, BoundarySource, ColumnLayout};
use crate::config::{HeaderConfig, PdfTableConfig};
use crate::grouper::LineGrouper;

/// Detects positional column boundaries from a labeled header line.
#[derive(Debug, Clone, Copy)]
pub struct TokenHeaderDetector<'a> {
    header: &'a HeaderConfig,
    table: &'a PdfTableConfig,
    grouper: LineGrouper,
    sample_pages: usize,
}

impl<'a> TokenHeaderDetector<'a> {
    /// Creates a detector that scans the first `sample_pages` pages.
    #[must_use]
    pub const fn new(
        header: &'a HeaderConfig,
        table: &'a PdfTableConfig,
        grouper: LineGrouper,
        sample_pages: usize,
    ) -> Self {
        Self {
            header,
            table,
            grouper,
            sample_pages,
        }
    }

    /// Horizontal extents `(x_start, x_end)` of each header label in
    /// `line`, or `None` when the line is not a header.
    fn label_extents(
        &self,
        line: &[PositionedToken],
    ) -> Option<Vec<(f64, f64, statement_table_models::Field)>> {
        // Character span of every token inside the space-joined line text.
        let mut text = String::new();
        let mut spans: Vec<(usize, usize)> = Vec::with_capacity(line.len());
        for token in line {
            if !text.is_empty() {
                text.push(' ');
            }
            let start = text.chars().count();
            text.push_str(&token.text);
            spans.push((start, text.chars().count()));
        }

        let labels = find_labels(&text, &self.header.keywords);
        if labels.len() < self.header.min_keywords {
            return None;
        }

        let token_at = |offset: usize| spans.iter().position(|&(_, end)| offset < end);

        labels
            .iter()
            .map(|label| {
                let first = token_at(label.start)?;
                let last = token_at(label.end.saturating_sub(1))?;
                Some((line[first].x_start, line[last].x_end, label.field))
            })
            .collect()
    }
}

impl BoundaryDetector for TokenHeaderDetector<'_> {
    type Input = [Page];
    type Boundary = f64;

    fn detect(&self, pages: &[Page]) -> ColumnLayout<f64> {
        let header = pages
            .iter()
            .take(self.sample_pages)
            .flat_map(|page| {
                self.grouper
                    .group(page)
                    .into_iter()
                    .take(self.header.scan_lines)
            })
            .find_map(|line| self.label_extents(&line));

        let Some(extents) = header else {
            log::warn!("No labeled header line found in sampled pages, using default boundaries");
            return ColumnLayout::new(
                ColumnSchema::sanitized(self.table.default_boundaries.clone(), &[]),
                self.table.default_fields.iter().copied().map(Some).collect(),
                BoundarySource::Defaults,
                None,
            );
        };

        let boundaries: Vec<f64> = extents
            .windows(2)
            .map(|w| f64::midpoint(w[0].1, w[1].0))
            .collect();

        log::info!(
            "Labeled header found: {:?} at {boundaries:?}",
            extents.iter().map(|e| e.2).collect::<Vec<_>>()
        );

        ColumnLayout::new(
            ColumnSchema::sanitized(boundaries, &self.table.default_boundaries),
            extents.iter().map(|e| Some(e.2)).collect(),
            BoundarySource::HeaderKeywords,
            None,
        )
    }
}
