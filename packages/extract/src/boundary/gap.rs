//! Gap-based boundary detection for positional token streams.
//!
//! Column separators in rendered tables show up as locally wide runs of
//! horizontal whitespace. Taking only the widest gaps, not every gap over
//! the threshold, filters out ordinary word spacing.

use std::cmp::Ordering;

use statement_table_models::{ColumnSchema, Page};

use super::{BoundaryDetector, BoundarySource, ColumnLayout};
use crate::config::GapConfig;

/// Detects boundaries from the widest gaps between token midpoints.
#[derive(Debug, Clone, Copy)]
pub struct GapDetector<'a> {
    config: &'a GapConfig,
}

impl<'a> GapDetector<'a> {
    /// Creates a detector.
    #[must_use]
    pub const fn new(config: &'a GapConfig) -> Self {
        Self { config }
    }
}

impl BoundaryDetector for GapDetector<'_> {
    type Input = [Page];
    type Boundary = f64;

    fn detect(&self, pages: &[Page]) -> ColumnLayout<f64> {
        let mut midpoints: Vec<f64> = pages
            .iter()
            .take(self.config.sample_pages)
            .flatten()
            .map(statement_table_models::PositionedToken::midpoint)
            .filter(|x| x.is_finite())
            .collect();

        if midpoints.is_empty() {
            log::warn!("No tokens sampled for gap analysis, using default boundaries");
            return ColumnLayout::unlabeled(
                ColumnSchema::sanitized(self.config.default_boundaries.clone(), &[]),
                BoundarySource::Defaults,
            );
        }

        midpoints.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        // (gap size, gap center)
        let mut gaps: Vec<(f64, f64)> = midpoints
            .windows(2)
            .filter_map(|w| {
                let size = w[1] - w[0];
                (size > self.config.threshold).then(|| (size, f64::midpoint(w[0], w[1])))
            })
            .collect();

        // Stable sort keeps equal-sized gaps in left-to-right order.
        gaps.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let mut boundaries: Vec<f64> = gaps
            .into_iter()
            .take(self.config.max_gaps)
            .map(|(_, center)| center)
            .collect();
        boundaries.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        log::debug!(
            "Gap analysis over {} midpoints produced boundaries {boundaries:?}",
            midpoints.len()
        );

        ColumnLayout::unlabeled(
            ColumnSchema::sanitized(boundaries, &self.config.default_boundaries),
            BoundarySource::GapAnalysis,
        )
    }
}

#[cfg(test)]
mod tests {
    use statement_table_models::PositionedToken;

    use super::*;

    fn page(xs: &[f64]) -> Page {
        xs.iter()
            .map(|&x| PositionedToken::new("w", x - 2.0, x + 2.0, 0.0))
            .collect()
    }

    #[test]
    fn no_tokens_falls_back_to_defaults() {
        let config = GapConfig::default();
        let layout = GapDetector::new(&config).detect(&[]);
        assert_eq!(layout.source, BoundarySource::Defaults);
        assert_eq!(layout.schema.boundaries(), &[100.0, 200.0, 300.0, 400.0]);
    }

    #[test]
    fn keeps_only_the_widest_gaps_sorted_ascending() {
        let config = GapConfig {
            max_gaps: 2,
            ..GapConfig::default()
        };
        // Gaps: 10->30 (20), 30->100 (70), 100->105 (5), 105->200 (95)
        let pages = vec![page(&[10.0, 30.0, 100.0, 105.0, 200.0])];
        let layout = GapDetector::new(&config).detect(&pages);

        assert_eq!(layout.source, BoundarySource::GapAnalysis);
        assert_eq!(layout.schema.boundaries(), &[65.0, 152.5]);
    }

    #[test]
    fn gaps_at_or_below_threshold_are_ignored() {
        let config = GapConfig::default();
        let pages = vec![page(&[10.0, 25.0, 40.0])];
        let layout = GapDetector::new(&config).detect(&pages);
        assert!(layout.schema.boundaries().is_empty());
        assert_eq!(layout.schema.column_count(), 1);
    }

    #[test]
    fn only_the_sampled_pages_are_used() {
        let config = GapConfig {
            sample_pages: 1,
            ..GapConfig::default()
        };
        let pages = vec![page(&[10.0, 12.0]), page(&[10.0, 500.0])];
        let layout = GapDetector::new(&config).detect(&pages);
        assert!(layout.schema.boundaries().is_empty());
    }

    #[test]
    fn detection_is_deterministic() {
        let config = GapConfig::default();
        let pages = vec![
            page(&[40.0, 41.0, 150.0, 152.0, 300.0, 420.0]),
            page(&[42.0, 151.0, 310.0, 425.0, 500.0]),
        ];
        let detector = GapDetector::new(&config);
        assert_eq!(detector.detect(&pages), detector.detect(&pages));
    }
}
