//! Header-keyword boundary detection for fixed-width text.
//!
//! A header line is any line within the scanned prefix that contains at
//! least `min_keywords` of the configured column labels. Each column then
//! spans from the midpoint between the previous label's end and its own
//! start, to the midpoint between its own end and the next label's start.
//! Offsets are in characters, not bytes.

use statement_table_models::{ColumnSchema, Field};

use super::{BoundaryDetector, BoundarySource, ColumnLayout};
use crate::config::{HeaderConfig, HeaderKeyword};
use crate::normalize::DATE_PATTERN;

/// A keyword label located in a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLabel {
    /// Character offset of the first label character.
    pub start: usize,
    /// Character offset one past the last label character.
    pub end: usize,
    /// Field named by the label.
    pub field: Field,
}

/// Finds every configured keyword in `line`, ordered by position.
///
/// Matching is ASCII case-insensitive. Where two labels overlap (for
/// example `WITHDRAWAL` and `WITHDRAWALS`), the longer one wins.
#[must_use]
pub fn find_labels(line: &str, keywords: &[HeaderKeyword]) -> Vec<HeaderLabel> {
    let upper = line.to_ascii_uppercase();

    let mut labels: Vec<HeaderLabel> = keywords
        .iter()
        .filter(|k| !k.label.is_empty())
        .filter_map(|k| {
            let byte = upper.find(&k.label.to_ascii_uppercase())?;
            let start = char_offset(line, byte);
            Some(HeaderLabel {
                start,
                end: start + k.label.chars().count(),
                field: k.field,
            })
        })
        .collect();

    labels.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut kept: Vec<HeaderLabel> = Vec::with_capacity(labels.len());
    for label in labels {
        if kept.last().is_none_or(|prev| label.start >= prev.end) {
            kept.push(label);
        }
    }
    kept
}

/// Whether `line` carries enough keywords to be a header line.
#[must_use]
pub fn is_header_line(line: &str, config: &HeaderConfig) -> bool {
    find_labels(line, &config.keywords).len() >= config.min_keywords
}

/// Character offset of byte index `byte` in `s`.
pub(crate) fn char_offset(s: &str, byte: usize) -> usize {
    s.get(..byte).map_or(0, |prefix| prefix.chars().count())
}

/// Detects fixed-width column offsets from a keyword header line.
#[derive(Debug, Clone, Copy)]
pub struct HeaderDetector<'a> {
    config: &'a HeaderConfig,
}

impl<'a> HeaderDetector<'a> {
    /// Creates a detector.
    #[must_use]
    pub const fn new(config: &'a HeaderConfig) -> Self {
        Self { config }
    }

    fn fallback(&self) -> ColumnLayout<usize> {
        log::warn!(
            "No header line with {} or more keywords in the first {} lines, using default column offsets",
            self.config.min_keywords,
            self.config.scan_lines
        );
        ColumnLayout::new(
            ColumnSchema::sanitized(self.config.default_offsets.clone(), &[]),
            self.config.default_fields.iter().copied().map(Some).collect(),
            BoundarySource::Defaults,
            None,
        )
    }

    /// End offset of the first date found in the lines after the header.
    fn probe_date_end(&self, following: &[String]) -> Option<usize> {
        following
            .iter()
            .take(self.config.date_probe_lines)
            .find_map(|line| {
                DATE_PATTERN
                    .find(line)
                    .map(|m| char_offset(line, m.end()))
            })
    }
}

impl BoundaryDetector for HeaderDetector<'_> {
    type Input = [String];
    type Boundary = usize;

    fn detect(&self, lines: &[String]) -> ColumnLayout<usize> {
        let Some((index, labels)) = lines
            .iter()
            .take(self.config.scan_lines)
            .enumerate()
            .map(|(i, line)| (i, find_labels(line, &self.config.keywords)))
            .find(|(_, labels)| labels.len() >= self.config.min_keywords)
        else {
            return self.fallback();
        };

        let mut boundaries: Vec<usize> = labels
            .windows(2)
            .map(|w| usize::midpoint(w[0].end, w[1].start))
            .collect();

        // Header labels are usually narrower than the dates under them, so
        // the date column ends just past a real sample date instead.
        if labels[0].field == Field::Date
            && !boundaries.is_empty()
            && let Some(date_end) = self.probe_date_end(&lines[index + 1..])
        {
            let refined = date_end + 1;
            if boundaries.get(1).is_none_or(|&next| refined < next) {
                boundaries[0] = refined;
            }
        }

        log::info!(
            "Header found on line {}: {:?} at offsets {boundaries:?}",
            index + 1,
            labels.iter().map(|l| l.field).collect::<Vec<_>>()
        );

        ColumnLayout::new(
            ColumnSchema::sanitized(boundaries, &self.config.default_offsets),
            labels.iter().map(|l| Some(l.field)).collect(),
            BoundarySource::HeaderKeywords,
            Some(index),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "DATE      PARTICULARS                             CHQ.NO.             WITHDRAWALS         DEPOSITS            BALANCE";
    const ROW: &str = "03-04-2025 Test Margin Case                       509312716679      8000.00                                   425115.55Dr";

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|&s| s.to_owned()).collect()
    }

    #[test]
    fn finds_labels_in_position_order() {
        let config = HeaderConfig::default();
        let labels = find_labels(HEADER, &config.keywords);
        let starts: Vec<usize> = labels.iter().map(|l| l.start).collect();
        assert_eq!(starts, vec![0, 10, 50, 70, 90, 110]);
        assert_eq!(labels[2].field, Field::Reference);
    }

    #[test]
    fn label_matching_ignores_case() {
        let config = HeaderConfig::default();
        assert!(is_header_line("Date   Particulars   Balance", &config));
        assert!(!is_header_line("03-04-2025 TRF to balance", &config));
    }

    #[test]
    fn overlapping_labels_keep_the_longest() {
        let keywords = vec![
            HeaderKeyword {
                label: "WITHDRAWAL".to_owned(),
                field: Field::Withdrawals,
            },
            HeaderKeyword {
                label: "WITHDRAWALS".to_owned(),
                field: Field::Withdrawals,
            },
        ];
        let labels = find_labels("  WITHDRAWALS", &keywords);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].end, 13);
    }

    #[test]
    fn boundaries_sit_between_labels_with_refined_date_column() {
        let config = HeaderConfig::default();
        let layout = HeaderDetector::new(&config).detect(&lines(&[HEADER, ROW]));

        assert_eq!(layout.source, BoundarySource::HeaderKeywords);
        assert_eq!(layout.header_line, Some(0));
        assert_eq!(layout.schema.boundaries(), &[11, 35, 63, 85, 104]);
        assert_eq!(
            layout.fields,
            Field::ALL.iter().copied().map(Some).collect::<Vec<_>>()
        );
    }

    #[test]
    fn date_column_uses_label_midpoint_without_sample_date() {
        let config = HeaderConfig::default();
        let layout = HeaderDetector::new(&config).detect(&lines(&[HEADER]));
        assert_eq!(layout.schema.boundaries()[0], 7);
    }

    #[test]
    fn header_beyond_scan_prefix_falls_back_to_defaults() {
        let config = HeaderConfig {
            scan_lines: 2,
            ..HeaderConfig::default()
        };
        let layout =
            HeaderDetector::new(&config).detect(&lines(&["bank name", "branch", HEADER]));

        assert!(layout.is_degraded());
        assert_eq!(layout.schema.boundaries(), &[11, 45, 65, 85, 105]);
        assert_eq!(layout.column_for(Field::Balance), Some(5));
    }

    #[test]
    fn partial_header_yields_only_found_columns() {
        let config = HeaderConfig::default();
        let layout = HeaderDetector::new(&config)
            .detect(&lines(&["DATE       PARTICULARS          BALANCE"]));

        assert_eq!(layout.schema.column_count(), 3);
        assert_eq!(layout.column_for(Field::Balance), Some(2));
        assert_eq!(layout.column_for(Field::Withdrawals), None);
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let config = HeaderConfig::default();
        let labels = find_labels("\u{fffd}DATE PARTICULARS BALANCE", &config.keywords);
        assert_eq!(labels[0].start, 1);
    }
}
