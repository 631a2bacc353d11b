//! Whole-document extraction.
//!
//! [`Extractor`] resolves a [`ConversionType`] and a [`DocumentInput`]
//! shape to one pipeline, runs it start to finish, and returns the
//! ordered [`Table`]. Processing is synchronous and in encounter order.

use serde::Serialize;
use statement_table_models::{ConversionType, Field, Page, Row, Table};
use strum_macros::{AsRefStr, Display};

use crate::ExtractError;
use crate::boundary::{
    BoundaryDetector, BoundarySource, ColumnLayout, GapDetector, HeaderDetector,
    TokenHeaderDetector,
};
use crate::bucketize::{bucketize_text, bucketize_tokens};
use crate::config::ExtractionConfig;
use crate::grouper::{LineGrouper, line_text};
use crate::normalize::FieldNormalizer;
use crate::progress::{END_PERCENT, ProgressCallback, ProgressTracker, START_PERCENT};
use crate::stitch::{FieldColumns, RowClassifier, Stitcher};

/// Document content as delivered by a token or line source.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentInput {
    /// Pages of positioned tokens.
    Positional(Vec<Page>),
    /// Raw text lines of a fixed-width report.
    Lines(Vec<String>),
    /// OCR text of a scanned image.
    OcrTranscript(String),
}

/// The shape of a [`DocumentInput`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InputShape {
    /// Positioned tokens.
    Positional,
    /// Text lines.
    Lines,
    /// OCR transcript.
    OcrTranscript,
}

impl DocumentInput {
    /// The input's shape.
    #[must_use]
    pub const fn shape(&self) -> InputShape {
        match self {
            Self::Positional(_) => InputShape::Positional,
            Self::Lines(_) => InputShape::Lines,
            Self::OcrTranscript(_) => InputShape::OcrTranscript,
        }
    }

    /// Whether the input contains no text at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Positional(pages) => pages.iter().flatten().all(|t| t.text.trim().is_empty()),
            Self::Lines(lines) => lines.iter().all(|l| l.trim().is_empty()),
            Self::OcrTranscript(text) => text.trim().is_empty(),
        }
    }
}

/// The pipeline chosen for a conversion type and input shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Pipeline {
    /// Gap-based columns, one output row per visual line, no stitching.
    PositionalGap,
    /// Keyword-labeled positional columns with stitching.
    LabeledTokens,
    /// Keyword-labeled fixed-width columns with stitching.
    FixedWidth,
    /// Whitespace-split OCR lines with no column inference.
    OcrWords,
}

impl Pipeline {
    /// Resolves the pipeline for `kind` applied to `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::UnsupportedInput`] if the conversion type
    /// cannot handle the input shape.
    pub fn resolve(kind: ConversionType, shape: InputShape) -> Result<Self, ExtractError> {
        match (kind, shape) {
            (ConversionType::Generic, InputShape::Positional) => Ok(Self::PositionalGap),
            (ConversionType::Generic, InputShape::OcrTranscript) => Ok(Self::OcrWords),
            (ConversionType::Generic | ConversionType::FixedWidthReport, InputShape::Lines) => {
                Ok(Self::FixedWidth)
            }
            (ConversionType::LabeledPdfTable, InputShape::Positional) => Ok(Self::LabeledTokens),
            (kind, shape) => Err(ExtractError::UnsupportedInput(format!(
                "{kind} conversion does not accept {shape} input"
            ))),
        }
    }

    /// Whether this is an auto-detect fallback rather than a keyword-driven
    /// pipeline.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::PositionalGap | Self::OcrWords)
    }
}

/// Boundary coordinates of a detected layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "unit", content = "values", rename_all = "snake_case")]
pub enum BoundaryValues {
    /// Horizontal page coordinates.
    Points(Vec<f64>),
    /// Character offsets.
    Characters(Vec<usize>),
}

/// What a conversion would use, without converting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    /// Requested conversion type.
    pub kind: ConversionType,
    /// Chosen pipeline.
    pub pipeline: Pipeline,
    /// Whether the pipeline is an auto-detect fallback.
    pub degraded_pipeline: bool,
    /// Where the boundaries came from, `None` for OCR input.
    pub source: Option<BoundarySource>,
    /// Detected boundaries.
    pub boundaries: Option<BoundaryValues>,
    /// Field of each column.
    pub fields: Vec<Option<Field>>,
    /// Index of the header line, if one was found.
    pub header_line: Option<usize>,
}

impl DetectionReport {
    fn from_layout<B>(
        kind: ConversionType,
        pipeline: Pipeline,
        layout: ColumnLayout<B>,
        values: impl FnOnce(Vec<B>) -> BoundaryValues,
    ) -> Self
    where
        B: Copy + PartialOrd,
    {
        Self {
            kind,
            pipeline,
            degraded_pipeline: pipeline.is_degraded(),
            source: Some(layout.source),
            boundaries: Some(values(layout.schema.boundaries().to_vec())),
            fields: layout.fields,
            header_line: layout.header_line,
        }
    }
}

/// Runs extraction pipelines under one configuration.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractionConfig,
    normalizer: FieldNormalizer,
}

impl Extractor {
    /// Creates an extractor.
    #[must_use]
    pub fn new(config: ExtractionConfig) -> Self {
        let normalizer = FieldNormalizer::from_config(&config);
        Self { config, normalizer }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    fn grouper(&self) -> LineGrouper {
        LineGrouper::new(self.config.line_tolerance)
    }

    fn gap_detector(&self) -> GapDetector<'_> {
        GapDetector::new(&self.config.gap)
    }

    fn header_detector(&self) -> HeaderDetector<'_> {
        HeaderDetector::new(&self.config.header)
    }

    fn token_header_detector(&self) -> TokenHeaderDetector<'_> {
        TokenHeaderDetector::new(
            &self.config.header,
            &self.config.pdf_table,
            self.grouper(),
            self.config.gap.sample_pages,
        )
    }

    fn stitcher(&self, fields: &[Option<Field>]) -> Stitcher<'_> {
        Stitcher::new(
            RowClassifier::new(&self.config.header, &self.config.stitch),
            &self.normalizer,
            FieldColumns::from_fields(fields),
        )
    }

    /// Extracts the table of one document.
    ///
    /// # Errors
    ///
    /// * [`ExtractError::UnsupportedInput`] if `kind` cannot handle the
    ///   input shape.
    /// * [`ExtractError::EmptyExtraction`] if the document has no text, or
    ///   yields no rows.
    pub fn extract(
        &self,
        kind: ConversionType,
        input: &DocumentInput,
        progress: &dyn ProgressCallback,
    ) -> Result<Table, ExtractError> {
        let pipeline = Pipeline::resolve(kind, input.shape())?;
        if input.is_empty() {
            return Err(ExtractError::EmptyExtraction);
        }
        if pipeline.is_degraded() {
            log::info!("Running auto-detect pipeline {pipeline}; columns are inferred, not labeled");
        }

        let table = match input {
            DocumentInput::Positional(pages) if pipeline == Pipeline::LabeledTokens => {
                self.labeled_tokens(pages, progress)
            }
            DocumentInput::Positional(pages) => self.positional_gap(pages, progress),
            DocumentInput::Lines(lines) => self.fixed_width(lines, progress),
            DocumentInput::OcrTranscript(text) => Self::ocr_words(text, progress),
        };

        if table.is_empty() {
            log::warn!("{pipeline} pipeline produced no rows");
            return Err(ExtractError::EmptyExtraction);
        }

        log::info!("Extracted {} rows with the {pipeline} pipeline", table.len());
        Ok(table)
    }

    /// Reports the pipeline and column layout a conversion would use.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::extract`], except that an empty result
    /// is not checked.
    pub fn detect(
        &self,
        kind: ConversionType,
        input: &DocumentInput,
    ) -> Result<DetectionReport, ExtractError> {
        let pipeline = Pipeline::resolve(kind, input.shape())?;
        if input.is_empty() {
            return Err(ExtractError::EmptyExtraction);
        }

        Ok(match input {
            DocumentInput::Positional(pages) => {
                let layout = if pipeline == Pipeline::LabeledTokens {
                    self.token_header_detector().detect(pages)
                } else {
                    self.gap_detector().detect(pages)
                };
                DetectionReport::from_layout(kind, pipeline, layout, BoundaryValues::Points)
            }
            DocumentInput::Lines(lines) => DetectionReport::from_layout(
                kind,
                pipeline,
                self.header_detector().detect(lines),
                BoundaryValues::Characters,
            ),
            DocumentInput::OcrTranscript(_) => DetectionReport {
                kind,
                pipeline,
                degraded_pipeline: true,
                source: None,
                boundaries: None,
                fields: Vec::new(),
                header_line: None,
            },
        })
    }

    fn layout_message<B: Copy + PartialOrd>(layout: &ColumnLayout<B>) -> String {
        format!(
            "Detected {} columns from {}",
            layout.schema.column_count(),
            layout.source
        )
    }

    fn positional_gap(&self, pages: &[Page], progress: &dyn ProgressCallback) -> Table {
        let layout = self.gap_detector().detect(pages);
        let mut tracker = ProgressTracker::new(progress, &self.config.progress, pages.len());
        tracker.milestone(START_PERCENT, &Self::layout_message(&layout));

        let grouper = self.grouper();
        let mut rows: Vec<Row> = Vec::new();
        for (i, page) in pages.iter().enumerate() {
            rows.extend(
                grouper
                    .group(page)
                    .iter()
                    .filter_map(|line| bucketize_tokens(line, &layout.schema)),
            );
            tracker.unit_done(i, "page");
        }

        Table::Positional(rows)
    }

    fn labeled_tokens(&self, pages: &[Page], progress: &dyn ProgressCallback) -> Table {
        let layout = self.token_header_detector().detect(pages);
        let mut tracker = ProgressTracker::new(progress, &self.config.progress, pages.len());
        tracker.milestone(START_PERCENT, &Self::layout_message(&layout));

        let grouper = self.grouper();
        let mut stitcher = self.stitcher(&layout.fields);
        for (i, page) in pages.iter().enumerate() {
            for line in grouper.group(page) {
                if let Some(row) = bucketize_tokens(&line, &layout.schema) {
                    stitcher.push(&row, &line_text(&line));
                }
            }
            tracker.unit_done(i, "page");
        }

        Table::Transactions(stitcher.finish())
    }

    fn fixed_width(&self, lines: &[String], progress: &dyn ProgressCallback) -> Table {
        let layout = self.header_detector().detect(lines);
        let mut tracker = ProgressTracker::new(progress, &self.config.progress, lines.len());
        tracker.milestone(START_PERCENT, &Self::layout_message(&layout));

        let mut stitcher = self.stitcher(&layout.fields);
        for (i, line) in lines.iter().enumerate() {
            if let Some(row) = bucketize_text(line, &layout.schema) {
                stitcher.push(&row, line);
            }
            tracker.unit_done(i, "line");
        }

        Table::Transactions(stitcher.finish())
    }

    /// Splits every non-blank transcript line on whitespace. Rows are
    /// padded to the widest line so the table stays rectangular.
    fn ocr_words(text: &str, progress: &dyn ProgressCallback) -> Table {
        progress.report(START_PERCENT, "Splitting OCR transcript");

        let words: Vec<Vec<String>> = text
            .lines()
            .map(|line| line.split_whitespace().map(str::to_owned).collect::<Vec<_>>())
            .filter(|words| !words.is_empty())
            .collect();
        let width = words.iter().map(Vec::len).max().unwrap_or(0);

        let rows = words
            .into_iter()
            .map(|mut cells| {
                cells.resize(width, String::new());
                Row::new(cells)
            })
            .collect();

        progress.report(END_PERCENT, "OCR transcript split");
        Table::Positional(rows)
    }
}

#[cfg(test)]
mod tests {
    use statement_table_models::PositionedToken;

    use super::*;
    use crate::progress::NullProgress;

    fn token(text: &str, x_start: f64, x_end: f64, y: f64) -> PositionedToken {
        PositionedToken::new(text, x_start, x_end, y)
    }

    #[test]
    fn resolves_pipelines_by_kind_and_shape() {
        assert_eq!(
            Pipeline::resolve(ConversionType::Generic, InputShape::Positional).unwrap(),
            Pipeline::PositionalGap
        );
        assert_eq!(
            Pipeline::resolve(ConversionType::Generic, InputShape::Lines).unwrap(),
            Pipeline::FixedWidth
        );
        assert_eq!(
            Pipeline::resolve(ConversionType::LabeledPdfTable, InputShape::Positional).unwrap(),
            Pipeline::LabeledTokens
        );
        assert!(matches!(
            Pipeline::resolve(ConversionType::FixedWidthReport, InputShape::Positional),
            Err(ExtractError::UnsupportedInput(_))
        ));
        assert!(matches!(
            Pipeline::resolve(ConversionType::LabeledPdfTable, InputShape::OcrTranscript),
            Err(ExtractError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn unsupported_input_wins_over_empty_input() {
        let err = Extractor::default()
            .extract(
                ConversionType::FixedWidthReport,
                &DocumentInput::Positional(Vec::new()),
                &NullProgress,
            )
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedInput(_)));
    }

    #[test]
    fn generic_positional_rows_are_not_stitched() {
        let page = vec![
            token("03-04-2025", 10.0, 60.0, 10.0),
            token("TRF", 200.0, 220.0, 10.0),
            token("500.00", 400.0, 440.0, 10.0),
            token("to", 200.0, 210.0, 30.0),
        ];
        let table = Extractor::default()
            .extract(
                ConversionType::Generic,
                &DocumentInput::Positional(vec![page]),
                &NullProgress,
            )
            .unwrap();

        let Table::Positional(rows) = table else {
            panic!("expected positional rows");
        };
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells(), ["03-04-2025", "TRF", "500.00"]);
        assert_eq!(rows[1].cells(), ["", "to", ""]);
    }

    #[test]
    fn labeled_tokens_are_stitched_into_records() {
        let page = vec![
            token("Date", 60.0, 85.0, 50.0),
            token("Particulars", 130.0, 190.0, 50.0),
            token("Withdrawals", 340.0, 400.0, 50.0),
            token("Deposits", 420.0, 470.0, 50.0),
            token("Balance", 500.0, 540.0, 50.0),
            token("03-04-2025", 60.0, 100.0, 70.0),
            token("NEFT", 130.0, 150.0, 70.0),
            token("8,000.00", 350.0, 390.0, 70.0),
            token("12,000.00Cr", 500.0, 550.0, 70.0),
            token("ACME", 130.0, 150.0, 82.0),
        ];
        let table = Extractor::default()
            .extract(
                ConversionType::LabeledPdfTable,
                &DocumentInput::Positional(vec![page]),
                &NullProgress,
            )
            .unwrap();

        let Table::Transactions(records) = table else {
            panic!("expected transactions");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].particulars, "NEFT ACME");
        assert_eq!(records[0].withdrawal.unwrap().to_string(), "8000.00");
        assert!(records[0].deposit.is_none());
        assert_eq!(records[0].balance.unwrap().to_string(), "12000.00");
    }

    #[test]
    fn ocr_transcript_rows_are_padded() {
        let table = Extractor::default()
            .extract(
                ConversionType::Generic,
                &DocumentInput::OcrTranscript("03-04-2025 TRF 10.00\n\nTotal 10.00\n".to_owned()),
                &NullProgress,
            )
            .unwrap();

        assert_eq!(
            table.rows(),
            vec![
                vec!["03-04-2025", "TRF", "10.00"],
                vec!["Total", "10.00", ""],
            ]
        );
    }

    #[test]
    fn detect_reports_header_layout_for_lines() {
        let lines = vec![
            "DATE       PARTICULARS          BALANCE".to_owned(),
            "03-04-2025 TRF                  10.00".to_owned(),
        ];
        let report = Extractor::default()
            .detect(ConversionType::FixedWidthReport, &DocumentInput::Lines(lines))
            .unwrap();

        assert_eq!(report.source, Some(BoundarySource::HeaderKeywords));
        assert_eq!(report.header_line, Some(0));
        assert_eq!(
            report.fields,
            vec![Some(Field::Date), Some(Field::Particulars), Some(Field::Balance)]
        );
        assert!(matches!(report.boundaries, Some(BoundaryValues::Characters(_))));
    }

    #[test]
    fn header_only_report_is_an_empty_extraction() {
        let lines = vec!["DATE  PARTICULARS  WITHDRAWALS  BALANCE".to_owned()];
        let err = Extractor::default()
            .extract(
                ConversionType::FixedWidthReport,
                &DocumentInput::Lines(lines),
                &NullProgress,
            )
            .unwrap_err();
        assert!(matches!(err, ExtractError::EmptyExtraction));
    }
}
