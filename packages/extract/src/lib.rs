#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Transaction-table extraction for bank statements.
//!
//! The pipeline runs strictly forward:
//!
//! 1. [`grouper::LineGrouper`] clusters positioned tokens into visual lines.
//! 2. A [`boundary::BoundaryDetector`] infers a column layout from a prefix
//!    of the document, either from whitespace gaps or from keyword headers.
//! 3. [`bucketize`] assigns every token or character range to a column.
//! 4. [`stitch::Stitcher`] merges continuation lines into the open
//!    transaction, normalizing amounts and dates with
//!    [`normalize::FieldNormalizer`].
//! 5. A [`sink::TableSink`] writes the ordered table.
//!
//! [`Extractor`] wires these together for a whole document. Anomalies such
//! as a missing header or an unparseable amount degrade the output rather
//! than failing; only unsupported input and documents with no text are
//! errors.

pub mod boundary;
pub mod bucketize;
pub mod config;
pub mod document;
pub mod grouper;
pub mod normalize;
pub mod progress;
pub mod sink;
pub mod stitch;

pub use config::ExtractionConfig;
pub use document::{DetectionReport, DocumentInput, Extractor, Pipeline};
pub use progress::{NullProgress, ProgressCallback, null_progress};
pub use sink::{CsvSink, JsonSink, TableSink};

/// Errors that abort extraction of a document.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The conversion type cannot handle the input, or the input type is
    /// not recognized.
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// The document contains no text, or no rows survived extraction.
    #[error("No text found in document")]
    EmptyExtraction,

    /// The configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The configuration could not be rendered.
    #[error("Failed to render configuration: {0}")]
    ConfigRender(#[from] toml::ser::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing CSV failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization or parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use statement_table_models::{ConversionType, Table, TransactionRecord};

    use super::*;

    const HEADER: &str = "DATE      PARTICULARS                             CHQ.NO.             WITHDRAWALS         DEPOSITS            BALANCE";
    const ROW: &str = "03-04-2025 Test Margin Case                       509312716679      8000.00                                   425115.55Dr";

    fn report(lines: &[&str]) -> Result<Table, ExtractError> {
        Extractor::default().extract(
            ConversionType::FixedWidthReport,
            &DocumentInput::Lines(lines.iter().map(|&l| l.to_owned()).collect()),
            &NullProgress,
        )
    }

    fn records(table: Table) -> Vec<TransactionRecord> {
        match table {
            Table::Transactions(records) => records,
            Table::Positional(_) => panic!("expected transactions"),
        }
    }

    #[test]
    fn fixed_width_report_yields_one_record() {
        let records = records(report(&["", HEADER, ROW]).unwrap());

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.date.to_string(), "2025-04-03");
        assert_eq!(record.particulars, "Test Margin Case");
        assert_eq!(record.reference, "509312716679");
        assert_eq!(
            record.withdrawal.map(|a| a.value),
            Some(Decimal::from_str("8000.0").unwrap())
        );
        assert_eq!(record.deposit, None);
        assert_eq!(
            record.balance.map(|a| a.value),
            Some(Decimal::from_str("425115.55").unwrap())
        );
    }

    #[test]
    fn continuation_line_extends_particulars() {
        let continuation = "           TRANSFER TO SAVINGS";
        let records = records(report(&[HEADER, ROW, continuation]).unwrap());

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].particulars,
            "Test Margin Case TRANSFER TO SAVINGS"
        );
    }

    #[test]
    fn dashed_narration_still_opens_its_own_record() {
        let line = |date: &str, particulars: &str, withdrawal: &str, deposit: &str| {
            format!("{date:<11}{particulars:<24}{:<28}{withdrawal:<22}{deposit:<19}", "")
        };
        let first = line("03-04-2025", "NEFT FROM ACME", "", "900.00");
        let second = line("04-04-2025", "UPI----PAYTM", "850.00", "");
        let continuation = line("", "MERCHANT XYZ", "", "");
        let rule = "-".repeat(HEADER.len());

        let records =
            records(report(&[HEADER, &rule, &first, &second, &continuation, &rule]).unwrap());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].particulars, "NEFT FROM ACME");
        assert_eq!(records[0].deposit.unwrap().to_string(), "900.00");
        assert_eq!(records[1].date.to_string(), "2025-04-04");
        assert_eq!(records[1].particulars, "UPI----PAYTM MERCHANT XYZ");
        assert_eq!(records[1].withdrawal.unwrap().to_string(), "850.00");
    }

    #[test]
    fn empty_document_is_an_error() {
        assert!(matches!(report(&[]), Err(ExtractError::EmptyExtraction)));

        let err = Extractor::default()
            .extract(
                ConversionType::Generic,
                &DocumentInput::Positional(vec![Vec::new(), Vec::new()]),
                &NullProgress,
            )
            .unwrap_err();
        assert!(matches!(err, ExtractError::EmptyExtraction));
    }

    #[test]
    fn report_without_header_uses_default_offsets() {
        let line = format!(
            "{:<11}{:<34}{:<20}{:<20}{:<20}{}",
            "03-04-2025", "NEFT", "", "", "250.00", "1,250.00"
        );
        let records = records(report(&[&line]).unwrap());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].particulars, "NEFT");
        assert_eq!(records[0].withdrawal, None);
        assert_eq!(records[0].deposit.unwrap().to_string(), "250.00");
        assert_eq!(records[0].balance.unwrap().to_string(), "1250.00");
    }

    #[test]
    fn extraction_is_deterministic() {
        let first = report(&[HEADER, ROW]).unwrap();
        let second = report(&[HEADER, ROW]).unwrap();
        assert_eq!(first, second);
    }
}
