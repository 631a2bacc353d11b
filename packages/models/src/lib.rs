#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data model for bank-statement table extraction.
//!
//! Token and line producers emit [`PositionedToken`]s grouped into
//! [`Page`]s (or plain text lines). The extraction core turns those into
//! [`Row`]s aligned to a [`ColumnSchema`], stitches rows into
//! [`TransactionRecord`]s and hands a [`Table`] to a sink.

pub mod job;
pub mod schema;

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use schema::{ColumnSchema, SchemaError};

/// A word of text with its horizontal extent and vertical position on a
/// rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedToken {
    /// The token text.
    pub text: String,
    /// Left edge of the token.
    pub x_start: f64,
    /// Right edge of the token.
    pub x_end: f64,
    /// Distance of the token from the top of the page.
    pub vertical_position: f64,
}

impl PositionedToken {
    /// Creates a token.
    #[must_use]
    pub fn new(text: impl Into<String>, x_start: f64, x_end: f64, vertical_position: f64) -> Self {
        Self {
            text: text.into(),
            x_start,
            x_end,
            vertical_position,
        }
    }

    /// Horizontal midpoint of the token.
    ///
    /// Midpoints are used instead of left edges so that slightly leaning or
    /// right-aligned text still lands in the right column.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.x_start + self.x_end) / 2.0
    }
}

/// All tokens of one page, in producer order.
pub type Page = Vec<PositionedToken>;

/// Tokens that share a visual line, ordered left to right.
pub type TokenLine = Vec<PositionedToken>;

/// A named transaction column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    /// Transaction (value) date.
    Date,
    /// Free-text narration.
    Particulars,
    /// Cheque or reference number.
    Reference,
    /// Debit amount.
    Withdrawals,
    /// Credit amount.
    Deposits,
    /// Running balance.
    Balance,
}

impl Field {
    /// Every field, in output column order.
    pub const ALL: [Self; 6] = [
        Self::Date,
        Self::Particulars,
        Self::Reference,
        Self::Withdrawals,
        Self::Deposits,
        Self::Balance,
    ];

    /// Column heading used when the table is written out.
    #[must_use]
    pub const fn heading(self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Particulars => "Particulars",
            Self::Reference => "Reference/Cheque-No",
            Self::Withdrawals => "Withdrawals",
            Self::Deposits => "Deposits",
            Self::Balance => "Balance",
        }
    }
}

/// Which converter a job runs, resolved once when the job starts.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ConversionType {
    /// Auto-detect from the input shape. This is a degraded mode: PDF input
    /// is bucketed by whitespace gaps without multi-line stitching, and OCR
    /// transcripts are split on whitespace with no column inference.
    #[default]
    Generic,
    /// Fixed-width line-oriented report with a keyword header.
    FixedWidthReport,
    /// Positional PDF table whose columns are labeled by keyword headers.
    LabeledPdfTable,
}

/// Credit/debit suffix seen on an amount (`Cr` or `Dr`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum BalanceMarker {
    /// Credit.
    Cr,
    /// Debit.
    Dr,
}

/// A parsed currency amount.
///
/// The credit/debit marker is recorded but never applied as a sign, so
/// withdrawals and deposits are reported as unsigned magnitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    /// Numeric value, exactly as printed (commas removed).
    pub value: Decimal,
    /// `Cr`/`Dr` suffix, if one was printed.
    pub marker: Option<BalanceMarker>,
}

impl Amount {
    /// Creates an amount with no credit/debit marker.
    #[must_use]
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            marker: None,
        }
    }

    /// Whether the numeric value is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Adds `other` to this amount. The existing marker wins; `other`'s
    /// marker is only taken when this amount has none.
    pub fn accumulate(&mut self, other: Self) {
        self.value += other.value;
        if self.marker.is_none() {
            self.marker = other.marker;
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A transaction date: parsed when possible, otherwise the raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatementDate {
    /// A calendar date.
    Parsed(NaiveDate),
    /// Text that could not be parsed, kept verbatim.
    Raw(String),
}

impl fmt::Display for StatementDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsed(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}

/// One logical transaction, possibly stitched from several physical lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction date.
    pub date: StatementDate,
    /// Narration, continuation lines joined with single spaces.
    pub particulars: String,
    /// Cheque or reference number.
    pub reference: String,
    /// Debit amount, `None` when absent or unparseable.
    pub withdrawal: Option<Amount>,
    /// Credit amount, `None` when absent or unparseable.
    pub deposit: Option<Amount>,
    /// Running balance after this transaction.
    pub balance: Option<Amount>,
}

impl TransactionRecord {
    /// Renders the record as output cells in [`Field::ALL`] order.
    #[must_use]
    pub fn cells(&self) -> Vec<String> {
        let amount = |a: Option<Amount>| a.map(|a| a.to_string()).unwrap_or_default();
        vec![
            self.date.to_string(),
            self.particulars.clone(),
            self.reference.clone(),
            amount(self.withdrawal),
            amount(self.deposit),
            amount(self.balance),
        ]
    }
}

/// One bucketed line: trimmed text per column, index-aligned with the
/// [`ColumnSchema`] that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<String>,
}

impl Row {
    /// Creates a row from already-trimmed cells.
    #[must_use]
    pub const fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Text of column `index`, or `""` when out of range.
    #[must_use]
    pub fn cell(&self, index: usize) -> &str {
        self.cells.get(index).map_or("", String::as_str)
    }

    /// All cells in column order.
    #[must_use]
    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Whether every cell is empty.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(String::is_empty)
    }
}

/// The ordered output of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum Table {
    /// Stitched transactions with named columns.
    Transactions(Vec<TransactionRecord>),
    /// Unnamed positional columns (auto-detect output).
    Positional(Vec<Row>),
}

impl Table {
    /// Number of output rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Transactions(records) => records.len(),
            Self::Positional(rows) => rows.len(),
        }
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column headings, or `None` for positional tables.
    #[must_use]
    pub fn headings(&self) -> Option<Vec<&'static str>> {
        match self {
            Self::Transactions(_) => Some(Field::ALL.iter().map(|f| f.heading()).collect()),
            Self::Positional(_) => None,
        }
    }

    /// Every row rendered as cells.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<String>> {
        match self {
            Self::Transactions(records) => records.iter().map(TransactionRecord::cells).collect(),
            Self::Positional(rows) => rows.iter().map(|r| r.cells().to_vec()).collect(),
        }
    }
}
