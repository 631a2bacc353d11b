//! Multi-line transaction stitching.
//!
//! Every bucketed row is classified as an anchor, a continuation or a row
//! to skip. An anchor flushes the open record and opens a new one; a
//! continuation merges into the open record; skipped rows (repeated
//! headers, separators, banners and footers) never touch a record.

use statement_table_models::{Amount, Field, Row, StatementDate, TransactionRecord};
use strum_macros::{AsRefStr, Display};

use crate::boundary::header::{char_offset, is_header_line};
use crate::config::{HeaderConfig, StitchConfig};
use crate::normalize::{DATE_PATTERN, FieldNormalizer};

/// How a row takes part in stitching.
#[derive(Debug, Clone, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum RowKind {
    /// Starts a new record. Holds the raw date text that made it an anchor.
    Anchor(String),
    /// Extends the open record.
    Continuation,
    /// Neither anchor nor continuation.
    Skip,
}

/// Column index of every field in a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldColumns {
    date: usize,
    particulars: Option<usize>,
    reference: Option<usize>,
    withdrawals: Option<usize>,
    deposits: Option<usize>,
    balance: Option<usize>,
}

impl FieldColumns {
    /// Maps fields to the first column holding them. Without a date column,
    /// the first column is treated as the date column.
    #[must_use]
    pub fn from_fields(fields: &[Option<Field>]) -> Self {
        let find = |field| fields.iter().position(|f| *f == Some(field));
        let date = find(Field::Date).unwrap_or_else(|| {
            log::warn!("Layout has no date column, using the first column");
            0
        });
        Self {
            date,
            particulars: find(Field::Particulars),
            reference: find(Field::Reference),
            withdrawals: find(Field::Withdrawals),
            deposits: find(Field::Deposits),
            balance: find(Field::Balance),
        }
    }

    fn text<'r>(column: Option<usize>, row: &'r Row) -> &'r str {
        column.map_or("", |c| row.cell(c))
    }
}

/// Decides whether a row is an anchor, a continuation or skipped.
#[derive(Debug, Clone, Copy)]
pub struct RowClassifier<'a> {
    header: &'a HeaderConfig,
    stitch: &'a StitchConfig,
}

impl<'a> RowClassifier<'a> {
    /// Creates a classifier.
    #[must_use]
    pub const fn new(header: &'a HeaderConfig, stitch: &'a StitchConfig) -> Self {
        Self { header, stitch }
    }

    /// Classifies `row`, whose full physical line text is `text`.
    ///
    /// A date at the start of the date column makes the row an anchor even
    /// when its narration contains separator characters or a skip phrase.
    /// Repeated header lines are always skipped.
    #[must_use]
    pub fn classify(&self, row: &Row, text: &str, date_column: usize) -> RowKind {
        if is_header_line(text, self.header) {
            return RowKind::Skip;
        }

        let date_cell = row.cell(date_column);
        if let Some(m) = DATE_PATTERN.find(date_cell)
            && char_offset(date_cell, m.start()) <= self.stitch.anchor_max_offset
        {
            return RowKind::Anchor(m.as_str().to_owned());
        }

        if self.is_separator(text) || self.has_skip_phrase(text) {
            return RowKind::Skip;
        }

        if !text.to_ascii_lowercase().contains("balance")
            && let Some(marker) = self
                .stitch
                .carry_forward_markers
                .iter()
                .find(|m| !m.is_empty() && text.contains(m.as_str()))
        {
            return RowKind::Anchor(marker.clone());
        }

        RowKind::Continuation
    }

    /// A separator line holds nothing but `-`, `=` and whitespace, with a
    /// run of at least `separator_min_run` of one of them.
    fn is_separator(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.is_empty()
            || !trimmed
                .chars()
                .all(|c| c == '-' || c == '=' || c.is_whitespace())
        {
            return false;
        }

        let min_run = self.stitch.separator_min_run.max(1);
        ['-', '='].iter().any(|&c| longest_run(trimmed, c) >= min_run)
    }

    fn has_skip_phrase(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.stitch
            .skip_phrases
            .iter()
            .any(|phrase| !phrase.is_empty() && lower.contains(&phrase.to_lowercase()))
    }
}

fn longest_run(text: &str, target: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == target {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// The stitching state machine.
///
/// At most one record is open at a time. Records are emitted in encounter
/// order and never reopened.
#[derive(Debug)]
pub struct Stitcher<'a> {
    classifier: RowClassifier<'a>,
    normalizer: &'a FieldNormalizer,
    columns: FieldColumns,
    open: Option<TransactionRecord>,
    records: Vec<TransactionRecord>,
    dropped: usize,
}

impl<'a> Stitcher<'a> {
    /// Creates a stitcher with no open record.
    #[must_use]
    pub const fn new(
        classifier: RowClassifier<'a>,
        normalizer: &'a FieldNormalizer,
        columns: FieldColumns,
    ) -> Self {
        Self {
            classifier,
            normalizer,
            columns,
            open: None,
            records: Vec::new(),
            dropped: 0,
        }
    }

    /// The currently open record, if any.
    #[must_use]
    pub const fn open_record(&self) -> Option<&TransactionRecord> {
        self.open.as_ref()
    }

    /// Feeds one row and returns how it was classified.
    pub fn push(&mut self, row: &Row, text: &str) -> RowKind {
        let kind = self.classifier.classify(row, text, self.columns.date);

        match &kind {
            RowKind::Anchor(date) => {
                self.flush();
                self.open = Some(self.open_from(row, date));
            }
            RowKind::Continuation => {
                if let Some(mut record) = self.open.take() {
                    self.merge(&mut record, row);
                    self.open = Some(record);
                } else {
                    log::debug!("Dropping continuation row with no open record: {text:?}");
                    self.dropped += 1;
                }
            }
            RowKind::Skip => log::trace!("Skipping row {text:?}"),
        }

        kind
    }

    /// Flushes the open record and returns every record in encounter order.
    #[must_use]
    pub fn finish(mut self) -> Vec<TransactionRecord> {
        self.flush();
        if self.dropped > 0 {
            log::debug!(
                "{} continuation row(s) dropped before the first anchor",
                self.dropped
            );
        }
        self.records
    }

    fn flush(&mut self) {
        if let Some(mut record) = self.open.take() {
            record.particulars = collapse_whitespace(&record.particulars);
            record.reference = collapse_whitespace(&record.reference);
            self.records.push(record);
        }
    }

    fn open_from(&self, row: &Row, date: &str) -> TransactionRecord {
        let columns = &self.columns;

        // Text sharing the date column (other than the date itself) belongs
        // to the narration.
        let leftover = row.cell(columns.date).replacen(date, "", 1);
        let mut particulars = leftover.trim().to_owned();
        append(
            &mut particulars,
            FieldColumns::text(columns.particulars, row),
        );

        let date = if DATE_PATTERN.is_match(date) {
            self.normalizer.parse_date(date)
        } else {
            StatementDate::Raw(date.to_owned())
        };

        TransactionRecord {
            date,
            particulars,
            reference: FieldColumns::text(columns.reference, row).to_owned(),
            withdrawal: self.amount(columns.withdrawals, row),
            deposit: self.amount(columns.deposits, row),
            balance: self.amount(columns.balance, row),
        }
    }

    fn merge(&self, record: &mut TransactionRecord, row: &Row) {
        let columns = &self.columns;

        append(
            &mut record.particulars,
            FieldColumns::text(columns.particulars, row),
        );
        append(
            &mut record.reference,
            FieldColumns::text(columns.reference, row),
        );

        accumulate(&mut record.withdrawal, self.amount(columns.withdrawals, row));
        accumulate(&mut record.deposit, self.amount(columns.deposits, row));

        if let Some(balance) = self.amount(columns.balance, row) {
            record.balance = Some(balance);
        }
    }

    fn amount(&self, column: Option<usize>, row: &Row) -> Option<Amount> {
        self.normalizer
            .parse_amount(FieldColumns::text(column, row))
    }
}

/// Appends `text` with a separating space; sets it when `target` is empty.
fn append(target: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !target.is_empty() {
        target.push(' ');
    }
    target.push_str(text);
}

/// Adds a non-zero amount to an existing one, or sets it.
fn accumulate(target: &mut Option<Amount>, amount: Option<Amount>) {
    let Some(amount) = amount.filter(|a| !a.is_zero()) else {
        return;
    };
    match target {
        Some(existing) => existing.accumulate(amount),
        None => *target = Some(amount),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
