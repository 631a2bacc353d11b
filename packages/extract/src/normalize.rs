//! Currency and date normalization.
//!
//! Neither parser ever fails the document: an unparseable amount becomes
//! `None` and an unparseable date is kept as its raw text.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use statement_table_models::{Amount, BalanceMarker, StatementDate};

use crate::config::ExtractionConfig;

/// Day-month-year with `-` or `/`, or year-first.
pub static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{2}[-/][0-9]{2}[-/][0-9]{4}|[0-9]{4}[-/][0-9]{2}[-/][0-9]{2}")
        .expect("valid regex")
});

/// Trailing `Cr`/`Dr` marker, optionally followed by a dot.
static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(cr|dr)\.?$").expect("valid regex"));

/// Digits with at most one dot and an optional leading minus.
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)$").expect("valid regex"));

/// Converts raw column text into typed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNormalizer {
    date_formats: Vec<String>,
    currency_codes: Vec<String>,
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl FieldNormalizer {
    /// Creates a normalizer from the date and currency sections of
    /// `config`.
    #[must_use]
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            date_formats: config.dates.formats.clone(),
            currency_codes: config
                .currency
                .codes
                .iter()
                .map(|c| c.to_ascii_uppercase())
                .collect(),
        }
    }

    /// Parses a currency amount.
    ///
    /// Strips a trailing `Cr`/`Dr` marker, any configured currency code at
    /// either end, thousands separators and internal whitespace. Returns
    /// `None` for empty or non-numeric text. The marker is recorded on the
    /// [`Amount`] but does not change the sign.
    #[must_use]
    pub fn parse_amount(&self, raw: &str) -> Option<Amount> {
        let mut text = raw.trim().to_owned();
        if text.is_empty() {
            return None;
        }

        let mut marker = None;
        if let Some(m) = MARKER_RE.find(&text) {
            marker = BalanceMarker::from_str(&m.as_str()[..2]).ok();
            text.truncate(m.start());
        }

        text = self.strip_currency_codes(text.trim());
        text.retain(|c| c != ',' && !c.is_whitespace());

        if !NUMBER_RE.is_match(&text) {
            log::trace!("Unparseable amount {raw:?}");
            return None;
        }

        Decimal::from_str(&text)
            .ok()
            .map(|value| Amount { value, marker })
    }

    fn strip_currency_codes(&self, text: &str) -> String {
        let mut text = text;
        for code in &self.currency_codes {
            let upper = text.to_ascii_uppercase();
            if upper.starts_with(code.as_str()) {
                text = text[code.len()..].trim_start();
            } else if upper.ends_with(code.as_str()) {
                text = text[..text.len() - code.len()].trim_end();
            }
        }
        text.to_owned()
    }

    /// Parses a date with each configured format in turn, falling back to
    /// the trimmed raw text.
    #[must_use]
    pub fn parse_date(&self, raw: &str) -> StatementDate {
        let text = raw.trim();
        self.date_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
            .map_or_else(|| StatementDate::Raw(text.to_owned()), StatementDate::Parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(s: &str) -> Option<Decimal> {
        FieldNormalizer::default().parse_amount(s).map(|a| a.value)
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parses_amount_with_debit_marker_and_commas() {
        assert_eq!(amount("8,000.00Dr"), Some(dec("8000")));
    }

    #[test]
    fn empty_and_dash_are_absent() {
        assert_eq!(amount(""), None);
        assert_eq!(amount("   "), None);
        assert_eq!(amount("-"), None);
    }

    #[test]
    fn parses_plain_decimal() {
        assert_eq!(amount("1234.56"), Some(dec("1234.56")));
    }

    #[test]
    fn marker_is_recorded_but_sign_is_unchanged() {
        let parsed = FieldNormalizer::default().parse_amount("425115.55 DR").unwrap();
        assert_eq!(parsed.value, dec("425115.55"));
        assert_eq!(parsed.marker, Some(BalanceMarker::Dr));

        let credit = FieldNormalizer::default().parse_amount("12.00cr").unwrap();
        assert_eq!(credit.value, dec("12"));
        assert_eq!(credit.marker, Some(BalanceMarker::Cr));
    }

    #[test]
    fn strips_currency_code_at_either_end() {
        assert_eq!(amount("INR 1,00,000.50"), Some(dec("100000.50")));
        assert_eq!(amount("250.00 inr"), Some(dec("250")));
    }

    #[test]
    fn keeps_leading_minus() {
        assert_eq!(amount("-12.5"), Some(dec("-12.5")));
    }

    #[test]
    fn rejects_text_and_multiple_dots() {
        assert_eq!(amount("TRF"), None);
        assert_eq!(amount("1.2.3"), None);
        assert_eq!(amount("12-04"), None);
    }

    #[test]
    fn split_token_amount_is_rejoined() {
        assert_eq!(amount("8,000 .00"), Some(dec("8000.00")));
    }

    #[test]
    fn parses_day_month_year() {
        assert_eq!(
            FieldNormalizer::default().parse_date(" 03-04-2025 "),
            StatementDate::Parsed(NaiveDate::from_ymd_opt(2025, 4, 3).unwrap())
        );
    }

    #[test]
    fn unparseable_date_is_kept_verbatim() {
        assert_eq!(
            FieldNormalizer::default().parse_date("31-02-2025"),
            StatementDate::Raw("31-02-2025".to_owned())
        );
        assert_eq!(
            FieldNormalizer::default().parse_date("B/F"),
            StatementDate::Raw("B/F".to_owned())
        );
    }

    #[test]
    fn date_pattern_accepts_slash_and_year_first() {
        assert!(DATE_PATTERN.is_match("03/04/2025"));
        assert!(DATE_PATTERN.is_match("2025-04-03"));
        assert!(!DATE_PATTERN.is_match("3-4-25"));
    }
}
