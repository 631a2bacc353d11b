//! Tunable parameters for every extraction stage.
//!
//! All thresholds, keyword sets and fallback offsets live in one
//! [`ExtractionConfig`] rather than being baked into per-layout parsers.
//! Every section has working defaults, so a TOML file only needs the keys
//! it overrides:
//!
//! ```toml
//! line_tolerance = 10.0
//!
//! [gap]
//! threshold = 20.0
//!
//! [[header.keywords]]
//! label = "NARRATION"
//! field = "particulars"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use statement_table_models::Field;

use crate::ExtractError;

/// Vertical tolerance used by the default line grouper.
pub const DEFAULT_LINE_TOLERANCE: f64 = 5.0;

/// Vertical tolerance of the looser alternate grouper.
pub const LOOSE_LINE_TOLERANCE: f64 = 10.0;

/// Complete extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Maximum vertical distance between tokens on the same visual line.
    pub line_tolerance: f64,
    /// Gap-based boundary detection.
    pub gap: GapConfig,
    /// Header-keyword boundary detection.
    pub header: HeaderConfig,
    /// Labeled positional tables.
    pub pdf_table: PdfTableConfig,
    /// Row classification and stitching.
    pub stitch: StitchConfig,
    /// Date normalization.
    pub dates: DateConfig,
    /// Currency normalization.
    pub currency: CurrencyConfig,
    /// Progress reporting cadence.
    pub progress: ProgressConfig,
    /// Synthesis of positional tokens from plain text layouts.
    pub text_layout: TextLayoutConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            line_tolerance: DEFAULT_LINE_TOLERANCE,
            gap: GapConfig::default(),
            header: HeaderConfig::default(),
            pdf_table: PdfTableConfig::default(),
            stitch: StitchConfig::default(),
            dates: DateConfig::default(),
            currency: CurrencyConfig::default(),
            progress: ProgressConfig::default(),
            text_layout: TextLayoutConfig::default(),
        }
    }
}

impl ExtractionConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Config`] if the text is not valid TOML or a
    /// key has the wrong type.
    pub fn from_toml_str(text: &str) -> Result<Self, ExtractError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Io`] if the file cannot be read, or
    /// [`ExtractError::Config`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded extraction config from {}", path.display());
        Ok(config)
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::ConfigRender`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ExtractError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Parameters of gap-based boundary detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Minimum distance between consecutive token midpoints to count as a
    /// column gap.
    pub threshold: f64,
    /// How many of the widest gaps become boundaries.
    pub max_gaps: usize,
    /// Number of leading pages sampled.
    pub sample_pages: usize,
    /// Boundaries used when the sample contains no tokens.
    pub default_boundaries: Vec<f64>,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            threshold: 15.0,
            max_gaps: 6,
            sample_pages: 3,
            default_boundaries: vec![100.0, 200.0, 300.0, 400.0],
        }
    }
}

/// A header label and the field it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderKeyword {
    /// Label text as printed (matched case-insensitively).
    pub label: String,
    /// Field the labeled column holds.
    pub field: Field,
}

impl HeaderKeyword {
    fn new(label: &str, field: Field) -> Self {
        Self {
            label: label.to_owned(),
            field,
        }
    }
}

/// Parameters of header-keyword boundary detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Number of leading lines searched for a header.
    pub scan_lines: usize,
    /// Keywords a line must contain to count as a header.
    pub min_keywords: usize,
    /// Fixed-width column ends used when no header is found.
    pub default_offsets: Vec<usize>,
    /// Fields of the default columns, one more than `default_offsets`.
    pub default_fields: Vec<Field>,
    /// Lines after the header probed for a sample date.
    pub date_probe_lines: usize,
    /// Recognised column labels.
    pub keywords: Vec<HeaderKeyword>,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            scan_lines: 20,
            min_keywords: 3,
            default_offsets: vec![11, 45, 65, 85, 105],
            default_fields: Field::ALL.to_vec(),
            date_probe_lines: 9,
            keywords: vec![
                HeaderKeyword::new("DATE", Field::Date),
                HeaderKeyword::new("PARTICULARS", Field::Particulars),
                HeaderKeyword::new("CHQ.NO", Field::Reference),
                HeaderKeyword::new("WITHDRAWALS", Field::Withdrawals),
                HeaderKeyword::new("DEPOSITS", Field::Deposits),
                HeaderKeyword::new("BALANCE", Field::Balance),
            ],
        }
    }
}

/// Fallback layout for labeled positional tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfTableConfig {
    /// Column boundaries used when no header line is found.
    pub default_boundaries: Vec<f64>,
    /// Fields of the default columns, one more than `default_boundaries`.
    pub default_fields: Vec<Field>,
}

impl Default for PdfTableConfig {
    fn default() -> Self {
        Self {
            default_boundaries: vec![120.0, 330.0, 410.0, 480.0],
            default_fields: vec![
                Field::Date,
                Field::Particulars,
                Field::Withdrawals,
                Field::Deposits,
                Field::Balance,
            ],
        }
    }
}

/// Row classification rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Phrases marking banner, footer and disclaimer lines.
    pub skip_phrases: Vec<String>,
    /// Shortest run of `-` or `=` that makes a line a separator. Only
    /// lines made of nothing but these characters and whitespace qualify.
    pub separator_min_run: usize,
    /// Markers of brought-forward rows, which open a record without a date.
    pub carry_forward_markers: Vec<String>,
    /// Characters allowed before the date in the date column.
    pub anchor_max_offset: usize,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            skip_phrases: [
                "Page Total",
                "Grand Total",
                "STATEMENT OF ACCOUNT",
                "Transaction Details",
                "Printed By",
                "Unless the constituent",
                "Date Stamp Manager",
            ]
            .map(str::to_owned)
            .to_vec(),
            separator_min_run: 4,
            carry_forward_markers: vec!["B/F".to_owned()],
            anchor_max_offset: 0,
        }
    }
}

/// Date parsing formats, tried in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    /// `chrono` format strings.
    pub formats: Vec<String>,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            formats: ["%d-%m-%Y", "%d/%m/%Y", "%Y-%m-%d"]
                .map(str::to_owned)
                .to_vec(),
        }
    }
}

/// Currency markers stripped before parsing amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// Currency codes (matched case-insensitively at either end).
    pub codes: Vec<String>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            codes: vec!["INR".to_owned()],
        }
    }
}

/// Progress reporting cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Minimum percentage step between two page updates.
    pub every_percent: u8,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { every_percent: 5 }
    }
}

/// Scale used when plain text is turned into positional tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextLayoutConfig {
    /// Horizontal units per character.
    pub char_width: f64,
    /// Vertical units per line.
    pub line_height: f64,
}

impl Default for TextLayoutConfig {
    fn default() -> Self {
        Self {
            char_width: 6.0,
            line_height: 12.0,
        }
    }
}
