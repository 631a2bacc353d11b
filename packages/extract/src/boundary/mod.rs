//! Column boundary inference.
//!
//! Two strategies share the [`BoundaryDetector`] trait:
//!
//! - [`gap::GapDetector`] finds the widest horizontal whitespace gaps
//!   between token midpoints on positional pages.
//! - [`header::HeaderDetector`] locates a keyword header line in
//!   fixed-width text and derives character offsets from the label
//!   positions. [`pdf_header::TokenHeaderDetector`] applies the same idea
//!   to a header line made of positional tokens.
//!
//! Every strategy is deterministic and falls back to configured defaults
//! rather than failing.

pub mod gap;
pub mod header;
pub mod pdf_header;

use serde::Serialize;
use statement_table_models::{ColumnSchema, Field};
use strum_macros::{AsRefStr, Display};

pub use gap::GapDetector;
pub use header::HeaderDetector;
pub use pdf_header::TokenHeaderDetector;

/// Where a layout's boundaries came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BoundarySource {
    /// Widest whitespace gaps between token midpoints.
    GapAnalysis,
    /// Positions of header keyword labels.
    HeaderKeywords,
    /// Configured fallback boundaries (degraded mode).
    Defaults,
}

/// A column schema plus what each column holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnLayout<B> {
    /// Column boundaries.
    pub schema: ColumnSchema<B>,
    /// Field of each column, `None` for unlabeled columns. Always one entry
    /// per column.
    pub fields: Vec<Option<Field>>,
    /// How the boundaries were obtained.
    pub source: BoundarySource,
    /// Index of the header line within the scanned input, if one was found.
    pub header_line: Option<usize>,
}

impl<B: Copy + PartialOrd> ColumnLayout<B> {
    /// Creates a layout, padding or truncating `fields` to the schema's
    /// column count.
    #[must_use]
    pub fn new(
        schema: ColumnSchema<B>,
        mut fields: Vec<Option<Field>>,
        source: BoundarySource,
        header_line: Option<usize>,
    ) -> Self {
        fields.resize(schema.column_count(), None);
        Self {
            schema,
            fields,
            source,
            header_line,
        }
    }

    /// Creates a layout whose columns carry no field names.
    #[must_use]
    pub fn unlabeled(schema: ColumnSchema<B>, source: BoundarySource) -> Self {
        Self::new(schema, Vec::new(), source, None)
    }

    /// First column holding `field`.
    #[must_use]
    pub fn column_for(&self, field: Field) -> Option<usize> {
        self.fields.iter().position(|f| *f == Some(field))
    }

    /// Whether the layout came from configured defaults.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.source == BoundarySource::Defaults
    }
}

/// A boundary inference strategy.
pub trait BoundaryDetector {
    /// What the detector samples (pages of tokens, or text lines).
    type Input: ?Sized;
    /// Boundary coordinate type.
    type Boundary: Copy + PartialOrd;

    /// Infers a column layout from `input`.
    fn detect(&self, input: &Self::Input) -> ColumnLayout<Self::Boundary>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_fields_always_match_column_count() {
        let schema = ColumnSchema::new(vec![10, 20]).unwrap();
        let layout = ColumnLayout::new(
            schema,
            vec![Some(Field::Date)],
            BoundarySource::HeaderKeywords,
            Some(0),
        );
        assert_eq!(layout.fields.len(), 3);
        assert_eq!(layout.column_for(Field::Date), Some(0));
        assert_eq!(layout.column_for(Field::Balance), None);
    }

    #[test]
    fn defaults_are_degraded() {
        let layout = ColumnLayout::unlabeled(
            ColumnSchema::new(vec![1.0]).unwrap(),
            BoundarySource::Defaults,
        );
        assert!(layout.is_degraded());
        assert_eq!(layout.fields, vec![None, None]);
    }
}
