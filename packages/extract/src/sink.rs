//! Table serialization.

use std::io::Write;

use statement_table_models::Table;

use crate::ExtractError;

/// Receives the finished table of one document.
pub trait TableSink {
    /// Writes every row of `table`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying writer fails.
    fn write_table(&mut self, table: &Table) -> Result<(), ExtractError>;
}

/// Writes a table as CSV.
///
/// Transaction tables get a heading row; positional tables have no
/// column names and are written without one.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> CsvSink<W> {
    /// Creates a sink over `inner`.
    #[must_use]
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new().flexible(true).from_writer(inner),
        }
    }

    /// Flushes and returns the underlying writer.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Io`] if the final flush fails.
    pub fn into_inner(self) -> Result<W, ExtractError> {
        self.writer
            .into_inner()
            .map_err(|e| ExtractError::Io(e.into_error()))
    }
}

impl<W: Write> TableSink for CsvSink<W> {
    fn write_table(&mut self, table: &Table) -> Result<(), ExtractError> {
        if let Some(headings) = table.headings() {
            self.writer.write_record(&headings)?;
        }
        for row in table.rows() {
            self.writer.write_record(&row)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes a table as JSON, tagged with its kind.
pub struct JsonSink<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonSink<W> {
    /// Creates a sink over `writer`.
    #[must_use]
    pub const fn new(writer: W, pretty: bool) -> Self {
        Self { writer, pretty }
    }

    /// Returns the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> TableSink for JsonSink<W> {
    fn write_table(&mut self, table: &Table) -> Result<(), ExtractError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, table)?;
        } else {
            serde_json::to_writer(&mut self.writer, table)?;
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
