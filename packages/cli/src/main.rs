#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for converting bank statements into transaction tables.
//!
//! Uses `indicatif-log-bridge` (via [`statement_table_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the progress bar never fight for the terminal.

mod job;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use statement_table_cli_utils::{IndicatifProgress, MultiProgress};
use statement_table_extract::{
    CsvSink, ExtractError, ExtractionConfig, Extractor, JsonSink, TableSink,
};
use statement_table_models::{ConversionType, Table};
use statement_table_pdf::SourceOptions;

use crate::job::JobHandle;

/// Exit code used when the user interrupts a conversion.
const CANCELLED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(
    name = "statement_table",
    about = "Extract transaction tables from bank statements"
)]
struct Cli {
    /// TOML file overriding extraction defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a statement into a CSV or JSON table
    Convert {
        /// Statement file (.pdf, .json token dump, .rpt/.txt, .jpg/.jpeg/.png)
        input: PathBuf,
        /// Converter to run: generic, fixed-width-report or labeled-pdf-table
        #[arg(long, default_value = "generic", value_parser = parse_kind)]
        kind: ConversionType,
        /// Output file (defaults to the input path with the format's extension)
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
        /// OCR transcript for image input
        #[arg(long)]
        transcript: Option<PathBuf>,
    },
    /// Print the column layout a conversion would use, without converting
    Detect {
        /// Statement file
        input: PathBuf,
        /// Converter whose layout to detect
        #[arg(long, default_value = "generic", value_parser = parse_kind)]
        kind: ConversionType,
        /// OCR transcript for image input
        #[arg(long)]
        transcript: Option<PathBuf>,
    },
    /// Print the effective extraction configuration as TOML
    Config {
        /// Print built-in defaults, ignoring `--config`
        #[arg(long)]
        defaults: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

fn parse_kind(value: &str) -> Result<ConversionType, String> {
    value.parse().map_err(|_| {
        format!(
            "unknown conversion type '{value}' \
             (expected generic, fixed-width-report or labeled-pdf-table)"
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = statement_table_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            kind,
            output,
            format,
            transcript,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let output = output.unwrap_or_else(|| input.with_extension(format.extension()));
            convert(&multi, config, input, kind, output, format, transcript).await?;
        }
        Commands::Detect {
            input,
            kind,
            transcript,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let options = source_options(&config, transcript);
            let report = tokio::task::spawn_blocking(move || -> Result<_, ExtractError> {
                let document = statement_table_pdf::load(&input, kind, &options)?;
                Extractor::new(config).detect(kind, &document)
            })
            .await??;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Config { defaults } => {
            let config = if defaults {
                ExtractionConfig::default()
            } else {
                load_config(cli.config.as_deref())?
            };
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ExtractionConfig, ExtractError> {
    path.map_or_else(|| Ok(ExtractionConfig::default()), ExtractionConfig::load)
}

fn source_options(config: &ExtractionConfig, transcript: Option<PathBuf>) -> SourceOptions {
    SourceOptions {
        transcript,
        text_layout: config.text_layout.clone(),
    }
}

/// Runs one conversion job on a blocking worker.
///
/// Ctrl-C abandons the job: it is marked failed and the process exits
/// without writing output. There is no resume; a rerun starts from the
/// first page.
async fn convert(
    multi: &MultiProgress,
    config: ExtractionConfig,
    input: PathBuf,
    kind: ConversionType,
    output: PathBuf,
    format: OutputFormat,
    transcript: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bar = IndicatifProgress::percent_bar(multi, &format!("Converting {}", input.display()));
    let job = JobHandle::new(bar.clone());
    log::info!(
        "Job {} started: {kind} conversion of {}",
        job.snapshot().id,
        input.display()
    );

    let options = source_options(&config, transcript);
    let worker = job.clone();
    let task = tokio::task::spawn_blocking(move || -> Result<Table, ExtractError> {
        let document = statement_table_pdf::load(&input, kind, &options)?;
        Extractor::new(config).extract(kind, &document, &worker)
    });

    let result = tokio::select! {
        joined = task => joined?,
        _ = tokio::signal::ctrl_c() => {
            job.fail("cancelled");
            bar.abandon("Cancelled".to_owned());
            log::warn!("Job {} cancelled", job.snapshot().id);
            std::process::exit(CANCELLED_EXIT_CODE);
        }
    };

    let table = match result {
        Ok(table) => table,
        Err(e) => {
            job.fail(&e.to_string());
            bar.abandon(format!("Failed: {e}"));
            return Err(e.into());
        }
    };

    if let Err(e) = write_table(&table, &output, format) {
        job.fail(&e.to_string());
        bar.abandon(format!("Failed: {e}"));
        return Err(e.into());
    }

    job.complete(output.clone(), table.len());
    bar.finish(format!("Wrote {} rows to {}", table.len(), output.display()));
    println!("{}", serde_json::to_string_pretty(&job.snapshot())?);

    Ok(())
}

fn write_table(table: &Table, path: &Path, format: OutputFormat) -> Result<(), ExtractError> {
    let writer = BufWriter::new(File::create(path)?);
    match format {
        OutputFormat::Csv => CsvSink::new(writer).write_table(table),
        OutputFormat::Json => JsonSink::new(writer, true).write_table(table),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_convert_arguments() {
        let cli = Cli::try_parse_from([
            "statement_table",
            "convert",
            "statement.rpt",
            "--kind",
            "fixed-width-report",
            "--format",
            "json",
        ])
        .unwrap();

        let Commands::Convert { kind, format, .. } = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(kind, ConversionType::FixedWidthReport);
        assert!(matches!(format, OutputFormat::Json));
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(
            Cli::try_parse_from(["statement_table", "detect", "a.pdf", "--kind", "jk-bank"])
                .is_err()
        );
    }
}
