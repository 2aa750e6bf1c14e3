//! Export run orchestration: ingest, process, then produce and write every
//! selected output format.
//!
//! Ingest and processing failures abort the run. Output formats are
//! independent: a failing format is logged and recorded in its
//! [`FormatOutcome`] and the remaining formats still run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span, warn};

use mindlogger_core::{ExportConfig, ProcessorChain, ReportFrame};
use mindlogger_ingest::load_reports;
use mindlogger_output::{OutputFormat, default_formats, produce, write_outputs};

/// One table written by a format.
#[derive(Debug, Clone)]
pub struct WrittenTable {
    pub name: String,
    pub path: PathBuf,
    pub rows: usize,
}

/// Result of producing and writing one output format.
#[derive(Debug)]
pub struct FormatOutcome {
    pub format: &'static str,
    pub tables: Vec<WrittenTable>,
    pub error: Option<String>,
}

impl FormatOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug)]
pub struct ExportResult {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// Rows in the loaded report.
    pub rows: usize,
    /// Processors in the order they ran.
    pub processors: Vec<&'static str>,
    pub formats: Vec<FormatOutcome>,
}

impl ExportResult {
    pub fn has_errors(&self) -> bool {
        self.formats.iter().any(|outcome| !outcome.is_ok())
    }

    pub fn table_count(&self) -> usize {
        self.formats.iter().map(|outcome| outcome.tables.len()).sum()
    }
}

/// Loads the export named by the configuration.
pub fn ingest(config: &ExportConfig) -> Result<ReportFrame> {
    let data = load_reports(&config.input, &config.pattern)
        .with_context(|| format!("load reports from {}", config.input.display()))?;
    Ok(ReportFrame::new(data))
}

/// Runs the default processor chain over a loaded report.
pub fn process(
    report: &ReportFrame,
    config: &ExportConfig,
) -> Result<(ReportFrame, Vec<&'static str>)> {
    let chain = ProcessorChain::default_chain().context("plan processor chain")?;
    let processed = chain
        .run(report, &config.processing_context())
        .context("process report")?;
    Ok((processed, chain.names()))
}

fn output_format(
    format: &dyn OutputFormat,
    report: &ReportFrame,
    config: &ExportConfig,
    output_dir: &Path,
) -> FormatOutcome {
    let span = info_span!("format", name = format.name());
    let _guard = span.enter();
    let start = Instant::now();
    let written = produce(format, report, &config.extra).and_then(|outputs| {
        let paths = write_outputs(
            &outputs,
            output_dir,
            config.output_type,
            config.drop_null_columns,
        )?;
        Ok(outputs
            .iter()
            .zip(paths)
            .map(|(output, path)| WrittenTable {
                name: output.name.clone(),
                path,
                rows: output.frame.height(),
            })
            .collect::<Vec<_>>())
    });
    match written {
        Ok(tables) => {
            info!(
                tables = tables.len(),
                duration_ms = start.elapsed().as_millis(),
                "format complete"
            );
            FormatOutcome {
                format: format.name(),
                tables,
                error: None,
            }
        }
        Err(error) => {
            warn!(%error, "format failed");
            FormatOutcome {
                format: format.name(),
                tables: Vec::new(),
                error: Some(error.to_string()),
            }
        }
    }
}

/// Produces and writes every selected format.
pub fn output(report: &ReportFrame, config: &ExportConfig) -> Result<Vec<FormatOutcome>> {
    let formats = default_formats()
        .select(config.formats.as_slice())
        .context("select output formats")?;
    let output_dir = config.output_dir();
    Ok(formats
        .into_iter()
        .map(|format| output_format(format, report, config, &output_dir))
        .collect())
}

/// Runs one export end to end.
pub fn run_export(config: &ExportConfig) -> Result<ExportResult> {
    let span = info_span!("export", input = %config.input.display());
    let _guard = span.enter();
    let start = Instant::now();

    // Unknown format names fail before any file is read.
    default_formats()
        .select(config.formats.as_slice())
        .context("select output formats")?;

    let report = ingest(config)?;
    let rows = report.height();
    let (processed, processors) = process(&report, config)?;
    let formats = output(&processed, config)?;

    let result = ExportResult {
        input: config.input.clone(),
        output_dir: config.output_dir(),
        rows,
        processors,
        formats,
    };
    info!(
        rows,
        tables = result.table_count(),
        failed_formats = result.formats.iter().filter(|o| !o.is_ok()).count(),
        duration_ms = start.elapsed().as_millis(),
        "export complete"
    );
    Ok(result)
}
