//! Report and table output for the CLI

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use crate::analyzer::AnalysisReport;

/// Output format of the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow::anyhow!("Unknown output format: {}", s)),
        }
    }
}

pub struct OutputWriter {
    writer: Box<dyn Write>,
    format: OutputFormat,
    colorize: bool,
}

impl OutputWriter {
    pub fn stdout(format: OutputFormat) -> Self {
        Self {
            writer: Box::new(io::stdout()),
            format,
            colorize: true,
        }
    }

    pub fn file(path: &Path, format: OutputFormat) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        Ok(Self {
            writer: Box::new(file),
            format,
            colorize: false,
        })
    }

    /// Writer into an arbitrary sink; colours are off.
    pub fn new(writer: Box<dyn Write>, format: OutputFormat) -> Self {
        Self { writer, format, colorize: false }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn write_report(&mut self, report: &AnalysisReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => self.write_object(report),
            OutputFormat::Text => {
                write!(self.writer, "{}", report.render_text(self.colorize))?;
                Ok(())
            }
        }
    }

    pub fn write_object<T: Serialize>(&mut self, obj: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(obj)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Text tables are column-aligned; JSON tables become an array of
    /// objects keyed by header.
    pub fn write_table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                let mut widths = headers.iter().map(|h| h.len()).collect::<Vec<_>>();
                for row in &rows {
                    for (i, cell) in row.iter().enumerate() {
                        if i < widths.len() {
                            widths[i] = widths[i].max(cell.len());
                        }
                    }
                }

                let header_line = headers
                    .iter()
                    .enumerate()
                    .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
                    .collect::<Vec<_>>()
                    .join(" │ ");
                if self.colorize {
                    writeln!(self.writer, "{}", header_line.bold())?;
                } else {
                    writeln!(self.writer, "{}", header_line)?;
                }
                let separator = widths.iter().map(|w| "─".repeat(*w)).collect::<Vec<_>>().join("─┼─");
                writeln!(self.writer, "{}", separator)?;

                for row in rows {
                    let line = row
                        .iter()
                        .enumerate()
                        .map(|(i, cell)| match widths.get(i) {
                            Some(width) => format!("{:width$}", cell, width = *width),
                            None => cell.clone(),
                        })
                        .collect::<Vec<_>>()
                        .join(" │ ");
                    writeln!(self.writer, "{}", line.trim_end())?;
                }
            }
            OutputFormat::Json => {
                let objects: Vec<serde_json::Value> = rows
                    .into_iter()
                    .map(|row| {
                        let obj = headers
                            .iter()
                            .zip(row)
                            .map(|(h, cell)| (h.to_string(), serde_json::Value::String(cell)))
                            .collect::<serde_json::Map<_, _>>();
                        serde_json::Value::Object(obj)
                    })
                    .collect();
                self.write_object(&objects)?;
            }
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
