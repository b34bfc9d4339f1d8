// src/output/human.rs
//! Human-readable colored terminal output

use crate::output::{lock_writer, OutputHandler};
use crate::types::LookupReport;
use async_trait::async_trait;
use colored::Colorize;
use std::io::{self, Write};
use std::sync::Mutex;

/// Human-readable output handler with colored terminal output
pub struct HumanOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    use_colors: bool,
}

impl HumanOutput {
    /// Write to stdout, colored when stdout is a terminal
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
            use_colors: is_terminal::is_terminal(std::io::stdout()),
        }
    }

    pub fn to_file(file: std::fs::File) -> Self {
        Self {
            writer: Mutex::new(Box::new(file)),
            use_colors: false,
        }
    }

    /// Format a timestamp as human-readable string
    fn format_timestamp(ts: u64) -> String {
        use chrono::DateTime;

        if let Some(datetime) = DateTime::from_timestamp(ts as i64, 0) {
            datetime.format("%Y-%m-%d %H:%M:%S").to_string()
        } else {
            format!("{}", ts)
        }
    }
}

impl Default for HumanOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for HumanOutput {
    async fn emit_report(&self, report: &LookupReport) -> anyhow::Result<()> {
        let mut writer = lock_writer(&self.writer)?;
        let timestamp = Self::format_timestamp(report.timestamp);
        let result = &report.result;

        if self.use_colors {
            let marker = if result.found {
                "[+]".green().bold()
            } else {
                "[-]".red().bold()
            };
            writeln!(
                writer,
                "{} {} {}",
                format!("[{}]", timestamp).dimmed(),
                marker,
                report.domain.cyan().bold()
            )?;

            for program in &result.programs {
                writeln!(
                    writer,
                    "    {} {}",
                    format!("{}:", program.platform).dimmed(),
                    program.link.yellow()
                )?;
                if !program.description.is_empty() {
                    writeln!(writer, "        {}", program.description.dimmed())?;
                }
            }
        } else {
            let marker = if result.found { "[+]" } else { "[-]" };
            writeln!(writer, "[{}] {} {}", timestamp, marker, report.domain)?;

            for program in &result.programs {
                writeln!(writer, "    {}: {}", program.platform, program.link)?;
                if !program.description.is_empty() {
                    writeln!(writer, "        {}", program.description)?;
                }
            }
        }

        writer.flush()?;
        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut writer = lock_writer(&self.writer)?;
        writer.flush()?;
        Ok(())
    }
}
