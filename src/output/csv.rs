// src/output/csv.rs
//! CSV output handler: one row per program, one empty row per miss

use crate::output::{lock_writer, OutputHandler};
use crate::types::LookupReport;
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

const HEADER: [&str; 8] = [
    "timestamp",
    "domain",
    "found",
    "platform",
    "link",
    "scope",
    "description",
    "rewards",
];

pub struct CsvOutput {
    writer: Mutex<csv::Writer<Box<dyn Write + Send>>>,
    header_written: Mutex<bool>,
}

impl CsvOutput {
    pub fn new() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    pub fn to_file(file: std::fs::File) -> Self {
        Self::with_writer(Box::new(file))
    }

    fn with_writer(inner: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(csv::WriterBuilder::new().has_headers(false).from_writer(inner)),
            header_written: Mutex::new(false),
        }
    }

    /// Rows for one report
    fn rows(report: &LookupReport) -> Vec<[String; 8]> {
        let timestamp = report.timestamp.to_string();
        let found = report.result.found.to_string();

        if report.result.programs.is_empty() {
            return vec![[
                timestamp,
                report.domain.clone(),
                found,
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
            ]];
        }

        report
            .result
            .programs
            .iter()
            .map(|program| {
                [
                    timestamp.clone(),
                    report.domain.clone(),
                    found.clone(),
                    program.platform.to_string(),
                    program.link.clone(),
                    program.scope.clone(),
                    program.description.clone(),
                    program.rewards.clone(),
                ]
            })
            .collect()
    }
}

impl Default for CsvOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for CsvOutput {
    async fn emit_report(&self, report: &LookupReport) -> anyhow::Result<()> {
        let mut writer = lock_writer(&self.writer)?;

        {
            let mut header_written = lock_writer(&self.header_written)?;
            if !*header_written {
                writer.write_record(HEADER)?;
                *header_written = true;
            }
        }

        for row in Self::rows(report) {
            writer.write_record(&row)?;
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
