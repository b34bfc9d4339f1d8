// src/output/json.rs
//! JSON Lines (JSONL) output handler

use crate::output::{lock_writer, OutputHandler};
use crate::types::LookupReport;
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::Mutex;

/// One JSON object per looked-up domain, one per line
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self {
            writer: Mutex::new(Box::new(io::stdout())),
        }
    }

    pub fn to_file(file: std::fs::File) -> Self {
        Self {
            writer: Mutex::new(Box::new(file)),
        }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputHandler for JsonOutput {
    async fn emit_report(&self, report: &LookupReport) -> anyhow::Result<()> {
        let json = serde_json::to_string(report)?;

        let mut writer = lock_writer(&self.writer)?;
        writeln!(writer, "{}", json)?;
        writer.flush()?;

        Ok(())
    }

    async fn flush(&self) -> anyhow::Result<()> {
        let mut writer = lock_writer(&self.writer)?;
        writer.flush()?;
        Ok(())
    }
}
