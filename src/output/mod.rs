// src/output/mod.rs
//! Output handling for lookup reports
//!
//! Several handlers can be active at once; the manager fans each report out
//! to all of them.

use crate::types::LookupReport;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

pub mod csv;
pub mod human;
pub mod json;

/// Trait for output handlers that process lookup reports
#[async_trait]
pub trait OutputHandler: Send + Sync {
    /// Emit the report for one looked-up domain
    async fn emit_report(&self, report: &LookupReport) -> anyhow::Result<()>;

    /// Flush any buffered output
    async fn flush(&self) -> anyhow::Result<()>;
}

/// Lock a handler's writer, turning poisoning into an error
pub(crate) fn lock_writer<T>(writer: &Mutex<T>) -> anyhow::Result<MutexGuard<'_, T>> {
    writer
        .lock()
        .map_err(|_| anyhow::anyhow!("Output writer lock poisoned"))
}

/// Manager that dispatches output to multiple handlers
pub struct OutputManager {
    handlers: Vec<Arc<dyn OutputHandler>>,
}

impl OutputManager {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn OutputHandler>) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Emit a report to all handlers
    ///
    /// Errors from individual handlers are logged; the call fails only when
    /// the sole handler fails.
    pub async fn emit(&self, report: &LookupReport) -> anyhow::Result<()> {
        let mut last_error = None;

        for handler in &self.handlers {
            if let Err(e) = handler.emit_report(report).await {
                tracing::warn!("Output handler error: {}", e);
                last_error = Some(e);
            }
        }

        if let Some(err) = last_error {
            if self.handlers.len() == 1 {
                return Err(err);
            }
        }

        Ok(())
    }

    pub async fn flush(&self) -> anyhow::Result<()> {
        for handler in &self.handlers {
            handler.flush().await?;
        }
        Ok(())
    }
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new()
    }
}
