//! Report generation
//!
//! Writes decoded records as text or JSON lines, followed by a summary.

use crate::config::OutputFormat;
use crate::state::PropertyChange;
use anyhow::Result;
use avr_tuner_decoder::{PropertyValue, UpdateRecord};
use std::io::Write;

/// Counters collected over one replay
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub lines: usize,
    pub records: usize,
    pub changes: usize,
    pub skipped: usize,
    pub queued_commands: usize,
}

pub struct Reporter<W: Write> {
    out: W,
    format: OutputFormat,
    show_unchanged: bool,
    summary: Summary,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: OutputFormat, show_unchanged: bool) -> Self {
        Self {
            out,
            format,
            show_unchanged,
            summary: Summary::default(),
        }
    }

    pub fn line_read(&mut self) {
        self.summary.lines += 1;
    }

    pub fn skipped(&mut self) {
        self.summary.skipped += 1;
    }

    /// Report one record and the change it caused
    ///
    /// Records that changed nothing and queue nothing are only written when
    /// `show_unchanged` is set.
    pub fn record(&mut self, record: &UpdateRecord, change: Option<&PropertyChange>) -> Result<()> {
        self.summary.records += 1;
        self.summary.queued_commands += record.queue_commands.len();
        if change.is_some() {
            self.summary.changes += 1;
        }

        if change.is_none() && record.queue_commands.is_empty() && !self.show_unchanged {
            return Ok(());
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, record)?;
                writeln!(self.out)?;
            }
            OutputFormat::Txt => {
                let property = record.property_path().unwrap_or_else(|| "-".to_string());
                match change {
                    Some(change) => writeln!(
                        self.out,
                        "[{}] {} {} -> {} ({} {:?})",
                        record.zone,
                        property,
                        display_value(change.old.as_ref()),
                        display_value(change.new.as_ref()),
                        record.response_command,
                        record.raw
                    )?,
                    None => writeln!(
                        self.out,
                        "[{}] {} = {} ({} {:?})",
                        record.zone,
                        property,
                        display_value(record.value.as_ref()),
                        record.response_command,
                        record.raw
                    )?,
                }
                for command in &record.queue_commands {
                    writeln!(self.out, "    queue: {}", command)?;
                }
            }
        }
        Ok(())
    }

    /// Write the closing summary (text output only)
    pub fn finish(mut self) -> Result<Summary> {
        if self.format == OutputFormat::Txt {
            writeln!(self.out, "───────────────────────────────────────────────")?;
            writeln!(self.out, "  Lines:    {}", self.summary.lines)?;
            writeln!(self.out, "  Records:  {}", self.summary.records)?;
            writeln!(self.out, "  Changes:  {}", self.summary.changes)?;
            writeln!(self.out, "  Queued:   {}", self.summary.queued_commands)?;
            writeln!(self.out, "  Skipped:  {}", self.summary.skipped)?;
        }
        self.out.flush()?;
        Ok(self.summary)
    }
}

fn display_value(value: Option<&PropertyValue>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "(none)".to_string(),
    }
}
