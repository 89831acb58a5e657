//! Text and JSON reporting of a script run.

use std::io::{self, Write};

use netplat::Platform;
use netplat::platform::CacheChange;
use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

/// What one script line did.
#[derive(Debug, Serialize)]
struct StepRecord {
    line: usize,
    command: String,
    changes: Vec<CacheChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Collects per-line results. Text output is streamed, JSON output is
/// written as one document by [`Report::finish`].
#[derive(Debug)]
pub struct Report {
    format: OutputFormat,
    quiet: bool,
    steps: Vec<StepRecord>,
}

impl Report {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self {
            format,
            quiet,
            steps: Vec::new(),
        }
    }

    /// Record the changes caused by one line.
    pub fn record(&mut self, line: usize, command: &str, changes: Vec<CacheChange>) {
        if self.format == OutputFormat::Text {
            if !self.quiet {
                for change in &changes {
                    println!("[{}] {}", line, change);
                }
            }
            return;
        }
        self.steps.push(StepRecord {
            line,
            command: command.to_string(),
            changes,
            value: None,
            error: None,
        });
    }

    /// Record a value produced by a line (`sysctl get`, `link show`).
    pub fn value(&mut self, line: usize, value: String) {
        match self.step_mut(line) {
            Some(step) => step.value = Some(value),
            None => println!("[{}] {}", line, value),
        }
    }

    /// Record a failed line.
    pub fn failure(&mut self, line: usize, error: String) {
        match self.step_mut(line) {
            Some(step) => step.error = Some(error),
            None => eprintln!("[{}] error: {}", line, error),
        }
    }

    fn step_mut(&mut self, line: usize) -> Option<&mut StepRecord> {
        self.steps.last_mut().filter(|step| step.line == line)
    }

    /// Write the final cache contents (and the JSON document).
    pub fn finish(&mut self, platform: &dyn Platform, pretty: bool) -> anyhow::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();

        match self.format {
            OutputFormat::Text => {
                for obj in platform.cache().iter() {
                    writeln!(out, "{:<11} {}", obj.kind(), obj)?;
                }
            }
            OutputFormat::Json => {
                let steps = if self.quiet {
                    Vec::new()
                } else {
                    std::mem::take(&mut self.steps)
                };
                let cache: Vec<_> = platform.cache().iter().collect();
                let doc = serde_json::json!({
                    "steps": steps,
                    "cache": cache,
                });
                if pretty {
                    serde_json::to_writer_pretty(&mut out, &doc)?;
                } else {
                    serde_json::to_writer(&mut out, &doc)?;
                }
                writeln!(out)?;
            }
        }
        Ok(())
    }
}
