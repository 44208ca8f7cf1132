//! JSONL audit log of everything that touched a document.
//!
//! Each line is one [`LogEntry`]. Entries from every document share
//! `<logs_dir>/events.jsonl` and are told apart by `document_key`. Within one
//! logger `seq` is strictly increasing; `run_id` is 0 outside pipeline runs.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::domain::DocumentId;
use crate::pipeline::PipelineNotice;
use crate::state_machine::{DocumentCommand, StateEvent};

const LOG_FILE: &str = "events.jsonl";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    Document,
    Pipeline,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogEntry {
    pub seq: u64,
    /// RFC 3339, UTC, microsecond precision
    pub ts: String,
    pub document_key: String,
    pub run_id: u64,
    pub component: Component,
    pub event: Value,
}

/// What the state machine reports about one command.
#[derive(Serialize)]
#[serde(tag = "type")]
enum MachineRecord<'a> {
    Command {
        machine_seq: u64,
        command: &'static str,
    },
    Event {
        machine_seq: u64,
        event: &'a StateEvent,
    },
    NoOp {
        machine_seq: u64,
        command: &'static str,
    },
    Reset {
        machine_seq: u64,
        document_id: &'a DocumentId,
    },
}

pub struct StructuredLogger {
    document_key: String,
    run_id: AtomicU64,
    seq: AtomicU64,
    file: Mutex<File>,
    path: PathBuf,
}

impl StructuredLogger {
    /// Opens (appending) the shared log under `logs_dir` for `document_key`.
    pub fn new(document_key: &str, logs_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(logs_dir)?;
        let path = logs_dir.join(LOG_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            document_key: document_key.to_string(),
            run_id: AtomicU64::new(0),
            seq: AtomicU64::new(0),
            file: Mutex::new(file),
            path,
        })
    }

    /// Starts a new pipeline run and returns its id.
    pub fn increment_run_id(&self) -> u64 {
        self.run_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn run_id(&self) -> u64 {
        self.run_id.load(Ordering::SeqCst)
    }

    /// Appends one entry. Write failures are dropped.
    pub fn log(&self, component: Component, event: impl Serialize) {
        let entry = LogEntry {
            seq: self.seq.fetch_add(1, Ordering::SeqCst) + 1,
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            document_key: self.document_key.clone(),
            run_id: self.run_id(),
            component,
            event: serde_json::to_value(event).unwrap_or(Value::Null),
        };

        let Ok(line) = serde_json::to_string(&entry) else {
            return;
        };
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", line);
            let _ = file.flush();
        }
    }

    pub fn log_command(&self, machine_seq: u64, command: &DocumentCommand) {
        self.log(
            Component::Document,
            MachineRecord::Command {
                machine_seq,
                command: command.name(),
            },
        );
    }

    pub fn log_event(&self, machine_seq: u64, event: &StateEvent) {
        self.log(
            Component::Document,
            MachineRecord::Event { machine_seq, event },
        );
    }

    /// A command that did not apply to the current state.
    pub fn log_noop(&self, machine_seq: u64, command: &DocumentCommand) {
        self.log(
            Component::Document,
            MachineRecord::NoOp {
                machine_seq,
                command: command.name(),
            },
        );
    }

    /// The live document was replaced wholesale.
    pub fn log_reset(&self, machine_seq: u64, document_id: &DocumentId) {
        self.log(
            Component::Document,
            MachineRecord::Reset {
                machine_seq,
                document_id,
            },
        );
    }

    pub fn log_notice(&self, notice: &PipelineNotice) {
        self.log(Component::Pipeline, notice);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "tests/structured_logger_tests.rs"]
mod tests;
