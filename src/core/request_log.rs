//! Request log
//!
//! Every job completion, success or failure, produces exactly one record.
//! Records land in a bounded in-memory ring (served by the admin tail
//! endpoint) and in an append-only JSON-lines file.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::config::LoggingConfig;
use crate::core::types::JobStatus;
use crate::utils::error::{NormalizedCode, Result};

/// One completed-job record
#[derive(Debug, Clone, Serialize)]
pub struct RequestRecord {
    /// Completion time
    pub timestamp: DateTime<Utc>,
    /// Job id
    pub job_id: Uuid,
    /// Resolved model
    pub model: String,
    /// Provider that served (or was meant to serve) the job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Terminal status
    pub status: JobStatus,
    /// Wall-clock execution time
    pub runtime_ms: u64,
    /// Failure description, when the job errored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Normalized failure cause, when the job errored
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<NormalizedCode>,
}

/// Bounded ring plus JSONL file sink
pub struct RequestLog {
    capacity: usize,
    ring: Mutex<VecDeque<RequestRecord>>,
    sink: Mutex<Option<File>>,
}

impl RequestLog {
    /// Open (creating the directory and file as needed) per the logging
    /// config.
    pub fn open(config: &LoggingConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.log_dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(Path::new(&config.log_dir).join("gateway.jsonl"))?;
        Ok(Self {
            capacity: config.keep_last_n_requests_in_memory,
            ring: Mutex::new(VecDeque::new()),
            sink: Mutex::new(Some(file)),
        })
    }

    /// Ring-only log without a file sink, for tests and embedding.
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            capacity,
            ring: Mutex::new(VecDeque::new()),
            sink: Mutex::new(None),
        }
    }

    /// Append one record. Sink write failures are logged, never propagated:
    /// a full disk must not fail the request that just completed.
    pub fn record(&self, record: RequestRecord) {
        if let Some(file) = self.sink.lock().as_mut() {
            match serde_json::to_string(&record) {
                Ok(line) => {
                    if let Err(e) = writeln!(file, "{line}") {
                        error!(error = %e, "failed to append request record");
                    }
                }
                Err(e) => error!(error = %e, "failed to serialize request record"),
            }
        }

        let mut ring = self.ring.lock();
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(record);
    }

    /// Most recent records, oldest first, capped at `limit`.
    pub fn recent(&self, limit: usize) -> Vec<RequestRecord> {
        let ring = self.ring.lock();
        let skip = ring.len().saturating_sub(limit);
        ring.iter().skip(skip).cloned().collect()
    }

    /// Total records currently held in the ring.
    pub fn len(&self) -> usize {
        self.ring.lock().len()
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.ring.lock().is_empty()
    }
}
