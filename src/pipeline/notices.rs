//! Notices published by a running pipeline.
//!
//! Hosts subscribe to the broadcast channel; nothing in the pipeline waits on
//! a subscriber.

use crate::domain::Stage;
use serde::Serialize;
use tokio::sync::broadcast;

/// Capacity of the notice channel. Slow subscribers see `Lagged`.
pub const NOTICE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum PipelineNotice {
    StatusChanged {
        status: String,
    },
    StageStarted {
        stage: Stage,
    },
    StageCompleted {
        stage: Stage,
        commands: usize,
    },
    BatchFinished {
        stage: Stage,
        total: usize,
        succeeded: usize,
        failed: usize,
        chunks: usize,
    },
    /// A cutout fell back to a weaker method (or to the original image).
    CutoutDegraded {
        concept: String,
        method: String,
    },
    QuotaExhausted {
        message: String,
    },
    FallbackEngaged {
        reason: String,
    },
}

pub fn notice_channel() -> (
    broadcast::Sender<PipelineNotice>,
    broadcast::Receiver<PipelineNotice>,
) {
    broadcast::channel(NOTICE_CAPACITY)
}
