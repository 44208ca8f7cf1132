//! The asynchronous generation pipeline.
//!
//! # Architecture
//!
//! - **Control** (`control.rs`): pause/abort flags and the run status
//! - **Batch** (`batch.rs`): chunked, bounded-concurrency item processing
//! - **Cutout** (`cutout.rs`): background removal with a degradation chain
//! - **Stages** (`stages/`): assets, layout and copy, each ending in an approval
//! - **Runner** (`runner.rs`): drives the stages against the state machine
//!
//! Progress is published as [`PipelineNotice`]s on a broadcast channel.

pub mod batch;
pub mod control;
pub mod cutout;
pub mod errors;
pub mod notices;
pub mod runner;
mod stages;

pub use batch::{process_batch, BatchSummary};
pub use control::{ControlState, ControlToken, PipelineController, PipelineStatus};
pub use cutout::{CutoutPlan, CutoutResult};
pub use errors::PipelineError;
pub use notices::{notice_channel, PipelineNotice, NOTICE_CAPACITY};
pub use runner::{PipelineOutcome, PipelineRunner, RunSummary};
pub use stages::StageReport;
