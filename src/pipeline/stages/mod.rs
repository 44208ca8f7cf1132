//! The three pipeline stages: assets, layout, copy.
//!
//! Each stage checks its document stage is editable, does its work through
//! the batch runner, folds results into the document as commands, and
//! finishes by approving its document stage.

mod assets;
mod copy;
mod layout;

pub(super) use assets::run_assets;
pub(super) use copy::run_copy;
pub(super) use layout::run_layout;

use super::control::ControlToken;
use super::cutout::CutoutPlan;
use super::errors::PipelineError;
use super::notices::PipelineNotice;
use crate::config::PipelineConfig;
use crate::domain::Stage;
use crate::generation::GenerationGateway;
use crate::state_machine::{DocumentCommand, DocumentStateMachine};
use serde::Serialize;
use tokio::sync::broadcast;

/// Counts reported by one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageReport {
    /// Items requested from generation.
    pub requested: usize,
    /// Items that produced a result.
    pub produced: usize,
    /// Items that degraded (cutout fallbacks) but still produced a result.
    pub degraded: usize,
    /// Commands that changed the document.
    pub commands: usize,
}

/// Everything a stage needs for one run.
pub(super) struct StageContext<'a> {
    pub machine: &'a mut DocumentStateMachine,
    pub token: &'a mut ControlToken,
    pub gateway: &'a GenerationGateway,
    pub cutout: &'a CutoutPlan,
    pub config: &'a PipelineConfig,
    pub notices: &'a broadcast::Sender<PipelineNotice>,
}

impl StageContext<'_> {
    pub fn notify(&self, notice: PipelineNotice) {
        let _ = self.notices.send(notice);
    }

    /// Applies `command`; returns true when it changed the document.
    pub fn dispatch(&mut self, command: DocumentCommand) -> bool {
        self.machine.apply(command).changed
    }

    pub fn require_editable(&self, stage: Stage) -> Result<(), PipelineError> {
        if self.machine.document().is_editable(stage) {
            Ok(())
        } else {
            Err(PipelineError::StageLocked { stage })
        }
    }

    /// Approves `stage`, counting the command in `report` if it applied.
    pub fn approve(&mut self, stage: Stage, report: &mut StageReport) {
        if self.dispatch(DocumentCommand::ApproveStage { stage }) {
            report.commands += 1;
        }
    }
}
