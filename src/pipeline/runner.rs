//! Drives the assets, layout and copy stages against a live document.
//!
//! The runner owns no document state. It borrows the state machine for the
//! length of one run, so every change it makes is an ordinary command with
//! ordinary history, logging and snapshots.

use super::control::{ControlToken, PipelineStatus};
use super::cutout::CutoutPlan;
use super::errors::PipelineError;
use super::notices::PipelineNotice;
use super::stages::{run_assets, run_copy, run_layout, StageContext, StageReport};
use crate::config::PipelineConfig;
use crate::domain::{EventLogEntry, LogLevel, Stage};
use crate::generation::GenerationGateway;
use crate::state_machine::{DocumentCommand, DocumentStateMachine};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Per-stage counts for one run. Stages that never ran stay at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub assets: StageReport,
    pub layout: StageReport,
    pub copy: StageReport,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Completed(RunSummary),
    Aborted(RunSummary),
    Failed { message: String, summary: RunSummary },
}

impl PipelineOutcome {
    pub fn status(&self) -> PipelineStatus {
        match self {
            Self::Completed(_) => PipelineStatus::Completed,
            Self::Aborted(_) => PipelineStatus::Aborted,
            Self::Failed { message, .. } => PipelineStatus::Failed {
                message: message.clone(),
            },
        }
    }

    pub fn summary(&self) -> &RunSummary {
        match self {
            Self::Completed(summary) | Self::Aborted(summary) => summary,
            Self::Failed { summary, .. } => summary,
        }
    }

    /// One-line human summary, also written to the document's event log.
    pub fn status_line(&self) -> String {
        let s = self.summary();
        match self {
            Self::Completed(_) => format!(
                "Pipeline completed: {}/{} assets ({} degraded cutouts), {} slides laid out, {}/{} slides with copy",
                s.assets.produced,
                s.assets.requested,
                s.assets.degraded,
                s.layout.produced,
                s.copy.produced,
                s.copy.requested
            ),
            Self::Aborted(_) => "Pipeline aborted".to_string(),
            Self::Failed { message, .. } => format!("Pipeline failed: {}", message),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            Self::Completed(_) => LogLevel::Info,
            Self::Aborted(_) => LogLevel::Warn,
            Self::Failed { .. } => LogLevel::Error,
        }
    }
}

pub struct PipelineRunner {
    gateway: Arc<GenerationGateway>,
    cutout: CutoutPlan,
    config: PipelineConfig,
    notices: broadcast::Sender<PipelineNotice>,
}

impl PipelineRunner {
    pub fn new(
        gateway: Arc<GenerationGateway>,
        cutout: CutoutPlan,
        config: PipelineConfig,
        notices: broadcast::Sender<PipelineNotice>,
    ) -> Self {
        Self {
            gateway,
            cutout,
            config,
            notices,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineNotice> {
        self.notices.subscribe()
    }

    /// Runs every stage in order and reports how the run ended.
    ///
    /// Changes made before an abort or failure stay in the document.
    pub async fn run(
        &self,
        machine: &mut DocumentStateMachine,
        mut token: ControlToken,
    ) -> PipelineOutcome {
        self.set_status(&token, PipelineStatus::Running);
        tracing::info!(
            document = %machine.document().id,
            service = self.gateway.active_service(),
            "pipeline started"
        );

        let mut summary = RunSummary::default();
        let outcome = match self.run_stages(machine, &mut token, &mut summary).await {
            Ok(()) => PipelineOutcome::Completed(summary),
            Err(PipelineError::Cancelled) => PipelineOutcome::Aborted(summary),
            Err(e) => PipelineOutcome::Failed {
                message: e.to_string(),
                summary,
            },
        };

        let line = outcome.status_line();
        match &outcome {
            PipelineOutcome::Failed { .. } => tracing::error!("{}", line),
            PipelineOutcome::Aborted(_) => tracing::warn!("{}", line),
            PipelineOutcome::Completed(_) => tracing::info!("{}", line),
        }
        machine.apply(DocumentCommand::AppendLog {
            entry: EventLogEntry::new(outcome.log_level(), line),
        });
        self.set_status(&token, outcome.status());
        outcome
    }

    async fn run_stages(
        &self,
        machine: &mut DocumentStateMachine,
        token: &mut ControlToken,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        let mut ctx = StageContext {
            machine,
            token,
            gateway: &self.gateway,
            cutout: &self.cutout,
            config: &self.config,
            notices: &self.notices,
        };

        begin(&mut ctx, Stage::Assets);
        summary.assets = run_assets(&mut ctx).await?;
        finish(&mut ctx, Stage::Assets, &summary.assets);

        begin(&mut ctx, Stage::Layout);
        summary.layout = run_layout(&mut ctx).await?;
        finish(&mut ctx, Stage::Layout, &summary.layout);

        begin(&mut ctx, Stage::Copy);
        summary.copy = run_copy(&mut ctx).await?;
        finish(&mut ctx, Stage::Copy, &summary.copy);

        Ok(())
    }

    fn set_status(&self, token: &ControlToken, status: PipelineStatus) {
        token.set_status(status.clone());
        let _ = self.notices.send(PipelineNotice::StatusChanged {
            status: status.label().to_string(),
        });
    }
}

fn begin(ctx: &mut StageContext<'_>, stage: Stage) {
    tracing::info!(stage = %stage, "stage started");
    ctx.notify(PipelineNotice::StageStarted { stage });
}

fn finish(ctx: &mut StageContext<'_>, stage: Stage, report: &StageReport) {
    tracing::info!(
        stage = %stage,
        produced = report.produced,
        requested = report.requested,
        "stage completed"
    );
    ctx.dispatch(DocumentCommand::AppendLog {
        entry: EventLogEntry::new(
            LogLevel::Info,
            format!(
                "{} stage: {}/{} produced",
                stage, report.produced, report.requested
            ),
        ),
    });
    ctx.notify(PipelineNotice::StageCompleted {
        stage,
        commands: report.commands,
    });
}

#[cfg(test)]
#[path = "tests/runner_tests.rs"]
mod tests;
