//! Pause/abort signalling between a running pipeline and its host.
//!
//! The [`PipelineController`] is the host-side handle. The [`ControlToken`]
//! travels with the running task and is consulted at checkpoints only: a
//! pause takes effect at the next checkpoint and suspends there until resume;
//! an abort raises [`PipelineError::Cancelled`] at the next checkpoint.
//! In-flight work between checkpoints is never preempted.

use super::errors::PipelineError;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub paused: bool,
    pub aborted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Aborted,
    Failed { message: String },
}

impl PipelineStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Failed { .. })
    }
}

/// Host-side handle: toggles pause/abort and observes status.
#[derive(Clone)]
pub struct PipelineController {
    control: Arc<watch::Sender<ControlState>>,
    status: Arc<watch::Sender<PipelineStatus>>,
}

impl PipelineController {
    pub fn new() -> Self {
        let (control, _) = watch::channel(ControlState::default());
        let (status, _) = watch::channel(PipelineStatus::Idle);
        Self {
            control: Arc::new(control),
            status: Arc::new(status),
        }
    }

    /// A token for one run. Tokens share this controller's flags.
    pub fn token(&self) -> ControlToken {
        ControlToken {
            control: self.control.subscribe(),
            status: Arc::clone(&self.status),
        }
    }

    pub fn pause(&self) {
        self.control.send_modify(|state| state.paused = true);
    }

    pub fn resume(&self) {
        self.control.send_modify(|state| state.paused = false);
    }

    pub fn abort(&self) {
        self.control.send_modify(|state| state.aborted = true);
    }

    pub fn state(&self) -> ControlState {
        *self.control.borrow()
    }

    pub fn status(&self) -> PipelineStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PipelineStatus> {
        self.status.subscribe()
    }
}

impl Default for PipelineController {
    fn default() -> Self {
        Self::new()
    }
}

/// Task-side view of the controller.
pub struct ControlToken {
    control: watch::Receiver<ControlState>,
    status: Arc<watch::Sender<PipelineStatus>>,
}

impl ControlToken {
    /// Returns `Err(Cancelled)` if aborted, waits while paused, and returns
    /// `Ok(())` otherwise.
    pub async fn checkpoint(&mut self) -> Result<(), PipelineError> {
        let mut waiting = false;
        loop {
            let state = *self.control.borrow_and_update();
            if state.aborted {
                return Err(PipelineError::Cancelled);
            }
            if !state.paused {
                if waiting {
                    tracing::info!("pipeline resumed");
                    self.set_status(PipelineStatus::Running);
                }
                return Ok(());
            }
            if !waiting {
                waiting = true;
                tracing::info!("pipeline paused at checkpoint");
                self.set_status(PipelineStatus::Paused);
            }
            // A dropped controller can never resume us.
            if self.control.changed().await.is_err() {
                return Err(PipelineError::Cancelled);
            }
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.control.borrow().aborted
    }

    pub fn set_status(&self, status: PipelineStatus) {
        self.status.send_replace(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_checkpoint_passes_when_idle() {
        let controller = PipelineController::new();
        let mut token = controller.token();
        assert_eq!(token.checkpoint().await, Ok(()));
    }

    #[tokio::test]
    async fn test_abort_raises_cancelled() {
        let controller = PipelineController::new();
        let mut token = controller.token();
        controller.abort();
        assert!(token.is_aborted());
        assert_eq!(token.checkpoint().await, Err(PipelineError::Cancelled));
    }

    #[tokio::test]
    async fn test_pause_waits_for_resume() {
        let controller = PipelineController::new();
        let mut token = controller.token();
        let mut status = controller.subscribe_status();
        controller.pause();

        let waiter = tokio::spawn(async move { token.checkpoint().await });

        status
            .wait_for(|s| *s == PipelineStatus::Paused)
            .await
            .unwrap();
        assert!(!waiter.is_finished());

        controller.resume();
        let result = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, Ok(()));
        assert_eq!(controller.status(), PipelineStatus::Running);
    }

    #[tokio::test]
    async fn test_abort_while_paused() {
        let controller = PipelineController::new();
        let mut token = controller.token();
        let mut status = controller.subscribe_status();
        controller.pause();

        let waiter = tokio::spawn(async move { token.checkpoint().await });
        status
            .wait_for(|s| *s == PipelineStatus::Paused)
            .await
            .unwrap();
        controller.abort();

        let result = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, Err(PipelineError::Cancelled));
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(PipelineStatus::Idle.label(), "idle");
        assert!(PipelineStatus::Failed {
            message: "x".to_string()
        }
        .is_terminal());
        assert!(!PipelineStatus::Paused.is_terminal());
    }
}
