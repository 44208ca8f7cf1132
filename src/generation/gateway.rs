//! Routes generation calls to the primary service or the offline generator.
//!
//! A quota-exhausted error from the primary is not retried: the gateway
//! switches to offline mode for all later calls, publishes a notice, and
//! returns the error so the current run fails.

use super::errors::GenerationError;
use super::retry::RetryPolicy;
use super::service::GenerationService;
use super::types::{GenerationKind, GenerationOutput, GenerationRequest};
use crate::pipeline::PipelineNotice;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Model names per request kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub text_model: String,
    pub image_model: String,
}

impl ModelSelection {
    fn for_kind(&self, kind: &GenerationKind) -> &str {
        match kind {
            GenerationKind::Image { .. } => &self.image_model,
            GenerationKind::Concepts { .. } | GenerationKind::Copy { .. } => &self.text_model,
        }
    }
}

pub struct GenerationGateway {
    primary: Option<Arc<dyn GenerationService>>,
    offline: Arc<dyn GenerationService>,
    offline_mode: AtomicBool,
    retry: RetryPolicy,
    models: ModelSelection,
    notices: broadcast::Sender<PipelineNotice>,
}

impl GenerationGateway {
    /// With no primary service the gateway starts in offline mode.
    pub fn new(
        primary: Option<Arc<dyn GenerationService>>,
        offline: Arc<dyn GenerationService>,
        retry: RetryPolicy,
        models: ModelSelection,
        notices: broadcast::Sender<PipelineNotice>,
    ) -> Self {
        let offline_mode = AtomicBool::new(primary.is_none());
        Self {
            primary,
            offline,
            offline_mode,
            retry,
            models,
            notices,
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline_mode.load(Ordering::SeqCst)
    }

    /// Name of the service that will handle the next call.
    pub fn active_service(&self) -> &str {
        match (&self.primary, self.is_offline()) {
            (Some(primary), false) => primary.name(),
            _ => self.offline.name(),
        }
    }

    pub async fn generate(
        &self,
        kind: GenerationKind,
        prompt: String,
    ) -> Result<GenerationOutput, GenerationError> {
        let request = GenerationRequest {
            model: self.models.for_kind(&kind).to_string(),
            kind,
            prompt,
        };

        let service = match (&self.primary, self.is_offline()) {
            (Some(primary), false) => Arc::clone(primary),
            _ => Arc::clone(&self.offline),
        };
        let result = self.retry.run(|| service.generate(&request)).await;

        if let Err(e) = &result {
            if e.is_quota() && !self.is_offline() {
                self.engage_fallback(e);
            }
        }
        result
    }

    fn engage_fallback(&self, error: &GenerationError) {
        if self.offline_mode.swap(true, Ordering::SeqCst) {
            return;
        }
        let message = error.to_string();
        tracing::warn!(error = %message, "quota exhausted, switching to offline generation");
        let _ = self.notices.send(PipelineNotice::QuotaExhausted {
            message: message.clone(),
        });
        let _ = self.notices.send(PipelineNotice::FallbackEngaged { reason: message });
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
