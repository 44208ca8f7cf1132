//! The generation service contract.

use super::errors::GenerationError;
use super::types::{GenerationOutput, GenerationRequest};
use async_trait::async_trait;

/// An opaque text/image generator.
///
/// Implementations classify their own failures; callers decide whether to
/// retry, fall back or skip the item based on the [`GenerationError`] variant.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Short name used in logs and notices.
    fn name(&self) -> &str;

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutput, GenerationError>;
}
