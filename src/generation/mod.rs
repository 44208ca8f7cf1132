//! Generation service boundary.
//!
//! The text/image generator itself is external. This module defines the
//! contract ([`GenerationService`]), classifies its failures
//! ([`GenerationError`]), retries transient ones ([`RetryPolicy`]), and
//! provides a deterministic [`OfflineGenerator`] plus a [`GenerationGateway`]
//! that falls back to it once the primary's quota is spent.

pub mod errors;
pub mod gateway;
pub mod offline;
pub mod retry;
pub mod service;
pub mod types;

pub use errors::GenerationError;
pub use gateway::{GenerationGateway, ModelSelection};
pub use offline::OfflineGenerator;
pub use retry::RetryPolicy;
pub use service::GenerationService;
pub use types::{ConceptSpec, GenerationKind, GenerationOutput, GenerationRequest};
