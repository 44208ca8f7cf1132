//! Staged slide-deck authoring engine.
//!
//! A pure command/transition core over a single document aggregate, an
//! asynchronous generation pipeline that drives it, and pixel-level
//! background removal for generated assets.

pub mod app;
pub mod config;
pub mod domain;
pub mod generation;
pub mod persistence;
pub mod pipeline;
pub mod segmentation;
pub mod state_machine;
pub mod structured_logger;
pub mod studio_paths;
