//! Document storage and export.
//!
//! Stores hold whole documents by key; history never leaves the process.
//! The archive writer produces a self-describing zip for handing a document
//! to other tools.

pub mod archive;
pub mod file_store;
pub mod memory_store;
pub mod store;

pub use archive::{export_archive, prepare_export, read_manifest, ArchiveManifest, ExportBundle};
pub use file_store::FileDocumentStore;
pub use memory_store::MemoryDocumentStore;
pub use store::{validate_key, DocumentStore};
