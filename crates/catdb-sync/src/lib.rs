//! Sync pipeline: drives source adapters, normalization, classification and
//! the upsert engine for each brand, and keeps the run log.

pub mod error;
pub mod orchestrator;
pub mod report;
pub mod upsert;

pub use error::SyncError;
pub use orchestrator::{SyncOptions, SyncOrchestrator, SyncSettings, SyncTarget};
pub use report::{BrandReport, SweepSummary};
pub use upsert::{UpsertEngine, UpsertResult};
