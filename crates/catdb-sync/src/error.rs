use catdb_core::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("brand '{slug}' not found")]
    BrandNotFound { slug: String },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
