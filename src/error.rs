use thiserror::Error;

/// Failure reported by a [`LocationStore`](crate::store::LocationStore)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] surrealdb::Error),

    #[error("record not found: {0}")]
    MissingRecord(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ZipRouteError {
    /// Caller passed something other than five ASCII digits
    #[error("invalid ZIP code {0:?}: must be exactly 5 digits")]
    InvalidInput(String),

    #[error("record store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("{} of {} location updates failed: {}", .failed.len(), .failed.len() + .applied.len(), .failed.join(", "))]
    PartialReconciliation {
        /// Ids of records whose update failed
        failed: Vec<String>,
        /// Ids of records updated successfully in the same pass
        applied: Vec<String>,
    },
}
