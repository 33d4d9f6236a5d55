//! Shared business logic for the referral API
//!
//! Wraps a [`LocationStore`] with a cached [`ZipIndex`] so lookups don't
//! rescan the store. The cache is dropped whenever a reconciliation writes.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::ZipRouteError;
use crate::models::{MapSnapshot, Resolution, ZipAssignmentProposal};
use crate::reconciler::{self, ReconcileReport};
use crate::resolver::ZipIndex;
use crate::store::LocationStore;
use crate::zip_tokens::Zip5;

pub struct LocationService<S> {
    store: S,
    cached_index: Arc<RwLock<Option<Arc<ZipIndex>>>>,
}

impl<S: LocationStore> LocationService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cached_index: Arc::new(RwLock::new(None)),
        }
    }

    /// Current index, building it from the store on first use
    pub async fn index(&self) -> Result<Arc<ZipIndex>, ZipRouteError> {
        // Check cache first
        {
            let cache = self.cached_index.read().await;
            if let Some(index) = cache.as_ref() {
                return Ok(Arc::clone(index));
            }
        }

        let mut cache = self.cached_index.write().await;
        // another request may have filled it while we waited
        if let Some(index) = cache.as_ref() {
            return Ok(Arc::clone(index));
        }
        let records = self
            .store
            .list_all()
            .await
            .map_err(ZipRouteError::StoreUnavailable)?;
        let index = Arc::new(ZipIndex::build(records));
        info!("Built ZIP index over {} locations", index.len());
        *cache = Some(Arc::clone(&index));
        Ok(index)
    }

    /// Drop the cached index so the next lookup reloads the store
    pub async fn invalidate(&self) {
        *self.cached_index.write().await = None;
    }

    /// Validates before touching the store, so a bad ZIP is never reported
    /// as an outage
    pub async fn resolve(&self, zip: &str) -> Result<Option<Resolution>, ZipRouteError> {
        let zip = Zip5::parse(zip)?;
        let index = self.index().await?;
        Ok(index
            .lookup(&zip)
            .map(|(record, tier)| Resolution::from_record(record, tier)))
    }

    pub async fn map_snapshot(&self) -> Result<MapSnapshot, ZipRouteError> {
        let records = self
            .store
            .list_all()
            .await
            .map_err(ZipRouteError::StoreUnavailable)?;
        Ok(MapSnapshot::from_records(&records))
    }

    pub async fn reconcile(&self, proposal: ZipAssignmentProposal) -> Result<ReconcileReport, ZipRouteError> {
        let report = reconciler::reconcile(&self.store, proposal).await?;
        if !report.applied.is_empty() {
            self.invalidate().await;
        }
        Ok(report)
    }
}
