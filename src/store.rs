//! Record store seam shared by resolution and reconciliation

use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::LocationRecord;

/// Storage for location records. The core only lists and updates; creating
/// and deleting records happens elsewhere.
pub trait LocationStore: Send + Sync {
    /// Every record, in the store's stable enumeration order
    fn list_all(&self) -> impl Future<Output = Result<Vec<LocationRecord>, StoreError>> + Send;

    /// Persist the record's `referring_zips`. Other fields are left as stored.
    fn update(&self, record: &LocationRecord) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// In-process store; enumeration order is insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<LocationRecord>>>,
}

impl MemoryStore {
    pub fn new(records: Vec<LocationRecord>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    pub async fn insert(&self, record: LocationRecord) {
        self.records.write().await.push(record);
    }

    pub async fn get(&self, id: &str) -> Option<LocationRecord> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }
}

impl LocationStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<LocationRecord>, StoreError> {
        Ok(self.records.read().await.clone())
    }

    async fn update(&self, record: &LocationRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let stored = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| StoreError::MissingRecord(record.id.clone()))?;
        stored.referring_zips = record.referring_zips.clone();
        Ok(())
    }
}
