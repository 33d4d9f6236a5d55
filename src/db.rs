use anyhow::Result;
use serde::Deserialize;
use surrealdb::engine::local::{Db, RocksDb};
use surrealdb::{RecordId, Surreal};
use tracing::debug;

use crate::error::StoreError;
use crate::models::{LocationContent, LocationRecord, LocationRow};
use crate::store::LocationStore;
use crate::zip_tokens;

pub type DbConn = Surreal<Db>;

pub const NAMESPACE: &str = "referral";
pub const DATABASE: &str = "locations";
pub const LOCATION_TABLE: &str = "location";

/// Initialize database connection with RocksDB backend
pub async fn connect(path: &str) -> Result<DbConn> {
    let db = Surreal::new::<RocksDb>(path).await?;
    db.use_ns(NAMESPACE).use_db(DATABASE).await?;
    Ok(db)
}

/// Initialize database schema
pub async fn init_schema(db: &DbConn) -> Result<()> {
    db.query(
        r#"
        -- Location table (schemaless so admin tooling can add display fields)
        DEFINE TABLE IF NOT EXISTS location SCHEMALESS;
        DEFINE FIELD IF NOT EXISTS name ON location TYPE string;
        DEFINE FIELD IF NOT EXISTS referring_zips ON location TYPE option<string>;
        DEFINE INDEX IF NOT EXISTS idx_location_name ON location FIELDS name UNIQUE;
        "#,
    )
    .await?
    .check()?;

    Ok(())
}

/// Insert a new location, returning its record id
pub async fn create_location(db: &DbConn, location: LocationContent) -> Result<String> {
    let created: Option<LocationRow> = db.create(LOCATION_TABLE).content(location).await?;
    let row = created.ok_or_else(|| anyhow::anyhow!("create returned no record"))?;
    Ok(row.id.to_string())
}

/// [`LocationStore`] backed by the `location` table. Enumeration order is
/// record id order.
#[derive(Clone)]
pub struct SurrealStore {
    db: DbConn,
}

impl SurrealStore {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Connect to the RocksDB store at `path`. A failure to open the
    /// datastore is reported as [`StoreError::Unavailable`].
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let db = connect(path)
            .await
            .map_err(|e| StoreError::Unavailable(format!("{}: {:#}", path, e)))?;
        Ok(Self::new(db))
    }

    pub fn conn(&self) -> &DbConn {
        &self.db
    }
}

#[derive(Debug, Deserialize)]
struct UpdatedId {
    #[allow(dead_code)]
    id: RecordId,
}

impl LocationStore for SurrealStore {
    async fn list_all(&self) -> Result<Vec<LocationRecord>, StoreError> {
        let rows: Vec<LocationRow> = self
            .db
            .query("SELECT * FROM location ORDER BY id")
            .await?
            .take(0)?;
        debug!("Loaded {} location rows", rows.len());
        Ok(rows.into_iter().map(LocationRecord::from).collect())
    }

    async fn update(&self, record: &LocationRecord) -> Result<(), StoreError> {
        // MERGE keeps every other field of the stored record intact
        let updated: Vec<UpdatedId> = self
            .db
            .query("UPDATE type::record($id) MERGE { referring_zips: $zips } RETURN id")
            .bind(("id", record.id.clone()))
            .bind(("zips", zip_tokens::encode(&record.referring_zips)))
            .await?
            .take(0)?;

        if updated.is_empty() {
            return Err(StoreError::MissingRecord(record.id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surrealdb::engine::local::Mem;

    async fn memory_db() -> DbConn {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns(NAMESPACE).use_db(DATABASE).await.unwrap();
        init_schema(&db).await.unwrap();
        db
    }

    fn content(name: &str, zips: &str) -> LocationContent {
        LocationContent {
            name: name.to_string(),
            address: Some("100 Main St".to_string()),
            suite: None,
            telephone: Some("555-0100".to_string()),
            email: None,
            website: None,
            image_url: None,
            hours: None,
            category: None,
            latitude: None,
            longitude: None,
            referring_zips: Some(zips.to_string()),
            calendar_url: None,
            contact_pref: None,
        }
    }

    #[tokio::test]
    async fn test_list_decodes_zips() {
        let db = memory_db().await;
        let id = create_location(&db, content("Atlanta", "302|30201")).await.unwrap();
        let store = SurrealStore::new(db);

        let records = store.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
        assert_eq!(records[0].phone.as_deref(), Some("555-0100"));
        assert_eq!(records[0].referring_zips, vec!["302", "30201"]);
    }

    #[tokio::test]
    async fn test_update_merges_zips_only() {
        let db = memory_db().await;
        create_location(&db, content("Atlanta", "302")).await.unwrap();
        let store = SurrealStore::new(db);

        let mut record = store.list_all().await.unwrap().remove(0);
        record.referring_zips = vec!["303".to_string(), "30301".to_string()];
        record.phone = None;
        store.update(&record).await.unwrap();

        let reloaded = store.list_all().await.unwrap().remove(0);
        assert_eq!(reloaded.referring_zips, vec!["303", "30301"]);
        assert_eq!(reloaded.phone.as_deref(), Some("555-0100"));
        assert_eq!(reloaded.address.as_deref(), Some("100 Main St"));
    }

    #[tokio::test]
    async fn test_open_reports_unavailable() {
        // a regular file where the RocksDB directory should be
        let path = std::env::temp_dir().join(format!("zip_referral_not_a_dir_{}", std::process::id()));
        std::fs::write(&path, b"occupied").unwrap();

        let result = SurrealStore::open(path.to_str().unwrap()).await;
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(StoreError::Unavailable(msg)) if msg.contains("zip_referral_not_a_dir")));
    }

    #[tokio::test]
    async fn test_update_missing_record() {
        let store = SurrealStore::new(memory_db().await);
        let ghost = LocationRecord::new("location:ghost", "Ghost", &["999"]);
        assert!(matches!(
            store.update(&ghost).await,
            Err(StoreError::MissingRecord(_))
        ));
    }
}
