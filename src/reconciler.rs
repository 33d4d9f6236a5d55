//! Apply a map editing session's ZIP assignments to the record store
//!
//! The proposal restates every assignment, so a token missing from it is
//! unassigned. Only records whose sorted token list actually changes are
//! written, and all writes of one pass run concurrently.

use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ZipRouteError;
use crate::models::{LocationRecord, ZipAssignmentProposal};
use crate::store::LocationStore;

/// Record whose ZIP list changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedUpdate {
    pub id: String,
    pub name: String,
    pub previous: Vec<String>,
    pub zips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedUpdate {
    pub id: String,
    pub name: String,
    pub error: String,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub applied: Vec<AppliedUpdate>,
    pub failed: Vec<FailedUpdate>,
    /// Joined records whose tokens already matched
    pub unchanged: usize,
    /// Records the proposal does not mention at all
    pub skipped: usize,
}

impl ReconcileReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Turn any per-record failure into [`ZipRouteError::PartialReconciliation`]
    pub fn into_result(self) -> Result<Self, ZipRouteError> {
        if self.is_complete() {
            return Ok(self);
        }
        Err(ZipRouteError::PartialReconciliation {
            failed: self.failed.into_iter().map(|f| f.id).collect(),
            applied: self.applied.into_iter().map(|a| a.id).collect(),
        })
    }
}

/// Planned write for one record
#[derive(Debug, Clone, PartialEq)]
pub struct PendingUpdate {
    pub previous: Vec<String>,
    pub record: LocationRecord,
}

/// Decide which records need new ZIP lists. Returns the pending updates plus
/// the unchanged and skipped counts.
pub fn plan(
    records: Vec<LocationRecord>,
    proposal: &ZipAssignmentProposal,
) -> (Vec<PendingUpdate>, usize, usize) {
    let names = proposal.location_names();
    let mut pending = Vec::new();
    let mut unchanged = 0;
    let mut skipped = 0;

    for mut record in records {
        let joined = names.contains(record.name.as_str())
            || record.referring_zips.iter().any(|z| proposal.contains_zip(z));
        if !joined {
            skipped += 1;
            continue;
        }

        let assigned = proposal.zips_for(&record.name);
        let mut current = record.referring_zips.clone();
        current.sort();
        current.dedup();

        if assigned == current {
            unchanged += 1;
            continue;
        }

        let previous = std::mem::replace(&mut record.referring_zips, assigned);
        pending.push(PendingUpdate { previous, record });
    }

    (pending, unchanged, skipped)
}

/// Run one reconciliation pass against `store`.
///
/// Listing failures abort with [`ZipRouteError::StoreUnavailable`]. Failed
/// writes never abort the pass; they are collected in the report.
pub async fn reconcile<S: LocationStore>(
    store: &S,
    proposal: ZipAssignmentProposal,
) -> Result<ReconcileReport, ZipRouteError> {
    let records = store
        .list_all()
        .await
        .map_err(ZipRouteError::StoreUnavailable)?;
    let total = records.len();

    let (pending, unchanged, skipped) = plan(records, &proposal);
    info!(
        "Reconciling {} ZIP assignments: {} of {} locations changed",
        proposal.assignments.len(),
        pending.len(),
        total
    );

    let outcomes = join_all(pending.into_iter().map(|update| async move {
        let result = store.update(&update.record).await;
        (update, result)
    }))
    .await;

    let mut report = ReconcileReport {
        unchanged,
        skipped,
        ..Default::default()
    };
    for (update, result) in outcomes {
        let PendingUpdate { previous, record } = update;
        match result {
            Ok(()) => {
                info!("Updated {} with ZIPs: {}", record.name, record.referring_zips.join(", "));
                report.applied.push(AppliedUpdate {
                    id: record.id,
                    name: record.name,
                    previous,
                    zips: record.referring_zips,
                });
            }
            Err(e) => {
                warn!("Failed to update {} ({}): {}", record.name, record.id, e);
                report.failed.push(FailedUpdate {
                    id: record.id,
                    name: record.name,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::MemoryStore;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Memory store that counts writes and rejects updates for chosen names
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        failing: HashSet<String>,
        writes: AtomicUsize,
    }

    impl FlakyStore {
        fn new(records: Vec<LocationRecord>, failing: &[&str]) -> Self {
            Self {
                inner: MemoryStore::new(records),
                failing: failing.iter().map(|s| s.to_string()).collect(),
                writes: AtomicUsize::new(0),
            }
        }
    }

    impl LocationStore for FlakyStore {
        async fn list_all(&self) -> Result<Vec<LocationRecord>, StoreError> {
            self.inner.list_all().await
        }

        async fn update(&self, record: &LocationRecord) -> Result<(), StoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&record.name) {
                return Err(StoreError::Unavailable(format!("write rejected for {}", record.name)));
            }
            self.inner.update(record).await
        }
    }

    struct DownStore;

    impl LocationStore for DownStore {
        async fn list_all(&self) -> Result<Vec<LocationRecord>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }

        async fn update(&self, _record: &LocationRecord) -> Result<(), StoreError> {
            unreachable!("nothing to update without a listing")
        }
    }

    fn proposal(pairs: &[(&str, &str)]) -> ZipAssignmentProposal {
        pairs.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_reassignment_replaces_zips() {
        let store = FlakyStore::new(
            vec![
                LocationRecord::new("location:this", "ThisRecord", &["111", "222"]),
                LocationRecord::new("location:other", "OtherLocation", &[]),
            ],
            &[],
        );
        let report = reconcile(&store, proposal(&[("111", "OtherLocation"), ("333", "ThisRecord")]))
            .await
            .unwrap();

        assert!(report.is_complete());
        let this = store.inner.get("location:this").await.unwrap();
        assert_eq!(this.referring_zips, vec!["333"]);
        let other = store.inner.get("location:other").await.unwrap();
        assert_eq!(other.referring_zips, vec!["111"]);
        assert_eq!(report.applied.len(), 2);
        let applied = report.applied.iter().find(|a| a.name == "ThisRecord").unwrap();
        assert_eq!(applied.previous, vec!["111", "222"]);
    }

    #[tokio::test]
    async fn test_identical_after_sort_writes_nothing() {
        let store = FlakyStore::new(
            vec![LocationRecord::new("location:a", "Atlanta", &["30201", "302", "3020"])],
            &[],
        );
        let report = reconcile(&store, proposal(&[("302", "Atlanta"), ("3020", "Atlanta"), ("30201", "Atlanta")]))
            .await
            .unwrap();

        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert_eq!(report.unchanged, 1);
        assert!(report.applied.is_empty());
        // stored order is left alone
        let stored = store.inner.get("location:a").await.unwrap();
        assert_eq!(stored.referring_zips, vec!["30201", "302", "3020"]);
    }

    #[tokio::test]
    async fn test_failure_reported_per_record() {
        let store = FlakyStore::new(
            vec![
                LocationRecord::new("location:a", "Atlanta", &["302"]),
                LocationRecord::new("location:b", "Brooklyn", &["112"]),
                LocationRecord::new("location:c", "Chicago", &["606"]),
            ],
            &["Brooklyn"],
        );
        let report = reconcile(
            &store,
            proposal(&[("303", "Atlanta"), ("113", "Brooklyn"), ("607", "Chicago")]),
        )
        .await
        .unwrap();

        assert_eq!(store.writes.load(Ordering::SeqCst), 3);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, "location:b");
        assert!(report.failed[0].error.contains("write rejected"));
        assert_eq!(report.applied.len(), 2);
        assert_eq!(store.inner.get("location:a").await.unwrap().referring_zips, vec!["303"]);
        assert_eq!(store.inner.get("location:c").await.unwrap().referring_zips, vec!["607"]);
        assert_eq!(store.inner.get("location:b").await.unwrap().referring_zips, vec!["112"]);

        match report.into_result() {
            Err(ZipRouteError::PartialReconciliation { failed, applied }) => {
                assert_eq!(failed, vec!["location:b"]);
                assert_eq!(applied.len(), 2);
            }
            other => panic!("expected partial failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreferenced_record_left_alone() {
        let store = FlakyStore::new(
            vec![
                LocationRecord::new("location:a", "Atlanta", &["302"]),
                LocationRecord::new("location:n", "NewSite", &["999"]),
            ],
            &[],
        );
        let report = reconcile(&store, proposal(&[("302", "Atlanta")])).await.unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.unchanged, 1);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert_eq!(store.inner.get("location:n").await.unwrap().referring_zips, vec!["999"]);
    }

    #[tokio::test]
    async fn test_location_losing_every_zip_is_cleared() {
        let store = FlakyStore::new(
            vec![
                LocationRecord::new("location:a", "Atlanta", &["302", "303"]),
                LocationRecord::new("location:d", "Decatur", &[]),
            ],
            &[],
        );
        reconcile(&store, proposal(&[("302", "Decatur"), ("303", "Decatur")]))
            .await
            .unwrap();

        assert!(store.inner.get("location:a").await.unwrap().referring_zips.is_empty());
        assert_eq!(
            store.inner.get("location:d").await.unwrap().referring_zips,
            vec!["302", "303"]
        );
    }

    #[tokio::test]
    async fn test_store_unavailable() {
        let result = reconcile(&DownStore, proposal(&[("302", "Atlanta")])).await;
        assert!(matches!(result, Err(ZipRouteError::StoreUnavailable(_))));
    }

    #[test]
    fn test_plan_ignores_duplicate_tokens() {
        let records = vec![LocationRecord::new("location:a", "Atlanta", &["302", "302"])];
        let (pending, unchanged, skipped) = plan(records, &proposal(&[("302", "Atlanta")]));
        assert!(pending.is_empty());
        assert_eq!((unchanged, skipped), (1, 0));
    }
}
