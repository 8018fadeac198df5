use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cv::backend::{BackendError, CollectionBackend};
use crate::cv::ids::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::cv::patch::CvPatch;
use crate::models::cv::{CvDraft, CvId, CvRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[from] BackendError),
}

/// Sole owner of the CV collection.
///
/// Every operation loads the full collection from the backend; every mutation
/// writes the full collection back. Absence of a record is a normal result
/// (`None` / `false`), only backend failures are errors. If a save fails the
/// mutation is not committed: nothing is cached between calls.
pub struct CvStore {
    backend: Arc<dyn CollectionBackend>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    // Serializes load-modify-save cycles issued concurrently within this process.
    write_lock: Mutex<()>,
}

impl CvStore {
    pub fn new(
        backend: Arc<dyn CollectionBackend>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            ids,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    /// Store with UUID v4 ids and the system clock.
    pub fn with_backend(backend: Arc<dyn CollectionBackend>) -> Self {
        Self::new(backend, Arc::new(UuidGenerator), Arc::new(SystemClock))
    }

    pub fn backend_description(&self) -> String {
        self.backend.describe()
    }

    pub async fn create(&self, draft: CvDraft) -> Result<CvRecord, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let record = CvRecord::from_draft(self.ids.next_id(), draft, self.clock.now());
        records.push(record.clone());
        self.backend.save(&records).await?;

        info!("Created CV {} ({} total)", record.id, records.len());
        Ok(record)
    }

    /// Merges `patch` into the record with `id`, keeping its position.
    /// Returns `None` without writing anything if no such record exists.
    pub async fn update(&self, id: &CvId, patch: CvPatch) -> Result<Option<CvRecord>, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let Some(record) = records.iter_mut().find(|r| &r.id == id) else {
            debug!("Update skipped, CV {id} not found");
            return Ok(None);
        };

        patch.apply_to(record);
        record.updated_at = next_update_time(record.updated_at, self.clock.now());
        let updated = record.clone();

        self.backend.save(&records).await?;

        info!("Updated CV {id}");
        Ok(Some(updated))
    }

    pub async fn get(&self, id: &CvId) -> Result<Option<CvRecord>, StoreError> {
        let records = self.load().await?;
        Ok(records.into_iter().find(|r| &r.id == id))
    }

    /// All records in insertion order.
    pub async fn get_all(&self) -> Result<Vec<CvRecord>, StoreError> {
        self.load().await
    }

    /// Removes the record with `id`. Returns whether anything was removed;
    /// an unknown id is a no-op and triggers no write.
    pub async fn delete(&self, id: &CvId) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        let before = records.len();
        records.retain(|r| &r.id != id);
        if records.len() == before {
            debug!("Delete skipped, CV {id} not found");
            return Ok(false);
        }

        self.backend.save(&records).await?;

        info!("Deleted CV {id} ({} remaining)", records.len());
        Ok(true)
    }

    async fn load(&self) -> Result<Vec<CvRecord>, StoreError> {
        let records = self.backend.load().await?;
        debug!(
            "Loaded {} CVs from {}",
            records.len(),
            self.backend.describe()
        );
        Ok(records)
    }
}

/// `updatedAt` after an update: the current time, nudged past the previous
/// value when the clock has not moved (or moved backwards).
fn next_update_time(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::TimeZone;

    use crate::cv::backend::MemoryBackend;
    use crate::cv::ids::testing::{ManualClock, SequentialIdGenerator};
    use crate::cv::patch::PatchField;
    use crate::models::cv::{Education, Experience};

    /// Memory backend whose loads or saves can be switched to fail.
    #[derive(Default)]
    struct FlakyBackend {
        inner: MemoryBackend,
        fail_loads: AtomicBool,
        fail_saves: AtomicBool,
    }

    fn unavailable() -> BackendError {
        BackendError::Io {
            path: "unreachable".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down"),
        }
    }

    #[async_trait]
    impl CollectionBackend for FlakyBackend {
        async fn load(&self) -> Result<Vec<CvRecord>, BackendError> {
            if self.fail_loads.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            self.inner.load().await
        }

        async fn save(&self, records: &[CvRecord]) -> Result<(), BackendError> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(unavailable());
            }
            self.inner.save(records).await
        }

        fn describe(&self) -> String {
            "flaky".to_string()
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    fn fixture() -> (CvStore, Arc<ManualClock>, Arc<FlakyBackend>) {
        let backend = Arc::new(FlakyBackend::default());
        let clock = Arc::new(ManualClock::new(start()));
        let store = CvStore::new(
            backend.clone(),
            Arc::new(SequentialIdGenerator::new("cv")),
            clock.clone(),
        );
        (store, clock, backend)
    }

    fn jane() -> CvDraft {
        CvDraft {
            full_name: Some("Jane Doe".to_string()),
            email: Some("jane@x.com".to_string()),
            experiences: vec![
                Experience {
                    company: Some("Acme".to_string()),
                    role: Some("Engineer".to_string()),
                    duration: Some("2021-2024".to_string()),
                    description: Some("Built things".to_string()),
                },
                Experience {
                    company: Some("Globex".to_string()),
                    role: Some("Intern".to_string()),
                    ..Default::default()
                },
            ],
            education: vec![Education {
                institution: Some("State University".to_string()),
                degree: Some("BSc".to_string()),
                year: Some("2020".to_string()),
                gpa: Some("3.8".to_string()),
            }],
            ..Default::default()
        }
    }

    fn named(name: &str) -> CvDraft {
        CvDraft {
            full_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn summary_patch(text: &str) -> CvPatch {
        CvPatch {
            summary: PatchField::Value(text.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_preserves_fields_and_sets_identity() {
        let (store, _, _) = fixture();
        let draft = jane();
        let record = store.create(draft.clone()).await.unwrap();

        assert!(!record.id.as_str().is_empty());
        assert_eq!(record.created_at, record.updated_at);
        assert_eq!(record.created_at, start());
        assert_eq!(record.full_name, draft.full_name);
        assert_eq!(record.email, draft.email);
        assert_eq!(record.experiences, draft.experiences);
        assert_eq!(record.education, draft.education);
    }

    #[tokio::test]
    async fn test_create_generates_unique_ids() {
        let (store, _, _) = fixture();
        let mut seen = HashSet::new();
        for i in 0..20 {
            let r = store.create(named(&format!("Person {i}"))).await.unwrap();
            assert!(seen.insert(r.id));
        }
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let (store, _, _) = fixture();
        let first = store.create(named("A")).await.unwrap();
        assert!(store.delete(&first.id).await.unwrap());
        let second = store.create(named("B")).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let (store, _, _) = fixture();
        let created = store.create(jane()).await.unwrap();
        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched, Some(created));
    }

    #[tokio::test]
    async fn test_update_merges_and_refreshes_updated_at() {
        let (store, clock, _) = fixture();
        let created = store.create(jane()).await.unwrap();

        clock.advance(Duration::seconds(30));
        let updated = store
            .update(&created.id, summary_patch("Updated summary"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.summary.as_deref(), Some("Updated summary"));
        assert_eq!(updated.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(updated.email.as_deref(), Some("jane@x.com"));
        assert_eq!(updated.experiences, created.experiences);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.updated_at, start() + Duration::seconds(30));

        assert_eq!(store.get(&created.id).await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn test_update_with_stalled_clock_still_advances() {
        let (store, _, _) = fixture();
        let created = store.create(jane()).await.unwrap();

        let first = store
            .update(&created.id, summary_patch("one"))
            .await
            .unwrap()
            .unwrap();
        let second = store
            .update(&created.id, summary_patch("two"))
            .await
            .unwrap()
            .unwrap();

        assert!(first.updated_at > created.updated_at);
        assert!(second.updated_at > first.updated_at);
        assert!(second.created_at <= second.updated_at);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found_and_writes_nothing() {
        let (store, _, backend) = fixture();
        store.create(named("A")).await.unwrap();
        let before = store.get_all().await.unwrap();
        let raw_before = backend.inner.raw().await;

        let result = store
            .update(&CvId::new("missing"), summary_patch("x"))
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(store.get_all().await.unwrap(), before);
        assert_eq!(backend.inner.raw().await, raw_before);
    }

    #[tokio::test]
    async fn test_update_keeps_position() {
        let (store, clock, _) = fixture();
        let a = store.create(named("A")).await.unwrap();
        let b = store.create(named("B")).await.unwrap();
        let c = store.create(named("C")).await.unwrap();

        clock.advance(Duration::minutes(1));
        store.update(&b.id, summary_patch("changed")).await.unwrap();

        let ids: Vec<_> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }

    #[tokio::test]
    async fn test_get_all_in_creation_order() {
        let (store, _, _) = fixture();
        let names = ["A", "B", "C", "D"];
        for n in names {
            store.create(named(n)).await.unwrap();
        }
        let stored: Vec<_> = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.full_name.unwrap())
            .collect();
        assert_eq!(stored, names);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (store, _, _) = fixture();
        let created = store.create(jane()).await.unwrap();
        store.create(named("Other")).await.unwrap();
        let before = store.get_all().await.unwrap().len();

        assert!(store.delete(&created.id).await.unwrap());

        assert_eq!(store.get(&created.id).await.unwrap(), None);
        let after = store.get_all().await.unwrap();
        assert_eq!(after.len(), before - 1);
        assert!(after.iter().all(|r| r.id != created.id));
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let (store, _, backend) = fixture();
        store.create(named("A")).await.unwrap();
        let raw_before = backend.inner.raw().await;

        assert!(!store.delete(&CvId::new("missing")).await.unwrap());
        assert_eq!(store.get_all().await.unwrap().len(), 1);
        assert_eq!(backend.inner.raw().await, raw_before);
    }

    #[tokio::test]
    async fn test_failed_save_does_not_commit_create() {
        let (store, _, backend) = fixture();
        store.create(named("A")).await.unwrap();

        backend.fail_saves.store(true, Ordering::SeqCst);
        let err = store.create(named("B")).await.unwrap_err();
        assert!(matches!(err, StoreError::BackendUnavailable(_)));

        backend.fail_saves.store(false, Ordering::SeqCst);
        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].full_name.as_deref(), Some("A"));
    }

    #[tokio::test]
    async fn test_failed_save_does_not_commit_update() {
        let (store, clock, backend) = fixture();
        let created = store.create(named("A")).await.unwrap();

        clock.advance(Duration::seconds(5));
        backend.fail_saves.store(true, Ordering::SeqCst);
        assert!(store.update(&created.id, summary_patch("x")).await.is_err());
        assert!(store.delete(&created.id).await.is_err());

        backend.fail_saves.store(false, Ordering::SeqCst);
        assert_eq!(store.get(&created.id).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_load_failure_surfaces_on_reads() {
        let (store, _, backend) = fixture();
        backend.fail_loads.store(true, Ordering::SeqCst);

        assert!(matches!(
            store.get_all().await,
            Err(StoreError::BackendUnavailable(_))
        ));
        assert!(store.get(&CvId::new("cv-1")).await.is_err());
        assert!(store.delete(&CvId::new("cv-1")).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_all_kept() {
        let backend = Arc::new(MemoryBackend::new());
        let store = Arc::new(CvStore::with_backend(backend));

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.create(named(&format!("P{i}"))).await.unwrap()
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(store.get_all().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_separate_instances_are_isolated() {
        let (a, _, _) = fixture();
        let (b, _, _) = fixture();
        a.create(named("A")).await.unwrap();
        assert!(b.get_all().await.unwrap().is_empty());
    }

    #[test]
    fn test_next_update_time() {
        let t = start();
        assert_eq!(next_update_time(t, t + Duration::seconds(1)), t + Duration::seconds(1));
        assert_eq!(next_update_time(t, t), t + Duration::microseconds(1));
        assert_eq!(
            next_update_time(t, t - Duration::seconds(1)),
            t + Duration::microseconds(1)
        );
    }
}
