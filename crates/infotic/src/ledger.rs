//! The local evidence ledger.
//!
//! The ledger is an append-only list of [`EvidenceRecord`]s kept as one JSON
//! array under a single key of a [`KeyValueStore`]. Every append rewrites the
//! whole array; there is no indexing and no locking.
//!
//! Reads fail soft: a missing or unreadable blob is an empty ledger. Two
//! writers sharing a store can race and lose each other's appends.

use tracing::{debug, error, warn};

use crate::config::DEFAULT_LEDGER_KEY;
use crate::error::Result;
use crate::evidence::EvidenceRecord;
use crate::storage::KeyValueStore;

/// Serialize records to the persisted JSON form.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode(records: &[EvidenceRecord]) -> Result<String> {
    Ok(serde_json::to_string(records)?)
}

/// Parse the persisted JSON form.
///
/// # Errors
///
/// Returns an error if the text is not a JSON array of records.
pub fn decode(blob: &str) -> Result<Vec<EvidenceRecord>> {
    Ok(serde_json::from_str(blob)?)
}

/// Append-only evidence store over a key-value backend.
#[derive(Debug)]
pub struct Ledger<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> Ledger<S> {
    /// Create a ledger stored under the default key.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_key(store, DEFAULT_LEDGER_KEY)
    }

    /// Create a ledger stored under a custom key.
    #[must_use]
    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// The key holding the serialized ledger.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read every record in insertion order.
    ///
    /// Returns an empty list when nothing is stored, or when the stored blob
    /// cannot be read or parsed. Failures are logged, never returned.
    #[must_use]
    pub fn get_all(&self) -> Vec<EvidenceRecord> {
        match self.store.get(&self.key) {
            Ok(Some(blob)) => decode(&blob).unwrap_or_else(|e| {
                warn!("Discarding unreadable ledger under {}: {}", self.key, e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read ledger under {}: {}", self.key, e);
                Vec::new()
            }
        }
    }

    /// Append a record, reporting why it failed.
    ///
    /// A blob that exists but does not parse is treated as an empty ledger and
    /// replaced. A failed read of the backend aborts the append so a transient
    /// error cannot overwrite stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read or written, including
    /// [`Error::QuotaExceeded`](crate::Error::QuotaExceeded). The stored ledger
    /// is unchanged on error.
    pub fn try_add(&self, record: &EvidenceRecord) -> Result<()> {
        let mut records = match self.store.get(&self.key)? {
            Some(blob) => decode(&blob).unwrap_or_else(|e| {
                warn!("Replacing unreadable ledger under {}: {}", self.key, e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        records.push(record.clone());
        self.store.set(&self.key, &encode(&records)?)?;

        debug!(
            "Appended evidence {} for node {} ({} records)",
            record.id,
            record.node_id,
            records.len()
        );
        Ok(())
    }

    /// Append a record.
    ///
    /// Returns `true` on success and `false` if the record could not be
    /// stored, for example because the quota is exhausted.
    pub fn add(&self, record: &EvidenceRecord) -> bool {
        match self.try_add(record) {
            Ok(()) => true,
            Err(e) => {
                error!("Error saving evidence {}: {}", record.id, e);
                false
            }
        }
    }

    /// Remove the stored ledger entirely.
    pub fn clear(&self) {
        if let Err(e) = self.store.remove(&self.key) {
            error!("Failed to clear ledger under {}: {}", self.key, e);
        } else {
            debug!("Cleared ledger under {}", self.key);
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.get_all().len()
    }

    /// Check whether the ledger holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::evidence::{EvidenceKind, Location};
    use crate::logging::init_test_logging;
    use crate::storage::{MemoryStore, SqliteStore};
    use chrono::{TimeZone, Utc};

    const PHOTO: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg==";

    /// A store whose reads or writes can be switched off, like browser
    /// storage that is disabled or unavailable.
    #[derive(Debug, Default)]
    struct UnavailableStore {
        inner: MemoryStore,
        reads_fail: bool,
        writes_fail: bool,
    }

    fn unavailable() -> Error {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "storage unavailable",
        ))
    }

    impl KeyValueStore for UnavailableStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            if self.reads_fail {
                return Err(unavailable());
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if self.writes_fail {
                return Err(unavailable());
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }

        fn used_bytes(&self) -> Result<usize> {
            self.inner.used_bytes()
        }
    }

    fn record(id: i64) -> EvidenceRecord {
        let mut record = EvidenceRecord::created_at(
            Utc.timestamp_millis_opt(1_700_000_000_000 + id).unwrap(),
            format!("NODE-{id:03}"),
            EvidenceKind::Inspection,
            PHOTO.to_string(),
            Location::at(-12.05, -77.04),
        );
        record.id = id;
        record
    }

    fn ids(records: &[EvidenceRecord]) -> Vec<i64> {
        records.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_empty_store_reads_empty() {
        let store = MemoryStore::new();
        let ledger = Ledger::new(&store);

        assert!(ledger.get_all().is_empty());
        assert!(ledger.is_empty());
        assert_eq!(ledger.key(), "infotic_evidences");
    }

    #[test]
    fn test_add_then_get_all_ends_with_record() {
        let store = MemoryStore::new();
        let ledger = Ledger::new(&store);
        let r = record(7);

        assert!(ledger.add(&record(1)));
        assert!(ledger.add(&r));

        let all = ledger.get_all();
        assert_eq!(all.last(), Some(&r));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_insertion_order_and_reversed_view() {
        let store = MemoryStore::new();
        let ledger = Ledger::new(&store);

        for id in 1..=3 {
            assert!(ledger.add(&record(id)));
        }

        let all = ledger.get_all();
        assert_eq!(ids(&all), vec![1, 2, 3]);

        let newest_first: Vec<i64> = all.iter().rev().map(|r| r.id).collect();
        assert_eq!(newest_first, vec![3, 2, 1]);
    }

    #[test]
    fn test_duplicate_ids_are_kept() {
        let store = MemoryStore::new();
        let ledger = Ledger::new(&store);

        assert!(ledger.add(&record(5)));
        assert!(ledger.add(&record(5)));

        assert_eq!(ids(&ledger.get_all()), vec![5, 5]);
    }

    #[test]
    fn test_clear() {
        let store = MemoryStore::new();
        let ledger = Ledger::new(&store);
        ledger.add(&record(1));

        ledger.clear();

        assert!(ledger.get_all().is_empty());
        assert!(store.get("infotic_evidences").unwrap().is_none());
    }

    #[test]
    fn test_clear_empty_ledger() {
        let store = MemoryStore::new();
        let ledger = Ledger::new(&store);
        ledger.clear();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_corrupt_blob_reads_empty() {
        init_test_logging();
        let store = MemoryStore::new();
        store.set("infotic_evidences", "{not json").unwrap();
        let ledger = Ledger::new(&store);

        assert!(ledger.get_all().is_empty());
    }

    #[test]
    fn test_wrong_shape_reads_empty() {
        let store = MemoryStore::new();
        store.set("infotic_evidences", r#"{"id": 1}"#).unwrap();
        let ledger = Ledger::new(&store);

        assert!(ledger.get_all().is_empty());
    }

    #[test]
    fn test_add_over_corrupt_blob_starts_fresh() {
        let store = MemoryStore::new();
        store.set("infotic_evidences", "garbage").unwrap();
        let ledger = Ledger::new(&store);

        assert!(ledger.add(&record(9)));
        assert_eq!(ids(&ledger.get_all()), vec![9]);
    }

    #[test]
    fn test_quota_exceeded_returns_false_and_keeps_ledger() {
        init_test_logging();
        let store = MemoryStore::with_quota(600);
        let ledger = Ledger::new(&store);

        assert!(ledger.add(&record(1)));
        let before = store.get("infotic_evidences").unwrap();

        let mut large = record(2);
        large.photo = format!("data:image/png;base64,{}", "A".repeat(1024));
        assert!(!ledger.add(&large));

        assert_eq!(store.get("infotic_evidences").unwrap(), before);
        assert_eq!(ids(&ledger.get_all()), vec![1]);
    }

    #[test]
    fn test_try_add_reports_quota() {
        let store = MemoryStore::with_quota(16);
        let ledger = Ledger::new(&store);

        let err = ledger.try_add(&record(1)).unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_custom_key() {
        let store = MemoryStore::new();
        let ledger = Ledger::with_key(&store, "other_ledger");
        ledger.add(&record(1));

        assert!(store.get("infotic_evidences").unwrap().is_none());
        assert!(store.get("other_ledger").unwrap().is_some());
        assert_eq!(Ledger::new(&store).len(), 0);
    }

    #[test]
    fn test_ledger_does_not_touch_other_keys() {
        let store = MemoryStore::new();
        store.set("infotic_user", "inspector01").unwrap();
        let ledger = Ledger::new(&store);

        ledger.add(&record(1));
        ledger.clear();

        assert_eq!(
            store.get("infotic_user").unwrap(),
            Some("inspector01".to_string())
        );
    }

    #[test]
    fn test_round_trip_is_stable() {
        let records = vec![record(1), record(2), record(3)];
        let blob = encode(&records).unwrap();

        assert_eq!(decode(&blob).unwrap(), records);
        assert_eq!(encode(&decode(&blob).unwrap()).unwrap(), blob);
    }

    #[test]
    fn test_decode_browser_blob() {
        let blob = r#"[{"id":1,"nodeId":"A","type":"fault","photo":"data:image/png;base64,AA==","location":{"lat":0,"lon":0},"timestamp":"2024-01-01T00:00:00.000Z"}]"#;
        let records = decode(blob).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, Location::fallback());
    }

    #[test]
    fn test_browser_blob_round_trips_unchanged() {
        let blob = concat!(
            r#"[{"id":1704067200000,"nodeId":"A","type":"fault","photo":"data:image/png;base64,AA==","#,
            r#""location":{"lat":0,"lon":0},"timestamp":"2024-01-01T00:00:00.000Z"},"#,
            r#"{"id":1704067260123,"nodeId":"B","type":"inspection","photo":"data:image/png;base64,AA==","#,
            r#""location":{"lat":-12.0464,"lon":-77.0428},"timestamp":"2024-01-01T00:01:00.123Z"},"#,
            r#"{"id":1704067320000,"nodeId":"C","type":"maintenance","photo":"data:image/png;base64,AA==","#,
            r#""location":{"lat":null,"lon":null},"timestamp":"2024-01-01T00:02:00.000Z"}]"#,
        );

        assert_eq!(encode(&decode(blob).unwrap()).unwrap(), blob);
    }

    #[test]
    fn test_add_keeps_existing_browser_records_verbatim() {
        let existing = r#"{"id":1704067200000,"nodeId":"A","type":"fault","photo":"data:image/png;base64,AA==","location":{"lat":0,"lon":0},"timestamp":"2024-01-01T00:00:00.000Z"}"#;
        let store = MemoryStore::new();
        store.set("infotic_evidences", &format!("[{existing}]")).unwrap();
        let ledger = Ledger::new(&store);

        assert!(ledger.add(&record(2)));

        let blob = store.get("infotic_evidences").unwrap().unwrap();
        assert!(blob.starts_with(&format!("[{existing},")));
    }

    #[test]
    fn test_unreadable_store_reads_empty() {
        init_test_logging();
        let store = UnavailableStore::default();
        assert!(Ledger::new(&store).add(&record(1)));

        let store = UnavailableStore {
            reads_fail: true,
            ..store
        };
        assert!(Ledger::new(&store).get_all().is_empty());
    }

    #[test]
    fn test_failed_read_aborts_add_without_overwriting() {
        let store = UnavailableStore::default();
        let ledger = Ledger::new(&store);
        assert!(ledger.add(&record(1)));
        assert!(ledger.add(&record(2)));
        let before = store.inner.get("infotic_evidences").unwrap();

        let store = UnavailableStore {
            reads_fail: true,
            ..store
        };
        let ledger = Ledger::new(&store);

        assert!(matches!(ledger.try_add(&record(3)), Err(Error::Io(_))));
        assert!(!ledger.add(&record(3)));
        assert_eq!(store.inner.get("infotic_evidences").unwrap(), before);
    }

    #[test]
    fn test_failed_write_returns_false() {
        init_test_logging();
        let store = UnavailableStore::default();
        assert!(Ledger::new(&store).add(&record(1)));

        let store = UnavailableStore {
            writes_fail: true,
            ..store
        };
        let ledger = Ledger::new(&store);

        assert!(!ledger.add(&record(2)));
        let err = ledger.try_add(&record(2)).unwrap_err();
        assert!(!err.is_quota_exceeded());
        assert_eq!(ids(&ledger.get_all()), vec![1]);
    }

    #[test]
    fn test_sqlite_backed_ledger_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local_storage.db");

        {
            let ledger = Ledger::new(SqliteStore::open(&path, None).unwrap());
            assert!(ledger.add(&record(1)));
            assert!(ledger.add(&record(2)));
        }

        let ledger = Ledger::new(SqliteStore::open(&path, None).unwrap());
        assert_eq!(ids(&ledger.get_all()), vec![1, 2]);
    }
}
