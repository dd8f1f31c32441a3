/// Durable event table backed by [`redb`], fronted by an append-only JSONL
/// log (`event_log.rs`) that remains the canonical source of truth.
///
/// The redb file is a derived, rebuildable index: every row it holds can be
/// reconstructed by replaying the log from scratch. If the index is absent
/// or its `events` table is empty at open time it is transparently rebuilt —
/// zero data loss, at the cost of a full log replay.
///
/// # Tables
///
/// | Name       | Key               | Value                               |
/// |------------|-------------------|--------------------------------------|
/// | `events`   | `event_id` (u64)  | JSON-serialised [`Event`]            |
/// | `children` | `cause_id` (u64)  | newline-separated child id list      |
///
/// Identifier allocation is a single in-process counter seeded from the
/// highest `event_id` found at open time. Callers are expected to serialize
/// writes through a single owner (the facade holds the store behind a
/// mutex) — that single-writer discipline is what makes counter-then-append
/// atomic in practice without a cross-process lock.
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, Utc};
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};

use crate::error::MemoryError;
use crate::event_log::EventLog;
use crate::schema::{Event, EventId};

const EVENTS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("events");
const CHILDREN_TABLE: TableDefinition<u64, &str> = TableDefinition::new("children");

pub struct EventStore {
    db: Database,
    log: EventLog,
    next_id: AtomicU64,
}

fn storage_err(err: impl std::fmt::Display) -> MemoryError {
    MemoryError::Storage(err.to_string())
}

/// The redb index lives alongside the JSONL log, named after it.
fn index_path(db_path: &Path) -> PathBuf {
    let filename = db_path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| "causal_memory.db".to_string());
    db_path.with_file_name(format!("{filename}.idx"))
}

impl EventStore {
    /// Open (or create) the event store rooted at `db_path`. `db_path` names
    /// the canonical JSONL log; the redb index is a `.idx` sibling.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, MemoryError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage_err)?;
            }
        }

        let log = EventLog::new(db_path);
        let db = Database::create(index_path(db_path)).map_err(storage_err)?;
        {
            let tx = db.begin_write().map_err(storage_err)?;
            tx.open_table(EVENTS_TABLE).map_err(storage_err)?;
            tx.open_table(CHILDREN_TABLE).map_err(storage_err)?;
            tx.commit().map_err(storage_err)?;
        }

        let mut store = Self {
            db,
            log,
            next_id: AtomicU64::new(1),
        };

        if store.len()? == 0 {
            let restored = store.rebuild_from_log()?;
            if restored > 0 {
                tracing::info!(events = restored, "event store index rebuilt from log");
            }
        }

        let max_id = store.max_event_id()?;
        store.next_id = AtomicU64::new(max_id + 1);
        Ok(store)
    }

    /// Atomic append: assigns `event_id`/`timestamp`, durably logs the row,
    /// then updates the secondary index.
    pub async fn insert(
        &self,
        effect_text: String,
        embedding: Vec<f32>,
        cause_id: Option<EventId>,
        causal_relationship: Option<String>,
    ) -> Result<Event, MemoryError> {
        let event_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            event_id,
            timestamp: Utc::now(),
            effect_text,
            embedding,
            cause_id,
            causal_relationship,
        };
        self.log.append(&event).await.map_err(storage_err)?;
        self.write_index(&event)?;
        Ok(event)
    }

    pub fn get_by_id(&self, event_id: EventId) -> Result<Option<Event>, MemoryError> {
        let tx = self.db.begin_read().map_err(storage_err)?;
        let tbl = tx.open_table(EVENTS_TABLE).map_err(storage_err)?;
        match tbl.get(event_id).map_err(storage_err)? {
            None => Ok(None),
            Some(bytes) => {
                let event: Event =
                    serde_json::from_slice(bytes.value()).map_err(storage_err)?;
                Ok(Some(event))
            }
        }
    }

    /// Events with `timestamp >= now - window_hours`, newest first, capped
    /// at `limit_hint`. The candidate pool for `add_event`.
    pub fn recent_within(
        &self,
        window_hours: i64,
        limit_hint: usize,
    ) -> Result<Vec<Event>, MemoryError> {
        let cutoff = Utc::now() - Duration::hours(window_hours);
        let mut events: Vec<Event> = self.all_for_scan().filter(|e| e.timestamp >= cutoff).collect();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit_hint);
        Ok(events)
    }

    /// Every event in the store, ascending by `event_id` (== insertion
    /// order). Used for the exact-linear anchor scan.
    ///
    /// Walks the dense `1..=max_event_id` range (spec.md §3's identifier
    /// invariant) rather than materializing the whole table into a `Vec` up
    /// front: each id is fetched through `get_by_id`, which opens its own
    /// short-lived read transaction, so a caller that stops early (as
    /// `find_anchor` never does, but a future caller might) never pays for
    /// rows it didn't need. `max_event_id` comes straight from the
    /// in-process counter — no table scan required to find it.
    pub fn all_for_scan(&self) -> impl Iterator<Item = Event> + '_ {
        let max_id = self.next_id.load(Ordering::SeqCst).saturating_sub(1);
        (1..=max_id).filter_map(move |id| match self.get_by_id(id) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(event_id = id, error = %err, "failed to read event during scan — skipping");
                None
            }
        })
    }

    /// Events whose `cause_id == event_id`, oldest first.
    pub fn children_of(&self, event_id: EventId) -> Result<Vec<Event>, MemoryError> {
        let ids: Vec<EventId> = {
            let tx = self.db.begin_read().map_err(storage_err)?;
            let tbl = tx.open_table(CHILDREN_TABLE).map_err(storage_err)?;
            match tbl.get(event_id).map_err(storage_err)? {
                None => Vec::new(),
                Some(v) => v
                    .value()
                    .lines()
                    .filter(|s| !s.is_empty())
                    .filter_map(|s| s.parse::<EventId>().ok())
                    .collect(),
            }
        };
        let mut children = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(event) = self.get_by_id(id)? {
                children.push(event);
            }
        }
        Ok(children)
    }

    pub fn len(&self) -> Result<usize, MemoryError> {
        let tx = self.db.begin_read().map_err(storage_err)?;
        let tbl = tx.open_table(EVENTS_TABLE).map_err(storage_err)?;
        Ok(tbl.len().map_err(storage_err)? as usize)
    }

    pub fn is_empty(&self) -> Result<bool, MemoryError> {
        Ok(self.len()? == 0)
    }

    fn max_event_id(&self) -> Result<EventId, MemoryError> {
        let tx = self.db.begin_read().map_err(storage_err)?;
        let tbl = tx.open_table(EVENTS_TABLE).map_err(storage_err)?;
        let max = tbl
            .iter()
            .map_err(storage_err)?
            .filter_map(|r| r.ok().map(|(k, _)| k.value()))
            .max()
            .unwrap_or(0);
        Ok(max)
    }

    fn write_index(&self, event: &Event) -> Result<(), MemoryError> {
        let tx = self.db.begin_write().map_err(storage_err)?;
        {
            let mut events = tx.open_table(EVENTS_TABLE).map_err(storage_err)?;
            let bytes = serde_json::to_vec(event).map_err(storage_err)?;
            events
                .insert(event.event_id, bytes.as_slice())
                .map_err(storage_err)?;
        }
        if let Some(cause_id) = event.cause_id {
            let mut children = tx.open_table(CHILDREN_TABLE).map_err(storage_err)?;
            let existing = children
                .get(cause_id)
                .map_err(storage_err)?
                .map(|v| v.value().to_string())
                .unwrap_or_default();
            let updated = if existing.is_empty() {
                event.event_id.to_string()
            } else {
                format!("{existing}\n{}", event.event_id)
            };
            children
                .insert(cause_id, updated.as_str())
                .map_err(storage_err)?;
        }
        tx.commit().map_err(storage_err)?;
        Ok(())
    }

    /// Rebuild the redb index entirely from the JSONL log. Called at open
    /// time when the index is empty (missing, freshly created, or wiped
    /// after corruption).
    fn rebuild_from_log(&mut self) -> Result<usize, MemoryError> {
        let events = self.log.load().map_err(storage_err)?;
        let count = events.len();
        for event in &events {
            self.write_index(event)?;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A fresh `tempfile` directory per call, turned into a plain `PathBuf`
    /// via `into_path()` so the store path outlives the helper call without
    /// threading a `TempDir` guard through every test — the directory isn't
    /// cleaned up afterwards, matching the teacher's own unique-temp-path
    /// tests, which never clean up either.
    fn tmp_db_path() -> PathBuf {
        tempfile::Builder::new()
            .prefix("causal-memory-store-")
            .tempdir()
            .unwrap()
            .into_path()
            .join("store.jsonl")
    }

    #[tokio::test]
    async fn insert_assigns_increasing_dense_ids() {
        let path = tmp_db_path();
        let store = EventStore::open(&path).unwrap();
        let a = store
            .insert("first".into(), vec![0.1, 0.2], None, None)
            .await
            .unwrap();
        let b = store
            .insert("second".into(), vec![0.1, 0.2], Some(a.event_id), None)
            .await
            .unwrap();
        assert_eq!(a.event_id, 1);
        assert_eq!(b.event_id, 2);
    }

    #[tokio::test]
    async fn children_of_returns_oldest_first() {
        let path = tmp_db_path();
        let store = EventStore::open(&path).unwrap();
        let root = store.insert("root".into(), vec![0.0], None, None).await.unwrap();
        let c1 = store
            .insert("c1".into(), vec![0.0], Some(root.event_id), None)
            .await
            .unwrap();
        let c2 = store
            .insert("c2".into(), vec![0.0], Some(root.event_id), None)
            .await
            .unwrap();
        let children = store.children_of(root.event_id).unwrap();
        assert_eq!(
            children.iter().map(|e| e.event_id).collect::<Vec<_>>(),
            vec![c1.event_id, c2.event_id]
        );
    }

    #[tokio::test]
    async fn reopening_rebuilds_index_from_log() {
        let path = tmp_db_path();
        {
            let store = EventStore::open(&path).unwrap();
            store.insert("a".into(), vec![0.0], None, None).await.unwrap();
            store.insert("b".into(), vec![0.0], None, None).await.unwrap();
        }
        // Drop the redb index but keep the JSONL log — simulates losing the
        // derived cache without losing the canonical record.
        std::fs::remove_file(index_path(&path)).unwrap();
        let reopened = EventStore::open(&path).unwrap();
        assert_eq!(reopened.len().unwrap(), 2);
        let next = reopened
            .insert("c".into(), vec![0.0], None, None)
            .await
            .unwrap();
        assert_eq!(next.event_id, 3);
    }
}
