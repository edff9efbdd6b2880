//! Table service: the four-operation client facade.
//!
//! [`TableApi`] is the contract every caller uses, whether it runs in the
//! same process ([`TableService`]) or talks to a server over HTTP
//! ([`crate::client::HttpTableClient`]).
//!
//! # Write-through
//!
//! Every successful `create`, `update` and `delete` applies the change in
//! memory and then writes the whole registry to the snapshot store before
//! returning. A failed write is logged and counted but does not undo the
//! in-memory change: the caller still sees success.
//!
//! # Startup
//!
//! A missing snapshot, or one whose content does not parse, is replaced by
//! the seed. A snapshot that exists but cannot be read (too large, I/O
//! error) is set aside first. If it cannot be set aside the service runs in
//! memory only and never writes over it.

use super::identity;
use super::query::execute;
use crate::models::{Page, Query, Record, TableId, Value};
use crate::storage::{SnapshotStore, TableRegistry, is_unparsable_snapshot, seed_registry};
use crate::{Error, Result};
use std::time::Instant;
use tracing::info_span;

/// The uniform table contract.
pub trait TableApi {
    /// Returns one page of records matching `query`.
    ///
    /// # Errors
    ///
    /// [`Error::TableNotFound`] for unknown table identifiers.
    fn page(&self, table_id: &str, query: &Query) -> Result<Page>;

    /// Appends a record, assigning a generated `id` if it has none.
    ///
    /// # Errors
    ///
    /// [`Error::TableNotFound`] for unknown table identifiers.
    fn create(&mut self, table_id: &str, record: Record) -> Result<Record>;

    /// Shallow-merges `patch` into the record addressed by the patch's key
    /// (`id`, else `ID`, else `user_id`) and returns the merged record.
    ///
    /// # Errors
    ///
    /// [`Error::TableNotFound`], [`Error::InvalidInput`] when the patch
    /// carries no key, [`Error::RecordNotFound`] when nothing matches.
    fn update(&mut self, table_id: &str, patch: Record) -> Result<Record>;

    /// Removes the record addressed by `key`.
    ///
    /// # Errors
    ///
    /// [`Error::TableNotFound`] or [`Error::RecordNotFound`].
    fn delete(&mut self, table_id: &str, key: &Value) -> Result<()>;
}

/// In-process table service over a [`TableRegistry`] and a snapshot store.
pub struct TableService {
    registry: TableRegistry,
    store: Box<dyn SnapshotStore>,
    writable: bool,
}

impl TableService {
    /// Opens the service, restoring the last snapshot from `store`.
    ///
    /// If the store holds no snapshot, or its content does not parse, the
    /// deterministic seed is installed and persisted immediately. Any other
    /// load error sets the stored snapshot aside before the seed is
    /// persisted; when that also fails, persistence stays off so the
    /// unreadable snapshot is never overwritten. A failure to persist the
    /// seed is logged; the service still starts.
    pub fn open(store: Box<dyn SnapshotStore>) -> Self {
        let _span = info_span!("storefront.table.open", location = %store.location()).entered();

        let writable = match store.load() {
            Ok(Some(snapshot)) => {
                let registry = TableRegistry::from_snapshot(snapshot);
                tracing::info!(
                    records = registry.record_count(),
                    "Restored table registry from snapshot"
                );
                return Self::with_registry(registry, store);
            },
            Ok(None) => {
                tracing::info!("No snapshot found, installing seed data");
                true
            },
            Err(e) if is_unparsable_snapshot(&e) => {
                tracing::warn!(error = %e, "Snapshot unparsable, replacing it with seed data");
                true
            },
            Err(e) => {
                tracing::error!(error = %e, "Snapshot unreadable, setting it aside");
                Self::set_aside_unreadable(&*store)
            },
        };

        let service = Self {
            registry: seed_registry(),
            store,
            writable,
        };
        service.persist("seed", None);
        service
    }

    /// Creates a service over an existing registry without loading or
    /// writing anything.
    pub fn with_registry(registry: TableRegistry, store: Box<dyn SnapshotStore>) -> Self {
        Self {
            registry,
            store,
            writable: true,
        }
    }

    /// Returns false while persistence is off because an unreadable snapshot
    /// could not be set aside.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.writable
    }

    fn set_aside_unreadable(store: &dyn SnapshotStore) -> bool {
        match store.set_aside() {
            Ok(moved_to) => {
                tracing::warn!(
                    moved_to = moved_to.as_deref().unwrap_or("<nowhere>"),
                    "Unreadable snapshot set aside, installing seed data"
                );
                true
            },
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to set unreadable snapshot aside; running in memory without persistence"
                );
                metrics::counter!(
                    "storefront_persistence_failures_total",
                    "operation" => "set_aside"
                )
                .increment(1);
                false
            },
        }
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &TableRegistry {
        &self.registry
    }

    /// Lists every registered table with its record count.
    #[must_use]
    pub fn table_counts(&self) -> Vec<(TableId, usize)> {
        self.registry
            .tables()
            .map(|table| (table.id(), table.len()))
            .collect()
    }

    /// Discards all data, reinstalls the seed, and persists it.
    ///
    /// Clearing the store also turns persistence back on if it was off.
    pub fn reset(&mut self) {
        match self.store.clear() {
            Ok(()) => self.writable = true,
            Err(e) => tracing::warn!(error = %e, "Failed to clear snapshot before reset"),
        }
        self.registry = seed_registry();
        tracing::info!("Table registry reset to seed data");
        self.persist("reset", None);
    }

    /// Writes the whole registry to the snapshot store.
    ///
    /// Failures are logged and counted, never returned.
    fn persist(&self, operation: &'static str, table: Option<TableId>) {
        let table_label = table.map_or("*", |t| t.as_str());
        if !self.writable {
            tracing::debug!(operation, table = table_label, "Persistence off, snapshot not written");
            return;
        }
        let start = Instant::now();

        match self.store.save(&self.registry.to_snapshot()) {
            Ok(()) => {
                tracing::debug!(
                    operation,
                    table = table_label,
                    elapsed_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
                    "Snapshot written"
                );
            },
            Err(e) => {
                tracing::error!(
                    operation,
                    table = table_label,
                    location = %self.store.location(),
                    error = %e,
                    "Failed to persist snapshot; in-memory change kept"
                );
                metrics::counter!(
                    "storefront_persistence_failures_total",
                    "operation" => operation
                )
                .increment(1);
            },
        }
    }
}

fn record_op(op: &'static str, table: TableId) {
    metrics::counter!(
        "storefront_table_ops_total",
        "op" => op,
        "table" => table.as_str()
    )
    .increment(1);
}

/// A create payload lacks an identifier when `id` is absent, `null`, or an
/// empty string.
fn needs_generated_id(record: &Record) -> bool {
    match record.get(identity::CANONICAL_KEY) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Key fields an update must not write: the one that addressed the record,
/// and any other key field the patch sets to `null`.
fn identity_fields_to_keep(patch: &Record, key_field: &'static str) -> Vec<&'static str> {
    identity::KEY_FIELDS
        .iter()
        .copied()
        .filter(|&field| field == key_field || patch.get(field).is_some_and(Value::is_null))
        .collect()
}

impl TableApi for TableService {
    fn page(&self, table_id: &str, query: &Query) -> Result<Page> {
        let table = self.registry.resolve(table_id)?;
        let page = execute(table.records(), query);

        tracing::debug!(
            table = table.id().as_str(),
            filters = query.filters.len(),
            order_by = query.order_by().unwrap_or(""),
            page_no = page.page_no,
            page_size = page.page_size,
            virtual_count = page.virtual_count,
            returned = page.list.len(),
            "Served page"
        );
        record_op("page", table.id());
        Ok(page)
    }

    fn create(&mut self, table_id: &str, mut record: Record) -> Result<Record> {
        let table = self.registry.resolve_mut(table_id)?;
        let id = table.id();

        if needs_generated_id(&record) {
            record.insert(identity::CANONICAL_KEY, uuid::Uuid::new_v4().to_string());
        }
        table.push(record.clone());

        let key = record.get(identity::CANONICAL_KEY).cloned().unwrap_or_default();
        tracing::info!(table = id.as_str(), key = %key, "Record created");
        record_op("create", id);
        self.persist("create", Some(id));
        Ok(record)
    }

    fn update(&mut self, table_id: &str, patch: Record) -> Result<Record> {
        let table = self.registry.resolve_mut(table_id)?;
        let id = table.id();
        let (key_field, key) = identity::extract_key(&patch)?;
        let resolved = identity::resolve(table.records(), &key)?;

        let record = table
            .get_mut(resolved.index)
            .ok_or_else(|| Error::RecordNotFound(key.to_string()))?;
        record.merge(&patch, &identity_fields_to_keep(&patch, key_field));
        let updated = record.clone();

        tracing::info!(
            table = id.as_str(),
            key = %key,
            matched_on = resolved.field,
            fields = patch.len(),
            "Record updated"
        );
        record_op("update", id);
        self.persist("update", Some(id));
        Ok(updated)
    }

    fn delete(&mut self, table_id: &str, key: &Value) -> Result<()> {
        let table = self.registry.resolve_mut(table_id)?;
        let id = table.id();
        let resolved = identity::resolve(table.records(), key)?;

        table
            .remove(resolved.index)
            .ok_or_else(|| Error::RecordNotFound(key.to_string()))?;

        tracing::info!(
            table = id.as_str(),
            key = %key,
            matched_on = resolved.field,
            "Record deleted"
        );
        record_op("delete", id);
        self.persist("delete", Some(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Filter;
    use crate::storage::{MemorySnapshotStore, Snapshot};
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store whose snapshot always fails to read and, optionally, to move.
    #[derive(Default)]
    struct UnreadableStore {
        stuck: bool,
        saves: Arc<AtomicUsize>,
        set_asides: Arc<AtomicUsize>,
    }

    impl SnapshotStore for UnreadableStore {
        fn load(&self) -> Result<Option<Snapshot>> {
            Err(Error::PersistenceFailure {
                operation: "read_snapshot".to_string(),
                cause: "snapshot exceeds maximum size".to_string(),
            })
        }

        fn save(&self, _snapshot: &Snapshot) -> Result<()> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn clear(&self) -> Result<()> {
            Ok(())
        }

        fn set_aside(&self) -> Result<Option<String>> {
            self.set_asides.fetch_add(1, Ordering::SeqCst);
            if self.stuck {
                return Err(Error::PersistenceFailure {
                    operation: "set_aside_snapshot".to_string(),
                    cause: "permission denied".to_string(),
                });
            }
            Ok(Some("store.json.corrupt".to_string()))
        }

        fn location(&self) -> String {
            "unreadable".to_string()
        }
    }

    fn record(json: serde_json::Value) -> Record {
        Record::from_json(json).unwrap()
    }

    fn empty_service() -> (TableService, MemorySnapshotStore) {
        let store = MemorySnapshotStore::new();
        let service = TableService::with_registry(TableRegistry::new(), Box::new(store.clone()));
        (service, store)
    }

    #[test]
    fn test_open_without_snapshot_seeds_and_persists() {
        let store = MemorySnapshotStore::new();
        let service = TableService::open(Box::new(store.clone()));

        assert_eq!(service.registry(), &seed_registry());
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.snapshot(), Some(seed_registry().to_snapshot()));
    }

    #[test]
    fn test_open_restores_snapshot_verbatim() {
        let mut snapshot = Snapshot::new();
        snapshot.insert("orders".to_string(), vec![record(json!({"id": "o-1", "total": 10}))]);
        let store = MemorySnapshotStore::with_snapshot(snapshot);

        let service = TableService::open(Box::new(store.clone()));

        assert_eq!(service.registry().record_count(), 1);
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_unreadable_snapshot_is_set_aside_before_seeding() {
        let store = UnreadableStore::default();
        let (saves, set_asides) = (Arc::clone(&store.saves), Arc::clone(&store.set_asides));

        let service = TableService::open(Box::new(store));

        assert_eq!(service.registry(), &seed_registry());
        assert!(service.is_writable());
        assert_eq!(set_asides.load(Ordering::SeqCst), 1);
        assert_eq!(saves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_snapshot_that_cannot_be_set_aside_is_never_overwritten() {
        let store = UnreadableStore {
            stuck: true,
            ..UnreadableStore::default()
        };
        let saves = Arc::clone(&store.saves);

        let mut service = TableService::open(Box::new(store));
        let created = service.create("orders", record(json!({"total": 5}))).unwrap();
        service.delete("orders", created.get("id").unwrap()).unwrap();

        assert!(!service.is_writable());
        assert_eq!(service.registry(), &seed_registry());
        assert_eq!(saves.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reset_turns_persistence_back_on() {
        let store = UnreadableStore {
            stuck: true,
            ..UnreadableStore::default()
        };
        let saves = Arc::clone(&store.saves);
        let mut service = TableService::open(Box::new(store));

        service.reset();

        assert!(service.is_writable());
        assert_eq!(saves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_create_assigns_id_when_missing() {
        let (mut service, _) = empty_service();
        let created = service
            .create("notifications", record(json!({"user_id": "42", "title": "Hi"})))
            .unwrap();

        let id = created.get("id").and_then(Value::as_str).unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
        assert_eq!(created.get("title"), Some(&Value::from("Hi")));
    }

    #[test]
    fn test_create_keeps_supplied_id() {
        let (mut service, _) = empty_service();
        let created = service
            .create("products", record(json!({"id": 77, "name": "Lamp"})))
            .unwrap();
        assert_eq!(created.get("id"), Some(&Value::from(77_i64)));
    }

    #[test]
    fn test_create_replaces_blank_id() {
        let (mut service, _) = empty_service();
        let created = service.create("products", record(json!({"id": ""}))).unwrap();
        assert_ne!(created.get("id"), Some(&Value::from("")));
    }

    #[test]
    fn test_every_mutation_persists_whole_registry() {
        let (mut service, store) = empty_service();

        service.create("users", record(json!({"id": "u1"}))).unwrap();
        service
            .update("users", record(json!({"id": "u1", "name": "Ann"})))
            .unwrap();
        service.delete("users", &Value::from("u1")).unwrap();

        assert_eq!(store.save_count(), 3);
        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.len(), TableId::all().len());
        assert!(snapshot["users"].is_empty());
    }

    #[test]
    fn test_page_does_not_persist() {
        let (service, store) = empty_service();
        service.page("users", &Query::new()).unwrap();
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_update_merges_shallowly() {
        let (mut service, _) = empty_service();
        service
            .create("orders", record(json!({"id": "o1", "status": "new", "total": 30})))
            .unwrap();

        let updated = service
            .update("orders", record(json!({"id": "o1", "status": "paid"})))
            .unwrap();

        assert_eq!(updated, record(json!({"id": "o1", "status": "paid", "total": 30})));
    }

    #[test]
    fn test_update_by_user_id_keeps_generated_id() {
        let (mut service, _) = empty_service();
        service
            .create("user_profiles", record(json!({"id": null, "user_id": "42", "bio": ""})))
            .unwrap();
        let profiles = service.registry().table(TableId::UserProfiles).records().to_vec();
        let generated = profiles[0].get("id").cloned().unwrap();

        let updated = service
            .update("user_profiles", record(json!({"user_id": "42", "bio": "hello"})))
            .unwrap();

        assert_eq!(updated.get("bio"), Some(&Value::from("hello")));
        assert_eq!(updated.get("id"), Some(&generated));
    }

    #[test]
    fn test_update_with_null_id_keeps_generated_id() {
        let (mut service, _) = empty_service();
        let created = service
            .create("user_profiles", record(json!({"user_id": "42", "bio": ""})))
            .unwrap();
        let generated = created.get("id").cloned().unwrap();

        let updated = service
            .update("user_profiles", record(json!({"id": null, "user_id": "42", "bio": "x"})))
            .unwrap();

        assert_eq!(updated.get("id"), Some(&generated));
        assert_eq!(updated.get("bio"), Some(&Value::from("x")));
        let stored = &service.registry().table(TableId::UserProfiles).records()[0];
        assert_eq!(stored.get("id"), Some(&generated));
    }

    #[test]
    fn test_update_missing_record_leaves_table_unchanged() {
        let (mut service, store) = empty_service();
        service
            .create("notifications", record(json!({"id": "n1", "status": "unread"})))
            .unwrap();
        let before = service.registry().clone();

        let err = service
            .update("notifications", record(json!({"id": "missing-id", "status": "read"})))
            .unwrap_err();

        assert!(matches!(err, Error::RecordNotFound(_)));
        assert_eq!(service.registry(), &before);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_update_without_key_is_invalid_input() {
        let (mut service, _) = empty_service();
        let err = service
            .update("orders", record(json!({"status": "paid"})))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_unknown_table_is_reported_by_every_operation() {
        let (mut service, store) = empty_service();

        assert!(matches!(service.page("nope", &Query::new()), Err(Error::TableNotFound(_))));
        assert!(matches!(service.create("nope", Record::new()), Err(Error::TableNotFound(_))));
        assert!(matches!(
            service.update("nope", record(json!({"id": 1}))),
            Err(Error::TableNotFound(_))
        ));
        assert!(matches!(
            service.delete("nope", &Value::from(1_i64)),
            Err(Error::TableNotFound(_))
        ));
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_delete_by_user_id() {
        let (mut service, _) = empty_service();
        service
            .registry
            .table_mut(TableId::UserProfiles)
            .push(record(json!({"user_id": "42", "bio": "x"})));

        service.delete("user_profiles", &Value::from(42_i64)).unwrap();

        assert!(service.registry().table(TableId::UserProfiles).is_empty());
    }

    #[test]
    fn test_persistence_failure_still_reports_success() {
        let (mut service, store) = empty_service();
        store.set_fail_writes(true);

        let created = service.create("campaigns", record(json!({"name": "Spring"}))).unwrap();

        assert_eq!(service.registry().table(TableId::Campaigns).len(), 1);
        assert_eq!(
            service
                .page(
                    "campaigns",
                    &Query::new().with_filter(Filter::equal("id", created.get("id").cloned().unwrap()))
                )
                .unwrap()
                .virtual_count,
            1
        );
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_reset_restores_seed() {
        let store = MemorySnapshotStore::new();
        let mut service = TableService::open(Box::new(store.clone()));
        service.create("orders", record(json!({"total": 5}))).unwrap();

        service.reset();

        assert_eq!(service.registry(), &seed_registry());
        assert_eq!(store.snapshot(), Some(seed_registry().to_snapshot()));
    }

    #[test]
    fn test_table_counts_lists_every_table() {
        let service = TableService::open(Box::new(MemorySnapshotStore::new()));
        let counts = service.table_counts();
        assert_eq!(counts.len(), TableId::all().len());
        assert!(counts.contains(&(TableId::Products, 5)));
    }
}
