//! Table registry.
//!
//! Maps opaque table identifiers to their collections. Every table in
//! [`TableId::all`] exists from construction on; there is no way to add or
//! drop a table at runtime.

use crate::models::{Record, TableId};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Serialized form of the registry: one array of records per table name.
pub type Snapshot = BTreeMap<String, Vec<Record>>;

/// One registered collection. Records keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    id: TableId,
    records: Vec<Record>,
}

impl Table {
    const fn new(id: TableId) -> Self {
        Self {
            id,
            records: Vec::new(),
        }
    }

    /// Returns the table's identifier.
    #[must_use]
    pub const fn id(&self) -> TableId {
        self.id
    }

    /// Returns the records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the table holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a record.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Returns a mutable reference to the record at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.records.get_mut(index)
    }

    /// Removes and returns the record at `index`, shifting later records.
    pub fn remove(&mut self, index: usize) -> Option<Record> {
        (index < self.records.len()).then(|| self.records.remove(index))
    }
}

/// The fixed set of tables.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRegistry {
    tables: BTreeMap<TableId, Table>,
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TableRegistry {
    /// Creates a registry with every table registered and empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: TableId::all()
                .iter()
                .map(|&id| (id, Table::new(id)))
                .collect(),
        }
    }

    /// Builds a registry from a snapshot.
    ///
    /// Registered tables missing from the snapshot start empty. Snapshot
    /// entries that name no registered table are dropped with a warning.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut registry = Self::new();
        for (name, records) in snapshot {
            match TableId::parse(&name) {
                Some(id) => {
                    if let Some(table) = registry.tables.get_mut(&id) {
                        table.records = records;
                    }
                },
                None => {
                    tracing::warn!(
                        table = %name,
                        records = records.len(),
                        "Ignoring unregistered table in snapshot"
                    );
                },
            }
        }
        registry
    }

    /// Serializes every table, including empty ones.
    #[must_use]
    pub fn to_snapshot(&self) -> Snapshot {
        self.tables
            .values()
            .map(|table| (table.id.as_str().to_string(), table.records.clone()))
            .collect()
    }

    /// Resolves a wire identifier to its table.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableNotFound`] for identifiers outside the
    /// registered set.
    pub fn resolve(&self, table_id: &str) -> Result<&Table> {
        TableId::parse(table_id)
            .and_then(|id| self.tables.get(&id))
            .ok_or_else(|| Error::TableNotFound(table_id.to_string()))
    }

    /// Resolves a wire identifier to its table, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableNotFound`] for identifiers outside the
    /// registered set.
    pub fn resolve_mut(&mut self, table_id: &str) -> Result<&mut Table> {
        TableId::parse(table_id)
            .and_then(|id| self.tables.get_mut(&id))
            .ok_or_else(|| Error::TableNotFound(table_id.to_string()))
    }

    /// Returns the table for a known identifier.
    #[must_use]
    pub fn table(&self, id: TableId) -> &Table {
        // Every `TableId` is inserted by `new`, and nothing removes entries.
        &self.tables[&id]
    }

    /// Returns the table for a known identifier, mutably.
    pub fn table_mut(&mut self, id: TableId) -> &mut Table {
        self.tables.entry(id).or_insert_with(|| Table::new(id))
    }

    /// Iterates over all tables in registration order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// Total number of records across all tables.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.tables.values().map(Table::len).sum()
    }
}
