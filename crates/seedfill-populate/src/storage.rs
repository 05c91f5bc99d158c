use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use seedfill_core::{Id, Value};

/// Scalar field values of one candidate or persisted row.
pub type Record = BTreeMap<String, Value>;

/// Equality filter: every `(field, value)` pair must match.
pub type Filter<'a> = [(&'a str, Value)];

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("unknown row {id} of '{kind}'")]
    UnknownRow { kind: String, id: Id },
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Generic persistence target the populator is handed per run.
///
/// Implementations own row identity assignment; the engine never invents
/// primary keys. Multi-valued relations are written through `set_relation`
/// after the owning row exists (two-phase write).
pub trait Storage {
    /// Persist a new row and return its identity.
    fn create(&mut self, kind: &str, values: &Record) -> Result<Id, StorageError>;

    /// Identities of rows matching the filter; an empty filter matches all.
    fn query(&self, kind: &str, filter: &Filter<'_>) -> Result<Vec<Id>, StorageError>;

    /// Whether any row matches the filter.
    fn exists(&self, kind: &str, filter: &Filter<'_>) -> Result<bool, StorageError>;

    /// Replace the multi-valued relation `field` of one row.
    fn set_relation(
        &mut self,
        kind: &str,
        id: Id,
        field: &str,
        targets: &[Id],
    ) -> Result<(), StorageError>;

    /// Identities of `kind` rows not referenced by any `by_kind` row through
    /// its `via_field` to-one value. Backs the "unused rows" narrowing that
    /// keeps one-to-one relations satisfiable by construction.
    fn unreferenced(
        &self,
        kind: &str,
        by_kind: &str,
        via_field: &str,
    ) -> Result<Vec<Id>, StorageError>;
}

#[derive(Debug, Default)]
struct KindRows {
    rows: BTreeMap<Id, Record>,
    relations: BTreeMap<Id, BTreeMap<String, Vec<Id>>>,
}

/// In-memory storage target. Primary use is tests and dry runs; unknown
/// kinds behave as empty tables so callers never pre-register schemas.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    kinds: BTreeMap<String, KindRows>,
    next_id: u64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate persisted rows of one kind in identity order.
    pub fn rows(&self, kind: &str) -> impl Iterator<Item = (Id, &Record)> {
        self.kinds
            .get(kind)
            .into_iter()
            .flat_map(|table| table.rows.iter().map(|(id, row)| (*id, row)))
    }

    pub fn row(&self, kind: &str, id: Id) -> Option<&Record> {
        self.kinds.get(kind).and_then(|table| table.rows.get(&id))
    }

    /// Targets of a multi-valued relation, empty when never set.
    pub fn relation(&self, kind: &str, id: Id, field: &str) -> &[Id] {
        self.kinds
            .get(kind)
            .and_then(|table| table.relations.get(&id))
            .and_then(|fields| fields.get(field))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn count(&self, kind: &str) -> usize {
        self.kinds.get(kind).map(|table| table.rows.len()).unwrap_or(0)
    }
}

fn matches(row: &Record, filter: &Filter<'_>) -> bool {
    filter.iter().all(|(field, want)| {
        let have = row.get(*field).unwrap_or(&Value::Null);
        have.key() == want.key()
    })
}

impl Storage for MemoryStorage {
    fn create(&mut self, kind: &str, values: &Record) -> Result<Id, StorageError> {
        self.next_id += 1;
        let id = Id(self.next_id);
        self.kinds
            .entry(kind.to_string())
            .or_default()
            .rows
            .insert(id, values.clone());
        Ok(id)
    }

    fn query(&self, kind: &str, filter: &Filter<'_>) -> Result<Vec<Id>, StorageError> {
        let Some(table) = self.kinds.get(kind) else {
            return Ok(Vec::new());
        };
        Ok(table
            .rows
            .iter()
            .filter(|(_, row)| matches(row, filter))
            .map(|(id, _)| *id)
            .collect())
    }

    fn exists(&self, kind: &str, filter: &Filter<'_>) -> Result<bool, StorageError> {
        let Some(table) = self.kinds.get(kind) else {
            return Ok(false);
        };
        Ok(table.rows.values().any(|row| matches(row, filter)))
    }

    fn set_relation(
        &mut self,
        kind: &str,
        id: Id,
        field: &str,
        targets: &[Id],
    ) -> Result<(), StorageError> {
        let table = self.kinds.entry(kind.to_string()).or_default();
        if !table.rows.contains_key(&id) {
            return Err(StorageError::UnknownRow {
                kind: kind.to_string(),
                id,
            });
        }
        table
            .relations
            .entry(id)
            .or_default()
            .insert(field.to_string(), targets.to_vec());
        Ok(())
    }

    fn unreferenced(
        &self,
        kind: &str,
        by_kind: &str,
        via_field: &str,
    ) -> Result<Vec<Id>, StorageError> {
        let used: BTreeSet<Id> = self
            .kinds
            .get(by_kind)
            .map(|table| {
                table
                    .rows
                    .values()
                    .filter_map(|row| row.get(via_field).and_then(Value::as_id))
                    .collect()
            })
            .unwrap_or_default();

        let Some(table) = self.kinds.get(kind) else {
            return Ok(Vec::new());
        };
        Ok(table
            .rows
            .keys()
            .filter(|id| !used.contains(id))
            .copied()
            .collect())
    }
}
