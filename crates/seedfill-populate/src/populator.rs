use std::collections::BTreeMap;

use tracing::info;

use seedfill_core::{EntityKind, Id};

use crate::builder;
use crate::errors::PopulateError;
use crate::faker::FakeSource;
use crate::resolve::{self, ValueStrategy};
use crate::storage::Storage;

/// Identities inserted during one `execute` run, grouped by entity kind.
///
/// Relation strategies draw targets from here first, so records built
/// later in a run prefer parents built earlier in the same run.
#[derive(Debug, Default)]
pub struct InsertedIndex {
    ids: BTreeMap<String, Vec<Id>>,
}

impl InsertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identities of one kind, in insertion order.
    pub fn ids(&self, kind: &str) -> &[Id] {
        self.ids.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, kind: &str) -> usize {
        self.ids(kind).len()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(String::as_str)
    }

    pub fn total(&self) -> usize {
        self.ids.values().map(Vec::len).sum()
    }

    pub(crate) fn push(&mut self, kind: &str, id: Id) {
        self.ids.entry(kind.to_string()).or_default().push(id);
    }
}

/// Knobs for one populator.
#[derive(Debug, Clone, Copy)]
pub struct PopulateOptions {
    /// Build attempts per record before a uniqueness collision is fatal.
    pub max_attempts: u32,
}

impl Default for PopulateOptions {
    fn default() -> Self {
        Self { max_attempts: 1000 }
    }
}

/// Caller-supplied per-field strategies that replace resolved ones.
#[derive(Default)]
pub struct Overrides {
    strategies: Vec<(String, Box<dyn ValueStrategy>)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the strategy for one field, replacing any earlier entry.
    pub fn set(mut self, field: impl Into<String>, strategy: Box<dyn ValueStrategy>) -> Self {
        let field = field.into();
        self.strategies.retain(|(name, _)| *name != field);
        self.strategies.push((field, strategy));
        self
    }
}

struct Batch {
    kind: EntityKind,
    count: u32,
    strategies: Vec<(String, Box<dyn ValueStrategy>)>,
}

/// Batch orchestrator: registered entity kinds are populated in
/// registration order, so parents must be registered before the kinds
/// that reference them. Strategy resolution happens at registration
/// time; `execute` only builds records.
pub struct Populator {
    source: FakeSource,
    options: PopulateOptions,
    batches: Vec<Batch>,
}

impl Populator {
    pub fn new(source: FakeSource) -> Self {
        Self::with_options(source, PopulateOptions::default())
    }

    pub fn with_options(source: FakeSource, options: PopulateOptions) -> Self {
        Self {
            source,
            options,
            batches: Vec::new(),
        }
    }

    /// Register `count` records of `kind` with resolved strategies only.
    pub fn add_entity(&mut self, kind: &EntityKind, count: u32) -> Result<(), PopulateError> {
        self.add_entity_with(kind, count, Overrides::new())
    }

    /// Register `count` records of `kind`; overrides win over resolution.
    ///
    /// Resolution failures and overrides naming unknown fields surface
    /// here, before anything is built.
    pub fn add_entity_with(
        &mut self,
        kind: &EntityKind,
        count: u32,
        overrides: Overrides,
    ) -> Result<(), PopulateError> {
        let mut strategies = resolve::resolve_strategies(kind, &mut self.source)?;
        // Resolution covered every declared field, so a missing slot means
        // the override names a field the kind does not have.
        for (field, strategy) in overrides.strategies {
            match strategies.iter_mut().find(|(name, _)| *name == field) {
                Some(slot) => slot.1 = strategy,
                None => {
                    return Err(PopulateError::UnknownOverride {
                        kind: kind.name.clone(),
                        field,
                    });
                }
            }
        }
        self.batches.push(Batch {
            kind: kind.clone(),
            count,
            strategies,
        });
        Ok(())
    }

    /// Build every registered batch against `storage` and return the
    /// identities inserted, grouped by kind.
    pub fn execute(&mut self, storage: &mut dyn Storage) -> Result<InsertedIndex, PopulateError> {
        let Self {
            source,
            options,
            batches,
        } = self;

        let mut inserted = InsertedIndex::new();
        for batch in batches.iter() {
            info!(kind = %batch.kind.name, count = batch.count, "populating batch");
            for _ in 0..batch.count {
                let id = builder::build_one(
                    &batch.kind,
                    &batch.strategies,
                    &inserted,
                    storage,
                    source,
                    options.max_attempts,
                )?;
                inserted.push(&batch.kind.name, id);
            }
        }
        info!(total = inserted.total(), "populate run finished");
        Ok(inserted)
    }

    /// Drop all registered batches; the fake-value source keeps its state.
    pub fn clear(&mut self) {
        self.batches.clear();
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    /// Fields with a strategy in the batch at `index`, in resolution order.
    pub fn batch_fields(&self, index: usize) -> Option<Vec<&str>> {
        self.batches.get(index).map(|batch| {
            batch
                .strategies
                .iter()
                .map(|(name, _)| name.as_str())
                .collect()
        })
    }
}
