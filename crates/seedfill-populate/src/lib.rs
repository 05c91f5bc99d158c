//! Constraint-aware fake-record populator.
//!
//! Given [`seedfill_core`] entity kinds and a [`Storage`] target, the
//! [`Populator`] fills tables with plausible fake rows: field strategies
//! are resolved from field names, relations, and scalar types; candidate
//! records are checked against uniqueness constraints and retried on
//! collision; relation fields prefer rows inserted earlier in the same
//! run.
//!
//! ```no_run
//! use seedfill_core::{EntityKind, FieldDescriptor, FieldKind};
//! use seedfill_populate::{FakeSource, Locale, MemoryStorage, Populator};
//!
//! # fn main() -> Result<(), seedfill_populate::PopulateError> {
//! let game = EntityKind::new("Game")
//!     .field(FieldDescriptor::new("title", FieldKind::Char { max_length: 200 }))
//!     .field(FieldDescriptor::new("created_at", FieldKind::DateTime));
//!
//! let mut populator = Populator::new(FakeSource::new(Locale::En));
//! populator.add_entity(&game, 10)?;
//!
//! let mut storage = MemoryStorage::new();
//! let inserted = populator.execute(&mut storage)?;
//! assert_eq!(inserted.count("Game"), 10);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod checks;
pub mod errors;
pub mod faker;
pub mod populator;
pub mod registry;
pub mod relations;
pub mod resolve;
pub mod storage;

pub use builder::build_one;
pub use checks::{check, ConstraintViolation};
pub use errors::PopulateError;
pub use faker::{FakeSource, Locale};
pub use populator::{InsertedIndex, Overrides, PopulateOptions, Populator};
pub use registry::{codename, PopulatorRegistry};
pub use relations::{RelationMode, RelationStrategy};
pub use resolve::{
    fixed, resolve_strategies, value_strategy, Resolved, StrategyContext, ValueStrategy,
};
pub use storage::{MemoryStorage, Record, Storage, StorageError};
