use thiserror::Error;

use crate::checks::ConstraintViolation;
use crate::storage::StorageError;

/// Errors emitted by the populator engine.
#[derive(Debug, Error)]
pub enum PopulateError {
    /// No generation rule matched a field at registration time.
    #[error("no value strategy for field '{field}' of '{kind}'")]
    Resolution { kind: String, field: String },
    /// An override names a field the entity kind does not declare.
    #[error("override targets unknown field '{field}' of '{kind}'")]
    UnknownOverride { kind: String, field: String },
    /// A non-nullable relation field found no candidate rows at build time.
    #[error(
        "relation '{kind}.{field}' with '{target}' cannot be null; register enough \
         '{target}' rows earlier in the batch order, or allow nulls"
    )]
    RelationUnsatisfiable {
        kind: String,
        field: String,
        target: String,
    },
    /// Every build attempt for one record violated a uniqueness constraint.
    #[error("gave up building '{kind}' after {attempts} attempts; colliding fields: {}",
            .violation.fields.join(", "))]
    ConstraintExceeded {
        kind: String,
        attempts: u32,
        violation: ConstraintViolation,
    },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
