use tracing::debug;

use seedfill_core::{EntityKind, Id};

use crate::checks;
use crate::errors::PopulateError;
use crate::faker::FakeSource;
use crate::populator::InsertedIndex;
use crate::resolve::{Resolved, StrategyContext, ValueStrategy};
use crate::storage::{Record, Storage};

/// Build and persist one record of `kind`, retrying on constraint
/// collisions up to `max_attempts` times.
///
/// Each attempt runs every strategy once, checks the candidate against
/// the kind's uniqueness constraints, and only then writes it. Scalar
/// values go in with `create`; multi-valued relations are linked with
/// `set_relation` once the row has an identity. Relation errors abort
/// immediately since retrying cannot produce missing target rows.
pub fn build_one(
    kind: &EntityKind,
    strategies: &[(String, Box<dyn ValueStrategy>)],
    inserted: &InsertedIndex,
    storage: &mut dyn Storage,
    source: &mut FakeSource,
    max_attempts: u32,
) -> Result<Id, PopulateError> {
    let mut last_violation = None;

    for attempt in 1..=max_attempts {
        let mut record = Record::new();
        let mut many_fields: Vec<(&str, Vec<Id>)> = Vec::new();

        for (field, strategy) in strategies {
            let mut ctx = StrategyContext {
                source: &mut *source,
                storage: &*storage,
                inserted,
            };
            match strategy.produce(&mut ctx)? {
                Resolved::Value(value) => {
                    record.insert(field.clone(), value);
                }
                Resolved::Many(targets) if !targets.is_empty() => {
                    many_fields.push((field, targets));
                }
                Resolved::Many(_) | Resolved::Skip => {}
            }
        }

        match checks::check(kind, &record, &*storage)? {
            None => {
                let id = storage.create(&kind.name, &record)?;
                for (field, targets) in many_fields {
                    storage.set_relation(&kind.name, id, field, &targets)?;
                }
                return Ok(id);
            }
            Some(violation) => {
                debug!(
                    kind = %kind.name,
                    attempt,
                    fields = violation.fields.join(", "),
                    "candidate collided, retrying"
                );
                last_violation = Some(violation);
            }
        }
    }

    Err(PopulateError::ConstraintExceeded {
        kind: kind.name.clone(),
        attempts: max_attempts,
        violation: last_violation.unwrap_or_default(),
    })
}
