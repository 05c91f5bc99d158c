use std::collections::BTreeSet;

use rand::seq::SliceRandom;

use seedfill_core::{Id, Value};

use crate::errors::PopulateError;
use crate::resolve::{Resolved, StrategyContext, ValueStrategy};

/// How a relation field selects its targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationMode {
    /// Any existing target row.
    One,
    /// A target row no other owner references yet (one-to-one).
    OneUnique,
    /// A non-empty random subset of target rows.
    Many,
}

/// Value strategy for relation fields.
///
/// Targets come from the current run's inserted-identity pool first, so
/// freshly built parents are preferred; storage rows that predate the run
/// are the fallback. One-to-one narrows every pool to rows still
/// unreferenced through this field, which keeps the relation satisfiable
/// by construction instead of by retry.
#[derive(Debug)]
pub struct RelationStrategy {
    owner: String,
    field: String,
    target: String,
    mode: RelationMode,
    nullable: bool,
}

impl RelationStrategy {
    pub fn new(owner: &str, field: &str, target: &str, mode: RelationMode, nullable: bool) -> Self {
        Self {
            owner: owner.to_string(),
            field: field.to_string(),
            target: target.to_string(),
            mode,
            nullable,
        }
    }

    fn candidates(&self, ctx: &StrategyContext<'_>) -> Result<Vec<Id>, PopulateError> {
        let mut pool: Vec<Id> = ctx.inserted.ids(&self.target).to_vec();
        if self.mode == RelationMode::OneUnique && !pool.is_empty() {
            let free: BTreeSet<Id> = ctx
                .storage
                .unreferenced(&self.target, &self.owner, &self.field)?
                .into_iter()
                .collect();
            pool.retain(|id| free.contains(id));
        }
        if pool.is_empty() {
            pool = match self.mode {
                RelationMode::OneUnique => {
                    ctx.storage
                        .unreferenced(&self.target, &self.owner, &self.field)?
                }
                RelationMode::One | RelationMode::Many => ctx.storage.query(&self.target, &[])?,
            };
        }
        Ok(pool)
    }
}

impl ValueStrategy for RelationStrategy {
    fn produce(&self, ctx: &mut StrategyContext<'_>) -> Result<Resolved, PopulateError> {
        let mut pool = self.candidates(ctx)?;

        if pool.is_empty() {
            if self.nullable {
                return Ok(match self.mode {
                    RelationMode::Many => Resolved::Many(Vec::new()),
                    _ => Resolved::Value(Value::Null),
                });
            }
            // Not retryable: more attempts cannot conjure target rows.
            return Err(PopulateError::RelationUnsatisfiable {
                kind: self.owner.clone(),
                field: self.field.clone(),
                target: self.target.clone(),
            });
        }

        match self.mode {
            RelationMode::Many => {
                let take = ctx.source.random_int(1, pool.len() as i64) as usize;
                pool.shuffle(ctx.source.rng_mut());
                pool.truncate(take);
                Ok(Resolved::Many(pool))
            }
            RelationMode::One | RelationMode::OneUnique => {
                let idx = ctx.source.random_index(pool.len());
                Ok(Resolved::Value(Value::Id(pool[idx])))
            }
        }
    }
}
