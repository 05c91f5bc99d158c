use regex::Regex;

use seedfill_core::{EntityKind, FieldDescriptor, FieldKind, Id, Value};

use crate::errors::PopulateError;
use crate::faker::FakeSource;
use crate::populator::InsertedIndex;
use crate::relations::{RelationMode, RelationStrategy};
use crate::storage::Storage;

/// Generated binary payloads are capped at 1 MiB for performance.
pub const MAX_BINARY_LEN: usize = 1 << 20;

/// Outcome of one strategy invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// Scalar or to-one value, set directly on the candidate record.
    Value(Value),
    /// Multi-valued relation targets, linked after the row exists.
    Many(Vec<Id>),
    /// Field is not populated at all (media fields).
    Skip,
}

/// Collaborators available to a strategy while one record is being built.
pub struct StrategyContext<'a> {
    pub source: &'a mut FakeSource,
    pub storage: &'a dyn Storage,
    pub inserted: &'a InsertedIndex,
}

/// A resolved per-field value producer. Resolved once per batch
/// registration and reused for every record of that batch.
pub trait ValueStrategy {
    fn produce(&self, ctx: &mut StrategyContext<'_>) -> Result<Resolved, PopulateError>;
}

impl<F> ValueStrategy for F
where
    F: Fn(&mut StrategyContext<'_>) -> Result<Resolved, PopulateError>,
{
    fn produce(&self, ctx: &mut StrategyContext<'_>) -> Result<Resolved, PopulateError> {
        self(ctx)
    }
}

/// Wrap a closure as a boxed strategy; the usual way to write overrides.
pub fn value_strategy<F>(f: F) -> Box<dyn ValueStrategy>
where
    F: Fn(&mut StrategyContext<'_>) -> Result<Resolved, PopulateError> + 'static,
{
    Box::new(f)
}

/// Strategy that always yields the same value.
pub fn fixed(value: Value) -> Box<dyn ValueStrategy> {
    value_strategy(move |_| Ok(Resolved::Value(value.clone())))
}

/// One link in the resolution chain: may or may not produce a strategy
/// for a field. The first resolver that answers wins.
trait FieldResolver {
    fn resolve(
        &self,
        kind: &EntityKind,
        field: &FieldDescriptor,
        source: &mut FakeSource,
    ) -> Option<Box<dyn ValueStrategy>>;
}

/// Resolve a value strategy for every field of `kind`.
///
/// Rule priority is name patterns, then relations, then scalar type; a
/// declared choice set beats all scalar rules. A field no rule reaches is
/// a fatal `Resolution` error, raised here at registration time rather
/// than per row.
pub fn resolve_strategies(
    kind: &EntityKind,
    source: &mut FakeSource,
) -> Result<Vec<(String, Box<dyn ValueStrategy>)>, PopulateError> {
    let name_resolver = NameResolver::new();
    let resolvers: [&dyn FieldResolver; 3] = [&name_resolver, &RelationResolver, &TypeResolver];

    let mut strategies = Vec::with_capacity(kind.fields.len());
    for field in &kind.fields {
        let strategy = resolvers
            .iter()
            .find_map(|resolver| resolver.resolve(kind, field, source))
            .ok_or_else(|| PopulateError::Resolution {
                kind: kind.name.clone(),
                field: field.name.clone(),
            })?;
        strategies.push((field.name.clone(), strategy));
    }
    Ok(strategies)
}

fn text_op(f: impl Fn(&mut FakeSource) -> String + 'static) -> Box<dyn ValueStrategy> {
    value_strategy(move |ctx| Ok(Resolved::Value(Value::Text(f(ctx.source)))))
}

/// Matches well-known field names before any type rule is consulted.
struct NameResolver {
    boolean_prefix: Option<Regex>,
    timestamp_suffix: Option<Regex>,
}

impl NameResolver {
    fn new() -> Self {
        Self {
            boolean_prefix: Regex::new(r"^is[_A-Z]").ok(),
            timestamp_suffix: Regex::new(r"(_a|A)t$").ok(),
        }
    }
}

impl FieldResolver for NameResolver {
    fn resolve(
        &self,
        _kind: &EntityKind,
        field: &FieldDescriptor,
        _source: &mut FakeSource,
    ) -> Option<Box<dyn ValueStrategy>> {
        // Relation fields and fixed choice sets are never guessed by name.
        if field.kind.is_relation() || field.choices.is_some() {
            return None;
        }

        let raw = field.name.as_str();
        if self
            .boolean_prefix
            .as_ref()
            .is_some_and(|re| re.is_match(raw))
        {
            return Some(value_strategy(|ctx| {
                Ok(Resolved::Value(Value::Bool(ctx.source.boolean())))
            }));
        }
        if self
            .timestamp_suffix
            .as_ref()
            .is_some_and(|re| re.is_match(raw))
        {
            return Some(value_strategy(|ctx| {
                Ok(Resolved::Value(Value::DateTime(ctx.source.date_time())))
            }));
        }

        match raw.to_lowercase().as_str() {
            "first_name" | "firstname" => Some(text_op(FakeSource::first_name)),
            "last_name" | "lastname" => Some(text_op(FakeSource::last_name)),
            "name" => Some(text_op(FakeSource::word)),
            "username" | "login" | "nickname" => Some(text_op(FakeSource::user_name)),
            "email" | "email_address" => Some(text_op(FakeSource::email)),
            "phone_number" | "phonenumber" | "phone" => Some(text_op(FakeSource::phone_number)),
            "address" => Some(text_op(FakeSource::address)),
            "city" => Some(text_op(FakeSource::city)),
            "street_address" | "streetaddress" => Some(text_op(FakeSource::street_address)),
            "postcode" | "zipcode" => Some(text_op(FakeSource::postcode)),
            "state" => Some(text_op(FakeSource::state_abbr)),
            "country" => Some(text_op(FakeSource::country)),
            "title" => Some(text_op(FakeSource::sentence)),
            "body" | "summary" | "description" => Some(text_op(FakeSource::paragraph)),
            _ => None,
        }
    }
}

/// Hands relation fields to a `RelationStrategy`.
struct RelationResolver;

impl FieldResolver for RelationResolver {
    fn resolve(
        &self,
        kind: &EntityKind,
        field: &FieldDescriptor,
        _source: &mut FakeSource,
    ) -> Option<Box<dyn ValueStrategy>> {
        let mode = match field.kind {
            FieldKind::ToOne { .. } => RelationMode::One,
            FieldKind::ToOneUnique { .. } => RelationMode::OneUnique,
            FieldKind::ToMany { .. } => RelationMode::Many,
            _ => return None,
        };
        let target = field.kind.relation_target()?;
        Some(Box::new(RelationStrategy::new(
            &kind.name,
            &field.name,
            target,
            mode,
            field.nullable,
        )))
    }
}

/// Falls back on the scalar kind of the field.
struct TypeResolver;

impl FieldResolver for TypeResolver {
    fn resolve(
        &self,
        _kind: &EntityKind,
        field: &FieldDescriptor,
        source: &mut FakeSource,
    ) -> Option<Box<dyn ValueStrategy>> {
        if let Some(choices) = field.choices.as_ref().filter(|set| !set.is_empty()) {
            let choices = choices.clone();
            return Some(value_strategy(move |ctx| {
                let idx = ctx.source.random_index(choices.len());
                Ok(Resolved::Value(choices[idx].clone()))
            }));
        }

        let strategy = match field.kind {
            FieldKind::Boolean => value_strategy(|ctx| {
                Ok(Resolved::Value(Value::Bool(ctx.source.boolean())))
            }),
            FieldKind::SmallInt => int_range(0, 65_535),
            FieldKind::PositiveSmallInt => int_range(0, 32_767),
            FieldKind::Integer => int_range(i32::MIN as i64, i32::MAX as i64),
            FieldKind::PositiveInt => int_range(0, i32::MAX as i64),
            FieldKind::BigInt => int_range(i64::MIN, i64::MAX),
            FieldKind::Decimal {
                max_digits,
                decimal_places,
            }
            | FieldKind::Float {
                max_digits,
                decimal_places,
            } => {
                let left = max_digits.saturating_sub(decimal_places);
                value_strategy(move |ctx| {
                    Ok(Resolved::Value(Value::Float(
                        ctx.source.decimal(left, decimal_places),
                    )))
                })
            }
            FieldKind::Text => text_op(FakeSource::paragraph),
            FieldKind::Char { max_length } => {
                // Lorem text never fits very short columns; use one word.
                if max_length >= 5 {
                    value_strategy(move |ctx| {
                        Ok(Resolved::Value(Value::Text(ctx.source.text(max_length))))
                    })
                } else {
                    text_op(FakeSource::word)
                }
            }
            FieldKind::Slug { .. } => text_op(FakeSource::slug),
            FieldKind::Url => text_op(FakeSource::uri),
            FieldKind::Email => text_op(FakeSource::email),
            FieldKind::Uuid => {
                value_strategy(|ctx| Ok(Resolved::Value(Value::Uuid(ctx.source.uuid4()))))
            }
            FieldKind::Binary { max_length } => {
                let len = max_length
                    .map(|len| len as usize)
                    .unwrap_or(MAX_BINARY_LEN)
                    .min(MAX_BINARY_LEN);
                value_strategy(move |ctx| {
                    Ok(Resolved::Value(Value::Bytes(ctx.source.binary(len))))
                })
            }
            FieldKind::Date => {
                value_strategy(|ctx| Ok(Resolved::Value(Value::Date(ctx.source.date()))))
            }
            FieldKind::DateTime => value_strategy(|ctx| {
                Ok(Resolved::Value(Value::DateTime(ctx.source.date_time())))
            }),
            FieldKind::Time => {
                value_strategy(|ctx| Ok(Resolved::Value(Value::Time(ctx.source.time()))))
            }
            FieldKind::Duration => value_strategy(|ctx| {
                Ok(Resolved::Value(Value::Duration(ctx.source.time_delta())))
            }),
            FieldKind::IpAddress => {
                // Protocol family is fixed once per field resolution.
                let v6 = source.boolean();
                value_strategy(move |ctx| {
                    let addr = if v6 {
                        ctx.source.ipv6()
                    } else {
                        ctx.source.ipv4()
                    };
                    Ok(Resolved::Value(Value::Text(addr)))
                })
            }
            FieldKind::FilePath => fixed(Value::Text("/".to_string())),
            FieldKind::Media => value_strategy(|_| Ok(Resolved::Skip)),
            FieldKind::ToOne { .. } | FieldKind::ToOneUnique { .. } | FieldKind::ToMany { .. } => {
                return None;
            }
        };
        Some(strategy)
    }
}

fn int_range(min: i64, max: i64) -> Box<dyn ValueStrategy> {
    value_strategy(move |ctx| Ok(Resolved::Value(Value::Int(ctx.source.random_int(min, max)))))
}
