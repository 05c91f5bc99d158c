use std::collections::BTreeSet;

use seedfill_core::{EntityKind, FieldDescriptor, FieldKind, Value};

use crate::storage::{Record, Storage, StorageError};

/// Fields of a candidate record that collided with persisted rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintViolation {
    pub fields: Vec<String>,
}

/// Whether a field takes part in single-field uniqueness checks.
///
/// Identity fields are excluded: storage assigns those, so a candidate
/// record never carries a colliding value. One-to-one fields stay checked
/// even when they double as the identity, unless the field is inherited
/// from a parent kind (the parent's check already covers it).
fn is_checked_unique(field: &FieldDescriptor) -> bool {
    if !field.unique {
        return false;
    }
    if !field.primary_key {
        return true;
    }
    matches!(field.kind, FieldKind::ToOneUnique { .. }) && !field.inherited
}

/// Check a candidate record against `kind`'s uniqueness constraints.
///
/// Returns the colliding fields, or `None` when the record is admissible.
/// Null values in nullable fields never collide; a unique-together group
/// whose values are all null is skipped entirely.
pub fn check(
    kind: &EntityKind,
    record: &Record,
    storage: &dyn Storage,
) -> Result<Option<ConstraintViolation>, StorageError> {
    let mut colliding = Vec::new();

    for field in kind.fields.iter().filter(|field| is_checked_unique(field)) {
        let value = record.get(&field.name).cloned().unwrap_or(Value::Null);
        if value.is_null() && field.nullable {
            continue;
        }
        if storage.exists(&kind.name, &[(field.name.as_str(), value)])? {
            colliding.push(field.name.clone());
        }
    }

    for group in &kind.unique_together {
        let members: Vec<&str> = group
            .iter()
            .filter(|name| {
                kind.field_named(name)
                    .is_none_or(|field| !field.primary_key)
            })
            .map(String::as_str)
            .collect();
        if members.is_empty() {
            continue;
        }

        let filter: Vec<(&str, Value)> = members
            .iter()
            .map(|name| {
                let value = record.get(*name).cloned().unwrap_or(Value::Null);
                (*name, value)
            })
            .collect();
        if filter.iter().all(|(_, value)| value.is_null()) {
            continue;
        }
        if storage.exists(&kind.name, &filter)? {
            // The whole declared group is reported, identity members included.
            colliding.extend(group.iter().cloned());
        }
    }

    let mut seen = BTreeSet::new();
    colliding.retain(|field| seen.insert(field.clone()));

    if colliding.is_empty() {
        Ok(None)
    } else {
        Ok(Some(ConstraintViolation { fields: colliding }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use seedfill_core::EntityKind;

    fn record(pairs: &[(&str, Value)]) -> Record {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn unique_field_collision_is_reported() {
        let kind = EntityKind::new("Player").field(
            FieldDescriptor::new("nickname", FieldKind::Char { max_length: 50 }).unique(),
        );
        let mut storage = MemoryStorage::new();
        let taken = record(&[("nickname", Value::Text("kim".into()))]);
        storage.create("Player", &taken).unwrap();

        let violation = check(&kind, &taken, &storage).unwrap().unwrap();
        assert_eq!(violation.fields, vec!["nickname".to_string()]);

        let fresh = record(&[("nickname", Value::Text("lee".into()))]);
        assert!(check(&kind, &fresh, &storage).unwrap().is_none());
    }

    #[test]
    fn null_in_nullable_unique_field_never_collides() {
        let kind = EntityKind::new("Player").field(
            FieldDescriptor::new("email", FieldKind::Email)
                .unique()
                .nullable(),
        );
        let mut storage = MemoryStorage::new();
        storage
            .create("Player", &record(&[("email", Value::Null)]))
            .unwrap();

        let candidate = record(&[("email", Value::Null)]);
        assert!(check(&kind, &candidate, &storage).unwrap().is_none());
    }

    #[test]
    fn identity_fields_are_not_checked() {
        let kind = EntityKind::new("Game").field(
            FieldDescriptor::new("id", FieldKind::PositiveInt)
                .unique()
                .primary_key(),
        );
        let mut storage = MemoryStorage::new();
        let row = record(&[("id", Value::Int(1))]);
        storage.create("Game", &row).unwrap();

        assert!(check(&kind, &row, &storage).unwrap().is_none());
    }

    #[test]
    fn one_to_one_identity_is_still_checked_unless_inherited() {
        let checked = FieldDescriptor::new(
            "profile",
            FieldKind::ToOneUnique {
                target: "Profile".to_string(),
            },
        )
        .primary_key();
        assert!(is_checked_unique(&checked));
        assert!(!is_checked_unique(&checked.inherited()));
    }

    #[test]
    fn unique_together_flags_the_whole_group() {
        let kind = EntityKind::new("Answer")
            .field(FieldDescriptor::new("question", FieldKind::PositiveInt))
            .field(FieldDescriptor::new("rank", FieldKind::PositiveSmallInt))
            .unique_together(&["question", "rank"]);
        let mut storage = MemoryStorage::new();
        let row = record(&[("question", Value::Int(3)), ("rank", Value::Int(1))]);
        storage.create("Answer", &row).unwrap();

        let violation = check(&kind, &row, &storage).unwrap().unwrap();
        assert_eq!(
            violation.fields,
            vec!["question".to_string(), "rank".to_string()]
        );

        let other = record(&[("question", Value::Int(3)), ("rank", Value::Int(2))]);
        assert!(check(&kind, &other, &storage).unwrap().is_none());
    }

    #[test]
    fn group_violations_name_identity_members_too() {
        // Identity fields are excluded from the collision query but still
        // belong to the reported group.
        let kind = EntityKind::new("Entry")
            .field(
                FieldDescriptor::new("id", FieldKind::PositiveInt)
                    .unique()
                    .primary_key(),
            )
            .field(FieldDescriptor::new("rank", FieldKind::PositiveSmallInt))
            .unique_together(&["id", "rank"]);
        let mut storage = MemoryStorage::new();
        storage
            .create("Entry", &record(&[("rank", Value::Int(1))]))
            .unwrap();

        let candidate = record(&[("id", Value::Int(99)), ("rank", Value::Int(1))]);
        let violation = check(&kind, &candidate, &storage).unwrap().unwrap();
        assert_eq!(violation.fields, vec!["id".to_string(), "rank".to_string()]);
    }

    #[test]
    fn fields_violating_twice_are_reported_once() {
        let kind = EntityKind::new("Seat")
            .field(FieldDescriptor::new("row", FieldKind::PositiveSmallInt).unique())
            .field(FieldDescriptor::new("column", FieldKind::PositiveSmallInt))
            .unique_together(&["row", "column"]);
        let mut storage = MemoryStorage::new();
        let taken = record(&[("row", Value::Int(3)), ("column", Value::Int(4))]);
        storage.create("Seat", &taken).unwrap();

        let violation = check(&kind, &taken, &storage).unwrap().unwrap();
        assert_eq!(
            violation.fields,
            vec!["row".to_string(), "column".to_string()]
        );
    }

    #[test]
    fn all_null_unique_together_tuples_are_skipped() {
        let kind = EntityKind::new("Edge")
            .field(FieldDescriptor::new("left", FieldKind::PositiveInt).nullable())
            .field(FieldDescriptor::new("right", FieldKind::PositiveInt).nullable())
            .unique_together(&["left", "right"]);
        let mut storage = MemoryStorage::new();
        let nulls = record(&[("left", Value::Null), ("right", Value::Null)]);
        storage.create("Edge", &nulls).unwrap();

        assert!(check(&kind, &nulls, &storage).unwrap().is_none());
    }
}
