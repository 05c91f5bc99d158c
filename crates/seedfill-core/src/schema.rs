use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Semantic type of a field: a scalar kind or a relation to another entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Boolean,
    /// 0..=65535.
    SmallInt,
    /// 0..=32767.
    PositiveSmallInt,
    /// Full signed 32-bit range.
    Integer,
    /// 0..=2147483647.
    PositiveInt,
    /// Full signed 64-bit range.
    BigInt,
    Decimal { max_digits: u8, decimal_places: u8 },
    Float { max_digits: u8, decimal_places: u8 },
    /// Free-form text without a declared length bound.
    Text,
    /// Length-bounded text.
    Char { max_length: u32 },
    Slug { max_length: u32 },
    Url,
    Email,
    Uuid,
    Binary { max_length: Option<u32> },
    Date,
    DateTime,
    Time,
    Duration,
    IpAddress,
    FilePath,
    /// Image/file reference; populated out of band, never generated.
    Media,
    /// Singular reference to `target`.
    ToOne { target: String },
    /// Singular reference to `target` that no other row may share.
    ToOneUnique { target: String },
    /// Multi-valued reference to `target`.
    ToMany { target: String },
}

impl FieldKind {
    pub fn is_relation(&self) -> bool {
        matches!(
            self,
            FieldKind::ToOne { .. } | FieldKind::ToOneUnique { .. } | FieldKind::ToMany { .. }
        )
    }

    /// Related entity kind for relation fields.
    pub fn relation_target(&self) -> Option<&str> {
        match self {
            FieldKind::ToOne { target }
            | FieldKind::ToOneUnique { target }
            | FieldKind::ToMany { target } => Some(target),
            _ => None,
        }
    }
}

/// Description of a single field of an entity kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
    /// True when a primary-key relation exists because one entity kind
    /// extends another rather than linking a genuinely foreign kind.
    pub inherited: bool,
    /// Fixed option set; when present it wins over every generation rule.
    pub choices: Option<Vec<Value>>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        // One-to-one links are unique by definition.
        let unique = matches!(kind, FieldKind::ToOneUnique { .. });
        Self {
            name: name.into(),
            kind,
            nullable: false,
            unique,
            primary_key: false,
            inherited: false,
            choices: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }

    pub fn with_choices(mut self, choices: Vec<Value>) -> Self {
        self.choices = Some(choices);
        self
    }
}

/// Schema-level description of a record type. Immutable for the duration of
/// a populator run; row identities are assigned by the storage target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EntityKind {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    /// Groups of field names whose value tuples must be unique together.
    pub unique_together: Vec<Vec<String>>,
}

impl EntityKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            unique_together: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn unique_together(mut self, group: &[&str]) -> Self {
        self.unique_together
            .push(group.iter().map(|name| name.to_string()).collect());
        self
    }

    pub fn field_named(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}
