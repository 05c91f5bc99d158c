//! Core contracts for seedfill.
//!
//! This crate defines the canonical entity-kind schema types and the value
//! model shared between the populator engine and storage targets.

pub mod schema;
pub mod value;

pub use schema::{EntityKind, FieldDescriptor, FieldKind};
pub use value::{Id, Value};
