//! Static schema metadata: entities, fields, and relations.
//!
//! The schema is built once at startup and shared by reference. It is the
//! source of truth the filter registry and the query planner validate
//! against.

mod entity;
mod relation;
#[allow(clippy::module_inception)]
mod schema;

pub use entity::{EntityDef, FieldDef, ScalarType};
pub use relation::{Cardinality, RelationDef};
pub use schema::Schema;
