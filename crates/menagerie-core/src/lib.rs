//! Menagerie core - schema, per-type query filters, and graph query execution.
//!
//! Entity types may carry one declarative filter each. Filters apply
//! automatically wherever the type appears in a query, at the root and
//! behind every relation include, and a query can opt out of all of them at
//! once. Filtering never cascades: a filtered-out related row leaves its
//! parent in the result with the reference absent.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod error;
pub mod filter;
pub mod model;
pub mod query;
pub mod registry;
pub mod schema;
pub mod seed;
pub mod storage;
pub mod value;

pub use error::Error;
pub use filter::{combine_filters, FilterEvaluator, FilterExpr, RelatedProbes};
pub use model::{animal_schema, decode_owners};
pub use query::{
    ColumnData, Edge, EdgeBlock, EntityBlock, GraphQuery, QueryExecutor, QueryPlan, QueryPlanner,
    RelationInclude, ResultGraph,
};
pub use registry::{FilterMode, FilterRegistry, FilterRegistryBuilder};
pub use schema::{Cardinality, EntityDef, FieldDef, RelationDef, ScalarType, Schema};
pub use seed::{sample_filters, seed_sample_data};
pub use storage::{StorageConfig, StorageEngine};
pub use value::{row_get, Row, Value};
