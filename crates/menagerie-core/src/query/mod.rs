//! Graph queries: a root entity type plus relation includes.
//!
//! Queries are planned against the schema and filter registry, then executed
//! against storage into a [`ResultGraph`].

mod executor;
mod join;
mod planner;
mod result;

pub use executor::QueryExecutor;
pub use join::EntityRow;
pub use planner::{IncludePlan, QueryPlan, QueryPlanner};
pub use result::{ColumnData, Edge, EdgeBlock, EntityBlock, ResultGraph};

use crate::filter::FilterExpr;
use crate::registry::FilterMode;

/// A query for a root entity set and optional related entity sets.
#[derive(Debug, Clone)]
pub struct GraphQuery {
    /// Root entity type to fetch.
    pub root_entity: String,
    /// Relation includes, in dependency order.
    pub includes: Vec<RelationInclude>,
    /// Caller-supplied filter on root entities. Applied in both filter
    /// modes; `ignore_filters` only suppresses registered filters.
    pub filter: Option<FilterExpr>,
    /// Whether registered filters apply to this query.
    pub mode: FilterMode,
}

impl GraphQuery {
    /// Query a root entity type with no includes.
    pub fn new(root_entity: impl Into<String>) -> Self {
        Self {
            root_entity: root_entity.into(),
            includes: Vec::new(),
            filter: None,
            mode: FilterMode::ApplyFilters,
        }
    }

    /// Add a relation include by dot-separated path.
    pub fn include(mut self, path: impl Into<String>) -> Self {
        self.includes.push(RelationInclude::new(path));
        self
    }

    /// Set a caller-supplied filter on root entities.
    pub fn with_filter(mut self, filter: FilterExpr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Suppress all registered filters for this query.
    pub fn ignore_filters(mut self) -> Self {
        self.mode = FilterMode::IgnoreFilters;
        self
    }
}

/// One relation include, addressed by dot-separated path from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationInclude {
    /// Path like `"pets"` or `"pets.favorite_toy"`.
    pub path: String,
}

impl RelationInclude {
    /// Create an include for the given path.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The final relation name in the path.
    pub fn relation_name(&self) -> &str {
        self.path.rsplit_once('.').map(|(_, name)| name).unwrap_or(&self.path)
    }

    /// The parent path for nested includes.
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(parent, _)| parent)
    }

    /// Check if this include hangs directly off the root.
    pub fn is_top_level(&self) -> bool {
        !self.path.contains('.')
    }

    /// Depth of this include (1 for top-level, 2 for nested, etc.)
    pub fn depth(&self) -> usize {
        self.path.matches('.').count() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_path_helpers() {
        let top = RelationInclude::new("pets");
        assert!(top.is_top_level());
        assert_eq!(top.depth(), 1);
        assert_eq!(top.relation_name(), "pets");
        assert_eq!(top.parent_path(), None);

        let nested = RelationInclude::new("pets.favorite_toy");
        assert!(!nested.is_top_level());
        assert_eq!(nested.depth(), 2);
        assert_eq!(nested.relation_name(), "favorite_toy");
        assert_eq!(nested.parent_path(), Some("pets"));
    }

    #[test]
    fn test_query_builder() {
        let query = GraphQuery::new("Owner")
            .include("pets")
            .include("pets.favorite_toy")
            .ignore_filters();

        assert_eq!(query.root_entity, "Owner");
        assert_eq!(query.includes.len(), 2);
        assert_eq!(query.mode, FilterMode::IgnoreFilters);
        assert!(query.filter.is_none());
    }
}
