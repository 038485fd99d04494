//! Query planner: turns a `GraphQuery` into a validated execution plan.
//!
//! The planner resolves entity and relation definitions from the schema,
//! attaches the effective registered filter to the root and to every include
//! target, and rejects malformed queries before any row is read.

use tracing::debug;

use crate::error::Error;
use crate::filter::{combine_filters, FilterExpr};
use crate::registry::{FilterMode, FilterRegistry};
use crate::schema::{EntityDef, RelationDef, Schema};

use super::{GraphQuery, RelationInclude};

/// A validated execution plan.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// Root entity type to fetch.
    pub root_entity: String,
    /// Resolved root entity definition.
    pub root_entity_def: EntityDef,
    /// Filter on root entities: the caller filter combined with the
    /// effective registered filter.
    pub filter: Option<FilterExpr>,
    /// Include plans in dependency order.
    pub includes: Vec<IncludePlan>,
    /// Filter mode the plan was built under.
    pub mode: FilterMode,
}

/// Plan for fetching one related entity set.
#[derive(Debug, Clone)]
pub struct IncludePlan {
    /// Include path from the query (e.g. "pets.favorite_toy").
    pub path: String,
    /// Resolved relation definition.
    pub relation: RelationDef,
    /// Resolved target entity definition.
    pub target_entity_def: EntityDef,
    /// Effective registered filter for the target type, if any.
    pub filter: Option<FilterExpr>,
}

impl IncludePlan {
    /// Depth of this include (1 for top-level, 2 for nested, etc.)
    pub fn depth(&self) -> usize {
        self.path.matches('.').count() + 1
    }

    /// Check if this include hangs directly off the root.
    pub fn is_top_level(&self) -> bool {
        !self.path.contains('.')
    }

    /// The parent path for nested includes.
    pub fn parent_path(&self) -> Option<&str> {
        self.path.rsplit_once('.').map(|(parent, _)| parent)
    }

    /// Target entity name.
    pub fn target_entity(&self) -> &str {
        &self.relation.to_entity
    }
}

/// Planner that transforms a `GraphQuery` into a `QueryPlan`.
pub struct QueryPlanner<'a> {
    schema: &'a Schema,
    registry: &'a FilterRegistry,
}

impl<'a> QueryPlanner<'a> {
    /// Create a planner over a schema and filter registry.
    pub fn new(schema: &'a Schema, registry: &'a FilterRegistry) -> Self {
        Self { schema, registry }
    }

    /// Plan a query.
    pub fn plan(&self, query: &GraphQuery) -> Result<QueryPlan, Error> {
        let root_entity_def = self
            .schema
            .get_entity(&query.root_entity)
            .cloned()
            .ok_or_else(|| Error::UnknownEntity(query.root_entity.clone()))?;

        if let Some(filter) = &query.filter {
            self.validate_filter(&root_entity_def, filter)?;
        }

        // Caller filter applies in both modes; the registered filter is
        // dropped under IgnoreFilters.
        let registered = self
            .registry
            .effective(&query.root_entity, query.mode)
            .cloned();
        let filter = combine_filters(query.filter.clone(), registered);

        let mut includes: Vec<IncludePlan> = Vec::with_capacity(query.includes.len());
        for include in &query.includes {
            if includes.iter().any(|p| p.path == include.path) {
                continue; // Duplicate path, keep the first occurrence.
            }
            let plan = self.plan_single_include(&query.root_entity, include, &includes, query.mode)?;
            includes.push(plan);
        }

        debug!(
            root = %query.root_entity,
            includes = includes.len(),
            mode = ?query.mode,
            "query planned"
        );

        Ok(QueryPlan {
            root_entity: query.root_entity.clone(),
            root_entity_def,
            filter,
            includes,
            mode: query.mode,
        })
    }

    fn plan_single_include(
        &self,
        root_entity: &str,
        include: &RelationInclude,
        existing_plans: &[IncludePlan],
        mode: FilterMode,
    ) -> Result<IncludePlan, Error> {
        // Resolve the source entity for this include.
        let source_entity = if include.is_top_level() {
            root_entity.to_string()
        } else {
            let parent_path = include.parent_path().unwrap_or_default();
            let parent_plan = existing_plans
                .iter()
                .find(|p| p.path == parent_path)
                .ok_or_else(|| Error::IncludeParentMissing {
                    path: include.path.clone(),
                    parent: parent_path.to_string(),
                })?;
            parent_plan.target_entity().to_string()
        };

        let relation_name = include.relation_name();
        let relation = self
            .schema
            .relation_from(&source_entity, relation_name)
            .cloned()
            .ok_or_else(|| Error::UnknownRelation {
                entity: source_entity.clone(),
                relation: relation_name.to_string(),
            })?;

        let target_entity_def = self
            .schema
            .get_entity(&relation.to_entity)
            .cloned()
            .ok_or_else(|| Error::UnknownEntity(relation.to_entity.clone()))?;

        let filter = self.registry.effective(&relation.to_entity, mode).cloned();

        Ok(IncludePlan {
            path: include.path.clone(),
            relation,
            target_entity_def,
            filter,
        })
    }

    /// Validate a caller-supplied filter against the entity it targets.
    fn validate_filter(&self, entity: &EntityDef, filter: &FilterExpr) -> Result<(), Error> {
        for field in filter.referenced_fields() {
            if field.contains('.') {
                continue;
            }
            if entity.get_field(&field).is_none() {
                return Err(Error::UnknownField {
                    entity: entity.name.clone(),
                    field,
                });
            }
        }
        for relation in filter.referenced_relations() {
            if self.schema.relation_from(&entity.name, &relation).is_none() {
                return Err(Error::UnknownRelation {
                    entity: entity.name.clone(),
                    relation,
                });
            }
        }
        for (relation, field) in filter.navigation_field_refs() {
            let rel = self
                .schema
                .relation_from(&entity.name, &relation)
                .ok_or_else(|| Error::UnknownRelation {
                    entity: entity.name.clone(),
                    relation: relation.clone(),
                })?;
            let target = self
                .schema
                .get_entity(&rel.to_entity)
                .ok_or_else(|| Error::UnknownEntity(rel.to_entity.clone()))?;
            if target.get_field(&field).is_none() {
                return Err(Error::UnknownField {
                    entity: rel.to_entity.clone(),
                    field,
                });
            }
        }
        Ok(())
    }
}
