//! The filter registry: one declarative filter per entity type.
//!
//! Filters registered here are applied automatically wherever their entity
//! type appears in a query, at the root and behind every include path alike.
//! A query can opt out of all registered filters at once with
//! [`FilterMode::IgnoreFilters`]; there is no per-type opt-out.
//!
//! Registration is validated against the schema up front so that a bad
//! filter definition fails loudly at startup instead of producing wrong
//! results later. Validation is order independent: a pair of definitions
//! rejected in one registration order is rejected in the other as well.

use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::error::Error;
use crate::filter::FilterExpr;
use crate::schema::Schema;

/// Whether a query applies registered filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// Apply every registered filter wherever its type appears.
    #[default]
    ApplyFilters,
    /// Suppress all registered filters for this query. Caller-supplied
    /// filters still apply.
    IgnoreFilters,
}

/// Immutable mapping from entity type to its registered filter.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    filters: HashMap<String, FilterExpr>,
}

impl FilterRegistry {
    /// Start building a registry validated against the given schema.
    pub fn builder(schema: &Schema) -> FilterRegistryBuilder<'_> {
        FilterRegistryBuilder {
            schema,
            filters: HashMap::new(),
        }
    }

    /// A registry with no filters.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The registered filter for an entity type, if any.
    pub fn lookup(&self, entity: &str) -> Option<&FilterExpr> {
        self.filters.get(entity)
    }

    /// The filter to apply for an entity type under the given mode.
    ///
    /// `IgnoreFilters` suppresses every registered filter uniformly.
    pub fn effective(&self, entity: &str, mode: FilterMode) -> Option<&FilterExpr> {
        match mode {
            FilterMode::ApplyFilters => self.lookup(entity),
            FilterMode::IgnoreFilters => None,
        }
    }

    /// Number of registered filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// True if no filters are registered.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Builder validating filter definitions against the schema.
#[derive(Debug)]
pub struct FilterRegistryBuilder<'a> {
    schema: &'a Schema,
    filters: HashMap<String, FilterExpr>,
}

impl FilterRegistryBuilder<'_> {
    /// Register a filter for an entity type.
    ///
    /// Registering a second filter for the same type replaces the first.
    ///
    /// Rejected definitions:
    /// - unknown entity, unknown plain field, unknown `Related` relation,
    ///   or a dotted reference through an unknown relation or to an unknown
    ///   target field;
    /// - a dotted reference that reads a field of a type which itself
    ///   carries a filter, in either registration order. Deciding whether
    ///   such a row passes would require filtering the very rows being read,
    ///   so these definitions are refused outright. `Related` existence
    ///   probes into filtered types stay legal: the probe respects the
    ///   target's filter without reading its fields into this predicate.
    /// - a `Related` probe chain among filtered types that loops back to
    ///   its starting type, which would make probe computation recurse
    ///   forever.
    pub fn register(mut self, entity: &str, filter: FilterExpr) -> Result<Self, Error> {
        let entity_def = self
            .schema
            .get_entity(entity)
            .ok_or_else(|| Error::UnknownEntity(entity.to_string()))?;

        // Plain fields must exist on the entity.
        for field in filter.referenced_fields() {
            if field.contains('.') {
                continue;
            }
            if entity_def.get_field(&field).is_none() {
                return Err(Error::UnknownField {
                    entity: entity.to_string(),
                    field,
                });
            }
        }

        // Related probes must name relations leaving the entity.
        for relation in filter.referenced_relations() {
            if self.schema.relation_from(entity, &relation).is_none() {
                return Err(Error::UnknownRelation {
                    entity: entity.to_string(),
                    relation,
                });
            }
        }

        // Dotted references must resolve, and must not read a filtered type.
        // The new filter counts as filtering its own type here so that a
        // self-referential definition is caught too.
        let filtered_after: HashSet<&str> = self
            .filters
            .keys()
            .map(String::as_str)
            .chain(std::iter::once(entity))
            .collect();

        for (relation, field) in filter.navigation_field_refs() {
            let rel = self
                .schema
                .relation_from(entity, &relation)
                .ok_or_else(|| Error::UnknownRelation {
                    entity: entity.to_string(),
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
            if filtered_after.contains(rel.to_entity.as_str()) {
                return Err(Error::FilterCycle {
                    entity: entity.to_string(),
                    relation,
                    target: rel.to_entity.clone(),
                });
            }
        }

        // The reverse direction: an already-registered filter may hold a
        // dotted reference into the type being filtered now.
        for (other_entity, other_filter) in &self.filters {
            if other_entity == entity {
                continue;
            }
            for (relation, _) in other_filter.navigation_field_refs() {
                if let Some(rel) = self.schema.relation_from(other_entity, &relation) {
                    if rel.to_entity == entity {
                        return Err(Error::FilterCycle {
                            entity: other_entity.clone(),
                            relation,
                            target: entity.to_string(),
                        });
                    }
                }
            }
        }

        let replaced = self.filters.insert(entity.to_string(), filter).is_some();
        if replaced {
            info!(entity, "replaced registered filter");
        }

        // Probe chains among filtered types must not loop.
        if let Some((from, relation, target)) = self.find_probe_cycle() {
            return Err(Error::FilterCycle {
                entity: from,
                relation,
                target,
            });
        }

        Ok(self)
    }

    /// Finish building.
    pub fn build(self) -> FilterRegistry {
        info!(filters = self.filters.len(), "filter registry built");
        FilterRegistry {
            filters: self.filters,
        }
    }

    /// Find a `Related` probe edge among filtered types that closes a cycle.
    ///
    /// Probe computation for type A recurses into type B when A's filter
    /// probes a relation targeting B and B is itself filtered. That
    /// recursion terminates exactly when the probe graph is acyclic.
    fn find_probe_cycle(&self) -> Option<(String, String, String)> {
        for start in self.filters.keys() {
            let mut visited = HashSet::new();
            if let Some(cycle) = self.probe_dfs(start, start, &mut visited) {
                return Some(cycle);
            }
        }
        None
    }

    fn probe_dfs(
        &self,
        start: &str,
        current: &str,
        visited: &mut HashSet<String>,
    ) -> Option<(String, String, String)> {
        if !visited.insert(current.to_string()) {
            return None;
        }
        let filter = self.filters.get(current)?;
        for relation in filter.referenced_relations() {
            let rel = self.schema.relation_from(current, &relation)?;
            if !self.filters.contains_key(&rel.to_entity) {
                continue;
            }
            if rel.to_entity == start {
                return Some((current.to_string(), relation, rel.to_entity.clone()));
            }
            if let Some(cycle) = self.probe_dfs(start, &rel.to_entity.clone(), visited) {
                return Some(cycle);
            }
        }
        None
    }
}
