//! Query executor: runs plans against storage into result graphs.
//!
//! Execution order: scan and filter the root entity set, then resolve each
//! include in plan order, joining against the surviving rows of its parent
//! path. A row removed by a filter is removed from that path only; its
//! parent stays in the result with the reference absent.
//!
//! Before rows are evaluated, the executor materializes the non-row inputs a
//! filter needs: survivor sets for `Related` probes, and values for dotted
//! navigation references. Probes into a filtered type apply that type's own
//! effective filter, so an existence test only counts rows the filter would
//! let through. Probe recursion terminates because the registry rejects
//! probe cycles among filtered types at registration.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::Error;
use crate::filter::{FilterEvaluator, FilterExpr, RelatedProbes};
use crate::registry::{FilterMode, FilterRegistry};
use crate::schema::{EntityDef, RelationDef, Schema};
use crate::storage::StorageEngine;
use crate::value::{row_get, Row, Value};

use super::join::{hash_join, EntityRow};
use super::result::{ColumnData, EdgeBlock, EntityBlock, ResultGraph};
use super::{GraphQuery, QueryPlan, QueryPlanner};

/// Executes graph queries against a storage engine.
pub struct QueryExecutor<'a> {
    storage: &'a StorageEngine,
    schema: &'a Schema,
    registry: &'a FilterRegistry,
}

impl<'a> QueryExecutor<'a> {
    /// Create an executor over storage, schema, and filter registry.
    pub fn new(storage: &'a StorageEngine, schema: &'a Schema, registry: &'a FilterRegistry) -> Self {
        Self {
            storage,
            schema,
            registry,
        }
    }

    /// Plan and execute a query.
    pub fn execute(&self, query: &GraphQuery) -> Result<ResultGraph, Error> {
        let planner = QueryPlanner::new(self.schema, self.registry);
        let plan = planner.plan(query)?;
        self.execute_plan(&plan)
    }

    /// Execute a previously built plan.
    pub fn execute_plan(&self, plan: &QueryPlan) -> Result<ResultGraph, Error> {
        // Root entity scan under the combined root filter.
        let root_probes = self.compute_probes(&plan.root_entity, plan.filter.as_ref(), plan.mode)?;
        let mut roots = Vec::new();
        for result in self.storage.scan_entity_type(&plan.root_entity)? {
            let (id, mut fields) = result?;
            if self.row_passes(&plan.root_entity, plan.filter.as_ref(), &root_probes, &mut fields)? {
                roots.push(EntityRow { id, fields });
            }
        }

        let mut rows_by_path: HashMap<String, Vec<EntityRow>> = HashMap::new();
        rows_by_path.insert(String::new(), roots);
        let mut edge_blocks = Vec::new();

        for include in &plan.includes {
            let parent_path = include.parent_path().unwrap_or("").to_string();
            let parents = rows_by_path.get(&parent_path).cloned().unwrap_or_default();

            if parents.is_empty() {
                // Nothing to join against; the path is present but empty.
                rows_by_path.insert(include.path.clone(), Vec::new());
                edge_blocks.push(EdgeBlock::with_edges(include.path.clone(), Vec::new()));
                continue;
            }

            let target_entity = include.target_entity().to_string();
            let probes = self.compute_probes(&target_entity, include.filter.as_ref(), plan.mode)?;

            let (rows, edges) = hash_join(self.storage, &parents, &include.relation, |row| {
                let mut row = row.clone();
                self.row_passes(&target_entity, include.filter.as_ref(), &probes, &mut row)
            })?;

            rows_by_path.insert(include.path.clone(), rows);
            edge_blocks.push(EdgeBlock::with_edges(include.path.clone(), edges));
        }

        // Assemble columnar blocks, root first, then includes in plan order.
        let mut blocks = Vec::with_capacity(plan.includes.len() + 1);
        if let Some(roots) = rows_by_path.get("") {
            blocks.push(build_block("", &plan.root_entity_def, roots));
        }
        for include in &plan.includes {
            if let Some(rows) = rows_by_path.get(&include.path) {
                blocks.push(build_block(&include.path, &include.target_entity_def, rows));
            }
        }

        let graph = ResultGraph {
            blocks,
            edges: edge_blocks,
        };
        debug!(
            root = %plan.root_entity,
            entities = graph.total_entities(),
            "query executed"
        );
        Ok(graph)
    }

    /// Evaluate a filter against a row, resolving dotted navigation
    /// references first.
    fn row_passes(
        &self,
        entity: &str,
        filter: Option<&FilterExpr>,
        probes: &RelatedProbes,
        row: &mut Row,
    ) -> Result<bool, Error> {
        let Some(filter) = filter else {
            return Ok(true);
        };
        self.augment_navigation_fields(entity, filter, row)?;
        FilterEvaluator::evaluate(filter, row, probes)
    }

    /// Append dotted navigation fields the filter reads to the row.
    ///
    /// The registry forbids filter derefs into filtered types, so the
    /// related row is read without any filter applied.
    fn augment_navigation_fields(
        &self,
        entity: &str,
        filter: &FilterExpr,
        row: &mut Row,
    ) -> Result<(), Error> {
        for (relation, field) in filter.navigation_field_refs() {
            let dotted = format!("{relation}.{field}");
            if row_get(row, &dotted).is_some() {
                continue;
            }
            let rel = self.schema.relation_from(entity, &relation).ok_or_else(|| {
                Error::UnknownRelation {
                    entity: entity.to_string(),
                    relation: relation.clone(),
                }
            })?;
            let value = match row_get(row, &rel.from_field) {
                Some(Value::Uuid(key)) => self.lookup_related_field(rel, *key, &field)?,
                _ => Value::Null,
            };
            row.push((dotted, value));
        }
        Ok(())
    }

    /// Fetch a single field from the row a to-one relation points at.
    fn lookup_related_field(
        &self,
        rel: &RelationDef,
        key: [u8; 16],
        field: &str,
    ) -> Result<Value, Error> {
        let target_def = self
            .schema
            .get_entity(&rel.to_entity)
            .ok_or_else(|| Error::UnknownEntity(rel.to_entity.clone()))?;

        let target_row = if rel.to_field == target_def.identity_field {
            self.storage.get(&rel.to_entity, key)?
        } else {
            let mut found = None;
            for result in self.storage.scan_entity_type(&rel.to_entity)? {
                let (_, fields) = result?;
                if row_get(&fields, &rel.to_field) == Some(&Value::Uuid(key)) {
                    found = Some(fields);
                    break;
                }
            }
            found
        };

        Ok(target_row
            .and_then(|r| row_get(&r, field).cloned())
            .unwrap_or(Value::Null))
    }

    /// Compute survivor sets for every `Related` probe in a filter.
    ///
    /// For each probed relation the target type is scanned under its own
    /// effective filter (with its own probes) and the join-field values of
    /// surviving rows are collected.
    fn compute_probes(
        &self,
        entity: &str,
        filter: Option<&FilterExpr>,
        mode: FilterMode,
    ) -> Result<RelatedProbes, Error> {
        let mut probes = RelatedProbes::new(entity);
        let Some(filter) = filter else {
            return Ok(probes);
        };

        for relation in filter.referenced_relations() {
            let rel = self.schema.relation_from(entity, &relation).ok_or_else(|| {
                Error::UnknownRelation {
                    entity: entity.to_string(),
                    relation: relation.clone(),
                }
            })?;

            let target_filter = self.registry.effective(&rel.to_entity, mode).cloned();
            let inner = self.compute_probes(&rel.to_entity, target_filter.as_ref(), mode)?;

            let mut survivors = HashSet::new();
            for result in self.storage.scan_entity_type(&rel.to_entity)? {
                let (_, mut fields) = result?;
                if self.row_passes(&rel.to_entity, target_filter.as_ref(), &inner, &mut fields)? {
                    if let Some(Value::Uuid(key)) = row_get(&fields, &rel.to_field) {
                        survivors.insert(*key);
                    }
                }
            }

            probes.insert(relation, rel.from_field.clone(), survivors);
        }

        Ok(probes)
    }
}

fn build_block(path: &str, entity_def: &EntityDef, rows: &[EntityRow]) -> EntityBlock {
    let ids: Vec<[u8; 16]> = rows.iter().map(|r| r.id).collect();
    let columns = entity_def
        .fields
        .iter()
        .map(|f| {
            let values = rows
                .iter()
                .map(|r| row_get(&r.fields, &f.name).cloned().unwrap_or(Value::Null))
                .collect();
            ColumnData::new(f.name.clone(), values)
        })
        .collect();
    EntityBlock {
        path: path.to_string(),
        entity: entity_def.name.clone(),
        ids,
        columns,
    }
}
