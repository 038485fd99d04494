//! Hash join for resolving relation includes.
//!
//! Build phase: scan the relation's target type once and key surviving rows
//! by their join-field value. Probe phase: look up each parent's join-field
//! value in O(1). Filters are applied during the build so filtered-out rows
//! never enter the hash table.
//!
//! The join is direction agnostic. A to-many include (Owner to pets) keys
//! Pet rows by `owner_id` and probes with Owner ids; the inverse to-one
//! include keys Owner rows by `id` and probes with Pet `owner_id` values.
//! Both fall out of the relation's `from_field`/`to_field` pair.

use std::collections::HashMap;

use crate::error::Error;
use crate::schema::{Cardinality, RelationDef};
use crate::storage::StorageEngine;
use crate::value::{row_get, Row, Value};

use super::result::Edge;

/// An entity row during execution.
#[derive(Debug, Clone)]
pub struct EntityRow {
    /// Entity ID.
    pub id: [u8; 16],
    /// Field values.
    pub fields: Row,
}

/// Join parent rows to related rows through a relation.
///
/// `target_passes` decides whether a scanned target row survives; the caller
/// supplies the effective filter evaluation. Rows whose join field is null
/// never match. For a to-one relation at most one related row is kept per
/// parent.
pub fn hash_join<F>(
    storage: &StorageEngine,
    parents: &[EntityRow],
    relation: &RelationDef,
    mut target_passes: F,
) -> Result<(Vec<EntityRow>, Vec<Edge>), Error>
where
    F: FnMut(&Row) -> Result<bool, Error>,
{
    // Build phase: scan target rows, filter, key by join field.
    let mut by_key: HashMap<[u8; 16], Vec<EntityRow>> = HashMap::new();

    for result in storage.scan_entity_type(&relation.to_entity)? {
        let (id, fields) = result?;

        let key = match row_get(&fields, &relation.to_field) {
            Some(Value::Uuid(key)) => *key,
            _ => continue, // Null or missing join field never matches.
        };

        if !target_passes(&fields)? {
            continue;
        }

        by_key.entry(key).or_default().push(EntityRow { id, fields });
    }

    // Probe phase: look up each parent's join-field value.
    let mut rows = Vec::new();
    let mut edges = Vec::new();

    for parent in parents {
        let key = match row_get(&parent.fields, &relation.from_field) {
            Some(Value::Uuid(key)) => *key,
            _ => continue,
        };

        let Some(matches) = by_key.get(&key) else {
            continue;
        };

        let limit = match relation.cardinality {
            Cardinality::One => 1,
            Cardinality::Many => matches.len(),
        };

        for child in matches.iter().take(limit) {
            rows.push(child.clone());
            edges.push(Edge::new(parent.id, child.id));
        }
    }

    Ok((rows, edges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageConfig, StorageEngine};

    fn setup_storage() -> StorageEngine {
        StorageEngine::open(StorageConfig::temporary()).unwrap()
    }

    fn insert(storage: &StorageEngine, entity: &str, fields: Vec<(&str, Value)>) -> [u8; 16] {
        let id = StorageEngine::generate_id();
        let mut row: Row = vec![("id".to_string(), Value::Uuid(id))];
        row.extend(fields.into_iter().map(|(n, v)| (n.to_string(), v)));
        storage.put(entity, id, &row).unwrap();
        id
    }

    fn parent_row(id: [u8; 16]) -> EntityRow {
        EntityRow {
            id,
            fields: vec![("id".to_string(), Value::Uuid(id))],
        }
    }

    #[test]
    fn test_to_many_join() {
        let storage = setup_storage();
        let relation = RelationDef::many("pets", "Owner", "id", "Pet", "owner_id");

        let owner1 = StorageEngine::generate_id();
        let owner2 = StorageEngine::generate_id();

        insert(&storage, "Pet", vec![("name", "Kibbles".into()), ("owner_id", Value::Uuid(owner1))]);
        insert(&storage, "Pet", vec![("name", "Sammy".into()), ("owner_id", Value::Uuid(owner1))]);
        insert(&storage, "Pet", vec![("name", "Puffy".into()), ("owner_id", Value::Uuid(owner2))]);

        let parents = vec![parent_row(owner1)];
        let (rows, edges) = hash_join(&storage, &parents, &relation, |_| Ok(true)).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(edges.len(), 2);
        for edge in &edges {
            assert_eq!(edge.from_id, owner1);
        }
    }

    #[test]
    fn test_filter_pushdown() {
        let storage = setup_storage();
        let relation = RelationDef::many("pets", "Owner", "id", "Pet", "owner_id");

        let owner = StorageEngine::generate_id();
        insert(&storage, "Pet", vec![("name", "Sammy".into()), ("owner_id", Value::Uuid(owner))]);
        insert(&storage, "Pet", vec![("name", "Puffy".into()), ("owner_id", Value::Uuid(owner))]);

        let parents = vec![parent_row(owner)];
        let (rows, _) = hash_join(&storage, &parents, &relation, |row| {
            Ok(row_get(row, "name").and_then(Value::as_str) != Some("Puffy"))
        })
        .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(row_get(&rows[0].fields, "name").and_then(Value::as_str), Some("Sammy"));
    }

    #[test]
    fn test_to_one_join_follows_fk_on_parent() {
        let storage = setup_storage();
        let relation = RelationDef::one("tolerates", "Pet", "tolerates_id", "Pet", "id");

        let target =
            insert(&storage, "Pet", vec![("name", "Hati".into()), ("tolerates_id", Value::Null)]);

        let parent_id = StorageEngine::generate_id();
        let parent = EntityRow {
            id: parent_id,
            fields: vec![
                ("id".to_string(), Value::Uuid(parent_id)),
                ("tolerates_id".to_string(), Value::Uuid(target)),
            ],
        };

        let (rows, edges) = hash_join(&storage, &[parent], &relation, |_| Ok(true)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, target);
        assert_eq!(edges[0].from_id, parent_id);
        assert_eq!(edges[0].to_id, target);
    }

    #[test]
    fn test_null_fk_matches_nothing() {
        let storage = setup_storage();
        let relation = RelationDef::one("tolerates", "Pet", "tolerates_id", "Pet", "id");

        insert(&storage, "Pet", vec![("name", "Hati".into()), ("tolerates_id", Value::Null)]);

        let parent_id = StorageEngine::generate_id();
        let parent = EntityRow {
            id: parent_id,
            fields: vec![
                ("id".to_string(), Value::Uuid(parent_id)),
                ("tolerates_id".to_string(), Value::Null),
            ],
        };

        let (rows, edges) = hash_join(&storage, &[parent], &relation, |_| Ok(true)).unwrap();
        assert!(rows.is_empty());
        assert!(edges.is_empty());
    }

    #[test]
    fn test_empty_parents() {
        let storage = setup_storage();
        let relation = RelationDef::many("pets", "Owner", "id", "Pet", "owner_id");

        let other = StorageEngine::generate_id();
        insert(&storage, "Pet", vec![("name", "Simba".into()), ("owner_id", Value::Uuid(other))]);

        let (rows, edges) = hash_join(&storage, &[], &relation, |_| Ok(true)).unwrap();
        assert!(rows.is_empty());
        assert!(edges.is_empty());
    }
}
