//! Sample shelter data and the standard filter set.

use tracing::info;

use crate::error::Error;
use crate::filter::FilterExpr;
use crate::model::{
    BELONGS_TO_ID, ID, KIND, KIND_CANINE, KIND_FELINE, NAME, OWNER, OWNER_ID, PET, PETS,
    PREFERS_BOXES, TOLERATES_ID, TOY,
};
use crate::registry::FilterRegistry;
use crate::schema::Schema;
use crate::storage::StorageEngine;
use crate::value::{Row, Value};

/// Seed the sample shelter data.
///
/// Idempotent: does nothing and returns `false` when owners already exist.
pub fn seed_sample_data(storage: &StorageEngine) -> Result<bool, Error> {
    if !storage.is_empty(OWNER)? {
        return Ok(false);
    }

    let janice = insert_owner(storage, "Janice")?;
    let jamie = insert_owner(storage, "Jamie")?;
    let cesar = insert_owner(storage, "Cesar")?;
    let _paul = insert_owner(storage, "Paul")?;
    let dominic = insert_owner(storage, "Dominic")?;

    let hati = insert_canine(storage, "Hati", dominic)?;
    let simba = insert_canine(storage, "Simba", cesar)?;

    insert_feline(storage, "Kibbles", janice, false, None)?;
    insert_feline(storage, "Sammy", janice, true, Some(simba))?;
    insert_feline(storage, "Puffy", jamie, true, Some(hati))?;

    insert_toy(storage, "Squeeky duck", hati)?;
    insert_toy(storage, "Bone", simba)?;

    storage.flush()?;
    info!("seeded sample shelter data");
    Ok(true)
}

/// Build the standard filter set:
/// - owners must have at least one (surviving) pet,
/// - pets named with a leading "P" are hidden,
/// - toys with short names are hidden.
pub fn sample_filters(schema: &Schema) -> Result<FilterRegistry, Error> {
    Ok(FilterRegistry::builder(schema)
        .register(PET, FilterExpr::not_like(NAME, "P%"))?
        .register(OWNER, FilterExpr::related(PETS))?
        .register(TOY, FilterExpr::longer_than(NAME, 5))?
        .build())
}

fn insert_owner(storage: &StorageEngine, name: &str) -> Result<[u8; 16], Error> {
    let id = StorageEngine::generate_id();
    let row: Row = vec![
        (ID.to_string(), Value::Uuid(id)),
        (NAME.to_string(), Value::String(name.to_string())),
    ];
    storage.put(OWNER, id, &row)?;
    Ok(id)
}

fn insert_feline(
    storage: &StorageEngine,
    name: &str,
    owner_id: [u8; 16],
    prefers_boxes: bool,
    tolerates_id: Option<[u8; 16]>,
) -> Result<[u8; 16], Error> {
    let id = StorageEngine::generate_id();
    let row: Row = vec![
        (ID.to_string(), Value::Uuid(id)),
        (NAME.to_string(), Value::String(name.to_string())),
        (KIND.to_string(), Value::String(KIND_FELINE.to_string())),
        (OWNER_ID.to_string(), Value::Uuid(owner_id)),
        (PREFERS_BOXES.to_string(), Value::Bool(prefers_boxes)),
        (TOLERATES_ID.to_string(), Value::from(tolerates_id)),
    ];
    storage.put(PET, id, &row)?;
    Ok(id)
}

fn insert_canine(
    storage: &StorageEngine,
    name: &str,
    owner_id: [u8; 16],
) -> Result<[u8; 16], Error> {
    let id = StorageEngine::generate_id();
    let row: Row = vec![
        (ID.to_string(), Value::Uuid(id)),
        (NAME.to_string(), Value::String(name.to_string())),
        (KIND.to_string(), Value::String(KIND_CANINE.to_string())),
        (OWNER_ID.to_string(), Value::Uuid(owner_id)),
        (PREFERS_BOXES.to_string(), Value::Null),
        (TOLERATES_ID.to_string(), Value::Null),
    ];
    storage.put(PET, id, &row)?;
    Ok(id)
}

fn insert_toy(
    storage: &StorageEngine,
    name: &str,
    belongs_to_id: [u8; 16],
) -> Result<[u8; 16], Error> {
    let id = StorageEngine::generate_id();
    let row: Row = vec![
        (ID.to_string(), Value::Uuid(id)),
        (NAME.to_string(), Value::String(name.to_string())),
        (BELONGS_TO_ID.to_string(), Value::Uuid(belongs_to_id)),
    ];
    storage.put(TOY, id, &row)?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::animal_schema;
    use crate::storage::StorageConfig;

    #[test]
    fn test_seed_counts() {
        let storage = StorageEngine::open(StorageConfig::temporary()).unwrap();
        assert!(seed_sample_data(&storage).unwrap());

        assert_eq!(storage.count(OWNER).unwrap(), 5);
        assert_eq!(storage.count(PET).unwrap(), 5);
        assert_eq!(storage.count(TOY).unwrap(), 2);
    }

    #[test]
    fn test_seed_is_idempotent() {
        let storage = StorageEngine::open(StorageConfig::temporary()).unwrap();
        assert!(seed_sample_data(&storage).unwrap());
        assert!(!seed_sample_data(&storage).unwrap());
        assert_eq!(storage.count(OWNER).unwrap(), 5);
    }

    #[test]
    fn test_sample_filters_register_cleanly() {
        let schema = animal_schema();
        let registry = sample_filters(&schema).unwrap();
        assert_eq!(registry.len(), 3);
    }
}
