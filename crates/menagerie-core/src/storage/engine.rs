//! Storage engine implementation.

use sled::{Db, Tree};

use crate::error::Error;
use crate::value::Row;

use super::codec::{decode_row, encode_row};
use super::config::StorageConfig;

/// The main storage engine wrapping sled.
///
/// Each entity type lives in its own tree named `entity:{Type}`, keyed by
/// the 16-byte entity ID.
pub struct StorageEngine {
    db: Db,
}

impl StorageEngine {
    /// Open or create a storage engine with the given configuration.
    pub fn open(config: StorageConfig) -> Result<Self, Error> {
        let db = config.to_sled_config().open()?;
        Ok(Self { db })
    }

    /// Insert or replace an entity row.
    pub fn put(&self, entity_type: &str, id: [u8; 16], row: &Row) -> Result<(), Error> {
        let tree = self.tree(entity_type)?;
        tree.insert(id, encode_row(row)?)?;
        Ok(())
    }

    /// Get an entity row by ID.
    pub fn get(&self, entity_type: &str, id: [u8; 16]) -> Result<Option<Row>, Error> {
        let tree = self.tree(entity_type)?;
        match tree.get(id)? {
            Some(bytes) => Ok(Some(decode_row(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Scan all rows of an entity type.
    pub fn scan_entity_type(
        &self,
        entity_type: &str,
    ) -> Result<impl Iterator<Item = Result<([u8; 16], Row), Error>>, Error> {
        let tree = self.tree(entity_type)?;
        let entity = entity_type.to_string();

        Ok(tree.iter().map(move |result| {
            let (key, value) = result?;
            if key.len() != 16 {
                return Err(Error::MalformedRow {
                    entity: entity.clone(),
                    reason: format!("key length {} instead of 16", key.len()),
                });
            }
            let mut id = [0u8; 16];
            id.copy_from_slice(&key);
            let row = decode_row(&value)?;
            Ok((id, row))
        }))
    }

    /// Number of rows of an entity type.
    pub fn count(&self, entity_type: &str) -> Result<usize, Error> {
        Ok(self.tree(entity_type)?.len())
    }

    /// Check if an entity type has no rows.
    pub fn is_empty(&self, entity_type: &str) -> Result<bool, Error> {
        Ok(self.tree(entity_type)?.is_empty())
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Generate a new entity ID (UUID v4 bytes).
    pub fn generate_id() -> [u8; 16] {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::time::{SystemTime, UNIX_EPOCH};

        // Counter to ensure uniqueness even with same timestamp
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();

        let counter = COUNTER.fetch_add(1, Ordering::SeqCst);

        let mut id = [0u8; 16];
        id[..8].copy_from_slice(&now.to_le_bytes());
        id[8..16].copy_from_slice(&counter.to_le_bytes());

        // Set UUID version 4 bits
        id[6] = (id[6] & 0x0f) | 0x40;
        id[8] = (id[8] & 0x3f) | 0x80;

        id
    }

    fn tree(&self, entity_type: &str) -> Result<Tree, Error> {
        Ok(self.db.open_tree(format!("entity:{entity_type}"))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn sample_row(name: &str) -> Row {
        vec![("name".to_string(), Value::String(name.to_string()))]
    }

    #[test]
    fn test_put_and_get() {
        let storage = StorageEngine::open(StorageConfig::temporary()).unwrap();
        let id = StorageEngine::generate_id();

        storage.put("Pet", id, &sample_row("Kibbles")).unwrap();
        assert_eq!(storage.get("Pet", id).unwrap(), Some(sample_row("Kibbles")));

        // Replacement overwrites.
        storage.put("Pet", id, &sample_row("Sammy")).unwrap();
        assert_eq!(storage.get("Pet", id).unwrap(), Some(sample_row("Sammy")));

        assert_eq!(storage.get("Pet", StorageEngine::generate_id()).unwrap(), None);
    }

    #[test]
    fn test_scan_is_scoped_to_type() {
        let storage = StorageEngine::open(StorageConfig::temporary()).unwrap();

        storage.put("Pet", StorageEngine::generate_id(), &sample_row("Hati")).unwrap();
        storage.put("Pet", StorageEngine::generate_id(), &sample_row("Simba")).unwrap();
        storage.put("Toy", StorageEngine::generate_id(), &sample_row("Bone")).unwrap();

        let pets: Vec<_> = storage
            .scan_entity_type("Pet")
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(pets.len(), 2);

        assert_eq!(storage.count("Pet").unwrap(), 2);
        assert_eq!(storage.count("Toy").unwrap(), 1);
        assert!(storage.is_empty("Owner").unwrap());
    }

    #[test]
    fn test_generate_id_is_unique() {
        let a = StorageEngine::generate_id();
        let b = StorageEngine::generate_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = StorageEngine::generate_id();

        {
            let storage = StorageEngine::open(StorageConfig::new(dir.path())).unwrap();
            storage.put("Owner", id, &sample_row("Janice")).unwrap();
            storage.flush().unwrap();
        }

        let storage = StorageEngine::open(StorageConfig::new(dir.path())).unwrap();
        assert_eq!(storage.get("Owner", id).unwrap(), Some(sample_row("Janice")));
    }
}
