//! The schema bundle: all entity and relation definitions.

use super::{EntityDef, RelationDef};

/// A complete schema: entity definitions plus the relations between them.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Entity definitions.
    pub entities: Vec<EntityDef>,
    /// Relation definitions.
    pub relations: Vec<RelationDef>,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity definition.
    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.push(entity);
        self
    }

    /// Add a relation definition.
    pub fn with_relation(mut self, relation: RelationDef) -> Self {
        self.relations.push(relation);
        self
    }

    /// Get an entity definition by name.
    pub fn get_entity(&self, name: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Get the relation with the given name leaving the given entity.
    pub fn relation_from(&self, entity: &str, name: &str) -> Option<&RelationDef> {
        self.relations
            .iter()
            .find(|r| r.from_entity == entity && r.name == name)
    }

    /// All relations leaving the given entity.
    pub fn relations_from<'a>(
        &'a self,
        entity: &'a str,
    ) -> impl Iterator<Item = &'a RelationDef> + 'a {
        self.relations.iter().filter(move |r| r.from_entity == entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Cardinality, FieldDef, ScalarType};

    fn sample_schema() -> Schema {
        let owner = EntityDef::new("Owner", "id")
            .with_field(FieldDef::new("id", ScalarType::Uuid))
            .with_field(FieldDef::new("name", ScalarType::String));
        let pet = EntityDef::new("Pet", "id")
            .with_field(FieldDef::new("id", ScalarType::Uuid))
            .with_field(FieldDef::new("name", ScalarType::String))
            .with_field(FieldDef::new("owner_id", ScalarType::Uuid));

        let pets = RelationDef::many("pets", "Owner", "id", "Pet", "owner_id");
        let owner_rel = pets.inverse("owner", Cardinality::One);

        Schema::new()
            .with_entity(owner)
            .with_entity(pet)
            .with_relation(pets)
            .with_relation(owner_rel)
    }

    #[test]
    fn test_entity_lookup() {
        let schema = sample_schema();
        assert!(schema.get_entity("Owner").is_some());
        assert!(schema.get_entity("Ghost").is_none());
    }

    #[test]
    fn test_relation_lookup_is_scoped_to_source_entity() {
        let schema = sample_schema();
        assert!(schema.relation_from("Owner", "pets").is_some());
        assert!(schema.relation_from("Pet", "pets").is_none());
        assert!(schema.relation_from("Pet", "owner").is_some());
    }

    #[test]
    fn test_relations_from() {
        let schema = sample_schema();
        let names: Vec<_> = schema.relations_from("Owner").map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["pets"]);
    }
}
