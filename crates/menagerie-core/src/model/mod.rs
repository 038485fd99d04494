//! The animal shelter domain model.
//!
//! Three stored entity types. Felines and canines share the `Pet` type and
//! are told apart by the `kind` discriminator; the typed layer in
//! [`graph`] turns that back into an enum.
//!
//! Every bidirectional link is a single stored foreign key with a relation
//! declared for each direction, so the two navigations cannot disagree.

mod graph;

pub use graph::{decode_owners, Canine, Feline, Owner, Pet, PetRef, Toy};

use crate::schema::{Cardinality, EntityDef, FieldDef, RelationDef, ScalarType, Schema};

/// Entity type names.
pub const OWNER: &str = "Owner";
pub const PET: &str = "Pet";
pub const TOY: &str = "Toy";

/// `Pet.kind` discriminator values.
pub const KIND_FELINE: &str = "feline";
pub const KIND_CANINE: &str = "canine";

/// Field names.
pub const ID: &str = "id";
pub const NAME: &str = "name";
pub const KIND: &str = "kind";
pub const OWNER_ID: &str = "owner_id";
pub const PREFERS_BOXES: &str = "prefers_boxes";
pub const TOLERATES_ID: &str = "tolerates_id";
pub const BELONGS_TO_ID: &str = "belongs_to_id";

/// Relation names.
pub const PETS: &str = "pets";
pub const OWNER_REL: &str = "owner";
pub const TOLERATES: &str = "tolerates";
pub const FRIENDS_WITH: &str = "friends_with";
pub const FAVORITE_TOY: &str = "favorite_toy";
pub const BELONGS_TO: &str = "belongs_to";

/// Build the shelter schema.
pub fn animal_schema() -> Schema {
    let owner = EntityDef::new(OWNER, ID)
        .with_field(FieldDef::new(ID, ScalarType::Uuid))
        .with_field(FieldDef::new(NAME, ScalarType::String));

    let pet = EntityDef::new(PET, ID)
        .with_field(FieldDef::new(ID, ScalarType::Uuid))
        .with_field(FieldDef::new(NAME, ScalarType::String))
        .with_field(FieldDef::new(KIND, ScalarType::String))
        .with_field(FieldDef::new(OWNER_ID, ScalarType::Uuid))
        .with_field(FieldDef::optional(PREFERS_BOXES, ScalarType::Bool))
        .with_field(FieldDef::optional(TOLERATES_ID, ScalarType::Uuid));

    let toy = EntityDef::new(TOY, ID)
        .with_field(FieldDef::new(ID, ScalarType::Uuid))
        .with_field(FieldDef::new(NAME, ScalarType::String))
        .with_field(FieldDef::optional(BELONGS_TO_ID, ScalarType::Uuid));

    // Owner <-> Pet via Pet.owner_id.
    let pets = RelationDef::many(PETS, OWNER, ID, PET, OWNER_ID);
    let owner_rel = pets.inverse(OWNER_REL, Cardinality::One);

    // Feline <-> Canine via Pet.tolerates_id on the feline side.
    let tolerates = RelationDef::one(TOLERATES, PET, TOLERATES_ID, PET, ID);
    let friends_with = tolerates.inverse(FRIENDS_WITH, Cardinality::One);

    // Canine <-> Toy via Toy.belongs_to_id.
    let favorite_toy = RelationDef::one(FAVORITE_TOY, PET, ID, TOY, BELONGS_TO_ID);
    let belongs_to = favorite_toy.inverse(BELONGS_TO, Cardinality::One);

    Schema::new()
        .with_entity(owner)
        .with_entity(pet)
        .with_entity(toy)
        .with_relation(pets)
        .with_relation(owner_rel)
        .with_relation(tolerates)
        .with_relation(friends_with)
        .with_relation(favorite_toy)
        .with_relation(belongs_to)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_declares_all_navigations() {
        let schema = animal_schema();

        assert!(schema.get_entity(OWNER).is_some());
        assert!(schema.get_entity(PET).is_some());
        assert!(schema.get_entity(TOY).is_some());

        assert!(schema.relation_from(OWNER, PETS).is_some());
        assert!(schema.relation_from(PET, OWNER_REL).is_some());
        assert!(schema.relation_from(PET, TOLERATES).is_some());
        assert!(schema.relation_from(PET, FRIENDS_WITH).is_some());
        assert!(schema.relation_from(PET, FAVORITE_TOY).is_some());
        assert!(schema.relation_from(TOY, BELONGS_TO).is_some());
    }

    #[test]
    fn test_paired_relations_share_the_same_fk() {
        let schema = animal_schema();

        let tolerates = schema.relation_from(PET, TOLERATES).unwrap();
        let friends_with = schema.relation_from(PET, FRIENDS_WITH).unwrap();
        assert_eq!(tolerates.from_field, friends_with.to_field);
        assert_eq!(tolerates.to_field, friends_with.from_field);

        let favorite_toy = schema.relation_from(PET, FAVORITE_TOY).unwrap();
        let belongs_to = schema.relation_from(TOY, BELONGS_TO).unwrap();
        assert_eq!(favorite_toy.to_field, belongs_to.from_field);
    }
}
