//! Relation definitions between entities.

/// Cardinality of a relation as seen from its source side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// At most one related row per source row.
    One,
    /// Any number of related rows per source row.
    Many,
}

/// A directed relation between two entity types.
///
/// Both directions of a bidirectional link are declared as two `RelationDef`
/// values derived from the same foreign key: the navigation matches source
/// rows' `from_field` against target rows' `to_field`, so the two sides can
/// never disagree about which rows are linked.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDef {
    /// Relation name (unique among relations leaving `from_entity`).
    pub name: String,
    /// Source entity name.
    pub from_entity: String,
    /// Join field on the source entity.
    pub from_field: String,
    /// Target entity name.
    pub to_entity: String,
    /// Join field on the target entity.
    pub to_field: String,
    /// How many target rows a source row may reach.
    pub cardinality: Cardinality,
}

impl RelationDef {
    /// Create a to-one relation.
    pub fn one(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            from_field: from_field.into(),
            to_entity: to_entity.into(),
            to_field: to_field.into(),
            cardinality: Cardinality::One,
        }
    }

    /// Create a to-many relation.
    pub fn many(
        name: impl Into<String>,
        from_entity: impl Into<String>,
        from_field: impl Into<String>,
        to_entity: impl Into<String>,
        to_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            from_entity: from_entity.into(),
            from_field: from_field.into(),
            to_entity: to_entity.into(),
            to_field: to_field.into(),
            cardinality: Cardinality::Many,
        }
    }

    /// The same link navigated from the other side.
    pub fn inverse(&self, name: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            from_entity: self.to_entity.clone(),
            from_field: self.to_field.clone(),
            to_entity: self.from_entity.clone(),
            to_field: self.from_field.clone(),
            cardinality,
        }
    }
}
