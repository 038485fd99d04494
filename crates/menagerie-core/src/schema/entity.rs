//! Entity and field definitions.

/// Scalar type of a stored field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    /// Boolean.
    Bool,
    /// 64-bit signed integer.
    Int64,
    /// UTF-8 string.
    String,
    /// 16-byte entity identifier.
    Uuid,
}

/// A field definition on an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    /// Field name (unique within the entity).
    pub name: String,
    /// Scalar type.
    pub ty: ScalarType,
    /// Whether the field may hold `Value::Null` (unset foreign keys).
    pub nullable: bool,
}

impl FieldDef {
    /// Create a required field.
    pub fn new(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
        }
    }

    /// Create a nullable field.
    pub fn optional(name: impl Into<String>, ty: ScalarType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: true,
        }
    }
}

/// An entity type definition.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDef {
    /// Entity name (unique within the schema).
    pub name: String,
    /// Name of the identity field.
    pub identity_field: String,
    /// Field definitions.
    pub fields: Vec<FieldDef>,
}

impl EntityDef {
    /// Create a new entity definition.
    pub fn new(name: impl Into<String>, identity_field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity_field: identity_field.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field to the entity.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Get a field by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}
