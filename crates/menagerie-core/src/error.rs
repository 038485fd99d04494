//! Core error types.

use thiserror::Error;

/// Errors raised by the filter registry, planner, loader, and storage layer.
///
/// Configuration errors (bad filter definitions, unknown entities, unknown
/// include paths) are detected at registration or plan time and never reach
/// execution. Storage errors propagate from the engine unchanged; this crate
/// performs no retries. A filtered-out or missing related entity is never an
/// error, it simply does not appear in the result graph.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Row encode/decode error.
    #[error("row codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// A stored row is missing or mistypes a field the model requires.
    #[error("malformed row for entity '{entity}': {reason}")]
    MalformedRow { entity: String, reason: String },

    /// Entity type is not declared in the schema.
    #[error("unknown entity type '{0}'")]
    UnknownEntity(String),

    /// Field is not declared on the entity.
    #[error("unknown field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    /// Relation does not leave the entity.
    #[error("unknown relation '{relation}' on entity '{entity}'")]
    UnknownRelation { entity: String, relation: String },

    /// Nested include whose parent path was not itself included.
    #[error("include path '{path}' references parent '{parent}' which was not included")]
    IncludeParentMissing { path: String, parent: String },

    /// Filter definition reaches into another filtered type.
    #[error(
        "filter for '{entity}' reaches through relation '{relation}' into filtered type '{target}'"
    )]
    FilterCycle {
        entity: String,
        relation: String,
        target: String,
    },
}

impl Error {
    /// True for errors caused by bad configuration rather than runtime state.
    ///
    /// Configuration errors are always fatal to the operation that raised
    /// them and are never downgraded to an empty result.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::UnknownEntity(_)
                | Error::UnknownField { .. }
                | Error::UnknownRelation { .. }
                | Error::IncludeParentMissing { .. }
                | Error::FilterCycle { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        let err = Error::UnknownEntity("Ghost".into());
        assert!(err.is_configuration());

        let err = Error::FilterCycle {
            entity: "Pet".into(),
            relation: "owner".into(),
            target: "Owner".into(),
        };
        assert!(err.is_configuration());

        let err = Error::MalformedRow {
            entity: "Pet".into(),
            reason: "missing name".into(),
        };
        assert!(!err.is_configuration());
    }
}
