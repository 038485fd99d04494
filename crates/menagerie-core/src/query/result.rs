//! Result types for graph queries.
//!
//! Results are columnar. Each include path in the query produces one
//! `EntityBlock` of surviving rows and one `EdgeBlock` linking them to their
//! parents. Blocks are keyed by include path rather than entity type because
//! several paths may target the same type.

use crate::value::Value;

/// A block of entities produced by one include path (or the query root).
///
/// Column-oriented: every column has the same length as `ids`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBlock {
    /// Include path this block belongs to. Empty string for the root.
    pub path: String,
    /// Entity type name.
    pub entity: String,
    /// Entity IDs (parallel with column values).
    pub ids: Vec<[u8; 16]>,
    /// Column data.
    pub columns: Vec<ColumnData>,
}

/// Column data within an entity block.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnData {
    /// Column (field) name.
    pub name: String,
    /// Values for each row.
    pub values: Vec<Value>,
}

impl ColumnData {
    /// Create a new column.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

impl EntityBlock {
    /// Create an empty block for a path and entity type.
    pub fn new(path: impl Into<String>, entity: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entity: entity.into(),
            ids: vec![],
            columns: vec![],
        }
    }

    /// Number of rows in this block.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if this block is empty.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get the value at a specific row and column.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.column(column).and_then(|c| c.values.get(row))
    }

    /// Iterate over rows as (id, field_values) pairs.
    pub fn rows(&self) -> impl Iterator<Item = (&[u8; 16], Vec<(&str, &Value)>)> {
        self.ids.iter().enumerate().map(|(i, id)| {
            let fields: Vec<(&str, &Value)> = self
                .columns
                .iter()
                .map(|col| (col.name.as_str(), &col.values[i]))
                .collect();
            (id, fields)
        })
    }
}

/// A single edge connecting a parent entity to a related entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// ID of the parent entity.
    pub from_id: [u8; 16],
    /// ID of the related entity.
    pub to_id: [u8; 16],
}

impl Edge {
    /// Create a new edge.
    pub fn new(from_id: [u8; 16], to_id: [u8; 16]) -> Self {
        Self { from_id, to_id }
    }
}

/// Edges produced by one include path.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeBlock {
    /// Include path these edges belong to.
    pub path: String,
    /// Edges in this block.
    pub edges: Vec<Edge>,
}

impl EdgeBlock {
    /// Create an edge block with edges.
    pub fn with_edges(path: impl Into<String>, edges: Vec<Edge>) -> Self {
        Self {
            path: path.into(),
            edges,
        }
    }

    /// Number of edges in this block.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check if this block is empty.
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Edges originating at the given parent.
    pub fn from<'a>(&'a self, parent_id: &'a [u8; 16]) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| &e.from_id == parent_id)
    }
}

/// Complete result of a graph query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultGraph {
    /// Entity blocks, one per include path plus the root.
    pub blocks: Vec<EntityBlock>,
    /// Edge blocks, one per include path.
    pub edges: Vec<EdgeBlock>,
}

impl ResultGraph {
    /// The root entity block.
    pub fn root_block(&self) -> Option<&EntityBlock> {
        self.block("")
    }

    /// Get an entity block by include path.
    pub fn block(&self, path: &str) -> Option<&EntityBlock> {
        self.blocks.iter().find(|b| b.path == path)
    }

    /// Get an edge block by include path.
    pub fn edge_block(&self, path: &str) -> Option<&EdgeBlock> {
        self.edges.iter().find(|b| b.path == path)
    }

    /// Total number of entities across all blocks.
    pub fn total_entities(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }
}
