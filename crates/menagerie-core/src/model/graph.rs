//! Typed view over query results.
//!
//! Query execution produces columnar blocks keyed by include path. This
//! module folds the blocks for the standard owner query (`pets`,
//! `pets.favorite_toy`, `pets.tolerates`, `pets.friends_with`) back into an
//! owner tree. Paths that were not included simply decode as absent.

use std::collections::HashMap;

use crate::error::Error;
use crate::query::{EntityBlock, ResultGraph};
use crate::value::Value;

use super::{KIND, KIND_CANINE, KIND_FELINE, NAME, OWNER, PET, PREFERS_BOXES, TOY};

/// An owner with their surviving pets.
#[derive(Debug, Clone, PartialEq)]
pub struct Owner {
    pub id: [u8; 16],
    pub name: String,
    pub pets: Vec<Pet>,
}

/// A pet, discriminated by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Pet {
    Feline(Feline),
    Canine(Canine),
}

impl Pet {
    /// The pet's ID.
    pub fn id(&self) -> [u8; 16] {
        match self {
            Pet::Feline(f) => f.id,
            Pet::Canine(c) => c.id,
        }
    }

    /// The pet's name.
    pub fn name(&self) -> &str {
        match self {
            Pet::Feline(f) => &f.name,
            Pet::Canine(c) => &c.name,
        }
    }
}

/// A feline pet.
#[derive(Debug, Clone, PartialEq)]
pub struct Feline {
    pub id: [u8; 16],
    pub name: String,
    pub prefers_boxes: bool,
    /// The canine this feline tolerates, if it survived filtering.
    pub tolerates: Option<PetRef>,
}

/// A canine pet.
#[derive(Debug, Clone, PartialEq)]
pub struct Canine {
    pub id: [u8; 16],
    pub name: String,
    /// The canine's toy, if it survived filtering.
    pub favorite_toy: Option<Toy>,
    /// The feline that tolerates this canine, if it survived filtering.
    pub friends_with: Option<PetRef>,
}

/// A toy.
#[derive(Debug, Clone, PartialEq)]
pub struct Toy {
    pub id: [u8; 16],
    pub name: String,
}

/// A lightweight reference to another pet.
///
/// Pet-to-pet links decode as references rather than nested pets, keeping
/// the decoded tree finite.
#[derive(Debug, Clone, PartialEq)]
pub struct PetRef {
    pub id: [u8; 16],
    pub name: String,
}

/// Decode an owner query result into typed owners.
pub fn decode_owners(graph: &ResultGraph) -> Result<Vec<Owner>, Error> {
    let root = graph.root_block().ok_or_else(|| Error::MalformedRow {
        entity: OWNER.to_string(),
        reason: "result graph has no root block".to_string(),
    })?;

    let pets = BlockIndex::for_path(graph, "pets");
    let toys = BlockIndex::for_path(graph, "pets.favorite_toy");
    let tolerated = BlockIndex::for_path(graph, "pets.tolerates");
    let friends = BlockIndex::for_path(graph, "pets.friends_with");

    let mut owners = Vec::with_capacity(root.len());
    for (i, owner_id) in root.ids.iter().enumerate() {
        let name = string_field(root, i, NAME, OWNER)?;

        let mut decoded_pets = Vec::new();
        for (block, idx) in pets.children_of(owner_id) {
            let pet_id = block.ids[idx];
            decoded_pets.push(decode_pet(block, idx, pet_id, &toys, &tolerated, &friends)?);
        }

        owners.push(Owner {
            id: *owner_id,
            name,
            pets: decoded_pets,
        });
    }

    Ok(owners)
}

fn decode_pet(
    block: &EntityBlock,
    idx: usize,
    pet_id: [u8; 16],
    toys: &BlockIndex<'_>,
    tolerated: &BlockIndex<'_>,
    friends: &BlockIndex<'_>,
) -> Result<Pet, Error> {
    let name = string_field(block, idx, NAME, PET)?;
    let kind = string_field(block, idx, KIND, PET)?;

    match kind.as_str() {
        KIND_FELINE => {
            let prefers_boxes = match block.get(idx, PREFERS_BOXES) {
                Some(Value::Bool(b)) => *b,
                _ => {
                    return Err(Error::MalformedRow {
                        entity: PET.to_string(),
                        reason: format!("feline '{name}' has no prefers_boxes"),
                    })
                }
            };
            let tolerates = tolerated.single_child_of(&pet_id, |b, i| pet_ref(b, i)).transpose()?;
            Ok(Pet::Feline(Feline {
                id: pet_id,
                name,
                prefers_boxes,
                tolerates,
            }))
        }
        KIND_CANINE => {
            let favorite_toy = toys
                .single_child_of(&pet_id, |b, i| {
                    Ok(Toy {
                        id: b.ids[i],
                        name: string_field(b, i, NAME, TOY)?,
                    })
                })
                .transpose()?;
            let friends_with = friends.single_child_of(&pet_id, |b, i| pet_ref(b, i)).transpose()?;
            Ok(Pet::Canine(Canine {
                id: pet_id,
                name,
                favorite_toy,
                friends_with,
            }))
        }
        other => Err(Error::MalformedRow {
            entity: PET.to_string(),
            reason: format!("unknown kind '{other}'"),
        }),
    }
}

fn pet_ref(block: &EntityBlock, idx: usize) -> Result<PetRef, Error> {
    Ok(PetRef {
        id: block.ids[idx],
        name: string_field(block, idx, NAME, PET)?,
    })
}

fn string_field(block: &EntityBlock, idx: usize, field: &str, entity: &str) -> Result<String, Error> {
    match block.get(idx, field) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(Error::MalformedRow {
            entity: entity.to_string(),
            reason: format!("missing string field '{field}'"),
        }),
    }
}

/// One include path's block, its edges, and an id-to-row index.
///
/// A path that was not included decodes as empty: every lookup returns
/// nothing.
struct BlockIndex<'a> {
    block: Option<&'a EntityBlock>,
    edges: Vec<([u8; 16], [u8; 16])>,
    by_id: HashMap<[u8; 16], usize>,
}

impl<'a> BlockIndex<'a> {
    fn for_path(graph: &'a ResultGraph, path: &str) -> Self {
        let block = graph.block(path);
        let edges = graph
            .edge_block(path)
            .map(|eb| eb.edges.iter().map(|e| (e.from_id, e.to_id)).collect())
            .unwrap_or_default();
        let by_id = block
            .map(|b| b.ids.iter().enumerate().map(|(i, id)| (*id, i)).collect())
            .unwrap_or_default();
        Self { block, edges, by_id }
    }

    /// Rows linked to the given parent, in edge order.
    fn children_of(&self, parent_id: &[u8; 16]) -> impl Iterator<Item = (&'a EntityBlock, usize)> + '_ {
        let parent_id = *parent_id;
        self.edges.iter().filter_map(move |(from, to)| {
            if *from != parent_id {
                return None;
            }
            let block = self.block?;
            let idx = *self.by_id.get(to)?;
            Some((block, idx))
        })
    }

    /// The single row linked to the given parent, decoded with `f`.
    fn single_child_of<T>(
        &self,
        parent_id: &[u8; 16],
        f: impl FnOnce(&'a EntityBlock, usize) -> Result<T, Error>,
    ) -> Option<Result<T, Error>> {
        let (block, idx) = self.children_of(parent_id).next()?;
        Some(f(block, idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ColumnData, Edge, EdgeBlock};

    fn block(path: &str, entity: &str, rows: Vec<([u8; 16], Vec<(&str, Value)>)>) -> EntityBlock {
        let ids: Vec<[u8; 16]> = rows.iter().map(|(id, _)| *id).collect();
        let mut columns: Vec<ColumnData> = Vec::new();
        if let Some((_, first)) = rows.first() {
            for (name, _) in first {
                let values = rows
                    .iter()
                    .map(|(_, fields)| {
                        fields
                            .iter()
                            .find(|(n, _)| n == name)
                            .map(|(_, v)| v.clone())
                            .unwrap_or(Value::Null)
                    })
                    .collect();
                columns.push(ColumnData::new(name.to_string(), values));
            }
        }
        EntityBlock {
            path: path.to_string(),
            entity: entity.to_string(),
            ids,
            columns,
        }
    }

    #[test]
    fn test_decode_full_tree() {
        let janice = [1u8; 16];
        let sammy = [2u8; 16];
        let dominic = [3u8; 16];
        let hati = [4u8; 16];
        let duck = [5u8; 16];

        let graph = ResultGraph {
            blocks: vec![
                block(
                    "",
                    "Owner",
                    vec![
                        (janice, vec![("name", "Janice".into())]),
                        (dominic, vec![("name", "Dominic".into())]),
                    ],
                ),
                block(
                    "pets",
                    "Pet",
                    vec![
                        (
                            sammy,
                            vec![
                                ("name", "Sammy".into()),
                                ("kind", "feline".into()),
                                ("prefers_boxes", true.into()),
                            ],
                        ),
                        (
                            hati,
                            vec![
                                ("name", "Hati".into()),
                                ("kind", "canine".into()),
                                ("prefers_boxes", Value::Null),
                            ],
                        ),
                    ],
                ),
                block(
                    "pets.favorite_toy",
                    "Toy",
                    vec![(duck, vec![("name", "Squeeky duck".into())])],
                ),
            ],
            edges: vec![
                EdgeBlock::with_edges(
                    "pets",
                    vec![Edge::new(janice, sammy), Edge::new(dominic, hati)],
                ),
                EdgeBlock::with_edges("pets.favorite_toy", vec![Edge::new(hati, duck)]),
            ],
        };

        let owners = decode_owners(&graph).unwrap();
        assert_eq!(owners.len(), 2);

        assert_eq!(owners[0].name, "Janice");
        assert_eq!(owners[0].pets.len(), 1);
        match &owners[0].pets[0] {
            Pet::Feline(f) => {
                assert_eq!(f.name, "Sammy");
                assert!(f.prefers_boxes);
                assert!(f.tolerates.is_none()); // Path not included.
            }
            other => panic!("expected a feline, got {other:?}"),
        }

        match &owners[1].pets[0] {
            Pet::Canine(c) => {
                assert_eq!(c.name, "Hati");
                assert_eq!(c.favorite_toy.as_ref().map(|t| t.name.as_str()), Some("Squeeky duck"));
                assert!(c.friends_with.is_none());
            }
            other => panic!("expected a canine, got {other:?}"),
        }
    }

    #[test]
    fn test_owner_without_pets_decodes_empty() {
        let paul = [9u8; 16];
        let graph = ResultGraph {
            blocks: vec![block("", "Owner", vec![(paul, vec![("name", "Paul".into())])])],
            edges: vec![],
        };

        let owners = decode_owners(&graph).unwrap();
        assert_eq!(owners.len(), 1);
        assert!(owners[0].pets.is_empty());
    }

    #[test]
    fn test_unknown_kind_is_malformed() {
        let owner = [1u8; 16];
        let pet = [2u8; 16];
        let graph = ResultGraph {
            blocks: vec![
                block("", "Owner", vec![(owner, vec![("name", "Janice".into())])]),
                block(
                    "pets",
                    "Pet",
                    vec![(pet, vec![("name", "Rex".into()), ("kind", "reptile".into())])],
                ),
            ],
            edges: vec![EdgeBlock::with_edges("pets", vec![Edge::new(owner, pet)])],
        };

        let err = decode_owners(&graph).unwrap_err();
        assert!(matches!(err, Error::MalformedRow { .. }));
    }
}
