//! Filter expressions and their evaluation.
//!
//! A `FilterExpr` is a predicate over a single entity row. Expressions are
//! plain data so they can be stored in the registry and attached to query
//! plans. Evaluation happens row by row during scans and joins.
//!
//! Two forms reach beyond the row itself:
//! - `Related { relation }` holds when at least one related row exists. When
//!   the relation's target type carries its own filter, only rows surviving
//!   that filter count. The executor precomputes survivor sets as
//!   [`RelatedProbes`] before evaluation.
//! - A dotted field name like `"owner.name"` reads a field through a to-one
//!   relation. The executor resolves the navigation and augments the row with
//!   the dotted field before evaluation, so the evaluator treats it as an
//!   ordinary field.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::value::{row_get, Row, Value};

/// A predicate over one entity row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterExpr {
    /// Field equals value.
    Eq { field: String, value: Value },
    /// Field does not equal value.
    Ne { field: String, value: Value },
    /// Field is less than value.
    Lt { field: String, value: Value },
    /// Field is less than or equal to value.
    Le { field: String, value: Value },
    /// Field is greater than value.
    Gt { field: String, value: Value },
    /// Field is greater than or equal to value.
    Ge { field: String, value: Value },
    /// Field is one of the values.
    In { field: String, values: Vec<Value> },
    /// Field is none of the values.
    NotIn { field: String, values: Vec<Value> },
    /// Field is null or absent.
    IsNull { field: String },
    /// Field is present and not null.
    IsNotNull { field: String },
    /// String field matches a SQL LIKE pattern.
    Like { field: String, pattern: String },
    /// String field does not match a SQL LIKE pattern.
    NotLike { field: String, pattern: String },
    /// String field is strictly longer than `len` characters.
    LongerThan { field: String, len: usize },
    /// At least one related row exists through the named relation.
    Related { relation: String },
    /// All sub-expressions hold.
    And(Vec<FilterExpr>),
    /// At least one sub-expression holds.
    Or(Vec<FilterExpr>),
}

impl FilterExpr {
    /// Field equals value.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Field does not equal value.
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Ne {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Field is greater than value.
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        FilterExpr::Gt {
            field: field.into(),
            value: value.into(),
        }
    }

    /// String field matches a LIKE pattern.
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        FilterExpr::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// String field does not match a LIKE pattern.
    pub fn not_like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        FilterExpr::NotLike {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// String field is strictly longer than `len` characters.
    pub fn longer_than(field: impl Into<String>, len: usize) -> Self {
        FilterExpr::LongerThan {
            field: field.into(),
            len,
        }
    }

    /// At least one related row exists through the named relation.
    pub fn related(relation: impl Into<String>) -> Self {
        FilterExpr::Related {
            relation: relation.into(),
        }
    }

    /// All sub-expressions hold.
    pub fn and(exprs: Vec<FilterExpr>) -> Self {
        FilterExpr::And(exprs)
    }

    /// At least one sub-expression holds.
    pub fn or(exprs: Vec<FilterExpr>) -> Self {
        FilterExpr::Or(exprs)
    }

    /// All field names referenced anywhere in the expression, dotted names
    /// included.
    pub fn referenced_fields(&self) -> HashSet<String> {
        let mut fields = HashSet::new();
        self.collect_fields(&mut fields);
        fields
    }

    fn collect_fields(&self, fields: &mut HashSet<String>) {
        match self {
            FilterExpr::Eq { field, .. }
            | FilterExpr::Ne { field, .. }
            | FilterExpr::Lt { field, .. }
            | FilterExpr::Le { field, .. }
            | FilterExpr::Gt { field, .. }
            | FilterExpr::Ge { field, .. }
            | FilterExpr::In { field, .. }
            | FilterExpr::NotIn { field, .. }
            | FilterExpr::IsNull { field }
            | FilterExpr::IsNotNull { field }
            | FilterExpr::Like { field, .. }
            | FilterExpr::NotLike { field, .. }
            | FilterExpr::LongerThan { field, .. } => {
                fields.insert(field.clone());
            }
            FilterExpr::Related { .. } => {}
            FilterExpr::And(exprs) | FilterExpr::Or(exprs) => {
                for e in exprs {
                    e.collect_fields(fields);
                }
            }
        }
    }

    /// All relation names referenced by `Related` probes in the expression.
    pub fn referenced_relations(&self) -> HashSet<String> {
        let mut relations = HashSet::new();
        self.collect_relations(&mut relations);
        relations
    }

    fn collect_relations(&self, relations: &mut HashSet<String>) {
        match self {
            FilterExpr::Related { relation } => {
                relations.insert(relation.clone());
            }
            FilterExpr::And(exprs) | FilterExpr::Or(exprs) => {
                for e in exprs {
                    e.collect_relations(relations);
                }
            }
            _ => {}
        }
    }

    /// Dotted field references split into `(relation, field)` pairs.
    ///
    /// A field name containing a dot navigates one hop through a to-one
    /// relation. Only a single hop is supported.
    pub fn navigation_field_refs(&self) -> Vec<(String, String)> {
        self.referenced_fields()
            .into_iter()
            .filter_map(|name| {
                name.split_once('.')
                    .map(|(rel, field)| (rel.to_string(), field.to_string()))
            })
            .collect()
    }
}

/// AND two optional filters together.
pub fn combine_filters(a: Option<FilterExpr>, b: Option<FilterExpr>) -> Option<FilterExpr> {
    match (a, b) {
        (Some(a), Some(b)) => Some(FilterExpr::And(vec![a, b])),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Precomputed survivor set for one `Related` probe.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    /// Join field on the probed entity's side.
    pub parent_field: String,
    /// Join-key values of related rows that survive the target's filter.
    pub survivors: HashSet<[u8; 16]>,
}

/// Survivor sets for the `Related` probes of one entity's filter.
///
/// Built by the executor before rows are evaluated: for each probed relation
/// it scans the target type under the target's own effective filter and
/// collects the join-key values of surviving rows.
#[derive(Debug, Clone)]
pub struct RelatedProbes {
    /// Entity the probes belong to.
    pub entity: String,
    probes: HashMap<String, Probe>,
}

impl RelatedProbes {
    /// Empty probe set for the given entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            probes: HashMap::new(),
        }
    }

    /// Record the survivor set for a relation.
    pub fn insert(
        &mut self,
        relation: impl Into<String>,
        parent_field: impl Into<String>,
        survivors: HashSet<[u8; 16]>,
    ) {
        self.probes.insert(
            relation.into(),
            Probe {
                parent_field: parent_field.into(),
                survivors,
            },
        );
    }

    fn get(&self, relation: &str) -> Option<&Probe> {
        self.probes.get(relation)
    }
}

/// Evaluates filter expressions against entity rows.
pub struct FilterEvaluator;

impl FilterEvaluator {
    /// Evaluate a filter against a row.
    ///
    /// `probes` must contain a survivor set for every `Related` probe in the
    /// filter; a missing probe is a programming error in the caller and is
    /// reported as an unknown relation.
    pub fn evaluate(filter: &FilterExpr, row: &Row, probes: &RelatedProbes) -> Result<bool, Error> {
        match filter {
            FilterExpr::Eq { field, value } => {
                Self::compare_field(row, field, value, Self::values_equal)
            }
            FilterExpr::Ne { field, value } => {
                Self::compare_field(row, field, value, |a, b| !Self::values_equal(a, b))
            }
            FilterExpr::Lt { field, value } => Self::compare_field(row, field, value, |a, b| {
                Self::compare_values(a, b).map(|ord| ord.is_lt()).unwrap_or(false)
            }),
            FilterExpr::Le { field, value } => Self::compare_field(row, field, value, |a, b| {
                Self::compare_values(a, b).map(|ord| ord.is_le()).unwrap_or(false)
            }),
            FilterExpr::Gt { field, value } => Self::compare_field(row, field, value, |a, b| {
                Self::compare_values(a, b).map(|ord| ord.is_gt()).unwrap_or(false)
            }),
            FilterExpr::Ge { field, value } => Self::compare_field(row, field, value, |a, b| {
                Self::compare_values(a, b).map(|ord| ord.is_ge()).unwrap_or(false)
            }),
            FilterExpr::In { field, values } => match row_get(row, field) {
                Some(fv) => Ok(values.iter().any(|v| Self::values_equal(fv, v))),
                None => Ok(false),
            },
            FilterExpr::NotIn { field, values } => match row_get(row, field) {
                Some(fv) => Ok(!values.iter().any(|v| Self::values_equal(fv, v))),
                None => Ok(true), // NULL is not in any set
            },
            FilterExpr::IsNull { field } => {
                Ok(matches!(row_get(row, field), None | Some(Value::Null)))
            }
            FilterExpr::IsNotNull { field } => {
                Ok(!matches!(row_get(row, field), None | Some(Value::Null)))
            }
            FilterExpr::Like { field, pattern } => match row_get(row, field) {
                Some(Value::String(s)) => Ok(Self::like_match(s, pattern)),
                _ => Ok(false),
            },
            FilterExpr::NotLike { field, pattern } => match row_get(row, field) {
                Some(Value::String(s)) => Ok(!Self::like_match(s, pattern)),
                _ => Ok(true),
            },
            FilterExpr::LongerThan { field, len } => match row_get(row, field) {
                Some(Value::String(s)) => Ok(s.chars().count() > *len),
                _ => Ok(false),
            },
            FilterExpr::Related { relation } => {
                let probe = probes.get(relation).ok_or_else(|| Error::UnknownRelation {
                    entity: probes.entity.clone(),
                    relation: relation.clone(),
                })?;
                match row_get(row, &probe.parent_field) {
                    Some(Value::Uuid(id)) => Ok(probe.survivors.contains(id)),
                    _ => Ok(false),
                }
            }
            FilterExpr::And(exprs) => {
                for e in exprs {
                    if !Self::evaluate(e, row, probes)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            FilterExpr::Or(exprs) => {
                for e in exprs {
                    if Self::evaluate(e, row, probes)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }

    fn compare_field<F>(row: &Row, field: &str, value: &Value, comparator: F) -> Result<bool, Error>
    where
        F: FnOnce(&Value, &Value) -> bool,
    {
        match row_get(row, field) {
            Some(fv) => Ok(comparator(fv, value)),
            None => Ok(false), // Missing field doesn't match
        }
    }

    fn values_equal(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Uuid(a), Value::Uuid(b)) => a == b,
            _ => false,
        }
    }

    fn compare_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
        match (a, b) {
            (Value::Int64(a), Value::Int64(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            _ => None, // Incompatible types
        }
    }

    /// Match a string against a SQL LIKE pattern.
    ///
    /// Supports:
    /// - `%` matches zero or more characters
    /// - `_` matches exactly one character
    /// - `\\%` matches literal `%`
    /// - `\\_` matches literal `_`
    pub fn like_match(value: &str, pattern: &str) -> bool {
        let mut chars = value.chars().peekable();
        let mut pattern_chars = pattern.chars().peekable();

        Self::like_match_recursive(&mut chars, &mut pattern_chars)
    }

    fn like_match_recursive(
        chars: &mut std::iter::Peekable<std::str::Chars>,
        pattern: &mut std::iter::Peekable<std::str::Chars>,
    ) -> bool {
        loop {
            match (pattern.peek().copied(), chars.peek().copied()) {
                // End of both
                (None, None) => return true,
                // End of pattern but not value
                (None, Some(_)) => return false,
                // Percent matches zero or more characters
                (Some('%'), _) => {
                    pattern.next(); // consume %

                    // If % is at end of pattern, match rest of string
                    if pattern.peek().is_none() {
                        return true;
                    }

                    // Try matching % with 0, 1, 2, ... characters
                    loop {
                        // Clone iterators for backtracking
                        let mut pattern_clone = pattern.clone();
                        let mut chars_clone = chars.clone();

                        if Self::like_match_recursive(&mut chars_clone, &mut pattern_clone) {
                            return true;
                        }

                        // Consume one more character from value
                        if chars.next().is_none() {
                            return false;
                        }
                    }
                }
                // Underscore matches exactly one character
                (Some('_'), Some(_)) => {
                    pattern.next();
                    chars.next();
                }
                // Underscore but no character left
                (Some('_'), None) => return false,
                // Escape sequence
                (Some('\\'), _) => {
                    pattern.next(); // consume backslash
                    match (pattern.peek().copied(), chars.peek().copied()) {
                        (Some(p), Some(c)) if p == c => {
                            pattern.next();
                            chars.next();
                        }
                        _ => return false,
                    }
                }
                // Regular character match
                (Some(p), Some(c)) => {
                    if p == c {
                        pattern.next();
                        chars.next();
                    } else {
                        return false;
                    }
                }
                // Pattern character but no value character
                (Some(_), None) => return false,
            }
        }
    }
}
