use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;

/// Collection names the core reads and writes.
pub mod collections {
    pub const PROFILES: &str = "profiles";
    pub const STUDENTS: &str = "students";
    pub const FACULTY: &str = "faculty";
    pub const ATTENDANCE: &str = "attendance";
}

/// One predicate over a row field.
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    /// The field equals the value.
    Eq(String, Value),
    /// The field is a member of the value list.
    In(String, Vec<Value>),
}

/// A conjunction of predicates applied to a collection select.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conds: Vec<Cond>,
}

impl Filter {
    /// Creates an empty filter matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality predicate.
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conds.push(Cond::Eq(field.to_string(), value.into()));
        self
    }

    /// Adds a membership predicate.
    pub fn is_in(mut self, field: &str, values: Vec<Value>) -> Self {
        self.conds.push(Cond::In(field.to_string(), values));
        self
    }

    /// Whether `row` satisfies every predicate.
    pub fn matches(&self, row: &Value) -> bool {
        self.conds.iter().all(|cond| match cond {
            Cond::Eq(field, value) => row.get(field) == Some(value),
            Cond::In(field, values) => row
                .get(field)
                .is_some_and(|field_value| values.contains(field_value)),
        })
    }
}

/// The external persistence service, reachable as generic CRUD over named
/// collections. Every call returns an explicit `Result` the core checks at
/// the call site; no call is allowed to leave state half-applied in the UI.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Selects all rows in `collection` matching `filter`.
    async fn select(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>>;

    /// Inserts a row, returning the stored row (with its assigned id).
    async fn insert(&self, collection: &str, row: Value) -> Result<Value>;

    /// Patches fields on the row with the given id, returning the new row.
    async fn update(&self, collection: &str, id: &Uuid, patch: Value) -> Result<Value>;
}
