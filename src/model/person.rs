use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Server-assigned person identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub i64);

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PersonId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Persisted person entity
///
/// `parents` behaves like an insertion-ordered set of ids of other persisted
/// persons: ids are unique and the order in which they were first linked is
/// kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub parents: Vec<PersonId>,
    /// Bumped by the store on every update, compared on write
    pub version: i64,
}

impl Person {
    pub fn parent_ids(&self) -> BTreeSet<PersonId> {
        self.parents.iter().copied().collect()
    }
}

/// Record handed to the store for a first insert; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPersonRecord {
    pub name: String,
    pub parents: Vec<PersonId>,
}

/// Externally visible shape of a person, relationships flattened to ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDto {
    pub id: PersonId,
    pub name: String,
    #[serde(default)]
    pub parent_ids: BTreeSet<PersonId>,
}

/// Person input model for creation
/// There is no id field: identity is always assigned server-side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ids: Option<BTreeSet<PersonId>>,
}

/// Person update model for PATCH operations
/// All fields are optional for partial updates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ids: Option<BTreeSet<PersonId>>,
}

/// Body of the parent relationship endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentIds {
    pub parent_ids: Vec<PersonId>,
}

impl ParentIds {
    pub fn into_set(self) -> BTreeSet<PersonId> {
        self.parent_ids.into_iter().collect()
    }
}
