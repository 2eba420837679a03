use crate::model::{NewPersonRecord, Page, PageRequest, Person, PersonId};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("person not found: {id}")]
    NotFound { id: PersonId },

    #[error("person {id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        id: PersonId,
        expected: i64,
        actual: i64,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistent collection of person records
#[async_trait::async_trait]
pub trait PersonStore: Send + Sync {
    /// Point lookup by id
    async fn find_by_id(&self, id: PersonId) -> StoreResult<Option<Person>>;

    /// Batch lookup; ids without a matching record are silently omitted
    async fn find_all_by_id(&self, ids: &BTreeSet<PersonId>) -> StoreResult<Vec<Person>>;

    /// Paginated full scan
    async fn find_all(&self, request: &PageRequest) -> StoreResult<Page<Person>>;

    /// Persist a new person, assigning its id
    async fn insert(&self, person: NewPersonRecord) -> StoreResult<Person>;

    /// Overwrite an existing person
    ///
    /// Fails with `VersionConflict` when `person.version` no longer matches
    /// the stored version. The returned person carries the bumped version.
    async fn update(&self, person: Person) -> StoreResult<Person>;
}
