use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;

use crate::logic::mapper::{to_entity, to_new_record, to_representation};
use crate::logic::paginate::Paginator;
use crate::logic::reconcile::{add_parents, reconcile, replace_parents};
use crate::model::{NewPerson, Page, PageRequest, Person, PersonDto, PersonId, PersonUpdate};
use crate::store::{PersonStore, StoreError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("person {0} not found")]
    NotFound(PersonId),

    #[error("person {0} was modified by another request, retry the update")]
    Conflict(PersonId),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => ServiceError::NotFound(id),
            StoreError::VersionConflict { id, .. } => ServiceError::Conflict(id),
            other => ServiceError::Store(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Person operations exposed over the API
///
/// Every call reads fresh state from the store; nothing is cached between
/// requests.
pub struct PersonService<S> {
    store: Arc<S>,
    paginator: Paginator,
}

impl<S: PersonStore> PersonService<S> {
    pub fn new(store: Arc<S>, paginator: Paginator) -> Self {
        Self { store, paginator }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn get_all(&self, request: PageRequest) -> ServiceResult<Page<PersonDto>> {
        let effective = self.paginator.clamp(request);
        let page = self.store.find_all(&effective).await?;
        Ok(page.map(|person| to_representation(&person)))
    }

    pub async fn get_by_id(&self, id: PersonId) -> ServiceResult<Option<PersonDto>> {
        let person = self.store.find_by_id(id).await?;
        Ok(person.as_ref().map(to_representation))
    }

    pub async fn create(&self, new_person: NewPerson) -> ServiceResult<PersonDto> {
        validate_name(&new_person.name)?;

        let parents = match &new_person.parent_ids {
            Some(ids) => self.resolve_parents(ids).await?,
            None => Vec::new(),
        };

        let saved = self
            .store
            .insert(to_new_record(new_person.name, &parents))
            .await?;
        log::info!("created person {} with {} parents", saved.id, saved.parents.len());

        Ok(to_representation(&saved))
    }

    /// Partial update; provided parent ids are added to the existing ones
    pub async fn update(&self, id: PersonId, update: PersonUpdate) -> ServiceResult<PersonDto> {
        if let Some(name) = &update.name {
            validate_name(name)?;
        }
        self.modify(id, |current| reconcile(current, &update)).await
    }

    pub async fn add_parents(
        &self,
        id: PersonId,
        parent_ids: BTreeSet<PersonId>,
    ) -> ServiceResult<PersonDto> {
        self.modify(id, |current| add_parents(current, &parent_ids)).await
    }

    pub async fn replace_parents(
        &self,
        id: PersonId,
        parent_ids: BTreeSet<PersonId>,
    ) -> ServiceResult<PersonDto> {
        self.modify(id, move |current| replace_parents(current, parent_ids)).await
    }

    /// Read, compute the desired state and write it back
    ///
    /// The write carries the version that was read, so a concurrent change in
    /// between surfaces as `Conflict` instead of being overwritten.
    async fn modify<F>(&self, id: PersonId, desired_state: F) -> ServiceResult<PersonDto>
    where
        F: FnOnce(&PersonDto) -> PersonDto,
    {
        let current = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::NotFound(id))?;

        let desired = desired_state(&to_representation(&current));
        let parents = keep_link_order(&current, self.resolve_parents(&desired.parent_ids).await?);

        let saved = self
            .store
            .update(to_entity(&desired, &parents, current.version))
            .await?;
        log::debug!("updated person {} to version {}", saved.id, saved.version);

        Ok(to_representation(&saved))
    }

    /// Batch lookup of parent ids; unknown ids are dropped
    async fn resolve_parents(&self, ids: &BTreeSet<PersonId>) -> ServiceResult<Vec<Person>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let found = self.store.find_all_by_id(ids).await?;
        if found.len() < ids.len() {
            let known: BTreeSet<PersonId> = found.iter().map(|person| person.id).collect();
            let dropped: Vec<String> = ids
                .difference(&known)
                .map(|id| id.to_string())
                .collect();
            log::warn!("ignoring unknown parent ids: {}", dropped.join(", "));
        }

        Ok(found)
    }
}

fn validate_name(name: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::Validation("name must not be blank".to_string()));
    }
    Ok(())
}

/// Parents that were already linked keep their position, new ones follow
fn keep_link_order(current: &Person, mut resolved: Vec<Person>) -> Vec<Person> {
    resolved.sort_by_key(|parent| {
        current
            .parents
            .iter()
            .position(|existing| *existing == parent.id)
            .unwrap_or(usize::MAX)
    });
    resolved
}
