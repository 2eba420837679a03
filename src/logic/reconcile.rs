//! Computes the desired state of a person from its current state and a
//! change request. Nothing here touches the store and inputs are never
//! mutated; referenced parent ids are not checked for existence.

use std::collections::BTreeSet;

use crate::model::{PersonDto, PersonId, PersonUpdate};

/// Apply a partial update
///
/// An absent name keeps the current one. A provided parent id set is merged
/// into the current parents (union), so this path only ever adds parents.
pub fn reconcile(current: &PersonDto, update: &PersonUpdate) -> PersonDto {
    let name = update
        .name
        .clone()
        .unwrap_or_else(|| current.name.clone());

    let parent_ids = match &update.parent_ids {
        Some(added) => current.parent_ids.union(added).copied().collect(),
        None => current.parent_ids.clone(),
    };

    PersonDto {
        id: current.id,
        name,
        parent_ids,
    }
}

/// Link additional parents, keeping the existing ones
pub fn add_parents(current: &PersonDto, parent_ids: &BTreeSet<PersonId>) -> PersonDto {
    reconcile(
        current,
        &PersonUpdate {
            name: None,
            parent_ids: Some(parent_ids.clone()),
        },
    )
}

/// Make `parent_ids` the exact parent set; the name is left unchanged
pub fn replace_parents(current: &PersonDto, parent_ids: BTreeSet<PersonId>) -> PersonDto {
    PersonDto {
        id: current.id,
        name: current.name.clone(),
        parent_ids,
    }
}
