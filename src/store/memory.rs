use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};

use crate::model::{Direction, NewPersonRecord, Page, PageRequest, Person, PersonId, SortProperty};
use crate::store::traits::{PersonStore, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct StoredPerson {
    name: String,
    parent_ids: Vec<PersonId>,
    version: i64,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    rows: BTreeMap<PersonId, StoredPerson>,
}

impl MemoryState {
    /// Materialize a row, keeping only parent ids that still resolve
    fn load(&self, id: PersonId, row: &StoredPerson) -> Person {
        let parents = row
            .parent_ids
            .iter()
            .copied()
            .filter(|parent_id| self.rows.contains_key(parent_id))
            .collect();

        Person {
            id,
            name: row.name.clone(),
            parents,
            version: row.version,
        }
    }
}

/// In-process person store
///
/// Used by tests and by the `memory` backend when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parent_ids_of(parents: &[PersonId]) -> Vec<PersonId> {
    let mut seen = BTreeSet::new();
    parents
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

#[async_trait::async_trait]
impl PersonStore for MemoryStore {
    async fn find_by_id(&self, id: PersonId) -> StoreResult<Option<Person>> {
        let state = self.state.read();
        Ok(state.rows.get(&id).map(|row| state.load(id, row)))
    }

    async fn find_all_by_id(&self, ids: &BTreeSet<PersonId>) -> StoreResult<Vec<Person>> {
        let state = self.state.read();
        Ok(ids
            .iter()
            .filter_map(|id| state.rows.get(id).map(|row| state.load(*id, row)))
            .collect())
    }

    async fn find_all(&self, request: &PageRequest) -> StoreResult<Page<Person>> {
        let state = self.state.read();
        let mut people: Vec<Person> = state
            .rows
            .iter()
            .map(|(id, row)| state.load(*id, row))
            .collect();

        // Rows are already in id order and the sort is stable, so ties stay by id
        if let Some(order) = request.sort.order() {
            people.sort_by(|a, b| {
                let ordering = match order.property {
                    SortProperty::Id => a.id.cmp(&b.id),
                    SortProperty::Name => a.name.cmp(&b.name),
                };
                match order.direction {
                    Direction::Asc => ordering,
                    Direction::Desc => ordering.reverse(),
                }
            });
        }

        let total = people.len() as u64;
        let content = people
            .into_iter()
            .skip(usize::try_from(request.offset()).unwrap_or(usize::MAX))
            .take(request.size as usize)
            .collect();

        Ok(Page::new(content, request, total))
    }

    async fn insert(&self, person: NewPersonRecord) -> StoreResult<Person> {
        let mut state = self.state.write();
        state.next_id += 1;
        let id = PersonId(state.next_id);

        let row = StoredPerson {
            name: person.name,
            parent_ids: parent_ids_of(&person.parents),
            version: 0,
        };
        state.rows.insert(id, row.clone());

        Ok(state.load(id, &row))
    }

    async fn update(&self, person: Person) -> StoreResult<Person> {
        let mut state = self.state.write();
        let Some(existing) = state.rows.get(&person.id) else {
            return Err(StoreError::NotFound { id: person.id });
        };

        if existing.version != person.version {
            return Err(StoreError::VersionConflict {
                id: person.id,
                expected: person.version,
                actual: existing.version,
            });
        }

        let row = StoredPerson {
            name: person.name,
            parent_ids: parent_ids_of(&person.parents),
            version: person.version + 1,
        };
        state.rows.insert(person.id, row.clone());

        Ok(state.load(person.id, &row))
    }
}
