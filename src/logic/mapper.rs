use std::collections::BTreeSet;

use crate::model::{NewPersonRecord, Person, PersonDto, PersonId};

/// Flatten a person into its representation, parents reduced to ids
pub fn to_representation(person: &Person) -> PersonDto {
    PersonDto {
        id: person.id,
        name: person.name.clone(),
        parent_ids: person.parent_ids(),
    }
}

/// Rebuild an entity from a representation
///
/// `resolved_parents` is the store's answer to a batch lookup of
/// `representation.parent_ids`. Ids the store did not return are simply not
/// linked; the version is the one the caller read the entity at.
pub fn to_entity(representation: &PersonDto, resolved_parents: &[Person], version: i64) -> Person {
    Person {
        id: representation.id,
        name: representation.name.clone(),
        parents: resolve_parents(resolved_parents),
        version,
    }
}

/// Build the insert record for a person that has no id yet
pub fn to_new_record(name: String, resolved_parents: &[Person]) -> NewPersonRecord {
    NewPersonRecord {
        name,
        parents: resolve_parents(resolved_parents),
    }
}

/// Store order, first occurrence of each id wins
fn resolve_parents(resolved: &[Person]) -> Vec<PersonId> {
    let mut seen: BTreeSet<PersonId> = BTreeSet::new();
    resolved
        .iter()
        .map(|parent| parent.id)
        .filter(|id| seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent(id: i64, name: &str) -> Person {
        Person {
            id: PersonId(id),
            name: name.to_string(),
            parents: Vec::new(),
            version: 0,
        }
    }

    fn person_with_parents() -> (Person, Vec<Person>) {
        let parents = vec![parent(1, "TestParent1"), parent(2, "TestParent2")];
        let person = Person {
            id: PersonId(3),
            name: "testperson".to_string(),
            parents: parents.iter().map(|parent| parent.id).collect(),
            version: 4,
        };
        (person, parents)
    }

    #[test]
    fn test_representation_flattens_parents() {
        let (person, _) = person_with_parents();
        let dto = to_representation(&person);

        assert_eq!(dto.id, PersonId(3));
        assert_eq!(dto.name, "testperson");
        assert_eq!(dto.parent_ids, BTreeSet::from([PersonId(1), PersonId(2)]));
    }

    #[test]
    fn test_entity_round_trip() {
        let (person, parents) = person_with_parents();
        let rebuilt = to_entity(&to_representation(&person), &parents, person.version);
        assert_eq!(rebuilt, person);
    }

    #[test]
    fn test_unresolved_parents_are_omitted() {
        let dto = PersonDto {
            id: PersonId(5),
            name: "child".to_string(),
            parent_ids: BTreeSet::from([PersonId(1), PersonId(2)]),
        };

        // the store only knew about id 1
        let entity = to_entity(&dto, &[parent(1, "TestParent1")], 0);
        assert_eq!(entity.parent_ids(), BTreeSet::from([PersonId(1)]));
    }

    #[test]
    fn test_new_record_collapses_duplicate_parents() {
        let resolved = vec![parent(2, "b"), parent(1, "a"), parent(2, "b")];
        let record = to_new_record("child".to_string(), &resolved);

        assert_eq!(record.parents, vec![PersonId(2), PersonId(1)]);
    }
}
