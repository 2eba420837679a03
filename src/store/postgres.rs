use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::collections::{BTreeSet, HashMap};

use crate::model::{NewPersonRecord, Page, PageRequest, Person, PersonId};
use crate::store::traits::{PersonStore, StoreError, StoreResult};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS person (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL,
        version BIGINT NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS person_parents (
        person_id BIGINT NOT NULL REFERENCES person(id),
        parent_id BIGINT NOT NULL REFERENCES person(id),
        position INTEGER NOT NULL,
        PRIMARY KEY (person_id, parent_id)
    )
    "#,
];

const MIGRATION_LOCK_KEY: i64 = 0x7065_7273_6f6e;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create the person tables if they do not exist yet
    ///
    /// Runs under a transaction-scoped advisory lock so concurrent callers
    /// do not race on the catalog.
    pub async fn migrate(&self) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(MIGRATION_LOCK_KEY)
            .execute(&mut *tx)
            .await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        log::info!("person schema is up to date");
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Load the parent ids of the given persons in link order, keyed by child id
    async fn load_parents(&self, ids: &[i64]) -> StoreResult<HashMap<PersonId, Vec<PersonId>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT person_id, parent_id
            FROM person_parents
            WHERE person_id = ANY($1)
            ORDER BY person_id, position
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut parents: HashMap<PersonId, Vec<PersonId>> = HashMap::new();
        for row in rows {
            let child = PersonId(row.get("person_id"));
            parents
                .entry(child)
                .or_default()
                .push(PersonId(row.get("parent_id")));
        }

        Ok(parents)
    }

    /// Turn `person` rows into entities, preserving row order
    async fn hydrate(&self, rows: Vec<sqlx::postgres::PgRow>) -> StoreResult<Vec<Person>> {
        let ids: Vec<i64> = rows.iter().map(|row| row.get::<i64, _>("id")).collect();
        let mut parents = self.load_parents(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = PersonId(row.get("id"));
                Person {
                    id,
                    name: row.get("name"),
                    parents: parents.remove(&id).unwrap_or_default(),
                    version: row.get("version"),
                }
            })
            .collect())
    }

    async fn write_parents(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        person_id: PersonId,
        parents: &[PersonId],
    ) -> StoreResult<Vec<PersonId>> {
        let mut seen = BTreeSet::new();
        let mut written = Vec::new();

        for parent in parents {
            if !seen.insert(*parent) {
                continue;
            }

            sqlx::query(
                "INSERT INTO person_parents (person_id, parent_id, position) VALUES ($1, $2, $3)",
            )
            .bind(person_id.0)
            .bind(parent.0)
            .bind(written.len() as i32)
            .execute(&mut **tx)
            .await?;

            written.push(*parent);
        }

        Ok(written)
    }
}

fn order_by_clause(request: &PageRequest) -> String {
    match request.sort.order() {
        None => "ORDER BY id".to_string(),
        // id as final tie-breaker keeps pages stable
        Some(order) => format!(
            "ORDER BY {} {}, id",
            order.property.column(),
            order.direction.keyword()
        ),
    }
}

#[async_trait::async_trait]
impl PersonStore for PostgresStore {
    async fn find_by_id(&self, id: PersonId) -> StoreResult<Option<Person>> {
        let row = sqlx::query("SELECT id, name, version FROM person WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(self.hydrate(vec![row]).await?.pop())
    }

    async fn find_all_by_id(&self, ids: &BTreeSet<PersonId>) -> StoreResult<Vec<Person>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = ids.iter().map(|id| id.0).collect();
        let rows =
            sqlx::query("SELECT id, name, version FROM person WHERE id = ANY($1) ORDER BY id")
                .bind(&ids)
                .fetch_all(&self.pool)
                .await?;

        self.hydrate(rows).await
    }

    async fn find_all(&self, request: &PageRequest) -> StoreResult<Page<Person>> {
        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM person")
            .fetch_one(&self.pool)
            .await?
            .get("total");

        let sql = format!(
            "SELECT id, name, version FROM person {} LIMIT $1 OFFSET $2",
            order_by_clause(request)
        );
        let rows = sqlx::query(&sql)
            .bind(i64::from(request.size))
            .bind(i64::try_from(request.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        let people = self.hydrate(rows).await?;
        Ok(Page::new(people, request, total.max(0) as u64))
    }

    async fn insert(&self, person: NewPersonRecord) -> StoreResult<Person> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("INSERT INTO person (name) VALUES ($1) RETURNING id, version")
            .bind(&person.name)
            .fetch_one(&mut *tx)
            .await?;
        let id = PersonId(row.get("id"));

        let parents = Self::write_parents(&mut tx, id, &person.parents).await?;
        tx.commit().await?;

        Ok(Person {
            id,
            name: person.name,
            parents,
            version: row.get("version"),
        })
    }

    async fn update(&self, person: Person) -> StoreResult<Person> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE person SET name = $2, version = version + 1
            WHERE id = $1 AND version = $3
            RETURNING version
            "#,
        )
        .bind(person.id.0)
        .bind(&person.name)
        .bind(person.version)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(updated) = updated else {
            let current = sqlx::query("SELECT version FROM person WHERE id = $1")
                .bind(person.id.0)
                .fetch_optional(&mut *tx)
                .await?;

            return Err(match current {
                Some(row) => StoreError::VersionConflict {
                    id: person.id,
                    expected: person.version,
                    actual: row.get("version"),
                },
                None => StoreError::NotFound { id: person.id },
            });
        };

        sqlx::query("DELETE FROM person_parents WHERE person_id = $1")
            .bind(person.id.0)
            .execute(&mut *tx)
            .await?;
        let parents = Self::write_parents(&mut tx, person.id, &person.parents).await?;
        tx.commit().await?;

        Ok(Person {
            id: person.id,
            name: person.name,
            parents,
            version: updated.get("version"),
        })
    }
}
