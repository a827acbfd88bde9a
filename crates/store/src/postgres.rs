//! Postgres-backed collections.
//!
//! All collections share one table keyed by `(collection, id)` with the
//! document body stored as JSONB. Queries load the collection and evaluate the
//! [`Query`] in process; updates lock the row with `SELECT ... FOR UPDATE`
//! inside a transaction. Uniqueness-checked writes additionally take a
//! transaction-scoped advisory lock on the collection, and the users and
//! vehicles collections carry unique expression indexes as a backstop.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Any other | N/A | `Backend` |

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use firefleet_core::{Document, DomainError};

use crate::{Change, Collection, Mutator, Query, StoreError, StoreResult, UniqueKey};

const SCHEMA: [&str; 3] = [
    r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT        NOT NULL,
    id         UUID        NOT NULL,
    body       JSONB       NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (collection, id)
)
"#,
    r#"
CREATE UNIQUE INDEX IF NOT EXISTS documents_users_email_key
    ON documents (lower(body->>'email'))
    WHERE collection = 'users'
"#,
    r#"
CREATE UNIQUE INDEX IF NOT EXISTS documents_vehicles_plate_key
    ON documents (upper(regexp_replace(body->>'plate', '\s', '', 'g')))
    WHERE collection = 'vehicles'
"#,
];

/// Create the `documents` table and its unique indexes if missing.
pub async fn migrate(pool: &PgPool) -> StoreResult<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
    }
    Ok(())
}

/// One document collection inside the shared `documents` table.
pub struct PostgresCollection<D> {
    pool: PgPool,
    _marker: PhantomData<fn() -> D>,
}

impl<D> core::fmt::Debug for PostgresCollection<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostgresCollection").finish_non_exhaustive()
    }
}

impl<D: Document> PostgresCollection<D> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    async fn load_all(&self) -> StoreResult<Vec<D>> {
        let rows = sqlx::query("SELECT body FROM documents WHERE collection = $1")
            .bind(D::COLLECTION)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("load", e))?;

        rows.iter().map(decode::<D>).collect()
    }

    #[instrument(skip(self, mutate, key), fields(collection = D::COLLECTION, id = %id), err)]
    async fn apply_update(
        &self,
        id: D::Id,
        mutate: Mutator<D>,
        key: Option<UniqueKey<D>>,
    ) -> StoreResult<Option<Change<D>>> {
        let uuid: Uuid = id.into();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        if key.is_some() {
            lock_collection::<D>(&mut tx).await?;
        }

        let row = sqlx::query(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2 FOR UPDATE",
        )
        .bind(D::COLLECTION)
        .bind(uuid)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("select_for_update", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Ok(None);
        };

        let before = decode::<D>(&row)?;
        let mut after = before.clone();
        if let Err(e) = mutate(&mut after) {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::Rejected(e));
        }
        if after.id() != id {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::Rejected(DomainError::validation("id is immutable")));
        }
        if let Some(key) = key {
            let wanted = key(&after);
            let others = load_in::<D>(&mut tx).await?;
            if others.iter().any(|other| other.id() != id && key(other) == wanted) {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(duplicate::<D>(&wanted));
            }
        }

        sqlx::query("UPDATE documents SET body = $3 WHERE collection = $1 AND id = $2")
            .bind(D::COLLECTION)
            .bind(uuid)
            .bind(serde_json::to_value(&after)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(Some(Change { before, after }))
    }
}

#[async_trait]
impl<D: Document> Collection<D> for PostgresCollection<D> {
    #[instrument(skip(self, doc), fields(collection = D::COLLECTION), err)]
    async fn insert(&self, doc: D) -> StoreResult<D> {
        let id: Uuid = doc.id().into();
        let body = serde_json::to_value(&doc)?;
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(D::COLLECTION)
            .bind(id)
            .bind(body)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict(format!("{} {id} already exists", D::COLLECTION))
                } else {
                    map_sqlx_error("insert", e)
                }
            })?;
        Ok(doc)
    }

    #[instrument(skip(self, doc, key), fields(collection = D::COLLECTION), err)]
    async fn insert_unique(&self, doc: D, key: UniqueKey<D>) -> StoreResult<D> {
        let id: Uuid = doc.id().into();
        let wanted = key(&doc);
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        lock_collection::<D>(&mut tx).await?;

        let existing = load_in::<D>(&mut tx).await?;
        if existing.iter().any(|other| key(other) == wanted) {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(duplicate::<D>(&wanted));
        }

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(D::COLLECTION)
            .bind(id)
            .bind(serde_json::to_value(&doc)?)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(doc)
    }

    async fn get(&self, id: D::Id) -> StoreResult<Option<D>> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(D::COLLECTION)
            .bind(Into::<Uuid>::into(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref().map(decode::<D>).transpose()
    }

    async fn find(&self, query: &Query<D>) -> StoreResult<Vec<D>> {
        Ok(query.apply(self.load_all().await?))
    }

    async fn count(&self, query: &Query<D>) -> StoreResult<usize> {
        Ok(self.load_all().await?.iter().filter(|d| query.matches(d)).count())
    }

    async fn update(&self, id: D::Id, mutate: Mutator<D>) -> StoreResult<Option<Change<D>>> {
        self.apply_update(id, mutate, None).await
    }

    async fn update_unique(
        &self,
        id: D::Id,
        mutate: Mutator<D>,
        key: UniqueKey<D>,
    ) -> StoreResult<Option<Change<D>>> {
        self.apply_update(id, mutate, Some(key)).await
    }

    async fn delete(&self, id: D::Id) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(D::COLLECTION)
            .bind(Into::<Uuid>::into(id))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;
        debug!(collection = D::COLLECTION, %id, rows = result.rows_affected(), "delete");
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self) -> StoreResult<()> {
        sqlx::query("DELETE FROM documents WHERE collection = $1")
            .bind(D::COLLECTION)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("clear", e))?;
        Ok(())
    }
}

/// Serialize uniqueness-checked writes to one collection until commit.
async fn lock_collection<D: Document>(tx: &mut Transaction<'_, Postgres>) -> StoreResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(D::COLLECTION)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("lock_collection", e))?;
    Ok(())
}

async fn load_in<D: Document>(tx: &mut Transaction<'_, Postgres>) -> StoreResult<Vec<D>> {
    let rows = sqlx::query("SELECT body FROM documents WHERE collection = $1")
        .bind(D::COLLECTION)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("load", e))?;
    rows.iter().map(decode::<D>).collect()
}

fn duplicate<D: Document>(key: &str) -> StoreError {
    StoreError::Conflict(format!("{} '{key}' already exists", D::COLLECTION))
}

fn decode<D: Document>(row: &sqlx::postgres::PgRow) -> StoreResult<D> {
    let body: serde_json::Value = row
        .try_get("body")
        .map_err(|e| StoreError::Serialization(format!("failed to read document body: {e}")))?;
    Ok(serde_json::from_value(body)?)
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code() {
                Some(code) if code.as_ref() == "23505" => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        other => StoreError::Backend(format!("{} failed: {}", operation, other)),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
