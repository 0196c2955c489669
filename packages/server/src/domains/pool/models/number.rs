use serde::Serialize;
use sqlx::PgConnection;

use crate::common::{NormalizedNumber, RelayResult};

/// A number waiting in the pool.
///
/// Rows are deleted when handed out and never re-inserted by the relay.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumberRecord {
    pub id: i64,
    pub raw_value: String,
}

impl NumberRecord {
    pub fn normalized(&self) -> NormalizedNumber {
        NormalizedNumber::from_raw(&self.raw_value)
    }

    /// Trimmed form of an admin-supplied value, or None when it holds no digits.
    pub fn clean_input(raw: &str) -> Option<&str> {
        let trimmed = raw.trim();
        if NormalizedNumber::from_raw(trimmed).is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

    // =========================================================================
    // SQL Queries
    // =========================================================================

    pub async fn count(conn: &mut PgConnection) -> RelayResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM numbers")
            .fetch_one(conn)
            .await?;
        Ok(count)
    }

    /// Pick one record uniformly at random and delete it.
    ///
    /// Must run inside a transaction. Rows locked by a concurrent issuance are
    /// skipped, so two callers can never walk away with the same record.
    pub async fn take_random(conn: &mut PgConnection) -> RelayResult<Option<Self>> {
        let picked = sqlx::query_as::<_, Self>(
            r#"
            SELECT id, raw_value
            FROM numbers
            ORDER BY random()
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .fetch_optional(&mut *conn)
        .await?;

        let Some(record) = picked else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM numbers WHERE id = $1")
            .bind(record.id)
            .execute(&mut *conn)
            .await?;

        Ok(Some(record))
    }

    /// Insert a value, returning false when it is already stocked.
    pub async fn insert_if_absent(raw_value: &str, conn: &mut PgConnection) -> RelayResult<bool> {
        let result = sqlx::query(
            "INSERT INTO numbers (raw_value) VALUES ($1) ON CONFLICT (raw_value) DO NOTHING",
        )
        .bind(raw_value)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_by_value(raw_value: &str, conn: &mut PgConnection) -> RelayResult<bool> {
        let result = sqlx::query("DELETE FROM numbers WHERE raw_value = $1")
            .bind(raw_value)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_all(conn: &mut PgConnection) -> RelayResult<u64> {
        let result = sqlx::query("DELETE FROM numbers").execute(conn).await?;
        Ok(result.rows_affected())
    }
}
