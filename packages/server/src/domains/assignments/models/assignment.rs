use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;

use crate::common::{HolderId, NormalizedNumber, RelayResult};

/// Assignment model - SQL persistence layer
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub normalized_number: NormalizedNumber,
    pub holder_id: HolderId,
    pub issued_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Assignment {
    /// Bind `number` to `holder_id`, returning whatever rows it displaced.
    ///
    /// Displaced rows are the holder's previous assignment and any stale row
    /// for the same number (last writer wins). A row for the same number
    /// committed by a concurrent issuance after the delete is overwritten in
    /// place and not reported.
    pub async fn assign(
        number: &NormalizedNumber,
        holder_id: HolderId,
        issued_at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> RelayResult<Vec<Self>> {
        let displaced = sqlx::query_as::<_, Self>(
            r#"
            DELETE FROM assignments
            WHERE holder_id = $1 OR normalized_number = $2
            RETURNING normalized_number, holder_id, issued_at
            "#,
        )
        .bind(holder_id)
        .bind(number)
        .fetch_all(&mut *conn)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO assignments (normalized_number, holder_id, issued_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (normalized_number) DO UPDATE
            SET holder_id = EXCLUDED.holder_id, issued_at = EXCLUDED.issued_at
            "#,
        )
        .bind(number)
        .bind(holder_id)
        .bind(issued_at)
        .execute(&mut *conn)
        .await?;

        Ok(displaced)
    }

    pub async fn resolve(
        number: &NormalizedNumber,
        conn: &mut PgConnection,
    ) -> RelayResult<Option<HolderId>> {
        let holder = sqlx::query_scalar::<_, HolderId>(
            "SELECT holder_id FROM assignments WHERE normalized_number = $1",
        )
        .bind(number)
        .fetch_optional(conn)
        .await?;
        Ok(holder)
    }

    pub async fn find_by_holder(
        holder_id: HolderId,
        conn: &mut PgConnection,
    ) -> RelayResult<Option<Self>> {
        let row = sqlx::query_as::<_, Self>(
            "SELECT normalized_number, holder_id, issued_at FROM assignments WHERE holder_id = $1",
        )
        .bind(holder_id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    /// Lock the row if it still binds `number` to `holder_id`.
    pub async fn lock_if_held_by(
        number: &NormalizedNumber,
        holder_id: HolderId,
        conn: &mut PgConnection,
    ) -> RelayResult<bool> {
        let found = sqlx::query_scalar::<_, i32>(
            r#"
            SELECT 1 FROM assignments
            WHERE normalized_number = $1 AND holder_id = $2
            FOR UPDATE
            "#,
        )
        .bind(number)
        .bind(holder_id)
        .fetch_optional(conn)
        .await?;
        Ok(found.is_some())
    }

    /// Idempotent removal. Returns whether a row existed.
    pub async fn clear(number: &NormalizedNumber, conn: &mut PgConnection) -> RelayResult<bool> {
        let result = sqlx::query("DELETE FROM assignments WHERE normalized_number = $1")
            .bind(number)
            .execute(conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn expire_issued_before(
        cutoff: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> RelayResult<Vec<Self>> {
        let expired = sqlx::query_as::<_, Self>(
            r#"
            DELETE FROM assignments
            WHERE issued_at < $1
            RETURNING normalized_number, holder_id, issued_at
            "#,
        )
        .bind(cutoff)
        .fetch_all(conn)
        .await?;
        Ok(expired)
    }

    pub async fn count(conn: &mut PgConnection) -> RelayResult<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM assignments")
            .fetch_one(conn)
            .await?;
        Ok(count)
    }
}
