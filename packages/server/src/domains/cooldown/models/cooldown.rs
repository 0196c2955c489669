use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::common::{HolderId, RelayResult};

/// Last successful issuance per holder.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Cooldown {
    pub holder_id: HolderId,
    pub last_request_at: DateTime<Utc>,
}

impl Cooldown {
    /// Serialize issuance per holder for the rest of the transaction.
    ///
    /// Row locks alone do not cover a holder's very first request, when no
    /// cooldown row exists yet.
    pub async fn lock_holder(holder_id: HolderId, conn: &mut PgConnection) -> RelayResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(holder_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Read the holder's row, locking it until the transaction ends.
    pub async fn find_for_update(
        holder_id: HolderId,
        conn: &mut PgConnection,
    ) -> RelayResult<Option<Self>> {
        let row = sqlx::query_as::<_, Self>(
            "SELECT holder_id, last_request_at FROM cooldowns WHERE holder_id = $1 FOR UPDATE",
        )
        .bind(holder_id)
        .fetch_optional(conn)
        .await?;
        Ok(row)
    }

    pub async fn record(
        holder_id: HolderId,
        at: DateTime<Utc>,
        conn: &mut PgConnection,
    ) -> RelayResult<()> {
        sqlx::query(
            r#"
            INSERT INTO cooldowns (holder_id, last_request_at)
            VALUES ($1, $2)
            ON CONFLICT (holder_id) DO UPDATE SET last_request_at = EXCLUDED.last_request_at
            "#,
        )
        .bind(holder_id)
        .bind(at)
        .execute(conn)
        .await?;
        Ok(())
    }
}
