use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use crate::common::{HolderId, RelayResult};

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Holder {
    pub holder_id: HolderId,
    pub created_at: DateTime<Utc>,
}

impl Holder {
    /// Returns true when the holder was not known before.
    pub async fn register(holder_id: HolderId, conn: &mut PgConnection) -> RelayResult<bool> {
        let result = sqlx::query(
            "INSERT INTO holders (holder_id) VALUES ($1) ON CONFLICT (holder_id) DO NOTHING",
        )
        .bind(holder_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn all_ids(conn: &mut PgConnection) -> RelayResult<Vec<HolderId>> {
        let ids = sqlx::query_scalar::<_, HolderId>("SELECT holder_id FROM holders ORDER BY holder_id")
            .fetch_all(conn)
            .await?;
        Ok(ids)
    }
}
