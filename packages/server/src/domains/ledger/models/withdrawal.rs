use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgConnection;

use crate::common::{HolderId, Money, RelayResult};
use crate::domains::ledger::WithdrawalQuote;

/// A recorded request for payout. Nothing here moves money.
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct WithdrawalIntent {
    pub id: i64,
    pub holder_id: HolderId,
    pub method: String,
    pub details: String,
    pub amount: Money,
    pub amount_base: Money,
    pub created_at: DateTime<Utc>,
}

impl WithdrawalIntent {
    pub async fn insert(
        holder_id: HolderId,
        quote: &WithdrawalQuote,
        details: &str,
        conn: &mut PgConnection,
    ) -> RelayResult<Self> {
        let intent = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO withdrawals (holder_id, method, details, amount, amount_base)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(holder_id)
        .bind(quote.method.as_str())
        .bind(details)
        .bind(quote.amount)
        .bind(quote.amount_base)
        .fetch_one(conn)
        .await?;
        Ok(intent)
    }

    pub async fn find_by_holder(
        holder_id: HolderId,
        conn: &mut PgConnection,
    ) -> RelayResult<Vec<Self>> {
        let intents = sqlx::query_as::<_, Self>(
            "SELECT * FROM withdrawals WHERE holder_id = $1 ORDER BY created_at DESC",
        )
        .bind(holder_id)
        .fetch_all(conn)
        .await?;
        Ok(intents)
    }
}
