use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::common::{HolderId, Money, RelayResult};
use crate::domains::ledger::DebitOutcome;

/// Balance model - one row per holder, NUMERIC(14,2)
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct Balance {
    pub holder_id: HolderId,
    pub balance: Money,
}

impl Balance {
    /// Create a zero balance row if the holder has none.
    pub async fn open(holder_id: HolderId, conn: &mut PgConnection) -> RelayResult<()> {
        sqlx::query(
            "INSERT INTO balances (holder_id, balance) VALUES ($1, 0) ON CONFLICT (holder_id) DO NOTHING",
        )
        .bind(holder_id)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn read(holder_id: HolderId, conn: &mut PgConnection) -> RelayResult<Money> {
        let balance =
            sqlx::query_scalar::<_, Decimal>("SELECT balance FROM balances WHERE holder_id = $1")
                .bind(holder_id)
                .fetch_optional(conn)
                .await?;
        Ok(balance.unwrap_or(Decimal::ZERO))
    }

    /// Unconditional additive credit. Returns the new balance.
    pub async fn credit(
        holder_id: HolderId,
        amount: Money,
        conn: &mut PgConnection,
    ) -> RelayResult<Money> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            INSERT INTO balances (holder_id, balance)
            VALUES ($1, $2)
            ON CONFLICT (holder_id) DO UPDATE SET balance = balances.balance + EXCLUDED.balance
            RETURNING balance
            "#,
        )
        .bind(holder_id)
        .bind(amount)
        .fetch_one(conn)
        .await?;
        Ok(balance)
    }

    /// Compare and debit in one statement, so concurrent debits cannot both
    /// pass the check.
    pub async fn debit_if_sufficient(
        holder_id: HolderId,
        amount: Money,
        conn: &mut PgConnection,
    ) -> RelayResult<DebitOutcome> {
        let updated = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE balances
            SET balance = balance - $2
            WHERE holder_id = $1 AND balance >= $2
            RETURNING balance
            "#,
        )
        .bind(holder_id)
        .bind(amount)
        .fetch_optional(&mut *conn)
        .await?;

        match updated {
            Some(balance) => Ok(DebitOutcome::Debited { balance }),
            None => Ok(DebitOutcome::InsufficientBalance {
                balance: Self::read(holder_id, conn).await?,
            }),
        }
    }
}
