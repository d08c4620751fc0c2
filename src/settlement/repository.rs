use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::pricing::Quote;
use crate::settlement::error::SettlementError;
use crate::settlement::models::{Transaction, TransactionStatus};

const TRANSACTION_COLUMNS: &str = "id, user_id, unit_id, reservation_id, quantity, subtotal, \
     shipping, tax, coins_redeemed, final_amount, provider_order_id, provider_payment_id, \
     status, coins_earned, created_at, updated_at";

/// Repository for settlement transactions
///
/// Status changes go through guarded updates (`WHERE status = expected`), so
/// a replayed webhook or a racing worker can never apply a transition twice:
/// the second writer sees zero rows affected and refetches.
#[derive(Clone)]
pub struct TransactionRepository {
    pool: PgPool,
}

impl TransactionRepository {
    /// Create a new TransactionRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a transaction in `pending` state for a fresh reservation
    pub async fn create_pending(
        &self,
        user_id: i32,
        unit_id: i32,
        reservation_id: Uuid,
        quantity: i32,
        quote: &Quote,
        coins_earned: i64,
    ) -> Result<Transaction, SettlementError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions
                (user_id, unit_id, reservation_id, quantity, subtotal, shipping, tax,
                 coins_redeemed, final_amount, status, coins_earned)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(unit_id)
        .bind(reservation_id)
        .bind(quantity)
        .bind(quote.subtotal)
        .bind(quote.shipping)
        .bind(quote.tax)
        .bind(quote.discount_coins)
        .bind(quote.final_amount)
        .bind(TransactionStatus::Pending)
        .bind(coins_earned)
        .fetch_one(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Find a transaction by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Transaction>, SettlementError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Find the transaction created for a reservation
    pub async fn find_by_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<Option<Transaction>, SettlementError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE reservation_id = $1"
        ))
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Find a transaction by the provider's order id
    pub async fn find_by_provider_order(
        &self,
        provider_order_id: &str,
    ) -> Result<Option<Transaction>, SettlementError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE provider_order_id = $1"
        ))
        .bind(provider_order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Attach the provider order id once the intent is created
    pub async fn set_provider_order(
        &self,
        id: Uuid,
        provider_order_id: &str,
    ) -> Result<Transaction, SettlementError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions
            SET provider_order_id = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(provider_order_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SettlementError::NotFound)?;

        Ok(transaction)
    }

    /// Guarded status transition
    ///
    /// Applies `expected -> to` atomically; returns None when the guard
    /// fails, meaning another worker already moved the transaction on.
    pub async fn transition(
        &self,
        id: Uuid,
        expected: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<Option<Transaction>, SettlementError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(to)
        .bind(id)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Guarded `pending -> paid`, recording the verified payment id
    pub async fn mark_paid(
        &self,
        id: Uuid,
        provider_payment_id: &str,
    ) -> Result<Option<Transaction>, SettlementError> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            UPDATE transactions
            SET status = $1, provider_payment_id = $2, updated_at = NOW()
            WHERE id = $3 AND status = $4
            RETURNING {TRANSACTION_COLUMNS}
            "#
        ))
        .bind(TransactionStatus::Paid)
        .bind(provider_payment_id)
        .bind(id)
        .bind(TransactionStatus::Pending)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Recompute a transaction's final amount sanity check against the ledger
    ///
    /// Used by tests to assert that the persisted breakdown still adds up.
    pub fn breakdown_is_consistent(tx: &Transaction) -> bool {
        let pretotal = tx.subtotal + tx.shipping + tx.tax;
        tx.final_amount + Decimal::from(tx.coins_redeemed) == pretotal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_breakdown_consistency_check() {
        let tx = Transaction {
            id: Uuid::new_v4(),
            user_id: 1,
            unit_id: 1,
            reservation_id: Uuid::new_v4(),
            quantity: 2,
            subtotal: dec!(200),
            shipping: dec!(50),
            tax: dec!(36.00),
            coins_redeemed: 30,
            final_amount: dec!(256.00),
            provider_order_id: None,
            provider_payment_id: None,
            status: TransactionStatus::Pending,
            coins_earned: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(TransactionRepository::breakdown_is_consistent(&tx));

        let mut broken = tx;
        broken.final_amount = dec!(999);
        assert!(!TransactionRepository::breakdown_is_consistent(&broken));
    }
}
