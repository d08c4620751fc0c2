use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

use crate::wallet::error::WalletError;
use crate::wallet::models::{LedgerEntry, NewLedgerEntry, Wallet};

/// Attempts before an optimistic-concurrency conflict is surfaced
const MAX_APPLY_ATTEMPTS: u32 = 5;
/// Base backoff between conflicting attempts; doubles each retry
const APPLY_BACKOFF: Duration = Duration::from_millis(20);

/// Repository for wallets and their append-only ledger
#[derive(Clone)]
pub struct WalletRepository {
    pool: PgPool,
}

impl WalletRepository {
    /// Create a new WalletRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a wallet, creating an empty one if the user has none yet
    pub async fn get_or_create(&self, user_id: i32) -> Result<Wallet, WalletError> {
        sqlx::query(
            r#"
            INSERT INTO wallets (user_id, balance, version)
            VALUES ($1, 0, 0)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let wallet = sqlx::query_as::<_, Wallet>(
            "SELECT user_id, balance, version FROM wallets WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(wallet)
    }

    /// Fetch a wallet without creating one
    pub async fn find(&self, user_id: i32) -> Result<Option<Wallet>, WalletError> {
        let wallet = sqlx::query_as::<_, Wallet>(
            "SELECT user_id, balance, version FROM wallets WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(wallet)
    }

    /// Fetch all ledger entries for a user, oldest first
    pub async fn entries(&self, user_id: i32) -> Result<Vec<LedgerEntry>, WalletError> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"
            SELECT id, wallet_user_id, delta, reason, related_transaction_id, created_at
            FROM ledger_entries
            WHERE wallet_user_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Apply a batch of ledger entries to a wallet
    ///
    /// Entry inserts and the balance update happen in one database
    /// transaction, so `balance` always equals the fold of the entries. The
    /// balance write is a compare-and-swap on the wallet `version`; a stale
    /// version is retried with backoff against the fresh value.
    ///
    /// Entries whose `(related_transaction_id, reason)` pair already exists
    /// are skipped without contributing their delta, which makes a replayed
    /// commit a no-op. Returns the resulting balance.
    pub async fn apply(
        &self,
        user_id: i32,
        entries: &[NewLedgerEntry],
    ) -> Result<i64, WalletError> {
        let mut attempt: u32 = 0;

        loop {
            let wallet = self.get_or_create(user_id).await?;
            let mut tx = self.pool.begin().await?;

            let mut delta_total: i64 = 0;
            for entry in entries {
                let inserted = sqlx::query_scalar::<_, Uuid>(
                    r#"
                    INSERT INTO ledger_entries (wallet_user_id, delta, reason, related_transaction_id)
                    VALUES ($1, $2, $3, $4)
                    ON CONFLICT (related_transaction_id, reason) DO NOTHING
                    RETURNING id
                    "#,
                )
                .bind(user_id)
                .bind(entry.delta)
                .bind(entry.reason)
                .bind(entry.related_transaction_id)
                .fetch_optional(&mut *tx)
                .await?;

                if inserted.is_some() {
                    delta_total += entry.delta;
                } else {
                    tracing::debug!(
                        "Ledger entry already applied for transaction {} ({})",
                        entry.related_transaction_id,
                        entry.reason
                    );
                }
            }

            if delta_total == 0 {
                // Every entry was already applied (or the batch nets to zero)
                tx.commit().await?;
                return Ok(wallet.balance);
            }

            let updated = sqlx::query_as::<_, Wallet>(
                r#"
                UPDATE wallets
                SET balance = balance + $1, version = version + 1
                WHERE user_id = $2 AND version = $3 AND balance + $1 >= 0
                RETURNING user_id, balance, version
                "#,
            )
            .bind(delta_total)
            .bind(user_id)
            .bind(wallet.version)
            .fetch_optional(&mut *tx)
            .await?;

            match updated {
                Some(fresh) => {
                    tx.commit().await?;
                    tracing::info!(
                        "Applied {} ledger entr{} to wallet {} (balance {})",
                        entries.len(),
                        if entries.len() == 1 { "y" } else { "ies" },
                        user_id,
                        fresh.balance
                    );
                    return Ok(fresh.balance);
                }
                None => {
                    tx.rollback().await?;

                    let fresh = self.get_or_create(user_id).await?;
                    if fresh.version == wallet.version && fresh.balance + delta_total < 0 {
                        return Err(WalletError::InsufficientCoins {
                            delta: delta_total,
                            balance: fresh.balance,
                        });
                    }

                    attempt += 1;
                    if attempt >= MAX_APPLY_ATTEMPTS {
                        tracing::warn!(
                            "Ledger apply for wallet {} still conflicting after {} attempts",
                            user_id,
                            attempt
                        );
                        return Err(WalletError::Conflict(user_id));
                    }
                    tokio::time::sleep(APPLY_BACKOFF * 2u32.pow(attempt - 1)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    // The CAS retry loop and the ledger/balance consistency invariant are
    // covered by the end-to-end suite in src/tests.rs, which asserts
    // balance == sum(deltas) after every settlement flow.
}
