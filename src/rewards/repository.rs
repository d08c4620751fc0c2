use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::rewards::error::RewardError;

/// One slot on the spin wheel
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WheelOutcome {
    pub id: i32,
    pub weight: i32,
    pub amount: i64,
    pub active: bool,
}

/// A recorded draw, one per settled transaction
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WheelSpin {
    pub id: Uuid,
    pub user_id: i32,
    pub transaction_id: Uuid,
    pub outcome_id: i32,
    pub amount: i64,
    pub created_at: DateTime<Utc>,
}

/// Repository for wheel configuration and draw history
#[derive(Clone)]
pub struct RewardRepository {
    pool: PgPool,
}

impl RewardRepository {
    /// Create a new RewardRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the active wheel outcomes
    pub async fn active_outcomes(&self) -> Result<Vec<WheelOutcome>, RewardError> {
        let outcomes = sqlx::query_as::<_, WheelOutcome>(
            r#"
            SELECT id, weight, amount, active
            FROM wheel_outcomes
            WHERE active = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(outcomes)
    }

    /// Record a draw for a transaction
    ///
    /// Unique on `transaction_id`: a replayed commit finds the row already
    /// present and records nothing. Returns whether this call recorded it.
    pub async fn record_spin(
        &self,
        user_id: i32,
        transaction_id: Uuid,
        outcome_id: i32,
        amount: i64,
    ) -> Result<bool, RewardError> {
        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO wheel_spins (user_id, transaction_id, outcome_id, amount)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (transaction_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(transaction_id)
        .bind(outcome_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    /// Fetch the recorded draw for a transaction, if any
    pub async fn find_spin(&self, transaction_id: Uuid) -> Result<Option<WheelSpin>, RewardError> {
        let spin = sqlx::query_as::<_, WheelSpin>(
            r#"
            SELECT id, user_id, transaction_id, outcome_id, amount, created_at
            FROM wheel_spins
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(spin)
    }
}
