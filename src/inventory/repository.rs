use sqlx::PgPool;
use uuid::Uuid;

use crate::inventory::error::InventoryError;
use crate::inventory::models::{Reservation, SellableUnit};

/// Outcome of a reserve call: a fresh hold, or the existing hold for a
/// previously-seen idempotency key (capacity was not incremented again)
#[derive(Debug, Clone)]
pub enum Reserved {
    Fresh(Reservation),
    Replayed(Reservation),
}

impl Reserved {
    pub fn reservation(&self) -> &Reservation {
        match self {
            Reserved::Fresh(r) | Reserved::Replayed(r) => r,
        }
    }
}

/// Repository for sellable units and capacity reservations
#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    /// Create a new InventoryRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a sellable unit by ID
    pub async fn find_by_id(&self, unit_id: i32) -> Result<Option<SellableUnit>, InventoryError> {
        let unit = sqlx::query_as::<_, SellableUnit>(
            r#"
            SELECT id, name, kind, unit_price, total_capacity, reserved_count, coins_per_unit, active
            FROM sellable_units
            WHERE id = $1
            "#,
        )
        .bind(unit_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    /// Find a reservation by its idempotency key
    pub async fn find_by_key(&self, idempotency_key: &str) -> Result<Option<Reservation>, InventoryError> {
        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT id, unit_id, requester_id, quantity, idempotency_key, released, created_at
            FROM reservations
            WHERE idempotency_key = $1
            "#,
        )
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(reservation)
    }

    /// Reserve capacity on a unit
    ///
    /// The capacity check and increment are a single conditional UPDATE, so
    /// concurrent reservations observe a serialized view of `reserved_count`
    /// and the sum of successful holds can never exceed `total_capacity`.
    ///
    /// A replayed `idempotency_key` returns the original reservation without
    /// incrementing again: the reservation insert and the capacity increment
    /// share one database transaction, and a key conflict rolls the whole
    /// attempt back.
    pub async fn reserve(
        &self,
        unit_id: i32,
        quantity: i32,
        requester_id: i32,
        idempotency_key: &str,
    ) -> Result<Reserved, InventoryError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, Reservation>(
            r#"
            INSERT INTO reservations (unit_id, requester_id, quantity, idempotency_key)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (idempotency_key) DO NOTHING
            RETURNING id, unit_id, requester_id, quantity, idempotency_key, released, created_at
            "#,
        )
        .bind(unit_id)
        .bind(requester_id)
        .bind(quantity)
        .bind(idempotency_key)
        .fetch_optional(&mut *tx)
        .await?;

        let reservation = match inserted {
            Some(reservation) => reservation,
            None => {
                // Key already seen: the conflicting row is committed by the
                // time ON CONFLICT resolves, so it is visible outside this tx
                tx.rollback().await?;
                let existing = self.find_by_key(idempotency_key).await?.ok_or_else(|| {
                    InventoryError::DatabaseError(format!(
                        "reservation vanished for idempotency key {}",
                        idempotency_key
                    ))
                })?;
                tracing::debug!(
                    "Replayed reservation {} for idempotency key {}",
                    existing.id,
                    idempotency_key
                );
                return Ok(Reserved::Replayed(existing));
            }
        };

        let updated = sqlx::query(
            r#"
            UPDATE sellable_units
            SET reserved_count = reserved_count + $1
            WHERE id = $2
              AND active = TRUE
              AND reserved_count + $1 <= total_capacity
            "#,
        )
        .bind(quantity)
        .bind(unit_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Rolling back also removes the reservation row
            tx.rollback().await?;

            let unit = self
                .find_by_id(unit_id)
                .await?
                .ok_or(InventoryError::UnitNotFound(unit_id))?;
            if !unit.active {
                return Err(InventoryError::UnitInactive(unit_id));
            }
            tracing::debug!(
                "Capacity exceeded for unit {}: requested {}, remaining {}",
                unit_id,
                quantity,
                unit.remaining()
            );
            return Err(InventoryError::CapacityExceeded(unit_id));
        }

        tx.commit().await?;

        tracing::info!(
            "Reserved {} on unit {} for requester {} (reservation {})",
            quantity,
            unit_id,
            requester_id,
            reservation.id
        );
        Ok(Reserved::Fresh(reservation))
    }

    /// Release a reservation, restoring the unit's capacity
    ///
    /// Safe to call more than once: the capacity restore is gated on the
    /// `released` flag flipping, so a second call is a no-op. Returns whether
    /// this call performed the release.
    pub async fn release(&self, reservation_id: Uuid) -> Result<bool, InventoryError> {
        let mut tx = self.pool.begin().await?;

        let reservation = sqlx::query_as::<_, Reservation>(
            r#"
            UPDATE reservations
            SET released = TRUE
            WHERE id = $1 AND released = FALSE
            RETURNING id, unit_id, requester_id, quantity, idempotency_key, released, created_at
            "#,
        )
        .bind(reservation_id)
        .fetch_optional(&mut *tx)
        .await?;

        let reservation = match reservation {
            Some(r) => r,
            None => {
                tx.rollback().await?;
                return Ok(false);
            }
        };

        sqlx::query(
            r#"
            UPDATE sellable_units
            SET reserved_count = GREATEST(reserved_count - $1, 0)
            WHERE id = $2
            "#,
        )
        .bind(reservation.quantity)
        .bind(reservation.unit_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            "Released reservation {} ({} back on unit {})",
            reservation_id,
            reservation.quantity,
            reservation.unit_id
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    // Reservation atomicity and idempotency are exercised end to end in
    // src/tests.rs against a real database; the conditional-update contract
    // cannot be meaningfully tested without one.
}
