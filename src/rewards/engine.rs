// Reward engine: cashback coins and the spin wheel
//
// Event bookings earn a flat coin rate per seat; product orders earn a
// percentage of the amount actually paid, floored. The spin wheel draws a
// weighted outcome server-side; the client never supplies the result.

use rand::distributions::{Distribution, WeightedIndex};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::inventory::UnitKind;
use crate::rewards::error::RewardError;
use crate::rewards::repository::{RewardRepository, WheelOutcome};
use crate::wallet::{LedgerReason, NewLedgerEntry, WalletRepository};

/// Coins earned by a settlement, computed at pricing time
pub fn coins_for(
    kind: UnitKind,
    coins_per_unit: i64,
    quantity: i32,
    final_amount: Decimal,
    cashback_rate: Decimal,
) -> i64 {
    match kind {
        UnitKind::Event => coins_per_unit * i64::from(quantity),
        UnitKind::Product => (final_amount * cashback_rate)
            .floor()
            .to_i64()
            .unwrap_or(0)
            .max(0),
    }
}

/// Draw one outcome from the wheel by weight
///
/// Zero-weight outcomes are never drawn; a wheel with no positive weight is
/// an invalid configuration.
pub fn draw_outcome(outcomes: &[WheelOutcome]) -> Result<&WheelOutcome, RewardError> {
    let weights: Vec<u32> = outcomes.iter().map(|o| o.weight.max(0) as u32).collect();
    let dist = WeightedIndex::new(&weights).map_err(|_| RewardError::InvalidWheel)?;
    let mut rng = rand::thread_rng();
    Ok(&outcomes[dist.sample(&mut rng)])
}

/// Engine crediting bonus coins after successful settlements
#[derive(Clone)]
pub struct RewardEngine {
    repo: RewardRepository,
    wallets: WalletRepository,
}

impl RewardEngine {
    /// Create a new RewardEngine
    pub fn new(repo: RewardRepository, wallets: WalletRepository) -> Self {
        Self { repo, wallets }
    }

    /// Spin the wheel for a settled transaction and credit the prize
    ///
    /// The draw is recorded before the credit; both are keyed to the
    /// transaction id, so a replayed commit neither redraws nor recredits.
    /// Returns the credited amount, or None when no wheel is configured or
    /// the draw was already recorded.
    pub async fn spin_and_credit(
        &self,
        user_id: i32,
        transaction_id: Uuid,
    ) -> Result<Option<i64>, RewardError> {
        let outcomes = self.repo.active_outcomes().await?;
        if outcomes.is_empty() {
            return Ok(None);
        }

        let outcome = draw_outcome(&outcomes)?;
        let recorded = self
            .repo
            .record_spin(user_id, transaction_id, outcome.id, outcome.amount)
            .await?;
        if !recorded {
            tracing::debug!("Spin already recorded for transaction {}", transaction_id);
            return Ok(None);
        }

        if outcome.amount > 0 {
            self.wallets
                .apply(
                    user_id,
                    &[NewLedgerEntry {
                        delta: outcome.amount,
                        reason: LedgerReason::Reward,
                        related_transaction_id: transaction_id,
                    }],
                )
                .await?;
        }

        tracing::info!(
            "Wheel credited {} coins to user {} for transaction {}",
            outcome.amount,
            user_id,
            transaction_id
        );
        Ok(Some(outcome.amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn outcome(id: i32, weight: i32, amount: i64) -> WheelOutcome {
        WheelOutcome {
            id,
            weight,
            amount,
            active: true,
        }
    }

    #[test]
    fn test_event_coins_are_flat_per_seat() {
        assert_eq!(coins_for(UnitKind::Event, 5, 3, dec!(885.00), dec!(0.05)), 15);
        // Flat rate ignores the paid amount entirely
        assert_eq!(coins_for(UnitKind::Event, 5, 3, dec!(0), dec!(0.05)), 15);
    }

    #[test]
    fn test_product_cashback_is_floored() {
        // 256 * 0.05 = 12.8 -> 12
        assert_eq!(coins_for(UnitKind::Product, 0, 2, dec!(256.00), dec!(0.05)), 12);
    }

    #[test]
    fn test_zero_paid_earns_zero_cashback() {
        assert_eq!(coins_for(UnitKind::Product, 0, 1, dec!(0), dec!(0.05)), 0);
    }

    #[test]
    fn test_draw_single_outcome_always_selected() {
        let outcomes = vec![outcome(1, 10, 25)];
        for _ in 0..20 {
            assert_eq!(draw_outcome(&outcomes).unwrap().id, 1);
        }
    }

    #[test]
    fn test_draw_skips_zero_weight_outcomes() {
        let outcomes = vec![outcome(1, 0, 1000), outcome(2, 5, 10)];
        for _ in 0..50 {
            assert_eq!(draw_outcome(&outcomes).unwrap().id, 2);
        }
    }

    #[test]
    fn test_draw_only_returns_configured_outcomes() {
        let outcomes = vec![outcome(1, 1, 0), outcome(2, 3, 10), outcome(3, 6, 50)];
        let ids: Vec<i32> = outcomes.iter().map(|o| o.id).collect();
        for _ in 0..100 {
            let drawn = draw_outcome(&outcomes).unwrap();
            assert!(ids.contains(&drawn.id));
        }
    }

    #[test]
    fn test_empty_wheel_is_invalid() {
        assert!(matches!(draw_outcome(&[]), Err(RewardError::InvalidWheel)));
    }

    #[test]
    fn test_all_zero_weights_is_invalid() {
        let outcomes = vec![outcome(1, 0, 10), outcome(2, 0, 20)];
        assert!(matches!(
            draw_outcome(&outcomes),
            Err(RewardError::InvalidWheel)
        ));
    }
}
