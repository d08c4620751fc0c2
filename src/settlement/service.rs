use std::sync::Arc;
use std::time::Duration;

use crate::config::SettlementConfig;
use crate::inventory::{InventoryRepository, Reserved, SellableUnit, UnitKind};
use crate::payment::{verify_callback_signature, PaymentGateway};
use crate::pricing::price;
use crate::rewards::{coins_for, RewardEngine};
use crate::settlement::{
    CallbackRequest, CreateSettlementRequest, SettlementError, StatusMachine, Transaction,
    TransactionRepository, TransactionStatus,
};
use crate::wallet::{LedgerReason, NewLedgerEntry, WalletRepository};

/// Service orchestrating the settlement flow
///
/// Sequences reservation → pricing → payment intent → callback verification
/// → ledger commit, with compensation (release + failed status) whenever the
/// payment leg dies after capacity was taken. All collaborators are injected;
/// the service holds no ambient globals.
#[derive(Clone)]
pub struct SettlementService {
    inventory: InventoryRepository,
    wallets: WalletRepository,
    transactions: TransactionRepository,
    rewards: RewardEngine,
    gateway: Arc<dyn PaymentGateway>,
    config: SettlementConfig,
}

impl SettlementService {
    /// Create a new SettlementService
    pub fn new(
        inventory: InventoryRepository,
        wallets: WalletRepository,
        transactions: TransactionRepository,
        rewards: RewardEngine,
        gateway: Arc<dyn PaymentGateway>,
        config: SettlementConfig,
    ) -> Self {
        Self {
            inventory,
            wallets,
            transactions,
            rewards,
            gateway,
            config,
        }
    }

    /// Handle a reservation/settlement request
    ///
    /// Returns the transaction plus whether this was an idempotent replay of
    /// an earlier request (same idempotency key), in which case nothing was
    /// reserved, priced or charged again.
    ///
    /// # Flow
    /// 1. Validate the unit and price the attempt against the live wallet
    ///    balance (no side effects yet, so pricing errors cost nothing).
    /// 2. Atomically reserve capacity; a replayed key short-circuits here.
    /// 3. Persist the `pending` transaction.
    /// 4. `final_amount == 0`: commit straight to `settled`, never touching
    ///    the gateway. Otherwise create the payment intent under a timeout;
    ///    any failure releases the reservation and marks the transaction
    ///    `failed` before surfacing.
    pub async fn settle(
        &self,
        request: CreateSettlementRequest,
    ) -> Result<(Transaction, bool), SettlementError> {
        let unit = self
            .inventory
            .find_by_id(request.unit_id)
            .await?
            .ok_or(SettlementError::UnitNotFound(request.unit_id))?;
        if !unit.active {
            return Err(SettlementError::UnitInactive(unit.id));
        }

        let wallet = self.wallets.get_or_create(request.requester_id).await?;

        if self.config.strict_redemption && request.coins_requested > wallet.balance {
            return Err(SettlementError::InsufficientCoins {
                requested: request.coins_requested,
                available: wallet.balance,
            });
        }

        let quote = price(
            unit.unit_price,
            request.quantity,
            request.coins_requested,
            wallet.balance,
            self.config.tax_rate,
            self.shipping_for(&unit),
        );
        let coins_earned = coins_for(
            unit.kind,
            unit.coins_per_unit,
            request.quantity,
            quote.final_amount,
            self.config.cashback_rate,
        );

        let reservation = match self
            .inventory
            .reserve(
                unit.id,
                request.quantity,
                request.requester_id,
                &request.idempotency_key,
            )
            .await?
        {
            Reserved::Replayed(existing) => {
                let transaction = self
                    .transactions
                    .find_by_reservation(existing.id)
                    .await?
                    .ok_or_else(|| {
                        SettlementError::Conflict(
                            "settlement for this idempotency key is still being created"
                                .to_string(),
                        )
                    })?;
                tracing::debug!(
                    "Replayed settlement {} for idempotency key {}",
                    transaction.id,
                    request.idempotency_key
                );
                return Ok((transaction, true));
            }
            Reserved::Fresh(reservation) => reservation,
        };

        let transaction = match self
            .transactions
            .create_pending(
                request.requester_id,
                unit.id,
                reservation.id,
                request.quantity,
                &quote,
                coins_earned,
            )
            .await
        {
            Ok(transaction) => transaction,
            Err(err) => {
                // The hold must not outlive a failed attempt
                if let Err(release_err) = self.inventory.release(reservation.id).await {
                    tracing::error!(
                        "Failed to release reservation {} after create error: {}",
                        reservation.id,
                        release_err
                    );
                }
                return Err(err);
            }
        };

        if quote.final_amount.is_zero() {
            // Fully coin-funded or free: no gateway involvement at all
            let settled = self.commit(&transaction).await?;
            return Ok((settled, false));
        }

        match tokio::time::timeout(
            self.config.gateway.timeout + Duration::from_secs(1),
            self.gateway
                .create_intent(quote.final_amount, &self.config.currency, transaction.id),
        )
        .await
        {
            Ok(Ok(intent)) => {
                let transaction = self
                    .transactions
                    .set_provider_order(transaction.id, &intent.provider_order_id)
                    .await?;
                Ok((transaction, false))
            }
            Ok(Err(err)) => {
                self.fail_and_release(&transaction).await;
                Err(SettlementError::PaymentCreateFailed(err.to_string()))
            }
            Err(_elapsed) => {
                self.fail_and_release(&transaction).await;
                Err(SettlementError::PaymentCreateFailed(
                    "gateway call timed out".to_string(),
                ))
            }
        }
    }

    /// Handle an inbound payment callback
    ///
    /// Deliveries are at-least-once and unordered; every branch re-checks
    /// the persisted status, so replays and races collapse to no-ops.
    pub async fn handle_callback(
        &self,
        payload: CallbackRequest,
    ) -> Result<Transaction, SettlementError> {
        let transaction = self
            .transactions
            .find_by_provider_order(&payload.provider_order_id)
            .await?
            .ok_or(SettlementError::VerificationFailed)?;

        if !verify_callback_signature(
            &payload.provider_order_id,
            &payload.provider_payment_id,
            &payload.signature,
            &self.config.gateway.webhook_secret,
        ) {
            tracing::warn!(
                "Callback signature verification failed for transaction {}",
                transaction.id
            );
            if transaction.status == TransactionStatus::Pending {
                self.fail_and_release(&transaction).await;
            }
            return Err(SettlementError::VerificationFailed);
        }

        match transaction.status {
            // Replayed webhook for an already-settled transaction
            TransactionStatus::Settled => Ok(transaction),

            TransactionStatus::Pending => {
                match self
                    .transactions
                    .mark_paid(transaction.id, &payload.provider_payment_id)
                    .await?
                {
                    Some(paid) => self.commit(&paid).await,
                    None => {
                        // A concurrent delivery won the guard; follow its lead
                        let current = self
                            .transactions
                            .find_by_id(transaction.id)
                            .await?
                            .ok_or(SettlementError::NotFound)?;
                        match current.status {
                            TransactionStatus::Settled => Ok(current),
                            TransactionStatus::Paid => self.commit(&current).await,
                            _ => Err(SettlementError::Conflict(format!(
                                "transaction {} is already {}",
                                current.id, current.status
                            ))),
                        }
                    }
                }
            }

            // Verified earlier but the commit never landed; try again
            TransactionStatus::Paid => self.commit(&transaction).await,

            TransactionStatus::Failed | TransactionStatus::Reversed => {
                // A verified payment arrived for a transaction we already
                // abandoned (e.g. intent timeout released the hold). This
                // needs a human: money moved but nothing can be delivered.
                tracing::error!(
                    "ALERT: verified payment {} for {} transaction {}; manual reconciliation required",
                    payload.provider_payment_id,
                    transaction.status,
                    transaction.id
                );
                Err(SettlementError::Conflict(format!(
                    "transaction {} is already {}",
                    transaction.id, transaction.status
                )))
            }
        }
    }

    /// Fetch a transaction for polling clients
    pub async fn get_transaction(&self, id: uuid::Uuid) -> Result<Transaction, SettlementError> {
        self.transactions
            .find_by_id(id)
            .await?
            .ok_or(SettlementError::NotFound)
    }

    /// Commit a verified (or zero-amount) settlement
    ///
    /// Writes the redemption debit and the earned-coins credit through the
    /// ledger, then finalizes the status. Both legs are keyed to the
    /// transaction id, so replaying a partially-applied commit finishes the
    /// remainder instead of doubling anything. Capacity is deliberately not
    /// touched: the reservation's decrement became permanent the moment the
    /// payment was verified.
    ///
    /// A commit that still cannot land after the ledger's internal retries
    /// fires an operator-visible alert and surfaces `CommitFailed`; the
    /// caller's 500 makes the at-least-once gateway redeliver.
    async fn commit(&self, transaction: &Transaction) -> Result<Transaction, SettlementError> {
        let mut entries = Vec::new();
        if transaction.coins_redeemed > 0 {
            entries.push(NewLedgerEntry {
                delta: -transaction.coins_redeemed,
                reason: LedgerReason::Redemption,
                related_transaction_id: transaction.id,
            });
        }
        if transaction.coins_earned > 0 {
            entries.push(NewLedgerEntry {
                delta: transaction.coins_earned,
                reason: LedgerReason::Cashback,
                related_transaction_id: transaction.id,
            });
        }

        if !entries.is_empty() {
            if let Err(err) = self.wallets.apply(transaction.user_id, &entries).await {
                tracing::error!(
                    "ALERT: ledger commit failed for verified transaction {}: {}",
                    transaction.id,
                    err
                );
                return Err(SettlementError::CommitFailed(format!(
                    "ledger write for transaction {} did not land: {}",
                    transaction.id, err
                )));
            }
        }

        debug_assert!(StatusMachine::is_valid_transition(
            transaction.status,
            TransactionStatus::Settled
        ));
        let settled = match self
            .transactions
            .transition(transaction.id, transaction.status, TransactionStatus::Settled)
            .await?
        {
            Some(settled) => settled,
            None => {
                // Guard lost: another worker finished the commit first
                self.transactions
                    .find_by_id(transaction.id)
                    .await?
                    .ok_or(SettlementError::NotFound)?
            }
        };

        tracing::info!(
            "Settled transaction {} (redeemed {}, earned {})",
            settled.id,
            settled.coins_redeemed,
            settled.coins_earned
        );

        if self.config.wheel_enabled {
            // A lost spin must not unsettle a committed payment
            if let Err(err) = self
                .rewards
                .spin_and_credit(settled.user_id, settled.id)
                .await
            {
                tracing::warn!(
                    "Spin-wheel credit failed for transaction {}: {}",
                    settled.id,
                    err
                );
            }
        }

        Ok(settled)
    }

    /// Release the reservation and mark the transaction failed
    ///
    /// Compensation path for payment-leg failures; both steps tolerate
    /// being repeated, and errors here are logged rather than propagated so
    /// the original failure stays visible to the caller.
    async fn fail_and_release(&self, transaction: &Transaction) {
        if let Err(err) = self.inventory.release(transaction.reservation_id).await {
            tracing::error!(
                "Failed to release reservation {} for transaction {}: {}",
                transaction.reservation_id,
                transaction.id,
                err
            );
        }
        match self
            .transactions
            .transition(
                transaction.id,
                TransactionStatus::Pending,
                TransactionStatus::Failed,
            )
            .await
        {
            Ok(Some(_)) => {
                tracing::info!("Marked transaction {} failed", transaction.id);
            }
            Ok(None) => {
                tracing::debug!(
                    "Transaction {} already left pending; not marking failed",
                    transaction.id
                );
            }
            Err(err) => {
                tracing::error!(
                    "Failed to mark transaction {} failed: {}",
                    transaction.id,
                    err
                );
            }
        }
    }

    fn shipping_for(&self, unit: &SellableUnit) -> rust_decimal::Decimal {
        match unit.kind {
            // Seats are not shipped
            UnitKind::Event => rust_decimal::Decimal::ZERO,
            UnitKind::Product => self.config.shipping_flat,
        }
    }
}

#[cfg(test)]
mod tests {
    // The orchestration paths (fresh settle, replay, zero-amount fast path,
    // callback verification, commit idempotency, compensation) are covered
    // end to end in src/tests.rs with a stub gateway and a real database.
}
