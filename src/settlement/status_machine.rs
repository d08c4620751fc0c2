use crate::settlement::TransactionStatus;

/// Service for validating settlement status transitions
pub struct StatusMachine;

impl StatusMachine {
    /// Check if a status transition is valid
    ///
    /// # Valid Transitions
    /// - Pending → Paid (callback verified, commit outstanding)
    /// - Pending → Settled (zero-amount fast path: no gateway involved)
    /// - Pending → Failed (payment create failure, timeout, bad signature)
    /// - Paid → Settled (ledger commit landed)
    /// - Paid → Reversed (operator escape hatch after a stuck commit)
    /// - Settled, Failed, Reversed → terminal
    /// - Any status → same status (idempotent, absorbs webhook replays)
    pub fn is_valid_transition(from: TransactionStatus, to: TransactionStatus) -> bool {
        // Same status is always valid (idempotent)
        if from == to {
            return true;
        }

        match (from, to) {
            // From Pending
            (TransactionStatus::Pending, TransactionStatus::Paid) => true,
            (TransactionStatus::Pending, TransactionStatus::Settled) => true,
            (TransactionStatus::Pending, TransactionStatus::Failed) => true,

            // From Paid
            (TransactionStatus::Paid, TransactionStatus::Settled) => true,
            (TransactionStatus::Paid, TransactionStatus::Reversed) => true,

            // Settled, Failed and Reversed are terminal
            _ => false,
        }
    }

    /// Attempt to transition from one status to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(
        from: TransactionStatus,
        to: TransactionStatus,
    ) -> Result<TransactionStatus, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!("Invalid status transition from {} to {}", from, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_to_paid() {
        assert!(StatusMachine::is_valid_transition(
            TransactionStatus::Pending,
            TransactionStatus::Paid
        ));
    }

    #[test]
    fn test_pending_to_settled_zero_amount() {
        assert!(StatusMachine::is_valid_transition(
            TransactionStatus::Pending,
            TransactionStatus::Settled
        ));
    }

    #[test]
    fn test_pending_to_failed() {
        assert!(StatusMachine::is_valid_transition(
            TransactionStatus::Pending,
            TransactionStatus::Failed
        ));
    }

    #[test]
    fn test_paid_to_settled() {
        assert!(StatusMachine::is_valid_transition(
            TransactionStatus::Paid,
            TransactionStatus::Settled
        ));
    }

    #[test]
    fn test_paid_to_reversed() {
        assert!(StatusMachine::is_valid_transition(
            TransactionStatus::Paid,
            TransactionStatus::Reversed
        ));
    }

    #[test]
    fn test_settled_is_terminal() {
        assert!(!StatusMachine::is_valid_transition(
            TransactionStatus::Settled,
            TransactionStatus::Pending
        ));
        assert!(!StatusMachine::is_valid_transition(
            TransactionStatus::Settled,
            TransactionStatus::Paid
        ));
        assert!(!StatusMachine::is_valid_transition(
            TransactionStatus::Settled,
            TransactionStatus::Failed
        ));
        assert!(!StatusMachine::is_valid_transition(
            TransactionStatus::Settled,
            TransactionStatus::Reversed
        ));
    }

    #[test]
    fn test_failed_is_terminal() {
        assert!(!StatusMachine::is_valid_transition(
            TransactionStatus::Failed,
            TransactionStatus::Pending
        ));
        assert!(!StatusMachine::is_valid_transition(
            TransactionStatus::Failed,
            TransactionStatus::Paid
        ));
        assert!(!StatusMachine::is_valid_transition(
            TransactionStatus::Failed,
            TransactionStatus::Settled
        ));
    }

    #[test]
    fn test_paid_cannot_regress_to_pending() {
        assert!(!StatusMachine::is_valid_transition(
            TransactionStatus::Paid,
            TransactionStatus::Pending
        ));
    }

    #[test]
    fn test_paid_cannot_fail_after_verification() {
        assert!(!StatusMachine::is_valid_transition(
            TransactionStatus::Paid,
            TransactionStatus::Failed
        ));
    }

    #[test]
    fn test_pending_cannot_reverse_directly() {
        assert!(!StatusMachine::is_valid_transition(
            TransactionStatus::Pending,
            TransactionStatus::Reversed
        ));
    }

    #[test]
    fn test_transition_valid() {
        let result = StatusMachine::transition(TransactionStatus::Pending, TransactionStatus::Paid);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), TransactionStatus::Paid);
    }

    #[test]
    fn test_transition_invalid() {
        let result =
            StatusMachine::transition(TransactionStatus::Settled, TransactionStatus::Failed);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid status transition"));
    }
}
