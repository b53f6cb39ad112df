// Notification delivery retry policy

use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum DeliveryDecision {
    /// Try the same recipient again immediately.
    Retry,
    /// Budget exhausted, abandon this recipient.
    GiveUp,
}

/// Bounded immediate-retry policy for mail delivery.
///
/// Attempts are immediate, with no backoff. Each recipient of a
/// notification carries its own attempt counter; abandoning one recipient
/// never short-circuits the others.
pub struct DeliveryPolicy {
    max_attempts: u32,
}

impl DeliveryPolicy {
    /// Create a policy with the given attempt budget. A budget below one
    /// delivers nothing, so it is raised to one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide what to do after `attempts_made` failed attempts to one
    /// recipient.
    pub fn after_failure(&self, recipient: &str, attempts_made: u32) -> DeliveryDecision {
        if attempts_made >= self.max_attempts {
            warn!(
                recipient = %recipient,
                attempts = %attempts_made,
                max_attempts = %self.max_attempts,
                "Delivery attempt budget exhausted"
            );
            return DeliveryDecision::GiveUp;
        }

        info!(
            recipient = %recipient,
            attempt = %attempts_made,
            max_attempts = %self.max_attempts,
            "Retrying delivery"
        );
        DeliveryDecision::Retry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retries_until_budget_reached() {
        let policy = DeliveryPolicy::new(3);
        assert_eq!(policy.after_failure("a@x", 1), DeliveryDecision::Retry);
        assert_eq!(policy.after_failure("a@x", 2), DeliveryDecision::Retry);
        assert_eq!(policy.after_failure("a@x", 3), DeliveryDecision::GiveUp);
    }

    #[test]
    fn test_zero_budget_is_raised_to_one() {
        let policy = DeliveryPolicy::new(0);
        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.after_failure("a@x", 1), DeliveryDecision::GiveUp);
    }
}
