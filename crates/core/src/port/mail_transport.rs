// Mail Transport Port
// Delivers one rendered message to one recipient. Retry lives above this
// seam in the notifier, so an adapter reports each attempt's outcome and
// nothing else.

use crate::domain::MailMessage;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("delivery to {recipient} failed: {message}")]
    Delivery { recipient: String, message: String },

    #[error("could not stage outgoing message: {0}")]
    Stage(String),
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Attempt delivery of `message` to its recipient once.
    async fn deliver(&self, message: &MailMessage) -> Result<(), MailError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};
    use std::sync::Mutex;

    /// Transport double with per-recipient failure scripting.
    #[derive(Default)]
    pub struct MockMailTransport {
        delivered: Mutex<Vec<MailMessage>>,
        attempts: Mutex<BTreeMap<String, u64>>,
        fail_first: Mutex<BTreeMap<String, u64>>,
        always_fail: Mutex<BTreeSet<String>>,
    }

    impl MockMailTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail the first `n` attempts addressed to `recipient`, then accept.
        pub fn fail_first_for(&self, recipient: &str, n: u64) {
            self.fail_first
                .lock()
                .unwrap()
                .insert(recipient.to_string(), n);
        }

        /// Reject every attempt addressed to `recipient`.
        pub fn always_fail_for(&self, recipient: &str) {
            self.always_fail
                .lock()
                .unwrap()
                .insert(recipient.to_string());
        }

        pub fn delivered(&self) -> Vec<MailMessage> {
            self.delivered.lock().unwrap().clone()
        }

        pub fn delivered_to(&self, recipient: &str) -> usize {
            self.delivered
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.to == recipient)
                .count()
        }

        pub fn attempts(&self, recipient: &str) -> u64 {
            self.attempts
                .lock()
                .unwrap()
                .get(recipient)
                .copied()
                .unwrap_or(0)
        }
    }

    #[async_trait]
    impl MailTransport for MockMailTransport {
        async fn deliver(&self, message: &MailMessage) -> Result<(), MailError> {
            *self
                .attempts
                .lock()
                .unwrap()
                .entry(message.to.clone())
                .or_insert(0) += 1;

            if self.always_fail.lock().unwrap().contains(&message.to) {
                return Err(MailError::Delivery {
                    recipient: message.to.clone(),
                    message: "scripted failure".to_string(),
                });
            }
            if let Some(remaining) = self.fail_first.lock().unwrap().get_mut(&message.to) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(MailError::Delivery {
                        recipient: message.to.clone(),
                        message: "scripted transient failure".to_string(),
                    });
                }
            }
            self.delivered.lock().unwrap().push(message.clone());
            Ok(())
        }
    }
}
