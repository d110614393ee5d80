// src/services/mailer.rs
//! Outbound mail seam for verification codes.

use async_trait::async_trait;
use tracing::info;

use crate::common::safe_email_log;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_verification_code(&self, to: &str, code: &str) -> Result<(), MailerError>;
}

/// Writes deliveries to the log instead of sending them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_code(&self, to: &str, _code: &str) -> Result<(), MailerError> {
        let deliverable = matches!(
            to.split_once('@'),
            Some((local, domain)) if !local.is_empty() && domain.contains('.')
        );
        if !deliverable {
            return Err(MailerError::DeliveryFailed(format!(
                "no mailbox at {}",
                safe_email_log(to)
            )));
        }
        info!(
            recipient = %safe_email_log(to),
            "Varsity verification code issued (log delivery)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_log_mailer_accepts_delivery() {
        let mailer: Arc<dyn Mailer> = Arc::new(LogMailer);
        assert!(mailer
            .send_verification_code("rahim@bracu.ac.bd", "123456")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_log_mailer_refuses_undeliverable_address() {
        let result = LogMailer.send_verification_code("not-an-address", "123456").await;
        assert!(matches!(result, Err(MailerError::DeliveryFailed(_))));
    }
}
