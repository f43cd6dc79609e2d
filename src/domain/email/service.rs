use async_trait::async_trait;
use crate::{domain::email::model::{OutgoingEmail, SendReceipt}, utils::errors::ApiError};

#[async_trait]
pub trait EmailService: Send + Sync {
    /// Single delivery attempt; no retry on failure.
    async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt, ApiError>;

    /// Diagnostic connection handshake. Callers treat failure as a warning,
    /// never as a reason to abort a send.
    async fn verify(&self) -> Result<(), ApiError>;
}
