use crate::delivery::{DeliveryError, DeliveryReceipt};
use crate::push_message::PushMessage;
use async_trait::async_trait;

/// Delivers a single message to a single device.
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(
        &self,
        message: &PushMessage,
    ) -> Result<DeliveryReceipt, DeliveryError>;
}
