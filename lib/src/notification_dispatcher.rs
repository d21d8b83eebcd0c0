use crate::delivery::{redact_token, DeliveryError, DeliveryErrorKind, DeliveryOutcome};
use crate::error::DispatcherError;
use crate::notification_request::NotificationRequest;
use crate::processing_result::ProcessingResult;
use crate::push_gateway::PushGateway;
use crate::push_message::PushMessage;
use crate::record_store::RecordStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn, Instrument, Span};

pub const DEFAULT_SEND_TIMEOUT_IN_MILLIS: u64 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The request carried no tokens; nothing was sent and the record was left untouched.
    Skipped,
    Completed(ProcessingResult),
    Failed(ProcessingResult),
}

/// Sends one push message per token of a request and records the tally on the request.
///
/// Every token is sent from its own task and all tasks are awaited, whatever their outcome, so a
/// failing token never hides the outcome of another one. Errors outside of the per-token sends
/// (an invalid request, a failed write-back) end in a best-effort error marking of the request
/// and are never returned to the caller.
#[derive(Clone)]
pub struct NotificationDispatcher {
    push_gateway: Arc<dyn PushGateway>,
    record_store: Arc<dyn RecordStore>,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        push_gateway: Arc<dyn PushGateway>,
        record_store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            push_gateway,
            record_store,
            send_timeout: Duration::from_millis(DEFAULT_SEND_TIMEOUT_IN_MILLIS),
        }
    }

    pub fn with_send_timeout(
        self,
        send_timeout: Duration,
    ) -> Self {
        Self { send_timeout, ..self }
    }

    #[instrument(skip_all, fields(request_id = %request.id))]
    pub async fn dispatch(
        &self,
        request: &NotificationRequest,
    ) -> DispatchOutcome {
        info!(
            "Processing notification request {} with {} target tokens and title {:?}",
            request.id,
            request.token_count_hint().unwrap_or(0),
            request.title_hint().unwrap_or_default()
        );

        match self.try_dispatch(request).await {
            Ok(Some(result)) => DispatchOutcome::Completed(result),
            Ok(None) => DispatchOutcome::Skipped,
            Err(error) => {
                error!("Error processing notification request {}: {}", request.id, error);

                let result = ProcessingResult::failed(&error.to_string());
                if let Err(write_error) = self.record_store.apply(request.id, &result).await {
                    error!("Failed to mark notification request {} as failed: {}", request.id, write_error);
                }

                DispatchOutcome::Failed(result)
            },
        }
    }

    async fn try_dispatch(
        &self,
        request: &NotificationRequest,
    ) -> Result<Option<ProcessingResult>, DispatcherError> {
        let tokens = request.tokens()?;
        if tokens.is_empty() {
            warn!("No tokens found in notification request {}", request.id);
            return Ok(None);
        }

        let payload = request.notification_payload()?;
        let messages = tokens.iter().map(|token| PushMessage::new(token, &payload)).collect::<Vec<_>>();

        let result = ProcessingResult::completed(self.fan_out(messages).await);

        self.record_store.apply(request.id, &result).await?;

        info!(
            "Notification processing complete: {}/{} sent successfully",
            result.success_count,
            result.total_tokens.unwrap_or_default()
        );

        Ok(Some(result))
    }

    async fn fan_out(
        &self,
        messages: Vec<PushMessage>,
    ) -> Vec<DeliveryOutcome> {
        let tokens = messages.iter().map(|message| message.token.clone()).collect::<Vec<_>>();

        let mut tasks = JoinSet::new();
        for (index, message) in messages.into_iter().enumerate() {
            let push_gateway = self.push_gateway.clone();
            let send_timeout = self.send_timeout;

            tasks.spawn(
                async move {
                    let outcome = send_one(push_gateway.as_ref(), &message, send_timeout).await;
                    (index, outcome)
                }
                .instrument(Span::current()),
            );
        }

        let mut outcomes: Vec<Option<DeliveryOutcome>> = vec![None; tokens.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Some(slot) = outcomes.get_mut(index) {
                        *slot = Some(outcome);
                    }
                },
                Err(join_error) => error!("Push delivery task ended abnormally: {}", join_error),
            }
        }

        outcomes
            .into_iter()
            .zip(tokens.iter())
            .map(|(outcome, token)| {
                outcome.unwrap_or_else(|| DeliveryOutcome::failed(token, &DeliveryError::new(DeliveryErrorKind::Internal, "delivery task ended abnormally")))
            })
            .collect()
    }
}

async fn send_one(
    push_gateway: &dyn PushGateway,
    message: &PushMessage,
    send_timeout: Duration,
) -> DeliveryOutcome {
    let result = tokio::time::timeout(send_timeout, push_gateway.send(message))
        .await
        .unwrap_or_else(|_| Err(DeliveryError::new(DeliveryErrorKind::Timeout, &format!("delivery timed out after {}ms", send_timeout.as_millis()))));

    match result {
        Ok(receipt) => {
            info!("Notification sent successfully to {}: {}", redact_token(&message.token), receipt.0);
            DeliveryOutcome::sent(&message.token)
        },
        Err(error) => {
            error!("Failed to send to token {}: {}", redact_token(&message.token), error);
            DeliveryOutcome::failed(&message.token, &error)
        },
    }
}
