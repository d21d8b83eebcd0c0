use crate::delivery::{DeliveryError, DeliveryErrorKind, DeliveryReceipt};
use crate::fcm_credentials::{FcmAccessTokenProvider, FcmCredentials};
use crate::http_gateway::HttpGateway;
use crate::push_gateway::PushGateway;
use crate::push_message::{PushMessage, SendMessageBody};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::instrument;

pub const FCM_DEFAULT_BASE_URL: &str = "https://fcm.googleapis.com";

#[derive(Debug, Clone, PartialEq)]
pub struct FcmSettings {
    pub project_id: String,
    pub base_url: String,
    pub credentials: FcmCredentials,
}

impl FcmSettings {
    pub fn new(
        project_id: &str,
        credentials: FcmCredentials,
    ) -> Self {
        Self {
            project_id: project_id.to_string(),
            base_url: FCM_DEFAULT_BASE_URL.to_string(),
            credentials,
        }
    }

    pub fn with_base_url(
        self,
        base_url: &str,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..self
        }
    }

    pub fn send_url(&self) -> String {
        format!("{}/v1/projects/{}/messages:send", self.base_url, self.project_id)
    }
}

#[derive(Deserialize)]
struct SendMessageResponse {
    name: String,
}

#[derive(Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleError,
}

#[derive(Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<GoogleErrorDetail>,
}

#[derive(Deserialize)]
struct GoogleErrorDetail {
    #[serde(default, rename = "errorCode")]
    error_code: Option<String>,
}

/// [`PushGateway`] over the FCM HTTP v1 `messages:send` endpoint.
pub struct FcmPushGateway {
    settings: FcmSettings,
    http_gateway: HttpGateway,
    token_provider: FcmAccessTokenProvider,
}

impl FcmPushGateway {
    pub fn new(
        settings: FcmSettings,
        http_gateway: HttpGateway,
    ) -> Self {
        let token_provider = FcmAccessTokenProvider::new(settings.credentials.clone(), http_gateway.clone());

        Self {
            settings,
            http_gateway,
            token_provider,
        }
    }
}

#[async_trait]
impl PushGateway for FcmPushGateway {
    #[instrument(skip_all, name = "send_to_fcm")]
    async fn send(
        &self,
        message: &PushMessage,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let access_token = self.token_provider.access_token().await?;

        let body = serde_json::to_string(&SendMessageBody { message })
            .map_err(|error| DeliveryError::new(DeliveryErrorKind::InvalidArgument, &format!("Failed to serialize fcm message: {error}")))?;

        let response = self
            .http_gateway
            .client
            .post(self.settings.send_url())
            .header("Authorization", format!("Bearer {access_token}"))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|error| match error {
                reqwest_middleware::Error::Reqwest(inner) if inner.is_timeout() => DeliveryError::new(DeliveryErrorKind::Timeout, &inner.to_string()),
                other => DeliveryError::new(DeliveryErrorKind::Transport, &other.to_string()),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();

        if status.is_success() {
            let receipt = serde_json::from_str::<SendMessageResponse>(&text).map(|it| it.name).unwrap_or(text);
            return Ok(DeliveryReceipt(receipt));
        }

        Err(delivery_error(status, &text))
    }
}

fn delivery_error(
    status: StatusCode,
    body: &str,
) -> DeliveryError {
    match serde_json::from_str::<GoogleErrorEnvelope>(body) {
        Ok(envelope) => {
            let error = envelope.error;
            let kind = error
                .details
                .iter()
                .find_map(|detail| detail.error_code.as_deref())
                .or(error.status.as_deref())
                .map(DeliveryErrorKind::from_code)
                .unwrap_or(kind_from_status(status));

            let message = if error.message.is_empty() {
                format!("fcm responded with status {status}")
            } else {
                error.message
            };

            DeliveryError::new(kind, &message)
        },
        Err(_) => DeliveryError::new(kind_from_status(status), &format!("fcm responded with status {status}: {body}")),
    }
}

fn kind_from_status(status: StatusCode) -> DeliveryErrorKind {
    match status {
        StatusCode::UNAUTHORIZED => DeliveryErrorKind::Unauthenticated,
        StatusCode::NOT_FOUND => DeliveryErrorKind::Unregistered,
        StatusCode::TOO_MANY_REQUESTS => DeliveryErrorKind::QuotaExceeded,
        StatusCode::SERVICE_UNAVAILABLE => DeliveryErrorKind::Unavailable,
        StatusCode::INTERNAL_SERVER_ERROR => DeliveryErrorKind::Internal,
        _ => DeliveryErrorKind::Unknown,
    }
}
