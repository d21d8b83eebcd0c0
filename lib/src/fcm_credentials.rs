use crate::delivery::{DeliveryError, DeliveryErrorKind};
use crate::http_gateway::HttpGateway;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, instrument};

pub const METADATA_SERVER_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token?scopes=https://www.googleapis.com/auth/firebase.messaging";

const REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub enum FcmCredentials {
    Static(String),
    MetadataServer { token_url: String },
}

#[derive(Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Hands out bearer tokens for the FCM API, fetching and caching them from the metadata server
/// when not configured statically. Concurrent callers share a single refresh.
pub struct FcmAccessTokenProvider {
    credentials: FcmCredentials,
    http_gateway: HttpGateway,
    cached: RwLock<Option<CachedToken>>,
}

impl FcmAccessTokenProvider {
    pub fn new(
        credentials: FcmCredentials,
        http_gateway: HttpGateway,
    ) -> Self {
        Self {
            credentials,
            http_gateway,
            cached: RwLock::new(None),
        }
    }

    pub async fn access_token(&self) -> Result<String, DeliveryError> {
        let token_url = match &self.credentials {
            FcmCredentials::Static(token) => return Ok(token.clone()),
            FcmCredentials::MetadataServer { token_url } => token_url,
        };

        if let Some(token) = self.cached.read().await.as_ref().filter(|it| it.refresh_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        let mut cached = self.cached.write().await;
        if let Some(token) = cached.as_ref().filter(|it| it.refresh_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        let token = self.fetch(token_url).await?;
        *cached = Some(token.clone());

        Ok(token.value)
    }

    #[instrument(skip_all, name = "fetch_fcm_access_token")]
    async fn fetch(
        &self,
        token_url: &str,
    ) -> Result<CachedToken, DeliveryError> {
        let response = self
            .http_gateway
            .client
            .get(token_url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|error| DeliveryError::new(DeliveryErrorKind::Unauthenticated, &format!("Failed to fetch fcm access token: {error}")))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(DeliveryError::new(
                DeliveryErrorKind::Unauthenticated,
                &format!("Metadata server responded with status {status} while fetching fcm access token"),
            ));
        }

        let token = serde_json::from_str::<MetadataTokenResponse>(&body)
            .map_err(|error| DeliveryError::new(DeliveryErrorKind::Unauthenticated, &format!("Invalid fcm access token response: {error}")))?;

        info!("Fetched fcm access token valid for {} seconds", token.expires_in);

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(REFRESH_MARGIN);

        Ok(CachedToken {
            value: token.access_token,
            refresh_at: Instant::now() + lifetime,
        })
    }
}
