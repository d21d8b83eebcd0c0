use serde::{Deserialize, Serialize};
use std::fmt;

const REDACTED_TOKEN_PREFIX_LEN: usize = 20;

/// Keeps the first 20 characters of a device token, enough to correlate logs without storing the
/// full address of the device.
pub fn redact_token(token: &str) -> String {
    let prefix = token.chars().take(REDACTED_TOKEN_PREFIX_LEN).collect::<String>();
    format!("{prefix}...")
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DeliveryOutcome {
    pub token: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn sent(token: &str) -> Self {
        Self {
            token: redact_token(token),
            success: true,
            error: None,
        }
    }

    pub fn failed(
        token: &str,
        error: &DeliveryError,
    ) -> Self {
        Self {
            token: redact_token(token),
            success: false,
            error: Some(error.message.clone()),
        }
    }
}

/// Identifier the push service assigns to an accepted message.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryErrorKind {
    InvalidArgument,
    Unregistered,
    SenderIdMismatch,
    QuotaExceeded,
    Unavailable,
    Internal,
    ThirdPartyAuth,
    Unauthenticated,
    Transport,
    Timeout,
    Unknown,
}

impl DeliveryErrorKind {
    /// Maps FCM `errorCode` / Google RPC `status` values.
    pub fn from_code(code: &str) -> Self {
        match code {
            "INVALID_ARGUMENT" => DeliveryErrorKind::InvalidArgument,
            "UNREGISTERED" | "NOT_FOUND" => DeliveryErrorKind::Unregistered,
            "SENDER_ID_MISMATCH" | "PERMISSION_DENIED" => DeliveryErrorKind::SenderIdMismatch,
            "QUOTA_EXCEEDED" | "RESOURCE_EXHAUSTED" => DeliveryErrorKind::QuotaExceeded,
            "UNAVAILABLE" => DeliveryErrorKind::Unavailable,
            "INTERNAL" => DeliveryErrorKind::Internal,
            "THIRD_PARTY_AUTH_ERROR" => DeliveryErrorKind::ThirdPartyAuth,
            "UNAUTHENTICATED" => DeliveryErrorKind::Unauthenticated,
            _ => DeliveryErrorKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryError {
    pub kind: DeliveryErrorKind,
    pub message: String,
}

impl DeliveryError {
    pub fn new(
        kind: DeliveryErrorKind,
        message: &str,
    ) -> Self {
        Self {
            kind,
            message: message.to_string(),
        }
    }
}

impl std::error::Error for DeliveryError {}

impl fmt::Display for DeliveryError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}
