use crate::delivery::DeliveryOutcome;
use crate::error::DispatcherError;
use crate::notification_payload::NotificationPayload;
use serde_json::Value;
use sqlx::types::chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// A row of `notification_requests` as written by the upstream producer.
///
/// `tokens` and `payload` stay untyped JSON until [`NotificationRequest::tokens`] and
/// [`NotificationRequest::notification_payload`] validate them, so a malformed document
/// is reported on the document itself instead of breaking the poll for every other row.
#[derive(Debug, FromRow, Clone, PartialEq)]
pub struct NotificationRequest {
    pub id: Uuid,
    pub tokens: Option<Json<Value>>,
    pub payload: Option<Json<Value>>,
    pub created_at: DateTime<Utc>,
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
    pub results: Option<Json<Vec<DeliveryOutcome>>>,
    pub success_count: Option<i32>,
    pub total_tokens: Option<i32>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestValidationError {
    TokensNotAList,
    TokenNotAString { index: usize },
    PayloadMissing,
    PayloadMalformed(String),
}

impl std::error::Error for RequestValidationError {}

impl fmt::Display for RequestValidationError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            RequestValidationError::TokensNotAList => write!(f, "tokens must be a list of strings"),
            RequestValidationError::TokenNotAString { index } => write!(f, "tokens[{index}] is not a string"),
            RequestValidationError::PayloadMissing => write!(f, "payload is missing"),
            RequestValidationError::PayloadMalformed(reason) => write!(f, "payload is malformed: {reason}"),
        }
    }
}

impl From<RequestValidationError> for DispatcherError {
    fn from(error: RequestValidationError) -> Self {
        DispatcherError::bad_request(&error.to_string(), "Invalid notification request")
    }
}

impl NotificationRequest {
    pub fn new(
        tokens: Option<Value>,
        payload: Option<Value>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            tokens: tokens.map(Json),
            payload: payload.map(Json),
            created_at: Utc::now(),
            processed: false,
            processed_at: None,
            results: None,
            success_count: None,
            total_tokens: None,
            error: None,
        }
    }

    pub fn with_tokens(
        tokens: &[&str],
        payload: &NotificationPayload,
    ) -> Self {
        let tokens = tokens.iter().map(|token| Value::String(token.to_string())).collect::<Vec<_>>();
        Self::new(Some(Value::Array(tokens)), serde_json::to_value(payload).ok())
    }

    /// Absent, `null` and `[]` all mean "nothing to send".
    pub fn tokens(&self) -> Result<Vec<String>, RequestValidationError> {
        match self.tokens.as_ref().map(|json| &json.0) {
            None | Some(Value::Null) => Ok(vec![]),
            Some(Value::Array(values)) => values
                .iter()
                .enumerate()
                .map(|(index, value)| value.as_str().map(str::to_string).ok_or(RequestValidationError::TokenNotAString { index }))
                .collect(),
            Some(_) => Err(RequestValidationError::TokensNotAList),
        }
    }

    pub fn notification_payload(&self) -> Result<NotificationPayload, RequestValidationError> {
        match self.payload.as_ref().map(|json| &json.0) {
            None | Some(Value::Null) => Err(RequestValidationError::PayloadMissing),
            Some(value) => serde_json::from_value(value.clone()).map_err(|error| RequestValidationError::PayloadMalformed(error.to_string())),
        }
    }

    pub fn token_count_hint(&self) -> Option<usize> {
        self.tokens.as_ref().and_then(|json| json.0.as_array()).map(Vec::len)
    }

    pub fn title_hint(&self) -> Option<&str> {
        self.payload.as_ref().and_then(|json| json.0.pointer("/notification/title")).and_then(Value::as_str)
    }
}
