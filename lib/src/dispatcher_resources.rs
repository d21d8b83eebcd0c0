use crate::app_state::DEFAULT_MAX_IN_FLIGHT_INTERVAL_IN_SECONDS;
use crate::error::DispatcherError;
use crate::notification_dispatcher::DEFAULT_SEND_TIMEOUT_IN_MILLIS;
use crate::push_gateway::PushGateway;
use crate::record_store::RecordStore;
use sqlx::{Pool, Postgres};
use std::sync::Arc;

#[derive(Clone)]
pub struct DispatcherResources {
    pub postgres_pool: Pool<Postgres>,
    pub push_gateway: Arc<dyn PushGateway>,
    pub record_store: Option<Arc<dyn RecordStore>>,
    pub send_timeout_in_millis: Option<u64>,
    pub request_query_limit: Option<u32>,
    pub execution_interval_in_seconds: Option<u64>,
    pub max_in_flight_interval_in_seconds: Option<u64>,
}

impl DispatcherResources {
    pub fn new(
        postgres_pool: Pool<Postgres>,
        push_gateway: Arc<dyn PushGateway>,
    ) -> Self {
        Self {
            postgres_pool,
            push_gateway,
            record_store: None,
            send_timeout_in_millis: None,
            request_query_limit: None,
            execution_interval_in_seconds: None,
            max_in_flight_interval_in_seconds: None,
        }
    }

    /// Replaces the postgres-backed store that requests are written back to.
    pub fn with_record_store(
        self,
        record_store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            record_store: Some(record_store),
            ..self
        }
    }

    pub fn with_send_timeout_in_millis(
        self,
        send_timeout_in_millis: u64,
    ) -> Self {
        Self {
            send_timeout_in_millis: Some(send_timeout_in_millis),
            ..self
        }
    }

    pub fn with_request_query_limit(
        self,
        request_query_limit: u32,
    ) -> Self {
        Self {
            request_query_limit: Some(request_query_limit),
            ..self
        }
    }

    pub fn with_execution_interval_in_seconds(
        self,
        execution_interval_in_seconds: u64,
    ) -> Self {
        Self {
            execution_interval_in_seconds: Some(execution_interval_in_seconds),
            ..self
        }
    }

    pub fn with_max_in_flight_interval_in_seconds(
        self,
        max_in_flight_interval_in_seconds: u64,
    ) -> Self {
        Self {
            max_in_flight_interval_in_seconds: Some(max_in_flight_interval_in_seconds),
            ..self
        }
    }

    /// The send timeout must be shorter than the claim lease. Otherwise a request can be claimed
    /// again while its sends are still running.
    pub fn validate(&self) -> Result<(), DispatcherError> {
        check_send_timeout_within_lease(
            self.send_timeout_in_millis.unwrap_or(DEFAULT_SEND_TIMEOUT_IN_MILLIS),
            self.max_in_flight_interval_in_seconds.unwrap_or(DEFAULT_MAX_IN_FLIGHT_INTERVAL_IN_SECONDS),
        )
    }
}

pub fn check_send_timeout_within_lease(
    send_timeout_in_millis: u64,
    max_in_flight_interval_in_seconds: u64,
) -> Result<(), DispatcherError> {
    if send_timeout_in_millis < max_in_flight_interval_in_seconds.saturating_mul(1000) {
        return Ok(());
    }

    Err(DispatcherError::new(
        &format!("send timeout of {send_timeout_in_millis}ms is not shorter than the claim lease of {max_in_flight_interval_in_seconds}s"),
        "Invalid dispatcher configuration",
    ))
}
