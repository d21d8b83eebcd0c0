use crate::dispatcher_resources::DispatcherResources;
use crate::notification_dispatcher::{NotificationDispatcher, DEFAULT_SEND_TIMEOUT_IN_MILLIS};
use crate::record_store::{PostgresRecordStore, RecordStore};
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_REQUEST_QUERY_LIMIT: u32 = 50;
pub const DEFAULT_EXECUTION_INTERVAL_IN_SECONDS: u64 = 5;
pub const DEFAULT_MAX_IN_FLIGHT_INTERVAL_IN_SECONDS: u64 = 30;

#[derive(Clone)]
pub struct AppState {
    pub postgres_pool: Pool<Postgres>,
    pub dispatcher: NotificationDispatcher,
    pub request_query_limit: u32,
    pub max_in_flight_interval_in_seconds: u64,
}

impl AppState {
    pub fn new(resources: &DispatcherResources) -> Self {
        let record_store = resources
            .record_store
            .clone()
            .unwrap_or_else(|| Arc::new(PostgresRecordStore::new(resources.postgres_pool.clone())) as Arc<dyn RecordStore>);

        let dispatcher = NotificationDispatcher::new(resources.push_gateway.clone(), record_store).with_send_timeout(Duration::from_millis(
            resources.send_timeout_in_millis.unwrap_or(DEFAULT_SEND_TIMEOUT_IN_MILLIS),
        ));

        Self {
            postgres_pool: resources.postgres_pool.clone(),
            dispatcher,
            request_query_limit: resources.request_query_limit.unwrap_or(DEFAULT_REQUEST_QUERY_LIMIT),
            max_in_flight_interval_in_seconds: resources.max_in_flight_interval_in_seconds.unwrap_or(DEFAULT_MAX_IN_FLIGHT_INTERVAL_IN_SECONDS),
        }
    }
}
