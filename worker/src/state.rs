use crate::infra::database::Database;
use crate::infra::error::AppError;
use crate::infra::fcm::Fcm;
use notification_request_dispatcher::app_state::{DEFAULT_EXECUTION_INTERVAL_IN_SECONDS, DEFAULT_MAX_IN_FLIGHT_INTERVAL_IN_SECONDS, DEFAULT_REQUEST_QUERY_LIMIT};
use notification_request_dispatcher::dispatcher_resources::DispatcherResources;
use notification_request_dispatcher::environment::Environment;
use notification_request_dispatcher::fcm_push_gateway::FcmPushGateway;
use notification_request_dispatcher::http_gateway::HttpGateway;
use notification_request_dispatcher::notification_dispatcher::DEFAULT_SEND_TIMEOUT_IN_MILLIS;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub resources: DispatcherResources,
    pub http_port: u16,
}

impl AppState {
    pub async fn new() -> Result<Self, AppError> {
        let database = Database::from_env()?;
        let postgres_pool = database.create_db_pool().await?;

        let http_gateway = HttpGateway::new(Environment::parse("HTTP_TIMEOUT_IN_MILLIS", 3000)?)?;
        let push_gateway = Arc::new(FcmPushGateway::new(Fcm::settings_from_env()?, http_gateway));

        let resources = DispatcherResources::new(postgres_pool, push_gateway)
            .with_send_timeout_in_millis(Environment::parse("SEND_TIMEOUT_IN_MILLIS", DEFAULT_SEND_TIMEOUT_IN_MILLIS)?)
            .with_request_query_limit(Environment::parse("REQUEST_QUERY_LIMIT", DEFAULT_REQUEST_QUERY_LIMIT)?)
            .with_execution_interval_in_seconds(Environment::parse("EXECUTION_INTERVAL_IN_SECONDS", DEFAULT_EXECUTION_INTERVAL_IN_SECONDS)?)
            .with_max_in_flight_interval_in_seconds(Environment::parse("MAX_IN_FLIGHT_INTERVAL_IN_SECONDS", DEFAULT_MAX_IN_FLIGHT_INTERVAL_IN_SECONDS)?);

        resources.validate()?;

        Ok(Self {
            resources,
            http_port: Environment::parse("HTTP_PORT", 9095)?,
        })
    }
}
