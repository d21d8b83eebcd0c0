pub mod app_state;
pub mod delivery;
pub mod dispatcher_resources;
pub mod environment;
pub mod error;
pub mod fcm_credentials;
pub mod fcm_push_gateway;
pub mod http_gateway;
pub mod notification_dispatcher;
pub mod notification_payload;
pub mod notification_request;
pub mod notification_request_repository;
pub mod processing_result;
pub mod push_gateway;
pub mod push_message;
pub mod record_store;
pub mod request_processor;
pub mod shutdown;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
