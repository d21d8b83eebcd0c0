use crate::error::DispatcherError;
use crate::notification_request_repository::NotificationRequestRepository;
use crate::processing_result::ProcessingResult;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

/// Merges a [`ProcessingResult`] onto the request it was produced for.
/// Implementations set `processed_at` themselves and leave every other field untouched.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn apply(
        &self,
        request_id: Uuid,
        result: &ProcessingResult,
    ) -> Result<(), DispatcherError>;
}

#[derive(Clone)]
pub struct PostgresRecordStore {
    pub postgres_pool: Pool<Postgres>,
}

impl PostgresRecordStore {
    pub fn new(postgres_pool: Pool<Postgres>) -> Self {
        Self { postgres_pool }
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn apply(
        &self,
        request_id: Uuid,
        result: &ProcessingResult,
    ) -> Result<(), DispatcherError> {
        NotificationRequestRepository::apply_result(&self.postgres_pool, request_id, result).await
    }
}
