use crate::error::DispatcherError;
use crate::notification_request::NotificationRequest;
use crate::processing_result::ProcessingResult;
use sqlx::types::Json;
use sqlx::{Pool, Postgres};
use tracing::instrument;
use uuid::Uuid;

pub struct NotificationRequestRepository;

impl NotificationRequestRepository {
    #[instrument(skip_all)]
    pub async fn insert(
        postgres_pool: &Pool<Postgres>,
        request: NotificationRequest,
    ) -> Result<NotificationRequest, DispatcherError> {
        let sql = r#"
        insert into notification_requests
            (id, tokens, payload, created_at)
        values
            ($1, $2, $3, $4)
        returning *
        "#;

        sqlx::query_as(sql)
            .bind(request.id)
            .bind(request.tokens)
            .bind(request.payload)
            .bind(request.created_at)
            .fetch_one(postgres_pool)
            .await
            .map_err(|error| DispatcherError::new(&error.to_string(), &format!("Failed to insert notification request id={}", request.id)))
    }

    pub async fn find(
        postgres_pool: &Pool<Postgres>,
        request_id: Uuid,
    ) -> Result<Option<NotificationRequest>, DispatcherError> {
        sqlx::query_as("select * from notification_requests where id = $1")
            .bind(request_id)
            .fetch_optional(postgres_pool)
            .await
            .map_err(|error| DispatcherError::new(&error.to_string(), &format!("Failed to find notification request id={request_id}")))
    }

    /// Claims up to `limit` requests that were never delivered or whose previous claim expired,
    /// oldest first. Rows claimed by another worker are skipped.
    pub async fn claim(
        postgres_pool: &Pool<Postgres>,
        lock_id: Uuid,
        limit: i32,
        max_in_flight_interval_in_seconds: u64,
    ) -> Result<Vec<NotificationRequest>, DispatcherError> {
        let processing_until_increment_interval = format!("{max_in_flight_interval_in_seconds} seconds");

        let sql = r#"
        with candidates as (
            select r.id
            from notification_requests r
            left join notification_request_lock l on l.request_id = r.id
            where r.processed = false
                and (l.request_id is null or (l.processed_at is null and l.processing_until < now()))
            order by r.created_at
            limit $1
            for update of r skip locked
        ),
        claimed as (
            insert into notification_request_lock (request_id, lock_id, processing_until)
            select id, $2, now() + ($3)::interval
            from candidates
            on conflict (request_id) do update
                set lock_id = excluded.lock_id, processing_until = excluded.processing_until
                where notification_request_lock.processed_at is null and notification_request_lock.processing_until < now()
            returning request_id
        )
        select r.*
        from notification_requests r
        inner join claimed c on c.request_id = r.id
        order by r.created_at
        "#;

        sqlx::query_as(sql)
            .bind(limit)
            .bind(lock_id)
            .bind(processing_until_increment_interval)
            .fetch_all(postgres_pool)
            .await
            .map_err(|error| DispatcherError::new(&error.to_string(), "Failed to claim notification requests"))
    }

    pub async fn acknowledge(
        postgres_pool: &Pool<Postgres>,
        lock_id: Uuid,
        request_ids: &[Uuid],
    ) -> Result<(), DispatcherError> {
        if request_ids.is_empty() {
            return Ok(());
        }

        let sql = r#"
        update notification_request_lock
        set processed_at = now()
        where request_id = ANY($1) and lock_id = $2
        "#;

        sqlx::query(sql)
            .bind(request_ids.to_vec())
            .bind(lock_id)
            .execute(postgres_pool)
            .await
            .map_err(|error| DispatcherError::new(&error.to_string(), "Failed to acknowledge notification requests"))?;

        Ok(())
    }

    /// Fields absent from `result` keep their stored value.
    pub async fn apply_result(
        postgres_pool: &Pool<Postgres>,
        request_id: Uuid,
        result: &ProcessingResult,
    ) -> Result<(), DispatcherError> {
        let sql = r#"
        update notification_requests
        set processed = $2,
            processed_at = now(),
            results = coalesce($3, results),
            success_count = $4,
            total_tokens = coalesce($5, total_tokens),
            error = coalesce($6, error)
        where id = $1
        "#;

        let updated = sqlx::query(sql)
            .bind(request_id)
            .bind(result.processed)
            .bind(result.results.clone().map(Json))
            .bind(result.success_count)
            .bind(result.total_tokens)
            .bind(result.error.clone())
            .execute(postgres_pool)
            .await
            .map_err(|error| DispatcherError::new(&error.to_string(), &format!("Failed to update notification request id={request_id}")))?;

        if updated.rows_affected() == 0 {
            return Err(DispatcherError::new(
                "notification request not found",
                &format!("Failed to update notification request id={request_id}"),
            ));
        }

        Ok(())
    }
}
