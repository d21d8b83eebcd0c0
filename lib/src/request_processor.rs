use crate::app_state::{AppState, DEFAULT_EXECUTION_INTERVAL_IN_SECONDS};
use crate::dispatcher_resources::DispatcherResources;
use crate::error::DispatcherError;
use crate::notification_request_repository::NotificationRequestRepository;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Polls `notification_requests` for newly created rows and hands each one to the dispatcher.
pub struct NotificationRequestProcessor {
    resources: DispatcherResources,
    signal: Option<Box<dyn Future<Output = ()> + Send>>,
}

impl NotificationRequestProcessor {
    pub fn new(resources: DispatcherResources) -> Self {
        Self { resources, signal: None }
    }

    pub fn with_graceful_shutdown(
        self,
        signal: impl Future<Output = ()> + Send + 'static,
    ) -> Self {
        Self {
            resources: self.resources,
            signal: Some(Box::new(signal)),
        }
    }

    /// Runs batches until the shutdown signal fires. A batch that has started always runs to its
    /// write-back and acknowledgement; the signal only interrupts the wait between batches.
    pub async fn init(self) -> Result<(), DispatcherError> {
        info!("Starting notification request processor...");

        self.resources.validate()?;

        let idle_interval = Duration::from_secs(self.resources.execution_interval_in_seconds.unwrap_or(DEFAULT_EXECUTION_INTERVAL_IN_SECONDS));

        let mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>> = match self.signal {
            Some(signal) => Box::into_pin(signal),
            None => Box::pin(std::future::pending()),
        };

        info!("Running notification request processor...");
        loop {
            if Self::shutdown_requested(&mut shutdown_signal).await {
                break;
            }

            let idle = match Self::one_shot(&self.resources).await {
                Ok(claimed_len) => claimed_len == 0,
                Err(error) => {
                    error!("Notification request processor failed with error: {}", error);
                    true
                },
            };

            if idle {
                tokio::select! {
                    _ = &mut shutdown_signal => break,
                    _ = tokio::time::sleep(idle_interval) => {},
                }
            }
        }

        info!("Notification request processor stopped!");

        Ok(())
    }

    /// Polls the signal once without waiting. The first poll is also what installs the signal
    /// handlers, so it happens before the first batch is claimed.
    async fn shutdown_requested(shutdown_signal: &mut Pin<Box<dyn Future<Output = ()> + Send>>) -> bool {
        tokio::select! {
            biased;
            _ = shutdown_signal => true,
            _ = std::future::ready(()) => false,
        }
    }

    /// Claims a batch of requests, dispatches them concurrently and acknowledges the ones whose
    /// dispatch ran to completion. Returns the number of claimed requests.
    #[instrument(skip_all)]
    pub async fn one_shot(resources: &DispatcherResources) -> Result<usize, DispatcherError> {
        let app_state = AppState::new(resources);
        let lock_id = Uuid::now_v7();

        let requests = NotificationRequestRepository::claim(
            &app_state.postgres_pool,
            lock_id,
            i32::try_from(app_state.request_query_limit).unwrap_or(i32::MAX),
            app_state.max_in_flight_interval_in_seconds,
        )
        .await?;

        let claimed_len = requests.len();
        if claimed_len == 0 {
            return Ok(0);
        }

        info!("Claimed {} notification requests", claimed_len);

        let mut tasks = JoinSet::new();
        for request in requests {
            let dispatcher = app_state.dispatcher.clone();
            tasks.spawn(async move {
                dispatcher.dispatch(&request).await;
                request.id
            });
        }

        let mut dispatched_ids = Vec::with_capacity(claimed_len);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(request_id) => dispatched_ids.push(request_id),
                Err(join_error) => error!("Notification request dispatch ended abnormally and will be redelivered: {}", join_error),
            }
        }

        NotificationRequestRepository::acknowledge(&app_state.postgres_pool, lock_id, &dispatched_ids).await?;

        Ok(claimed_len)
    }
}
