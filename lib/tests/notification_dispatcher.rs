
#[cfg(test)]
mod test {
    use crate::commons::{DefaultData, FcmMock, InMemoryRecordStore, ScriptedPushGateway, TestContext};
    use notification_request_dispatcher::delivery::DeliveryOutcome;
    use notification_request_dispatcher::notification_dispatcher::{DispatchOutcome, NotificationDispatcher};
    use notification_request_dispatcher::notification_request::NotificationRequest;
    use notification_request_dispatcher::processing_result::ProcessingResult;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use test_context::test_context;

    fn dispatcher(
        push_gateway: &Arc<ScriptedPushGateway>,
        record_store: &Arc<InMemoryRecordStore>,
    ) -> NotificationDispatcher {
        NotificationDispatcher::new(push_gateway.clone(), record_store.clone())
    }

    #[tokio::test]
    async fn should_send_to_every_token_and_write_back_tally() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let push_gateway = Arc::new(ScriptedPushGateway::new());
        let record_store = Arc::new(InMemoryRecordStore::new());
        let request = NotificationRequest::with_tokens(&["t1", "t2"], &DefaultData::payload());

        let outcome = dispatcher(&push_gateway, &record_store).dispatch(&request).await;

        let expected = ProcessingResult {
            processed: true,
            results: Some(vec![
                DeliveryOutcome {
                    token: "t1...".to_string(),
                    success: true,
                    error: None,
                },
                DeliveryOutcome {
                    token: "t2...".to_string(),
                    success: true,
                    error: None,
                },
            ]),
            success_count: 2,
            total_tokens: Some(2),
            error: None,
        };

        assert_eq!(DispatchOutcome::Completed(expected.clone()), outcome);
        assert_eq!(vec![(request.id, expected)], record_store.applied());

        let mut sent_tokens = push_gateway.sent_tokens();
        sent_tokens.sort();
        assert_eq!(vec!["t1".to_string(), "t2".to_string()], sent_tokens);

        Ok(())
    }

    #[tokio::test]
    async fn should_do_nothing_when_tokens_are_empty_or_absent() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let push_gateway = Arc::new(ScriptedPushGateway::new());
        let record_store = Arc::new(InMemoryRecordStore::new());
        let dispatcher = dispatcher(&push_gateway, &record_store);

        let empty = NotificationRequest::with_tokens(&[], &DefaultData::payload());
        let absent = NotificationRequest::new(None, Some(json!({"notification": {"title": "Hi", "body": "There"}})));
        let null = NotificationRequest::new(Some(json!(null)), Some(json!({"notification": {"title": "Hi", "body": "There"}})));

        assert_eq!(DispatchOutcome::Skipped, dispatcher.dispatch(&empty).await);
        assert_eq!(DispatchOutcome::Skipped, dispatcher.dispatch(&absent).await);
        assert_eq!(DispatchOutcome::Skipped, dispatcher.dispatch(&null).await);

        assert!(push_gateway.sent().is_empty());
        assert!(record_store.applied().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn should_skip_request_without_tokens_even_when_payload_is_malformed() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let push_gateway = Arc::new(ScriptedPushGateway::new());
        let record_store = Arc::new(InMemoryRecordStore::new());
        let request = NotificationRequest::new(Some(json!([])), Some(json!("not an object")));

        let outcome = dispatcher(&push_gateway, &record_store).dispatch(&request).await;

        assert_eq!(DispatchOutcome::Skipped, outcome);
        assert!(record_store.applied().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn should_record_per_token_failure() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let push_gateway = Arc::new(ScriptedPushGateway::new().failing("t1", "invalid-token"));
        let record_store = Arc::new(InMemoryRecordStore::new());
        let request = NotificationRequest::with_tokens(&["t1"], &DefaultData::payload());

        let outcome = dispatcher(&push_gateway, &record_store).dispatch(&request).await;

        let expected = ProcessingResult {
            processed: true,
            results: Some(vec![DeliveryOutcome {
                token: "t1...".to_string(),
                success: false,
                error: Some("invalid-token".to_string()),
            }]),
            success_count: 0,
            total_tokens: Some(1),
            error: None,
        };

        assert_eq!(DispatchOutcome::Completed(expected.clone()), outcome);
        assert_eq!(vec![(request.id, expected)], record_store.applied());

        Ok(())
    }

    #[tokio::test]
    async fn should_isolate_failed_token_from_the_others() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let push_gateway = Arc::new(ScriptedPushGateway::new().failing("bad", "registration-token-not-registered"));
        let record_store = Arc::new(InMemoryRecordStore::new());
        let request = NotificationRequest::with_tokens(&["bad", "good1", "good2"], &DefaultData::payload());

        let outcome = dispatcher(&push_gateway, &record_store).dispatch(&request).await;

        let DispatchOutcome::Completed(result) = outcome else {
            panic!("expected a completed dispatch");
        };

        let results = result.results.unwrap();
        assert_eq!(3, results.len());
        assert_eq!(2, result.success_count);
        assert_eq!(Some(3), result.total_tokens);

        assert_eq!("bad...", results[0].token);
        assert!(!results[0].success);
        assert_eq!(Some("registration-token-not-registered".to_string()), results[0].error);
        assert!(results[1].success && results[2].success);

        Ok(())
    }

    #[tokio::test]
    async fn should_keep_tally_consistent_with_results() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let tokens = ["a", "b", "c", "d", "e", "f"];
        let push_gateway = Arc::new(ScriptedPushGateway::new().failing("b", "quota-exceeded").failing("e", "unavailable"));
        let record_store = Arc::new(InMemoryRecordStore::new());
        let request = NotificationRequest::with_tokens(&tokens, &DefaultData::payload());

        let DispatchOutcome::Completed(result) = dispatcher(&push_gateway, &record_store).dispatch(&request).await else {
            panic!("expected a completed dispatch");
        };

        let results = result.results.clone().unwrap();
        assert_eq!(tokens.len(), results.len());
        assert_eq!(4, result.success_count);
        assert_eq!(results.iter().filter(|it| it.success).count() as i32, result.success_count);
        assert!(results.iter().filter(|it| !it.success).all(|it| it.error.as_deref().is_some_and(|error| !error.is_empty())));

        let tokens_in_order = results.iter().map(|it| it.token.clone()).collect::<Vec<_>>();
        assert_eq!(vec!["a...", "b...", "c...", "d...", "e...", "f..."], tokens_in_order);

        Ok(())
    }

    #[tokio::test]
    async fn should_send_duplicated_tokens_once_per_occurrence() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let push_gateway = Arc::new(ScriptedPushGateway::new());
        let record_store = Arc::new(InMemoryRecordStore::new());
        let request = NotificationRequest::with_tokens(&["same", "same", "other"], &DefaultData::payload());

        let DispatchOutcome::Completed(result) = dispatcher(&push_gateway, &record_store).dispatch(&request).await else {
            panic!("expected a completed dispatch");
        };

        assert_eq!(3, push_gateway.sent().len());
        assert_eq!(2, push_gateway.sent_tokens().iter().filter(|it| it.as_str() == "same").count());
        assert_eq!(Some(3), result.total_tokens);
        assert_eq!(3, result.success_count);

        Ok(())
    }

    #[tokio::test]
    async fn should_fail_only_the_token_that_exceeds_the_send_timeout() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let push_gateway = Arc::new(ScriptedPushGateway::new().delayed("slow", Duration::from_secs(5)));
        let record_store = Arc::new(InMemoryRecordStore::new());
        let request = NotificationRequest::with_tokens(&["fast", "slow"], &DefaultData::payload());

        let dispatcher = dispatcher(&push_gateway, &record_store).with_send_timeout(Duration::from_millis(100));

        let DispatchOutcome::Completed(result) = dispatcher.dispatch(&request).await else {
            panic!("expected a completed dispatch");
        };

        let results = result.results.unwrap();
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(Some("delivery timed out after 100ms".to_string()), results[1].error);
        assert_eq!(1, result.success_count);

        Ok(())
    }

    #[tokio::test]
    async fn should_record_outcome_for_token_whose_send_task_panicked() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let push_gateway = Arc::new(ScriptedPushGateway::new().panicking("boom"));
        let record_store = Arc::new(InMemoryRecordStore::new());
        let request = NotificationRequest::with_tokens(&["ok", "boom"], &DefaultData::payload());

        let DispatchOutcome::Completed(result) = dispatcher(&push_gateway, &record_store).dispatch(&request).await else {
            panic!("expected a completed dispatch");
        };

        let results = result.results.unwrap();
        assert_eq!(2, results.len());
        assert!(results[0].success);
        assert_eq!("boom...", results[1].token);
        assert!(!results[1].success);
        assert_eq!(Some("delivery task ended abnormally".to_string()), results[1].error);

        Ok(())
    }

    #[tokio::test]
    async fn should_mark_request_as_failed_when_payload_is_malformed() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let push_gateway = Arc::new(ScriptedPushGateway::new());
        let record_store = Arc::new(InMemoryRecordStore::new());
        let request = NotificationRequest::new(Some(json!(["t1"])), Some(json!({"notification": {"title": "Hi"}})));

        let outcome = dispatcher(&push_gateway, &record_store).dispatch(&request).await;

        let DispatchOutcome::Failed(result) = outcome else {
            panic!("expected a failed dispatch");
        };

        assert!(result.processed);
        assert_eq!(0, result.success_count);
        assert!(result.results.is_none());
        assert!(result.total_tokens.is_none());
        assert!(result.error.as_deref().is_some_and(|error| error.contains("missing field `body`")));

        assert!(push_gateway.sent().is_empty());
        assert_eq!(vec![(request.id, result)], record_store.applied());

        Ok(())
    }

    #[tokio::test]
    async fn should_mark_request_as_failed_when_tokens_are_not_strings() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let push_gateway = Arc::new(ScriptedPushGateway::new());
        let record_store = Arc::new(InMemoryRecordStore::new());
        let request = NotificationRequest::new(Some(json!(["t1", 42])), Some(json!({"notification": {"title": "Hi", "body": "There"}})));

        let outcome = dispatcher(&push_gateway, &record_store).dispatch(&request).await;

        let DispatchOutcome::Failed(result) = outcome else {
            panic!("expected a failed dispatch");
        };

        assert_eq!(Some("Invalid notification request: tokens[1] is not a string".to_string()), result.error);
        assert!(push_gateway.sent().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn should_mark_request_as_failed_when_write_back_fails() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let push_gateway = Arc::new(ScriptedPushGateway::new());
        let record_store = Arc::new(InMemoryRecordStore::rejecting_completed());
        let request = NotificationRequest::with_tokens(&["t1", "t2"], &DefaultData::payload());

        let outcome = dispatcher(&push_gateway, &record_store).dispatch(&request).await;

        let DispatchOutcome::Failed(result) = outcome else {
            panic!("expected a failed dispatch");
        };

        assert_eq!(2, push_gateway.sent().len());
        assert!(result.processed);
        assert_eq!(0, result.success_count);
        assert!(result.results.is_none());
        assert_eq!(
            Some(format!("Failed to update notification request id={}: connection reset by peer", request.id)),
            result.error
        );
        assert_eq!(vec![(request.id, result)], record_store.applied());

        Ok(())
    }

    #[tokio::test]
    async fn should_build_message_with_platform_hints() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let push_gateway = Arc::new(ScriptedPushGateway::new());
        let record_store = Arc::new(InMemoryRecordStore::new());
        let request = NotificationRequest::with_tokens(&["t1"], &DefaultData::payload_with_data());

        dispatcher(&push_gateway, &record_store).dispatch(&request).await;

        let sent = push_gateway.sent();
        assert_eq!(1, sent.len());
        assert_eq!(
            json!({
                "token": "t1",
                "notification": {"title": "Hi", "body": "There"},
                "data": {"chatId": "chat-42"},
                "android": {"notification": {"channel_id": "chat_messages", "notification_priority": "PRIORITY_HIGH"}},
                "apns": {"payload": {"aps": {"alert": {"title": "Hi", "body": "There"}, "badge": 1, "sound": "default"}}}
            }),
            serde_json::to_value(&sent[0])?
        );

        Ok(())
    }

    #[test_context(TestContext)]
    #[tokio::test]
    async fn should_dispatch_through_fcm(ctx: &mut TestContext) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        FcmMock::reject_unregistered(ctx).await;

        let push_gateway = Arc::new(ctx.fcm_gateway());
        let record_store = Arc::new(InMemoryRecordStore::new());
        let request = NotificationRequest::with_tokens(&["stale-device-token-0123456789"], &DefaultData::payload());

        let outcome = NotificationDispatcher::new(push_gateway, record_store.clone()).dispatch(&request).await;

        let expected = ProcessingResult {
            processed: true,
            results: Some(vec![DeliveryOutcome {
                token: "stale-device-token-0...".to_string(),
                success: false,
                error: Some("Requested entity was not found.".to_string()),
            }]),
            success_count: 0,
            total_tokens: Some(1),
            error: None,
        };

        assert_eq!(DispatchOutcome::Completed(expected), outcome);
        assert_eq!(1, record_store.applied().len());

        Ok(())
    }
}
