use crate::delivery::DeliveryOutcome;
use serde::Serialize;

/// Fields merged onto a request once dispatching ends. `processed_at` is not part of it: the
/// record store assigns it when the update is applied.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<DeliveryOutcome>>,
    pub success_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingResult {
    pub fn completed(results: Vec<DeliveryOutcome>) -> Self {
        let success_count = results.iter().filter(|outcome| outcome.success).count();
        let total_tokens = results.len();

        Self {
            processed: true,
            results: Some(results),
            success_count: to_i32(success_count),
            total_tokens: Some(to_i32(total_tokens)),
            error: None,
        }
    }

    pub fn failed(error: &str) -> Self {
        Self {
            processed: true,
            results: None,
            success_count: 0,
            total_tokens: None,
            error: Some(error.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

fn to_i32(count: usize) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}
