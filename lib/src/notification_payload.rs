use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
}

/// Content shared by every token of a request.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NotificationPayload {
    pub notification: NotificationContent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,
}

impl NotificationPayload {
    pub fn new(
        title: &str,
        body: &str,
    ) -> Self {
        Self {
            notification: NotificationContent {
                title: title.to_string(),
                body: body.to_string(),
            },
            data: None,
        }
    }

    pub fn with_data(
        self,
        data: HashMap<String, String>,
    ) -> Self {
        Self { data: Some(data), ..self }
    }
}
