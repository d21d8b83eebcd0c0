use crate::notification_payload::{NotificationContent, NotificationPayload};
use serde::Serialize;
use std::collections::HashMap;

pub const ANDROID_CHANNEL_ID: &str = "chat_messages";
pub const ANDROID_NOTIFICATION_PRIORITY: &str = "PRIORITY_HIGH";
pub const APNS_BADGE: u32 = 1;
pub const APNS_SOUND: &str = "default";

/// One FCM v1 message addressed to a single device token.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub token: String,
    pub notification: NotificationContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, String>>,
    pub android: AndroidConfig,
    pub apns: ApnsConfig,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AndroidConfig {
    pub notification: AndroidNotification,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct AndroidNotification {
    pub channel_id: String,
    pub notification_priority: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ApnsConfig {
    pub payload: ApnsPayload,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ApnsPayload {
    pub aps: Aps,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Aps {
    pub alert: NotificationContent,
    pub badge: u32,
    pub sound: String,
}

#[derive(Serialize, Debug)]
pub struct SendMessageBody<'a> {
    pub message: &'a PushMessage,
}

impl PushMessage {
    pub fn new(
        token: &str,
        payload: &NotificationPayload,
    ) -> Self {
        Self {
            token: token.to_string(),
            notification: payload.notification.clone(),
            data: payload.data.clone(),
            android: AndroidConfig {
                notification: AndroidNotification {
                    channel_id: ANDROID_CHANNEL_ID.to_string(),
                    notification_priority: ANDROID_NOTIFICATION_PRIORITY.to_string(),
                },
            },
            apns: ApnsConfig {
                payload: ApnsPayload {
                    aps: Aps {
                        alert: payload.notification.clone(),
                        badge: APNS_BADGE,
                        sound: APNS_SOUND.to_string(),
                    },
                },
            },
        }
    }
}
