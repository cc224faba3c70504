// src/models/notification.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Represents the 'notification_logs' table: one row per admin-sent email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationLog {
    pub id: String,
    pub to_email: String,
    pub subject: String,
    pub notification_type: String,
    pub sent_by: String,
    pub sent_at: DateTime<Utc>,
    pub status: String,
}

fn general() -> String {
    "general".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendNotificationRequest {
    #[validate(email)]
    pub to_email: String,
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 20000))]
    pub body: String,
    #[serde(default = "general")]
    #[validate(length(min = 1, max = 50))]
    pub notification_type: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BroadcastRequest {
    #[validate(length(min = 1, max = 200))]
    pub subject: String,
    #[validate(length(min = 1, max = 20000))]
    pub body: String,
    #[serde(default = "general")]
    #[validate(length(min = 1, max = 50))]
    pub notification_type: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TestNotificationRequest {
    #[validate(email)]
    pub test_email: String,
}

#[derive(Debug, Serialize)]
pub struct BroadcastResponse {
    pub message: String,
    pub sent_count: usize,
    pub failed_count: usize,
}
