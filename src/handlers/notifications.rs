// src/handlers/notifications.rs
//
// Admin-only routes; the router wraps them in `admin_middleware`.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        Pagination,
        notification::{
            BroadcastRequest, BroadcastResponse, NotificationLog, SendNotificationRequest,
            TestNotificationRequest,
        },
    },
    notifications::{
        Notification, RenderedEmail,
        templates::template_catalog,
    },
    state::AppState,
    store::Store,
    utils::{html::clean_html, jwt::Claims},
};

/// Admin-authored message. The body is sanitised once and used for both parts.
fn custom_email(subject: &str, body: &str) -> RenderedEmail {
    let body = clean_html(body);
    RenderedEmail {
        subject: subject.to_string(),
        html: body.clone(),
        text: body,
    }
}

/// Sends one custom email and records it in the notification log.
pub async fn send_notification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SendNotificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = custom_email(&payload.subject, &payload.body);
    let delivery = state.mailer.send(&payload.to_email, &email).await;

    let log = NotificationLog {
        id: uuid::Uuid::new_v4().to_string(),
        to_email: payload.to_email,
        subject: payload.subject,
        notification_type: payload.notification_type,
        sent_by: claims.email,
        sent_at: Utc::now(),
        status: if delivery.is_ok() { "sent" } else { "failed" }.to_string(),
    };
    state.store.insert_notification_log(log).await?;

    delivery.map_err(|e| {
        tracing::error!("Failed to send notification: {:#}", e);
        AppError::InternalServerError(format!("Error sending notification: {e:#}"))
    })?;

    Ok(Json(json!({ "message": "Notification sent successfully" })))
}

/// Sends the same email to every roster student.
pub async fn broadcast_notification(
    State(state): State<AppState>,
    Json(payload): Json<BroadcastRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = custom_email(&payload.subject, &payload.body);
    let students = state.store.all_students().await?;

    let (mut sent_count, mut failed_count) = (0, 0);
    for student in &students {
        match state.mailer.send(&student.email, &email).await {
            Ok(()) => sent_count += 1,
            Err(e) => {
                tracing::warn!(to = %student.email, "Broadcast delivery failed: {:#}", e);
                failed_count += 1;
            }
        }
    }

    tracing::info!(
        notification_type = %payload.notification_type,
        sent_count,
        failed_count,
        "Broadcast completed"
    );

    Ok(Json(BroadcastResponse {
        message: format!("Broadcast completed: {sent_count} sent, {failed_count} failed"),
        sent_count,
        failed_count,
    }))
}

pub async fn notification_logs(
    State(store): State<Arc<dyn Store>>,
    Query(page): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(store.list_notification_logs(page).await?))
}

pub async fn notification_templates() -> impl IntoResponse {
    Json(template_catalog())
}

pub async fn test_notification(
    State(state): State<AppState>,
    Json(payload): Json<TestNotificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    state
        .mailer
        .send(&payload.test_email, &Notification::Test.render())
        .await
        .map_err(|e| {
            tracing::error!("Failed to send test notification: {:#}", e);
            AppError::InternalServerError(format!("Error sending test email: {e:#}"))
        })?;

    Ok(Json(json!({ "message": "Test notification sent successfully" })))
}
