//! Notification feed endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use domain::{Audience, Entity, Notification};
use record_store::RecordStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

use super::{AppState, parse_entity_id};

// -- Request types --

#[derive(Deserialize)]
pub struct NotificationQuery {
    /// Either "admin" or "customer".
    pub audience: String,
}

// -- Response types --

#[derive(Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub kind: String,
    pub audience: String,
    pub order_id: String,
    pub customer_id: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: String,
}

impl From<&Notification> for NotificationResponse {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id().to_string(),
            kind: notification.notification_kind().to_string(),
            audience: notification.audience().to_string(),
            order_id: notification.order_id().to_string(),
            customer_id: notification.customer_id().to_string(),
            message: notification.message().to_string(),
            is_read: notification.is_read(),
            created_at: notification.created_at().to_rfc3339(),
        }
    }
}

fn parse_audience(audience: &str) -> Result<Audience, ApiError> {
    match audience {
        "admin" => Ok(Audience::Admin),
        "customer" => Ok(Audience::Customer),
        other => Err(ApiError::BadRequest(format!("Unknown audience: {other}"))),
    }
}

// -- Handlers --

/// GET /notifications?audience= — list notifications for an audience.
#[tracing::instrument(skip(state, query))]
pub async fn list<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let audience = parse_audience(&query.audience)?;
    let notifications = state.notifier.list_for_audience(audience).await?;
    Ok(Json(notifications.iter().map(Into::into).collect()))
}

/// POST /notifications/:id/read — flag a notification as read.
#[tracing::instrument(skip(state))]
pub async fn mark_read<S: RecordStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let notification_id = parse_entity_id(&id)?;
    let notification = state.notifier.mark_read(notification_id).await?;
    Ok(Json((&notification).into()))
}
