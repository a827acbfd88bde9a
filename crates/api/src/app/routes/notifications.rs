use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::IntoResponse,
    routing::{get, put},
};
use serde::Serialize;

use firefleet_auth::Permission;
use firefleet_core::NotificationId;
use firefleet_core::model::Notification;
use firefleet_store::Query;

use crate::app::dto::parse_id;
use crate::app::errors::{ApiError, ApiResult};
use crate::app::services::{AppServices, notification_sse_stream};
use crate::authz::require;
use crate::context::CurrentUser;

/// Most notifications returned by a single listing.
const LIST_LIMIT: usize = 100;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_notifications))
        .route("/stream", get(stream_notifications))
        .route("/read-all", put(mark_all_read))
        .route("/:id/read", put(mark_read))
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

pub async fn list_notifications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Notification>>> {
    require(&user, &Permission::NOTIFICATIONS_MANAGE)?;
    let me = user.id();
    let query = Query::all()
        .filter(move |n: &Notification| n.user_id == me)
        .newest_first()
        .limit(LIST_LIMIT);
    Ok(Json(services.db.notifications.find(&query).await?))
}

/// Other users' notifications read as missing.
pub async fn mark_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Notification>> {
    require(&user, &Permission::NOTIFICATIONS_MANAGE)?;
    let id: NotificationId = parse_id(&id, "notification")?;
    let owned = services
        .db
        .notifications
        .get(id)
        .await?
        .is_some_and(|n| n.user_id == user.id());
    if !owned {
        return Err(ApiError::not_found("notification"));
    }

    let change = services
        .db
        .notifications
        .update(id, Box::new(|n| {
            n.read = true;
            Ok(())
        }))
        .await?
        .ok_or_else(|| ApiError::not_found("notification"))?;
    Ok(Json(change.after))
}

pub async fn mark_all_read(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<MarkAllReadResponse>> {
    require(&user, &Permission::NOTIFICATIONS_MANAGE)?;
    let me = user.id();
    let unread = services
        .db
        .notifications
        .find(&Query::all().filter(move |n: &Notification| n.user_id == me && !n.read))
        .await?;

    let mut updated = 0;
    for notification in unread {
        let change = services
            .db
            .notifications
            .update(notification.id, Box::new(|n| {
                n.read = true;
                Ok(())
            }))
            .await?;
        if change.is_some_and(|c| !c.before.read) {
            updated += 1;
        }
    }
    tracing::debug!(user_id = %me, updated, "notifications marked read");
    Ok(Json(MarkAllReadResponse { updated }))
}

/// Server-sent events for notifications created after the stream opens.
pub async fn stream_notifications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<impl IntoResponse> {
    require(&user, &Permission::NOTIFICATIONS_MANAGE)?;
    Ok(notification_sse_stream(services, user.id()))
}
