use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    routing::get,
};
use chrono::Utc;

use firefleet_auth::Permission;
use firefleet_core::RequestId;
use firefleet_core::model::{
    NewNotification, NewRequest, NotificationKind, Request, RequestResponse,
};
use firefleet_store::Query;

use crate::app::dto::{Payload, parse_id};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::routes::fetch;
use crate::app::services::AppServices;
use crate::authz::require;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_requests).post(create_request))
        .route("/:id", get(get_request).put(respond_request))
}

pub async fn create_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Payload(body): Payload<NewRequest>,
) -> ApiResult<(StatusCode, Json<Request>)> {
    require(&user, &Permission::REQUESTS_CREATE)?;
    body.validate()?;
    let target = services.db.users.get(body.target_manager_id).await?;
    if !target.is_some_and(|t| t.is_manager()) {
        return Err(ApiError::bad_request("target_manager_id must refer to a manager"));
    }

    let request = services
        .db
        .requests
        .insert(body.into_request(user.id(), Utc::now()))
        .await?;

    let notification = NewNotification::new(
        NotificationKind::Request,
        "New request",
        format!("{} sent a request: {}", user.user().name, request.title),
    )
    .related(request.id);
    services.notify(request.target_manager_id, &notification).await?;

    Ok((StatusCode::CREATED, Json(request)))
}

/// Managers see requests addressed to them; drivers see the ones they sent.
pub async fn list_requests(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Request>>> {
    let me = user.id();
    let query = if user.is_manager() {
        Query::all().filter(move |r: &Request| r.target_manager_id == me)
    } else {
        Query::all().filter(move |r: &Request| r.requester_id == me)
    };
    Ok(Json(services.db.requests.find(&query.newest_first()).await?))
}

pub async fn get_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Request>> {
    let id: RequestId = parse_id(&id, "request")?;
    let request = fetch(services.db.requests.as_ref(), id, "request").await?;
    if !request.involves(user.id()) {
        return Err(ApiError::not_found("request"));
    }
    Ok(Json(request))
}

/// Approve or reject a request. Only the addressed manager may answer, and
/// only once.
pub async fn respond_request(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Payload(answer): Payload<RequestResponse>,
) -> ApiResult<Json<Request>> {
    require(&user, &Permission::REQUESTS_RESPOND)?;
    let id: RequestId = parse_id(&id, "request")?;

    let existing = fetch(services.db.requests.as_ref(), id, "request").await?;
    if existing.target_manager_id != user.id() {
        return Err(ApiError::forbidden("only the addressed manager can respond"));
    }

    let change = services
        .db
        .requests
        .update(id, Box::new(move |r| r.respond(&answer, Utc::now())))
        .await?
        .ok_or_else(|| ApiError::not_found("request"))?;
    let request = change.after;
    tracing::info!(request_id = %request.id, status = %request.status, "request answered");

    let notification = NewNotification::new(
        NotificationKind::Request,
        format!("Request {}", request.status),
        format!("Your request \"{}\" was {}", request.title, request.status),
    )
    .related(request.id);
    services.notify(request.requester_id, &notification).await?;

    Ok(Json(request))
}
