use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query,
    },
    http::StatusCode,
    response::Json,
    Extension,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::rest::dto::{CreateEventReq, ErrorBody, EventDto, ListEventsQuery};
use crate::api::rest::error::{map_domain_error, ApiError};
use crate::domain::error::DomainError;
use crate::domain::service::Service;

fn log_failure(action: &str, e: &DomainError) {
    match e {
        DomainError::Database { .. } => error!("Failed to {}: {}", action, e),
        _ => warn!("Failed to {}: {}", action, e),
    }
}

/// List every event, newest date first
#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    operation_id = "events.list_events",
    params(ListEventsQuery),
    responses(
        (status = 200, description = "Events ordered by date descending", body = [EventDto]),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn list_events(
    Extension(svc): Extension<Arc<Service>>,
    Query(query): Query<ListEventsQuery>,
) -> Result<Json<Vec<EventDto>>, ApiError> {
    info!("Listing events with query: {:?}", query);

    match svc.list_events(query.into()).await {
        Ok(events) => Ok(Json(
            events
                .into_iter()
                .map(|e| EventDto::from_event(e, &svc))
                .collect(),
        )),
        Err(e) => {
            log_failure("list events", &e);
            Err(map_domain_error(&e))
        }
    }
}

/// Get a specific event by ID
#[utoipa::path(
    get,
    path = "/events/{id}",
    tag = "events",
    operation_id = "events.get_event",
    params(("id" = Uuid, Path, description = "Event UUID")),
    responses(
        (status = 200, description = "Event found", body = EventDto),
        (status = 400, description = "Malformed id", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn get_event(
    Extension(svc): Extension<Arc<Service>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<EventDto>, ApiError> {
    let Path(id) = id?;
    info!("Getting event with id: {}", id);

    match svc.get_event(id).await {
        Ok(event) => Ok(Json(EventDto::from_event(event, &svc))),
        Err(e) => {
            log_failure("get event", &e);
            Err(map_domain_error(&e))
        }
    }
}

/// Create a new event
#[utoipa::path(
    post,
    path = "/events",
    tag = "events",
    operation_id = "events.create_event",
    request_body = CreateEventReq,
    responses(
        (status = 201, description = "Created event", body = EventDto),
        (status = 400, description = "Field-keyed validation errors", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn create_event(
    Extension(svc): Extension<Arc<Service>>,
    body: Result<Json<CreateEventReq>, JsonRejection>,
) -> Result<(StatusCode, Json<EventDto>), ApiError> {
    let Json(req_body) = body.inspect_err(|r| warn!("Rejected event body: {}", r.body_text()))?;
    info!("Creating event: {:?}", req_body.title);

    match svc.create_event(req_body.into()).await {
        Ok(event) => Ok((StatusCode::CREATED, Json(EventDto::from_event(event, &svc)))),
        Err(e) => {
            log_failure("create event", &e);
            Err(map_domain_error(&e))
        }
    }
}

/// Create a new event (path used by the web client)
#[utoipa::path(
    post,
    path = "/events/create",
    tag = "events",
    operation_id = "events.create_event_legacy",
    request_body = CreateEventReq,
    responses(
        (status = 201, description = "Created event", body = EventDto),
        (status = 400, description = "Field-keyed validation errors", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn create_event_legacy(
    svc: Extension<Arc<Service>>,
    body: Result<Json<CreateEventReq>, JsonRejection>,
) -> Result<(StatusCode, Json<EventDto>), ApiError> {
    create_event(svc, body).await
}

/// Names of every known tag, alphabetically
#[utoipa::path(
    get,
    path = "/tags",
    tag = "tags",
    operation_id = "events.list_tags",
    responses(
        (status = 200, description = "Tag names", body = [String]),
        (status = 500, description = "Internal Server Error", body = ErrorBody)
    )
)]
pub async fn list_tags(
    Extension(svc): Extension<Arc<Service>>,
) -> Result<Json<Vec<String>>, ApiError> {
    match svc.list_tags().await {
        Ok(tags) => Ok(Json(tags.into_iter().map(|t| t.name).collect())),
        Err(e) => {
            log_failure("list tags", &e);
            Err(map_domain_error(&e))
        }
    }
}
