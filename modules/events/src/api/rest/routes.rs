use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use utoipa::OpenApi;

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

#[derive(OpenApi)]
#[openapi(
    info(title = "The Commons API", description = "Community events and tags"),
    paths(
        handlers::list_events,
        handlers::get_event,
        handlers::create_event,
        handlers::create_event_legacy,
        handlers::list_tags
    ),
    components(schemas(dto::EventDto, dto::CreateEventReq, dto::ErrorBody)),
    tags(
        (name = "events", description = "Event listing and creation"),
        (name = "tags", description = "Canonical tag names")
    )
)]
pub struct EventsApiDoc;

pub fn openapi() -> utoipa::openapi::OpenApi {
    EventsApiDoc::openapi()
}

pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    router
        .route(
            "/events",
            get(handlers::list_events).post(handlers::create_event),
        )
        .route("/events/create", post(handlers::create_event_legacy))
        .route("/events/{id}", get(handlers::get_event))
        .route("/tags", get(handlers::list_tags))
        .layer(Extension(service))
}
