mod common;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use api_ingress::{ApiIngress, ApiIngressConfig};
use events::config::EventsConfig;
use events::Events;

async fn app_with(cfg: EventsConfig) -> Router {
    let module = common::module(common::memory_db().await, cfg);
    let api = module
        .register_rest(Router::new())
        .expect("register routes");
    ApiIngress::new(ApiIngressConfig {
        enable_docs: true,
        ..Default::default()
    })
    .build_router(api, Some(Events::openapi()))
    .expect("build router")
}

async fn app() -> Router {
    app_with(EventsConfig::default()).await
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.expect("request");
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn event_body(title: &str, town: &str, date: &str, tags: &[&str]) -> Value {
    json!({
        "title": title,
        "town": town,
        "date": date,
        "venue": "Village Hall",
        "description": "All welcome",
        "tags": tags,
    })
}

#[tokio::test]
async fn create_event_returns_201_with_read_view() {
    let app = app().await;

    let mut body = event_body("Food fair", "Otley", "2026-05-20T19:00:00Z", &["Food", "food", "FOOD "]);
    body["price"] = json!("10");
    let (status, created) = send(&app, post_json("/events", body)).await;

    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["title"], "Food fair");
    assert_eq!(created["price"], "10.00");
    assert_eq!(created["tagNames"], json!(["food"]));
    assert!(created["photo"].is_null());
    assert!(created.get("tags").is_none());

    let id = created["id"].as_str().unwrap();
    let (status, fetched) = send(&app, get(&format!("/events/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn legacy_create_path_behaves_the_same() {
    let app = app().await;
    let mut body = event_body("Quiz", "York", "2026-04-01", &[]);
    body["price"] = json!(3.5);

    let (status, created) = send(&app, post_json("/events/create", body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["price"], "3.50");
    assert_eq!(created["tagNames"], json!([]));
}

#[tokio::test]
async fn legacy_create_path_rejects_get_with_json_405() {
    let app = app().await;
    let (status, body) = send(&app, get("/events/create")).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "error": "Method not allowed" }));
}

#[tokio::test]
async fn invalid_fields_are_reported_together() {
    let app = app().await;

    let mut body = event_body("Bad", "Leeds", "2026-01-01", &["music"]);
    body["price"] = json!(-5);
    body.as_object_mut().unwrap().remove("title");

    let (status, err) = send(&app, post_json("/events", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["error"].is_string());
    assert!(err["errors"]["price"].is_array());
    assert_eq!(err["errors"]["title"], json!(["This field is required."]));

    let (_, listed) = send(&app, get("/events")).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn malformed_bodies_are_bad_requests() {
    let app = app().await;

    let mut body = event_body("Gig", "Leeds", "2026-01-01", &[]);
    body["organiser"] = json!("me");
    let (status, err) = send(&app, post_json("/events", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(err["errors"]["body"].is_array());

    let req = Request::post("/events")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = Request::post("/events")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("title=Gig"))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_event_is_404_with_message() {
    let app = app().await;
    let (status, body) = send(
        &app,
        get("/events/5f0c4c1e-8d3b-4a8e-9a55-0d6b2b0f1c11"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Event not found" }));
}

#[tokio::test]
async fn malformed_event_id_is_400() {
    let app = app().await;
    let (status, body) = send(&app, get("/events/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["id"].is_array());
}

#[tokio::test]
async fn listing_filters_by_town_and_tag() {
    let app = app().await;
    for (title, town, date, tags) in [
        ("Gig", "Leeds", "2026-03-01", vec!["music"]),
        ("Walk", "York", "2026-03-02", vec!["outdoors"]),
        ("Choir", "leeds", "2026-03-03", vec!["music", "community"]),
    ] {
        let (status, _) = send(&app, post_json("/events", event_body(title, town, date, &tags))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let titles = |v: Value| -> Vec<String> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|e| e["title"].as_str().unwrap().to_string())
            .collect()
    };

    let (status, all) = send(&app, get("/events")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(all), vec!["Choir", "Walk", "Gig"]);

    let (_, leeds) = send(&app, get("/events?town=LEEDS")).await;
    assert_eq!(titles(leeds), vec!["Choir", "Gig"]);

    let (_, tagged) = send(&app, get("/events?tag=Outdoors,community")).await;
    assert_eq!(titles(tagged), vec!["Choir", "Walk"]);

    let (_, none) = send(&app, get("/events?town=York&tag=music")).await;
    assert_eq!(none, json!([]));
}

#[tokio::test]
async fn tags_endpoint_lists_names_alphabetically() {
    let app = app().await;
    send(&app, post_json("/events", event_body("A", "Leeds", "2026-01-01", &["Zumba", "art"]))).await;
    send(&app, post_json("/events", event_body("B", "Leeds", "2026-01-02", &["ART"]))).await;

    let (status, tags) = send(&app, get("/tags")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags, json!(["art", "zumba"]));
}

#[tokio::test]
async fn photo_references_become_urls() {
    let app = app_with(EventsConfig {
        media_base_url: "https://cdn.example.org/media".into(),
        ..Default::default()
    })
    .await;

    let mut body = event_body("Gallery", "Leeds", "2026-01-01", &[]);
    body["photo"] = json!("event_photos/gallery.jpg");
    let (_, created) = send(&app, post_json("/events", body)).await;
    assert_eq!(
        created["photo"],
        "https://cdn.example.org/media/event_photos/gallery.jpg"
    );

    let mut body = event_body("Remote", "Leeds", "2026-01-01", &[]);
    body["photo"] = json!("https://images.example.com/a.png");
    let (_, created) = send(&app, post_json("/events", body)).await;
    assert_eq!(created["photo"], "https://images.example.com/a.png");
}

#[tokio::test]
async fn openapi_document_is_served() -> Result<()> {
    let app = app().await;
    let (status, doc) = send(&app, get("/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(doc["info"]["title"], "The Commons API");
    assert!(doc["paths"]["/events/{id}"]["get"].is_object());
    Ok(())
}
