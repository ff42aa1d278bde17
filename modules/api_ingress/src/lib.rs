//! HTTP host for the Commons server.
//!
//! Owns the outer router (health check, docs, fallback), the global middleware
//! stack, and the serve loop. Domain modules hand in their routes as a plain
//! `axum::Router` plus an optional OpenAPI document.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{middleware::from_fn, routing::get, Router};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};

mod config;
pub mod request_id;
mod web;

pub use config::ApiIngressConfig;

pub struct ApiIngress {
    config: ApiIngressConfig,
}

impl Default for ApiIngress {
    fn default() -> Self {
        Self::new(ApiIngressConfig::default())
    }
}

impl ApiIngress {
    /// Key of this module's section under `modules`.
    pub const NAME: &'static str = "api_ingress";

    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config,
        }
    }

    /// Wrap module routes with host endpoints and the global middleware stack.
    ///
    /// Request flow (outermost first):
    /// CORS -> BodyLimit -> SetRequestId -> PropagateRequestId -> Trace -> push_req_id -> Timeout -> handler
    pub fn build_router(
        &self,
        api: Router,
        openapi: Option<utoipa::openapi::OpenApi>,
    ) -> Result<Router> {
        let config = &self.config;
        let mut router = Router::new()
            .route("/health", get(web::health_check))
            .route("/healthz", get(|| async { "ok" }))
            .merge(api);

        if config.enable_docs {
            match openapi {
                Some(doc) => {
                    let value = Arc::new(
                        serde_json::to_value(&doc).context("Failed to serialize OpenAPI document")?,
                    );
                    tracing::info!(
                        paths = doc.paths.paths.len(),
                        "Serving OpenAPI document at /openapi.json"
                    );
                    router = router
                        .route(
                            "/openapi.json",
                            get({
                                use axum::{http::header, response::IntoResponse};
                                move || {
                                    let v = value.clone();
                                    async move {
                                        (
                                            [(header::CACHE_CONTROL, "no-store")],
                                            axum::Json((*v).clone()),
                                        )
                                            .into_response()
                                    }
                                }
                            }),
                        )
                        .route("/docs", get(web::serve_docs));
                }
                None => tracing::warn!("enable_docs is set but no OpenAPI document was provided"),
            }
        }

        router = router
            .method_not_allowed_fallback(web::method_not_allowed)
            .fallback(web::not_found);

        let x_request_id = request_id::header();
        router = router
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.request_timeout_sec.max(1),
            )))
            .layer(from_fn(request_id::push_req_id_to_extensions))
            .layer(request_id::create_trace_layer())
            .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
            .layer(SetRequestIdLayer::new(x_request_id, request_id::MakeReqId))
            .layer(RequestBodyLimitLayer::new(config.body_limit_bytes));

        if config.cors_enabled {
            router = router.layer(CorsLayer::permissive());
        }

        tracing::debug!("HTTP router built");
        Ok(router)
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener> {
        let cfg = &self.config;
        let addr: SocketAddr = cfg
            .bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid bind address '{}': {}", cfg.bind_addr, e))?;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        tracing::info!("HTTP server bound on {}", listener.local_addr()?);
        Ok(listener)
    }

    /// Serve until `cancel` fires, then drain in-flight requests.
    pub async fn serve(
        &self,
        listener: TcpListener,
        router: Router,
        cancel: CancellationToken,
    ) -> Result<()> {
        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}
