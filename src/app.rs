use std::sync::Arc;

use anyhow::Error;
use axum::{
    Router,
    extract::Request,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use axum_client_ip::ClientIpSource;
use axum_prometheus::{PrometheusMetricLayer, metrics_exporter_prometheus::PrometheusHandle};
use http::StatusCode;
use tower_http::trace::TraceLayer;

use crate::{
    config::AppConfig,
    handlers::{admin, connections, organizations},
    middleware::{
        auth::auth::layer as auth_layer, rate_limiter::rate_limit::layer as ratelimiter_layer,
        request_id::request_id::layer as request_id_layer,
    },
    state::AppState,
    utils::metric_handler::metrics_handler,
};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Prometheus layer and scrape handle when `observability.metrics.enabled`.
/// Installs the global recorder, so call it at most once per process.
pub fn metrics_pair(
    config: &AppConfig,
) -> (Option<PrometheusMetricLayer<'static>>, Option<PrometheusHandle>) {
    if !config.observability.metrics.enabled {
        return (None, None);
    }
    tracing::info!("Metrics reporting is enabled");
    let (layer, handle) = PrometheusMetricLayer::pair();
    (Some(layer), Some(handle))
}

pub fn create_app(state: Arc<AppState>) -> Result<Router, Error> {
    let api_router = Router::new()
        .route(
            "/api/organizations",
            get(organizations::list).post(organizations::create),
        )
        .route(
            "/api/organizations/{org_id}",
            get(organizations::get)
                .patch(organizations::update)
                .delete(organizations::delete),
        )
        .route(
            "/api/organizations/{org_id}/connections",
            get(connections::list),
        )
        .route(
            "/api/organizations/{org_id}/connections/{platform}",
            get(connections::get)
                .put(connections::upsert)
                .delete(connections::delete),
        )
        .route("/api/admin/runtime", get(admin::runtime))
        .route_layer(from_fn_with_state(state.clone(), auth_layer));

    let prometheus_router = Router::new().route("/metrics", get(metrics_handler));

    // Rate limiting wraps auth so rejected credentials still count.
    let router = Router::new()
        .route("/health", get(|| async { (StatusCode::OK, "OK") }))
        .merge(api_router)
        .merge(prometheus_router)
        .route_layer(from_fn_with_state(state.clone(), ratelimiter_layer))
        .with_state(state)
        .layer(ClientIpSource::ConnectInfo.into_extension());

    Ok(router
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::error_span!(
                    "request",
                    id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_layer)))
}
