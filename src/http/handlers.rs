use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::discovery::ActiveTarget;
use crate::http::server::AppState;

/// Content type of the Prometheus text exposition format.
pub const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Serialize)]
pub struct TargetList {
    pub count: usize,
    pub targets: Vec<ActiveTarget>,
}

pub async fn get_metrics(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)],
        state.metrics.render(),
    )
}

pub async fn get_healthz() -> &'static str {
    "ok"
}

pub async fn get_targets(State(state): State<AppState>) -> Json<TargetList> {
    let targets = state.fleet.targets();
    Json(TargetList {
        count: targets.len(),
        targets,
    })
}
