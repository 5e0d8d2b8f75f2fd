use crate::signaling::{SignalingService, ws_handler};
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use signaller_core::Role;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct HealthReport {
    pub status: &'static str,
    pub connections: usize,
    pub sources: usize,
    pub clients: usize,
    pub rooms: usize,
}

/// `/` and `/ws` upgrade to the signaling socket; `/health` reports live counts.
pub fn router(service: SignalingService) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(service)
}

pub async fn health_handler(State(service): State<SignalingService>) -> Json<HealthReport> {
    let registry = service.registry();
    Json(HealthReport {
        status: "ok",
        connections: registry.len(),
        sources: registry.count_role(Role::Source),
        clients: registry.count_role(Role::Client),
        rooms: service.rooms().len(),
    })
}
