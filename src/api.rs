//! HTTP API endpoints.
//!
//! One health endpoint next to the WebSocket route, used by container
//! orchestration and quick smoke checks.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::hub::Hub;

/// Response structure for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub connections: usize,
}

/// Report process liveness and the current connection count.
///
/// GET /healthz
pub async fn healthz(State(hub): State<Arc<Hub>>) -> Json<Health> {
    Json(Health {
        status: "ok",
        connections: hub.connection_count().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_healthz_reports_connection_count() {
        let hub = Arc::new(Hub::new(None));
        let Json(health) = healthz(State(hub)).await;

        assert_eq!(health.status, "ok");
        assert_eq!(health.connections, 0);
    }
}
