//! Liveness endpoint.

use axum::Json;
use serde::{Deserialize, Serialize};

/// Body returned by [`health_check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub alive: bool,
}

/// Reports that the process is up. Always `200 OK` with `{"alive": true}`.
pub async fn health_check() -> Json<Health> {
    Json(Health { alive: true })
}
