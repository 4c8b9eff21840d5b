use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::{error::Result, AppState};

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>> {
    state.db_manager.health_check().await?;

    Ok(Json(json!({
        "status": "healthy",
        "app": state.app_name,
        "version": state.version,
        "timestamp": chrono::Utc::now().timestamp(),
    })))
}
