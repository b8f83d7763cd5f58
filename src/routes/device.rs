use axum::extract::{Path, State};
use axum::Json;

use crate::error::AppError;
use crate::models::device::DeviceInfo;
use crate::state::AppState;

pub async fn info(state: State<AppState>) -> Result<Json<DeviceInfo>, AppError> {
    let info = state
        .device
        .info()
        .await
        .map_err(|e| AppError::Device(e.to_string()))?;
    Ok(Json(info))
}

pub async fn play(
    state: State<AppState>,
    Path(slot): Path<u32>,
) -> Result<&'static str, AppError> {
    state
        .device
        .play(slot)
        .await
        .map_err(|e| AppError::Device(e.to_string()))?;
    Ok("Ok")
}

pub async fn restart(state: State<AppState>) -> Result<&'static str, AppError> {
    state
        .device
        .restart()
        .await
        .map_err(|e| AppError::Device(e.to_string()))?;
    tracing::info!("device restart requested");
    Ok("Ok")
}
