use axum::extract::State;
use axum::Json;

use crate::error::AppError;
use crate::models::ConfigurationResponse;
use crate::state::AppState;

pub async fn get_configuration(
    state: State<AppState>,
) -> Result<Json<ConfigurationResponse>, AppError> {
    let sound_boards = state.repository.list_boards().await?;
    Ok(Json(ConfigurationResponse {
        config: (*state.client_config).clone(),
        sound_boards,
    }))
}
