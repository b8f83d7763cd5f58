use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::models::board::SetSlotQuery;
use crate::state::AppState;

pub async fn get_local_file(
    state: State<AppState>,
    Path((board, file)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let (size, stream) = state.repository.get_file_stream(&board, &file).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "audio/mp3".to_string()),
            (header::CONTENT_LENGTH, size.to_string()),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}

pub async fn set_new_local_file(
    state: State<AppState>,
    Path((board, slot)): Path<(String, u32)>,
    Query(query): Query<SetSlotQuery>,
) -> Result<&'static str, AppError> {
    state
        .repository
        .set_slot_from_url(&board, slot, &query.url)
        .await?;
    Ok("Ok")
}

pub async fn upload_to_esp(
    state: State<AppState>,
    Path((board, slot)): Path<(String, u32)>,
) -> Result<&'static str, AppError> {
    state
        .repository
        .push_slot_to_device(&board, slot, &state.device)
        .await?;
    Ok("Ok")
}
