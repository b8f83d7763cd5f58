pub mod board;
pub mod config;
pub mod device;
pub mod search;

use serde::Serialize;

use crate::models::board::Board;
use crate::models::config::ClientConfig;

/// Response body of `/configuration`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationResponse {
    pub config: ClientConfig,
    pub sound_boards: Vec<Board>,
}
