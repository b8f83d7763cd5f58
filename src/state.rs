use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::device::DeviceClient;
use crate::models::config::ClientConfig;
use crate::search::SearchProvider;
use crate::storage::SoundRepository;

#[derive(Clone)]
pub struct AppState {
    pub repository: SoundRepository,
    pub device: DeviceClient,
    pub search: SearchProvider,
    /// Client used to proxy prelisten requests.
    pub http: Client,
    pub client_config: Arc<ClientConfig>,
    pub web_dir: Option<PathBuf>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let http = Client::builder()
            .timeout(config.download_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("failed to build prelisten client, using defaults: {e}");
                Client::new()
            });

        Self {
            repository: SoundRepository::new(&config.storage_path, config.download_timeout),
            device: DeviceClient::new(
                &config.device_url,
                config.device_timeout,
                config.upload_timeout,
            ),
            search: SearchProvider::new(&config.search_url, config.search_timeout),
            http,
            client_config: Arc::new(config.client_config()),
            web_dir: config.web_dir.clone(),
        }
    }
}
