use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::config::{ButtonMapping, ClientConfig};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DEVICE_URL: &str = "http://192.168.0.124";
pub const DEFAULT_SEARCH_URL: &str = "https://www.myinstants.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub storage_path: PathBuf,
    pub device_url: String,
    pub search_url: String,
    pub search_timeout: Duration,
    pub device_timeout: Duration,
    pub download_timeout: Duration,
    pub upload_timeout: Duration,
    pub buttons: Vec<ButtonMapping>,
    pub web_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let storage_path = std::env::var("ESB_STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./mp3"));

        let buttons = std::env::var("ESB_BUTTONS_FILE")
            .ok()
            .map(|path| load_buttons(Path::new(&path)))
            .unwrap_or_default();

        Self {
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            storage_path,
            device_url: trimmed_url("ESB_DEVICE_URL", DEFAULT_DEVICE_URL),
            search_url: trimmed_url("ESB_SEARCH_URL", DEFAULT_SEARCH_URL),
            search_timeout: secs_from_env("ESB_SEARCH_TIMEOUT_SECS", 10),
            device_timeout: secs_from_env("ESB_DEVICE_TIMEOUT_SECS", 10),
            download_timeout: secs_from_env("ESB_DOWNLOAD_TIMEOUT_SECS", 300),
            upload_timeout: secs_from_env("ESB_UPLOAD_TIMEOUT_SECS", 300),
            buttons,
            web_dir: std::env::var("ESB_WEB_DIR").ok().map(PathBuf::from),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            device_url: self.device_url.clone(),
            esp32_ip: device_host(&self.device_url),
            buttons_mapping: self.buttons.clone(),
        }
    }
}

/// `host[:port]` of a device URL; an unparseable value is passed through.
fn device_host(device_url: &str) -> String {
    let Ok(url) = reqwest::Url::parse(device_url) else {
        return device_url.to_string();
    };
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => device_url.to_string(),
    }
}

fn trimmed_url(var: &str, default: &str) -> String {
    std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn secs_from_env(var: &str, default: u64) -> Duration {
    let secs = std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

/// Read the button mapping JSON file. Failures are logged and yield no buttons.
pub fn load_buttons(path: &Path) -> Vec<ButtonMapping> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("failed to read buttons file {:?}: {e}", path);
            return Vec::new();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(buttons) => buttons,
        Err(e) => {
            tracing::warn!("invalid buttons file {:?}: {e}", path);
            Vec::new()
        }
    }
}
