use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::fmt;
use std::time::Duration;

use crate::models::device::DeviceInfo;

#[derive(Debug)]
pub enum DeviceClientError {
    Http(reqwest::Error),
    ServerError { status: u16, body: String },
}

impl fmt::Display for DeviceClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClientError::Http(e) => write!(f, "HTTP error: {e}"),
            DeviceClientError::ServerError { status, body } => {
                write!(f, "device returned {status}: {body}")
            }
        }
    }
}

impl std::error::Error for DeviceClientError {}

impl From<reqwest::Error> for DeviceClientError {
    fn from(e: reqwest::Error) -> Self {
        DeviceClientError::Http(e)
    }
}

/// Client for the soundboard device's HTTP control surface.
#[derive(Clone)]
pub struct DeviceClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    upload_timeout: Duration,
}

impl DeviceClient {
    /// `timeout` bounds the control requests; uploads use `upload_timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration, upload_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            upload_timeout,
        }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, DeviceClientError> {
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(DeviceClientError::ServerError { status, body });
        }
        Ok(resp)
    }

    pub async fn info(&self) -> Result<DeviceInfo, DeviceClientError> {
        let url = format!("{}/info", self.base_url);
        let resp = self.client.get(&url).timeout(self.timeout).send().await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    pub async fn play(&self, slot: u32) -> Result<(), DeviceClientError> {
        let url = format!("{}/play/{slot}", self.base_url);
        let resp = self.client.get(&url).timeout(self.timeout).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn restart(&self) -> Result<(), DeviceClientError> {
        let url = format!("{}/restart", self.base_url);
        let resp = self.client.get(&url).timeout(self.timeout).send().await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Multipart POST of a clip to the device under `filename`.
    pub async fn upload(&self, bytes: Vec<u8>, filename: &str) -> Result<(), DeviceClientError> {
        let url = format!("{}/upload", self.base_url);
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str("audio/mp3")?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .timeout(self.upload_timeout)
            .send()
            .await?;
        Self::check(resp).await?;

        tracing::info!("uploaded {filename} to device at {}", self.base_url);
        Ok(())
    }
}
