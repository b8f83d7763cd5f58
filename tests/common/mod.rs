#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use espsoundboard::config::Config;
use espsoundboard::models::config::ButtonMapping;
use espsoundboard::routes;
use espsoundboard::state::AppState;
use espsoundboard::storage::SoundRepository;
use http::Request;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Size of every clip served by the mock sound host.
pub const CLIP_SIZE: usize = 200;

/// Unique scratch directory for one test.
pub fn temp_storage_path() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("espsoundboard-test-{}", uuid::Uuid::new_v4()));
    path
}

/// Deterministic clip body for a given file name.
pub fn clip_bytes(name: &str) -> Vec<u8> {
    name.bytes().cycle().take(CLIP_SIZE).collect()
}

/// A file received by the mock device's `/upload` endpoint.
#[derive(Debug, Clone)]
pub struct ReceivedUpload {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Clone, Default)]
struct RemoteState {
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
    plays: Arc<Mutex<Vec<u32>>>,
    restarts: Arc<AtomicUsize>,
}

/// Stand-in for everything remote: the sound host, the search site and the device.
pub struct MockRemote {
    pub base_url: String,
    state: RemoteState,
}

impl MockRemote {
    pub async fn spawn() -> Self {
        let state = RemoteState::default();
        let app = Router::new()
            .route("/sounds/{name}", get(serve_clip))
            .route("/search/", get(search_page))
            .route("/info", get(device_info))
            .route("/play/{slot}", get(device_play))
            .route("/restart", get(device_restart))
            .route("/upload", post(device_upload))
            .route("/fail/upload", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/slow/info", get(slow_device_info))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", addr.port()),
            state,
        }
    }

    pub fn sound_url(&self, name: &str) -> String {
        format!("{}/sounds/{name}", self.base_url)
    }

    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.state.uploads.lock().unwrap().clone()
    }

    pub fn plays(&self) -> Vec<u32> {
        self.state.plays.lock().unwrap().clone()
    }

    pub fn restarts(&self) -> usize {
        self.state.restarts.load(Ordering::SeqCst)
    }
}

async fn slow_device_info() -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_secs(30)).await;
    device_info().await
}

async fn serve_clip(Path(name): Path<String>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "audio/mpeg")], clip_bytes(&name))
}

async fn search_page(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let query = params.get("name").cloned().unwrap_or_default();
    let html = format!(
        r#"<html><body><div id="instants_container">
            <div class="instant">
              <div class="small-button" onmousedown="play('/media/sounds/{query}.mp3')"></div>
              <a href="/instant/{query}/" class="instant-link">{query} sound</a>
            </div>
            <div class="instant">
              <div class="small-button" onmousedown="play('/media/sounds/{query}-remix.mp3')"></div>
              <a href="/instant/{query}-remix/" class="instant-link">{query} remix</a>
            </div>
        </div>
        <div class="pagination"><a href="?page=2">Load more</a></div>
        <footer>Copyright MyInstants</footer></body></html>"#
    );
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], html)
}

async fn device_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "version": "Mi, 25 Jan 2019",
        "name": "SeppelsSB",
        "freeMem": 123456,
        "flashSize": 4194304,
        "chipId": "A1B2C3D4E5F6",
        "macAddress": "24:0A:C4:00:00:01",
        "files": [
            { "name": "/1.mp3", "size": 2048 },
            { "name": "/3.mp3", "size": 200 }
        ]
    }))
}

async fn device_play(State(state): State<RemoteState>, Path(slot): Path<u32>) -> &'static str {
    state.plays.lock().unwrap().push(slot);
    "Playing"
}

async fn device_restart(State(state): State<RemoteState>) -> &'static str {
    state.restarts.fetch_add(1, Ordering::SeqCst);
    "Restarting."
}

async fn device_upload(State(state): State<RemoteState>, mut multipart: Multipart) -> String {
    let mut names = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let upload = ReceivedUpload {
            field: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().unwrap_or_default().to_string(),
            content_type: field.content_type().unwrap_or_default().to_string(),
            bytes: field.bytes().await.unwrap().to_vec(),
        };
        names.push(upload.file_name.clone());
        state.uploads.lock().unwrap().push(upload);
    }
    format!("{{\"name\": \"{}\"}}", names.join(","))
}

/// Test server wired to a fresh temp repository and a mock remote.
pub struct TestServer {
    pub state: AppState,
    pub storage_path: PathBuf,
}

impl TestServer {
    pub fn new(remote: &MockRemote) -> Self {
        Self::with_device_url(remote, &remote.base_url)
    }

    /// Like `new`, but points the device client somewhere else.
    pub fn with_device_url(remote: &MockRemote, device_url: &str) -> Self {
        let storage_path = temp_storage_path();
        let config = Config {
            port: 0,
            storage_path: storage_path.clone(),
            device_url: device_url.to_string(),
            search_url: remote.base_url.clone(),
            search_timeout: Duration::from_secs(10),
            device_timeout: Duration::from_secs(10),
            download_timeout: Duration::from_secs(30),
            upload_timeout: Duration::from_secs(30),
            buttons: vec![
                ButtonMapping {
                    name: "Red".to_string(),
                    esp_btn: 1,
                },
                ButtonMapping {
                    name: "Blue".to_string(),
                    esp_btn: 3,
                },
            ],
            web_dir: None,
        };

        Self {
            state: AppState::from_config(&config),
            storage_path,
        }
    }

    pub fn router(&self) -> Router {
        routes::router(self.state.clone())
    }

    pub fn repository(&self) -> &SoundRepository {
        &self.state.repository
    }

    pub fn board_dir(&self, board: &str) -> PathBuf {
        self.storage_path.join("soundboards").join(board)
    }

    /// Place a file directly on disk, bypassing the repository.
    pub fn write_file(&self, board: &str, file_name: &str, bytes: &[u8]) {
        let dir = self.board_dir(board);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file_name), bytes).unwrap();
    }

    /// Sorted file names currently in a board directory.
    pub fn list_dir(&self, board: &str) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.board_dir(board))
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().to_string())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.storage_path);
    }
}

/// Build a GET request with no body.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Read a response body as raw bytes.
pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Parse a response body into a `serde_json::Value`.
pub async fn parse_body(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
