mod configuration;
mod device;
mod files;
mod health;
mod search;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router. Unmatched paths fall through to the
/// static UI directory when one is configured.
pub fn router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(health::health))
        .route("/configuration", get(configuration::get_configuration))
        // Local sound repository
        .route("/localFile/{board}/{file}", get(files::get_local_file))
        .route(
            "/setNewLocalFile/{board}/{slot}",
            get(files::set_new_local_file),
        )
        .route("/uploadToEsp/{board}/{slot}", get(files::upload_to_esp))
        // Sound search
        .route("/myinstants", get(search::search))
        .route("/prelisten", get(search::prelisten))
        // Device gateway
        .route("/device/info", get(device::info))
        .route("/device/play/{slot}", get(device::play))
        .route("/device/restart", get(device::restart));

    if let Some(ref web_dir) = state.web_dir {
        app = app.fallback_service(ServeDir::new(web_dir));
    }

    app.layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
