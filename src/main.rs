use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use espsoundboard::config::Config;
use espsoundboard::state::AppState;

/// Soundboard controller backend. Flags override the environment.
#[derive(Parser, Debug)]
#[command(version)]
struct Cli {
    /// Port to listen on (PORT)
    #[arg(long)]
    port: Option<u16>,
    /// Repository root containing `soundboards/` (ESB_STORAGE_PATH)
    #[arg(long)]
    storage_path: Option<PathBuf>,
    /// Base URL of the soundboard device (ESB_DEVICE_URL)
    #[arg(long)]
    device_url: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "espsoundboard=debug,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(storage_path) = cli.storage_path {
        config.storage_path = storage_path;
    }
    if let Some(device_url) = cli.device_url {
        config.device_url = device_url.trim_end_matches('/').to_string();
    }

    print_banner(&config);

    let state = AppState::from_config(&config);
    if let Err(e) = state.repository.ensure_dirs().await {
        tracing::error!("failed to prepare sound repository: {e}");
    }

    let app = espsoundboard::routes::router(state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .expect("failed to bind");

    let actual_port = listener
        .local_addr()
        .expect("failed to get local address")
        .port();
    eprintln!("  \x1b[32m→ listening on 0.0.0.0:{actual_port}\x1b[0m");
    eprintln!();

    axum::serve(listener, app).await.expect("server error");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");

    eprintln!();
    eprintln!("  \x1b[1;36mespsoundboard\x1b[0m \x1b[2mv{version}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mport\x1b[0m         {}", config.port);
    eprintln!("  \x1b[2mstorage\x1b[0m      {}", config.storage_path.display());
    eprintln!("  \x1b[2mdevice\x1b[0m       {}", config.device_url);
    eprintln!("  \x1b[2msearch\x1b[0m       {}", config.search_url);
    eprintln!("  \x1b[2mbuttons\x1b[0m      {}", config.buttons.len());
    if let Some(ref web_dir) = config.web_dir {
        eprintln!("  \x1b[2mweb ui\x1b[0m       {}", web_dir.display());
    }
    eprintln!();
}
