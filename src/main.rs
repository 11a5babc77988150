use hookshot::logging::{FileLogger, setup_logging};
use hookshot::{AppState, api, load_config};
use std::sync::Arc;
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "hookshot.toml";

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config_path =
        std::env::var("HOOKSHOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let file_logger = config.log_directory.clone().map(FileLogger::new);
    let _log_guard = match setup_logging(file_logger.as_ref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Logging error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.listening_port;
    if config.secret().is_none() {
        info!("No webhook secret configured; payload signatures will not be checked");
    }
    info!(
        "Dispatching to Marathon app '{}' via {}",
        config.marathon_app_id, config.marathon_host
    );

    let state = match AppState::from_config(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let app = api::router(state);
    let bind_address = format!("0.0.0.0:{}", port);
    let listener = match tokio::net::TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", bind_address, e);
            std::process::exit(1);
        }
    };

    info!("Listening on {}", bind_address);
    info!("Using config at {:?}", config_path);
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
