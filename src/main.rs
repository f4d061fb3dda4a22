use std::sync::Arc;

use tracing::{error, info, warn};

use aizeva::web::WebServer;
use aizeva::{Config, Database};

#[tokio::main]
async fn main() {
    // Load configuration
    let (config, load_error) = match Config::load_with_env("config.toml") {
        Ok(config) => (config, None),
        Err(e) => {
            let mut config = Config::default();
            config.apply_env_overrides();
            (config, Some(e))
        }
    };

    // Initialize logging
    if let Err(e) = aizeva::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        aizeva::logging::init_console_only(&config.logging.level);
    }

    if let Some(e) = load_error {
        warn!("Failed to load config.toml ({e}), using default configuration");
    }

    info!("AIZEVA - multi-board community server");

    if let Err(e) = config.validate() {
        error!("{e}");
        std::process::exit(1);
    }

    let db = match Database::open(&config.database.url, config.database.max_connections).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to open database: {e}");
            std::process::exit(1);
        }
    };

    let server = match WebServer::new(config, db) {
        Ok(server) => server,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Web server error: {e}");
        std::process::exit(1);
    }
}
