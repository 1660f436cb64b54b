use std::process::ExitCode;

use tracing::{error, info};

use tempdrop::{BlobStore, Config, FileRegistry, MetadataStore, WebServer};

/// Environment variable naming the configuration file.
const CONFIG_ENV: &str = "TEMPDROP_CONFIG";

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "config.toml".to_string());

    // Load configuration
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };
    config.apply_env_overrides();

    // Initialize logging
    if let Err(e) = tempdrop::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        tempdrop::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    info!("tempdrop - ephemeral file sharing");
    info!(
        "Server configured on {}:{}",
        config.server.host, config.server.port
    );

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> tempdrop::Result<()> {
    let storage = BlobStore::new(&config.files.storage_path, config.files.max_upload_bytes())?;
    let metadata = MetadataStore::new(&config.files.metadata_path);
    let registry = FileRegistry::open(storage, metadata, config.files.ttl()).await;

    WebServer::new(&config, registry)?.run().await
}
