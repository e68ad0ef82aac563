use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use burstrec_core::{
    load_config, metrics as core_metrics, validate_config, ConvertConfig, ConvertTask, Dispatcher,
    FfmpegEngine, MediaEngine, PoolConfig, RecordConfig, RecordTask, RemoteStore, SftpConfig,
    SftpStore, UploadConfig, UploadTask, WorkerPool,
};

use burstrec_server::api::create_router;
use burstrec_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("BURSTREC_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Output path: {:?}", config.output.path);
    info!("Upload endpoint: {}", config.ssh.server);

    // External collaborators
    let engine: Arc<dyn MediaEngine> = Arc::new(FfmpegEngine::with_defaults());
    let remote: Arc<dyn RemoteStore> = Arc::new(SftpStore::new(SftpConfig {
        server: config.ssh.server.clone(),
        user: config.ssh.user.clone(),
        key: config.ssh.key.clone(),
        timeout_secs: config.upload.timeout_secs,
    }));

    // Per-stage task configuration
    let record_config = Arc::new(RecordConfig::from(&config));
    let upload_config = Arc::new(UploadConfig::from(&config));
    let convert_config = Arc::new(ConvertConfig::from(&config));

    // Working pools
    let (record_pool, record_results) = WorkerPool::<RecordTask>::new(
        "record",
        PoolConfig {
            workers: config.record.workers,
            queue_size: config.record.queue_size,
            result_size: config.record.result_size,
        },
    );
    let (upload_pool, upload_results) = WorkerPool::<UploadTask>::new(
        "upload",
        PoolConfig {
            workers: config.upload.workers,
            queue_size: config.upload.queue_size,
            result_size: config.upload.result_size,
        },
    );
    let (convert_pool, _convert_results) = WorkerPool::<ConvertTask>::new(
        "convert",
        PoolConfig {
            workers: config.convert.workers,
            queue_size: config.convert.queue_size,
            result_size: config.convert.result_size,
        },
    );

    let record_pool = Arc::new(record_pool);
    let upload_pool = Arc::new(upload_pool);
    let convert_pool = Arc::new(convert_pool);

    info!(
        record_workers = config.record.workers,
        upload_workers = config.upload.workers,
        convert_workers = config.convert.workers,
        "Working pools started"
    );

    let pools = vec![
        ("record".to_string(), record_pool.handle()),
        ("upload".to_string(), upload_pool.handle()),
        ("convert".to_string(), convert_pool.handle()),
    ];

    // Route stage results into the next stage
    let dispatcher = Dispatcher::new(
        record_results,
        upload_results,
        Arc::clone(&upload_pool),
        Arc::clone(&convert_pool),
        upload_config,
        convert_config,
        remote,
        Arc::clone(&engine),
    );
    tokio::spawn(dispatcher.run());

    // Periodic pool gauge snapshots
    core_metrics::spawn_sampler(pools.clone(), core_metrics::SAMPLE_INTERVAL);

    // HTTP surface
    let state = Arc::new(AppState::new(
        Arc::clone(&record_pool),
        record_config,
        Arc::clone(&engine),
        pools,
    ));
    let router = create_router(state, &config.output.path);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
