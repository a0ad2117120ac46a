//! Binary entry point: parses configuration, wires up the storage substrate
//! and the HTTP front end, and runs until shutdown.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use kvs_core::{KvStore, KvStoreConfig, Maintainer, MaintenanceScheduler, SystemClock};
use kvs_server::config::Cli;
use kvs_server::network::{NetworkConfig, NetworkModule};
use tracing::{error, info};

/// Soft cap on live arenas per partition. Not part of the source's env
/// table; chosen generously so the cap only bites under sustained misuse.
const MAX_LIVE_SLABS_PER_PARTITION: usize = 1024;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let resolved = match cli.resolve() {
        Ok(resolved) => resolved,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_max_level(resolved.log_level)
        .with_target(false)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!("failed to start async runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(run(resolved))
}

async fn run(resolved: kvs_server::config::ResolvedConfig) -> ExitCode {
    let store = match KvStore::new(
        KvStoreConfig {
            partition_count: resolved.partition_count,
            slab_capacity: resolved.preallocated,
            max_live_slabs: MAX_LIVE_SLABS_PER_PARTITION,
            ttl_millis: u64::try_from(resolved.ttl.as_millis()).unwrap_or(u64::MAX),
            nonce: [0u8; 32],
        },
        Arc::new(SystemClock),
    ) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            error!("failed to construct store: {err}");
            return ExitCode::FAILURE;
        }
    };

    let maintainer: Arc<dyn Maintainer> = {
        let store = Arc::clone(&store);
        Arc::new(move |cancelled: &dyn Fn() -> bool| store.clean(cancelled))
    };
    let scheduler = MaintenanceScheduler::start(resolved.maintenance_interval, vec![maintainer]);

    let network_config = NetworkConfig {
        host: resolved.host.clone(),
        port: resolved.port,
        ..NetworkConfig::default()
    };

    let mut module = NetworkModule::new(network_config, store);
    let port = match module.start().await {
        Ok(port) => port,
        Err(err) => {
            error!("failed to bind listener: {err}");
            scheduler.stop();
            return ExitCode::from(2);
        }
    };

    info!("listening on {}:{port}", resolved.host);

    let result = module.serve(shutdown_signal()).await;
    scheduler.stop();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("server error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Resolves once SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("shutdown signal received");
}
