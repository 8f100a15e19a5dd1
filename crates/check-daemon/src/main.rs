//! `upcheckd`: the health-check daemon binary.
//!
//! Wires `check-config`, `check-shm`, `check-probes`, `check-runtime` and
//! `check-status` together into a runnable multi-process program. The first
//! invocation (no `--worker-id`) is the supervisor: it loads the config,
//! creates the shared-memory region, re-execs itself once per configured
//! worker, and serves the status page itself. Each re-exec'd child attaches
//! to the same region and runs [`worker::run_worker`].

mod config;
mod worker;

use check_cli_common::{init_logging, LogArgs, OrBail};
use check_runtime::Bootstrap;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variables used to pass worker identity across the re-exec,
/// rather than argv, so an operator inspecting `ps` output sees the same
/// command line for every worker.
const ENV_WORKER_ID: &str = "UPCHECKD_WORKER_ID";
const ENV_GENERATION: &str = "UPCHECKD_GENERATION";

#[derive(Debug, Parser)]
#[command(name = "upcheckd", about = "Active health checks for upstream servers")]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "upcheck.json")]
    config: PathBuf,

    #[command(flatten)]
    log: LogArgs,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .or_bail("failed to build tokio runtime");

    match (worker_id_from_env(), generation_from_env()) {
        (Some(worker_id), Some(generation)) => {
            runtime.block_on(run_as_worker(args, worker_id, generation))
        }
        _ => runtime.block_on(run_as_supervisor(args)),
    }
}

fn worker_id_from_env() -> Option<u64> {
    std::env::var(ENV_WORKER_ID).ok()?.parse().ok()
}

fn generation_from_env() -> Option<u64> {
    std::env::var(ENV_GENERATION).ok()?.parse().ok()
}

async fn run_as_worker(args: Args, worker_id: u64, generation: u64) -> anyhow::Result<()> {
    let config = Arc::new(config::DaemonConfig::load(&args.config)?);
    tracing::info!(worker_id, generation, "worker starting");
    worker::run_worker(config, worker_id, generation).await
}

async fn run_as_supervisor(args: Args) -> anyhow::Result<()> {
    let config = config::DaemonConfig::load(&args.config)?;
    let generation = Bootstrap::fresh_generation();
    let bootstrap = Bootstrap::open(generation, config.targets.len())?;
    tracing::info!(
        generation,
        peers = config.targets.len(),
        workers = config.workers,
        "shared-memory region ready"
    );

    let exe = std::env::current_exe()?;
    let mut children = Vec::with_capacity(config.workers);
    // Worker ids start at 1, not 0: `check_shm::OWNER_INVALID` is 0, so a
    // worker id of 0 legitimately holding ownership would be indistinguishable
    // from the slot being unowned, letting every other worker take it too.
    for worker_id in 1..=config.workers as u64 {
        let mut command = std::process::Command::new(&exe);
        command
            .arg("--config")
            .arg(&args.config)
            .env(ENV_WORKER_ID, worker_id.to_string())
            .env(ENV_GENERATION, generation.to_string());
        children.push(command.spawn()?);
    }

    let region_for_status = Arc::new(bootstrap.region);
    let status_state = Arc::new(check_status::StatusState {
        region: Arc::clone(&region_for_status),
        peers: config
            .targets
            .iter()
            .map(|t| check_status::PeerDescriptor {
                name: t.name.clone(),
                kind: t.check.kind,
            })
            .collect(),
        shm_name: check_shm::shm_name(generation),
    });
    let status_router = check_status::router(&config.status_path, status_state);
    let listener = tokio::net::TcpListener::bind(config.status_bind).await?;
    tracing::info!(addr = %config.status_bind, path = %config.status_path, "status page listening");

    tokio::select! {
        result = axum::serve(listener, status_router) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received, stopping workers");
        }
    }

    for mut child in children {
        let _ = child.kill();
        let _ = child.wait();
    }
    check_shm::ShmRegion::unlink(generation)?;
    Ok(())
}
