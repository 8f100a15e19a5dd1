//! One worker process's half of the daemon: attach to the shared-memory
//! region the supervisor already created, then race every sibling worker
//! for ownership of every configured target.
//!
//! This mirrors how the original module runs: every nginx worker process
//! runs the same timer for the same peer and whichever one observes
//! `owner == NGX_INVALID_PID` first wins that cycle. Workers here are not
//! statically assigned a disjoint subset of peers; the spinlock-guarded
//! ownership check in `check-shm` is what keeps only one of them actually
//! probing a given peer at a time.

use crate::config::{DaemonConfig, TargetConfig};
use check_runtime::{run_peer_scheduler, Bootstrap, PeerTarget, WorkerLifecycle};
use check_shm::SharedPeerState;
use std::sync::Arc;

pub async fn run_worker(
    config: Arc<DaemonConfig>,
    worker_id: u64,
    generation: u64,
) -> anyhow::Result<()> {
    let bootstrap = Bootstrap::open(generation, config.targets.len())?;
    let region = Arc::new(bootstrap.region);

    let lifecycle = WorkerLifecycle::new();
    install_shutdown_handler(lifecycle.clone());

    let mut tasks = tokio::task::JoinSet::new();
    for (index, target) in config.targets.iter().enumerate() {
        let region = Arc::clone(&region);
        let rx = lifecycle.subscribe();
        let target = clone_target_config(target);
        tasks.spawn(async move {
            // `region` is moved into this task before we borrow from it, so
            // the `PeerSlot` reference below stays valid for the task's
            // entire lifetime: the mmap it points into is only unmapped
            // once every clone of `region`, including this one, drops.
            let region = region;
            let peer = SharedPeerState::new(region.slot(index));
            let peer_target = PeerTarget {
                addr: target.addr,
                config: target.check,
                peer,
            };
            run_peer_scheduler(peer_target, worker_id, rx).await;
        });
    }

    while tasks.join_next().await.is_some() {}
    lifecycle.mark_stopped();
    tracing::info!(worker_id, "worker drained, exiting");
    Ok(())
}

fn clone_target_config(target: &TargetConfig) -> TargetConfig {
    TargetConfig {
        name: target.name.clone(),
        addr: target.addr,
        check: target.check.clone(),
    }
}

fn install_shutdown_handler(lifecycle: WorkerLifecycle) {
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown signal received, draining in-flight probe cycles");
        lifecycle.begin_stop();
    });
}
