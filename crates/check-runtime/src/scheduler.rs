//! Per-peer scheduling: jittered first run, ownership election, half-interval
//! re-arm, and the in-flight bookkeeping (acquire/release/record) around a
//! single [`run_cycle`](crate::state_machine::run_cycle).
//!
//! The original module arms one nginx timer event per peer from
//! `ngx_http_check_add_timers`, jittered up to one full `check_interval` so
//! a config with many peers doesn't slam them all in the same tick, then
//! re-arms on a schedule tied to the interval. This rewrite is one
//! `tokio::time::sleep` loop per peer instead of one timer event per peer —
//! same shape, no event-loop bookkeeping required to get there.

use crate::lifecycle::WorkerState;
use crate::state_machine::{run_cycle, CycleError, CycleVerdict};
use check_config::CheckConfig;
use check_shm::{SharedPeerState, Verdict};
use rand::Rng;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Everything the scheduler needs to drive one peer's probe cycles.
pub struct PeerTarget<'a> {
    pub addr: SocketAddr,
    pub config: CheckConfig,
    pub peer: SharedPeerState<'a>,
}

/// Runs the scheduling loop for one peer until `lifecycle` leaves `Running`.
/// `worker_id` identifies this worker as the candidate owner when electing
/// itself to run a cycle.
pub async fn run_peer_scheduler(
    target: PeerTarget<'_>,
    worker_id: u64,
    mut lifecycle: tokio::sync::watch::Receiver<WorkerState>,
) {
    let probe = check_probes::probe_for(target.config.kind);
    let send_payload = target
        .config
        .send_override
        .as_deref()
        .unwrap_or_else(|| probe.default_send_payload());
    let mask = target
        .config
        .status_mask
        .unwrap_or_else(|| probe.default_status_mask());

    let jitter_ceiling = target.config.initial_jitter_ceiling();
    let initial_delay = Duration::from_millis(
        rand::thread_rng().gen_range(0..=jitter_ceiling.as_millis().max(1) as u64),
    );
    tokio::select! {
        _ = tokio::time::sleep(initial_delay) => {}
        _ = lifecycle.changed() => return,
    }

    loop {
        if *lifecycle.borrow() != WorkerState::Running {
            return;
        }

        let interval_millis = target.config.interval.as_millis() as u64;
        if target
            .peer
            .try_take_ownership(worker_id, now_millis(), interval_millis)
        {
            let cycle = run_cycle(target.addr, probe, send_payload, mask, target.config.timeout).await;
            let verdict = match cycle {
                Ok(CycleVerdict::Pass) => Verdict::Pass,
                Ok(CycleVerdict::Fail) => Verdict::Fail,
                Err(err) => {
                    tracing::debug!(peer = %target.addr, error = %err, "probe cycle failed");
                    Verdict::Fail
                }
            };
            target.peer.record_verdict(
                worker_id,
                verdict,
                target.config.rise,
                target.config.fall,
                now_millis(),
            );
            target.peer.drop_ownership(worker_id);
        }

        tokio::select! {
            _ = tokio::time::sleep(target.config.poll_period()) => {}
            _ = lifecycle.changed() => return,
        }
    }
}

/// Convenience reporting type for a failed cycle worth logging at the call
/// site without tying it to [`tracing`] directly.
pub fn describe_failure(err: &CycleError) -> String {
    err.to_string()
}
