//! The three functions a load balancer's request routing path calls against
//! this core: `is_peer_down`, `acquire_peer`, `release_peer`. Named directly
//! after the original module's `ngx_http_check_peer_down`,
//! `ngx_http_check_get_peer` and `ngx_http_check_free_peer`, which exist so
//! the proxying code can stay oblivious to how health state is stored.

use check_shm::{ShmRegion, SharedPeerState};

/// Whether `index` is currently considered down. Safe to call on the
/// request path; takes no lock.
pub fn is_peer_down(region: &ShmRegion, index: usize) -> bool {
    SharedPeerState::new(region.slot(index)).is_down()
}

/// Marks `index` as carrying one more live request. `caller_id` identifies
/// the calling worker for the spinlock, the same id space the probe
/// scheduler's `worker_id` uses.
pub fn acquire_peer(region: &ShmRegion, index: usize, caller_id: u64) {
    SharedPeerState::new(region.slot(index)).acquire(caller_id);
}

/// The inverse of [`acquire_peer`], called once the request routed to
/// `index` has finished.
pub fn release_peer(region: &ShmRegion, index: usize, caller_id: u64) {
    SharedPeerState::new(region.slot(index)).release(caller_id);
}
