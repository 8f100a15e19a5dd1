//! Drives the probe state machine and scheduler on top of `check-shm` and
//! `check-probes`, and exposes the routing-facing functions a proxy's
//! request path calls to consult and update peer health.

mod bootstrap;
mod lifecycle;
mod routing;
mod scheduler;
mod state_machine;

pub use bootstrap::Bootstrap;
pub use lifecycle::{WorkerLifecycle, WorkerState};
pub use routing::{acquire_peer, is_peer_down, release_peer};
pub use scheduler::{run_peer_scheduler, PeerTarget};
pub use state_machine::{run_cycle, CycleError, CycleVerdict};
