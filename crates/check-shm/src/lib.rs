//! Cross-process shared state for the health-check core: the mapped region,
//! its byte layout, the per-peer spinlock-guarded operations, and the pure
//! rise/fall hysteresis function underneath them.
//!
//! Every worker process maps the same POSIX shared-memory object and talks
//! to it only through [`SharedPeerState`]; nothing in this crate assumes a
//! particular number of OS threads or processes beyond "more than one, and
//! they don't trust each other's liveness."

mod hysteresis;
mod layout;
mod peer;
mod region;

pub use hysteresis::{HysteresisState, Verdict};
pub use layout::{PeerSlot, SharedHeader, OWNER_INVALID};
pub use peer::{PeerSnapshot, SharedPeerState};
pub use region::{shm_name, ShmError, ShmRegion};
