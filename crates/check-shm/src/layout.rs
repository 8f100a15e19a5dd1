//! The byte layout of the shared-memory region.
//!
//! One [`SharedHeader`] followed by `peer_count` [`PeerSlot`]s, mapped
//! read-write into every worker process with [`memmap2`]. Every field is an
//! atomic so that readers never observe a torn write from a sibling process.
//! `#[repr(C)]` pins the layout so the header's size does not shift under us
//! between a Rust compiler upgrade and the next.

use std::sync::atomic::{AtomicU32, AtomicU64};

/// Sentinel stored in [`PeerSlot::owner`] when no worker currently owns the slot.
pub const OWNER_INVALID: u64 = 0;

#[repr(C)]
pub struct SharedHeader {
    /// Bumped every time the region is recreated from scratch (peer count
    /// changed, daemon restarted cold). Used to build the region's file name
    /// so a stale mapping from an old generation is never reused.
    pub generation: AtomicU64,
    /// Number of [`PeerSlot`]s that follow this header in the region.
    pub peer_count: AtomicU64,
}

impl SharedHeader {
    pub const SIZE: usize = std::mem::size_of::<SharedHeader>();
}

/// Per-peer health state, one instance per upstream server in the region.
#[repr(C)]
pub struct PeerSlot {
    /// CAS spinlock. 0 is unlocked; any other value is the id of the worker
    /// currently holding it. There is deliberately no separate unlock type —
    /// releasing is just a CAS back to 0 from the holder's own id.
    pub lock: AtomicU32,
    /// Id (pid-like, but in this rewrite a small worker index) of the worker
    /// currently running a probe cycle against this peer, or [`OWNER_INVALID`].
    pub owner: AtomicU64,
    /// Monotonic milliseconds at which `owner` last changed hands, used for
    /// stale-owner reclamation.
    pub access_time: AtomicU64,
    /// Total probe cycles completed against this peer, for the status page.
    pub access_count: AtomicU64,
    /// Probes currently in flight against this peer. Nonzero while a request
    /// is routed to it and the connection has not yet been released.
    pub business: AtomicU32,
    /// Consecutive passing verdicts since the last failing one.
    pub rise_count: AtomicU32,
    /// Consecutive failing verdicts since the last passing one.
    pub fall_count: AtomicU32,
    /// 1 if the peer is currently considered down, 0 otherwise.
    pub down: AtomicU32,
}

impl PeerSlot {
    pub const SIZE: usize = std::mem::size_of::<PeerSlot>();

    /// The zero-valued slot state, matching the original module's
    /// `init_shm_zone`, which zeroes the region and then explicitly sets
    /// `owner = NGX_INVALID_PID` and `down = 1` so a fresh peer starts down
    /// until it passes its first `rise` streak.
    pub fn write_initial(&self) {
        self.lock.store(0, std::sync::atomic::Ordering::Relaxed);
        self.owner
            .store(OWNER_INVALID, std::sync::atomic::Ordering::Relaxed);
        self.access_time.store(0, std::sync::atomic::Ordering::Relaxed);
        self.access_count.store(0, std::sync::atomic::Ordering::Relaxed);
        self.business.store(0, std::sync::atomic::Ordering::Relaxed);
        self.rise_count.store(0, std::sync::atomic::Ordering::Relaxed);
        self.fall_count.store(0, std::sync::atomic::Ordering::Relaxed);
        self.down.store(1, std::sync::atomic::Ordering::Relaxed);
    }
}

/// Byte size of a region big enough to hold a header and `peer_count` slots.
pub fn region_size(peer_count: usize) -> usize {
    SharedHeader::SIZE + peer_count * PeerSlot::SIZE
}
