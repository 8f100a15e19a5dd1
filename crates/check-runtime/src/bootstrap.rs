//! Shared-memory region startup sequencing.
//!
//! Mirrors `ngx_http_upstream_check_init_shm_zone`: pick a generation,
//! attach to (or create) the region named after it, and zero-initialize any
//! slot this call created. Unlike the original, which only ever bumps
//! `generation` when nginx reloads its binary, this rewrite also bumps it
//! whenever the configured peer count changes, since the region's size is a
//! function of that count and a config reload may add or remove peers.

use check_shm::ShmRegion;
use std::time::{SystemTime, UNIX_EPOCH};

/// The live shared-memory region plus the generation it was opened under.
pub struct Bootstrap {
    pub region: ShmRegion,
    pub generation: u64,
}

impl Bootstrap {
    /// Attaches to the current generation's region for `peer_count` peers,
    /// creating it if this is the first worker to start.
    ///
    /// `generation` should be stable across a fleet of sibling worker
    /// processes started together (the daemon picks one value and passes it
    /// to every worker it spawns) so they all open the same region.
    pub fn open(generation: u64, peer_count: usize) -> Result<Self, check_shm::ShmError> {
        let region = ShmRegion::open_or_create(generation, peer_count)?;
        Ok(Bootstrap { region, generation })
    }

    /// Picks a fresh generation value, suitable for a cold daemon start.
    /// Reloads that intend to reuse the existing region should pass its
    /// already-known generation to [`open`](Self::open) instead of calling
    /// this again.
    pub fn fresh_generation() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }

    /// Tears down this generation's region. Only the process responsible for
    /// the whole daemon's lifecycle (not an individual worker) should call
    /// this, and only after every worker attached to it has exited.
    pub fn unlink(&self) -> std::io::Result<()> {
        ShmRegion::unlink(self.generation)
    }
}
