//! POSIX shared-memory region backing the health-check state.
//!
//! The original module keeps its state in the nginx shared-memory zone
//! machinery, addressed as `ngx_http_upstream_check_module#<generation>`.
//! Outside of an nginx master process there is no equivalent allocator, so
//! this rewrite opens a POSIX `shm_open` object under the analogous name and
//! maps it with [`memmap2`]. Every worker process opens the same name and
//! gets the same bytes.

use crate::layout::{region_size, PeerSlot, SharedHeader};
use memmap2::MmapMut;
use std::ffi::CString;
use std::fs::File;
use std::os::unix::io::FromRawFd;

#[derive(Debug, thiserror::Error)]
pub enum ShmError {
    #[error("shm_open({name:?}) failed: {source}")]
    Open {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ftruncate({name:?}, {size}) failed: {source}")]
    Truncate {
        name: String,
        size: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("mmap of {name:?} failed: {source}")]
    Map {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("shared-memory name {0:?} is not representable as a C string")]
    BadName(String),
}

/// Builds the region's POSIX shared-memory object name, mirroring
/// `ngx_http_check_get_shm_name`'s `"%s#%ui"` format.
pub fn shm_name(generation: u64) -> String {
    format!("/upcheck-check#{generation}")
}

/// A mapped shared-memory region: one [`SharedHeader`] followed by `peer_count`
/// [`PeerSlot`]s. Every worker process that calls [`ShmRegion::open_or_create`]
/// with the same name and `peer_count` shares the same underlying pages.
pub struct ShmRegion {
    map: MmapMut,
    peer_count: usize,
}

impl ShmRegion {
    /// Opens (creating if necessary) the named region sized for `peer_count`
    /// peers, initializing it if this call created it.
    pub fn open_or_create(generation: u64, peer_count: usize) -> Result<Self, ShmError> {
        let name = shm_name(generation);
        let size = region_size(peer_count);
        let cname = CString::new(name.clone()).map_err(|_| ShmError::BadName(name.clone()))?;

        // O_CREAT | O_EXCL first: the caller that wins the race initializes
        // the region. Anyone who loses the race falls back to a plain open,
        // which attaches to the already-initialized region.
        let mut created = true;
        let mut fd = unsafe {
            libc::shm_open(
                cname.as_ptr(),
                libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                0o600,
            )
        };
        if fd < 0 {
            created = false;
            fd = unsafe { libc::shm_open(cname.as_ptr(), libc::O_RDWR, 0o600) };
        }
        if fd < 0 {
            return Err(ShmError::Open {
                name,
                source: std::io::Error::last_os_error(),
            });
        }

        if created && unsafe { libc::ftruncate(fd, size as libc::off_t) } != 0 {
            let source = std::io::Error::last_os_error();
            unsafe { libc::close(fd) };
            return Err(ShmError::Truncate { name, size, source });
        }

        let file = unsafe { File::from_raw_fd(fd) };
        let map = unsafe { MmapMut::map_mut(&file) }.map_err(|source| ShmError::Map {
            name: name.clone(),
            source,
        })?;
        // `file` owns the fd for as long as it's needed to create the
        // mapping; memmap2 dup()s internally so dropping it here is safe and
        // avoids leaking the descriptor.
        drop(file);

        let region = ShmRegion { map, peer_count };
        if created {
            region.header().generation.store(
                generation,
                std::sync::atomic::Ordering::Relaxed,
            );
            region.header().peer_count.store(
                peer_count as u64,
                std::sync::atomic::Ordering::Relaxed,
            );
            for slot in region.slots() {
                slot.write_initial();
            }
        }
        Ok(region)
    }

    /// Unlinks the named region so no future process can attach to it. Only
    /// the process tearing down the whole daemon (not an individual worker
    /// exiting) should call this.
    pub fn unlink(generation: u64) -> std::io::Result<()> {
        let name = shm_name(generation);
        let cname = CString::new(name).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let rc = unsafe { libc::shm_unlink(cname.as_ptr()) };
        if rc != 0 {
            return Err(std::io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn header(&self) -> &SharedHeader {
        unsafe { &*(self.map.as_ptr() as *const SharedHeader) }
    }

    pub fn peer_count(&self) -> usize {
        self.peer_count
    }

    pub fn slot(&self, index: usize) -> &PeerSlot {
        assert!(index < self.peer_count, "peer index out of range");
        let base = self.map.as_ptr() as usize + SharedHeader::SIZE;
        let ptr = (base + index * PeerSlot::SIZE) as *const PeerSlot;
        unsafe { &*ptr }
    }

    pub fn slots(&self) -> impl Iterator<Item = &PeerSlot> {
        (0..self.peer_count).map(move |i| self.slot(i))
    }
}

// SAFETY: every field behind these references is an atomic; concurrent
// access from multiple threads (and multiple processes, which the type
// system can't express at all) is the entire point of the region.
unsafe impl Send for ShmRegion {}
unsafe impl Sync for ShmRegion {}
