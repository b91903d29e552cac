//! Guest allocator behind the `__new` / `__pin` / `__unpin` exports.
//!
//! Every buffer the host can see lives in a registry keyed by its address in linear
//! memory. A buffer leaves the registry exactly once:
//!
//! - the guest claims it ([`claim`], used by [`crate::OwnedBuffer::claim`]), or
//! - the host abandons it before handing it over ([`unpin`]).
//!
//! Because removal is the only way out, a second claim or a stale unpin finds nothing
//! and cannot free memory twice.
//!
//! Lifecycle of a host→guest owned result:
//!
//! 1. host calls `__new(len, class_id)` and writes `len` bytes at the returned pointer
//! 2. host calls `__pin(ptr)` so nothing reclaims the buffer while it is in flight
//! 3. host returns `ptr` from the import (or passes it to an event export)
//! 4. guest claims `ptr`; the bytes are owned by an [`crate::OwnedBuffer`] from then on

use crate::error::BufferError;
use std::cell::RefCell;
use std::collections::HashMap;
use tracing::{trace, warn};

struct Allocation {
    bytes: Vec<u8>,
    len: usize,
    class_id: u32,
    pinned: bool,
}

#[derive(Default)]
struct Registry {
    live: HashMap<usize, Allocation>,
}

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry::default());
}

/// A buffer removed from the registry.
pub(crate) struct Claimed {
    pub bytes: Vec<u8>,
    pub class_id: u32,
}

/// Allocates `size` zeroed bytes and returns their address.
///
/// Never returns 0, so 0 stays free to mean "no data". Zero-sized requests still get a
/// distinct address.
pub fn allocate(size: usize, class_id: u32) -> usize {
    let mut bytes = vec![0u8; size.max(1)];
    let ptr = bytes.as_mut_ptr() as usize;
    REGISTRY.with(|registry| {
        registry.borrow_mut().live.insert(
            ptr,
            Allocation {
                bytes,
                len: size,
                class_id,
                pinned: false,
            },
        );
    });
    trace!(ptr, size, class_id, "allocated guest buffer");
    ptr
}

/// Marks a live allocation as in flight. Returns `ptr`, or 0 if it is not live.
pub fn pin(ptr: usize) -> usize {
    REGISTRY.with(|registry| match registry.borrow_mut().live.get_mut(&ptr) {
        Some(allocation) => {
            allocation.pinned = true;
            ptr
        }
        None => {
            warn!(ptr, "pin of unknown guest buffer");
            0
        }
    })
}

/// Releases an allocation the host never handed over. No-op for claimed pointers.
pub fn unpin(ptr: usize) {
    let released = REGISTRY.with(|registry| registry.borrow_mut().live.remove(&ptr));
    match released {
        Some(allocation) => trace!(ptr, len = allocation.len, "released guest buffer"),
        None => trace!(ptr, "unpin of buffer that is no longer live"),
    }
}

/// Copies `bytes` into a live allocation starting at offset 0.
///
/// This is what the host does through linear memory; test doubles use it to serve
/// owned results without a real host.
pub fn fill(ptr: usize, bytes: &[u8]) -> Result<(), BufferError> {
    REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        let allocation = registry.live.get_mut(&ptr).ok_or(BufferError::NotLive(ptr))?;
        if bytes.len() > allocation.len {
            return Err(BufferError::Overflow {
                ptr,
                len: bytes.len(),
                capacity: allocation.len,
            });
        }
        allocation.bytes[..bytes.len()].copy_from_slice(bytes);
        Ok(())
    })
}

/// `true` if `ptr` has been pinned and not yet claimed or released.
pub fn is_pinned(ptr: usize) -> bool {
    REGISTRY.with(|registry| {
        registry
            .borrow()
            .live
            .get(&ptr)
            .map(|allocation| allocation.pinned)
            .unwrap_or(false)
    })
}

/// Number of allocations still owned by the registry.
pub fn live_count() -> usize {
    REGISTRY.with(|registry| registry.borrow().live.len())
}

/// Removes `ptr` from the registry and hands its bytes to the caller.
pub(crate) fn claim(ptr: usize) -> Result<Claimed, BufferError> {
    let allocation = REGISTRY
        .with(|registry| registry.borrow_mut().live.remove(&ptr))
        .ok_or(BufferError::NotLive(ptr))?;
    let mut bytes = allocation.bytes;
    bytes.truncate(allocation.len);
    Ok(Claimed {
        bytes,
        class_id: allocation.class_id,
    })
}
