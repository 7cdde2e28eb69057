//! Host boundary arena
//!
//! The host on the other side of the wasm boundary cannot take part in our
//! memory management, so every buffer it may touch is kept in a retained
//! set keyed by address until it is explicitly released. Moving the owning
//! `Box` into the map does not move the heap allocation, so an address
//! stays valid for as long as its entry exists.
//!
//! # Packed results
//!
//! Results cross the boundary as a single `u64`:
//!
//! ```text
//! bits 63..32  address of the result buffer
//! bit  31      error flag
//! bits 30..0   length in bytes
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Largest buffer the host may request.
pub const MAX_ALLOC_SIZE: usize = 1024 * 1024;

/// Largest input the module will read from a host-supplied address.
pub const MAX_READ_LEN: usize = 64 * 1024;

/// Error flag in the low half of a packed result.
pub const ERROR_BIT: u32 = 0x8000_0000;

/// Largest length a packed result can carry.
pub const MAX_PACKED_LEN: u32 = ERROR_BIT - 1;

// =============================================================================
// Packed Result
// =============================================================================

/// Address, length and error flag packed into one machine word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct PackedResult(u64);

impl PackedResult {
    /// The null result with the error flag set.
    pub const UNREPRESENTABLE: Self = Self::new(0, 0, true);

    /// Pack a result. `len` is truncated to 31 bits.
    #[inline]
    pub const fn new(address: u32, len: u32, is_error: bool) -> Self {
        let low = (len & MAX_PACKED_LEN) | if is_error { ERROR_BIT } else { 0 };
        Self(((address as u64) << 32) | low as u64)
    }

    #[inline]
    pub const fn from_u64(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    pub const fn to_u64(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn address(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Length with the error flag masked off.
    #[inline]
    pub const fn len(self) -> u32 {
        self.0 as u32 & MAX_PACKED_LEN
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 as u32 & ERROR_BIT != 0
    }
}

/// A buffer handed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub address: usize,
    pub len: usize,
    pub is_error: bool,
}

impl Delivery {
    /// Pack for the boundary. Values that do not fit the 32-bit halves
    /// pack as [`PackedResult::UNREPRESENTABLE`].
    pub fn packed(&self) -> PackedResult {
        match (u32::try_from(self.address), u32::try_from(self.len)) {
            (Ok(address), Ok(len)) if len <= MAX_PACKED_LEN => PackedResult::new(address, len, self.is_error),
            _ => PackedResult::UNREPRESENTABLE,
        }
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Size limits applied at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaLimits {
    pub max_alloc: usize,
    pub max_read: usize,
}

impl Default for ArenaLimits {
    fn default() -> Self {
        Self {
            max_alloc: MAX_ALLOC_SIZE,
            max_read: MAX_READ_LEN,
        }
    }
}

/// Retained set of host-visible buffers.
#[derive(Default)]
pub struct Arena {
    limits: ArenaLimits,
    retained: Mutex<HashMap<usize, Box<[u8]>>>,
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("limits", &self.limits)
            .field("retained", &self.retained_count())
            .finish()
    }
}

impl Arena {
    pub fn new(limits: ArenaLimits) -> Self {
        Self {
            limits,
            retained: Mutex::new(HashMap::new()),
        }
    }

    pub fn limits(&self) -> ArenaLimits {
        self.limits
    }

    fn retained(&self) -> MutexGuard<'_, HashMap<usize, Box<[u8]>>> {
        // Entries are inserted and removed whole; a poisoned map is still
        // consistent.
        self.retained.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Allocate a zeroed buffer for the host and retain it.
    /// Returns 0 when `size` is zero or above the allocation limit.
    pub fn allocate(&self, size: usize) -> usize {
        if size == 0 || size > self.limits.max_alloc {
            log::warn!("rejected allocation of {} bytes", size);
            return 0;
        }
        self.retain(vec![0u8; size].into_boxed_slice())
    }

    /// Drop the buffer at `address` from the retained set. Unknown
    /// addresses are ignored.
    pub fn release(&self, address: usize) {
        if self.retained().remove(&address).is_none() {
            log::debug!("release of untracked address ignored");
        }
    }

    /// Copy a string into a new retained buffer.
    /// Empty strings and strings too long to pack deliver a null buffer.
    pub fn deliver(&self, s: &str) -> Delivery {
        self.deliver_bytes(s.as_bytes(), false)
    }

    /// Deliver a result: the value on success, the error message with the
    /// error flag set on failure.
    pub fn deliver_result<E: fmt::Display>(&self, result: Result<String, E>) -> Delivery {
        match result {
            Ok(value) => self.deliver_bytes(value.as_bytes(), false),
            Err(e) => self.deliver_bytes(e.to_string().as_bytes(), true),
        }
    }

    fn deliver_bytes(&self, bytes: &[u8], is_error: bool) -> Delivery {
        if bytes.is_empty() || bytes.len() > MAX_PACKED_LEN as usize {
            return Delivery {
                address: 0,
                len: 0,
                is_error,
            };
        }
        let address = self.retain(bytes.to_vec().into_boxed_slice());
        Delivery {
            address,
            len: bytes.len(),
            is_error,
        }
    }

    fn retain(&self, mut buf: Box<[u8]>) -> usize {
        let address = buf.as_mut_ptr() as usize;
        self.retained().insert(address, buf);
        address
    }

    /// Copy `len` bytes starting at `address`.
    ///
    /// Returns an empty vector when `len` is zero, above the read limit, or
    /// when the address range fails the sanity check. The retained set is
    /// not consulted.
    ///
    /// # Safety
    ///
    /// The caller must guarantee that `address..address + len` is readable
    /// memory for the duration of the call. Only the magnitude of the
    /// values is checked here, not ownership.
    pub unsafe fn read_bytes(&self, address: usize, len: usize) -> Vec<u8> {
        if len == 0 || len > self.limits.max_read {
            log::warn!("rejected read of {} bytes", len);
            return Vec::new();
        }
        if !address_in_bounds(address, len) {
            log::warn!("rejected read from out-of-range address");
            return Vec::new();
        }
        std::slice::from_raw_parts(address as *const u8, len).to_vec()
    }

    pub fn is_retained(&self, address: usize) -> bool {
        self.retained().contains_key(&address)
    }

    pub fn retained_count(&self) -> usize {
        self.retained().len()
    }

    pub fn retained_bytes(&self) -> usize {
        self.retained().values().map(|b| b.len()).sum()
    }
}

/// Non-null, no wrap-around, and inside linear memory on wasm32.
fn address_in_bounds(address: usize, len: usize) -> bool {
    if address == 0 {
        return false;
    }
    match address.checked_add(len) {
        Some(end) => end <= memory_limit(),
        None => false,
    }
}

#[cfg(target_arch = "wasm32")]
fn memory_limit() -> usize {
    core::arch::wasm32::memory_size(0) * 65536
}

#[cfg(not(target_arch = "wasm32"))]
fn memory_limit() -> usize {
    usize::MAX
}
