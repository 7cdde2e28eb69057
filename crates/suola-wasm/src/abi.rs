//! Raw boundary ABI
//!
//! Exports for hosts that can only exchange integers with the module
//! (wasmtime from Python, WASI runners). A call looks like:
//!
//! 1. `Malloc(len)` to get an input buffer
//! 2. write the UTF-8 input at the returned address
//! 3. `GetSignature(address, len)` returns a packed result
//! 4. read `packed & 0x7FFFFFFF` bytes at `packed >> 32`; bit 31 set means
//!    the bytes are an error message
//! 5. `Free(address)` on the input buffer
//!
//! Result buffers stay retained until `FreeResult(packed)` is called.
//! Hosts that never call it keep working; the retained set just grows.

use std::sync::OnceLock;

use crate::arena::{Arena, Delivery, PackedResult};

static ARENA: OnceLock<Arena> = OnceLock::new();

/// The process-wide boundary arena.
pub fn arena() -> &'static Arena {
    ARENA.get_or_init(Arena::default)
}

fn read_input(arena: &Arena, address: usize, len: usize) -> Result<String, String> {
    // SAFETY: the host promises `address..address + len` lies in our linear
    // memory; `read_bytes` bounds-checks the magnitude of both values.
    let bytes = unsafe { arena.read_bytes(address, len) };
    String::from_utf8(bytes).map_err(|_| "input is not valid UTF-8".to_string())
}

/// Body of `GetSignature`: sign the URL stored at `address`.
pub fn signature_call(arena: &Arena, address: usize, len: usize) -> Delivery {
    let result = read_input(arena, address, len)
        .and_then(|url| suola_core::signature_for(&url).map_err(|e| e.to_string()));
    if let Err(e) = &result {
        log::debug!("signature request failed: {}", e);
    }
    arena.deliver_result(result)
}

/// Body of `LoadRules`: publish the rule document stored at `address`.
/// On success the result is the number of loaded sites.
pub fn load_rules_call(arena: &Arena, address: usize, len: usize) -> Delivery {
    let result = read_input(arena, address, len).and_then(|doc| {
        suola_core::load(doc.as_bytes())
            .map(|rules| rules.len().to_string())
            .map_err(|e| e.to_string())
    });
    arena.deliver_result(result)
}

/// Body of `FreeResult`: release a delivered result buffer. Null addresses,
/// as carried by empty or unrepresentable results, are ignored.
pub fn free_result_call(arena: &Arena, address: usize) {
    if address != 0 {
        arena.release(address);
    }
}

/// Address half of a packed result.
pub fn result_address(packed: u64) -> usize {
    PackedResult::from_u64(packed).address() as usize
}

#[cfg(target_arch = "wasm32")]
#[allow(non_snake_case)]
mod exports {
    use super::*;

    #[no_mangle]
    pub extern "C" fn Malloc(size: u32) -> u32 {
        arena().allocate(size as usize) as u32
    }

    #[no_mangle]
    pub extern "C" fn Free(ptr: u32) {
        arena().release(ptr as usize);
    }

    #[no_mangle]
    pub extern "C" fn GetSignature(ptr: u32, len: u32) -> u64 {
        signature_call(arena(), ptr as usize, len as usize).packed().to_u64()
    }

    #[no_mangle]
    pub extern "C" fn LoadRules(ptr: u32, len: u32) -> u64 {
        load_rules_call(arena(), ptr as usize, len as usize).packed().to_u64()
    }

    #[no_mangle]
    pub extern "C" fn FreeResult(packed: u64) {
        free_result_call(arena(), result_address(packed));
    }
}
