//! WebAssembly bindings for Suola
//!
//! Two host surfaces share one module:
//!
//! - `abi`: integer-only exports (`Malloc`, `Free`, `GetSignature`,
//!   `LoadRules`, `FreeResult`) backed by the retained-buffer [`arena`],
//!   for hosts with no shared memory management (wasmtime, WASI runners)
//! - `js` (feature `js`): `wasm-bindgen` functions for script-hosted pages

pub mod abi;
pub mod arena;

#[cfg(feature = "js")]
mod console;
#[cfg(feature = "js")]
pub mod js;

pub use arena::{Arena, ArenaLimits, Delivery, PackedResult};
