//! Rule document format and compiled rule set
//!
//! This module provides the YAML document model and the loader that
//! compiles it into an immutable [`RuleSet`].

mod format;
mod loader;

pub use format::*;
pub use loader::*;
