//! Suola Core Library
//!
//! This crate canonicalizes URLs according to per-domain rewrite rules and
//! derives a stable signature (SHA-256, lowercase hex) from the canonical
//! form, so that URLs differing only in tracking parameters, casing or path
//! spelling collapse to one identity.
//!
//! # Architecture
//!
//! A rule set is loaded once from a YAML document, compiled eagerly and
//! published as an immutable snapshot. Each call normalizes the input URL,
//! selects the first usable template of the first matching site, extracts
//! fields from the path and query, renders the canonical URL and signs it.
//! No call mutates shared state.
//!
//! # Modules
//!
//! - `rules`: rule document format and compiled rule set
//! - `registry`: atomically published rule set snapshot
//! - `url`: structural URL normalization
//! - `extract`: field extraction from path captures and query parameters
//! - `template`: output URL templates
//! - `signature`: SHA-256 signatures
//! - `matcher`: the canonicalize-and-sign pipeline
//! - `fixture`: runner for test cases embedded in rule documents

pub mod error;
pub mod extract;
pub mod fixture;
pub mod matcher;
pub mod registry;
pub mod rules;
pub mod signature;
pub mod template;
pub mod url;

use std::sync::Arc;

// Re-export commonly used types
pub use error::SignError;
pub use matcher::{Canonicalization, Matcher};
pub use registry::RuleRegistry;
pub use rules::{LoadError, RuleSet, DEFAULT_RULES};
pub use signature::sign;

static RULES: RuleRegistry = RuleRegistry::new();

/// Decode, compile and publish a rule document process-wide.
pub fn load(data: &[u8]) -> Result<Arc<RuleSet>, LoadError> {
    RULES.load(data)
}

/// Publish an already compiled rule set process-wide.
pub fn install(rules: RuleSet) -> Arc<RuleSet> {
    RULES.publish(rules)
}

/// The published rule set. The embedded default rules are published on
/// first use if nothing else was.
pub fn rules() -> Result<Arc<RuleSet>, LoadError> {
    RULES.snapshot_or_init(RuleSet::embedded)
}

/// Canonicalize and sign a URL with the published rule set.
pub fn canonicalize(url: &str) -> Result<Canonicalization, SignError> {
    let rules = rules()?;
    Matcher::new(&rules).canonicalize(url)
}

/// Signature of a URL under the published rule set.
pub fn signature_for(url: &str) -> Result<String, SignError> {
    let rules = rules()?;
    Matcher::new(&rules).signature_for(url)
}
