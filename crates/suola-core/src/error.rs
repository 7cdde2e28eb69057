//! Pipeline error type.

use crate::rules::LoadError;
use crate::url::NormalizeError;

/// Error returned by the canonicalize-and-sign pipeline.
///
/// A template that extracts no fields is skipped rather than reported, so
/// URLs that no template can handle end in `NoMatch`.
///
/// The `Display` form is what boundary callers receive as the error message,
/// so it never carries more than the offending URL or host.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("no matching rule found for host {host}")]
    NoMatch { host: String },
    #[error("rule set unavailable: {0}")]
    Rules(#[from] LoadError),
}

impl SignError {
    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Normalize(_) => "normalize",
            Self::NoMatch { .. } => "no_match",
            Self::Rules(_) => "rules",
        }
    }
}
