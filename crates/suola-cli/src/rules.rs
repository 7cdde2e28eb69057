use std::fs;
use std::path::Path;

use suola_core::{RuleSet, DEFAULT_RULES};

/// Read a rule document, or the embedded default when no path is given.
pub fn read_rules(path: Option<&Path>) -> Result<Vec<u8>, String> {
    match path {
        Some(path) => fs::read(path).map_err(|e| format!("Failed to read '{}': {}", path.display(), e)),
        None => Ok(DEFAULT_RULES.to_vec()),
    }
}

/// Load and publish the rule set for this process.
pub fn install_rules(path: Option<&Path>) -> Result<std::sync::Arc<RuleSet>, String> {
    let bytes = read_rules(path)?;
    let rules = RuleSet::load(&bytes).map_err(|e| format!("Invalid rules: {}", e))?;
    let rules = suola_core::install(rules);

    match path {
        Some(path) => tracing::info!(path = %path.display(), sites = rules.len(), "loaded custom rules"),
        None => tracing::info!(sites = rules.len(), "using embedded default rules"),
    }
    Ok(rules)
}
