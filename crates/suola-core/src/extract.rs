//! Field extraction
//!
//! Builds the per-call field map for one template. Sources are applied in a
//! fixed order:
//!
//! 1. named, non-empty captures of the pattern against the decoded path
//! 2. configured query parameters with a non-empty value, which overwrite
//!    any capture of the same name
//!
//! Transforms run last, on the merged map.

use std::collections::HashMap;

use url::Url;

use crate::rules::TemplateRule;
use crate::url::{decoded_path, query_value};

/// Error type for field extraction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("no fields extracted from URL: {0}")]
    NoFields(String),
}

/// Field name -> value for one URL.
pub type Fields = HashMap<String, String>;

/// Extract fields from a normalized URL for one template.
pub fn extract(url: &Url, rule: &TemplateRule) -> Result<Fields, ExtractError> {
    let path = decoded_path(url);
    extract_from(url, &path, rule)
}

pub(crate) fn extract_from(url: &Url, path: &str, rule: &TemplateRule) -> Result<Fields, ExtractError> {
    let mut fields = Fields::new();

    if let Some(re) = &rule.pattern {
        match re.captures(path) {
            Some(caps) => {
                for name in re.capture_names().flatten() {
                    if let Some(m) = caps.name(name) {
                        if !m.as_str().is_empty() {
                            fields.insert(name.to_string(), m.as_str().to_string());
                        }
                    }
                }
            }
            None => log::debug!("no match in path '{}' for pattern '{}'", path, re.as_str()),
        }
    }

    for (field, key) in &rule.query_params {
        if let Some(value) = query_value(url, key) {
            fields.insert(field.clone(), value);
        }
    }

    for (field, transform) in &rule.transform {
        if let Some(value) = fields.get_mut(field) {
            *value = transform.apply(value);
        }
    }

    if fields.is_empty() {
        return Err(ExtractError::NoFields(url.to_string()));
    }
    Ok(fields)
}
