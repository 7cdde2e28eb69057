//! Rule document format
//!
//! Plain serde structures mirroring the YAML rule document. Nothing here is
//! compiled; see [`super::loader`] for that.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level rule document: an ordered list of sites.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleDocument {
    #[serde(default)]
    pub sites: Vec<SiteDocument>,
}

/// All rewrite templates for one domain.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteDocument {
    pub domain: String,
    #[serde(default)]
    pub templates: Vec<TemplateDocument>,
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

/// One rewrite template as written by the rule author.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateDocument {
    /// Regex with named groups, matched against the decoded path.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Field name -> query parameter key.
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,
    /// Output template using `{{Field}}` or `{{ .Field }}` placeholders.
    pub template: String,
    /// Field name -> transform name.
    #[serde(default)]
    pub transform: BTreeMap<String, String>,
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

/// Documented behaviour for one input URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TestCase {
    pub url: String,
    /// Expected canonical URL.
    #[serde(default)]
    pub expected: Option<String>,
    /// Expected signature, lowercase hex.
    #[serde(default)]
    pub signature: Option<String>,
    /// The URL is expected to be rejected.
    #[serde(default, alias = "fail", alias = "expect_failure")]
    pub expect_error: bool,
}

impl RuleDocument {
    /// Decode a YAML rule document.
    pub fn from_yaml(data: &[u8]) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_slice(data)
    }
}
