//! Rule set compilation
//!
//! Turns a decoded [`RuleDocument`] into an immutable [`RuleSet`]. Every
//! pattern and template is compiled up front; one bad rule fails the whole
//! load.

use std::collections::BTreeMap;

use regex::Regex;

use super::format::{RuleDocument, TemplateDocument, TestCase};
use crate::template::{Template, TemplateError};

/// Default rules shipped with the crate.
pub const DEFAULT_RULES: &[u8] = include_bytes!("../../rules.yaml");

/// Error type for rule set loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("parsing rule document: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("site #{index} has an empty domain")]
    EmptyDomain { index: usize },
    #[error("compiling pattern for domain {domain}: {source}")]
    Pattern {
        domain: String,
        #[source]
        source: regex::Error,
    },
    #[error("parsing template for domain {domain}: {source}")]
    Template {
        domain: String,
        #[source]
        source: TemplateError,
    },
    #[error("unknown transform '{name}' for field {field} in domain {domain}")]
    UnknownTransform {
        domain: String,
        field: String,
        name: String,
    },
}

// =============================================================================
// Compiled Rules
// =============================================================================

/// Per-field value transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Lowercase,
}

impl Transform {
    /// Look up a transform by its rule-file name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "lowercase" => Some(Self::Lowercase),
            _ => None,
        }
    }

    pub fn apply(self, value: &str) -> String {
        match self {
            Self::Lowercase => value.to_lowercase(),
        }
    }
}

/// One compiled rewrite template.
#[derive(Debug, Clone)]
pub struct TemplateRule {
    pub pattern: Option<Regex>,
    /// Field name -> query parameter key.
    pub query_params: BTreeMap<String, String>,
    pub template: Template,
    pub transform: BTreeMap<String, Transform>,
    pub tests: Vec<TestCase>,
}

impl TemplateRule {
    /// Whether this template applies to the given decoded path.
    /// Templates without a pattern apply to every path.
    #[inline]
    pub fn matches_path(&self, path: &str) -> bool {
        self.pattern.as_ref().map_or(true, |re| re.is_match(path))
    }
}

/// All templates for one domain, in declaration order.
#[derive(Debug, Clone)]
pub struct SiteRule {
    pub domain: String,
    pub templates: Vec<TemplateRule>,
    pub tests: Vec<TestCase>,
}

impl SiteRule {
    /// Site-level test cases followed by every template's test cases.
    pub fn test_cases(&self) -> impl Iterator<Item = &TestCase> {
        self.tests
            .iter()
            .chain(self.templates.iter().flat_map(|t| t.tests.iter()))
    }
}

/// Immutable, ordered rule set.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    sites: Vec<SiteRule>,
}

impl RuleSet {
    /// Decode and compile a YAML rule document.
    pub fn load(data: &[u8]) -> Result<Self, LoadError> {
        let document = RuleDocument::from_yaml(data)?;
        Self::compile(document)
    }

    /// Load the rules embedded in the crate.
    pub fn embedded() -> Result<Self, LoadError> {
        Self::load(DEFAULT_RULES)
    }

    /// Compile an already decoded document.
    pub fn compile(document: RuleDocument) -> Result<Self, LoadError> {
        let mut sites = Vec::with_capacity(document.sites.len());

        for (index, site) in document.sites.into_iter().enumerate() {
            let domain = site.domain.trim().to_ascii_lowercase();
            if domain.is_empty() {
                return Err(LoadError::EmptyDomain { index });
            }

            let templates = site
                .templates
                .into_iter()
                .map(|t| compile_template(&domain, t))
                .collect::<Result<Vec<_>, _>>()?;

            sites.push(SiteRule {
                domain,
                templates,
                tests: site.tests,
            });
        }

        log::debug!(
            "compiled {} sites, {} templates",
            sites.len(),
            sites.iter().map(|s| s.templates.len()).sum::<usize>()
        );

        Ok(Self { sites })
    }

    pub fn sites(&self) -> &[SiteRule] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn template_count(&self) -> usize {
        self.sites.iter().map(|s| s.templates.len()).sum()
    }
}

fn compile_template(domain: &str, doc: TemplateDocument) -> Result<TemplateRule, LoadError> {
    let template = Template::compile(&doc.template).map_err(|source| LoadError::Template {
        domain: domain.to_string(),
        source,
    })?;

    let pattern = match doc.pattern.as_deref() {
        Some(p) if !p.is_empty() => Some(Regex::new(p).map_err(|source| LoadError::Pattern {
            domain: domain.to_string(),
            source,
        })?),
        _ => None,
    };

    let mut transform = BTreeMap::new();
    for (field, name) in doc.transform {
        let action = Transform::from_name(&name).ok_or_else(|| LoadError::UnknownTransform {
            domain: domain.to_string(),
            field: field.clone(),
            name: name.clone(),
        })?;
        transform.insert(field, action);
    }

    Ok(TemplateRule {
        pattern,
        query_params: doc.query_params,
        template,
        transform,
        tests: doc.tests,
    })
}
