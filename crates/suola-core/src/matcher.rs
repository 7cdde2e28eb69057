//! Rule Matching Engine
//!
//! Every call goes through here: normalize, pick the first usable template,
//! extract fields, render the canonical URL and sign it. The matcher only
//! borrows the rule set, so a caller holding a snapshot sees one consistent
//! version for the whole call.

use url::Url;

use crate::error::SignError;
use crate::extract::{extract_from, Fields};
use crate::rules::{RuleSet, SiteRule, TemplateRule};
use crate::signature::sign;
use crate::url::{decoded_path, host_in_domain, normalize_url};

// =============================================================================
// Matcher
// =============================================================================

/// The rule matching engine.
pub struct Matcher<'a> {
    rules: &'a RuleSet,
}

/// The template selected for a URL together with its extracted fields.
#[derive(Debug)]
pub struct RuleMatch<'a> {
    pub site: &'a SiteRule,
    pub template: &'a TemplateRule,
    pub fields: Fields,
}

impl RuleMatch<'_> {
    /// Render the canonical URL for this match.
    pub fn render(&self) -> String {
        self.template.template.render(&self.fields)
    }
}

/// Result of the full pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalization {
    pub canonical_url: String,
    pub signature: String,
    /// Domain of the site rule that produced the canonical URL.
    pub domain: String,
}

impl<'a> Matcher<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Find the first usable template for an already normalized URL.
    ///
    /// Sites are tried in order; within a site, templates are tried in
    /// order. A template is usable when its pattern matches the decoded path
    /// (or it has none) and extraction yields at least one field. When
    /// nothing is usable the result is `NoMatch`, even if some template was
    /// skipped for extracting no fields.
    pub fn match_url(&self, url: &Url) -> Result<RuleMatch<'a>, SignError> {
        let host = url.host_str().unwrap_or("");
        let path = decoded_path(url);

        for site in self.rules.sites() {
            if !host_in_domain(host, &site.domain) {
                continue;
            }

            for template in &site.templates {
                if !template.matches_path(&path) {
                    continue;
                }

                match extract_from(url, &path, template) {
                    Ok(fields) => {
                        log::debug!(
                            "matched {} with site {} template '{}'",
                            url,
                            site.domain,
                            template.template.source()
                        );
                        return Ok(RuleMatch { site, template, fields });
                    }
                    Err(e) => {
                        log::warn!("skipping template '{}' for {}: {}", template.template.source(), url, e);
                    }
                }
            }
        }

        Err(SignError::NoMatch {
            host: host.to_string(),
        })
    }

    /// Normalize and rewrite a raw URL into its canonical form.
    pub fn canonical_url(&self, raw: &str) -> Result<(String, &'a SiteRule), SignError> {
        let url = normalize_url(raw, true)?;
        let matched = self.match_url(&url)?;
        Ok((matched.render(), matched.site))
    }

    /// Run the whole pipeline.
    pub fn canonicalize(&self, raw: &str) -> Result<Canonicalization, SignError> {
        let (canonical_url, site) = self.canonical_url(raw)?;
        let signature = sign(&canonical_url);
        Ok(Canonicalization {
            canonical_url,
            signature,
            domain: site.domain.clone(),
        })
    }

    /// Signature of the canonical form of `raw`.
    pub fn signature_for(&self, raw: &str) -> Result<String, SignError> {
        let (canonical_url, _) = self.canonical_url(raw)?;
        Ok(sign(&canonical_url))
    }
}
