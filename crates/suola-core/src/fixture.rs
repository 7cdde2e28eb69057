//! Rule document test cases
//!
//! Test cases written next to the rules double as a conformance fixture.
//! This module runs them against a rule set and reports every case.

use crate::matcher::Matcher;
use crate::rules::{RuleSet, TestCase};

/// Outcome of a single test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    Failed(String),
}

/// Report for a single test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseReport {
    pub domain: String,
    pub url: String,
    pub outcome: CaseOutcome,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.outcome == CaseOutcome::Passed
    }
}

/// Run every test case in the rule set, in document order.
pub fn run_test_cases(rules: &RuleSet) -> Vec<CaseReport> {
    let matcher = Matcher::new(rules);
    let mut reports = Vec::new();

    for site in rules.sites() {
        for case in site.test_cases() {
            let outcome = check_case(&matcher, case);
            if let CaseOutcome::Failed(reason) = &outcome {
                log::warn!("{}: {} failed: {}", site.domain, case.url, reason);
            }
            reports.push(CaseReport {
                domain: site.domain.clone(),
                url: case.url.clone(),
                outcome,
            });
        }
    }

    reports
}

fn check_case(matcher: &Matcher<'_>, case: &TestCase) -> CaseOutcome {
    let result = matcher.canonicalize(&case.url);

    if case.expect_error {
        return match result {
            Ok(c) => CaseOutcome::Failed(format!("expected an error, got {}", c.canonical_url)),
            Err(_) => CaseOutcome::Passed,
        };
    }

    let result = match result {
        Ok(result) => result,
        Err(e) => return CaseOutcome::Failed(e.to_string()),
    };

    if let Some(expected) = &case.expected {
        if &result.canonical_url != expected {
            return CaseOutcome::Failed(format!(
                "expected URL {}, got {}",
                expected, result.canonical_url
            ));
        }
    }

    if let Some(signature) = &case.signature {
        if &result.signature != signature {
            return CaseOutcome::Failed(format!(
                "expected signature {}, got {}",
                signature, result.signature
            ));
        }
    }

    CaseOutcome::Passed
}
