//! Runs the test cases embedded in the default rules and checks the
//! process-wide entry points against them.

use suola_core::fixture::run_test_cases;
use suola_core::signature::is_signature;
use suola_core::{sign, Matcher, RuleSet, SignError};

#[test]
fn embedded_rule_test_cases_pass() {
    let rules = RuleSet::embedded().unwrap();
    let reports = run_test_cases(&rules);
    assert!(!reports.is_empty());

    let failures: Vec<_> = reports.iter().filter(|r| !r.passed()).collect();
    assert!(failures.is_empty(), "failing cases: {failures:#?}");
}

#[test]
fn every_site_documents_its_behaviour() {
    let rules = RuleSet::embedded().unwrap();
    for site in rules.sites() {
        assert!(site.test_cases().count() > 0, "{} has no test cases", site.domain);
    }
}

#[test]
fn round_trip_fixture() {
    let rules = RuleSet::load(
        br#"
sites:
  - domain: iltalehti.fi
    templates:
      - pattern: "/(?P<Section>[^/]+)/a/(?P<ArticleID>[^/]+)"
        template: "https://www.iltalehti.fi/{{Section}}/a/{{ArticleID}}"
        transform:
          Section: lowercase
"#,
    )
    .unwrap();
    let matcher = Matcher::new(&rules);
    let result = matcher
        .canonicalize("https://iltalehti.fi/Politiikka/a/2b2ac72b-42df-4d8f-a9ee-7e731216d880")
        .unwrap();

    let expected = "https://www.iltalehti.fi/politiikka/a/2b2ac72b-42df-4d8f-a9ee-7e731216d880";
    assert_eq!(result.canonical_url, expected);
    assert_eq!(result.signature, sign(expected));
    assert_eq!(
        result.signature,
        "8c892bc5d3b84e788023666f19a4471f423d870e6c29996bfbd13e55abf21e3c"
    );
}

#[test]
fn global_entry_points_use_default_rules() {
    let url = "https://www.iltalehti.fi/telkku";
    let first = suola_core::signature_for(url).unwrap();
    let second = suola_core::signature_for(url).unwrap();
    assert_eq!(first, second);
    assert!(is_signature(&first));
    assert_eq!(
        first,
        "459be7edc490987a93c52288bf98d28485b9be7e47295b2ce083a1f89b36e0ec"
    );

    let canonical = suola_core::canonicalize(url).unwrap();
    assert_eq!(canonical.canonical_url, url);
    assert_eq!(canonical.signature, first);
}

#[test]
fn global_no_match_is_an_error_value() {
    let err = suola_core::signature_for("https://unknown.invalid/x").unwrap_err();
    assert!(matches!(err, SignError::NoMatch { .. }));
    assert_eq!(err.to_string(), "no matching rule found for host unknown.invalid");
}

#[test]
fn installed_rule_set_serves_global_calls() {
    let installed = suola_core::install(RuleSet::embedded().unwrap());
    let current = suola_core::rules().unwrap();
    assert!(std::sync::Arc::ptr_eq(&installed, &current));

    let url = "https://www.iltalehti.fi/telkku";
    assert_eq!(
        suola_core::signature_for(url).unwrap(),
        Matcher::new(&installed).signature_for(url).unwrap()
    );
}
