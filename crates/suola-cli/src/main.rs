//! Suola CLI
//!
//! Canonicalize and sign URLs, and check rule documents against their
//! embedded test cases.

mod logging;
mod rules;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use suola_core::fixture::{run_test_cases, CaseOutcome};
use suola_core::{Matcher, RuleSet};

#[derive(Parser)]
#[command(name = "suola")]
#[command(about = "Rule-based URL canonicalization and signatures")]
struct Cli {
    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the signature of a URL
    Sign {
        /// URL to process
        #[arg(short, long)]
        url: String,

        /// Rule document (defaults to the embedded rules)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// Also print the canonical URL
        #[arg(short, long)]
        canonical: bool,
    },

    /// Sign URLs read line by line from stdin
    Stream {
        /// Rule document (defaults to the embedded rules)
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Run the test cases embedded in a rule document
    Check {
        /// Rule document (defaults to the embedded rules)
        #[arg(short, long)]
        rules: Option<PathBuf>,
    },

    /// Validate a rule document
    Validate {
        /// Rule document to validate
        #[arg(short, long)]
        rules: PathBuf,
    },
}

#[derive(Serialize)]
struct SignOutput<'a> {
    url: &'a str,
    canonical_url: &'a str,
    signature: &'a str,
    domain: &'a str,
}

#[derive(Serialize)]
struct CaseOutput<'a> {
    domain: &'a str,
    url: &'a str,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Sign { url, rules, canonical } => cmd_sign(&url, rules, canonical, cli.json),
        Commands::Stream { rules } => cmd_stream(rules),
        Commands::Check { rules } => cmd_check(rules, cli.json),
        Commands::Validate { rules } => cmd_validate(rules),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn cmd_sign(url: &str, rules_path: Option<PathBuf>, canonical: bool, json: bool) -> Result<(), String> {
    let rules = rules::install_rules(rules_path.as_deref())?;
    let result = Matcher::new(&rules).canonicalize(url).map_err(|e| e.to_string())?;

    if json {
        let output = SignOutput {
            url,
            canonical_url: &result.canonical_url,
            signature: &result.signature,
            domain: &result.domain,
        };
        let text = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
        println!("{text}");
    } else if canonical {
        println!("Canonical URL: {}", result.canonical_url);
        println!("Signature:     {}", result.signature);
    } else {
        println!("{}", result.signature);
    }

    Ok(())
}

fn cmd_stream(rules_path: Option<PathBuf>) -> Result<(), String> {
    let rules = rules::install_rules(rules_path.as_deref())?;
    let matcher = Matcher::new(&rules);

    eprintln!("Ready.");
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.map_err(|e| format!("Failed to read stdin: {}", e))?;
        let url = line.trim();
        if url.is_empty() {
            continue;
        }

        let written = match matcher.signature_for(url) {
            Ok(signature) => writeln!(stdout, "{signature}"),
            Err(e) => {
                tracing::debug!(url, error = %e, "signing failed");
                writeln!(stdout, "error: {e}")
            }
        };
        written
            .and_then(|_| stdout.flush())
            .map_err(|e| format!("Failed to write stdout: {}", e))?;
    }

    Ok(())
}

fn cmd_check(rules_path: Option<PathBuf>, json: bool) -> Result<(), String> {
    let rules = rules::install_rules(rules_path.as_deref())?;
    let reports = run_test_cases(&rules);
    let failed = reports.iter().filter(|r| !r.passed()).count();

    if json {
        let output: Vec<CaseOutput<'_>> = reports
            .iter()
            .map(|r| CaseOutput {
                domain: &r.domain,
                url: &r.url,
                passed: r.passed(),
                reason: match &r.outcome {
                    CaseOutcome::Passed => None,
                    CaseOutcome::Failed(reason) => Some(reason.as_str()),
                },
            })
            .collect();
        let text = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        for report in &reports {
            match &report.outcome {
                CaseOutcome::Passed => println!("  ok    {} {}", report.domain, report.url),
                CaseOutcome::Failed(reason) => {
                    println!("  FAIL  {} {}", report.domain, report.url);
                    println!("        {}", reason);
                }
            }
        }
        println!();
        println!("{} cases, {} passed, {} failed", reports.len(), reports.len() - failed, failed);
    }

    if failed > 0 {
        return Err(format!("{} test case(s) failed", failed));
    }
    Ok(())
}

fn cmd_validate(rules_path: PathBuf) -> Result<(), String> {
    let bytes = rules::read_rules(Some(&rules_path))?;
    let rules = RuleSet::load(&bytes).map_err(|e| format!("Invalid rules: {}", e))?;
    let cases: usize = rules.sites().iter().map(|s| s.test_cases().count()).sum();

    println!("Rules '{}' are valid", rules_path.display());
    println!("  Sites:       {}", rules.len());
    println!("  Templates:   {}", rules.template_count());
    println!("  Test cases:  {}", cases);
    println!("  Size:        {} bytes", bytes.len());

    Ok(())
}
