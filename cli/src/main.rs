//! chainlog: build, verify, and query tamper-evident audit ledgers.
//!
//! Usage:
//!   chainlog demo --records 8 --difficulty 2 --out ledger.json
//!   chainlog verify ledger.json
//!   chainlog stats ledger.yaml
//!   chainlog find ledger.json --actor ci_bot --limit 5
//!   chainlog find ledger.json --since 2026-01-01T00:00:00Z --severity error
//!
//! Set RUST_LOG=info (or debug) to see ledger events on stderr.

use std::path::{Path, PathBuf};
use std::process;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use chainlog_chain::{Chain, ExportFormat};
use chainlog_contracts::{
    config::LedgerConfig,
    error::{LedgerError, LedgerResult},
    finding::{Finding, Violation},
    kinds::{Classification, Severity, TargetType},
    signature::SigningKey,
};
use chainlog_core::{Filter, DEFAULT_LIMIT};
use chainlog_scope::{AuditScope, ScopeSpec};
use chainlog_store::AuditStore;

// ── CLI definition ────────────────────────────────────────────────────────────

/// chainlog: an append-only, hash-chained audit ledger.
#[derive(Parser)]
#[command(
    name = "chainlog",
    about = "Tamper-evident audit ledger tooling",
    long_about = "Builds sample audit chains and verifies, summarizes, and searches\n\
                  chain exports written as JSON or YAML."
)]
struct Cli {
    /// Ledger configuration (TOML). Defaults apply when omitted.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build a sample ledger, sign it, and report on it.
    Demo {
        /// Number of records to append after genesis.
        #[arg(long, default_value_t = 6)]
        records: usize,
        /// Proof-of-work difficulty; overrides the configuration.
        #[arg(long)]
        difficulty: Option<usize>,
        /// Write the chain export here.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Export format: json or yaml.
        #[arg(long)]
        format: Option<String>,
    },
    /// Check hashes, links, proof-of-work, and signatures of an export.
    Verify {
        file: PathBuf,
        #[arg(long)]
        format: Option<String>,
        /// Difficulty the chain was mined at; overrides the configuration.
        #[arg(long)]
        difficulty: Option<usize>,
    },
    /// Print chain statistics as JSON.
    Stats {
        file: PathBuf,
        #[arg(long)]
        format: Option<String>,
    },
    /// Print matching records as JSON, newest first.
    Find {
        file: PathBuf,
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        actor: Option<String>,
        #[arg(long)]
        action: Option<String>,
        #[arg(long)]
        target_type: Option<TargetType>,
        #[arg(long)]
        severity: Option<Severity>,
        /// Earliest timestamp to include (RFC 3339).
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Latest timestamp to include (RFC 3339).
        #[arg(long)]
        until: Option<DateTime<Utc>>,
        #[arg(long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Command::Demo {
            records,
            difficulty,
            out,
            format,
        } => run_demo(config, records, difficulty, out.as_deref(), format.as_deref()),
        Command::Verify {
            file,
            format,
            difficulty,
        } => run_verify(&config, &file, format.as_deref(), difficulty),
        Command::Stats { file, format } => run_stats(&config, &file, format.as_deref()),
        Command::Find {
            file,
            format,
            actor,
            action,
            target_type,
            severity,
            since,
            until,
            limit,
            offset,
        } => {
            let filter = Filter {
                target_type,
                action,
                actor,
                severity,
                since,
                until,
                limit,
                offset,
            };
            run_find(&config, &file, format.as_deref(), &filter)
        }
    });

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("chainlog error: {}", e);
            process::exit(2);
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_demo(
    mut config: LedgerConfig,
    count: usize,
    difficulty: Option<usize>,
    out: Option<&Path>,
    format: Option<&str>,
) -> LedgerResult<bool> {
    if let Some(d) = difficulty {
        config.difficulty = d;
    }

    println!("Building a {}-record ledger at difficulty {}", count, config.difficulty);
    let (chain, store) = build_demo_ledger(&config, count)?;

    let stats = chain.statistics();
    println!("{}", to_json(&stats)?);

    let chain_valid = chain.verify_chain();
    let signatures = chain.verify_signatures();
    let signatures_valid = signatures.values().all(|valid| *valid);
    let store_valid = store.verify_integrity()?;
    println!(
        "chain valid: {}  signatures valid: {}/{}  store valid: {}",
        chain_valid,
        signatures.values().filter(|valid| **valid).count(),
        signatures.len(),
        store_valid
    );

    if let Some(path) = out {
        let format = resolve_format(&config, path, format)?;
        let text = chain.export(format)?;
        std::fs::write(path, text).map_err(|e| io_error(path, e))?;
        info!(path = %path.display(), format = %format, "ledger exported");
        println!("wrote {} records to {}", chain.len(), path.display());
    }

    Ok(chain_valid && signatures_valid && store_valid)
}

fn run_verify(
    config: &LedgerConfig,
    file: &Path,
    format: Option<&str>,
    difficulty: Option<usize>,
) -> LedgerResult<bool> {
    let chain = load_chain(config, file, format, difficulty)?;

    let report = chain.integrity_report();
    let signatures = chain.verify_signatures();
    let bad_signatures: Vec<&String> = signatures
        .iter()
        .filter(|(_, valid)| !**valid)
        .map(|(id, _)| id)
        .collect();

    println!("{}", to_json(&report)?);
    if bad_signatures.is_empty() {
        println!("signatures: all {} records valid", signatures.len());
    } else {
        for id in &bad_signatures {
            println!("signatures: record {} has an invalid signature", id);
        }
    }

    let valid = report.is_valid() && bad_signatures.is_empty();
    println!(
        "{}: {}",
        file.display(),
        if valid { "VERIFIED" } else { "TAMPERED" }
    );
    Ok(valid)
}

fn run_stats(config: &LedgerConfig, file: &Path, format: Option<&str>) -> LedgerResult<bool> {
    let chain = load_chain(config, file, format, None)?;
    println!("{}", to_json(&chain.statistics())?);
    Ok(true)
}

fn run_find(
    config: &LedgerConfig,
    file: &Path,
    format: Option<&str>,
    filter: &Filter,
) -> LedgerResult<bool> {
    let chain = load_chain(config, file, format, None)?;
    println!("{}", to_json(&chain.find(filter))?);
    Ok(true)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> LedgerResult<LedgerConfig> {
    match path {
        Some(path) => LedgerConfig::from_file(path),
        None => Ok(LedgerConfig::default()),
    }
}

fn load_chain(
    config: &LedgerConfig,
    file: &Path,
    format: Option<&str>,
    difficulty: Option<usize>,
) -> LedgerResult<Chain> {
    let format = resolve_format(config, file, format)?;
    let text = std::fs::read_to_string(file).map_err(|e| io_error(file, e))?;
    Chain::import(&text, format, difficulty.unwrap_or(config.difficulty))
}

/// Explicit flag, then file extension, then the configured default.
fn resolve_format(
    config: &LedgerConfig,
    path: &Path,
    explicit: Option<&str>,
) -> LedgerResult<ExportFormat> {
    if let Some(format) = explicit {
        return format.parse();
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(ExportFormat::Json),
        Some("yaml" | "yml") => Ok(ExportFormat::Yaml),
        _ => config.export.default_format.parse(),
    }
}

/// Record `count` scoped operations, sign each on the chain, and mirror the
/// signed copy into the store.
fn build_demo_ledger(config: &LedgerConfig, count: usize) -> LedgerResult<(Chain, AuditStore)> {
    let chain = Chain::with_config(config)?;
    let store = AuditStore::new();
    let key = SigningKey::new("demo-key");

    for i in 0..count {
        let outcome = AuditScope::run(&chain, &store, demo_spec(i), |scope| {
            scope.add_context("iteration", i);
            match i % 3 {
                0 => {
                    scope.add_finding(
                        Finding::new("complexity", Severity::Warning, "function exceeds 40 lines")
                            .with_location(format!("src/module_{i}.py:12")),
                    );
                    Ok(())
                }
                1 => {
                    scope.add_violation(
                        Violation::new("E501", Severity::Info, "line too long")
                            .at(format!("src/module_{i}.py"), 88, Some(100)),
                    );
                    Ok(())
                }
                _ => Err(LedgerError::Backend {
                    backend: "ci-runner".to_string(),
                    reason: "job timed out".to_string(),
                }),
            }
        });
        let record = outcome.record?;

        chain.sign(record.id(), &key, "demo-auditor")?;
        let signed = chain.get(record.id()).ok_or_else(|| LedgerError::RecordNotFound {
            record_id: record.id().to_string(),
        })?;
        store.put(&signed)?;
    }

    Ok((chain, store))
}

fn demo_spec(i: usize) -> ScopeSpec {
    const ACTORS: [&str; 3] = ["ci_bot", "alice", "release_manager"];
    const ACTIONS: [&str; 3] = ["lint", "format", "deploy"];

    let (target, target_type) = match i % 3 {
        0 => (format!("src/module_{i}.py"), TargetType::File),
        1 => ("quality-gate".to_string(), TargetType::Quality),
        _ => ("payments-service".to_string(), TargetType::Service),
    };

    ScopeSpec::new(ACTORS[i % 3], ACTIONS[i % 3], target, target_type, "chainlog-demo")
        .reason(format!("demo step {}", i + 1))
        .classification(if i % 3 == 2 {
            Classification::Confidential
        } else {
            Classification::Internal
        })
}

fn to_json<T: serde::Serialize>(value: &T) -> LedgerResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| LedgerError::Serialization {
        reason: e.to_string(),
    })
}

fn io_error(path: &Path, e: std::io::Error) -> LedgerError {
    LedgerError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
