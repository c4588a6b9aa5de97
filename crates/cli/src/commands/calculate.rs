use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use mirath_core::{EstateData, RuleDatabase};
use mirath_eval::{
    CachedEngine, CalculationRequest, CalculationResult, Calculator, Engine, ShareBasis,
};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::CliConfig;
use crate::manifest::build_envelope;
use crate::{report_error, OutputFormat};

/// Flags of `mirath calculate`.
pub(crate) struct CalculateArgs {
    pub input: Option<PathBuf>,
    pub madhab: Option<String>,
    pub total: Option<String>,
    pub funeral: Option<String>,
    pub debts: Option<String>,
    pub bequest: Option<String>,
    pub heirs: Vec<(String, i64)>,
    pub steps: bool,
}

pub(crate) fn cmd_calculate(
    args: &CalculateArgs,
    cfg: &CliConfig,
    output: OutputFormat,
    quiet: bool,
) {
    let requests = match &args.input {
        Some(path) => read_requests(path),
        None => request_from_flags(args, cfg).map(|r| vec![r]),
    };
    let requests = match requests {
        Ok(r) => r,
        Err(msg) => {
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    };

    let engine = CachedEngine::new(
        Engine::new(RuleDatabase::classical(), cfg.engine.clone()),
        &cfg.cache,
    );
    let results: Vec<CalculationResult> = requests.iter().map(|r| engine.calculate(r)).collect();
    let stats = engine.stats();
    debug!(
        requests = requests.len(),
        hits = stats.hits,
        misses = stats.misses,
        "calculation batch finished"
    );

    let mut failed = false;
    for result in &results {
        if let Some(error) = &result.error {
            failed = true;
            let msg = format!("error: {} ({})", error.message, error.code);
            report_error(&msg, output, quiet);
        }
    }

    if !quiet {
        match output {
            OutputFormat::Json => {
                let envelopes: Vec<serde_json::Value> = results
                    .iter()
                    .map(|r| build_envelope(serde_json::to_value(r).unwrap_or_default()))
                    .collect();
                // A request file always answers with an array.
                let json_output = if args.input.is_some() {
                    serde_json::Value::Array(envelopes)
                } else {
                    envelopes.into_iter().next().unwrap_or_default()
                };
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json_output)
                        .unwrap_or_else(|e| format!("serialization error: {}", e))
                );
            }
            OutputFormat::Text => {
                for (i, result) in results.iter().filter(|r| r.success).enumerate() {
                    if i > 0 {
                        println!();
                    }
                    print_result(result, args.steps);
                }
            }
        }
    }

    if failed {
        process::exit(1);
    }
}

/// Read one request object, or an array of them, from a JSON file.
fn read_requests(path: &Path) -> Result<Vec<CalculationRequest>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|_| format!("error: input file not found: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| format!("error: invalid JSON in {}: {}", path.display(), e))?;
    let requests = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<CalculationRequest>, _>>(),
        other => serde_json::from_value(other).map(|r| vec![r]),
    };
    let requests =
        requests.map_err(|e| format!("error: invalid request in {}: {}", path.display(), e))?;
    if requests.is_empty() {
        return Err(format!("error: no requests in {}", path.display()));
    }
    Ok(requests)
}

fn request_from_flags(args: &CalculateArgs, cfg: &CliConfig) -> Result<CalculationRequest, String> {
    let total = args
        .total
        .as_deref()
        .ok_or_else(|| "error: --total is required unless --input is given".to_string())?;
    let estate = EstateData::new(parse_amount("--total", total)?)
        .with_funeral_costs(parse_optional_amount("--funeral", args.funeral.as_deref())?)
        .with_debts(parse_optional_amount("--debts", args.debts.as_deref())?)
        .with_bequest(parse_optional_amount("--bequest", args.bequest.as_deref())?);
    let madhab = cfg.madhab_or_default(args.madhab.as_deref());
    Ok(args
        .heirs
        .iter()
        .fold(CalculationRequest::new(&madhab, estate), |req, (key, count)| {
            req.heir(key, *count)
        }))
}

fn parse_amount(flag: &str, raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|e| format!("error: invalid amount for {}: {}", flag, e))
}

fn parse_optional_amount(flag: &str, raw: Option<&str>) -> Result<Decimal, String> {
    raw.map_or(Ok(Decimal::ZERO), |r| parse_amount(flag, r))
}

fn basis_label(basis: ShareBasis) -> &'static str {
    match basis {
        ShareBasis::Fixed => "fixed",
        ShareBasis::Residuary => "residuary",
        ShareBasis::FixedAndResiduary => "fixed+residuary",
    }
}

fn print_result(result: &CalculationResult, steps: bool) {
    if let Some(madhab) = result.madhab {
        match &result.rule_set_version {
            Some(version) => println!("Madhab: {} (rules {})", madhab.name(), version),
            None => println!("Madhab: {}", madhab.name()),
        }
    }
    if let Some(net) = result.net_estate {
        println!("Net estate: {}", net);
    }
    println!(
        "{:<22} {:>5}  {:<8} {:>14}  {}",
        "Heir", "Count", "Share", "Amount", "Basis"
    );
    for share in &result.shares {
        println!(
            "{:<22} {:>5}  {:<8} {:>14}  {}",
            share.heir.label(),
            share.count,
            share.fraction.to_string(),
            share.amount.to_string(),
            basis_label(share.basis)
        );
    }
    if !result.exclusions.is_empty() {
        println!("Excluded:");
        for exclusion in &result.exclusions {
            println!("  {} ({})", exclusion.heir.label(), exclusion.reason);
        }
    }
    if result.awl_applied {
        println!("Awl applied: shares reduced proportionally");
    }
    if result.radd_applied {
        println!("Radd applied: surplus returned to fixed-share heirs");
    }
    println!("Confidence: {:.2}", result.confidence);
    if steps {
        println!("Steps:");
        for step in &result.steps {
            println!("  [{}] {}: {}", step.tag, step.title, step.description);
        }
    }
}
