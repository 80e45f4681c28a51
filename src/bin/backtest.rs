use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use gridiron_model::calibration::{self, Outcome, Prob3};
use gridiron_model::config::ModelConfig;
use gridiron_model::logging::init_logging;
use gridiron_model::sim::{SimulationOptions, Simulator};
use gridiron_model::slate::simulate_slate;

const DEFAULT_BINS: usize = 10;
const DEFAULT_DRAWS: usize = 5000;

#[derive(Debug, serde::Deserialize)]
struct BacktestCase {
    #[serde(default)]
    id: Option<String>,
    options: SimulationOptions,
    final_a: u32,
    final_b: u32,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let path = std::env::args()
        .nth(1)
        .filter(|arg| !arg.starts_with("--"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/backtest_cases.json"));
    let bins = parse_usize_arg("--bins").unwrap_or(DEFAULT_BINS).clamp(2, 50);
    let draws = parse_usize_arg("--draws");

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read backtest cases {}", path.display()))?;
    let cases: Vec<BacktestCase> = serde_json::from_str(&raw)
        .with_context(|| format!("parse backtest cases {}", path.display()))?;
    if cases.is_empty() {
        return Err(anyhow!("no backtest cases in {}", path.display()));
    }

    let matchups: Vec<SimulationOptions> = cases
        .iter()
        .map(|c| {
            let mut opts = c.options.clone();
            if let Some(n) = draws {
                opts.n = n;
            } else if opts.n == 0 {
                opts.n = DEFAULT_DRAWS;
            }
            opts
        })
        .collect();

    let sim = Simulator::new(ModelConfig::from_env()?);
    let results = simulate_slate(&sim, &matchups);

    let preds: Vec<Prob3> = results
        .iter()
        .map(|r| Prob3::from_summary(&r.summary))
        .collect();
    let outcomes: Vec<Outcome> = cases
        .iter()
        .map(|c| calibration::classify_outcome(c.final_a, c.final_b))
        .collect();

    println!("Backtest: {}", path.display());
    for ((case, pred), result) in cases.iter().zip(&preds).zip(&results) {
        println!(
            "{:<24} a={:.3} tie={:.3} b={:.3} final={}-{} engine={:?}",
            case.id.as_deref().unwrap_or("-"),
            pred.a,
            pred.tie,
            pred.b,
            case.final_a,
            case.final_b,
            result.meta.engine,
        );
    }
    println!();

    let metrics = calibration::evaluate_probs(&preds, &outcomes);
    let fallbacks = results.iter().filter(|r| r.used_fallback).count();
    println!(
        "samples={} brier={:.4} log_loss={:.4} accuracy={:.3} fallbacks={}",
        metrics.samples, metrics.brier, metrics.log_loss, metrics.accuracy, fallbacks
    );

    let base = calibration::empirical_outcome_probs(&outcomes);
    println!(
        "base rates a={:.3} tie={:.3} b={:.3}",
        base.a, base.tie, base.b
    );

    let (scale, tuned) = calibration::fit_logit_scale(&preds, &outcomes);
    println!(
        "best logit scale={:.2} log_loss={:.4} brier={:.4}",
        scale, tuned.log_loss, tuned.brier
    );

    println!();
    println!("Team A win reliability");
    for b in calibration::calibration_bins(&preds, &outcomes, Outcome::TeamA, bins) {
        if b.count == 0 {
            continue;
        }
        println!(
            "  [{:.2}, {:.2}) n={:<4} pred={:.3} actual={:.3}",
            b.bucket_start, b.bucket_end, b.count, b.avg_pred, b.actual_rate
        );
    }

    Ok(())
}

fn parse_usize_arg(name: &str) -> Option<usize> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&format!("{name}="))
            && let Ok(v) = raw.trim().parse::<usize>()
        {
            return Some(v);
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && let Ok(v) = next.trim().parse::<usize>()
        {
            return Some(v);
        }
    }
    None
}
