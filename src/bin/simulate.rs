use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use gridiron_model::config::ModelConfig;
use gridiron_model::logging::init_logging;
use gridiron_model::sim::{SimulationOptions, Simulator};
use gridiron_model::teams::is_known_team;

#[derive(Debug, serde::Deserialize)]
struct MatchupCase {
    options: SimulationOptions,
    /// Model config file; falls back to `GRIDIRON_MODEL_CONFIG`, then defaults.
    #[serde(default)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("tests/fixtures/matchup_case.json"));

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("read matchup case {}", path.display()))?;
    let case: MatchupCase = serde_json::from_str(&raw)
        .with_context(|| format!("parse matchup case {}", path.display()))?;

    let config = match &case.config {
        Some(cfg_path) => ModelConfig::from_path(cfg_path)?,
        None => ModelConfig::from_env()?,
    };

    let sim = Simulator::new(config);
    let opts = &case.options;
    for team in [&opts.team_a.id, &opts.team_b.id] {
        if !is_known_team(team) {
            tracing::warn!(team = %team, "unrecognized team name, using it verbatim");
        }
    }
    let result = sim.simulate(opts);
    let s = result.summary;

    println!(
        "{} vs {} ({} draws)",
        label(&opts.team_a.label, &opts.team_a.id),
        label(&opts.team_b.label, &opts.team_b.id),
        result.draws.len()
    );
    println!("Team A win: {:.1}%", s.win_pct_a * 100.0);
    println!("Team B win: {:.1}%", s.win_pct_b * 100.0);
    println!("Tie: {:.1}%", s.tie_pct * 100.0);
    println!("Mean total: {:.2}", s.mean_total);
    println!("Mean margin (B - A): {:+.2}", s.mean_margin);
    println!(
        "Engine: {:?} lambda_a={:.2} lambda_b={:.2} fallback={}",
        result.meta.engine, result.meta.lambda_a, result.meta.lambda_b, result.used_fallback
    );

    Ok(())
}

fn label<'a>(label: &'a str, id: &'a str) -> &'a str {
    if label.trim().is_empty() { id } else { label }
}
