use std::collections::HashSet;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::constants::{
    clamp, Metric, ScoringWeights, CLASSIC_SCORE_MAX, CORRELATION_LIMIT, FOOTBALL_SCORE_GRID,
    LAMBDA_EVENTS_FLOOR, LAMBDA_POINTS_FLOOR, POINTS_PER_EVENT_FLOOR,
};
use crate::expectation::{expected_points_with, PriorsCache};
use crate::priors::{PriorsContext, TeamPriors};
use crate::rng::{correlate, normal_cdf, poisson_inverse, SimRng};

const WARNED_CAPACITY: usize = 512;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimTeam {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub is_home: bool,
}

impl SimTeam {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            is_home: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Team,
    Classic,
}

/// Market-implied inputs for the classic engine. Missing fields use `ModelConfig::classic`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassicFallbackInput {
    /// Spread from team B's point of view; negative means B is favored.
    pub spread: Option<f64>,
    pub total: Option<f64>,
    pub margin_stdev: Option<f64>,
    pub total_stdev: Option<f64>,
    pub correlation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOptions {
    pub team_a: SimTeam,
    pub team_b: SimTeam,
    pub n: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub corr: Option<f64>,
    #[serde(default = "default_round_to_grid")]
    pub round_to_grid: bool,
    #[serde(default)]
    pub context: PriorsContext,
    #[serde(default)]
    pub classic_fallback: ClassicFallbackInput,
    #[serde(default)]
    pub engine: Engine,
}

fn default_round_to_grid() -> bool {
    true
}

impl SimulationOptions {
    pub fn new(team_a: &str, team_b: &str, n: usize) -> Self {
        Self {
            team_a: SimTeam::new(team_a),
            team_b: SimTeam::new(team_b),
            n,
            seed: None,
            corr: None,
            round_to_grid: true,
            context: PriorsContext::default(),
            classic_fallback: ClassicFallbackInput::default(),
            engine: Engine::Team,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationDraw {
    pub a: u32,
    pub b: u32,
}

impl SimulationDraw {
    /// Margin from team B's side.
    pub fn margin(&self) -> i64 {
        self.b as i64 - self.a as i64
    }

    pub fn total(&self) -> u32 {
        self.a + self.b
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub win_pct_a: f64,
    pub win_pct_b: f64,
    pub tie_pct: f64,
    pub mean_total: f64,
    /// Average of `b - a`.
    pub mean_margin: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationMeta {
    pub lambda_a: f64,
    pub lambda_b: f64,
    pub engine: Engine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub draws: Vec<SimulationDraw>,
    pub summary: SimulationSummary,
    pub used_fallback: bool,
    pub meta: SimulationMeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringOutcome {
    pub points: u32,
    pub weight: f64,
}

/// Normalized mix of scoring events for one offense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringProfile {
    pub outcomes: [ScoringOutcome; 5],
    pub expected_points_per_event: f64,
}

impl ScoringProfile {
    pub fn from_priors(priors: &TeamPriors, base: &ScoringWeights) -> Self {
        let league_redzone = Metric::RedzoneOffTd.league_mean();
        let league_explosive = Metric::ExplosiveRateOff.league_mean();

        let td_base = clamp(0.45 + (priors.redzone_off_td - league_redzone) * 0.9, 0.25, 0.82);
        let explosive_bonus =
            clamp((priors.explosive_rate_off - league_explosive) * 1.3, -0.12, 0.12);
        let field_goal = clamp(
            base.field_goal + (league_redzone - priors.redzone_off_td) * 0.4
                - explosive_bonus * 0.25,
            0.12,
            0.5,
        );
        let two_point = clamp(base.two_point + explosive_bonus * 0.4, 0.01, 0.12);
        let safety = clamp(
            base.safety
                + (priors.takeaways_per_drive_def - priors.turnovers_per_drive_off) * 0.05,
            0.005,
            0.04,
        );

        let mut outcomes = [
            ScoringOutcome { points: 7, weight: td_base * 0.88 },
            ScoringOutcome { points: 6, weight: td_base * 0.12 + base.missed_pat },
            ScoringOutcome { points: 8, weight: two_point },
            ScoringOutcome { points: 3, weight: field_goal },
            ScoringOutcome { points: 2, weight: safety },
        ];

        let total: f64 = outcomes.iter().map(|o| o.weight).sum();
        let len = outcomes.len() as f64;
        for o in &mut outcomes {
            o.weight = if total > 0.0 { o.weight / total } else { 1.0 / len };
        }

        let expected_points_per_event = outcomes.iter().map(|o| o.points as f64 * o.weight).sum();
        Self {
            outcomes,
            expected_points_per_event,
        }
    }

    /// Scoring events per game needed to reach `lambda_points` on average.
    pub fn event_rate(&self, lambda_points: f64) -> f64 {
        (lambda_points / self.expected_points_per_event.max(POINTS_PER_EVENT_FLOOR))
            .max(LAMBDA_EVENTS_FLOOR)
    }

    /// Total points from `events` categorical draws.
    pub fn sample_points(&self, events: u32, rng: &mut SimRng) -> u32 {
        let mut cumulative = [0.0; 5];
        let mut acc = 0.0;
        for (slot, o) in cumulative.iter_mut().zip(&self.outcomes) {
            acc += o.weight;
            *slot = acc;
        }

        let last = self.outcomes[self.outcomes.len() - 1].points;
        (0..events)
            .map(|_| {
                let target = rng.uniform() * acc;
                cumulative
                    .iter()
                    .position(|c| target <= c + 1e-12)
                    .map_or(last, |i| self.outcomes[i].points)
            })
            .sum()
    }
}

/// Snaps to the nearest realistic football score; ties go to the lower score.
/// Scores past the top of the grid are only rounded.
pub fn round_score(score: f64, use_grid: bool) -> u32 {
    let score = score.max(0.0);
    let top = FOOTBALL_SCORE_GRID[FOOTBALL_SCORE_GRID.len() - 1];
    if !use_grid || score >= top as f64 {
        return score.round() as u32;
    }

    let mut best = FOOTBALL_SCORE_GRID[0];
    let mut best_diff = (score - best as f64).abs();
    for &value in &FOOTBALL_SCORE_GRID {
        let diff = (score - value as f64).abs();
        if diff < best_diff {
            best = value;
            best_diff = diff;
        }
    }
    best
}

struct Tally {
    draws: Vec<SimulationDraw>,
    wins_a: usize,
    wins_b: usize,
    ties: usize,
    sum_total: f64,
    sum_margin: f64,
}

impl Tally {
    fn with_capacity(n: usize) -> Self {
        Self {
            draws: Vec::with_capacity(n),
            wins_a: 0,
            wins_b: 0,
            ties: 0,
            sum_total: 0.0,
            sum_margin: 0.0,
        }
    }

    fn record(&mut self, draw: SimulationDraw) {
        if draw.a > draw.b {
            self.wins_a += 1;
        } else if draw.b > draw.a {
            self.wins_b += 1;
        } else {
            self.ties += 1;
        }
        self.sum_total += draw.total() as f64;
        self.sum_margin += draw.margin() as f64;
        self.draws.push(draw);
    }

    fn finish(self) -> (Vec<SimulationDraw>, SimulationSummary) {
        let n = self.draws.len();
        if n == 0 {
            return (self.draws, SimulationSummary::default());
        }
        let n = n as f64;
        let summary = SimulationSummary {
            win_pct_a: self.wins_a as f64 / n,
            win_pct_b: self.wins_b as f64 / n,
            tie_pct: self.ties as f64 / n,
            mean_total: self.sum_total / n,
            mean_margin: self.sum_margin / n,
        };
        (self.draws, summary)
    }
}

/// Joint score simulator. Holds tunable coefficients and the warn-once set for fallbacks.
#[derive(Debug, Default)]
pub struct Simulator {
    config: ModelConfig,
    warned: Mutex<HashSet<String>>,
}

impl Simulator {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            warned: Mutex::new(HashSet::new()),
        }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Simulates with a fresh request-scoped priors cache.
    pub fn simulate(&self, opts: &SimulationOptions) -> SimulationResult {
        let mut cache = PriorsCache::new();
        self.simulate_with_cache(opts, &mut cache)
    }

    /// Team engine, delegating to the classic engine when either side has no
    /// priors or the classic engine is requested.
    pub fn simulate_with_cache(
        &self,
        opts: &SimulationOptions,
        cache: &mut PriorsCache,
    ) -> SimulationResult {
        if opts.engine == Engine::Classic {
            tracing::debug!(
                team_a = %opts.team_a.id,
                team_b = %opts.team_b.id,
                "classic engine requested"
            );
            return self.simulate_classic(opts);
        }

        let coeffs = &self.config.expectation;
        let ctx = &opts.context;
        let (team_a, team_b) = (opts.team_a.id.as_str(), opts.team_b.id.as_str());
        let exp_a = expected_points_with(coeffs, team_a, team_b, ctx, Some(&mut *cache));
        let exp_b = expected_points_with(coeffs, team_b, team_a, ctx, Some(&mut *cache));

        if !exp_a.priors.is_available() || !exp_b.priors.is_available() {
            self.warn_fallback_once(team_a, team_b);
            return self.simulate_classic(opts);
        }

        let corr = opts
            .corr
            .filter(|c| c.is_finite())
            .unwrap_or(self.config.default_correlation);
        let corr = clamp(corr, -CORRELATION_LIMIT, CORRELATION_LIMIT);

        let profile_a = ScoringProfile::from_priors(&exp_a.priors, &self.config.scoring);
        let profile_b = ScoringProfile::from_priors(&exp_b.priors, &self.config.scoring);
        let events_a = profile_a.event_rate(exp_a.lambda_points);
        let events_b = profile_b.event_rate(exp_b.lambda_points);
        tracing::debug!(
            team_a = %opts.team_a.id,
            team_b = %opts.team_b.id,
            lambda_a = exp_a.lambda_points,
            lambda_b = exp_b.lambda_points,
            events_a,
            events_b,
            corr,
            "team engine"
        );

        let mut rng = SimRng::new(opts.seed);
        let mut tally = Tally::with_capacity(opts.n);
        for _ in 0..opts.n {
            let (za, zb) = rng.correlated_normals(corr);
            let count_a = poisson_inverse(events_a, normal_cdf(za));
            let count_b = poisson_inverse(events_b, normal_cdf(zb));

            let points_a = profile_a.sample_points(count_a, &mut rng);
            let points_b = profile_b.sample_points(count_b, &mut rng);

            tally.record(SimulationDraw {
                a: round_score(points_a as f64, opts.round_to_grid),
                b: round_score(points_b as f64, opts.round_to_grid),
            });
        }

        let (draws, summary) = tally.finish();
        SimulationResult {
            draws,
            summary,
            used_fallback: false,
            meta: SimulationMeta {
                lambda_a: exp_a.lambda_points,
                lambda_b: exp_b.lambda_points,
                engine: Engine::Team,
            },
        }
    }

    /// Correlated Gaussian margin/total draws around a spread and total line.
    pub fn simulate_classic(&self, opts: &SimulationOptions) -> SimulationResult {
        let defaults = &self.config.classic;
        let input = &opts.classic_fallback;
        let pick = |v: Option<f64>, d: f64| v.filter(|x| x.is_finite()).unwrap_or(d);

        let spread = pick(input.spread, defaults.spread);
        let total_mean = pick(input.total, defaults.total);
        let margin_stdev = pick(input.margin_stdev, defaults.margin_stdev).max(0.0);
        let total_stdev = pick(input.total_stdev, defaults.total_stdev).max(0.0);
        let corr = clamp(
            pick(input.correlation, defaults.correlation),
            -CORRELATION_LIMIT,
            CORRELATION_LIMIT,
        );
        let margin_mean = -spread;

        let mut rng = SimRng::new(opts.seed);
        let mut tally = Tally::with_capacity(opts.n);
        for _ in 0..opts.n {
            let (z1, z2) = rng.normal_pair();
            let margin = margin_mean + margin_stdev * z1;
            let total = total_mean + total_stdev * correlate(z1, z2, corr);

            let score_b = clamp((total + margin) / 2.0, 0.0, CLASSIC_SCORE_MAX);
            let score_a = clamp(total - score_b, 0.0, CLASSIC_SCORE_MAX);
            tally.record(SimulationDraw {
                a: round_score(score_a, opts.round_to_grid),
                b: round_score(score_b, opts.round_to_grid),
            });
        }

        let (draws, summary) = tally.finish();
        SimulationResult {
            draws,
            summary,
            used_fallback: true,
            meta: SimulationMeta {
                lambda_a: ((total_mean - margin_mean) / 2.0).max(LAMBDA_POINTS_FLOOR),
                lambda_b: ((total_mean + margin_mean) / 2.0).max(LAMBDA_POINTS_FLOOR),
                engine: Engine::Classic,
            },
        }
    }

    fn warn_fallback_once(&self, team_a: &str, team_b: &str) {
        let key = format!("{team_a}__{team_b}");
        let mut warned = self.warned.lock().unwrap_or_else(|e| e.into_inner());
        if warned.contains(&key) {
            return;
        }
        if warned.len() >= WARNED_CAPACITY {
            warned.clear();
        }
        warned.insert(key);
        tracing::warn!(team_a, team_b, "no team priors, falling back to classic engine");
    }
}
