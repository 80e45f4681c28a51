use serde::{Deserialize, Serialize};

use crate::sim::SimulationSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    TeamA,
    Tie,
    TeamB,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prob3 {
    pub a: f64,
    pub tie: f64,
    pub b: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub samples: usize,
    pub brier: f64,
    pub log_loss: f64,
    pub accuracy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationBin {
    pub bucket_start: f64,
    pub bucket_end: f64,
    pub count: usize,
    pub avg_pred: f64,
    pub actual_rate: f64,
}

impl Prob3 {
    pub fn uniform() -> Self {
        Self {
            a: 1.0 / 3.0,
            tie: 1.0 / 3.0,
            b: 1.0 / 3.0,
        }
    }

    pub fn from_summary(summary: &SimulationSummary) -> Self {
        Self {
            a: summary.win_pct_a,
            tie: summary.tie_pct,
            b: summary.win_pct_b,
        }
    }

    fn of(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::TeamA => self.a,
            Outcome::Tie => self.tie,
            Outcome::TeamB => self.b,
        }
    }
}

pub fn classify_outcome(score_a: u32, score_b: u32) -> Outcome {
    if score_a > score_b {
        Outcome::TeamA
    } else if score_a < score_b {
        Outcome::TeamB
    } else {
        Outcome::Tie
    }
}

pub fn empirical_outcome_probs(outcomes: &[Outcome]) -> Prob3 {
    if outcomes.is_empty() {
        return Prob3::uniform();
    }
    let n = outcomes.len() as f64;
    let count = |o: Outcome| outcomes.iter().filter(|x| **x == o).count() as f64 / n;
    Prob3 {
        a: count(Outcome::TeamA),
        tie: count(Outcome::Tie),
        b: count(Outcome::TeamB),
    }
}

pub fn evaluate_probs(predictions: &[Prob3], outcomes: &[Outcome]) -> Metrics {
    if predictions.is_empty() || predictions.len() != outcomes.len() {
        return Metrics::default();
    }

    let mut brier_sum = 0.0_f64;
    let mut log_loss_sum = 0.0_f64;
    let mut correct = 0usize;

    for (p, outcome) in predictions.iter().zip(outcomes) {
        let y = one_hot(*outcome);
        brier_sum += (p.a - y.a).powi(2) + (p.tie - y.tie).powi(2) + (p.b - y.b).powi(2);
        log_loss_sum += -p.of(*outcome).clamp(1e-12, 1.0).ln();
        if argmax(*p) == *outcome {
            correct += 1;
        }
    }

    let n = predictions.len() as f64;
    Metrics {
        samples: predictions.len(),
        brier: brier_sum / n,
        log_loss: log_loss_sum / n,
        accuracy: correct as f64 / n,
    }
}

/// Sharpens (`scale > 1`) or flattens (`scale < 1`) a prediction in log space.
pub fn apply_logit_scale(prob: Prob3, scale: f64) -> Prob3 {
    let s = scale.clamp(0.50, 1.80);
    let la = prob.a.clamp(1e-9, 1.0).ln();
    let lt = prob.tie.clamp(1e-9, 1.0).ln();
    let lb = prob.b.clamp(1e-9, 1.0).ln();

    let mean = (la + lt + lb) / 3.0;
    let (la, lt, lb) = ((la - mean) * s, (lt - mean) * s, (lb - mean) * s);
    let mx = la.max(lt.max(lb));
    let (ea, et, eb) = ((la - mx).exp(), (lt - mx).exp(), (lb - mx).exp());
    let den = (ea + et + eb).max(1e-12);

    Prob3 {
        a: ea / den,
        tie: et / den,
        b: eb / den,
    }
}

/// Grid-searches the log-loss-minimizing logit scale in `0.70..=1.30`.
pub fn fit_logit_scale(predictions: &[Prob3], outcomes: &[Outcome]) -> (f64, Metrics) {
    let mut best_scale = 1.0;
    let mut best_metrics = evaluate_probs(predictions, outcomes);
    if best_metrics.samples == 0 {
        return (best_scale, best_metrics);
    }

    for step in 35..=65 {
        let scale = step as f64 / 50.0;
        let scaled: Vec<Prob3> = predictions
            .iter()
            .map(|p| apply_logit_scale(*p, scale))
            .collect();
        let metrics = evaluate_probs(&scaled, outcomes);
        if metrics.log_loss < best_metrics.log_loss {
            best_metrics = metrics;
            best_scale = scale;
        }
    }
    (best_scale, best_metrics)
}

/// Reliability buckets for the probability assigned to `class`.
pub fn calibration_bins(
    predictions: &[Prob3],
    outcomes: &[Outcome],
    class: Outcome,
    bins: usize,
) -> Vec<CalibrationBin> {
    let bins = bins.max(2);
    let mut counts = vec![0usize; bins];
    let mut pred_sum = vec![0.0_f64; bins];
    let mut actual_sum = vec![0.0_f64; bins];

    for (p, outcome) in predictions.iter().zip(outcomes) {
        let class_prob = p.of(class).clamp(0.0, 1.0);
        let idx = ((class_prob * bins as f64).floor() as usize).min(bins - 1);
        counts[idx] += 1;
        pred_sum[idx] += class_prob;
        if *outcome == class {
            actual_sum[idx] += 1.0;
        }
    }

    (0..bins)
        .map(|i| {
            let count = counts[i];
            let denom = count.max(1) as f64;
            CalibrationBin {
                bucket_start: i as f64 / bins as f64,
                bucket_end: (i + 1) as f64 / bins as f64,
                count,
                avg_pred: pred_sum[i] / denom,
                actual_rate: actual_sum[i] / denom,
            }
        })
        .collect()
}

fn one_hot(outcome: Outcome) -> Prob3 {
    match outcome {
        Outcome::TeamA => Prob3 { a: 1.0, tie: 0.0, b: 0.0 },
        Outcome::Tie => Prob3 { a: 0.0, tie: 1.0, b: 0.0 },
        Outcome::TeamB => Prob3 { a: 0.0, tie: 0.0, b: 1.0 },
    }
}

fn argmax(p: Prob3) -> Outcome {
    if p.a >= p.tie && p.a >= p.b {
        Outcome::TeamA
    } else if p.b >= p.tie {
        Outcome::TeamB
    } else {
        Outcome::Tie
    }
}
