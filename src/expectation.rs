use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    clamp, ExpectationCoefficients, Metric, EXPECTATION_COEFFICIENTS, LAMBDA_POINTS_FLOOR,
    PACE_LIMITS, POINTS_PER_DRIVE_MAX, POINTS_PER_DRIVE_MIN,
};
use crate::priors::{estimate_priors, PriorsContext, TeamPriors};
use crate::teams::canonical_team;

/// Request-scoped memo of priors keyed by `(team, opponent)`.
///
/// Priors depend on weather, injuries and location, so a cache must never be
/// shared between two different contexts.
#[derive(Debug, Default)]
pub struct PriorsCache {
    entries: HashMap<(String, String), TeamPriors>,
}

impl PriorsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_estimate(
        &mut self,
        team: &str,
        opponent: &str,
        ctx: &PriorsContext,
    ) -> TeamPriors {
        let key = (canonical_team(team), canonical_team(opponent));
        self.entries
            .entry(key)
            .or_insert_with(|| estimate_priors(team, opponent, ctx))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedPointsResult {
    pub lambda_points: f64,
    pub drives: f64,
    pub points_per_drive: f64,
    pub priors: TeamPriors,
    pub opponent: TeamPriors,
}

pub fn expected_points(
    team: &str,
    opponent: &str,
    ctx: &PriorsContext,
    cache: Option<&mut PriorsCache>,
) -> ExpectedPointsResult {
    expected_points_with(&EXPECTATION_COEFFICIENTS, team, opponent, ctx, cache)
}

pub fn expected_points_with(
    coeffs: &ExpectationCoefficients,
    team: &str,
    opponent: &str,
    ctx: &PriorsContext,
    cache: Option<&mut PriorsCache>,
) -> ExpectedPointsResult {
    let (priors, opp) = match cache {
        Some(cache) => (
            cache.get_or_estimate(team, opponent, ctx),
            cache.get_or_estimate(opponent, team, ctx),
        ),
        None => (
            estimate_priors(team, opponent, ctx),
            estimate_priors(opponent, team, ctx),
        ),
    };
    expected_points_from_priors(coeffs, priors, opp)
}

pub fn expected_points_from_priors(
    coeffs: &ExpectationCoefficients,
    priors: TeamPriors,
    opponent: TeamPriors,
) -> ExpectedPointsResult {
    let points_per_drive = points_per_drive(coeffs, &priors, &opponent);
    let drives = PACE_LIMITS.clamp((priors.pace_drives + opponent.pace_drives) / 2.0);
    let lambda_points =
        (points_per_drive * drives + priors.hfa * coeffs.hfa).max(LAMBDA_POINTS_FLOOR);

    ExpectedPointsResult {
        lambda_points,
        drives,
        points_per_drive,
        priors,
        opponent,
    }
}

fn points_per_drive(c: &ExpectationCoefficients, team: &TeamPriors, opp: &TeamPriors) -> f64 {
    let mut ppd = c.intercept;
    ppd += c.epa_off * team.epa_per_play_off;
    ppd += c.success_off * (team.success_off - Metric::SuccessOff.league_mean());
    ppd += c.redzone_off * (team.redzone_off_td - Metric::RedzoneOffTd.league_mean());
    ppd += c.special_teams * (team.st_epa / 4.0);

    ppd -= c.def_epa * opp.epa_per_play_def;
    ppd -= c.def_success * (opp.success_def - Metric::SuccessDef.league_mean());
    ppd -= c.def_redzone * (opp.redzone_def_td - Metric::RedzoneDefTd.league_mean());

    let turnover_delta = (team.turnovers_per_drive_off - opp.takeaways_per_drive_def) / 2.0;
    ppd -= c.turnover_scale * turnover_delta;

    clamp(ppd, POINTS_PER_DRIVE_MIN, POINTS_PER_DRIVE_MAX)
}
