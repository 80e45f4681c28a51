use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::{
    clamp, Metric, PLAYS_PER_DRIVE_ESTIMATE, PRIOR_WEIGHTS, SHRINKAGE_K_PLAYS,
};
use crate::teams::{canonical_team, home_field_advantage, TeamMap};

/// Rate statistics for one team over one observation window. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamSampleMetrics {
    pub pace_drives: Option<f64>,
    pub epa_per_play_off: Option<f64>,
    pub epa_per_play_def: Option<f64>,
    pub success_off: Option<f64>,
    pub success_def: Option<f64>,
    pub redzone_off_td: Option<f64>,
    pub redzone_def_td: Option<f64>,
    pub st_epa: Option<f64>,
    pub turnovers_per_drive_off: Option<f64>,
    pub takeaways_per_drive_def: Option<f64>,
    pub explosive_rate_off: Option<f64>,
    pub explosive_rate_def: Option<f64>,
    pub plays: Option<f64>,
    pub drives: Option<f64>,
}

impl TeamSampleMetrics {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        let v = match metric {
            Metric::PaceDrives => self.pace_drives,
            Metric::EpaPerPlayOff => self.epa_per_play_off,
            Metric::EpaPerPlayDef => self.epa_per_play_def,
            Metric::SuccessOff => self.success_off,
            Metric::SuccessDef => self.success_def,
            Metric::RedzoneOffTd => self.redzone_off_td,
            Metric::RedzoneDefTd => self.redzone_def_td,
            Metric::StEpa => self.st_epa,
            Metric::TurnoversPerDriveOff => self.turnovers_per_drive_off,
            Metric::TakeawaysPerDriveDef => self.takeaways_per_drive_def,
            Metric::ExplosiveRateOff => self.explosive_rate_off,
            Metric::ExplosiveRateDef => self.explosive_rate_def,
            Metric::Hfa => None,
        };
        finite(v)
    }

    /// Observed plays, estimated from drives when plays are missing.
    pub fn observed_plays(&self) -> f64 {
        finite(self.plays)
            .or_else(|| finite(self.drives).map(|d| d * PLAYS_PER_DRIVE_ESTIMATE))
            .unwrap_or(0.0)
            .max(0.0)
    }
}

pub type TeamSampleMap = TeamMap<TeamSampleMetrics>;

/// Explicit per-metric replacements applied after every other layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorOverride {
    pub pace_drives: Option<f64>,
    pub epa_per_play_off: Option<f64>,
    pub epa_per_play_def: Option<f64>,
    pub success_off: Option<f64>,
    pub success_def: Option<f64>,
    pub redzone_off_td: Option<f64>,
    pub redzone_def_td: Option<f64>,
    pub st_epa: Option<f64>,
    pub turnovers_per_drive_off: Option<f64>,
    pub takeaways_per_drive_def: Option<f64>,
    pub explosive_rate_off: Option<f64>,
    pub explosive_rate_def: Option<f64>,
    pub hfa: Option<f64>,
}

impl PriorOverride {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        let v = match metric {
            Metric::PaceDrives => self.pace_drives,
            Metric::EpaPerPlayOff => self.epa_per_play_off,
            Metric::EpaPerPlayDef => self.epa_per_play_def,
            Metric::SuccessOff => self.success_off,
            Metric::SuccessDef => self.success_def,
            Metric::RedzoneOffTd => self.redzone_off_td,
            Metric::RedzoneDefTd => self.redzone_def_td,
            Metric::StEpa => self.st_epa,
            Metric::TurnoversPerDriveOff => self.turnovers_per_drive_off,
            Metric::TakeawaysPerDriveDef => self.takeaways_per_drive_def,
            Metric::ExplosiveRateOff => self.explosive_rate_off,
            Metric::ExplosiveRateDef => self.explosive_rate_def,
            Metric::Hfa => self.hfa,
        };
        finite(v)
    }

    /// Full override built from computed priors, handy for pinning a team in tests and tools.
    pub fn from_priors(priors: &TeamPriors) -> Self {
        Self {
            pace_drives: Some(priors.pace_drives),
            epa_per_play_off: Some(priors.epa_per_play_off),
            epa_per_play_def: Some(priors.epa_per_play_def),
            success_off: Some(priors.success_off),
            success_def: Some(priors.success_def),
            redzone_off_td: Some(priors.redzone_off_td),
            redzone_def_td: Some(priors.redzone_def_td),
            st_epa: Some(priors.st_epa),
            turnovers_per_drive_off: Some(priors.turnovers_per_drive_off),
            takeaways_per_drive_def: Some(priors.takeaways_per_drive_def),
            explosive_rate_off: Some(priors.explosive_rate_off),
            explosive_rate_def: Some(priors.explosive_rate_def),
            hfa: Some(priors.hfa),
        }
    }
}

pub type PriorsOverrides = TeamMap<PriorOverride>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Precipitation {
    #[serde(alias = "none")]
    Clear,
    Rain,
    Snow,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Roof {
    Open,
    Closed,
    Retractable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Surface {
    Turf,
    Grass,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherContext {
    pub temp_f: Option<f64>,
    pub wind_mph: Option<f64>,
    pub precipitation: Option<Precipitation>,
    pub roof: Option<Roof>,
    pub surface: Option<Surface>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TravelAdjustments {
    /// Additive drives-per-game delta.
    pub pace: Option<f64>,
    /// 0..1
    pub fatigue: Option<f64>,
    /// -1..1
    pub rest_boost: Option<f64>,
}

/// Injury severities, each 0..1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InjuryAdjustments {
    pub offensive_line: Option<f64>,
    pub quarterback: Option<f64>,
    pub skill: Option<f64>,
    pub defense_front7: Option<f64>,
    pub secondary: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorsLocation {
    pub home_team_id: Option<String>,
    pub neutral_site: bool,
    pub stadium_code: Option<String>,
    pub altitude_feet: Option<f64>,
    pub surface: Option<Surface>,
    /// Used for weather when the weather context carries no roof.
    pub roof: Option<Roof>,
}

/// Everything a priors estimate depends on besides the two team names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorsContext {
    pub season_to_date: TeamSampleMap,
    pub last_three: TeamSampleMap,
    pub last_season: TeamSampleMap,
    /// Per-request replacement for the league means used by shrinkage.
    pub league_averages: HashMap<Metric, f64>,
    pub weather: Option<WeatherContext>,
    pub travel: TeamMap<TravelAdjustments>,
    pub injuries: TeamMap<InjuryAdjustments>,
    pub location: Option<PriorsLocation>,
    pub overrides: PriorsOverrides,
}

impl PriorsContext {
    fn league_mean(&self, metric: Metric) -> f64 {
        self.league_averages
            .get(&metric)
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or_else(|| metric.league_mean())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorsSource {
    League,
    Blended,
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorsMeta {
    pub source: PriorsSource,
    pub sample_plays: f64,
}

/// Blended, adjusted and clamped rate estimates for one team in one matchup context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPriors {
    pub pace_drives: f64,
    pub epa_per_play_off: f64,
    pub epa_per_play_def: f64,
    pub success_off: f64,
    pub success_def: f64,
    pub redzone_off_td: f64,
    pub redzone_def_td: f64,
    pub st_epa: f64,
    pub turnovers_per_drive_off: f64,
    pub takeaways_per_drive_def: f64,
    pub explosive_rate_off: f64,
    pub explosive_rate_def: f64,
    pub hfa: f64,
    pub meta: PriorsMeta,
}

impl TeamPriors {
    /// League means with `source=league` and no observed plays.
    pub fn league() -> Self {
        let mut priors = Self {
            pace_drives: 0.0,
            epa_per_play_off: 0.0,
            epa_per_play_def: 0.0,
            success_off: 0.0,
            success_def: 0.0,
            redzone_off_td: 0.0,
            redzone_def_td: 0.0,
            st_epa: 0.0,
            turnovers_per_drive_off: 0.0,
            takeaways_per_drive_def: 0.0,
            explosive_rate_off: 0.0,
            explosive_rate_def: 0.0,
            hfa: 0.0,
            meta: PriorsMeta {
                source: PriorsSource::League,
                sample_plays: 0.0,
            },
        };
        for metric in Metric::ALL {
            priors.set(metric, metric.league_mean());
        }
        priors
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::PaceDrives => self.pace_drives,
            Metric::EpaPerPlayOff => self.epa_per_play_off,
            Metric::EpaPerPlayDef => self.epa_per_play_def,
            Metric::SuccessOff => self.success_off,
            Metric::SuccessDef => self.success_def,
            Metric::RedzoneOffTd => self.redzone_off_td,
            Metric::RedzoneDefTd => self.redzone_def_td,
            Metric::StEpa => self.st_epa,
            Metric::TurnoversPerDriveOff => self.turnovers_per_drive_off,
            Metric::TakeawaysPerDriveDef => self.takeaways_per_drive_def,
            Metric::ExplosiveRateOff => self.explosive_rate_off,
            Metric::ExplosiveRateDef => self.explosive_rate_def,
            Metric::Hfa => self.hfa,
        }
    }

    pub fn set(&mut self, metric: Metric, value: f64) {
        let slot = match metric {
            Metric::PaceDrives => &mut self.pace_drives,
            Metric::EpaPerPlayOff => &mut self.epa_per_play_off,
            Metric::EpaPerPlayDef => &mut self.epa_per_play_def,
            Metric::SuccessOff => &mut self.success_off,
            Metric::SuccessDef => &mut self.success_def,
            Metric::RedzoneOffTd => &mut self.redzone_off_td,
            Metric::RedzoneDefTd => &mut self.redzone_def_td,
            Metric::StEpa => &mut self.st_epa,
            Metric::TurnoversPerDriveOff => &mut self.turnovers_per_drive_off,
            Metric::TakeawaysPerDriveDef => &mut self.takeaways_per_drive_def,
            Metric::ExplosiveRateOff => &mut self.explosive_rate_off,
            Metric::ExplosiveRateDef => &mut self.explosive_rate_def,
            Metric::Hfa => &mut self.hfa,
        };
        *slot = value;
    }

    /// False when the estimate carries no team information at all.
    pub fn is_available(&self) -> bool {
        !(self.meta.source == PriorsSource::League && self.meta.sample_plays == 0.0)
    }

    pub fn within_limits(&self) -> bool {
        Metric::ALL
            .iter()
            .all(|m| m.limits().contains(self.get(*m)))
    }
}

/// Estimates `team`'s priors when facing `opponent` under `ctx`. Never fails:
/// missing data degrades to league means.
pub fn estimate_priors(team: &str, opponent: &str, ctx: &PriorsContext) -> TeamPriors {
    let team = canonical_team(team);
    let opponent = canonical_team(opponent);

    let mut priors = match weighted_merge(&team, ctx) {
        Some(merged) => blend_with_league(&merged, ctx),
        None => TeamPriors::league(),
    };
    tracing::trace!(
        team = %team,
        opponent = %opponent,
        source = ?priors.meta.source,
        sample_plays = priors.meta.sample_plays,
        "blended priors"
    );

    let home_team = ctx
        .location
        .as_ref()
        .and_then(|loc| loc.home_team_id.as_deref())
        .map(canonical_team);
    let is_home = home_team.as_deref() == Some(team.as_str());

    if let Some(weather) = &ctx.weather {
        let roof = weather
            .roof
            .or_else(|| ctx.location.as_ref().and_then(|loc| loc.roof));
        apply_weather(&mut priors, weather, roof, is_home);
    }
    if let Some(travel) = ctx.travel.get(&team) {
        apply_travel(&mut priors, travel);
    }
    if let Some(injuries) = ctx.injuries.get(&team) {
        apply_injuries(&mut priors, injuries);
    }
    if let Some(location) = &ctx.location {
        apply_location(&mut priors, location, home_team.as_deref(), is_home);
    }
    if let Some(overrides) = ctx.overrides.get(&team) {
        apply_override(&mut priors, overrides);
    }

    finalize_bounds(&mut priors);
    priors
}

struct MergedSample {
    metrics: [Option<f64>; 12],
    plays: f64,
}

fn weighted_merge(team: &str, ctx: &PriorsContext) -> Option<MergedSample> {
    let windows = [
        (PRIOR_WEIGHTS.last_season, ctx.last_season.get(team)),
        (PRIOR_WEIGHTS.season_to_date, ctx.season_to_date.get(team)),
        (PRIOR_WEIGHTS.last_three, ctx.last_three.get(team)),
    ];

    let mut total_weight = 0.0;
    let mut plays = 0.0;
    let mut sums = [0.0_f64; 12];
    let mut weights = [0.0_f64; 12];

    for (weight, sample) in windows {
        let Some(sample) = sample else { continue };
        total_weight += weight;
        plays += weight * sample.observed_plays();
        for (i, metric) in Metric::SAMPLED.iter().enumerate() {
            if let Some(v) = sample.metric(*metric) {
                sums[i] += weight * v;
                weights[i] += weight;
            }
        }
    }

    if total_weight <= 0.0 {
        return None;
    }

    let mut metrics = [None; 12];
    for i in 0..metrics.len() {
        if weights[i] > 0.0 {
            metrics[i] = Some(sums[i] / weights[i]);
        }
    }
    Some(MergedSample {
        metrics,
        plays: plays / total_weight,
    })
}

/// `w * sample + (1 - w) * league_mean` with `w = plays / (plays + K)`.
pub fn shrink_toward_league(sample: f64, league_mean: f64, plays: f64) -> f64 {
    let plays = plays.max(0.0);
    let w = plays / (plays + SHRINKAGE_K_PLAYS);
    w * sample + (1.0 - w) * league_mean
}

fn blend_with_league(merged: &MergedSample, ctx: &PriorsContext) -> TeamPriors {
    let mut priors = TeamPriors::league();
    for (i, metric) in Metric::SAMPLED.iter().enumerate() {
        let league_mean = ctx.league_mean(*metric);
        let value = match merged.metrics[i] {
            Some(sample) => shrink_toward_league(sample, league_mean, merged.plays),
            None => league_mean,
        };
        priors.set(*metric, value);
    }
    priors.meta = PriorsMeta {
        source: PriorsSource::Blended,
        sample_plays: merged.plays,
    };
    priors
}

fn apply_weather(
    priors: &mut TeamPriors,
    weather: &WeatherContext,
    roof: Option<Roof>,
    is_home: bool,
) {
    let wind = finite(weather.wind_mph).unwrap_or(0.0);
    match roof {
        Some(Roof::Closed) => {
            priors.pace_drives *= 1.015;
            priors.redzone_off_td *= 1.01;
        }
        Some(Roof::Open) if wind > 18.0 => {
            let penalty = clamp(0.004 * (wind - 18.0), 0.0, 0.12);
            priors.pace_drives *= 1.0 - penalty;
            priors.redzone_off_td *= 1.0 - penalty * 0.6;
        }
        _ => {}
    }

    if let Some(temp) = finite(weather.temp_f) {
        if temp < 28.0 {
            let drop = clamp((28.0 - temp) * 0.003, 0.0, 0.09);
            priors.success_off *= 1.0 - drop;
            priors.explosive_rate_off *= 1.0 - drop * 0.8;
        } else if temp > 85.0 {
            let drop = clamp((temp - 85.0) * 0.002, 0.0, 0.05);
            priors.pace_drives *= 1.0 - drop;
        }
    }

    match weather.precipitation {
        Some(Precipitation::Rain) => {
            priors.turnovers_per_drive_off *= 1.05;
            priors.success_off *= 0.98;
        }
        Some(Precipitation::Snow) => {
            priors.turnovers_per_drive_off *= 1.08;
            priors.success_off *= 0.96;
            priors.explosive_rate_off *= 0.94;
        }
        _ => {}
    }

    match weather.surface {
        Some(Surface::Turf) => priors.explosive_rate_off *= 1.02,
        Some(Surface::Grass) if !is_home => priors.pace_drives *= 0.995,
        _ => {}
    }
}

fn apply_travel(priors: &mut TeamPriors, travel: &TravelAdjustments) {
    if let Some(pace) = finite(travel.pace) {
        priors.pace_drives += pace;
    }
    if let Some(fatigue) = finite(travel.fatigue) {
        let fatigue = clamp(fatigue, 0.0, 1.0);
        priors.success_off *= 1.0 - fatigue * 0.05;
        priors.epa_per_play_off -= fatigue * 0.025;
    }
    if let Some(boost) = finite(travel.rest_boost) {
        let boost = clamp(boost, -1.0, 1.0);
        priors.success_off *= 1.0 + boost * 0.03;
        priors.pace_drives += boost * 0.15;
    }
}

fn apply_injuries(priors: &mut TeamPriors, injuries: &InjuryAdjustments) {
    let severity = |v: Option<f64>| finite(v).map(|s| clamp(s, 0.0, 1.0));

    if let Some(s) = severity(injuries.offensive_line) {
        priors.epa_per_play_off -= s * 0.03;
        priors.success_off *= 1.0 - s * 0.04;
    }
    if let Some(s) = severity(injuries.quarterback) {
        priors.epa_per_play_off -= s * 0.06;
        priors.explosive_rate_off *= 1.0 - s * 0.08;
    }
    if let Some(s) = severity(injuries.skill) {
        priors.success_off *= 1.0 - s * 0.03;
    }
    if let Some(s) = severity(injuries.defense_front7) {
        priors.epa_per_play_def += s * 0.035;
        priors.success_def += s * 0.03;
        priors.redzone_def_td += s * 0.02;
    }
    if let Some(s) = severity(injuries.secondary) {
        priors.explosive_rate_def += s * 0.05;
        priors.success_def += s * 0.025;
    }
}

fn apply_location(
    priors: &mut TeamPriors,
    location: &PriorsLocation,
    home_team: Option<&str>,
    is_home: bool,
) {
    if let Some(home) = home_team {
        let base = home_field_advantage(home, location.neutral_site);
        priors.hfa = if is_home {
            base
        } else {
            -(base * 0.65).max(1.0)
        };
    }

    if let Some(altitude) = finite(location.altitude_feet) {
        if altitude > 3500.0 {
            priors.pace_drives += if is_home { 0.1 } else { -0.2 };
        }
    }

    match location.surface {
        Some(Surface::Turf) => priors.success_off *= 1.01,
        Some(Surface::Grass) if !is_home => priors.explosive_rate_off *= 0.99,
        _ => {}
    }
}

fn apply_override(priors: &mut TeamPriors, overrides: &PriorOverride) {
    for metric in Metric::ALL {
        if let Some(v) = overrides.metric(metric) {
            priors.set(metric, v);
        }
    }
    priors.meta.source = PriorsSource::Override;
}

fn finalize_bounds(priors: &mut TeamPriors) {
    for metric in Metric::ALL {
        let v = metric.limits().clamp(priors.get(metric));
        priors.set(metric, v);
    }
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(epa_off: f64, plays: f64) -> TeamSampleMetrics {
        TeamSampleMetrics {
            epa_per_play_off: Some(epa_off),
            pace_drives: Some(11.6),
            success_off: Some(0.47),
            redzone_off_td: Some(0.62),
            plays: Some(plays),
            ..Default::default()
        }
    }

    fn context_with(team: &str, metrics: TeamSampleMetrics) -> PriorsContext {
        let mut ctx = PriorsContext::default();
        ctx.season_to_date.insert(team, metrics);
        ctx
    }

    #[test]
    fn no_samples_fall_back_to_league() {
        let priors = estimate_priors("Test Team", "Opponent", &PriorsContext::default());
        assert_eq!(priors.meta.source, PriorsSource::League);
        assert_eq!(priors.meta.sample_plays, 0.0);
        assert!(!priors.is_available());
        assert_eq!(priors.pace_drives, 11.3);
        assert_eq!(priors.hfa, 0.0);
    }

    #[test]
    fn shrinkage_trusts_larger_samples() {
        let target = 0.18;
        let league = Metric::EpaPerPlayOff.league_mean();
        let high_ctx = context_with("Test Team", sample(target, 450.0));
        let low_ctx = context_with("Test Team", sample(target, 30.0));
        let high = estimate_priors("Test Team", "Opp", &high_ctx);
        let low = estimate_priors("Test Team", "Opp", &low_ctx);
        assert!((high.epa_per_play_off - target).abs() < (low.epa_per_play_off - target).abs());
        assert!((low.epa_per_play_off - league).abs() < (high.epa_per_play_off - league).abs());
        assert_eq!(high.meta.source, PriorsSource::Blended);
    }

    #[test]
    fn shrink_weight_is_half_at_k() {
        let v = shrink_toward_league(1.0, 0.0, SHRINKAGE_K_PLAYS);
        assert!((v - 0.5).abs() < 1e-12);
        assert_eq!(shrink_toward_league(1.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn plays_estimated_from_drives() {
        let metrics = TeamSampleMetrics {
            drives: Some(100.0),
            ..Default::default()
        };
        assert!((metrics.observed_plays() - 610.0).abs() < 1e-9);
        let priors = estimate_priors("Alpha", "Beta", &context_with("Alpha", metrics));
        assert!((priors.meta.sample_plays - 610.0).abs() < 1e-9);
    }

    #[test]
    fn single_window_is_not_diluted() {
        let mut ctx = PriorsContext::default();
        ctx.last_three.insert(
            "Alpha",
            TeamSampleMetrics {
                success_off: Some(0.50),
                plays: Some(1_000_000.0),
                ..Default::default()
            },
        );
        let priors = estimate_priors("Alpha", "Beta", &ctx);
        assert!((priors.success_off - 0.50).abs() < 1e-3);
    }

    #[test]
    fn samples_resolve_through_aliases() {
        let ctx = context_with("KC", sample(0.2, 500.0));
        let priors = estimate_priors("Kansas City Chiefs", "Bills", &ctx);
        assert_eq!(priors.meta.source, PriorsSource::Blended);
        assert!(priors.epa_per_play_off > 0.1);
    }

    #[test]
    fn adversarial_inputs_stay_in_bounds() {
        let mut ctx = PriorsContext::default();
        ctx.season_to_date.insert(
            "Alpha",
            TeamSampleMetrics {
                pace_drives: Some(90.0),
                epa_per_play_off: Some(-50.0),
                epa_per_play_def: Some(50.0),
                success_off: Some(7.0),
                success_def: Some(-3.0),
                redzone_off_td: Some(4.0),
                redzone_def_td: Some(-4.0),
                st_epa: Some(99.0),
                turnovers_per_drive_off: Some(f64::NAN),
                takeaways_per_drive_def: Some(12.0),
                explosive_rate_off: Some(f64::INFINITY),
                explosive_rate_def: Some(-1.0),
                plays: Some(1e9),
                drives: None,
            },
        );
        ctx.weather = Some(WeatherContext {
            temp_f: Some(-60.0),
            wind_mph: Some(120.0),
            precipitation: Some(Precipitation::Snow),
            roof: Some(Roof::Open),
            surface: Some(Surface::Grass),
        });
        ctx.travel.insert(
            "Alpha",
            TravelAdjustments {
                pace: Some(-40.0),
                fatigue: Some(9.0),
                rest_boost: Some(-9.0),
            },
        );
        ctx.injuries.insert(
            "Alpha",
            InjuryAdjustments {
                offensive_line: Some(5.0),
                quarterback: Some(5.0),
                skill: Some(5.0),
                defense_front7: Some(5.0),
                secondary: Some(5.0),
            },
        );
        ctx.location = Some(PriorsLocation {
            home_team_id: Some("Beta".into()),
            altitude_feet: Some(9000.0),
            ..Default::default()
        });
        let priors = estimate_priors("Alpha", "Beta", &ctx);
        assert!(priors.within_limits(), "{priors:?}");
        assert_eq!(priors.turnovers_per_drive_off, 0.105 * 1.08);
    }

    #[test]
    fn override_applies_without_samples() {
        let mut ctx = PriorsContext::default();
        ctx.overrides.insert(
            "Alpha",
            PriorOverride {
                epa_per_play_off: Some(0.12),
                hfa: Some(9.0),
                ..Default::default()
            },
        );
        let priors = estimate_priors("Alpha", "Beta", &ctx);
        assert_eq!(priors.meta.source, PriorsSource::Override);
        assert_eq!(priors.meta.sample_plays, 0.0);
        assert!(priors.is_available());
        assert_eq!(priors.epa_per_play_off, 0.12);
        assert_eq!(priors.hfa, 4.0);
    }

    #[test]
    fn home_gets_full_hfa_and_visitor_a_penalty() {
        let mut ctx = PriorsContext::default();
        ctx.location = Some(PriorsLocation {
            home_team_id: Some("GB".into()),
            ..Default::default()
        });
        let home = estimate_priors("Packers", "Bears", &ctx);
        let away = estimate_priors("Bears", "Packers", &ctx);
        assert_eq!(home.hfa, 3.0);
        assert!((away.hfa + 1.95).abs() < 1e-12);

        ctx.location = Some(PriorsLocation {
            home_team_id: Some("Houston Texans".into()),
            neutral_site: true,
            ..Default::default()
        });
        let visitor = estimate_priors("Bears", "Texans", &ctx);
        assert_eq!(visitor.hfa, -1.0);
    }

    #[test]
    fn bad_weather_and_injuries_weaken_offense() {
        let base = estimate_priors("Alpha", "Beta", &PriorsContext::default());

        let mut ctx = PriorsContext::default();
        ctx.weather = Some(WeatherContext {
            temp_f: Some(10.0),
            wind_mph: Some(25.0),
            precipitation: Some(Precipitation::Rain),
            roof: None,
            surface: None,
        });
        ctx.location = Some(PriorsLocation {
            roof: Some(Roof::Open),
            ..Default::default()
        });
        let cold = estimate_priors("Alpha", "Beta", &ctx);
        assert!(cold.pace_drives < base.pace_drives);
        assert!(cold.success_off < base.success_off);
        assert!(cold.turnovers_per_drive_off > base.turnovers_per_drive_off);

        let mut ctx = PriorsContext::default();
        ctx.injuries.insert(
            "Alpha",
            InjuryAdjustments {
                quarterback: Some(1.0),
                ..Default::default()
            },
        );
        let hurt = estimate_priors("Alpha", "Beta", &ctx);
        assert!((hurt.epa_per_play_off - (base.epa_per_play_off - 0.06)).abs() < 1e-12);
        assert!(hurt.explosive_rate_off < base.explosive_rate_off);
    }

    #[test]
    fn dome_boosts_pace() {
        let mut ctx = PriorsContext::default();
        ctx.weather = Some(WeatherContext {
            roof: Some(Roof::Closed),
            wind_mph: Some(40.0),
            ..Default::default()
        });
        let priors = estimate_priors("Alpha", "Beta", &ctx);
        assert!((priors.pace_drives - 11.3 * 1.015).abs() < 1e-12);
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-12, "{actual} != {expected}");
    }

    fn with_weather(weather: WeatherContext) -> PriorsContext {
        PriorsContext {
            weather: Some(weather),
            ..Default::default()
        }
    }

    fn hosted_by(home: &str, location: PriorsLocation) -> PriorsContext {
        PriorsContext {
            location: Some(PriorsLocation {
                home_team_id: Some(home.into()),
                ..location
            }),
            ..Default::default()
        }
    }

    #[test]
    fn sample_keys_ignore_case() {
        let ctx = context_with("test team", sample(0.2, 400.0));
        let priors = estimate_priors("Test Team", "Opp", &ctx);
        assert_eq!(priors.meta.source, PriorsSource::Blended);
        assert!(priors.epa_per_play_off > 0.1);
    }

    #[test]
    fn open_roof_wind_penalty_is_capped() {
        let windy = |wind: f64, roof: Roof| {
            let ctx = with_weather(WeatherContext {
                wind_mph: Some(wind),
                roof: Some(roof),
                ..Default::default()
            });
            estimate_priors("Alpha", "Beta", &ctx)
        };

        let p = windy(30.0, Roof::Open);
        assert_close(p.pace_drives, 11.3 * (1.0 - 0.048));
        assert_close(p.redzone_off_td, 0.57 * (1.0 - 0.048 * 0.6));

        let p = windy(100.0, Roof::Open);
        assert_close(p.pace_drives, 11.3 * 0.88);
        assert_close(p.redzone_off_td, 0.57 * (1.0 - 0.072));

        assert_eq!(windy(18.0, Roof::Open).pace_drives, 11.3);
        assert_eq!(windy(40.0, Roof::Retractable).pace_drives, 11.3);
    }

    #[test]
    fn cold_drop_is_capped() {
        let cold = |temp: f64| {
            let ctx = with_weather(WeatherContext {
                temp_f: Some(temp),
                ..Default::default()
            });
            estimate_priors("Alpha", "Beta", &ctx)
        };

        let p = cold(18.0);
        assert_close(p.success_off, 0.435 * (1.0 - 0.03));
        assert_close(p.explosive_rate_off, 0.13 * (1.0 - 0.024));

        let p = cold(-50.0);
        assert_close(p.success_off, 0.435 * 0.91);
        assert_close(p.explosive_rate_off, 0.13 * (1.0 - 0.072));
        assert_eq!(p.pace_drives, 11.3);

        assert_eq!(cold(28.0).success_off, 0.435);
    }

    #[test]
    fn heat_slows_pace_with_a_cap() {
        let hot = |temp: f64| {
            let ctx = with_weather(WeatherContext {
                temp_f: Some(temp),
                ..Default::default()
            });
            estimate_priors("Alpha", "Beta", &ctx)
        };

        assert_close(hot(95.0).pace_drives, 11.3 * (1.0 - 0.02));
        assert_close(hot(150.0).pace_drives, 11.3 * 0.95);
        assert_eq!(hot(85.0).pace_drives, 11.3);
        assert_eq!(hot(150.0).success_off, 0.435);
    }

    #[test]
    fn weather_surface_nudges() {
        let ctx = with_weather(WeatherContext {
            surface: Some(Surface::Turf),
            ..Default::default()
        });
        assert_close(
            estimate_priors("Alpha", "Beta", &ctx).explosive_rate_off,
            0.13 * 1.02,
        );

        let mut ctx = hosted_by("Alpha", PriorsLocation::default());
        ctx.weather = Some(WeatherContext {
            surface: Some(Surface::Grass),
            ..Default::default()
        });
        assert_eq!(estimate_priors("Alpha", "Beta", &ctx).pace_drives, 11.3);
        assert_close(estimate_priors("Beta", "Alpha", &ctx).pace_drives, 11.3 * 0.995);
    }

    #[test]
    fn travel_fatigue_and_rest() {
        let travel = |adj: TravelAdjustments| {
            let mut ctx = PriorsContext::default();
            ctx.travel.insert("Alpha", adj);
            estimate_priors("Alpha", "Beta", &ctx)
        };

        let p = travel(TravelAdjustments {
            rest_boost: Some(0.5),
            ..Default::default()
        });
        assert_close(p.success_off, 0.435 * 1.015);
        assert_close(p.pace_drives, 11.3 + 0.075);

        let p = travel(TravelAdjustments {
            rest_boost: Some(3.0),
            ..Default::default()
        });
        assert_close(p.success_off, 0.435 * 1.03);
        assert_close(p.pace_drives, 11.3 + 0.15);

        let p = travel(TravelAdjustments {
            fatigue: Some(0.4),
            pace: Some(-0.3),
            ..Default::default()
        });
        assert_close(p.success_off, 0.435 * 0.98);
        assert_close(p.epa_per_play_off, 0.02 - 0.01);
        assert_close(p.pace_drives, 11.3 - 0.3);
    }

    #[test]
    fn offensive_and_defensive_injury_deltas() {
        let hurt = |adj: InjuryAdjustments| {
            let mut ctx = PriorsContext::default();
            ctx.injuries.insert("Alpha", adj);
            estimate_priors("Alpha", "Beta", &ctx)
        };

        let p = hurt(InjuryAdjustments {
            offensive_line: Some(0.5),
            skill: Some(1.0),
            ..Default::default()
        });
        assert_close(p.epa_per_play_off, 0.02 - 0.015);
        assert_close(p.success_off, 0.435 * 0.98 * 0.97);

        let p = hurt(InjuryAdjustments {
            defense_front7: Some(0.5),
            ..Default::default()
        });
        assert_close(p.epa_per_play_def, 0.02 + 0.0175);
        assert_close(p.success_def, 0.435 + 0.015);
        assert_close(p.redzone_def_td, 0.57 + 0.01);

        let p = hurt(InjuryAdjustments {
            secondary: Some(2.0),
            ..Default::default()
        });
        assert_close(p.explosive_rate_def, 0.13 + 0.05);
        assert_close(p.success_def, 0.435 + 0.025);
        assert_eq!(p.epa_per_play_def, 0.02);
    }

    #[test]
    fn altitude_favors_the_home_side() {
        let ctx = hosted_by(
            "Denver",
            PriorsLocation {
                altitude_feet: Some(5280.0),
                ..Default::default()
            },
        );
        let home = estimate_priors("Broncos", "Raiders", &ctx);
        let away = estimate_priors("Raiders", "Broncos", &ctx);
        assert_close(home.pace_drives, 11.3 + 0.1);
        assert_close(away.pace_drives, 11.3 - 0.2);
        assert_eq!(home.hfa, 3.25);

        let ctx = hosted_by(
            "Denver",
            PriorsLocation {
                altitude_feet: Some(3500.0),
                ..Default::default()
            },
        );
        assert_eq!(estimate_priors("Raiders", "Broncos", &ctx).pace_drives, 11.3);
    }

    #[test]
    fn location_surface_nudges() {
        let ctx = hosted_by(
            "Alpha",
            PriorsLocation {
                surface: Some(Surface::Turf),
                ..Default::default()
            },
        );
        assert_close(estimate_priors("Alpha", "Beta", &ctx).success_off, 0.435 * 1.01);
        assert_close(estimate_priors("Beta", "Alpha", &ctx).success_off, 0.435 * 1.01);

        let ctx = hosted_by(
            "Alpha",
            PriorsLocation {
                surface: Some(Surface::Grass),
                ..Default::default()
            },
        );
        assert_eq!(estimate_priors("Alpha", "Beta", &ctx).explosive_rate_off, 0.13);
        assert_close(estimate_priors("Beta", "Alpha", &ctx).explosive_rate_off, 0.13 * 0.99);
    }

    #[test]
    fn layers_apply_in_order() {
        let mut ctx = hosted_by(
            "Denver",
            PriorsLocation {
                altitude_feet: Some(5280.0),
                ..Default::default()
            },
        );
        ctx.weather = Some(WeatherContext {
            roof: Some(Roof::Closed),
            ..Default::default()
        });
        ctx.travel.insert(
            "Broncos",
            TravelAdjustments {
                pace: Some(0.5),
                ..Default::default()
            },
        );
        let priors = estimate_priors("Denver Broncos", "Raiders", &ctx);
        assert_close(priors.pace_drives, 11.3 * 1.015 + 0.5 + 0.1);

        let mut ctx = PriorsContext::default();
        ctx.injuries.insert(
            "Alpha",
            InjuryAdjustments {
                quarterback: Some(1.0),
                ..Default::default()
            },
        );
        ctx.overrides.insert(
            "Alpha",
            PriorOverride {
                epa_per_play_off: Some(0.1),
                pace_drives: Some(20.0),
                ..Default::default()
            },
        );
        let priors = estimate_priors("Alpha", "Beta", &ctx);
        assert_eq!(priors.meta.source, PriorsSource::Override);
        assert_eq!(priors.epa_per_play_off, 0.1);
        assert_close(priors.explosive_rate_off, 0.13 * 0.92);
        assert_eq!(priors.pace_drives, 14.5);
    }

    #[test]
    fn league_average_override_feeds_shrinkage() {
        let mut ctx = context_with("Alpha", sample(0.2, 0.0));
        ctx.league_averages.insert(Metric::EpaPerPlayOff, 0.1);
        let priors = estimate_priors("Alpha", "Beta", &ctx);
        assert!((priors.epa_per_play_off - 0.1).abs() < 1e-12);
    }
}
