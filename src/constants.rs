use serde::{Deserialize, Serialize};

/// Blend weights for the three sample windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowWeights {
    pub last_season: f64,
    pub season_to_date: f64,
    pub last_three: f64,
}

pub const PRIOR_WEIGHTS: WindowWeights = WindowWeights {
    last_season: 0.15,
    season_to_date: 0.70,
    last_three: 0.15,
};

/// Half-trust point of the shrinkage blend, in plays.
pub const SHRINKAGE_K_PLAYS: f64 = 200.0;

pub const PLAYS_PER_DRIVE_ESTIMATE: f64 = 6.1;

pub const POINTS_PER_DRIVE_MIN: f64 = 0.3;
pub const POINTS_PER_DRIVE_MAX: f64 = 4.0;
pub const LAMBDA_POINTS_FLOOR: f64 = 0.1;
pub const LAMBDA_EVENTS_FLOOR: f64 = 0.05;
pub const POINTS_PER_EVENT_FLOOR: f64 = 0.5;

pub const POISSON_DEFAULT_CORRELATION: f64 = 0.2;
pub const CORRELATION_LIMIT: f64 = 0.95;
pub const POISSON_NORMAL_APPROX_ABOVE: f64 = 30.0;
pub const POISSON_MAX_EVENTS: u32 = 250;

pub const CLASSIC_SCORE_MAX: f64 = 80.0;

/// Final scores that actually happen in football (no 1, 4 or 11).
pub const FOOTBALL_SCORE_GRID: [u32; 62] = [
    0, 2, 3, 5, 6, 7, 8, 9, 10, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27,
    28, 29, 30, 31, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50,
    51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub min: f64,
    pub max: f64,
}

impl Limits {
    pub fn clamp(self, v: f64) -> f64 {
        clamp(v, self.min, self.max)
    }

    pub fn contains(self, v: f64) -> bool {
        v >= self.min && v <= self.max
    }
}

pub const PACE_LIMITS: Limits = Limits { min: 8.2, max: 14.5 };
pub const EPA_LIMITS: Limits = Limits { min: -0.35, max: 0.45 };
pub const SUCCESS_LIMITS: Limits = Limits { min: 0.32, max: 0.55 };
pub const REDZONE_LIMITS: Limits = Limits { min: 0.35, max: 0.80 };
pub const TURNOVER_LIMITS: Limits = Limits { min: 0.04, max: 0.20 };
pub const TAKEAWAY_LIMITS: Limits = Limits { min: 0.04, max: 0.22 };
pub const EXPLOSIVE_LIMITS: Limits = Limits { min: 0.07, max: 0.23 };
pub const ST_EPA_LIMITS: Limits = Limits { min: -4.0, max: 4.0 };
pub const HFA_LIMITS: Limits = Limits { min: -4.0, max: 4.0 };

/// Every numeric field carried by `TeamPriors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    PaceDrives,
    EpaPerPlayOff,
    EpaPerPlayDef,
    SuccessOff,
    SuccessDef,
    RedzoneOffTd,
    RedzoneDefTd,
    StEpa,
    TurnoversPerDriveOff,
    TakeawaysPerDriveDef,
    ExplosiveRateOff,
    ExplosiveRateDef,
    Hfa,
}

impl Metric {
    pub const ALL: [Metric; 13] = [
        Metric::PaceDrives,
        Metric::EpaPerPlayOff,
        Metric::EpaPerPlayDef,
        Metric::SuccessOff,
        Metric::SuccessDef,
        Metric::RedzoneOffTd,
        Metric::RedzoneDefTd,
        Metric::StEpa,
        Metric::TurnoversPerDriveOff,
        Metric::TakeawaysPerDriveDef,
        Metric::ExplosiveRateOff,
        Metric::ExplosiveRateDef,
        Metric::Hfa,
    ];

    /// Metrics blended from sample windows. Home-field advantage is set by location only.
    pub const SAMPLED: [Metric; 12] = [
        Metric::PaceDrives,
        Metric::EpaPerPlayOff,
        Metric::EpaPerPlayDef,
        Metric::SuccessOff,
        Metric::SuccessDef,
        Metric::RedzoneOffTd,
        Metric::RedzoneDefTd,
        Metric::StEpa,
        Metric::TurnoversPerDriveOff,
        Metric::TakeawaysPerDriveDef,
        Metric::ExplosiveRateOff,
        Metric::ExplosiveRateDef,
    ];

    pub fn league_mean(self) -> f64 {
        match self {
            Metric::PaceDrives => 11.3,
            Metric::EpaPerPlayOff | Metric::EpaPerPlayDef => 0.02,
            Metric::SuccessOff | Metric::SuccessDef => 0.435,
            Metric::RedzoneOffTd | Metric::RedzoneDefTd => 0.57,
            Metric::StEpa => 0.0,
            Metric::TurnoversPerDriveOff | Metric::TakeawaysPerDriveDef => 0.105,
            Metric::ExplosiveRateOff | Metric::ExplosiveRateDef => 0.13,
            Metric::Hfa => 0.0,
        }
    }

    pub fn limits(self) -> Limits {
        match self {
            Metric::PaceDrives => PACE_LIMITS,
            Metric::EpaPerPlayOff | Metric::EpaPerPlayDef => EPA_LIMITS,
            Metric::SuccessOff | Metric::SuccessDef => SUCCESS_LIMITS,
            Metric::RedzoneOffTd | Metric::RedzoneDefTd => REDZONE_LIMITS,
            Metric::StEpa => ST_EPA_LIMITS,
            Metric::TurnoversPerDriveOff => TURNOVER_LIMITS,
            Metric::TakeawaysPerDriveDef => TAKEAWAY_LIMITS,
            Metric::ExplosiveRateOff | Metric::ExplosiveRateDef => EXPLOSIVE_LIMITS,
            Metric::Hfa => HFA_LIMITS,
        }
    }
}

/// Linear map from matchup priors to points per drive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectationCoefficients {
    pub intercept: f64,
    pub epa_off: f64,
    pub success_off: f64,
    pub redzone_off: f64,
    pub special_teams: f64,
    pub def_epa: f64,
    pub def_success: f64,
    pub def_redzone: f64,
    pub turnover_scale: f64,
    pub hfa: f64,
}

// Intercept is set so two league-average teams land near 21.8 points each.
pub const EXPECTATION_COEFFICIENTS: ExpectationCoefficients = ExpectationCoefficients {
    intercept: 1.92,
    epa_off: 6.5,
    success_off: 2.3,
    redzone_off: 3.6,
    special_teams: 0.35,
    def_epa: 5.9,
    def_success: 2.1,
    def_redzone: 2.4,
    turnover_scale: 4.0,
    hfa: 0.18,
};

impl Default for ExpectationCoefficients {
    fn default() -> Self {
        EXPECTATION_COEFFICIENTS
    }
}

/// Baseline shares of each scoring event before team adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub touchdown: f64,
    pub missed_pat: f64,
    pub field_goal: f64,
    pub two_point: f64,
    pub safety: f64,
}

pub const DEFAULT_SCORING_WEIGHTS: ScoringWeights = ScoringWeights {
    touchdown: 0.58,
    missed_pat: 0.04,
    field_goal: 0.28,
    two_point: 0.05,
    safety: 0.01,
};

impl Default for ScoringWeights {
    fn default() -> Self {
        DEFAULT_SCORING_WEIGHTS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassicDefaults {
    pub margin_stdev: f64,
    pub total_stdev: f64,
    pub correlation: f64,
    pub spread: f64,
    pub total: f64,
}

pub const CLASSIC_FALLBACK: ClassicDefaults = ClassicDefaults {
    margin_stdev: 13.5,
    total_stdev: 9.0,
    correlation: 0.35,
    spread: 0.0,
    total: 43.5,
};

impl Default for ClassicDefaults {
    fn default() -> Self {
        CLASSIC_FALLBACK
    }
}

pub(crate) fn clamp(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}
