use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ClassicDefaults, ExpectationCoefficients, ScoringWeights, POISSON_DEFAULT_CORRELATION,
};

pub const CONFIG_ENV: &str = "GRIDIRON_MODEL_CONFIG";

/// Tunable model knobs. Every field falls back to the built-in calibration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub expectation: ExpectationCoefficients,
    pub scoring: ScoringWeights,
    pub classic: ClassicDefaults,
    pub default_correlation: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            expectation: ExpectationCoefficients::default(),
            scoring: ScoringWeights::default(),
            classic: ClassicDefaults::default(),
            default_correlation: POISSON_DEFAULT_CORRELATION,
        }
    }
}

impl ModelConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read model config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parse model config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let cfg = serde_json::from_str::<Self>(raw).context("deserialize model config")?;
        Ok(cfg)
    }

    /// Loads the file named by `GRIDIRON_MODEL_CONFIG`, or defaults when unset.
    pub fn from_env() -> Result<Self> {
        match config_path_from_env() {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self).context("serialize model config")?;
        fs::write(&tmp, json).context("write model config")?;
        fs::rename(&tmp, path).context("swap model config")?;
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    env::var(CONFIG_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EXPECTATION_COEFFICIENTS;

    #[test]
    fn partial_json_keeps_defaults() {
        let raw = r#"{"expectation": {"intercept": 1.5}, "default_correlation": 0.3}"#;
        let cfg = ModelConfig::from_json(raw).unwrap();
        assert_eq!(cfg.expectation.intercept, 1.5);
        assert_eq!(cfg.expectation.epa_off, EXPECTATION_COEFFICIENTS.epa_off);
        assert_eq!(cfg.default_correlation, 0.3);
        assert_eq!(cfg.classic, ClassicDefaults::default());
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(ModelConfig::from_json("{}").unwrap(), ModelConfig::default());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(ModelConfig::from_json("not json").is_err());
        assert!(ModelConfig::from_path("/definitely/missing/model.json").is_err());
    }

    #[test]
    fn save_then_load() {
        let dir = env::temp_dir().join(format!("gridiron_model_cfg_{}", std::process::id()));
        let path = dir.join("model.json");
        let mut cfg = ModelConfig::default();
        cfg.scoring.field_goal = 0.31;
        cfg.save(&path).unwrap();
        let loaded = ModelConfig::from_path(&path).unwrap();
        assert!((loaded.scoring.field_goal - 0.31).abs() < 1e-12);
        assert!((loaded.expectation.intercept - cfg.expectation.intercept).abs() < 1e-12);
        let _ = fs::remove_dir_all(dir);
    }
}
