//! Engine configuration and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::batch::BatchConfig;
use crate::calibration::CalibratorConfig;
use crate::estimation::EstimatorConfig;

/// Top-level adaptest configuration.
///
/// Every section falls back to its defaults, so an empty file is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptestConfig {
    pub estimation: EstimatorConfig,
    pub calibration: CalibratorConfig,
    pub batch: BatchConfig,
}

impl AdaptestConfig {
    /// Reject settings the algorithms cannot run with.
    pub fn validate(&self) -> Result<()> {
        let est = &self.estimation;
        anyhow::ensure!(est.max_iterations >= 1, "estimation.max_iterations must be at least 1");
        anyhow::ensure!(
            est.convergence_threshold.is_finite() && est.convergence_threshold > 0.0,
            "estimation.convergence_threshold must be positive"
        );

        let cal = &self.calibration;
        anyhow::ensure!(
            (0.0..1.0).contains(&cal.guessing),
            "calibration.guessing must lie in [0, 1)"
        );
        anyhow::ensure!(
            cal.min_discrimination > 0.0 && cal.min_discrimination <= cal.max_discrimination,
            "calibration discrimination bounds must satisfy 0 < min <= max"
        );
        anyhow::ensure!(
            cal.initial_discrimination > 0.0 && cal.initial_discrimination.is_finite(),
            "calibration.initial_discrimination must be positive"
        );
        anyhow::ensure!(
            cal.initial_difficulty.is_finite(),
            "calibration.initial_difficulty must be finite"
        );
        anyhow::ensure!(
            cal.discrimination_scale > 0.0,
            "calibration.discrimination_scale must be positive"
        );
        anyhow::ensure!(
            cal.rate_floor < cal.rate_ceiling,
            "calibration.rate_floor must be below calibration.rate_ceiling"
        );

        anyhow::ensure!(
            (1..=Semaphore::MAX_PERMITS).contains(&self.batch.parallelism),
            "batch.parallelism must be between 1 and {}",
            Semaphore::MAX_PERMITS
        );
        Ok(())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `adaptest.toml` in the current directory
/// 2. `~/.config/adaptest/config.toml`
///
/// Environment variable overrides: `ADAPTEST_MIN_ATTEMPTS`, `ADAPTEST_PARALLELISM`.
pub fn load_config() -> Result<AdaptestConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AdaptestConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("adaptest.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<AdaptestConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AdaptestConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;
    Ok(config)
}

fn apply_env_overrides(config: &mut AdaptestConfig) -> Result<()> {
    if let Ok(raw) = std::env::var("ADAPTEST_MIN_ATTEMPTS") {
        let min_attempts: usize = raw
            .trim()
            .parse()
            .with_context(|| format!("invalid ADAPTEST_MIN_ATTEMPTS: '{raw}'"))?;
        config.calibration.min_attempts = min_attempts;
        config.batch.min_attempts = min_attempts;
    }

    if let Ok(raw) = std::env::var("ADAPTEST_PARALLELISM") {
        config.batch.parallelism = raw
            .trim()
            .parse()
            .with_context(|| format!("invalid ADAPTEST_PARALLELISM: '{raw}'"))?;
    }

    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("adaptest"))
}
