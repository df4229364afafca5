//! Item parameter calibration from historical responses.
//!
//! Moment matching against the respondents' current ability estimates:
//! difficulty sits midway between the mean θ of correct and incorrect
//! responders, discrimination shrinks as those means drift apart. The
//! guessing parameter is held fixed.

use serde::{Deserialize, Serialize};

use crate::model::{ItemParameters, ItemResponse};

/// Fewest valid responses an item needs before it is calibrated.
pub const MIN_ATTEMPTS_FOR_CALIBRATION: usize = 30;

/// Configuration for the item calibrator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibratorConfig {
    /// Minimum number of valid responses.
    pub min_attempts: usize,
    /// Starting discrimination.
    pub initial_discrimination: f64,
    /// Starting difficulty.
    pub initial_difficulty: f64,
    /// Guessing parameter assigned to every calibrated item.
    pub guessing: f64,
    /// Lower clamp for the discrimination estimate.
    pub min_discrimination: f64,
    /// Upper clamp for the discrimination estimate.
    pub max_discrimination: f64,
    /// Numerator of `a = scale / spread`.
    pub discrimination_scale: f64,
    /// The correct-rate difficulty estimate needs `rate > rate_floor`.
    pub rate_floor: f64,
    /// The correct-rate difficulty estimate needs `rate < rate_ceiling`.
    pub rate_ceiling: f64,
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            min_attempts: MIN_ATTEMPTS_FOR_CALIBRATION,
            initial_discrimination: 1.0,
            initial_difficulty: 0.0,
            guessing: 0.2,
            min_discrimination: 0.5,
            max_discrimination: 2.5,
            discrimination_scale: 1.5,
            rate_floor: 0.2,
            rate_ceiling: 0.8,
        }
    }
}

/// Outcome of calibrating one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemCalibration {
    pub parameters: ItemParameters,
    /// Responses that had both a respondent θ and a scored outcome.
    pub sample_size: usize,
}

/// Estimates (a, b, c) for a single item.
#[derive(Debug, Clone, Default)]
pub struct ItemCalibrator {
    config: CalibratorConfig,
}

impl ItemCalibrator {
    pub fn new(config: CalibratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CalibratorConfig {
        &self.config
    }

    /// Number of responses that count toward calibration.
    pub fn valid_count(responses: &[ItemResponse]) -> usize {
        responses.iter().filter_map(valid).count()
    }

    /// Calibrate an item, or `None` when there are too few valid responses.
    pub fn calibrate(&self, responses: &[ItemResponse]) -> Option<ItemCalibration> {
        let cfg = &self.config;
        let valid: Vec<(f64, bool)> = responses.iter().filter_map(valid).collect();
        let n = valid.len();
        if n < cfg.min_attempts || n == 0 {
            return None;
        }

        let c = cfg.guessing;
        let mut a = cfg.initial_discrimination;
        let mut b = cfg.initial_difficulty;

        let n_correct = valid.iter().filter(|(_, correct)| *correct).count();
        let rate = n_correct as f64 / n as f64;
        if let Some(from_rate) = self.difficulty_from_rate(rate, a) {
            b = from_rate;
        }

        let mean_correct = mean(valid.iter().filter(|(_, ok)| *ok).map(|(t, _)| *t));
        let mean_incorrect = mean(valid.iter().filter(|(_, ok)| !*ok).map(|(t, _)| *t));
        if let (Some(m1), Some(m0)) = (mean_correct, mean_incorrect) {
            b = (m1 + m0) / 2.0;
            let spread = (m1 - m0).abs();
            let raw = if spread > 0.0 {
                cfg.discrimination_scale / spread
            } else {
                1.0
            };
            a = raw.clamp(cfg.min_discrimination, cfg.max_discrimination);
        }

        tracing::debug!("calibrated item from {n} responses: a={a:.3} b={b:.3} c={c:.2}");

        Some(ItemCalibration {
            parameters: ItemParameters { a, b, c },
            sample_size: n,
        })
    }

    /// `b = -ln((1 - rate) / (rate - c)) / a`, only inside the rate window.
    fn difficulty_from_rate(&self, rate: f64, a: f64) -> Option<f64> {
        let c = self.config.guessing;
        if rate <= self.config.rate_floor || rate >= self.config.rate_ceiling || rate <= c {
            return None;
        }
        let b = -((1.0 - rate) / (rate - c)).ln() / a;
        b.is_finite().then_some(b)
    }
}

fn valid(response: &ItemResponse) -> Option<(f64, bool)> {
    match (response.respondent_theta, response.correct) {
        (Some(theta), Some(correct)) if theta.is_finite() => Some((theta, correct)),
        _ => None,
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}
