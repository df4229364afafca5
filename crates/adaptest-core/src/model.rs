//! Core data model types for adaptest.
//!
//! Items, attempts, and ability profiles as the external store hands them to
//! the estimation and calibration code.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParameterError;
use crate::response;

/// Standard error reported when the responses carry no information about θ.
pub const UNDEFINED_STANDARD_ERROR: f64 = 999.0;

/// 3PL parameters of a calibrated item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawItemParameters")]
pub struct ItemParameters {
    /// Discrimination (slope), strictly positive.
    pub a: f64,
    /// Difficulty (location).
    pub b: f64,
    /// Guessing (lower asymptote), in `[0, 1)`.
    pub c: f64,
}

impl ItemParameters {
    /// Build parameters, rejecting values outside the 3PL constraints.
    pub fn new(a: f64, b: f64, c: f64) -> Result<Self, ParameterError> {
        if !(a.is_finite() && a > 0.0) {
            return Err(ParameterError::Discrimination(a));
        }
        if !b.is_finite() {
            return Err(ParameterError::Difficulty(b));
        }
        if !(0.0..1.0).contains(&c) {
            return Err(ParameterError::Guessing(c));
        }
        Ok(Self { a, b, c })
    }

    /// Probability of a correct response at `theta`.
    pub fn probability(&self, theta: f64) -> f64 {
        response::probability(theta, self.a, self.b, self.c)
    }

    /// Fisher information at `theta`.
    pub fn information(&self, theta: f64) -> f64 {
        response::information(theta, self.a, self.b, self.c)
    }
}

#[derive(Deserialize)]
struct RawItemParameters {
    a: f64,
    b: f64,
    c: f64,
}

impl TryFrom<RawItemParameters> for ItemParameters {
    type Error = ParameterError;

    fn try_from(raw: RawItemParameters) -> Result<Self, Self::Error> {
        ItemParameters::new(raw.a, raw.b, raw.c)
    }
}

/// An item in the bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item identifier.
    pub id: String,
    /// Scale (exam) the item measures.
    pub scale_id: String,
    /// Parameters, `None` until the item has been calibrated.
    #[serde(default)]
    pub parameters: Option<ItemParameters>,
    /// Number of responses used by the last calibration.
    #[serde(default)]
    pub calibration_sample_size: Option<usize>,
    /// When the item was last calibrated.
    #[serde(default)]
    pub last_calibrated_at: Option<DateTime<Utc>>,
}

impl Item {
    /// An uncalibrated item.
    pub fn new(id: impl Into<String>, scale_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scale_id: scale_id.into(),
            parameters: None,
            calibration_sample_size: None,
            last_calibrated_at: None,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.parameters.is_some()
    }

    /// Replace the parameters and bump the calibration bookkeeping.
    pub fn apply_calibration(
        &mut self,
        parameters: ItemParameters,
        sample_size: usize,
        calibrated_at: DateTime<Utc>,
    ) {
        self.parameters = Some(parameters);
        self.calibration_sample_size = Some(sample_size);
        self.last_calibrated_at = Some(calibrated_at);
    }
}

/// One examinee's attempt at one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub examinee_id: String,
    pub item_id: String,
    /// `None` while the attempt has not been scored.
    #[serde(default)]
    pub correct: Option<bool>,
    pub answered_at: DateTime<Utc>,
}

/// A scored response to a calibrated item, the estimator's input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredResponse {
    pub parameters: ItemParameters,
    pub correct: bool,
}

/// A scored attempt as returned by [`AttemptStore::scored_responses`].
///
/// [`AttemptStore::scored_responses`]: crate::traits::AttemptStore::scored_responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredAttempt {
    pub item_id: String,
    pub parameters: ItemParameters,
    pub correct: bool,
    pub answered_at: DateTime<Utc>,
}

impl ScoredAttempt {
    pub fn response(&self) -> ScoredResponse {
        ScoredResponse {
            parameters: self.parameters,
            correct: self.correct,
        }
    }
}

/// One historical response to an item, the calibrator's input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemResponse {
    /// Current ability estimate of the respondent, if one exists.
    pub respondent_theta: Option<f64>,
    /// Scored outcome, `None` if not yet scored.
    pub correct: Option<bool>,
}

/// A calibrated item offered to the selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibratedItem {
    pub id: String,
    pub parameters: ItemParameters,
}

/// Latest ability estimate of an examinee on a scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityProfile {
    pub examinee_id: String,
    pub scale_id: String,
    /// Point estimate of θ.
    pub theta: f64,
    /// Standard error of θ, [`UNDEFINED_STANDARD_ERROR`] when undefined.
    pub standard_error: f64,
    /// Number of scored responses behind the estimate.
    pub attempts_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl AbilityProfile {
    /// Whether the estimate rests on any information at all.
    pub fn has_information(&self) -> bool {
        self.standard_error < UNDEFINED_STANDARD_ERROR
    }
}
