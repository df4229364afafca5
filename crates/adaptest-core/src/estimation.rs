//! Maximum-likelihood ability estimation.
//!
//! θ is found by Newton-Raphson on the 3PL log-likelihood, starting from
//! zero. The step divides by the magnitude of the second derivative, so the
//! iteration always moves uphill along the score even where the
//! log-likelihood is locally convex.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ScoredAttempt, ScoredResponse, UNDEFINED_STANDARD_ERROR};
use crate::response::{information, logistic};

/// Iteration cap for Newton-Raphson.
pub const MAX_ITERATIONS: u32 = 50;

/// Stop once a step moves θ by less than this.
pub const CONVERGENCE_THRESHOLD: f64 = 0.001;

/// Configuration for the ability estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Maximum Newton-Raphson iterations.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Step size below which the iteration is considered converged.
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,
}

fn default_max_iterations() -> u32 {
    MAX_ITERATIONS
}

fn default_convergence_threshold() -> f64 {
    CONVERGENCE_THRESHOLD
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            convergence_threshold: CONVERGENCE_THRESHOLD,
        }
    }
}

/// Result of an ability estimation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityEstimate {
    /// Point estimate of θ.
    pub theta: f64,
    /// `1 / sqrt(total information)`, or [`UNDEFINED_STANDARD_ERROR`].
    pub standard_error: f64,
    /// Number of responses the estimate was computed from.
    pub attempts_count: usize,
    /// Newton-Raphson iterations performed.
    pub iterations: u32,
    /// Whether the last step fell under the convergence threshold.
    pub converged: bool,
}

impl AbilityEstimate {
    /// The estimate reported when there is nothing to estimate from.
    pub fn undefined() -> Self {
        Self {
            theta: 0.0,
            standard_error: UNDEFINED_STANDARD_ERROR,
            attempts_count: 0,
            iterations: 0,
            converged: false,
        }
    }

    /// False for the 999 sentinel standard error.
    pub fn has_information(&self) -> bool {
        self.standard_error < UNDEFINED_STANDARD_ERROR
    }
}

/// θ after each attempt of a time-ordered sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPoint {
    /// 1-based position of the attempt in the sequence.
    pub attempt_number: usize,
    pub answered_at: DateTime<Utc>,
    pub theta: f64,
    pub standard_error: f64,
}

/// Newton-Raphson MLE of θ.
#[derive(Debug, Clone, Default)]
pub struct AbilityEstimator {
    config: EstimatorConfig,
}

impl AbilityEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Estimate θ and its standard error from scored responses.
    ///
    /// Returns [`AbilityEstimate::undefined`] for an empty slice. Hitting the
    /// iteration cap is not an error: the last θ is returned with
    /// `converged == false`.
    pub fn estimate(&self, responses: &[ScoredResponse]) -> AbilityEstimate {
        if responses.is_empty() {
            return AbilityEstimate::undefined();
        }

        let mut theta = 0.0;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iterations {
            iterations += 1;

            let (first, second) = log_likelihood_derivatives(theta, responses);
            if second == 0.0 {
                // every response is degenerate at this θ
                break;
            }
            let delta = first / second.abs();
            if !delta.is_finite() {
                break;
            }
            theta += delta;

            if delta.abs() < self.config.convergence_threshold {
                converged = true;
                break;
            }
        }

        if !converged {
            tracing::warn!("no convergence after {iterations} iterations (theta={theta:.4})");
        }

        let total_information: f64 = responses
            .iter()
            .map(|r| r.parameters.information(theta))
            .sum();
        let standard_error = if total_information > 0.0 {
            1.0 / total_information.sqrt()
        } else {
            UNDEFINED_STANDARD_ERROR
        };

        tracing::debug!(
            "theta={theta:.4} se={standard_error:.4} from {} responses ({iterations} iterations)",
            responses.len()
        );

        AbilityEstimate {
            theta,
            standard_error,
            attempts_count: responses.len(),
            iterations,
            converged,
        }
    }

    /// Re-estimate θ over every growing prefix of a time-ordered sequence.
    pub fn progression(&self, attempts: &[ScoredAttempt]) -> Vec<ProgressPoint> {
        let responses: Vec<ScoredResponse> = attempts.iter().map(ScoredAttempt::response).collect();
        attempts
            .iter()
            .enumerate()
            .map(|(i, attempt)| {
                let estimate = self.estimate(&responses[..=i]);
                ProgressPoint {
                    attempt_number: i + 1,
                    answered_at: attempt.answered_at,
                    theta: estimate.theta,
                    standard_error: estimate.standard_error,
                }
            })
            .collect()
    }
}

/// First and second derivatives of the 3PL log-likelihood at `theta`.
///
/// Responses with `p - c <= 0` or `q <= 0` contribute nothing.
fn log_likelihood_derivatives(theta: f64, responses: &[ScoredResponse]) -> (f64, f64) {
    let mut first = 0.0;
    let mut second = 0.0;

    for response in responses {
        let params = response.parameters;
        let (a, c) = (params.a, params.c);
        let p = params.probability(theta);
        let q = 1.0 - p;
        if p - c <= 0.0 || q <= 0.0 {
            continue;
        }

        // P* is the 2PL curve underlying the 3PL one: p = c + (1 - c) P*
        let p_star = logistic(a * (theta - params.b));
        let q_star = 1.0 - p_star;
        let u = if response.correct { 1.0 } else { 0.0 };

        first += a * p_star * (u - p) / p;
        second += a * a * p_star * (q_star * (u - p) / p - u * p_star * q / (p * p));
    }

    (first, second)
}
