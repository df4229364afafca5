//! Orchestration between the stores and the IRT components.
//!
//! The engine owns no state beyond its store handles and configuration: every
//! call reads what it needs, runs the pure computation, and writes back.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::batch::{BatchCalibrator, BatchOutcome, CalibrationProgress};
use crate::calibration::ItemCalibrator;
use crate::config::AdaptestConfig;
use crate::error::StoreError;
use crate::estimation::{AbilityEstimate, AbilityEstimator, ProgressPoint};
use crate::model::{AbilityProfile, ScoredAttempt, ScoredResponse};
use crate::selection::select_next;
use crate::traits::{AttemptStore, ItemStore, ProfileStore};

/// The adaptive testing engine.
pub struct AdaptiveEngine {
    attempts: Arc<dyn AttemptStore>,
    items: Arc<dyn ItemStore>,
    profiles: Arc<dyn ProfileStore>,
    estimator: AbilityEstimator,
    batch: BatchCalibrator,
}

impl AdaptiveEngine {
    pub fn new(
        attempts: Arc<dyn AttemptStore>,
        items: Arc<dyn ItemStore>,
        profiles: Arc<dyn ProfileStore>,
        config: &AdaptestConfig,
    ) -> Self {
        let batch = BatchCalibrator::new(
            Arc::clone(&attempts),
            Arc::clone(&items),
            ItemCalibrator::new(config.calibration),
            config.batch,
        );
        Self {
            attempts,
            items,
            profiles,
            estimator: AbilityEstimator::new(config.estimation),
            batch,
        }
    }

    /// Re-estimate an examinee's ability on a scale and overwrite the profile.
    pub async fn refresh_ability(
        &self,
        examinee_id: &str,
        scale_id: &str,
    ) -> Result<(AbilityProfile, AbilityEstimate), StoreError> {
        let attempts = self.attempts.scored_responses(examinee_id, scale_id).await?;
        let responses: Vec<ScoredResponse> = attempts.iter().map(ScoredAttempt::response).collect();
        let estimate = self.estimator.estimate(&responses);

        let profile = AbilityProfile {
            examinee_id: examinee_id.to_string(),
            scale_id: scale_id.to_string(),
            theta: estimate.theta,
            standard_error: estimate.standard_error,
            attempts_count: estimate.attempts_count,
            updated_at: Utc::now(),
        };
        self.profiles.upsert(&profile).await?;

        tracing::info!(
            "ability for {examinee_id}/{scale_id}: theta={:.3} se={:.3} ({} attempts)",
            profile.theta,
            profile.standard_error,
            profile.attempts_count
        );

        Ok((profile, estimate))
    }

    /// Next item for an examinee, chosen at the θ stored in their profile.
    pub async fn next_item(
        &self,
        examinee_id: &str,
        scale_id: &str,
        exclude_ids: &[String],
    ) -> Result<Option<String>, StoreError> {
        let profile = self.profiles.get(examinee_id, scale_id).await?;
        self.next_item_at(profile.theta, scale_id, exclude_ids).await
    }

    /// Next item on a scale at an explicit θ.
    pub async fn next_item_at(
        &self,
        theta: f64,
        scale_id: &str,
        exclude_ids: &[String],
    ) -> Result<Option<String>, StoreError> {
        let candidates = self.items.calibrated_items(scale_id, exclude_ids).await?;
        let exclude: HashSet<String> = exclude_ids.iter().cloned().collect();
        let next = select_next(theta, &candidates, &exclude);
        match &next {
            Some(id) => tracing::debug!(
                "selected {id} at theta={theta:.3} from {} candidates",
                candidates.len()
            ),
            None => tracing::debug!(
                "no suitable item at theta={theta:.3} ({} candidates)",
                candidates.len()
            ),
        }
        Ok(next)
    }

    /// θ after each scored attempt, oldest first.
    pub async fn ability_progression(
        &self,
        examinee_id: &str,
        scale_id: &str,
    ) -> Result<Vec<ProgressPoint>, StoreError> {
        let attempts = self.attempts.scored_responses(examinee_id, scale_id).await?;
        Ok(self.estimator.progression(&attempts))
    }

    /// Calibrate a set of items.
    pub async fn calibrate_items(
        &self,
        item_ids: &[String],
        progress: &dyn CalibrationProgress,
    ) -> BatchOutcome {
        self.batch.calibrate_batch(item_ids, progress).await
    }
}
