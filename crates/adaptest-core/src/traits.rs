//! Store traits the engine reads from and persists through.
//!
//! Persistence lives outside this crate. `adaptest-store` ships an in-memory
//! implementation; production deployments back these with their database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::model::{AbilityProfile, CalibratedItem, ItemParameters, ItemResponse, ScoredAttempt};

// ---------------------------------------------------------------------------
// Attempts
// ---------------------------------------------------------------------------

/// Read access to recorded attempts.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Scored attempts by an examinee on a scale, oldest first.
    ///
    /// Must leave out attempts on uncalibrated items and unscored attempts.
    async fn scored_responses(
        &self,
        examinee_id: &str,
        scale_id: &str,
    ) -> Result<Vec<ScoredAttempt>, StoreError>;

    /// Every attempt on an item, paired with the respondent's current θ.
    async fn responses_for_item(&self, item_id: &str) -> Result<Vec<ItemResponse>, StoreError>;

    /// Number of recorded attempts on an item, scored or not.
    ///
    /// Used as a cheap pre-filter before calibration. Stores with a count
    /// query should override the default.
    async fn attempt_count(&self, item_id: &str) -> Result<usize, StoreError> {
        Ok(self.responses_for_item(item_id).await?.len())
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Read/write access to the item bank.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Calibrated items on a scale, minus `exclude_ids`, in a stable order.
    async fn calibrated_items(
        &self,
        scale_id: &str,
        exclude_ids: &[String],
    ) -> Result<Vec<CalibratedItem>, StoreError>;

    /// Persist freshly calibrated parameters for an item.
    async fn update_parameters(
        &self,
        item_id: &str,
        parameters: ItemParameters,
        sample_size: usize,
        calibrated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Profiles
// ---------------------------------------------------------------------------

/// Read/write access to ability profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert or overwrite the profile keyed by (examinee, scale).
    async fn upsert(&self, profile: &AbilityProfile) -> Result<(), StoreError>;

    /// Fetch a profile, failing with `NotFound` when none exists.
    async fn get(&self, examinee_id: &str, scale_id: &str) -> Result<AbilityProfile, StoreError>;
}
