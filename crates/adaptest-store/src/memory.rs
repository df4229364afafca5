//! In-memory store backed by a [`Snapshot`].

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use adaptest_core::error::StoreError;
use adaptest_core::model::{
    AbilityProfile, AttemptRecord, CalibratedItem, Item, ItemParameters, ItemResponse,
    ScoredAttempt,
};
use adaptest_core::traits::{AttemptStore, ItemStore, ProfileStore};

use crate::snapshot::Snapshot;

/// A store that keeps every record in memory.
///
/// Implements all three store traits so one instance can be handed to the
/// engine as attempt, item, and profile store. Individual items can be marked
/// as failing to exercise error paths.
pub struct InMemoryStore {
    data: Mutex<Snapshot>,
    failing_items: Mutex<HashSet<String>>,
}

impl InMemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            data: Mutex::new(snapshot),
            failing_items: Mutex::new(HashSet::new()),
        }
    }

    /// Make every read of this item's attempts fail with a backend error.
    pub fn fail_item(&self, item_id: &str) {
        if let Ok(mut failing) = self.failing_items.lock() {
            failing.insert(item_id.to_string());
        }
    }

    /// Append an attempt. The item must exist.
    pub fn record_attempt(&self, attempt: AttemptRecord) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        find_item(&data, &attempt.item_id)?;
        data.attempts.push(attempt);
        Ok(())
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> Result<Snapshot, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Snapshot>, StoreError> {
        self.data
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".into()))
    }

    fn check_failing(&self, item_id: &str) -> Result<(), StoreError> {
        let failing = self
            .failing_items
            .lock()
            .map_err(|_| StoreError::Unavailable("in-memory store lock poisoned".into()))?;
        if failing.contains(item_id) {
            return Err(StoreError::Backend(format!("injected failure reading {item_id}")));
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new(Snapshot::default())
    }
}

fn find_item<'a>(data: &'a Snapshot, item_id: &str) -> Result<&'a Item, StoreError> {
    data.items
        .iter()
        .find(|i| i.id == item_id)
        .ok_or_else(|| StoreError::item_not_found(item_id))
}

#[async_trait]
impl AttemptStore for InMemoryStore {
    async fn scored_responses(
        &self,
        examinee_id: &str,
        scale_id: &str,
    ) -> Result<Vec<ScoredAttempt>, StoreError> {
        let data = self.lock()?;
        let parameters: HashMap<&str, ItemParameters> = data
            .items
            .iter()
            .filter(|i| i.scale_id == scale_id)
            .filter_map(|i| i.parameters.map(|p| (i.id.as_str(), p)))
            .collect();

        let mut scored: Vec<ScoredAttempt> = data
            .attempts
            .iter()
            .filter(|a| a.examinee_id == examinee_id)
            .filter_map(|a| {
                let params = parameters.get(a.item_id.as_str())?;
                Some(ScoredAttempt {
                    item_id: a.item_id.clone(),
                    parameters: *params,
                    correct: a.correct?,
                    answered_at: a.answered_at,
                })
            })
            .collect();
        scored.sort_by_key(|a| a.answered_at);
        Ok(scored)
    }

    async fn responses_for_item(&self, item_id: &str) -> Result<Vec<ItemResponse>, StoreError> {
        self.check_failing(item_id)?;
        let data = self.lock()?;
        let item = find_item(&data, item_id)?;

        let abilities: HashMap<&str, f64> = data
            .profiles
            .iter()
            .filter(|p| p.scale_id == item.scale_id && p.has_information())
            .map(|p| (p.examinee_id.as_str(), p.theta))
            .collect();

        Ok(data
            .attempts
            .iter()
            .filter(|a| a.item_id == item_id)
            .map(|a| ItemResponse {
                respondent_theta: abilities.get(a.examinee_id.as_str()).copied(),
                correct: a.correct,
            })
            .collect())
    }

    async fn attempt_count(&self, item_id: &str) -> Result<usize, StoreError> {
        let data = self.lock()?;
        find_item(&data, item_id)?;
        Ok(data.attempts.iter().filter(|a| a.item_id == item_id).count())
    }
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn calibrated_items(
        &self,
        scale_id: &str,
        exclude_ids: &[String],
    ) -> Result<Vec<CalibratedItem>, StoreError> {
        let data = self.lock()?;
        let mut items: Vec<CalibratedItem> = data
            .items
            .iter()
            .filter(|i| i.scale_id == scale_id && !exclude_ids.contains(&i.id))
            .filter_map(|i| {
                i.parameters.map(|parameters| CalibratedItem {
                    id: i.id.clone(),
                    parameters,
                })
            })
            .collect();
        items.sort_by(|x, y| x.id.cmp(&y.id));
        Ok(items)
    }

    async fn update_parameters(
        &self,
        item_id: &str,
        parameters: ItemParameters,
        sample_size: usize,
        calibrated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        let item = data
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| StoreError::item_not_found(item_id))?;
        item.apply_calibration(parameters, sample_size, calibrated_at);
        tracing::debug!("stored parameters for {item_id} (n={sample_size})");
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn upsert(&self, profile: &AbilityProfile) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        match data
            .profiles
            .iter_mut()
            .find(|p| p.examinee_id == profile.examinee_id && p.scale_id == profile.scale_id)
        {
            Some(existing) => *existing = profile.clone(),
            None => data.profiles.push(profile.clone()),
        }
        Ok(())
    }

    async fn get(&self, examinee_id: &str, scale_id: &str) -> Result<AbilityProfile, StoreError> {
        let data = self.lock()?;
        data.profiles
            .iter()
            .find(|p| p.examinee_id == examinee_id && p.scale_id == scale_id)
            .cloned()
            .ok_or_else(|| StoreError::profile_not_found(examinee_id, scale_id))
    }
}
