//! Batch calibration across many items.
//!
//! Items are calibrated concurrently with bounded parallelism. A failure on
//! one item is counted and logged, never propagated to its siblings.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::calibration::{ItemCalibration, ItemCalibrator, MIN_ATTEMPTS_FOR_CALIBRATION};
use crate::error::StoreError;
use crate::traits::{AttemptStore, ItemStore};

/// Configuration for batch calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Items with fewer recorded attempts are skipped without being fetched.
    pub min_attempts: usize,
    /// Maximum items calibrated at once.
    pub parallelism: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_attempts: MIN_ATTEMPTS_FOR_CALIBRATION,
            parallelism: 4,
        }
    }
}

/// Aggregate counts of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Identifier of the run, for correlating log lines.
    pub run_id: Uuid,
    pub calibrated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.calibrated + self.skipped + self.failed
    }
}

/// Why an item was left uncalibrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer recorded attempts than the batch minimum.
    TooFewAttempts { recorded: usize },
    /// Enough attempts, but too few with a scored outcome and a known θ.
    TooFewValidResponses { valid: usize },
}

/// Progress observer for batch calibration.
pub trait CalibrationProgress: Send + Sync {
    fn on_item_calibrated(&self, item_id: &str, calibration: &ItemCalibration);
    fn on_item_skipped(&self, item_id: &str, reason: SkipReason);
    fn on_item_failed(&self, item_id: &str, error: &str);
    fn on_batch_complete(&self, outcome: &BatchOutcome, elapsed: Duration);
}

/// No-op progress observer.
pub struct NoopProgress;

impl CalibrationProgress for NoopProgress {
    fn on_item_calibrated(&self, _: &str, _: &ItemCalibration) {}
    fn on_item_skipped(&self, _: &str, _: SkipReason) {}
    fn on_item_failed(&self, _: &str, _: &str) {}
    fn on_batch_complete(&self, _: &BatchOutcome, _: Duration) {}
}

enum ItemOutcome {
    Calibrated(ItemCalibration),
    Skipped(SkipReason),
}

/// Drives [`ItemCalibrator`] over a list of items.
pub struct BatchCalibrator {
    attempts: Arc<dyn AttemptStore>,
    items: Arc<dyn ItemStore>,
    calibrator: ItemCalibrator,
    config: BatchConfig,
}

impl BatchCalibrator {
    pub fn new(
        attempts: Arc<dyn AttemptStore>,
        items: Arc<dyn ItemStore>,
        calibrator: ItemCalibrator,
        config: BatchConfig,
    ) -> Self {
        Self {
            attempts,
            items,
            calibrator,
            config,
        }
    }

    /// Calibrate every listed item and report how many were calibrated,
    /// skipped, or failed.
    ///
    /// Repeated ids are calibrated once.
    pub async fn calibrate_batch(
        &self,
        item_ids: &[String],
        progress: &dyn CalibrationProgress,
    ) -> BatchOutcome {
        let start = Instant::now();
        let run_id = Uuid::new_v4();
        let semaphore = Semaphore::new(self.config.parallelism.clamp(1, Semaphore::MAX_PERMITS));

        let mut seen = HashSet::new();
        let unique: Vec<&str> = item_ids
            .iter()
            .map(String::as_str)
            .filter(|id| seen.insert(*id))
            .collect();

        tracing::info!(
            "calibration run {run_id}: {} items, min_attempts={}, parallelism={}",
            unique.len(),
            self.config.min_attempts,
            self.config.parallelism
        );

        let mut futures: FuturesUnordered<_> = unique
            .into_iter()
            .map(|item_id| {
                let semaphore = &semaphore;
                async move {
                    let result = match semaphore.acquire().await {
                        Ok(_permit) => self.calibrate_item(item_id).await,
                        Err(_) => Err(StoreError::Unavailable("worker pool closed".into())),
                    };
                    (item_id, result)
                }
            })
            .collect();

        let mut outcome = BatchOutcome {
            run_id,
            calibrated: 0,
            skipped: 0,
            failed: 0,
        };

        while let Some((item_id, result)) = futures.next().await {
            match result {
                Ok(ItemOutcome::Calibrated(calibration)) => {
                    progress.on_item_calibrated(item_id, &calibration);
                    outcome.calibrated += 1;
                }
                Ok(ItemOutcome::Skipped(reason)) => {
                    tracing::debug!("skipped {item_id}: {reason:?}");
                    progress.on_item_skipped(item_id, reason);
                    outcome.skipped += 1;
                }
                Err(e) => {
                    tracing::error!("calibration failed for {item_id}: {e}");
                    progress.on_item_failed(item_id, &e.to_string());
                    outcome.failed += 1;
                }
            }
        }

        let elapsed = start.elapsed();
        tracing::info!(
            "calibration run {run_id} finished in {:.1}s: {} calibrated, {} skipped, {} failed",
            elapsed.as_secs_f64(),
            outcome.calibrated,
            outcome.skipped,
            outcome.failed
        );
        progress.on_batch_complete(&outcome, elapsed);

        outcome
    }

    /// Read, calibrate, and write back a single item.
    async fn calibrate_item(&self, item_id: &str) -> Result<ItemOutcome, StoreError> {
        let recorded = self.attempts.attempt_count(item_id).await?;
        if recorded < self.config.min_attempts {
            return Ok(ItemOutcome::Skipped(SkipReason::TooFewAttempts { recorded }));
        }

        let responses = self.attempts.responses_for_item(item_id).await?;
        let Some(calibration) = self.calibrator.calibrate(&responses) else {
            return Ok(ItemOutcome::Skipped(SkipReason::TooFewValidResponses {
                valid: ItemCalibrator::valid_count(&responses),
            }));
        };

        self.items
            .update_parameters(
                item_id,
                calibration.parameters,
                calibration.sample_size,
                Utc::now(),
            )
            .await?;

        Ok(ItemOutcome::Calibrated(calibration))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::DateTime;

    use super::*;
    use crate::model::{CalibratedItem, ItemParameters, ItemResponse, ScoredAttempt};

    enum Fixture {
        Responses(Vec<ItemResponse>),
        Broken,
    }

    #[derive(Default)]
    struct FakeStore {
        items: HashMap<String, Fixture>,
        updates: Mutex<Vec<(String, ItemParameters, usize)>>,
        fetches: AtomicUsize,
    }

    impl FakeStore {
        fn with(mut self, id: &str, fixture: Fixture) -> Self {
            self.items.insert(id.to_string(), fixture);
            self
        }
    }

    #[async_trait]
    impl AttemptStore for FakeStore {
        async fn scored_responses(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Vec<ScoredAttempt>, StoreError> {
            Ok(vec![])
        }

        async fn responses_for_item(&self, item_id: &str) -> Result<Vec<ItemResponse>, StoreError> {
            self.fetches.fetch_add(1, Ordering::Relaxed);
            match self.items.get(item_id) {
                Some(Fixture::Responses(r)) => Ok(r.clone()),
                Some(Fixture::Broken) => Err(StoreError::Backend(format!("cannot read {item_id}"))),
                None => Err(StoreError::item_not_found(item_id)),
            }
        }

        async fn attempt_count(&self, item_id: &str) -> Result<usize, StoreError> {
            match self.items.get(item_id) {
                Some(Fixture::Responses(r)) => Ok(r.len()),
                Some(Fixture::Broken) => Ok(100),
                None => Err(StoreError::item_not_found(item_id)),
            }
        }
    }

    #[async_trait]
    impl ItemStore for FakeStore {
        async fn calibrated_items(
            &self,
            _: &str,
            _: &[String],
        ) -> Result<Vec<CalibratedItem>, StoreError> {
            Ok(vec![])
        }

        async fn update_parameters(
            &self,
            item_id: &str,
            parameters: ItemParameters,
            sample_size: usize,
            _: DateTime<Utc>,
        ) -> Result<(), StoreError> {
            self.updates
                .lock()
                .unwrap()
                .push((item_id.to_string(), parameters, sample_size));
            Ok(())
        }
    }

    fn responses(n: usize) -> Vec<ItemResponse> {
        (0..n)
            .map(|i| ItemResponse {
                respondent_theta: Some(if i % 2 == 0 { 1.0 } else { -1.0 }),
                correct: Some(i % 2 == 0),
            })
            .collect()
    }

    fn unscored(n: usize) -> Vec<ItemResponse> {
        (0..n)
            .map(|_| ItemResponse {
                respondent_theta: Some(0.0),
                correct: None,
            })
            .collect()
    }

    fn batch(store: Arc<FakeStore>, config: BatchConfig) -> BatchCalibrator {
        BatchCalibrator::new(store.clone(), store, ItemCalibrator::default(), config)
    }

    fn ids(range: std::ops::Range<usize>) -> Vec<String> {
        range.map(|i| format!("q{i}")).collect()
    }

    #[tokio::test]
    async fn mixed_batch_counts_each_outcome() {
        let mut store = FakeStore::default();
        for i in 0..3 {
            store = store.with(&format!("q{i}"), Fixture::Broken);
        }
        // two below the attempt pre-filter, two that pass it but lack scores
        store = store
            .with("q3", Fixture::Responses(responses(10)))
            .with("q4", Fixture::Responses(responses(29)))
            .with("q5", Fixture::Responses(unscored(40)))
            .with("q6", Fixture::Responses(unscored(35)));
        for i in 7..10 {
            store = store.with(&format!("q{i}"), Fixture::Responses(responses(40)));
        }
        let store = Arc::new(store);

        let outcome = batch(store.clone(), BatchConfig::default())
            .calibrate_batch(&ids(0..10), &NoopProgress)
            .await;

        assert_eq!(outcome.calibrated, 3);
        assert_eq!(outcome.skipped, 4);
        assert_eq!(outcome.failed, 3);
        assert_eq!(outcome.total(), 10);

        let updates = store.updates.lock().unwrap();
        let mut updated: Vec<&str> = updates.iter().map(|(id, _, _)| id.as_str()).collect();
        updated.sort();
        assert_eq!(updated, vec!["q7", "q8", "q9"]);
        assert!(updates.iter().all(|(_, _, n)| *n == 40));
    }

    #[tokio::test]
    async fn pre_filter_avoids_fetching_responses() {
        let store = Arc::new(FakeStore::default().with("q0", Fixture::Responses(responses(12))));
        let outcome = batch(store.clone(), BatchConfig::default())
            .calibrate_batch(&ids(0..1), &NoopProgress)
            .await;
        assert_eq!(outcome.skipped, 1);
        assert_eq!(store.fetches.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn unknown_items_fail_without_aborting() {
        let store = Arc::new(FakeStore::default().with("q0", Fixture::Responses(responses(30))));
        let outcome = batch(store, BatchConfig::default())
            .calibrate_batch(&["q0".to_string(), "missing".to_string()], &NoopProgress)
            .await;
        assert_eq!(outcome.calibrated, 1);
        assert_eq!(outcome.failed, 1);
    }

    #[tokio::test]
    async fn duplicate_ids_are_calibrated_once() {
        let store = Arc::new(FakeStore::default().with("q0", Fixture::Responses(responses(30))));
        let item_ids = vec!["q0".to_string(), "q0".to_string(), "q0".to_string()];
        let outcome = batch(store.clone(), BatchConfig::default())
            .calibrate_batch(&item_ids, &NoopProgress)
            .await;
        assert_eq!(outcome.total(), 1);
        assert_eq!(store.updates.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lower_minimum_admits_small_items() {
        let store = Arc::new(FakeStore::default().with("q0", Fixture::Responses(responses(12))));
        let config = BatchConfig {
            min_attempts: 10,
            parallelism: 1,
        };
        let outcome = batch(store, config).calibrate_batch(&ids(0..1), &NoopProgress).await;
        // the pre-filter passes but the calibrator still wants 30
        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.calibrated, 0);
    }

    #[derive(Default)]
    struct Recorder {
        skipped: Mutex<Vec<(String, SkipReason)>>,
        failed: Mutex<Vec<String>>,
        completed: AtomicUsize,
    }

    impl CalibrationProgress for Recorder {
        fn on_item_calibrated(&self, _: &str, _: &ItemCalibration) {}
        fn on_item_skipped(&self, item_id: &str, reason: SkipReason) {
            self.skipped.lock().unwrap().push((item_id.to_string(), reason));
        }
        fn on_item_failed(&self, item_id: &str, _: &str) {
            self.failed.lock().unwrap().push(item_id.to_string());
        }
        fn on_batch_complete(&self, _: &BatchOutcome, _: Duration) {
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[tokio::test]
    async fn progress_sees_per_item_detail() {
        let store = Arc::new(
            FakeStore::default()
                .with("q0", Fixture::Responses(responses(5)))
                .with("q1", Fixture::Responses(unscored(31)))
                .with("q2", Fixture::Broken),
        );
        let recorder = Recorder::default();
        batch(store, BatchConfig::default())
            .calibrate_batch(&ids(0..3), &recorder)
            .await;

        let mut skipped = recorder.skipped.lock().unwrap().clone();
        skipped.sort_by(|x, y| x.0.cmp(&y.0));
        assert_eq!(
            skipped,
            vec![
                ("q0".to_string(), SkipReason::TooFewAttempts { recorded: 5 }),
                ("q1".to_string(), SkipReason::TooFewValidResponses { valid: 0 }),
            ]
        );
        assert_eq!(*recorder.failed.lock().unwrap(), vec!["q2".to_string()]);
        assert_eq!(recorder.completed.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn oversized_parallelism_is_capped() {
        let store = Arc::new(FakeStore::default().with("q0", Fixture::Responses(responses(30))));
        let config = BatchConfig {
            parallelism: usize::MAX,
            ..BatchConfig::default()
        };
        let outcome = batch(store, config)
            .calibrate_batch(&ids(0..1), &NoopProgress)
            .await;
        assert_eq!(outcome.calibrated, 1);
    }

    #[tokio::test]
    async fn empty_batch_is_all_zero() {
        let store = Arc::new(FakeStore::default());
        let outcome = batch(store, BatchConfig::default())
            .calibrate_batch(&[], &NoopProgress)
            .await;
        assert_eq!(outcome.total(), 0);
    }
}
