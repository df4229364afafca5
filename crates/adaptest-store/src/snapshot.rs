//! JSON snapshot of an item bank, its attempts, and ability profiles.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use adaptest_core::model::{AbilityProfile, AttemptRecord, Item};

/// Everything the engine needs, in one serializable value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
    #[serde(default)]
    pub profiles: Vec<AbilityProfile>,
}

/// A problem found while validating a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotWarning {
    /// The record the warning is about, if any.
    pub record_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl Snapshot {
    /// Load a snapshot from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))?;
        Ok(snapshot)
    }

    /// Save the snapshot as pretty JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize snapshot")?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        Ok(())
    }

    /// Check the snapshot for dangling references and duplicates.
    pub fn validate(&self) -> Vec<SnapshotWarning> {
        let mut warnings = Vec::new();

        let mut item_ids = HashSet::new();
        for item in &self.items {
            if !item_ids.insert(item.id.as_str()) {
                warnings.push(SnapshotWarning {
                    record_id: Some(item.id.clone()),
                    message: format!("duplicate item ID: {}", item.id),
                });
            }
        }

        let mut dangling = HashSet::new();
        for attempt in &self.attempts {
            if !item_ids.contains(attempt.item_id.as_str()) && dangling.insert(&attempt.item_id) {
                warnings.push(SnapshotWarning {
                    record_id: Some(attempt.item_id.clone()),
                    message: format!("attempts reference unknown item {}", attempt.item_id),
                });
            }
        }

        let mut profile_keys = HashSet::new();
        for profile in &self.profiles {
            let key = (profile.examinee_id.as_str(), profile.scale_id.as_str());
            if !profile_keys.insert(key) {
                warnings.push(SnapshotWarning {
                    record_id: Some(format!("{}/{}", profile.examinee_id, profile.scale_id)),
                    message: "duplicate ability profile".into(),
                });
            }
            let se = profile.standard_error;
            if se.is_nan() || se < 0.0 || !profile.theta.is_finite() {
                warnings.push(SnapshotWarning {
                    record_id: Some(format!("{}/{}", profile.examinee_id, profile.scale_id)),
                    message: "profile has a non-finite theta or negative standard error".into(),
                });
            }
        }

        warnings
    }

    /// Number of items that have parameters.
    pub fn calibrated_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_calibrated()).count()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use adaptest_core::model::ItemParameters;

    fn sample() -> Snapshot {
        let mut calibrated = Item::new("q1", "algebra");
        calibrated.parameters = Some(ItemParameters::new(1.2, 0.0, 0.2).unwrap());
        Snapshot {
            items: vec![calibrated, Item::new("q2", "algebra")],
            attempts: vec![AttemptRecord {
                examinee_id: "alice".into(),
                item_id: "q1".into(),
                correct: Some(true),
                answered_at: Utc::now(),
            }],
            profiles: vec![],
        }
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bank.json");
        let snapshot = sample();
        snapshot.save_json(&path).unwrap();
        let loaded = Snapshot::load_json(&path).unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.calibrated_count(), 1);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let snapshot: Snapshot = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(snapshot.attempts.is_empty());
        assert!(snapshot.profiles.is_empty());
    }

    #[test]
    fn load_reports_the_path() {
        let err = Snapshot::load_json(Path::new("/nonexistent/bank.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/bank.json"));
    }

    #[test]
    fn valid_snapshot_has_no_warnings() {
        assert!(sample().validate().is_empty());
    }

    #[test]
    fn validate_flags_duplicates_and_dangling_attempts() {
        let mut snapshot = sample();
        snapshot.items.push(Item::new("q1", "algebra"));
        for _ in 0..3 {
            snapshot.attempts.push(AttemptRecord {
                examinee_id: "bob".into(),
                item_id: "ghost".into(),
                correct: None,
                answered_at: Utc::now(),
            });
        }

        let warnings = snapshot.validate();
        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].message.contains("duplicate item ID"));
        assert_eq!(warnings[1].record_id.as_deref(), Some("ghost"));
    }
}
