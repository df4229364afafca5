//! The `adaptest calibrate` command.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use comfy_table::{Cell, Table};

use adaptest_core::batch::{BatchOutcome, CalibrationProgress, SkipReason};
use adaptest_core::calibration::ItemCalibration;
use adaptest_core::config::load_config_from;

use super::{split_ids, Session};

/// Console progress reporter that also remembers what it calibrated.
#[derive(Default)]
struct ConsoleProgress {
    calibrated: Mutex<Vec<(String, ItemCalibration)>>,
}

impl ConsoleProgress {
    fn into_calibrated(self) -> Vec<(String, ItemCalibration)> {
        let mut rows = self.calibrated.into_inner().unwrap_or_default();
        rows.sort_by(|x, y| x.0.cmp(&y.0));
        rows
    }
}

impl CalibrationProgress for ConsoleProgress {
    fn on_item_calibrated(&self, item_id: &str, calibration: &ItemCalibration) {
        let p = calibration.parameters;
        eprintln!(
            "  Calibrated: {item_id} a={:.3} b={:.3} c={:.2} (n={})",
            p.a, p.b, p.c, calibration.sample_size
        );
        if let Ok(mut rows) = self.calibrated.lock() {
            rows.push((item_id.to_string(), *calibration));
        }
    }

    fn on_item_skipped(&self, item_id: &str, reason: SkipReason) {
        let detail = match reason {
            SkipReason::TooFewAttempts { recorded } => format!("{recorded} attempts"),
            SkipReason::TooFewValidResponses { valid } => format!("{valid} usable responses"),
        };
        eprintln!("  Skipped: {item_id} ({detail})");
    }

    fn on_item_failed(&self, item_id: &str, error: &str) {
        eprintln!("  ERROR: {item_id}: {error}");
    }

    fn on_batch_complete(&self, outcome: &BatchOutcome, elapsed: Duration) {
        eprintln!(
            "\nComplete: {} calibrated, {} skipped, {} failed ({:.1}s)",
            outcome.calibrated,
            outcome.skipped,
            outcome.failed,
            elapsed.as_secs_f64()
        );
    }
}

pub async fn execute(
    data: PathBuf,
    items: Option<String>,
    min_attempts: Option<usize>,
    parallelism: Option<usize>,
    write: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(min) = min_attempts {
        config.calibration.min_attempts = min;
        config.batch.min_attempts = min;
    }
    if let Some(n) = parallelism {
        config.batch.parallelism = n;
    }
    config.validate()?;

    let session = Session::open(&data, &config)?;
    let item_ids = match items {
        Some(raw) => split_ids(&raw),
        None => session
            .store
            .snapshot()?
            .items
            .into_iter()
            .map(|item| item.id)
            .collect(),
    };
    anyhow::ensure!(!item_ids.is_empty(), "no items to calibrate");

    eprintln!(
        "adaptest v{}: calibrating {} items (min {} attempts, parallelism {})",
        env!("CARGO_PKG_VERSION"),
        item_ids.len(),
        config.batch.min_attempts,
        config.batch.parallelism
    );
    eprintln!();

    let progress = ConsoleProgress::default();
    let outcome = session.engine.calibrate_items(&item_ids, &progress).await;

    print_summary(&outcome, &progress.into_calibrated());

    if write {
        session.save(&data)?;
    }

    Ok(())
}

fn print_summary(outcome: &BatchOutcome, rows: &[(String, ItemCalibration)]) {
    if !rows.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Item", "a", "b", "c", "n"]);
        for (id, calibration) in rows {
            let p = calibration.parameters;
            table.add_row(vec![
                Cell::new(id),
                Cell::new(format!("{:.3}", p.a)),
                Cell::new(format!("{:.3}", p.b)),
                Cell::new(format!("{:.2}", p.c)),
                Cell::new(calibration.sample_size),
            ]);
        }
        println!("{table}");
    }

    println!(
        "Run {}: {} calibrated, {} skipped, {} failed",
        outcome.run_id, outcome.calibrated, outcome.skipped, outcome.failed
    );
}
