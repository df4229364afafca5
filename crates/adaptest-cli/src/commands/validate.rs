//! The `adaptest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_store::Snapshot;

pub fn execute(data: PathBuf) -> Result<()> {
    let snapshot = Snapshot::load_json(&data)?;

    println!(
        "Snapshot: {} items ({} calibrated), {} attempts, {} profiles",
        snapshot.items.len(),
        snapshot.calibrated_count(),
        snapshot.attempts.len(),
        snapshot.profiles.len()
    );

    let warnings = snapshot.validate();
    for w in &warnings {
        let prefix = w
            .record_id
            .as_ref()
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Snapshot valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
