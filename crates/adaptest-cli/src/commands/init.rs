//! The `adaptest init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("adaptest.toml").exists() {
        println!("adaptest.toml already exists, skipping.");
    } else {
        std::fs::write("adaptest.toml", SAMPLE_CONFIG)?;
        println!("Created adaptest.toml");
    }

    println!("\nNext steps:");
    println!("  1. Export your item bank and attempts as a snapshot JSON file");
    println!("  2. Run: adaptest validate --data bank.json");
    println!("  3. Run: adaptest calibrate --data bank.json --write");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# adaptest configuration
# Every key is optional; the values below are the defaults.

[estimation]
max_iterations = 50
convergence_threshold = 0.001

[calibration]
min_attempts = 30
initial_discrimination = 1.0
initial_difficulty = 0.0
guessing = 0.2
min_discrimination = 0.5
max_discrimination = 2.5
discrimination_scale = 1.5
rate_floor = 0.2
rate_ceiling = 0.8

[batch]
min_attempts = 30
parallelism = 4
"#;
