//! The `adaptest estimate` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::config::load_config_from;

use super::Session;

pub async fn execute(
    data: PathBuf,
    examinee: String,
    scale: String,
    write: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let session = Session::open(&data, &config)?;

    let (profile, estimate) = session.engine.refresh_ability(&examinee, &scale).await?;

    println!("Examinee: {examinee} ({scale})");
    println!("  theta:          {:.4}", profile.theta);
    if profile.has_information() {
        println!("  standard error: {:.4}", profile.standard_error);
    } else {
        println!("  standard error: undefined (no information)");
    }
    println!("  attempts:       {}", profile.attempts_count);
    if estimate.attempts_count > 0 {
        println!(
            "  converged:      {} ({} iterations)",
            if estimate.converged { "yes" } else { "no" },
            estimate.iterations
        );
    }

    if write {
        session.save(&data)?;
    }

    Ok(())
}
