//! The `adaptest progression` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use adaptest_core::config::load_config_from;
use adaptest_core::estimation::ProgressPoint;
use adaptest_core::model::UNDEFINED_STANDARD_ERROR;

use super::Session;

pub async fn execute(
    data: PathBuf,
    examinee: String,
    scale: String,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let session = Session::open(&data, &config)?;

    let points = session.engine.ability_progression(&examinee, &scale).await?;
    if points.is_empty() {
        println!("No scored attempts for {examinee} on {scale}.");
        return Ok(());
    }

    println!("{}", progression_table(&points));
    Ok(())
}

fn progression_table(points: &[ProgressPoint]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", "Answered at", "Theta", "SE"]);

    for point in points {
        let se = if point.standard_error >= UNDEFINED_STANDARD_ERROR {
            "-".to_string()
        } else {
            format!("{:.3}", point.standard_error)
        };
        table.add_row(vec![
            Cell::new(point.attempt_number),
            Cell::new(point.answered_at.format("%Y-%m-%d %H:%M:%S")),
            Cell::new(format!("{:.3}", point.theta)),
            Cell::new(se),
        ]);
    }

    table
}
