//! The `adaptest next-item` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use adaptest_core::config::load_config_from;

use super::{split_ids, Session};

pub async fn execute(
    data: PathBuf,
    examinee: String,
    scale: String,
    exclude: Option<String>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let session = Session::open(&data, &config)?;
    let exclude = exclude.as_deref().map(split_ids).unwrap_or_default();

    let next = session
        .engine
        .next_item(&examinee, &scale, &exclude)
        .await
        .with_context(|| {
            format!(
                "cannot select for {examinee} on {scale}; \
                 run `adaptest estimate --write` first"
            )
        })?;

    match next {
        Some(id) => println!("{id}"),
        None => println!("No suitable item."),
    }

    Ok(())
}
