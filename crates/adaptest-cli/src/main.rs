//! adaptest CLI: drives the IRT engine over a JSON snapshot.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adaptest", version, about = "Item response theory engine for adaptive testing")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate an examinee's ability on a scale
    Estimate {
        /// Snapshot JSON file
        #[arg(long)]
        data: PathBuf,

        /// Examinee ID
        #[arg(long)]
        examinee: String,

        /// Scale ID
        #[arg(long)]
        scale: String,

        /// Store the updated ability profile back into the snapshot
        #[arg(long)]
        write: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Pick the most informative next item for an examinee
    NextItem {
        /// Snapshot JSON file
        #[arg(long)]
        data: PathBuf,

        /// Examinee ID
        #[arg(long)]
        examinee: String,

        /// Scale ID
        #[arg(long)]
        scale: String,

        /// Item IDs to leave out (comma-separated)
        #[arg(long)]
        exclude: Option<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Calibrate item parameters from recorded attempts
    Calibrate {
        /// Snapshot JSON file
        #[arg(long)]
        data: PathBuf,

        /// Items to calibrate (comma-separated, default: every item)
        #[arg(long)]
        items: Option<String>,

        /// Minimum attempts before an item is considered
        #[arg(long)]
        min_attempts: Option<usize>,

        /// Max items calibrated concurrently
        #[arg(long)]
        parallelism: Option<usize>,

        /// Store the new parameters back into the snapshot
        #[arg(long)]
        write: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show how the ability estimate evolved attempt by attempt
    Progression {
        /// Snapshot JSON file
        #[arg(long)]
        data: PathBuf,

        /// Examinee ID
        #[arg(long)]
        examinee: String,

        /// Scale ID
        #[arg(long)]
        scale: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a snapshot for duplicates and dangling references
    Validate {
        /// Snapshot JSON file
        #[arg(long)]
        data: PathBuf,
    },

    /// Create a starter config
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "adaptest=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Estimate {
            data,
            examinee,
            scale,
            write,
            config,
        } => commands::estimate::execute(data, examinee, scale, write, config).await,
        Commands::NextItem {
            data,
            examinee,
            scale,
            exclude,
            config,
        } => commands::next_item::execute(data, examinee, scale, exclude, config).await,
        Commands::Calibrate {
            data,
            items,
            min_attempts,
            parallelism,
            write,
            config,
        } => {
            commands::calibrate::execute(data, items, min_attempts, parallelism, write, config)
                .await
        }
        Commands::Progression {
            data,
            examinee,
            scale,
            config,
        } => commands::progression::execute(data, examinee, scale, config).await,
        Commands::Validate { data } => commands::validate::execute(data),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
