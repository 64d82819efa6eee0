use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use clap::Parser;

use torrent_stage::config::{CliOverrides, Config};
use torrent_stage::tree::Priority;
use torrent_stage::StageAction;

#[derive(Parser)]
#[command(name = "torrent-stage")]
#[command(about = "Stage torrent files and submit them to a Transmission RPC server")]
struct Cli {
    /// Torrent files to submit
    #[arg(value_name = "TORRENT")]
    sources: Vec<PathBuf>,

    /// Transmission RPC endpoint URL
    #[arg(long)]
    url: Option<String>,

    /// RPC username
    #[arg(long)]
    username: Option<String>,

    /// RPC password
    #[arg(long)]
    password: Option<String>,

    /// Destination directory on the server
    #[arg(short = 'd', long)]
    download_dir: Option<String>,

    /// Bandwidth priority for the whole torrent: low, normal or high
    #[arg(short, long)]
    priority: Option<Priority>,

    /// Add torrents paused
    #[arg(long)]
    paused: bool,

    /// Toggle the download checkbox of one tree entry (single torrent only);
    /// repeat for multiple activations
    #[arg(long = "toggle", value_name = "PATH")]
    toggle: Vec<String>,

    /// Cycle the priority of one tree entry (single torrent only); repeat
    /// for multiple activations
    #[arg(long = "cycle-priority", value_name = "PATH")]
    cycle_priority: Vec<String>,

    /// Print the staged tree and request without submitting
    #[arg(long)]
    dry_run: bool,

    /// List destination-folder choices known to the server
    #[arg(long)]
    list_dirs: bool,

    /// Path to a config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        url: cli.url,
        username: cli.username,
        password: cli.password,
        download_dir: cli.download_dir,
        priority: cli.priority,
        paused: cli.paused.then_some(true),
        config_file: cli.config,
    };
    let config = Config::load_with_cli(&overrides)?;
    config.validate()?;

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::from_str(&config.logging.level)?
    };
    let subscriber = tracing_subscriber::fmt().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    torrent_stage::run(
        config,
        StageAction {
            sources: cli.sources,
            toggle: cli.toggle,
            cycle_priority: cli.cycle_priority,
            dry_run: cli.dry_run,
            list_dirs: cli.list_dirs,
        },
    )
    .await
}
