//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use tunestat_core::{config, logging};

mod commands;

#[derive(Parser)]
#[command(name = "tunestat")]
#[command(version)]
#[command(about = "Your Spotify listening statistics, in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Referrer of this load; a URL on the auth provider means "just returned from login"
    #[arg(long, global = true, env = "TUNESTAT_REFERRER", value_name = "URL")]
    referrer: Option<String>,

    /// Keep the fallback credential in memory only (nothing is read from or written to disk)
    #[arg(long, global = true)]
    ephemeral: bool,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Resolve the session once and print the result
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Open the backend login page in the browser
    Login {
        /// Wait for the post-login redirect and resolve the session with its referrer
        #[arg(long)]
        wait: bool,
        /// Local port the backend redirects to after login
        #[arg(long, default_value_t = commands::login::DEFAULT_RETURN_PORT)]
        port: u16,
    },
    /// Forget the saved fallback credential
    Logout,
    /// Show track data (requires an authenticated session)
    Tracks {
        #[command(subcommand)]
        command: TracksCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum TracksCommands {
    /// Your top 25 tracks
    Top,
    /// Your saved tracks
    Saved,
    /// Popularity and duration of your saved tracks
    Visualizer,
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load().context("load config")?;
    let _log_guard = logging::init(&config).context("init logging")?;

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli, config).await })
}

async fn dispatch(cli: Cli, config: config::Config) -> Result<()> {
    let Cli {
        command,
        referrer,
        ephemeral,
    } = cli;
    let mount = commands::MountOptions {
        referrer,
        ephemeral,
    };

    // default to the gate UI
    let Some(command) = command else {
        return commands::gate::run(&config, mount).await;
    };

    match command {
        Commands::Status { json } => commands::status::run(&config, mount, json).await,
        Commands::Login { wait, port } => commands::login::run(&config, mount, wait, port).await,
        Commands::Logout => commands::logout::run(&config),
        Commands::Tracks { command } => {
            let kind = match command {
                TracksCommands::Top => commands::tracks::TrackList::Top,
                TracksCommands::Saved => commands::tracks::TrackList::Saved,
                TracksCommands::Visualizer => commands::tracks::TrackList::Visualizer,
            };
            commands::tracks::run(&config, mount, kind).await
        }
        Commands::Config { command } => match command {
            ConfigCommands::Path => commands::config::path(),
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
