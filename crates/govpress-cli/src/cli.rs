//! Argument parsing, configuration bootstrap and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use govpress_config::BuildConfig;
use govpress_telemetry::{LoggingConfig, init_logging};

use crate::client::{CliError, CliResult};
use crate::commands::build::handle_build;
use crate::commands::daemon::handle_daemon;
use crate::commands::resolve::handle_resolve;
use crate::commands::status::handle_status;

/// Parses CLI arguments, executes the requested command and reports failures.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> CliResult<()> {
    let config = load_config(&cli)?;
    init_logging(&LoggingConfig::from_settings(&config.logging)).map_err(CliError::failure)?;
    dispatch(cli.command, config, cli.output).await
}

async fn dispatch(command: Command, config: BuildConfig, format: OutputFormat) -> CliResult<()> {
    match command {
        Command::Build(args) => handle_build(config, args, format).await,
        Command::Daemon(args) => handle_daemon(config, args).await,
        Command::Status => handle_status(config, format).await,
        Command::Resolve(args) => handle_resolve(config, args, format).await,
    }
}

fn load_config(cli: &Cli) -> CliResult<BuildConfig> {
    let mut config = govpress_config::load(cli.config.as_deref())
        .map_err(|err| CliError::validation(format!("{:#}", anyhow::Error::new(err))))?;
    if let Some(level) = &cli.log_level {
        config.logging.level.clone_from(level);
    }
    Ok(config)
}

#[derive(Parser)]
#[command(
    name = "govpress",
    version,
    about = "Build the GovPress platform and plugins bundles"
)]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "GOVPRESS_CONFIG",
        help = "Path to a TOML configuration file"
    )]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override the configured log level")]
    log_level: Option<String>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one build now as the current account.
    Build(BuildArgs),
    /// Keep the daily build scheduled until interrupted.
    Daemon(DaemonArgs),
    /// Show the report of the most recent build.
    Status,
    /// Print the download link the plugin directory reports for a slug.
    Resolve(ResolveArgs),
}

#[derive(Args, Default)]
pub(crate) struct BuildArgs {
    #[arg(long, help = "Bundle name; outputs are <NAME>.zip and <NAME>-Plugins.zip")]
    pub(crate) name: Option<String>,
    #[arg(long, help = "Directory receiving the finished bundles")]
    pub(crate) output_dir: Option<PathBuf>,
    #[arg(long, help = "Curated plugin list file")]
    pub(crate) plugin_list: Option<PathBuf>,
}

#[derive(Args, Default)]
pub(crate) struct DaemonArgs {
    #[arg(long, help = "Build once immediately instead of waiting a full interval")]
    pub(crate) run_on_start: bool,
}

#[derive(Args)]
pub(crate) struct ResolveArgs {
    #[arg(help = "Plugin directory slug")]
    pub(crate) slug: String,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}
