//! CLI command definitions and execution
//!
//! This module contains all CLI commands and their implementations.
//! Commands are grouped by the resource they manage.

use clap::{Args, Parser, Subcommand};
use r2_core::ConfigManager;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod backend;
mod bucket;
mod completions;
pub mod object;

pub use backend::{BackendArgs, Context};

/// r2 - object storage CLI
///
/// Manage buckets and objects through the REST API, or against a local
/// emulation store with `--local`.
#[derive(Parser, Debug)]
#[command(name = "r2")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags accepted by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress spinners
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Account identifier for the remote API
    #[arg(long, global = true, env = "CLOUDFLARE_ACCOUNT_ID")]
    pub account_id: Option<String>,

    /// API token for the remote API
    #[arg(long, global = true, env = "CLOUDFLARE_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Base URL of the remote API (overrides the config file)
    #[arg(long, global = true, env = "R2_API_URL")]
    pub api_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage buckets
    #[command(subcommand)]
    Bucket(bucket::BucketCommands),

    /// Manage objects
    #[command(subcommand)]
    Object(object::ObjectCommands),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
///
/// Ctrl+C while a command runs ends it with [`ExitCode::Interrupted`].
pub async fn execute(cli: Cli) -> ExitCode {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };
    interruptible(dispatch(cli), interrupt).await
}

async fn dispatch(cli: Cli) -> ExitCode {
    match cli.command {
        Commands::Completions(args) => completions::execute(args),
        Commands::Bucket(cmd) => match load_context(cli.global) {
            Ok(ctx) => bucket::execute(cmd, &ctx).await,
            Err(code) => code,
        },
        Commands::Object(cmd) => match load_context(cli.global) {
            Ok(ctx) => object::execute(cmd, &ctx).await,
            Err(code) => code,
        },
    }
}

/// Merge the global flags with the config file
fn load_context(global: GlobalArgs) -> Result<Context, ExitCode> {
    let config = ConfigManager::new()
        .and_then(|manager| manager.load())
        .map_err(|e| {
            Formatter::new(OutputConfig {
                json: global.json,
                no_color: global.no_color,
                ..Default::default()
            })
            .error(&format!("Failed to load configuration: {e}"));
            ExitCode::from(&e)
        })?;

    Ok(Context {
        output: OutputConfig {
            json: global.json || config.defaults.output == "json",
            no_color: global.no_color || config.defaults.color == "never",
            no_progress: global.no_progress || !config.defaults.progress,
            quiet: global.quiet,
        },
        api_url: global
            .api_url
            .unwrap_or_else(|| config.api.base_url.clone()),
        account_id: global.account_id,
        api_token: global.api_token,
        config,
    })
}

/// Run `work` unless `interrupt` resolves first
async fn interruptible<W, I>(work: W, interrupt: I) -> ExitCode
where
    W: Future<Output = ExitCode>,
    I: Future<Output = ()>,
{
    tokio::select! {
        code = work => code,
        () = interrupt => ExitCode::Interrupted,
    }
}
