//! Sensor matchup tool.
//!
//! Finds pixel pairs of two satellite sensors that observed the same
//! location at nearly the same time, over an archive of scene manifests.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::ToolConfig;

#[derive(Parser, Debug)]
#[command(name = "matchup-tool")]
#[command(about = "Satellite sensor matchup tool")]
struct Args {
    /// Log level
    #[arg(long, default_value = "info", env = "MATCHUP_LOG_LEVEL")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a matchup over a scene archive
    Run {
        /// Tool configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Use-case configuration file
        #[arg(short, long)]
        use_case: Option<PathBuf>,

        /// Directory of scene manifests
        #[arg(short, long)]
        archive_dir: Option<PathBuf>,

        /// First day (yyyy-DDD)
        #[arg(short, long)]
        start: Option<String>,

        /// Last day (yyyy-DDD)
        #[arg(short, long)]
        end: Option<String>,

        /// Process primary observations in parallel
        #[arg(long)]
        parallel: bool,
    },

    /// Check a use-case configuration
    Validate {
        /// Use-case configuration file
        use_case: PathBuf,
    },

    /// Compare pixel times with the time axis along one scene line
    TimeDiff {
        /// Scene manifest
        scene: PathBuf,

        /// Scan line
        #[arg(short, long)]
        line: i32,
    },
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);
    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    match args.command {
        Command::Run {
            config,
            use_case,
            archive_dir,
            start,
            end,
            parallel,
        } => {
            let mut tool_config = ToolConfig::load(config.as_deref())?;
            if let Some(use_case) = use_case {
                tool_config.use_case = use_case;
            }
            if let Some(archive_dir) = archive_dir {
                tool_config.archive_dir = archive_dir;
            }
            if let Some(start) = start {
                tool_config.start_date = start;
            }
            if let Some(end) = end {
                tool_config.end_date = end;
            }
            if parallel {
                tool_config.parallel = Some(true);
            }

            info!(
                use_case = %tool_config.use_case.display(),
                archive = %tool_config.archive_dir.display(),
                start = %tool_config.start_date,
                end = %tool_config.end_date,
                "Starting matchup tool"
            );
            commands::run(&tool_config)?;
        }
        Command::Validate { use_case } => {
            if !commands::validate_use_case(&use_case)? {
                bail!("Use case {} is not valid", use_case.display());
            }
        }
        Command::TimeDiff { scene, line } => {
            for (x, difference) in commands::time_diff(&scene, line)?.iter().enumerate() {
                match difference {
                    Some(seconds) => println!("{}\t{:.3}", x, seconds),
                    None => println!("{}\t-", x),
                }
            }
        }
    }

    Ok(())
}
