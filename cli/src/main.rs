mod commands;
mod config;
mod device;
mod logging;

use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;

use commands::calibrate::CalibrateArgs;
use commands::sample::SampleArgs;
use commands::watch::WatchArgs;
use config::{ensure_dirs, LogLevel, UserConfig};
use logging::LogMode;

#[derive(Debug, Subcommand)]
enum Commands {
    /// Take one reading
    #[command(alias = "s")]
    Sample {
        /// Ignore the correction coefficient
        #[arg(short, long)]
        raw: bool,

        /// Average several reads
        #[arg(short, long)]
        thorough: bool,

        /// Decimal places (0-6)
        #[arg(short, long)]
        precision: Option<i32>,

        /// Print JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Watch for level changes until the duration elapses or Ctrl-C
    #[command(alias = "w")]
    Watch {
        /// Stop after this long (e.g. 30s, 2m)
        #[arg(short, long, value_parser = humantime::parse_duration)]
        duration: Option<Duration>,

        /// Data mode: instant, averaged
        #[arg(short, long)]
        mode: Option<String>,

        /// Check kind: section, percentage, voltage
        #[arg(short, long)]
        kind: Option<String>,

        /// How often to check for a change
        #[arg(short, long, default_value = "1s", value_parser = humantime::parse_duration)]
        interval: Duration,

        /// One JSON object per line
        #[arg(short, long)]
        json: bool,
    },

    /// Calibrate against a charger unplug
    Calibrate {
        /// Decimal places of the measurement reads (0-6)
        #[arg(short, long, default_value_t = 3)]
        precision: i32,

        /// When the simulated charger is removed
        #[arg(short, long, default_value = "3s", value_parser = humantime::parse_duration)]
        unplug_after: Duration,

        /// Print JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show or edit configuration
    Config {
        /// Print config file path
        #[arg(long)]
        path: bool,

        /// Reset config to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(short, long)]
        edit: bool,
    },
}

/// Battery level monitor for ADC-sampled Li-ion cells
#[derive(Debug, Parser)]
#[command(name = "cellgauge", version, verbatim_doc_comment)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = ensure_dirs();

    let cli = Cli::parse();
    let config = UserConfig::load();
    let log_level_override = cli.log_level.as_deref().map(LogLevel::from_str);

    match cli.command {
        Commands::Sample {
            raw,
            thorough,
            precision,
            json,
        } => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::sample::run(
                &config,
                SampleArgs {
                    raw,
                    thorough,
                    precision,
                    json,
                },
            )
        }
        Commands::Watch {
            duration,
            mode,
            kind,
            interval,
            json,
        } => {
            let _guard = logging::init(config.log_level, LogMode::Both, log_level_override);
            commands::watch::run(
                &config,
                WatchArgs {
                    duration,
                    mode,
                    kind,
                    interval,
                    json,
                },
            )
        }
        Commands::Calibrate {
            precision,
            unplug_after,
            json,
        } => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::calibrate::run(
                &config,
                CalibrateArgs {
                    precision,
                    unplug_after,
                    json,
                },
            )
        }
        Commands::Config { path, reset, edit } => {
            let _guard = logging::init(config.log_level, LogMode::Stderr, log_level_override);
            commands::config::run(path, reset, edit)
        }
    }
}
