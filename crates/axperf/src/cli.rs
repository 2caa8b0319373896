//! CLI definitions and argument types.

use std::path::PathBuf;

use axperf::MonitorConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "axperf")]
#[command(about = "AXI performance monitor model - replays bus traces into cycle counters")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a cycle trace and print the counters
    Replay {
        /// Trace file (`.zst` files are decompressed)
        #[arg(value_name = "TRACE")]
        trace: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Fail unless every active cycle is accounted for on both channels
        #[arg(long)]
        check: bool,

        #[command(flatten)]
        monitor: MonitorArgs,
    },
    /// Print the register map
    Regs {
        /// Register data width in bits (32 or 64)
        #[arg(long, default_value = "32")]
        data_width: u32,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Monitor parameters.
#[derive(Args, Clone, Copy)]
pub struct MonitorArgs {
    /// Read identifier width in bits (0-8)
    #[arg(long, default_value = "4")]
    pub id_width: u8,

    /// Counter width in bits (1-64); counters wrap silently
    #[arg(long, default_value = "32")]
    pub counter_width: u32,

    /// Register data width in bits (32 or 64)
    #[arg(long, default_value = "32")]
    pub data_width: u32,
}

impl MonitorArgs {
    #[must_use]
    pub const fn config(self) -> MonitorConfig {
        MonitorConfig::new()
            .with_id_width(self.id_width)
            .with_counter_width(self.counter_width)
            .with_data_width(self.data_width)
    }
}

/// Output format for reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Text,
    /// Raw key-value output (for scripting)
    Raw,
    /// JSON output
    Json,
}
