//! Command implementations.

mod regs;
mod replay;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Replay { .. } => handle_replay(cli),
        Commands::Regs { data_width, format } => regs::cmd_regs(*data_width, *format),
    }
}

fn handle_replay(cli: &Cli) -> i32 {
    let Commands::Replay {
        trace,
        format,
        check,
        monitor,
    } = &cli.command
    else {
        unreachable!("replay command variant mismatch");
    };

    replay::cmd_replay(trace, *format, *check, monitor.config(), cli.silent)
}
