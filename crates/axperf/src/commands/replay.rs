//! Replay command.

use std::path::Path;
use std::time::Instant;

use axperf::trace::parse_trace_file;
use axperf::{MonitorConfig, RegisterRead, Replay, ReplayOutcome};
use tracing::{error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, OutputFormat};
use crate::terminal::{self, Spinner};

/// Commands between spinner updates.
const PROGRESS_INTERVAL: usize = 4096;

/// Handle the `replay` command.
pub fn cmd_replay(
    path: &Path,
    format: OutputFormat,
    check: bool,
    config: MonitorConfig,
    silent: bool,
) -> i32 {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("trace")
        .to_string();
    let spinner = if silent || format != OutputFormat::Text {
        Spinner::hidden()
    } else {
        Spinner::new(format!("Replaying {name}"))
    };
    let start = Instant::now();

    let mut replay = match Replay::new(config) {
        Ok(r) => r,
        Err(e) => {
            spinner.finish_with_failure("Invalid monitor configuration");
            error!(error = %e, "invalid configuration");
            return EXIT_FAILURE;
        }
    };
    let lines = match parse_trace_file(path) {
        Ok(lines) => lines,
        Err(e) => {
            spinner.finish_with_failure(&format!("Failed to read {name}"));
            error!(error = %e, path = %path.display(), "failed to parse trace");
            return EXIT_FAILURE;
        }
    };

    for (i, line) in lines.iter().enumerate() {
        replay.apply(line);
        if i % PROGRESS_INTERVAL == 0 {
            spinner.set_message(format!(
                "Replaying {name}: {} cycles",
                replay.monitor().cycles()
            ));
        }
    }
    let outcome = replay.finish();
    let elapsed = start.elapsed().as_secs_f64();
    axperf::metrics::record_report(&name, &outcome.report);
    axperf::metrics::record_replay_duration(&name, elapsed);

    spinner.finish_with_success(&format!(
        "Replayed {} cycles from {name} in {elapsed:.3}s",
        outcome.report.cycles
    ));
    info!(
        cycles = outcome.report.cycles,
        active_time = outcome.report.active_time,
        "replay finished"
    );

    print_outcome(format, &outcome);

    if check {
        if let Err(e) = outcome.report.check_orthogonality() {
            error!(error = %e, "counter check failed");
            return EXIT_FAILURE;
        }
        if !silent {
            terminal::success("Every active cycle is accounted for");
        }
    }
    EXIT_SUCCESS
}

fn print_outcome(format: OutputFormat, outcome: &ReplayOutcome) {
    match format {
        OutputFormat::Text => {
            outcome.report.print_text();
            if !outcome.reads.is_empty() {
                terminal::header("Register reads");
                for read in &outcome.reads {
                    println!(
                        "  line {:>5}  {:#06x} {:<24} {:#x}",
                        read.line,
                        read.addr,
                        register_name(read),
                        read.value
                    );
                }
            }
        }
        OutputFormat::Raw => {
            outcome.report.print_raw();
            for read in &outcome.reads {
                println!("read@{:#x}: {}", read.addr, read.value);
            }
        }
        OutputFormat::Json => {
            let reads: Vec<String> = outcome
                .reads
                .iter()
                .map(|read| {
                    format!(
                        r#"{{"line":{},"addr":{},"register":"{}","value":{}}}"#,
                        read.line,
                        read.addr,
                        register_name(read),
                        read.value
                    )
                })
                .collect();
            println!(
                r#"{{"report":{},"reads":[{}]}}"#,
                outcome.report.render_json(),
                reads.join(",")
            );
        }
    }
}

fn register_name(read: &RegisterRead) -> &'static str {
    read.register.map_or("unmapped", |reg| reg.name())
}
