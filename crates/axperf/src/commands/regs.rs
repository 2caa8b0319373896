//! Register map listing.

use axperf::{MonitorConfig, Register};
use tracing::error;

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, OutputFormat};
use crate::terminal::{self, Table};

/// Handle the `regs` command.
pub fn cmd_regs(data_width: u32, format: OutputFormat) -> i32 {
    let config = MonitorConfig::new().with_data_width(data_width);
    if let Err(e) = config.validate() {
        error!(error = %e, "invalid data width");
        return EXIT_FAILURE;
    }
    let bytes = config.register_bytes();

    match format {
        OutputFormat::Text => {
            terminal::header(&format!("Register map ({data_width}-bit registers)"));
            let mut table = Table::new(&["Offset", "Name", "Description"]);
            for reg in Register::ALL {
                table.add_row(vec![
                    format!("{:#06x}", reg.address(bytes)),
                    reg.name().to_string(),
                    reg.description().to_string(),
                ]);
            }
            table.print();
        }
        OutputFormat::Raw => {
            for reg in Register::ALL {
                println!("{:#x}: {}", reg.address(bytes), reg.name());
            }
        }
        OutputFormat::Json => {
            let entries: Vec<String> = Register::ALL
                .iter()
                .map(|reg| {
                    format!(
                        r#"{{"offset":{},"name":"{}"}}"#,
                        reg.address(bytes),
                        reg.name()
                    )
                })
                .collect();
            println!("[{}]", entries.join(","));
        }
    }
    EXIT_SUCCESS
}
