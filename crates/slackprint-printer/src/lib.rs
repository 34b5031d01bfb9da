//! Printer sinks: ESC/POS line printers and a logging dry-run sink.

pub mod dry_run;
pub mod escpos;
pub mod printer;

use std::sync::Arc;

use slackprint_config::PrinterConfig;
use slackprint_core::PrinterSink;

pub use dry_run::DryRunPrinter;
pub use printer::{EscPosPrinter, PrinterTarget};

/// Build the sink described by `config`, or a dry-run sink that only logs.
pub fn build_sink(config: &PrinterConfig, dry_run: bool) -> Arc<dyn PrinterSink> {
    if dry_run {
        Arc::new(DryRunPrinter)
    } else {
        Arc::new(EscPosPrinter::from_config(config))
    }
}
