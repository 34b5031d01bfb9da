use std::borrow::Cow;
use std::sync::Arc;

use tracing::{debug, error};

use crate::sink::PrinterSink;

/// Append a newline unless `text` already ends with one.
pub fn terminate_line(text: &str) -> Cow<'_, str> {
    if text.ends_with('\n') {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("{text}\n"))
    }
}

/// Best-effort text output: printer failures are logged, never returned.
pub struct TextWriter {
    sink: Arc<dyn PrinterSink>,
}

impl TextWriter {
    pub fn new(sink: Arc<dyn PrinterSink>) -> Self {
        Self { sink }
    }

    /// Returns whether the text reached the printer.
    pub async fn write(&self, text: &str) -> bool {
        let line = terminate_line(text);
        debug!("Printing {} bytes of text", line.len());
        match self.sink.print_text(&line).await {
            Ok(()) => true,
            Err(e) => {
                error!("Printer write failed: {e}");
                false
            }
        }
    }
}
