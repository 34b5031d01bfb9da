use async_trait::async_trait;
use image::DynamicImage;
use tracing::info;

use slackprint_core::PrinterSink;

/// Logs what would have been printed.
pub struct DryRunPrinter;

#[async_trait]
impl PrinterSink for DryRunPrinter {
    async fn print_text(&self, text: &str) -> std::io::Result<()> {
        info!("[dry-run] text: {:?}", text);
        Ok(())
    }

    async fn print_image(&self, image: &DynamicImage) -> std::io::Result<()> {
        info!("[dry-run] image: {}x{}", image.width(), image.height());
        Ok(())
    }
}
