use async_trait::async_trait;
use image::DynamicImage;

/// Output device for accepted messages.
///
/// Implementations acquire the printer per call. Errors are reported back to
/// the caller, which logs them and carries on.
#[async_trait]
pub trait PrinterSink: Send + Sync {
    async fn print_text(&self, text: &str) -> std::io::Result<()>;

    /// Print a bitmap no wider than the configured maximum print width.
    async fn print_image(&self, image: &DynamicImage) -> std::io::Result<()>;
}
