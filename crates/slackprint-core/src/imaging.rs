//! Fetch, decode and rescale attached images for the printer.

use std::sync::Arc;

use image::imageops::FilterType;
use image::DynamicImage;
use tracing::{debug, error, info, warn};

use crate::api::SlackApi;
use crate::error::{Result, WatchError};
use crate::event::FileRef;
use crate::sink::PrinterSink;

/// Shrink `image` to `max_width` if it is wider.
///
/// The target height is the source height scaled by `max_width / width`,
/// rounded. The image is resized to fill that box and cropped, so nothing is
/// stretched. Narrower images are returned untouched.
pub fn fit_to_width(image: DynamicImage, max_width: u32) -> DynamicImage {
    if max_width == 0 || image.width() <= max_width {
        return image;
    }

    let scale = f64::from(max_width) / f64::from(image.width());
    let new_height = ((f64::from(image.height()) * scale).round() as u32).max(1);
    debug!(
        "Scaling image {}x{} -> {max_width}x{new_height}",
        image.width(),
        image.height()
    );
    image.resize_to_fill(max_width, new_height, FilterType::Lanczos3)
}

pub struct ImagePipeline {
    client: Arc<dyn SlackApi>,
    sink: Arc<dyn PrinterSink>,
    max_width: u32,
}

impl ImagePipeline {
    pub fn new(client: Arc<dyn SlackApi>, sink: Arc<dyn PrinterSink>, max_width: u32) -> Self {
        Self {
            client,
            sink,
            max_width,
        }
    }

    /// Print the file if it is an image. Every failure is logged and the file
    /// dropped; returns `true` only when the image reached the printer.
    pub async fn handle_image(&self, file: &FileRef) -> bool {
        let Some(url) = file.image_url() else {
            return false;
        };

        let image = match self.load(url).await {
            Ok(image) => image,
            Err(e) => {
                warn!("Skipping image {url}: {e}");
                return false;
            }
        };

        info!("Printing image {}x{} from {url}", image.width(), image.height());
        match self.sink.print_image(&image).await {
            Ok(()) => true,
            Err(e) => {
                error!("Printer image write failed: {e}");
                false
            }
        }
    }

    async fn load(&self, url: &str) -> Result<DynamicImage> {
        let bytes = self
            .client
            .fetch_file(url)
            .await
            .map_err(|e| WatchError::Fetch {
                url: url.to_string(),
                message: format!("{e:#}"),
            })?;
        let image = image::load_from_memory(&bytes)?;
        Ok(fit_to_width(image, self.max_width))
    }
}
