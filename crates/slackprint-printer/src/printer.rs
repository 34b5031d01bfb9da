//! ESC/POS printer reached through a character device or raw TCP (port 9100).
//!
//! The connection is opened for each print job and closed afterwards, so a
//! printer that is unplugged between messages only fails those messages.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use slackprint_config::PrinterConfig;
use slackprint_core::PrinterSink;

use crate::escpos;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterTarget {
    /// USB line printer device node, e.g. `/dev/usb/lp0`.
    Device(PathBuf),
    /// Raw socket printer as `host:port`.
    Network(String),
}

impl PrinterTarget {
    pub fn from_config(config: &PrinterConfig) -> Self {
        match config.address.as_deref().filter(|a| !a.is_empty()) {
            Some(address) => PrinterTarget::Network(address.to_string()),
            None => PrinterTarget::Device(PathBuf::from(&config.device)),
        }
    }
}

impl fmt::Display for PrinterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrinterTarget::Device(path) => write!(f, "{}", path.display()),
            PrinterTarget::Network(address) => write!(f, "tcp://{address}"),
        }
    }
}

pub struct EscPosPrinter {
    target: PrinterTarget,
    cut_after_image: bool,
}

impl EscPosPrinter {
    pub fn new(target: PrinterTarget) -> Self {
        Self {
            target,
            cut_after_image: false,
        }
    }

    pub fn from_config(config: &PrinterConfig) -> Self {
        Self {
            target: PrinterTarget::from_config(config),
            cut_after_image: config.cut_after_image,
        }
    }

    pub fn with_cut_after_image(mut self, cut: bool) -> Self {
        self.cut_after_image = cut;
        self
    }

    async fn send(&self, bytes: &[u8]) -> io::Result<()> {
        debug!("Sending {} bytes to printer {}", bytes.len(), self.target);
        match &self.target {
            PrinterTarget::Device(path) => {
                let mut device = tokio::fs::OpenOptions::new()
                    .append(true)
                    .open(path)
                    .await?;
                device.write_all(bytes).await?;
                device.flush().await
            }
            PrinterTarget::Network(address) => {
                let mut stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(address))
                    .await
                    .map_err(|_| {
                        io::Error::new(
                            io::ErrorKind::TimedOut,
                            format!("connecting to printer {address} timed out"),
                        )
                    })??;
                stream.write_all(bytes).await?;
                stream.shutdown().await
            }
        }
    }
}

#[async_trait]
impl PrinterSink for EscPosPrinter {
    async fn print_text(&self, text: &str) -> io::Result<()> {
        let mut job = escpos::init();
        job.extend(escpos::encode_text(text));
        self.send(&job).await
    }

    async fn print_image(&self, image: &DynamicImage) -> io::Result<()> {
        let mut job = escpos::init();
        job.extend(escpos::raster_image(image));
        if self.cut_after_image {
            job.extend(escpos::feed(3));
            job.extend(escpos::cut());
        }
        self.send(&job).await
    }
}
