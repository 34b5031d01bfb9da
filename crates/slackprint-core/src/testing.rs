//! Mock collaborators shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use serde_json::{json, Value};

use crate::api::{ApiResponse, Params, SlackApi};
use crate::executor::RetryPolicy;
use crate::resolver::CHANNEL_INFO_ENDPOINT;
use crate::sink::PrinterSink;

pub(crate) fn quick_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        sleep: Duration::ZERO,
        ..RetryPolicy::default()
    }
}

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::new_rgb8(width, height)
        .write_to(&mut cursor, ImageFormat::Png)
        .unwrap();
    cursor.into_inner()
}

/// Slack API double.
///
/// Scripted responses are consumed first, in order. After that,
/// `conversations.info` answers from the registered channels (or
/// `channel_not_found`) and every other method answers `{"ok": true}`.
#[derive(Default)]
pub(crate) struct MockApi {
    scripted: Mutex<VecDeque<std::result::Result<Value, String>>>,
    channels: HashMap<String, String>,
    files: HashMap<String, Vec<u8>>,
    calls: Mutex<Vec<(String, Params)>>,
    fetches: Mutex<Vec<String>>,
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_channel(mut self, id: &str, name: &str) -> Self {
        self.channels.insert(id.to_string(), name.to_string());
        self
    }

    pub(crate) fn with_response(self, body: Value) -> Self {
        self.scripted.lock().unwrap().push_back(Ok(body));
        self
    }

    pub(crate) fn with_transport_failure(self, message: &str) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub(crate) fn with_file(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.files.insert(url.to_string(), bytes);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(String, Params)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl SlackApi for MockApi {
    async fn call(&self, endpoint: &str, params: &Params) -> Result<ApiResponse> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), params.clone()));

        if let Some(next) = self.scripted.lock().unwrap().pop_front() {
            return next.map(ApiResponse::new).map_err(anyhow::Error::msg);
        }

        if endpoint != CHANNEL_INFO_ENDPOINT {
            return Ok(ApiResponse::new(json!({"ok": true})));
        }
        let id = params.get("channel").and_then(Value::as_str).unwrap_or("");
        let body = match self.channels.get(id) {
            Some(name) => json!({"ok": true, "channel": {"id": id, "name": name}}),
            None => json!({"ok": false, "error": "channel_not_found"}),
        };
        Ok(ApiResponse::new(body))
    }

    async fn fetch_file(&self, url: &str) -> Result<Vec<u8>> {
        self.fetches.lock().unwrap().push(url.to_string());
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("404 Not Found"))
    }
}

/// Printer double that records what it was asked to print.
#[derive(Default)]
pub(crate) struct RecordingSink {
    texts: Mutex<Vec<String>>,
    images: Mutex<Vec<(u32, u32)>>,
    text_failures: AtomicUsize,
    fail_images: AtomicBool,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` text writes.
    pub(crate) fn failing_text(self, count: usize) -> Self {
        self.text_failures.store(count, Ordering::SeqCst);
        self
    }

    pub(crate) fn failing_images(self) -> Self {
        self.fail_images.store(true, Ordering::SeqCst);
        self
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    pub(crate) fn images(&self) -> Vec<(u32, u32)> {
        self.images.lock().unwrap().clone()
    }
}

#[async_trait]
impl PrinterSink for RecordingSink {
    async fn print_text(&self, text: &str) -> std::io::Result<()> {
        let remaining = self.text_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.text_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "printer unplugged",
            ));
        }
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn print_image(&self, image: &DynamicImage) -> std::io::Result<()> {
        if self.fail_images.load(Ordering::SeqCst) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "paper jam",
            ));
        }
        self.images
            .lock()
            .unwrap()
            .push((image.width(), image.height()));
        Ok(())
    }
}
