//! Incoming message events, decoded from the raw Slack payload.

use serde_json::Value;

/// A message event as far as the watcher cares about it.
///
/// Every field is optional because Slack payloads vary by subtype. A
/// `channel` that is missing or not a string in the raw payload is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingEvent {
    pub channel: Option<String>,
    pub text: Option<String>,
    pub files: Vec<FileRef>,
}

/// A file attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRef {
    pub url: Option<String>,
    pub mimetype: Option<String>,
}

impl IncomingEvent {
    /// Decode from a raw event payload.
    pub fn from_value(value: &Value) -> Self {
        let files = value
            .get("files")
            .and_then(Value::as_array)
            .map(|files| files.iter().map(FileRef::from_value).collect())
            .unwrap_or_default();

        Self {
            channel: string_field(value, "channel"),
            text: string_field(value, "text"),
            files,
        }
    }

    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_file(mut self, file: FileRef) -> Self {
        self.files.push(file);
        self
    }
}

impl FileRef {
    /// Decode a Slack file object. The download URL is `url_private`.
    pub fn from_value(value: &Value) -> Self {
        Self {
            url: string_field(value, "url_private"),
            mimetype: string_field(value, "mimetype"),
        }
    }

    pub fn new(url: impl Into<String>, mimetype: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            mimetype: Some(mimetype.into()),
        }
    }

    /// URL of the file if it is an image we can print.
    pub fn image_url(&self) -> Option<&str> {
        let url = self.url.as_deref().filter(|u| !u.is_empty())?;
        let mimetype = self.mimetype.as_deref()?;
        mimetype.starts_with("image/").then_some(url)
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}
