use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub slack: SlackConfig,
    pub watch: WatchConfig,
    pub printer: PrinterConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SlackConfig {
    /// Bot token (xoxb-*) used for Web API calls and private file downloads.
    pub bot_token: String,
    /// App-level token (xapp-*) used to open the Socket Mode connection.
    pub app_token: String,
    /// File holding the bot token. Only read when `bot_token` is empty.
    pub token_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct WatchConfig {
    /// Channel names (or raw channel ids) whose messages get printed.
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrinterConfig {
    /// Character device of a USB line printer (e.g. "/dev/usb/lp0").
    pub device: String,
    /// Network printer as "host:port". Takes precedence over `device`.
    pub address: Option<String>,
    /// Widest bitmap the print head accepts, in dots.
    pub max_image_width: u32,
    /// Feed and cut the paper after every image.
    pub cut_after_image: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            device: "/dev/usb/lp0".into(),
            address: None,
            // Smaller than 640, larger than 277.
            max_image_width: 512,
            cut_after_image: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub sleep_secs: u64,
    /// Slack error codes that are final answers rather than transient failures.
    pub expected_errors: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            sleep_secs: 5,
            expected_errors: vec!["method_not_supported_for_channel_type".into()],
        }
    }
}
