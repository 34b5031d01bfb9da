use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::Config;

/// Expand a leading `~` to the home directory.
pub fn resolve_path(path: &str) -> PathBuf {
    if path.starts_with("~/") || path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home.join(path.strip_prefix("~/").unwrap_or(""));
        }
    }
    PathBuf::from(path)
}

/// Find the config file by searching standard locations.
pub fn find_config_path() -> PathBuf {
    // 1. Current directory
    let local = Path::new("config.json");
    if local.exists() {
        return local.to_path_buf();
    }

    // 2. ~/.slackprint/config.json
    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".slackprint").join("config.json");
        if home_config.exists() {
            return home_config;
        }
    }

    dirs::home_dir()
        .map(|h| h.join(".slackprint").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

/// Load configuration from a JSON file, falling back to defaults when it is missing.
///
/// When `slack.botToken` is empty and `slack.tokenFile` is set, the bot token
/// is read from that file.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config '{}'", path.display()))?;
        serde_json::from_str::<Config>(&contents)
            .with_context(|| format!("failed to parse config '{}'", path.display()))?
    } else {
        Config::default()
    };

    if config.slack.bot_token.is_empty() {
        if let Some(ref token_file) = config.slack.token_file {
            let token_path = resolve_path(token_file);
            let token = std::fs::read_to_string(&token_path).with_context(|| {
                format!("failed to read token file '{}'", token_path.display())
            })?;
            config.slack.bot_token = token.trim().to_string();
        }
    }

    Ok(config)
}

/// Save configuration to a JSON file.
pub fn save_config(path: &Path, config: &Config) -> Result<()> {
    let contents = serde_json::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| {
            format!(
                "failed to create config directory '{}'",
                parent.to_string_lossy()
            )
        })?;
    }
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write config '{}'", path.display()))?;
    Ok(())
}
