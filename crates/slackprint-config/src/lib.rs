pub mod loader;
pub mod schema;

pub use loader::{find_config_path, load_config, resolve_path, save_config};
pub use schema::{Config, PrinterConfig, RetryConfig, SlackConfig, WatchConfig};
