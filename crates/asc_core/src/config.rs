use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const CONFIG_FILE_PATH: &str = "config.toml";

pub const DEFAULT_CONSOLE_HOST: &str = "https://appstoreconnect.apple.com";
pub const DEFAULT_AUTH_HOST: &str = "https://idmsa.apple.com";
pub const DEFAULT_USER_AGENT: &str = "asc-promo-client/0.1";

/// How long a code-creation POST may take before timing out. Bulk code
/// creation is slow to acknowledge on the remote side.
pub const CREATION_TIMEOUT_SECS: u64 = 180;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the console host (session, apps, promo codes).
    pub console_host: String,
    /// Base URL of the authentication host (signin, 2FA).
    pub auth_host: String,
    pub user_agent: String,
    /// Overrides the default cookie/session storage directory.
    pub data_dir: Option<PathBuf>,
    /// Upper bound on history polls per code-creation call.
    /// `None` polls until the codes show up.
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: Option<u32>,
    #[serde(default = "default_creation_timeout")]
    pub creation_timeout_secs: u64,
    /// Seconds to wait after a creation request before the first
    /// history poll; the service needs time to persist new codes.
    #[serde(default = "default_settle_delay")]
    pub code_settle_delay_secs: u64,
    /// Floor between consecutive history polls.
    #[serde(default = "default_poll_interval")]
    pub poll_min_interval_secs: u64,
}

fn default_settle_delay() -> u64 {
    5
}

fn default_poll_interval() -> u64 {
    10
}

fn default_poll_max_attempts() -> Option<u32> {
    Some(60)
}

fn default_creation_timeout() -> u64 {
    CREATION_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            console_host: DEFAULT_CONSOLE_HOST.to_string(),
            auth_host: DEFAULT_AUTH_HOST.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            data_dir: None,
            poll_max_attempts: default_poll_max_attempts(),
            creation_timeout_secs: CREATION_TIMEOUT_SECS,
            code_settle_delay_secs: default_settle_delay(),
            poll_min_interval_secs: default_poll_interval(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        let mut config = Config::default();

        //detect the config file exists
        if std::path::Path::new(CONFIG_FILE_PATH).exists() {
            if let Ok(content) = std::fs::read_to_string(CONFIG_FILE_PATH) {
                if let Ok(file_config) = toml::from_str::<Config>(&content) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables if they exist
        if let Ok(host) = std::env::var("ASC_CONSOLE_HOST") {
            config.console_host = host;
        }
        if let Ok(host) = std::env::var("ASC_AUTH_HOST") {
            config.auth_host = host;
        }
        if let Ok(dir) = std::env::var("ASC_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Ok(attempts) = std::env::var("ASC_POLL_MAX_ATTEMPTS") {
            config.poll_max_attempts = parse_attempts(&attempts);
        }
        config
    }
}

/// "0" and "unbounded" disable the ceiling; anything non-numeric is ignored.
fn parse_attempts(value: &str) -> Option<u32> {
    let trimmed = value.trim();
    if trimmed == "0" || trimmed.eq_ignore_ascii_case("unbounded") {
        return None;
    }
    trimmed.parse::<u32>().ok().or(default_poll_max_attempts())
}
