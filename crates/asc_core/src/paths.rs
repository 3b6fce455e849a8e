use std::path::{Path, PathBuf};

use crate::config::Config;

/// Base directory for persisted client state (~/.asc-promo by default).
pub fn data_dir(config: &Config) -> PathBuf {
    if let Some(dir) = &config.data_dir {
        return dir.clone();
    }
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".asc-promo")
}

/// Root directory for the namespaced cookie stores.
pub fn cookie_store_root(config: &Config) -> PathBuf {
    data_dir(config).join("cookies")
}

pub fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}
