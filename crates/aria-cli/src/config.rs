//! Host configuration, loaded from a TOML file.
//!
//! Everything has a default, so a missing file just means "run with the
//! stock settings".  Credentials never live here; providers read those
//! from the environment (see `.env` support in `main`).

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use aria_engine::EngineConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Session key for this host.  A single-seat install keeps the default.
    pub user_id: String,
    /// Where the SQLite database lives.
    pub database_path: PathBuf,
    pub engine: EngineConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_id: "local".to_string(),
            database_path: PathBuf::from("aria.db"),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`; an absent file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let cfg = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(cfg.user_id, "local");
        assert_eq!(cfg.engine.idle_timeout_secs, 300);
    }

    #[test]
    fn partial_file_overrides_only_what_it_names() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "user_id = \"kiosk\"\n\n[engine]\nidle_timeout_secs = 60\nmessaging_channel = \"chat42\""
        )
        .unwrap();

        let cfg = AppConfig::load(f.path()).unwrap();
        assert_eq!(cfg.user_id, "kiosk");
        assert_eq!(cfg.engine.idle_timeout_secs, 60);
        assert_eq!(cfg.engine.messaging_channel.as_deref(), Some("chat42"));
        // Untouched fields keep their defaults.
        assert_eq!(cfg.engine.max_slot_retries, 3);
        assert_eq!(cfg.database_path, PathBuf::from("aria.db"));
    }

    #[test]
    fn bad_toml_is_an_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "user_id = [broken").unwrap();
        assert!(AppConfig::load(f.path()).is_err());
    }
}
