//! Runtime settings.
//!
//! Layered lowest to highest: built-in defaults, an optional TOML file,
//! `JSONWATCH_*` environment variables, then command-line overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::scheduler::clamp_period;

pub const DEFAULT_URL: &str = "http://numbersapi.com/random/math?json";
pub const DEFAULT_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_STORE_DIR: &str = ".jsonwatch";
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_PREFIX: &str = "JSONWATCH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Document URL polled every cycle.
    pub url: String,
    /// Polling period in milliseconds.
    pub interval_ms: u64,
    /// Directory holding the persisted records.
    pub store_dir: PathBuf,
    /// Fallback log filter when `RUST_LOG` is unset.
    pub log_level: String,
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub url: Option<String>,
    pub interval_ms: Option<u64>,
    pub store_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            interval_ms: DEFAULT_INTERVAL_MS,
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the process environment and an optional file.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        Self::load_with_env(
            config_path,
            Environment::with_prefix(ENV_PREFIX),
            overrides,
        )
    }

    fn load_with_env(
        config_path: Option<&Path>,
        env: Environment,
        overrides: &Overrides,
    ) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("url", DEFAULT_URL)?
            .set_default("interval_ms", DEFAULT_INTERVAL_MS)?
            .set_default("store_dir", DEFAULT_STORE_DIR)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?;

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        let config = builder
            .add_source(env.try_parsing(true))
            .set_override_option("url", overrides.url.clone())?
            .set_override_option("interval_ms", overrides.interval_ms)?
            .set_override_option(
                "store_dir",
                overrides
                    .store_dir
                    .as_ref()
                    .map(|dir| dir.to_string_lossy().into_owned()),
            )?
            .set_override_option("log_level", overrides.log_level.clone())?
            .build()
            .context("failed to read settings")?;

        let mut settings: Settings = config
            .try_deserialize()
            .context("invalid settings")?;
        settings.interval_ms = settings.interval().as_millis() as u64;
        Ok(settings)
    }

    /// The polling period, clamped to the scheduler minimum.
    pub fn interval(&self) -> Duration {
        clamp_period(Duration::from_millis(self.interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_with_env(None, env(&[]), &Overrides::default()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let file = toml_file("url = \"file:///tmp/doc.json\"\ninterval_ms = 2500\n");
        let settings =
            Settings::load_with_env(Some(file.path()), env(&[]), &Overrides::default()).unwrap();

        assert_eq!(settings.url, "file:///tmp/doc.json");
        assert_eq!(settings.interval_ms, 2500);
        assert_eq!(settings.store_dir, PathBuf::from(DEFAULT_STORE_DIR));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = toml_file("interval_ms = 2500\nlog_level = \"warn\"\n");
        let settings = Settings::load_with_env(
            Some(file.path()),
            env(&[("JSONWATCH_INTERVAL_MS", "700")]),
            &Overrides::default(),
        )
        .unwrap();

        assert_eq!(settings.interval_ms, 700);
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_cli_overrides_everything() {
        let overrides = Overrides {
            url: Some("http://localhost:8080/x".to_string()),
            interval_ms: Some(300),
            store_dir: Some(PathBuf::from("/tmp/jw")),
            log_level: None,
        };
        let settings = Settings::load_with_env(
            None,
            env(&[("JSONWATCH_URL", "http://ignored")]),
            &overrides,
        )
        .unwrap();

        assert_eq!(settings.url, "http://localhost:8080/x");
        assert_eq!(settings.interval_ms, 300);
        assert_eq!(settings.store_dir, PathBuf::from("/tmp/jw"));
    }

    #[test]
    fn test_interval_is_clamped() {
        let overrides = Overrides {
            interval_ms: Some(5),
            ..Default::default()
        };
        let settings = Settings::load_with_env(None, env(&[]), &overrides).unwrap();
        assert_eq!(settings.interval_ms, 100);
        assert_eq!(settings.interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = Settings::load_with_env(
            Some(Path::new("/nonexistent/jsonwatch.toml")),
            env(&[]),
            &Overrides::default(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_interval_is_an_error() {
        let file = toml_file("interval_ms = \"soon\"\n");
        let result = Settings::load_with_env(Some(file.path()), env(&[]), &Overrides::default());
        assert!(result.is_err());
    }
}
