//! Reload settings: which files to re-read and how often.

use crate::error::{ReloadError, Result};
use crate::sources::ReloadSource;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Certificate reload settings.
///
/// Keys mirror the shape operators write in settings files:
///
/// ```yaml
/// certificate:
///   files: [tls/cert.pem]
///   key_files: [tls/key.pem]
///   reload_period: 300
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CertificateSettings {
    /// Certificate files in PEM format
    pub files: Vec<PathBuf>,
    /// Private key files in PEM format, paired with `files`
    pub key_files: Vec<PathBuf>,
    /// Binary keystore holding the identity
    pub key_store_file: Option<PathBuf>,
    /// Binary truststore
    pub trust_store_file: Option<PathBuf>,
    /// Seconds between reloads, reloading is disabled when absent
    pub reload_period: Option<u64>,
}

impl CertificateSettings {
    /// The reload period, if reloading is enabled.
    pub fn reload_period(&self) -> Option<Duration> {
        self.reload_period.map(Duration::from_secs)
    }

    /// The files to re-read on every reload.
    pub fn source(&self) -> ReloadSource {
        ReloadSource {
            files: self.files.clone(),
            key_files: self.key_files.clone(),
            key_store_file: self.key_store_file.clone(),
            trust_store_file: self.trust_store_file.clone(),
        }
    }
}

/// Loads [`CertificateSettings`] from files and environment variables.
///
/// Files are merged in the order they are added, later files overriding
/// earlier ones. Environment variables override every file. Formats are
/// detected from the extension: YAML (.yaml, .yml), TOML (.toml), JSON (.json).
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_tls::settings::SettingsLoader;
///
/// # fn example() -> hotswap_tls::error::Result<()> {
/// // APP_CERTIFICATE__RELOAD_PERIOD=300 -> certificate.reload_period = 300
/// let settings = SettingsLoader::new()
///     .with_file("config/default.yaml")
///     .with_env_overrides("APP", "__")
///     .load()?;
///
/// println!("reload every {:?}", settings.reload_period());
/// # Ok(())
/// # }
/// ```
pub struct SettingsLoader {
    file_paths: Vec<PathBuf>,
    env_prefix: Option<String>,
    env_separator: Option<String>,
    section: String,
}

impl SettingsLoader {
    /// Create a loader reading the `certificate` section.
    pub fn new() -> Self {
        Self {
            file_paths: Vec::new(),
            env_prefix: None,
            env_separator: None,
            section: "certificate".to_string(),
        }
    }

    /// Add a settings file.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_paths.push(path.into());
        self
    }

    /// Add environment variable overrides.
    ///
    /// # Arguments
    ///
    /// * `prefix` - Prefix for environment variables (e.g., "APP")
    /// * `separator` - Separator for nested keys (e.g., "__")
    ///
    /// `files` and `key_files` accept comma-separated lists.
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.env_separator = Some(separator.to_string());
        self
    }

    /// Read a different top-level section, e.g. `https`.
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = section.into();
        self
    }

    /// Merge all sources and deserialize the section.
    ///
    /// A missing section yields default settings, i.e. reloading disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ReloadError::Settings`] if:
    /// - no source was added
    /// - a file is missing or cannot be parsed
    /// - the section does not deserialize
    pub fn load(&self) -> Result<CertificateSettings> {
        if self.file_paths.is_empty() && self.env_prefix.is_none() {
            return Err(ReloadError::Settings(
                "No settings sources specified".to_string(),
            ));
        }

        let mut builder = Config::builder();

        for path in &self.file_paths {
            builder = builder.add_source(File::from(path.clone()).required(true));
        }

        if let (Some(prefix), Some(separator)) = (&self.env_prefix, &self.env_separator) {
            let env_source = Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator(separator)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key(&format!("{}.files", self.section))
                .with_list_parse_key(&format!("{}.key_files", self.section));
            builder = builder.add_source(env_source);
        }

        let config = builder
            .build()
            .map_err(|e| ReloadError::Settings(format!("Failed to build settings: {}", e)))?;

        match config.get::<CertificateSettings>(&self.section) {
            Ok(settings) => Ok(settings),
            Err(config::ConfigError::NotFound(_)) => Ok(CertificateSettings::default()),
            Err(e) => Err(ReloadError::Settings(format!(
                "Failed to deserialize section '{}': {}",
                self.section, e
            ))),
        }
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}
