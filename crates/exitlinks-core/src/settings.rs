//! Site settings.
//!
//! Loaded from `config.toml` in the platform config directory (or a path
//! given on the command line). Missing keys fall back to defaults, so a file
//! only needs the values it changes.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::classifier::ClassifierOptions;
use crate::error::LinkError;
use crate::origin::SiteOrigin;
use crate::rewriter::RewriteMode;

/// Longest countdown the warning page will run, in seconds.
pub const MAX_REDIRECT_DELAY: u32 = 10;

/// Site URL used until one is configured.
pub const DEFAULT_SITE_URL: &str = "http://127.0.0.1:48780";

/// Attribute the client interceptor sets on anchors it has bound.
pub const PROCESSED_ATTRIBUTE: &str = "data-exit-links-processed";

/// Settings errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Reading or writing the settings file failed.
    #[error("settings IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file is not valid TOML for [`Settings`].
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings could not be serialized.
    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// No home directory to place the settings file in.
    #[error("could not determine a config directory")]
    NoConfigDir,

    /// A value is present but unusable.
    #[error(transparent)]
    Invalid(#[from] LinkError),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

/// Site-wide settings for link rewriting and the warning page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the site, e.g. `https://mysite.com`.
    pub site_url: String,
    /// Site name shown on the warning page.
    pub site_name: String,
    /// Whether links are rewritten and intercepted at all.
    pub enable_redirects: bool,
    /// Countdown before the warning page continues on its own (0 = never).
    pub redirect_delay: u32,
    /// How anchors are located in content.
    pub rewrite_mode: RewriteMode,
    /// Classify `//host` hrefs by host instead of treating them as relative.
    pub protocol_relative_external: bool,
    /// Containers the client interceptor scans.
    pub content_selectors: Vec<String>,
    /// Scanned when no content container is present on the page.
    pub fallback_selectors: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            site_url: DEFAULT_SITE_URL.to_string(),
            site_name: "My Site".to_string(),
            enable_redirects: true,
            redirect_delay: 0,
            rewrite_mode: RewriteMode::default(),
            protocol_relative_external: false,
            content_selectors: vec![".exit-links-content".to_string()],
            fallback_selectors: vec![
                "main".to_string(),
                ".content".to_string(),
                ".entry-content".to_string(),
                ".post-content".to_string(),
                "#content".to_string(),
            ],
        }
    }
}

impl Settings {
    /// Parses settings from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Serializes settings to TOML text.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Sets the site URL.
    pub fn with_site_url(mut self, site_url: impl Into<String>) -> Self {
        self.site_url = site_url.into();
        self
    }

    /// Returns the countdown in seconds, clamped to [`MAX_REDIRECT_DELAY`].
    pub fn effective_delay(&self) -> u32 {
        self.redirect_delay.min(MAX_REDIRECT_DELAY)
    }

    /// Derives the site origin from `site_url`.
    pub fn origin(&self) -> std::result::Result<SiteOrigin, LinkError> {
        SiteOrigin::parse(&self.site_url)
    }

    /// Returns the classifier options these settings select.
    pub fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            protocol_relative_external: self.protocol_relative_external,
        }
    }

    /// Checks that the settings can be used to serve requests.
    pub fn validate(&self) -> Result<()> {
        self.origin()?;
        Ok(())
    }
}

/// Returns the default settings file path.
pub fn default_config_path() -> Result<PathBuf> {
    ProjectDirs::from("", "exitlinks", "exitlinks")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .ok_or(SettingsError::NoConfigDir)
}

/// Loads settings from `path`.
pub fn load(path: &Path) -> Result<Settings> {
    let text = fs::read_to_string(path)?;
    Settings::from_toml_str(&text)
}

/// Loads settings from `path`, writing a default file first if none exists.
pub fn load_or_init(path: &Path) -> Result<Settings> {
    if !path.exists() {
        let settings = Settings::default();
        write(path, &settings)?;
        info!("Created default settings at {}", path.display());
        return Ok(settings);
    }

    load(path)
}

/// Writes settings to `path`, creating parent directories.
pub fn write(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, settings.to_toml_string()?)?;
    Ok(())
}
