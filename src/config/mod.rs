use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Control channel served by the local dev server
pub const DEFAULT_SERVER_URL: &str = "ws://localhost:8080";

/// Static fragment served over the dev server's HTTP side
pub const DEFAULT_FRAGMENT_URL: &str = "http://localhost:8080/page2.html";

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_fragment_url() -> String {
    DEFAULT_FRAGMENT_URL.to_string()
}

fn default_true() -> bool {
    true
}

/// Bounds for the slider control
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliderConfig {
    #[serde(default)]
    pub min: f64,
    #[serde(default = "default_slider_max")]
    pub max: f64,
    #[serde(default = "default_slider_step")]
    pub step: f64,
    #[serde(default = "default_slider_initial")]
    pub initial: f64,
}

fn default_slider_max() -> f64 {
    100.0
}

fn default_slider_step() -> f64 {
    1.0
}

fn default_slider_initial() -> f64 {
    50.0
}

impl Default for SliderConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: default_slider_max(),
            step: default_slider_step(),
            initial: default_slider_initial(),
        }
    }
}

impl SliderConfig {
    /// Usable bounds: a config with min >= max or a non-positive step is
    /// replaced by the defaults rather than failing startup
    pub fn validated(&self) -> SliderConfig {
        if self.min >= self.max || self.step <= 0.0 || !self.step.is_finite() {
            tracing::warn!(
                "invalid slider bounds (min={}, max={}, step={}), using defaults",
                self.min,
                self.max,
                self.step
            );
            return SliderConfig::default();
        }
        self.clone()
    }
}

/// Optional hex overrides for the theme's semantic colors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColorOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// WebSocket URL of the control server
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// HTTP URL of the static fragment shown by the fragment viewer
    #[serde(default = "default_fragment_url")]
    pub fragment_url: String,

    /// Connect as soon as the TUI starts; false defers to an explicit 'c'
    #[serde(default = "default_true")]
    pub connect_on_start: bool,

    /// Slider bounds
    #[serde(default)]
    pub slider: SliderConfig,

    /// Theme color overrides
    #[serde(default)]
    pub colors: ColorOverrides,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            fragment_url: default_fragment_url(),
            connect_on_start: true,
            slider: SliderConfig::default(),
            colors: ColorOverrides::default(),
        }
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("fader");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the default location, or create it with defaults
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(p) => p,
            Err(_) => return Ok(AppConfig::default()),
        };
        Ok(Self::load_from(&path))
    }

    fn load_from(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!("Failed to parse config: {}", e),
                },
                Err(e) => tracing::warn!("Failed to read config: {}", e),
            }
        }

        let config = AppConfig::default();
        let _ = config.save_to(path);
        config
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
