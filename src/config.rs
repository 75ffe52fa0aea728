use crate::payload::DEFAULT_DT;
use crate::scene::AssetSource;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5002";
pub const ENV_URL: &str = "DRONE_SIM_URL";
pub const ENV_MODEL: &str = "DRONE_SIM_MODEL";

// ---------------------------------------------------------------------------
// Viewer configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub base_url: String,
    pub model_asset: Option<String>,  // .obj path or URL
    pub default_dt: f64,              // s, when the service sends no time axis
    pub window_size: [f32; 2],        // px
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            model_asset: None,
            default_dt: DEFAULT_DT,
            window_size: [1280.0, 800.0],
        }
    }
}

impl ViewerConfig {
    /// Defaults overlaid with `DRONE_SIM_URL` / `DRONE_SIM_MODEL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(url) = lookup(ENV_URL).filter(|s| !s.trim().is_empty()) {
            cfg.base_url = url;
        }
        cfg.model_asset = lookup(ENV_MODEL).filter(|s| !s.trim().is_empty());
        cfg
    }

    /// Command-line values win over the environment.
    pub fn with_overrides(mut self, url: Option<String>, model: Option<String>) -> Self {
        if let Some(url) = url {
            self.base_url = url;
        }
        if model.is_some() {
            self.model_asset = model;
        }
        self
    }

    pub fn model_source(&self) -> Option<AssetSource> {
        self.model_asset.as_deref().map(AssetSource::parse)
    }
}
