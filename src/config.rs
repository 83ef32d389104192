use crate::docs::SCROLL_TOP_THRESHOLD;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BOUNDARIES: &str =
    "https://raw.githubusercontent.com/rowanhogan/australian-states/master/states.geojson";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub chart: ChartConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub docs: DocsConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub data_csv: PathBuf,
    /// Either an http(s) URL or a local GeoJSON path.
    pub boundaries: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_csv: PathBuf::from("data/visualisation3.csv"),
            boundaries: DEFAULT_BOUNDARIES.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartConfig {
    /// Container size in pixels; unset falls back to 960x500.
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub margin: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            margin: 5.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            static_dir: PathBuf::from("static"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DocsConfig {
    pub panels: Vec<String>,
    pub scroll_threshold: f64,
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            panels: ["overview", "usage", "data", "credits"]
                .into_iter()
                .map(String::from)
                .collect(),
            scroll_threshold: SCROLL_TOP_THRESHOLD,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        Ok(config)
    }
}
