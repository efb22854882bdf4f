use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Context, Result, bail};

/// The static server always listens here; it is not part of the config file.
pub const PORT: u16 = 3000;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub input: InputConfig,
    pub server: ServerConfig,
    pub view: ViewConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct InputConfig {
    pub boundaries: PathBuf,     // TopoJSON or GeoJSON
    pub boundary_object: String, // object name inside a TopoJSON topology
    pub code_property: String,
    pub name_property: String,
    pub rates_csv: PathBuf,
    pub financial_csv: PathBuf,
    pub headcount_csv: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            boundaries: PathBuf::from("public/resources/uk.json"),
            boundary_object: "lad".to_string(),
            code_property: "LAD13CD".to_string(),
            name_property: "LAD13NM".to_string(),
            rates_csv: PathBuf::from("public/resources/unemp.csv"),
            financial_csv: PathBuf::from("public/resources/financial.csv"),
            headcount_csv: PathBuf::from("public/resources/number-unemp.csv"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub public_dir: PathBuf,
    pub index: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            public_dir: PathBuf::from("public"),
            index: "index.html".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ViewConfig {
    pub width: f64,
    pub height: f64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { width: 740.0, height: 700.0 }
    }
}

impl ViewConfig {
    /// Zoom fitting divides by both sides, so they must be positive and finite.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if !value.is_finite() || value <= 0.0 {
                bail!("view.{} must be a positive number, got {}", name, value);
            }
        }
        Ok(())
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        config.view.validate()?;
        Ok(config)
    }

    /// Read `path` when it exists, otherwise fall back to the built-in layout.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }
}
