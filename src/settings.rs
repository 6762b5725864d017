use crate::catalog::Location;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub globe: GlobeSettings,
    #[serde(default)]
    pub locations: Vec<Location>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GlobeSettings {
    pub texture: Option<String>,     // Path or URL of the luminance (specular) map
    pub point_count: Option<usize>,
    pub radius: Option<f64>,
    pub arc_rate: Option<f64>,       // Marker progress per second
}

impl Settings {
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "invalid settings, using defaults");
                Self::default()
            }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not read settings");
                Self::default()
            }
        }
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("globefield")
            .join("config.toml")
    }
}
