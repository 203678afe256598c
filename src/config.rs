use crate::error::{Result, TreeMatchError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Initial zoom level of generated maps.
    pub zoom_start: u32,
    /// Geographic length of the detection-direction line on maps (~10 m).
    pub direction_line_length: f64,
    /// Maximum number of cases rendered into one review report.
    pub max_cases: usize,
    /// Seed for reproducible review-subset sampling.
    pub sample_seed: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| TreeMatchError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("tree-match").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            zoom_start: 15,
            direction_line_length: 0.0001,  // roughly 10 meters
            max_cases: 200,
            sample_seed: 42,
        }
    }

    pub fn set_zoom_start(&mut self, zoom: u32) -> Result<()> {
        self.zoom_start = zoom;
        self.save()
    }

    pub fn set_max_cases(&mut self, max_cases: usize) -> Result<()> {
        self.max_cases = max_cases;
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.zoom_start, 15);
        assert_eq!(config.max_cases, 200);
        assert_eq!(config.sample_seed, 42);
        assert!(config.direction_line_length > 0.0);
    }

    #[test]
    fn test_config_roundtrip_json() {
        let config = Config::default_config();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.zoom_start, config.zoom_start);
        assert_eq!(parsed.max_cases, config.max_cases);
    }
}
