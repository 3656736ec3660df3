use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_theme() -> String {
    "dark".into()
}
fn default_page_size() -> usize {
    10
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// CSV path or http(s) URL loaded when no source is given on the command line.
    #[serde(default = "default_source")]
    pub default_path: String,
}

fn default_source() -> String {
    "data/Segwise_Report.csv".into()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            default_path: default_source(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub file: Option<String>, // falls back to <cache_dir>/adlens/adlens.log
}

fn default_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn log_path(&self) -> PathBuf {
        match &self.file {
            Some(f) => PathBuf::from(f),
            None => dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("adlens")
                .join("adlens.log"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("adlens")
            .join("config.toml")
    }

    pub fn load() -> crate::Result<Self> {
        let path = if let Ok(env_path) = std::env::var("ADLENS_CONFIG") {
            PathBuf::from(env_path) // $ADLENS_CONFIG overrides default config path
        } else {
            Self::config_path()
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::AdLensError::Config(e.to_string()))
    }

    pub fn save(&self) -> crate::Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::AdLensError::Config(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.display.theme, "dark");
        assert_eq!(cfg.display.page_size, 10);
        assert_eq!(cfg.source.default_path, "data/Segwise_Report.csv");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg = Config::from_toml("[display]\ntheme = \"light\"\n").unwrap();
        assert_eq!(cfg.display.theme, "light");
        assert_eq!(cfg.display.page_size, 10);
    }

    #[test]
    fn explicit_log_file_wins() {
        let cfg = Config::from_toml("[logging]\nfile = \"/tmp/x.log\"\n").unwrap();
        assert_eq!(cfg.logging.log_path(), PathBuf::from("/tmp/x.log"));
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = Config::from_toml("[display\n").unwrap_err();
        assert!(matches!(err, crate::AdLensError::Config(_)));
    }
}
