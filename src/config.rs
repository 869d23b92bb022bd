use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::loader::LoadOptions;
use crate::data::model::Category;

pub const CONFIG_ENV: &str = "RUSTY_GASTOS_CONFIG";
pub const DATA_FILE_ENV: &str = "RUSTY_GASTOS_FILE";
pub const DEFAULT_CONFIG_FILE: &str = "rusty-gastos.json";
pub const DEFAULT_DATA_FILE: &str = "Gasto x Equipo 2020 a 2023 (PYTHON).xlsx";

pub const TOP_N_RANGE: std::ops::RangeInclusive<usize> = 1..=50;

/// An image shown in the dashboard header.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeaderImage {
    pub path: PathBuf,
    #[serde(default)]
    pub caption: String,
}

/// Dashboard settings.
///
/// Precedence, lowest first: defaults, JSON config file, `RUSTY_GASTOS_FILE`,
/// first command-line argument.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub data_file: PathBuf,
    pub sheet: Option<String>,
    pub top_n: usize,
    pub default_categories: Vec<Category>,
    pub header_images: Vec<HeaderImage>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            sheet: None,
            top_n: 10,
            default_categories: vec![Category::Falla, Category::Preventivo],
            header_images: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Resolve the configuration from the process environment and arguments.
    pub fn load() -> Result<Self> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::resolve(
            std::env::var_os(CONFIG_ENV).map(PathBuf::from),
            std::env::var_os(DATA_FILE_ENV).map(PathBuf::from),
            args.first().map(PathBuf::from),
        )
    }

    fn resolve(
        config_file: Option<PathBuf>,
        data_file_env: Option<PathBuf>,
        data_file_arg: Option<PathBuf>,
    ) -> Result<Self> {
        let mut config = match config_file {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?,
            None => Self::default(),
        };

        if let Some(path) = data_file_env {
            config.data_file = path;
        }
        if let Some(path) = data_file_arg {
            config.data_file = path;
        }
        config.top_n = config.top_n.clamp(*TOP_N_RANGE.start(), *TOP_N_RANGE.end());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        log::info!("Using configuration from {}", path.display());
        Ok(config)
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            sheet: self.sheet.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_the_shipped_workbook() {
        let config = AppConfig::default();
        assert_eq!(config.data_file, PathBuf::from(DEFAULT_DATA_FILE));
        assert_eq!(config.top_n, 10);
        assert_eq!(config.default_categories, vec![Category::Falla, Category::Preventivo]);
        assert!(config.header_images.is_empty());
    }

    #[test]
    fn file_values_and_overrides() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("cfg.json");
        std::fs::write(
            &path,
            r#"{
                "data_file": "otro.xlsx",
                "sheet": "2023",
                "top_n": 500,
                "default_categories": ["CBM", "Reactivas"],
                "header_images": [{"path": "logo.png", "caption": "ESPE"}]
            }"#,
        )
        .expect("write config");

        let config = AppConfig::resolve(Some(path.clone()), None, None).expect("config");
        assert_eq!(config.data_file, PathBuf::from("otro.xlsx"));
        assert_eq!(config.load_options().sheet.as_deref(), Some("2023"));
        assert_eq!(config.top_n, 50);
        assert_eq!(config.default_categories, vec![Category::Cbm, Category::Reactivas]);
        assert_eq!(config.header_images[0].caption, "ESPE");

        let config = AppConfig::resolve(
            Some(path.clone()),
            Some(PathBuf::from("env.xlsx")),
            None,
        )
        .expect("config");
        assert_eq!(config.data_file, PathBuf::from("env.xlsx"));

        let config = AppConfig::resolve(
            Some(path),
            Some(PathBuf::from("env.xlsx")),
            Some(PathBuf::from("arg.csv")),
        )
        .expect("config");
        assert_eq!(config.data_file, PathBuf::from("arg.csv"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"top_n": 0}"#).expect("write config");
        let config = AppConfig::resolve(Some(path), None, None).expect("config");
        assert_eq!(config.top_n, 1);
        assert_eq!(config.data_file, PathBuf::from(DEFAULT_DATA_FILE));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"top_n": "diez"}"#).expect("write config");
        assert!(AppConfig::resolve(Some(path.clone()), None, None).is_err());

        std::fs::write(&path, r#"{"categorias": []}"#).expect("write config");
        assert!(AppConfig::resolve(Some(path), None, None).is_err());

        let missing = dir.path().join("missing.json");
        assert!(AppConfig::resolve(Some(missing), None, None).is_err());
    }
}
