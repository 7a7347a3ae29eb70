use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
};
use serde::Serialize;

use super::FilterConfig;

// Embed the default config at compile time
pub const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const ENV_PREFIX: &str = "ICPSR_FILTER_";

/// Layered configuration: embedded defaults, user file, repository file (or a
/// single custom file), environment, then CLI overrides.
pub struct AppConfig {
    figment: Figment,
}

impl AppConfig {
    pub fn load<T: Serialize>(custom_config: Option<&str>, cli_overrides: Option<&T>) -> Result<Self> {
        tracing::trace!("CONFIG LOAD: embedded defaults");
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(custom_path) = custom_config {
            tracing::trace!("CONFIG LOAD: custom file {}", custom_path);
            if !std::path::Path::new(custom_path).is_file() {
                anyhow::bail!("Config file not found: {custom_path}");
            }
            figment = match std::path::Path::new(custom_path)
                .extension()
                .and_then(|ext| ext.to_str())
            {
                Some("json") => figment.merge(Json::file(custom_path)),
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(custom_path)),
                _ => figment.merge(Toml::file(custom_path)),
            };
        } else {
            let user_config = Self::user_config_path();
            figment = figment
                .merge(Toml::file(&user_config))
                .merge(Json::file(user_config.replace(".toml", ".json")))
                .merge(Yaml::file(user_config.replace(".toml", ".yaml")))
                .merge(Toml::file("icpsr-filter.toml"))
                .merge(Json::file("icpsr-filter.json"))
                .merge(Yaml::file("icpsr-filter.yaml"));
        }

        // Environment variables override files, e.g. ICPSR_FILTER_FIELD__POSITION=100
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        if let Some(overrides) = cli_overrides {
            tracing::trace!("CONFIG LOAD: applying CLI overrides");
            figment = figment.merge(Serialized::defaults(overrides));
        }

        Ok(AppConfig { figment })
    }

    /// Typed, validated filter settings
    pub fn filter_config(&self) -> Result<FilterConfig> {
        let config: FilterConfig = self
            .figment
            .extract()
            .context("Failed to parse filter configuration")?;
        config.validate()?;
        tracing::trace!("CONFIG LOAD: resolved {:?}", config);
        Ok(config)
    }

    /// Get a nested object/section as JSON
    pub fn get_section(&self, path: &str) -> Result<serde_json::Value> {
        Ok(self.figment.extract_inner(path)?)
    }

    /// Get the full merged configuration as a structured value
    pub fn get_full_config(&self) -> Result<serde_json::Value> {
        Ok(self.figment.extract()?)
    }

    fn user_config_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/icpsr-filter/config.toml"),
            Err(_) => "~/.config/icpsr-filter/config.toml".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessingMode;
    use crate::filter::{FieldSpec, UnreadablePolicy};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_embedded_defaults_match_default_impl() {
        let from_toml: FilterConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(from_toml, FilterConfig::default());
    }

    #[test]
    fn test_custom_toml_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        fs::write(&path, "[field]\nposition = 10\n\n[input]\nunreadable = \"empty\"\n").unwrap();

        let config = AppConfig::load(path.to_str(), None::<&()>).unwrap();
        let filter = config.filter_config().unwrap();

        assert_eq!(filter.field, FieldSpec::new(10, 2));
        assert_eq!(filter.input.unreadable, UnreadablePolicy::Empty);
        assert_eq!(filter.parallel.mode, ProcessingMode::Auto);
    }

    #[test]
    fn test_custom_json_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.json");
        fs::write(&path, r#"{"parallel": {"mode": "sequential"}}"#).unwrap();

        let filter = AppConfig::load(path.to_str(), None::<&()>)
            .unwrap()
            .filter_config()
            .unwrap();
        assert_eq!(filter.parallel.mode, ProcessingMode::Sequential);
    }

    #[test]
    fn test_missing_custom_file_is_an_error() {
        let result = AppConfig::load(Some("definitely/not/here.toml"), None::<&()>);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_win() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        fs::write(&path, "[field]\nlength = 3\n").unwrap();

        let overrides = serde_json::json!({ "field": { "length": 2, "position": 7 } });
        let filter = AppConfig::load(path.to_str(), Some(&overrides))
            .unwrap()
            .filter_config()
            .unwrap();
        assert_eq!(filter.field, FieldSpec::new(7, 2));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        fs::write(&path, "[field]\nlength = 0\n").unwrap();

        let config = AppConfig::load(path.to_str(), None::<&()>).unwrap();
        assert!(config.filter_config().is_err());
    }

    #[test]
    fn test_section_access() {
        let config = AppConfig::load(None, None::<&()>).unwrap();
        assert!(config.get_section("parallel").unwrap().is_object());
        assert!(config.get_full_config().unwrap().get("field").is_some());
    }
}
