//! Configuration command implementation

use anyhow::{Context, Result};

use crate::cli::{ConfigCommands, Output};
use crate::config::AppConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

pub async fn execute(cmd: ConfigCommands, config_path: Option<&str>, output: &Output) -> Result<()> {
    let config = AppConfig::load(config_path, None::<&()>)?;

    match cmd {
        ConfigCommands::Show { section, format } => {
            let merged = match section.as_deref() {
                Some(path) => config
                    .get_section(path)
                    .with_context(|| format!("No configuration section '{path}'"))?,
                None => config.get_full_config()?,
            };
            let rendered = match format {
                ConfigFormat::Json => serde_json::to_string_pretty(&merged)?,
                // TOML has no bare scalar documents
                ConfigFormat::Toml if !merged.is_object() => merged.to_string(),
                ConfigFormat::Toml => {
                    toml::to_string_pretty(&merged).context("Failed to render config as TOML")?
                }
            };
            println!("{rendered}");
            Ok(())
        }
        ConfigCommands::Validate => {
            let filter = config.filter_config()?;
            output.success("Configuration is valid");
            output.key_value("Field:", &format!(
                "byte {} ({} wide)",
                filter.field.position, filter.field.length
            ), false);
            output.key_value("Unreadable:", &format!("{:?}", filter.input.unreadable), false);
            output.key_value("Mode:", &format!("{:?}", filter.parallel.mode), false);
            Ok(())
        }
    }
}
