//! Editor configuration loading from TOML.

use anyhow::{Context, Result};
use globe_core::EditorConfig;
use serde::Deserialize;
use std::path::Path;

/// Root of the configuration file. Every table is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Editor tunables.
	pub editor: EditorConfig,
}

impl Config {
	/// Load configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self> {
		let content = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {}", path.display()))?;
		Self::parse(&content).with_context(|| format!("Invalid config file: {}", path.display()))
	}

	/// Parse and validate configuration text.
	pub fn parse(content: &str) -> Result<Self> {
		let config: Config = toml::from_str(content).context("Failed to parse config TOML")?;
		config.editor.validate().context("Editor settings out of range")?;
		Ok(config)
	}

	/// Load `path` if given, otherwise use defaults.
	pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
		match path {
			Some(path) => Self::load(path),
			None => Ok(Self::default()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_file_is_all_defaults() {
		let config = Config::parse("").unwrap();
		assert_eq!(config.editor, EditorConfig::default());
	}

	#[test]
	fn partial_editor_table() {
		let config = Config::parse(
			r#"
			[editor]
			max_zoom = 4.0
			detail_zoom = 3.5
			initial_batch_size = 100
			"#,
		)
		.unwrap();
		assert_eq!(config.editor.max_zoom, 4.0);
		assert_eq!(config.editor.initial_batch_size, 100);
		assert_eq!(config.editor.nest_threshold, 0.05);
	}

	#[test]
	fn invalid_range_rejected() {
		let err = Config::parse("[editor]\nmin_zoom = 4.0\nmax_zoom = 1.0\n").unwrap_err();
		assert!(format!("{err:#}").contains("zoom range is empty"));
	}

	#[test]
	fn unknown_type_rejected() {
		assert!(Config::parse("[editor]\nhistory_limit = \"many\"\n").is_err());
	}
}
