use std::env;
use std::path::PathBuf;

use rs_markov_core::io::resolve_data_dir;
use rs_markov_core::model::config::DEFAULT_LEVEL;
use rs_markov_core::{MarkovError, MarkovResult};

/// Server settings.
///
/// Every field can be overridden from the environment:
/// `MARKOV_HOST`, `MARKOV_PORT`, `MARKOV_DATA_DIR`, `MARKOV_LEVEL`.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	/// Folder holding the `.dat` corpora served by `/v1/models`
	pub data_dir: PathBuf,
	/// Level used when a request does not name one
	pub default_level: usize,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: "127.0.0.1".to_owned(),
			port: 5000,
			data_dir: PathBuf::from("./data"),
			default_level: DEFAULT_LEVEL,
		}
	}
}

impl ServerConfig {
	/// Reads the `MARKOV_*` variables of the process environment.
	pub fn from_env() -> MarkovResult<Self> {
		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Builds the configuration from any key/value source, starting from the defaults.
	///
	/// # Errors
	/// Returns `Config` when a port or level cannot be parsed, and
	/// `InvalidLevel` for a level of 0.
	pub fn from_lookup<F>(lookup: F) -> MarkovResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let mut config = Self::default();

		if let Some(host) = lookup("MARKOV_HOST") {
			config.host = host;
		}
		if let Some(port) = lookup("MARKOV_PORT") {
			config.port = port
				.trim()
				.parse()
				.map_err(|_| MarkovError::config(format!("MARKOV_PORT must be a port number, got '{port}'")))?;
		}
		if let Some(dir) = lookup("MARKOV_DATA_DIR") {
			config.data_dir = resolve_data_dir(dir.trim());
		}
		if let Some(level) = lookup("MARKOV_LEVEL") {
			config.default_level = level
				.trim()
				.parse()
				.map_err(|_| MarkovError::config(format!("MARKOV_LEVEL must be a positive integer, got '{level}'")))?;
			if config.default_level < 1 {
				return Err(MarkovError::InvalidLevel(config.default_level));
			}
		}

		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |key| map.get(key).cloned()
	}

	#[test]
	fn test_defaults_without_env() {
		assert_eq!(ServerConfig::from_lookup(|_| None).unwrap(), ServerConfig::default());
	}

	#[test]
	fn test_overrides() {
		let config = ServerConfig::from_lookup(lookup_from(&[
			("MARKOV_HOST", "0.0.0.0"),
			("MARKOV_PORT", "8080"),
			("MARKOV_DATA_DIR", "/srv/corpora"),
			("MARKOV_LEVEL", "3"),
		]))
		.unwrap();
		assert_eq!(config.host, "0.0.0.0");
		assert_eq!(config.port, 8080);
		assert_eq!(config.data_dir, PathBuf::from("/srv/corpora"));
		assert_eq!(config.default_level, 3);
	}

	#[test]
	fn test_invalid_values() {
		assert!(matches!(
			ServerConfig::from_lookup(lookup_from(&[("MARKOV_PORT", "port")])),
			Err(MarkovError::Config(_))
		));
		assert!(matches!(
			ServerConfig::from_lookup(lookup_from(&[("MARKOV_LEVEL", "0")])),
			Err(MarkovError::InvalidLevel(0))
		));
	}
}
