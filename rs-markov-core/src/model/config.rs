use serde::{Deserialize, Serialize};

use crate::error::{MarkovError, MarkovResult};
use super::selector::SelectorKind;

/// Default context window length.
pub const DEFAULT_LEVEL: usize = 2;

/// Default cap on the number of grams in a single generated phrase.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 1500;

/// Default number of attempts allowed per requested phrase in a walk.
pub const DEFAULT_ATTEMPTS_PER_LINE: usize = 10;

/// Bounds on the work a walk may perform.
///
/// # Invariants
/// - Both values are strictly positive
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct WalkLimits {
	/// A phrase stops growing once it holds this many grams (seed included).
	pub max_line_length: usize,

	/// A walk for `count` phrases gives up after `count * attempts_per_line`
	/// generated candidates, accepted or not.
	pub attempts_per_line: usize,
}

impl Default for WalkLimits {
	fn default() -> Self {
		Self {
			max_line_length: DEFAULT_MAX_LINE_LENGTH,
			attempts_per_line: DEFAULT_ATTEMPTS_PER_LINE,
		}
	}
}

/// Construction parameters of a model.
///
/// # Responsibilities
/// - Carry the level, uniqueness flag, selection strategy and walk bounds
/// - Reject invalid values before a model is built
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct ModelConfig {
	/// Number of previous grams considered when choosing the next one.
	pub level: usize,

	/// Reject generated phrases already in the corpus or already returned.
	pub ensure_unique_walk: bool,

	/// Strategy used after the first step of a walk.
	pub selector: SelectorKind,

	pub limits: WalkLimits,
}

impl Default for ModelConfig {
	fn default() -> Self {
		Self {
			level: DEFAULT_LEVEL,
			ensure_unique_walk: false,
			selector: SelectorKind::default(),
			limits: WalkLimits::default(),
		}
	}
}

impl ModelConfig {
	/// Default configuration at a given level.
	pub fn with_level(level: usize) -> Self {
		Self { level, ..Self::default() }
	}

	/// Checks every field.
	///
	/// # Errors
	/// - `InvalidLevel` if `level < 1`
	/// - `Config` if a walk limit is zero
	pub fn validate(&self) -> MarkovResult<()> {
		validate_level(self.level)?;
		if self.limits.max_line_length == 0 {
			return Err(MarkovError::config("max_line_length must be >= 1"));
		}
		if self.limits.attempts_per_line == 0 {
			return Err(MarkovError::config("attempts_per_line must be >= 1"));
		}
		Ok(())
	}
}

/// Rejects a context window length below 1.
pub(crate) fn validate_level(level: usize) -> MarkovResult<()> {
	if level < 1 {
		return Err(MarkovError::InvalidLevel(level));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_defaults() {
		let config = ModelConfig::default();
		assert_eq!(config.level, 2);
		assert!(!config.ensure_unique_walk);
		assert_eq!(config.limits.max_line_length, 1500);
		assert_eq!(config.limits.attempts_per_line, 10);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn test_invalid_values() {
		assert!(matches!(ModelConfig::with_level(0).validate(), Err(MarkovError::InvalidLevel(0))));

		let mut config = ModelConfig::default();
		config.limits.attempts_per_line = 0;
		assert!(matches!(config.validate(), Err(MarkovError::Config(_))));
	}

	#[test]
	fn test_partial_json() {
		let config: ModelConfig = serde_json::from_str(r#"{"level": 3, "selector": "alphabetic_last"}"#).unwrap();
		assert_eq!(config.level, 3);
		assert_eq!(config.selector, SelectorKind::AlphabeticLast);
		assert_eq!(config.limits, WalkLimits::default());
	}
}
