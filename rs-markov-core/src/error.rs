//! Error types for the Markov engine.

use thiserror::Error;

/// Main error type for model operations
#[derive(Error, Debug)]
pub enum MarkovError {
	/// Context window length is not a positive integer
	#[error("Invalid level {0}: level must be a positive integer")]
	InvalidLevel(usize),

	/// Walk requested with a non-positive line count
	#[error("Invalid walk count {0}: line count for walk must be a positive integer")]
	InvalidWalkCount(usize),

	/// No transitions recorded for a context window
	#[error("No transitions recorded for context {0}")]
	KeyNotFound(String),

	/// Configuration error
	#[error("Configuration error: {0}")]
	Config(String),

	/// IO error
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON (de)serialization error
	#[error("Serialization error: {0}")]
	Json(#[from] serde_json::Error),

	/// Binary (de)serialization error
	#[error("Binary encoding error: {0}")]
	Binary(#[from] postcard::Error),
}

/// Result type for model operations
pub type MarkovResult<T> = Result<T, MarkovError>;

impl MarkovError {
	/// Create a config error
	pub fn config(msg: impl Into<String>) -> Self {
		Self::Config(msg.into())
	}

	/// Returns true for a lookup miss on a context window.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::KeyNotFound(_))
	}
}
