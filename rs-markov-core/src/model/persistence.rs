use std::fs;
use std::path::Path;

use log::info;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::MarkovResult;
use crate::io::{has_extension, read_corpus, snapshot_path};
use super::markov::MarkovModel;
use super::tokenizer::Tokenizer;

/// Level a saved model is retrained at when the caller has no preference.
pub const DEFAULT_LOAD_LEVEL: usize = 1;

/// Saved form of a model: the source of truth only.
///
/// The transition store is never saved; it is recomputed from
/// `source_lines` whenever a snapshot is loaded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelSnapshot<P> {
	/// Level the model had when saved (informational, loading picks its own).
	pub level: usize,
	#[serde(default)]
	pub ensure_unique_walk: bool,
	pub source_lines: Vec<P>,
}

impl<T> MarkovModel<T>
where
	T: Tokenizer,
	T::Phrase: Serialize + DeserializeOwned,
{
	/// Captures the corpus and settings.
	pub fn snapshot(&self) -> ModelSnapshot<T::Phrase> {
		ModelSnapshot {
			level: self.level(),
			ensure_unique_walk: self.ensure_unique_walk(),
			source_lines: self.source_lines(),
		}
	}

	/// Rebuilds a model from a snapshot.
	///
	/// The model is always retrained at `level`; the saved level is ignored,
	/// even when it is not a valid one.
	///
	/// # Errors
	/// Returns `InvalidLevel` if `level` is below 1.
	pub fn from_snapshot(tokenizer: T, snapshot: ModelSnapshot<T::Phrase>, level: usize) -> MarkovResult<Self> {
		let mut model = Self::new(tokenizer, level)?;
		model.set_ensure_unique_walk(snapshot.ensure_unique_walk);
		model.set_source_lines(snapshot.source_lines);

		model.retrain(level)?;
		info!(
			"Loaded level {} model with {} lines of training data",
			model.level(),
			model.corpus_len()
		);
		Ok(model)
	}

	/// Serializes the snapshot as pretty printed JSON.
	pub fn serialize(&self) -> MarkovResult<String> {
		Ok(serde_json::to_string_pretty(&self.snapshot())?)
	}

	/// Loads a model from `serialize` output, retrained at `level`.
	pub fn deserialize(tokenizer: T, data: &str, level: usize) -> MarkovResult<Self> {
		let snapshot: ModelSnapshot<T::Phrase> = serde_json::from_str(data)?;
		Self::from_snapshot(tokenizer, snapshot, level)
	}

	/// Serializes the snapshot with `postcard` (compact binary).
	pub fn to_bytes(&self) -> MarkovResult<Vec<u8>> {
		Ok(postcard::to_stdvec(&self.snapshot())?)
	}

	/// Loads a model from `to_bytes` output, retrained at `level`.
	pub fn from_bytes(tokenizer: T, bytes: &[u8], level: usize) -> MarkovResult<Self> {
		let snapshot: ModelSnapshot<T::Phrase> = postcard::from_bytes(bytes)?;
		Self::from_snapshot(tokenizer, snapshot, level)
	}

	/// Saves the model to a file.
	///
	/// `.json` files are written as JSON, any other extension as postcard.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> MarkovResult<()> {
		let path = path.as_ref();
		info!("Saving model with {} states to {}", self.store().len(), path.display());
		if has_extension(path, "json") {
			fs::write(path, self.serialize()?)?;
		} else {
			fs::write(path, self.to_bytes()?)?;
		}
		info!("Model saved successfully");
		Ok(())
	}

	/// Loads a model saved with `save`, retrained at `level`.
	pub fn load<P: AsRef<Path>>(tokenizer: T, path: P, level: usize) -> MarkovResult<Self> {
		let path = path.as_ref();
		info!("Loading model from {}", path.display());
		if has_extension(path, "json") {
			let data = fs::read_to_string(path)?;
			Self::deserialize(tokenizer, &data, level)
		} else {
			let bytes = fs::read(path)?;
			Self::from_bytes(tokenizer, &bytes, level)
		}
	}
}

impl<T> MarkovModel<T>
where
	T: Tokenizer,
	T::Phrase: Serialize + DeserializeOwned + From<String>,
{
	/// Loads a model from a text corpus, one phrase per line.
	///
	/// # Behavior
	/// - If a `.bin` snapshot with the same stem exists next to the corpus, it
	///   is loaded instead of the text (and retrained at `level`).
	/// - Otherwise the lines are learned in parallel and the snapshot is
	///   written to that `.bin` path for the next load.
	///
	/// # Notes
	/// - The cached snapshot is not invalidated when the text file changes;
	///   delete the `.bin` file to force a rebuild.
	pub fn from_corpus_file<P: AsRef<Path>>(tokenizer: T, path: P, level: usize) -> MarkovResult<Self> {
		let binary_data_path = snapshot_path(&path)?;
		if binary_data_path.exists() {
			let bytes = fs::read(&binary_data_path)?;
			return Self::from_bytes(tokenizer, &bytes, level);
		}

		let lines = read_corpus(&path)?;
		let model = Self::new(tokenizer, level)?;
		model.learn_all(lines.into_iter().map(T::Phrase::from), true);

		fs::write(&binary_data_path, model.to_bytes()?)?;
		Ok(model)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::MarkovError;
	use crate::model::markov::StringMarkov;
	use crate::model::tokenizer::WordTokenizer;

	fn trained() -> StringMarkov {
		let model = StringMarkov::with_level(1).unwrap();
		model.learn(&"the cat sat on the mat".to_owned());
		model.learn(&"the dog sat on the rug".to_owned());
		model
	}

	#[test]
	fn test_json_has_no_store() {
		let json = trained().serialize().unwrap();
		let value: serde_json::Value = serde_json::from_str(&json).unwrap();
		assert_eq!(value["level"], 1);
		assert_eq!(value["source_lines"].as_array().unwrap().len(), 2);
		assert!(value.get("store").is_none());
		assert!(value.get("model").is_none());
	}

	#[test]
	fn test_deserialize_retrains_at_requested_level() {
		let model = trained();
		let loaded = StringMarkov::deserialize(WordTokenizer, &model.serialize().unwrap(), 3).unwrap();
		assert_eq!(loaded.level(), 3);
		assert_eq!(loaded.source_lines(), model.source_lines());
		assert!(loaded.store().keys().iter().all(|k| k.len() == 3));
	}

	#[test]
	fn test_bytes_round_trip() {
		let model = trained();
		let loaded = StringMarkov::from_bytes(WordTokenizer, &model.to_bytes().unwrap(), 1).unwrap();
		assert_eq!(loaded.source_lines(), model.source_lines());
		assert_eq!(loaded.total_observations(), model.total_observations());
	}

	#[test]
	fn test_invalid_level_on_load() {
		let data = trained().serialize().unwrap();
		assert!(matches!(
			StringMarkov::deserialize(WordTokenizer, &data, 0),
			Err(MarkovError::InvalidLevel(0))
		));
	}

	#[test]
	fn test_saved_level_is_ignored_on_load() {
		let data = r#"{"level":0,"ensure_unique_walk":false,"source_lines":["the cat sat"]}"#;
		let loaded = StringMarkov::deserialize(WordTokenizer, data, 2).unwrap();
		assert_eq!(loaded.level(), 2);
		assert_eq!(loaded.source_lines(), vec!["the cat sat".to_owned()]);
		assert_eq!(loaded.total_observations(), 4);
	}

	#[test]
	fn test_corpus_file_writes_cache() {
		let dir = tempfile::tempdir().unwrap();
		let corpus = dir.path().join("animals.dat");
		fs::write(&corpus, "the cat sat\nthe dog ran\n").unwrap();

		let model = StringMarkov::from_corpus_file(WordTokenizer, &corpus, 2).unwrap();
		assert_eq!(model.corpus_len(), 2);
		assert!(dir.path().join("animals.bin").exists());

		// Second load comes from the cache
		fs::write(&corpus, "").unwrap();
		let cached = StringMarkov::from_corpus_file(WordTokenizer, &corpus, 1).unwrap();
		assert_eq!(cached.corpus_len(), 2);
		assert_eq!(cached.level(), 1);
	}
}
