use std::fmt::Debug;
use std::hash::Hash;

/// End-of-text sentinel used by the provided tokenizers as terminator.
pub const END_OF_TEXT: char = '\u{3}';

/// Atomic unit of a sequence (a word, a character, a discrete event).
///
/// `Ord` is required by the order-insensitive context key and the
/// alphabetic selectors; `Default` is the "empty" value left out of key hashes.
pub trait Gram: Clone + Eq + Hash + Ord + Default + Debug + Send + Sync + 'static {}

impl<T> Gram for T where T: Clone + Eq + Hash + Ord + Default + Debug + Send + Sync + 'static {}

/// Unit trained on and produced by a model (a sentence, a word, a track).
///
/// The `Default` value is treated as an absent phrase and never learned.
pub trait Phrase: Clone + Eq + Hash + Default + Debug + Send + Sync + 'static {}

impl<T> Phrase for T where T: Clone + Eq + Hash + Default + Debug + Send + Sync + 'static {}

/// Capability a sequence type must provide to be modelled.
///
/// Splits phrases into grams, rebuilds phrases from grams, and supplies the
/// two sentinels used by the engine:
/// - the prepad gram, filling context windows before the start of a phrase
/// - the terminator gram, recorded after the last window of every phrase
///
/// The terminator must never be produced by `split` for real input and must be
/// kept out of anything presented to end users.
pub trait Tokenizer: Send + Sync {
	type Phrase: Phrase;
	type Gram: Gram;

	fn split(&self, phrase: &Self::Phrase) -> Vec<Self::Gram>;

	fn rebuild(&self, grams: &[Self::Gram]) -> Self::Phrase;

	fn prepad(&self) -> Self::Gram;

	fn terminator(&self) -> Self::Gram;
}

/// Word-level tokenizer: phrases are split on single spaces.
///
/// Consecutive spaces produce empty words, which are kept as grams.
#[derive(Clone, Copy, Debug, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
	type Phrase = String;
	type Gram = String;

	fn split(&self, phrase: &String) -> Vec<String> {
		phrase.split(' ').map(str::to_owned).collect()
	}

	fn rebuild(&self, grams: &[String]) -> String {
		grams.join(" ")
	}

	fn prepad(&self) -> String {
		String::new()
	}

	fn terminator(&self) -> String {
		END_OF_TEXT.to_string()
	}
}

/// Character-level tokenizer: one gram per `char` (UTF-8 aware).
#[derive(Clone, Copy, Debug, Default)]
pub struct CharTokenizer;

impl Tokenizer for CharTokenizer {
	type Phrase = String;
	type Gram = char;

	fn split(&self, phrase: &String) -> Vec<char> {
		phrase.chars().collect()
	}

	/// Prepad characters are dropped from the rebuilt string.
	fn rebuild(&self, grams: &[char]) -> String {
		let prepad = self.prepad();
		grams.iter().filter(|c| **c != prepad).collect()
	}

	fn prepad(&self) -> char {
		'\0'
	}

	fn terminator(&self) -> char {
		END_OF_TEXT
	}
}
