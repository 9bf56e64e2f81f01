use serde::{Deserialize, Serialize};

use super::markov::MarkovModel;
use super::tokenizer::Tokenizer;

/// Whether one window of a tested phrase is known to the chain.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WindowMatch<P> {
	/// The window, rebuilt as a phrase.
	pub window: P,
	/// True if the window has at least one recorded follow-up.
	pub matches_chain: bool,
}

/// Goodness of fit of a phrase against a trained model.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PhraseFit<P> {
	/// One entry per contiguous `level`-gram window, in phrase order.
	pub raw: Vec<WindowMatch<P>>,
}

impl<P> PhraseFit<P> {
	/// Share of windows known to the chain, between 0 and 1.
	///
	/// A phrase too short to hold a single window scores 0.
	pub fn probability(&self) -> f64 {
		if self.raw.is_empty() {
			return 0.0;
		}
		self.matches() as f64 / self.raw.len() as f64
	}

	/// Number of windows known to the chain.
	pub fn matches(&self) -> usize {
		self.raw.iter().filter(|w| w.matches_chain).count()
	}
}

impl<T: Tokenizer> MarkovModel<T> {
	/// Scores how much of `phrase` the model has seen.
	///
	/// Every contiguous window of `level` grams (no wrapping, no padding) is
	/// rebuilt and looked up with `get_matches`; an unknown window counts as
	/// a non-match.
	pub fn get_fit(&self, phrase: &T::Phrase) -> PhraseFit<T::Phrase> {
		let tokens = self.tokenizer().split(phrase);
		if tokens.len() < self.level() {
			return PhraseFit { raw: Vec::new() };
		}

		let raw = tokens
			.windows(self.level())
			.map(|grams| {
				let window = self.tokenizer().rebuild(grams);
				let matches_chain = self
					.get_matches(&window)
					.map(|matches| !matches.is_empty())
					.unwrap_or(false);
				WindowMatch { window, matches_chain }
			})
			.collect();

		PhraseFit { raw }
	}
}
