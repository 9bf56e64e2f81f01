use std::collections::HashSet;
use std::iter::FusedIterator;

use log::debug;

use super::markov::MarkovModel;
use super::tokenizer::Tokenizer;

/// Lazy generation of phrases from a model.
///
/// Created by `MarkovModel::walk`. Each call to `next` generates candidates
/// until one is accepted, then yields it; no work happens between calls.
/// A walk is consumed as it goes and cannot be restarted.
///
/// ## Invariants
/// - At most `count` phrases are yielded
/// - At most `max_attempts` candidates are generated
/// - With `unique` set, no yielded phrase is in the corpus or yielded twice
pub struct Walk<'a, T: Tokenizer> {
	model: &'a MarkovModel<T>,
	seed: Vec<T::Gram>,
	count: usize,
	max_attempts: usize,
	attempts: usize,
	produced: usize,
	unique: bool,
	accepted: HashSet<T::Phrase>,
}

impl<'a, T: Tokenizer> Walk<'a, T> {
	pub(crate) fn new(
		model: &'a MarkovModel<T>,
		seed: Vec<T::Gram>,
		count: usize,
		max_attempts: usize,
		unique: bool,
	) -> Self {
		Self {
			model,
			seed,
			count,
			max_attempts,
			attempts: 0,
			produced: 0,
			unique,
			accepted: HashSet::new(),
		}
	}

	/// Number of candidates generated so far.
	pub fn attempts(&self) -> usize {
		self.attempts
	}

	fn is_acceptable(&self, phrase: &T::Phrase) -> bool {
		!self.unique
			|| (!self.model.contains_line(phrase) && !self.accepted.contains(phrase))
	}
}

impl<T: Tokenizer> Iterator for Walk<'_, T> {
	type Item = T::Phrase;

	fn next(&mut self) -> Option<Self::Item> {
		while self.produced < self.count {
			if self.attempts >= self.max_attempts {
				debug!(
					"Breaking out of walk early - {} generations did not produce {} distinct lines ({} were created)",
					self.attempts, self.count, self.produced
				);
				self.count = self.produced;
				return None;
			}

			self.attempts += 1;
			let phrase = self.model.generate(&self.seed);
			if !self.is_acceptable(&phrase) {
				continue;
			}

			self.produced += 1;
			if self.unique {
				self.accepted.insert(phrase.clone());
			}
			return Some(phrase);
		}
		None
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		(0, Some(self.count - self.produced))
	}
}

impl<T: Tokenizer> FusedIterator for Walk<'_, T> {}
