use std::collections::HashSet;

use super::tokenizer::Phrase;

/// Ordered, duplicate-free list of learned phrases.
///
/// `index` mirrors `lines` so membership checks stay O(1) during unique walks.
#[derive(Debug)]
pub(crate) struct Corpus<P: Phrase> {
	lines: Vec<P>,
	index: HashSet<P>,
}

impl<P: Phrase> Default for Corpus<P> {
	fn default() -> Self {
		Self { lines: Vec::new(), index: HashSet::new() }
	}
}

impl<P: Phrase> Corpus<P> {
	/// Rebuilds a corpus from stored lines, dropping later duplicates.
	pub(crate) fn from_lines(lines: Vec<P>) -> Self {
		let mut corpus = Self::default();
		for line in &lines {
			corpus.insert(line);
		}
		corpus
	}

	/// Appends `phrase` unless already present. Returns true if appended.
	pub(crate) fn insert(&mut self, phrase: &P) -> bool {
		if !self.index.insert(phrase.clone()) {
			return false;
		}
		self.lines.push(phrase.clone());
		true
	}

	pub(crate) fn contains(&self, phrase: &P) -> bool {
		self.index.contains(phrase)
	}

	pub(crate) fn lines(&self) -> &[P] {
		&self.lines
	}

	pub(crate) fn len(&self) -> usize {
		self.lines.len()
	}
}
