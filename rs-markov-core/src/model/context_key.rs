use std::hash::{Hash, Hasher};

use super::tokenizer::Gram;

/// Composite lookup key over the `level` grams preceding a position.
///
/// Equality and hashing are computed over the multiset of grams: two keys
/// holding the same grams in a different order are the same key, so distinct
/// orderings of one window share a single store entry. Grams equal to
/// `G::default()` do not contribute to the hash.
///
/// ## Invariants
/// - `sorted` is a sorted copy of `grams`, computed once at construction
/// - A key is never mutated after construction
#[derive(Clone, Debug)]
pub struct ContextKey<G: Gram> {
	/// Grams in window order (oldest first).
	grams: Box<[G]>,
	/// Same grams, sorted. Used for equality and hashing.
	sorted: Box<[G]>,
}

impl<G: Gram> ContextKey<G> {
	/// Builds a key from an already padded/truncated window.
	pub fn new(grams: Vec<G>) -> Self {
		let mut sorted = grams.clone();
		sorted.sort_unstable();
		Self {
			grams: grams.into_boxed_slice(),
			sorted: sorted.into_boxed_slice(),
		}
	}

	/// Grams in window order.
	pub fn grams(&self) -> &[G] {
		&self.grams
	}

	/// Window length, equal to the model level the key was built for.
	pub fn len(&self) -> usize {
		self.grams.len()
	}

	/// True for a zero-length window.
	pub fn is_empty(&self) -> bool {
		self.grams.is_empty()
	}
}

impl<G: Gram> PartialEq for ContextKey<G> {
	fn eq(&self, other: &Self) -> bool {
		self.sorted == other.sorted
	}
}

impl<G: Gram> Eq for ContextKey<G> {}

impl<G: Gram> Hash for ContextKey<G> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		let empty = G::default();
		// Sorted order keeps the hash consistent with multiset equality
		for gram in self.sorted.iter().filter(|g| **g != empty) {
			gram.hash(state);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use std::collections::hash_map::DefaultHasher;

	fn hash_of<T: Hash>(value: &T) -> u64 {
		let mut hasher = DefaultHasher::new();
		value.hash(&mut hasher);
		hasher.finish()
	}

	fn key(words: &[&str]) -> ContextKey<String> {
		ContextKey::new(words.iter().map(|w| w.to_string()).collect())
	}

	#[test]
	fn test_order_insensitive_equality() {
		let a = key(&["the", "cat"]);
		let b = key(&["cat", "the"]);
		assert_eq!(a, b);
		assert_eq!(hash_of(&a), hash_of(&b));
		assert_eq!(b.grams(), &["cat".to_owned(), "the".to_owned()]);
	}

	#[test]
	fn test_multiset_not_set() {
		assert_ne!(key(&["a", "a", "b"]), key(&["a", "b", "b"]));
	}

	#[test]
	fn test_default_excluded_from_hash() {
		let padded = key(&["", "cat"]);
		let bare = key(&["cat"]);
		assert_eq!(hash_of(&padded), hash_of(&bare));
		// Still distinct keys: equality sees the padding
		assert_ne!(padded, bare);
	}

	#[test]
	fn test_collisions_share_entry() {
		let mut map: HashMap<ContextKey<char>, usize> = HashMap::new();
		*map.entry(ContextKey::new(vec!['a', 'b'])).or_default() += 1;
		*map.entry(ContextKey::new(vec!['b', 'a'])).or_default() += 1;
		assert_eq!(map.len(), 1);
		assert_eq!(map[&ContextKey::new(vec!['a', 'b'])], 2);
	}
}
