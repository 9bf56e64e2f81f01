use std::collections::HashMap;

use dashmap::DashMap;
use log::trace;
use serde::{Deserialize, Serialize};

use super::context_key::ContextKey;
use super::tokenizer::Gram;

/// Concurrent mapping from a context window to the grams observed after it.
///
/// Conceptually, each entry is a node in a Markov chain whose outgoing edges
/// are weighted by how often they were observed. Weights are not stored
/// explicitly: a gram observed `k` times appears `k` times in the entry.
///
/// ## Responsibilities:
/// - Accumulate observations during (parallel) learning
/// - Expose entries to the selection strategies during a walk
/// - Report per-key statistics
///
/// ## Invariants
/// - Every entry holds at least one gram
/// - Create-or-append on a key is atomic: the map shard holding the key stays
///   write-locked for the whole upsert, so concurrent learners never lose an
///   observation. Keys in other shards proceed independently.
#[derive(Debug)]
pub struct TransitionStore<G: Gram> {
	states: DashMap<ContextKey<G>, Vec<G>>,
}

impl<G: Gram> Default for TransitionStore<G> {
	fn default() -> Self {
		Self::new()
	}
}

impl<G: Gram> TransitionStore<G> {
	/// Creates a new empty store.
	pub fn new() -> Self {
		Self { states: DashMap::new() }
	}

	/// Records an occurrence of `gram` after the window `key`.
	///
	/// - If the key already exists, the gram is appended to its entry.
	/// - Otherwise, a new entry is created holding only this gram.
	pub fn upsert(&self, key: ContextKey<G>, gram: G) {
		trace!("Upsert {:?} -> {:?}", key.grams(), gram);
		self.states.entry(key).or_default().push(gram);
	}

	/// Returns a copy of the grams observed after `key`.
	///
	/// Returns `None` if the key was never observed, which is distinct from an
	/// entry with no grams (never produced by `upsert`).
	pub fn lookup(&self, key: &ContextKey<G>) -> Option<Vec<G>> {
		self.states.get(key).map(|entry| entry.value().clone())
	}

	/// Runs `f` over the grams observed after `key` without copying them.
	///
	/// Returns `None` if the key is absent.
	pub fn with_entry<R>(&self, key: &ContextKey<G>, f: impl FnOnce(&[G]) -> R) -> Option<R> {
		self.states.get(key).map(|entry| f(entry.value()))
	}

	/// True if `key` was observed at least once.
	pub fn contains(&self, key: &ContextKey<G>) -> bool {
		self.states.contains_key(key)
	}

	/// Number of distinct keys.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	/// True when nothing has been learned.
	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Total number of observations across all keys.
	pub fn total_observations(&self) -> usize {
		self.states.iter().map(|entry| entry.value().len()).sum()
	}

	/// Snapshot of every key currently stored (arbitrary order).
	pub fn keys(&self) -> Vec<ContextKey<G>> {
		self.states.iter().map(|entry| entry.key().clone()).collect()
	}

	/// Drops every entry.
	pub fn clear(&self) {
		self.states.clear();
	}

	/// Builds the per-key report.
	///
	/// Keys are sorted by descending number of observations; within a key,
	/// grams are sorted by descending share. Ties keep the order in which the
	/// grams were first observed.
	pub fn statistics(&self) -> Vec<StateStatistic<G>> {
		let mut stats: Vec<StateStatistic<G>> = self
			.states
			.iter()
			.map(|entry| StateStatistic::new(entry.key().grams().to_vec(), entry.value()))
			.collect();

		stats.sort_by(|a, b| b.total().cmp(&a.total()));
		stats
	}
}

/// Observation summary for one context key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StateStatistic<G> {
	/// The context window, in the order it was first stored.
	pub state: Vec<G>,
	/// Distinct follow-up grams with their counts and shares.
	pub next: Vec<GramStatistic<G>>,
}

/// One distinct follow-up gram of a context key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GramStatistic<G> {
	pub value: G,
	/// Raw number of observations.
	pub count: usize,
	/// Share of the key's observations, in percent, rounded to two decimals.
	pub probability: f64,
}

impl<G: Gram> StateStatistic<G> {
	fn new(state: Vec<G>, values: &[G]) -> Self {
		// Group by first appearance
		let mut index: HashMap<&G, usize> = HashMap::new();
		let mut groups: Vec<(&G, usize)> = Vec::new();
		for value in values {
			match index.get(value) {
				Some(&i) => groups[i].1 += 1,
				None => {
					index.insert(value, groups.len());
					groups.push((value, 1));
				}
			}
		}

		let total = values.len() as f64;
		let mut next: Vec<GramStatistic<G>> = groups
			.into_iter()
			.map(|(value, count)| GramStatistic {
				value: value.clone(),
				count,
				probability: round2(count as f64 / total * 100.0),
			})
			.collect();
		next.sort_by(|a, b| b.probability.total_cmp(&a.probability));

		Self { state, next }
	}
}

impl<G> StateStatistic<G> {
	/// Total observations at this key.
	pub fn total(&self) -> usize {
		self.next.iter().map(|n| n.count).sum()
	}
}

fn round2(value: f64) -> f64 {
	(value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::Arc;
	use std::thread;

	fn key(grams: &[char]) -> ContextKey<char> {
		ContextKey::new(grams.to_vec())
	}

	#[test]
	fn test_upsert_and_lookup() {
		let store = TransitionStore::new();
		assert!(store.lookup(&key(&['a'])).is_none());

		store.upsert(key(&['a']), 'b');
		store.upsert(key(&['a']), 'b');
		store.upsert(key(&['a']), 'c');

		assert_eq!(store.lookup(&key(&['a'])), Some(vec!['b', 'b', 'c']));
		assert_eq!(store.len(), 1);
		assert_eq!(store.total_observations(), 3);
		assert_eq!(store.with_entry(&key(&['a']), |g| g.len()), Some(3));
	}

	#[test]
	fn test_statistics_order_and_rounding() {
		let store = TransitionStore::new();
		for c in ['x', 'y', 'y'] {
			store.upsert(key(&['a']), c);
		}
		for c in ['z', 'z', 'z', 'w'] {
			store.upsert(key(&['b']), c);
		}

		let stats = store.statistics();
		assert_eq!(stats.len(), 2);
		assert_eq!(stats[0].state, vec!['b']);
		assert_eq!(stats[0].total(), 4);
		assert_eq!(stats[0].next[0].value, 'z');
		assert_eq!(stats[0].next[0].probability, 75.0);

		assert_eq!(stats[1].next[0].value, 'y');
		assert_eq!(stats[1].next[0].count, 2);
		assert_eq!(stats[1].next[0].probability, 66.67);
		assert_eq!(stats[1].next[1].probability, 33.33);
	}

	#[test]
	fn test_concurrent_upserts_are_not_lost() {
		let store = Arc::new(TransitionStore::new());
		let handles: Vec<_> = (0..8)
			.map(|t| {
				let store = Arc::clone(&store);
				thread::spawn(move || {
					for i in 0..500 {
						store.upsert(key(&['s']), 'n');
						store.upsert(key(&[char::from(b'a' + (i % 5) as u8)]), char::from(b'0' + t as u8));
					}
				})
			})
			.collect();
		for handle in handles {
			handle.join().unwrap();
		}

		assert_eq!(store.lookup(&key(&['s'])).map(|v| v.len()), Some(4000));
		assert_eq!(store.total_observations(), 8000);
		assert_eq!(store.len(), 6);
	}
}
