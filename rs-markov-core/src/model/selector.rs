use std::collections::HashSet;
use std::sync::Arc;

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::tokenizer::Gram;

/// Strategy picking the next gram from the follow-ups observed at a key.
///
/// Implementations must be pure with respect to the store: they only read the
/// slice they are given. `grams` may contain duplicates (their frequency is
/// the weight). Returns `None` only for an empty slice.
pub trait UnigramSelector<G>: Send + Sync {
	fn select(&self, grams: &[G]) -> Option<G>;
}

/// Uniform draw over the raw observations, so frequent grams are
/// proportionally more likely.
#[derive(Clone, Copy, Debug, Default)]
pub struct WeightedRandom;

impl<G: Gram> UnigramSelector<G> for WeightedRandom {
	fn select(&self, grams: &[G]) -> Option<G> {
		grams.choose(&mut rand::rng()).cloned()
	}
}

/// Uniform draw over the distinct grams, ignoring frequency.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnweightedRandom;

impl<G: Gram> UnigramSelector<G> for UnweightedRandom {
	fn select(&self, grams: &[G]) -> Option<G> {
		let mut seen = HashSet::new();
		let distinct: Vec<&G> = grams.iter().filter(|g| seen.insert(*g)).collect();
		distinct.choose(&mut rand::rng()).map(|g| (*g).clone())
	}
}

/// Always the smallest gram in the natural order.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlphabeticFirst;

impl<G: Gram> UnigramSelector<G> for AlphabeticFirst {
	fn select(&self, grams: &[G]) -> Option<G> {
		grams.iter().min().cloned()
	}
}

/// Always the largest gram in the natural order.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlphabeticLast;

impl<G: Gram> UnigramSelector<G> for AlphabeticLast {
	fn select(&self, grams: &[G]) -> Option<G> {
		grams.iter().max().cloned()
	}
}

/// Serializable name of one of the provided strategies.
///
/// Used by configuration files and the HTTP layer; custom strategies are
/// injected directly with `MarkovModel::set_selector`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectorKind {
	#[default]
	WeightedRandom,
	UnweightedRandom,
	AlphabeticFirst,
	AlphabeticLast,
}

impl SelectorKind {
	/// Instantiates the strategy for a gram type.
	pub fn build<G: Gram>(self) -> Arc<dyn UnigramSelector<G>> {
		match self {
			SelectorKind::WeightedRandom => Arc::new(WeightedRandom),
			SelectorKind::UnweightedRandom => Arc::new(UnweightedRandom),
			SelectorKind::AlphabeticFirst => Arc::new(AlphabeticFirst),
			SelectorKind::AlphabeticLast => Arc::new(AlphabeticLast),
		}
	}
}
