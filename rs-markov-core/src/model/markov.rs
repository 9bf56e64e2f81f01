use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use log::{debug, info};

use crate::error::{MarkovError, MarkovResult};
use super::config::{validate_level, ModelConfig, WalkLimits};
use super::context_key::ContextKey;
use super::corpus::Corpus;
use super::selector::{UnigramSelector, UnweightedRandom};
use super::store::{StateStatistic, TransitionStore};
use super::tokenizer::{CharTokenizer, Tokenizer, WordTokenizer};
use super::walk::Walk;

/// Batches are split into `num_cpus * CHUNK_FACTOR` chunks for parallel learning.
const CHUNK_FACTOR: usize = 8;

/// Word-level model over space separated sentences.
pub type StringMarkov = MarkovModel<WordTokenizer>;

/// Character-level model over strings.
pub type SubstringMarkov = MarkovModel<CharTokenizer>;

/// Markov chain over the phrases of a tokenizer.
///
/// For every window of `level` consecutive grams seen during learning, the
/// model records which gram followed it. Generation walks these transitions
/// from a seed.
///
/// # Responsibilities
/// - Learn phrases (in parallel) into the transition store and corpus
/// - Rebuild the store at a new level from the corpus (`retrain`)
/// - Generate phrases (`walk`, `walk_line`)
/// - Answer introspection queries (`get_matches`, `suggest`, `statistics`, `get_fit`)
///
/// # Invariants
/// - `level >= 1`
/// - Every key in `store` holds exactly `level` grams
/// - The corpus never holds the same phrase twice, nor a phrase shorter than
///   the level it was learned at (a retrain keeps every line)
///
/// # Concurrency
/// Learning and walking take `&self` and may run from several threads at once.
/// `retrain` takes `&mut self`, so it cannot overlap with either.
pub struct MarkovModel<T: Tokenizer> {
	tokenizer: T,
	level: usize,
	ensure_unique_walk: bool,
	selector: Arc<dyn UnigramSelector<T::Gram>>,
	limits: WalkLimits,
	store: TransitionStore<T::Gram>,
	corpus: Mutex<Corpus<T::Phrase>>,
}

impl<T: Tokenizer> MarkovModel<T> {
	/// Creates an empty model with default settings at the given level.
	///
	/// # Errors
	/// Returns `InvalidLevel` if `level < 1`.
	pub fn new(tokenizer: T, level: usize) -> MarkovResult<Self> {
		Self::with_config(tokenizer, ModelConfig::with_level(level))
	}

	/// Creates an empty model from a full configuration.
	///
	/// # Errors
	/// Returns an error if the configuration does not validate.
	pub fn with_config(tokenizer: T, config: ModelConfig) -> MarkovResult<Self> {
		config.validate()?;
		Ok(Self {
			tokenizer,
			level: config.level,
			ensure_unique_walk: config.ensure_unique_walk,
			selector: config.selector.build(),
			limits: config.limits,
			store: TransitionStore::new(),
			corpus: Mutex::new(Corpus::default()),
		})
	}

	/// Tokenizer converting phrases to grams and back.
	pub fn tokenizer(&self) -> &T {
		&self.tokenizer
	}

	/// Number of previous grams considered when choosing the next one.
	pub fn level(&self) -> usize {
		self.level
	}

	/// Whether walks reject corpus phrases and repeats by default.
	pub fn ensure_unique_walk(&self) -> bool {
		self.ensure_unique_walk
	}

	/// When set, walks never return a phrase from the corpus nor the same
	/// phrase twice. Walks may then return fewer phrases than requested.
	pub fn set_ensure_unique_walk(&mut self, unique: bool) {
		self.ensure_unique_walk = unique;
	}

	/// Replaces the strategy used after the first step of every walk.
	pub fn set_selector(&mut self, selector: impl UnigramSelector<T::Gram> + 'static) {
		self.selector = Arc::new(selector);
	}

	/// Current walk bounds.
	pub fn limits(&self) -> WalkLimits {
		self.limits
	}

	/// # Errors
	/// Returns `Config` if a limit is zero.
	pub fn set_limits(&mut self, limits: WalkLimits) -> MarkovResult<()> {
		ModelConfig { level: self.level, limits, ..ModelConfig::default() }.validate()?;
		self.limits = limits;
		Ok(())
	}

	/// Read access to the transition store.
	pub fn store(&self) -> &TransitionStore<T::Gram> {
		&self.store
	}

	fn corpus(&self) -> MutexGuard<'_, Corpus<T::Phrase>> {
		self.corpus.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Copy of the learned phrases, in learning order.
	pub fn source_lines(&self) -> Vec<T::Phrase> {
		self.corpus().lines().to_vec()
	}

	/// Number of distinct learned phrases.
	pub fn corpus_len(&self) -> usize {
		self.corpus().len()
	}

	/// True if `phrase` is in the corpus.
	pub fn contains_line(&self, phrase: &T::Phrase) -> bool {
		self.corpus().contains(phrase)
	}

	/// Replaces the corpus without touching the store.
	pub(crate) fn set_source_lines(&mut self, lines: Vec<T::Phrase>) {
		self.corpus = Mutex::new(Corpus::from_lines(lines));
	}

	/// Learns a single phrase.
	///
	/// # Behavior
	/// - Ignores the default (empty) phrase.
	/// - Ignores phrases with fewer than `level` grams.
	/// - Ignores phrases holding the terminator gram, which would end every
	///   walk reaching it.
	/// - Adds the phrase to the corpus if not already there.
	/// - Records every gram after the `level` grams preceding it (prepadded at
	///   the start), then the terminator after the last `level` grams.
	///
	/// Learning a phrase again records its transitions again, doubling their weight.
	///
	/// # Returns
	/// `true` if transitions were recorded.
	pub fn learn(&self, phrase: &T::Phrase) -> bool {
		if *phrase == T::Phrase::default() {
			return false;
		}

		let tokens = self.tokenizer.split(phrase);
		if tokens.len() < self.level {
			debug!("Phrase {:?} too short - skipped", phrase);
			return false;
		}
		let terminator = self.tokenizer.terminator();
		if tokens.contains(&terminator) {
			debug!("Phrase {:?} contains the terminator - skipped", phrase);
			return false;
		}

		if self.corpus().insert(phrase) {
			debug!("Adding phrase {:?} to source lines", phrase);
		}

		for (i, gram) in tokens.iter().enumerate() {
			self.store.upsert(ContextKey::new(self.window(&tokens, i)), gram.clone());
		}

		let final_key = ContextKey::new(self.window(&tokens, tokens.len()));
		self.store.upsert(final_key, terminator);
		true
	}

	/// Learns a batch of phrases in parallel.
	///
	/// Every phrase goes through `learn`, including phrases already in the
	/// corpus: re-submitted phrases gain weight. `ignore_already_learnt` only
	/// changes how the batch is reported.
	///
	/// # Returns
	/// The number of phrases newly added to the corpus.
	///
	/// # Notes
	/// - Corpus order between phrases of one batch is not deterministic.
	pub fn learn_all<I>(&self, phrases: I, ignore_already_learnt: bool) -> usize
	where
		I: IntoIterator<Item = T::Phrase>,
	{
		let source: Vec<T::Phrase> = phrases.into_iter().collect();
		if ignore_already_learnt {
			let new_lines = {
				let corpus = self.corpus();
				source.iter().filter(|p| !corpus.contains(p)).count()
			};
			info!("Learning {} new lines ({} supplied)", new_lines, source.len());
		} else {
			info!("Learning {} lines", source.len());
		}

		let before = self.corpus_len();
		if source.len() <= 1 {
			source.iter().for_each(|phrase| {
				self.learn(phrase);
			});
		} else {
			let chunks = num_cpus::get() * CHUNK_FACTOR;
			let chunk_size = source.len().div_ceil(chunks);
			thread::scope(|scope| {
				for chunk in source.chunks(chunk_size) {
					scope.spawn(move || {
						for phrase in chunk {
							self.learn(phrase);
						}
					});
				}
			});
		}
		self.corpus_len() - before
	}

	/// Rebuilds the model at a different level.
	///
	/// Discards the store and learns the whole corpus again. The corpus itself
	/// is left untouched.
	///
	/// # Errors
	/// Returns `InvalidLevel` if `new_level < 1`; the model is then unchanged.
	pub fn retrain(&mut self, new_level: usize) -> MarkovResult<()> {
		validate_level(new_level)?;

		info!("Retraining model as level {}", new_level);
		self.level = new_level;
		self.store = TransitionStore::new();

		let lines = self.source_lines();
		self.learn_all(lines, false);
		Ok(())
	}

	/// Learns every phrase of `other` into this model.
	///
	/// Transitions are rebuilt at this model's level.
	///
	/// # Returns
	/// The number of phrases newly added to the corpus.
	pub fn merge(&self, other: &Self) -> usize {
		self.learn_all(other.source_lines(), true)
	}

	/// The `level` grams preceding index `end`, oldest first.
	///
	/// Positions before the start of `tokens` are filled with the prepad gram.
	/// With `end == tokens.len()`, this keeps the last `level` grams of a
	/// longer input and right-aligns a shorter one.
	fn window(&self, tokens: &[T::Gram], end: usize) -> Vec<T::Gram> {
		(1..=self.level)
			.rev()
			.map(|back| {
				if back <= end {
					tokens[end - back].clone()
				} else {
					self.tokenizer.prepad()
				}
			})
			.collect()
	}

	/// Generates up to `count` phrases.
	///
	/// # Parameters
	/// - `count`: Number of phrases requested (>= 1).
	/// - `seed`: Start of every generated phrase. Defaults to the prepad gram,
	///   which generates from the start of a phrase.
	///
	/// # Returns
	/// A lazy iterator yielding each phrase as soon as it is accepted. It gives
	/// up after `count * attempts_per_line` generations, so it may yield fewer
	/// than `count` phrases when `ensure_unique_walk` is set.
	///
	/// # Errors
	/// Returns `InvalidWalkCount` if `count < 1`.
	pub fn walk(&self, count: usize, seed: Option<&T::Phrase>) -> MarkovResult<Walk<'_, T>> {
		self.walk_with(count, seed, self.ensure_unique_walk)
	}

	/// Same as `walk`, with uniqueness chosen for this call only.
	///
	/// The model's own `ensure_unique_walk` setting is left untouched.
	///
	/// # Errors
	/// Returns `InvalidWalkCount` if `count < 1`.
	pub fn walk_with(&self, count: usize, seed: Option<&T::Phrase>, unique: bool) -> MarkovResult<Walk<'_, T>> {
		if count < 1 {
			return Err(MarkovError::InvalidWalkCount(count));
		}

		let seed = match seed {
			Some(seed) => seed.clone(),
			None => self.tokenizer.rebuild(&[self.tokenizer.prepad()]),
		};

		info!("Walking to return {} phrases from {} states", count, self.store.len());
		let max_attempts = count.saturating_mul(self.limits.attempts_per_line);
		Ok(Walk::new(self, self.tokenizer.split(&seed), count, max_attempts, unique))
	}

	/// Generates a single phrase starting with `seed`.
	///
	/// No uniqueness check is performed.
	pub fn walk_line(&self, seed: &T::Phrase) -> T::Phrase {
		self.generate(&self.tokenizer.split(seed))
	}

	/// Walks the store from already tokenized seed grams.
	///
	/// # Behavior
	/// - The window starts as the seed's last `level` grams (prepadded if shorter).
	/// - Unless the seed is just the prepad gram, the output starts with the seed.
	/// - The first step picks among distinct follow-ups uniformly, later steps
	///   use the configured selector.
	/// - Stops on an unknown window, on the terminator, or once the output
	///   holds `max_line_length` grams.
	pub(crate) fn generate(&self, seed: &[T::Gram]) -> T::Phrase {
		let prepad = self.tokenizer.prepad();
		let terminator = self.tokenizer.terminator();

		let mut window: VecDeque<T::Gram> = self.window(seed, seed.len()).into();
		let mut built: Vec<T::Gram> = if seed.len() == 1 && seed[0] == prepad {
			Vec::new()
		} else {
			seed.to_vec()
		};

		let mut first = true;
		while built.len() < self.limits.max_line_length {
			let key = ContextKey::new(window.iter().cloned().collect());
			let chosen = self.store.with_entry(&key, |grams| {
				if first {
					UnweightedRandom.select(grams)
				} else {
					self.selector.select(grams)
				}
			});

			let Some(Some(chosen)) = chosen else { break };
			if chosen == terminator {
				break;
			}
			first = false;

			window.pop_front();
			window.push_back(chosen.clone());
			built.push(chosen);
		}

		self.tokenizer.rebuild(&built)
	}

	/// Returns every gram observed after the input's last `level` grams.
	///
	/// The input is prepadded when shorter than `level`. Duplicates are kept:
	/// they encode frequency.
	///
	/// # Errors
	/// Returns `KeyNotFound` if that window was never observed.
	pub fn get_matches(&self, input: &T::Phrase) -> MarkovResult<Vec<T::Gram>> {
		let tokens = self.tokenizer.split(input);
		let key = ContextKey::new(self.window(&tokens, tokens.len()));
		self.store
			.lookup(&key)
			.ok_or_else(|| MarkovError::KeyNotFound(format!("{:?}", key.grams())))
	}

	/// Next-gram suggestions for an end user.
	///
	/// Distinct matches ordered by descending frequency, without the prepad
	/// and terminator sentinels.
	///
	/// # Errors
	/// Returns `KeyNotFound` if the input's window was never observed.
	pub fn suggest(&self, input: &T::Phrase) -> MarkovResult<Vec<T::Gram>> {
		let prepad = self.tokenizer.prepad();
		let terminator = self.tokenizer.terminator();

		let mut counted: Vec<(T::Gram, usize)> = Vec::new();
		for gram in self.get_matches(input)? {
			if gram == prepad || gram == terminator {
				continue;
			}
			match counted.iter_mut().find(|(g, _)| *g == gram) {
				Some((_, count)) => *count += 1,
				None => counted.push((gram, 1)),
			}
		}

		counted.sort_by(|a, b| b.1.cmp(&a.1));
		Ok(counted.into_iter().map(|(gram, _)| gram).collect())
	}

	/// Per-key report of the transition store.
	pub fn statistics(&self) -> Vec<StateStatistic<T::Gram>> {
		self.store.statistics()
	}

	/// Total number of recorded transitions.
	pub fn total_observations(&self) -> usize {
		self.store.total_observations()
	}
}

impl<T: Tokenizer + Default> MarkovModel<T> {
	/// Creates an empty model using the tokenizer's default instance.
	pub fn with_level(level: usize) -> MarkovResult<Self> {
		Self::new(T::default(), level)
	}
}

impl<T: Tokenizer + Default> Default for MarkovModel<T> {
	fn default() -> Self {
		let config = ModelConfig::default();
		Self {
			tokenizer: T::default(),
			level: config.level,
			ensure_unique_walk: config.ensure_unique_walk,
			selector: config.selector.build(),
			limits: config.limits,
			store: TransitionStore::new(),
			corpus: Mutex::new(Corpus::default()),
		}
	}
}

impl<T: Tokenizer> fmt::Debug for MarkovModel<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MarkovModel")
			.field("level", &self.level)
			.field("ensure_unique_walk", &self.ensure_unique_walk)
			.field("limits", &self.limits)
			.field("states", &self.store.len())
			.field("source_lines", &self.corpus_len())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::selector::{AlphabeticFirst, AlphabeticLast};

	fn learned(level: usize, lines: &[&str]) -> StringMarkov {
		let model = StringMarkov::with_level(level).unwrap();
		for line in lines {
			model.learn(&line.to_string());
		}
		model
	}

	#[test]
	fn test_window_pads_and_truncates() {
		let model = StringMarkov::with_level(3).unwrap();
		let tokens: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
		assert_eq!(model.window(&tokens, 0), vec!["", "", ""]);
		assert_eq!(model.window(&tokens, 2), vec!["", "a", "b"]);
		assert_eq!(model.window(&tokens, 4), vec!["b", "c", "d"]);
	}

	#[test]
	fn test_learn_records_terminal_key() {
		let model = learned(2, &["Testing the model"]);
		let terminal = ContextKey::new(vec!["the".to_owned(), "model".to_owned()]);
		assert_eq!(model.store().lookup(&terminal), Some(vec![WordTokenizer.terminator()]));
		assert_eq!(model.total_observations(), 4);
		assert_eq!(model.store().len(), 4);
	}

	#[test]
	fn test_learn_ignores_default_and_short() {
		let model = StringMarkov::with_level(3).unwrap();
		assert!(!model.learn(&String::new()));
		assert!(!model.learn(&"too short".to_owned()));
		assert_eq!(model.corpus_len(), 0);
		assert!(model.store().is_empty());
	}

	#[test]
	fn test_level_one_learns_single_word() {
		let model = learned(1, &["hello"]);
		assert_eq!(model.corpus_len(), 1);
		assert_eq!(model.get_matches(&String::new()).unwrap(), vec!["hello"]);
	}

	#[test]
	fn test_generate_deterministic_with_alphabetic_selector() {
		let mut model = learned(1, &["a b c"]);
		model.set_selector(AlphabeticFirst);
		// Single follow-up everywhere: the walk replays the phrase
		assert_eq!(model.walk_line(&String::new()), "a b c");
		assert_eq!(model.walk_line(&"b".to_owned()), "b c");
	}

	#[test]
	fn test_generate_respects_max_line_length() {
		let mut model = learned(1, &["x x"]);
		// "x" sorts after the terminator, so the walk never ends on its own
		model.set_selector(AlphabeticLast);
		model.set_limits(WalkLimits { max_line_length: 5, attempts_per_line: 1 }).unwrap();
		assert_eq!(model.walk_line(&String::new()), "x x x x x");
	}

	#[test]
	fn test_suggest_filters_sentinels() {
		let model = learned(1, &["a b", "a c", "a c"]);
		assert_eq!(model.suggest(&"a".to_owned()).unwrap(), vec!["c", "b"]);
		// Only the terminator follows "c"
		assert!(model.suggest(&"c".to_owned()).unwrap().is_empty());
		assert!(model.suggest(&"zzz".to_owned()).is_err());
	}

	#[test]
	fn test_learn_rejects_terminator_gram() {
		let model = learned(1, &["a \u{3} b"]);
		assert_eq!(model.corpus_len(), 0);
		assert!(model.store().is_empty());

		let chars = SubstringMarkov::with_level(1).unwrap();
		assert!(!chars.learn(&"a\u{3}b".to_owned()));
		assert!(chars.learn(&"ab".to_owned()));
		assert_eq!(chars.walk_line(&"a".to_owned()), "ab");
	}

	#[test]
	fn test_set_limits_rejects_zero() {
		let mut model = StringMarkov::default();
		assert!(model.set_limits(WalkLimits { max_line_length: 0, attempts_per_line: 1 }).is_err());
		assert_eq!(model.limits(), WalkLimits::default());
	}
}
