mod common;

use common::{example_lines, sorted, trained, EXAMPLE_DATA};
use rs_markov_core::StringMarkov;

#[test]
fn learn_empty_string_does_not_add_to_source_lines_or_model() {
	let model = StringMarkov::default();
	assert!(!model.learn(&String::new()));

	assert!(model.source_lines().is_empty());
	assert_eq!(model.total_observations(), 0);
}

#[test]
fn lines_are_added_to_model_on_learn() {
	let model = trained(2);
	assert_eq!(model.corpus_len(), EXAMPLE_DATA.len());
	assert_eq!(sorted(model.source_lines()), sorted(example_lines()));
}

#[test]
fn can_learn_lines_with_trained_model() {
	let model = trained(2);
	assert_eq!(model.learn_all(vec!["I do not like green eggs and hams".to_owned()], true), 1);
	assert_eq!(model.corpus_len(), EXAMPLE_DATA.len() + 1);
}

#[test]
fn learning_duplicate_lines_is_ignored_by_corpus() {
	let model = trained(2);
	let first_pass = model.total_observations();

	assert_eq!(model.learn_all(example_lines(), true), 0);
	assert_eq!(sorted(model.source_lines()), sorted(example_lines()));
	// Re-learning still adds the transitions again
	assert_eq!(model.total_observations(), first_pass * 2);
}

#[test]
fn ignore_flag_does_not_skip_relearning() {
	let model = trained(2);
	let first_pass = model.total_observations();

	model.learn_all(example_lines(), false);
	assert_eq!(model.corpus_len(), EXAMPLE_DATA.len());
	assert_eq!(model.total_observations(), first_pass * 2);
}

#[test]
fn learning_twice_adds_duplicate_transitions_only() {
	let model = StringMarkov::default();
	model.learn(&"Testing the model".to_owned());
	model.learn(&"Testing the model".to_owned());

	assert_eq!(model.source_lines(), vec!["Testing the model".to_owned()]);
	assert_eq!(model.total_observations(), 8);
}

#[test]
fn sentence_smaller_than_level_is_not_added() {
	let model = StringMarkov::with_level(5).unwrap();
	model.learn(&"A short sentence".to_owned());

	assert!(model.source_lines().is_empty());
	assert_eq!(model.store().len(), 0);
}

#[test]
fn concurrent_identical_inputs_keep_one_corpus_entry() {
	let model = StringMarkov::default();
	let batch: Vec<String> = (0..400).map(|i| EXAMPLE_DATA[i % 4].to_owned()).collect();
	let expected: usize = batch.iter().map(|line| line.split(' ').count() + 1).sum();

	assert_eq!(model.learn_all(batch, true), 4);
	assert_eq!(model.corpus_len(), 4);
	assert_eq!(model.total_observations(), expected);
}

#[test]
fn statistics_are_sorted_by_observations() {
	let model = trained(1);
	let stats = model.statistics();
	assert_eq!(stats.len(), model.store().len());
	assert!(stats.windows(2).all(|w| w[0].total() >= w[1].total()));
	for stat in &stats {
		assert!(stat.next.windows(2).all(|w| w[0].probability >= w[1].probability));
		let share: f64 = stat.next.iter().map(|n| n.probability).sum();
		assert!((share - 100.0).abs() < 0.1);
	}
}
