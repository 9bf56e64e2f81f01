#![allow(dead_code)]

use rs_markov_core::StringMarkov;

/// Small training corpus with shared words so walks can branch.
pub const EXAMPLE_DATA: &[&str] = &[
	"This is a line of example text",
	"This is another line of training data",
	"The quick brown fox jumps over the lazy dog",
	"The lazy dog sleeps in the warm sun",
	"A quick brown dog runs over the hill",
	"The sun rises over the quiet hill",
	"I do not like green eggs and ham",
	"I do not like them in a house",
	"I do not like them with a mouse",
	"She sells sea shells by the sea shore",
	"The shells she sells are sea shells for sure",
	"We were prepared for the great ordeal of meeting me",
	"They were not prepared for the great storm",
	"The great storm rolled over the quiet town",
	"A line of trees stood over the quiet town",
	"The dog and the fox are friends in the story",
	"In the story the fox runs and the dog sleeps",
	"Every morning the sun warms the lazy town",
	"Every evening the moon rises over the hill",
	"The moon and the sun share the sky",
];

pub fn example_lines() -> Vec<String> {
	EXAMPLE_DATA.iter().map(|s| s.to_string()).collect()
}

/// Word model at `level` trained on the example corpus.
pub fn trained(level: usize) -> StringMarkov {
	let model = StringMarkov::with_level(level).unwrap();
	model.learn_all(example_lines(), true);
	model
}

pub fn sorted(mut lines: Vec<String>) -> Vec<String> {
	lines.sort();
	lines
}
