use std::env;

use rs_markov_core::model::tokenizer::WordTokenizer;
use rs_markov_core::{StringMarkov, SubstringMarkov};

const BUILT_IN_CORPUS: &[&str] = &[
    "The quick brown fox jumps over the lazy dog",
    "The lazy dog sleeps in the warm sun",
    "A quick brown dog runs over the hill",
    "The sun rises over the quiet hill",
    "Every morning the sun warms the lazy town",
    "Every evening the moon rises over the hill",
    "The moon and the sun share the sky",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Train on a text file (one phrase per line) if one is given.
    // A cached .bin snapshot is written next to it for the next run
    let mut model = match env::args().nth(1) {
        Some(path) => StringMarkov::from_corpus_file(WordTokenizer, path, 2)?,
        None => {
            let model = StringMarkov::with_level(2)?;
            model.learn_all(BUILT_IN_CORPUS.iter().map(|s| s.to_string()), true);
            model
        }
    };
    println!("{:?}", model);

    // Generate 5 lines starting from the beginning of a phrase
    for (i, line) in model.walk(5, None)?.enumerate() {
        println!("Generated line {}: {}", i + 1, line);
    }

    // Same with a seed: every line starts with it
    let seed = "The lazy".to_owned();
    for line in model.walk(3, Some(&seed))? {
        println!("Seeded: {}", line);
    }

    // Next word suggestions for the seed, most frequent first
    match model.suggest(&seed) {
        Ok(words) => println!("After '{}': {}", seed, words.join(", ")),
        Err(e) => println!("No suggestion: {}", e),
    }

    // How well known phrases and nonsense fit the chain
    for phrase in ["the lazy dog sleeps", "dog the lazy purple"] {
        let fit = model.get_fit(&phrase.to_owned());
        println!("Fit of '{}': {:.2} ({}/{} windows)", phrase, fit.probability(), fit.matches(), fit.raw.len());
    }

    // The most observed contexts
    for stat in model.statistics().iter().take(3) {
        let next: Vec<String> = stat.next.iter().map(|n| format!("{:?} {}%", n.value, n.probability)).collect();
        println!("{:?} ({} observations) -> {}", stat.state, stat.total(), next.join(", "));
    }

    // Retrain at level 1: same corpus, shorter context
    model.retrain(1)?;
    println!("Level {} model has {} states", model.level(), model.store().len());

    // A character level model invents new words. Unique walks never
    // return a word from the corpus, so fewer may come back
    let mut names = SubstringMarkov::with_level(3)?;
    names.learn_all(["banana", "bandana", "cabana", "savanna", "havana"].map(String::from), true);
    names.set_ensure_unique_walk(true);
    let words: Vec<String> = names.walk(5, None)?.collect();
    println!("New words: {}", words.join(", "));

    Ok(())
}
