//! Generic Markov chain phrase generation library.
//!
//! This crate provides a Markov chain engine that works over any kind of
//! symbol and sequence, including:
//! - Order-insensitive context keys over a fixed window of previous symbols
//! - A concurrent transition store fed by parallel training
//! - Lazy, bounded, optionally unique generation (walks)
//! - Statistics and goodness-of-fit introspection
//! - Persistence of the corpus only, with the store rebuilt on load
//!
//! Word and character tokenizers are provided; other symbol types plug in
//! through the `Tokenizer` trait.

/// Error and result types shared by the whole crate.
pub mod error;

/// Core Markov chain models, tokenizers and generation logic.
pub mod model;

/// I/O utilities (corpus files, path helpers).
pub mod io;

pub use error::{MarkovError, MarkovResult};
pub use model::markov::{MarkovModel, StringMarkov, SubstringMarkov};
