//! Top-level module for the Markov chain engine.
//!
//! This module provides:
//! - Order-insensitive context keys (`ContextKey`)
//! - The concurrent transition store and its statistics (`TransitionStore`)
//! - Pluggable next-gram selection (`UnigramSelector`)
//! - Tokenizers turning phrases into grams and back (`Tokenizer`)
//! - The model itself: learning, retraining, walking, introspection (`MarkovModel`)
//! - Persistence of the corpus (`ModelSnapshot`)

/// Configuration of a model (level, uniqueness, selection, walk bounds).
pub mod config;

/// Composite key over the grams preceding a position.
pub mod context_key;

/// Learned phrases, deduplicated. Not exposed.
mod corpus;

/// Goodness of fit of a phrase against a model.
pub mod fit;

/// The generic Markov model.
pub mod markov;

/// Snapshot save/load; the store is always recomputed.
pub mod persistence;

/// Strategies picking the next gram during a walk.
pub mod selector;

/// Mapping from context keys to observed follow-up grams.
pub mod store;

/// Phrase/gram conversion capability and the provided tokenizers.
pub mod tokenizer;

/// Lazy iterator over generated phrases.
pub mod walk;
