//! Thread reply classification
//!
//! Decides whether the last message of a mail thread still needs a human
//! reply, and from which side. Pure and deterministic: no I/O, no clock, no
//! shared mutable state. The heuristics are best-effort substring matching
//! over a multilingual (English, German, Dutch) rule set.

mod classifier;
mod rules;
mod text;
mod thread;
mod verdict;

use once_cell::sync::Lazy;

pub use classifier::{ThreadClassifier, DEFAULT_SENT_LABEL};
pub use rules::{ClassifierRules, IgnoreRule, KeywordSets, RulesError};
pub use thread::{MessageRef, Thread, ThreadId};
pub use verdict::{ClassificationVerdict, Direction, Explanation, SuppressionReason};

static DEFAULT_CLASSIFIER: Lazy<ThreadClassifier> = Lazy::new(ThreadClassifier::default);

/// Classify with the built-in rule set and the `SENT` label.
pub fn classify(thread: &Thread) -> ClassificationVerdict {
    DEFAULT_CLASSIFIER.classify(thread)
}
