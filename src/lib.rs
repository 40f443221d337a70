/**
 * Spaced-repetition practice for French and Spanish verbs, vocabulary and
 * conjugations.
 *
 * Version: October 2026
 */
#[macro_use]
pub mod iohelper;
pub mod common;
pub mod engine;
pub mod persistence;
pub mod quiz;
pub mod repetition;
pub mod scoring;
pub mod session;
pub mod tenses;
pub mod ui;

pub use common::{DrillError, Result};
pub use engine::{BlockResult, ConjugationEngine, ItemPracticeEngine, Response};
pub use persistence::{Dataset, Store};
pub use quiz::{normalize_and_compare, Direction, PracticeItem, Verb, Word};
pub use scoring::{LearnerItemState, Outcome, ScorePolicy};
pub use session::{SessionState, WordSession};
pub use tenses::{Language, Level, TensePolicy, TenseScoreMap, UnlockPolicy};
