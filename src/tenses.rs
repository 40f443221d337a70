/**
 * Per-tense scores for conjugation practice.
 *
 * Each (learner, verb, language) keeps one score per tense. A block of answers for one
 * tense (one answer per pronoun) moves that tense's score by the average of the
 * per-pronoun multipliers, and the verb's overall score is the plain mean of its tense
 * scores.
 *
 * Version: October 2026
 */
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::DrillError;
use super::scoring::DEFAULT_SCORE;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    French,
    Spanish,
}

impl Language {
    /// The two-letter code used in the dataset and the database.
    pub fn code(self) -> &'static str {
        match self {
            Language::French => "FR",
            Language::Spanish => "ES",
        }
    }

    pub fn pronouns(self) -> &'static [&'static str] {
        match self {
            Language::French => &["je", "tu", "il (elle, on)", "nous", "vous", "ils (elles)"],
            Language::Spanish => &["yo", "tú", "él/ella", "nosotros", "vosotros", "ellos/ellas"],
        }
    }
}

impl FromStr for Language {
    type Err = DrillError;

    fn from_str(s: &str) -> Result<Self, DrillError> {
        match s.to_lowercase().as_str() {
            "fr" | "french" => Ok(Language::French),
            "es" | "spanish" => Ok(Language::Spanish),
            _ => Err(DrillError::UnknownLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Difficulty levels. Each level also includes the tenses of the levels below it.
#[derive(Debug, Clone, PartialEq)]
pub enum Level {
    Easy,
    Medium,
    Hard,
    Custom(Vec<String>),
}

// Tense names must match the dataset exactly, accents and capitals included.
const FRENCH_TENSES: [&[&str]; 3] = [
    &["présent", "futur", "Passé composé"],
    &["imparfait", "Conditionnel présent", "Impératif"],
    &["Subjonctif présent", "passé simple", "Subjonctif imparfait"],
];

const SPANISH_TENSES: [&[&str]; 3] = [
    &["Presente", "Futuro", "pretérito perfecto compuesto"],
    &["Imperfecto", "Condicional", "Imperativo", "futuro perfecto"],
    &[
        "Subjuntivo presente",
        "Pretérito indefinido",
        "pretérito pluscuamperfecto",
    ],
];

impl Level {
    pub fn parse(name: &str, custom: Vec<String>) -> Result<Self, DrillError> {
        match name.to_lowercase().as_str() {
            "easy" => Ok(Level::Easy),
            "medium" => Ok(Level::Medium),
            "hard" => Ok(Level::Hard),
            "custom" if custom.is_empty() => Err(DrillError::NoTensesSelected),
            "custom" => Ok(Level::Custom(custom)),
            _ => Err(DrillError::UnknownLevel(name.to_string())),
        }
    }

    pub fn tenses(&self, language: Language) -> Vec<String> {
        let table = match language {
            Language::French => &FRENCH_TENSES,
            Language::Spanish => &SPANISH_TENSES,
        };
        let depth = match self {
            Level::Easy => 1,
            Level::Medium => 2,
            Level::Hard => 3,
            Level::Custom(tenses) => return tenses.clone(),
        };
        table[..depth]
            .iter()
            .flat_map(|group| group.iter().map(|t| t.to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TensePolicy {
    pub correct_multiplier: f64,
    pub incorrect_multiplier: f64,
    pub floor: f64,
    pub ceiling: f64,
}

/// When to admit new items into a learner's pool.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlockPolicy {
    /// Unlock when the worst `window` practiced items average below this score.
    pub threshold: f64,
    pub window: usize,
    /// How many items to admit at once.
    pub batch: usize,
}

impl Default for UnlockPolicy {
    fn default() -> Self {
        UnlockPolicy {
            threshold: 700.0,
            window: 5,
            batch: 3,
        }
    }
}

impl Default for TensePolicy {
    fn default() -> Self {
        TensePolicy {
            correct_multiplier: 0.7,
            incorrect_multiplier: 1.5,
            floor: 20.0,
            ceiling: 100_000.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TenseScoreMap {
    pub scores: BTreeMap<String, f64>,
    pub overall_score: f64,
    pub attempts: u32,
    pub correct: u32,
    pub last_practiced: Option<DateTime<Utc>>,
}

impl Default for TenseScoreMap {
    fn default() -> Self {
        TenseScoreMap {
            scores: BTreeMap::new(),
            overall_score: DEFAULT_SCORE,
            attempts: 0,
            correct: 0,
            last_practiced: None,
        }
    }
}

impl TenseScoreMap {
    /// Score for `tense`, or the default if it has never been practiced.
    pub fn score(&self, tense: &str) -> f64 {
        self.scores.get(tense).copied().unwrap_or(DEFAULT_SCORE)
    }

    /// Mean score over `tenses`, counting untracked tenses at the default.
    pub fn selection_score(&self, tenses: &[String]) -> f64 {
        if tenses.is_empty() {
            return self.overall_score;
        }
        tenses.iter().map(|t| self.score(t)).sum::<f64>() / tenses.len() as f64
    }

    fn recompute_overall(&mut self) {
        if !self.scores.is_empty() {
            self.overall_score = self.scores.values().sum::<f64>() / self.scores.len() as f64;
        }
    }

    pub fn is_practiced(&self) -> bool {
        self.attempts > 0
    }
}

/// Apply a block of per-pronoun results for `tense` and return the tense's new score.
/// An empty block leaves `map` untouched and returns `None`.
pub fn update_tense(
    map: &mut TenseScoreMap,
    tense: &str,
    pronoun_results: &BTreeMap<String, bool>,
    policy: &TensePolicy,
    now: DateTime<Utc>,
) -> Option<f64> {
    if pronoun_results.is_empty() {
        return None;
    }

    let total = pronoun_results.len();
    let correct = pronoun_results.values().filter(|ok| **ok).count();
    let multiplier = pronoun_results
        .values()
        .map(|ok| {
            if *ok {
                policy.correct_multiplier
            } else {
                policy.incorrect_multiplier
            }
        })
        .sum::<f64>()
        / total as f64;

    let updated = (map.score(tense) * multiplier)
        .max(policy.floor)
        .min(policy.ceiling);
    map.scores.insert(tense.to_string(), updated);
    map.recompute_overall();
    map.attempts += total as u32;
    map.correct += correct as u32;
    map.last_practiced = Some(now);
    Some(updated)
}

/// Decide whether new items should be unlocked, given the overall scores of every item
/// the learner has practiced at least once.
pub fn should_unlock(practiced_scores: &[f64], policy: &UnlockPolicy) -> bool {
    if policy.window == 0 || practiced_scores.len() < policy.window {
        return false;
    }
    let mut worst = practiced_scores.to_vec();
    worst.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    worst.truncate(policy.window);
    let average = worst.iter().sum::<f64>() / worst.len() as f64;
    average < policy.threshold
}

/// Compare answers against the expected forms, keyed by pronoun. Blank answers are not
/// graded.
pub fn grade_conjugations(
    answers: &BTreeMap<String, String>,
    expected: &BTreeMap<String, String>,
) -> BTreeMap<String, bool> {
    let mut results = BTreeMap::new();
    for (pronoun, answer) in answers.iter() {
        let answer = answer.trim();
        if answer.is_empty() {
            continue;
        }
        let correct = expected
            .get(pronoun)
            .map(|form| form.trim().to_lowercase() == answer.to_lowercase())
            .unwrap_or(false);
        results.insert(pronoun.clone(), correct);
    }
    results
}

/// A conjugation table with `-` for every pronoun, for tenses missing from the dataset.
pub fn placeholder_table(language: Language) -> BTreeMap<String, String> {
    language
        .pronouns()
        .iter()
        .map(|p| (p.to_string(), String::from("-")))
        .collect()
}
