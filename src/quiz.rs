/**
 * Practice items and how their answers are checked.
 *
 * Version: October 2026
 */
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::scoring::Outcome;

/// Anything that can be asked as a two-sided flashcard.
pub trait PracticeItem {
    /// Tag that separates this kind of item from others in the `items` table.
    const KIND: &'static str;

    fn id(&self) -> i64;
    /// The French or Spanish side.
    fn text(&self) -> &str;
    fn translation(&self) -> &str;
    /// Comma-separated alternatives accepted with reduced credit for `text`.
    fn text_synonyms(&self) -> &str {
        ""
    }
    fn translation_synonyms(&self) -> &str {
        ""
    }

    fn from_parts(
        id: i64,
        text: String,
        translation: String,
        text_synonyms: String,
        translation_synonyms: String,
    ) -> Self;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Verb {
    #[serde(default)]
    pub id: i64,
    pub infinitive: String,
    pub translation: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Word {
    #[serde(default)]
    pub id: i64,
    pub word: String,
    pub translation: String,
    #[serde(default)]
    pub word_synonyms: String,
    #[serde(default)]
    pub translation_synonyms: String,
}

impl PracticeItem for Verb {
    const KIND: &'static str = "verb";

    fn id(&self) -> i64 {
        self.id
    }

    fn text(&self) -> &str {
        &self.infinitive
    }

    fn translation(&self) -> &str {
        &self.translation
    }

    fn from_parts(id: i64, text: String, translation: String, _: String, _: String) -> Self {
        Verb {
            id,
            infinitive: text,
            translation,
        }
    }
}

impl PracticeItem for Word {
    const KIND: &'static str = "word";

    fn id(&self) -> i64 {
        self.id
    }

    fn text(&self) -> &str {
        &self.word
    }

    fn translation(&self) -> &str {
        &self.translation
    }

    fn text_synonyms(&self) -> &str {
        &self.word_synonyms
    }

    fn translation_synonyms(&self) -> &str {
        &self.translation_synonyms
    }

    fn from_parts(
        id: i64,
        text: String,
        translation: String,
        text_synonyms: String,
        translation_synonyms: String,
    ) -> Self {
        Word {
            id,
            word: text,
            translation,
            word_synonyms: text_synonyms,
            translation_synonyms,
        }
    }
}

/// Which side of the card is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Show the French/Spanish text, expect the translation.
    Forward,
    Reverse,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptAnswer {
    pub prompt: String,
    pub answer: String,
    pub synonyms: String,
}

pub fn format_prompt_answer<I: PracticeItem>(item: &I, direction: Direction) -> PromptAnswer {
    match direction {
        Direction::Forward => PromptAnswer {
            prompt: item.text().to_string(),
            answer: item.translation().to_string(),
            synonyms: item.translation_synonyms().to_string(),
        },
        Direction::Reverse => PromptAnswer {
            prompt: item.translation().to_string(),
            answer: item.text().to_string(),
            synonyms: item.text_synonyms().to_string(),
        },
    }
}

/// Lowercase, trim and strip diacritics.
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
}

fn alternatives(text: &str) -> Vec<String> {
    text.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(normalize)
        .collect()
}

/// Return `true` if `answer` matches `expected`, ignoring case and accents. Either side
/// may list comma-separated alternatives, and any shared alternative is a match.
pub fn normalize_and_compare(answer: &str, expected: &str) -> bool {
    let expected = alternatives(expected);
    if expected.is_empty() {
        return false;
    }
    let whole = normalize(answer);
    if expected.contains(&whole) {
        return true;
    }
    alternatives(answer).iter().any(|a| expected.contains(a))
}

/// Grade a typed answer against the main answer and its synonyms.
pub fn grade(answer: &str, expected: &str, synonyms: &str) -> Outcome {
    if normalize_and_compare(answer, expected) {
        Outcome::Correct
    } else if normalize_and_compare(answer, synonyms) {
        Outcome::Synonym
    } else {
        Outcome::Incorrect
    }
}

/// The alternative of `target` that hints reveal: the first one in the list.
pub fn hint_target(target: &str) -> &str {
    target.trim().split(',').next().unwrap_or("").trim()
}

/// The first `level` characters of the first alternative of `target`.
pub fn hint(target: &str, level: usize) -> String {
    hint_target(target).chars().take(level).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word() -> Word {
        Word {
            id: 1,
            word: String::from("la voiture"),
            translation: String::from("el coche"),
            word_synonyms: String::from("l'auto"),
            translation_synonyms: String::from("el carro, el auto"),
        }
    }

    #[test]
    fn comparison_ignores_case_and_accents() {
        assert!(normalize_and_compare("José", "jose"));
        assert!(normalize_and_compare("  ÉTÉ ", "été"));
        assert!(normalize_and_compare("garçon", "garcon"));
        assert!(!normalize_and_compare("jose", "josefa"));
    }

    #[test]
    fn comparison_accepts_comma_alternatives() {
        assert!(normalize_and_compare("aller, s'en aller", "s'en aller"));
        assert!(normalize_and_compare("s'en aller", "aller, s'en aller"));
        assert!(normalize_and_compare("aller", "aller, s'en aller"));
        assert!(!normalize_and_compare("venir", "aller, s'en aller"));
    }

    #[test]
    fn blank_expected_never_matches() {
        assert!(!normalize_and_compare("", ""));
        assert!(!normalize_and_compare("quelque chose", " , "));
    }

    #[test]
    fn grade_distinguishes_synonyms() {
        let card = format_prompt_answer(&word(), Direction::Forward);
        assert_eq!(grade("El coche", &card.answer, &card.synonyms), Outcome::Correct);
        assert_eq!(grade("el carro", &card.answer, &card.synonyms), Outcome::Synonym);
        assert_eq!(grade("la moto", &card.answer, &card.synonyms), Outcome::Incorrect);
    }

    #[test]
    fn directions_swap_sides() {
        let forward = format_prompt_answer(&word(), Direction::Forward);
        assert_eq!(forward.prompt, "la voiture");
        assert_eq!(forward.answer, "el coche");

        let reverse = format_prompt_answer(&word(), Direction::Reverse);
        assert_eq!(reverse.prompt, "el coche");
        assert_eq!(reverse.answer, "la voiture");
        assert_eq!(reverse.synonyms, "l'auto");
    }

    #[test]
    fn verbs_have_no_synonyms() {
        let verb = Verb {
            id: 3,
            infinitive: String::from("être"),
            translation: String::from("ser, estar"),
        };
        let card = format_prompt_answer(&verb, Direction::Forward);
        assert_eq!(card.synonyms, "");
        assert_eq!(grade("estar", &card.answer, &card.synonyms), Outcome::Correct);
    }

    #[test]
    fn hint_reveals_prefix_of_first_alternative() {
        assert_eq!(hint("ser, estar", 2), "se");
        assert_eq!(hint("été", 2), "ét");
        assert_eq!(hint("oui", 10), "oui");
        assert_eq!(hint("oui", 0), "");
        assert_eq!(hint_target(" ser, estar"), "ser");
        assert_eq!(hint_target("avoir"), "avoir");
    }
}
