/**
 * The practice engines: the operations a front end calls to build a quiz, score
 * answers and unlock new material for one learner.
 *
 * `ItemPracticeEngine` serves any flashcard-style item (verbs, words). The
 * `ConjugationEngine` drills whole tenses of a verb and keeps one score per tense.
 *
 * Version: October 2026
 */
use std::collections::BTreeMap;
use std::marker::PhantomData;

use chrono::Utc;
use log::{debug, info};
use rand::Rng;

use super::common::Result;
use super::persistence::Store;
use super::quiz::{self, Direction, PracticeItem, PromptAnswer};
use super::repetition;
use super::scoring::{Outcome, ScorePolicy, DEFAULT_SCORE};
use super::session::{SessionState, SessionVerb, WordSession};
use super::tenses::{self, Language, TensePolicy, UnlockPolicy};

/// A learner's response to one flashcard.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Answer(String),
    GiveUp,
}

pub struct ItemPracticeEngine<'a, I: PracticeItem> {
    store: &'a Store,
    learner: String,
    direction: Direction,
    pub policy: ScorePolicy,
    pub unlock: UnlockPolicy,
    kind: PhantomData<I>,
}

impl<'a, I: PracticeItem> ItemPracticeEngine<'a, I> {
    pub fn new(store: &'a Store, learner: &str, direction: Direction) -> Self {
        ItemPracticeEngine {
            store,
            learner: learner.to_string(),
            direction,
            policy: ScorePolicy::default(),
            unlock: UnlockPolicy::default(),
            kind: PhantomData,
        }
    }

    /// Unlock the first `count` items by id. Safe to call more than once.
    pub fn provision(&self, count: usize) -> Result<usize> {
        self.store.provision_items(&self.learner, I::KIND, count)
    }

    pub fn select(&self, count: usize) -> Result<Vec<i64>> {
        let pool = self.store.unlocked_pool(&self.learner, I::KIND)?;
        Ok(repetition::select_with_thread_rng(&pool, count))
    }

    pub fn select_with<R: Rng>(&self, count: usize, rng: &mut R) -> Result<Vec<i64>> {
        let pool = self.store.unlocked_pool(&self.learner, I::KIND)?;
        Ok(repetition::select(&pool, count, rng))
    }

    /// Start a quiz of up to `count` items. The session is empty when nothing is
    /// unlocked yet.
    pub fn start(&self, count: usize) -> Result<WordSession> {
        let queue = self.select(count)?;
        debug!("{} {} items chosen for {}", queue.len(), I::KIND, self.learner);
        Ok(WordSession::new(queue))
    }

    pub fn item(&self, id: i64) -> Result<Option<I>> {
        self.store.get_item(id)
    }

    pub fn format_prompt_answer(&self, item: &I) -> PromptAnswer {
        quiz::format_prompt_answer(item, self.direction)
    }

    pub fn check(&self, item: &I, answer: &str) -> Outcome {
        let card = self.format_prompt_answer(item);
        quiz::grade(answer, &card.answer, &card.synonyms)
    }

    pub fn hint(&self, item: &I, level: usize) -> String {
        quiz::hint(&self.format_prompt_answer(item).answer, level)
    }

    /// Apply `outcome` to the learner's record for `item_id` and return the new score.
    pub fn record_outcome(&self, item_id: i64, outcome: Outcome) -> Result<f64> {
        let policy = &self.policy;
        let score = self
            .store
            .update_state(&self.learner, item_id, |state| policy.apply(state, outcome))?;
        debug!(
            "{}: item {} scored {:?}, new score {:.1}",
            self.learner, item_id, outcome, score
        );
        Ok(score)
    }

    /// Grade `response` to the current question of `session` and record it, unless the
    /// question was already scored. `hints_used` is the number of characters revealed,
    /// counted against the first alternative of the answer. The question is only
    /// latched once the score is saved.
    pub fn answer(
        &self,
        session: &mut WordSession,
        item: &I,
        response: &Response,
        hints_used: usize,
    ) -> Result<Option<Outcome>> {
        let outcome = match response {
            Response::GiveUp => Outcome::GaveUp,
            Response::Answer(text) => match self.check(item, text) {
                Outcome::Correct | Outcome::Synonym if hints_used > 0 => Outcome::Hinted {
                    level: hints_used,
                    answer_len: quiz::hint_target(&self.format_prompt_answer(item).answer)
                        .chars()
                        .count(),
                },
                other => other,
            },
        };
        if session.is_committed() {
            return Ok(None);
        }
        self.record_outcome(item.id(), outcome)?;
        session.commit_answer();
        Ok(Some(outcome))
    }

    /// Unlock a batch of new items if the learner's weakest practiced items are strong
    /// enough. Returns how many were unlocked.
    pub fn maybe_unlock(&self) -> Result<usize> {
        let practiced = self.store.practiced_scores(&self.learner, I::KIND)?;
        if !tenses::should_unlock(&practiced, &self.unlock) {
            return Ok(0);
        }
        let unlocked = self
            .store
            .unlock_next_items(&self.learner, I::KIND, self.unlock.batch)?;
        if unlocked > 0 {
            info!("unlocked {} new {} items for {}", unlocked, I::KIND, self.learner);
        }
        Ok(unlocked)
    }
}

/// Outcome of submitting one tense block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockResult {
    pub results: BTreeMap<String, bool>,
    pub expected: BTreeMap<String, String>,
    pub new_score: Option<f64>,
    pub session_complete: bool,
    pub unlocked: usize,
}

impl BlockResult {
    pub fn correct(&self) -> usize {
        self.results.values().filter(|ok| **ok).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }
}

pub struct ConjugationEngine<'a> {
    store: &'a Store,
    learner: String,
    language: Language,
    pub policy: TensePolicy,
    pub unlock: UnlockPolicy,
}

impl<'a> ConjugationEngine<'a> {
    pub fn new(store: &'a Store, learner: &str, language: Language) -> Self {
        ConjugationEngine {
            store,
            learner: learner.to_string(),
            language,
            policy: TensePolicy::default(),
            unlock: UnlockPolicy::default(),
        }
    }

    pub fn provision(&self, count: usize) -> Result<usize> {
        self.store
            .provision_conjugations(&self.learner, self.language, count)
    }

    pub fn record_tense_outcome(
        &self,
        verb: i64,
        tense: &str,
        pronoun_results: &BTreeMap<String, bool>,
    ) -> Result<Option<f64>> {
        let policy = &self.policy;
        let score = self
            .store
            .update_tense_state(&self.learner, verb, self.language, |map| {
                tenses::update_tense(map, tense, pronoun_results, policy, Utc::now())
            })?;
        if let Some(score) = score {
            debug!(
                "{}: verb {} {} scored {}/{}, new score {:.1}",
                self.learner,
                verb,
                tense,
                pronoun_results.values().filter(|ok| **ok).count(),
                pronoun_results.len(),
                score
            );
        }
        Ok(score)
    }

    pub fn maybe_unlock(&self) -> Result<usize> {
        let practiced: Vec<f64> = self
            .store
            .tense_states(&self.learner, self.language)?
            .into_iter()
            .filter(|(_, map)| map.is_practiced())
            .map(|(_, map)| map.overall_score)
            .collect();
        if !tenses::should_unlock(&practiced, &self.unlock) {
            return Ok(0);
        }
        let unlocked = self.store.unlock_next_conjugation_verbs(
            &self.learner,
            self.language,
            self.unlock.batch,
        )?;
        if unlocked > 0 {
            info!(
                "unlocked {} new {} verbs for {}",
                unlocked, self.language, self.learner
            );
        }
        Ok(unlocked)
    }

    /// Run the unlock check and fill `state` with up to `count` verbs, weighted by the
    /// mean of their scores over `tenses`. Returns `false` if there is nothing to
    /// practice.
    pub fn start_session(
        &self,
        state: &mut SessionState,
        tenses: Vec<String>,
        count: usize,
    ) -> Result<bool> {
        self.maybe_unlock()?;
        let states = self.store.tense_states(&self.learner, self.language)?;
        let pool: Vec<(i64, f64)> = states
            .iter()
            .map(|(verb, map)| (*verb, map.selection_score(&tenses)))
            .collect();
        let chosen = repetition::select_with_thread_rng(&pool, count);

        let mut queue = Vec::new();
        for verb_id in chosen {
            let verb: Option<quiz::Verb> = self.store.get_item(verb_id)?;
            let map = states.iter().find(|(id, _)| *id == verb_id).map(|(_, m)| m);
            if let (Some(verb), Some(map)) = (verb, map) {
                queue.push(SessionVerb {
                    verb_id,
                    infinitive: verb.infinitive,
                    translation: verb.translation,
                    scores: tenses.iter().map(|t| (t.clone(), map.score(t))).collect(),
                });
            }
        }
        info!(
            "{} session for {}: {} verbs over {} tenses",
            self.language,
            self.learner,
            queue.len(),
            tenses.len()
        );
        Ok(state.start(queue, tenses))
    }

    /// Pick the tense to drill for the current verb, weighted toward its weakest tense.
    /// Tenses the dataset has no forms for are only offered when nothing else is left.
    pub fn next_tense(&self, state: &SessionState) -> Result<Option<String>> {
        let verb = match state.current() {
            Some(verb) => verb,
            None => return Ok(None),
        };
        let mut available = Vec::new();
        for tense in state.tenses().iter() {
            if !self
                .store
                .conjugation_forms(verb.verb_id, self.language, tense)?
                .is_empty()
            {
                available.push(tense.clone());
            }
        }
        if available.is_empty() {
            debug!("no forms for verb {} in any selected tense", verb.verb_id);
            available = state.tenses().to_vec();
        }
        let pool: Vec<(String, f64)> = available
            .into_iter()
            .map(|t| {
                let score = verb.scores.get(&t).copied().unwrap_or(DEFAULT_SCORE);
                (t, score)
            })
            .collect();
        Ok(repetition::select_with_thread_rng(&pool, 1).pop())
    }

    /// Full conjugation tables for `verb`, with `-` for tenses missing from the dataset.
    pub fn table(
        &self,
        verb: i64,
        tenses: &[String],
    ) -> Result<BTreeMap<String, BTreeMap<String, String>>> {
        let mut table = BTreeMap::new();
        for tense in tenses.iter() {
            let forms = self.store.conjugation_forms(verb, self.language, tense)?;
            let forms = if forms.is_empty() {
                tenses::placeholder_table(self.language)
            } else {
                forms
            };
            table.insert(tense.clone(), forms);
        }
        Ok(table)
    }

    /// Grade `answers` for the current verb in `tense`, record the result and move the
    /// session on. A tense with no forms in the dataset is not scored. The unlock check
    /// runs again when this completes the session.
    pub fn submit(
        &self,
        state: &mut SessionState,
        tense: &str,
        answers: &BTreeMap<String, String>,
    ) -> Result<Option<BlockResult>> {
        let verb_id = match state.current() {
            Some(verb) => verb.verb_id,
            None => return Ok(None),
        };
        let expected = self.store.conjugation_forms(verb_id, self.language, tense)?;
        // Nothing to grade against, so the tense score stays put.
        let results = if expected.is_empty() {
            BTreeMap::new()
        } else {
            tenses::grade_conjugations(answers, &expected)
        };
        let new_score = self.record_tense_outcome(verb_id, tense, &results)?;

        let session_complete = state.advance();
        let unlocked = if session_complete {
            self.maybe_unlock()?
        } else {
            0
        };
        Ok(Some(BlockResult {
            results,
            expected,
            new_score,
            session_complete,
            unlocked,
        }))
    }
}
