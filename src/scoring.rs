/**
 * Score updates after a single answer.
 *
 * Scores move multiplicatively: a correct answer shrinks the score, a wrong one grows
 * it by a larger factor so that mistakes resurface sooner than successes fade. Scores
 * are clamped to a floor and a ceiling after every update.
 *
 * Version: October 2026
 */
use serde::{Deserialize, Serialize};

pub const DEFAULT_SCORE: f64 = 1000.0;

/// The result of asking one question.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Correct,
    /// The answer matched one of the listed synonyms rather than the main answer.
    Synonym,
    Incorrect,
    GaveUp,
    /// Answered correctly after `level` characters of the answer were revealed.
    Hinted { level: usize, answer_len: usize },
}

/// Per-learner progress on a single item.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LearnerItemState {
    pub item: i64,
    pub unlocked: bool,
    pub score: f64,
    /// Every scored answer, right or wrong.
    pub attempts: u32,
    pub correct: u32,
}

impl LearnerItemState {
    pub fn new(item: i64) -> Self {
        LearnerItemState {
            item,
            unlocked: true,
            score: DEFAULT_SCORE,
            attempts: 0,
            correct: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScorePolicy {
    pub correct_multiplier: f64,
    pub synonym_multiplier: f64,
    pub incorrect_multiplier: f64,
    pub floor: f64,
    pub ceiling: f64,
    /// Number of hint levels after which a hinted answer earns no credit at all.
    pub max_hint_levels: usize,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        ScorePolicy {
            correct_multiplier: 0.7,
            synonym_multiplier: 0.8,
            incorrect_multiplier: 1.3,
            floor: 20.0,
            ceiling: 100_000.0,
            max_hint_levels: 3,
        }
    }
}

impl ScorePolicy {
    pub fn multiplier(&self, outcome: Outcome) -> f64 {
        match outcome {
            Outcome::Correct => self.correct_multiplier,
            Outcome::Synonym => self.synonym_multiplier,
            Outcome::Incorrect | Outcome::GaveUp => self.incorrect_multiplier,
            Outcome::Hinted { level, answer_len } => self.hint_multiplier(level, answer_len),
        }
    }

    /// Revealing half the answer or more counts as a miss. Below that the credit fades
    /// linearly from the full correct multiplier at level 0 to no change at
    /// `max_hint_levels`.
    fn hint_multiplier(&self, level: usize, answer_len: usize) -> f64 {
        if 2 * level >= answer_len {
            return self.incorrect_multiplier;
        }
        if level >= self.max_hint_levels {
            return 1.0;
        }
        let used = level as f64 / self.max_hint_levels as f64;
        self.correct_multiplier + (1.0 - self.correct_multiplier) * used
    }

    pub fn clamp(&self, score: f64) -> f64 {
        score.max(self.floor).min(self.ceiling)
    }

    /// Apply `outcome` to `state` and return the new score.
    pub fn apply(&self, state: &mut LearnerItemState, outcome: Outcome) -> f64 {
        let multiplier = self.multiplier(outcome);
        state.score = self.clamp(state.score * multiplier);
        state.attempts += 1;
        if multiplier < 1.0 {
            state.correct += 1;
        }
        state.score
    }
}

/// Guards a single question so that only its first scoring event is committed, e.g.
/// when a hint is requested and an answer is submitted for the same question.
#[derive(Debug, Clone, Default)]
pub struct AnswerLatch {
    committed: bool,
}

impl AnswerLatch {
    pub fn new() -> Self {
        AnswerLatch { committed: false }
    }

    /// Return `true` the first time it is called and `false` ever after.
    pub fn commit(&mut self) -> bool {
        if self.committed {
            false
        } else {
            self.committed = true;
            true
        }
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(score: f64) -> LearnerItemState {
        let mut state = LearnerItemState::new(1);
        state.score = score;
        state
    }

    #[test]
    fn correct_answer_shrinks_score() {
        let policy = ScorePolicy::default();
        let mut state = state_with(100.0);
        let score = policy.apply(&mut state, Outcome::Correct);
        assert!((score - 70.0).abs() < 1e-9);
        assert_eq!(state.attempts, 1);
        assert_eq!(state.correct, 1);
    }

    #[test]
    fn correct_answer_is_clamped_to_floor() {
        let policy = ScorePolicy::default();
        let mut state = state_with(25.0);
        assert_eq!(policy.apply(&mut state, Outcome::Correct), 20.0);
    }

    #[test]
    fn repeated_correct_answers_approach_floor_monotonically() {
        let policy = ScorePolicy::default();
        let mut state = LearnerItemState::new(1);
        let mut previous = state.score;
        for _ in 0..50 {
            let score = policy.apply(&mut state, Outcome::Correct);
            assert!(score <= previous);
            assert!(score >= policy.floor);
            previous = score;
        }
        assert_eq!(state.score, policy.floor);
    }

    #[test]
    fn repeated_incorrect_answers_clamp_at_ceiling() {
        let policy = ScorePolicy::default();
        let mut state = LearnerItemState::new(1);
        for _ in 0..100 {
            policy.apply(&mut state, Outcome::Incorrect);
        }
        assert_eq!(state.score, policy.ceiling);
        assert_eq!(state.attempts, 100);
        assert_eq!(state.correct, 0);
    }

    #[test]
    fn giving_up_counts_as_incorrect() {
        let policy = ScorePolicy::default();
        let mut state = state_with(1000.0);
        let score = policy.apply(&mut state, Outcome::GaveUp);
        assert!((score - 1300.0).abs() < 1e-9);
        assert_eq!(state.attempts, 1);
        assert_eq!(state.correct, 0);
    }

    #[test]
    fn synonym_earns_partial_credit() {
        let policy = ScorePolicy::default();
        let mut state = state_with(1000.0);
        let score = policy.apply(&mut state, Outcome::Synonym);
        assert!((score - 800.0).abs() < 1e-9);
        assert_eq!(state.correct, 1);
    }

    #[test]
    fn hints_interpolate_between_correct_and_no_change() {
        let policy = ScorePolicy::default();
        let m = |level| policy.multiplier(Outcome::Hinted { level, answer_len: 20 });
        assert!((m(0) - 0.7).abs() < 1e-9);
        assert!((m(1) - 0.8).abs() < 1e-9);
        assert!((m(2) - 0.9).abs() < 1e-9);
        assert!((m(3) - 1.0).abs() < 1e-9);
        assert!((m(5) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn revealing_half_the_answer_counts_as_incorrect() {
        let policy = ScorePolicy::default();
        assert_eq!(
            policy.multiplier(Outcome::Hinted { level: 2, answer_len: 4 }),
            policy.incorrect_multiplier
        );
        let one_letter = policy.multiplier(Outcome::Hinted { level: 1, answer_len: 3 });
        assert!((one_letter - 0.8).abs() < 1e-9);
    }

    #[test]
    fn hint_with_no_credit_does_not_count_as_correct() {
        let policy = ScorePolicy::default();
        let mut state = state_with(500.0);
        policy.apply(&mut state, Outcome::Hinted { level: 3, answer_len: 10 });
        assert_eq!(state.score, 500.0);
        assert_eq!(state.correct, 0);
        assert_eq!(state.attempts, 1);
    }

    #[test]
    fn latch_commits_once() {
        let mut latch = AnswerLatch::new();
        assert!(!latch.is_committed());
        assert!(latch.commit());
        assert!(!latch.commit());
        assert!(latch.is_committed());
    }
}
