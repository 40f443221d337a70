/**
 * Progress through a practice session. The caller owns these values and passes them to
 * the engines; nothing here touches the database.
 *
 * Version: October 2026
 */
use std::collections::BTreeMap;

use super::scoring::AnswerLatch;

/// One verb in a conjugation session, with its tense scores when the session began.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionVerb {
    pub verb_id: i64,
    pub infinitive: String,
    pub translation: String,
    pub scores: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    NotStarted,
    InProgress {
        current_index: usize,
        queue: Vec<SessionVerb>,
        tenses: Vec<String>,
    },
    Complete,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::NotStarted
    }
}

impl SessionState {
    /// Begin a session over `queue`. An empty queue leaves the session unstarted and
    /// returns `false`.
    pub fn start(&mut self, queue: Vec<SessionVerb>, tenses: Vec<String>) -> bool {
        if queue.is_empty() {
            *self = SessionState::NotStarted;
            return false;
        }
        *self = SessionState::InProgress {
            current_index: 0,
            queue,
            tenses,
        };
        true
    }

    pub fn current(&self) -> Option<&SessionVerb> {
        match self {
            SessionState::InProgress {
                current_index,
                queue,
                ..
            } => queue.get(*current_index),
            _ => None,
        }
    }

    pub fn tenses(&self) -> &[String] {
        match self {
            SessionState::InProgress { tenses, .. } => tenses,
            _ => &[],
        }
    }

    /// `(position, total)` with a one-based position, for progress display.
    pub fn progress(&self) -> Option<(usize, usize)> {
        match self {
            SessionState::InProgress {
                current_index,
                queue,
                ..
            } => Some((current_index + 1, queue.len())),
            _ => None,
        }
    }

    /// Move to the next verb. Returns `true` if this completed the session.
    pub fn advance(&mut self) -> bool {
        let finished = match self {
            SessionState::InProgress {
                current_index,
                queue,
                ..
            } => {
                *current_index += 1;
                *current_index >= queue.len()
            }
            _ => false,
        };
        if finished {
            *self = SessionState::Complete;
        }
        finished
    }

    pub fn is_complete(&self) -> bool {
        *self == SessionState::Complete
    }
}

/// A queue of flashcard items with a latch for the question currently being asked.
#[derive(Debug, Clone, Default)]
pub struct WordSession {
    queue: Vec<i64>,
    index: usize,
    latch: AnswerLatch,
}

impl WordSession {
    pub fn new(queue: Vec<i64>) -> Self {
        WordSession {
            queue,
            index: 0,
            latch: AnswerLatch::new(),
        }
    }

    pub fn current(&self) -> Option<i64> {
        self.queue.get(self.index).copied()
    }

    /// Return `true` if the current question has not been scored yet, and mark it
    /// scored.
    pub fn commit_answer(&mut self) -> bool {
        self.current().is_some() && self.latch.commit()
    }

    /// `true` once the current question has been scored, or when there is none.
    pub fn is_committed(&self) -> bool {
        self.current().is_none() || self.latch.is_committed()
    }

    pub fn advance(&mut self) {
        if self.index < self.queue.len() {
            self.index += 1;
        }
        self.latch = AnswerLatch::new();
    }

    pub fn is_complete(&self) -> bool {
        self.index >= self.queue.len()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
