/**
 * The command-line user interface for practice sessions.
 *
 * Version: October 2026
 */
use std::collections::BTreeMap;
use std::io::Write;

use colored::*;
use rustyline::DefaultEditor;

use super::common::{DrillError, Result};
use super::iohelper::{self, prettyprint, prettyprint_colored};
use super::scoring::Outcome;

/// What the learner typed at the answer prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Answer(String),
    Hint,
    GiveUp,
}

/// Running totals for one session.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct QuizSummary {
    pub total: usize,
    pub total_correct: usize,
    pub total_partially_correct: usize,
    pub total_incorrect: usize,
}

impl QuizSummary {
    pub fn add(&mut self, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Correct => self.total_correct += 1,
            Outcome::Synonym | Outcome::Hinted { .. } => self.total_partially_correct += 1,
            Outcome::Incorrect | Outcome::GaveUp => self.total_incorrect += 1,
        }
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        100.0 * (self.total_correct as f64 + 0.5 * self.total_partially_correct as f64)
            / self.total as f64
    }
}

pub struct CmdUI {
    number: usize,
    rl: DefaultEditor,
}

impl CmdUI {
    pub fn new() -> Result<Self> {
        Ok(Self {
            number: 0,
            rl: iohelper::editor()?,
        })
    }

    pub fn next(&mut self) {
        self.number += 1;
    }

    pub fn text(&mut self, text: &str) -> Result<()> {
        my_print!("\n")?;
        let prefix = format!("  ({}) ", self.number);
        prettyprint_colored(text, &prefix, None, Some(Color::Cyan))
    }

    /// Read an answer. `?` asks for a hint and `!` or Ctrl+D gives up.
    pub fn prompt(&mut self) -> Result<Input> {
        match iohelper::prompt(&mut self.rl, "> ")? {
            Some(response) => {
                if response == "?" {
                    Ok(Input::Hint)
                } else if response == "!" {
                    Ok(Input::GiveUp)
                } else {
                    Ok(Input::Answer(response))
                }
            }
            None => Ok(Input::GiveUp),
        }
    }

    /// Read one conjugated form. A blank line skips the pronoun and `None` means the
    /// input ended.
    pub fn prompt_form(&mut self, pronoun: &str) -> Result<Option<String>> {
        iohelper::prompt_allow_blank(&mut self.rl, &format!("  {} > ", pronoun))
    }

    pub fn hint(&mut self, hint: &str) -> Result<()> {
        prettyprint(&format!("Hint: {}", hint.yellow()), "")
    }

    pub fn outcome(&mut self, outcome: Outcome, answer: &str) -> Result<()> {
        match outcome {
            Outcome::Correct => prettyprint(&format!("{}", "Correct!".green()), ""),
            Outcome::Synonym => {
                let message = format!(
                    "{} The expected answer was {}.",
                    "Accepted as a synonym.".bright_green(),
                    answer.green(),
                );
                prettyprint(&message, "")
            }
            Outcome::Hinted { .. } => {
                prettyprint(&format!("{}", "Correct, with a hint.".bright_green()), "")
            }
            Outcome::Incorrect | Outcome::GaveUp => {
                let message = format!(
                    "{} The correct answer was {}.",
                    "Incorrect.".red(),
                    answer.green(),
                );
                prettyprint(&message, "")
            }
        }
    }

    pub fn status(&mut self, text: &str) -> Result<()> {
        my_println!("{}", text)
    }

    pub fn warning(&mut self, text: &str) -> Result<()> {
        my_print!("\n")?;
        prettyprint_colored(&format!("Warning: {}", text), "  ", Some(Color::Red), None)?;
        my_print!("\n")
    }

    pub fn verb_header(
        &mut self,
        infinitive: &str,
        translation: &str,
        tense: &str,
        progress: (usize, usize),
    ) -> Result<()> {
        my_print!("\n")?;
        let prefix = format!("  ({}/{}) ", progress.0, progress.1);
        let text = format!("{} ({}), {}", infinitive, translation, tense.cyan());
        prettyprint_colored(&text, &prefix, None, Some(Color::Cyan))
    }

    /// Show each graded pronoun with the expected form.
    pub fn conjugation_results(
        &mut self,
        results: &BTreeMap<String, bool>,
        expected: &BTreeMap<String, String>,
    ) -> Result<()> {
        for (pronoun, correct) in results.iter() {
            let form = expected.get(pronoun).map(String::as_str).unwrap_or("-");
            if *correct {
                my_println!("  {} {} {}", "✓".green(), pronoun, form.green())?;
            } else {
                my_println!("  {} {} {}", "✗".red(), pronoun, form.green())?;
            }
        }
        Ok(())
    }

    pub fn results(&mut self, results: &QuizSummary) -> Result<()> {
        if results.total > 0 {
            let score_as_str = format!("{:.1}%", results.percent());

            my_print!("\n\n")?;
            my_print!("Score: ")?;
            my_print!("{}", score_as_str.cyan())?;
            my_print!(" out of ")?;
            my_print!("{}", format!("{}", results.total).cyan())?;
            if results.total == 1 {
                my_println!(" question")?;
            } else {
                my_println!(" questions")?;
            }
            my_print!("  {}", format!("{}", results.total_correct).green())?;
            my_print!(" correct\n")?;
            if results.total_partially_correct > 0 {
                my_print!(
                    "  {}",
                    format!("{}", results.total_partially_correct).bright_green()
                )?;
                my_print!(" partially correct\n")?;
            }
            my_print!("  {}", format!("{}", results.total_incorrect).red())?;
            my_print!(" incorrect\n")?;
        }
        Ok(())
    }
}

/// Return `true` for errors that should end a session quietly.
pub fn is_interrupt(e: &DrillError) -> bool {
    matches!(e, DrillError::ReadlineInterrupted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_counts_partial_credit_as_half() {
        let mut summary = QuizSummary::default();
        summary.add(Outcome::Correct);
        summary.add(Outcome::Synonym);
        summary.add(Outcome::Hinted {
            level: 1,
            answer_len: 8,
        });
        summary.add(Outcome::GaveUp);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.total_correct, 1);
        assert_eq!(summary.total_partially_correct, 2);
        assert_eq!(summary.total_incorrect, 1);
        assert!((summary.percent() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn empty_summary_scores_zero() {
        assert_eq!(QuizSummary::default().percent(), 0.0);
    }
}
