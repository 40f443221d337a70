/**
 * Practice French and Spanish verbs, words and conjugations from the command line.
 *
 * Version: October 2026
 */
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use colored::*;
use log::info;
use structopt::StructOpt;

use verbdrill::common::{
    Command, ConjugateOptions, DrillError, Options, ProvisionOptions, Result, StatsOptions,
    TakeOptions,
};
use verbdrill::engine::{ConjugationEngine, ItemPracticeEngine, Response};
use verbdrill::persistence::Store;
use verbdrill::quiz::{Direction, PracticeItem, Verb, Word};
use verbdrill::session::SessionState;
use verbdrill::tenses::{Language, Level};
use verbdrill::ui::{self, CmdUI, Input, QuizSummary};
use verbdrill::{my_print, my_println};

// Number of items a learner starts with.
const STARTER_ITEMS: usize = 10;

fn main() {
    env_logger::init();
    let options = Options::from_args();

    if options.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(options) {
        if !ui::is_interrupt(&e) {
            eprintln!("{}: {}", "Error".red(), e);
            ::std::process::exit(2);
        }
    }
}

fn run(options: Options) -> Result<()> {
    let path = match options.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    let store = Store::open(&path)?;
    let learner = options.learner;

    match options.cmd {
        Command::Load(load) => {
            let summary = store.load_dataset_file(&load.path)?;
            my_println!(
                "Loaded {} verbs, {} words and {} conjugations.",
                summary.verbs,
                summary.words,
                summary.conjugations
            )
        }
        Command::Provision(provision) => main_provision(&store, &learner, provision),
        Command::Take(take) => match Deck::parse(&take.deck)? {
            Deck::Verbs => main_take::<Verb>(&store, &learner, &take),
            Deck::Words => main_take::<Word>(&store, &learner, &take),
        },
        Command::Conjugate(conjugate) => main_conjugate(&store, &learner, conjugate),
        Command::Stats(stats) => main_stats(&store, &learner, stats),
    }
}

fn default_db_path() -> Result<PathBuf> {
    let mut path = dirs::data_dir().ok_or(DrillError::NoDataDirectory)?;
    path.push("verbdrill");
    path.push("verbdrill.sqlite3");
    Ok(path)
}

enum Deck {
    Verbs,
    Words,
}

impl Deck {
    fn parse(name: &str) -> Result<Deck> {
        match name {
            "verbs" => Ok(Deck::Verbs),
            "words" => Ok(Deck::Words),
            _ => Err(DrillError::UnknownDeck(name.to_string())),
        }
    }
}

fn main_provision(store: &Store, learner: &str, options: ProvisionOptions) -> Result<()> {
    let unlocked = match Deck::parse(&options.deck)? {
        Deck::Verbs => {
            ItemPracticeEngine::<Verb>::new(store, learner, Direction::Forward)
                .provision(options.count)?
        }
        Deck::Words => {
            ItemPracticeEngine::<Word>::new(store, learner, Direction::Forward)
                .provision(options.count)?
        }
    };
    my_println!("Unlocked {} items.", unlocked)
}

/// The main function for the `take` subcommand.
fn main_take<I: PracticeItem>(store: &Store, learner: &str, options: &TakeOptions) -> Result<()> {
    let direction = if options.flip {
        Direction::Reverse
    } else {
        Direction::Forward
    };
    let engine = ItemPracticeEngine::<I>::new(store, learner, direction);

    if store.learner_states(learner, I::KIND)?.is_empty() {
        let n = engine.provision(STARTER_ITEMS)?;
        info!("first session for {}, unlocked {} starter items", learner, n);
    }
    let unlocked = engine.maybe_unlock()?;
    if unlocked > 0 {
        my_println!("{} new items unlocked!", unlocked)?;
    }

    let mut session = engine.start(options.num_to_ask)?;
    if session.is_empty() {
        return my_println!("Nothing to practice yet. Load a dataset first.");
    }

    let mut ui = CmdUI::new()?;
    let mut summary = QuizSummary::default();
    while let Some(id) = session.current() {
        let item = match engine.item(id)? {
            Some(item) => item,
            None => {
                ui.warning(&format!("item {} is missing from the database", id))?;
                session.advance();
                continue;
            }
        };
        let card = engine.format_prompt_answer(&item);
        ui.next();
        ui.text(&card.prompt)?;

        let mut hints = 0;
        let response = loop {
            match ui.prompt() {
                Ok(Input::Hint) => {
                    hints += 1;
                    ui.hint(&engine.hint(&item, hints))?;
                }
                Ok(Input::GiveUp) => break Response::GiveUp,
                Ok(Input::Answer(answer)) => break Response::Answer(answer),
                Err(DrillError::ReadlineInterrupted) => {
                    return ui.results(&summary);
                }
                Err(e) => return Err(e),
            }
        };

        if let Some(outcome) = engine.answer(&mut session, &item, &response, hints)? {
            ui.outcome(outcome, &card.answer)?;
            summary.add(outcome);
        }
        session.advance();
    }

    ui.results(&summary)
}

/// The main function for the `conjugate` subcommand.
fn main_conjugate(store: &Store, learner: &str, options: ConjugateOptions) -> Result<()> {
    let language: Language = options.language.parse()?;
    let tenses = Level::parse(&options.level, options.tenses)?.tenses(language);
    let engine = ConjugationEngine::new(store, learner, language);

    if store.tense_states(learner, language)?.is_empty() {
        engine.provision(STARTER_ITEMS)?;
    }

    let mut state = SessionState::NotStarted;
    if !engine.start_session(&mut state, tenses, options.num_verbs)? {
        return my_println!("Nothing to practice yet. Load a dataset first.");
    }

    let mut ui = CmdUI::new()?;
    let mut summary = QuizSummary::default();
    while let (Some(verb), Some(progress)) = (state.current().cloned(), state.progress()) {
        let tense = match engine.next_tense(&state)? {
            Some(tense) => tense,
            None => break,
        };
        ui.verb_header(&verb.infinitive, &verb.translation, &tense, progress)?;

        let table = engine.table(verb.verb_id, &[tense.clone()])?;
        let pronouns = table
            .get(&tense)
            .map(|forms| pronoun_order(language, forms))
            .unwrap_or_default();

        let mut answers = BTreeMap::new();
        for pronoun in pronouns.iter() {
            match ui.prompt_form(pronoun) {
                Ok(Some(answer)) => {
                    answers.insert(pronoun.clone(), answer);
                }
                Ok(None) | Err(DrillError::ReadlineInterrupted) => {
                    return ui.results(&summary);
                }
                Err(e) => return Err(e),
            }
        }

        let block = match engine.submit(&mut state, &tense, &answers)? {
            Some(block) => block,
            None => break,
        };
        ui.conjugation_results(&block.results, &block.expected)?;
        for correct in block.results.values() {
            summary.add(if *correct {
                verbdrill::Outcome::Correct
            } else {
                verbdrill::Outcome::Incorrect
            });
        }
        if let Some(score) = block.new_score {
            ui.status(&format!("New {} score: {:.0}", tense, score))?;
        }
        if block.unlocked > 0 {
            ui.status(&format!("{} new verbs unlocked!", block.unlocked))?;
        }
    }

    ui.results(&summary)
}

// Ask in the usual je/tu/il order, then any pronouns the language table doesn't know.
fn pronoun_order(language: Language, forms: &BTreeMap<String, String>) -> Vec<String> {
    let known = language.pronouns();
    let mut pronouns: Vec<String> = known
        .iter()
        .filter(|p| forms.contains_key(**p))
        .map(|p| p.to_string())
        .collect();
    pronouns.extend(
        forms
            .keys()
            .filter(|p| !known.contains(&p.as_str()))
            .cloned(),
    );
    pronouns
}

/// The main function for the `stats` subcommand.
fn main_stats(store: &Store, learner: &str, options: StatsOptions) -> Result<()> {
    match options.deck.as_str() {
        "verbs" => item_stats::<Verb>(store, learner),
        "words" => item_stats::<Word>(store, learner),
        other => {
            let language: Language = other.parse()?;
            let mut states = store.tense_states(learner, language)?;
            states.sort_by(|a, b| {
                b.1.overall_score
                    .partial_cmp(&a.1.overall_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            for (verb_id, map) in states.iter() {
                let verb: Option<Verb> = store.get_item(*verb_id)?;
                let name = verb.map(|v| v.infinitive).unwrap_or_default();
                my_println!(
                    "{:>8.1}  {:>3}/{:<3}  {}",
                    map.overall_score,
                    map.correct,
                    map.attempts,
                    name
                )?;
                for (tense, score) in map.scores.iter() {
                    my_println!("{:>8.1}            {}", score, tense)?;
                }
            }
            Ok(())
        }
    }
}

fn item_stats<I: PracticeItem>(store: &Store, learner: &str) -> Result<()> {
    let mut states = store.learner_states(learner, I::KIND)?;
    if states.is_empty() {
        return my_println!("No items unlocked.");
    }
    states.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for state in states.iter() {
        let item: Option<I> = store.get_item(state.item)?;
        let text = item.map(|i| i.text().to_string()).unwrap_or_default();
        my_print!("{:>8.1}  ", state.score)?;
        my_println!("{:>3}/{:<3}  {}", state.correct, state.attempts, text)?;
    }
    Ok(())
}
