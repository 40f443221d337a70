/**
 * Definitions of data structures used by several modules, such as `DrillError` and the
 * various structs that hold command-line arguments.
 *
 * Version: October 2026
 */
use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use structopt::StructOpt;

pub type Result<T> = ::std::result::Result<T, DrillError>;

#[derive(Debug)]
pub enum DrillError {
    /// For when a score update names a (learner, item) pair that was never provisioned.
    RecordNotFound { learner: String, item: i64 },
    /// For when the dataset refers to a verb that does not exist.
    UnknownVerb(String),
    UnknownLanguage(String),
    UnknownLevel(String),
    UnknownDeck(String),
    /// A custom level was requested without any tenses.
    NoTensesSelected,
    Sql(rusqlite::Error),
    /// For JSON errors.
    Json(serde_json::Error),
    Io(io::Error),
    NoDataDirectory,
    ReadlineInterrupted,
}

impl fmt::Display for DrillError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DrillError::RecordNotFound { ref learner, item } => {
                write!(f, "learner '{}' has no record for item {}", learner, item)
            }
            DrillError::UnknownVerb(ref infinitive) => {
                write!(f, "no verb with infinitive '{}'", infinitive)
            }
            DrillError::UnknownLanguage(ref code) => {
                write!(f, "unknown language '{}' (expected 'fr' or 'es')", code)
            }
            DrillError::UnknownLevel(ref level) => {
                write!(
                    f,
                    "unknown level '{}' (expected easy, medium, hard or custom)",
                    level
                )
            }
            DrillError::UnknownDeck(ref deck) => {
                write!(f, "unknown deck '{}' (expected verbs or words)", deck)
            }
            DrillError::NoTensesSelected => {
                write!(f, "select at least one tense for a custom level")
            }
            DrillError::Sql(ref err) => write!(f, "database error ({})", err),
            DrillError::Json(ref err) => write!(f, "could not parse JSON ({})", err),
            DrillError::Io(ref err) => write!(f, "IO error ({})", err),
            DrillError::NoDataDirectory => {
                write!(f, "could not locate a data directory, pass --db explicitly")
            }
            DrillError::ReadlineInterrupted => Ok(()),
        }
    }
}

impl error::Error for DrillError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            DrillError::Sql(ref err) => Some(err),
            DrillError::Json(ref err) => Some(err),
            DrillError::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

/// Holds the command-line configuration for the application.
#[derive(StructOpt)]
#[structopt(name = "verbdrill", about = "Practice French and Spanish from the command line.")]
pub struct Options {
    /// Path to the SQLite database. Defaults to a file in the user's data directory.
    #[structopt(long = "db", parse(from_os_str))]
    pub db: Option<PathBuf>,
    /// Name of the learner whose progress is read and written.
    #[structopt(short = "u", long = "learner", default_value = "default")]
    pub learner: String,
    /// Do not emit colorized output.
    #[structopt(long = "no-color")]
    pub no_color: bool,
    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Load verbs, words and conjugations from a JSON dataset.
    #[structopt(name = "load")]
    Load(LoadOptions),
    /// Unlock the starter set of items for the learner.
    #[structopt(name = "provision")]
    Provision(ProvisionOptions),
    /// Practice verb infinitives or vocabulary words.
    #[structopt(name = "take")]
    Take(TakeOptions),
    /// Practice verb conjugations.
    #[structopt(name = "conjugate")]
    Conjugate(ConjugateOptions),
    /// Show the learner's scores.
    #[structopt(name = "stats")]
    Stats(StatsOptions),
}

#[derive(StructOpt)]
pub struct LoadOptions {
    /// Path to the dataset file.
    #[structopt(parse(from_os_str))]
    pub path: PathBuf,
}

#[derive(StructOpt)]
pub struct ProvisionOptions {
    /// Either 'verbs' or 'words'.
    #[structopt(default_value = "words")]
    pub deck: String,
    /// Number of items to unlock.
    #[structopt(short = "n", default_value = "10")]
    pub count: usize,
}

#[derive(StructOpt)]
pub struct TakeOptions {
    /// Either 'verbs' or 'words'.
    #[structopt(default_value = "words")]
    pub deck: String,
    /// Ask for the French side instead of the translation.
    #[structopt(long = "flip")]
    pub flip: bool,
    /// Limit the total number of questions.
    #[structopt(short = "n", default_value = "10")]
    pub num_to_ask: usize,
}

#[derive(StructOpt)]
pub struct ConjugateOptions {
    /// Either 'fr' or 'es'.
    #[structopt(short = "l", long = "language", default_value = "fr")]
    pub language: String,
    /// One of 'easy', 'medium', 'hard' or 'custom'.
    #[structopt(long = "level", default_value = "easy")]
    pub level: String,
    /// Tenses to practice when the level is 'custom'.
    #[structopt(long = "tense")]
    pub tenses: Vec<String>,
    /// Number of verbs in the session.
    #[structopt(short = "n", default_value = "5")]
    pub num_verbs: usize,
}

#[derive(StructOpt)]
pub struct StatsOptions {
    /// Either 'verbs', 'words', 'fr' or 'es'.
    #[structopt(default_value = "words")]
    pub deck: String,
}
