use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, Command, Stdio};

use regex::Regex;
use tempfile::TempDir;

const DATASET: &str = r#"{
  "verbs": [
    {"infinitive": "être", "translation": "ser, estar"},
    {"infinitive": "avoir", "translation": "tener"}
  ],
  "words": [
    {"word": "la maison", "translation": "la casa", "translation_synonyms": "el hogar"}
  ],
  "conjugations": [
    {"infinitive": "être", "language": "French", "mood": "Indicatif",
     "tense": "présent", "pronoun": "je", "form": "suis"},
    {"infinitive": "être", "language": "French", "mood": "Indicatif",
     "tense": "présent", "pronoun": "tu", "form": "es"}
  ]
}"#;

const ONE_VERB: &str = r#"{
  "verbs": [{"infinitive": "être", "translation": "ser, estar"}],
  "conjugations": [
    {"infinitive": "être", "language": "French", "mood": "Indicatif",
     "tense": "présent", "pronoun": "tu", "form": "es"},
    {"infinitive": "être", "language": "French", "mood": "Indicatif",
     "tense": "présent", "pronoun": "je", "form": "suis"}
  ]
}"#;

#[test]
fn can_load_dataset() {
    let workspace = Workspace::new();
    let (stdout, _) = workspace.run(&["load", workspace.dataset_path()], &[]);
    assert_in_order(&stdout, &["Loaded 2 verbs, 1 words and 2 conjugations."]);

    // Loading again inserts nothing new.
    let (stdout, _) = workspace.run(&["load", workspace.dataset_path()], &[]);
    assert_in_order(&stdout, &["Loaded 0 verbs, 0 words and 0 conjugations."]);
}

#[test]
fn can_provision_learner() {
    let workspace = Workspace::loaded();
    let (stdout, _) = workspace.run(&["stats", "verbs"], &[]);
    assert_in_order(&stdout, &["No items unlocked."]);

    let (stdout, _) = workspace.run(&["provision", "verbs", "-n", "5"], &[]);
    assert_in_order(&stdout, &["Unlocked 2 items."]);

    let (stdout, _) = workspace.run(&["provision", "verbs", "-n", "5"], &[]);
    assert_in_order(&stdout, &["Unlocked 0 items."]);
}

#[test]
fn can_take_word_quiz() {
    let workspace = Workspace::loaded();
    let (stdout, _) = workspace.run(&["take", "words", "-n", "1"], &["La Casa"]);
    assert_in_order(
        &stdout,
        &[
            "(1) la maison",
            "Correct!",
            "Score: 100.0% out of 1 question",
            "1 correct",
            "0 incorrect",
        ],
    );

    let (stdout, _) = workspace.run(&["stats", "words"], &[]);
    assert_matches(&stdout, r"700\.0\s+1/1\s+la maison");
}

#[test]
fn can_take_flipped_quiz_with_hint() {
    let workspace = Workspace::loaded();
    let (stdout, _) = workspace.run(
        &["take", "words", "--flip", "-n", "1"],
        &["?", "la maison"],
    );
    assert_in_order(
        &stdout,
        &[
            "(1) la casa",
            "Hint: l",
            "Correct, with a hint.",
            "1 partially correct",
        ],
    );

    let (stdout, _) = workspace.run(&["stats", "words"], &[]);
    assert_matches(&stdout, r"800\.0\s+1/1\s+la maison");
}

#[test]
fn giving_up_raises_score() {
    let workspace = Workspace::loaded();
    let (stdout, _) = workspace.run(&["take", "words", "-n", "1"], &["!"]);
    assert_in_order(
        &stdout,
        &[
            "(1) la maison",
            "Incorrect. The correct answer was la casa.",
            "1 incorrect",
        ],
    );

    let (stdout, _) = workspace.run(&["stats", "words"], &[]);
    assert_matches(&stdout, r"1300\.0\s+0/1\s+la maison");
}

#[test]
fn synonyms_earn_partial_credit() {
    let workspace = Workspace::loaded();
    let (stdout, _) = workspace.run(&["take", "words", "-n", "1"], &["el hogar"]);
    assert_in_order(
        &stdout,
        &[
            "Accepted as a synonym. The expected answer was la casa.",
            "Score: 50.0% out of 1 question",
        ],
    );
}

#[test]
fn can_conjugate() {
    let workspace = Workspace::with_dataset(ONE_VERB);
    workspace.run(&["load", workspace.dataset_path()], &[]);
    let (stdout, _) = workspace.run(
        &["conjugate", "-l", "fr", "--level", "custom", "--tense", "présent"],
        &["suis", "est"],
    );
    assert_in_order(
        &stdout,
        &[
            "(1/1) être (ser, estar), présent",
            "✓ je suis",
            "✗ tu es",
            "New présent score: 1100",
            "Score: 50.0% out of 2 questions",
        ],
    );

    let (stdout, _) = workspace.run(&["stats", "fr"], &[]);
    assert_matches(&stdout, r"1100\.0\s+1/2\s+être");
}

#[test]
fn empty_store_has_nothing_to_practice() {
    let workspace = Workspace::new();
    let (stdout, _) = workspace.run(&["take", "verbs"], &[]);
    assert_in_order(&stdout, &["Nothing to practice yet."]);

    let (stdout, _) = workspace.run(&["conjugate", "-l", "es"], &[]);
    assert_in_order(&stdout, &["Nothing to practice yet."]);
}

#[test]
fn bad_arguments_are_reported() {
    let workspace = Workspace::new();
    let (_, stderr) = workspace.run(&["take", "animals"], &[]);
    assert_in_order(&stderr, &["Error: unknown deck 'animals'"]);

    let (_, stderr) = workspace.run(&["conjugate", "-l", "de"], &[]);
    assert_in_order(&stderr, &["Error: unknown language 'de'"]);

    let (_, stderr) = workspace.run(&["conjugate", "--level", "custom"], &[]);
    assert_in_order(&stderr, &["Error: select at least one tense"]);
}

struct Workspace {
    dir: TempDir,
    dataset: String,
}

impl Workspace {
    fn new() -> Self {
        Workspace::with_dataset(DATASET)
    }

    fn with_dataset(contents: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temporary directory");
        let dataset = dir.path().join("dataset.json");
        fs::write(&dataset, contents).expect("Failed to write dataset");
        Workspace {
            dataset: dataset.to_string_lossy().to_string(),
            dir,
        }
    }

    fn loaded() -> Self {
        let workspace = Workspace::new();
        workspace.run(&["load", workspace.dataset_path()], &[]);
        workspace
    }

    fn dataset_path(&self) -> &str {
        &self.dataset
    }

    fn db_path(&self) -> PathBuf {
        self.dir.path().join("test.sqlite3")
    }

    fn run(&self, args: &[&str], input: &[&str]) -> (String, String) {
        spawn_and_mock(&self.db_path(), args, input)
    }
}

fn spawn_and_mock(db: &Path, args: &[&str], input: &[&str]) -> (String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_verbdrill"))
        .arg("--no-color")
        .arg("--db")
        .arg(db)
        .arg("--learner")
        .arg("tester")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn child process");

    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        for line in input {
            stdin_write(stdin, line);
        }
    }

    let result = child.wait_with_output().expect("Failed to read stdout");
    let stdout = String::from_utf8_lossy(&result.stdout).to_string();
    let stderr = String::from_utf8_lossy(&result.stderr).to_string();
    (stdout, stderr)
}

fn assert_in_order(mock_stdout: &str, data: &[&str]) {
    let mut last_pos = 0;
    for datum in data {
        if let Some(pos) = mock_stdout[last_pos..].find(datum) {
            // `pos` is relative to the slice, so shift it by `last_pos`.
            last_pos = (pos + last_pos) + datum.len();
        } else {
            panic!("Missing: {:?}; Contents of stdout: {:?}", datum, mock_stdout);
        }
    }
}

fn assert_matches(mock_stdout: &str, pattern: &str) {
    let re = Regex::new(pattern).unwrap();
    assert!(
        re.is_match(mock_stdout),
        "Failed to match {:?} against pattern {:?}",
        mock_stdout,
        pattern
    );
}

fn stdin_write(stdin: &mut ChildStdin, line: &str) {
    stdin.write_all(line.as_bytes()).expect("Failed to write to stdin");
    stdin.write_all("\n".as_bytes()).expect("Failed to write to stdin");
}
