/**
 * Reading and writing items, conjugations and learner progress in SQLite.
 *
 * Version: October 2026
 */
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::common::{DrillError, Result};
use super::quiz::{PracticeItem, Verb, Word};
use super::scoring::LearnerItemState;
use super::tenses::{Language, TenseScoreMap};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS items(
      id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
      kind TEXT NOT NULL CHECK(kind = 'verb' OR kind = 'word'),
      text TEXT NOT NULL CHECK(text != ''),
      translation TEXT NOT NULL,
      text_synonyms TEXT NOT NULL DEFAULT '',
      translation_synonyms TEXT NOT NULL DEFAULT '',
      UNIQUE(kind, text)
    );

    CREATE TABLE IF NOT EXISTS learner_items(
      learner TEXT NOT NULL CHECK(learner != ''),
      item INTEGER NOT NULL REFERENCES items,
      unlocked BOOLEAN NOT NULL DEFAULT 0,
      score REAL NOT NULL DEFAULT 1000,
      attempts INTEGER NOT NULL DEFAULT 0,
      correct INTEGER NOT NULL DEFAULT 0,
      PRIMARY KEY(learner, item)
    );

    CREATE TABLE IF NOT EXISTS conjugations(
      verb INTEGER NOT NULL REFERENCES items,
      language TEXT NOT NULL CHECK(language = 'FR' OR language = 'ES'),
      mood TEXT NOT NULL,
      tense TEXT NOT NULL,
      pronoun TEXT NOT NULL DEFAULT '',
      form TEXT NOT NULL,
      UNIQUE(verb, language, mood, tense, pronoun)
    );

    CREATE TABLE IF NOT EXISTS tense_scores(
      learner TEXT NOT NULL CHECK(learner != ''),
      verb INTEGER NOT NULL REFERENCES items,
      language TEXT NOT NULL,
      scores TEXT NOT NULL DEFAULT '{}',
      overall_score REAL NOT NULL DEFAULT 1000,
      attempts INTEGER NOT NULL DEFAULT 0,
      correct INTEGER NOT NULL DEFAULT 0,
      last_practiced TEXT,
      PRIMARY KEY(learner, verb, language)
    );

    CREATE INDEX IF NOT EXISTS learner_items_unlocked ON learner_items(learner, unlocked);
    CREATE INDEX IF NOT EXISTS conjugations_lookup ON conjugations(verb, language, tense);
";

/// The static input artifact: verbs, words and pre-generated conjugations.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Dataset {
    #[serde(default)]
    pub verbs: Vec<Verb>,
    #[serde(default)]
    pub words: Vec<Word>,
    #[serde(default)]
    pub conjugations: Vec<ConjugationEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConjugationEntry {
    pub infinitive: String,
    pub language: Language,
    pub mood: String,
    pub tense: String,
    #[serde(default)]
    pub pronoun: String,
    pub form: String,
}

#[derive(Debug, Default, PartialEq)]
pub struct LoadSummary {
    pub verbs: usize,
    pub words: usize,
    pub conjugations: usize,
}

pub struct Store {
    connection: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Store> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(DrillError::Io)?;
            }
        }
        debug!("opening database at {}", path.display());
        let connection = Connection::open(path).map_err(DrillError::Sql)?;
        Store::with_connection(connection)
    }

    pub fn open_in_memory() -> Result<Store> {
        let connection = Connection::open_in_memory().map_err(DrillError::Sql)?;
        Store::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Store> {
        connection
            .execute_batch(SCHEMA)
            .map_err(DrillError::Sql)?;
        Ok(Store { connection })
    }

    pub fn load_dataset_file(&self, path: &Path) -> Result<LoadSummary> {
        let data = fs::read_to_string(path).map_err(DrillError::Io)?;
        let dataset: Dataset = serde_json::from_str(&data).map_err(DrillError::Json)?;
        self.load_dataset(&dataset)
    }

    /// Insert everything in `dataset`, skipping entries that are already present.
    pub fn load_dataset(&self, dataset: &Dataset) -> Result<LoadSummary> {
        let tx = self
            .connection
            .unchecked_transaction()
            .map_err(DrillError::Sql)?;
        let mut summary = LoadSummary::default();
        for verb in dataset.verbs.iter() {
            if self.insert_item(verb)?.1 {
                summary.verbs += 1;
            }
        }
        for word in dataset.words.iter() {
            if self.insert_item(word)?.1 {
                summary.words += 1;
            }
        }
        for entry in dataset.conjugations.iter() {
            let verb = self
                .item_id_by_text(Verb::KIND, &entry.infinitive)?
                .ok_or_else(|| DrillError::UnknownVerb(entry.infinitive.clone()))?;
            if self.insert_conjugation(verb, entry)? {
                summary.conjugations += 1;
            }
        }
        tx.commit().map_err(DrillError::Sql)?;
        info!(
            "loaded {} verbs, {} words and {} conjugations",
            summary.verbs, summary.words, summary.conjugations
        );
        Ok(summary)
    }

    /// Insert `item` unless an item of the same kind and text exists. Returns its id and
    /// whether it was newly inserted.
    pub fn insert_item<I: PracticeItem>(&self, item: &I) -> Result<(i64, bool)> {
        let inserted = self
            .connection
            .execute(
                "
                INSERT OR IGNORE INTO
                  items(kind, text, translation, text_synonyms, translation_synonyms)
                VALUES
                  (?1, ?2, ?3, ?4, ?5)
                ",
                params![
                    I::KIND,
                    item.text(),
                    item.translation(),
                    item.text_synonyms(),
                    item.translation_synonyms()
                ],
            )
            .map_err(DrillError::Sql)?;
        let id = self
            .item_id_by_text(I::KIND, item.text())?
            .ok_or_else(|| DrillError::UnknownVerb(item.text().to_string()))?;
        Ok((id, inserted > 0))
    }

    fn item_id_by_text(&self, kind: &str, text: &str) -> Result<Option<i64>> {
        self.connection
            .query_row(
                "SELECT id FROM items WHERE kind = ?1 AND text = ?2",
                params![kind, text],
                |row| row.get(0),
            )
            .optional()
            .map_err(DrillError::Sql)
    }

    fn insert_conjugation(&self, verb: i64, entry: &ConjugationEntry) -> Result<bool> {
        let inserted = self
            .connection
            .execute(
                "
                INSERT OR IGNORE INTO
                  conjugations(verb, language, mood, tense, pronoun, form)
                VALUES
                  (?1, ?2, ?3, ?4, ?5, ?6)
                ",
                params![
                    verb,
                    entry.language.code(),
                    entry.mood,
                    entry.tense,
                    entry.pronoun,
                    entry.form
                ],
            )
            .map_err(DrillError::Sql)?;
        Ok(inserted > 0)
    }

    pub fn get_item<I: PracticeItem>(&self, id: i64) -> Result<Option<I>> {
        self.connection
            .query_row(
                "
                SELECT
                  id, text, translation, text_synonyms, translation_synonyms
                FROM
                  items
                WHERE
                  id = ?1 AND kind = ?2
                ",
                params![id, I::KIND],
                |row| {
                    Ok(I::from_parts(
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                    ))
                },
            )
            .optional()
            .map_err(DrillError::Sql)
    }

    /// Unlock the first `count` items of `kind` by id. Existing records are left alone.
    pub fn provision_items(&self, learner: &str, kind: &str, count: usize) -> Result<usize> {
        let inserted = self
            .connection
            .execute(
                "
                INSERT OR IGNORE INTO
                  learner_items(learner, item, unlocked)
                SELECT
                  ?1, id, 1
                FROM
                  items
                WHERE
                  kind = ?2
                ORDER BY
                  id
                LIMIT ?3
                ",
                params![learner, kind, count as i64],
            )
            .map_err(DrillError::Sql)?;
        debug!("provisioned {} {} items for {}", inserted, kind, learner);
        Ok(inserted)
    }

    /// Unlock up to `count` items of `kind` past the highest id the learner already has.
    pub fn unlock_next_items(&self, learner: &str, kind: &str, count: usize) -> Result<usize> {
        let inserted = self
            .connection
            .execute(
                "
                INSERT OR IGNORE INTO
                  learner_items(learner, item, unlocked)
                SELECT
                  ?1, id, 1
                FROM
                  items
                WHERE
                  kind = ?2
                  AND id > (
                    SELECT
                      COALESCE(MAX(learner_items.item), 0)
                    FROM
                      learner_items
                    JOIN
                      items ON items.id = learner_items.item
                    WHERE
                      learner_items.learner = ?1 AND items.kind = ?2
                  )
                ORDER BY
                  id
                LIMIT ?3
                ",
                params![learner, kind, count as i64],
            )
            .map_err(DrillError::Sql)?;
        Ok(inserted)
    }

    /// `(item, score)` for every unlocked item of `kind`, in id order.
    pub fn unlocked_pool(&self, learner: &str, kind: &str) -> Result<Vec<(i64, f64)>> {
        let mut stmt = self
            .connection
            .prepare(
                "
                SELECT
                  learner_items.item, learner_items.score
                FROM
                  learner_items
                JOIN
                  items ON items.id = learner_items.item
                WHERE
                  learner_items.learner = ?1
                  AND learner_items.unlocked
                  AND items.kind = ?2
                ORDER BY
                  learner_items.item
                ",
            )
            .map_err(DrillError::Sql)?;
        let rows = stmt
            .query_map(params![learner, kind], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(DrillError::Sql)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DrillError::Sql)
    }

    /// Every record of `kind` for `learner`, in id order.
    pub fn learner_states(&self, learner: &str, kind: &str) -> Result<Vec<LearnerItemState>> {
        let mut stmt = self
            .connection
            .prepare(
                "
                SELECT
                  learner_items.item,
                  learner_items.unlocked,
                  learner_items.score,
                  learner_items.attempts,
                  learner_items.correct
                FROM
                  learner_items
                JOIN
                  items ON items.id = learner_items.item
                WHERE
                  learner_items.learner = ?1 AND items.kind = ?2
                ORDER BY
                  learner_items.item
                ",
            )
            .map_err(DrillError::Sql)?;
        let rows = stmt
            .query_map(params![learner, kind], row_to_state)
            .map_err(DrillError::Sql)?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DrillError::Sql)
    }

    pub fn get_state(&self, learner: &str, item: i64) -> Result<Option<LearnerItemState>> {
        self.connection
            .query_row(
                "
                SELECT
                  item, unlocked, score, attempts, correct
                FROM
                  learner_items
                WHERE
                  learner = ?1 AND item = ?2
                ",
                params![learner, item],
                row_to_state,
            )
            .optional()
            .map_err(DrillError::Sql)
    }

    /// Read the record for (`learner`, `item`), let `f` change it and write it back, all
    /// in one transaction.
    pub fn update_state<F, T>(&self, learner: &str, item: i64, f: F) -> Result<T>
    where
        F: FnOnce(&mut LearnerItemState) -> T,
    {
        let tx = self
            .connection
            .unchecked_transaction()
            .map_err(DrillError::Sql)?;
        let mut state = self
            .get_state(learner, item)?
            .ok_or_else(|| DrillError::RecordNotFound {
                learner: learner.to_string(),
                item,
            })?;
        let ret = f(&mut state);
        self.connection
            .execute(
                "
                UPDATE
                  learner_items
                SET
                  unlocked = ?3, score = ?4, attempts = ?5, correct = ?6
                WHERE
                  learner = ?1 AND item = ?2
                ",
                params![
                    learner,
                    item,
                    state.unlocked,
                    state.score,
                    state.attempts,
                    state.correct
                ],
            )
            .map_err(DrillError::Sql)?;
        tx.commit().map_err(DrillError::Sql)?;
        Ok(ret)
    }

    /// Scores of the items of `kind` that the learner has answered at least once.
    pub fn practiced_scores(&self, learner: &str, kind: &str) -> Result<Vec<f64>> {
        Ok(self
            .learner_states(learner, kind)?
            .into_iter()
            .filter(|s| s.attempts > 0)
            .map(|s| s.score)
            .collect())
    }

    /// Start tracking tense scores for the first `count` verbs that have conjugations in
    /// `language`.
    pub fn provision_conjugations(
        &self,
        learner: &str,
        language: Language,
        count: usize,
    ) -> Result<usize> {
        let inserted = self
            .connection
            .execute(
                "
                INSERT OR IGNORE INTO
                  tense_scores(learner, verb, language)
                SELECT DISTINCT
                  ?1, verb, ?2
                FROM
                  conjugations
                WHERE
                  language = ?2
                ORDER BY
                  verb
                LIMIT ?3
                ",
                params![learner, language.code(), count as i64],
            )
            .map_err(DrillError::Sql)?;
        debug!(
            "provisioned {} {} conjugation verbs for {}",
            inserted, language, learner
        );
        Ok(inserted)
    }

    pub fn unlock_next_conjugation_verbs(
        &self,
        learner: &str,
        language: Language,
        count: usize,
    ) -> Result<usize> {
        let inserted = self
            .connection
            .execute(
                "
                INSERT OR IGNORE INTO
                  tense_scores(learner, verb, language)
                SELECT DISTINCT
                  ?1, verb, ?2
                FROM
                  conjugations
                WHERE
                  language = ?2
                  AND verb > (
                    SELECT
                      COALESCE(MAX(verb), 0)
                    FROM
                      tense_scores
                    WHERE
                      learner = ?1 AND language = ?2
                  )
                ORDER BY
                  verb
                LIMIT ?3
                ",
                params![learner, language.code(), count as i64],
            )
            .map_err(DrillError::Sql)?;
        Ok(inserted)
    }

    /// Every tracked verb for `learner` in `language`, in id order.
    pub fn tense_states(
        &self,
        learner: &str,
        language: Language,
    ) -> Result<Vec<(i64, TenseScoreMap)>> {
        let mut stmt = self
            .connection
            .prepare(
                "
                SELECT
                  verb, scores, overall_score, attempts, correct, last_practiced
                FROM
                  tense_scores
                WHERE
                  learner = ?1 AND language = ?2
                ORDER BY
                  verb
                ",
            )
            .map_err(DrillError::Sql)?;
        let rows = stmt
            .query_map(params![learner, language.code()], row_to_raw_tense)
            .map_err(DrillError::Sql)?;
        let mut states = Vec::new();
        for row in rows {
            let raw = row.map_err(DrillError::Sql)?;
            states.push((raw.verb, raw.into_map()?));
        }
        Ok(states)
    }

    pub fn get_tense_state(
        &self,
        learner: &str,
        verb: i64,
        language: Language,
    ) -> Result<Option<TenseScoreMap>> {
        let raw = self
            .connection
            .query_row(
                "
                SELECT
                  verb, scores, overall_score, attempts, correct, last_practiced
                FROM
                  tense_scores
                WHERE
                  learner = ?1 AND verb = ?2 AND language = ?3
                ",
                params![learner, verb, language.code()],
                row_to_raw_tense,
            )
            .optional()
            .map_err(DrillError::Sql)?;
        match raw {
            Some(raw) => Ok(Some(raw.into_map()?)),
            None => Ok(None),
        }
    }

    /// Read-modify-write of one tense record inside a transaction.
    pub fn update_tense_state<F, T>(
        &self,
        learner: &str,
        verb: i64,
        language: Language,
        f: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut TenseScoreMap) -> T,
    {
        let tx = self
            .connection
            .unchecked_transaction()
            .map_err(DrillError::Sql)?;
        let mut map = self
            .get_tense_state(learner, verb, language)?
            .ok_or_else(|| DrillError::RecordNotFound {
                learner: learner.to_string(),
                item: verb,
            })?;
        let ret = f(&mut map);
        let scores = serde_json::to_string(&map.scores).map_err(DrillError::Json)?;
        self.connection
            .execute(
                "
                UPDATE
                  tense_scores
                SET
                  scores = ?4,
                  overall_score = ?5,
                  attempts = ?6,
                  correct = ?7,
                  last_practiced = ?8
                WHERE
                  learner = ?1 AND verb = ?2 AND language = ?3
                ",
                params![
                    learner,
                    verb,
                    language.code(),
                    scores,
                    map.overall_score,
                    map.attempts,
                    map.correct,
                    map.last_practiced.map(|t| t.to_rfc3339())
                ],
            )
            .map_err(DrillError::Sql)?;
        tx.commit().map_err(DrillError::Sql)?;
        Ok(ret)
    }

    /// Map of pronoun to conjugated form for one tense of `verb`.
    pub fn conjugation_forms(
        &self,
        verb: i64,
        language: Language,
        tense: &str,
    ) -> Result<BTreeMap<String, String>> {
        let mut stmt = self
            .connection
            .prepare(
                "
                SELECT
                  pronoun, form
                FROM
                  conjugations
                WHERE
                  verb = ?1 AND language = ?2 AND tense = ?3
                ",
            )
            .map_err(DrillError::Sql)?;
        let rows = stmt
            .query_map(params![verb, language.code(), tense], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .map_err(DrillError::Sql)?;
        rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()
            .map_err(DrillError::Sql)
    }
}

fn row_to_state(row: &rusqlite::Row) -> rusqlite::Result<LearnerItemState> {
    Ok(LearnerItemState {
        item: row.get(0)?,
        unlocked: row.get(1)?,
        score: row.get(2)?,
        attempts: row.get(3)?,
        correct: row.get(4)?,
    })
}

/// A `tense_scores` row before its JSON and timestamp columns are decoded.
struct RawTenseRow {
    verb: i64,
    scores: String,
    overall_score: f64,
    attempts: u32,
    correct: u32,
    last_practiced: Option<String>,
}

impl RawTenseRow {
    fn into_map(self) -> Result<TenseScoreMap> {
        let scores = serde_json::from_str(&self.scores).map_err(DrillError::Json)?;
        let last_practiced = self
            .last_practiced
            .and_then(|t| DateTime::parse_from_rfc3339(&t).ok())
            .map(|t| t.with_timezone(&Utc));
        Ok(TenseScoreMap {
            scores,
            overall_score: self.overall_score,
            attempts: self.attempts,
            correct: self.correct,
            last_practiced,
        })
    }
}

fn row_to_raw_tense(row: &rusqlite::Row) -> rusqlite::Result<RawTenseRow> {
    Ok(RawTenseRow {
        verb: row.get(0)?,
        scores: row.get(1)?,
        overall_score: row.get(2)?,
        attempts: row.get(3)?,
        correct: row.get(4)?,
        last_practiced: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> Dataset {
        serde_json::from_str(
            r#"{
              "verbs": [
                {"infinitive": "être", "translation": "ser, estar"},
                {"infinitive": "avoir", "translation": "tener"}
              ],
              "words": [
                {"word": "la maison", "translation": "la casa"}
              ],
              "conjugations": [
                {"infinitive": "être", "language": "French", "mood": "Indicatif",
                 "tense": "présent", "pronoun": "je", "form": "suis"},
                {"infinitive": "être", "language": "French", "mood": "Indicatif",
                 "tense": "présent", "pronoun": "tu", "form": "es"}
              ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn loading_twice_inserts_once() {
        let store = Store::open_in_memory().unwrap();
        let first = store.load_dataset(&dataset()).unwrap();
        assert_eq!(
            first,
            LoadSummary {
                verbs: 2,
                words: 1,
                conjugations: 2
            }
        );
        let second = store.load_dataset(&dataset()).unwrap();
        assert_eq!(second, LoadSummary::default());
    }

    #[test]
    fn conjugation_for_unknown_verb_is_rejected() {
        let store = Store::open_in_memory().unwrap();
        let mut data = dataset();
        data.conjugations[0].infinitive = String::from("inconnu");
        match store.load_dataset(&data) {
            Err(DrillError::UnknownVerb(name)) => assert_eq!(name, "inconnu"),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn items_round_trip_through_the_table() {
        let store = Store::open_in_memory().unwrap();
        store.load_dataset(&dataset()).unwrap();
        let verb: Verb = store.get_item(1).unwrap().unwrap();
        assert_eq!(verb.infinitive, "être");
        assert_eq!(verb.translation, "ser, estar");
        // Item 1 is a verb, not a word.
        assert!(store.get_item::<Word>(1).unwrap().is_none());
    }

    #[test]
    fn provisioning_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        store.load_dataset(&dataset()).unwrap();
        assert_eq!(store.provision_items("ana", "verb", 10).unwrap(), 2);
        assert_eq!(store.provision_items("ana", "verb", 10).unwrap(), 0);
        assert_eq!(store.unlocked_pool("ana", "verb").unwrap().len(), 2);
        assert!(store.unlocked_pool("ana", "word").unwrap().is_empty());
    }

    #[test]
    fn update_of_missing_record_is_an_error() {
        let store = Store::open_in_memory().unwrap();
        let result = store.update_state("ana", 42, |state| state.score);
        match result {
            Err(DrillError::RecordNotFound { learner, item }) => {
                assert_eq!(learner, "ana");
                assert_eq!(item, 42);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn tense_state_persists_scores_and_timestamp() {
        let store = Store::open_in_memory().unwrap();
        store.load_dataset(&dataset()).unwrap();
        assert_eq!(
            store.provision_conjugations("ana", Language::French, 10).unwrap(),
            1
        );
        let now = Utc::now();
        store
            .update_tense_state("ana", 1, Language::French, |map| {
                map.scores.insert(String::from("présent"), 700.0);
                map.overall_score = 700.0;
                map.attempts = 2;
                map.last_practiced = Some(now);
            })
            .unwrap();
        let map = store
            .get_tense_state("ana", 1, Language::French)
            .unwrap()
            .unwrap();
        assert_eq!(map.score("présent"), 700.0);
        assert_eq!(map.attempts, 2);
        assert_eq!(
            map.last_practiced.map(|t| t.timestamp()),
            Some(now.timestamp())
        );
        assert!(store
            .get_tense_state("ana", 1, Language::Spanish)
            .unwrap()
            .is_none());
    }

    #[test]
    fn conjugation_forms_are_keyed_by_pronoun() {
        let store = Store::open_in_memory().unwrap();
        store.load_dataset(&dataset()).unwrap();
        let forms = store
            .conjugation_forms(1, Language::French, "présent")
            .unwrap();
        assert_eq!(forms.get("je").map(String::as_str), Some("suis"));
        assert_eq!(forms.len(), 2);
        assert!(store
            .conjugation_forms(1, Language::French, "futur")
            .unwrap()
            .is_empty());
    }
}
