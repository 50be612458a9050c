//! Loading the read-only reference corpora from a data directory.
//!
//! Expected layout (every path can be overridden through [`CorpusPaths`]):
//!
//! ```text
//! <data_dir>/news.txt          free-text news digest
//! <data_dir>/parties.json      ["CDU", "SPD", ...]  exactly 6 identifiers
//! <data_dir>/questions.json    [{"id": 1, "title": "...", "text": "..."}, ...]
//! <data_dir>/programs/<ID>.txt one program per party identifier
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;
use wahlsim_core::{PartySet, Question, Questionnaire, ReferenceCorpora};

use crate::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusPaths {
    pub news: PathBuf,
    pub parties: PathBuf,
    pub questions: PathBuf,
    pub programs_dir: PathBuf,
}

impl CorpusPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            news: dir.join("news.txt"),
            parties: dir.join("parties.json"),
            questions: dir.join("questions.json"),
            programs_dir: dir.join("programs"),
        }
    }

    pub fn program(&self, party: &str) -> PathBuf {
        self.programs_dir.join(format!("{party}.txt"))
    }
}

/// Question as stored on disk. `id` defaults to the 1-based list position;
/// German keys from scraped questionnaire exports are accepted.
#[derive(Deserialize)]
struct QuestionEntry {
    id: Option<u32>,
    #[serde(default, alias = "titel")]
    title: Option<String>,
    #[serde(alias = "frage")]
    text: String,
}

/// Load and check every corpus. Any failure is fatal to the run.
pub fn load_corpora(paths: &CorpusPaths) -> Result<ReferenceCorpora, StoreError> {
    let parties = load_parties(&paths.parties)?;
    let questions = load_questions(&paths.questions)?;
    let news = read_text(&paths.news)?;

    let mut programs = BTreeMap::new();
    for party in parties.iter() {
        let text = read_text(&paths.program(party))?;
        programs.insert(party.to_string(), text);
    }

    info!(
        parties = parties.len(),
        questions = questions.len(),
        news_chars = news.chars().count(),
        "loaded reference corpora"
    );
    Ok(ReferenceCorpora::new(news, parties, programs, questions)?)
}

pub fn load_parties(path: &Path) -> Result<PartySet, StoreError> {
    let ids: Vec<String> = read_json(path)?;
    Ok(PartySet::new(ids)?)
}

pub fn load_questions(path: &Path) -> Result<Questionnaire, StoreError> {
    let entries: Vec<QuestionEntry> = read_json(path)?;
    let questions = entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| Question {
            id: e.id.unwrap_or(i as u32 + 1),
            title: e.title,
            text: e.text,
        })
        .collect();
    Ok(Questionnaire::new(questions)?)
}

fn read_text(path: &Path) -> Result<String, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
pub(crate) fn write_sample_corpora(dir: &Path) {
    use std::fs;

    fs::write(dir.join("news.txt"), "Aktuelle Nachrichten der Woche.").unwrap();
    fs::write(
        dir.join("parties.json"),
        r#"["CDU", "SPD", "GRÜNE", "FDP", "LINKE", "AFD"]"#,
    )
    .unwrap();
    let questions: Vec<serde_json::Value> = (1..=35)
        .map(|i| serde_json::json!({ "titel": format!("Thema {i}"), "frage": format!("These {i}") }))
        .collect();
    fs::write(
        dir.join("questions.json"),
        serde_json::to_string(&questions).unwrap(),
    )
    .unwrap();
    fs::create_dir_all(dir.join("programs")).unwrap();
    for party in ["CDU", "SPD", "GRÜNE", "FDP", "LINKE", "AFD"] {
        fs::write(
            dir.join("programs").join(format!("{party}.txt")),
            format!("Programm {party}"),
        )
        .unwrap();
    }
}
