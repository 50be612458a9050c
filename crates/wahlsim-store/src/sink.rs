//! Append-only result persistence, one JSON record per line.

use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;

use async_trait::async_trait;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use wahlsim_core::{PartySet, ResultRecord};

use crate::StoreError;

/// Destination for completed records.
///
/// Implementations must write each record as one unit: concurrent appends
/// never interleave.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append(&self, record: &ResultRecord) -> Result<(), StoreError>;
}

/// JSON-lines file opened in append mode. Existing lines are kept.
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl JsonlSink {
    /// Open (or create) the output file, creating parent directories.
    ///
    /// A torn last line (no trailing newline) left by an interrupted write is
    /// cut off so the next record starts on a line of its own.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        drop_torn_tail(path).await?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    async fn append(&self, record: &ResultRecord) -> Result<(), StoreError> {
        let mut line = record.to_json_line().map_err(StoreError::Serialize)?;
        line.push('\n');

        let mut file = self.file.lock().await;
        let len_before = file.metadata().await?.len();
        if let Err(e) = write_line(&mut file, line.as_bytes()).await {
            // Roll back whatever part of the line reached the file.
            if let Err(trunc) = file.set_len(len_before).await {
                warn!(path = %self.path.display(), error = %trunc, "could not roll back partial line");
            }
            return Err(e.into());
        }
        debug!(record_id = record.id(), path = %self.path.display(), "appended result");
        Ok(())
    }
}

async fn write_line(file: &mut tokio::fs::File, bytes: &[u8]) -> std::io::Result<()> {
    file.write_all(bytes).await?;
    file.flush().await
}

/// Truncate the file after its last newline when it does not end with one.
async fn drop_torn_tail(path: &Path) -> Result<(), StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    if bytes.is_empty() || bytes.ends_with(b"\n") {
        return Ok(());
    }
    let keep = bytes.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    warn!(
        path = %path.display(),
        dropped_bytes = bytes.len() - keep,
        "dropping torn last line"
    );
    let file = OpenOptions::new().write(true).open(path).await?;
    file.set_len(keep as u64).await?;
    Ok(())
}

/// In-memory sink, e.g. for dry runs.
#[derive(Default)]
pub struct MemorySink {
    records: StdMutex<Vec<ResultRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ResultRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn append(&self, record: &ResultRecord) -> Result<(), StoreError> {
        match self.records.lock() {
            Ok(mut records) => records.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
        Ok(())
    }
}

/// Read every stored record back, re-validating each artifact.
///
/// Blank lines are skipped; any other malformed line is an error carrying its
/// 1-based line number.
pub fn read_results(path: &Path, parties: &PartySet) -> Result<Vec<ResultRecord>, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record =
            ResultRecord::from_json_line(line, parties).map_err(|source| StoreError::Record {
                path: path.to_path_buf(),
                line: i + 1,
                source,
            })?;
        records.push(record);
    }
    Ok(records)
}
