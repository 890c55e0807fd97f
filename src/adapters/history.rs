use crate::domain::model::HistoryEntry;
use crate::domain::ports::{AppendOutcome, HistoryStore};
use crate::utils::error::{RecommenderError, Result};
use async_trait::async_trait;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub const HISTORY_COLUMNS: [&str; 6] = [
    "Timestamp",
    "Restaurant",
    "Rating",
    "Address",
    "Food",
    "Location",
];

/// 本地 CSV 歷史表
#[derive(Debug)]
pub struct CsvHistoryStore {
    path: PathBuf,
    // 同一程序內的寫入依序進行
    lock: Mutex<()>,
}

impl CsvHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_rows(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;

        let mut rows = Vec::new();
        for record in reader.deserialize::<HistoryEntry>() {
            rows.push(record?);
        }
        Ok(rows)
    }

    fn write_row(&self, entry: &HistoryEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let needs_header = fs::metadata(&self.path)
            .map(|meta| meta.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer.write_record(HISTORY_COLUMNS)?;
        }
        writer.serialize(entry)?;
        writer.flush()?;
        Ok(())
    }
}

fn persistence_error(action: &str, path: &Path, e: RecommenderError) -> RecommenderError {
    RecommenderError::persistence(format!("{} {}: {}", action, path.display(), e))
}

#[async_trait]
impl HistoryStore for CsvHistoryStore {
    async fn read_all(&self) -> Result<Vec<HistoryEntry>> {
        let _guard = self.lock.lock().await;
        self.read_rows()
            .map_err(|e| persistence_error("could not read", &self.path, e))
    }

    async fn append_row(&self, entry: &HistoryEntry) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write_row(entry)
            .map_err(|e| persistence_error("could not write", &self.path, e))
    }

    async fn append(&self, entry: &HistoryEntry) -> Result<AppendOutcome> {
        // 掃描與寫入在同一把鎖內完成
        let _guard = self.lock.lock().await;
        let existing = self
            .read_rows()
            .map_err(|e| persistence_error("could not read", &self.path, e))?;

        if existing.iter().any(|row| row.same_key(entry)) {
            return Ok(AppendOutcome::AlreadyExists);
        }

        self.write_row(entry)
            .map_err(|e| persistence_error("could not write", &self.path, e))?;
        Ok(AppendOutcome::Saved)
    }
}

/// 記憶體內的歷史表
#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    rows: Mutex<Vec<HistoryEntry>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn read_all(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.rows.lock().await.clone())
    }

    async fn append_row(&self, entry: &HistoryEntry) -> Result<()> {
        self.rows.lock().await.push(entry.clone());
        Ok(())
    }

    async fn append(&self, entry: &HistoryEntry) -> Result<AppendOutcome> {
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|row| row.same_key(entry)) {
            return Ok(AppendOutcome::AlreadyExists);
        }
        rows.push(entry.clone());
        Ok(AppendOutcome::Saved)
    }
}
