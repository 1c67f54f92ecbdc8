use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use log::{debug, error, info, trace, warn};
use tempfile::NamedTempFile;

use crate::{
    Config, EntryDraft, Journal, Result, SessionLog, StudyError, StudySession, Subjects,
    ATTACHMENT_DELIMITER,
};

pub const SESSIONS_FILE: &str = "study_log.csv";
pub const JOURNAL_FILE: &str = "journal_entries.csv";
pub const SUBJECTS_FILE: &str = "subjects.json";

pub const SESSION_HEADER: [&str; 6] = ["Date", "Time", "Subject", "Notes", "XP", "Time Studied (min)"];
pub const JOURNAL_HEADER: [&str; 5] = ["Date", "Time", "Content", "Attachments", "Title"];

/// Reads and writes the flat files inside the data directory.
///
/// Every save rewrites the whole file.
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(config: &Config) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn sessions_path(&self) -> PathBuf {
        self.data_dir.join(SESSIONS_FILE)
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join(JOURNAL_FILE)
    }

    pub fn subjects_path(&self) -> PathBuf {
        self.data_dir.join(SUBJECTS_FILE)
    }

    /// Creates the data directory and any missing record files
    pub fn initialize(&self) -> Result<()> {
        info!("Initializing storage in {}", self.data_dir.display());

        if !self.data_dir.exists() {
            debug!(
                "Data directory does not exist, creating: {}",
                self.data_dir.display()
            );
            fs::create_dir_all(&self.data_dir).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                StudyError::DirectoryError {
                    path: self.data_dir.clone(),
                }
            })?;
        }

        ensure_table(&self.sessions_path(), &SESSION_HEADER)?;
        ensure_table(&self.journal_path(), &JOURNAL_HEADER)?;
        Ok(())
    }

    pub fn load_sessions(&self) -> Result<SessionLog> {
        let path = self.sessions_path();
        let records = read_table(&path, &SESSION_HEADER)?;
        let sessions: Vec<StudySession> = records
            .iter()
            .enumerate()
            .map(|(i, record)| session_from_record(record, i + 2))
            .collect();

        info!("Loaded {} sessions from {}", sessions.len(), path.display());
        Ok(SessionLog::new(sessions))
    }

    pub fn save_sessions(&self, log: &SessionLog) -> Result<()> {
        let rows = log.sessions().iter().map(|s| {
            vec![
                s.date.clone(),
                s.time.clone(),
                s.subject.clone(),
                s.notes.clone(),
                s.xp.to_string(),
                s.minutes.to_string(),
            ]
        });
        write_table(&self.sessions_path(), &SESSION_HEADER, rows)?;
        debug!("Saved {} sessions", log.len());
        Ok(())
    }

    pub fn load_journal(&self) -> Result<Journal> {
        let path = self.journal_path();
        let records = read_table(&path, &JOURNAL_HEADER)?;
        let drafts: Vec<EntryDraft> = records
            .iter()
            .enumerate()
            .map(|(i, record)| draft_from_record(record, i + 2))
            .collect();

        info!("Loaded {} journal entries from {}", drafts.len(), path.display());
        Ok(Journal::from_drafts(drafts))
    }

    pub fn save_journal(&self, journal: &Journal) -> Result<()> {
        let rows = journal.entries().iter().map(|e| {
            let attachments = e
                .attachments
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join(ATTACHMENT_DELIMITER);
            vec![
                e.date.clone(),
                e.time.clone(),
                e.content.clone(),
                attachments,
                e.title.clone(),
            ]
        });
        write_table(&self.journal_path(), &JOURNAL_HEADER, rows)?;
        debug!("Saved {} journal entries", journal.len());
        Ok(())
    }

    /// Reads the subjects list, falling back to the defaults when the file
    /// is missing or malformed
    pub fn load_subjects(&self) -> Subjects {
        let path = self.subjects_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => {
                debug!("No subjects file at {}, using defaults", path.display());
                return Subjects::default();
            }
        };

        match serde_json::from_str::<Vec<String>>(&content) {
            Ok(names) => Subjects::new(names),
            Err(e) => {
                warn!("Ignoring malformed subjects file {}: {}", path.display(), e);
                Subjects::default()
            }
        }
    }

    /// Saves the subjects list; failures are logged and otherwise ignored
    pub fn save_subjects(&self, subjects: &Subjects) {
        let result = serde_json::to_string(subjects.names())
            .map_err(StudyError::from)
            .and_then(|json| atomic_write(&self.subjects_path(), json.as_bytes()));
        if let Err(e) = result {
            warn!("Could not save subjects: {}", e);
        }
    }
}

/// Writes a header-only table when `path` is missing or zero bytes long
fn ensure_table(path: &Path, header: &[&str]) -> Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => return Ok(()),
        Ok(_) => warn!("{} is empty, rewriting its header", path.display()),
        Err(_) => info!("Creating {}", path.display()),
    }
    write_table(path, header, std::iter::empty::<Vec<String>>())
}

/// Reads all data rows of a table, skipping its header.
///
/// A missing or zero-byte file gets its header and reads as empty. Rows may
/// have any number of columns.
fn read_table(path: &Path, header: &[&str]) -> Result<Vec<StringRecord>> {
    ensure_table(path, header)?;

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for (i, record) in reader.records().enumerate() {
        match record {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping unreadable row {} of {}: {}", i + 2, path.display(), e),
        }
    }
    trace!("Read {} rows from {}", records.len(), path.display());
    Ok(records)
}

fn write_table<I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = WriterBuilder::new().flexible(false).from_writer(Vec::new());
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| StudyError::Io(e.into_error()))?;
    atomic_write(path, &bytes)
}

/// Writes to a temporary file beside `path`, then renames it into place
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Failed to create temporary file in {}: {}", dir.display(), e);
        StudyError::Io(e)
    })?;

    temp_file.write_all(bytes)?;
    temp_file.flush()?;
    temp_file.persist(path).map_err(|e| {
        error!("Failed to persist file {}: {}", path.display(), e.error);
        StudyError::Io(e.error)
    })?;
    Ok(())
}

fn field(record: &StringRecord, index: usize) -> String {
    record.get(index).unwrap_or_default().to_string()
}

fn count_field(record: &StringRecord, index: usize, name: &str, line: usize) -> u32 {
    let raw = record.get(index).unwrap_or_default();
    raw.trim().parse().unwrap_or_else(|_| {
        warn!("Row {}: unreadable {} \"{}\", using 0", line, name, raw);
        0
    })
}

fn session_from_record(record: &StringRecord, line: usize) -> StudySession {
    if record.len() != SESSION_HEADER.len() {
        warn!(
            "Row {} has {} columns, expected {}",
            line,
            record.len(),
            SESSION_HEADER.len()
        );
    }

    StudySession {
        date: field(record, 0),
        time: field(record, 1),
        subject: field(record, 2),
        notes: field(record, 3),
        xp: count_field(record, 4, "XP", line),
        minutes: count_field(record, 5, "minutes", line),
    }
}

fn draft_from_record(record: &StringRecord, line: usize) -> EntryDraft {
    if record.len() < JOURNAL_HEADER.len() - 1 || record.len() > JOURNAL_HEADER.len() {
        warn!("Journal row {} has {} columns", line, record.len());
    }

    let attachments: Vec<PathBuf> = record
        .get(3)
        .filter(|a| !a.is_empty())
        .map(|a| a.split(ATTACHMENT_DELIMITER).map(PathBuf::from).collect())
        .unwrap_or_default();

    EntryDraft {
        date: field(record, 0),
        time: field(record, 1),
        content: field(record, 2),
        attachments,
        title: record.get(4).map(str::to_string),
    }
}
