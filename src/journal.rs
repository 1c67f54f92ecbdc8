//! Journal entries and their calendar tree.
//!
//! Entries are kept in arrival order. Each entry gets an [`EntryId`] derived
//! from its stored date, time, content and attachments, and tree leaves refer
//! to entries by that id. Ids stay valid across reloads and when other
//! entries are added or removed. Renaming does not change an id.
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, info, trace};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::{Result, StudyError, DATE_FORMAT, TIME_FORMAT};

/// Separator between attachment paths in the journal file
pub const ATTACHMENT_DELIMITER: &str = "||";

/// Opaque identifier of a journal entry.
///
/// Printed as eight hex digits of the entry's content hash. Entries with
/// identical fields get a `-N` suffix in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId {
    digest: u32,
    seq: u32,
}

impl EntryId {
    fn digest_of(date: &str, time: &str, content: &str, attachments: &[PathBuf]) -> u32 {
        let mut hasher = Sha256::new();
        for part in [date, time, content] {
            hasher.update(part.as_bytes());
            hasher.update([0x1f]);
        }
        for path in attachments {
            hasher.update(path.to_string_lossy().as_bytes());
            hasher.update([0x1e]);
        }
        let result = hasher.finalize();
        u32::from_be_bytes([result[0], result[1], result[2], result[3]])
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seq == 0 {
            write!(f, "{:08x}", self.digest)
        } else {
            write!(f, "{:08x}-{}", self.digest, self.seq)
        }
    }
}

impl Serialize for EntryId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for EntryId {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self> {
        let not_found = || StudyError::EntryNotFound { id: s.to_string() };
        let trimmed = s.trim();
        let (digest, seq) = match trimmed.split_once('-') {
            Some((digest, seq)) => (digest, seq.parse::<u32>().map_err(|_| not_found())?),
            None => (trimmed, 0),
        };
        if digest.is_empty() || digest.len() > 8 {
            return Err(not_found());
        }
        let digest = u32::from_str_radix(digest, 16).map_err(|_| not_found())?;
        Ok(EntryId { digest, seq })
    }
}

/// Fields of an entry before it joins the journal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDraft {
    pub date: String,
    pub time: String,
    pub content: String,
    pub attachments: Vec<PathBuf>,
    pub title: Option<String>,
}

/// Represents a single journal entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JournalEntry {
    pub id: EntryId,
    /// Day written, `YYYY-MM-DD`
    pub date: String,
    /// Clock time written, `HH:MM`
    pub time: String,
    /// Rich-text markup
    pub content: String,
    /// Referenced files; the journal never owns or removes them
    pub attachments: Vec<PathBuf>,
    pub title: String,
}

impl JournalEntry {
    /// Title used when none was given
    pub fn default_title(date: &str, time: &str) -> String {
        format!("{} {}", date, time)
    }
}

/// Checks that an attachment path can be stored in the journal file.
pub fn validate_attachment(path: &Path) -> Result<()> {
    if path.to_string_lossy().contains(ATTACHMENT_DELIMITER) {
        return Err(StudyError::InvalidAttachment {
            path: path.to_path_buf(),
            message: format!("path may not contain \"{}\"", ATTACHMENT_DELIMITER),
        });
    }
    Ok(())
}

/// A node of the calendar tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalNode {
    Year(String),
    Month { year: String, month: String },
    Day { year: String, month: String, day: String },
    Entry(EntryId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearNode {
    pub year: String,
    pub months: Vec<MonthNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthNode {
    /// Two-digit month key
    pub month: String,
    /// Full month name for display
    pub name: String,
    pub days: Vec<DayNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayNode {
    /// Two-digit day key
    pub day: String,
    /// Entries in arrival order
    pub entries: Vec<EntryId>,
}

/// Journal entries grouped by year, month and day, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JournalTree {
    pub years: Vec<YearNode>,
    /// Entries whose date could not be read
    pub undated: Vec<EntryId>,
}

type DayMap = BTreeMap<String, Vec<EntryId>>;

/// Ordered collection of journal entries
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a journal from loaded drafts
    pub fn from_drafts(drafts: Vec<EntryDraft>) -> Self {
        let mut journal = Self::new();
        for draft in drafts {
            journal.insert(draft);
        }
        journal
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends an entry with explicit date, time and title
    pub fn insert(&mut self, draft: EntryDraft) -> EntryId {
        let digest = EntryId::digest_of(&draft.date, &draft.time, &draft.content, &draft.attachments);
        let seq = self
            .entries
            .iter()
            .filter(|e| e.id.digest == digest)
            .map(|e| e.id.seq + 1)
            .max()
            .unwrap_or(0);
        let id = EntryId { digest, seq };
        trace!("Assigned id {} to entry dated {}", id, draft.date);
        let title = match draft.title {
            Some(title) if !title.trim().is_empty() => title,
            _ => JournalEntry::default_title(&draft.date, &draft.time),
        };

        self.entries.push(JournalEntry {
            id,
            date: draft.date,
            time: draft.time,
            content: draft.content,
            attachments: draft.attachments,
            title,
        });
        id
    }

    /// Saves editor content as a new entry stamped with `now`
    pub fn add(
        &mut self,
        content: String,
        attachments: Vec<PathBuf>,
        now: NaiveDateTime,
    ) -> Result<EntryId> {
        for path in &attachments {
            validate_attachment(path)?;
        }

        let id = self.insert(EntryDraft {
            date: now.format(DATE_FORMAT).to_string(),
            time: now.format(TIME_FORMAT).to_string(),
            content,
            attachments,
            title: None,
        });
        info!("Added journal entry {}", id);
        Ok(id)
    }

    pub fn get(&self, id: EntryId) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn position(&self, id: EntryId) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(StudyError::EntryNotFound { id: id.to_string() })
    }

    /// Changes only the title of an entry
    pub fn rename(&mut self, id: EntryId, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(StudyError::MissingField {
                field: "Title".to_string(),
            });
        }
        let position = self.position(id)?;
        debug!("Renaming journal entry {} to '{}'", id, title);
        self.entries[position].title = title.to_string();
        Ok(())
    }

    /// Removes an entry; its attachment files are left alone
    pub fn delete(&mut self, id: EntryId) -> Result<JournalEntry> {
        let position = self.position(id)?;
        info!("Deleting journal entry {}", id);
        Ok(self.entries.remove(position))
    }

    /// Entry behind a tree node, if the node is a leaf
    pub fn context(&self, node: &JournalNode) -> Option<&JournalEntry> {
        match node {
            JournalNode::Entry(id) => self.get(*id),
            _ => None,
        }
    }

    /// Groups entries into a year → month → day tree, newest first at
    /// every level
    pub fn tree(&self) -> JournalTree {
        let mut groups: BTreeMap<String, BTreeMap<String, DayMap>> = BTreeMap::new();
        let mut undated = Vec::new();

        for entry in &self.entries {
            match NaiveDate::parse_from_str(&entry.date, DATE_FORMAT) {
                Ok(date) => groups
                    .entry(date.format("%Y").to_string())
                    .or_default()
                    .entry(date.format("%m").to_string())
                    .or_default()
                    .entry(date.format("%d").to_string())
                    .or_default()
                    .push(entry.id),
                Err(_) => undated.push(entry.id),
            }
        }

        let years = groups
            .into_iter()
            .rev()
            .map(|(year, months)| YearNode {
                months: months
                    .into_iter()
                    .rev()
                    .map(|(month, days)| MonthNode {
                        name: month_name(&year, &month),
                        days: days
                            .into_iter()
                            .rev()
                            .map(|(day, entries)| DayNode { day, entries })
                            .collect(),
                        month,
                    })
                    .collect(),
                year,
            })
            .collect();

        JournalTree { years, undated }
    }
}

fn month_name(year: &str, month: &str) -> String {
    NaiveDate::parse_from_str(&format!("{}-{}-01", year, month), DATE_FORMAT)
        .map(|d| d.format("%B").to_string())
        .unwrap_or_else(|_| month.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(date: &str, title: Option<&str>) -> EntryDraft {
        EntryDraft {
            date: date.to_string(),
            time: "08:30".to_string(),
            content: format!("<p>{}</p>", date),
            attachments: Vec::new(),
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn tree_orders_newest_first() {
        let journal = Journal::from_drafts(vec![
            draft("2024-01-05", None),
            draft("2024-01-20", None),
            draft("2023-12-01", None),
        ]);
        let tree = journal.tree();

        let years: Vec<_> = tree.years.iter().map(|y| y.year.as_str()).collect();
        assert_eq!(years, vec!["2024", "2023"]);

        let january = &tree.years[0].months[0];
        assert_eq!(january.month, "01");
        assert_eq!(january.name, "January");
        let days: Vec<_> = january.days.iter().map(|d| d.day.as_str()).collect();
        assert_eq!(days, vec!["20", "05"]);

        assert_eq!(tree.years[1].months[0].name, "December");
    }

    #[test]
    fn same_day_entries_keep_arrival_order() {
        let journal = Journal::from_drafts(vec![
            draft("2024-02-02", Some("morning")),
            draft("2024-02-02", Some("evening")),
        ]);
        let day = &journal.tree().years[0].months[0].days[0];
        let titles: Vec<_> = day
            .entries
            .iter()
            .map(|id| journal.get(*id).unwrap().title.as_str())
            .collect();
        assert_eq!(titles, vec!["morning", "evening"]);
    }

    #[test]
    fn unparsable_dates_are_kept_aside() {
        let journal = Journal::from_drafts(vec![draft("someday", None), draft("2024-02-02", None)]);
        let tree = journal.tree();
        assert_eq!(tree.years.len(), 1);
        assert_eq!(tree.undated.len(), 1);
    }

    #[test]
    fn missing_title_defaults_to_timestamp() {
        let journal = Journal::from_drafts(vec![draft("2024-03-09", None), draft("2024-03-09", Some(" "))]);
        assert_eq!(journal.entries()[0].title, "2024-03-09 08:30");
        assert_eq!(journal.entries()[1].title, "2024-03-09 08:30");
    }

    #[test]
    fn ids_survive_deleting_other_entries() {
        let mut journal = Journal::from_drafts(vec![
            draft("2024-01-01", Some("a")),
            draft("2024-01-02", Some("b")),
            draft("2024-01-03", Some("c")),
        ]);
        let c = journal.entries()[2].id;
        let a = journal.entries()[0].id;
        journal.delete(a).unwrap();
        assert_eq!(journal.get(c).unwrap().title, "c");
        assert!(journal.get(a).is_none());
        assert!(matches!(journal.delete(a), Err(StudyError::EntryNotFound { .. })));
    }

    #[test]
    fn rename_changes_title_only() {
        let mut journal = Journal::from_drafts(vec![draft("2024-01-01", None)]);
        let id = journal.entries()[0].id;
        journal.rename(id, "  Exam prep ").unwrap();
        let entry = journal.get(id).unwrap();
        assert_eq!(entry.title, "Exam prep");
        assert_eq!(entry.content, "<p>2024-01-01</p>");
        assert!(matches!(journal.rename(id, ""), Err(StudyError::MissingField { .. })));
    }

    #[test]
    fn only_leaves_expose_an_entry() {
        let journal = Journal::from_drafts(vec![draft("2024-01-01", None)]);
        let id = journal.entries()[0].id;
        assert!(journal.context(&JournalNode::Year("2024".into())).is_none());
        assert!(journal
            .context(&JournalNode::Day {
                year: "2024".into(),
                month: "01".into(),
                day: "01".into()
            })
            .is_none());
        assert_eq!(journal.context(&JournalNode::Entry(id)).unwrap().id, id);
    }

    #[test]
    fn add_rejects_delimiter_in_attachment() {
        let mut journal = Journal::new();
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let err = journal
            .add("x".into(), vec![PathBuf::from("/tmp/a||b.png")], now)
            .unwrap_err();
        assert!(matches!(err, StudyError::InvalidAttachment { .. }));
        assert!(journal.is_empty());

        let id = journal
            .add("<b>hi</b>".into(), vec![PathBuf::from("/tmp/a.png")], now)
            .unwrap();
        assert_eq!(journal.get(id).unwrap().title, "2024-05-01 12:00");
    }

    #[test]
    fn entry_id_parses_from_display() {
        let journal = Journal::from_drafts(vec![draft("2024-01-01", None)]);
        let id = journal.entries()[0].id;
        assert_eq!(id.to_string().parse::<EntryId>().unwrap(), id);
        assert_eq!(id.to_string().len(), 8);
        assert_eq!(serde_json::to_string(&id).unwrap(), format!("\"{}\"", id));
        assert!("xyz".parse::<EntryId>().is_err());
        assert!("123456789".parse::<EntryId>().is_err());
        assert!("0000abcd-x".parse::<EntryId>().is_err());
    }

    #[test]
    fn ids_follow_content_not_position() {
        let drafts = vec![
            draft("2024-01-01", Some("a")),
            draft("2024-01-02", Some("b")),
            draft("2024-01-03", Some("c")),
        ];
        let full = Journal::from_drafts(drafts.clone());
        let without_first = Journal::from_drafts(drafts[1..].to_vec());
        assert_eq!(full.entries()[2].id, without_first.entries()[1].id);

        let mut renamed = full.clone();
        let id = renamed.entries()[0].id;
        renamed.rename(id, "new title").unwrap();
        let reloaded = Journal::from_drafts(vec![EntryDraft {
            title: Some("new title".to_string()),
            ..drafts[0].clone()
        }]);
        assert_eq!(reloaded.entries()[0].id, id);
    }

    #[test]
    fn identical_entries_get_distinct_ids() {
        let mut journal = Journal::from_drafts(vec![
            draft("2024-04-04", Some("first")),
            draft("2024-04-04", Some("second")),
        ]);
        let first = journal.entries()[0].id;
        let second = journal.entries()[1].id;
        assert_ne!(first, second);
        assert!(second.to_string().ends_with("-1"));
        assert_eq!(second.to_string().parse::<EntryId>().unwrap(), second);

        journal.delete(first).unwrap();
        let third = journal.insert(draft("2024-04-04", Some("third")));
        assert_ne!(third, second);
        assert_eq!(journal.get(second).unwrap().title, "second");
    }
}
