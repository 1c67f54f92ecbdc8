//! Study sessions and the ordered log that holds them.
use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{progression, Progression, Result, StudyError};

/// Date format used for session and journal rows
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Clock format used for session and journal rows
pub const TIME_FORMAT: &str = "%H:%M";

/// One logged study record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    /// Day the session was logged, `YYYY-MM-DD`
    pub date: String,
    /// Clock time the session was logged, `HH:MM`
    pub time: String,
    /// Subject studied
    pub subject: String,
    /// Free-form notes
    pub notes: String,
    /// Experience points awarded
    pub xp: u32,
    /// Minutes studied
    pub minutes: u32,
}

impl StudySession {
    /// Creates a session stamped with `now`
    pub fn new(
        subject: String,
        notes: String,
        xp: u32,
        minutes: u32,
        now: NaiveDateTime,
    ) -> Self {
        StudySession {
            date: now.format(DATE_FORMAT).to_string(),
            time: now.format(TIME_FORMAT).to_string(),
            subject,
            notes,
            xp,
            minutes,
        }
    }
}

/// Parses a non-negative count typed by the user.
pub fn parse_count(field: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| StudyError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
}

/// The rows currently on display, mapped back to positions in the log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    positions: Vec<usize>,
}

impl SessionView {
    /// Number of displayed rows
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Storage position behind a display row
    pub fn position(&self, row: usize) -> Result<usize> {
        self.positions
            .get(row)
            .copied()
            .ok_or(StudyError::RowOutOfRange {
                row,
                len: self.positions.len(),
            })
    }

    /// Storage positions in display order
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }
}

/// Ordered collection of study sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionLog {
    sessions: Vec<StudySession>,
}

impl SessionLog {
    pub fn new(sessions: Vec<StudySession>) -> Self {
        Self { sessions }
    }

    pub fn sessions(&self) -> &[StudySession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Adds a session at the end of the log
    pub fn append(&mut self, session: StudySession) {
        debug!("Appending session for subject '{}'", session.subject);
        self.sessions.push(session);
    }

    /// Validates raw form input and appends the resulting session.
    ///
    /// Nothing is added unless every field is valid. Subject and notes are
    /// stored with surrounding whitespace trimmed.
    pub fn record(
        &mut self,
        subject: &str,
        notes: &str,
        xp: &str,
        minutes: &str,
        now: NaiveDateTime,
    ) -> Result<&StudySession> {
        let xp = parse_count("XP", xp)?;
        let minutes = parse_count("Time studied", minutes)?;
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(StudyError::MissingField {
                field: "Subject".to_string(),
            });
        }

        let session = StudySession::new(
            subject.to_string(),
            notes.trim().to_string(),
            xp,
            minutes,
            now,
        );
        info!(
            "Logged {} XP / {} min of {}",
            session.xp, session.minutes, session.subject
        );
        self.append(session);
        Ok(&self.sessions[self.sessions.len() - 1])
    }

    /// Rows whose subject contains `query`, ignoring case.
    ///
    /// Only the subject is matched; notes are not searched.
    pub fn filter(&self, query: &str) -> SessionView {
        let needle = query.to_lowercase();
        let positions = self
            .sessions
            .iter()
            .enumerate()
            .filter(|(_, s)| s.subject.to_lowercase().contains(&needle))
            .map(|(i, _)| i)
            .collect();
        SessionView { positions }
    }

    /// View over every session in storage order
    pub fn all(&self) -> SessionView {
        SessionView {
            positions: (0..self.sessions.len()).collect(),
        }
    }

    /// Session shown at `row` of `view`
    pub fn get(&self, view: &SessionView, row: usize) -> Result<&StudySession> {
        let position = view.position(row)?;
        self.sessions.get(position).ok_or(StudyError::RowOutOfRange {
            row,
            len: view.len(),
        })
    }

    /// XP summed over the whole log, regardless of any filter
    pub fn total_xp(&self) -> u64 {
        self.sessions.iter().map(|s| s.xp as u64).sum()
    }

    pub fn total_minutes(&self) -> u64 {
        self.sessions.iter().map(|s| s.minutes as u64).sum()
    }

    pub fn progression(&self) -> Progression {
        progression(self.total_xp())
    }

    /// Stable, case-insensitive sort on subject
    pub fn sort_by_subject(&mut self) {
        self.sessions.sort_by_cached_key(|s| s.subject.to_lowercase());
    }

    /// Deletes the sessions shown at `rows` of `view`.
    ///
    /// All rows are resolved before anything is removed; an unknown row
    /// rejects the whole call.
    pub fn delete_rows(&mut self, view: &SessionView, rows: &[usize]) -> Result<Vec<StudySession>> {
        let mut positions = rows
            .iter()
            .map(|&row| view.position(row))
            .collect::<Result<Vec<_>>>()?;
        if let Some(&bad) = positions.iter().find(|&&p| p >= self.sessions.len()) {
            return Err(StudyError::RowOutOfRange {
                row: bad,
                len: self.sessions.len(),
            });
        }

        positions.sort_unstable_by(|a, b| b.cmp(a));
        positions.dedup();

        let mut removed: Vec<StudySession> = positions
            .into_iter()
            .map(|p| self.sessions.remove(p))
            .collect();
        removed.reverse();
        info!("Deleted {} session(s)", removed.len());
        Ok(removed)
    }

    /// Minutes studied per date, oldest first
    pub fn daily_minutes(&self) -> BTreeMap<String, u64> {
        let mut per_day = BTreeMap::new();
        for session in &self.sessions {
            *per_day.entry(session.date.clone()).or_insert(0) += session.minutes as u64;
        }
        per_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 15, 0)
            .unwrap()
    }

    fn sample() -> SessionLog {
        let mut log = SessionLog::default();
        log.record("Physics", "kinematics", "300", "45", at(1, 9)).unwrap();
        log.record("chemistry", "", "200", "30", at(1, 14)).unwrap();
        log.record("Biology", "cells", "150", "20", at(2, 10)).unwrap();
        log.record("Physical Education", "", "50", "60", at(3, 8)).unwrap();
        log
    }

    #[test]
    fn record_stamps_date_and_time() {
        let log = sample();
        let first = &log.sessions()[0];
        assert_eq!(first.date, "2024-03-01");
        assert_eq!(first.time, "09:15");
        assert_eq!(first.xp, 300);
        assert_eq!(first.minutes, 45);
    }

    #[test]
    fn invalid_numbers_do_not_mutate() {
        let mut log = sample();
        let err = log.record("Physics", "", "lots", "10", at(4, 9)).unwrap_err();
        assert!(matches!(err, StudyError::InvalidNumber { ref field, .. } if field == "XP"));
        let err = log.record("Physics", "", "10", "-5", at(4, 9)).unwrap_err();
        assert!(matches!(err, StudyError::InvalidNumber { .. }));
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn record_trims_subject_and_notes() {
        let mut log = SessionLog::default();
        let session = log.record("  Physics ", "\tread ch. 2  \n", "10", "5", at(4, 9)).unwrap();
        assert_eq!(session.subject, "Physics");
        assert_eq!(session.notes, "read ch. 2");
    }

    #[test]
    fn blank_subject_is_rejected() {
        let mut log = sample();
        let err = log.record("   ", "", "10", "10", at(4, 9)).unwrap_err();
        assert!(matches!(err, StudyError::MissingField { .. }));
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn filter_matches_subject_case_insensitively() {
        let log = sample();
        let view = log.filter("PHYS");
        assert_eq!(view.positions(), &[0, 3]);
        assert_eq!(log.filter("").len(), 4);
    }

    #[test]
    fn filter_ignores_notes() {
        let log = sample();
        assert!(log.filter("cells").is_empty());
    }

    #[test]
    fn empty_filter_result_keeps_global_total() {
        let log = sample();
        let before = log.total_xp();
        assert!(log.filter("history").is_empty());
        assert_eq!(log.total_xp(), before);
        assert_eq!(before, 700);
    }

    #[test]
    fn sort_is_case_insensitive_and_stable() {
        let mut log = sample();
        log.append(StudySession::new("biology".into(), "second".into(), 1, 1, at(5, 9)));
        log.sort_by_subject();
        let subjects: Vec<_> = log.sessions().iter().map(|s| s.subject.as_str()).collect();
        assert_eq!(
            subjects,
            vec!["Biology", "biology", "chemistry", "Physical Education", "Physics"]
        );
        assert_eq!(log.sessions()[1].notes, "second");
    }

    #[test]
    fn delete_through_filtered_view_hits_underlying_rows() {
        let mut log = sample();
        let view = log.filter("phys");
        let removed = log.delete_rows(&view, &[1]).unwrap();
        assert_eq!(removed[0].subject, "Physical Education");
        let subjects: Vec<_> = log.sessions().iter().map(|s| s.subject.as_str()).collect();
        assert_eq!(subjects, vec!["Physics", "chemistry", "Biology"]);
    }

    #[test]
    fn delete_order_does_not_matter() {
        let mut a = sample();
        let mut b = sample();
        let view_a = a.all();
        let view_b = b.all();
        a.delete_rows(&view_a, &[0, 2]).unwrap();
        b.delete_rows(&view_b, &[2, 0, 2]).unwrap();
        assert_eq!(a.sessions(), b.sessions());
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn out_of_range_row_rejects_whole_delete() {
        let mut log = sample();
        let view = log.filter("phys");
        let err = log.delete_rows(&view, &[0, 5]).unwrap_err();
        assert!(matches!(err, StudyError::RowOutOfRange { row: 5, len: 2 }));
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn daily_minutes_groups_by_date() {
        let log = sample();
        let per_day: Vec<_> = log.daily_minutes().into_iter().collect();
        assert_eq!(
            per_day,
            vec![
                ("2024-03-01".to_string(), 75),
                ("2024-03-02".to_string(), 20),
                ("2024-03-03".to_string(), 60),
            ]
        );
    }

    #[test]
    fn parse_count_trims_whitespace() {
        assert_eq!(parse_count("XP", " 42 ").unwrap(), 42);
        assert!(parse_count("XP", "4.5").is_err());
    }
}
