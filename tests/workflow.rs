use chrono::{NaiveDate, NaiveDateTime};
use studylog::{Config, JournalNode, Storage, StudyError};
use tempfile::TempDir;

fn at(month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, month, day)
        .unwrap()
        .and_hms_opt(18, 30, 0)
        .unwrap()
}

#[test]
fn logging_sessions_levels_up_and_persists() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(&Config::new(dir.path().to_path_buf()));
    storage.initialize().unwrap();

    let mut log = storage.load_sessions().unwrap();
    log.record("Physics", "mechanics", "800", "50", at(3, 1)).unwrap();
    log.record("Chemistry", "", "400", "25", at(3, 2)).unwrap();
    assert!(log.record("Biology", "", "ten", "25", at(3, 3)).is_err());
    storage.save_sessions(&log).unwrap();

    let reloaded = storage.load_sessions().unwrap();
    assert_eq!(reloaded.len(), 2);
    let p = reloaded.progression();
    assert_eq!((p.level, p.remainder, p.required), (1, 200, 2000));
}

#[test]
fn filtered_delete_then_sort_persists_expected_order() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(&Config::new(dir.path().to_path_buf()));
    storage.initialize().unwrap();

    let mut log = storage.load_sessions().unwrap();
    for (subject, xp) in [("maths", 10), ("Physics", 20), ("Maths", 30), ("art", 40)] {
        log.record(subject, "", &xp.to_string(), "5", at(3, 1)).unwrap();
    }

    let view = log.filter("MATH");
    assert_eq!(view.len(), 2);
    log.delete_rows(&view, &[1, 0]).unwrap();
    log.sort_by_subject();
    storage.save_sessions(&log).unwrap();

    let subjects: Vec<_> = storage
        .load_sessions()
        .unwrap()
        .sessions()
        .iter()
        .map(|s| s.subject.clone())
        .collect();
    assert_eq!(subjects, vec!["art", "Physics"]);
}

#[test]
fn journal_tree_navigation_after_reload() {
    let dir = TempDir::new().unwrap();
    let storage = Storage::new(&Config::new(dir.path().to_path_buf()));
    storage.initialize().unwrap();

    let mut journal = storage.load_journal().unwrap();
    journal.add("<p>a</p>".into(), Vec::new(), at(1, 5)).unwrap();
    journal.add("<p>b</p>".into(), Vec::new(), at(1, 20)).unwrap();
    journal.add("<p>c</p>".into(), Vec::new(), at(12, 1)).unwrap();
    storage.save_journal(&journal).unwrap();

    let mut journal = storage.load_journal().unwrap();
    let tree = journal.tree();
    let months: Vec<_> = tree.years[0].months.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(months, vec!["December", "January"]);

    let january = &tree.years[0].months[1];
    let newest = january.days[0].entries[0];
    assert_eq!(january.days[0].day, "20");
    assert_eq!(journal.context(&JournalNode::Entry(newest)).unwrap().content, "<p>b</p>");
    assert!(journal
        .context(&JournalNode::Month {
            year: "2024".into(),
            month: "01".into()
        })
        .is_none());

    journal.rename(newest, "Exam eve").unwrap();
    assert!(matches!(journal.rename(newest, "  "), Err(StudyError::MissingField { .. })));
    storage.save_journal(&journal).unwrap();

    let reloaded = storage.load_journal().unwrap();
    assert!(reloaded.entries().iter().any(|e| e.title == "Exam eve"));
}
