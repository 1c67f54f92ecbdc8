//! CLI module for the studylog application
//!
//! This module turns parsed commands into operations on the session log,
//! subjects list, journal and break timer, and prints the results.
use std::{
    fs::{self, read_to_string},
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
};

use console::style;
use log::{debug, info, warn};
use tokio::{signal, time};

use super::{editor::compose_in_editor, TerminalAlarm};
use crate::{
    format_clock, markdown_to_html, now_local, strip_markup, truncate, BreakDuration, BreakTimer,
    Commands, Config, EntryId, Journal, JournalCommands, JournalEntry, Progression, Result,
    SessionLog, SessionView, Storage, StudyError, Subjects, TimerState, ALARM_REPEAT_INTERVAL,
    TICK_INTERVAL,
};

/// Loads the config file, asking for a data folder when none is usable.
///
/// `data_dir` overrides the stored folder for this run without saving it.
pub fn resolve_config(config_path: &Path, data_dir: Option<PathBuf>) -> Result<Config> {
    let loaded = Config::load(config_path).unwrap_or_else(|e| {
        warn!("{}, choosing a new data folder", e);
        None
    });

    let mut config = match loaded {
        Some(config) => config,
        None if data_dir.is_some() => Config::new(Config::default_data_dir()),
        None => {
            let config = Config::new(choose_data_dir()?);
            config.persist(config_path);
            config
        }
    };

    if let Some(dir) = data_dir {
        debug!("Using data folder {} for this run", dir.display());
        config.data_dir = dir;
    }
    Ok(config)
}

/// Asks on the terminal which folder should hold the data files
pub fn choose_data_dir() -> Result<PathBuf> {
    let default = Config::default_data_dir();
    println!("Choose a folder to store your study tracker data files.");
    println!("You can change this later with `studylog config --set data_dir=...`.");
    print!("Data folder [{}]: ", default.display());
    stdout().flush()?;

    let mut input = String::new();
    stdin().read_line(&mut input)?;
    let input = input.trim();
    if input.is_empty() {
        return Ok(default);
    }

    let dir = PathBuf::from(input);
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(|_| StudyError::DirectoryError { path: dir.clone() })?;
    }
    if !dir.is_dir() {
        return Err(StudyError::DirectoryError { path: dir });
    }
    Ok(dir)
}

/// CLI Application handler - processes CLI commands against the loaded data
pub struct App {
    /// Application configuration
    config: Config,

    /// Where the configuration is saved
    config_path: PathBuf,

    storage: Storage,
    sessions: SessionLog,
    subjects: Subjects,
    journal: Journal,

    /// Whether to display verbose output
    verbose: bool,
}

impl App {
    /// Opens the data folder and loads every record file
    pub fn new(config: Config, config_path: PathBuf, verbose: bool) -> Result<Self> {
        let storage = Storage::new(&config);
        storage.initialize()?;

        let sessions = storage.load_sessions()?;
        let subjects = storage.load_subjects();
        let journal = storage.load_journal()?;

        Ok(Self {
            config,
            config_path,
            storage,
            sessions,
            subjects,
            journal,
            verbose,
        })
    }

    /// Run the CLI application with the given command
    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Log {
                subject,
                xp,
                minutes,
                notes,
            } => self.log_session(&subject, &notes, &xp, &minutes)?,

            Commands::List { filter, json } => self.list_sessions(filter.as_deref(), json)?,

            Commands::Show { row, filter } => self.show_session(row, filter.as_deref())?,

            Commands::Sort => {
                self.sessions.sort_by_subject();
                self.storage.save_sessions(&self.sessions)?;
                println!("Sessions sorted by subject.");
                self.list_sessions(None, false)?;
            }

            Commands::Delete {
                rows,
                filter,
                force,
            } => self.delete_sessions(&rows, filter.as_deref(), force)?,

            Commands::Stats => self.show_stats(),

            Commands::Subjects { add } => self.handle_subjects(add)?,

            Commands::Journal(command) => self.run_journal(command)?,

            Commands::Timer { minutes, seconds } => self.run_timer(minutes, seconds).await?,

            Commands::Config { show, set, reset } => self.handle_config(show, set, reset)?,
        }

        Ok(())
    }

    fn log_session(&mut self, subject: &str, notes: &str, xp: &str, minutes: &str) -> Result<()> {
        let before = self.sessions.progression().level;
        let session = self
            .sessions
            .record(subject, notes, xp, minutes, now_local())?
            .clone();

        if !self.subjects.contains(&session.subject) {
            println!(
                "{} \"{}\" is not in your subjects list (add it with `studylog subjects --add`).",
                style("note:").yellow(),
                session.subject
            );
        }

        self.storage.save_sessions(&self.sessions)?;
        println!(
            "Logged {} XP and {} min of {}.",
            session.xp, session.minutes, session.subject
        );

        let progression = self.sessions.progression();
        if progression.level > before {
            println!("{}", style(format!("Level up! You are now level {}.", progression.level)).green().bold());
        }
        self.print_progress(&progression);
        Ok(())
    }

    fn view(&self, filter: Option<&str>) -> SessionView {
        match filter {
            Some(query) => self.sessions.filter(query),
            None => self.sessions.all(),
        }
    }

    fn list_sessions(&self, filter: Option<&str>, json: bool) -> Result<()> {
        let view = self.view(filter);

        if json {
            let rows: Vec<serde_json::Value> = view
                .positions()
                .iter()
                .enumerate()
                .map(|(row, &position)| {
                    serde_json::json!({
                        "row": row,
                        "session": self.sessions.sessions()[position],
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "total_xp": self.sessions.total_xp(),
                    "progression": self.sessions.progression(),
                    "sessions": rows,
                }))?
            );
            return Ok(());
        }

        self.print_progress(&self.sessions.progression());
        println!();

        if view.is_empty() {
            match filter {
                Some(query) => println!("No sessions match \"{}\".", query),
                None => println!("No sessions logged yet."),
            }
            return Ok(());
        }

        // Use terminal width for the notes column if available
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(100);
        let notes_width = term_width.saturating_sub(62).max(10);

        println!(
            "{}",
            style(format!(
                "{:>4}  {:<10}  {:<5}  {:<18}  {:<w$}  {:>6}  {:>5}",
                "#", "Date", "Time", "Subject", "Notes", "XP", "Min",
                w = notes_width
            ))
            .bold()
        );
        for (row, &position) in view.positions().iter().enumerate() {
            let s = &self.sessions.sessions()[position];
            println!(
                "{:>4}  {:<10}  {:<5}  {:<18}  {:<w$}  {:>6}  {:>5}",
                row,
                s.date,
                s.time,
                truncate(&s.subject, 18),
                truncate(&s.notes.replace('\n', " "), notes_width),
                s.xp,
                s.minutes,
                w = notes_width
            );
        }

        println!(
            "\n{} of {} session{}",
            view.len(),
            self.sessions.len(),
            if self.sessions.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    fn show_session(&self, row: usize, filter: Option<&str>) -> Result<()> {
        let view = self.view(filter);
        let session = self.sessions.get(&view, row)?;

        println!(
            "{} ({} {})",
            style(&session.subject).bold(),
            session.date,
            session.time
        );
        println!("XP: {}   Time studied: {} min", session.xp, session.minutes);
        if session.notes.is_empty() {
            println!("\n(no notes)");
        } else {
            println!("\n{}", session.notes);
        }
        Ok(())
    }

    fn delete_sessions(&mut self, rows: &[usize], filter: Option<&str>, force: bool) -> Result<()> {
        let view = self.view(filter);

        // Resolve everything up front so a bad row changes nothing
        let mut selected = Vec::with_capacity(rows.len());
        for &row in rows {
            selected.push((row, self.sessions.get(&view, row)?));
        }

        if !force {
            println!("You are about to delete the following sessions:");
            for (row, s) in &selected {
                println!("  {:>4}  {} {}  {}  {} XP", row, s.date, s.time, s.subject, s.xp);
            }
            if !confirm("Delete these sessions?")? {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        let removed = self.sessions.delete_rows(&view, rows)?;
        self.storage.save_sessions(&self.sessions)?;
        println!(
            "Deleted {} session{}.",
            removed.len(),
            if removed.len() == 1 { "" } else { "s" }
        );
        self.print_progress(&self.sessions.progression());
        Ok(())
    }

    fn show_stats(&self) {
        self.print_progress(&self.sessions.progression());
        println!(
            "Total XP: {}   Total study time: {} min across {} session{}",
            self.sessions.total_xp(),
            self.sessions.total_minutes(),
            self.sessions.len(),
            if self.sessions.len() == 1 { "" } else { "s" }
        );

        let per_day = self.sessions.daily_minutes();
        if per_day.is_empty() {
            println!("\nNo study sessions to plot.");
            return;
        }

        println!("\n{}", style("Time studied per day").bold());
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);
        let bar_width = term_width.saturating_sub(22).clamp(10, 60);
        let max = per_day.values().copied().max().unwrap_or(0).max(1);

        for (date, minutes) in &per_day {
            let len = ((*minutes as f64 / max as f64) * bar_width as f64).round() as usize;
            println!(
                "{}  {} {}",
                date,
                style("█".repeat(len)).green(),
                minutes
            );
        }
    }

    fn print_progress(&self, progression: &Progression) {
        const BAR: usize = 30;
        let filled = ((progression.fraction() * BAR as f64) as usize).min(BAR);
        println!(
            "Level: {}   XP: {} / {}   [{}{}]",
            style(progression.level).cyan().bold(),
            progression.remainder,
            progression.required,
            style("#".repeat(filled)).cyan(),
            "-".repeat(BAR - filled)
        );
    }

    fn handle_subjects(&mut self, add: Option<String>) -> Result<()> {
        if let Some(name) = add {
            let added = self.subjects.add(&name)?.to_string();
            self.storage.save_subjects(&self.subjects);
            println!("Added subject \"{}\".", added);
        }

        for name in self.subjects.names() {
            println!("  {}", name);
        }
        Ok(())
    }

    fn run_journal(&mut self, command: JournalCommands) -> Result<()> {
        match command {
            JournalCommands::Add {
                content,
                file,
                edit,
                attach,
                title,
            } => self.add_journal_entry(content, file, edit, attach, title),
            JournalCommands::Tree { json } => self.print_journal_tree(json),
            JournalCommands::Show { id, raw } => self.show_journal_entry(&id, raw),
            JournalCommands::Rename { id, title } => {
                let id: EntryId = id.parse()?;
                self.journal.rename(id, &title)?;
                self.storage.save_journal(&self.journal)?;
                println!("Entry {} renamed to \"{}\".", id, title.trim());
                Ok(())
            }
            JournalCommands::Delete { id, force } => self.delete_journal_entry(&id, force),
        }
    }

    fn add_journal_entry(
        &mut self,
        content: Option<String>,
        file: Option<PathBuf>,
        edit: bool,
        attach: Vec<PathBuf>,
        title: Option<String>,
    ) -> Result<()> {
        let chosen = [content.is_some(), file.is_some(), edit]
            .iter()
            .filter(|&&set| set)
            .count();
        if chosen > 1 {
            return Err(StudyError::EditorError {
                message: "Use only one of --content, --file and --edit".to_string(),
            });
        }

        let mut attachments = Vec::with_capacity(attach.len());
        for path in attach {
            if !path.exists() {
                return Err(StudyError::FileNotFound {
                    file_path: path.display().to_string(),
                });
            }
            attachments.push(fs::canonicalize(&path)?);
        }

        let content = match (content, file) {
            (Some(c), _) => c,
            (_, Some(file_path)) => {
                if !file_path.exists() {
                    return Err(StudyError::FileNotFound {
                        file_path: file_path.display().to_string(),
                    });
                }
                read_to_string(file_path)?
            }
            (None, None) => markdown_to_html(&compose_in_editor()?),
        };

        let id = self.journal.add(content, attachments, now_local())?;
        if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
            self.journal.rename(id, &title)?;
        }
        self.storage.save_journal(&self.journal)?;

        if let Some(entry) = self.journal.get(id) {
            println!("Journal entry {} saved as \"{}\".", id, entry.title);
        }
        Ok(())
    }

    fn print_journal_tree(&self, json: bool) -> Result<()> {
        let tree = self.journal.tree();

        if json {
            println!("{}", serde_json::to_string_pretty(&tree)?);
            return Ok(());
        }

        if self.journal.is_empty() {
            println!("The journal is empty.");
            return Ok(());
        }

        for year in &tree.years {
            println!("{}", style(&year.year).bold());
            for month in &year.months {
                println!("  {}", style(&month.name).bold());
                for day in &month.days {
                    println!("    {}", day.day);
                    for id in &day.entries {
                        if let Some(entry) = self.journal.get(*id) {
                            self.print_tree_leaf(entry, 6);
                        }
                    }
                }
            }
        }

        if !tree.undated.is_empty() {
            println!("{}", style("Undated").bold());
            for id in &tree.undated {
                if let Some(entry) = self.journal.get(*id) {
                    self.print_tree_leaf(entry, 2);
                }
            }
        }
        Ok(())
    }

    fn print_tree_leaf(&self, entry: &JournalEntry, indent: usize) {
        let clip = if entry.attachments.is_empty() { "" } else { " +" };
        println!(
            "{:indent$}[{}] {}{}",
            "",
            style(entry.id).cyan(),
            entry.title,
            clip,
            indent = indent
        );
        if self.verbose {
            let preview = strip_markup(&entry.content, 200);
            if let Some(line) = preview.lines().next() {
                println!("{:indent$}    {}", "", style(truncate(line, 60)).dim(), indent = indent);
            }
        }
    }

    fn entry(&self, id: &str) -> Result<(EntryId, &JournalEntry)> {
        let id: EntryId = id.parse()?;
        self.journal
            .get(id)
            .map(|entry| (id, entry))
            .ok_or(StudyError::EntryNotFound { id: id.to_string() })
    }

    fn show_journal_entry(&self, id: &str, raw: bool) -> Result<()> {
        let (_, entry) = self.entry(id)?;

        println!("{}", style(&entry.title).bold());
        println!("{} {}", entry.date, entry.time);
        if !entry.attachments.is_empty() {
            println!("Attachments:");
            for path in &entry.attachments {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                let missing = if path.exists() { "" } else { " (missing)" };
                println!("  {}  {}{}", name, style(path.display()).dim(), missing);
            }
        }
        println!();
        if raw {
            println!("{}", entry.content);
        } else {
            let width = terminal_size::terminal_size()
                .map(|(w, _)| w.0 as usize)
                .unwrap_or(100);
            println!("{}", strip_markup(&entry.content, width));
        }
        Ok(())
    }

    fn delete_journal_entry(&mut self, id: &str, force: bool) -> Result<()> {
        let (id, entry) = self.entry(id)?;

        if !force {
            println!("You are about to delete the following journal entry:");
            println!("ID:     {}", id);
            println!("Title:  {}", entry.title);
            println!("Date:   {} {}", entry.date, entry.time);
            if !entry.attachments.is_empty() {
                println!("Attached files stay on disk.");
            }
            if !confirm("Delete this entry?")? {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        let removed = self.journal.delete(id)?;
        self.storage.save_journal(&self.journal)?;
        println!("Journal entry '{}' ({}) has been deleted.", removed.title, id);
        Ok(())
    }

    async fn run_timer(&self, minutes: u32, seconds: u32) -> Result<()> {
        let duration = BreakDuration::new(minutes, seconds)?;
        let alarm_sound = self.config.alarm_path();
        if self.config.alarm_sound.is_some() && alarm_sound.is_none() {
            warn!("Configured alarm sound not found, using the system alert");
        }

        let mut timer = BreakTimer::new(duration, alarm_sound, TerminalAlarm::new());
        timer.start();
        println!("Break started. Press Ctrl-C to stop.");
        print_clock(&timer.display())?;

        let mut ticks = time::interval(TICK_INTERVAL);
        ticks.tick().await;

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    let state = timer.tick();
                    print_clock(&timer.display())?;
                    if state == TimerState::Expired {
                        break;
                    }
                }
                _ = signal::ctrl_c() => {
                    timer.stop();
                    println!("\nBreak timer stopped at {}.", timer.display());
                    return Ok(());
                }
            }
        }

        println!("\n{}", style("Break is over!").green().bold());
        if !timer.is_alarm_active() {
            return Ok(());
        }

        println!("Press Ctrl-C to silence the alarm.");
        let mut repeat = time::interval(ALARM_REPEAT_INTERVAL);
        repeat.tick().await;
        loop {
            tokio::select! {
                _ = repeat.tick() => {
                    timer.alarm_tick();
                }
                _ = signal::ctrl_c() => break,
            }
        }
        timer.reset();
        info!("Alarm silenced");
        Ok(())
    }

    fn handle_config(&mut self, show: bool, set: Option<String>, reset: bool) -> Result<()> {
        let show = show || (set.is_none() && !reset);

        if reset {
            let dir = choose_data_dir()?;
            let mut config = Config::new(dir);
            config.alarm_sound = self.config.alarm_sound.clone();
            config.persist(&self.config_path);
            self.config = config;
            println!("Data folder set to {}.", self.config.data_dir.display());
        }

        if let Some(assignment) = set {
            let previous_dir = self.config.data_dir.clone();
            self.config.set(&assignment)?;
            self.config.persist(&self.config_path);
            if self.config.data_dir != previous_dir {
                println!("Data folder changed. The new folder is used from the next run.");
            } else {
                println!("Configuration updated.");
            }
        }

        if show {
            println!("Config file:  {}", self.config_path.display());
            println!("Data folder:  {}", self.config.data_dir.display());
            let alarm = self
                .config
                .alarm_sound
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(System Beep)".to_string());
            println!("Alarm sound:  {}", alarm);
            println!(
                "Default break: {}",
                format_clock(BreakDuration::default().total_seconds())
            );
        }
        Ok(())
    }
}

fn print_clock(clock: &str) -> Result<()> {
    let mut out = stdout();
    write!(out, "\r  {}  ", style(clock).bold())?;
    out.flush()?;
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    println!("\nThis action cannot be undone!");
    print!("{} [y/N]: ", question);
    stdout().flush()?;

    let mut input = String::new();
    stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
