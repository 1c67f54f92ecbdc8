use log::info;

use crate::{Result, StudyError};

/// Subjects offered when no subjects file exists yet
pub const DEFAULT_SUBJECTS: [&str; 3] = ["Physics", "Chemistry", "Biology"];

/// The pick list of subject names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subjects {
    names: Vec<String>,
}

impl Default for Subjects {
    fn default() -> Self {
        Self {
            names: DEFAULT_SUBJECTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Subjects {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Adds a subject, returning the stored (trimmed) name
    pub fn add(&mut self, name: &str) -> Result<&str> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StudyError::MissingField {
                field: "Subject name".to_string(),
            });
        }
        if self.contains(name) {
            return Err(StudyError::DuplicateSubject {
                name: name.to_string(),
            });
        }

        info!("Adding subject '{}'", name);
        self.names.push(name.to_string());
        Ok(&self.names[self.names.len() - 1])
    }
}
