use std::{
    fs::{read_to_string, OpenOptions},
    io::Write,
    path::Path,
    process::Command,
};

use log::info;
use shell_words::split;
use tempfile::Builder;
use which::which;

use crate::{Result, StudyError};

/// Editor to launch: `$VISUAL`, then `$EDITOR`, then a platform default
pub fn editor_command() -> String {
    for var in ["VISUAL", "EDITOR"] {
        if let Ok(editor) = std::env::var(var) {
            if !editor.trim().is_empty() {
                return editor;
            }
        }
    }

    if cfg!(windows) {
        "notepad".to_string()
    } else if cfg!(target_os = "macos") {
        "open -W -t".to_string()
    } else {
        for editor in &["nano", "vim", "vi", "emacs"] {
            if which(editor).is_ok() {
                return editor.to_string();
            }
        }
        "nano".to_string()
    }
}

/// Opens the user's editor on a scratch Markdown file and returns what was
/// written, without the instruction comments
pub fn compose_in_editor() -> Result<String> {
    let temp_file = Builder::new().suffix(".md").tempfile()?;
    let temp_path = temp_file.path().to_path_buf();

    write_template(&temp_path)?;

    info!("Opening editor for the journal entry. Save and exit when done...");
    launch_editor(&editor_command(), &temp_path)?;

    let content = read_to_string(&temp_path)?;
    Ok(strip_template(&content))
}

fn write_template(path: &Path) -> Result<()> {
    let mut file = OpenOptions::new().write(true).open(path)?;
    writeln!(file, "<!--")?;
    writeln!(file, "Write your journal entry below in Markdown.")?;
    writeln!(file, "Use - [ ] for checklist items. Save and exit when you're done.")?;
    writeln!(file, "-->")?;
    writeln!(file)?;
    Ok(())
}

fn launch_editor(editor_cmd: &str, file_path: &Path) -> Result<()> {
    let args = split(editor_cmd).map_err(|e| StudyError::EditorError {
        message: format!("Failed to parse editor command: {}", e),
    })?;

    let Some((program, rest)) = args.split_first() else {
        return Err(StudyError::EditorError {
            message: "Empty editor command".to_string(),
        });
    };

    let status = Command::new(program).args(rest).arg(file_path).status()?;
    if !status.success() {
        return Err(StudyError::EditorError {
            message: "Editor exited with non-zero status".to_string(),
        });
    }
    Ok(())
}

/// Drops the leading instruction comment block
fn strip_template(content: &str) -> String {
    let mut in_comment = false;
    content
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            if in_comment {
                if trimmed.ends_with("-->") {
                    in_comment = false;
                }
                return false;
            }
            if trimmed.starts_with("<!--") {
                in_comment = !trimmed.ends_with("-->");
                return false;
            }
            true
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
