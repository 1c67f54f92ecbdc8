use std::{
    io::{stdout, Write},
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
};

use log::{debug, warn};
use which::which;

use crate::{AlarmSink, Result, StudyError};

/// Command-line audio players tried in order, with the arguments they need
/// to play a file once without a window
const PLAYERS: [(&str, &[&str]); 4] = [
    ("paplay", &[]),
    ("aplay", &["-q"]),
    ("afplay", &[]),
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
];

/// Plays alarm sounds through an external player and rings the terminal
/// bell for system alerts
pub struct TerminalAlarm {
    player: Option<(PathBuf, &'static [&'static str])>,
    child: Option<Child>,
}

impl Default for TerminalAlarm {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalAlarm {
    pub fn new() -> Self {
        let player = PLAYERS
            .iter()
            .find_map(|(name, args)| which(name).ok().map(|path| (path, *args)));
        match &player {
            Some((path, _)) => debug!("Using {} for alarm sounds", path.display()),
            None => debug!("No audio player found, alarms will use the terminal bell"),
        }
        Self {
            player,
            child: None,
        }
    }
}

impl AlarmSink for TerminalAlarm {
    fn play(&mut self, sound: &Path) -> Result<()> {
        let (player, args) = self.player.as_ref().ok_or_else(|| StudyError::AlarmError {
            message: "no audio player found on PATH".to_string(),
        })?;

        let child = Command::new(player)
            .args(args.iter())
            .arg(sound)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| StudyError::AlarmError {
                message: format!("failed to start {}: {}", player.display(), e),
            })?;
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("Alarm player already finished: {}", e);
            }
            match child.wait() {
                Ok(status) => debug!("Alarm player exited with {}", status),
                Err(e) => debug!("Could not reap alarm player: {}", e),
            }
        }
    }

    fn beep(&mut self) {
        let mut out = stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
            warn!("Could not ring the terminal bell: {}", e);
        }
    }
}

impl Drop for TerminalAlarm {
    fn drop(&mut self) {
        self.stop();
    }
}
