// src/break_timer.rs - Break timer state machine
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;

use crate::{Result, StudyError};

/// How often the countdown advances
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// How often a sound alarm is replayed while it is active
pub const ALARM_REPEAT_INTERVAL: Duration = Duration::from_millis(500);

pub const MAX_BREAK_MINUTES: u32 = 180;

/// Length of a break
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakDuration {
    minutes: u32,
    seconds: u32,
}

impl Default for BreakDuration {
    fn default() -> Self {
        Self {
            minutes: 5,
            seconds: 0,
        }
    }
}

impl BreakDuration {
    /// Minutes up to 180, seconds up to 59
    pub fn new(minutes: u32, seconds: u32) -> Result<Self> {
        if minutes > MAX_BREAK_MINUTES {
            return Err(StudyError::InvalidDuration {
                message: format!("minutes must be at most {}", MAX_BREAK_MINUTES),
            });
        }
        if seconds > 59 {
            return Err(StudyError::InvalidDuration {
                message: "seconds must be at most 59".to_string(),
            });
        }
        Ok(Self { minutes, seconds })
    }

    pub fn total_seconds(&self) -> u32 {
        self.minutes * 60 + self.seconds
    }
}

/// Formats seconds as `MM:SS`
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimerState {
    Idle,
    Running,
    Expired,
}

/// Output side of the alarm, implemented by whatever front end drives the timer
pub trait AlarmSink {
    /// Starts playing `sound` from the beginning
    fn play(&mut self, sound: &Path) -> Result<()>;
    /// Stops any playback in progress
    fn stop(&mut self);
    /// Emits a single system alert
    fn beep(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Alarm {
    Silent,
    Repeating(PathBuf),
}

/// Countdown with an alarm on expiry.
///
/// The timer has no clock of its own: the owner calls [`BreakTimer::tick`]
/// every [`TICK_INTERVAL`] and [`BreakTimer::alarm_tick`] every
/// [`ALARM_REPEAT_INTERVAL`].
pub struct BreakTimer<S: AlarmSink> {
    duration: BreakDuration,
    remaining: u32,
    state: TimerState,
    alarm_sound: Option<PathBuf>,
    alarm: Alarm,
    sink: S,
}

impl<S: AlarmSink> BreakTimer<S> {
    pub fn new(duration: BreakDuration, alarm_sound: Option<PathBuf>, sink: S) -> Self {
        Self {
            remaining: duration.total_seconds(),
            duration,
            state: TimerState::Idle,
            alarm_sound,
            alarm: Alarm::Silent,
            sink,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn duration(&self) -> BreakDuration {
        self.duration
    }

    /// Remaining time as `MM:SS`
    pub fn display(&self) -> String {
        format_clock(self.remaining)
    }

    /// Whether a sound alarm is currently repeating
    pub fn is_alarm_active(&self) -> bool {
        self.alarm != Alarm::Silent
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Takes effect on the next start or reset
    pub fn set_duration(&mut self, duration: BreakDuration) {
        self.duration = duration;
    }

    pub fn set_alarm_sound(&mut self, alarm_sound: Option<PathBuf>) {
        self.alarm_sound = alarm_sound;
    }

    pub fn start(&mut self) {
        self.halt_alarm();
        self.remaining = self.duration.total_seconds();
        self.state = TimerState::Running;
        info!("Break timer started for {}", self.display());
    }

    /// Advances the countdown by one second
    pub fn tick(&mut self) -> TimerState {
        if self.state != TimerState::Running {
            return self.state;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expire();
        }
        self.state
    }

    pub fn stop(&mut self) {
        if self.state != TimerState::Idle {
            debug!("Break timer stopped at {}", self.display());
        }
        self.halt_alarm();
        self.state = TimerState::Idle;
    }

    pub fn reset(&mut self) {
        self.halt_alarm();
        self.remaining = self.duration.total_seconds();
        self.state = TimerState::Idle;
    }

    /// Replays a repeating alarm; returns whether anything was played
    pub fn alarm_tick(&mut self) -> bool {
        let Alarm::Repeating(sound) = &self.alarm else {
            return false;
        };

        self.sink.stop();
        match self.sink.play(sound) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to replay alarm: {}", e);
                false
            }
        }
    }

    fn expire(&mut self) {
        info!("Break is over");
        self.state = TimerState::Expired;
        self.halt_alarm();

        let sound = self.alarm_sound.as_ref().filter(|p| p.exists()).cloned();
        match sound {
            Some(sound) => match self.sink.play(&sound) {
                Ok(()) => self.alarm = Alarm::Repeating(sound),
                Err(e) => {
                    warn!("Falling back to system alert: {}", e);
                    self.sink.beep();
                }
            },
            None => {
                if let Some(missing) = &self.alarm_sound {
                    warn!("Alarm sound {} not found", missing.display());
                }
                self.sink.beep();
            }
        }
    }

    fn halt_alarm(&mut self) {
        if self.alarm != Alarm::Silent {
            debug!("Halting alarm");
            self.sink.stop();
            self.alarm = Alarm::Silent;
        }
    }
}
