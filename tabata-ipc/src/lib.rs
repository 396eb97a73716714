//! Inter-process communication between tabata and tabatactl
//!
//! We use Unix domain sockets for local IPC - they're fast, secure,
//! and perfect for this use case. The session types live here too so
//! both binaries agree on what crosses the wire.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Commands that tabatactl can send to tabata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Command {
    Start {
        action_secs: u32,
        rest_secs: u32,
        total_secs: u32,
    },
    Pause,
    Resume,
    Stop,
    Status,
}

/// Responses from tabata back to tabatactl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Ok,
    Status(SessionStatus),
    Error(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub run_state: RunState,
    pub phase: Phase,
    pub remaining_total: i64, // seconds, clamped at zero
    pub remaining_phase: i64, // seconds, clamped at zero
    pub cycles_completed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
}

impl RunState {
    /// Completed and Stopped are terminal: the sampling loop never
    /// re-arms for a session in either state.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Stopped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Action,
    Rest,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Action => "ACTION",
            Phase::Rest => "REST",
        }
    }
}

/// Validated session durations. Construction is the only way to get
/// one, so a live config always satisfies `total >= action + rest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    action_secs: u32,
    rest_secs: u32,
    total_secs: u32,
}

impl SessionConfig {
    pub fn new(action_secs: u32, rest_secs: u32, total_secs: u32) -> Result<Self, ConfigError> {
        if action_secs == 0 || rest_secs == 0 || total_secs == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        let needed = u64::from(action_secs) + u64::from(rest_secs);
        if u64::from(total_secs) < needed {
            return Err(ConfigError::TotalTooShort {
                needed,
                total: total_secs,
            });
        }
        Ok(Self {
            action_secs,
            rest_secs,
            total_secs,
        })
    }

    pub fn action_secs(&self) -> u32 {
        self.action_secs
    }

    pub fn rest_secs(&self) -> u32 {
        self.rest_secs
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("every duration must be at least one second")]
    ZeroDuration,

    #[error("total time must be at least action + rest time ({needed}s), got {total}s")]
    TotalTooShort { needed: u64, total: u32 },
}

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection refused - is tabata running?")]
    ConnectionRefused,
}

pub const SOCKET_PATH: &str = "/tmp/tabata.sock";

/// Render whole seconds as MM:SS, the way every user-facing surface
/// shows time.
pub fn format_mmss(secs: i64) -> String {
    let secs = secs.max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_accepts_exact_one_cycle() {
        let config = SessionConfig::new(20, 10, 30).unwrap();
        assert_eq!(config.action_secs(), 20);
        assert_eq!(config.rest_secs(), 10);
        assert_eq!(config.total_secs(), 30);
    }

    #[test]
    fn test_config_rejects_total_shorter_than_one_cycle() {
        let err = SessionConfig::new(20, 20, 30).unwrap_err();
        assert_eq!(
            err,
            ConfigError::TotalTooShort {
                needed: 40,
                total: 30
            }
        );
    }

    #[test]
    fn test_config_rejects_zero_durations() {
        assert_eq!(
            SessionConfig::new(0, 10, 30).unwrap_err(),
            ConfigError::ZeroDuration
        );
        assert_eq!(
            SessionConfig::new(10, 0, 30).unwrap_err(),
            ConfigError::ZeroDuration
        );
        assert_eq!(
            SessionConfig::new(10, 10, 0).unwrap_err(),
            ConfigError::ZeroDuration
        );
    }

    #[test]
    fn test_config_validation_does_not_overflow() {
        let err = SessionConfig::new(u32::MAX, u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(err, ConfigError::TotalTooShort { .. }));
    }

    #[test]
    fn test_format_mmss() {
        assert_eq!(format_mmss(0), "00:00");
        assert_eq!(format_mmss(9), "00:09");
        assert_eq!(format_mmss(75), "01:15");
        assert_eq!(format_mmss(600), "10:00");
        assert_eq!(format_mmss(-3), "00:00");
    }

    #[test]
    fn test_terminal_run_states() {
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Stopped.is_terminal());
        assert!(!RunState::Idle.is_terminal());
        assert!(!RunState::Running.is_terminal());
        assert!(!RunState::Paused.is_terminal());
    }
}
