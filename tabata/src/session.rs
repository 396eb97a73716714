use chrono::{DateTime, Local};
use tabata_ipc::{Phase, RunState, SessionConfig, SessionStatus};

/// What the presentation layer renders each sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFrame {
    pub remaining_total: i64,
    pub remaining_phase: i64,
    pub phase: Phase,
    pub cycles_completed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total_secs: u32,
    pub cycles_completed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Session left Idle. One-count cue.
    Started,
    /// Phase boundary crossed. Two-count cue.
    PhaseSwitched(Phase),
    /// Total time expired. Three-count cue, wake lock released.
    Completed(Summary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub frame: DisplayFrame,
    pub event: Option<SessionEvent>,
}

/// The phase/cycle countdown engine.
///
/// All elapsed figures are recomputed from the recorded start instants
/// on every sample, never accumulated from tick deltas, so a delayed
/// or irregular sampling cadence cannot drift the clock. The engine
/// performs no I/O and never schedules itself: the shell calls
/// `sample` with the current wall-clock reading and acts on the
/// returned events.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    pub run_state: RunState,
    pub phase: Phase,
    pub cycles_completed: u32,
    pub elapsed_total: i64,
    started_at: Option<DateTime<Local>>,
    phase_started_at: Option<DateTime<Local>>,
    last_frame: Option<DisplayFrame>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            run_state: RunState::Idle,
            phase: Phase::Action,
            cycles_completed: 0,
            elapsed_total: 0,
            started_at: None,
            phase_started_at: None,
            last_frame: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn last_frame(&self) -> Option<DisplayFrame> {
        self.last_frame
    }

    /// Idle -> Running. Records the session and phase start instants.
    pub fn start(&mut self, now: DateTime<Local>) -> Option<SessionEvent> {
        if self.run_state != RunState::Idle {
            return None;
        }
        self.run_state = RunState::Running;
        self.started_at = Some(now);
        self.phase_started_at = Some(now);
        Some(SessionEvent::Started)
    }

    /// Advance the countdown using the given wall-clock reading.
    ///
    /// Returns None unless the session is Running: a paused session
    /// mutates nothing (the loop keeps re-arming, samples are simply
    /// skipped), and a terminal session stays terminal.
    pub fn sample(&mut self, now: DateTime<Local>) -> Option<Tick> {
        if self.run_state != RunState::Running {
            return None;
        }
        let (Some(started), Some(phase_started)) = (self.started_at, self.phase_started_at) else {
            return None;
        };

        self.elapsed_total = (now - started).num_seconds().max(0);
        let remaining_total = (i64::from(self.config.total_secs()) - self.elapsed_total).max(0);

        let phase_duration = i64::from(match self.phase {
            Phase::Action => self.config.action_secs(),
            Phase::Rest => self.config.rest_secs(),
        });
        let phase_elapsed = (now - phase_started).num_seconds().max(0);
        let remaining_phase = (phase_duration - phase_elapsed).max(0);

        // The frame shows the state the boundary checks are about to
        // react to, matching what the user watched count down to zero.
        let frame = DisplayFrame {
            remaining_total,
            remaining_phase,
            phase: self.phase,
            cycles_completed: self.cycles_completed,
        };
        self.last_frame = Some(frame);

        let mut event = None;
        if remaining_total <= 0 {
            self.run_state = RunState::Completed;
            event = Some(SessionEvent::Completed(Summary {
                total_secs: self.config.total_secs(),
                cycles_completed: self.cycles_completed,
            }));
        } else if remaining_phase <= 0 {
            let next = match self.phase {
                Phase::Action => Phase::Rest,
                Phase::Rest => {
                    self.cycles_completed += 1;
                    Phase::Action
                }
            };
            self.phase = next;
            self.phase_started_at = Some(now);
            event = Some(SessionEvent::PhaseSwitched(next));
        }

        Some(Tick { frame, event })
    }

    /// Freeze sampling. The start instants stand untouched, so paused
    /// wall time is not paid back on resume.
    pub fn pause(&mut self) {
        if self.run_state == RunState::Running {
            self.run_state = RunState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.run_state == RunState::Paused {
            self.run_state = RunState::Running;
        }
    }

    pub fn toggle_pause(&mut self) {
        match self.run_state {
            RunState::Running => self.run_state = RunState::Paused,
            RunState::Paused => self.run_state = RunState::Running,
            _ => {}
        }
    }

    /// Any non-terminal state -> Stopped. Idempotent on terminal states.
    pub fn stop(&mut self) {
        if !self.run_state.is_terminal() {
            self.run_state = RunState::Stopped;
        }
    }

    pub fn status(&self) -> SessionStatus {
        let frame = self.last_frame.unwrap_or(DisplayFrame {
            remaining_total: i64::from(self.config.total_secs()),
            remaining_phase: i64::from(self.config.action_secs()),
            phase: self.phase,
            cycles_completed: self.cycles_completed,
        });
        SessionStatus {
            run_state: self.run_state,
            phase: frame.phase,
            remaining_total: frame.remaining_total,
            remaining_phase: frame.remaining_phase,
            cycles_completed: frame.cycles_completed,
        }
    }
}
