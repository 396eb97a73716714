use crate::audio::CueType;
use crate::config::{Config, Theme};
use crate::session::{Session, SessionEvent, Summary};
use chrono::{DateTime, Local};
use tabata_ipc::{format_mmss, Phase, RunState, SessionConfig, SessionStatus};

#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppMode {
    #[default]
    Setup,
    SelectingPreset,
    Workout,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Action,
    Rest,
    Total,
    Cue,
    KeepAwake,
}

impl Field {
    pub fn next(self) -> Self {
        match self {
            Field::Action => Field::Rest,
            Field::Rest => Field::Total,
            Field::Total => Field::Cue,
            Field::Cue => Field::KeepAwake,
            Field::KeepAwake => Field::Action,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Field::Action => Field::KeepAwake,
            Field::Rest => Field::Action,
            Field::Total => Field::Rest,
            Field::Cue => Field::Total,
            Field::KeepAwake => Field::Cue,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Action => "Action",
            Field::Rest => "Rest",
            Field::Total => "Total",
            Field::Cue => "Cue",
            Field::KeepAwake => "Keep awake",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SetupForm {
    pub action: String,
    pub rest: String,
    pub total: String,
    pub focus: Field,
}

impl SetupForm {
    fn duration_buffer(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Action => Some(&mut self.action),
            Field::Rest => Some(&mut self.rest),
            Field::Total => Some(&mut self.total),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub action_secs: u32,
    pub rest_secs: u32,
    pub total_secs: u32,
}

pub const PRESETS: [Preset; 4] = [
    Preset {
        name: "Tabata",
        action_secs: 20,
        rest_secs: 10,
        total_secs: 240,
    },
    Preset {
        name: "HIIT",
        action_secs: 30,
        rest_secs: 15,
        total_secs: 300,
    },
    Preset {
        name: "Endurance",
        action_secs: 60,
        rest_secs: 30,
        total_secs: 900,
    },
    Preset {
        name: "Stretch",
        action_secs: 45,
        rest_secs: 15,
        total_secs: 600,
    },
];

/// Side effects requested by state transitions. The app mutates only
/// itself; the main loop drains these and touches the cue player,
/// wake lock, notifier, and preference file. Keeping the I/O out
/// here is what lets the IPC thread share the App behind a mutex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Play that many cue tones with the current timbre.
    Cue(u32),
    /// Re-try the audio device; a session start or preset is a fresh
    /// chance after an earlier failure.
    PrimeAudio,
    AcquireWakeLock,
    ReleaseWakeLock,
    Notify { title: String, body: String },
    SavePreferences { dark_mode: bool },
    /// A different screen is showing; worth a transition effect.
    ScreenChanged,
    /// Phase boundary pulse on the workout screen.
    Flash,
}

#[derive(Clone)]
pub struct App {
    pub mode: AppMode,
    pub form: SetupForm,
    pub cue_type: CueType,
    pub keep_awake: bool,
    pub dark_mode: bool,
    pub session: Option<Session>,
    pub summary: Option<Summary>,
    pub presets: Vec<Preset>,
    pub error: Option<String>,
    pub config: Config,
    pub should_quit: bool,
    effects: Vec<Effect>,
}

impl App {
    pub fn new(config: Config, dark_mode: bool) -> Self {
        let defaults = &config.defaults;
        let form = SetupForm {
            action: defaults.action_secs.to_string(),
            rest: defaults.rest_secs.to_string(),
            total: defaults.total_secs.to_string(),
            focus: Field::Action,
        };
        let cue_type = CueType::from_name(&defaults.cue);
        let keep_awake = defaults.keep_awake;
        Self {
            mode: AppMode::Setup,
            form,
            cue_type,
            keep_awake,
            dark_mode,
            session: None,
            summary: None,
            presets: PRESETS.to_vec(),
            error: None,
            config,
            should_quit: false,
            effects: vec![],
        }
    }

    pub fn theme(&self) -> &Theme {
        if self.dark_mode {
            &self.config.dark
        } else {
            &self.config.light
        }
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Called once per tick of the main loop; drives the session and
    /// turns engine events into effects.
    pub fn advance(&mut self, now: DateTime<Local>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(tick) = session.sample(now) else {
            return;
        };
        match tick.event {
            Some(SessionEvent::PhaseSwitched(_)) => {
                self.effects.push(Effect::Cue(2));
                self.effects.push(Effect::Flash);
            }
            Some(SessionEvent::Completed(summary)) => {
                self.summary = Some(summary);
                self.mode = AppMode::Complete;
                self.effects.push(Effect::Cue(3));
                self.effects.push(Effect::ReleaseWakeLock);
                self.effects.push(Effect::Notify {
                    title: "Workout complete".to_string(),
                    body: format!(
                        "{} cycles in {}",
                        summary.cycles_completed,
                        format_mmss(i64::from(summary.total_secs))
                    ),
                });
                self.effects.push(Effect::ScreenChanged);
            }
            Some(SessionEvent::Started) | None => {}
        }
    }

    /// Read the setup form and start a session; validation failures
    /// land in the error line and nothing starts.
    pub fn start_session(&mut self, now: DateTime<Local>) {
        let (Some(action), Some(rest), Some(total)) = (
            parse_secs(&self.form.action),
            parse_secs(&self.form.rest),
            parse_secs(&self.form.total),
        ) else {
            self.error = Some("durations must be whole numbers of seconds".to_string());
            return;
        };
        match SessionConfig::new(action, rest, total) {
            Ok(config) => self.begin(config, now),
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Presets short-circuit straight into a running session.
    pub fn apply_preset(&mut self, index: usize, now: DateTime<Local>) {
        let Some(preset) = self.presets.get(index).copied() else {
            return;
        };
        self.form.action = preset.action_secs.to_string();
        self.form.rest = preset.rest_secs.to_string();
        self.form.total = preset.total_secs.to_string();
        match SessionConfig::new(preset.action_secs, preset.rest_secs, preset.total_secs) {
            Ok(config) => self.begin(config, now),
            Err(e) => {
                self.error = Some(e.to_string());
                self.mode = AppMode::Setup;
            }
        }
    }

    /// Start command arriving over the control socket.
    pub fn start_remote(
        &mut self,
        action_secs: u32,
        rest_secs: u32,
        total_secs: u32,
        now: DateTime<Local>,
    ) -> Result<(), String> {
        let config =
            SessionConfig::new(action_secs, rest_secs, total_secs).map_err(|e| e.to_string())?;
        self.form.action = action_secs.to_string();
        self.form.rest = rest_secs.to_string();
        self.form.total = total_secs.to_string();
        self.begin(config, now);
        Ok(())
    }

    fn begin(&mut self, config: SessionConfig, now: DateTime<Local>) {
        // Starting a new session discards any prior one.
        if self
            .session
            .as_ref()
            .is_some_and(|s| !s.run_state.is_terminal())
        {
            self.effects.push(Effect::ReleaseWakeLock);
        }
        self.error = None;
        self.summary = None;

        let mut session = Session::new(config);
        if session.start(now).is_some() {
            self.effects.push(Effect::PrimeAudio);
            self.effects.push(Effect::Cue(1));
            if self.keep_awake {
                self.effects.push(Effect::AcquireWakeLock);
            }
        }
        self.session = Some(session);
        self.mode = AppMode::Workout;
        self.effects.push(Effect::ScreenChanged);
    }

    pub fn toggle_pause(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.toggle_pause();
        }
    }

    pub fn pause(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.pause();
        }
    }

    pub fn resume(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.resume();
        }
    }

    /// Cancel the session and fall back to setup.
    pub fn stop_session(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.stop();
        }
        self.session = None;
        self.effects.push(Effect::ReleaseWakeLock);
        if self.mode != AppMode::Setup {
            self.mode = AppMode::Setup;
            self.effects.push(Effect::ScreenChanged);
        }
    }

    /// Back to setup from the completion screen.
    pub fn restart(&mut self) {
        self.session = None;
        self.summary = None;
        self.mode = AppMode::Setup;
        self.effects.push(Effect::ScreenChanged);
    }

    pub fn toggle_theme(&mut self) {
        self.dark_mode = !self.dark_mode;
        self.effects.push(Effect::SavePreferences {
            dark_mode: self.dark_mode,
        });
    }

    pub fn handle_char(&mut self, c: char) {
        if self.mode != AppMode::Setup || !c.is_ascii_digit() {
            return;
        }
        if let Some(buffer) = self.form.duration_buffer() {
            if buffer.len() < 4 {
                buffer.push(c);
            }
        }
    }

    pub fn handle_backspace(&mut self) {
        if self.mode == AppMode::Setup {
            if let Some(buffer) = self.form.duration_buffer() {
                buffer.pop();
            }
        }
    }

    pub fn focus_next(&mut self) {
        self.form.focus = self.form.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.form.focus = self.form.focus.prev();
    }

    /// Left/right on the cue row auditions timbres.
    pub fn cycle_cue(&mut self, forward: bool) {
        if self.form.focus == Field::Cue {
            self.cue_type = if forward {
                self.cue_type.next()
            } else {
                self.cue_type.prev()
            };
            self.effects.push(Effect::PrimeAudio);
            self.effects.push(Effect::Cue(1));
        }
    }

    pub fn toggle_focused(&mut self) {
        if self.form.focus == Field::KeepAwake {
            self.keep_awake = !self.keep_awake;
        }
    }

    pub fn status(&self) -> SessionStatus {
        match self.session.as_ref() {
            Some(session) => session.status(),
            None => SessionStatus {
                run_state: RunState::Idle,
                phase: Phase::Action,
                remaining_total: 0,
                remaining_phase: 0,
                cycles_completed: 0,
            },
        }
    }
}

fn parse_secs(input: &str) -> Option<u32> {
    input.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Local> {
        Local.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn app() -> App {
        App::new(Config::default(), true)
    }

    #[test]
    fn test_new_app_reflects_config_defaults() {
        let app = app();
        assert_eq!(app.mode, AppMode::Setup);
        assert_eq!(app.form.action, "30");
        assert_eq!(app.form.rest, "15");
        assert_eq!(app.form.total, "300");
        assert_eq!(app.cue_type, CueType::Beep);
        assert!(app.keep_awake);
        assert!(app.session.is_none());
    }

    #[test]
    fn test_digit_entry_and_backspace() {
        let mut app = app();
        app.form.action.clear();
        app.handle_char('4');
        app.handle_char('5');
        app.handle_char('x'); // ignored
        assert_eq!(app.form.action, "45");
        app.handle_backspace();
        assert_eq!(app.form.action, "4");
    }

    #[test]
    fn test_invalid_config_never_starts_a_session() {
        let mut app = app();
        app.form.action = "20".to_string();
        app.form.rest = "20".to_string();
        app.form.total = "30".to_string();
        app.start_session(t0());
        assert_eq!(app.mode, AppMode::Setup);
        assert!(app.session.is_none());
        assert!(app.error.as_deref().unwrap().contains("at least"));
        assert!(app.drain_effects().is_empty());
    }

    #[test]
    fn test_unparsable_input_is_a_validation_error() {
        let mut app = app();
        app.form.total.clear();
        app.start_session(t0());
        assert!(app.session.is_none());
        assert!(app.error.is_some());
    }

    #[test]
    fn test_start_session_emits_start_effects() {
        let mut app = app();
        app.start_session(t0());
        assert_eq!(app.mode, AppMode::Workout);
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.run_state, RunState::Running);
        let effects = app.drain_effects();
        assert!(effects.contains(&Effect::PrimeAudio));
        assert!(effects.contains(&Effect::Cue(1)));
        assert!(effects.contains(&Effect::AcquireWakeLock));
        assert!(effects.contains(&Effect::ScreenChanged));
    }

    #[test]
    fn test_keep_awake_off_skips_the_wake_lock() {
        let mut app = app();
        app.keep_awake = false;
        app.start_session(t0());
        let effects = app.drain_effects();
        assert!(!effects.contains(&Effect::AcquireWakeLock));
        assert!(effects.contains(&Effect::Cue(1)));
    }

    #[test]
    fn test_preset_short_circuits_into_a_running_session() {
        let mut app = app();
        app.mode = AppMode::SelectingPreset;
        app.apply_preset(0, t0());
        assert_eq!(app.mode, AppMode::Workout);
        assert_eq!(app.form.action, "20");
        assert_eq!(app.form.rest, "10");
        assert_eq!(app.form.total, "240");
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.run_state, RunState::Running);
        assert!(app.drain_effects().contains(&Effect::Cue(1)));
    }

    #[test]
    fn test_phase_switch_cues_twice() {
        let mut app = app();
        app.start_session(t0());
        app.drain_effects();
        app.advance(t0() + Duration::seconds(30));
        let effects = app.drain_effects();
        assert!(effects.contains(&Effect::Cue(2)));
        assert!(effects.contains(&Effect::Flash));
        assert_eq!(app.mode, AppMode::Workout);
    }

    #[test]
    fn test_completion_cues_notifies_and_releases() {
        let mut app = app();
        app.form.action = "10".to_string();
        app.form.rest = "10".to_string();
        app.form.total = "20".to_string();
        app.start_session(t0());
        app.drain_effects();

        app.advance(t0() + Duration::seconds(10)); // -> Rest
        app.drain_effects();
        app.advance(t0() + Duration::seconds(20)); // -> Completed
        let effects = app.drain_effects();
        assert!(effects.contains(&Effect::Cue(3)));
        assert!(effects.contains(&Effect::ReleaseWakeLock));
        assert!(effects.iter().any(|e| matches!(e, Effect::Notify { .. })));
        assert_eq!(app.mode, AppMode::Complete);
        let summary = app.summary.unwrap();
        assert_eq!(summary.cycles_completed, 0);
        assert_eq!(summary.total_secs, 20);
    }

    #[test]
    fn test_stop_releases_wake_lock_and_returns_to_setup() {
        let mut app = app();
        app.start_session(t0());
        app.drain_effects();
        app.stop_session();
        assert_eq!(app.mode, AppMode::Setup);
        assert!(app.session.is_none());
        assert!(app.drain_effects().contains(&Effect::ReleaseWakeLock));
    }

    #[test]
    fn test_remote_start_discards_a_live_session() {
        let mut app = app();
        app.start_session(t0());
        app.drain_effects();
        app.start_remote(20, 10, 240, t0() + Duration::seconds(5))
            .unwrap();
        let effects = app.drain_effects();
        assert!(effects.contains(&Effect::ReleaseWakeLock));
        assert!(effects.contains(&Effect::Cue(1)));
        let session = app.session.as_ref().unwrap();
        assert_eq!(session.config().total_secs(), 240);
        assert_eq!(session.cycles_completed, 0);
    }

    #[test]
    fn test_remote_start_rejects_invalid_triplet() {
        let mut app = app();
        let err = app.start_remote(20, 20, 30, t0()).unwrap_err();
        assert!(err.contains("at least"));
        assert!(app.session.is_none());
    }

    #[test]
    fn test_toggle_theme_saves_the_preference() {
        let mut app = app();
        assert!(app.dark_mode);
        app.toggle_theme();
        assert!(!app.dark_mode);
        assert_eq!(
            app.drain_effects(),
            vec![Effect::SavePreferences { dark_mode: false }]
        );
    }

    #[test]
    fn test_cue_cycling_only_on_cue_row() {
        let mut app = app();
        app.cycle_cue(true);
        assert_eq!(app.cue_type, CueType::Beep);
        app.form.focus = Field::Cue;
        app.cycle_cue(true);
        assert_eq!(app.cue_type, CueType::Glass);
        app.cycle_cue(false);
        assert_eq!(app.cue_type, CueType::Beep);
    }

    #[test]
    fn test_status_without_a_session_is_idle() {
        let app = app();
        let status = app.status();
        assert_eq!(status.run_state, RunState::Idle);
        assert_eq!(status.remaining_total, 0);
    }
}
