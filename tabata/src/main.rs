use anyhow::{anyhow, Result};
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use directories::ProjectDirs;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use tachyonfx::{fx, EffectManager, Motion};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod audio;
mod config;
mod ipc;
mod persistence;
mod session;
mod ui;
mod wake_lock;

use app::{App, AppMode, Effect};
use audio::CuePlayer;
use wake_lock::WakeLock;

fn main() -> Result<()> {
    init_tracing();

    let config = config::load_config()?;
    let dark_mode = match persistence::load() {
        Ok(Some(prefs)) => prefs.dark_mode,
        Ok(None) => persistence::system_prefers_dark(),
        Err(e) => {
            warn!("failed to load preferences: {e}");
            persistence::system_prefers_dark()
        }
    };
    let app = Arc::new(Mutex::new(App::new(config, dark_mode)));

    spawn_ipc_server(Arc::clone(&app));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Log to a file in the data dir; the terminal belongs to the UI.
fn init_tracing() {
    let Some(proj_dirs) = ProjectDirs::from("com", "tabata", "Tabata") else {
        return;
    };
    let data_dir = proj_dirs.data_dir();
    if std::fs::create_dir_all(data_dir).is_err() {
        return;
    }
    let Ok(file) = std::fs::File::create(data_dir.join("tabata.log")) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn spawn_ipc_server(app: Arc<Mutex<App>>) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("failed to build IPC runtime: {e}");
                return;
            }
        };
        if let Err(e) = runtime.block_on(ipc::server::start(app)) {
            error!("IPC server exited: {e}");
        }
    });
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: Arc<Mutex<App>>) -> Result<()> {
    let mut cues = CuePlayer::new();
    let mut wake_lock = WakeLock::new();
    let mut fx_manager: EffectManager<u32> = EffectManager::default();

    loop {
        // One tick: sample the session, then act on whatever the
        // transition queued up.
        let (snapshot, effects) = {
            let mut app = lock(&app)?;
            app.advance(Local::now());
            let effects = app.drain_effects();
            (app.clone(), effects)
        };

        let size = terminal.size()?;
        let screen = Rect::new(0, 0, size.width, size.height);
        apply_effects(
            effects,
            &snapshot,
            &mut cues,
            &mut wake_lock,
            &mut fx_manager,
            screen,
        );

        terminal.draw(|f| ui::draw(f, &snapshot, &mut fx_manager))?;

        if snapshot.should_quit {
            return Ok(());
        }

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let mut guard = lock(&app)?;
                    handle_key(&mut guard, key.code);
                }
            }
        }
    }
}

fn lock(app: &Arc<Mutex<App>>) -> Result<MutexGuard<'_, App>> {
    app.lock().map_err(|_| anyhow!("app state lock poisoned"))
}

fn handle_key(app: &mut App, code: KeyCode) {
    match app.mode {
        AppMode::Setup => match code {
            KeyCode::Char('q') => app.should_quit = true,
            KeyCode::Char('p') => app.mode = AppMode::SelectingPreset,
            KeyCode::Char('t') => app.toggle_theme(),
            KeyCode::Enter => app.start_session(Local::now()),
            KeyCode::Tab | KeyCode::Down => app.focus_next(),
            KeyCode::BackTab | KeyCode::Up => app.focus_prev(),
            KeyCode::Left => app.cycle_cue(false),
            KeyCode::Right => app.cycle_cue(true),
            KeyCode::Char(' ') => app.toggle_focused(),
            KeyCode::Backspace => app.handle_backspace(),
            KeyCode::Char(c) => app.handle_char(c),
            _ => {}
        },
        AppMode::SelectingPreset => match code {
            KeyCode::Esc => app.mode = AppMode::Setup,
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let num = c.to_digit(10).unwrap_or(0) as usize;
                if num > 0 && num <= app.presets.len() {
                    app.apply_preset(num - 1, Local::now());
                }
            }
            _ => {}
        },
        AppMode::Workout => match code {
            KeyCode::Char(' ') | KeyCode::Char('p') => app.toggle_pause(),
            KeyCode::Char('s') | KeyCode::Esc => app.stop_session(),
            _ => {}
        },
        AppMode::Complete => match code {
            KeyCode::Char('r') => app.restart(),
            KeyCode::Char('q') => app.should_quit = true,
            _ => {}
        },
    }
}

fn apply_effects(
    effects: Vec<Effect>,
    app: &App,
    cues: &mut CuePlayer,
    wake_lock: &mut WakeLock,
    fx_manager: &mut EffectManager<u32>,
    screen: Rect,
) {
    for effect in effects {
        match effect {
            Effect::PrimeAudio => cues.prime(),
            Effect::Cue(count) => cues.play(app.cue_type, count),
            Effect::AcquireWakeLock => wake_lock.acquire(),
            Effect::ReleaseWakeLock => wake_lock.release(),
            Effect::Notify { title, body } => send_notification(&title, &body),
            Effect::SavePreferences { dark_mode } => {
                if let Err(e) = persistence::save(&persistence::Preferences { dark_mode }) {
                    warn!("failed to save preferences: {e}");
                }
            }
            Effect::ScreenChanged => {
                let effect = fx::slide_in(Motion::LeftToRight, 8, 4, app.theme().selection, 300)
                    .with_area(screen);
                fx_manager.add_effect(effect);
            }
            Effect::Flash => {
                fx_manager.add_effect(fx::fade_to_fg(app.theme().selection, 500).with_area(screen));
            }
        }
    }
}

fn send_notification(title: &str, body: &str) {
    if let Err(e) = notify_rust::Notification::new()
        .summary(title)
        .body(body)
        .appname("tabata")
        .show()
    {
        warn!("Failed to send notification: {}", e);
    }
}
