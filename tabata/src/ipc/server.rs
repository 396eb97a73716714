//! Unix domain socket server for IPC

use crate::app::App;
use anyhow::Result;
use chrono::Local;
use std::sync::{Arc, Mutex};
use tabata_ipc::{Command, Response, SOCKET_PATH};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{error, info};

/// Accept loop. The app is the same instance the TUI loop drives;
/// commands mutate it directly and any side effects they queue are
/// picked up on the loop's next tick.
pub async fn start(app: Arc<Mutex<App>>) -> Result<()> {
    // Remove old socket if it exists
    let _ = std::fs::remove_file(SOCKET_PATH);

    // Bind to socket
    let listener = UnixListener::bind(SOCKET_PATH)?;
    info!("IPC server listening on {}", SOCKET_PATH);

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let app = app.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, app).await {
                        error!("Error handling client: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
            }
        }
    }
}

async fn handle_client(stream: UnixStream, app: Arc<Mutex<App>>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    // Read command
    reader.read_line(&mut line).await?;
    let command: Command = serde_json::from_str(&line)?;

    // Process command; the lock is held only for the state transition.
    let response = apply_command(&app, command);

    // Send response
    let response_json = serde_json::to_vec(&response)?;
    writer.write_all(&response_json).await?;
    writer.write_all(b"\n").await?;

    Ok(())
}

fn apply_command(app: &Arc<Mutex<App>>, command: Command) -> Response {
    let Ok(mut app) = app.lock() else {
        return Response::Error("app state lock poisoned".to_string());
    };
    match command {
        Command::Start {
            action_secs,
            rest_secs,
            total_secs,
        } => match app.start_remote(action_secs, rest_secs, total_secs, Local::now()) {
            Ok(()) => Response::Ok,
            Err(e) => Response::Error(e),
        },
        Command::Pause => {
            if app.session.is_some() {
                app.pause();
                Response::Ok
            } else {
                Response::Error("no active session".to_string())
            }
        }
        Command::Resume => {
            if app.session.is_some() {
                app.resume();
                Response::Ok
            } else {
                Response::Error("no active session".to_string())
            }
        }
        Command::Stop => {
            app.stop_session();
            Response::Ok
        }
        Command::Status => Response::Status(app.status()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tabata_ipc::RunState;

    fn shared_app() -> Arc<Mutex<App>> {
        Arc::new(Mutex::new(App::new(Config::default(), true)))
    }

    #[test]
    fn test_start_then_status_round_trip() {
        let app = shared_app();
        let response = apply_command(
            &app,
            Command::Start {
                action_secs: 20,
                rest_secs: 10,
                total_secs: 240,
            },
        );
        assert!(matches!(response, Response::Ok));

        match apply_command(&app, Command::Status) {
            Response::Status(status) => {
                assert_eq!(status.run_state, RunState::Running);
                assert_eq!(status.remaining_total, 240);
            }
            other => panic!("expected status, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_start_is_an_error_response() {
        let app = shared_app();
        let response = apply_command(
            &app,
            Command::Start {
                action_secs: 20,
                rest_secs: 20,
                total_secs: 30,
            },
        );
        assert!(matches!(response, Response::Error(_)));
    }

    #[test]
    fn test_pause_without_session_is_an_error() {
        let app = shared_app();
        assert!(matches!(
            apply_command(&app, Command::Pause),
            Response::Error(_)
        ));
    }

    #[test]
    fn test_pause_resume_cycle() {
        let app = shared_app();
        apply_command(
            &app,
            Command::Start {
                action_secs: 20,
                rest_secs: 10,
                total_secs: 240,
            },
        );
        apply_command(&app, Command::Pause);
        match apply_command(&app, Command::Status) {
            Response::Status(status) => assert_eq!(status.run_state, RunState::Paused),
            other => panic!("expected status, got {:?}", other),
        }
        apply_command(&app, Command::Resume);
        match apply_command(&app, Command::Status) {
            Response::Status(status) => assert_eq!(status.run_state, RunState::Running),
            other => panic!("expected status, got {:?}", other),
        }
    }

    #[test]
    fn test_stop_is_always_ok() {
        let app = shared_app();
        assert!(matches!(apply_command(&app, Command::Stop), Response::Ok));
        assert!(matches!(apply_command(&app, Command::Stop), Response::Ok));
    }
}
