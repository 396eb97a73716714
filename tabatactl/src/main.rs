use anyhow::Result;
use clap::{Parser, Subcommand};
use tabata_ipc::{format_mmss, Command, IpcError, Response, SOCKET_PATH};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

#[derive(Parser)]
#[command(name = "tabatactl")]
#[command(about = "Control a running tabata session", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session with explicit durations (seconds)
    Start {
        /// Action phase length in seconds
        #[arg(short, long)]
        action: u32,
        /// Rest phase length in seconds
        #[arg(short, long)]
        rest: u32,
        /// Total session length in seconds
        #[arg(short, long)]
        total: u32,
    },
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Stop the session and return to setup
    Stop,
    /// Show session status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Convert CLI command to IPC command
    let command = match cli.command {
        Commands::Start {
            action,
            rest,
            total,
        } => Command::Start {
            action_secs: action,
            rest_secs: rest,
            total_secs: total,
        },
        Commands::Pause => Command::Pause,
        Commands::Resume => Command::Resume,
        Commands::Stop => Command::Stop,
        Commands::Status => Command::Status,
    };

    // Send command and get response
    let response = send_command(command).await?;

    // Handle response
    match response {
        Response::Ok => println!("OK"),
        Response::Status(status) => {
            println!("State: {:?}", status.run_state);
            println!(
                "Phase: {} ({} left)",
                status.phase.label(),
                format_mmss(status.remaining_phase)
            );
            println!("Total remaining: {}", format_mmss(status.remaining_total));
            println!("Cycles completed: {}", status.cycles_completed);
        }
        Response::Error(e) => eprintln!("Error: {}", e),
    }

    Ok(())
}

async fn send_command(cmd: Command) -> Result<Response> {
    let mut stream = UnixStream::connect(SOCKET_PATH)
        .await
        .map_err(|_| IpcError::ConnectionRefused)?;

    // Send command
    let msg = serde_json::to_vec(&cmd)?;
    stream.write_all(&msg).await?;
    stream.write_all(b"\n").await?;

    // Read response
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    let response: Response = serde_json::from_str(&line)?;

    Ok(response)
}
