use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use rover_console::config::Config;
use rover_console::sequencer::{ExecutionOutcome, Sequencer, TokioClock};
use rover_console::store::UbidotsClient;

/// Rover Console - drive a remote rover through a cloud telemetry store
#[derive(Parser, Debug)]
#[command(name = "rover-console", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Auth token (overrides config file and ROVER_AUTH_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Device label on the telemetry service
    #[arg(short, long)]
    device: Option<String>,

    /// Telemetry API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Execute one command string and exit (otherwise start the REPL)
    #[arg(short, long)]
    run: Option<String>,
}

fn load_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(device) = &args.device {
        config.device_label = device.clone();
    }
    if let Some(api_url) = &args.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(token) = &args.token {
        config.auth_token = token.clone();
    } else if config.auth_token.is_empty() {
        if let Ok(token) = std::env::var("ROVER_AUTH_TOKEN") {
            config.auth_token = token;
        }
    }

    if config.auth_token.is_empty() {
        warn!("no auth token configured; remote requests will be rejected");
    }

    Ok(config)
}

fn report_outcome(sequencer: &Sequencer<UbidotsClient, TokioClock>, outcome: &ExecutionOutcome) {
    println!("{}", sequencer.log().render());
    match outcome {
        ExecutionOutcome::Completed => println!("All commands executed!"),
        ExecutionOutcome::Failed { .. } => println!("Error: command execution failed"),
    }
}

async fn show_status(sequencer: &Sequencer<UbidotsClient, TokioClock>) {
    for (variable, result) in sequencer.read_status().await {
        match result {
            Ok(Some(value)) => println!("{}: {}", variable, value),
            Ok(None) => println!("{}: no samples", variable),
            Err(e) => println!("{}: read failed ({})", variable, e),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    info!(
        device = %config.device_label,
        api = %config.api_url,
        "rover console starting"
    );

    let store = UbidotsClient::new(&config);
    let mut sequencer = Sequencer::new(store, TokioClock, config);

    // Safety default: the rover stops before any operator input is taken
    sequencer.startup_stop().await;
    println!("{}", sequencer.log().render());

    if let Some(commands) = args.run {
        let outcome = sequencer.submit(&commands).await;
        report_outcome(&sequencer, &outcome);
        if !outcome.is_success() {
            std::process::exit(1);
        }
        return Ok(());
    }

    println!("Enter commands (e.g. F2,L,H90), 'status', or 'quit'.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("rover> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input {
            "" => {
                println!("Please enter valid commands");
            }
            "quit" | "exit" => break,
            "status" => show_status(&sequencer).await,
            commands => {
                let outcome = sequencer.submit(commands).await;
                report_outcome(&sequencer, &outcome);
            }
        }
    }

    info!("rover console shutting down");
    Ok(())
}
