#![allow(
    dead_code,
    unused_imports,
    unused_variables,
    unused_mut,
    clippy::too_many_arguments,
    clippy::needless_borrows_for_generic_args,
    clippy::useless_format,
    clippy::len_zero,
    clippy::field_reassign_with_default
)]

use clap::{Parser, Subcommand};
use colored::Colorize;
use parlor_core::{CliErrorDisplay, ParlorError};
use std::process::ExitCode;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod context;

use commands::{
    handle_ask_command, handle_auth_command, handle_config_command, handle_messages_command,
    handle_rooms_command, handle_watch_command, AuthCommand, ConfigCommand, MessagesCommand,
    RoomsCommand,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Parser)]
#[command(name = "parlor")]
#[command(version = VERSION)]
#[command(about = "Parlor - chat rooms with an @ai assistant, from the terminal")]
#[command(long_about = r#"
Parlor talks to the same hosted backend as the mobile app: rooms and messages
live in the document database, media in the storage bucket, and new messages
arrive over the realtime endpoint.

Use 'parlor auth login' to sign in, 'parlor rooms list' to browse rooms and
'parlor watch <room>' to follow a conversation live. Mention @ai in a message
to get a reply from the assistant.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Sign in, sign out and show the current account")]
    Auth {
        #[command(subcommand)]
        action: AuthCommand,
    },

    #[command(about = "List, create, inspect and delete chat rooms")]
    Rooms {
        #[command(subcommand)]
        action: Option<RoomsCommand>,
    },

    #[command(about = "Read, send and delete messages in a room")]
    Messages {
        #[command(subcommand)]
        action: MessagesCommand,
    },

    #[command(about = "Follow a room live until interrupted")]
    Watch {
        #[arg(help = "Chat room ID")]
        room_id: String,

        #[arg(short, long, default_value = "20", help = "Number of recent messages to show first")]
        backlog: usize,
    },

    #[command(about = "Ask the assistant a one-off question")]
    Ask {
        #[arg(help = "Prompt text", required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    #[command(about = "Show or check the layered configuration")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigCommand>,
    },

    #[command(about = "Show version information")]
    Version {
        #[arg(short, long)]
        detailed: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ParlorError>() {
                Some(parlor_error) => eprint!(
                    "{}: {}",
                    "Error".red().bold(),
                    CliErrorDisplay::new(parlor_error)
                ),
                None => eprintln!("{}: {}", "Error".red().bold(), e),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Auth { action } => handle_auth_command(action).await,
        Commands::Rooms { action } => handle_rooms_command(action).await,
        Commands::Messages { action } => handle_messages_command(action).await,
        Commands::Watch { room_id, backlog } => handle_watch_command(&room_id, backlog).await,
        Commands::Ask { prompt } => handle_ask_command(&prompt.join(" ")).await,
        Commands::Config { action } => handle_config_command(action).await,
        Commands::Version { detailed } => cmd_version(detailed),
    }
}

fn cmd_version(detailed: bool) -> anyhow::Result<()> {
    if detailed {
        println!("{}", "Parlor Version Information".cyan().bold());
        println!("{}", "═".repeat(40).dimmed());
        println!("  {:<15} {}", "Version:".bold(), VERSION);
        println!("  {:<15} {}", "Name:".bold(), NAME);
        println!("  {:<15} Apache-2.0", "License:".bold());
        println!();
        println!("  {}", "Services:".bold());
        println!("    ◆ Document database, storage and realtime");
        println!("    ◆ OAuth sign-in (Google)");
        println!("    ◆ @ai replies (Gemini)");
        println!();
        println!("  {}", "Build Information:".bold());
        println!("    Rust Edition: 2021");
        #[cfg(debug_assertions)]
        println!("    Build:        Debug");
        #[cfg(not(debug_assertions))]
        println!("    Build:        Release");
    } else {
        println!("parlor {}", VERSION);
    }

    Ok(())
}
