use clap::Subcommand;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use parlor_core::chat::mentions_assistant;
use parlor_core::{Alert, ChatRoomSession, Message, MessageKind, SendOutcome};
use std::path::PathBuf;

use crate::context::{is_json, truncate, CliContext};

#[derive(Subcommand)]
pub enum MessagesCommand {
    #[command(about = "List the latest messages in a room, oldest first")]
    List {
        #[arg(help = "Chat room ID")]
        room_id: String,

        #[arg(
            short,
            long,
            default_value = "text",
            help = "Output format (text, json)"
        )]
        format: String,
    },

    #[command(about = "Send a text message; mention @ai to get an assistant reply")]
    Send {
        #[arg(help = "Chat room ID")]
        room_id: String,

        #[arg(help = "Message text", required = true, num_args = 1..)]
        text: Vec<String>,
    },

    #[command(about = "Upload a file and send it as an image, audio or file message")]
    SendMedia {
        #[arg(help = "Chat room ID")]
        room_id: String,

        #[arg(help = "Path to the file")]
        path: PathBuf,

        #[arg(short, long, help = "Message type (image, audio, file); guessed from the extension")]
        kind: Option<String>,
    },

    #[command(about = "Delete one of your messages")]
    Delete {
        #[arg(help = "Chat room ID")]
        room_id: String,

        #[arg(help = "Message ID")]
        message_id: String,
    },
}

pub async fn handle_messages_command(cmd: MessagesCommand) -> anyhow::Result<()> {
    let ctx = CliContext::load()?;

    match cmd {
        MessagesCommand::List { room_id, format } => {
            cmd_messages_list(&ctx, &room_id, &format).await
        }
        MessagesCommand::Send { room_id, text } => {
            cmd_messages_send(&ctx, &room_id, &text.join(" ")).await
        }
        MessagesCommand::SendMedia {
            room_id,
            path,
            kind,
        } => cmd_messages_send_media(&ctx, &room_id, path, kind.as_deref()).await,
        MessagesCommand::Delete {
            room_id,
            message_id,
        } => cmd_messages_delete(&ctx, &room_id, &message_id).await,
    }
}

async fn cmd_messages_list(ctx: &CliContext, room_id: &str, format: &str) -> anyhow::Result<()> {
    let messages = ctx.services.list_messages(room_id).await?;

    if is_json(format) {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if messages.is_empty() {
        println!("{}", "No messages yet. Start the conversation!".yellow());
        return Ok(());
    }
    print_messages(&messages);
    Ok(())
}

pub fn print_messages(messages: &[Message]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("Time").fg(Color::White),
            Cell::new("Sender").fg(Color::White),
            Cell::new("Type").fg(Color::White),
            Cell::new("Content").fg(Color::White),
            Cell::new("ID").fg(Color::White),
        ]);

    for message in messages {
        let sender_color = if message.is_assistant() {
            Color::Magenta
        } else {
            Color::Cyan
        };
        table.add_row(vec![
            Cell::new(message.meta.created_at.format("%m-%d %H:%M").to_string()),
            Cell::new(sender_label(message)).fg(sender_color),
            Cell::new(message.kind.to_string()),
            Cell::new(truncate(&message.content, 60)),
            Cell::new(message.id()).fg(Color::DarkGrey),
        ]);
    }
    println!("{table}");
}

pub fn sender_label(message: &Message) -> &str {
    if message.sender_name.trim().is_empty() {
        "Anonymous"
    } else {
        &message.sender_name
    }
}

async fn open_session(ctx: &CliContext, room_id: &str) -> anyhow::Result<ChatRoomSession> {
    let viewer = ctx.viewer().await?;
    let mut session = ChatRoomSession::new(ctx.services.clone(), room_id, viewer);
    session.load().await;
    if let Some(error) = session.error() {
        anyhow::bail!("{}", error);
    }
    Ok(session)
}

async fn cmd_messages_send(ctx: &CliContext, room_id: &str, text: &str) -> anyhow::Result<()> {
    let mut session = open_session(ctx, room_id).await?;
    session.set_draft(text);

    if mentions_assistant(text) {
        println!("  {} Waiting for the assistant...", "→".blue());
    }
    let asked = match session.send_and_reply().await? {
        SendOutcome::Ignored => {
            println!("{}", "Nothing to send.".yellow());
            return Ok(());
        }
        SendOutcome::Sent {
            message,
            assistant_prompt,
        } => {
            println!("{} Sent ({})", "✓".green().bold(), message.id().dimmed());
            assistant_prompt.is_some()
        }
    };

    let mut failed = false;
    while let Some(alert) = session.pop_alert() {
        print_alert(&alert);
        failed = true;
    }
    if asked && !failed {
        if let Some(reply) = session.messages().last().filter(|m| m.is_assistant()) {
            println!();
            println!("{}", "Assistant".magenta().bold());
            println!("{}", reply.content);
        }
    }
    Ok(())
}

async fn cmd_messages_send_media(
    ctx: &CliContext,
    room_id: &str,
    path: PathBuf,
    kind: Option<&str>,
) -> anyhow::Result<()> {
    let kind = match kind {
        Some(k) => k.parse::<MessageKind>().map_err(|e| anyhow::anyhow!(e))?,
        None => MessageKind::from_path(&path),
    };
    if kind == MessageKind::Text {
        anyhow::bail!("Media messages must be image, audio or file");
    }

    let mut session = open_session(ctx, room_id).await?;
    println!("  {} Uploading {}...", "→".blue(), path.display());
    let message = session.send_media(&path, kind).await?;

    println!(
        "{} Sent {} ({})",
        "✓".green().bold(),
        kind,
        message.id().dimmed()
    );
    println!("    {}", message.content.dimmed());
    Ok(())
}

async fn cmd_messages_delete(
    ctx: &CliContext,
    room_id: &str,
    message_id: &str,
) -> anyhow::Result<()> {
    let mut session = open_session(ctx, room_id).await?;
    session.delete_message(message_id).await?;
    println!("{} Message deleted", "✓".green().bold());
    Ok(())
}

pub fn print_alert(alert: &Alert) {
    match alert {
        Alert::Blocking { title, message } => {
            eprintln!("{} {}: {}", "✗".red().bold(), title.red(), message)
        }
        Alert::Notice { message } => eprintln!("{} {}", "!".yellow().bold(), message.yellow()),
    }
}
