use colored::Colorize;
use parlor_core::{ChatRoomSession, Message};
use std::collections::HashSet;
use tracing::debug;

use super::messages::sender_label;
use crate::context::CliContext;

/// Prints the backlog, then every new message until Ctrl+C or the subscription ends.
pub async fn handle_watch_command(room_id: &str, backlog: usize) -> anyhow::Result<()> {
    let ctx = CliContext::load()?;
    let viewer = ctx.viewer().await?;

    let mut session = ChatRoomSession::new(ctx.services.clone(), room_id, viewer);
    session.load().await;
    if let Some(error) = session.error() {
        anyhow::bail!("{}", error);
    }
    session.subscribe().await?;

    let title = session
        .room()
        .map(|r| r.title.clone())
        .unwrap_or_else(|| room_id.to_string());
    println!("{} {}", "Watching".cyan().bold(), title.bold());
    println!("{}", "Press Ctrl+C to stop.".dimmed());
    println!("{}", "─".repeat(40).dimmed());

    let mut seen: HashSet<String> = HashSet::new();
    let messages = session.messages();
    let skip = messages.len().saturating_sub(backlog);
    for message in messages {
        seen.insert(message.id().to_string());
    }
    for message in &messages[skip..] {
        print_line(message);
    }

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    loop {
        let event = tokio::select! {
            event = session.next_event() => event,
            _ = &mut interrupted => {
                println!();
                break;
            }
        };
        let Some(event) = event else {
            println!("{}", "Realtime connection closed.".yellow());
            break;
        };
        if !session.handle_event(&event).await {
            debug!(events = ?event.events, "Ignoring event for another room");
            continue;
        }
        for message in session.messages() {
            if seen.insert(message.id().to_string()) {
                print_line(message);
            }
        }
    }

    session.close();
    Ok(())
}

fn print_line(message: &Message) {
    let time = message.meta.created_at.format("%H:%M").to_string();
    let sender = if message.is_assistant() {
        sender_label(message).magenta().bold()
    } else {
        sender_label(message).cyan().bold()
    };
    let body = if message.kind.is_media() {
        format!("[{}] {}", message.kind, message.content)
    } else {
        message.content.clone()
    };
    println!("{} {} {}", time.dimmed(), sender, body);
}
