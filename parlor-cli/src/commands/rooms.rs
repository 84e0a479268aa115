use clap::Subcommand;
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, Color, Table};
use parlor_core::{delete_room, ChatRoom, RoomForm};
use std::io::{BufRead, Write};

use super::messages::print_messages;
use crate::context::{is_json, truncate, CliContext};

#[derive(Subcommand)]
pub enum RoomsCommand {
    #[command(about = "List chat rooms")]
    List {
        #[arg(
            short,
            long,
            default_value = "text",
            help = "Output format (text, json)"
        )]
        format: String,
    },

    #[command(about = "Create a chat room")]
    Create {
        #[arg(help = "Room title")]
        title: String,

        #[arg(short, long, default_value = "", help = "Optional description (100 characters max)")]
        description: String,
    },

    #[command(about = "Show a room and its latest messages")]
    Show {
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

    #[command(about = "Delete a room with all of its messages and media")]
    Delete {
        #[arg(help = "Chat room ID")]
        room_id: String,

        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

pub async fn handle_rooms_command(cmd: Option<RoomsCommand>) -> anyhow::Result<()> {
    let ctx = CliContext::load()?;

    match cmd.unwrap_or(RoomsCommand::List {
        format: "text".to_string(),
    }) {
        RoomsCommand::List { format } => cmd_rooms_list(&ctx, &format).await,
        RoomsCommand::Create { title, description } => {
            cmd_rooms_create(&ctx, &title, &description).await
        }
        RoomsCommand::Show { room_id, format } => cmd_rooms_show(&ctx, &room_id, &format).await,
        RoomsCommand::Delete { room_id, yes } => cmd_rooms_delete(&ctx, &room_id, yes).await,
    }
}

async fn cmd_rooms_list(ctx: &CliContext, format: &str) -> anyhow::Result<()> {
    let rooms = ctx.services.list_rooms().await?;

    if is_json(format) {
        println!("{}", serde_json::to_string_pretty(&rooms)?);
        return Ok(());
    }

    if rooms.is_empty() {
        println!("{}", "No chat rooms yet.".yellow());
        println!(
            "{}",
            "Create one with 'parlor rooms create <title>'.".dimmed()
        );
        return Ok(());
    }

    println!("{}", "Chat Rooms".cyan().bold());
    println!();
    println!("{}", rooms_table(&rooms));
    println!();
    println!("  {} {}", "Total:".dimmed(), rooms.len());
    Ok(())
}

fn rooms_table(rooms: &[ChatRoom]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            Cell::new("ID").fg(Color::White),
            Cell::new("Title").fg(Color::White),
            Cell::new("Description").fg(Color::White),
            Cell::new("Last Activity").fg(Color::White),
        ]);

    for room in rooms {
        let description = if room.description.is_empty() {
            "-".to_string()
        } else {
            truncate(&room.description, 40)
        };
        table.add_row(vec![
            Cell::new(room.id()).fg(Color::DarkGrey),
            Cell::new(&room.title).fg(Color::Cyan),
            Cell::new(description),
            Cell::new(
                room.meta
                    .updated_at
                    .format("%Y-%m-%d %H:%M")
                    .to_string(),
            ),
        ]);
    }
    table
}

async fn cmd_rooms_create(ctx: &CliContext, title: &str, description: &str) -> anyhow::Result<()> {
    let mut form = RoomForm::new();
    form.title = title.to_string();
    form.set_description(description);
    if description.chars().count() > form.description().chars().count() {
        println!(
            "  {} Description truncated to {} characters",
            "!".yellow(),
            form.description().chars().count()
        );
    }

    let room = form.submit(&ctx.services).await?;

    println!(
        "{} Created {} ({})",
        "✓".green().bold(),
        room.title.bold(),
        room.id().dimmed()
    );
    Ok(())
}

async fn cmd_rooms_show(ctx: &CliContext, room_id: &str, format: &str) -> anyhow::Result<()> {
    let room = ctx.services.get_room(room_id).await?;
    let messages = ctx.services.list_messages(room_id).await?;

    if is_json(format) {
        let output = serde_json::json!({
            "room": room,
            "messages": messages,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", room.title.cyan().bold());
    if !room.description.is_empty() {
        println!("{}", room.description.dimmed());
    }
    println!("{}", "═".repeat(40).dimmed());
    println!();

    if messages.is_empty() {
        println!("{}", "No messages yet. Start the conversation!".yellow());
        return Ok(());
    }
    print_messages(&messages);
    Ok(())
}

async fn cmd_rooms_delete(ctx: &CliContext, room_id: &str, yes: bool) -> anyhow::Result<()> {
    let room = ctx.services.get_room(room_id).await?;

    if !yes && !confirm(&format!(
        "Delete '{}' and all of its messages? This cannot be undone.",
        room.title
    ))? {
        println!("{}", "Cancelled.".dimmed());
        return Ok(());
    }

    let outcome = delete_room(&ctx.services, room_id).await?;

    println!("{} Deleted {}", "✓".green().bold(), room.title.bold());
    println!(
        "    {} messages, {} media files removed",
        outcome.messages_deleted, outcome.media_deleted
    );
    if outcome.media_failed > 0 {
        println!(
            "    {} {} media files could not be removed",
            "!".yellow(),
            outcome.media_failed
        );
    }
    Ok(())
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{} {} [y/N] ", "?".yellow().bold(), question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
