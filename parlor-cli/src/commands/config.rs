use clap::Subcommand;
use colored::Colorize;
use parlor_core::config::get_config_paths;
use parlor_core::{ParlorConfig, ParlorError};

use crate::context::is_json;

#[derive(Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Print the merged configuration with secrets masked")]
    Show {
        #[arg(
            short,
            long,
            default_value = "text",
            help = "Output format (text, json)"
        )]
        format: String,
    },

    #[command(about = "Check that every required setting is present")]
    Check,
}

pub async fn handle_config_command(cmd: Option<ConfigCommand>) -> anyhow::Result<()> {
    match cmd.unwrap_or(ConfigCommand::Show {
        format: "text".to_string(),
    }) {
        ConfigCommand::Show { format } => cmd_config_show(&format),
        ConfigCommand::Check => cmd_config_check(),
    }
}

fn cmd_config_show(format: &str) -> anyhow::Result<()> {
    let config = ParlorConfig::load_layers(get_config_paths())
        .map_err(ParlorError::from)?
        .redacted();

    if is_json(format) {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("{}", "Parlor Configuration".cyan().bold());
    println!("{}", "═".repeat(40).dimmed());

    println!("  {}", "Backend".yellow().bold());
    row("Endpoint", &config.backend.endpoint);
    row("Project", &config.backend.project_id);
    row("Database", &config.backend.database_id);
    row("Messages", &config.backend.messages_collection_id);
    row("Chat rooms", &config.backend.chatrooms_collection_id);
    row("Bucket", &config.backend.bucket_id);
    println!();

    println!("  {}", "Identity".yellow().bold());
    row("Key", &config.identity.publishable_key);
    row("Redirect", &config.identity.redirect_url);
    println!();

    println!("  {}", "Assistant".yellow().bold());
    row("Model", &config.assistant.model);
    row(
        "API key",
        config.assistant.api_key.as_deref().unwrap_or("(not set)"),
    );
    row(
        "Max tokens",
        &config.assistant.max_output_tokens.to_string(),
    );
    println!();

    println!("  {}", "Config files".yellow().bold());
    for path in get_config_paths() {
        let marker = if path.exists() {
            "✓".green()
        } else {
            "·".dimmed()
        };
        println!("    {} {}", marker, path.display());
    }
    Ok(())
}

fn row(label: &str, value: &str) {
    let shown = if value.trim().is_empty() {
        "(not set)".dimmed().to_string()
    } else {
        value.to_string()
    };
    println!("    {:<12} {}", format!("{}:", label), shown);
}

fn cmd_config_check() -> anyhow::Result<()> {
    let config = ParlorConfig::load_layers(get_config_paths()).map_err(ParlorError::from)?;
    config.validate().map_err(ParlorError::from)?;

    println!("{} Configuration is complete", "✓".green().bold());
    if config.assistant_enabled() {
        println!("  {} Assistant key present", "✓".green());
    } else {
        println!(
            "  {} No assistant key; @ai mentions will fail",
            "!".yellow()
        );
    }
    Ok(())
}
