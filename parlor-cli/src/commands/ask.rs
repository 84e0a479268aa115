use colored::Colorize;
use parlor_core::{AssistantClient, GeminiClient, ParlorConfig, ParlorError, ReplyOptions};

/// Sends one prompt straight to the assistant. Only the assistant settings are needed.
pub async fn handle_ask_command(prompt: &str) -> anyhow::Result<()> {
    let config = ParlorConfig::load_layers(parlor_core::config::get_config_paths())
        .map_err(ParlorError::from)?;
    let client = GeminiClient::new(&config.assistant);
    let options = ReplyOptions::from(&config.assistant);

    let reply = client.generate_reply(prompt, &options).await?;

    println!("{}", "Assistant".magenta().bold());
    println!("{}", reply);
    Ok(())
}
