use clap::Subcommand;
use colored::Colorize;
use parlor_core::identity::IdentityProvider;
use parlor_core::{ParlorConfig, ParlorError, SsoStrategy};

use crate::context::{clear_pending, identity_client, is_json, load_pending, save_pending};

#[derive(Subcommand)]
pub enum AuthCommand {
    #[command(about = "Start a browser sign-in and print the URL to open")]
    Login {
        #[arg(short, long, default_value = "google", help = "Sign-in method (google, passkey)")]
        strategy: String,
    },

    #[command(about = "Finish the sign-in started with 'auth login'")]
    Complete,

    #[command(about = "End the current session")]
    Logout,

    #[command(about = "Show the signed-in account")]
    Whoami {
        #[arg(
            short,
            long,
            default_value = "text",
            help = "Output format (text, json)"
        )]
        format: String,
    },
}

pub async fn handle_auth_command(cmd: AuthCommand) -> anyhow::Result<()> {
    let config = ParlorConfig::load().map_err(ParlorError::from)?;

    match cmd {
        AuthCommand::Login { strategy } => cmd_login(&config, &strategy).await,
        AuthCommand::Complete => cmd_complete(&config).await,
        AuthCommand::Logout => cmd_logout(&config).await,
        AuthCommand::Whoami { format } => cmd_whoami(&config, &format).await,
    }
}

async fn cmd_login(config: &ParlorConfig, strategy: &str) -> anyhow::Result<()> {
    let strategy: SsoStrategy = strategy
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    let identity = identity_client(config)?;

    let challenge = identity.begin_sign_in(strategy).await?;
    save_pending(&challenge)?;

    println!("{}", "Sign in with your browser".cyan().bold());
    println!();
    println!("  {} Open this URL and finish signing in:", "→".blue());
    println!();
    println!("    {}", challenge.authorize_url.underline());
    println!();
    println!(
        "  {} Then run {}",
        "→".blue(),
        "parlor auth complete".bold()
    );

    Ok(())
}

async fn cmd_complete(config: &ParlorConfig) -> anyhow::Result<()> {
    let Some(challenge) = load_pending()? else {
        println!("{}", "No sign-in in progress.".yellow());
        println!("{}", "Start one with 'parlor auth login'.".dimmed());
        return Ok(());
    };
    let identity = identity_client(config)?;

    let session = identity.complete_sign_in(&challenge).await?;
    clear_pending()?;

    println!(
        "{} Signed in as {}",
        "✓".green().bold(),
        session.user.display_name().bold()
    );
    Ok(())
}

async fn cmd_logout(config: &ParlorConfig) -> anyhow::Result<()> {
    let identity = identity_client(config)?;
    identity.sign_out().await?;
    clear_pending()?;
    println!("{} Signed out", "✓".green().bold());
    Ok(())
}

async fn cmd_whoami(config: &ParlorConfig, format: &str) -> anyhow::Result<()> {
    let identity = identity_client(config)?;
    let session = identity.current_session().await?;

    if is_json(format) {
        println!("{}", serde_json::to_string_pretty(&session)?);
        return Ok(());
    }

    match session {
        Some(session) => {
            let user = &session.user;
            println!("{}", "Signed In".cyan().bold());
            println!("{}", "═".repeat(40).dimmed());
            println!("  {:<10} {}", "Name:".bold(), user.display_name());
            println!(
                "  {:<10} {}",
                "Email:".bold(),
                user.email.as_deref().unwrap_or("-")
            );
            println!("  {:<10} {}", "User ID:".bold(), user.id);
            println!("  {:<10} {}", "Session:".bold(), session.id.dimmed());
        }
        None => {
            println!("{}", "Not signed in.".yellow());
            println!("{}", "Run 'parlor auth login' to sign in.".dimmed());
        }
    }
    Ok(())
}
