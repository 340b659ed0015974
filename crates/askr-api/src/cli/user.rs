//! User management CLI commands: create, key, keys.

use anyhow::{Context, Result};
use clap::Subcommand;
use comfy_table::{Cell, ContentArrangement, Table, presets};
use console::style;

use askr_types::error::RepositoryError;
use askr_types::user::User;

use crate::state::AppState;

#[derive(Subcommand)]
pub enum UserCommand {
    /// Create a user and print their first API key.
    Create {
        email: String,

        /// Grant admin rights.
        #[arg(long)]
        admin: bool,
    },

    /// Issue an additional API key for an existing user.
    Key {
        email: String,

        /// Label for the key.
        #[arg(long, default_value = "cli")]
        name: String,
    },

    /// List a user's API keys (metadata only).
    Keys { email: String },
}

pub async fn run(state: &AppState, action: UserCommand, json: bool) -> Result<()> {
    match action {
        UserCommand::Create { email, admin } => create_user(state, &email, admin, json).await,
        UserCommand::Key { email, name } => issue_key(state, &email, &name, json).await,
        UserCommand::Keys { email } => list_keys(state, &email, json).await,
    }
}

/// Look up a user by email, failing with a readable message.
pub async fn require_user(state: &AppState, email: &str) -> Result<User> {
    state
        .users
        .find_by_email(email)
        .await?
        .with_context(|| format!("no user with email '{email}'"))
}

async fn create_user(state: &AppState, email: &str, admin: bool, json: bool) -> Result<()> {
    let user = match state.users.create_user(&User::new(email, admin)).await {
        Ok(user) => user,
        Err(RepositoryError::Conflict(msg)) => anyhow::bail!("{msg}"),
        Err(e) => return Err(e.into()),
    };
    let key = state.users.issue_api_key(&user.id, "default").await?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "user": user, "api_key": key })
        );
        return Ok(());
    }

    println!();
    println!(
        "  {} Created user {}{}",
        style("✓").green().bold(),
        style(&user.email).cyan(),
        if user.is_admin { " (admin)" } else { "" }
    );
    print_key(&key);
    Ok(())
}

async fn issue_key(state: &AppState, email: &str, name: &str, json: bool) -> Result<()> {
    let user = require_user(state, email).await?;
    let key = state.users.issue_api_key(&user.id, name).await?;

    if json {
        println!("{}", serde_json::json!({ "user_id": user.id, "name": name, "api_key": key }));
        return Ok(());
    }

    println!();
    println!(
        "  {} Issued key '{}' for {}",
        style("✓").green().bold(),
        name,
        style(&user.email).cyan()
    );
    print_key(&key);
    Ok(())
}

async fn list_keys(state: &AppState, email: &str, json: bool) -> Result<()> {
    let user = require_user(state, email).await?;
    let keys = state.users.list_api_keys(&user.id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&keys)?);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Name"),
            Cell::new("Created"),
            Cell::new("Last used"),
        ]);
    for key in &keys {
        table.add_row(vec![
            Cell::new(&key.name),
            Cell::new(key.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(
                key.last_used_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "never".to_string()),
            ),
        ]);
    }
    println!("{table}");
    Ok(())
}

fn print_key(key: &str) {
    println!();
    println!(
        "  {} API key (save this -- it won't be shown again):",
        style("🔑").bold()
    );
    println!();
    println!("  {}", style(key).yellow().bold());
    println!();
}
