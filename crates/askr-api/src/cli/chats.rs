//! `askr chats <email>`: list a user's chats.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::cli::user::require_user;
use crate::state::AppState;

pub async fn list_chats(state: &AppState, email: &str, json: bool) -> Result<()> {
    let user = require_user(state, email).await?;
    let chats = state.chat_service.list_chats(&user).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chats)?);
        return Ok(());
    }

    if chats.is_empty() {
        println!();
        println!("  {} No chats for {}", style("i").blue().bold(), style(email).cyan());
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("ID"), Cell::new("Title"), Cell::new("Created")]);
    for chat in &chats {
        table.add_row(vec![
            Cell::new(chat.id.as_str()).fg(Color::Cyan),
            Cell::new(&chat.title),
            Cell::new(chat.created_at.format("%Y-%m-%d %H:%M")),
        ]);
    }
    println!("{table}");
    Ok(())
}
