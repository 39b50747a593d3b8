use crate::board::{new_conversation_title, renamed_title};
use crate::cli::ConversationCommand;
use crate::config::Config;
use crate::error::Result;
use crate::storage::SqliteStorage;
use colored::Colorize;
use prettytable::{format, Table};

/// Handle conversation commands
pub fn handle_conversations(config: &Config, command: ConversationCommand) -> Result<()> {
    let storage = SqliteStorage::from_config(&config.storage)?;

    match command {
        ConversationCommand::List => {
            let conversations = storage.list_conversations()?;

            if conversations.is_empty() {
                println!("{}", "No conversations found.".yellow());
                return Ok(());
            }

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Messages".bold(),
                "Created".bold()
            ]);

            for conversation in conversations {
                let count = storage.count_messages(&conversation.id)?;
                let title = truncate(&conversation.title, 40);
                let created = conversation.created_at.format("%Y-%m-%d %H:%M").to_string();

                table.add_row(prettytable::row![
                    conversation.id.cyan(),
                    title,
                    count,
                    created
                ]);
            }

            println!("\nConversations:");
            table.printstd();
            println!();
            println!(
                "Use {} to export an analysis.",
                "coboard export <ID>".cyan()
            );
            println!();
        }
        ConversationCommand::Create { title } => {
            let conversation = storage.create_conversation(new_conversation_title(Some(title.as_str())))?;
            println!(
                "{} {}",
                "Created conversation".green(),
                conversation.id.cyan()
            );
        }
        ConversationCommand::Rename { id, title } => {
            let conversation = storage.rename_conversation(&id, renamed_title(&title)?)?;
            println!(
                "{}",
                format!("Renamed {} to \"{}\"", conversation.id, conversation.title).green()
            );
        }
        ConversationCommand::Delete { id } => {
            let conversation = storage.delete_conversation(&id)?;
            println!(
                "{}",
                format!("Deleted conversation \"{}\"", conversation.title).green()
            );
        }
    }

    Ok(())
}

/// Shorten a title for table display, respecting character boundaries
fn truncate(title: &str, max: usize) -> String {
    if title.chars().count() > max {
        let kept: String = title.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        title.to_string()
    }
}
