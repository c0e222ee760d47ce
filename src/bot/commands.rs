//! Bot command menu registration

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::BotCommand;
use teloxide::utils::command::BotCommands;

use crate::event::Command;
use crate::localization::{t_lang, DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES};

/// Derived command list with descriptions in one language
pub fn bot_commands(language_code: &str) -> Vec<BotCommand> {
    Command::bot_commands()
        .into_iter()
        .map(|command| {
            let name = command.command.trim_start_matches('/').to_string();
            let description = t_lang(&format!("command-{name}"), Some(language_code));
            BotCommand::new(name, description)
        })
        .collect()
}

/// Register the command menu, default language first
pub async fn register_commands(bot: &Bot) -> Result<()> {
    bot.set_my_commands(bot_commands(DEFAULT_LANGUAGE)).await?;

    for language in SUPPORTED_LANGUAGES {
        if language == DEFAULT_LANGUAGE {
            continue;
        }
        bot.set_my_commands(bot_commands(language))
            .language_code(language)
            .await?;
    }

    Ok(())
}
