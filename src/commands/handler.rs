use super::SessionState;
use crate::core::error::ObchatError;
use crate::display;
use crate::settings::{ProductType, ProficiencyLevel, ReasoningFocus, SettingsPatch, UserRole};

use console::style;

pub trait CommandHandler {
    fn execute(&self, state: &mut SessionState, args: &[&str]) -> Result<Option<String>, ObchatError>;
    fn help(&self) -> &'static str;
}

pub struct QuitCommand;
pub struct HelpCommand;
pub struct ClearCommand;
pub struct ResetCommand;
pub struct DismissCommand;
pub struct SettingsCommand;
pub struct LevelCommand;
pub struct RoleCommand;
pub struct ProductCommand;
pub struct FocusCommand;
pub struct SourcesCommand;
pub struct DefaultsCommand;
pub struct SaveHistoryCommand;
pub struct LoadHistoryCommand;
pub struct ListHistoryCommand;
pub struct DeleteHistoryCommand;

impl CommandHandler for QuitCommand {
    fn execute(&self, state: &mut SessionState, _args: &[&str]) -> Result<Option<String>, ObchatError> {
        state.should_continue = false;
        Ok(None)
    }

    fn help(&self) -> &'static str {
        "/quit - Exit the chat session"
    }
}

impl CommandHandler for HelpCommand {
    fn execute(
        &self,
        _state: &mut SessionState,
        _args: &[&str],
    ) -> Result<Option<String>, ObchatError> {
        let title = style("Available Commands").bold().underlined();
        let help_text = vec![
            title.to_string(),
            style(QuitCommand.help()).to_string(),
            style(HelpCommand.help()).to_string(),
            style(ClearCommand.help()).to_string(),
            style(ResetCommand.help()).to_string(),
            style(DismissCommand.help()).to_string(),
            style(SettingsCommand.help()).to_string(),
            style(LevelCommand.help()).to_string(),
            style(RoleCommand.help()).to_string(),
            style(ProductCommand.help()).to_string(),
            style(FocusCommand.help()).to_string(),
            style(SourcesCommand.help()).to_string(),
            style(DefaultsCommand.help()).to_string(),
            style(SaveHistoryCommand.help()).to_string(),
            style(LoadHistoryCommand.help()).to_string(),
            style(ListHistoryCommand.help()).to_string(),
            style(DeleteHistoryCommand.help()).to_string(),
        ]
        .join("\n");

        Ok(Some(help_text))
    }

    fn help(&self) -> &'static str {
        "/help - Show available commands"
    }
}

impl CommandHandler for ClearCommand {
    fn execute(&self, state: &mut SessionState, _args: &[&str]) -> Result<Option<String>, ObchatError> {
        state.store.clear_messages();
        Ok(Some("Conversation cleared.".to_string()))
    }

    fn help(&self) -> &'static str {
        "/clear - Clear the conversation log"
    }
}

impl CommandHandler for ResetCommand {
    fn execute(&self, state: &mut SessionState, _args: &[&str]) -> Result<Option<String>, ObchatError> {
        state.store.reset();
        Ok(Some("Conversation reset.".to_string()))
    }

    fn help(&self) -> &'static str {
        "/reset - Clear the conversation, flags and any error"
    }
}

impl CommandHandler for DismissCommand {
    fn execute(&self, state: &mut SessionState, _args: &[&str]) -> Result<Option<String>, ObchatError> {
        if state.store.error().is_none() {
            return Ok(Some("No error to dismiss.".to_string()));
        }
        state.store.set_error(None);
        Ok(Some("Error dismissed.".to_string()))
    }

    fn help(&self) -> &'static str {
        "/dismiss - Dismiss the current error and re-enable submission"
    }
}

impl CommandHandler for SettingsCommand {
    fn execute(&self, state: &mut SessionState, _args: &[&str]) -> Result<Option<String>, ObchatError> {
        display::display_settings(state.store.settings());
        Ok(None)
    }

    fn help(&self) -> &'static str {
        "/settings - Show the current chat settings"
    }
}

fn options<T: Copy>(all: &[T], as_str: impl Fn(&T) -> &'static str) -> String {
    all.iter().map(as_str).collect::<Vec<_>>().join(", ")
}

impl CommandHandler for LevelCommand {
    fn execute(&self, state: &mut SessionState, args: &[&str]) -> Result<Option<String>, ObchatError> {
        let choices = options(&ProficiencyLevel::ALL, |l| l.as_str());
        if args.is_empty() {
            return Ok(Some(format!(
                "Current proficiency level: {} (options: {})",
                state.store.settings().proficiency_level.as_str(),
                choices
            )));
        }

        match ProficiencyLevel::from_str(args[0]) {
            Some(level) => {
                state.apply_settings_patch(&SettingsPatch {
                    proficiency_level: Some(level),
                    ..Default::default()
                });
                Ok(Some(format!("Proficiency level set to: {}", level.as_str())))
            }
            None => Ok(Some(format!(
                "Unknown level '{}'. Options: {}",
                args[0], choices
            ))),
        }
    }

    fn help(&self) -> &'static str {
        "/level <name> - Show or change the proficiency level"
    }
}

impl CommandHandler for RoleCommand {
    fn execute(&self, state: &mut SessionState, args: &[&str]) -> Result<Option<String>, ObchatError> {
        let choices = options(&UserRole::ALL, |r| r.as_str());
        if args.is_empty() {
            return Ok(Some(format!(
                "Current role: {} (options: {})",
                state.store.settings().user_role.as_str(),
                choices
            )));
        }

        match UserRole::from_str(args[0]) {
            Some(role) => {
                state.apply_settings_patch(&SettingsPatch {
                    user_role: Some(role),
                    ..Default::default()
                });
                Ok(Some(format!("Role set to: {}", role.as_str())))
            }
            None => Ok(Some(format!(
                "Unknown role '{}'. Options: {}",
                args[0], choices
            ))),
        }
    }

    fn help(&self) -> &'static str {
        "/role <name> - Show or change your role"
    }
}

impl CommandHandler for ProductCommand {
    fn execute(&self, state: &mut SessionState, args: &[&str]) -> Result<Option<String>, ObchatError> {
        let choices = options(&ProductType::ALL, |p| p.as_str());
        if args.is_empty() {
            return Ok(Some(format!(
                "Current product: {} (options: {})",
                state.store.settings().product_type.as_str(),
                choices
            )));
        }

        match ProductType::from_str(args[0]) {
            Some(product) => {
                state.apply_settings_patch(&SettingsPatch {
                    product_type: Some(product),
                    ..Default::default()
                });
                Ok(Some(format!("Product set to: {}", product.as_str())))
            }
            None => Ok(Some(format!(
                "Unknown product '{}'. Options: {}",
                args[0], choices
            ))),
        }
    }

    fn help(&self) -> &'static str {
        "/product <name> - Show or change the product"
    }
}

impl CommandHandler for FocusCommand {
    fn execute(&self, state: &mut SessionState, args: &[&str]) -> Result<Option<String>, ObchatError> {
        let choices = options(&ReasoningFocus::ALL, |f| f.as_str());
        if args.is_empty() {
            return Ok(Some(format!(
                "Current reasoning focus: {} (options: {})",
                state.store.settings().reasoning_focus.as_str(),
                choices
            )));
        }

        match ReasoningFocus::from_str(args[0]) {
            Some(focus) => {
                state.apply_settings_patch(&SettingsPatch {
                    reasoning_focus: Some(focus),
                    ..Default::default()
                });
                Ok(Some(format!("Reasoning focus set to: {}", focus.as_str())))
            }
            None => Ok(Some(format!(
                "Unknown focus '{}'. Options: {}",
                args[0], choices
            ))),
        }
    }

    fn help(&self) -> &'static str {
        "/focus <name> - Show or change the reasoning focus"
    }
}

impl CommandHandler for SourcesCommand {
    fn execute(&self, state: &mut SessionState, args: &[&str]) -> Result<Option<String>, ObchatError> {
        if args.is_empty() {
            let s = state.store.settings();
            let on_off = |v: bool| if v { "on" } else { "off" };
            return Ok(Some(format!(
                "Knowledge sources: lucid {} · wiki {} · github {}",
                on_off(s.include_lucid),
                on_off(s.include_wiki),
                on_off(s.include_github)
            )));
        }

        let current = state.store.settings().clone();
        let enabled = match args.get(1).copied() {
            Some("on") => Some(true),
            Some("off") => Some(false),
            Some(other) => {
                return Ok(Some(format!(
                    "Expected 'on' or 'off', got '{}'. Usage: /sources <lucid|wiki|github> [on|off]",
                    other
                )));
            }
            None => None,
        };

        let mut patch = SettingsPatch::default();
        let new_value = match args[0] {
            "lucid" => {
                let v = enabled.unwrap_or(!current.include_lucid);
                patch.include_lucid = Some(v);
                v
            }
            "wiki" => {
                let v = enabled.unwrap_or(!current.include_wiki);
                patch.include_wiki = Some(v);
                v
            }
            "github" => {
                let v = enabled.unwrap_or(!current.include_github);
                patch.include_github = Some(v);
                v
            }
            other => {
                return Ok(Some(format!(
                    "Unknown source '{}'. Options: lucid, wiki, github",
                    other
                )));
            }
        };

        state.apply_settings_patch(&patch);
        Ok(Some(format!(
            "Source '{}' is now {}",
            args[0],
            if new_value { "on" } else { "off" }
        )))
    }

    fn help(&self) -> &'static str {
        "/sources <lucid|wiki|github> [on|off] - Toggle a knowledge source"
    }
}

impl CommandHandler for DefaultsCommand {
    fn execute(&self, state: &mut SessionState, _args: &[&str]) -> Result<Option<String>, ObchatError> {
        state.reset_settings();
        Ok(Some("Settings restored to defaults.".to_string()))
    }

    fn help(&self) -> &'static str {
        "/defaults - Restore all settings to their defaults"
    }
}

impl CommandHandler for SaveHistoryCommand {
    fn execute(&self, state: &mut SessionState, args: &[&str]) -> Result<Option<String>, ObchatError> {
        let filename = if args.is_empty() {
            chrono::Local::now()
                .format("%Y%m%d_%H%M%S.json")
                .to_string()
        } else {
            args[0].to_string()
        };

        let history_dir = crate::config::Config::history_dir();
        std::fs::create_dir_all(&history_dir)?;
        let path = history_dir.join(filename);

        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, state.store.messages())?;

        Ok(Some(format!("Transcript saved to: {}", path.display())))
    }

    fn help(&self) -> &'static str {
        "/save <filename> - Save the conversation transcript to a file"
    }
}

impl CommandHandler for LoadHistoryCommand {
    fn execute(&self, state: &mut SessionState, args: &[&str]) -> Result<Option<String>, ObchatError> {
        if args.is_empty() {
            return Ok(Some("Please specify a filename".to_string()));
        }

        let history_dir = crate::config::Config::history_dir();
        let path = history_dir.join(args[0]);

        let file = std::fs::File::open(&path)?;
        let messages: Vec<crate::conversation::Message> = serde_json::from_reader(file)?;

        for message in &messages {
            display::display_transcript_message(message);
        }
        state.store.restore_messages(messages);

        Ok(Some(format!("Transcript loaded from: {}", path.display())))
    }

    fn help(&self) -> &'static str {
        "/load <filename> - Load a conversation transcript from a file"
    }
}

impl CommandHandler for ListHistoryCommand {
    fn execute(
        &self,
        _state: &mut SessionState,
        _args: &[&str],
    ) -> Result<Option<String>, ObchatError> {
        let history_dir = crate::config::Config::history_dir();
        std::fs::create_dir_all(&history_dir)?;

        let mut files = Vec::new();
        for entry in std::fs::read_dir(history_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        if files.is_empty() {
            Ok(Some("No saved transcripts found.".to_string()))
        } else {
            files.sort();
            Ok(Some(files.join("\n")))
        }
    }

    fn help(&self) -> &'static str {
        "/list - List saved conversation transcripts"
    }
}

impl CommandHandler for DeleteHistoryCommand {
    fn execute(&self, _state: &mut SessionState, args: &[&str]) -> Result<Option<String>, ObchatError> {
        if args.is_empty() {
            return Ok(Some("Please specify a filename to delete".to_string()));
        }

        let history_dir = crate::config::Config::history_dir();
        let path = history_dir.join(args[0]);

        if !path.exists() {
            return Ok(Some(format!("File not found: {}", path.display())));
        }

        std::fs::remove_file(&path)?;
        Ok(Some(format!("Deleted transcript: {}", path.display())))
    }

    fn help(&self) -> &'static str {
        "/delete <filename> - Delete a saved transcript"
    }
}
