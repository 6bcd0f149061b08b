use super::{
    SessionState,
    handler::{
        ClearCommand, DefaultsCommand, DeleteHistoryCommand, DismissCommand, FocusCommand,
        HelpCommand, LevelCommand, ListHistoryCommand, LoadHistoryCommand, ProductCommand,
        QuitCommand, ResetCommand, RoleCommand, SaveHistoryCommand, SettingsCommand,
        SourcesCommand,
    },
    registry::CommandRegistry,
};
use crate::core::error::ObchatError;
use std::sync::Arc;

#[derive(Clone)]
pub struct CommandDispatcher {
    registry: Arc<CommandRegistry>,
}

impl CommandDispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }

    pub fn execute(
        &self,
        command: &str,
        args: &[&str],
        state: &mut SessionState,
    ) -> Result<Option<String>, ObchatError> {
        self.registry.execute(command, args, state)
    }

    pub fn get_command_names(&self) -> Vec<String> {
        self.registry.get_command_names()
    }
}

pub fn create_command_registry() -> CommandDispatcher {
    let mut registry = CommandRegistry::new();

    registry.register("quit", QuitCommand);
    registry.register("help", HelpCommand);
    registry.register("clear", ClearCommand);
    registry.register("reset", ResetCommand);
    registry.register("dismiss", DismissCommand);
    registry.register("settings", SettingsCommand);
    registry.register("level", LevelCommand);
    registry.register("role", RoleCommand);
    registry.register("product", ProductCommand);
    registry.register("focus", FocusCommand);
    registry.register("sources", SourcesCommand);
    registry.register("defaults", DefaultsCommand);
    registry.register("save", SaveHistoryCommand);
    registry.register("load", LoadHistoryCommand);
    registry.register("list", ListHistoryCommand);
    registry.register("delete", DeleteHistoryCommand);

    CommandDispatcher::new(Arc::new(registry))
}
