use crate::api::QueryBackend;
use crate::cli::Args;
use crate::commands::{SessionState, dispatcher::CommandDispatcher};
use crate::config::Config;
use crate::conversation::{ConversationStore, Sender, UserProfile, validate_submission};
use crate::core::error::ObchatError;
use crate::display;
use crate::input;
use crate::settings::SettingsStore;
use is_terminal::IsTerminal;
use std::io::{self, Read};

pub struct Application {
    pub args: Args,
    pub config: Config,
    pub backend: Box<dyn QueryBackend>,
    pub command_dispatcher: CommandDispatcher,
    session: SessionState,
}

impl Application {
    pub fn new(
        args: Args,
        config: Config,
        backend: Box<dyn QueryBackend>,
        settings: SettingsStore,
        command_dispatcher: CommandDispatcher,
    ) -> Result<Self, ObchatError> {
        let overrides = args.settings_overrides()?;
        let store = ConversationStore::new(settings.current().clone());
        let mut session = SessionState::new(store, settings);
        if !overrides.is_empty() {
            session.apply_settings_patch(&overrides);
        }

        Ok(Self {
            args,
            config,
            backend,
            command_dispatcher,
            session,
        })
    }

    pub async fn run(&mut self) -> Result<(), ObchatError> {
        let context = if !std::io::stdin().is_terminal() {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| ObchatError::Input(format!("Failed to read from stdin: {}", e)))?;
            Some(buffer)
        } else {
            None
        };

        if self.args.chat {
            self.run_interactive().await
        } else {
            self.run_one_shot(context).await
        }
    }

    /// Ask a single question and print the reply.
    async fn run_one_shot(&mut self, context: Option<String>) -> Result<(), ObchatError> {
        let final_query = match (self.args.query.as_deref(), context) {
            (Some(arg_q), Some(stdin_ctx)) => format!("<pipe>{}</pipe>\n\n{}", stdin_ctx, arg_q),
            (None, Some(stdin_ctx)) => format!("<pipe>{}</pipe>", stdin_ctx),
            (Some(arg_q), None) => arg_q.to_string(),
            (None, None) => {
                return Err(ObchatError::Input("No question provided".to_string()));
            }
        };

        let text = validate_submission(&final_query)?.to_string();
        self.session
            .store
            .send_message(&text, self.backend.as_ref())
            .await;

        if let Some(err) = self.session.store.error() {
            display::display_error(err);
        } else if let Some(message) = self.session.store.last_message() {
            display::display_agent_message(message);
        }

        Ok(())
    }

    /// The interactive chat loop: slash commands, validation, dispatch.
    async fn run_interactive(&mut self) -> Result<(), ObchatError> {
        self.session.store.set_user(UserProfile::new("local-user"));
        display::display_welcome(self.session.store.settings(), &self.config.backend_url);

        let mut editor = input::create_editor(self.command_dispatcher.clone())?;

        loop {
            let input_result = input::read_input(&mut editor)?;

            let input = match input_result {
                Some(input) => input.trim().to_string(),
                None => break,
            };

            if input.is_empty() {
                continue;
            }

            if input.starts_with('/') {
                let parts: Vec<&str> = input[1..].split_whitespace().collect();
                if !parts.is_empty() {
                    let command = parts[0];
                    let args = if parts.len() > 1 { &parts[1..] } else { &[] };

                    match self.command_dispatcher.execute(command, args, &mut self.session) {
                        Ok(Some(output)) => {
                            println!("{}", output);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            eprintln!("Error executing command: {}", e);
                        }
                    }

                    if !self.session.should_continue {
                        break;
                    }
                }
                continue;
            }

            // Validation failures stay inline; they never become store errors.
            let text = match validate_submission(&input) {
                Ok(text) => text.to_string(),
                Err(e) => {
                    display::display_validation_error(&e.to_string());
                    continue;
                }
            };

            if !self.session.store.can_submit() {
                match self.session.store.error() {
                    Some(err) => display::display_error_banner(err),
                    None => display::display_validation_error("A request is still in flight"),
                }
                continue;
            }

            display::display_typing();
            self.session
                .store
                .send_message(&text, self.backend.as_ref())
                .await;

            match self.session.store.error() {
                Some(err) => display::display_error_banner(err),
                None => {
                    if let Some(message) = self.session.store.last_message() {
                        if message.sender == Sender::Agent {
                            display::display_agent_message(message);
                        }
                    }
                }
            }
        }

        input::save_history(&mut editor)?;

        Ok(())
    }
}
