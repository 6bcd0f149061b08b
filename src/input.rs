use crate::commands::dispatcher::CommandDispatcher;
use crate::config::Config;
use crate::core::error::ObchatError;

use console::style;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::{Hinter, HistoryHinter};
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config as LineConfig, Context, EditMode, Editor, Helper};
use std::path::{Path, PathBuf};

/// Completes slash commands, and saved transcript names after the commands
/// that take one.
pub struct ChatHelper {
    commands: CommandDispatcher,
    hinter: HistoryHinter,
}

impl ChatHelper {
    pub fn new(commands: CommandDispatcher) -> Self {
        Self {
            commands,
            hinter: HistoryHinter {},
        }
    }

    fn transcript_candidates(prefix: &str) -> Vec<Pair> {
        let mut names = Vec::new();
        if let Ok(entries) = std::fs::read_dir(Config::history_dir()) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(prefix) {
                    names.push(Pair {
                        display: name.clone(),
                        replacement: name,
                    });
                }
            }
        }
        names.sort_by(|a, b| a.display.cmp(&b.display));
        names
    }
}

impl Completer for ChatHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        if !line.starts_with('/') {
            return Ok((pos, Vec::new()));
        }

        // "/load <partial>" and "/delete <partial>" complete transcript names
        for command in ["/load ", "/delete "] {
            if line.starts_with(command) && pos >= command.len() {
                let prefix = &line[command.len()..pos];
                return Ok((command.len(), Self::transcript_candidates(prefix)));
            }
        }

        let command_part = &line[1..pos];
        let matches: Vec<Pair> = self
            .commands
            .get_command_names()
            .iter()
            .filter(|cmd| cmd.starts_with(command_part))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((1, matches))
    }
}

impl Hinter for ChatHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, ctx: &Context<'_>) -> Option<String> {
        self.hinter.hint(line, pos, ctx)
    }
}

impl Highlighter for ChatHelper {}

impl Validator for ChatHelper {}

impl Helper for ChatHelper {}

fn history_path() -> PathBuf {
    dirs::home_dir()
        .map(|mut path| {
            path.push(".obchat/input_history.txt");
            path
        })
        .unwrap_or_else(|| Path::new(".obchat/input_history.txt").to_path_buf())
}

/// Creates a configured rustyline editor
pub fn create_editor(
    commands: CommandDispatcher,
) -> Result<Editor<ChatHelper, FileHistory>, ObchatError> {
    let config = LineConfig::builder()
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();

    let mut editor = Editor::with_config(config)
        .map_err(|e| ObchatError::Input(format!("Failed to create line editor: {}", e)))?;

    editor.set_helper(Some(ChatHelper::new(commands)));
    let _ = editor.load_history(&history_path());

    Ok(editor)
}

/// Reads a line of input using rustyline
pub fn read_input(
    editor: &mut Editor<ChatHelper, FileHistory>,
) -> Result<Option<String>, ObchatError> {
    let prompt = style("you> ").bold().cyan().to_string();
    match editor.readline(&prompt) {
        Ok(line) => {
            if !line.trim().is_empty() {
                if let Err(e) = editor.add_history_entry(&line) {
                    return Err(ObchatError::Input(format!(
                        "Failed to add history entry: {}",
                        e
                    )));
                }
            }
            Ok(Some(line))
        }
        Err(ReadlineError::Interrupted) => {
            println!("Exiting...");
            Ok(None)
        }
        Err(ReadlineError::Eof) => {
            println!("Exiting...");
            Ok(None)
        }
        Err(err) => Err(ObchatError::Input(format!("Input error: {}", err))),
    }
}

/// Saves the editor history
pub fn save_history(editor: &mut Editor<ChatHelper, FileHistory>) -> Result<(), ObchatError> {
    let path = history_path();

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ObchatError::Input(format!("Failed to create history directory: {}", e))
            })?;
        }
    }

    editor
        .save_history(&path)
        .map_err(|e| ObchatError::Input(format!("Failed to save history: {}", e)))
}
