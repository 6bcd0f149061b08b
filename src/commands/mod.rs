pub mod dispatcher;
pub mod handler;
pub mod registry;

use crate::conversation::ConversationStore;
use crate::settings::{SettingsPatch, SettingsStore};
pub use dispatcher::create_command_registry;

/// Everything a slash command may touch: the conversation store, the
/// persisted settings, and the loop flag.
pub struct SessionState {
    pub store: ConversationStore,
    pub settings: SettingsStore,
    pub should_continue: bool,
}

impl SessionState {
    pub fn new(store: ConversationStore, settings: SettingsStore) -> Self {
        SessionState {
            store,
            settings,
            should_continue: true,
        }
    }

    /// Persist a settings change and mirror it into the conversation store,
    /// which carries the copy that dispatch reads.
    pub fn apply_settings_patch(&mut self, patch: &SettingsPatch) {
        let updated = self.settings.update(patch).clone();
        self.store.set_settings(updated);
    }

    pub fn reset_settings(&mut self) {
        let updated = self.settings.reset_to_defaults().clone();
        self.store.set_settings(updated);
    }
}
