use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// How complex the assistant's answers should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyLevel {
    Beginner,
    Intermediate,
    Expert,
    Executive,
}

impl ProficiencyLevel {
    pub const ALL: [ProficiencyLevel; 4] = [
        ProficiencyLevel::Beginner,
        ProficiencyLevel::Intermediate,
        ProficiencyLevel::Expert,
        ProficiencyLevel::Executive,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beginner" => Some(ProficiencyLevel::Beginner),
            "intermediate" => Some(ProficiencyLevel::Intermediate),
            "expert" => Some(ProficiencyLevel::Expert),
            "executive" => Some(ProficiencyLevel::Executive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProficiencyLevel::Beginner => "beginner",
            ProficiencyLevel::Intermediate => "intermediate",
            ProficiencyLevel::Expert => "expert",
            ProficiencyLevel::Executive => "executive",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ProficiencyLevel::Beginner => "Step-by-step explanations with no assumed knowledge",
            ProficiencyLevel::Intermediate => "Balanced detail for day-to-day product work",
            ProficiencyLevel::Expert => "Terse, technical answers for power users",
            ProficiencyLevel::Executive => "High-level summaries focused on outcomes",
        }
    }
}

impl Default for ProficiencyLevel {
    fn default() -> Self {
        ProficiencyLevel::Intermediate
    }
}

/// Professional context used to bias response framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Engineer,
    ProductManager,
    Designer,
    DataScientist,
    QaEngineer,
    Devops,
    BusinessAnalyst,
    ProjectManager,
    Other,
}

impl UserRole {
    pub const ALL: [UserRole; 9] = [
        UserRole::Engineer,
        UserRole::ProductManager,
        UserRole::Designer,
        UserRole::DataScientist,
        UserRole::QaEngineer,
        UserRole::Devops,
        UserRole::BusinessAnalyst,
        UserRole::ProjectManager,
        UserRole::Other,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "engineer" => Some(UserRole::Engineer),
            "product_manager" => Some(UserRole::ProductManager),
            "designer" => Some(UserRole::Designer),
            "data_scientist" => Some(UserRole::DataScientist),
            "qa_engineer" => Some(UserRole::QaEngineer),
            "devops" => Some(UserRole::Devops),
            "business_analyst" => Some(UserRole::BusinessAnalyst),
            "project_manager" => Some(UserRole::ProjectManager),
            "other" => Some(UserRole::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Engineer => "engineer",
            UserRole::ProductManager => "product_manager",
            UserRole::Designer => "designer",
            UserRole::DataScientist => "data_scientist",
            UserRole::QaEngineer => "qa_engineer",
            UserRole::Devops => "devops",
            UserRole::BusinessAnalyst => "business_analyst",
            UserRole::ProjectManager => "project_manager",
            UserRole::Other => "other",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Engineer
    }
}

/// Which product the user is onboarding onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Checkpoint,
    Westlaw,
    Materia,
}

impl ProductType {
    pub const ALL: [ProductType; 3] = [
        ProductType::Checkpoint,
        ProductType::Westlaw,
        ProductType::Materia,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "checkpoint" => Some(ProductType::Checkpoint),
            "westlaw" => Some(ProductType::Westlaw),
            "materia" => Some(ProductType::Materia),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Checkpoint => "checkpoint",
            ProductType::Westlaw => "westlaw",
            ProductType::Materia => "materia",
        }
    }
}

impl Default for ProductType {
    fn default() -> Self {
        ProductType::Checkpoint
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    General,
    Design,
    Workflow,
    Integration,
    Architecture,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::General => "general",
            AnalysisType::Design => "design",
            AnalysisType::Workflow => "workflow",
            AnalysisType::Integration => "integration",
            AnalysisType::Architecture => "architecture",
        }
    }
}

impl Default for AnalysisType {
    fn default() -> Self {
        AnalysisType::General
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningFocus {
    Comprehensive,
    Technical,
    Business,
    Security,
}

impl ReasoningFocus {
    pub const ALL: [ReasoningFocus; 4] = [
        ReasoningFocus::Comprehensive,
        ReasoningFocus::Technical,
        ReasoningFocus::Business,
        ReasoningFocus::Security,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "comprehensive" => Some(ReasoningFocus::Comprehensive),
            "technical" => Some(ReasoningFocus::Technical),
            "business" => Some(ReasoningFocus::Business),
            "security" => Some(ReasoningFocus::Security),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningFocus::Comprehensive => "comprehensive",
            ReasoningFocus::Technical => "technical",
            ReasoningFocus::Business => "business",
            ReasoningFocus::Security => "security",
        }
    }
}

impl Default for ReasoningFocus {
    fn default() -> Self {
        ReasoningFocus::Comprehensive
    }
}

/// User-chosen preferences merged into every backend query.
///
/// Every field always holds a valid value; loading falls back to the default
/// for any field the persisted snapshot is missing or got wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSettings {
    pub proficiency_level: ProficiencyLevel,
    pub user_role: UserRole,
    pub product_type: ProductType,
    pub analysis_type: AnalysisType,
    pub reasoning_focus: ReasoningFocus,
    pub include_screenshots: bool,
    pub include_lucid: bool,
    pub include_wiki: bool,
    pub include_github: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        ChatSettings {
            proficiency_level: ProficiencyLevel::default(),
            user_role: UserRole::default(),
            product_type: ProductType::default(),
            analysis_type: AnalysisType::default(),
            reasoning_focus: ReasoningFocus::default(),
            include_screenshots: false,
            include_lucid: true,
            include_wiki: true,
            include_github: true,
        }
    }
}

/// A partial settings change; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub proficiency_level: Option<ProficiencyLevel>,
    pub user_role: Option<UserRole>,
    pub product_type: Option<ProductType>,
    pub analysis_type: Option<AnalysisType>,
    pub reasoning_focus: Option<ReasoningFocus>,
    pub include_screenshots: Option<bool>,
    pub include_lucid: Option<bool>,
    pub include_wiki: Option<bool>,
    pub include_github: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.proficiency_level.is_none()
            && self.user_role.is_none()
            && self.product_type.is_none()
            && self.analysis_type.is_none()
            && self.reasoning_focus.is_none()
            && self.include_screenshots.is_none()
            && self.include_lucid.is_none()
            && self.include_wiki.is_none()
            && self.include_github.is_none()
    }
}

impl ChatSettings {
    pub fn apply(&mut self, patch: &SettingsPatch) {
        if let Some(v) = patch.proficiency_level {
            self.proficiency_level = v;
        }
        if let Some(v) = patch.user_role {
            self.user_role = v;
        }
        if let Some(v) = patch.product_type {
            self.product_type = v;
        }
        if let Some(v) = patch.analysis_type {
            self.analysis_type = v;
        }
        if let Some(v) = patch.reasoning_focus {
            self.reasoning_focus = v;
        }
        if let Some(v) = patch.include_screenshots {
            self.include_screenshots = v;
        }
        if let Some(v) = patch.include_lucid {
            self.include_lucid = v;
        }
        if let Some(v) = patch.include_wiki {
            self.include_wiki = v;
        }
        if let Some(v) = patch.include_github {
            self.include_github = v;
        }
    }
}

/// Deserialize a field to `None` instead of failing the whole record when the
/// persisted value has the wrong shape (e.g. an enum string we don't know).
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// What we read back from disk: every field optional, unknown fields ignored.
#[derive(Debug, Default, Deserialize)]
struct SettingsSnapshot {
    #[serde(default, deserialize_with = "lenient")]
    proficiency_level: Option<ProficiencyLevel>,
    #[serde(default, deserialize_with = "lenient")]
    user_role: Option<UserRole>,
    #[serde(default, deserialize_with = "lenient")]
    product_type: Option<ProductType>,
    #[serde(default, deserialize_with = "lenient")]
    analysis_type: Option<AnalysisType>,
    #[serde(default, deserialize_with = "lenient")]
    reasoning_focus: Option<ReasoningFocus>,
    #[serde(default, deserialize_with = "lenient")]
    include_screenshots: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    include_lucid: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    include_wiki: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    include_github: Option<bool>,
}

impl SettingsSnapshot {
    /// Field-by-field merge over defaults. Total: always yields a valid record.
    fn into_settings(self) -> ChatSettings {
        let d = ChatSettings::default();
        ChatSettings {
            proficiency_level: self.proficiency_level.unwrap_or(d.proficiency_level),
            user_role: self.user_role.unwrap_or(d.user_role),
            product_type: self.product_type.unwrap_or(d.product_type),
            analysis_type: self.analysis_type.unwrap_or(d.analysis_type),
            reasoning_focus: self.reasoning_focus.unwrap_or(d.reasoning_focus),
            include_screenshots: self.include_screenshots.unwrap_or(d.include_screenshots),
            include_lucid: self.include_lucid.unwrap_or(d.include_lucid),
            include_wiki: self.include_wiki.unwrap_or(d.include_wiki),
            include_github: self.include_github.unwrap_or(d.include_github),
        }
    }
}

/// Owns the current [`ChatSettings`] and keeps the on-disk snapshot in sync.
///
/// Persistence is best-effort: a failed write is logged and swallowed, never
/// surfaced to the user.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    current: ChatSettings,
}

impl SettingsStore {
    /// Read the snapshot at `path`, falling back to defaults if it is absent
    /// or malformed. Never fails.
    pub fn load(path: PathBuf) -> Self {
        let current = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<SettingsSnapshot>(&contents) {
                Ok(snapshot) => snapshot.into_settings(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Malformed settings snapshot, using defaults");
                    ChatSettings::default()
                }
            },
            Err(_) => ChatSettings::default(),
        };

        SettingsStore { path, current }
    }

    pub fn current(&self) -> &ChatSettings {
        &self.current
    }

    /// Overwrite the given fields and persist immediately.
    pub fn update(&mut self, patch: &SettingsPatch) -> &ChatSettings {
        self.current.apply(patch);
        self.persist();
        &self.current
    }

    pub fn reset_to_defaults(&mut self) -> &ChatSettings {
        self.current = ChatSettings::default();
        self.persist();
        &self.current
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                if let Err(e) = fs::create_dir_all(parent) {
                    warn!(path = %self.path.display(), error = %e, "Failed to create settings directory");
                    return;
                }
            }
        }

        match serde_json::to_string_pretty(&self.current) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    warn!(path = %self.path.display(), error = %e, "Failed to persist settings");
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to serialize settings");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("settings.json")
    }

    #[test]
    fn load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::load(temp_settings_path(&dir));
        assert_eq!(*store.current(), ChatSettings::default());
    }

    #[test]
    fn load_malformed_json_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_settings_path(&dir);
        fs::write(&path, "{not json at all").unwrap();
        let store = SettingsStore::load(path);
        assert_eq!(*store.current(), ChatSettings::default());
    }

    #[test]
    fn load_non_object_snapshot_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_settings_path(&dir);
        fs::write(&path, "[1, 2, 3]").unwrap();
        let store = SettingsStore::load(path);
        assert_eq!(*store.current(), ChatSettings::default());
    }

    #[test]
    fn partial_snapshot_merges_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_settings_path(&dir);
        fs::write(&path, r#"{"proficiency_level": "expert", "include_wiki": false}"#).unwrap();

        let store = SettingsStore::load(path);
        assert_eq!(store.current().proficiency_level, ProficiencyLevel::Expert);
        assert!(!store.current().include_wiki);
        // Everything else keeps its default
        assert_eq!(store.current().user_role, UserRole::default());
        assert_eq!(store.current().product_type, ProductType::default());
        assert!(store.current().include_lucid);
    }

    #[test]
    fn invalid_field_value_keeps_its_default_without_discarding_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_settings_path(&dir);
        fs::write(
            &path,
            r#"{"proficiency_level": "wizard", "user_role": "designer", "include_github": "yes"}"#,
        )
        .unwrap();

        let store = SettingsStore::load(path);
        // Bad enum value and bad bool fall back; the valid field survives.
        assert_eq!(
            store.current().proficiency_level,
            ProficiencyLevel::default()
        );
        assert!(store.current().include_github);
        assert_eq!(store.current().user_role, UserRole::Designer);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_settings_path(&dir);
        fs::write(
            &path,
            r#"{"reasoning_focus": "security", "some_future_field": {"nested": true}}"#,
        )
        .unwrap();

        let store = SettingsStore::load(path);
        assert_eq!(store.current().reasoning_focus, ReasoningFocus::Security);
    }

    #[test]
    fn update_round_trips_through_a_fresh_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_settings_path(&dir);

        let mut store = SettingsStore::load(path.clone());
        store.update(&SettingsPatch {
            proficiency_level: Some(ProficiencyLevel::Executive),
            include_lucid: Some(false),
            ..Default::default()
        });

        let reloaded = SettingsStore::load(path);
        assert_eq!(
            reloaded.current().proficiency_level,
            ProficiencyLevel::Executive
        );
        assert!(!reloaded.current().include_lucid);
        // Untouched fields keep their prior (default) values
        assert_eq!(reloaded.current().user_role, UserRole::default());
        assert!(reloaded.current().include_wiki);
    }

    #[test]
    fn reset_restores_the_full_default_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_settings_path(&dir);

        let mut store = SettingsStore::load(path.clone());
        store.update(&SettingsPatch {
            user_role: Some(UserRole::Devops),
            include_github: Some(false),
            ..Default::default()
        });
        store.reset_to_defaults();

        assert_eq!(*store.current(), ChatSettings::default());
        let reloaded = SettingsStore::load(path);
        assert_eq!(*reloaded.current(), ChatSettings::default());
    }

    #[test]
    fn enum_round_trip_matches_wire_names() {
        assert_eq!(
            serde_json::to_string(&UserRole::QaEngineer).unwrap(),
            r#""qa_engineer""#
        );
        assert_eq!(
            serde_json::to_string(&ProficiencyLevel::Executive).unwrap(),
            r#""executive""#
        );
        assert_eq!(UserRole::from_str("qa_engineer"), Some(UserRole::QaEngineer));
        assert_eq!(ProficiencyLevel::from_str("nope"), None);
    }
}
