use crate::core::error::ObchatError;
use crate::settings::{ProductType, ProficiencyLevel, ReasoningFocus, SettingsPatch, UserRole};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// One-shot question for the onboarding assistant
    pub query: Option<String>,

    /// Start an interactive chat session
    #[arg(short, long)]
    pub chat: bool,

    /// Backend base URL (overrides the config file)
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Proficiency level [beginner|intermediate|expert|executive]
    #[arg(short, long)]
    pub level: Option<String>,

    /// Your role (engineer, product_manager, designer, ...)
    #[arg(short, long)]
    pub role: Option<String>,

    /// Product to onboard onto [checkpoint|westlaw|materia]
    #[arg(short, long)]
    pub product: Option<String>,

    /// Reasoning focus [comprehensive|technical|business|security]
    #[arg(short, long)]
    pub focus: Option<String>,
}

impl Args {
    /// Settings overrides from the command line, applied (and persisted) the
    /// same way a change in the settings UI would be.
    pub fn settings_overrides(&self) -> Result<SettingsPatch, ObchatError> {
        let mut patch = SettingsPatch::default();

        if let Some(level) = &self.level {
            patch.proficiency_level = Some(ProficiencyLevel::from_str(level).ok_or_else(|| {
                ObchatError::Input(format!(
                    "Unknown proficiency level '{}' (expected one of: beginner, intermediate, expert, executive)",
                    level
                ))
            })?);
        }

        if let Some(role) = &self.role {
            patch.user_role = Some(UserRole::from_str(role).ok_or_else(|| {
                ObchatError::Input(format!("Unknown role '{}'", role))
            })?);
        }

        if let Some(product) = &self.product {
            patch.product_type = Some(ProductType::from_str(product).ok_or_else(|| {
                ObchatError::Input(format!(
                    "Unknown product '{}' (expected one of: checkpoint, westlaw, materia)",
                    product
                ))
            })?);
        }

        if let Some(focus) = &self.focus {
            patch.reasoning_focus = Some(ReasoningFocus::from_str(focus).ok_or_else(|| {
                ObchatError::Input(format!(
                    "Unknown reasoning focus '{}' (expected one of: comprehensive, technical, business, security)",
                    focus
                ))
            })?);
        }

        Ok(patch)
    }
}
