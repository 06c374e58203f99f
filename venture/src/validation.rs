//! Shape check for submitted startup configurations.
//!
//! Bodies are read into a draft where every field is optional so that a
//! missing field is reported against its name instead of failing
//! deserialization as a whole.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::model::StartupConfiguration;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartupConfigurationDraft {
    #[serde(default)]
    #[validate(
        required(message = "Sector is required"),
        length(min = 1, message = "Sector is required")
    )]
    pub sector: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "Nation is required"),
        length(min = 1, message = "Nation is required")
    )]
    pub nation: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "AI Disruption Pattern is required"),
        length(min = 1, message = "AI Disruption Pattern is required")
    )]
    pub ai_disruption_pattern: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "Business Model is required"),
        length(min = 1, message = "Business Model is required")
    )]
    pub business_model: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "Team Archetype is required"),
        length(min = 1, message = "Team Archetype is required")
    )]
    pub team_archetype: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "Startup Pitch is required"),
        length(min = 10, message = "Startup Pitch must be at least 10 characters")
    )]
    pub startup_pitch: Option<String>,
}

impl StartupConfigurationDraft {
    /// Trim every field. Empty strings stay present so that they fail the
    /// length check rather than the required check.
    fn normalized(self) -> Self {
        let trim = |v: Option<String>| v.map(|s| s.trim().to_string());
        Self {
            sector: trim(self.sector),
            nation: trim(self.nation),
            ai_disruption_pattern: trim(self.ai_disruption_pattern),
            business_model: trim(self.business_model),
            team_archetype: trim(self.team_archetype),
            startup_pitch: trim(self.startup_pitch),
        }
    }
}

impl From<&StartupConfiguration> for StartupConfigurationDraft {
    fn from(config: &StartupConfiguration) -> Self {
        Self {
            sector: Some(config.sector.clone()),
            nation: Some(config.nation.clone()),
            ai_disruption_pattern: Some(config.ai_disruption_pattern.clone()),
            business_model: Some(config.business_model.clone()),
            team_archetype: Some(config.team_archetype.clone()),
            startup_pitch: Some(config.startup_pitch.clone()),
        }
    }
}

/// Validate a draft and turn it into a trimmed configuration.
pub fn validate_draft(
    draft: StartupConfigurationDraft,
) -> Result<StartupConfiguration, Vec<FieldError>> {
    let draft = draft.normalized();
    if let Err(errors) = draft.validate() {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("{} is invalid", wire_field_name(&field)));
                FieldError::new(wire_field_name(&field), message)
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        return Err(details);
    }

    // validate() guarantees every field is present at this point
    Ok(StartupConfiguration {
        sector: draft.sector.unwrap_or_default(),
        nation: draft.nation.unwrap_or_default(),
        ai_disruption_pattern: draft.ai_disruption_pattern.unwrap_or_default(),
        business_model: draft.business_model.unwrap_or_default(),
        team_archetype: draft.team_archetype.unwrap_or_default(),
        startup_pitch: draft.startup_pitch.unwrap_or_default(),
    })
}

/// Validate a raw request body.
pub fn validate_body(body: &[u8]) -> Result<StartupConfiguration, Vec<FieldError>> {
    let draft: StartupConfigurationDraft = serde_json::from_slice(body).map_err(|e| {
        vec![FieldError::new(
            "body",
            format!("Request body must be a JSON object: {}", e),
        )]
    })?;
    validate_draft(draft)
}

/// Re-check an already typed configuration, e.g. before the client sends it.
pub fn validate_configuration(
    config: &StartupConfiguration,
) -> Result<StartupConfiguration, Vec<FieldError>> {
    validate_draft(StartupConfigurationDraft::from(config))
}

fn wire_field_name(field: &str) -> String {
    match field {
        "ai_disruption_pattern" => "aiDisruptionPattern".to_string(),
        "business_model" => "businessModel".to_string(),
        "team_archetype" => "teamArchetype".to_string(),
        "startup_pitch" => "startupPitch".to_string(),
        other => other.to_string(),
    }
}
