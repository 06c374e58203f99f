//! Data model for a simulation run.
//!
//! `YearOutcome` is the payload a single generation call must return. Its
//! JSON schema (embedded in every prompt) and its range checks (run on every
//! parsed response) are both derived from the annotations below, so the
//! prompt and the parser share one definition.

use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationErrors};

/// Number of simulated years in a complete run.
pub const SIMULATION_YEARS: u8 = 5;

/// Startup configuration submitted by the user. Immutable once accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupConfiguration {
    pub sector: String,
    pub nation: String,
    pub ai_disruption_pattern: String,
    pub business_model: String,
    pub team_archetype: String,
    pub startup_pitch: String,
}

/// Scores for one simulated year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct YearMetrics {
    /// Can the team actually build and operate this, 0-100.
    #[validate(range(max = 100))]
    pub feasibility: u8,
    /// How much the target market wants it, 0-100.
    #[validate(range(max = 100))]
    pub desirability: u8,
    /// Can it sustain itself financially, 0-100.
    #[validate(range(max = 100))]
    pub viability: u8,
}

impl YearMetrics {
    pub fn new(feasibility: u8, desirability: u8, viability: u8) -> Self {
        Self {
            feasibility,
            desirability,
            viability,
        }
    }

    /// The weakest of the three dimensions.
    pub fn min_metric(&self) -> u8 {
        self.feasibility.min(self.desirability).min(self.viability)
    }
}

/// Narrative and quantitative analysis for one simulated year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct YearAnalysis {
    /// Key achievements of the year, most important first.
    #[serde(default, deserialize_with = "null_as_default")]
    pub milestones: Vec<String>,
    /// Problems the startup ran into this year.
    #[serde(default, deserialize_with = "null_as_default")]
    pub challenges: Vec<String>,
    /// Advice for the following year.
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Vec<String>,
    /// Revenue for the year in USD.
    #[validate(range(min = 0.0))]
    pub revenue: f64,
    /// Share of the addressable market, in percent.
    #[serde(default, deserialize_with = "null_as_default")]
    #[validate(range(min = 0.0, max = 100.0))]
    pub market_share: f64,
    /// Number of paying customers at year end.
    #[serde(default, deserialize_with = "whole_count")]
    pub customer_base: u64,
}

/// Optional fields: an explicit `null` means the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A count that may arrive as `1500`, `1500.0` or `null`.
fn whole_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum CountRepr {
        Integer(u64),
        Float(f64),
    }

    match Option::<CountRepr>::deserialize(deserializer)? {
        None => Ok(0),
        Some(CountRepr::Integer(n)) => Ok(n),
        Some(CountRepr::Float(f)) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
            Ok(f as u64)
        }
        Some(CountRepr::Float(f)) => Err(D::Error::custom(format!(
            "customerBase must be a non-negative whole number, got {}",
            f
        ))),
    }
}

/// The `{metrics, analysis}` payload of one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct YearOutcome {
    pub metrics: YearMetrics,
    pub analysis: YearAnalysis,
}

impl YearOutcome {
    /// Run the range checks declared on the metrics and analysis.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        self.metrics.validate()?;
        self.analysis.validate()
    }

    pub fn into_progress(self, year: u8) -> YearlyProgress {
        YearlyProgress {
            year,
            metrics: self.metrics,
            analysis: self.analysis,
        }
    }
}

/// One frame of the stream: a completed year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearlyProgress {
    pub year: u8,
    pub metrics: YearMetrics,
    pub analysis: YearAnalysis,
}

impl YearlyProgress {
    /// The part of this year that is carried into the next year's prompt.
    pub fn outcome(&self) -> YearOutcome {
        YearOutcome {
            metrics: self.metrics,
            analysis: self.analysis.clone(),
        }
    }
}

static OUTCOME_SCHEMA: Lazy<String> = Lazy::new(|| {
    let schema = schemars::schema_for!(YearOutcome);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
});

/// Pretty-printed JSON schema of [`YearOutcome`].
pub fn outcome_schema() -> &'static str {
    OUTCOME_SCHEMA.as_str()
}
