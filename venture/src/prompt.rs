//! Prompt construction for one simulated year.
//!
//! The output contract embedded here is the schema generated from
//! [`YearOutcome`](crate::model::YearOutcome); the parser in
//! [`crate::llm::parse_outcome`] checks the same definition.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{outcome_schema, StartupConfiguration, YearOutcome, SIMULATION_YEARS};

/// Narrative tone applied to one year's prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Realistic,
    Negative,
    Catastrophic,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Realistic => "realistic",
            Tone::Negative => "negative",
            Tone::Catastrophic => "catastrophic",
        }
    }

    /// Each tone is voiced by exactly one persona.
    pub fn persona(&self) -> Persona {
        match self {
            Tone::Realistic => Persona::NeutralAnalyst,
            Tone::Negative => Persona::SkepticalInvestor,
            Tone::Catastrophic => Persona::CrisisVeteran,
        }
    }

    fn direction(&self) -> &'static str {
        match self {
            Tone::Realistic => {
                "Project a realistic year. Balance progress against the normal friction \
                 of building a company; neither inflate nor punish results."
            }
            Tone::Negative => {
                "Project a difficult year. Market headwinds, execution slips or funding \
                 pressure should dominate; metrics should stagnate or decline and \
                 revenue growth should disappoint."
            }
            Tone::Catastrophic => {
                "Project a crisis year. Something seriously goes wrong (a key customer \
                 leaves, regulation bites, the runway nearly ends, the team fractures). \
                 Metrics should drop sharply and revenue may shrink."
            }
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is speaking in the system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    NeutralAnalyst,
    SkepticalInvestor,
    CrisisVeteran,
}

impl Persona {
    pub fn id(&self) -> &'static str {
        match self {
            Persona::NeutralAnalyst => "neutral_analyst",
            Persona::SkepticalInvestor => "skeptical_investor",
            Persona::CrisisVeteran => "crisis_veteran",
        }
    }

    pub fn system_instruction(&self) -> &'static str {
        match self {
            Persona::NeutralAnalyst => {
                "You are a neutral startup analyst with deep knowledge of venture \
                 economics, regional markets and the effect of AI on industries. You \
                 simulate how a startup evolves year by year and report plausible, \
                 internally consistent numbers. You always answer with a single JSON \
                 object and nothing else."
            }
            Persona::SkepticalInvestor => {
                "You are a skeptical venture investor who has watched most portfolio \
                 companies underperform their plans. You simulate how a startup evolves \
                 year by year, focusing on what goes wrong and why growth stalls. You \
                 always answer with a single JSON object and nothing else."
            }
            Persona::CrisisVeteran => {
                "You are a turnaround specialist who has lived through many startup \
                 crises: failed launches, regulatory shocks, cash crunches and founder \
                 breakups. You simulate how a startup evolves year by year under severe \
                 stress. You always answer with a single JSON object and nothing else."
            }
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The two messages sent for one generation call, plus the year and tone
/// they were built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub year: u8,
    pub tone: Tone,
    pub system: String,
    pub user: String,
}

/// Build the prompt for `year` (1-based).
pub fn build_prompt(
    config: &StartupConfiguration,
    year: u8,
    previous: Option<&YearOutcome>,
    tone: Tone,
) -> Prompt {
    let mut user = String::new();
    user.push_str(&format!(
        "Simulate year {} of {} for the following startup.\n\n",
        year, SIMULATION_YEARS
    ));
    user.push_str("Startup configuration:\n");
    user.push_str(&format!("- Sector: {}\n", config.sector));
    user.push_str(&format!("- Target nation: {}\n", config.nation));
    user.push_str(&format!(
        "- AI disruption pattern: {}\n",
        config.ai_disruption_pattern
    ));
    user.push_str(&format!("- Business model: {}\n", config.business_model));
    user.push_str(&format!("- Team archetype: {}\n", config.team_archetype));
    user.push_str(&format!("- Pitch: {}\n\n", config.startup_pitch));

    match previous {
        Some(prev) => {
            user.push_str(&format!("Results of year {}:\n", year.saturating_sub(1)));
            user.push_str(&summarize_previous(prev));
            user.push_str(
                "\nContinue from these results. Numbers must evolve from them rather \
                 than start over.\n\n",
            );
        }
        None => {
            user.push_str("This is the first year; the startup is just launching.\n\n");
        }
    }

    user.push_str(&format!("Trajectory: {}. {}\n\n", tone, tone.direction()));
    user.push_str(
        "Respond with one JSON object that validates against this JSON schema. \
         Scores are integers from 0 to 100, revenue is in USD, marketShare is a \
         percentage.\n",
    );
    user.push_str(outcome_schema());
    user.push('\n');

    Prompt {
        year,
        tone,
        system: tone.persona().system_instruction().to_string(),
        user,
    }
}

fn summarize_previous(prev: &YearOutcome) -> String {
    let m = &prev.metrics;
    let a = &prev.analysis;
    let mut out = format!(
        "- Metrics: feasibility {}, desirability {}, viability {}\n",
        m.feasibility, m.desirability, m.viability
    );
    out.push_str(&format!(
        "- Revenue: {:.0} USD, market share {:.2}%, customers {}\n",
        a.revenue, a.market_share, a.customer_base
    ));
    for (label, items) in [
        ("Milestones", &a.milestones),
        ("Challenges", &a.challenges),
        ("Recommendations", &a.recommendations),
    ] {
        if !items.is_empty() {
            out.push_str(&format!("- {}: {}\n", label, items.join("; ")));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{YearAnalysis, YearMetrics};

    fn config() -> StartupConfiguration {
        StartupConfiguration {
            sector: "Fintech".to_string(),
            nation: "UAE".to_string(),
            ai_disruption_pattern: "Automation".to_string(),
            business_model: "Subscription".to_string(),
            team_archetype: "Technical Founders".to_string(),
            startup_pitch: "AI bookkeeping for small merchants".to_string(),
        }
    }

    #[test]
    fn test_first_year_prompt() {
        let prompt = build_prompt(&config(), 1, None, Tone::Realistic);
        assert_eq!(
            prompt.system,
            Persona::NeutralAnalyst.system_instruction()
        );
        assert!(prompt.user.contains("year 1 of 5"));
        assert!(prompt.user.contains("Fintech"));
        assert!(prompt.user.contains("Technical Founders"));
        assert!(prompt.user.contains("first year"));
        assert!(prompt.user.contains(outcome_schema()));
    }

    #[test]
    fn test_previous_year_is_embedded() {
        let previous = YearOutcome {
            metrics: YearMetrics::new(61, 72, 33),
            analysis: YearAnalysis {
                milestones: vec!["Closed seed round".to_string()],
                challenges: vec!["Slow bank integrations".to_string()],
                recommendations: vec![],
                revenue: 250000.0,
                market_share: 0.4,
                customer_base: 180,
            },
        };
        let prompt = build_prompt(&config(), 3, Some(&previous), Tone::Catastrophic);
        assert_eq!(prompt.system, Persona::CrisisVeteran.system_instruction());
        assert!(prompt.user.contains("Results of year 2"));
        assert!(prompt.user.contains("viability 33"));
        assert!(prompt.user.contains("Closed seed round"));
        assert!(!prompt.user.contains("Recommendations:"));
        assert!(prompt.user.contains("Trajectory: catastrophic"));
    }

    #[test]
    fn test_tone_persona_mapping() {
        assert_eq!(Tone::Realistic.persona(), Persona::NeutralAnalyst);
        assert_eq!(Tone::Negative.persona(), Persona::SkepticalInvestor);
        assert_eq!(Tone::Catastrophic.persona(), Persona::CrisisVeteran);
    }
}
