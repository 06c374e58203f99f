//! Stub generation client for testing and development

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{GenerationClient, GenerationClientInfo};
use crate::error::GenerationError;
use crate::prompt::{Prompt, Tone};

/// Returns deterministic payloads derived from the prompt's year and tone.
///
/// Optionally fails at a given year, which exercises the error frame path
/// without a network.
#[derive(Debug, Default)]
pub struct StubGenerationClient {
    fail_on_year: Option<u8>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<Prompt>>,
}

impl StubGenerationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the call for `year` fail with an upstream error.
    pub fn failing_on_year(year: u8) -> Self {
        Self {
            fail_on_year: Some(year),
            ..Self::default()
        }
    }

    /// Number of generation calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }

    fn stub_payload(year: u8, tone: Tone) -> serde_json::Value {
        let y = u32::from(year);
        let (base, revenue_factor, headline) = match tone {
            Tone::Realistic => (55 + 5 * y, 1.0, "Steady progress"),
            Tone::Negative => (48_u32.saturating_sub(3 * y), 0.6, "Growth stalls"),
            Tone::Catastrophic => (20_u32.saturating_sub(2 * y), 0.3, "Crisis hits"),
        };
        let clamp = |v: u32| v.min(100);
        let revenue = 100_000.0 * f64::from(y * y) * revenue_factor;

        json!({
            "metrics": {
                "feasibility": clamp(base + 4),
                "desirability": clamp(base + 8),
                "viability": clamp(base),
            },
            "analysis": {
                "milestones": [format!("{} in year {}", headline, year)],
                "challenges": [format!("Year {} {} pressure", year, tone)],
                "recommendations": ["Tighten unit economics"],
                "revenue": revenue,
                "marketShare": f64::from(y) * 0.5 * revenue_factor,
                "customerBase": y * 120,
            }
        })
    }
}

#[async_trait]
impl GenerationClient for StubGenerationClient {
    async fn generate(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.clone());
        }

        if self.fail_on_year == Some(prompt.year) {
            return Err(GenerationError::Upstream {
                status: 503,
                body: format!("stub failure for year {}", prompt.year),
            });
        }

        Ok(Self::stub_payload(prompt.year, prompt.tone).to_string())
    }

    fn info(&self) -> GenerationClientInfo {
        GenerationClientInfo {
            provider: "stub".to_string(),
            model: "stub-model".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::parse_outcome;

    fn prompt(year: u8, tone: Tone) -> Prompt {
        Prompt {
            year,
            tone,
            system: "system".to_string(),
            user: "user".to_string(),
        }
    }

    #[tokio::test]
    async fn test_stub_payloads_parse_for_every_tone() {
        let client = StubGenerationClient::new();
        for year in 1..=5 {
            for tone in [Tone::Realistic, Tone::Negative, Tone::Catastrophic] {
                let content = client.generate(&prompt(year, tone)).await.unwrap();
                let outcome = parse_outcome(&content).unwrap();
                assert!(outcome.analysis.revenue >= 0.0);
            }
        }
        assert_eq!(client.calls(), 15);
        assert_eq!(client.prompts().len(), 15);
    }

    #[tokio::test]
    async fn test_stub_failure_year() {
        let client = StubGenerationClient::failing_on_year(2);
        assert!(client.generate(&prompt(1, Tone::Realistic)).await.is_ok());
        assert!(matches!(
            client.generate(&prompt(2, Tone::Realistic)).await,
            Err(GenerationError::Upstream { status: 503, .. })
        ));
    }
}
