//! Trajectory driver: the sequential multi-year generation loop.
//!
//! ```text
//! Idle -> Running(1) -> ... -> Running(N) -> Completed
//!              \________________________/
//!                          v
//!                        Failed
//! ```
//!
//! Every year yields one [`YearResult`]. A success is written to the stream
//! immediately and becomes the next year's context; a failure writes the
//! error frame and ends the run. There is no retry and no resume.

pub mod tone;

pub use tone::{select_tone, tone_for_draw, ToneSelection};

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::error::{GenerationError, StreamError};
use crate::llm::{parse_outcome, GenerationClient};
use crate::model::{StartupConfiguration, YearOutcome, YearlyProgress, SIMULATION_YEARS};
use crate::prompt::build_prompt;
use crate::stream::StreamEncoder;

/// Result of one simulated year.
pub type YearResult = Result<YearlyProgress, GenerationError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    /// Pause after every year except the last.
    pub inter_year_delay: Duration,
    /// Upper bound for a single generation call.
    pub call_timeout: Duration,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            inter_year_delay: Duration::from_secs(1),
            call_timeout: Duration::from_secs(60),
        }
    }
}

impl DriverSettings {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            inter_year_delay: Duration::from_millis(config.simulation.year_delay_ms),
            call_timeout: config.llm.timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrajectoryState {
    Idle,
    Running { year: u8 },
    Completed,
    Failed(String),
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { years: u8 },
    /// A year failed; the error frame carries `message`.
    Failed { year: u8, message: String },
    /// The stream receiver went away before `year` could be delivered.
    Abandoned { year: u8 },
}

pub struct TrajectoryDriver {
    client: Arc<dyn GenerationClient>,
    settings: DriverSettings,
    rng: StdRng,
    run_id: String,
    state: TrajectoryState,
}

impl TrajectoryDriver {
    pub fn new(client: Arc<dyn GenerationClient>, settings: DriverSettings) -> Self {
        Self {
            client,
            settings,
            rng: StdRng::from_entropy(),
            run_id: Uuid::new_v4().to_string(),
            state: TrajectoryState::Idle,
        }
    }

    /// Replace the tone draw source, e.g. with a seeded generator.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn state(&self) -> &TrajectoryState {
        &self.state
    }

    /// Start the run on its own task and hand back the live frame receiver.
    pub fn spawn(
        self,
        config: StartupConfiguration,
        capacity: usize,
    ) -> (mpsc::Receiver<String>, JoinHandle<RunOutcome>) {
        let (encoder, rx) = StreamEncoder::channel(capacity);
        let handle = tokio::spawn(self.run(config, encoder));
        (rx, handle)
    }

    /// Drive all years, writing each frame as soon as it is produced.
    #[instrument(name = "trajectory", skip_all, fields(run_id = %self.run_id))]
    pub async fn run(
        mut self,
        config: StartupConfiguration,
        mut encoder: StreamEncoder,
    ) -> RunOutcome {
        let years = SIMULATION_YEARS;
        let mut previous: Option<YearOutcome> = None;

        for year in 1..=years {
            if encoder.is_closed() {
                return self.abandon(year);
            }
            self.transition(TrajectoryState::Running { year });

            let result: YearResult = self.simulate_year(&config, year, previous.as_ref()).await;
            let progress = match result {
                Ok(progress) => progress,
                Err(e) => {
                    let message = e.to_string();
                    return self.fail(encoder, year, message).await;
                }
            };

            match encoder.write_year(&progress).await {
                Ok(()) => {}
                Err(StreamError::Disconnected) => return self.abandon(year),
                Err(e @ StreamError::Encode(_)) => {
                    return self.fail(encoder, year, e.to_string()).await;
                }
            }
            previous = Some(progress.outcome());

            if year < years && !self.settings.inter_year_delay.is_zero() {
                tokio::time::sleep(self.settings.inter_year_delay).await;
            }
        }

        self.transition(TrajectoryState::Completed);
        if encoder.finish().await.is_err() {
            warn!("Stream receiver dropped before the terminal marker was written");
        }
        RunOutcome::Completed { years }
    }

    /// Build the prompt for `year`, call the generation client and parse the
    /// response.
    pub async fn simulate_year(
        &mut self,
        config: &StartupConfiguration,
        year: u8,
        previous: Option<&YearOutcome>,
    ) -> YearResult {
        let selection = select_tone(previous.map(|p| &p.metrics), &mut self.rng);
        info!(
            year,
            tone = %selection.tone,
            persona = %selection.persona,
            "Simulating year"
        );

        let prompt = build_prompt(config, year, previous, selection.tone);
        let call = self.client.generate(&prompt);
        let content = tokio::time::timeout(self.settings.call_timeout, call)
            .await
            .map_err(|_| GenerationError::Timeout(self.settings.call_timeout))??;

        let outcome = parse_outcome(&content)?;
        info!(
            year,
            feasibility = outcome.metrics.feasibility,
            desirability = outcome.metrics.desirability,
            viability = outcome.metrics.viability,
            revenue = outcome.analysis.revenue,
            "Year generated"
        );
        Ok(outcome.into_progress(year))
    }

    async fn fail(&mut self, encoder: StreamEncoder, year: u8, message: String) -> RunOutcome {
        warn!(year, error = %message, "Simulation failed");
        self.transition(TrajectoryState::Failed(message.clone()));
        if encoder.fail(&message).await.is_err() {
            warn!("Stream receiver dropped before the error frame was written");
        }
        RunOutcome::Failed { year, message }
    }

    fn abandon(&mut self, year: u8) -> RunOutcome {
        info!(year, "Stream receiver disconnected; abandoning simulation");
        self.transition(TrajectoryState::Failed(
            "stream receiver disconnected".to_string(),
        ));
        RunOutcome::Abandoned { year }
    }

    fn transition(&mut self, next: TrajectoryState) {
        info!(from = ?self.state, to = ?next, "Trajectory state change");
        self.state = next;
    }
}
