//! Consumer of the simulation stream.

use futures::StreamExt;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::model::{StartupConfiguration, SIMULATION_YEARS};
use crate::session::{SessionStatus, SimulationSession};
use crate::stream::{DecodeEvent, StreamDecoder};
use crate::validation::{validate_configuration, FieldError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid configuration: {}", summarize(.0))]
    Validation(Vec<FieldError>),
    #[error("server rejected the request ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
        details: Vec<FieldError>,
    },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("stream ended before completion after {received} of {expected} years")]
    Incomplete { received: usize, expected: u8 },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Default, Deserialize)]
struct RejectionBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    details: Vec<FieldError>,
}

pub struct SimulationClient {
    base_url: String,
    http: reqwest::Client,
}

impl SimulationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run one simulation and follow its stream to the end.
    ///
    /// `on_update` sees every decoded event together with the session state
    /// after it was applied. An error frame from the server ends the stream
    /// normally: the returned session is `Failed` and keeps the years that
    /// arrived. A dropped connection or a stream without a terminal marker
    /// is an error.
    pub async fn simulate<F>(
        &self,
        configuration: &StartupConfiguration,
        mut on_update: F,
    ) -> Result<SimulationSession, ClientError>
    where
        F: FnMut(&DecodeEvent, &SimulationSession),
    {
        let configuration = validate_configuration(configuration).map_err(ClientError::Validation)?;

        let url = format!("{}/api/simulate", self.base_url);
        info!(%url, sector = %configuration.sector, "Requesting simulation");
        let response = self.http.post(&url).json(&configuration).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            let body: RejectionBody = serde_json::from_str(&text).unwrap_or_default();
            let message = if body.error.is_empty() { text } else { body.error };
            return Err(ClientError::Rejected {
                status: status.as_u16(),
                message,
                details: body.details,
            });
        }

        let mut session = SimulationSession::new(configuration);
        session.start();
        let mut decoder = StreamDecoder::new();
        let mut chunks = response.bytes_stream();

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    session.fail_transport(e.to_string());
                    warn!(
                        error = %e,
                        received = session.results().len(),
                        "Simulation stream interrupted"
                    );
                    return Err(ClientError::Transport(e.to_string()));
                }
            };
            debug!(bytes = chunk.len(), "Received chunk");
            for event in decoder.push(&chunk) {
                apply(&mut session, event, &mut on_update);
            }
            if decoder.is_done() {
                break;
            }
        }

        for event in decoder.finish() {
            apply(&mut session, event, &mut on_update);
        }
        let terminated = session.status() != SessionStatus::Streaming;
        session.end_of_stream();
        if !terminated {
            return Err(ClientError::Incomplete {
                received: session.results().len(),
                expected: SIMULATION_YEARS,
            });
        }

        info!(
            status = ?session.status(),
            years = session.results().len(),
            "Simulation stream finished"
        );
        Ok(session)
    }
}

fn apply<F>(session: &mut SimulationSession, event: DecodeEvent, on_update: &mut F)
where
    F: FnMut(&DecodeEvent, &SimulationSession),
{
    session.apply(event.clone());
    on_update(&event, session);
}
