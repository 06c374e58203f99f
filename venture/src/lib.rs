// Venture Library
// Streams a five-year, LLM-generated startup trajectory from server to client

pub mod client;
pub mod config;
pub mod error;
#[cfg(feature = "server")]
pub mod gateway;
pub mod llm;
pub mod model;
pub mod prompt;
pub mod report;
pub mod session;
pub mod stream;
pub mod trajectory;
pub mod validation;

pub use error::{GenerationError, StreamError};
pub use model::{
    StartupConfiguration, YearAnalysis, YearMetrics, YearOutcome, YearlyProgress,
    SIMULATION_YEARS,
};
