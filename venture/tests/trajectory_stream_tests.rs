use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use venture::llm::StubGenerationClient;
use venture::session::{SessionStatus, SimulationSession};
use venture::stream::{DecodeEvent, StreamDecoder, FRAME_DELIMITER};
use venture::trajectory::{DriverSettings, RunOutcome, TrajectoryDriver};
use venture::StartupConfiguration;

fn fintech_uae() -> StartupConfiguration {
    StartupConfiguration {
        sector: "Fintech".to_string(),
        nation: "UAE".to_string(),
        ai_disruption_pattern: "Automation".to_string(),
        business_model: "Subscription".to_string(),
        team_archetype: "Technical Founders".to_string(),
        startup_pitch: "AI-driven SME lending platform".to_string(),
    }
}

fn settings() -> DriverSettings {
    DriverSettings {
        inter_year_delay: Duration::ZERO,
        ..DriverSettings::default()
    }
}

async fn collect_body(stub: StubGenerationClient, seed: u64) -> (String, RunOutcome) {
    let driver = TrajectoryDriver::new(Arc::new(stub), settings()).with_rng(StdRng::seed_from_u64(seed));
    let (mut rx, handle) = driver.spawn(fintech_uae(), 4);
    let mut body = String::new();
    while let Some(frame) = rx.recv().await {
        body.push_str(&frame);
    }
    (body, handle.await.unwrap())
}

fn decode_in_chunks(body: &[u8], chunk_size: usize) -> SimulationSession {
    let mut session = SimulationSession::new(fintech_uae());
    session.start();
    let mut decoder = StreamDecoder::new();
    for chunk in body.chunks(chunk_size) {
        for event in decoder.push(chunk) {
            session.apply(event);
        }
    }
    for event in decoder.finish() {
        session.apply(event);
    }
    session.end_of_stream();
    session
}

#[tokio::test]
async fn test_full_run_streams_five_years_then_end() {
    let (body, outcome) = collect_body(StubGenerationClient::new(), 7).await;
    assert_eq!(outcome, RunOutcome::Completed { years: 5 });
    assert!(body.ends_with("END\n"));
    assert_eq!(body.matches(FRAME_DELIMITER).count(), 5);

    let session = decode_in_chunks(body.as_bytes(), body.len());
    assert_eq!(session.status(), SessionStatus::Completed);
    let years: Vec<u8> = session.results().iter().map(|p| p.year).collect();
    assert_eq!(years, vec![1, 2, 3, 4, 5]);
    for progress in session.results() {
        assert!(progress.metrics.feasibility <= 100);
        assert!(progress.analysis.revenue >= 0.0);
    }
}

#[tokio::test]
async fn test_failure_in_year_three_stops_the_stream() {
    let (body, outcome) = collect_body(StubGenerationClient::failing_on_year(3), 7).await;
    assert!(matches!(outcome, RunOutcome::Failed { year: 3, .. }));
    assert!(!body.contains("END"));
    assert!(body.ends_with("}\n"));

    let session = decode_in_chunks(body.as_bytes(), 64);
    assert_eq!(session.status(), SessionStatus::Failed);
    assert_eq!(session.results().len(), 2);
    assert!(session
        .error()
        .is_some_and(|e| e.contains("stub failure for year 3")));
}

#[tokio::test]
async fn test_decoding_is_independent_of_chunk_boundaries() {
    let (body, _) = collect_body(StubGenerationClient::new(), 11).await;
    let reference = decode_in_chunks(body.as_bytes(), body.len());

    for chunk_size in [1, 2, 3, 5, 7, 13, 64, 257] {
        let session = decode_in_chunks(body.as_bytes(), chunk_size);
        assert_eq!(session.status(), SessionStatus::Completed, "chunk size {}", chunk_size);
        assert_eq!(session.results(), reference.results(), "chunk size {}", chunk_size);
    }

    // Two-part split at every byte offset.
    let bytes = body.as_bytes();
    for split in 0..=bytes.len() {
        let mut decoder = StreamDecoder::new();
        let mut events = decoder.push(&bytes[..split]);
        events.extend(decoder.push(&bytes[split..]));
        events.extend(decoder.finish());
        let years = events
            .iter()
            .filter(|e| matches!(e, DecodeEvent::Year(_)))
            .count();
        assert_eq!(years, 5, "split at {}", split);
        assert_eq!(events.last(), Some(&DecodeEvent::Completed), "split at {}", split);
    }
}

#[tokio::test]
async fn test_replayed_frames_do_not_duplicate_years() {
    let (body, _) = collect_body(StubGenerationClient::new(), 5).await;
    let first_frame_end = body.find(FRAME_DELIMITER).unwrap() + FRAME_DELIMITER.len();
    let replayed = format!("{}{}", &body[..first_frame_end], body);

    let session = decode_in_chunks(replayed.as_bytes(), 9);
    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(session.results().len(), 5);
}
