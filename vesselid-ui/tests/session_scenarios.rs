//! Form session scenarios driven through a scripted classification service

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use vesselid_common::config::BandingMode;
use vesselid_common::{FormConfig, FormVariant};
use vesselid_ui::client::{RawMatch, ShipInfo};
use vesselid_ui::form::SubmissionPayload;
use vesselid_ui::{
    Band, ClassificationService, ClassifyResponse, ClientError, FallbackPolicy, FormSession, Normalizer,
    ResultSource, SubmissionPipeline, SubmissionState, SubmitError,
};

/// Answers every request the same way and counts calls
struct ScriptedService {
    reply: Reply,
    calls: AtomicUsize,
}

enum Reply {
    Matches(usize),
    Unreachable,
}

impl ScriptedService {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ClassificationService for ScriptedService {
    async fn classify(&self, _payload: &SubmissionPayload) -> Result<ClassifyResponse, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Reply::Matches(count) => Ok(ClassifyResponse {
                success: true,
                matches: (0..count)
                    .map(|i| RawMatch {
                        rank: Some(i as u32 + 1),
                        similarity_score: 75.0 - i as f64,
                        ship_info: ShipInfo {
                            name: Some(format!("Vessel {}", i + 1)),
                            ..ShipInfo::default()
                        },
                        ..RawMatch::default()
                    })
                    .collect(),
                total_matches: count as u64,
                ..ClassifyResponse::default()
            }),
            Reply::Unreachable => Err(ClientError::Network("connection refused".to_string())),
        }
    }
}

fn flat_session() -> FormSession {
    FormSession::new(FormConfig::for_variant(FormVariant::Flat))
}

fn fill_required(session: &mut FormSession) {
    session.update("speed_knots_min", "10").unwrap();
    session.update("speed_knots_max", "30").unwrap();
    session.update("top_k", "5").unwrap();
}

fn similarity_pipeline(fallback: FallbackPolicy) -> SubmissionPipeline {
    SubmissionPipeline::new(Normalizer::new(BandingMode::Similarity), fallback)
}

#[tokio::test]
async fn test_scenario_a() {
    let mut session = flat_session();
    fill_required(&mut session);
    let service = ScriptedService::new(Reply::Matches(3));
    let mut pipeline = similarity_pipeline(FallbackPolicy::Disabled);

    let result = pipeline.submit(&mut session, &service).await.unwrap().unwrap();
    assert_eq!(result.matches.len(), 3);
    assert_eq!(result.assessment.band(), Band::Medium);
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_scenario_b_blocks_submission() {
    let mut session = flat_session();
    fill_required(&mut session);
    session.update("length_metres_min", "200").unwrap();
    session.update("length_metres_max", "100").unwrap();

    // Validation is deferred until the edit settles
    assert!(session.errors().is_empty());
    session.settle();
    assert_eq!(session.errors().get("length_metres_max"), Some("Max cannot be less than Min"));
    assert_eq!(session.errors().get("length_metres_min"), None);

    let service = ScriptedService::new(Reply::Matches(3));
    let mut pipeline = similarity_pipeline(FallbackPolicy::Disabled);
    let err = pipeline.submit(&mut session, &service).await.unwrap_err();
    assert!(matches!(err, SubmitError::FieldErrors(1)));
    assert_eq!(service.calls(), 0);

    // Fixing the min side clears the pair error on the max side
    session.update("length_metres_min", "50").unwrap();
    session.settle();
    assert!(session.errors().is_empty());
    assert!(pipeline.submit(&mut session, &service).await.unwrap().is_some());
}

#[test]
fn test_scenario_c_top_k_bounds() {
    let mut session = flat_session();
    fill_required(&mut session);
    session.update("top_k", "15").unwrap();
    session.settle();
    assert_eq!(session.errors().get("top_k"), Some("Must be between 1 and 10"));

    session.update("top_k", "10").unwrap();
    session.settle();
    assert_eq!(session.errors().get("top_k"), None);
}

#[tokio::test]
async fn test_scenario_d_fallback() {
    let mut session = flat_session();
    fill_required(&mut session);
    session.update("top_k", "2").unwrap();
    let service = ScriptedService::new(Reply::Unreachable);
    let mut pipeline = similarity_pipeline(FallbackPolicy::OfflineReport);

    let result = pipeline.submit(&mut session, &service).await.unwrap().unwrap();
    assert_eq!(result.matches.len(), 5);
    assert_eq!(result.source, ResultSource::OfflineFallback);
    assert!(result.classification_id.starts_with("offline-"));
    assert_eq!(pipeline.result().map(|r| r.vessels_detected), Some(5));
}

#[tokio::test]
async fn test_scenario_e_empty_matches() {
    let mut session = flat_session();
    fill_required(&mut session);
    let service = ScriptedService::new(Reply::Matches(0));
    let mut pipeline = similarity_pipeline(FallbackPolicy::Disabled);

    let result = pipeline.submit(&mut session, &service).await.unwrap().unwrap();
    assert_eq!(result.vessels_detected, 0);
    assert_eq!(result.assessment.band(), Band::Low);
    assert_eq!(result.assessment.headline(), "Confidence: 0% (Low)");
    assert_eq!(pipeline.state(), SubmissionState::Succeeded);
}

#[tokio::test]
async fn test_clear_during_request_discards_result() {
    let mut session = flat_session();
    fill_required(&mut session);
    let service = ScriptedService::new(Reply::Matches(2));
    let mut pipeline = similarity_pipeline(FallbackPolicy::Disabled);

    let ticket = pipeline.begin(&mut session).unwrap();
    let outcome = service.classify(ticket.payload()).await;
    session.clear();

    assert!(pipeline.complete(&session, ticket, outcome).unwrap().is_none());
    assert!(pipeline.result().is_none());
    assert_eq!(session.form().scalar("speed_knots_min"), Some(""));
}

#[test]
fn test_autocomplete_dismiss_delay() {
    let mut session = flat_session();
    let state = session.type_suggestion("country", "kor").unwrap();
    assert_eq!(state.candidates, vec!["North Korea", "South Korea"]);
    assert!(state.visible);

    session.blur_suggestion("country");
    session.advance(Duration::from_millis(199));
    assert!(session.suggestions("country").visible);
    session.advance(Duration::from_millis(1));
    assert!(!session.suggestions("country").visible);
}

#[test]
fn test_selection_wins_over_pending_dismiss() {
    let mut session = flat_session();
    session.type_suggestion("country", "spa").unwrap();
    session.blur_suggestion("country");
    session.select_suggestion("country", "Spain").unwrap();
    session.advance(Duration::from_millis(500));

    assert_eq!(session.form().scalar("country"), Some("Spain"));
    assert!(!session.suggestions("country").visible);
}

#[test]
fn test_snapshot_round_trip_revalidates() {
    let mut source = flat_session();
    fill_required(&mut source);
    source.update("beam_metres_min", "30").unwrap();
    source.update("beam_metres_max", "20").unwrap();
    let json = source.export_snapshot().to_json();

    let mut restored = flat_session();
    restored.import_snapshot(&json).unwrap();
    assert_eq!(restored.form(), source.form());
    assert_eq!(restored.errors().get("beam_metres_max"), Some("Max cannot be less than Min"));
}

#[test]
fn test_malformed_snapshot_leaves_form_untouched() {
    let mut session = flat_session();
    fill_required(&mut session);
    let before = session.export_snapshot();

    let bad = serde_json::json!({"top_k": ["5"], "speed_knots_min": "12"});
    assert!(session.import_snapshot(&bad).is_err());
    assert_eq!(session.form(), &before);
}
