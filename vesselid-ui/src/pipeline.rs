//! Submission pipeline
//!
//! State machine driving one classification request:
//!
//! ```text
//! Idle -> Validating -> Submitting -> Succeeded
//!                    \             \-> Failed
//!                     \-> Failed (required fields / field errors)
//! ```
//!
//! Any terminal state moves back through `Validating` on the next attempt,
//! or straight to `Idle` on [`SubmissionPipeline::reset`].
//!
//! The request is split into [`SubmissionPipeline::begin`] and
//! [`SubmissionPipeline::complete`] so the caller owns the await point.
//! While a ticket is outstanding a second `begin` is refused. A ticket
//! issued before the form was cleared or left is stale; its outcome is
//! dropped instead of replacing what the user now sees.

use crate::client::{ClassificationService, ClassifyResponse, ClientError};
use crate::form::{QueryForm, SubmissionPayload};
use crate::normalizer::{ClassificationResult, Normalizer, ResultSource};
use crate::report::ReportGenerator;
use crate::session::FormSession;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use vesselid_common::config::TomlConfig;
use vesselid_common::time;

/// Pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubmissionState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

/// Submission errors
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Mandatory fields left empty (display labels)
    #[error("Please fill in the required fields: {}", .0.join(", "))]
    MissingRequired(Vec<String>),

    /// Field errors still present
    #[error("Please fix the highlighted errors before submitting ({0} field(s))")]
    FieldErrors(usize),

    /// A submission is already outstanding
    #[error("A classification request is already in progress")]
    InFlight,

    /// The payload could not be built from the form
    #[error("Invalid form: {0}")]
    Payload(#[from] vesselid_common::Error),

    /// The remote call failed
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl SubmitError {
    /// Text shown to the user
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::FieldErrors(_) => "Please fix the highlighted errors before submitting.".to_string(),
            SubmitError::Client(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// What to do when the service cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Surface the connectivity error
    #[default]
    Disabled,
    /// Substitute the offline report built from the bundled seed set
    OfflineReport,
}

impl FallbackPolicy {
    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            FallbackPolicy::OfflineReport
        } else {
            FallbackPolicy::Disabled
        }
    }
}

/// Everything needed to finish one request
#[derive(Debug, Clone)]
pub struct SubmissionTicket {
    id: u64,
    session_generation: u64,
    top_k: usize,
    form: QueryForm,
    payload: SubmissionPayload,
}

impl SubmissionTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn payload(&self) -> &SubmissionPayload {
        &self.payload
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

pub struct SubmissionPipeline {
    state: SubmissionState,
    normalizer: Normalizer,
    fallback: FallbackPolicy,
    reports: ReportGenerator,
    next_ticket: u64,
    outstanding: Option<u64>,
    result: Option<ClassificationResult>,
    last_error: Option<String>,
}

impl SubmissionPipeline {
    pub fn new(normalizer: Normalizer, fallback: FallbackPolicy) -> Self {
        Self {
            state: SubmissionState::Idle,
            normalizer,
            fallback,
            reports: ReportGenerator::new(),
            next_ticket: 1,
            outstanding: None,
            result: None,
            last_error: None,
        }
    }

    pub fn from_config(config: &TomlConfig) -> Self {
        Self::new(
            Normalizer::new(config.banding),
            FallbackPolicy::from_flag(config.offline_fallback),
        )
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// True while the submit control must stay disabled
    pub fn is_busy(&self) -> bool {
        self.outstanding.is_some()
    }

    /// Last successful result
    pub fn result(&self) -> Option<&ClassificationResult> {
        self.result.as_ref()
    }

    /// User-facing message of the last failure
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn transition(&mut self, to: SubmissionState) {
        info!(from = ?self.state, to = ?to, "Submission state change");
        self.state = to;
    }

    fn fail(&mut self, error: SubmitError) -> SubmitError {
        self.last_error = Some(error.user_message());
        self.transition(SubmissionState::Failed);
        error
    }

    /// Run the required-field and field-error gates and issue a ticket.
    ///
    /// Pending deferred validation is settled first. No network call is
    /// made when either gate rejects.
    pub fn begin(&mut self, session: &mut FormSession) -> Result<SubmissionTicket, SubmitError> {
        if self.outstanding.is_some() {
            warn!("Submit ignored: request already in flight");
            return Err(SubmitError::InFlight);
        }
        self.last_error = None;
        self.transition(SubmissionState::Validating);
        session.settle();

        let missing = session.missing_required();
        if !missing.is_empty() {
            let labels = missing.iter().map(|name| session.config().label_for(name)).collect();
            return Err(self.fail(SubmitError::MissingRequired(labels)));
        }

        let error_count = session.errors().len();
        if error_count > 0 {
            return Err(self.fail(SubmitError::FieldErrors(error_count)));
        }

        let payload = match session.payload() {
            Ok(payload) => payload,
            Err(e) => return Err(self.fail(SubmitError::Payload(e))),
        };
        let Some(top_k) = payload.top_k().or_else(|| session.config().default_top_k()) else {
            let error = vesselid_common::Error::InvalidInput("result count missing from payload".to_string());
            return Err(self.fail(SubmitError::Payload(error)));
        };
        let top_k = top_k as usize;

        let id = self.next_ticket;
        self.next_ticket += 1;
        self.outstanding = Some(id);
        self.transition(SubmissionState::Submitting);

        Ok(SubmissionTicket {
            id,
            session_generation: session.generation(),
            top_k,
            form: session.export_snapshot(),
            payload,
        })
    }

    /// Finish a request.
    ///
    /// Returns `Ok(None)` when the ticket is stale (the form was cleared or
    /// left, or the pipeline was reset since `begin`) and the outcome was
    /// dropped. A transport failure becomes an offline result when the
    /// fallback policy allows it; every other failure is surfaced.
    pub fn complete(
        &mut self,
        session: &FormSession,
        ticket: SubmissionTicket,
        outcome: Result<ClassifyResponse, ClientError>,
    ) -> Result<Option<ClassificationResult>, SubmitError> {
        if self.outstanding != Some(ticket.id) {
            debug!(ticket = ticket.id, "Discarding result for a request that was superseded or reset");
            return Ok(None);
        }
        self.outstanding = None;

        if ticket.session_generation != session.generation() {
            debug!(ticket = ticket.id, "Discarding result for a form that was cleared or left");
            if self.state == SubmissionState::Submitting {
                self.transition(SubmissionState::Idle);
            }
            return Ok(None);
        }

        let result = match outcome {
            Ok(response) => self.normalizer.normalize(&response, ticket.top_k),
            Err(e) if e.is_transport() && self.fallback == FallbackPolicy::OfflineReport => {
                warn!(error = %e, "Classification service unreachable; using offline report");
                let response = self.reports.synthesize(&ticket.form, time::now());
                let mut result = self.normalizer.normalize(&response, response.matches.len());
                result.source = ResultSource::OfflineFallback;
                result
            }
            Err(e) => return Err(self.fail(SubmitError::Client(e))),
        };

        info!(
            matches = result.vessels_detected,
            source = ?result.source,
            "Classification complete"
        );
        self.result = Some(result.clone());
        self.transition(SubmissionState::Succeeded);
        Ok(Some(result))
    }

    /// Gate, send and finish in one call
    pub async fn submit(
        &mut self,
        session: &mut FormSession,
        service: &dyn ClassificationService,
    ) -> Result<Option<ClassificationResult>, SubmitError> {
        let ticket = self.begin(session)?;
        let outcome = service.classify(ticket.payload()).await;
        self.complete(session, ticket, outcome)
    }

    /// Back to `Idle`, forgetting the last result and error
    pub fn reset(&mut self) {
        self.outstanding = None;
        self.result = None;
        self.last_error = None;
        self.transition(SubmissionState::Idle);
    }
}
