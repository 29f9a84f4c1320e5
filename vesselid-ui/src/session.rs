//! Form session
//!
//! One explicit state container per user session. It owns the query
//! builder, the validation engine, the autocomplete engine and the task
//! queue; every mutation comes in through one of its methods and every
//! deferred effect goes through the queue.
//!
//! **Deferred validation:** an edit to a rule-table field schedules a
//! zero-delay task. Running it on [`FormSession::settle`] means both sides of
//! a pair already hold their latest values when the cross-check reads them.
//! A newer edit to the same field replaces the pending task.
//!
//! **Delayed dismissal:** blurring an autocomplete input schedules a hide
//! after [`DISMISS_DELAY`]; selecting a candidate first cancels it.

use crate::autocomplete::{AutocompleteEngine, SuggestionState, DISMISS_DELAY};
use crate::form::{QueryBuilder, QueryForm, SubmissionPayload};
use crate::scheduler::{TaskHandle, TaskQueue};
use crate::validation::{is_validated, FieldErrorSet, ValidationEngine};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use vesselid_common::{FormConfig, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionTask {
    Validate(String),
    Dismiss(String),
}

pub struct FormSession {
    builder: QueryBuilder,
    validation: ValidationEngine,
    autocomplete: AutocompleteEngine,
    tasks: TaskQueue<SessionTask>,
    pending_validation: HashMap<String, TaskHandle>,
    pending_dismiss: HashMap<String, TaskHandle>,
    generation: u64,
}

impl FormSession {
    pub fn new(config: &'static FormConfig) -> Self {
        Self {
            builder: QueryBuilder::new(config),
            validation: ValidationEngine::new(),
            autocomplete: AutocompleteEngine::new(config),
            tasks: TaskQueue::new(),
            pending_validation: HashMap::new(),
            pending_dismiss: HashMap::new(),
            generation: 0,
        }
    }

    pub fn config(&self) -> &'static FormConfig {
        self.builder.config()
    }

    pub fn form(&self) -> &QueryForm {
        self.builder.form()
    }

    pub fn errors(&self) -> &FieldErrorSet {
        self.validation.errors()
    }

    pub fn suggestions(&self, field: &str) -> SuggestionState {
        self.autocomplete.state(field)
    }

    /// Incremented whenever earlier submission results must be dropped
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.pending()
    }

    /// Set a field and queue its validation
    pub fn update(&mut self, path: &str, value: &str) -> Result<()> {
        let scalar = self.builder.update(path, value)?;
        self.defer_validation(scalar);
        Ok(())
    }

    /// Toggle a checklist item; true if now selected
    pub fn toggle(&mut self, field: &str, item: &str) -> Result<bool> {
        self.builder.toggle(field, item)
    }

    /// Text typed into an autocomplete input: store it and refresh candidates
    pub fn type_suggestion(&mut self, field: &str, text: &str) -> Result<SuggestionState> {
        self.update(field, text)?;
        self.cancel_dismiss(field);
        Ok(self.autocomplete.suggest(field, text)?.clone())
    }

    /// Candidate chosen: hide the panel now and write the value
    pub fn select_suggestion(&mut self, field: &str, value: &str) -> Result<()> {
        self.cancel_dismiss(field);
        let chosen = self.autocomplete.select(field, value)?;
        self.update(field, &chosen)
    }

    /// Input lost focus: hide the panel after the dismiss delay
    pub fn blur_suggestion(&mut self, field: &str) {
        self.cancel_dismiss(field);
        let handle = self
            .tasks
            .schedule(DISMISS_DELAY, SessionTask::Dismiss(field.to_string()));
        self.pending_dismiss.insert(field.to_string(), handle);
    }

    /// Move the session clock forward, running whatever becomes due
    pub fn advance(&mut self, by: Duration) {
        let due = self.tasks.advance(by);
        self.run(due);
    }

    /// Run every task that is already due
    pub fn settle(&mut self) {
        let due = self.tasks.settle();
        self.run(due);
    }

    /// Reset form, errors, panels and queued work
    pub fn clear(&mut self) {
        self.builder.reset();
        self.validation.clear();
        self.autocomplete.hide_all();
        self.tasks.clear();
        self.pending_validation.clear();
        self.pending_dismiss.clear();
        self.generation += 1;
        info!("Form cleared");
    }

    /// Leave the form without clearing it; results still in flight are dropped
    pub fn navigate_away(&mut self) {
        self.generation += 1;
    }

    /// Replace the form with an exported snapshot and re-validate it
    pub fn import_snapshot(&mut self, json: &Value) -> Result<()> {
        let form = QueryForm::from_snapshot(self.config(), json)?;
        self.builder.replace(form)?;
        self.tasks.clear();
        self.pending_validation.clear();
        self.pending_dismiss.clear();
        self.autocomplete.hide_all();
        self.validation.clear();
        self.validation.apply_all(self.builder.form());
        info!(errors = self.validation.errors().len(), "Imported form snapshot");
        Ok(())
    }

    pub fn export_snapshot(&self) -> QueryForm {
        self.builder.export_snapshot()
    }

    pub fn payload(&self) -> Result<SubmissionPayload> {
        self.builder.payload()
    }

    /// Scalar names the deployment marks mandatory that are still empty
    pub fn missing_required(&self) -> Vec<&'static str> {
        let form = self.builder.form();
        self.config()
            .required
            .iter()
            .copied()
            .filter(|name| form.scalar(name).map_or(true, |v| v.trim().is_empty()))
            .collect()
    }

    fn defer_validation(&mut self, scalar: String) {
        if !is_validated(&scalar) {
            return;
        }
        if let Some(previous) = self.pending_validation.remove(&scalar) {
            self.tasks.cancel(previous);
        }
        let handle = self
            .tasks
            .schedule(Duration::ZERO, SessionTask::Validate(scalar.clone()));
        self.pending_validation.insert(scalar, handle);
    }

    fn cancel_dismiss(&mut self, field: &str) {
        if let Some(handle) = self.pending_dismiss.remove(field) {
            self.tasks.cancel(handle);
        }
    }

    fn run(&mut self, due: Vec<SessionTask>) {
        for task in due {
            debug!(task = ?task, "Running session task");
            match task {
                SessionTask::Validate(field) => {
                    self.pending_validation.remove(&field);
                    self.validation.apply(&field, self.builder.form());
                }
                SessionTask::Dismiss(field) => {
                    self.pending_dismiss.remove(&field);
                    self.autocomplete.hide(&field);
                }
            }
        }
    }
}
