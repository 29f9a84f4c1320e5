//! Autocomplete suggestions
//!
//! Filters a field's catalog against partial input and tracks panel
//! visibility per field. Delayed dismissal is scheduled by the owning
//! [`FormSession`](crate::session::FormSession); this engine only exposes
//! the state transitions.

use std::collections::HashMap;
use std::time::Duration;
use vesselid_common::{Error, FormConfig, Result};

/// Delay between blur and hiding the panel, long enough for a click on a
/// candidate to land first
pub const DISMISS_DELAY: Duration = Duration::from_millis(200);

/// Candidate list and panel visibility for one field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionState {
    pub candidates: Vec<&'static str>,
    pub visible: bool,
}

/// Case-insensitive substring filter over a catalog
pub fn filter_candidates(values: &'static [&'static str], partial: &str) -> Vec<&'static str> {
    let needle = partial.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    values
        .iter()
        .copied()
        .filter(|v| v.to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug)]
pub struct AutocompleteEngine {
    config: &'static FormConfig,
    states: HashMap<&'static str, SuggestionState>,
}

impl AutocompleteEngine {
    pub fn new(config: &'static FormConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
        }
    }

    fn field_key(&self, field: &str) -> Result<(&'static str, &'static [&'static str])> {
        let spec = self
            .config
            .field(field)
            .ok_or_else(|| Error::NotFound(format!("field '{}'", field)))?;
        let catalog = spec
            .autocomplete
            .ok_or_else(|| Error::InvalidInput(format!("{} has no suggestions", field)))?;
        Ok((spec.name, catalog.values()))
    }

    /// Filter the field's catalog; the panel is visible iff `partial` has text
    pub fn suggest(&mut self, field: &str, partial: &str) -> Result<&SuggestionState> {
        let (key, values) = self.field_key(field)?;
        let candidates = filter_candidates(values, partial);
        let state = self.states.entry(key).or_default();
        state.visible = !partial.trim().is_empty();
        state.candidates = candidates;
        Ok(state)
    }

    /// Hide the panel immediately and hand back the chosen value
    pub fn select(&mut self, field: &str, value: &str) -> Result<String> {
        let (key, _) = self.field_key(field)?;
        if let Some(state) = self.states.get_mut(key) {
            state.visible = false;
        }
        Ok(value.to_string())
    }

    /// Hide the panel (the delayed half of a blur)
    pub fn hide(&mut self, field: &str) {
        if let Some(state) = self.states.get_mut(field) {
            state.visible = false;
        }
    }

    pub fn hide_all(&mut self) {
        self.states.clear();
    }

    pub fn state(&self, field: &str) -> SuggestionState {
        self.states.get(field).cloned().unwrap_or_default()
    }

    pub fn is_visible(&self, field: &str) -> bool {
        self.states.get(field).is_some_and(|s| s.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesselid_common::FormVariant;

    fn engine() -> AutocompleteEngine {
        AutocompleteEngine::new(FormConfig::for_variant(FormVariant::Flat))
    }

    #[test]
    fn test_case_insensitive_substring() {
        let mut engine = engine();
        let state = engine.suggest("country", "KOR").unwrap();
        assert_eq!(state.candidates, vec!["North Korea", "South Korea"]);
        assert!(state.visible);
    }

    #[test]
    fn test_fields_use_their_own_catalog() {
        let mut engine = engine();
        let ports = engine.suggest("base_port", "sa").unwrap().candidates.clone();
        assert!(ports.contains(&"Sasebo"));
        assert!(!ports.contains(&"Saudi Arabia"));
    }

    #[test]
    fn test_empty_text_hides_panel() {
        let mut engine = engine();
        engine.suggest("ship_type", "des").unwrap();
        let state = engine.suggest("ship_type", "").unwrap();
        assert!(!state.visible);
        assert!(state.candidates.is_empty());
    }

    #[test]
    fn test_visible_even_without_matches() {
        let mut engine = engine();
        let state = engine.suggest("ship_type", "zzz").unwrap();
        assert!(state.visible);
        assert!(state.candidates.is_empty());
    }

    #[test]
    fn test_select_hides_and_returns_value() {
        let mut engine = engine();
        engine.suggest("country", "jap").unwrap();
        assert_eq!(engine.select("country", "Japan").unwrap(), "Japan");
        assert!(!engine.is_visible("country"));
    }

    #[test]
    fn test_visibility_is_per_field() {
        let mut engine = engine();
        engine.suggest("country", "a").unwrap();
        engine.suggest("base_port", "a").unwrap();
        engine.hide("country");
        assert!(!engine.is_visible("country"));
        assert!(engine.is_visible("base_port"));
    }

    #[test]
    fn test_field_without_catalog() {
        let mut engine = engine();
        assert!(matches!(engine.suggest("ship_name", "x"), Err(Error::InvalidInput(_))));
        assert!(matches!(engine.suggest("nope", "x"), Err(Error::NotFound(_))));
    }
}
