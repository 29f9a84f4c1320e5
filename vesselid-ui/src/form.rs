//! Query form state and the query builder
//!
//! The form is an ordered mapping of field name to value, laid out by a
//! [`FormConfig`]. All mutation goes through [`QueryBuilder::update`]; the
//! builder also assembles the wire payload and exports snapshots.
//!
//! **Field paths:**
//! - `ship_name`: flat scalar field
//! - `speed_knots.min`: one side of a range value
//! - `position.latitude`: key of a one-level nested group
//! - `behaviours` with an item value: toggles the item in a checklist

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;
use vesselid_common::fields::{split_range_side, RangeSide, TOP_K_FIELD};
use vesselid_common::{Error, FieldKind, FieldSpec, FormConfig, Result};

/// Value held by one form field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free text, numeric text, enumerated text or boolean-like text
    Text(String),
    /// Paired numeric range, sides kept as entered
    Range { min: String, max: String },
    /// Checklist selections in insertion order
    Multi(Vec<String>),
    /// One level of nested text fields
    Group(BTreeMap<String, String>),
}

impl FieldValue {
    /// Initial value for a field
    pub fn default_for(spec: &FieldSpec) -> Self {
        match spec.kind {
            FieldKind::Range => FieldValue::Range {
                min: String::new(),
                max: String::new(),
            },
            FieldKind::MultiSelect(_) => FieldValue::Multi(Vec::new()),
            FieldKind::Group(keys) => FieldValue::Group(
                keys.iter().map(|k| (k.to_string(), String::new())).collect(),
            ),
            _ => FieldValue::Text(spec.default.to_string()),
        }
    }

    /// True when nothing has been entered
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Range { min, max } => min.trim().is_empty() && max.trim().is_empty(),
            FieldValue::Multi(items) => items.is_empty(),
            FieldValue::Group(map) => map.values().all(|v| v.trim().is_empty()),
        }
    }
}

/// Parsed field path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath<'a> {
    Flat(&'a str),
    Nested(&'a str, &'a str),
}

impl<'a> FieldPath<'a> {
    pub fn parse(path: &'a str) -> Self {
        match path.split_once('.') {
            Some((base, key)) => FieldPath::Nested(base, key),
            None => FieldPath::Flat(path),
        }
    }

    pub fn base(&self) -> &'a str {
        match self {
            FieldPath::Flat(name) => name,
            FieldPath::Nested(base, _) => base,
        }
    }
}

/// Current state of a query form
#[derive(Debug, Clone)]
pub struct QueryForm {
    config: &'static FormConfig,
    entries: Vec<(&'static str, FieldValue)>,
}

impl PartialEq for QueryForm {
    fn eq(&self, other: &Self) -> bool {
        self.config.variant == other.config.variant && self.entries == other.entries
    }
}

impl QueryForm {
    /// Form with every field at its default
    pub fn new(config: &'static FormConfig) -> Self {
        let entries = config
            .fields
            .iter()
            .map(|spec| (spec.name, FieldValue::default_for(spec)))
            .collect();
        Self { config, entries }
    }

    pub fn config(&self) -> &'static FormConfig {
        self.config
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.entries.iter_mut().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Fields in display order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    /// Resolve a scalar name to its current text.
    ///
    /// `speed_knots_min` resolves to a flat field of that name or to the
    /// `min` side of a range called `speed_knots`; `position.latitude`
    /// resolves into a nested group.
    pub fn scalar(&self, name: &str) -> Option<&str> {
        if let Some(FieldValue::Text(text)) = self.get(name) {
            return Some(text);
        }
        if let Some((base, side)) = split_range_side(name) {
            if let Some(FieldValue::Range { min, max }) = self.get(base) {
                return Some(match side {
                    RangeSide::Min => min,
                    RangeSide::Max => max,
                });
            }
        }
        if let FieldPath::Nested(base, key) = FieldPath::parse(name) {
            if let Some(FieldValue::Group(map)) = self.get(base) {
                return map.get(key).map(String::as_str);
            }
        }
        None
    }

    /// JSON object of every field; the inverse of [`QueryForm::from_snapshot`]
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in &self.entries {
            // FieldValue serializes untagged, so this cannot fail
            map.insert(name.to_string(), serde_json::to_value(value).unwrap_or(Value::Null));
        }
        Value::Object(map)
    }

    /// Rebuild a form from an exported snapshot.
    ///
    /// Missing fields keep their defaults; unknown keys are skipped with a
    /// warning; a value of the wrong shape is rejected.
    pub fn from_snapshot(config: &'static FormConfig, json: &Value) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| Error::InvalidInput("form snapshot must be a JSON object".to_string()))?;

        let mut form = QueryForm::new(config);
        for (key, raw) in object {
            let Some(spec) = config.field(key) else {
                warn!(field = %key, "Ignoring unknown field in snapshot");
                continue;
            };
            let value = value_from_snapshot(spec, raw)?;
            if let Some(slot) = form.get_mut(spec.name) {
                *slot = value;
            }
        }
        Ok(form)
    }
}

fn json_text(field: &str, raw: &Value) -> Result<String> {
    match raw {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(if *b { "True" } else { "False" }.to_string()),
        _ => Err(Error::InvalidInput(format!("{}: expected a text value", field))),
    }
}

fn value_from_snapshot(spec: &FieldSpec, raw: &Value) -> Result<FieldValue> {
    match spec.kind {
        FieldKind::Range => {
            let object = raw
                .as_object()
                .ok_or_else(|| Error::InvalidInput(format!("{}: expected {{min, max}}", spec.name)))?;
            let side = |key: &str| object.get(key).map_or(Ok(String::new()), |v| json_text(spec.name, v));
            Ok(FieldValue::Range {
                min: side("min")?,
                max: side("max")?,
            })
        }
        FieldKind::MultiSelect(catalog) => {
            let items = raw
                .as_array()
                .ok_or_else(|| Error::InvalidInput(format!("{}: expected a list", spec.name)))?;
            let mut selected = Vec::with_capacity(items.len());
            for item in items {
                let item = json_text(spec.name, item)?;
                if !catalog.contains(&item) {
                    return Err(Error::InvalidInput(format!("{}: unknown option '{}'", spec.name, item)));
                }
                if !selected.contains(&item) {
                    selected.push(item);
                }
            }
            Ok(FieldValue::Multi(selected))
        }
        FieldKind::Group(keys) => {
            let object = raw
                .as_object()
                .ok_or_else(|| Error::InvalidInput(format!("{}: expected an object", spec.name)))?;
            let mut map = BTreeMap::new();
            for key in keys {
                let text = object.get(*key).map_or(Ok(String::new()), |v| json_text(spec.name, v))?;
                map.insert(key.to_string(), text);
            }
            Ok(FieldValue::Group(map))
        }
        _ => Ok(FieldValue::Text(normalize_scalar(spec, json_text(spec.name, raw)?)?)),
    }
}

/// Canonical text for scalar kinds: booleans become `True`/`False`,
/// choices must come from their catalog.
fn normalize_scalar(spec: &FieldSpec, value: String) -> Result<String> {
    match spec.kind {
        FieldKind::Boolean => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok("True".to_string()),
            "false" | "no" | "0" | "" => Ok("False".to_string()),
            _ => Err(Error::InvalidInput(format!("{}: expected True or False", spec.name))),
        },
        FieldKind::Choice(catalog) => {
            if value.is_empty() || catalog.contains(&value) {
                Ok(value)
            } else {
                Err(Error::InvalidInput(format!("{}: unknown option '{}'", spec.name, value)))
            }
        }
        _ => Ok(value),
    }
}

/// Normalized projection of the form sent to `POST /api/classify`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SubmissionPayload(Map<String, Value>);

impl SubmissionPayload {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Requested result count
    pub fn top_k(&self) -> Option<u32> {
        self.0.get(TOP_K_FIELD).and_then(Value::as_u64).map(|v| v as u32)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Integer coercion of the result-count text; decimals truncate
pub fn coerce_integer(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Ok(v) = text.parse::<u32>() {
        return Some(v);
    }
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0 && *v <= u32::MAX as f64)
        .map(|v| v.trunc() as u32)
}

/// Holds the current form and applies every mutation
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    form: QueryForm,
}

impl QueryBuilder {
    pub fn new(config: &'static FormConfig) -> Self {
        Self {
            form: QueryForm::new(config),
        }
    }

    pub fn config(&self) -> &'static FormConfig {
        self.form.config
    }

    pub fn form(&self) -> &QueryForm {
        &self.form
    }

    /// Apply a field update and return the scalar name that changed.
    ///
    /// Checklist fields toggle `value` (added if absent, removed if present).
    pub fn update(&mut self, path: &str, value: &str) -> Result<String> {
        let parsed = FieldPath::parse(path);
        let spec = self
            .form
            .config
            .field(parsed.base())
            .ok_or_else(|| Error::NotFound(format!("field '{}'", parsed.base())))?;
        let slot = self
            .form
            .get_mut(spec.name)
            .ok_or_else(|| Error::NotFound(format!("field '{}'", spec.name)))?;

        match (parsed, spec.kind, slot) {
            (FieldPath::Flat(_), FieldKind::MultiSelect(_), FieldValue::Multi(_)) => {
                self.toggle(spec.name, value)?;
                Ok(spec.name.to_string())
            }
            (FieldPath::Flat(_), FieldKind::Range | FieldKind::Group(_), _) => Err(Error::InvalidInput(
                format!("{}: address a side with '{}.<key>'", spec.name, spec.name),
            )),
            (FieldPath::Flat(_), _, FieldValue::Text(text)) => {
                *text = normalize_scalar(spec, value.to_string())?;
                Ok(spec.name.to_string())
            }
            (FieldPath::Nested(_, key), FieldKind::Range, FieldValue::Range { min, max }) => {
                match key {
                    "min" => *min = value.to_string(),
                    "max" => *max = value.to_string(),
                    other => {
                        return Err(Error::InvalidInput(format!(
                            "{}: range side must be min or max, got '{}'",
                            spec.name, other
                        )))
                    }
                }
                Ok(format!("{}_{}", spec.name, key))
            }
            (FieldPath::Nested(_, key), FieldKind::Group(_), FieldValue::Group(map)) => {
                let entry = map
                    .get_mut(key)
                    .ok_or_else(|| Error::NotFound(format!("field '{}.{}'", spec.name, key)))?;
                *entry = value.to_string();
                Ok(format!("{}.{}", spec.name, key))
            }
            (FieldPath::Nested(_, key), _, _) => Err(Error::InvalidInput(format!(
                "{} has no nested key '{}'",
                spec.name, key
            ))),
            _ => Err(Error::InvalidInput(format!("{}: value shape mismatch", spec.name))),
        }
    }

    /// Toggle one checklist item; returns true if the item is now selected
    pub fn toggle(&mut self, field: &str, item: &str) -> Result<bool> {
        let spec = self
            .form
            .config
            .field(field)
            .ok_or_else(|| Error::NotFound(format!("field '{}'", field)))?;
        let FieldKind::MultiSelect(catalog) = spec.kind else {
            return Err(Error::InvalidInput(format!("{} is not a checklist", field)));
        };
        if !catalog.contains(item) {
            return Err(Error::InvalidInput(format!("{}: unknown option '{}'", field, item)));
        }
        match self.form.get_mut(spec.name) {
            Some(FieldValue::Multi(items)) => {
                if let Some(pos) = items.iter().position(|i| i == item) {
                    items.remove(pos);
                    Ok(false)
                } else {
                    items.push(item.to_string());
                    Ok(true)
                }
            }
            _ => Err(Error::InvalidInput(format!("{}: value shape mismatch", field))),
        }
    }

    /// Immutable copy of the current state
    pub fn export_snapshot(&self) -> QueryForm {
        self.form.clone()
    }

    /// Replace the whole form (snapshot import)
    pub fn replace(&mut self, form: QueryForm) -> Result<()> {
        if form.config.variant != self.form.config.variant {
            return Err(Error::InvalidInput(format!(
                "snapshot is for the {} form, this session uses {}",
                form.config.variant, self.form.config.variant
            )));
        }
        self.form = form;
        Ok(())
    }

    /// Restore every field to its default
    pub fn reset(&mut self) {
        self.form = QueryForm::new(self.form.config);
    }

    /// Build the wire payload.
    ///
    /// The result count becomes an integer; ranges flatten to
    /// `<field>_min`/`<field>_max`; everything else is sent as entered.
    pub fn payload(&self) -> Result<SubmissionPayload> {
        let mut map = Map::new();
        for (name, value) in &self.form.entries {
            match value {
                FieldValue::Text(text) if *name == TOP_K_FIELD => {
                    let top_k = coerce_integer(text).ok_or_else(|| {
                        Error::InvalidInput(format!("{}: '{}' is not a whole number", TOP_K_FIELD, text))
                    })?;
                    map.insert(name.to_string(), Value::from(top_k));
                }
                FieldValue::Text(text) => {
                    map.insert(name.to_string(), Value::String(text.clone()));
                }
                FieldValue::Range { min, max } => {
                    map.insert(format!("{}_min", name), Value::String(min.clone()));
                    map.insert(format!("{}_max", name), Value::String(max.clone()));
                }
                FieldValue::Multi(items) => {
                    map.insert(
                        name.to_string(),
                        Value::Array(items.iter().cloned().map(Value::String).collect()),
                    );
                }
                FieldValue::Group(fields) => {
                    let nested = fields
                        .iter()
                        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                        .collect();
                    map.insert(name.to_string(), Value::Object(nested));
                }
            }
        }
        Ok(SubmissionPayload(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesselid_common::FormVariant;

    fn flat() -> QueryBuilder {
        QueryBuilder::new(FormConfig::for_variant(FormVariant::Flat))
    }

    fn tabbed() -> QueryBuilder {
        QueryBuilder::new(FormConfig::for_variant(FormVariant::Tabbed))
    }

    #[test]
    fn test_defaults() {
        let builder = flat();
        let form = builder.form();
        assert_eq!(form.scalar("ship_name"), Some(""));
        assert_eq!(form.scalar("flight_deck"), Some("False"));
        assert_eq!(form.scalar("top_k"), Some("5"));
    }

    #[test]
    fn test_flat_update_returns_scalar_name() {
        let mut builder = flat();
        let changed = builder.update("length_metres_min", "120").unwrap();
        assert_eq!(changed, "length_metres_min");
        assert_eq!(builder.form().scalar("length_metres_min"), Some("120"));
    }

    #[test]
    fn test_range_side_update_in_tabbed_form() {
        let mut builder = tabbed();
        let changed = builder.update("speed_knots.max", "30").unwrap();
        assert_eq!(changed, "speed_knots_max");
        assert_eq!(builder.form().scalar("speed_knots_max"), Some("30"));
        assert_eq!(builder.form().scalar("speed_knots_min"), Some(""));
    }

    #[test]
    fn test_nested_group_update() {
        let mut builder = tabbed();
        let changed = builder.update("position.latitude", "36.95").unwrap();
        assert_eq!(changed, "position.latitude");
        assert_eq!(builder.form().scalar("position.latitude"), Some("36.95"));
        assert!(builder.update("position.altitude", "1").is_err());
    }

    #[test]
    fn test_whole_range_cannot_be_set_flat() {
        let mut builder = tabbed();
        assert!(matches!(builder.update("speed_knots", "10"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_unknown_field() {
        let mut builder = flat();
        assert!(matches!(builder.update("warp_factor", "9"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_boolean_normalization() {
        let mut builder = flat();
        builder.update("hangar", "yes").unwrap();
        assert_eq!(builder.form().scalar("hangar"), Some("True"));
        builder.update("hangar", "").unwrap();
        assert_eq!(builder.form().scalar("hangar"), Some("False"));
        assert!(builder.update("hangar", "maybe").is_err());
    }

    #[test]
    fn test_choice_must_come_from_catalog() {
        let mut builder = flat();
        builder.update("hull_form", "Trimaran").unwrap();
        assert!(builder.update("hull_form", "Hovercraft").is_err());
        assert_eq!(builder.form().scalar("hull_form"), Some("Trimaran"));
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut builder = tabbed();
        assert!(builder.toggle("behaviours", "Loitering").unwrap());
        assert!(builder.toggle("behaviours", "Shadowing").unwrap());
        assert!(!builder.toggle("behaviours", "Loitering").unwrap());
        assert_eq!(
            builder.form().get("behaviours"),
            Some(&FieldValue::Multi(vec!["Shadowing".to_string()]))
        );
    }

    #[test]
    fn test_update_on_checklist_toggles() {
        let mut builder = tabbed();
        builder.update("behaviours", "Port call").unwrap();
        builder.update("behaviours", "Port call").unwrap();
        assert!(builder.form().get("behaviours").unwrap().is_empty());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut builder = flat();
        builder.update("ship_name", "Daring").unwrap();
        builder.update("top_k", "9").unwrap();
        builder.reset();
        assert_eq!(builder.form(), &QueryForm::new(builder.config()));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut builder = flat();
        builder.update("ship_name", "Duncan").unwrap();
        let snapshot = builder.export_snapshot();
        builder.update("ship_name", "Dragon").unwrap();
        assert_eq!(snapshot.scalar("ship_name"), Some("Duncan"));
    }

    #[test]
    fn test_payload_coerces_top_k_only() {
        let mut builder = flat();
        builder.update("top_k", "7").unwrap();
        builder.update("length_metres_min", "150").unwrap();
        let payload = builder.payload().unwrap();
        assert_eq!(payload.get("top_k"), Some(&Value::from(7)));
        assert_eq!(payload.get("length_metres_min"), Some(&Value::from("150")));
        assert_eq!(payload.get("flight_deck"), Some(&Value::from("False")));
        assert_eq!(payload.top_k(), Some(7));
    }

    #[test]
    fn test_payload_flattens_ranges_and_nests_groups() {
        let mut builder = tabbed();
        builder.update("speed_knots.min", "12").unwrap();
        builder.update("position.longitude", "-76.3").unwrap();
        builder.toggle("behaviours", "Loitering").unwrap();
        let payload = builder.payload().unwrap();
        assert_eq!(payload.get("speed_knots_min"), Some(&Value::from("12")));
        assert_eq!(payload.get("speed_knots_max"), Some(&Value::from("")));
        assert!(payload.get("speed_knots").is_none());
        assert_eq!(payload.get("position").unwrap()["longitude"], "-76.3");
        assert_eq!(payload.get("behaviours").unwrap()[0], "Loitering");
    }

    #[test]
    fn test_coerce_integer() {
        assert_eq!(coerce_integer("5"), Some(5));
        assert_eq!(coerce_integer(" 8 "), Some(8));
        assert_eq!(coerce_integer("3.9"), Some(3));
        assert_eq!(coerce_integer("abc"), None);
        assert_eq!(coerce_integer("-2"), None);
    }

    #[test]
    fn test_json_round_trip_preserves_every_field() {
        let mut builder = tabbed();
        builder.update("mmsi", "366999712").unwrap();
        builder.update("speed_knots.min", "10").unwrap();
        builder.update("speed_knots.max", "30").unwrap();
        builder.update("position.latitude", "36.95").unwrap();
        builder.update("flight_deck", "True").unwrap();
        builder.toggle("behaviours", "Formation steaming").unwrap();

        let snapshot = builder.export_snapshot();
        let json = snapshot.to_json();
        let restored = QueryForm::from_snapshot(builder.config(), &json).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_from_snapshot_accepts_numbers_and_skips_unknown_keys() {
        let config = FormConfig::for_variant(FormVariant::Flat);
        let json = serde_json::json!({
            "length_metres_min": 140,
            "hangar": true,
            "legacy_field": "ignored",
        });
        let form = QueryForm::from_snapshot(config, &json).unwrap();
        assert_eq!(form.scalar("length_metres_min"), Some("140"));
        assert_eq!(form.scalar("hangar"), Some("True"));
        assert_eq!(form.scalar("top_k"), Some("5"));
    }

    #[test]
    fn test_from_snapshot_rejects_wrong_shapes() {
        let config = FormConfig::for_variant(FormVariant::Tabbed);
        assert!(QueryForm::from_snapshot(config, &serde_json::json!([])).is_err());
        assert!(QueryForm::from_snapshot(config, &serde_json::json!({"speed_knots": "10"})).is_err());
        assert!(QueryForm::from_snapshot(config, &serde_json::json!({"behaviours": ["Dancing"]})).is_err());
    }

    #[test]
    fn test_replace_rejects_other_variant() {
        let mut builder = flat();
        let other = QueryForm::new(FormConfig::for_variant(FormVariant::Tabbed));
        assert!(builder.replace(other).is_err());
    }
}
