//! Per-field and cross-field validation
//!
//! A fixed rule table is the single source of truth for which scalar fields
//! are checked as the user types. Fields outside the table are never
//! validated per keystroke; required-ness is enforced at submit time by the
//! submission pipeline, not here.
//!
//! # Example
//!
//! ```rust
//! use vesselid_common::{FormConfig, FormVariant};
//! use vesselid_ui::form::QueryBuilder;
//! use vesselid_ui::validation::validate_field;
//!
//! let mut builder = QueryBuilder::new(FormConfig::for_variant(FormVariant::Flat));
//! builder.update("top_k", "15").unwrap();
//! let error = validate_field("top_k", "15", builder.form());
//! assert_eq!(error.as_deref(), Some("Must be between 1 and 10"));
//! ```

use crate::form::QueryForm;
use std::collections::BTreeMap;
use tracing::debug;
use vesselid_common::fields::{split_range_side, RangeSide};

pub const INVALID_NUMBER: &str = "Invalid number";
pub const NEGATIVE: &str = "Must be 0 or greater";
pub const MIN_EXCEEDS_MAX: &str = "Min cannot exceed Max";
pub const MAX_BELOW_MIN: &str = "Max cannot be less than Min";
pub const TOP_K_RANGE: &str = "Must be between 1 and 10";
pub const YEAR_RANGE: &str = "Must be between 1800 and 2050";

/// Validation metadata for one scalar field
pub struct ValidationRule {
    pub field: &'static str,
    pub description: &'static str,
    /// Single-value check; the parsed number on success
    pub validator: fn(&str) -> Result<f64, &'static str>,
    /// True for `_min`/`_max` halves of a paired range
    pub paired: bool,
}

fn parse_number(raw: &str) -> Result<f64, &'static str> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or(INVALID_NUMBER)
}

fn non_negative(raw: &str) -> Result<f64, &'static str> {
    let v = parse_number(raw)?;
    if v < 0.0 {
        return Err(NEGATIVE);
    }
    Ok(v)
}

fn result_count(raw: &str) -> Result<f64, &'static str> {
    let v = parse_number(raw)?;
    if !(1.0..=10.0).contains(&v) {
        return Err(TOP_K_RANGE);
    }
    Ok(v)
}

fn year(raw: &str) -> Result<f64, &'static str> {
    let v = parse_number(raw)?;
    if !(1800.0..=2050.0).contains(&v) {
        return Err(YEAR_RANGE);
    }
    Ok(v)
}

macro_rules! range_rules {
    ($($base:literal => $desc:literal),* $(,)?) => {
        &[$(
            ValidationRule {
                field: concat!($base, "_min"),
                description: concat!($desc, " lower bound"),
                validator: non_negative,
                paired: true,
            },
            ValidationRule {
                field: concat!($base, "_max"),
                description: concat!($desc, " upper bound"),
                validator: non_negative,
                paired: true,
            },
        )*]
    };
}

const RANGE_RULES: &[ValidationRule] = range_rules! {
    "length_metres" => "Length overall in metres",
    "beam_metres" => "Beam in metres",
    "draught_metres" => "Draught in metres",
    "speed_knots" => "Speed in knots",
};

const SCALAR_RULES: &[ValidationRule] = &[
    ValidationRule {
        field: "top_k",
        description: "Number of ranked matches to request",
        validator: result_count,
        paired: false,
    },
    ValidationRule {
        field: "launch_year",
        description: "Year the hull was launched",
        validator: year,
        paired: false,
    },
    ValidationRule {
        field: "commission_year",
        description: "Year the vessel entered service",
        validator: year,
        paired: false,
    },
];

/// Every rule, range pairs first
pub fn rules() -> impl Iterator<Item = &'static ValidationRule> {
    RANGE_RULES.iter().chain(SCALAR_RULES.iter())
}

pub fn rule_for(field: &str) -> Option<&'static ValidationRule> {
    rules().find(|r| r.field == field)
}

/// True if `field` is validated as the user types
pub fn is_validated(field: &str) -> bool {
    rule_for(field).is_some()
}

/// Error text with the rule's description appended, for CLI listings
pub fn explain(field: &str, message: &str) -> String {
    match rule_for(field) {
        Some(rule) => format!("{} ({})", message, rule.description),
        None => message.to_string(),
    }
}

fn sibling_of(field: &str) -> Option<(String, RangeSide)> {
    split_range_side(field).map(|(base, side)| (format!("{}{}", base, side.opposite().suffix()), side))
}

/// Check one field's single-value rule, ignoring its pair
fn validate_alone(field: &str, raw: &str) -> Option<&'static str> {
    if raw.trim().is_empty() {
        return None;
    }
    let rule = rule_for(field)?;
    (rule.validator)(raw).err()
}

/// Validate `raw` as the value of `field`.
///
/// Empty values never error. A paired bound is cross-checked only when its
/// sibling in `form` is also populated and numeric; a violation is reported
/// against `field`, the side just edited.
pub fn validate_field(field: &str, raw: &str, form: &QueryForm) -> Option<String> {
    if raw.trim().is_empty() {
        return None;
    }
    let rule = rule_for(field)?;
    let value = match (rule.validator)(raw) {
        Ok(v) => v,
        Err(message) => return Some(message.to_string()),
    };
    if !rule.paired {
        return None;
    }

    let (sibling, side) = sibling_of(field)?;
    let other = form.scalar(&sibling).filter(|s| !s.trim().is_empty())?;
    let other = parse_number(other).ok()?;
    match side {
        RangeSide::Min if value > other => Some(MIN_EXCEEDS_MAX.to_string()),
        RangeSide::Max if value < other => Some(MAX_BELOW_MIN.to_string()),
        _ => None,
    }
}

/// Field name to error message; a field absent from the set is valid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrorSet {
    errors: BTreeMap<String, String>,
}

impl FieldErrorSet {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn set(&mut self, field: &str, error: Option<String>) {
        match error {
            Some(message) => {
                self.errors.insert(field.to_string(), message);
            }
            None => {
                self.errors.remove(field);
            }
        }
    }
}

/// Sole writer of the [`FieldErrorSet`]
#[derive(Debug, Default)]
pub struct ValidationEngine {
    errors: FieldErrorSet,
}

impl ValidationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &FieldErrorSet {
        &self.errors
    }

    /// Re-validate `field` against the current form.
    ///
    /// The sibling of a paired bound loses any pair error it held and keeps
    /// only its own single-value error, so a pair violation lives on exactly
    /// one side.
    pub fn apply(&mut self, field: &str, form: &QueryForm) {
        if !is_validated(field) {
            return;
        }
        let raw = form.scalar(field).unwrap_or_default();
        let error = validate_field(field, raw, form);
        debug!(field = %field, error = ?error, "Validated field");
        self.errors.set(field, error);

        if let Some((sibling, _)) = sibling_of(field) {
            let holds_pair_error = matches!(
                self.errors.get(&sibling),
                Some(MIN_EXCEEDS_MAX) | Some(MAX_BELOW_MIN)
            );
            if holds_pair_error {
                let raw = form.scalar(&sibling).unwrap_or_default();
                self.errors.set(&sibling, validate_alone(&sibling, raw).map(str::to_string));
            }
        }
    }

    /// Validate every rule-table field present in the form.
    ///
    /// Lower bounds run before upper bounds, so a crossed pair is reported
    /// on the `_max` side.
    pub fn apply_all(&mut self, form: &QueryForm) {
        for rule in rules() {
            if form.scalar(rule.field).is_some() {
                self.apply(rule.field, form);
            }
        }
    }

    pub fn clear(&mut self) {
        self.errors = FieldErrorSet::default();
    }
}
