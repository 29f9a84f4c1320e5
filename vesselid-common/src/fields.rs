//! Form field metadata
//!
//! Single source of truth for every query-form field: name, display label,
//! value shape, owning group, required-ness and autocomplete catalog. Both
//! deployment variants are plain data consumed by one query builder; nothing
//! downstream branches on the variant.
//!
//! # Example
//!
//! ```rust
//! use vesselid_common::{FormConfig, FormVariant};
//!
//! let config = FormConfig::for_variant(FormVariant::Flat);
//! assert!(config.is_required("top_k"));
//! assert_eq!(config.label_for("speed_knots_min"), "Speed Min (knots)");
//! ```

use crate::catalog::Catalog;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Result-count field name
pub const TOP_K_FIELD: &str = "top_k";

/// Initial result-count text for both variants
pub const DEFAULT_TOP_K: &str = "5";

/// Deployment variant of the query form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormVariant {
    /// Single page: identification, dimensions, hull, weapons, aviation, build info
    #[default]
    Flat,
    /// Tabs: AIS, visual, behavioural, context
    Tabbed,
}

impl fmt::Display for FormVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormVariant::Flat => write!(f, "flat"),
            FormVariant::Tabbed => write!(f, "tabbed"),
        }
    }
}

impl FromStr for FormVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flat" => Ok(FormVariant::Flat),
            "tabbed" => Ok(FormVariant::Tabbed),
            other => Err(format!("unknown form variant '{}' (expected flat or tabbed)", other)),
        }
    }
}

/// Value shape of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text
    Text,
    /// Numeric text (validated only when listed in the validation rule table)
    Number,
    /// One value out of a catalog
    Choice(Catalog),
    /// Boolean-like text, `"True"` / `"False"`; defaults to `"False"`
    Boolean,
    /// Paired numeric range stored as `{min, max}`; flattened to `<name>_min`/`<name>_max`
    Range,
    /// Checklist; toggled item by item
    MultiSelect(Catalog),
    /// One level of nested text fields, addressed as `<name>.<key>`
    Group(&'static [&'static str]),
}

/// Metadata for a single form field
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub group: &'static str,
    /// Catalog feeding the suggestion panel, if the field has one
    pub autocomplete: Option<Catalog>,
    /// Initial text for scalar fields
    pub default: &'static str,
}

impl FieldSpec {
    fn new(name: &'static str, label: &'static str, kind: FieldKind, group: &'static str) -> Self {
        let default = match kind {
            FieldKind::Boolean => "False",
            _ => "",
        };
        Self { name, label, kind, group, autocomplete: None, default }
    }

    fn suggest(mut self, catalog: Catalog) -> Self {
        self.autocomplete = Some(catalog);
        self
    }

    fn with_default(mut self, default: &'static str) -> Self {
        self.default = default;
        self
    }
}

/// Complete form layout for one deployment variant
#[derive(Debug, Clone)]
pub struct FormConfig {
    pub variant: FormVariant,
    /// Group (section or tab) names in display order
    pub groups: Vec<&'static str>,
    /// Fields in display order
    pub fields: Vec<FieldSpec>,
    /// Scalar names that must be non-empty at submit time
    pub required: Vec<&'static str>,
    /// Field used to name exported snapshots
    pub identifier_field: &'static str,
}

static FLAT_FORM: Lazy<FormConfig> = Lazy::new(build_flat);
static TABBED_FORM: Lazy<FormConfig> = Lazy::new(build_tabbed);

impl FormConfig {
    /// Shared configuration for a variant
    pub fn for_variant(variant: FormVariant) -> &'static FormConfig {
        match variant {
            FormVariant::Flat => &FLAT_FORM,
            FormVariant::Tabbed => &TABBED_FORM,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a FieldSpec> + 'a {
        self.fields.iter().filter(move |f| f.group == group)
    }

    pub fn is_required(&self, scalar: &str) -> bool {
        self.required.iter().any(|r| *r == scalar)
    }

    /// Result count the form starts with, read from the `top_k` field default
    pub fn default_top_k(&self) -> Option<u32> {
        self.field(TOP_K_FIELD).and_then(|f| f.default.trim().parse().ok())
    }

    /// Catalog backing the suggestion panel of `field`
    pub fn autocomplete_catalog(&self, field: &str) -> Option<Catalog> {
        self.field(field).and_then(|f| f.autocomplete)
    }

    /// Display label for a field or a range side (`speed_knots_min`)
    pub fn label_for(&self, scalar: &str) -> String {
        if let Some(spec) = self.field(scalar) {
            return spec.label.to_string();
        }
        if let Some((base, side)) = split_range_side(scalar) {
            if let Some(spec) = self.field(base) {
                if spec.kind == FieldKind::Range {
                    return format!("{} {}", spec.label, side.label());
                }
            }
        }
        if let Some((base, key)) = scalar.split_once('.') {
            if let Some(spec) = self.field(base) {
                return format!("{} {}", spec.label, key);
            }
        }
        scalar.to_string()
    }
}

/// Side of a paired range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeSide {
    Min,
    Max,
}

impl RangeSide {
    pub fn suffix(&self) -> &'static str {
        match self {
            RangeSide::Min => "_min",
            RangeSide::Max => "_max",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            RangeSide::Min => "min",
            RangeSide::Max => "max",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RangeSide::Min => "Min",
            RangeSide::Max => "Max",
        }
    }

    pub fn opposite(&self) -> RangeSide {
        match self {
            RangeSide::Min => RangeSide::Max,
            RangeSide::Max => RangeSide::Min,
        }
    }
}

/// Split `length_metres_min` into (`length_metres`, Min)
pub fn split_range_side(scalar: &str) -> Option<(&str, RangeSide)> {
    if let Some(base) = scalar.strip_suffix("_min") {
        Some((base, RangeSide::Min))
    } else {
        scalar.strip_suffix("_max").map(|base| (base, RangeSide::Max))
    }
}

fn build_flat() -> FormConfig {
    use FieldKind::*;

    const ID: &str = "Identification";
    const DIM: &str = "Dimensions";
    const HULL: &str = "Hull";
    const SUPER: &str = "Superstructure";
    const WEAP: &str = "Weapons";
    const AVN: &str = "Aviation";
    const BUILD: &str = "Build Information";
    const SEARCH: &str = "Search";

    FormConfig {
        variant: FormVariant::Flat,
        groups: vec![ID, DIM, HULL, SUPER, WEAP, AVN, BUILD, SEARCH],
        fields: vec![
            FieldSpec::new("ship_name", "Ship Name", Text, ID),
            FieldSpec::new("hull_number", "Hull Number", Text, ID),
            FieldSpec::new("country", "Country", Text, ID).suggest(Catalog::Countries),
            FieldSpec::new("base_port", "Base Port", Text, ID).suggest(Catalog::Ports),
            FieldSpec::new("ship_class", "Ship Class", Text, ID),
            FieldSpec::new("ship_type", "Ship Type", Text, ID).suggest(Catalog::ShipTypes),
            FieldSpec::new("ship_role", "Ship Role", Choice(Catalog::ShipRoles), ID),
            FieldSpec::new("displacement_full_load_tons", "Displacement (tons)", Number, DIM),
            FieldSpec::new("length_metres_min", "Length Min (m)", Number, DIM),
            FieldSpec::new("length_metres_max", "Length Max (m)", Number, DIM),
            FieldSpec::new("beam_metres_min", "Beam Min (m)", Number, DIM),
            FieldSpec::new("beam_metres_max", "Beam Max (m)", Number, DIM),
            FieldSpec::new("draught_metres_min", "Draught Min (m)", Number, DIM),
            FieldSpec::new("draught_metres_max", "Draught Max (m)", Number, DIM),
            FieldSpec::new("speed_knots_min", "Speed Min (knots)", Number, DIM),
            FieldSpec::new("speed_knots_max", "Speed Max (knots)", Number, DIM),
            FieldSpec::new("complement_total_personnel", "Complement", Number, DIM),
            FieldSpec::new("approximate_size_category", "Size Category", Choice(Catalog::SizeCategories), DIM),
            FieldSpec::new("length_to_beam_ratio", "L/B Ratio", Text, DIM),
            FieldSpec::new("hull_form", "Hull Form", Choice(Catalog::HullForms), HULL),
            FieldSpec::new("hull_shape", "Hull Shape", Choice(Catalog::HullShapes), HULL),
            FieldSpec::new("bow_shape", "Bow Shape", Choice(Catalog::BowShapes), HULL),
            FieldSpec::new("freeboard_height", "Freeboard", Text, HULL),
            FieldSpec::new("superstructure_layout", "Superstructure Layout", Choice(Catalog::SuperstructureLayouts), SUPER),
            FieldSpec::new("distinct_superstructure_blocks_number", "Superstructure Blocks", Number, SUPER),
            FieldSpec::new("funnel_arrangement", "Funnel Arrangement", Choice(Catalog::FunnelArrangements), SUPER),
            FieldSpec::new("funnels_total", "Funnels", Number, SUPER),
            FieldSpec::new("mast_configuration", "Mast Configuration", Choice(Catalog::MastConfigurations), SUPER),
            FieldSpec::new("radar_configuration", "Radar Configuration", Choice(Catalog::RadarConfigurations), SUPER),
            FieldSpec::new("main_gun_turrets_total", "Main Gun Turrets", Number, WEAP),
            FieldSpec::new("gunmounts_position", "Gun Mount Position", Choice(Catalog::GunMountPositions), WEAP),
            FieldSpec::new("gunmounts_size", "Gun Mount Size", Choice(Catalog::GunMountSizes), WEAP),
            FieldSpec::new("torpedo_tubes_visible_number", "Torpedo Tubes", Number, WEAP),
            FieldSpec::new("missile_launchers", "Missile Launchers", Text, WEAP),
            FieldSpec::new("vls", "VLS Visible", Boolean, WEAP),
            FieldSpec::new("CIWS", "CIWS Fitted", Boolean, WEAP),
            FieldSpec::new("CIWS_positions", "CIWS Positions", Choice(Catalog::CiwsPositions), WEAP),
            FieldSpec::new("flight_deck", "Flight Deck", Boolean, AVN),
            FieldSpec::new("hangar", "Hangar", Boolean, AVN),
            FieldSpec::new("helicopter_platform", "Helicopter Platform", Boolean, AVN),
            FieldSpec::new("builder", "Builder", Text, BUILD),
            FieldSpec::new("launch_year", "Launch Year", Number, BUILD),
            FieldSpec::new("commission_year", "Commission Year", Number, BUILD),
            FieldSpec::new(TOP_K_FIELD, "Number of Results", Number, SEARCH).with_default(DEFAULT_TOP_K),
        ],
        required: vec!["speed_knots_min", "speed_knots_max", TOP_K_FIELD],
        identifier_field: "ship_name",
    }
}

fn build_tabbed() -> FormConfig {
    use FieldKind::*;

    const AIS: &str = "AIS";
    const VISUAL: &str = "Visual";
    const BEHAV: &str = "Behavioural";
    const CONTEXT: &str = "Context";

    FormConfig {
        variant: FormVariant::Tabbed,
        groups: vec![AIS, VISUAL, BEHAV, CONTEXT],
        fields: vec![
            FieldSpec::new("mmsi", "MMSI", Text, AIS),
            FieldSpec::new("vessel_name", "Vessel Name", Text, AIS),
            FieldSpec::new("call_sign", "Call Sign", Text, AIS),
            FieldSpec::new("flag_country", "Flag", Text, AIS).suggest(Catalog::Countries),
            FieldSpec::new("navigation_status", "Navigation Status", Choice(Catalog::NavigationStatuses), AIS),
            FieldSpec::new("speed_knots", "Speed (knots)", Range, AIS),
            FieldSpec::new("course_degrees", "Course (deg)", Number, AIS),
            FieldSpec::new("destination_port", "Destination", Text, AIS).suggest(Catalog::Ports),
            FieldSpec::new("ship_type", "Ship Type", Text, VISUAL).suggest(Catalog::ShipTypes),
            FieldSpec::new("length_metres", "Length (m)", Range, VISUAL),
            FieldSpec::new("beam_metres", "Beam (m)", Range, VISUAL),
            FieldSpec::new("draught_metres", "Draught (m)", Range, VISUAL),
            FieldSpec::new("hull_colour", "Hull Colour", Choice(Catalog::HullColours), VISUAL),
            FieldSpec::new("hull_form", "Hull Form", Choice(Catalog::HullForms), VISUAL),
            FieldSpec::new("flight_deck", "Flight Deck", Boolean, VISUAL),
            FieldSpec::new("helicopter_platform", "Helicopter Platform", Boolean, VISUAL),
            FieldSpec::new("CIWS", "CIWS Fitted", Boolean, VISUAL),
            FieldSpec::new("behaviours", "Observed Behaviours", MultiSelect(Catalog::Behaviours), BEHAV),
            FieldSpec::new("ais_transmitting", "AIS Transmitting", Boolean, BEHAV),
            FieldSpec::new("position", "Position", Group(&["latitude", "longitude"]), CONTEXT),
            FieldSpec::new("observation_notes", "Notes", Text, CONTEXT),
            FieldSpec::new("commission_year", "Commission Year", Number, CONTEXT),
            FieldSpec::new(TOP_K_FIELD, "Number of Results", Number, CONTEXT).with_default(DEFAULT_TOP_K),
        ],
        required: vec!["speed_knots_min", "speed_knots_max", TOP_K_FIELD],
        identifier_field: "mmsi",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_groups_cover_every_field() {
        let config = FormConfig::for_variant(FormVariant::Flat);
        for field in &config.fields {
            assert!(config.groups.contains(&field.group), "{} has unknown group", field.name);
        }
    }

    #[test]
    fn test_boolean_fields_default_to_false() {
        for variant in [FormVariant::Flat, FormVariant::Tabbed] {
            let config = FormConfig::for_variant(variant);
            for field in config.fields.iter().filter(|f| f.kind == FieldKind::Boolean) {
                assert_eq!(field.default, "False", "{}", field.name);
            }
        }
    }

    #[test]
    fn test_default_top_k_comes_from_field_spec() {
        for variant in [FormVariant::Flat, FormVariant::Tabbed] {
            let config = FormConfig::for_variant(variant);
            assert_eq!(config.field(TOP_K_FIELD).unwrap().default, DEFAULT_TOP_K);
            assert_eq!(config.default_top_k(), Some(5));
        }
    }

    #[test]
    fn test_label_for_range_side_in_tabbed_form() {
        let config = FormConfig::for_variant(FormVariant::Tabbed);
        assert_eq!(config.label_for("speed_knots_max"), "Speed (knots) Max");
        assert_eq!(config.label_for("position.latitude"), "Position latitude");
        assert_eq!(config.label_for("unknown_field"), "unknown_field");
    }

    #[test]
    fn test_split_range_side() {
        assert_eq!(split_range_side("beam_metres_min"), Some(("beam_metres", RangeSide::Min)));
        assert_eq!(split_range_side("beam_metres_max"), Some(("beam_metres", RangeSide::Max)));
        assert_eq!(split_range_side("beam_metres"), None);
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!("Tabbed".parse::<FormVariant>().unwrap(), FormVariant::Tabbed);
        assert!("wizard".parse::<FormVariant>().is_err());
    }

    #[test]
    fn test_autocomplete_catalogs_differ_per_field() {
        let config = FormConfig::for_variant(FormVariant::Flat);
        assert_eq!(config.autocomplete_catalog("country"), Some(Catalog::Countries));
        assert_eq!(config.autocomplete_catalog("base_port"), Some(Catalog::Ports));
        assert_eq!(config.autocomplete_catalog("ship_name"), None);
    }
}
