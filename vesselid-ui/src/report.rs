//! Offline classification report
//!
//! Used only when the classification service cannot be reached. The report
//! ranks a fixed set of bundled seed vessels, so its body is fully
//! determined by the query form. The header lines (generation time, report
//! id) are the only parts that change between runs.
//!
//! **Sections:**
//! 1. Query parameters (non-empty inputs, grouped)
//! 2. Ranked matches with dimensional, hull, performance and scoring breakdown
//! 3. Summary statistics
//! 4. Recommendation driven by the best match's confidence band
//! 5. Methodology and weighting
//! 6. Limitations and disclaimer

use crate::client::{ClassifyResponse, RawMatch, ShipInfo};
use crate::form::{coerce_integer, FieldValue, QueryForm};
use crate::normalizer::Band;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use vesselid_common::fields::TOP_K_FIELD;
use vesselid_common::time::{report_stamp, unix_seconds};
use vesselid_common::FieldKind;

const DIVIDER: &str = "================================================================================";
const MINOR_DIVIDER: &str = "--------------------------------------------------------------------------------";
const MATCH_DIVIDER: &str = "----------------------------------------";

/// Component weights, percent
pub const NUMERICAL_WEIGHT: f64 = 40.0;
pub const CATEGORICAL_WEIGHT: f64 = 30.0;
pub const TEXT_WEIGHT: f64 = 20.0;
pub const BINARY_WEIGHT: f64 = 10.0;
/// Matches below this similarity (percent) are not reported by the service
pub const SIMILARITY_THRESHOLD_PCT: f64 = 30.0;

/// Per-component similarity, each 0-100
#[derive(Debug, Clone, Copy)]
pub struct ComponentScores {
    pub numerical: f64,
    pub categorical: f64,
    pub text: f64,
    pub binary: f64,
}

impl ComponentScores {
    /// Weighted overall similarity, 0-100
    pub fn weighted(&self) -> f64 {
        (self.numerical * NUMERICAL_WEIGHT
            + self.categorical * CATEGORICAL_WEIGHT
            + self.text * TEXT_WEIGHT
            + self.binary * BINARY_WEIGHT)
            / 100.0
    }
}

/// Bundled reference vessel
#[derive(Debug, Clone, Copy)]
pub struct SeedVessel {
    pub name: &'static str,
    pub hull_number: &'static str,
    pub ship_class: &'static str,
    pub country: &'static str,
    pub ship_type: &'static str,
    pub ship_role: &'static str,
    pub pages: &'static str,
    pub length_metres: f64,
    pub beam_metres: f64,
    pub draught_metres: f64,
    pub hull_form: &'static str,
    pub speed_knots: f64,
    pub displacement_tons: u32,
    pub scores: ComponentScores,
}

impl SeedVessel {
    pub fn similarity(&self) -> f64 {
        self.scores.weighted()
    }

    fn to_raw_match(self, rank: u32) -> RawMatch {
        RawMatch {
            rank: Some(rank),
            similarity_score: self.similarity(),
            ship_count: Some(1),
            match_type: Some("similarity".to_string()),
            ship_info: ShipInfo {
                name: Some(self.name.to_string()),
                ship_names: vec![self.name.to_string()],
                hull_numbers: vec![self.hull_number.to_string()],
                country: Some(self.country.to_string()),
                ship_class: Some(self.ship_class.to_string()),
                ship_type: Some(self.ship_type.to_string()),
                ship_role: Some(self.ship_role.to_string()),
                length_metres: Some(self.length_metres),
                beam_metres: Some(self.beam_metres),
                draught_metres: Some(self.draught_metres),
                pages: Some(self.pages.to_string()),
            },
        }
    }
}

/// Seed set, already in rank order
pub const SEED_VESSELS: [SeedVessel; 5] = [
    SeedVessel {
        name: "USS Arleigh Burke",
        hull_number: "DDG-51",
        ship_class: "Arleigh Burke",
        country: "USA",
        ship_type: "Destroyer",
        ship_role: "Air Defence",
        pages: "45-47",
        length_metres: 153.9,
        beam_metres: 20.1,
        draught_metres: 9.3,
        hull_form: "Monohull",
        speed_knots: 30.0,
        displacement_tons: 8300,
        scores: ComponentScores { numerical: 92.0, categorical: 88.0, text: 80.0, binary: 100.0 },
    },
    SeedVessel {
        name: "JS Kongo",
        hull_number: "DDG-173",
        ship_class: "Kongo",
        country: "Japan",
        ship_type: "Destroyer",
        ship_role: "Air Defence",
        pages: "112",
        length_metres: 161.0,
        beam_metres: 21.0,
        draught_metres: 6.2,
        hull_form: "Monohull",
        speed_knots: 30.0,
        displacement_tons: 9485,
        scores: ComponentScores { numerical: 88.0, categorical: 84.0, text: 70.0, binary: 100.0 },
    },
    SeedVessel {
        name: "HMS Daring",
        hull_number: "D32",
        ship_class: "Type 45",
        country: "United Kingdom",
        ship_type: "Destroyer",
        ship_role: "Air Defence",
        pages: "208-209",
        length_metres: 152.4,
        beam_metres: 21.2,
        draught_metres: 7.4,
        hull_form: "Monohull",
        speed_knots: 30.0,
        displacement_tons: 9400,
        scores: ComponentScores { numerical: 80.0, categorical: 78.0, text: 65.0, binary: 90.0 },
    },
    SeedVessel {
        name: "ROKS Sejong the Great",
        hull_number: "DDG-991",
        ship_class: "Sejong the Great",
        country: "South Korea",
        ship_type: "Destroyer",
        ship_role: "Air Defence",
        pages: "171",
        length_metres: 165.9,
        beam_metres: 21.4,
        draught_metres: 6.25,
        hull_form: "Monohull",
        speed_knots: 30.0,
        displacement_tons: 11000,
        scores: ComponentScores { numerical: 74.0, categorical: 72.0, text: 60.0, binary: 90.0 },
    },
    SeedVessel {
        name: "FS Forbin",
        hull_number: "D620",
        ship_class: "Horizon",
        country: "France",
        ship_type: "Frigate",
        ship_role: "Air Defence",
        pages: "88",
        length_metres: 152.87,
        beam_metres: 20.3,
        draught_metres: 5.4,
        hull_form: "Monohull",
        speed_knots: 29.0,
        displacement_tons: 7050,
        scores: ComponentScores { numerical: 66.0, categorical: 70.0, text: 55.0, binary: 80.0 },
    },
];

/// Heading used in the query-parameter echo for a form group
fn section_heading(group: &str) -> &str {
    match group {
        "Identification" => "Basic Identification",
        "Dimensions" => "Physical Dimensions",
        "Hull" => "Hull Characteristics",
        "Weapons" => "Weapons Systems",
        "Aviation" => "Aviation Facilities",
        other => other,
    }
}

fn or_na(text: &str) -> &str {
    if text.trim().is_empty() {
        "N/A"
    } else {
        text
    }
}

/// Echo lines for one group: `(label, value)` for every non-empty field.
///
/// Flat `_min`/`_max` siblings collapse into one `min - max` line; boolean
/// fields left at their default are skipped.
fn group_lines(form: &QueryForm, group: &str) -> Vec<(String, String)> {
    let config = form.config();
    let mut lines = Vec::new();

    for spec in config.fields_in_group(group) {
        if spec.name == TOP_K_FIELD {
            continue;
        }
        let Some(value) = form.get(spec.name) else {
            continue;
        };
        if spec.name.ends_with("_max") {
            let min_name = format!("{}_min", spec.name.trim_end_matches("_max"));
            if config.field(&min_name).is_some() {
                // Echoed together with its lower bound
                continue;
            }
        }

        // A flat lower bound carries the pair; either side being set is enough
        let flat_max = spec
            .name
            .strip_suffix("_min")
            .map(|base| format!("{}_max", base))
            .filter(|max_name| config.field(max_name).is_some())
            .and_then(|max_name| form.scalar(&max_name))
            .filter(|max| !max.trim().is_empty());
        if value.is_empty() && flat_max.is_none() {
            continue;
        }

        let line = match (spec.kind, value) {
            (FieldKind::Boolean, FieldValue::Text(text)) if text == spec.default => continue,
            (_, FieldValue::Text(min)) if spec.name.ends_with("_min") => (
                spec.label.replace(" Min", ""),
                format!("{} - {}", or_na(min), or_na(flat_max.unwrap_or_default())),
            ),
            (_, FieldValue::Text(text)) => (spec.label.to_string(), text.clone()),
            (_, FieldValue::Range { min, max }) => {
                (spec.label.to_string(), format!("{} - {}", or_na(min), or_na(max)))
            }
            (_, FieldValue::Multi(items)) => (spec.label.to_string(), items.join(", ")),
            (_, FieldValue::Group(map)) => (
                spec.label.to_string(),
                map.iter()
                    .filter(|(_, v)| !v.trim().is_empty())
                    .map(|(k, v)| format!("{} {}", k, v))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        };
        lines.push(line);
    }
    lines
}

fn format_pct(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Deterministic offline report generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Seed vessels in rank order
    pub fn seed_matches(&self) -> &'static [SeedVessel] {
        &SEED_VESSELS
    }

    /// Header block: the only lines that depend on time or id
    pub fn header(&self, generated_at: DateTime<Utc>, report_id: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n", DIVIDER));
        output.push_str("VESSEL CLASSIFICATION REPORT (OFFLINE)\n");
        output.push_str(&format!("{}\n\n", DIVIDER));
        output.push_str(&format!("Generated: {}\n", report_stamp(generated_at)));
        output.push_str(&format!("Report ID: {}\n", report_id));
        output.push_str("Classification System: bundled reference set (service unavailable)\n\n");
        output
    }

    /// Sections 1-6, fully determined by `form`
    pub fn body(&self, form: &QueryForm) -> String {
        let mut output = String::new();
        self.write_query_parameters(&mut output, form);
        self.write_matches(&mut output);
        self.write_summary(&mut output);
        self.write_recommendation(&mut output);
        self.write_methodology(&mut output);
        self.write_limitations(&mut output);
        output.push_str(&format!("{}\nEND OF REPORT\n{}\n", DIVIDER, DIVIDER));
        output
    }

    /// Complete report text
    pub fn generate(&self, form: &QueryForm, generated_at: DateTime<Utc>, report_id: &str) -> String {
        let mut output = self.header(generated_at, report_id);
        output.push_str(&self.body(form));
        output
    }

    /// Build a service-shaped response from the seed set
    pub fn synthesize(&self, form: &QueryForm, generated_at: DateTime<Utc>) -> ClassifyResponse {
        let report_id = format!("offline-{}", uuid::Uuid::new_v4());
        let matches: Vec<RawMatch> = SEED_VESSELS
            .iter()
            .enumerate()
            .map(|(i, vessel)| vessel.to_raw_match(i as u32 + 1))
            .collect();

        ClassifyResponse {
            success: true,
            total_matches: matches.len() as u64,
            matches,
            processing_time: 0.0,
            report_text: self.generate(form, generated_at, &report_id),
            classification_id: report_id,
            timestamp: unix_seconds(generated_at),
            error: None,
        }
    }

    fn write_section_title(output: &mut String, title: &str) {
        output.push_str(&format!("{}\n{}\n{}\n\n", DIVIDER, title, DIVIDER));
    }

    fn write_query_parameters(&self, output: &mut String, form: &QueryForm) {
        Self::write_section_title(output, "SECTION 1: QUERY PARAMETERS");

        let config = form.config();
        for group in &config.groups {
            let lines = group_lines(form, group);
            if lines.is_empty() {
                continue;
            }
            output.push_str(&format!("{}:\n", section_heading(group)));
            for (label, value) in lines {
                output.push_str(&format!("  {:<22} {}\n", format!("{}:", label), value));
            }
            output.push('\n');
        }

        let requested = form
            .scalar(TOP_K_FIELD)
            .and_then(coerce_integer)
            .or_else(|| config.default_top_k())
            .map_or_else(|| "N/A".to_string(), |v| v.to_string());
        output.push_str("Search Parameters:\n");
        output.push_str(&format!("  Requested Matches:     {}\n\n", requested));
    }

    fn write_matches(&self, output: &mut String) {
        Self::write_section_title(output, "SECTION 2: CLASSIFICATION RESULTS");
        output.push_str(&format!("Total Matches Found: {}\n", SEED_VESSELS.len()));
        output.push_str(&format!("Confidence Threshold: {:.0}%\n", SIMILARITY_THRESHOLD_PCT));
        output.push_str("Search Method: Multi-parameter similarity matching\n\n");
        output.push_str(&format!("{}\nTOP MATCHING VESSELS\n{}\n\n", MINOR_DIVIDER, MINOR_DIVIDER));

        for (i, vessel) in SEED_VESSELS.iter().enumerate() {
            output.push_str(&format!("Match #{}: {} ({})\n", i + 1, vessel.name, vessel.hull_number));
            output.push_str(&format!("{}\n", MATCH_DIVIDER));
            output.push_str(&format!("  Class:          {}\n", vessel.ship_class));
            output.push_str(&format!("  Country:        {}\n", vessel.country));
            output.push_str(&format!("  Type:           {}\n", vessel.ship_type));
            output.push_str(&format!("  Role:           {}\n", vessel.ship_role));
            output.push_str(&format!("  Pages:          {}\n", vessel.pages));
            output.push_str(&format!(
                "  Dimensions:     {} x {} x {} m (L x B x D)\n",
                vessel.length_metres, vessel.beam_metres, vessel.draught_metres
            ));
            output.push_str(&format!("  Hull Form:      {}\n", vessel.hull_form));
            output.push_str(&format!("  Max Speed:      {} knots\n", vessel.speed_knots));
            output.push_str(&format!("  Displacement:   {} tons\n", vessel.displacement_tons));
            output.push_str(&format!("  Similarity:     {}\n", format_pct(vessel.similarity())));
            output.push_str("  Score Breakdown:\n");
            output.push_str(&format!(
                "    Numerical ({:.0}%):   {}\n",
                NUMERICAL_WEIGHT,
                format_pct(vessel.scores.numerical)
            ));
            output.push_str(&format!(
                "    Categorical ({:.0}%): {}\n",
                CATEGORICAL_WEIGHT,
                format_pct(vessel.scores.categorical)
            ));
            output.push_str(&format!(
                "    Text ({:.0}%):        {}\n",
                TEXT_WEIGHT,
                format_pct(vessel.scores.text)
            ));
            output.push_str(&format!(
                "    Binary ({:.0}%):      {}\n",
                BINARY_WEIGHT,
                format_pct(vessel.scores.binary)
            ));
            output.push('\n');
        }
    }

    fn write_summary(&self, output: &mut String) {
        Self::write_section_title(output, "SECTION 3: SUMMARY STATISTICS");

        let scores: Vec<f64> = SEED_VESSELS.iter().map(SeedVessel::similarity).collect();
        let highest = scores.iter().copied().fold(f64::MIN, f64::max);
        let lowest = scores.iter().copied().fold(f64::MAX, f64::min);
        let mean = scores.iter().sum::<f64>() / scores.len() as f64;

        let mut countries: Vec<&str> = Vec::new();
        let mut types: BTreeMap<&str, usize> = BTreeMap::new();
        for vessel in &SEED_VESSELS {
            if !countries.contains(&vessel.country) {
                countries.push(vessel.country);
            }
            *types.entry(vessel.ship_type).or_insert(0) += 1;
        }

        output.push_str(&format!("Matches Analysed:     {}\n", scores.len()));
        output.push_str(&format!("Highest Similarity:   {}\n", format_pct(highest)));
        output.push_str(&format!("Lowest Similarity:    {}\n", format_pct(lowest)));
        output.push_str(&format!("Mean Similarity:      {}\n", format_pct(mean)));
        output.push_str(&format!("Countries Represented: {}\n", countries.join(", ")));
        output.push_str("Type Distribution:\n");
        for (ship_type, count) in types {
            output.push_str(&format!("  {:<20} {}\n", ship_type, count));
        }
        output.push('\n');
    }

    fn write_recommendation(&self, output: &mut String) {
        Self::write_section_title(output, "SECTION 4: RECOMMENDATION");

        let top = &SEED_VESSELS[0];
        let sentence = match Band::for_similarity(top.similarity()) {
            Band::High => format!(
                "High confidence: the observed vessel is most likely a {}-class {} operated by {}. \
                 Confirm against hull number or visible markings before reporting.",
                top.ship_class,
                top.ship_type.to_lowercase(),
                top.country
            ),
            Band::Medium => format!(
                "Moderate confidence: the observed vessel shares key characteristics with the {} class. \
                 Gather further observations (weapons fit, mast and radar arrangement) before committing to an identification.",
                top.ship_class
            ),
            Band::Low => "Low confidence: no candidate is a strong match. Treat the ranked list as leads only \
                 and collect further dimensional and visual detail."
                .to_string(),
        };
        output.push_str(&sentence);
        output.push_str("\n\n");
    }

    fn write_methodology(&self, output: &mut String) {
        Self::write_section_title(output, "SECTION 5: METHODOLOGY");
        output.push_str("Similarity is a weighted combination of four feature groups:\n");
        output.push_str(&format!("  Numerical features (dimensions, speed, displacement): {:.0}%\n", NUMERICAL_WEIGHT));
        output.push_str(&format!("  Categorical features (type, role, hull, layout):      {:.0}%\n", CATEGORICAL_WEIGHT));
        output.push_str(&format!("  Text features (names, builder, notes):                {:.0}%\n", TEXT_WEIGHT));
        output.push_str(&format!("  Binary features (aviation, VLS, CIWS):                {:.0}%\n", BINARY_WEIGHT));
        output.push_str(&format!(
            "Matches scoring below {:.0}% similarity are discarded.\n\n",
            SIMILARITY_THRESHOLD_PCT
        ));
    }

    fn write_limitations(&self, output: &mut String) {
        Self::write_section_title(output, "SECTION 6: LIMITATIONS AND DISCLAIMER");
        output.push_str("- This report was produced offline from a small bundled reference set because the\n");
        output.push_str("  classification service could not be reached. It does not reflect the full database.\n");
        output.push_str("- Scores depend on the accuracy and completeness of the observation entered.\n");
        output.push_str("- Ships of the same class can be indistinguishable without hull numbers or markings.\n");
        output.push_str("- Results are decision support only and must be confirmed by a qualified analyst.\n\n");
    }
}
