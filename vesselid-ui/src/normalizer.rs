//! Result normalization
//!
//! Turns the raw match list from the classification service into the
//! ranked, UI-ready [`ClassificationResult`].
//!
//! **Headline metric:** two interpretations exist and both are kept as
//! separate strategies selected by [`BandingMode`]:
//! - **Similarity:** best match confidence as a percentage.
//!   Bands: < 60 Low, 60-79 Medium, >= 80 High.
//! - **Risk:** `1 - mean_confidence * min(count / 10, 1) * 0.8`, clamped
//!   to [0, 1]. Bands: < 0.3 Low, < 0.6 Medium, else High.

use crate::client::{ClassifyResponse, RawMatch};
use serde::Serialize;
use std::fmt;
use vesselid_common::config::BandingMode;

/// Coarse Low/Medium/High classification of a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Band {
    Low,
    Medium,
    High,
}

impl Band {
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Low => "Low",
            Band::Medium => "Medium",
            Band::High => "High",
        }
    }

    /// Similarity band for a percentage
    pub fn for_similarity(pct: f64) -> Self {
        if pct >= 80.0 {
            Band::High
        } else if pct >= 60.0 {
            Band::Medium
        } else {
            Band::Low
        }
    }

    /// Risk band for a 0-1 risk value
    pub fn for_risk(risk: f64) -> Self {
        if risk < 0.3 {
            Band::Low
        } else if risk < 0.6 {
            Band::Medium
        } else {
            Band::High
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Headline metric of a result set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Assessment {
    Similarity { confidence_pct: f64, band: Band },
    Risk { risk: f64, band: Band },
}

impl Assessment {
    /// Maximum confidence, as a percentage
    pub fn similarity(confidences: &[f64]) -> Self {
        let best = confidences.iter().copied().fold(0.0_f64, f64::max);
        let confidence_pct = best * 100.0;
        Assessment::Similarity {
            confidence_pct,
            band: Band::for_similarity(confidence_pct),
        }
    }

    /// Inverse risk from count and mean confidence
    pub fn risk(confidences: &[f64]) -> Self {
        let count = confidences.len() as f64;
        let mean = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f64>() / count
        };
        let coverage = (count / 10.0).min(1.0);
        let risk = (1.0 - mean * coverage * 0.8).clamp(0.0, 1.0);
        Assessment::Risk {
            risk,
            band: Band::for_risk(risk),
        }
    }

    pub fn for_mode(mode: BandingMode, confidences: &[f64]) -> Self {
        match mode {
            BandingMode::Similarity => Self::similarity(confidences),
            BandingMode::Risk => Self::risk(confidences),
        }
    }

    pub fn band(&self) -> Band {
        match self {
            Assessment::Similarity { band, .. } | Assessment::Risk { band, .. } => *band,
        }
    }

    /// Label and formatted value for display
    pub fn headline(&self) -> String {
        match self {
            Assessment::Similarity { confidence_pct, band } => {
                format!("Confidence: {:.0}% ({})", confidence_pct, band)
            }
            Assessment::Risk { risk, band } => format!("Risk: {:.2} ({})", risk, band),
        }
    }
}

/// Where a result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Remote,
    OfflineFallback,
}

/// Label/value pair shown alongside a match
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchFactor {
    pub label: &'static str,
    pub value: String,
}

/// One ranked match ready for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayMatch {
    /// 1-based position in the result list
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub vessel_type: String,
    /// Reference pages in the source catalogue
    pub pages: Option<String>,
    /// 0.0-1.0
    pub confidence: f64,
    pub match_type: Option<String>,
    pub factors: Vec<MatchFactor>,
}

/// Normalized outcome of one submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub classification_id: String,
    pub total_matches: u64,
    pub vessels_detected: usize,
    /// Seconds, as reported by the service
    pub processing_time: f64,
    /// Unix seconds
    pub timestamp: f64,
    pub assessment: Assessment,
    pub matches: Vec<DisplayMatch>,
    pub report_text: String,
    pub source: ResultSource,
}

impl ClassificationResult {
    /// Zero matches is a valid outcome, rendered as an empty state
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Format a dimension without a trailing `.0`
fn format_metres(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0} m", value)
    } else {
        format!("{:.1} m", value)
    }
}

fn build_factors(raw: &RawMatch) -> Vec<MatchFactor> {
    let info = &raw.ship_info;
    let hull_numbers = (!info.hull_numbers.is_empty()).then(|| info.hull_numbers.join(", "));
    let aggregated = raw.ship_count.filter(|n| *n > 1).map(|n| n.to_string());

    let candidates: [(&'static str, Option<String>); 8] = [
        ("Class", info.ship_class.clone()),
        ("Country", info.country.clone()),
        ("Role", info.ship_role.clone()),
        ("Hull Numbers", hull_numbers),
        ("Length", info.length_metres.map(format_metres)),
        ("Beam", info.beam_metres.map(format_metres)),
        ("Draught", info.draught_metres.map(format_metres)),
        ("Vessels Aggregated", aggregated),
    ];

    candidates
        .into_iter()
        .filter_map(|(label, value)| value.map(|value| MatchFactor { label, value }))
        .collect()
}

fn display_match(rank: usize, raw: &RawMatch) -> DisplayMatch {
    let info = &raw.ship_info;
    let name = info
        .name
        .clone()
        .or_else(|| info.ship_names.first().cloned())
        .or_else(|| info.ship_class.clone())
        .unwrap_or_else(|| "Unidentified vessel".to_string());

    DisplayMatch {
        rank,
        id: info
            .hull_numbers
            .first()
            .cloned()
            .unwrap_or_else(|| format!("match-{}", rank)),
        name,
        vessel_type: info.ship_type.clone().unwrap_or_else(|| "Unknown".to_string()),
        pages: info.pages.clone(),
        confidence: (raw.similarity_score / 100.0).clamp(0.0, 1.0),
        match_type: raw.match_type.clone(),
        factors: build_factors(raw),
    }
}

/// Converts service responses using one banding strategy
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    mode: BandingMode,
}

impl Normalizer {
    pub fn new(mode: BandingMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> BandingMode {
        self.mode
    }

    /// Keep at most `top_k` matches in service order and derive the headline.
    ///
    /// Pure: the same response and `top_k` always give the same result.
    pub fn normalize(&self, raw: &ClassifyResponse, top_k: usize) -> ClassificationResult {
        let matches: Vec<DisplayMatch> = raw
            .matches
            .iter()
            .take(top_k)
            .enumerate()
            .map(|(i, m)| display_match(i + 1, m))
            .collect();

        let confidences: Vec<f64> = matches.iter().map(|m| m.confidence).collect();
        let total_matches = if raw.total_matches > 0 {
            raw.total_matches
        } else {
            raw.matches.len() as u64
        };

        ClassificationResult {
            classification_id: raw.classification_id.clone(),
            total_matches,
            vessels_detected: matches.len(),
            processing_time: raw.processing_time,
            timestamp: raw.timestamp,
            assessment: Assessment::for_mode(self.mode, &confidences),
            matches,
            report_text: raw.report_text.clone(),
            source: ResultSource::Remote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ShipInfo;

    fn raw_match(score: f64, class: &str) -> RawMatch {
        RawMatch {
            rank: None,
            similarity_score: score,
            ship_count: Some(1),
            match_type: Some("similarity".to_string()),
            ship_info: ShipInfo {
                name: Some(format!("{} lead ship", class)),
                ship_class: Some(class.to_string()),
                ..ShipInfo::default()
            },
        }
    }

    fn response(scores: &[f64]) -> ClassifyResponse {
        ClassifyResponse {
            success: true,
            matches: scores.iter().map(|s| raw_match(*s, "Test")).collect(),
            total_matches: scores.len() as u64,
            processing_time: 0.4,
            classification_id: "abc".to_string(),
            ..ClassifyResponse::default()
        }
    }

    #[test]
    fn test_similarity_bands() {
        assert_eq!(Band::for_similarity(59.9), Band::Low);
        assert_eq!(Band::for_similarity(60.0), Band::Medium);
        assert_eq!(Band::for_similarity(79.9), Band::Medium);
        assert_eq!(Band::for_similarity(80.0), Band::High);
    }

    #[test]
    fn test_similarity_uses_maximum_not_mean() {
        let assessment = Assessment::similarity(&[0.5, 0.85, 0.3]);
        match assessment {
            Assessment::Similarity { confidence_pct, band } => {
                assert!((confidence_pct - 85.0).abs() < 1e-9);
                assert_eq!(band, Band::High);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_risk_formula() {
        // Ten matches at 0.9 mean: 1 - 0.9 * 1.0 * 0.8 = 0.28
        let assessment = Assessment::risk(&[0.9; 10]);
        match assessment {
            Assessment::Risk { risk, band } => {
                assert!((risk - 0.28).abs() < 1e-9);
                assert_eq!(band, Band::Low);
            }
            other => panic!("unexpected {:?}", other),
        }

        // Five matches at 0.5: 1 - 0.5 * 0.5 * 0.8 = 0.8
        assert_eq!(Assessment::risk(&[0.5; 5]).band(), Band::High);
        // Ten at 0.6: 1 - 0.48 = 0.52
        assert_eq!(Assessment::risk(&[0.6; 10]).band(), Band::Medium);
    }

    #[test]
    fn test_risk_with_no_matches_is_high() {
        match Assessment::risk(&[]) {
            Assessment::Risk { risk, band } => {
                assert_eq!(risk, 1.0);
                assert_eq!(band, Band::High);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_truncation_preserves_order() {
        let normalizer = Normalizer::new(BandingMode::Similarity);
        let raw = response(&[90.0, 70.0, 95.0, 40.0]);
        let result = normalizer.normalize(&raw, 3);
        let confidences: Vec<f64> = result.matches.iter().map(|m| m.confidence).collect();
        assert_eq!(confidences, vec![0.9, 0.7, 0.95]);
        assert_eq!(result.matches.iter().map(|m| m.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(result.vessels_detected, 3);
        assert_eq!(result.total_matches, 4);
    }

    #[test]
    fn test_short_list_is_not_padded() {
        let normalizer = Normalizer::new(BandingMode::Similarity);
        let result = normalizer.normalize(&response(&[80.0, 75.0]), 10);
        assert_eq!(result.matches.len(), 2);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = Normalizer::new(BandingMode::Risk);
        let raw = response(&[88.0, 61.0, 33.0]);
        assert_eq!(normalizer.normalize(&raw, 5), normalizer.normalize(&raw, 5));
    }

    #[test]
    fn test_empty_response_is_empty_state() {
        let normalizer = Normalizer::new(BandingMode::Similarity);
        let result = normalizer.normalize(&response(&[]), 5);
        assert!(result.is_empty());
        assert_eq!(result.vessels_detected, 0);
        assert_eq!(
            result.assessment,
            Assessment::Similarity { confidence_pct: 0.0, band: Band::Low }
        );
    }

    #[test]
    fn test_factors_skip_absent_values() {
        let raw = RawMatch {
            rank: Some(1),
            similarity_score: 72.0,
            ship_count: Some(4),
            match_type: None,
            ship_info: ShipInfo {
                ship_class: Some("Type 45".to_string()),
                hull_numbers: vec!["D32".to_string(), "D33".to_string()],
                length_metres: Some(152.4),
                beam_metres: Some(21.0),
                ..ShipInfo::default()
            },
        };
        let shown = display_match(1, &raw);
        let labels: Vec<&str> = shown.factors.iter().map(|f| f.label).collect();
        assert_eq!(labels, vec!["Class", "Hull Numbers", "Length", "Beam", "Vessels Aggregated"]);
        assert_eq!(shown.factors[1].value, "D32, D33");
        assert_eq!(shown.factors[2].value, "152.4 m");
        assert_eq!(shown.factors[3].value, "21 m");
        assert_eq!(shown.id, "D32");
        assert_eq!(shown.name, "Type 45");
        assert_eq!(shown.vessel_type, "Unknown");
    }

    #[test]
    fn test_single_vessel_match_omits_aggregate_factor() {
        let shown = display_match(2, &raw_match(50.0, "Kongo"));
        assert!(shown.factors.iter().all(|f| f.label != "Vessels Aggregated"));
        assert_eq!(shown.id, "match-2");
    }

    #[test]
    fn test_headline() {
        assert_eq!(Assessment::similarity(&[0.823]).headline(), "Confidence: 82% (High)");
        assert_eq!(Assessment::risk(&[]).headline(), "Risk: 1.00 (High)");
    }
}
