//! Risk assessment result types.
//!
//! Represents the output of the diabetes risk scorer: the positive-class
//! probability, its banding, and the model's strongest global features.

use serde::{Deserialize, Serialize};

/// Number of contributing factors reported with each assessment.
pub const TOP_FACTOR_COUNT: usize = 5;

/// Four-tier banding of the predicted probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskCategory {
    /// risk < 0.20
    Low,
    /// 0.20 <= risk < 0.40
    Medium,
    /// 0.40 <= risk < 0.70
    High,
    /// risk >= 0.70
    VeryHigh,
}

impl RiskCategory {
    /// Lower bounds of Medium, High and VeryHigh. Each band includes its
    /// lower bound and excludes the next.
    pub const MEDIUM_FROM: f64 = 0.20;
    pub const HIGH_FROM: f64 = 0.40;
    pub const VERY_HIGH_FROM: f64 = 0.70;

    /// Band a probability.
    #[must_use]
    pub fn from_probability(risk: f64) -> Self {
        if risk < Self::MEDIUM_FROM {
            Self::Low
        } else if risk < Self::HIGH_FROM {
            Self::Medium
        } else if risk < Self::VERY_HIGH_FROM {
            Self::High
        } else {
            Self::VeryHigh
        }
    }

    /// Get a human-readable label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low risk",
            Self::Medium => "Medium risk",
            Self::High => "High risk",
            Self::VeryHigh => "Very high risk",
        }
    }

    /// Get the associated color for TUI display (RGB).
    #[must_use]
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Self::Low => (16, 185, 129),      // Emerald (#10B981)
            Self::Medium => (251, 191, 36),   // Amber (#FBBF24)
            Self::High => (249, 115, 22),     // Orange (#F97316)
            Self::VeryHigh => (244, 63, 94),  // Rose (#F43F5E)
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::VeryHigh => write!(f, "VERY HIGH"),
        }
    }
}

/// A model feature paired with its global importance weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorImportance {
    pub name: String,
    pub importance: f64,
}

/// Rank features by importance, strongest first, and keep the top `k`.
///
/// Equal weights keep their input (schema) order.
#[must_use]
pub fn rank_factors<S: AsRef<str>>(names: &[S], importances: &[f64], k: usize) -> Vec<FactorImportance> {
    let mut ranked: Vec<FactorImportance> = names
        .iter()
        .zip(importances)
        .map(|(name, &importance)| FactorImportance {
            name: name.as_ref().to_string(),
            importance,
        })
        .collect();

    // Stable sort, so ties stay in schema order.
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    ranked.truncate(k);
    ranked
}

/// Complete output of one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Positive-class probability (0.0 to 1.0)
    pub risk: f64,

    /// Banding of `risk`
    pub category: RiskCategory,

    /// Strongest global features, non-increasing by importance
    pub top_factors: Vec<FactorImportance>,
}

impl RiskAssessment {
    #[must_use]
    pub fn new(risk: f64, top_factors: Vec<FactorImportance>) -> Self {
        Self {
            risk,
            category: RiskCategory::from_probability(risk),
            top_factors,
        }
    }
}

/// An assessment stamped with the time it was shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedAssessment {
    pub assessment: RiskAssessment,
    pub assessed_at: chrono::DateTime<chrono::Utc>,
}

impl From<RiskAssessment> for TimedAssessment {
    fn from(assessment: RiskAssessment) -> Self {
        Self {
            assessment,
            assessed_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_bands() {
        for (risk, expected) in [
            (0.0, RiskCategory::Low),
            (0.15, RiskCategory::Low),
            (0.199_999, RiskCategory::Low),
            (0.35, RiskCategory::Medium),
            (0.55, RiskCategory::High),
            (0.85, RiskCategory::VeryHigh),
            (1.0, RiskCategory::VeryHigh),
        ] {
            assert_eq!(RiskCategory::from_probability(risk), expected, "risk={risk}");
        }
    }

    #[test]
    fn test_category_boundaries_start_their_band() {
        assert_eq!(RiskCategory::from_probability(0.20), RiskCategory::Medium);
        assert_eq!(RiskCategory::from_probability(0.40), RiskCategory::High);
        assert_eq!(RiskCategory::from_probability(0.70), RiskCategory::VeryHigh);
    }

    #[test]
    fn test_category_is_monotonic() {
        let mut previous = RiskCategory::Low;
        for step in 0..=1000 {
            let category = RiskCategory::from_probability(f64::from(step) / 1000.0);
            assert!(category >= previous);
            previous = category;
        }
    }

    #[test]
    fn test_rank_factors_top_five() {
        let names = ["a", "b", "c", "d", "e", "f", "g"];
        let weights = [0.05, 0.30, 0.10, 0.20, 0.02, 0.25, 0.08];
        let ranked = rank_factors(&names, &weights, TOP_FACTOR_COUNT);

        let order: Vec<&str> = ranked.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(order, vec!["b", "f", "d", "c", "g"]);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].importance >= w[1].importance));
    }

    #[test]
    fn test_rank_factors_fewer_than_k() {
        let ranked = rank_factors(&["x", "y"], &[0.4, 0.6], TOP_FACTOR_COUNT);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].name, "y");
    }

    #[test]
    fn test_rank_factors_ties_keep_input_order() {
        let ranked = rank_factors(&["p", "q", "r"], &[0.2, 0.5, 0.2], 3);
        let order: Vec<&str> = ranked.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(order, vec!["q", "p", "r"]);
    }

    #[test]
    fn test_assessment_bands_on_construction() {
        let assessment = RiskAssessment::new(0.42, Vec::new());
        assert_eq!(assessment.category, RiskCategory::High);
        assert!(assessment.top_factors.is_empty());
    }

    #[test]
    fn test_timestamp_does_not_change_assessment() {
        let assessment = RiskAssessment::new(0.1, Vec::new());
        let before = chrono::Utc::now();
        let timed = TimedAssessment::from(assessment.clone());
        assert_eq!(timed.assessment, assessment);
        assert!(timed.assessed_at >= before);
    }
}
