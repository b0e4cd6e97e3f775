//! Risk scoring service: Runs one patient record through the artifacts.
//!
//! This service coordinates:
//! - Scaling the labeled feature row
//! - Positive-class probability from the classifier
//! - Banding the probability into a risk category
//! - Ranking the classifier's global feature importances

use std::sync::Arc;

use crate::domain::{
    rank_factors, FeatureRow, FeatureSchema, InputError, ModelError, PatientRecord,
    RiskAssessment, TOP_FACTOR_COUNT,
};
use crate::ports::{Classifier, Scaler};
use crate::DiabetesRiskError;

/// Service for scoring patient records.
///
/// The scaler and classifier are loaded once by the caller and shared by
/// handle. They are never mutated, so one scorer serves any number of
/// evaluations.
pub struct RiskScorer<S, C>
where
    S: Scaler,
    C: Classifier,
{
    scaler: Arc<S>,
    classifier: Arc<C>,
    schema: FeatureSchema,
}

impl<S, C> RiskScorer<S, C>
where
    S: Scaler,
    C: Classifier,
{
    /// Create a scorer after checking both artifacts against `schema`.
    ///
    /// # Errors
    /// Returns `InputError` if either artifact was fitted on different
    /// columns, or `ModelError` if the importance vector has the wrong
    /// length.
    pub fn new(
        scaler: Arc<S>,
        classifier: Arc<C>,
        schema: FeatureSchema,
    ) -> Result<Self, DiabetesRiskError> {
        schema.check_names(scaler.feature_names())?;
        schema.check_names(classifier.feature_names())?;

        let n_importances = classifier.feature_importances().len();
        if n_importances != schema.len() {
            return Err(ModelError::Corrupt(format!(
                "classifier has {n_importances} feature importances for {} features",
                schema.len()
            ))
            .into());
        }

        tracing::info!(
            "Risk scorer ready ({} features validated against schema)",
            schema.len()
        );

        Ok(Self {
            scaler,
            classifier,
            schema,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Score a typed patient record.
    ///
    /// # Errors
    /// Returns `InputError` if a field lies outside its domain, otherwise
    /// see [`RiskScorer::score_row`].
    pub fn score(&self, record: &PatientRecord) -> Result<RiskAssessment, DiabetesRiskError> {
        record.validate()?;
        self.score_row(&record.to_row())
    }

    /// Score a labeled feature row.
    ///
    /// Performs the full pipeline:
    /// 1. Scale the row
    /// 2. Predict the positive-class probability
    /// 3. Band the probability
    /// 4. Rank global feature importances
    ///
    /// # Errors
    /// Returns `InputError` if the row does not match the scaler's columns
    /// and `ModelError` if the classifier cannot produce a probability.
    /// Nothing is returned on error.
    pub fn score_row(&self, row: &FeatureRow) -> Result<RiskAssessment, DiabetesRiskError> {
        tracing::debug!("Step 1: Scaling {} features...", row.len());
        let scaled = self.scaler.transform(row)?;
        if scaled.len() != self.schema.len() {
            return Err(InputError::FeatureCount {
                got: scaled.len(),
                expected: self.schema.len(),
            }
            .into());
        }

        tracing::debug!("Step 2: Predicting probability...");
        let risk = self.classifier.predict_probability(&scaled)?;
        if !risk.is_finite() || !(0.0..=1.0).contains(&risk) {
            return Err(ModelError::InvalidProbability(risk).into());
        }

        tracing::debug!("Step 3: Ranking feature importances...");
        let top_factors = rank_factors(
            self.classifier.feature_names(),
            self.classifier.feature_importances(),
            TOP_FACTOR_COUNT,
        );

        let assessment = RiskAssessment::new(risk, top_factors);

        tracing::info!(
            "Scoring complete: risk={:.3}, category={}",
            assessment.risk,
            assessment.category
        );

        Ok(assessment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::artifacts::ArtifactLoader;
    use crate::domain::{RiskCategory, YesNo, FEATURE_NAMES};
    use std::path::Path;

    struct IdentityScaler {
        names: Vec<String>,
    }

    impl IdentityScaler {
        fn new() -> Self {
            Self {
                names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
            }
        }
    }

    impl Scaler for IdentityScaler {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn transform(&self, row: &FeatureRow) -> Result<Vec<f64>, InputError> {
            row.aligned_values(&self.names)
        }
    }

    struct FixedClassifier {
        names: Vec<String>,
        probability: f64,
        importances: Vec<f64>,
    }

    impl FixedClassifier {
        fn new(probability: f64) -> Self {
            Self {
                names: FEATURE_NAMES.iter().map(|n| n.to_string()).collect(),
                probability,
                importances: vec![0.08, 0.12, 0.25, 0.06, 0.22, 0.05, 0.10, 0.03, 0.09],
            }
        }
    }

    impl Classifier for FixedClassifier {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict_probability(&self, scaled: &[f64]) -> Result<f64, ModelError> {
            if scaled.len() != self.names.len() {
                return Err(ModelError::Prediction("shape mismatch".into()));
            }
            Ok(self.probability)
        }

        fn feature_importances(&self) -> &[f64] {
            &self.importances
        }
    }

    fn scorer_returning(probability: f64) -> RiskScorer<IdentityScaler, FixedClassifier> {
        RiskScorer::new(
            Arc::new(IdentityScaler::new()),
            Arc::new(FixedClassifier::new(probability)),
            FeatureSchema::diabetes(),
        )
        .expect("Should build scorer")
    }

    fn reference_record() -> PatientRecord {
        PatientRecord {
            age: 40,
            bmi: 25.0,
            fasting_glucose: 100,
            blood_pressure: 120,
            hba1c: 5.5,
            daily_calories: 2000,
            physical_activity: 30,
            smoking_status: YesNo::No,
            family_history: YesNo::No,
        }
    }

    #[test]
    fn test_reference_record_categories() {
        for (probability, expected) in [
            (0.15, RiskCategory::Low),
            (0.35, RiskCategory::Medium),
            (0.55, RiskCategory::High),
            (0.85, RiskCategory::VeryHigh),
        ] {
            let assessment = scorer_returning(probability)
                .score(&reference_record())
                .expect("Should score");
            assert_eq!(assessment.category, expected);
            assert!((assessment.risk - probability).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_top_factors_sorted_and_capped() {
        let assessment = scorer_returning(0.3)
            .score(&reference_record())
            .expect("Should score");

        assert_eq!(assessment.top_factors.len(), 5);
        let names: Vec<&str> = assessment
            .top_factors
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "Fasting_Glucose",
                "HbA1c",
                "BMI",
                "Physical_Activity_min_per_day",
                "Family_History"
            ]
        );
        assert!(assessment
            .top_factors
            .windows(2)
            .all(|w| w[0].importance >= w[1].importance));
    }

    #[test]
    fn test_missing_field_is_input_error() {
        let mut row = reference_record().to_row();
        row.remove("Blood_Pressure");

        let err = scorer_returning(0.15)
            .score_row(&row)
            .expect_err("Must fail");
        assert!(matches!(
            err,
            DiabetesRiskError::Input(InputError::MissingFeature(ref n)) if n == "Blood_Pressure"
        ));
    }

    #[test]
    fn test_out_of_domain_record_is_input_error() {
        let record = PatientRecord {
            age: 5,
            ..reference_record()
        };
        let err = scorer_returning(0.15)
            .score(&record)
            .expect_err("Must fail");
        assert!(matches!(
            err,
            DiabetesRiskError::Input(InputError::OutOfRange { ref name, .. }) if name == "Age"
        ));
    }

    #[test]
    fn test_out_of_range_probability_is_model_error() {
        let err = scorer_returning(1.5)
            .score(&reference_record())
            .expect_err("Must fail");
        assert!(matches!(
            err,
            DiabetesRiskError::Model(ModelError::InvalidProbability(_))
        ));

        let err = scorer_returning(f64::NAN)
            .score(&reference_record())
            .expect_err("Must fail");
        assert!(matches!(err, DiabetesRiskError::Model(_)));
    }

    #[test]
    fn test_schema_mismatch_rejected_at_construction() {
        let mut scaler = IdentityScaler::new();
        scaler.names.swap(2, 3);

        let result = RiskScorer::new(
            Arc::new(scaler),
            Arc::new(FixedClassifier::new(0.1)),
            FeatureSchema::diabetes(),
        );
        assert!(matches!(
            result,
            Err(DiabetesRiskError::Input(InputError::OutOfOrder { position: 2, .. }))
        ));
    }

    #[test]
    fn test_importance_length_mismatch_rejected_at_construction() {
        let mut classifier = FixedClassifier::new(0.1);
        classifier.importances.pop();

        let result = RiskScorer::new(
            Arc::new(IdentityScaler::new()),
            Arc::new(classifier),
            FeatureSchema::diabetes(),
        );
        assert!(matches!(
            result,
            Err(DiabetesRiskError::Model(ModelError::Corrupt(_)))
        ));
    }

    #[test]
    fn test_shipped_artifacts_are_deterministic() {
        let artifacts = ArtifactLoader::unsigned()
            .load(Path::new("models"))
            .expect("Sample artifacts should load");
        let scorer = RiskScorer::new(
            Arc::new(artifacts.scaler),
            Arc::new(artifacts.classifier),
            FeatureSchema::diabetes(),
        )
        .expect("Should build scorer");

        let first = scorer.score(&reference_record()).expect("Should score");
        let second = scorer.score(&reference_record()).expect("Should score");

        assert!((0.0..=1.0).contains(&first.risk));
        assert_eq!(first.risk.to_bits(), second.risk.to_bits());
        assert_eq!(first, second);
        assert_eq!(first.top_factors.len(), 5);
    }

    #[test]
    fn test_shipped_artifacts_rank_higher_risk_patient_higher() {
        let artifacts = ArtifactLoader::unsigned()
            .load(Path::new("models"))
            .expect("Sample artifacts should load");
        let scorer = RiskScorer::new(
            Arc::new(artifacts.scaler),
            Arc::new(artifacts.classifier),
            FeatureSchema::diabetes(),
        )
        .expect("Should build scorer");

        let healthy = scorer.score(&reference_record()).expect("Should score");
        let at_risk = scorer
            .score(&PatientRecord {
                age: 62,
                bmi: 34.5,
                fasting_glucose: 168,
                blood_pressure: 150,
                hba1c: 8.2,
                daily_calories: 3200,
                physical_activity: 5,
                smoking_status: YesNo::Yes,
                family_history: YesNo::Yes,
            })
            .expect("Should score");

        assert!(at_risk.risk > healthy.risk);
        assert!(at_risk.category > healthy.category);
    }
}
