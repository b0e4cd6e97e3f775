//! Patient record types for diabetes risk prediction.
//!
//! A [`PatientRecord`] is the typed form of the nine clinical/lifestyle
//! inputs. It is flattened into a [`FeatureRow`] (named, ordered columns)
//! before it reaches the scaler.

use serde::{Deserialize, Serialize};

use super::error::InputError;
use super::schema::{FeatureSchema, FEATURE_COUNT, FEATURE_NAMES};

/// Yes/No answer from a choice widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum YesNo {
    #[default]
    No,
    Yes,
}

impl YesNo {
    /// Encode as the model expects: Yes = 1, No = 0.
    #[must_use]
    pub fn encode(self) -> f64 {
        match self {
            Self::Yes => 1.0,
            Self::No => 0.0,
        }
    }

    /// Decode a 0/1 model value.
    #[must_use]
    pub fn from_encoded(value: f64) -> Option<Self> {
        if value == 1.0 {
            Some(Self::Yes)
        } else if value == 0.0 {
            Some(Self::No)
        } else {
            None
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Yes => Self::No,
            Self::No => Self::Yes,
        }
    }
}

impl std::fmt::Display for YesNo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "Yes"),
            Self::No => write!(f, "No"),
        }
    }
}

/// The nine inputs of a single evaluation.
///
/// Built fresh for every evaluation and dropped once the result is shown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Age in years (10-100)
    pub age: u32,

    /// Body mass index (10.0-60.0)
    pub bmi: f64,

    /// Fasting plasma glucose in mg/dL (50-300)
    pub fasting_glucose: u32,

    /// Blood pressure in mmHg (80-200)
    pub blood_pressure: u32,

    /// Glycated haemoglobin in % (3.0-15.0)
    pub hba1c: f64,

    /// Daily calorie intake in kcal (500-5000)
    pub daily_calories: u32,

    /// Physical activity in minutes per day (0-300)
    pub physical_activity: u32,

    pub smoking_status: YesNo,

    /// Family history of diabetes
    pub family_history: YesNo,
}

impl Default for PatientRecord {
    /// The form's pre-filled values.
    fn default() -> Self {
        Self {
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
}

impl PatientRecord {
    /// Values in schema order.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            f64::from(self.age),
            self.bmi,
            f64::from(self.fasting_glucose),
            f64::from(self.blood_pressure),
            self.hba1c,
            f64::from(self.daily_calories),
            f64::from(self.physical_activity),
            self.smoking_status.encode(),
            self.family_history.encode(),
        ]
    }

    /// Labeled row in schema order.
    #[must_use]
    pub fn to_row(&self) -> FeatureRow {
        FeatureRow::from_values(FeatureSchema::diabetes().names().zip(self.to_vec()))
    }

    /// Rebuild a record from a labeled row.
    ///
    /// # Errors
    /// Returns `InputError` if the row does not match the schema or a value
    /// lies outside its feature's domain. Nothing is rounded or clamped here.
    pub fn from_row(row: &FeatureRow) -> Result<Self, InputError> {
        let v = row.aligned_values(&FEATURE_NAMES)?;
        for (spec, value) in FeatureSchema::diabetes().features().iter().zip(&v) {
            spec.check(*value)?;
        }
        let binary = |idx: usize| {
            YesNo::from_encoded(v[idx])
                .ok_or_else(|| InputError::NotBinary(FEATURE_NAMES[idx].to_string()))
        };

        // Integral and in range after the checks above, so the casts are exact.
        Ok(Self {
            age: v[0] as u32,
            bmi: v[1],
            fasting_glucose: v[2] as u32,
            blood_pressure: v[3] as u32,
            hba1c: v[4],
            daily_calories: v[5] as u32,
            physical_activity: v[6] as u32,
            smoking_status: binary(7)?,
            family_history: binary(8)?,
        })
    }

    /// Check every field against its schema domain.
    ///
    /// # Errors
    /// Returns the first field outside its domain, in schema order.
    pub fn validate(&self) -> Result<(), InputError> {
        FeatureSchema::diabetes()
            .features()
            .iter()
            .zip(self.to_vec())
            .try_for_each(|(spec, value)| spec.check(value))
    }
}

/// Named, ordered feature values: a single-row frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    columns: Vec<(String, f64)>,
}

impl FeatureRow {
    #[must_use]
    pub fn new() -> Self {
        Self {
            columns: Vec::with_capacity(FEATURE_COUNT),
        }
    }

    pub fn from_values<N, I>(columns: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, f64)>,
    {
        Self {
            columns: columns.into_iter().map(|(n, v)| (n.into(), v)).collect(),
        }
    }

    /// Append a column.
    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.columns.push((name.into(), value));
    }

    /// Remove a column by name, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<f64> {
        let idx = self.columns.iter().position(|(n, _)| n == name)?;
        Some(self.columns.remove(idx).1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Values in order after checking column names against `expected`.
    ///
    /// # Errors
    /// Returns `InputError` on a missing, foreign or misplaced column, or a
    /// non-finite value.
    pub fn aligned_values<S: AsRef<str>>(&self, expected: &[S]) -> Result<Vec<f64>, InputError> {
        let names = self.names();
        for (position, want) in expected.iter().enumerate() {
            let want = want.as_ref();
            match names.get(position) {
                Some(&found) if found == want => {}
                Some(&found) => {
                    return Err(if !names.contains(&want) {
                        InputError::MissingFeature(want.to_string())
                    } else if expected.iter().any(|e| e.as_ref() == found) {
                        InputError::OutOfOrder {
                            name: found.to_string(),
                            position,
                            expected: want.to_string(),
                        }
                    } else {
                        InputError::UnexpectedFeature(found.to_string())
                    });
                }
                None => return Err(InputError::MissingFeature(want.to_string())),
            }
        }

        if self.columns.len() != expected.len() {
            return Err(InputError::FeatureCount {
                got: self.columns.len(),
                expected: expected.len(),
            });
        }

        self.columns
            .iter()
            .map(|(name, value)| {
                if value.is_finite() {
                    Ok(*value)
                } else {
                    Err(InputError::NonFinite(name.clone()))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PatientRecord {
        PatientRecord {
            age: 58,
            bmi: 31.2,
            fasting_glucose: 142,
            blood_pressure: 138,
            hba1c: 7.1,
            daily_calories: 2600,
            physical_activity: 10,
            smoking_status: YesNo::Yes,
            family_history: YesNo::Yes,
        }
    }

    #[test]
    fn test_record_to_vec() {
        let vec = sample().to_vec();
        assert_eq!(vec.len(), 9);
        assert!((vec[0] - 58.0).abs() < f64::EPSILON);
        assert!((vec[4] - 7.1).abs() < f64::EPSILON);
        assert_eq!(vec[7], 1.0);
        assert_eq!(vec[8], 1.0);
    }

    #[test]
    fn test_row_follows_schema() {
        let row = sample().to_row();
        let names: Vec<&str> = FeatureSchema::diabetes().names().collect();
        assert_eq!(row.names(), names);
        let values = row.aligned_values(&FEATURE_NAMES).expect("Should align");
        assert_eq!(values[2], 142.0);
    }

    #[test]
    fn test_record_from_row() {
        let record = PatientRecord::from_row(&sample().to_row()).expect("Should parse");
        assert_eq!(record, sample());
    }

    #[test]
    fn test_missing_column_is_input_error() {
        let mut row = PatientRecord::default().to_row();
        row.remove("HbA1c");
        assert_eq!(
            PatientRecord::from_row(&row),
            Err(InputError::MissingFeature("HbA1c".into()))
        );
    }

    #[test]
    fn test_trailing_column_is_input_error() {
        let mut row = PatientRecord::default().to_row();
        row.push("Insulin", 12.0);
        assert_eq!(
            row.aligned_values(&FEATURE_NAMES),
            Err(InputError::FeatureCount {
                got: 10,
                expected: 9
            })
        );
    }

    #[test]
    fn test_non_finite_value_is_input_error() {
        let mut row = PatientRecord::default().to_row();
        row.remove("Family_History");
        row.push("Family_History", f64::NAN);
        assert_eq!(
            row.aligned_values(&FEATURE_NAMES),
            Err(InputError::NonFinite("Family_History".into()))
        );
    }

    #[test]
    fn test_yes_no_encoding() {
        assert_eq!(YesNo::Yes.encode(), 1.0);
        assert_eq!(YesNo::No.encode(), 0.0);
        assert_eq!(YesNo::from_encoded(1.0), Some(YesNo::Yes));
        assert_eq!(YesNo::from_encoded(0.5), None);
    }

    #[test]
    fn test_validation() {
        assert!(sample().validate().is_ok());
        assert!(PatientRecord::default().validate().is_ok());

        let invalid = PatientRecord {
            age: 7,
            hba1c: 18.0,
            ..Default::default()
        };
        assert!(matches!(
            invalid.validate(),
            Err(InputError::OutOfRange { name, .. }) if name == "Age"
        ));
    }

    #[test]
    fn test_from_row_rejects_fractional_integer_column() {
        let values = PatientRecord::default()
            .to_vec()
            .into_iter()
            .enumerate()
            .map(|(i, v)| if i == 0 { 40.5 } else { v });
        let row = FeatureRow::from_values(FEATURE_NAMES.iter().copied().zip(values));
        assert_eq!(
            PatientRecord::from_row(&row),
            Err(InputError::NotIntegral("Age".into()))
        );
    }

    #[test]
    fn test_from_row_rejects_negative_activity() {
        let values = PatientRecord::default()
            .to_vec()
            .into_iter()
            .enumerate()
            .map(|(i, v)| if i == 6 { -30.0 } else { v });
        let row = FeatureRow::from_values(FEATURE_NAMES.iter().copied().zip(values));
        assert!(matches!(
            PatientRecord::from_row(&row),
            Err(InputError::OutOfRange { name, value, .. })
                if name == "Physical_Activity_min_per_day" && value == -30.0
        ));
    }
}
