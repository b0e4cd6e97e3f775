//! Feature schema shared by the form, the record type and the artifacts.
//!
//! The scaler and classifier were fitted on these nine columns in exactly
//! this order. Every component that builds or consumes a feature row goes
//! through [`FeatureSchema`] instead of relying on positional convention.

use super::error::InputError;

/// How a feature is entered and encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    /// Whole number, rounded after clamping
    Integer,
    /// Real number
    Float,
    /// Yes/No choice encoded as 1/0
    Binary,
}

/// Static description of a single model input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureSpec {
    /// Column name the artifacts were fitted with
    pub name: &'static str,
    /// Human-readable label for the form
    pub label: &'static str,
    pub kind: FeatureKind,
    pub min: f64,
    pub max: f64,
    /// Value pre-filled in the form
    pub default: f64,
}

impl FeatureSpec {
    /// Clamp a raw value into this feature's domain.
    ///
    /// Integers are rounded and binary values snap to 0 or 1.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        match self.kind {
            FeatureKind::Integer => clamped.round(),
            FeatureKind::Float => clamped,
            FeatureKind::Binary => {
                if clamped >= 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Check `value` against this feature's domain without clamping.
    ///
    /// # Errors
    /// Returns the first rule `value` breaks: finite, integral for integer
    /// features, 0/1 for binary features, then the range.
    pub fn check(&self, value: f64) -> Result<(), InputError> {
        let name = || self.name.to_string();
        if !value.is_finite() {
            return Err(InputError::NonFinite(name()));
        }
        match self.kind {
            FeatureKind::Binary if !self.contains(value) => {
                return Err(InputError::NotBinary(name()));
            }
            FeatureKind::Integer if value.fract() != 0.0 => {
                return Err(InputError::NotIntegral(name()));
            }
            _ => {}
        }
        if !self.contains(value) {
            return Err(InputError::OutOfRange {
                name: name(),
                value,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// Whether `value` already lies in the domain without clamping.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        match self.kind {
            FeatureKind::Binary => value == 0.0 || value == 1.0,
            _ => (self.min..=self.max).contains(&value),
        }
    }
}

/// Number of model inputs.
pub const FEATURE_COUNT: usize = 9;

/// The nine inputs, in training order.
pub const FEATURES: [FeatureSpec; FEATURE_COUNT] = [
    FeatureSpec {
        name: "Age",
        label: "Age",
        kind: FeatureKind::Integer,
        min: 10.0,
        max: 100.0,
        default: 40.0,
    },
    FeatureSpec {
        name: "BMI",
        label: "BMI",
        kind: FeatureKind::Float,
        min: 10.0,
        max: 60.0,
        default: 25.0,
    },
    FeatureSpec {
        name: "Fasting_Glucose",
        label: "Fasting Glucose (mg/dL)",
        kind: FeatureKind::Integer,
        min: 50.0,
        max: 300.0,
        default: 100.0,
    },
    FeatureSpec {
        name: "Blood_Pressure",
        label: "Blood Pressure",
        kind: FeatureKind::Integer,
        min: 80.0,
        max: 200.0,
        default: 120.0,
    },
    FeatureSpec {
        name: "HbA1c",
        label: "HbA1c (%)",
        kind: FeatureKind::Float,
        min: 3.0,
        max: 15.0,
        default: 5.5,
    },
    FeatureSpec {
        name: "Daily_Calories",
        label: "Daily Calories",
        kind: FeatureKind::Integer,
        min: 500.0,
        max: 5000.0,
        default: 2000.0,
    },
    FeatureSpec {
        name: "Physical_Activity_min_per_day",
        label: "Physical Activity (min/day)",
        kind: FeatureKind::Integer,
        min: 0.0,
        max: 300.0,
        default: 30.0,
    },
    FeatureSpec {
        name: "Smoking_Status",
        label: "Smoking Status",
        kind: FeatureKind::Binary,
        min: 0.0,
        max: 1.0,
        default: 0.0,
    },
    FeatureSpec {
        name: "Family_History",
        label: "Family History of Diabetes",
        kind: FeatureKind::Binary,
        min: 0.0,
        max: 1.0,
        default: 0.0,
    },
];

/// Column names in schema order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Age",
    "BMI",
    "Fasting_Glucose",
    "Blood_Pressure",
    "HbA1c",
    "Daily_Calories",
    "Physical_Activity_min_per_day",
    "Smoking_Status",
    "Family_History",
];

/// Ordered schema descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureSchema {
    features: &'static [FeatureSpec],
}

impl FeatureSchema {
    /// The schema the shipped artifacts are fitted on.
    #[must_use]
    pub const fn diabetes() -> Self {
        Self {
            features: &FEATURES,
        }
    }

    #[must_use]
    pub fn features(&self) -> &'static [FeatureSpec] {
        self.features
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.features.iter().map(|f| f.name)
    }

    /// Look up a feature by column name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&'static FeatureSpec> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Check that an externally supplied column list matches this schema
    /// name-for-name and in order.
    ///
    /// # Errors
    /// Returns the first mismatch found.
    pub fn check_names<S: AsRef<str>>(&self, names: &[S]) -> Result<(), InputError> {
        for (position, spec) in self.features.iter().enumerate() {
            match names.get(position) {
                None => return Err(InputError::MissingFeature(spec.name.to_string())),
                Some(found) if found.as_ref() == spec.name => {}
                Some(found) => {
                    let found = found.as_ref();
                    // A known name in the wrong slot is an ordering problem,
                    // anything else is a foreign column.
                    return Err(if self.get(found).is_some() {
                        InputError::OutOfOrder {
                            name: found.to_string(),
                            position,
                            expected: spec.name.to_string(),
                        }
                    } else {
                        InputError::UnexpectedFeature(found.to_string())
                    });
                }
            }
        }

        if names.len() > self.features.len() {
            return Err(InputError::UnexpectedFeature(
                names[self.features.len()].as_ref().to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::diabetes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_order() {
        let names: Vec<&str> = FeatureSchema::diabetes().names().collect();
        assert_eq!(names, FEATURE_NAMES.to_vec());
        assert_eq!(names[0], "Age");
        assert_eq!(names[8], "Family_History");
    }

    #[test]
    fn test_clamp_by_kind() {
        let age = FeatureSchema::diabetes().get("Age").unwrap();
        assert_eq!(age.clamp(5.0), 10.0);
        assert_eq!(age.clamp(41.6), 42.0);
        assert_eq!(age.clamp(250.0), 100.0);

        let bmi = FeatureSchema::diabetes().get("BMI").unwrap();
        assert!((bmi.clamp(27.35) - 27.35).abs() < f64::EPSILON);

        let smoking = FeatureSchema::diabetes().get("Smoking_Status").unwrap();
        assert_eq!(smoking.clamp(0.7), 1.0);
        assert_eq!(smoking.clamp(-3.0), 0.0);
    }

    #[test]
    fn test_check_names_accepts_exact_match() {
        let schema = FeatureSchema::diabetes();
        let names: Vec<String> = schema.names().map(String::from).collect();
        assert!(schema.check_names(&names).is_ok());
    }

    #[test]
    fn test_check_names_reports_mismatches() {
        let schema = FeatureSchema::diabetes();
        let mut names: Vec<&str> = schema.names().collect();

        names.pop();
        assert!(matches!(
            schema.check_names(&names),
            Err(InputError::MissingFeature(n)) if n == "Family_History"
        ));

        let mut swapped: Vec<&str> = schema.names().collect();
        swapped.swap(0, 1);
        assert!(matches!(
            schema.check_names(&swapped),
            Err(InputError::OutOfOrder { position: 0, .. })
        ));

        let mut extra: Vec<&str> = schema.names().collect();
        extra.push("Insulin");
        assert!(matches!(
            schema.check_names(&extra),
            Err(InputError::UnexpectedFeature(n)) if n == "Insulin"
        ));
    }

    #[test]
    fn test_check_rejects_what_clamp_would_change() {
        let schema = FeatureSchema::diabetes();
        let age = schema.get("Age").expect("Age");
        assert!(age.check(40.0).is_ok());
        assert_eq!(age.check(40.5), Err(InputError::NotIntegral("Age".into())));
        assert!(matches!(age.check(-3.0), Err(InputError::OutOfRange { .. })));

        let family = schema.get("Family_History").expect("Family_History");
        assert_eq!(family.check(0.5), Err(InputError::NotBinary("Family_History".into())));

        let bmi = schema.get("BMI").expect("BMI");
        assert!(bmi.check(27.35).is_ok());
        assert_eq!(bmi.check(f64::NAN), Err(InputError::NonFinite("BMI".into())));
    }
}
