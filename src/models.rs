use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::ModelIncompatibleError;

pub const FEATURE_COUNT: usize = 8;

/// Clinical measurements in the order the classifier consumes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Pregnancies,
    Glucose,
    BloodPressure,
    SkinThickness,
    Insulin,
    Bmi,
    DiabetesPedigreeFunction,
    Age,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Pregnancies,
        Feature::Glucose,
        Feature::BloodPressure,
        Feature::SkinThickness,
        Feature::Insulin,
        Feature::Bmi,
        Feature::DiabetesPedigreeFunction,
        Feature::Age,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn key(self) -> &'static str {
        match self {
            Feature::Pregnancies => "pregnancies",
            Feature::Glucose => "glucose",
            Feature::BloodPressure => "blood_pressure",
            Feature::SkinThickness => "skin_thickness",
            Feature::Insulin => "insulin",
            Feature::Bmi => "bmi",
            Feature::DiabetesPedigreeFunction => "diabetes_pedigree_function",
            Feature::Age => "age",
        }
    }

    /// Name used on importance charts.
    pub fn display_name(self) -> &'static str {
        match self {
            Feature::Pregnancies => "Pregnancies",
            Feature::Glucose => "Glucose",
            Feature::BloodPressure => "Blood Pressure",
            Feature::SkinThickness => "Skin Thickness",
            Feature::Insulin => "Insulin",
            Feature::Bmi => "BMI",
            Feature::DiabetesPedigreeFunction => "Diabetes Pedigree Function",
            Feature::Age => "Age",
        }
    }

    /// Name used on the printable summary.
    pub fn report_label(self) -> &'static str {
        match self {
            Feature::Glucose => "Glucose Level",
            other => other.display_name(),
        }
    }

    pub fn range(self) -> (f64, f64) {
        match self {
            Feature::Pregnancies => (0.0, 20.0),
            Feature::Glucose => (0.0, 200.0),
            Feature::BloodPressure => (0.0, 200.0),
            Feature::SkinThickness => (0.0, 100.0),
            Feature::Insulin => (0.0, 900.0),
            Feature::Bmi => (0.0, 70.0),
            Feature::DiabetesPedigreeFunction => (0.0, 3.0),
            Feature::Age => (1.0, 120.0),
        }
    }

    /// Most decimal places an input may carry; zero marks an integer field.
    /// Independent of how the value is printed.
    pub fn max_decimals(self) -> u32 {
        match self {
            Feature::Bmi | Feature::DiabetesPedigreeFunction => 3,
            _ => 0,
        }
    }

    pub fn is_integer(self) -> bool {
        self.max_decimals() == 0
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Unvalidated measurements as the caller supplies them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawInputs {
    pub pregnancies: f64,
    pub glucose: f64,
    pub blood_pressure: f64,
    pub skin_thickness: f64,
    pub insulin: f64,
    pub bmi: f64,
    pub diabetes_pedigree_function: f64,
    pub age: f64,
}

impl RawInputs {
    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Pregnancies => self.pregnancies,
            Feature::Glucose => self.glucose,
            Feature::BloodPressure => self.blood_pressure,
            Feature::SkinThickness => self.skin_thickness,
            Feature::Insulin => self.insulin,
            Feature::Bmi => self.bmi,
            Feature::DiabetesPedigreeFunction => self.diabetes_pedigree_function,
            Feature::Age => self.age,
        }
    }
}

impl Default for RawInputs {
    fn default() -> Self {
        Self {
            pregnancies: 1.0,
            glucose: 110.0,
            blood_pressure: 70.0,
            skin_thickness: 20.0,
            insulin: 80.0,
            bmi: 25.0,
            diabetes_pedigree_function: 0.5,
            age: 30.0,
        }
    }
}

/// Validated measurements. Only `validate::validate` builds one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub(crate) fn from_validated(values: [f64; FEATURE_COUNT]) -> Self {
        Self { values }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.values[feature.index()]
    }

    pub fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    /// Integers without decimals, floats in shortest round-trip form (`25.0`, `0.5`).
    pub fn display_value(&self, feature: Feature) -> String {
        let value = self.get(feature);
        if feature.is_integer() {
            format!("{}", value as i64)
        } else {
            format!("{value:?}")
        }
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for feature in Feature::ALL {
            map.serialize_entry(feature.key(), &self.get(feature))?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Diabetic,
    Healthy,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Diabetic => f.write_str("Diabetic"),
            Label::Healthy => f.write_str("Healthy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    label: Label,
    probability: f64,
    inputs: FeatureVector,
}

impl PredictionResult {
    pub(crate) fn new(label: Label, probability: f64, inputs: FeatureVector) -> Self {
        Self {
            label,
            probability,
            inputs,
        }
    }

    pub fn label(&self) -> Label {
        self.label
    }

    /// Probability of the Diabetic class.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn inputs(&self) -> &FeatureVector {
        &self.inputs
    }

    pub fn confidence_percent(&self) -> String {
        format!("{:.2}%", self.probability * 100.0)
    }
}

/// Per-feature weights owned by the model, stored in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureImportance {
    weights: [f64; FEATURE_COUNT],
}

impl FeatureImportance {
    pub fn from_weights(weights: &[f64]) -> Result<Self, ModelIncompatibleError> {
        let weights: [f64; FEATURE_COUNT] =
            weights
                .try_into()
                .map_err(|_| ModelIncompatibleError::ImportanceCount {
                    expected: FEATURE_COUNT,
                    found: weights.len(),
                })?;

        for feature in Feature::ALL {
            let weight = weights[feature.index()];
            if !weight.is_finite() || weight < 0.0 {
                return Err(ModelIncompatibleError::InvalidImportance { feature, weight });
            }
        }

        Ok(Self { weights })
    }

    pub fn entries(&self) -> impl Iterator<Item = (Feature, f64)> + '_ {
        Feature::ALL
            .into_iter()
            .map(|feature| (feature, self.weights[feature.index()]))
    }

    pub fn weight(&self, feature: Feature) -> f64 {
        self.weights[feature.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GuidanceCategory {
    Diet,
    Exercise,
    Monitoring,
    Consultation,
}

impl fmt::Display for GuidanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GuidanceCategory::Diet => "Diet",
            GuidanceCategory::Exercise => "Exercise",
            GuidanceCategory::Monitoring => "Monitoring",
            GuidanceCategory::Consultation => "Consultation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuidanceGroup {
    pub category: GuidanceCategory,
    pub bullets: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationPayload {
    pub label: Label,
    pub headline: &'static str,
    pub banner: &'static str,
    pub groups: Vec<GuidanceGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbabilitySplit {
    pub diabetic_share: f64,
    pub healthy_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub label: Label,
    pub share: f64,
    pub percent_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFeature {
    pub rank: usize,
    pub feature: Feature,
    pub name: &'static str,
    pub weight: f64,
    pub relative: f64,
}

/// Descriptive metadata shipped alongside a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInfo {
    pub name: String,
    pub trained_on: String,
    pub interpretation: String,
}

impl Default for ModelInfo {
    fn default() -> Self {
        Self {
            name: "Random Forest Classifier".to_string(),
            trained_on: "Kaggle Pima Indians Diabetes Dataset".to_string(),
            interpretation: "Ensemble of decision trees identifying key patterns for reliable risk prediction.".to_string(),
        }
    }
}
