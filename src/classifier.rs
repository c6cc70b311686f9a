use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{ModelIncompatibleError, ModelLoadError};
use crate::forest::{ForestArtifact, RandomForest};
use crate::models::{FeatureImportance, FeatureVector, Label, ModelInfo, PredictionResult, FEATURE_COUNT};

/// Inference contract every trained model must satisfy.
///
/// `predict` and `predict_proba` are queried separately; the adapter never
/// derives one from the other because some model families do not decide at a
/// symmetric 0.5 threshold.
pub trait RiskModel: Send + Sync {
    fn n_features(&self) -> usize;
    fn predict(&self, x: &[f64; FEATURE_COUNT]) -> Label;
    /// Probability of the Diabetic class.
    fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> f64;
    fn feature_importances(&self) -> Vec<f64>;

    fn info(&self) -> Option<&ModelInfo> {
        None
    }
}

/// Loaded, validated model. Created once at startup and shared read-only.
pub struct ClassifierHandle {
    model: Box<dyn RiskModel>,
    importance: FeatureImportance,
    source: String,
    loaded_at: DateTime<Utc>,
}

impl fmt::Debug for ClassifierHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierHandle")
            .field("source", &self.source)
            .field("loaded_at", &self.loaded_at)
            .finish_non_exhaustive()
    }
}

impl ClassifierHandle {
    pub fn load(path: &Path) -> Result<Self, ModelLoadError> {
        info!(path = %path.display(), "loading model artifact");

        let raw = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ModelLoadError::Missing(path.to_path_buf())
            } else {
                ModelLoadError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let artifact: ForestArtifact =
            serde_json::from_str(&raw).map_err(|source| ModelLoadError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;
        let trees = artifact.trees.len();
        let forest = RandomForest::from_artifact(artifact)?;
        let handle = Self::from_model(forest, path.display().to_string())?;

        info!(trees, source = %handle.source, "model ready");
        Ok(handle)
    }

    /// Wraps any model, checking its shape against the fixed feature layout.
    pub fn from_model(
        model: impl RiskModel + 'static,
        source: impl Into<String>,
    ) -> Result<Self, ModelIncompatibleError> {
        if model.n_features() != FEATURE_COUNT {
            return Err(ModelIncompatibleError::FeatureCount {
                expected: FEATURE_COUNT,
                found: model.n_features(),
            });
        }
        let importance = FeatureImportance::from_weights(&model.feature_importances())?;

        Ok(Self {
            model: Box::new(model),
            importance,
            source: source.into(),
            loaded_at: Utc::now(),
        })
    }

    pub fn classify(&self, vector: &FeatureVector) -> PredictionResult {
        let x = vector.as_array();
        let label = self.model.predict(x);
        let probability = self.model.predict_proba(x);
        debug_assert!((0.0..=1.0).contains(&probability));

        let leans_diabetic = probability > 0.5;
        if leans_diabetic != (label == Label::Diabetic) {
            debug!(%label, probability, "model label disagrees with probability side of 0.5; keeping label");
        }
        debug!(%label, probability, "classified");

        PredictionResult::new(label, probability, *vector)
    }

    pub fn importances(&self) -> &FeatureImportance {
        &self.importance
    }

    pub fn info(&self) -> ModelInfo {
        self.model.info().cloned().unwrap_or_default()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::testing::{stub_handle, StubModel};
    use super::*;
    use crate::forest::fixtures::two_stump_artifact;
    use crate::models::{Feature, RawInputs};
    use crate::validate::validate;

    fn write_artifact(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_forest_from_disk_and_classifies_deterministically() {
        let json = serde_json::to_string(&two_stump_artifact()).unwrap();
        let file = write_artifact(&json);
        let handle = ClassifierHandle::load(file.path()).unwrap();

        let vector = validate(&RawInputs::default()).unwrap();
        let first = handle.classify(&vector);
        let second = handle.classify(&vector);

        assert_eq!(first.label(), Label::Healthy);
        assert_eq!(first.probability().to_bits(), second.probability().to_bits());
        assert_eq!(first.inputs(), &vector);
        assert_eq!(handle.info().name, "Random Forest Classifier");
    }

    #[test]
    fn missing_artifact_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(
            ClassifierHandle::load(&path),
            Err(ModelLoadError::Missing(p)) if p == path
        ));
    }

    #[test]
    fn malformed_artifact_is_reported() {
        let file = write_artifact("{ not json");
        assert!(matches!(
            ClassifierHandle::load(file.path()),
            Err(ModelLoadError::Malformed { .. })
        ));
    }

    #[test]
    fn wrong_feature_count_is_incompatible() {
        let mut artifact = two_stump_artifact();
        artifact.n_features = 9;
        let file = write_artifact(&serde_json::to_string(&artifact).unwrap());

        assert!(matches!(
            ClassifierHandle::load(file.path()),
            Err(ModelLoadError::Incompatible(ModelIncompatibleError::FeatureCount {
                expected: 8,
                found: 9
            }))
        ));
    }

    #[test]
    fn wrong_importance_count_is_incompatible() {
        let mut stub = StubModel::new(Label::Healthy, 0.1);
        stub.importances.pop();

        let err = ClassifierHandle::from_model(stub, "stub").unwrap_err();
        assert_eq!(
            err,
            ModelIncompatibleError::ImportanceCount {
                expected: 8,
                found: 7
            }
        );
    }

    #[test]
    fn negative_importance_is_incompatible() {
        let mut stub = StubModel::new(Label::Healthy, 0.1);
        stub.importances[3] = -0.01;

        assert!(matches!(
            ClassifierHandle::from_model(stub, "stub"),
            Err(ModelIncompatibleError::InvalidImportance {
                feature: Feature::SkinThickness,
                ..
            })
        ));
    }

    #[test]
    fn trusts_model_label_over_probability() {
        let handle = stub_handle(Label::Diabetic, 0.35);
        let vector = validate(&RawInputs::default()).unwrap();
        let result = handle.classify(&vector);

        assert_eq!(result.label(), Label::Diabetic);
        assert_eq!(result.probability(), 0.35);
    }

    #[test]
    fn importances_keep_field_order() {
        let handle = stub_handle(Label::Healthy, 0.1);
        let features: Vec<Feature> = handle.importances().entries().map(|(f, _)| f).collect();
        assert_eq!(features, Feature::ALL.to_vec());
        assert_eq!(handle.importances().weight(Feature::Glucose), 0.26);
    }

    #[test]
    fn handle_is_shared_across_threads() {
        let json = serde_json::to_string(&two_stump_artifact()).unwrap();
        let file = write_artifact(&json);
        let handle = ClassifierHandle::load(file.path()).unwrap();
        let vector = validate(&RawInputs::default()).unwrap();
        let expected = handle.classify(&vector).probability();

        std::thread::scope(|scope| {
            let workers: Vec<_> = (0..4)
                .map(|_| scope.spawn(|| handle.classify(&vector).probability()))
                .collect();
            for worker in workers {
                assert_eq!(worker.join().unwrap(), expected);
            }
        });
    }
}
