use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use thiserror::Error;

use crate::models::Feature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    NotFinite,
    OutOfRange,
    NotIntegral,
    TooPrecise { decimals: u32 },
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::NotFinite => f.write_str("not a finite number"),
            ValidationReason::OutOfRange => f.write_str("out of range"),
            ValidationReason::NotIntegral => f.write_str("not a whole number"),
            ValidationReason::TooPrecise { decimals } => {
                write!(f, "more precise than {decimals} decimal places")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {field}: {value} is {reason} (allowed {allowed_range:?})")]
pub struct ValidationError {
    pub field: Feature,
    pub value: f64,
    pub allowed_range: RangeInclusive<f64>,
    pub reason: ValidationReason,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelIncompatibleError {
    #[error("model expects {found} input features, pipeline supplies {expected}")]
    FeatureCount { expected: usize, found: usize },
    #[error("model reports {found} feature importances, expected {expected}")]
    ImportanceCount { expected: usize, found: usize },
    #[error("importance for {feature} must be a non-negative number, got {weight}")]
    InvalidImportance { feature: Feature, weight: f64 },
    #[error("model artifact contains no trees")]
    EmptyForest,
    #[error("tree {tree}, node {node}: {detail}")]
    MalformedTree {
        tree: usize,
        node: usize,
        detail: String,
    },
}

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("model artifact not found at {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to read model artifact {}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model artifact {}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Incompatible(#[from] ModelIncompatibleError),
}

#[derive(Debug, Error)]
pub enum ReportRenderError {
    #[error("character {ch:?} in {text:?} cannot be encoded in the report font")]
    Unencodable { ch: char, text: String },
    #[error("failed to encode report document: {0}")]
    Document(String),
}
