//! Random-forest model family.
//!
//! Artifacts are JSON exports of a fitted ensemble of binary decision trees.
//! Node 0 of every tree is the root; a sample goes left when
//! `x[feature] <= threshold`. Leaves hold raw class weights `[healthy, diabetic]`
//! which are normalised per leaf, averaged across trees, and the class with the
//! larger mean wins (ties go to Healthy).

use serde::{Deserialize, Serialize};

use crate::classifier::RiskModel;
use crate::error::ModelIncompatibleError;
use crate::models::{Label, ModelInfo, FEATURE_COUNT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestArtifact {
    #[serde(default)]
    pub info: ModelInfo,
    pub n_features: usize,
    pub feature_importances: Vec<f64>,
    pub trees: Vec<TreeArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub nodes: Vec<NodeArtifact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeArtifact {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: [f64; 2],
    },
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        healthy: f64,
        diabetic: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn compile(index: usize, artifact: TreeArtifact, n_features: usize) -> Result<Self, ModelIncompatibleError> {
        let malformed = |node: usize, detail: String| ModelIncompatibleError::MalformedTree {
            tree: index,
            node,
            detail,
        };

        if artifact.nodes.is_empty() {
            return Err(malformed(0, "tree has no nodes".to_string()));
        }

        let len = artifact.nodes.len();
        let mut nodes = Vec::with_capacity(len);

        for (position, node) in artifact.nodes.into_iter().enumerate() {
            match node {
                NodeArtifact::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(malformed(position, format!("split on unknown feature {feature}")));
                    }
                    if !threshold.is_finite() {
                        return Err(malformed(position, "threshold is not finite".to_string()));
                    }
                    // Children must sit after their parent so traversal always terminates.
                    for child in [left, right] {
                        if child <= position || child >= len {
                            return Err(malformed(position, format!("child index {child} is out of order")));
                        }
                    }
                    nodes.push(Node::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    });
                }
                NodeArtifact::Leaf { value: [w0, w1] } => {
                    let total = w0 + w1;
                    if !(w0.is_finite() && w1.is_finite()) || w0 < 0.0 || w1 < 0.0 || total <= 0.0 {
                        return Err(malformed(position, format!("invalid leaf weights [{w0}, {w1}]")));
                    }
                    nodes.push(Node::Leaf {
                        healthy: w0 / total,
                        diabetic: w1 / total,
                    });
                }
            }
        }

        Ok(Self { nodes })
    }

    fn distribution(&self, x: &[f64; FEATURE_COUNT]) -> (f64, f64) {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if x[*feature] <= *threshold { *left } else { *right };
                }
                Node::Leaf { healthy, diabetic } => return (*healthy, *diabetic),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    info: ModelInfo,
    n_features: usize,
    importances: Vec<f64>,
    trees: Vec<Tree>,
}

impl RandomForest {
    pub fn from_artifact(artifact: ForestArtifact) -> Result<Self, ModelIncompatibleError> {
        if artifact.trees.is_empty() {
            return Err(ModelIncompatibleError::EmptyForest);
        }

        let n_features = artifact.n_features;
        let trees = artifact
            .trees
            .into_iter()
            .enumerate()
            .map(|(index, tree)| Tree::compile(index, tree, n_features))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            info: artifact.info,
            n_features,
            importances: artifact.feature_importances,
            trees,
        })
    }

    fn mean_distribution(&self, x: &[f64; FEATURE_COUNT]) -> (f64, f64) {
        let (healthy, diabetic) = self
            .trees
            .iter()
            .map(|tree| tree.distribution(x))
            .fold((0.0, 0.0), |(h, d), (th, td)| (h + th, d + td));
        let count = self.trees.len() as f64;
        (healthy / count, diabetic / count)
    }
}

impl RiskModel for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, x: &[f64; FEATURE_COUNT]) -> Label {
        let (healthy, diabetic) = self.mean_distribution(x);
        if diabetic > healthy {
            Label::Diabetic
        } else {
            Label::Healthy
        }
    }

    fn predict_proba(&self, x: &[f64; FEATURE_COUNT]) -> f64 {
        self.mean_distribution(x).1
    }

    fn feature_importances(&self) -> Vec<f64> {
        self.importances.clone()
    }

    fn info(&self) -> Option<&ModelInfo> {
        Some(&self.info)
    }
}
