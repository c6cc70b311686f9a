use crate::models::{ChartSlice, Feature, FeatureImportance, Label, ProbabilitySplit, RankedFeature};

pub const IMPORTANCE_CHART_TITLE: &str = "Feature Importance - Gini Importance";
pub const IMPORTANCE_AXIS_LABEL: &str = "Relative Importance";

pub fn probability_split(probability: f64) -> ProbabilitySplit {
    ProbabilitySplit {
        diabetic_share: probability,
        healthy_share: 1.0 - probability,
    }
}

impl ProbabilitySplit {
    /// Two pie slices, Diabetic first, annotated to one decimal.
    pub fn slices(&self) -> [ChartSlice; 2] {
        let slice = |label, share: f64| ChartSlice {
            label,
            share,
            percent_label: format!("{:.1}%", share * 100.0),
        };
        [
            slice(Label::Diabetic, self.diabetic_share),
            slice(Label::Healthy, self.healthy_share),
        ]
    }
}

/// Heaviest feature first. The sort is stable so equal weights keep field order.
pub fn ranked_importance(importance: &FeatureImportance) -> Vec<RankedFeature> {
    let total: f64 = importance.entries().map(|(_, weight)| weight).sum();
    let mut features = Feature::ALL;
    features.sort_by(|a, b| importance.weight(*b).total_cmp(&importance.weight(*a)));

    features
        .into_iter()
        .enumerate()
        .map(|(position, feature)| {
            let weight = importance.weight(feature);
            RankedFeature {
                rank: position + 1,
                feature,
                name: feature.display_name(),
                weight,
                relative: if total > 0.0 { weight / total } else { 0.0 },
            }
        })
        .collect()
}
