use std::fmt::Write;

use serde::Serialize;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::classifier::ClassifierHandle;
use crate::error::{ReportRenderError, ValidationError};
use crate::explain::{self, IMPORTANCE_CHART_TITLE};
use crate::models::{ProbabilitySplit, RankedFeature, RawInputs, RecommendationPayload, PredictionResult};
use crate::recommend::recommend;
use crate::report::{self, ReportDocument};
use crate::validate::validate;

/// Everything one submission produces. The document may fail on its own
/// without taking the prediction down with it.
#[derive(Debug, Serialize)]
pub struct PredictionOutcome {
    pub request_id: Uuid,
    pub result: PredictionResult,
    pub recommendation: RecommendationPayload,
    pub probability_split: ProbabilitySplit,
    pub ranked_importance: Vec<RankedFeature>,
    #[serde(skip)]
    pub report: Result<ReportDocument, ReportRenderError>,
}

pub fn run(handle: &ClassifierHandle, raw: &RawInputs) -> Result<PredictionOutcome, ValidationError> {
    let request_id = Uuid::new_v4();
    let span = info_span!("predict", %request_id);
    let _guard = span.enter();

    let vector = validate(raw)?;
    let result = handle.classify(&vector);
    let report = report::assemble(&vector, &result);

    Ok(complete(request_id, handle, result, report))
}

/// Derives the remaining artifacts. A failed document is carried as-is.
fn complete(
    request_id: Uuid,
    handle: &ClassifierHandle,
    result: PredictionResult,
    report: Result<ReportDocument, ReportRenderError>,
) -> PredictionOutcome {
    let recommendation = recommend(result.label());
    let probability_split = explain::probability_split(result.probability());
    let ranked_importance = explain::ranked_importance(handle.importances());
    if let Err(err) = &report {
        warn!(error = %err, "summary document could not be rendered");
    }

    info!(label = %result.label(), confidence = %result.confidence_percent(), "prediction complete");

    PredictionOutcome {
        request_id,
        result,
        recommendation,
        probability_split,
        ranked_importance,
        report,
    }
}

/// Terminal rendition of an outcome.
pub fn render_text(outcome: &PredictionOutcome) -> String {
    let result = &outcome.result;
    let recommendation = &outcome.recommendation;
    let mut output = String::new();

    let _ = writeln!(output, "## Prediction Result");
    let _ = writeln!(output, "{}", recommendation.headline);
    let _ = writeln!(output, "Prediction Confidence: {}", result.confidence_percent());
    let _ = writeln!(output);

    let _ = writeln!(output, "## Personalized Health Recommendations");
    let _ = writeln!(output, "{}", recommendation.banner);
    for group in &recommendation.groups {
        let _ = writeln!(output, "- {}: {}", group.category, group.bullets.join("; "));
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Probability Chart");
    for slice in outcome.probability_split.slices() {
        let _ = writeln!(output, "- {}: {}", slice.label, slice.percent_label);
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## {IMPORTANCE_CHART_TITLE}");
    output.push_str(&render_importance(&outcome.ranked_importance));

    output
}

pub fn render_importance(ranked: &[RankedFeature]) -> String {
    let mut output = String::new();
    for entry in ranked {
        let _ = writeln!(
            output,
            "{}. {} {:.4} ({:.1}%)",
            entry.rank,
            entry.name,
            entry.weight,
            entry.relative * 100.0
        );
    }
    output
}
