use std::fmt::Write;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use serde::Serialize;
use tracing::debug;

use crate::error::ReportRenderError;
use crate::models::{Feature, FeatureVector, PredictionResult};

pub const REPORT_MIME: &str = "application/pdf";
pub const REPORT_FILENAME: &str = "prediction_summary.pdf";
pub const REPORT_TITLE: &str = "Diabetes Prediction Report";

// A4 portrait in points; layout constants in millimetres like a desk printer margin.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const PT_PER_MM: f64 = 72.0 / 25.4;
const MARGIN_MM: f64 = 10.0;
const TITLE_CELL_WIDTH_MM: f64 = 200.0;
const TITLE_CELL_HEIGHT_MM: f64 = 10.0;
const BODY_TOP_MM: f64 = 30.0;
const LINE_HEIGHT_MM: f64 = 8.0;
const TITLE_SIZE: i64 = 16;
const BODY_SIZE: i64 = 12;
// Helvetica metrics are not embedded; the title is centred on an average glyph width.
const AVG_BOLD_GLYPH_EM: f64 = 0.58;
const SEPARATOR: &str = "--------------------------";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: &'static str,
}

/// Body text of the summary, one entry per printed line.
pub fn report_lines(vector: &FeatureVector, result: &PredictionResult) -> Vec<String> {
    let mut lines: Vec<String> = Feature::ALL
        .iter()
        .map(|&feature| format!("{}: {}", feature.report_label(), vector.display_value(feature)))
        .collect();

    lines.push(SEPARATOR.to_string());
    lines.push(format!("Prediction: {}", result.label()));
    lines.push(format!("Confidence: {}", result.confidence_percent()));
    lines
}

/// Renders the single-page PDF. Identical inputs give identical bytes.
pub fn assemble(
    vector: &FeatureVector,
    result: &PredictionResult,
) -> Result<ReportDocument, ReportRenderError> {
    assemble_titled(REPORT_TITLE, vector, result)
}

pub(crate) fn assemble_titled(
    title: &str,
    vector: &FeatureVector,
    result: &PredictionResult,
) -> Result<ReportDocument, ReportRenderError> {
    let lines = report_lines(vector, result);
    let bytes = render_pdf(title, &lines)?;
    debug!(bytes = bytes.len(), "report rendered");

    Ok(ReportDocument {
        bytes,
        mime: REPORT_MIME,
        filename: REPORT_FILENAME,
    })
}

fn render_pdf(title: &str, lines: &[String]) -> Result<Vec<u8>, ReportRenderError> {
    let mut operations = Vec::with_capacity(lines.len() * 4 + 4);

    let title_width = title.chars().count() as f64 * AVG_BOLD_GLYPH_EM * TITLE_SIZE as f64;
    let title_x = mm(MARGIN_MM) + (mm(TITLE_CELL_WIDTH_MM) - title_width) / 2.0;
    let title_baseline = MARGIN_MM + TITLE_CELL_HEIGHT_MM / 2.0;
    push_text(&mut operations, "F2", TITLE_SIZE, title_x, title_baseline, title)?;

    for (row, line) in lines.iter().enumerate() {
        let baseline = BODY_TOP_MM + LINE_HEIGHT_MM * (row as f64 + 0.5);
        push_text(&mut operations, "F1", BODY_SIZE, mm(MARGIN_MM), baseline, line)?;
    }

    let content = Content { operations }
        .encode()
        .map_err(|err| ReportRenderError::Document(err.to_string()))?;

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let body_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let title_font = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => body_font,
            "F2" => title_font,
        },
    });
    let content_id = doc.add_object(Stream::new(dictionary! {}, content));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|err| ReportRenderError::Document(err.to_string()))?;
    Ok(bytes)
}

/// `top_mm` is measured from the top edge, PDF space from the bottom.
fn push_text(
    operations: &mut Vec<Operation>,
    font: &str,
    size: i64,
    x: f64,
    top_mm: f64,
    text: &str,
) -> Result<(), ReportRenderError> {
    let y = PAGE_HEIGHT as f64 - mm(top_mm) - size as f64 * 0.3;
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new("Tf", vec![font.into(), size.into()]));
    operations.push(Operation::new(
        "Td",
        vec![(x.round() as i64).into(), (y.round() as i64).into()],
    ));
    operations.push(Operation::new(
        "Tj",
        vec![Object::String(encode_latin1(text)?, StringFormat::Literal)],
    ));
    operations.push(Operation::new("ET", vec![]));
    Ok(())
}

fn mm(value: f64) -> f64 {
    value * PT_PER_MM
}

/// Single-byte encoding shared by Latin-1 and WinAnsi for printable characters.
fn encode_latin1(text: &str) -> Result<Vec<u8>, ReportRenderError> {
    text.chars()
        .map(|ch| match ch as u32 {
            0x20..=0x7E | 0xA0..=0xFF => Ok(ch as u32 as u8),
            _ => Err(ReportRenderError::Unencodable {
                ch,
                text: text.to_string(),
            }),
        })
        .collect()
}

/// Plain-text rendition for terminals, same content as the PDF body.
pub fn summary_text(vector: &FeatureVector, result: &PredictionResult) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {REPORT_TITLE}");
    for line in report_lines(vector, result) {
        let _ = writeln!(output, "{line}");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::testing::stub_handle;
    use crate::models::{Label, RawInputs};
    use crate::validate::validate;

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    fn classify(label: Label, probability: f64) -> (FeatureVector, PredictionResult) {
        let vector = validate(&RawInputs::default()).unwrap();
        let result = stub_handle(label, probability).classify(&vector);
        (vector, result)
    }

    #[test]
    fn lines_follow_canonical_layout() {
        let (vector, result) = classify(Label::Diabetic, 0.83);
        let lines = report_lines(&vector, &result);

        assert_eq!(
            lines,
            vec![
                "Pregnancies: 1",
                "Glucose Level: 110",
                "Blood Pressure: 70",
                "Skin Thickness: 20",
                "Insulin: 80",
                "BMI: 25.0",
                "Diabetes Pedigree Function: 0.5",
                "Age: 30",
                "--------------------------",
                "Prediction: Diabetic",
                "Confidence: 83.00%",
            ]
        );
    }

    #[test]
    fn assembly_is_byte_identical_across_runs() {
        let (vector, result) = classify(Label::Diabetic, 0.83);
        let first = assemble(&vector, &result).unwrap();
        let second = assemble(&vector, &result).unwrap();

        assert_eq!(first.bytes, second.bytes);
        assert!(first.bytes.starts_with(b"%PDF-1.4"));
        assert_eq!(first.mime, "application/pdf");
        assert_eq!(first.filename, "prediction_summary.pdf");
    }

    #[test]
    fn page_content_matches_golden_layout() {
        let (vector, result) = classify(Label::Diabetic, 0.83);
        let document = assemble(&vector, &result).unwrap();

        let parsed = Document::load_mem(&document.bytes).unwrap();
        let pages = parsed.get_pages();
        assert_eq!(pages.len(), 1);
        let page_id = *pages.values().next().unwrap();
        let content = parsed.get_page_content(page_id).unwrap();

        assert_eq!(
            String::from_utf8_lossy(&content),
            include_str!("../demo/golden/diabetic_083_page.txt")
        );
    }

    #[test]
    fn document_carries_title_decision_and_confidence() {
        let (vector, result) = classify(Label::Healthy, 0.12);
        let document = assemble(&vector, &result).unwrap();

        assert!(contains(&document.bytes, REPORT_TITLE));
        assert!(contains(&document.bytes, "Prediction: Healthy"));
        assert!(contains(&document.bytes, "Confidence: 12.00%"));
        assert!(contains(&document.bytes, "Diabetes Pedigree Function: 0.5"));
    }

    #[test]
    fn unencodable_text_fails_without_output() {
        let err = render_pdf("Rapport \u{1F9EC}", &[]).unwrap_err();
        assert!(matches!(err, ReportRenderError::Unencodable { ch: '\u{1F9EC}', .. }));

        let err = encode_latin1("check\u{2011}ups").unwrap_err();
        assert!(matches!(err, ReportRenderError::Unencodable { ch: '\u{2011}', .. }));
        assert_eq!(encode_latin1("caf\u{e9}").unwrap(), b"caf\xe9".to_vec());
    }

    #[test]
    fn summary_text_matches_document_body() {
        let (vector, result) = classify(Label::Healthy, 0.12);
        let text = summary_text(&vector, &result);
        assert!(text.starts_with("# Diabetes Prediction Report\n"));
        assert!(text.contains("Prediction: Healthy\nConfidence: 12.00%\n"));
    }
}
