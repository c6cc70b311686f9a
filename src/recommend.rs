use crate::models::{GuidanceCategory, GuidanceGroup, Label, RecommendationPayload};

pub fn recommend(label: Label) -> RecommendationPayload {
    match label {
        Label::Diabetic => RecommendationPayload {
            label,
            headline: "The person is likely Diabetic.",
            banner: "You are at risk of diabetes. Please consult a healthcare professional.",
            groups: groups([
                "Rich in vegetables, whole grains, lean proteins",
                "At least 30 min moderate activity most days",
                "Check blood glucose regularly",
                "Schedule regular check-ups",
            ]),
        },
        Label::Healthy => RecommendationPayload {
            label,
            headline: "The person is likely Healthy.",
            banner: "You are likely healthy!",
            groups: groups([
                "Maintain a balanced diet",
                "Continue regular activity",
                "Track key health metrics",
                "Keep up routine check-ups",
            ]),
        },
    }
}

fn groups(bullets: [&'static str; 4]) -> Vec<GuidanceGroup> {
    [
        GuidanceCategory::Diet,
        GuidanceCategory::Exercise,
        GuidanceCategory::Monitoring,
        GuidanceCategory::Consultation,
    ]
    .into_iter()
    .zip(bullets)
    .map(|(category, bullet)| GuidanceGroup {
        category,
        bullets: vec![bullet],
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_payloads_populate_every_category() {
        for label in [Label::Diabetic, Label::Healthy] {
            let payload = recommend(label);
            let categories: Vec<GuidanceCategory> =
                payload.groups.iter().map(|group| group.category).collect();

            assert_eq!(
                categories,
                vec![
                    GuidanceCategory::Diet,
                    GuidanceCategory::Exercise,
                    GuidanceCategory::Monitoring,
                    GuidanceCategory::Consultation,
                ]
            );
            assert!(payload
                .groups
                .iter()
                .all(|group| group.bullets.iter().any(|bullet| !bullet.is_empty())));
            assert!(!payload.headline.is_empty());
            assert!(!payload.banner.is_empty());
        }
    }

    #[test]
    fn payload_depends_only_on_label() {
        assert_eq!(recommend(Label::Healthy), recommend(Label::Healthy));
        assert_ne!(recommend(Label::Healthy), recommend(Label::Diabetic));
        assert!(recommend(Label::Diabetic).banner.contains("healthcare professional"));
    }
}
