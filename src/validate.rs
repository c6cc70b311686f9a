use crate::error::{ValidationError, ValidationReason};
use crate::models::{Feature, FeatureVector, RawInputs, FEATURE_COUNT};

const PRECISION_TOLERANCE: f64 = 1e-6;

/// Checks every field in canonical order and reports the first offender.
pub fn validate(raw: &RawInputs) -> Result<FeatureVector, ValidationError> {
    let mut values = [0.0; FEATURE_COUNT];

    for feature in Feature::ALL {
        let value = raw.get(feature);
        check_field(feature, value)?;
        values[feature.index()] = value;
    }

    Ok(FeatureVector::from_validated(values))
}

fn check_field(feature: Feature, value: f64) -> Result<(), ValidationError> {
    let (min, max) = feature.range();
    let reject = |reason| ValidationError {
        field: feature,
        value,
        allowed_range: min..=max,
        reason,
    };

    if !value.is_finite() {
        return Err(reject(ValidationReason::NotFinite));
    }
    if value < min || value > max {
        return Err(reject(ValidationReason::OutOfRange));
    }

    let decimals = feature.max_decimals();
    if decimals == 0 {
        if value.fract() != 0.0 {
            return Err(reject(ValidationReason::NotIntegral));
        }
    } else if !fits_precision(value, decimals) {
        return Err(reject(ValidationReason::TooPrecise { decimals }));
    }

    Ok(())
}

fn fits_precision(value: f64, decimals: u32) -> bool {
    let scaled = value * 10f64.powi(decimals as i32);
    (scaled - scaled.round()).abs() <= PRECISION_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(feature: Feature, value: f64) -> RawInputs {
        let mut raw = RawInputs::default();
        match feature {
            Feature::Pregnancies => raw.pregnancies = value,
            Feature::Glucose => raw.glucose = value,
            Feature::BloodPressure => raw.blood_pressure = value,
            Feature::SkinThickness => raw.skin_thickness = value,
            Feature::Insulin => raw.insulin = value,
            Feature::Bmi => raw.bmi = value,
            Feature::DiabetesPedigreeFunction => raw.diabetes_pedigree_function = value,
            Feature::Age => raw.age = value,
        }
        raw
    }

    #[test]
    fn accepts_default_inputs_in_order() {
        let vector = validate(&RawInputs::default()).unwrap();
        assert_eq!(
            vector.as_array(),
            &[1.0, 110.0, 70.0, 20.0, 80.0, 25.0, 0.5, 30.0]
        );
    }

    #[test]
    fn rejects_out_of_range_values_naming_the_field() {
        let cases = [
            (Feature::Glucose, 201.0),
            (Feature::Age, 0.0),
            (Feature::Bmi, -1.0),
            (Feature::Pregnancies, 21.0),
        ];

        for (feature, value) in cases {
            let err = validate(&with(feature, value)).unwrap_err();
            assert_eq!(err.field, feature);
            assert_eq!(err.value, value);
            assert_eq!(err.reason, ValidationReason::OutOfRange);
            assert!(err.to_string().contains(feature.key()));
        }
    }

    #[test]
    fn accepts_upper_boundaries() {
        let raw = RawInputs {
            pregnancies: 0.0,
            glucose: 200.0,
            blood_pressure: 200.0,
            skin_thickness: 100.0,
            insulin: 900.0,
            bmi: 70.0,
            diabetes_pedigree_function: 3.0,
            age: 120.0,
        };

        let vector = validate(&raw).unwrap();
        assert_eq!(vector.get(Feature::Insulin), 900.0);
        assert_eq!(vector.get(Feature::Age), 120.0);
    }

    #[test]
    fn reports_declared_range() {
        let err = validate(&with(Feature::Insulin, 901.0)).unwrap_err();
        assert_eq!(err.allowed_range, 0.0..=900.0);
    }

    #[test]
    fn integer_fields_reject_fractions() {
        let err = validate(&with(Feature::Age, 30.5)).unwrap_err();
        assert_eq!(err.field, Feature::Age);
        assert_eq!(err.reason, ValidationReason::NotIntegral);
    }

    #[test]
    fn float_fields_accept_up_to_three_decimals() {
        for bmi in [33.6, 33.65, 25.25, 33.651] {
            let vector = validate(&with(Feature::Bmi, bmi)).unwrap();
            assert_eq!(vector.get(Feature::Bmi), bmi);
        }
        assert!(validate(&with(Feature::DiabetesPedigreeFunction, 0.627)).is_ok());

        let err = validate(&with(Feature::Bmi, 33.6512)).unwrap_err();
        assert_eq!(err.field, Feature::Bmi);
        assert_eq!(err.reason, ValidationReason::TooPrecise { decimals: 3 });

        let err = validate(&with(Feature::DiabetesPedigreeFunction, 0.6275)).unwrap_err();
        assert_eq!(err.reason, ValidationReason::TooPrecise { decimals: 3 });
    }

    #[test]
    fn finer_bmi_keeps_its_printed_form() {
        let vector = validate(&with(Feature::Bmi, 33.65)).unwrap();
        assert_eq!(vector.display_value(Feature::Bmi), "33.65");
        assert_eq!(validate(&RawInputs::default()).unwrap().display_value(Feature::Bmi), "25.0");
    }

    #[test]
    fn rejects_non_finite_values() {
        let err = validate(&with(Feature::Glucose, f64::NAN)).unwrap_err();
        assert_eq!(err.reason, ValidationReason::NotFinite);

        let err = validate(&with(Feature::Bmi, f64::INFINITY)).unwrap_err();
        assert_eq!(err.reason, ValidationReason::NotFinite);
    }

    #[test]
    fn first_invalid_field_wins() {
        let mut raw = with(Feature::Glucose, 500.0);
        raw.age = 0.0;
        let err = validate(&raw).unwrap_err();
        assert_eq!(err.field, Feature::Glucose);
    }
}
