mod common;

use common::{CohortBuilder, high_risk_form, low_risk_form};
use heartnet::artifact::{ArtifactError, ModelPackage};
use heartnet::config::{ScoringMethod, TrainingConfig};
use heartnet::predict::reasons::NO_REASONS_MESSAGE;
use heartnet::predict::{FormData, PredictionResponse, Predictor};
use heartnet::prepare::data::load_training_data;
use heartnet::prepare::{ZERO_INVALID_FEATURES, clean_zero_measurements};
use heartnet::train::{train, train_and_save};
use heartnet::types::{Feature, TARGET_COLUMN};
use tempfile::tempdir;

fn trained_package() -> ModelPackage {
    let file = CohortBuilder::new(300).zero_measurements(12).write();
    let data = load_training_data(file.path()).expect("load cohort");
    train(&data, &TrainingConfig::default()).expect("train")
}

fn success(response: PredictionResponse) -> (f64, Vec<String>) {
    match response {
        PredictionResponse::Success {
            risk_percentage,
            reasons,
            ..
        } => (risk_percentage, reasons),
        PredictionResponse::Failure { message } => panic!("prediction failed: {message}"),
    }
}

#[test]
fn high_risk_patient_scores_above_low_risk_patient() {
    let predictor = Predictor::new(trained_package()).unwrap();

    let (high, high_reasons) = success(predictor.predict(&high_risk_form()));
    let (low, low_reasons) = success(predictor.predict(&low_risk_form()));

    assert!(high > low, "high-risk {high}% should exceed low-risk {low}%");
    assert!((0.0..=100.0).contains(&high) && (0.0..=100.0).contains(&low));

    for expected in [
        "Advanced age (65 years)",
        "High cholesterol (280 mg/dl)",
        "Chest pain type (ASY)",
        "Exercise-induced angina",
        "Flat ST slope",
    ] {
        assert!(
            high_reasons.iter().any(|r| r == expected),
            "missing reason '{expected}' in {high_reasons:?}"
        );
    }
    assert_eq!(low_reasons, vec![NO_REASONS_MESSAGE.to_string()]);
}

#[test]
fn every_column_becomes_a_node() {
    let package = trained_package();
    assert_eq!(package.network.n_nodes(), 12);
    assert!(package.network.node_index(TARGET_COLUMN).is_some());
    assert_eq!(package.all_features, Feature::canonical_order());
    package.validate().unwrap();
}

#[test]
fn training_and_inference_are_deterministic() {
    let first = trained_package();
    let second = trained_package();
    assert_eq!(first, second);

    let predictor = Predictor::new(first).unwrap();
    let form = high_risk_form();
    let a = predictor.assess(&form).unwrap();
    let b = predictor.assess(&form).unwrap();
    assert_eq!(a.probability.to_bits(), b.probability.to_bits());
}

#[test]
fn unseen_label_skips_only_that_feature() {
    let predictor = Predictor::new(trained_package()).unwrap();
    let mut form = high_risk_form();
    form.insert("ChestPainType", "XYZ");

    let assessment = predictor.assess(&form).unwrap();
    assert_eq!(assessment.evidence.skipped, vec![Feature::ChestPainType]);
    assert!(!assessment.evidence.encoded.contains_key("ChestPainType"));
    assert_eq!(assessment.evidence.encoded.len(), 10);
    assert!(assessment.reasons.iter().any(|r| r == "Chest pain type (XYZ)"));
    assert!(matches!(
        predictor.predict(&form),
        PredictionResponse::Success { .. }
    ));
}

#[test]
fn missing_or_malformed_fields_fail_the_request() {
    let predictor = Predictor::new(trained_package()).unwrap();

    let missing =
        FormData::from_pairs(low_risk_form().iter().filter(|(k, _)| *k != "Cholesterol"));
    match predictor.predict(&missing) {
        PredictionResponse::Failure { message } => {
            assert!(message.starts_with("An error occurred: "));
            assert!(message.contains("Cholesterol"));
            assert!(message.ends_with("Make sure every field is filled in."));
        }
        other => panic!("expected a failure, got {other:?}"),
    }

    let mut malformed = low_risk_form();
    malformed.insert("Age", "thirty");
    assert!(matches!(
        predictor.predict(&malformed),
        PredictionResponse::Failure { .. }
    ));
}

#[test]
fn artifact_round_trip_preserves_predictions() {
    let dir = tempdir().unwrap();
    let data_path = dir.path().join("heart.csv");
    let model_path = dir.path().join("model.toml");
    std::fs::write(&data_path, CohortBuilder::new(200).csv()).unwrap();

    let trained = train_and_save(&data_path, &TrainingConfig::default(), &model_path).unwrap();
    let loaded = ModelPackage::load(&model_path).unwrap();
    assert_eq!(loaded, trained);

    let before = Predictor::new(trained).unwrap().assess(&high_risk_form()).unwrap();
    let after = Predictor::load(&model_path).unwrap().assess(&high_risk_form()).unwrap();
    assert_eq!(before.probability.to_bits(), after.probability.to_bits());
}

#[test]
fn corrupt_artifact_is_rejected() {
    let dir = tempdir().unwrap();
    let model_path = dir.path().join("model.toml");
    std::fs::write(&model_path, "all_features = [\"Age\"]\n").unwrap();
    assert!(ModelPackage::load(&model_path).is_err());
    assert!(Predictor::load(dir.path().join("absent.toml")).is_err());
}

#[test]
fn artifact_with_a_missing_feature_is_rejected() {
    let dir = tempdir().unwrap();
    let model_path = dir.path().join("model.toml");
    let mut package = trained_package();
    package.all_features.retain(|&f| f != Feature::StSlope);
    package.save(&model_path).unwrap();
    assert!(matches!(
        ModelPackage::load(&model_path),
        Err(ArtifactError::Inconsistent(_))
    ));

    let mut duplicated = trained_package();
    duplicated.all_features.push(Feature::Age);
    assert!(duplicated.validate().is_err());
}

#[test]
fn loaded_zeros_are_cleaned_before_binning() {
    let file = CohortBuilder::new(60).zero_measurements(9).write();
    let data = load_training_data(file.path()).unwrap();
    for feature in ZERO_INVALID_FEATURES {
        assert_eq!(data.numeric[&feature].iter().filter(|&&v| v == 0.0).count(), 9);
    }

    let mut numeric = data.numeric.clone();
    let medians = clean_zero_measurements(&mut numeric).unwrap();
    for feature in ZERO_INVALID_FEATURES {
        assert!(numeric[&feature].iter().all(|&v| v != 0.0));
        assert!(medians[&feature] > 0.0);
    }
}

#[test]
fn alternative_scores_and_imbalanced_cohorts_train() {
    let file = CohortBuilder::new(150).prevalence(0.2).seed(11).write();
    let data = load_training_data(file.path()).unwrap();
    for scoring in [ScoringMethod::Bdeu, ScoringMethod::Bic] {
        let mut config = TrainingConfig::default();
        config.structure.scoring = scoring;
        config.structure.max_indegree = Some(2);
        let package = train(&data, &config).unwrap();
        for index in 0..package.network.n_nodes() {
            assert!(package.network.parent_indices(index).unwrap().len() <= 2);
        }
        let predictor = Predictor::new(package).unwrap();
        assert!(matches!(
            predictor.predict(&high_risk_form()),
            PredictionResponse::Success { .. }
        ));
    }
}
