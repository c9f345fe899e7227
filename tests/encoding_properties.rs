use proptest::prelude::*;
use target_encoding::artifact::{read_artifact, write_artifact, MemoryStore};
use target_encoding::config::TargetEncoderConfig;
use target_encoding::dataset::{Frame, Row, TableSource, Value};
use target_encoding::encoding::blending::encoding_value;
use target_encoding::encoding::{
    FittedTargetEncoder, LeakageStrategy, Stat, TargetEncoder, TransformOptions,
};
use target_encoding::scorer::Scorer;
use target_encoding::traits::{FittedTransformer, Transformer};

const LEVELS: [&str; 4] = ["a", "b", "c", "d"];

/// (level index or 4 for missing, response 0/1, fold 0..3)
fn build_frame(rows: &[(usize, u8, u8)]) -> Frame {
    let labels: Vec<Option<&str>> = rows.iter().map(|(c, _, _)| LEVELS.get(*c).copied()).collect();
    Frame::new()
        .with_categorical("cat", &labels)
        .unwrap()
        .with_numeric("y", rows.iter().map(|(_, y, _)| f64::from(*y)).collect())
        .unwrap()
        .with_numeric("fold", rows.iter().map(|(_, _, f)| f64::from(*f)).collect())
        .unwrap()
}

fn config() -> TargetEncoderConfig {
    TargetEncoderConfig::new("y")
        .with_fold_column("fold")
        .with_encoded_columns(&["cat"])
        .with_noise_level(0.0)
}

fn rows_strategy() -> impl Strategy<Value = Vec<(usize, u8, u8)>> {
    prop::collection::vec((0usize..5, 0u8..2, 0u8..3), 1..80)
}

fn training_encoding(fitted: &FittedTargetEncoder, frame: &Frame) -> Vec<f64> {
    let encoded = fitted.transform_training(frame, &TransformOptions::new()).unwrap();
    assert_eq!(encoded.n_rows(), frame.n_rows());
    encoded.numeric_values("cat_te").unwrap().to_vec()
}

const FOLDS: [&str; 3] = ["f0", "f1", "f2"];

/// Same rows with a categorical fold column and a yes/no response.
fn build_labelled_frame(rows: &[(usize, u8, u8)]) -> Frame {
    let cats: Vec<Option<&str>> = rows.iter().map(|(c, _, _)| LEVELS.get(*c).copied()).collect();
    let responses: Vec<Option<&str>> = rows
        .iter()
        .map(|(_, y, _)| Some(if *y == 1 { "yes" } else { "no" }))
        .collect();
    let folds: Vec<Option<&str>> = rows.iter().map(|(_, _, f)| Some(FOLDS[*f as usize])).collect();
    Frame::new()
        .with_categorical("cat", &cats)
        .unwrap()
        .with_categorical("y", &responses)
        .unwrap()
        .with_categorical("fold", &folds)
        .unwrap()
}

fn labelled_config(strategy: LeakageStrategy) -> TargetEncoderConfig {
    config()
        .with_positive_class("yes")
        .with_data_leakage_handling(strategy)
}

fn sections(frame: &Frame, config: TargetEncoderConfig) -> MemoryStore {
    let fitted = TargetEncoder::new(config).fit(frame).unwrap();
    let mut store = MemoryStore::new();
    write_artifact(&fitted.into_artifact(), &mut store).unwrap();
    store
}

#[test]
fn artifact_is_byte_identical_across_runs() {
    let rows: Vec<(usize, u8, u8)> = (0..5000).map(|i| (i % 5, (i % 3 == 0) as u8, (i % 3) as u8)).collect();
    let frame = build_frame(&rows);
    for strategy in [LeakageStrategy::None, LeakageStrategy::KFold, LeakageStrategy::LeaveOneOut] {
        let config = config().with_data_leakage_handling(strategy).with_blending(true);
        assert_eq!(sections(&frame, config.clone()), sections(&frame, config));
    }
}

#[test]
fn default_and_explicit_blending_parameters_serialize_identically() {
    let frame = build_frame(&[(0, 1, 0), (1, 0, 1), (0, 0, 2)]);
    let implicit = config().with_blending(true);
    let explicit = config()
        .with_blending(true)
        .with_inflection_point(20.0)
        .with_smoothing(10.0);
    assert_eq!(sections(&frame, implicit), sections(&frame, explicit));
}

#[test]
fn titanic_like_scenario() {
    // A: 80 rows, 40 positive; B: 20 rows, 5 positive
    let mut rows = Vec::new();
    rows.extend((0..80).map(|i| (0usize, (i < 40) as u8, 0u8)));
    rows.extend((0..20).map(|i| (1usize, (i < 5) as u8, 0u8)));
    let frame = build_frame(&rows);
    let fitted = TargetEncoder::new(
        config()
            .with_blending(true)
            .with_inflection_point(5.0)
            .with_smoothing(1.0),
    )
    .fit(&frame)
    .unwrap();
    let artifact = fitted.artifact();
    assert!((artifact.prior_mean - 0.45).abs() < 1e-12);
    let a = artifact.encode("cat", &Value::from("a")).unwrap();
    let b = artifact.encode("cat", &Value::from("b")).unwrap();
    assert!((a - 0.5).abs() < 1e-5);
    assert!((b - 0.25).abs() < 1e-5);
}

#[test]
fn kfold_transform_requires_fold_column_in_frame() {
    let frame = build_frame(&[(0, 1, 0), (0, 0, 1), (1, 1, 0)]);
    let fitted = TargetEncoder::new(config().with_data_leakage_handling(LeakageStrategy::KFold))
        .fit(&frame)
        .unwrap();
    let without_fold = Frame::new()
        .with_categorical("cat", &[Some("a")])
        .unwrap();
    assert!(fitted
        .transform_training(&without_fold, &TransformOptions::new())
        .is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn persisted_artifact_reproduces_training_encodings(rows in rows_strategy(), blending in any::<bool>()) {
        let frame = build_frame(&rows);
        let fitted = TargetEncoder::new(config().with_blending(blending)).fit(&frame).unwrap();
        let trained = fitted.transform(&frame).unwrap();
        let trained = trained.numeric_values("cat_te").unwrap();

        let mut store = MemoryStore::new();
        write_artifact(fitted.artifact(), &mut store).unwrap();
        let scorer = Scorer::new(read_artifact(&store).unwrap());
        for (i, expected) in trained.iter().enumerate() {
            let mut row = Row::new();
            row.insert("cat".to_string(), frame.row(i)["cat"].clone());
            let scored = scorer.encode_row(&row)[0];
            prop_assert!((scored - expected).abs() < 1e-5);
        }
    }

    #[test]
    fn kfold_encoding_equals_fit_without_the_fold(rows in rows_strategy(), blending in any::<bool>()) {
        let frame = build_frame(&rows);
        let fitted = TargetEncoder::new(config().with_blending(blending).with_data_leakage_handling(LeakageStrategy::KFold))
            .fit(&frame)
            .unwrap();
        let encoded = fitted.transform_training(&frame, &TransformOptions::new()).unwrap();
        let encoded = encoded.numeric_values("cat_te").unwrap();
        let prior = fitted.prior_mean();
        let blend_params = fitted.artifact().blending_params().copied();

        for fold in 0u8..3 {
            let others: Vec<(usize, u8, u8)> = rows.iter().copied().filter(|r| r.2 != fold).collect();
            // per-category statistics of the other folds, blended toward the full-table prior
            let mut stats = [Stat::default(); 5];
            for (c, y, _) in &others {
                stats[*c].observe(f64::from(*y));
            }
            for (i, row) in rows.iter().enumerate().filter(|(_, r)| r.2 == fold) {
                let expected = encoding_value(Some(stats[row.0]), prior, blend_params.as_ref());
                prop_assert!((encoded[i] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn leave_one_out_excludes_only_the_row(rows in rows_strategy()) {
        let frame = build_frame(&rows);
        let fitted = TargetEncoder::new(config().with_data_leakage_handling(LeakageStrategy::LeaveOneOut))
            .fit(&frame)
            .unwrap();
        let encoded = training_encoding(&fitted, &frame);
        let prior = fitted.prior_mean();

        for (i, row) in rows.iter().enumerate() {
            let mut stat = Stat::default();
            for (j, other) in rows.iter().enumerate() {
                if j != i && other.0 == row.0 {
                    stat.observe(f64::from(other.1));
                }
            }
            match stat.posterior_mean() {
                Some(mean) => prop_assert!((encoded[i] - mean).abs() < 1e-12),
                None => prop_assert_eq!(encoded[i], prior),
            }
        }
    }

    #[test]
    fn noise_is_seeded_and_bounded(rows in rows_strategy(), seed in any::<u64>(), level in 0.001f64..0.5) {
        let frame = build_frame(&rows);
        let fitted = TargetEncoder::new(config()).fit(&frame).unwrap();
        let options = TransformOptions::new().with_noise_level(level).with_seed(seed);
        let first = fitted.transform_training(&frame, &options).unwrap();
        let second = fitted.transform_training(&frame, &options).unwrap();
        prop_assert_eq!(first.numeric_values("cat_te"), second.numeric_values("cat_te"));

        let clean = fitted.transform(&frame).unwrap();
        let clean = clean.numeric_values("cat_te").unwrap();
        for (noisy, exact) in first.numeric_values("cat_te").unwrap().iter().zip(clean) {
            prop_assert!((noisy - exact).abs() <= level + 1e-12);
        }
    }

    #[test]
    fn training_encoding_does_not_depend_on_the_other_rows(
        rows in rows_strategy(),
        keep in prop::collection::vec(any::<bool>(), 80),
        kfold in any::<bool>(),
    ) {
        let strategy = if kfold { LeakageStrategy::KFold } else { LeakageStrategy::LeaveOneOut };
        let frame = build_labelled_frame(&rows);
        let fitted = TargetEncoder::new(labelled_config(strategy)).fit(&frame).unwrap();
        let full = training_encoding(&fitted, &frame);

        let kept: Vec<usize> = (0..rows.len()).filter(|&i| keep[i]).collect();
        prop_assume!(!kept.is_empty());
        let subset_rows: Vec<(usize, u8, u8)> = kept.iter().map(|&i| rows[i]).collect();
        let subset = training_encoding(&fitted, &build_labelled_frame(&subset_rows));
        for (position, &i) in kept.iter().enumerate() {
            prop_assert_eq!(subset[position], full[i]);
        }

        let reversed_rows: Vec<(usize, u8, u8)> = rows.iter().rev().copied().collect();
        let reversed = training_encoding(&fitted, &build_labelled_frame(&reversed_rows));
        for (position, value) in reversed.iter().enumerate() {
            prop_assert_eq!(*value, full[rows.len() - 1 - position]);
        }
    }
}
