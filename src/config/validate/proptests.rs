//! Property-based tests for configuration validation

use super::error::ValidationError;
use super::tests::create_valid_spec;
use super::validator::validate_config;
use crate::config::schema::ReweightingSpec;
use proptest::prelude::*;

fn arb_valid_spec() -> impl Strategy<Value = ReweightingSpec> {
    (
        1usize..64,                            // batch_size
        1e-6f32..1.0,                          // lr
        1usize..100,                           // epoch_num
        prop::collection::vec(any::<u64>(), 1..8), // seeds
        1usize..8,                             // demonstration_shot
        proptest::option::of(1usize..32),      // n_head
    )
        .prop_map(|(batch_size, lr, epoch_num, seeds, demonstration_shot, n_head)| ReweightingSpec {
            batch_size,
            lr,
            epoch_num,
            seeds,
            demonstration_shot,
            n_head,
            ..create_valid_spec()
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_valid_spec_passes(spec in arb_valid_spec()) {
        prop_assert!(validate_config(&spec).is_ok());
        prop_assert!(spec.validate().is_ok());
    }

    #[test]
    fn prop_zero_epochs_fails(spec in arb_valid_spec()) {
        let mut spec = spec;
        spec.epoch_num = 0;
        prop_assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidEpochs(0))));
    }

    #[test]
    fn prop_zero_batch_size_fails(spec in arb_valid_spec()) {
        let mut spec = spec;
        spec.batch_size = 0;
        prop_assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidBatchSize(0))));
    }

    #[test]
    fn prop_non_positive_lr_fails(spec in arb_valid_spec(), lr in -1.0f32..=0.0) {
        let mut spec = spec;
        spec.lr = lr;
        prop_assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidLearningRate(_))));
    }

    #[test]
    fn prop_lr_above_one_fails(spec in arb_valid_spec(), lr in 1.0001f32..100.0) {
        let mut spec = spec;
        spec.lr = lr;
        prop_assert!(matches!(validate_config(&spec), Err(ValidationError::InvalidLearningRate(_))));
    }

    #[test]
    fn prop_yaml_round_trip(spec in arb_valid_spec()) {
        let yaml = serde_yaml::to_string(&spec).unwrap();
        let parsed: ReweightingSpec = serde_yaml::from_str(&yaml).unwrap();
        prop_assert_eq!(parsed, spec);
    }
}
