mod common;
use mep::normalize::{normalize_by_mean, normalize_by_rest, reference_mean, rest_amplitude};
use mep::MepError;
use proptest::prelude::*;

#[test]
fn reference_mean_of_mixed_blocks() {
    let amps = vec![Some(100.0), Some(300.0), None, Some(200.0), Some(9000.0), Some(50.0)];
    let blocks = vec![1, 2, 2, 4, 4, 5];
    let mean = reference_mean(&amps, &blocks, &[2, 4, 6], 5000.0).unwrap();
    // 300 and 200 qualify; None and the above-ceiling value do not.
    approx::assert_abs_diff_eq!(mean, 250.0, epsilon = 1e-12);

    let out = normalize_by_mean(&amps, &blocks, &[2, 4, 6], 5000.0).unwrap();
    assert_eq!(out[2], None);
    approx::assert_abs_diff_eq!(out[0].unwrap(), 0.4, epsilon = 1e-12);
    approx::assert_abs_diff_eq!(out[5].unwrap(), 0.2, epsilon = 1e-12);
}

#[test]
fn reference_blocks_all_missing() {
    let amps = vec![Some(1.0), None, None];
    let err = normalize_by_mean(&amps, &[1, 2, 2], &[2], 5000.0).unwrap_err();
    assert!(matches!(err, MepError::EmptyReferenceSubset { .. }), "{err}");
    assert!(err.is_configuration());
}

#[test]
fn rest_normalisation() {
    let uv = rest_amplitude(&[4e-4, 6e-4], 1e6).unwrap();
    approx::assert_abs_diff_eq!(uv, 500.0, epsilon = 1e-9);

    let out = normalize_by_rest(&[Some(1000.0), None], 500.0).unwrap();
    assert_eq!(out, vec![Some(2.0), None]);
}

#[test]
fn no_rest_pulses_is_error() {
    assert!(matches!(rest_amplitude(&[], 1e6), Err(MepError::InvalidDivisor { .. })));
}

proptest! {
    #[test]
    fn normalised_reference_mean_is_one(
        amps in prop::collection::vec(1.0f64..4000.0, 4..40),
        flags in prop::collection::vec(any::<bool>(), 40),
    ) {
        // Every trial in block 2 or 3; keep at least one reference trial.
        let mut blocks: Vec<u32> = flags.iter().take(amps.len()).map(|&f| if f { 2 } else { 3 }).collect();
        blocks[0] = 2;
        let amps: Vec<Option<f64>> = amps.into_iter().map(Some).collect();

        let out = normalize_by_mean(&amps, &blocks, &[2], 5000.0).unwrap();
        let rel: Vec<f64> = out
            .iter()
            .zip(&blocks)
            .filter(|(_, b)| **b == 2)
            .map(|(v, _)| v.unwrap())
            .collect();
        let mean = rel.iter().sum::<f64>() / rel.len() as f64;
        prop_assert!((mean - 1.0).abs() < 1e-9, "mean = {mean}");
    }

    #[test]
    fn missing_stays_missing(
        amps in prop::collection::vec(prop::option::of(1.0f64..4000.0), 1..30),
    ) {
        let mut amps = amps;
        amps[0] = Some(10.0);
        let blocks = vec![4; amps.len()];
        let out = normalize_by_mean(&amps, &blocks, &[4], 5000.0).unwrap();
        for (a, o) in amps.iter().zip(&out) {
            prop_assert_eq!(a.is_none(), o.is_none());
        }
    }
}
