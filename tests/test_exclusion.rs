use mep::exclusion::{exclude_by_rms, exclude_iqr, exclude_outside, iqr_bounds, rms_threshold};
use mep::{AmplitudeSample, ExclusionPolicy};
use proptest::prelude::*;

fn with_rms(rms: &[f64]) -> Vec<AmplitudeSample> {
    rms.iter().map(|&r| AmplitudeSample::new(1.0, r)).collect()
}

fn with_p2p(p2p: &[f64]) -> Vec<AmplitudeSample> {
    p2p.iter().map(|&p| AmplitudeSample::new(p, 0.0)).collect()
}

fn marks(s: &[AmplitudeSample]) -> Vec<bool> {
    s.iter().map(|a| a.valid).collect()
}

#[test]
fn one_noisy_trial_of_ten() {
    let mut rms = vec![1.0; 9];
    rms.push(50.0);
    let out = ExclusionPolicy::Rms { k: 2.0 }.apply(&with_rms(&rms), &[2; 10]).unwrap();
    let mut expected = vec![true; 9];
    expected.push(false);
    assert_eq!(marks(&out), expected);
}

#[test]
fn iqr_outlier_in_reference_block_only() {
    let p2p = [10.0, 11.0, 12.0, 13.0, 100.0, 100.0];
    let blocks = [2, 2, 2, 2, 2, 3];
    let out = ExclusionPolicy::Iqr { reference_blocks: vec![2] }
        .apply(&with_p2p(&p2p), &blocks)
        .unwrap();
    assert_eq!(marks(&out), vec![true, true, true, true, false, true]);
}

#[test]
fn iqr_with_three_reference_samples_keeps_all() {
    let p2p = [1.0, 2.0, 1000.0];
    let out = exclude_iqr(&with_p2p(&p2p), &[4, 4, 4], &[4]).unwrap();
    assert!(out.iter().all(|a| a.valid));
    assert!(iqr_bounds(&p2p).is_unbounded());
}

#[test]
fn input_not_modified() {
    let s = with_rms(&[1.0, 1.0, 1.0, 100.0]);
    let before = s.clone();
    let _ = ExclusionPolicy::Rms { k: 0.5 }.apply(&s, &[1; 4]).unwrap();
    assert_eq!(s, before);
}

proptest! {
    #[test]
    fn rms_exclusion_idempotent_for_fixed_threshold(
        rms in prop::collection::vec(0.0f64..10.0, 1..50),
        k in 0.0f64..3.0,
    ) {
        let s = with_rms(&rms);
        let t = rms_threshold(&s, k).unwrap();
        let once = exclude_by_rms(&s, t);
        let twice = exclude_by_rms(&once, t);
        prop_assert_eq!(marks(&once), marks(&twice));
        for (a, r) in once.iter().zip(&rms) {
            prop_assert_eq!(a.valid, *r <= t);
        }
    }

    #[test]
    fn iqr_idempotent_for_fixed_bounds(
        p2p in prop::collection::vec(0.0f64..100.0, 4..50),
    ) {
        let s = with_p2p(&p2p);
        let blocks = vec![6; p2p.len()];
        let bounds = iqr_bounds(&p2p);
        let once = exclude_outside(&s, &blocks, &[6], bounds).unwrap();
        let twice = exclude_outside(&once, &blocks, &[6], bounds).unwrap();
        prop_assert_eq!(marks(&once), marks(&twice));
    }

    #[test]
    fn exclusion_never_revalidates(
        rms in prop::collection::vec(0.0f64..10.0, 1..30),
        dropped in prop::collection::vec(any::<bool>(), 30),
    ) {
        let s: Vec<AmplitudeSample> = with_rms(&rms)
            .into_iter()
            .zip(&dropped)
            .map(|(a, &d)| if d { a.invalidated() } else { a })
            .collect();
        let out = ExclusionPolicy::Rms { k: 1.0 }.apply(&s, &vec![2; s.len()]).unwrap();
        for (a, b) in s.iter().zip(&out) {
            prop_assert!(a.valid || !b.valid);
        }
    }
}
