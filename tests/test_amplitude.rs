mod common;
use common::{session, BURST, FIRST_TRIAL};
use mep::amplitude::{measure_channel, values};
use mep::{extract_window, peak_to_peak, rms, Channel, MepError, PulseRef, WindowSpec};
use ndarray::Array1;
use proptest::prelude::*;

#[test]
fn default_protocol_window_at_3khz() {
    let cfg = mep::PipelineConfig::default();
    let x = Array1::<f64>::zeros(6000);
    let w = extract_window(x.view(), 3000, cfg.samples_before(3000.0), cfg.samples_after(3000.0)).unwrap();
    assert_eq!(w.len(), 210);
    assert_eq!(cfg.delay_samples(3000.0), 30);
}

#[test]
fn burst_measured_on_both_channels() {
    let s = session(&[0, 1], &[0, 1], &[true, true]);
    let spec = WindowSpec { before: 10, after: 60, before_rms: 500 };

    let fdi = measure_channel(s.rec.channel(Channel::Fdi), &s.triggers, &spec, 10).unwrap();
    let fds = measure_channel(s.rec.channel(Channel::Fds), &s.triggers, &spec, 10).unwrap();
    for v in values(&fdi) {
        approx::assert_abs_diff_eq!(v.unwrap(), 2.0 * BURST, epsilon = 1e-12);
    }
    for v in values(&fds) {
        approx::assert_abs_diff_eq!(v.unwrap(), BURST, epsilon = 1e-12);
    }
    assert!(fdi.iter().all(|a| a.rms_precursor == 0.0));
}

#[test]
fn trigger_near_edge_fails_with_index() {
    let s = session(&[0], &[0], &[true]);
    let spec = WindowSpec { before: 10, after: 60, before_rms: 500 };
    let n = s.rec.n_samples();
    let triggers = [FIRST_TRIAL, n - 20];
    let err = measure_channel(s.rec.channel(Channel::Fdi), &triggers, &spec, 10).unwrap_err();
    assert!(matches!(err, MepError::WindowOutOfBounds { pulse: Some(PulseRef::Trial(1)), .. }), "{err}");
    assert!(err.to_string().starts_with("trial 1: "), "{err}");
}

#[test]
fn delay_covering_window_rejected() {
    let s = session(&[0], &[0], &[true]);
    let spec = WindowSpec { before: 10, after: 60, before_rms: 500 };
    let err = measure_channel(s.rec.channel(Channel::Fdi), &s.triggers, &spec, 70).unwrap_err();
    assert_eq!(err, MepError::DelayExceedsWindow { delay: 70, len: 70 });
}

proptest! {
    #[test]
    fn window_has_before_plus_after_samples(
        n in 50usize..400,
        before in 0usize..20,
        after in 0usize..20,
        trigger in 0usize..400,
    ) {
        let x = Array1::from_shape_fn(n, |i| i as f64);
        match extract_window(x.view(), trigger, before, after) {
            Ok(w) => {
                prop_assert_eq!(w.len(), before + after);
                prop_assert!(trigger >= before && trigger + after <= n);
            }
            Err(MepError::WindowOutOfBounds { .. }) => {
                prop_assert!(trigger < before || trigger + after > n);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    #[test]
    fn p2p_non_negative_and_shift_invariant(
        xs in prop::collection::vec(-1.0f64..1.0, 2..200),
        shift in -10.0f64..10.0,
        delay in 0usize..2,
    ) {
        let a = Array1::from(xs);
        let b = a.mapv(|v| v + shift);
        let pa = peak_to_peak(a.view(), delay).unwrap();
        let pb = peak_to_peak(b.view(), delay).unwrap();
        prop_assert!(pa >= 0.0);
        prop_assert!((pa - pb).abs() < 1e-9);
    }

    #[test]
    fn rms_zero_only_for_zero_window(xs in prop::collection::vec(-1.0f64..1.0, 1..200)) {
        let a = Array1::from(xs);
        let r = rms(a.view());
        prop_assert!(r >= 0.0);
        prop_assert_eq!(r == 0.0, a.iter().all(|&v| v == 0.0));
    }
}
