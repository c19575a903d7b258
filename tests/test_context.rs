mod common;
use common::symbols;
use mep::{context_labels, last_was_error, ContextLabel, MepError, Outcome};

use Outcome::{Correct, Incorrect};

#[test]
fn error_after_symbol_one_spreads_forward() {
    let seq = symbols(&[1, 0, 0, 0, 0]);
    let outcomes = vec![Some(Correct), Some(Incorrect), Some(Correct), Some(Correct), Some(Correct)];
    let flags = last_was_error(&seq, &outcomes).unwrap();
    assert_eq!(flags, vec![false, true, true, true, false]);
}

#[test]
fn correct_response_overwrites_earlier_error() {
    let seq = symbols(&[1, 1, 0, 0, 0, 0]);
    let outcomes = vec![Some(Correct), Some(Incorrect), Some(Correct), Some(Correct), Some(Correct), Some(Correct)];
    // i = 1 writes true to 1..=3, i = 2 writes false to 2..=4.
    let flags = last_was_error(&seq, &outcomes).unwrap();
    assert_eq!(flags, vec![false, true, false, false, false, false]);
}

#[test]
fn missing_outcome_where_needed_is_error() {
    let seq = symbols(&[1, 0]);
    let err = last_was_error(&seq, &[Some(Correct), None]).unwrap_err();
    assert_eq!(err, MepError::MissingField { trial: 1, field: "outcome" });
}

#[test]
fn labels_within_one_block() {
    let seq = symbols(&[0, 0, 1, 0, 2, 0, 0]);
    let labels = context_labels(&[3; 7], &seq).unwrap();
    use ContextLabel::*;
    assert_eq!(
        labels,
        vec![None, None, Some(ZeroZero), Some(One), Some(OneZero), Some(Two), Some(TwoZero)]
    );
}

#[test]
fn labels_serialise_to_strings() {
    let s = serde_json::to_string(&[ContextLabel::ZeroZero, ContextLabel::Two]).unwrap();
    assert_eq!(s, r#"["00","2"]"#);
}
