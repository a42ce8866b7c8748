//! Unit tests for the init-state lattice.

use pretty_assertions::assert_eq;

use super::builtin::InitFunc;
use super::state::{InitArg, InitCall, InitCallData, InitMask, InitState};

fn call(func: InitFunc, args: &[(Option<u32>, Option<i64>)]) -> InitCall {
    InitCall::Call(InitCallData {
        func,
        args: args
            .iter()
            .map(|&(param, value)| InitArg {
                param,
                value,
                code: String::new(),
            })
            .collect(),
    })
}

#[test]
fn none_is_neutral() {
    let c = call(InitFunc::Add, &[]);
    assert!(matches!(InitCall::None.combine(&c), InitCall::Call(_)));
    assert!(matches!(c.combine(&InitCall::None), InitCall::Call(_)));
    assert!(InitCall::None.combine(&InitCall::None).is_none());
}

#[test]
fn undef_absorbs() {
    let c = call(InitFunc::Add, &[]);
    assert!(c.combine(&InitCall::Undef).is_undef());
    assert!(InitCall::Undef.combine(&c).is_undef());
    assert!(InitCall::Undef.combine(&InitCall::None).is_undef());
}

#[test]
fn equal_concrete_calls_survive() {
    let a = call(InitFunc::UnpackBinary, &[(Some(0), None), (Some(1), None)]);
    let b = call(InitFunc::UnpackBinary, &[(Some(0), None), (Some(1), None)]);
    assert!(matches!(a.combine(&b), InitCall::Call(_)));
}

#[test]
fn different_functions_collide() {
    let a = call(InitFunc::Add, &[]);
    let b = call(InitFunc::Sub, &[]);
    assert!(a.combine(&b).is_undef());
}

#[test]
fn arguments_compare_by_param_slot_then_value() {
    // same slot: equal
    let a = call(InitFunc::Pack, &[(Some(1), None)]);
    let b = call(InitFunc::Pack, &[(Some(1), None)]);
    assert!(matches!(a.combine(&b), InitCall::Call(_)));
    // different slots: collide
    let c = call(InitFunc::Pack, &[(Some(2), None)]);
    assert!(a.combine(&c).is_undef());
    // value only: compare values
    let d = call(InitFunc::Pack, &[(None, Some(4))]);
    let e = call(InitFunc::Pack, &[(None, Some(4))]);
    let f = call(InitFunc::Pack, &[(None, Some(5))]);
    assert!(matches!(d.combine(&e), InitCall::Call(_)));
    assert!(d.combine(&f).is_undef());
    // both unresolved: never equal
    let g = call(InitFunc::Pack, &[(None, None)]);
    let h = call(InitFunc::Pack, &[(None, None)]);
    assert!(g.combine(&h).is_undef());
}

#[test]
fn undef_arguments_demote_on_propagation() {
    let mut state = InitState::default();
    state.set(0, call(InitFunc::UnpackBinary, &[(None, None)]));
    state.set(1, call(InitFunc::Add, &[]));
    state.demote_undef_args();
    assert!(state.at(0).is_undef());
    assert!(matches!(state.at(1), InitCall::Call(_)));
}

#[test]
fn state_combines_pointwise() {
    let mut a = InitState::default();
    a.set(1, call(InitFunc::Add, &[]));
    let mut b = InitState::default();
    b.set(2, call(InitFunc::Pack, &[(Some(0), None)]));
    a.combine(&b);
    assert!(matches!(a.at(1), InitCall::Call(_)));
    assert!(matches!(a.at(2), InitCall::Call(_)));
    assert!(a.at(0).is_none());
}

#[test]
fn masks_start_full_and_empty_out() {
    let mut mask = InitMask::default();
    assert!(!mask.is_empty());
    for group in 0..4 {
        mask.set(group, false);
    }
    assert!(mask.is_empty());
}

#[test]
fn display_renders_call_shapes() {
    let c = InitCall::Call(InitCallData {
        func: InitFunc::UnpackBinary,
        args: vec![
            InitArg {
                param: Some(0),
                value: None,
                code: "px".into(),
            },
            InitArg {
                param: Some(1),
                value: None,
                code: "py".into(),
            },
        ],
    });
    assert_eq!(c.to_string(), "unpack_binary(px, py)");
    assert_eq!(InitCall::None.to_string(), "[none]");
    assert_eq!(InitCall::Undef.to_string(), "[undef]");
}
