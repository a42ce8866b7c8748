//! Unit tests for the kernel parameter query.

use pretty_assertions::assert_eq;

use crate::query::{DataType, kernel_params};
use crate::tooling::unit::SourceUnit;
use crate::tooling::Semantics;
use crate::Error;

fn params_of(src: &str) -> Vec<(String, DataType)> {
    let unit = SourceUnit::parse(src).unwrap();
    let sem = Semantics::build(&unit);
    kernel_params(&unit, &sem)
        .unwrap()
        .into_iter()
        .map(|p| (p.name, p.ty))
        .collect()
}

#[test]
fn all_parameter_types_parse() {
    let params = params_of(
        "void kernel(int32 a, uint32 b, float c, global<T> g, local<T> l, pipe<T> p, semaphore s) { }",
    );
    assert_eq!(
        params,
        vec![
            ("a".to_string(), DataType::Int32),
            ("b".to_string(), DataType::Uint32),
            ("c".to_string(), DataType::Float),
            ("g".to_string(), DataType::Global),
            ("l".to_string(), DataType::Local),
            ("p".to_string(), DataType::Pipe),
            ("s".to_string(), DataType::Semaphore),
        ]
    );
}

#[test]
fn defines_resolve_scalar_parameter_types() {
    let params = params_of("#define IDX uint32\nvoid kernel(IDX i) { }");
    assert_eq!(params, vec![("i".to_string(), DataType::Uint32)]);
}

#[test]
fn unknown_types_are_rejected() {
    let unit = SourceUnit::parse("void kernel(double x) { }").unwrap();
    let sem = Semantics::build(&unit);
    match kernel_params(&unit, &sem) {
        Err(Error::Input(msg)) => {
            assert_eq!(msg, "Invalid kernel parameter type: double");
        }
        other => panic!("expected input error, got {other:?}"),
    }
}

#[test]
fn missing_kernel_is_an_input_error() {
    let unit = SourceUnit::parse("void other() { }").unwrap();
    let sem = Semantics::build(&unit);
    match kernel_params(&unit, &sem) {
        Err(Error::Input(msg)) => assert_eq!(msg, "Missing main function"),
        other => panic!("expected input error, got {other:?}"),
    }
}

#[test]
fn parameterless_kernels_are_fine() {
    assert!(params_of("void kernel() { }").is_empty());
}
