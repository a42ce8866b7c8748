//! Unit tests for dialect type parsing and scoped resolution.

use pretty_assertions::assert_eq;

use super::types::{DataKind, DialectType, Distrib};
use super::unit::SourceUnit;
use super::Semantics;

fn setup(src: &str) -> (SourceUnit, Semantics) {
    let unit = SourceUnit::parse(src).unwrap();
    let sem = Semantics::build(&unit);
    (unit, sem)
}

fn resolve_in_body<'a>(src: &str, sem: &'a Semantics, name: &str) -> &'a DialectType {
    let at = src.find('{').unwrap() + 1;
    &sem.types.resolve(name, at).expect("resolved").ty
}

#[test]
fn parameter_types_resolve() {
    let src = "void kernel(pipe<bfloat16> px, uint32 n, semaphore s) { }";
    let (_, sem) = setup(src);
    assert_eq!(
        resolve_in_body(src, &sem, "px"),
        &DialectType::Pipe {
            item: Some(DataKind::Bfloat16)
        }
    );
    assert_eq!(resolve_in_body(src, &sem, "n"), &DialectType::Uint32);
    assert_eq!(resolve_in_body(src, &sem, "s"), &DialectType::Semaphore);
    let def = sem.types.resolve("n", src.find('{').unwrap()).unwrap();
    assert_eq!(def.param_index, Some(1));
}

#[test]
fn defines_resolve_template_arguments() {
    let src = "#define T bfloat16\nvoid kernel(pipe<T> p) { }";
    let (_, sem) = setup(src);
    assert_eq!(
        resolve_in_body(src, &sem, "p"),
        &DialectType::Pipe {
            item: Some(DataKind::Bfloat16)
        }
    );
}

#[test]
fn global_distribution_and_dram_traits() {
    let src = "void kernel(global<uint32, 2, 1> g) { }";
    let (_, sem) = setup(src);
    assert_eq!(
        resolve_in_body(src, &sem, "g"),
        &DialectType::Global {
            item: Some(DataKind::Uint32),
            dist: Some(Distrib::Cyclic),
            dram: Some(true),
        }
    );
}

#[test]
fn locals_resolve_after_their_declaration() {
    let src = "void kernel() { uint32 x = 1; foo(x); }";
    let (_, sem) = setup(src);
    let use_at = src.find("foo(x)").unwrap() + 4;
    let def = sem.types.resolve("x", use_at).expect("resolved");
    assert_eq!(def.ty, DialectType::Uint32);
    // not visible before its declaration
    let before = src.find('{').unwrap() + 1;
    assert!(sem.types.resolve("x", before).is_none());
}

#[test]
fn inner_scopes_shadow_outer_scopes() {
    let src = "void kernel(uint32 x) { { float x = 0; bar(x); } }";
    let (_, sem) = setup(src);
    let use_at = src.find("bar(x)").unwrap() + 4;
    let def = sem.types.resolve("x", use_at).expect("resolved");
    assert_eq!(def.ty, DialectType::Float);
}

#[test]
fn data_kind_shifts() {
    assert_eq!(DataKind::Bfloat16.shift(), 1);
    assert_eq!(DataKind::Uint32.shift(), 2);
    assert_eq!(DataKind::Float.shift(), 2);
}
