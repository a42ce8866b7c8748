//! Unit tests for call-graph ordering.

use pretty_assertions::assert_eq;

use crate::graph_build;
use crate::graph_sort::sorted_funcs;
use crate::tooling::unit::SourceUnit;
use crate::tooling::Semantics;

fn order_of(src: &str) -> Vec<String> {
    let unit = SourceUnit::parse(src).unwrap();
    let sem = Semantics::build(&unit);
    let graph = graph_build::build(&unit, &sem).unwrap();
    sorted_funcs(&graph)
        .unwrap()
        .into_iter()
        .map(|f| graph.func(f).name.clone())
        .collect()
}

#[test]
fn callers_come_before_callees() {
    let order = order_of(
        "void leaf() { }\n\
         void mid() { leaf(); }\n\
         void kernel() { mid(); }\n",
    );
    assert_eq!(order, vec!["kernel", "mid", "leaf"]);
}

#[test]
fn unreachable_functions_are_skipped() {
    let order = order_of(
        "void unused() { }\n\
         void kernel() { }\n",
    );
    assert_eq!(order, vec!["kernel"]);
}

#[test]
fn each_function_is_queued_once() {
    let order = order_of(
        "void shared() { }\n\
         void a() { shared(); }\n\
         void b() { shared(); }\n\
         void kernel() { a(); b(); }\n",
    );
    assert_eq!(order, vec!["kernel", "a", "b", "shared"]);
}

#[test]
fn self_recursion_is_accepted_silently() {
    let order = order_of(
        "void r() { r(); }\n\
         void kernel() { r(); }\n",
    );
    assert_eq!(order, vec!["kernel", "r"]);
}

#[test]
fn mutual_recursion_terminates() {
    let order = order_of(
        "void a();\n\
         void b() { a(); }\n\
         void a() { b(); }\n\
         void kernel() { a(); }\n",
    );
    assert_eq!(order, vec!["kernel", "a", "b"]);
}
