//! Unit tests for the statement graph arena and traversal.

use pretty_assertions::assert_eq;

use crate::graph::{StmtClass, StmtGraph, for_each_stmt};
use crate::span::Span;

fn span(line: u32) -> Span {
    Span::new(line, 1, line, 10)
}

#[test]
fn children_link_in_insertion_order() {
    let mut g = StmtGraph::new();
    let top = g.add_stmt(StmtClass::Compound, span(1));
    let a = g.add_stmt(StmtClass::Call, span(2));
    let b = g.add_stmt(StmtClass::Call, span(3));
    let c = g.add_stmt(StmtClass::Call, span(4));
    g.add_child(top, a);
    g.add_child(top, b);
    g.add_child(top, c);

    let kids: Vec<_> = g.children(top).collect();
    assert_eq!(kids, vec![a, b, c]);
    assert_eq!(g.stmt(top).first_child, Some(a));
    assert_eq!(g.stmt(top).last_child, Some(c));
    assert_eq!(g.stmt(b).prev, Some(a));
    assert_eq!(g.stmt(b).next, Some(c));
    assert_eq!(g.stmt(a).parent, Some(top));
}

#[test]
fn walk_visits_every_statement_once() {
    let mut g = StmtGraph::new();
    let f = g.add_func_node("kernel", span(1));
    let top = g.add_stmt(StmtClass::Compound, span(1));
    let call = g.add_stmt(StmtClass::Call, span(2));
    let arg = g.add_stmt(StmtClass::IntLiteral, span(2));
    g.add_child(top, call);
    g.add_child(call, arg);
    g.func_mut(f).top_stmt = Some(top);
    g.add_func(f);
    g.set_main_func(f);

    let mut seen = Vec::new();
    for_each_stmt(&g, &mut |graph, stmt| {
        seen.push(graph.stmt(stmt).class);
    });
    assert_eq!(
        seen,
        vec![StmtClass::Compound, StmtClass::Call, StmtClass::IntLiteral]
    );
}

#[test]
fn dump_reports_attributes() {
    let mut g = StmtGraph::new();
    let f = g.add_func_node("kernel", span(1));
    let top = g.add_stmt(StmtClass::Compound, span(1));
    let lit = g.add_stmt(StmtClass::IntLiteral, span(2));
    g.stmt_mut(lit).int_literal = Some(42);
    g.add_child(top, lit);
    g.func_mut(f).top_stmt = Some(top);
    g.add_func(f);
    g.set_main_func(f);

    let dump = g.dump();
    assert!(dump.contains("FunctionDecl [kernel]"));
    assert!(dump.contains("IntegerLiteral"));
    assert!(dump.contains("int [42]"));
}
