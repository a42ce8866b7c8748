//! Unit tests for parsing and node classification.

use pretty_assertions::assert_eq;

use tanto_core::StmtClass;

use super::unit::{SourceUnit, named_children, statement_range, stmt_class_of};
use crate::Error;

fn body_stmts(unit: &SourceUnit) -> Vec<tree_sitter::Node<'_>> {
    let def = named_children(unit.root())
        .into_iter()
        .find(|n| n.kind() == "function_definition")
        .expect("function");
    let body = def.child_by_field_name("body").expect("body");
    named_children(body)
}

#[test]
fn parse_accepts_well_formed_input() {
    let unit = SourceUnit::parse("void f() { g(1); }").unwrap();
    assert_eq!(unit.root().kind(), "translation_unit");
}

#[test]
fn parse_rejects_broken_input() {
    let err = SourceUnit::parse("void f( {").unwrap_err();
    match err {
        Error::Parse(text) => assert!(text.contains("error")),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn statement_classes() {
    let unit = SourceUnit::parse(
        "void f() { g(); x.h(); if (x) { } for (;;) { } while (x) { } uint32 y; }",
    )
    .unwrap();
    let stmts = body_stmts(&unit);
    let classes: Vec<_> = stmts
        .iter()
        .map(|s| {
            if s.kind() == "expression_statement" {
                stmt_class_of(named_children(*s)[0])
            } else {
                stmt_class_of(*s)
            }
        })
        .collect();
    assert_eq!(
        classes,
        vec![
            Some(StmtClass::Call),
            Some(StmtClass::MemberCall),
            Some(StmtClass::If),
            Some(StmtClass::For),
            Some(StmtClass::While),
            Some(StmtClass::DeclStmt),
        ]
    );
}

#[test]
fn statement_range_includes_semicolon() {
    let src = "void f() { g(1); }";
    let unit = SourceUnit::parse(src).unwrap();
    let stmts = body_stmts(&unit);
    let call = named_children(stmts[0])[0];
    assert_eq!(call.kind(), "call_expression");
    let range = statement_range(call);
    assert_eq!(&src[range], "g(1);");
}

#[test]
fn spans_are_one_based() {
    let unit = SourceUnit::parse("void f() {\n    g();\n}").unwrap();
    let stmts = body_stmts(&unit);
    let span = unit.span(stmts[0]);
    assert_eq!(span.begin_line, 2);
    assert_eq!(span.begin_col, 5);
}
