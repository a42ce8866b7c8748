//! Unit tests for constant-expression evaluation.

use pretty_assertions::assert_eq;

use super::consteval::{eval_int, parse_int_token};
use super::unit::{SourceUnit, named_children, unwrap_condition, walk_nodes};
use super::Semantics;

/// Evaluate the condition of the single `if` in `prelude + body`.
fn eval_cond(prelude: &str, cond: &str) -> Option<i64> {
    let src = format!("{prelude}void f() {{ if ({cond}) {{ }} }}");
    let unit = SourceUnit::parse(src).unwrap();
    let sem = Semantics::build(&unit);
    let mut result = None;
    walk_nodes(unit.root(), &mut |node| {
        if node.kind() == "if_statement" && result.is_none() {
            let condition = node.child_by_field_name("condition").unwrap();
            let expr = unwrap_condition(condition).unwrap();
            result = Some(eval_int(&unit, expr, &sem.consts));
        }
    });
    result.unwrap()
}

#[test]
fn literals_and_arithmetic() {
    assert_eq!(eval_cond("", "1"), Some(1));
    assert_eq!(eval_cond("", "0"), Some(0));
    assert_eq!(eval_cond("", "true"), Some(1));
    assert_eq!(eval_cond("", "false"), Some(0));
    assert_eq!(eval_cond("", "2 + 3 * 4"), Some(14));
    assert_eq!(eval_cond("", "(1 << 4) - 1"), Some(15));
    assert_eq!(eval_cond("", "7 / 2"), Some(3));
    assert_eq!(eval_cond("", "!0"), Some(1));
    assert_eq!(eval_cond("", "-3"), Some(-3));
    assert_eq!(eval_cond("", "4 == 4"), Some(1));
    assert_eq!(eval_cond("", "1 && 0"), Some(0));
}

#[test]
fn division_by_zero_does_not_fold() {
    assert_eq!(eval_cond("", "1 / 0"), None);
}

#[test]
fn defines_fold_as_constants() {
    assert_eq!(eval_cond("#define FLAG 1\n", "FLAG"), Some(1));
    assert_eq!(eval_cond("#define N 8\n", "N * 2"), Some(16));
}

#[test]
fn static_constexpr_declarations_fold() {
    let prelude = "static constexpr uint32 B = uint32(42);\n";
    assert_eq!(eval_cond(prelude, "B"), Some(42));
    assert_eq!(eval_cond(prelude, "B != 0"), Some(1));
}

#[test]
fn runtime_variables_do_not_fold() {
    assert_eq!(eval_cond("", "x"), None);
    let src = "void f(uint32 n) { if (n + 1) { } }";
    let unit = SourceUnit::parse(src).unwrap();
    let sem = Semantics::build(&unit);
    let mut result = None;
    walk_nodes(unit.root(), &mut |node| {
        if node.kind() == "if_statement" && result.is_none() {
            let condition = node.child_by_field_name("condition").unwrap();
            let expr = unwrap_condition(condition).unwrap();
            result = Some(eval_int(&unit, expr, &sem.consts));
        }
    });
    assert_eq!(result.unwrap(), None);
}

#[test]
fn functional_casts_fold() {
    assert_eq!(eval_cond("", "uint32(7)"), Some(7));
    assert_eq!(eval_cond("", "int32(3) + 1"), Some(4));
}

#[test]
fn integer_token_forms() {
    assert_eq!(parse_int_token("42"), Some(42));
    assert_eq!(parse_int_token("0x10"), Some(16));
    assert_eq!(parse_int_token("0b101"), Some(5));
    assert_eq!(parse_int_token("010"), Some(8));
    assert_eq!(parse_int_token("32u"), Some(32));
    assert_eq!(parse_int_token("1'000"), Some(1000));
    assert_eq!(parse_int_token("abc"), None);
    assert_eq!(parse_int_token(""), None);
}

#[test]
fn named_children_skip_comments() {
    let unit = SourceUnit::parse("void f() { /* note */ g(); }").unwrap();
    let def = named_children(unit.root())
        .into_iter()
        .find(|n| n.kind() == "function_definition")
        .unwrap();
    let body = def.child_by_field_name("body").unwrap();
    assert_eq!(named_children(body).len(), 1);
}
