//! Unit tests for edit application and rule dispatch.

use pretty_assertions::assert_eq;

use super::rewrite::{Edit, Rule, RuleSet, apply_edits, rewrite};
use super::unit::SourceUnit;
use super::Semantics;
use crate::Error;

#[test]
fn edits_apply_in_canonical_order() {
    let text = "abcdef";
    let edits = vec![
        Edit::replace(4..5, "E"),
        Edit::replace(1..2, "B"),
        Edit::insert(3, "!"),
    ];
    assert_eq!(apply_edits(text, edits).unwrap(), "aBc!dEf");
}

#[test]
fn identical_edits_are_deduplicated() {
    let text = "abc";
    let edits = vec![Edit::replace(1..2, "X"), Edit::replace(1..2, "X")];
    assert_eq!(apply_edits(text, edits).unwrap(), "aXc");
}

#[test]
fn insertions_at_one_point_keep_generation_order() {
    let text = "ab";
    let edits = vec![Edit::insert(1, "x"), Edit::insert(1, "y")];
    assert_eq!(apply_edits(text, edits).unwrap(), "axyb");
}

#[test]
fn overlapping_replacements_fail() {
    let text = "abcdef";
    let edits = vec![Edit::replace(0..4, "X"), Edit::replace(2..5, "Y")];
    match apply_edits(text, edits) {
        Err(Error::Apply(_)) => {}
        other => panic!("expected apply error, got {other:?}"),
    }
}

#[test]
fn nested_deletions_are_subsumed() {
    let text = "abcdef";
    let edits = vec![Edit::remove(0..5), Edit::remove(2..4)];
    assert_eq!(apply_edits(text, edits).unwrap(), "f");
}

#[test]
fn empty_edit_set_is_identity() {
    assert_eq!(apply_edits("abc", Vec::new()).unwrap(), "abc");
}

#[test]
fn first_matching_rule_wins() {
    let unit = SourceUnit::parse("void f() { g(); }").unwrap();
    let sem = Semantics::build(&unit);
    let first = Rule::new("first", |_cx, node| {
        if node.kind() != "call_expression" {
            return None;
        }
        Some(Ok(vec![Edit::replace(node.byte_range(), "one()")]))
    });
    let second = Rule::new("second", |_cx, node| {
        if node.kind() != "call_expression" {
            return None;
        }
        Some(Ok(vec![Edit::replace(node.byte_range(), "two()")]))
    });
    let out = rewrite(&unit, &sem, &RuleSet::new(vec![first, second])).unwrap();
    assert_eq!(out, "void f() { one(); }");
}

#[test]
fn unmatched_nodes_pass_through() {
    let unit = SourceUnit::parse("void f() { g(); }").unwrap();
    let sem = Semantics::build(&unit);
    let rules = RuleSet::new(vec![Rule::new("never", |_cx, _node| None)]);
    let out = rewrite(&unit, &sem, &rules).unwrap();
    assert_eq!(out, "void f() { g(); }");
}
