//! Style rules.
//!
//! These exist so matchers and edits downstream operate on uniform shapes;
//! they never carry semantics of their own.

use crate::tooling::rewrite::{Edit, Rule};
use crate::tooling::unit::{named_children, statement_range, unwrap_else};

use super::RuleFactory;

impl RuleFactory {
    /// Wrap unbraced `if`/`else` bodies in compound statements.
    pub(crate) fn tidy_if_stmt_rule(&self) -> Rule {
        Rule::new("tidy-if-stmt", |_cx, node| {
            if node.kind() != "if_statement" {
                return None;
            }
            let mut edits = Vec::new();
            if let Some(then) = node.child_by_field_name("consequence") {
                if then.kind() != "compound_statement" {
                    let range = statement_range(then);
                    edits.push(Edit::insert(range.start, "{"));
                    edits.push(Edit::insert(range.end, "}"));
                }
            }
            if let Some(alt) = node.child_by_field_name("alternative") {
                if let Some(body) = unwrap_else(alt) {
                    if body.kind() != "compound_statement" {
                        let range = statement_range(body);
                        edits.push(Edit::insert(range.start, "{"));
                        edits.push(Edit::insert(range.end, "}"));
                    }
                }
            }
            if edits.is_empty() { None } else { Some(Ok(edits)) }
        })
    }

    /// Unwrap an `else { if ... }` produced by the tidy rule back into an
    /// `else if` chain: the braces go when the compound holds exactly one
    /// `if`.
    pub(crate) fn cleanup_if_stmt_rule(&self) -> Rule {
        Rule::new("cleanup-if-stmt", |_cx, node| {
            if node.kind() != "if_statement" {
                return None;
            }
            let alt = node.child_by_field_name("alternative")?;
            let body = unwrap_else(alt)?;
            if body.kind() != "compound_statement" {
                return None;
            }
            let children = named_children(body);
            if children.len() != 1 || children[0].kind() != "if_statement" {
                return None;
            }
            let inner = statement_range(children[0]);
            Some(Ok(vec![
                Edit::remove(body.start_byte()..inner.start),
                Edit::remove(inner.end..body.end_byte()),
            ]))
        })
    }
}
