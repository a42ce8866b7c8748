//! Dead-code pass.
//!
//! Every `if` whose condition folds to a compile-time integer is replaced
//! by the surviving branch, then compounds left floating directly inside
//! another compound (and declaring nothing) lose their braces. Conditions
//! must be plain expressions: condition declarations and init statements
//! are left alone.

use crate::tooling::consteval::eval_int;
use crate::tooling::rewrite::{Edit, Rule, RuleSet, rewrite};
use crate::tooling::unit::{
    SourceUnit, condition_has_decl, named_children, statement_range, unwrap_condition,
    unwrap_else,
};
use crate::tooling::Semantics;
use crate::Result;

/// Run both steps (branch reduction, then flattening) over `input_code`.
pub fn run(input_code: &str) -> Result<String> {
    let reduced = {
        let unit = SourceUnit::parse(input_code)?;
        let sem = Semantics::build(&unit);
        rewrite(&unit, &sem, &RuleSet::new(vec![reduce_rule()]))?
    };
    let unit = SourceUnit::parse(reduced)?;
    let sem = Semantics::build(&unit);
    rewrite(&unit, &sem, &RuleSet::new(vec![flatten_rule()]))
}

/// `if (C) A; else B;` with integer-constant `C` keeps `A` when `C != 0`
/// and `B` (or nothing) otherwise.
fn reduce_rule() -> Rule {
    Rule::new("dead-code-reduce", |cx, node| {
        if node.kind() != "if_statement" {
            return None;
        }
        let condition = node.child_by_field_name("condition")?;
        if condition_has_decl(condition) {
            return None;
        }
        let cond_expr = unwrap_condition(condition)?;
        let value = eval_int(cx.unit, cond_expr, &cx.sem.consts)?;
        let then = node.child_by_field_name("consequence")?;
        let alt = node.child_by_field_name("alternative").and_then(unwrap_else);
        let stmt = statement_range(node);
        let then_range = statement_range(then);
        let edits = if value != 0 {
            match alt {
                Some(alt) => vec![
                    Edit::remove(stmt.start..then_range.start),
                    Edit::remove(then_range.end..statement_range(alt).end),
                ],
                None => vec![Edit::remove(stmt.start..then_range.start)],
            }
        } else {
            match alt {
                Some(alt) => vec![Edit::remove(stmt.start..statement_range(alt).start)],
                None => vec![Edit::remove(stmt)],
            }
        };
        Some(Ok(edits))
    })
}

/// Drop the braces of a compound nested directly in another compound when
/// it declares nothing.
fn flatten_rule() -> Rule {
    Rule::new("dead-code-flatten", |_cx, node| {
        if node.kind() != "compound_statement" {
            return None;
        }
        if node.parent().is_none_or(|p| p.kind() != "compound_statement") {
            return None;
        }
        let children = named_children(node);
        if children.iter().any(|c| c.kind() == "declaration") {
            return None;
        }
        let edits = match (children.first(), children.last()) {
            (Some(first), Some(last)) => vec![
                Edit::remove(node.start_byte()..statement_range(*first).start),
                Edit::remove(statement_range(*last).end..node.end_byte()),
            ],
            _ => vec![Edit::remove(node.byte_range())],
        };
        Some(Ok(edits))
    })
}
