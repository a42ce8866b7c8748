//! Integer constant-expression evaluation.
//!
//! Stands in for the parser-side evaluator the passes rely on: a condition
//! like `if (FLAG)` with `#define FLAG 1`, or `if (B != 0)` after a `param`
//! substitution produced `static constexpr uint32 B = uint32(4);`, folds to
//! an integer here. Anything referencing a runtime variable does not fold.

use std::collections::HashMap;

use tree_sitter::Node;

use super::types::DefineTable;
use super::unit::{SourceUnit, declaration_declarators, declarator_name, named_children,
    unwrap_condition, walk_nodes};

/// Names with known compile-time integer values.
#[derive(Debug, Default, Clone)]
pub struct ConstTable {
    values: HashMap<String, i64>,
}

impl ConstTable {
    /// Collects integer-valued defines and file-scope
    /// `static constexpr` integer declarations.
    pub fn build(unit: &SourceUnit, defines: &DefineTable) -> Self {
        let mut table = ConstTable::default();
        for (name, _) in defines.iter() {
            if let Some(value) = parse_int_token(defines.resolve(name)) {
                table.values.insert(name.to_string(), value);
            }
        }
        walk_nodes(unit.root(), &mut |node| {
            if node.kind() == "declaration" && is_static_constexpr(unit, node) {
                for declarator in declaration_declarators(node) {
                    if declarator.kind() != "init_declarator" {
                        continue;
                    }
                    let name = declarator
                        .child_by_field_name("declarator")
                        .and_then(|d| declarator_name(unit, d));
                    let value = declarator
                        .child_by_field_name("value")
                        .and_then(|v| eval_int(unit, v, &table));
                    if let (Some((name, _)), Some(value)) = (name, value) {
                        table.values.insert(name.to_string(), value);
                    }
                }
            }
        });
        table
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: i64) {
        self.values.insert(name.into(), value);
    }
}

fn is_static_constexpr(unit: &SourceUnit, node: Node<'_>) -> bool {
    let mut has_static = false;
    let mut has_constexpr = false;
    for child in named_children(node) {
        match child.kind() {
            "storage_class_specifier" => has_static |= unit.node_text(child) == "static",
            "type_qualifier" => has_constexpr |= unit.node_text(child) == "constexpr",
            _ => {}
        }
    }
    has_static && has_constexpr
}

/// Evaluate an expression node to a compile-time integer, or `None` when it
/// is not a constant expression.
pub fn eval_int(unit: &SourceUnit, node: Node<'_>, consts: &ConstTable) -> Option<i64> {
    match node.kind() {
        "number_literal" => parse_int_token(unit.node_text(node)),
        "true" => Some(1),
        "false" => Some(0),
        "identifier" => consts.get(unit.node_text(node)),
        "parenthesized_expression" | "condition_clause" => {
            eval_int(unit, unwrap_condition(node)?, consts)
        }
        "unary_expression" => {
            let arg = node.child_by_field_name("argument")?;
            let op = node.child_by_field_name("operator").map(|o| unit.node_text(o));
            let value = eval_int(unit, arg, consts)?;
            match op? {
                "-" => Some(-value),
                "+" => Some(value),
                "!" => Some((value == 0) as i64),
                "~" => Some(!value),
                _ => None,
            }
        }
        "binary_expression" => {
            let left = eval_int(unit, node.child_by_field_name("left")?, consts)?;
            let right = eval_int(unit, node.child_by_field_name("right")?, consts)?;
            let op = unit.node_text(node.child_by_field_name("operator")?);
            eval_binary(op, left, right)
        }
        "call_expression" => {
            // functional casts: uint32(x), int32(x)
            let callee = node.child_by_field_name("function")?;
            if callee.kind() != "identifier" {
                return None;
            }
            if !matches!(unit.node_text(callee), "uint32" | "int32") {
                return None;
            }
            let args = node.child_by_field_name("arguments")?;
            let args = named_children(args);
            if args.len() != 1 {
                return None;
            }
            eval_int(unit, args[0], consts)
        }
        _ => None,
    }
}

fn eval_binary(op: &str, left: i64, right: i64) -> Option<i64> {
    let value = match op {
        "+" => left.wrapping_add(right),
        "-" => left.wrapping_sub(right),
        "*" => left.wrapping_mul(right),
        "/" => {
            if right == 0 {
                return None;
            }
            left / right
        }
        "%" => {
            if right == 0 {
                return None;
            }
            left % right
        }
        "<<" => left.checked_shl(u32::try_from(right).ok()?)?,
        ">>" => left.checked_shr(u32::try_from(right).ok()?)?,
        "&" => left & right,
        "|" => left | right,
        "^" => left ^ right,
        "==" => (left == right) as i64,
        "!=" => (left != right) as i64,
        "<" => (left < right) as i64,
        "<=" => (left <= right) as i64,
        ">" => (left > right) as i64,
        ">=" => (left >= right) as i64,
        "&&" => (left != 0 && right != 0) as i64,
        "||" => (left != 0 || right != 0) as i64,
        _ => return None,
    };
    Some(value)
}

/// Parse one integer token: decimal, hex, octal, binary; literal suffixes
/// and digit separators are ignored.
pub fn parse_int_token(token: &str) -> Option<i64> {
    let text: String = token
        .trim()
        .chars()
        .filter(|c| *c != '\'')
        .collect();
    let text = text.trim_end_matches(['u', 'U', 'l', 'L']);
    if text.is_empty() {
        return None;
    }
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}
