//! Rule factory.
//!
//! A pure catalog of pattern -> rewrite rules, one per dialect primitive.
//! Rules are composed with first-match semantics; a node no rule matches
//! passes through untouched. The only state is the write-mode flag that
//! selects the dataflow variant set.
//!
//! # Module organization
//!
//! - `style` - brace insertion and else-if cleanup
//! - `common` - param substitution, parameter lowering, shared pipe ops
//! - `compute` - math member calls, tilize/untilize, register-window decls
//! - `compute_init` - `__*_init` stub lowering
//! - `dataflow` - local/pipe transfers, semaphores, barriers

mod common;
mod compute;
mod compute_init;
mod dataflow;
mod style;

#[cfg(test)]
mod compute_tests;

use std::rc::Rc;

use tree_sitter::Node;

use crate::tooling::rewrite::{Edit, Rule, RuleCx, RuleSet};
use crate::tooling::types::{DataKind, DialectType, Distrib};
use crate::tooling::unit::{named_children, statement_range};

/// Callback supplying the next compile-time parameter value, in declaration
/// order.
pub type ParamValueFn = Rc<dyn Fn() -> u32>;

/// Catalog of rewrite rules for every dialect primitive.
pub struct RuleFactory {
    write_mode: bool,
}

impl RuleFactory {
    pub fn new() -> Self {
        Self { write_mode: false }
    }

    /// Selects the write-flavor variants of the dataflow rules where the
    /// two sides differ.
    pub fn set_write_mode(&mut self, write_mode: bool) {
        self.write_mode = write_mode;
    }

    pub fn write_mode(&self) -> bool {
        self.write_mode
    }

    /// Rules applied to every mode before the analysis passes: parameter
    /// substitution and if-statement brace normalization.
    pub fn pass1_rules(&self, get_value: ParamValueFn) -> RuleSet {
        RuleSet::new(vec![
            self.param_rule(get_value),
            self.tidy_if_stmt_rule(),
        ])
    }

    /// Compute lowering rules.
    pub fn pass2_compute_rules(&self) -> RuleSet {
        let mut rules = vec![
            // style
            self.cleanup_if_stmt_rule(),
            // functions
            self.parm_global_rule(),
            self.parm_local_rule(),
            self.parm_semaphore_rule(),
            self.parm_pipe_rule(),
            self.parm_math_rule(),
            // pipe
            self.pipe_set_frame_rule(),
            self.pipe_wait_front_rule(),
            self.pipe_pop_front_rule(),
            self.pipe_reserve_back_rule(),
            self.pipe_push_back_rule(),
        ];
        rules.extend(self.math_rules());
        rules.push(self.func_tilize_block_rule());
        rules.push(self.func_untilize_block_rule());
        rules.extend(self.init_rules());
        RuleSet::new(rules)
    }

    /// Dataflow lowering rules (read or write flavor per the mode flag).
    pub fn pass2_dataflow_rules(&self) -> RuleSet {
        let mut rules = vec![
            // style
            self.cleanup_if_stmt_rule(),
            // functions
            self.parm_global_rule(),
            self.parm_local_rule(),
            self.parm_semaphore_rule(),
            self.parm_pipe_rule(),
            self.parm_math_rule(),
            // pipe (common)
            self.pipe_set_frame_rule(),
            self.pipe_wait_front_rule(),
            self.pipe_pop_front_rule(),
            self.pipe_reserve_back_rule(),
            self.pipe_push_back_rule(),
        ];
        rules.extend(self.local_rules());
        rules.extend(self.pipe_transfer_rules());
        rules.extend(self.semaphore_rules());
        rules.push(self.func_read_barrier_rule());
        rules.push(self.func_write_barrier_rule());
        RuleSet::new(rules)
    }
}

impl Default for RuleFactory {
    fn default() -> Self {
        Self::new()
    }
}

// ---- matcher helpers shared by the rule modules ----

/// A matched member call `self.method(args...)`.
pub(crate) struct MemberMatch<'t> {
    pub call: Node<'t>,
    pub self_node: Node<'t>,
    pub self_ty: DialectType,
    pub args: Vec<Node<'t>>,
}

impl<'t> MemberMatch<'t> {
    pub fn item(&self) -> Option<DataKind> {
        self.self_ty.item()
    }
}

/// Match `<self>.<method>(<argc args>)` where `self` has dialect class
/// `class`.
pub(crate) fn match_member_call<'t>(
    cx: &RuleCx<'t>,
    node: Node<'t>,
    class: &str,
    method: &str,
    argc: usize,
) -> Option<MemberMatch<'t>> {
    if node.kind() != "call_expression" {
        return None;
    }
    let function = node.child_by_field_name("function")?;
    if function.kind() != "field_expression" {
        return None;
    }
    let field = function.child_by_field_name("field")?;
    if cx.unit.node_text(field) != method {
        return None;
    }
    let self_node = function.child_by_field_name("argument")?;
    let self_ty = cx.sem.types.type_of(cx.unit, self_node)?.clone();
    if self_ty.class_name() != Some(class) {
        return None;
    }
    let args = call_args(node)?;
    if args.len() != argc {
        return None;
    }
    Some(MemberMatch {
        call: node,
        self_node,
        self_ty,
        args,
    })
}

/// Match a free function call `<name>(<argc args>)`.
pub(crate) fn match_func_call<'t>(
    cx: &RuleCx<'t>,
    node: Node<'t>,
    name: &str,
    argc: usize,
) -> Option<Vec<Node<'t>>> {
    if node.kind() != "call_expression" {
        return None;
    }
    let function = node.child_by_field_name("function")?;
    if function.kind() != "identifier" || cx.unit.node_text(function) != name {
        return None;
    }
    let args = call_args(node)?;
    if args.len() == argc { Some(args) } else { None }
}

pub(crate) fn call_args<'t>(node: Node<'t>) -> Option<Vec<Node<'t>>> {
    let arguments = node.child_by_field_name("arguments")?;
    Some(named_children(arguments))
}

/// Dialect class of an expression node, when it has one.
pub(crate) fn expr_class<'t>(cx: &RuleCx<'t>, node: Node<'t>) -> Option<&'static str> {
    cx.sem.types.type_of(cx.unit, node)?.class_name()
}

/// Global-buffer traits of an expression node.
pub(crate) fn expr_global<'t>(cx: &RuleCx<'t>, node: Node<'t>) -> Option<(Distrib, bool)> {
    match cx.sem.types.type_of(cx.unit, node)? {
        DialectType::Global {
            dist: Some(dist),
            dram: Some(dram),
            ..
        } => Some((*dist, *dram)),
        _ => None,
    }
}

pub(crate) fn text<'t>(cx: &RuleCx<'t>, node: Node<'t>) -> &'t str {
    cx.unit.node_text(node)
}

/// `<expr>.<field>` access text.
pub(crate) fn access(cx: &RuleCx<'_>, node: Node<'_>, field: &str) -> String {
    format!("{}.{}", cx.unit.node_text(node), field)
}

/// Replace the whole statement spelled by `node`.
pub(crate) fn replace_stmt(node: Node<'_>, text: String) -> Vec<Edit> {
    vec![Edit::replace(statement_range(node), text)]
}

/// Remove a list element together with its adjacent comma separator.
pub(crate) fn remove_list_item(cx: &RuleCx<'_>, node: Node<'_>) -> Vec<Edit> {
    let src = cx.unit.text();
    let mut start = node.start_byte();
    let mut end = node.end_byte();
    // prefer eating the preceding comma; fall back to the following one
    let before = src[..start].trim_end();
    if before.ends_with(',') {
        start = before.len() - 1;
    } else {
        let after = &src[end..];
        let trimmed = after.trim_start();
        if trimmed.starts_with(',') {
            end += after.len() - trimmed.len() + 1;
        }
    }
    vec![Edit::remove(start..end)]
}

/// Argument expression shifted by the element size:
/// `<expr> << <shift>`.
pub(crate) fn shifted(cx: &RuleCx<'_>, node: Node<'_>, kind: DataKind) -> String {
    format!("{} << {}", cx.unit.node_text(node), kind.shift())
}
