//! Top-level and shared rules: `param` substitution, kernel parameter
//! lowering, and the pipe operations common to all three kernel flavors.

use crate::tooling::rewrite::{Edit, Rule};
use crate::tooling::types::{DialectType, parse_type};
use crate::tooling::unit::{declaration_declarators, declarator_name};

use super::{ParamValueFn, RuleFactory, access, match_member_call, remove_list_item,
    replace_stmt};

impl RuleFactory {
    /// File-scope `param X;` becomes a `static constexpr` with the next
    /// user-supplied value:
    /// `static constexpr uint32 X = uint32(V);`
    pub(crate) fn param_rule(&self, get_value: ParamValueFn) -> Rule {
        Rule::new("param-decl", move |cx, node| {
            if node.kind() != "declaration" {
                return None;
            }
            if node.parent().is_some_and(|p| p.kind() != "translation_unit") {
                return None;
            }
            let type_node = node.child_by_field_name("type")?;
            let ty = parse_type(cx.unit, type_node, &cx.sem.defines);
            if ty != DialectType::Param {
                return None;
            }
            let declarator = declaration_declarators(node).into_iter().next()?;
            let (name, _) = declarator_name(cx.unit, declarator)?;
            let value = get_value();
            Some(Ok(vec![Edit::replace(
                node.byte_range(),
                format!("static constexpr uint32 {name} = uint32({value});"),
            )]))
        })
    }

    pub(crate) fn parm_global_rule(&self) -> Rule {
        parm_rule("parm-global", "global", Some("Global"))
    }

    pub(crate) fn parm_local_rule(&self) -> Rule {
        parm_rule("parm-local", "local", Some("Local"))
    }

    pub(crate) fn parm_semaphore_rule(&self) -> Rule {
        parm_rule("parm-semaphore", "semaphore", Some("Semaphore"))
    }

    pub(crate) fn parm_pipe_rule(&self) -> Rule {
        parm_rule("parm-pipe", "pipe", Some("Pipe"))
    }

    /// `math<T>` formal parameters are erased from signatures.
    pub(crate) fn parm_math_rule(&self) -> Rule {
        parm_rule("parm-math", "math", None)
    }

    /// `self.set_frame(tiles)` => `self.frame_size = tiles;`
    pub(crate) fn pipe_set_frame_rule(&self) -> Rule {
        Rule::new("pipe-set-frame", |cx, node| {
            let m = match_member_call(cx, node, "pipe", "set_frame", 1)?;
            let text = format!(
                "{} = {};",
                access(cx, m.self_node, "frame_size"),
                cx.unit.node_text(m.args[0])
            );
            Some(Ok(replace_stmt(m.call, text)))
        })
    }

    /// `self.wait_front()` => `cb_wait_front(self.cb_id, self.frame_size);`
    pub(crate) fn pipe_wait_front_rule(&self) -> Rule {
        pipe_frame_rule("pipe-wait-front", "wait_front", "cb_wait_front")
    }

    /// `self.pop_front()` => `cb_pop_front(self.cb_id, self.frame_size);`
    pub(crate) fn pipe_pop_front_rule(&self) -> Rule {
        pipe_frame_rule("pipe-pop-front", "pop_front", "cb_pop_front")
    }

    /// `self.reserve_back()` => `cb_reserve_back(self.cb_id, self.frame_size);`
    pub(crate) fn pipe_reserve_back_rule(&self) -> Rule {
        pipe_frame_rule("pipe-reserve-back", "reserve_back", "cb_reserve_back")
    }

    /// `self.push_back()` => `cb_push_back(self.cb_id, self.frame_size);`
    pub(crate) fn pipe_push_back_rule(&self) -> Rule {
        pipe_frame_rule("pipe-push-back", "push_back", "cb_push_back")
    }
}

/// Lower a kernel parameter of dialect class `class` to the runtime struct
/// `lowered`, or erase it entirely when `lowered` is `None`.
fn parm_rule(name: &'static str, class: &'static str, lowered: Option<&'static str>) -> Rule {
    Rule::new(name, move |cx, node| {
        if node.kind() != "parameter_declaration" {
            return None;
        }
        let type_node = node.child_by_field_name("type")?;
        let ty = parse_type(cx.unit, type_node, &cx.sem.defines);
        if ty.class_name() != Some(class) {
            return None;
        }
        let declarator = node.child_by_field_name("declarator")?;
        let (param_name, _) = declarator_name(cx.unit, declarator)?;
        match lowered {
            Some(lowered) => Some(Ok(vec![Edit::replace(
                node.byte_range(),
                format!("{lowered} {param_name}"),
            )])),
            None => Some(Ok(remove_list_item(cx, node))),
        }
    })
}

fn pipe_frame_rule(name: &'static str, method: &'static str, api: &'static str) -> Rule {
    Rule::new(name, move |cx, node| {
        let m = match_member_call(cx, node, "pipe", method, 0)?;
        let text = format!(
            "{api}({}, {});",
            access(cx, m.self_node, "cb_id"),
            access(cx, m.self_node, "frame_size")
        );
        Some(Ok(replace_stmt(m.call, text)))
    })
}
