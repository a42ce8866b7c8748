//! Math-init analysis and insertion pass.
//!
//! Every tile primitive requires a device-side init call before it runs.
//! Hoisting those calls to the earliest point all control paths agree on
//! saves repeated work and keeps joined paths correct. The pass:
//!
//! 1. builds the statement graph and records the original init state at
//!    every builtin call site;
//! 2. summarizes functions in reverse call order, remapping parameter-slot
//!    arguments at call sites and keeping only calls every caller can
//!    service;
//! 3. folds states over each function's statement tree (a bounded
//!    semilattice per init group);
//! 4. walks each tree again with a shrinking mask, recording the first
//!    statement whose masked state holds a concrete call (if-statements are
//!    never hosts: inits belong at convergent points);
//! 5. inserts `__<name>_init(args);` stubs in front of the recorded
//!    statements, inside the opening brace for compounds, via a rewrite
//!    keyed by statement class and span.
//!
//! The analysis never guesses: an unresolved argument demotes its group to
//! the absorbing element and nothing is inserted for it.

mod args;
mod builtin;
mod func_use;
mod state;

#[cfg(test)]
mod pass_tests;
#[cfg(test)]
mod state_tests;

use std::collections::HashMap;

use tanto_core::{FuncId, StmtClass, StmtGraph, StmtId, StmtKey, graph::for_each_stmt};

use crate::graph_build;
use crate::graph_sort;
use crate::tooling::rewrite::{Edit, Rule, RuleSet, rewrite};
use crate::tooling::unit::{SourceUnit, stmt_class_of};
use crate::tooling::Semantics;
use crate::{Error, Result};

use builtin::{GROUP_COUNT, builtin_id, init_funcs};
use func_use::FuncUseMap;
use state::{InitArg, InitCall, InitCallData, InitMask, InitState};

/// Run the pass over `input_code`, returning the text with init stubs
/// inserted.
pub fn run(input_code: &str) -> Result<String> {
    let unit = SourceUnit::parse(input_code)?;
    let sem = Semantics::build(&unit);
    let graph = graph_build::build(&unit, &sem)?;

    let mut pass = Pass::new(&graph);
    pass.collect_orig_states()?;
    pass.propagate()?;
    pass.place();

    let key_states = pass.key_states();
    insert_stubs(&unit, &sem, key_states)
}

struct Pass<'g> {
    graph: &'g StmtGraph,
    uses: FuncUseMap,
    orig: HashMap<StmtId, InitState>,
    stmts: HashMap<StmtId, InitState>,
    funcs: HashMap<FuncId, InitState>,
    finals: HashMap<StmtId, InitState>,
}

impl<'g> Pass<'g> {
    fn new(graph: &'g StmtGraph) -> Self {
        Self {
            graph,
            uses: FuncUseMap::default(),
            orig: HashMap::new(),
            stmts: HashMap::new(),
            funcs: HashMap::new(),
            finals: HashMap::new(),
        }
    }

    /// Pass 1: original init states at builtin call sites.
    fn collect_orig_states(&mut self) -> Result<()> {
        let mut failure: Option<Error> = None;
        let mut states: Vec<(StmtId, InitState)> = Vec::new();
        for_each_stmt(self.graph, &mut |graph, stmt| {
            if failure.is_some() {
                return;
            }
            match orig_state(graph, stmt) {
                Ok(Some(state)) => states.push((stmt, state)),
                Ok(None) => {}
                Err(err) => failure = Some(err),
            }
        });
        if let Some(err) = failure {
            return Err(err);
        }
        self.orig.extend(states);
        Ok(())
    }

    /// Pass 2: per-function summaries, callees before callers.
    fn propagate(&mut self) -> Result<()> {
        self.uses = func_use::build(self.graph)?;
        let order = graph_sort::sorted_funcs(self.graph)?;
        for &func in order.iter().rev() {
            let mut state = InitState::default();
            if let Some(top) = self.graph.func(func).top_stmt {
                state = self.eval_stmt(top);
                state = self.filter_func_state(func, state);
            }
            if !state.is_empty() {
                self.funcs.insert(func, state);
            }
        }
        Ok(())
    }

    /// Fold one statement: original state at builtin calls (demoted on the
    /// way up when arguments are unresolved), callee summaries at call
    /// expressions, left-to-right composition elsewhere.
    fn eval_stmt(&mut self, stmt: StmtId) -> InitState {
        if let Some(orig) = self.orig.get(&stmt) {
            if !orig.is_empty() {
                // retain the full original state at the statement itself,
                // but do not propagate calls with unresolved arguments
                let orig = orig.clone();
                self.stmts.insert(stmt, orig.clone());
                let mut up = orig;
                up.demote_undef_args();
                return up;
            }
        }
        let state = if self.graph.stmt(stmt).class == StmtClass::Call {
            self.eval_call(stmt)
        } else {
            let mut state = InitState::default();
            let children: Vec<StmtId> = self.graph.children(stmt).collect();
            for child in children {
                let child_state = self.eval_stmt(child);
                state.combine(&child_state);
            }
            state
        };
        if !state.is_empty() {
            self.stmts.insert(stmt, state.clone());
        }
        state
    }

    /// State flowing out of a call expression: the callee's summary with
    /// parameter-slot arguments remapped through the actual arguments.
    /// Nested builtin calls in arguments are not supported; they must be
    /// pre-lowered into temporaries.
    fn eval_call(&mut self, stmt: StmtId) -> InitState {
        let mut state = InitState::default();
        let Some(callee) = self.graph.stmt(stmt).first_child else {
            return state;
        };
        let Some(func) = self.graph.stmt(callee).func_ref else {
            return state;
        };
        let args: Vec<StmtId> = self.graph.children(stmt).skip(1).collect();
        let func_state = match self.funcs.get(&func) {
            Some(s) => s.clone(),
            None => return state,
        };
        for group in 0..GROUP_COUNT {
            let call = match func_state.at(group) {
                InitCall::Call(data) => self.map_call_args(data, &args),
                other => other.clone(),
            };
            state.set(group, call);
        }
        state
    }

    fn map_call_args(&self, call: &InitCallData, args: &[StmtId]) -> InitCall {
        let mut mapped: Vec<Option<&tanto_core::VarNode>> = vec![None; call.args.len()];
        let mut have_params = false;
        for (i, arg) in call.args.iter().enumerate() {
            let Some(slot) = arg.param else {
                continue;
            };
            // by construction the argument at `slot` exists and names a
            // caller parameter; anything else cannot be resolved
            let Some(&actual) = args.get(slot as usize) else {
                return InitCall::Undef;
            };
            let Some(var) = self.graph.stmt(actual).decl_ref else {
                return InitCall::Undef;
            };
            let var = self.graph.var(var);
            if var.param_index.is_none() {
                return InitCall::Undef;
            }
            mapped[i] = Some(var);
            have_params = true;
        }
        if !have_params {
            return InitCall::Call(call.clone());
        }
        let args = call
            .args
            .iter()
            .zip(mapped)
            .map(|(arg, var)| match var {
                Some(var) => InitArg {
                    param: var.param_index,
                    value: None,
                    code: var.name.clone(),
                },
                None => arg.clone(),
            })
            .collect();
        InitCall::Call(InitCallData {
            func: call.func,
            args,
        })
    }

    /// An init call leaves a function only when every parameter slot it
    /// captures is bound consistently by all call sites.
    fn filter_func_state(&self, func: FuncId, state: InitState) -> InitState {
        let mut out = InitState::default();
        let Some(use_rec) = self.uses.find(func) else {
            return out;
        };
        for group in 0..GROUP_COUNT {
            let call = state.at(group);
            let keep = match call.as_call() {
                None => true,
                Some(data) => data.args.iter().all(|arg| match arg.param {
                    Some(slot) => use_rec.arg_param(slot as usize).is_some(),
                    None => true,
                }),
            };
            if keep {
                out.set(group, call.clone());
            }
        }
        out
    }

    /// Pass 3: pick insertion hosts per function with a shrinking mask.
    fn place(&mut self) {
        for &func in self.graph.funcs() {
            let Some(top) = self.graph.func(func).top_stmt else {
                continue;
            };
            let mask = self.top_mask(func);
            self.eval_final(top, &mask);
        }
    }

    /// Groups flowing out of a function are handled by its callers and
    /// masked out here; the main function keeps everything.
    fn top_mask(&self, func: FuncId) -> InitMask {
        let mut mask = InitMask::default();
        if Some(func) == self.graph.main_func() {
            return mask;
        }
        if let Some(state) = self.funcs.get(&func) {
            for group in 0..GROUP_COUNT {
                if !state.at(group).is_none() {
                    mask.set(group, false);
                }
            }
        }
        mask
    }

    fn eval_final(&mut self, stmt: StmtId, mask: &InitMask) {
        if mask.is_empty() {
            return;
        }
        if !may_host_init(self.graph, stmt) {
            self.eval_final_children(stmt, mask);
            return;
        }
        let state = self.stmts.get(&stmt).cloned().unwrap_or_default();
        let mut host_state = InitState::default();
        let mut next_mask = mask.clone();
        let mut found = false;
        for group in 0..GROUP_COUNT {
            if !mask.at(group) {
                continue;
            }
            match state.at(group) {
                InitCall::None => next_mask.set(group, false),
                InitCall::Undef => {}
                InitCall::Call(data) => {
                    host_state.set(group, InitCall::Call(data.clone()));
                    next_mask.set(group, false);
                    found = true;
                }
            }
        }
        if found {
            self.finals.insert(stmt, host_state);
        }
        if next_mask.is_empty() {
            return;
        }
        self.eval_final_children(stmt, &next_mask);
    }

    fn eval_final_children(&mut self, stmt: StmtId, mask: &InitMask) {
        let children: Vec<StmtId> = self.graph.children(stmt).collect();
        for child in children {
            self.eval_final(child, mask);
        }
    }

    fn key_states(&self) -> HashMap<StmtKey, InitState> {
        self.finals
            .iter()
            .map(|(&stmt, state)| (self.graph.stmt(stmt).key(), state.clone()))
            .collect()
    }
}

fn orig_state(graph: &StmtGraph, stmt: StmtId) -> Result<Option<InitState>> {
    let node = graph.stmt(stmt);
    let (type_name, method_name) = match node.class {
        StmtClass::Call => {
            let callee = graph
                .stmt(stmt)
                .first_child
                .ok_or_else(|| Error::Input("Missing callee of function call".into()))?;
            match graph.stmt(callee).func_ref {
                Some(func) => (String::new(), graph.func(func).name.clone()),
                None => return Ok(None),
            }
        }
        StmtClass::MemberCall => {
            let callee = graph
                .stmt(stmt)
                .first_child
                .ok_or_else(|| Error::Input("Missing callee of member call".into()))?;
            let method = graph
                .stmt(callee)
                .member_name
                .clone()
                .ok_or_else(|| Error::Input("Missing member name of member call".into()))?;
            let this = graph
                .stmt(callee)
                .first_child
                .ok_or_else(|| Error::Input("Missing object of member call".into()))?;
            let type_name = graph.stmt(this).type_name.clone().unwrap_or_default();
            (type_name, method)
        }
        _ => return Ok(None),
    };
    let Some(id) = builtin_id(&type_name, &method_name) else {
        return Ok(None);
    };
    let mut state = InitState::default();
    let funcs = init_funcs(id);
    for (group, func) in funcs.iter().enumerate() {
        let Some(func) = func else {
            continue;
        };
        let args = args::build_args(graph, stmt, id, group)?;
        state.set(
            group,
            InitCall::Call(InitCallData { func: *func, args }),
        );
    }
    if state.is_empty() {
        Ok(None)
    } else {
        Ok(Some(state))
    }
}

/// If-statements never host inits: initializations are placed at convergent
/// points, not inside branch arms.
fn may_host_init(graph: &StmtGraph, stmt: StmtId) -> bool {
    graph.stmt(stmt).class != StmtClass::If
}

/// Insert the recorded init calls through a rewrite keyed by statement
/// class and span. Compound statements receive the insert just inside their
/// opening brace so the init shares scope with the first user statement.
fn insert_stubs(
    unit: &SourceUnit,
    sem: &Semantics,
    key_states: HashMap<StmtKey, InitState>,
) -> Result<String> {
    let states = std::rc::Rc::new(key_states);

    let compound_states = states.clone();
    let compound_rule = Rule::new("init-insert-compound", move |cx, node| {
        if node.kind() != "compound_statement" {
            return None;
        }
        let key = StmtKey::new(StmtClass::Compound, cx.unit.span(node));
        let text = compound_states
            .get(&key)
            .map(format_init_calls)
            .unwrap_or_default();
        if text.is_empty() {
            return Some(Ok(Vec::new()));
        }
        Some(Ok(vec![Edit::insert(node.start_byte() + 1, text)]))
    });

    let stmt_states = states.clone();
    let stmt_rule = Rule::new("init-insert-stmt", move |cx, node| {
        let class = stmt_class_of(node)?;
        let key = StmtKey::new(class, cx.unit.span(node));
        let text = stmt_states.get(&key).map(format_init_calls)?;
        Some(Ok(vec![Edit::insert(node.start_byte(), text)]))
    });

    let rules = RuleSet::new(vec![compound_rule, stmt_rule]);
    rewrite(unit, sem, &rules)
}

fn format_init_calls(state: &InitState) -> String {
    let mut out = String::new();
    for group in 0..GROUP_COUNT {
        let Some(data) = state.at(group).as_call() else {
            continue;
        };
        out.push_str("__");
        out.push_str(data.func.name());
        out.push_str("_init(");
        for (i, arg) in data.args.iter().enumerate() {
            if i != 0 {
                out.push_str(", ");
            }
            out.push_str(&arg.code);
        }
        out.push_str(");\n");
    }
    out
}
