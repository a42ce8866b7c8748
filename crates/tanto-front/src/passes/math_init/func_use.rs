//! Per-function call-use records.
//!
//! For every defined function this summarizes how call sites pass its
//! arguments: per parameter slot, the literal value every caller agrees on
//! (or nothing when inconsistent) and the caller parameter every caller
//! binds (or nothing when inconsistent). The interprocedural filter uses
//! this to decide whether a parameter-dependent init call can float out of
//! the function.

use indexmap::IndexMap;

use tanto_core::{FuncId, StmtClass, StmtGraph, StmtId, VarId, graph::for_each_stmt};

use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct UseArg {
    pub value: Option<i64>,
    pub param: Option<VarId>,
}

/// Aggregated call-site bindings for one function.
#[derive(Debug, Clone)]
pub struct FuncUse {
    args: Vec<UseArg>,
}

impl FuncUse {
    fn new(arg_count: usize) -> Self {
        Self {
            args: vec![UseArg::default(); arg_count],
        }
    }

    pub fn arg_param(&self, index: usize) -> Option<VarId> {
        self.args[index].param
    }
}

/// Call-use records for every defined function with at least one call site.
#[derive(Debug, Default)]
pub struct FuncUseMap {
    map: IndexMap<FuncId, FuncUse>,
}

impl FuncUseMap {
    pub fn find(&self, func: FuncId) -> Option<&FuncUse> {
        self.map.get(&func)
    }
}

/// Scan every call site in the graph and fold argument bindings.
pub fn build(graph: &StmtGraph) -> Result<FuncUseMap> {
    let mut map = FuncUseMap::default();
    let mut failure: Option<Error> = None;
    for_each_stmt(graph, &mut |graph, stmt| {
        if failure.is_some() || graph.stmt(stmt).class != StmtClass::Call {
            return;
        }
        if let Err(err) = add_call(graph, stmt, &mut map) {
            failure = Some(err);
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(map),
    }
}

fn add_call(graph: &StmtGraph, call: StmtId, map: &mut FuncUseMap) -> Result<()> {
    let Some(callee) = graph.stmt(call).first_child else {
        return Ok(());
    };
    let Some(func) = graph.stmt(callee).func_ref else {
        return Ok(());
    };
    if graph.func(func).top_stmt.is_none() {
        return Ok(());
    }
    let args: Vec<StmtId> = graph.children(call).skip(1).collect();
    let param_count = graph.func(func).params.len();
    if args.len() > param_count {
        return Err(Error::Shape("Too many arguments in function call".into()));
    }
    if args.len() < param_count {
        return Err(Error::Shape("Too few arguments in function call".into()));
    }
    match map.map.get_mut(&func) {
        None => {
            let mut use_rec = FuncUse::new(param_count);
            for (index, &arg) in args.iter().enumerate() {
                use_rec.args[index] = UseArg {
                    value: arg_value(graph, arg),
                    param: arg_param(graph, arg),
                };
            }
            map.map.insert(func, use_rec);
        }
        Some(use_rec) => {
            for (index, &arg) in args.iter().enumerate() {
                let slot = &mut use_rec.args[index];
                if slot.value != arg_value(graph, arg) {
                    slot.value = None;
                }
                if slot.param != arg_param(graph, arg) {
                    slot.param = None;
                }
            }
        }
    }
    Ok(())
}

fn arg_value(graph: &StmtGraph, stmt: StmtId) -> Option<i64> {
    let node = graph.stmt(stmt);
    if let Some(value) = node.bool_literal {
        return Some(value as i64);
    }
    node.int_literal
}

fn arg_param(graph: &StmtGraph, stmt: StmtId) -> Option<VarId> {
    let var = graph.stmt(stmt).decl_ref?;
    if graph.var(var).param_index.is_some() {
        Some(var)
    } else {
        None
    }
}
