//! Call-graph ordering.
//!
//! Functions are queued from `kernel` following direct callee edges, each
//! entered once. Visiting the result in reverse gives callees before their
//! callers. A function already queued is not revisited, so recursive calls
//! are accepted silently; summaries for cycles may be incomplete.

use std::collections::HashSet;

use tanto_core::{FuncId, StmtClass, StmtGraph, StmtId};

use crate::{Error, Result};

/// Functions reachable from the main function, callers before callees.
pub fn sorted_funcs(graph: &StmtGraph) -> Result<Vec<FuncId>> {
    let main = graph
        .main_func()
        .ok_or_else(|| Error::Input("Missing main function".into()))?;
    let mut seen: HashSet<FuncId> = HashSet::new();
    let mut result: Vec<FuncId> = Vec::new();
    seen.insert(main);
    result.push(main);
    let mut i = 0;
    while i < result.len() {
        let func = result[i];
        if let Some(top) = graph.func(func).top_stmt {
            collect_calls(graph, top, &mut seen, &mut result);
        }
        i += 1;
    }
    Ok(result)
}

fn collect_calls(
    graph: &StmtGraph,
    stmt: StmtId,
    seen: &mut HashSet<FuncId>,
    result: &mut Vec<FuncId>,
) {
    if graph.stmt(stmt).class == StmtClass::Call {
        if let Some(callee) = graph.stmt(stmt).first_child {
            if let Some(func) = graph.stmt(callee).func_ref {
                if graph.func(func).top_stmt.is_some() && seen.insert(func) {
                    result.push(func);
                }
            }
        }
    }
    for child in graph.children(stmt) {
        collect_calls(graph, child, seen, result);
    }
}
