//! Init-call argument capture.
//!
//! For each `(builtin, group)` pair a descriptor names the positional call
//! arguments copied into the init call. Arguments are captured as
//! `(param slot, literal value, source text)`; a slot resolves when the
//! argument is a plain reference to a formal parameter, a value when it is
//! a non-negative integer or boolean literal.

use tanto_core::{StmtGraph, StmtId};

use crate::{Error, Result};

use super::builtin::{BuiltinId, MATH, PACK, UNPACK};
use super::state::InitArg;

/// Positional argument indices captured for `(id, group)`.
fn arg_desc(id: BuiltinId, group: usize) -> &'static [usize] {
    use BuiltinId as B;
    match group {
        UNPACK => match id {
            B::Copy | B::Transpose | B::UntilizeBlock => &[0],
            B::Add
            | B::Sub
            | B::Mul
            | B::AddBcastRows
            | B::SubBcastRows
            | B::MulBcastRows
            | B::AddBcastCols
            | B::SubBcastCols
            | B::MulBcastCols
            | B::AddBcastScalar
            | B::SubBcastScalar
            | B::MulBcastScalar
            | B::ReduceMaxRows
            | B::ReduceMaxCols
            | B::ReduceMaxScalar
            | B::ReduceSumRows
            | B::ReduceSumCols
            | B::ReduceSumScalar
            | B::TilizeBlock => &[0, 1],
            B::Matmul => &[0, 1, 5],
            _ => &[],
        },
        MATH => match id {
            B::Matmul => &[5],
            _ => &[],
        },
        PACK => match id {
            B::Pack | B::PackRow | B::PackCol | B::PackScalar => &[1],
            B::TilizeBlock | B::UntilizeBlock => &[2],
            _ => &[],
        },
        _ => &[],
    }
}

/// Capture the init-call arguments for one builtin call statement.
pub fn build_args(
    graph: &StmtGraph,
    stmt: StmtId,
    id: BuiltinId,
    group: usize,
) -> Result<Vec<InitArg>> {
    let desc = arg_desc(id, group);
    if desc.is_empty() {
        return Ok(Vec::new());
    }
    // first child is the callee; call arguments follow
    let args: Vec<StmtId> = graph.children(stmt).skip(1).collect();
    let mut out = Vec::with_capacity(desc.len());
    for &pos in desc {
        let Some(&arg) = args.get(pos) else {
            return Err(Error::Shape(
                "Arguments do not match argument descriptor".into(),
            ));
        };
        let node = graph.stmt(arg);
        let param = node
            .decl_ref
            .and_then(|var| graph.var(var).param_index);
        let value = if let Some(value) = node.bool_literal {
            Some(value as i64)
        } else {
            // integer arguments of init functions are always non-negative
            node.int_literal.filter(|v| *v >= 0)
        };
        out.push(InitArg {
            param,
            value,
            code: node.code.clone().unwrap_or_default(),
        });
    }
    Ok(out)
}
