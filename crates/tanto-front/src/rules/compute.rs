//! Compute-kernel rules: `math<T>` declarations and member calls, plus the
//! tilize/untilize free functions.

use crate::tooling::rewrite::{Edit, Rule};
use crate::tooling::types::{DialectType, parse_type};

use super::{RuleFactory, access, match_func_call, match_member_call, remove_list_item,
    replace_stmt, text};

/// Binary element-wise ops: `self.m(src0, src1, isrc0, isrc1, idst)` =>
/// `api(src0.cb_id, src1.cb_id, isrc0, isrc1, idst);`
const ELTWISE_BINARY: &[(&str, &str)] = &[
    ("add", "add_tiles"),
    ("sub", "sub_tiles"),
    ("mul", "mul_tiles"),
];

/// Broadcast ops lower to `any_tiles_bcast<EltwiseBinaryType::_, BroadcastType::_>`.
const BCAST: &[(&str, &str, &str)] = &[
    ("add_bcast_rows", "ELWADD", "ROW"),
    ("sub_bcast_rows", "ELWSUB", "ROW"),
    ("mul_bcast_rows", "ELWMUL", "ROW"),
    ("add_bcast_cols", "ELWADD", "COL"),
    ("sub_bcast_cols", "ELWSUB", "COL"),
    ("mul_bcast_cols", "ELWMUL", "COL"),
    ("add_bcast_scalar", "ELWADD", "SCALAR"),
    ("sub_bcast_scalar", "ELWSUB", "SCALAR"),
    ("mul_bcast_scalar", "ELWMUL", "SCALAR"),
];

/// Reductions lower to `reduce_tile<PoolType::_, ReduceDim::_>`.
const REDUCE: &[(&str, &str, &str)] = &[
    ("reduce_max_rows", "MAX", "REDUCE_ROW"),
    ("reduce_max_cols", "MAX", "REDUCE_COL"),
    ("reduce_max_scalar", "MAX", "REDUCE_SCALAR"),
    ("reduce_sum_rows", "SUM", "REDUCE_ROW"),
    ("reduce_sum_cols", "SUM", "REDUCE_COL"),
    ("reduce_sum_scalar", "SUM", "REDUCE_SCALAR"),
];

/// Destination-register binary ops: `self.m(idst0, idst1)` => `api(idst0, idst1);`
const DST_BINARY: &[(&str, &str)] = &[
    ("copy_dst", "copy_dest_values"),
    ("add_dst", "add_binary_tile"),
    ("sub_dst", "sub_binary_tile"),
    ("rsub_dst", "rsub_binary_tile"),
    ("mul_dst", "mul_binary_tile"),
    ("div_dst", "div_binary_tile"),
    ("power_dst", "power_binary_tile"),
];

/// One-argument SFPU ops: `self.m(idst)` => `api(idst);`
const SFPU_UNARY: &[(&str, &str)] = &[
    ("abs", "abs_tile"),
    ("acos", "acos_tile"),
    ("asin", "asin_tile"),
    ("atan", "atan_tile"),
    ("cast_bf16_u16", "tanto_cast_bf16_u16"),
    ("cast_u16_bf16", "tanto_cast_u16_bf16"),
    ("ceil", "ceil_tile"),
    ("cos", "cos_tile"),
    ("eqz", "eqz_tile"),
    ("erf", "erf_tile"),
    ("erfc", "erfc_tile"),
    ("erfinv", "erfinv_tile"),
    ("exp", "exp_tile"),
    ("exp2", "exp2_tile"),
    ("expm1", "expm1_tile"),
    ("floor", "floor_tile"),
    ("gelu", "gelu_tile"),
    ("gez", "gez_tile"),
    ("gtz", "gtz_tile"),
    ("i0", "i0_tile"),
    ("isfinite", "isfinite_tile"),
    ("isinf", "isinf_tile"),
    ("isnan", "isnan_tile"),
    ("isneginf", "isneginf_tile"),
    ("isposinf", "isposinf_tile"),
    ("lez", "lez_tile"),
    ("log", "log_tile"),
    ("logical_not", "logical_not_tile"),
    ("ltz", "ltz_tile"),
    ("max", "tanto_max_tile"),
    ("nez", "nez_tile"),
    ("recip", "recip_tile"),
    ("relu", "relu_tile"),
    ("rsqrt", "rsqrt_tile"),
    ("sigmoid", "sigmoid_tile"),
    ("sign", "sign_tile"),
    ("signbit", "signbit_tile"),
    ("sin", "sin_tile"),
    ("sqrt", "sqrt_tile"),
    ("square", "square_tile"),
    ("tan", "tan_tile"),
    ("tanh", "tanh_tile"),
];

/// Parameterized SFPU ops: `self.m(idst, param)` => `api(idst, param);`
const SFPU_PARAM: &[(&str, &str)] = &[
    ("add_scalar", "add_unary_tile"),
    ("div_scalar", "div_unary_tile"),
    ("elu", "elu_tile"),
    ("fill", "fill_tile_bitcast"),
    ("heaviside", "heaviside_tile"),
    ("leaky_relu", "leaky_relu_tile"),
    ("log_with_base", "log_with_base_tile"),
    ("mul_scalar", "mul_unary_tile"),
    ("power", "power_tile"),
    ("relu_max", "relu_max_tile"),
    ("relu_min", "relu_min_tile"),
    ("rsub_scalar", "rsub_unary_tile"),
    ("sub_scalar", "sub_unary_tile"),
];

/// Pack variants all lower to `pack_tile`.
const PACK: &[&str] = &["pack", "pack_row", "pack_col", "pack_scalar"];

impl RuleFactory {
    pub(crate) fn math_rules(&self) -> Vec<Rule> {
        let mut rules = vec![self.math_decl_rule()];
        for &method in PACK {
            rules.push(math_pack_rule(method));
        }
        rules.push(self.math_copy_rule());
        for &(method, api) in ELTWISE_BINARY {
            rules.push(math_eltwise_binary_rule(method, api));
        }
        for &(method, op, dim) in BCAST {
            rules.push(math_bcast_rule(method, op, dim));
        }
        rules.push(self.math_matmul_rule());
        for &(method, pool, dim) in REDUCE {
            rules.push(math_reduce_rule(method, pool, dim));
        }
        rules.push(self.math_transpose_rule());
        for &(method, api) in DST_BINARY {
            rules.push(math_dst_binary_rule(method, api));
        }
        for &(method, api) in SFPU_UNARY {
            rules.push(math_sfpu_unary_rule(method, api));
        }
        for &(method, api) in SFPU_PARAM {
            rules.push(math_sfpu_param_rule(method, api));
        }
        rules.push(self.math_arg_rule());
        rules
    }

    /// A `math<T>` local declaration opens the destination-register window
    /// for its enclosing compound:
    ///
    /// ```text
    /// { ... math<T> acc; ... }
    ///     =>
    /// { ... tile_regs_acquire(); tile_regs_wait(); ...
    ///   tile_regs_commit(); tile_regs_release(); }
    /// ```
    pub(crate) fn math_decl_rule(&self) -> Rule {
        Rule::new("math-decl", |cx, node| {
            if node.kind() != "declaration" {
                return None;
            }
            let parent = node.parent()?;
            if parent.kind() != "compound_statement" {
                return None;
            }
            let type_node = node.child_by_field_name("type")?;
            let ty = parse_type(cx.unit, type_node, &cx.sem.defines);
            if !matches!(ty, DialectType::Math { .. }) {
                return None;
            }
            let close = parent.end_byte().saturating_sub(1);
            Some(Ok(vec![
                Edit::replace(
                    node.byte_range(),
                    "tile_regs_acquire();\ntile_regs_wait();".to_string(),
                ),
                Edit::insert(close, "tile_regs_commit();\ntile_regs_release();\n"),
            ]))
        })
    }

    /// `self.copy(src, isrc, idst)` => `copy_tile(src.cb_id, isrc, idst);`
    pub(crate) fn math_copy_rule(&self) -> Rule {
        Rule::new("math-copy", |cx, node| {
            let m = match_member_call(cx, node, "math", "copy", 3)?;
            let out = format!(
                "copy_tile({}, {}, {});",
                access(cx, m.args[0], "cb_id"),
                text(cx, m.args[1]),
                text(cx, m.args[2])
            );
            Some(Ok(replace_stmt(m.call, out)))
        })
    }

    /// `self.matmul(src0, src1, isrc0, isrc1, idst, transpose)` =>
    /// `matmul_tiles(src0.cb_id, src1.cb_id, isrc0, isrc1, idst, transpose);`
    pub(crate) fn math_matmul_rule(&self) -> Rule {
        Rule::new("math-matmul", |cx, node| {
            let m = match_member_call(cx, node, "math", "matmul", 6)?;
            let out = format!(
                "matmul_tiles({}, {}, {}, {}, {}, {});",
                access(cx, m.args[0], "cb_id"),
                access(cx, m.args[1], "cb_id"),
                text(cx, m.args[2]),
                text(cx, m.args[3]),
                text(cx, m.args[4]),
                text(cx, m.args[5])
            );
            Some(Ok(replace_stmt(m.call, out)))
        })
    }

    /// `self.transpose(src, isrc, idst)` =>
    /// `transpose_wh_tile(src.cb_id, isrc, idst);`
    pub(crate) fn math_transpose_rule(&self) -> Rule {
        Rule::new("math-transpose", |cx, node| {
            let m = match_member_call(cx, node, "math", "transpose", 3)?;
            let out = format!(
                "transpose_wh_tile({}, {}, {});",
                access(cx, m.args[0], "cb_id"),
                text(cx, m.args[1]),
                text(cx, m.args[2])
            );
            Some(Ok(replace_stmt(m.call, out)))
        })
    }

    /// Call arguments of type `math` are erased; must follow every rule for
    /// math method calls.
    pub(crate) fn math_arg_rule(&self) -> Rule {
        Rule::new("math-arg", |cx, node| {
            if node.kind() != "identifier" {
                return None;
            }
            let parent = node.parent()?;
            if parent.kind() != "argument_list" {
                return None;
            }
            let ty = cx.sem.types.type_of(cx.unit, node)?;
            if !matches!(ty, DialectType::Math { .. }) {
                return None;
            }
            Some(Ok(remove_list_item(cx, node)))
        })
    }

    /// `tilize_block(src, block, dst)` =>
    /// `tilize_block(src.cb_id, block, dst.cb_id);`
    pub(crate) fn func_tilize_block_rule(&self) -> Rule {
        Rule::new("func-tilize-block", |cx, node| {
            let args = match_func_call(cx, node, "tilize_block", 3)?;
            let out = format!(
                "tilize_block({}, {}, {});",
                access(cx, args[0], "cb_id"),
                text(cx, args[1]),
                access(cx, args[2], "cb_id")
            );
            Some(Ok(replace_stmt(node, out)))
        })
    }

    /// `untilize_block(src, block, dst)` =>
    /// `untilize_block<1>(src.cb_id, block, dst.cb_id);`
    pub(crate) fn func_untilize_block_rule(&self) -> Rule {
        Rule::new("func-untilize-block", |cx, node| {
            let args = match_func_call(cx, node, "untilize_block", 3)?;
            let out = format!(
                "untilize_block<1>({}, {}, {});",
                access(cx, args[0], "cb_id"),
                text(cx, args[1]),
                access(cx, args[2], "cb_id")
            );
            Some(Ok(replace_stmt(node, out)))
        })
    }
}

fn math_pack_rule(method: &'static str) -> Rule {
    // self.pack*(isrc, dst) => pack_tile(isrc, dst.cb_id);
    Rule::new("math-pack", move |cx, node| {
        let m = match_member_call(cx, node, "math", method, 2)?;
        let out = format!(
            "pack_tile({}, {});",
            text(cx, m.args[0]),
            access(cx, m.args[1], "cb_id")
        );
        Some(Ok(replace_stmt(m.call, out)))
    })
}

fn math_eltwise_binary_rule(method: &'static str, api: &'static str) -> Rule {
    Rule::new("math-eltwise-binary", move |cx, node| {
        let m = match_member_call(cx, node, "math", method, 5)?;
        let out = format!(
            "{api}({}, {}, {}, {}, {});",
            access(cx, m.args[0], "cb_id"),
            access(cx, m.args[1], "cb_id"),
            text(cx, m.args[2]),
            text(cx, m.args[3]),
            text(cx, m.args[4])
        );
        Some(Ok(replace_stmt(m.call, out)))
    })
}

fn math_bcast_rule(method: &'static str, op: &'static str, dim: &'static str) -> Rule {
    Rule::new("math-bcast", move |cx, node| {
        let m = match_member_call(cx, node, "math", method, 5)?;
        let out = format!(
            "any_tiles_bcast<EltwiseBinaryType::{op}, BroadcastType::{dim}>({}, {}, {}, {}, {});",
            access(cx, m.args[0], "cb_id"),
            access(cx, m.args[1], "cb_id"),
            text(cx, m.args[2]),
            text(cx, m.args[3]),
            text(cx, m.args[4])
        );
        Some(Ok(replace_stmt(m.call, out)))
    })
}

fn math_reduce_rule(method: &'static str, pool: &'static str, dim: &'static str) -> Rule {
    Rule::new("math-reduce", move |cx, node| {
        let m = match_member_call(cx, node, "math", method, 5)?;
        let out = format!(
            "reduce_tile<PoolType::{pool}, ReduceDim::{dim}>({}, {}, {}, {}, {});",
            access(cx, m.args[0], "cb_id"),
            access(cx, m.args[1], "cb_id"),
            text(cx, m.args[2]),
            text(cx, m.args[3]),
            text(cx, m.args[4])
        );
        Some(Ok(replace_stmt(m.call, out)))
    })
}

fn math_dst_binary_rule(method: &'static str, api: &'static str) -> Rule {
    Rule::new("math-dst-binary", move |cx, node| {
        let m = match_member_call(cx, node, "math", method, 2)?;
        let out = format!("{api}({}, {});", text(cx, m.args[0]), text(cx, m.args[1]));
        Some(Ok(replace_stmt(m.call, out)))
    })
}

fn math_sfpu_unary_rule(method: &'static str, api: &'static str) -> Rule {
    Rule::new("math-sfpu-unary", move |cx, node| {
        let m = match_member_call(cx, node, "math", method, 1)?;
        let out = format!("{api}({});", text(cx, m.args[0]));
        Some(Ok(replace_stmt(m.call, out)))
    })
}

fn math_sfpu_param_rule(method: &'static str, api: &'static str) -> Rule {
    Rule::new("math-sfpu-param", move |cx, node| {
        let m = match_member_call(cx, node, "math", method, 2)?;
        let out = format!("{api}({}, {});", text(cx, m.args[0]), text(cx, m.args[1]));
        Some(Ok(replace_stmt(m.call, out)))
    })
}
