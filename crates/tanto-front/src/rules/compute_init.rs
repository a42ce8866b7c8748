//! Lowering of the `__*_init` stubs the math-init pass inserts into compute
//! kernels.

use crate::tooling::rewrite::Rule;

use super::{RuleFactory, access, match_func_call, replace_stmt, text};

/// Init stubs with no arguments: `__<n>_init();` => `tanto_<n>_init();`
const PLAIN: &[&str] = &[
    "copy",
    "add",
    "sub",
    "mul",
    "add_bcast_rows",
    "sub_bcast_rows",
    "mul_bcast_rows",
    "add_bcast_cols",
    "sub_bcast_cols",
    "mul_bcast_cols",
    "add_bcast_scalar",
    "sub_bcast_scalar",
    "mul_bcast_scalar",
    "reduce_max_rows",
    "reduce_max_cols",
    "reduce_max_scalar",
    "reduce_sum_rows",
    "reduce_sum_cols",
    "reduce_sum_scalar",
    "transpose",
    "tilize_block",
    "untilize_block",
    "copy_dst",
    "add_dst",
    "sub_dst",
    "rsub_dst",
    "mul_dst",
    "div_dst",
    "power_dst",
    "abs",
    "acos",
    "asin",
    "atan",
    "binary_scalar",
    "cast",
    "ceil",
    "cos",
    "elu",
    "eqz",
    "erf",
    "erfc",
    "erfinv",
    "exp",
    "exp2",
    "expm1",
    "fill",
    "floor",
    "gelu",
    "gez",
    "gtz",
    "heaviside",
    "i0",
    "isfinite",
    "isinf",
    "isnan",
    "isneginf",
    "isposinf",
    "leaky_relu",
    "lez",
    "log",
    "log_with_base",
    "logical_not",
    "ltz",
    "max",
    "nez",
    "power",
    "recip",
    "relu",
    "relu_max",
    "relu_min",
    "rsqrt",
    "sigmoid",
    "sign",
    "signbit",
    "sin",
    "sqrt",
    "square",
    "tan",
    "tanh",
];

/// `__<n>_init(icb)` => `tanto_<n>_init(icb.cb_id);`
const UNPACK_UNARY: &[&str] = &["unpack_unary", "unpack_transpose", "unpack_untilize_block"];

/// `__<n>_init(icb, param)` => `tanto_<n>_init(icb.cb_id, param);`
const UNPACK_UNARY_PARAM: &[&str] = &["unpack_tilize_block"];

/// `__<n>_init(icb0, icb1)` => `tanto_<n>_init(icb0.cb_id, icb1.cb_id);`
const UNPACK_BINARY: &[&str] = &[
    "unpack_binary",
    "unpack_bcast_rows",
    "unpack_bcast_cols",
    "unpack_bcast_scalar",
    "unpack_reduce_rows",
    "unpack_reduce_cols",
    "unpack_reduce_scalar",
];

/// `__<n>_init(icb0, icb1, param)` =>
/// `tanto_<n>_init(icb0.cb_id, icb1.cb_id, param);`
const UNPACK_BINARY_PARAM: &[&str] = &["unpack_matmul"];

/// `__<n>_init(ocb)` => `tanto_<n>_init(ocb.cb_id);`
const PACK: &[&str] = &["pack", "pack_row", "pack_col", "pack_scalar"];

impl RuleFactory {
    pub(crate) fn init_rules(&self) -> Vec<Rule> {
        let mut rules = Vec::new();
        for &name in PLAIN {
            rules.push(plain_init_rule(name));
        }
        rules.push(matmul_init_rule());
        for &name in UNPACK_UNARY {
            rules.push(unpack_unary_init_rule(name, false));
        }
        for &name in UNPACK_UNARY_PARAM {
            rules.push(unpack_unary_init_rule(name, true));
        }
        for &name in UNPACK_BINARY {
            rules.push(unpack_binary_init_rule(name, false));
        }
        for &name in UNPACK_BINARY_PARAM {
            rules.push(unpack_binary_init_rule(name, true));
        }
        for &name in PACK {
            rules.push(pack_init_rule(name));
        }
        rules
    }
}

fn stub(name: &str) -> String {
    format!("__{name}_init")
}

fn api(name: &str) -> String {
    format!("tanto_{name}_init")
}

fn plain_init_rule(name: &'static str) -> Rule {
    Rule::new("init-plain", move |cx, node| {
        match_func_call(cx, node, &stub(name), 0)?;
        Some(Ok(replace_stmt(node, format!("{}();", api(name)))))
    })
}

/// `__matmul_init(transpose)` => `tanto_matmul_init(transpose);`
fn matmul_init_rule() -> Rule {
    Rule::new("init-matmul", |cx, node| {
        let args = match_func_call(cx, node, "__matmul_init", 1)?;
        Some(Ok(replace_stmt(
            node,
            format!("tanto_matmul_init({});", text(cx, args[0])),
        )))
    })
}

fn unpack_unary_init_rule(name: &'static str, with_param: bool) -> Rule {
    Rule::new("init-unpack-unary", move |cx, node| {
        let argc = if with_param { 2 } else { 1 };
        let args = match_func_call(cx, node, &stub(name), argc)?;
        let out = if with_param {
            format!(
                "{}({}, {});",
                api(name),
                access(cx, args[0], "cb_id"),
                text(cx, args[1])
            )
        } else {
            format!("{}({});", api(name), access(cx, args[0], "cb_id"))
        };
        Some(Ok(replace_stmt(node, out)))
    })
}

fn unpack_binary_init_rule(name: &'static str, with_param: bool) -> Rule {
    Rule::new("init-unpack-binary", move |cx, node| {
        let argc = if with_param { 3 } else { 2 };
        let args = match_func_call(cx, node, &stub(name), argc)?;
        let out = if with_param {
            format!(
                "{}({}, {}, {});",
                api(name),
                access(cx, args[0], "cb_id"),
                access(cx, args[1], "cb_id"),
                text(cx, args[2])
            )
        } else {
            format!(
                "{}({}, {});",
                api(name),
                access(cx, args[0], "cb_id"),
                access(cx, args[1], "cb_id")
            )
        };
        Some(Ok(replace_stmt(node, out)))
    })
}

fn pack_init_rule(name: &'static str) -> Rule {
    Rule::new("init-pack", move |cx, node| {
        let args = match_func_call(cx, node, &stub(name), 1)?;
        Some(Ok(replace_stmt(
            node,
            format!("{}({});", api(name), access(cx, args[0], "cb_id")),
        )))
    })
}
