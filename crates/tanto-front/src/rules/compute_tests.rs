//! Unit tests for compute lowering rules.

use indoc::indoc;
use pretty_assertions::assert_eq;

use crate::tooling::rewrite::rewrite;
use crate::tooling::unit::SourceUnit;
use crate::tooling::Semantics;

use super::RuleFactory;

fn lower(src: &str) -> String {
    let unit = SourceUnit::parse(src).unwrap();
    let sem = Semantics::build(&unit);
    let factory = RuleFactory::new();
    rewrite(&unit, &sem, &factory.pass2_compute_rules()).unwrap()
}

fn squish(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[test]
fn pipe_frame_ops_lower_to_cb_calls() {
    let out = lower("void f(pipe<T> px) { px.wait_front(); px.pop_front(); }");
    let out = squish(&out);
    assert!(out.contains("cb_wait_front(px.cb_id, px.frame_size);"));
    assert!(out.contains("cb_pop_front(px.cb_id, px.frame_size);"));
    assert!(out.contains("void f(Pipe px)"));
}

#[test]
fn set_frame_becomes_an_assignment() {
    let out = lower("void f(pipe<T> px) { px.set_frame(4); }");
    assert!(squish(&out).contains("px.frame_size = 4;"));
}

#[test]
fn math_declaration_opens_the_register_window() {
    let out = lower(indoc! {"
        void f(pipe<T> px, pipe<T> py) {
            math<T> acc;
            acc.copy(px, 0, 0);
            acc.pack(0, py);
        }
    "});
    let out = squish(&out);
    assert!(out.contains("tile_regs_acquire(); tile_regs_wait();"));
    assert!(out.contains("copy_tile(px.cb_id, 0, 0);"));
    assert!(out.contains("pack_tile(0, py.cb_id);"));
    assert!(out.contains("tile_regs_commit(); tile_regs_release();"));
    // the commit/release pair lands before the closing brace
    let commit = out.find("tile_regs_commit").unwrap();
    assert!(commit > out.find("pack_tile").unwrap());
}

#[test]
fn matmul_lowerings() {
    let out = lower("void f(pipe<T> a, pipe<T> b) { math<T> acc; acc.matmul(a, b, 0, 0, 0, 1); }");
    assert!(squish(&out).contains("matmul_tiles(a.cb_id, b.cb_id, 0, 0, 0, 1);"));
}

#[test]
fn bcast_and_reduce_use_templated_calls() {
    let out = lower(indoc! {"
        void f(pipe<T> a, pipe<T> b) {
            math<T> acc;
            acc.add_bcast_rows(a, b, 0, 0, 0);
            acc.reduce_sum_rows(a, b, 0, 0, 0);
        }
    "});
    let out = squish(&out);
    assert!(out.contains(
        "any_tiles_bcast<EltwiseBinaryType::ELWADD, BroadcastType::ROW>(a.cb_id, b.cb_id, 0, 0, 0);"
    ));
    assert!(out.contains(
        "reduce_tile<PoolType::SUM, ReduceDim::REDUCE_ROW>(a.cb_id, b.cb_id, 0, 0, 0);"
    ));
}

#[test]
fn sfpu_and_dst_families() {
    let out = lower(indoc! {"
        void f(pipe<T> px) {
            math<T> acc;
            acc.sqrt(0);
            acc.leaky_relu(0, 3);
            acc.add_dst(0, 1);
        }
    "});
    let out = squish(&out);
    assert!(out.contains("sqrt_tile(0);"));
    assert!(out.contains("leaky_relu_tile(0, 3);"));
    assert!(out.contains("add_binary_tile(0, 1);"));
}

#[test]
fn transpose_lowering() {
    let out = lower("void f(pipe<T> px) { math<T> acc; acc.transpose(px, 0, 0); }");
    assert!(squish(&out).contains("transpose_wh_tile(px.cb_id, 0, 0);"));
}

#[test]
fn init_stubs_lower_to_runtime_calls() {
    let out = lower(indoc! {"
        void f(pipe<T> a, pipe<T> b) {
            __unpack_binary_init(a, b);
            __add_init();
            __matmul_init(1);
            __pack_init(b);
            __binary_scalar_init();
        }
    "});
    let out = squish(&out);
    assert!(out.contains("tanto_unpack_binary_init(a.cb_id, b.cb_id);"));
    assert!(out.contains("tanto_add_init();"));
    assert!(out.contains("tanto_matmul_init(1);"));
    assert!(out.contains("tanto_pack_init(b.cb_id);"));
    assert!(out.contains("tanto_binary_scalar_init();"));
}

#[test]
fn tilize_calls_pick_up_cb_ids() {
    let out = lower("void f(pipe<T> a, pipe<T> b, uint32 n) { tilize_block(a, n, b); }");
    assert!(squish(&out).contains("tilize_block(a.cb_id, n, b.cb_id);"));
}

#[test]
fn math_parameters_and_arguments_are_erased() {
    let out = lower(indoc! {"
        void helper(math<T> acc, pipe<T> p) {
            acc.copy(p, 0, 0);
        }

        void f(pipe<T> px) {
            math<T> acc;
            helper(acc, px);
        }
    "});
    let flat: String = out.chars().filter(|c| !c.is_whitespace()).collect();
    assert!(flat.contains("voidhelper(Pipep)"));
    assert!(flat.contains("helper(px);"));
    assert!(!flat.contains("math<T>acc,"));
}

#[test]
fn else_if_chains_are_restored() {
    let out = lower(indoc! {"
        void f(uint32 n) {
            if (n == 0) {
                a();
            } else { if (n == 1) {
                b();
            } }
        }
    "});
    let out = squish(&out);
    assert!(out.contains("else if (n == 1) {"));
}

#[test]
fn unknown_calls_pass_through() {
    let out = lower("void f(uint32 n) { frobnicate(n); }");
    assert_eq!(squish(&out), "void f(uint32 n) { frobnicate(n); }");
}
