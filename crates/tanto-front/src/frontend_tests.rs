//! End-to-end pipeline tests over the public frontend entry point.

use indoc::indoc;

use crate::{FrontendArgs, Mode, run_frontend};

fn compile(mode: Mode, defines: &[(&str, &str)], params: &[(u32, u32)], src: &str) -> String {
    let args = FrontendArgs {
        mode,
        defines: defines
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect(),
        params: params.to_vec(),
    };
    run_frontend(&args, src).expect("compilation should succeed")
}

fn compile_err(mode: Mode, params: &[(u32, u32)], src: &str) -> Vec<String> {
    let args = FrontendArgs {
        mode,
        defines: vec![("T".to_string(), "bfloat16".to_string())],
        params: params.to_vec(),
    };
    run_frontend(&args, src).expect_err("compilation should fail")
}

fn squish(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn pipe_wait_front_dataflow_scenario() {
    let out = compile(
        Mode::Read,
        &[("T", "bfloat16")],
        &[],
        indoc! {"
            void kernel(pipe<T> px) {
                px.wait_front();
                px.pop_front();
            }
        "},
    );
    let flat = squish(&out);
    assert!(flat.contains("#include \"tanto/dataflow.h\""));
    assert!(flat.contains("#define T bfloat16"));
    assert!(flat.contains("void kernel(Pipe px) {"));
    assert!(flat.contains("cb_wait_front(px.cb_id, px.frame_size);"));
    assert!(flat.contains("cb_pop_front(px.cb_id, px.frame_size);"));
    assert!(flat.contains("void kernel_main() {"));
    assert!(flat.contains("Pipe px;"));
    assert!(flat.contains("px.cb_id = get_arg_val<uint32>(0);"));
    assert!(flat.contains("px.frame_size = get_arg_val<uint32>(1);"));
    assert!(flat.contains("kernel(px);"));
    assert!(!flat.contains("namespace"));
}

#[test]
fn transpose_compute_scenario() {
    let out = compile(
        Mode::Compute,
        &[("T", "bfloat16")],
        &[],
        indoc! {"
            void kernel(pipe<T> px, pipe<T> py, uint32 N) {
                for (uint32 n = 0; n < N; n++) {
                    px.wait_front();
                    py.reserve_back();
                    math<T> acc;
                    acc.transpose(px, 0, 0);
                    acc.pack(0, py);
                    py.push_back();
                    px.pop_front();
                }
            }
        "},
    );
    let flat = squish(&out);

    assert_eq!(count(&flat, "tanto_unpack_transpose_init(px.cb_id);"), 1);
    assert_eq!(count(&flat, "tanto_transpose_init();"), 1);
    assert_eq!(count(&flat, "tanto_pack_init(py.cb_id);"), 1);
    // every init precedes the loop they were hoisted out of
    let for_at = flat.find("for (").unwrap();
    assert!(flat.find("tanto_unpack_transpose_init").unwrap() < for_at);
    assert!(flat.find("tanto_transpose_init").unwrap() < for_at);
    assert!(flat.find("tanto_pack_init").unwrap() < for_at);

    assert!(flat.contains("tile_regs_acquire(); tile_regs_wait();"));
    assert!(flat.contains("transpose_wh_tile(px.cb_id, 0, 0);"));
    assert!(flat.contains("pack_tile(0, py.cb_id);"));
    // the register window closes before the loop body does
    assert!(flat.contains("tile_regs_commit(); tile_regs_release(); }"));

    assert!(flat.contains("#include \"tanto/compute.h\""));
    assert!(flat.contains("namespace NAMESPACE {"));
    assert_eq!(count(&flat, "void MAIN {"), 1);
    assert!(flat.contains("tanto_compute_init();"));
    assert!(flat.contains("kernel(px, py, N);"));
}

#[test]
fn constant_branch_scenario() {
    let out = compile(
        Mode::Compute,
        &[("T", "bfloat16")],
        &[],
        indoc! {"
            void kernel(pipe<T> px) {
                if (1) {
                    px.wait_front();
                } else {
                    px.pop_front();
                }
            }
        "},
    );
    let flat = squish(&out);
    assert!(flat.contains("cb_wait_front(px.cb_id, px.frame_size);"));
    assert!(!flat.contains("cb_pop_front"));
    assert!(!flat.contains("if (1)"));
    // the surviving compound is flattened into the kernel body
    assert!(flat.contains("void kernel(Pipe px) { cb_wait_front(px.cb_id, px.frame_size); }"));
}

#[test]
fn param_substitution_scenario() {
    let out = compile(
        Mode::Compute,
        &[("T", "bfloat16")],
        &[(0, 42)],
        indoc! {"
            param B;

            void kernel(pipe<T> px) {
                px.wait_front();
            }
        "},
    );
    let flat = squish(&out);
    assert!(flat.contains("static constexpr uint32 B = uint32(42);"));
    assert!(!flat.contains("param B"));
}

#[test]
fn params_substitute_in_declaration_order() {
    let out = compile(
        Mode::Read,
        &[("T", "bfloat16")],
        &[(0, 7), (1, 9)],
        indoc! {"
            param A;
            param B;

            void kernel(pipe<T> px) {
                px.wait_front();
            }
        "},
    );
    let flat = squish(&out);
    assert!(flat.contains("static constexpr uint32 A = uint32(7);"));
    assert!(flat.contains("static constexpr uint32 B = uint32(9);"));
}

#[test]
fn substituted_params_feed_dead_code_elimination() {
    let out = compile(
        Mode::Compute,
        &[("T", "bfloat16")],
        &[(0, 0)],
        indoc! {"
            param FLAG;

            void kernel(pipe<T> px) {
                if (FLAG != 0) {
                    px.wait_front();
                } else {
                    px.pop_front();
                }
            }
        "},
    );
    let flat = squish(&out);
    assert!(flat.contains("cb_pop_front"));
    assert!(!flat.contains("cb_wait_front"));
}

#[test]
fn tag_directed_read_scenario() {
    let out = compile(
        Mode::Read,
        &[("T", "bfloat16")],
        &[],
        indoc! {"
            void kernel(pipe<T> px, global<T, 0, 1> src, uint32 page, uint32 off, uint32 n) {
                px.reserve_back();
                px.read(0, src, page, off, n);
                read_barrier();
                px.push_back();
            }
        "},
    );
    let flat = squish(&out);
    assert!(flat.contains(
        "noc_async_read_linear_dram(get_write_ptr(px.cb_id) + (0 << 1), \
         src.addr, src.log2_page_size, page, off << 1, n << 1);"
    ));
    assert!(flat.contains("noc_async_read_barrier();"));
}

#[test]
fn cross_function_hoist_scenario() {
    let out = compile(
        Mode::Compute,
        &[("T", "bfloat16")],
        &[],
        indoc! {"
            void helper(pipe<T> p) {
                math<T> acc;
                acc.add(p, p, 0, 0, 0);
                acc.pack(0, p);
            }

            void kernel(pipe<T> px, pipe<T> py) {
                px.wait_front();
                py.wait_front();
                helper(px);
                helper(py);
            }
        "},
    );
    let flat = squish(&out);

    // bindings of `p` differ across calls: the unpack/pack inits live in
    // the helper
    assert_eq!(count(&flat, "tanto_unpack_binary_init(p.cb_id, p.cb_id);"), 1);
    assert_eq!(count(&flat, "tanto_pack_init(p.cb_id);"), 1);
    let helper_at = flat.find("void helper").unwrap();
    let kernel_at = flat.find("void kernel(").unwrap();
    let unpack_at = flat.find("tanto_unpack_binary_init").unwrap();
    assert!(unpack_at > helper_at && unpack_at < kernel_at);

    // the argument-free math init is agreed on and hoists into the kernel
    assert_eq!(count(&flat, "tanto_add_init();"), 1);
    assert!(flat.find("tanto_add_init").unwrap() > kernel_at);
    assert!(flat.contains("add_tiles(p.cb_id, p.cb_id, 0, 0, 0);"));
    assert!(flat.contains("helper(px);"));
    assert!(flat.contains("helper(py);"));
}

#[test]
fn kernel_main_argument_slots() {
    let out = compile(
        Mode::Read,
        &[("T", "bfloat16")],
        &[],
        "void kernel(int32 a, global<T, 0, 1> g, pipe<T> p, semaphore s) { }",
    );
    let flat = squish(&out);
    assert!(flat.contains("int32 a = get_arg_val<int32>(0);"));
    assert!(flat.contains("Global g;"));
    assert!(flat.contains("g.addr = get_arg_val<uint32>(1);"));
    assert!(flat.contains("g.log2_page_size = get_arg_val<uint32>(2);"));
    assert!(flat.contains("Pipe p;"));
    assert!(flat.contains("p.cb_id = get_arg_val<uint32>(3);"));
    assert!(flat.contains("p.frame_size = get_arg_val<uint32>(4);"));
    assert!(flat.contains("Semaphore s;"));
    assert!(flat.contains("s.addr = tanto_get_semaphore(get_arg_val<uint32>(5));"));
    assert!(flat.contains("kernel(a, g, p, s);"));
}

#[test]
fn already_lowered_bodies_pass_through() {
    let out = compile(
        Mode::Read,
        &[],
        &[],
        indoc! {"
            void kernel() {
                cb_wait_front(0, 1);
                noc_async_read_barrier();
            }
        "},
    );
    let flat = squish(&out);
    assert!(flat.contains("cb_wait_front(0, 1);"));
    assert!(flat.contains("noc_async_read_barrier();"));
}

#[test]
fn spdx_header_is_relocated_to_the_top() {
    let out = compile(
        Mode::Read,
        &[("T", "bfloat16")],
        &[],
        indoc! {"
            // SPDX-FileCopyrightText: example
            //
            // SPDX-License-Identifier: Apache-2.0

            void kernel(pipe<T> px) {
                px.wait_front();
            }
        "},
    );
    assert!(out.starts_with("// SPDX-FileCopyrightText: example"));
    assert!(out.contains("// SPDX-License-Identifier: Apache-2.0"));
}

#[test]
fn duplicate_parameter_indices_are_rejected() {
    let errors = compile_err(
        Mode::Read,
        &[(0, 1), (0, 2)],
        "param A;\nvoid kernel(pipe<T> px) { px.wait_front(); }",
    );
    assert!(errors[0].contains("Duplicate value for parameter #0"));
}

#[test]
fn undefined_parameters_are_rejected() {
    let errors = compile_err(
        Mode::Read,
        &[],
        "param A;\nvoid kernel(pipe<T> px) { px.wait_front(); }",
    );
    assert!(errors[0].contains("Undefined parameter #0"));
}

#[test]
fn unknown_kernel_parameter_types_are_rejected() {
    let errors = compile_err(Mode::Read, &[], "void kernel(double x) { }");
    assert!(errors[0].contains("Invalid kernel parameter type"));
}

#[test]
fn syntax_errors_are_reported() {
    let errors = compile_err(Mode::Read, &[], "void kernel( {");
    assert!(errors[0].contains("parse error"));
}

#[test]
fn carriage_returns_are_stripped() {
    let out = compile(
        Mode::Read,
        &[("T", "bfloat16")],
        &[],
        "void kernel(pipe<T> px) {\r\n    px.wait_front();\r\n}\r\n",
    );
    assert!(!out.contains('\r'));
    assert!(squish(&out).contains("cb_wait_front(px.cb_id, px.frame_size);"));
}
