//! Unit tests for the math-init pass: hoisting, branch agreement, and
//! cross-function placement.

use indoc::indoc;

use super::run;

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[test]
fn loop_invariant_inits_hoist_to_the_kernel_top() {
    let out = run(indoc! {"
        void kernel(pipe<T> px, pipe<T> py, uint32 n) {
            for (uint32 i = 0; i < n; i++) {
                px.wait_front();
                py.reserve_back();
                math<T> acc;
                acc.transpose(px, 0, 0);
                acc.pack(0, py);
                py.push_back();
                px.pop_front();
            }
        }
    "})
    .unwrap();

    assert_eq!(count(&out, "__unpack_transpose_init(px);"), 1);
    assert_eq!(count(&out, "__transpose_init();"), 1);
    assert_eq!(count(&out, "__pack_init(py);"), 1);
    // hoisted before the loop, not inside it
    let for_at = out.find("for (").unwrap();
    assert!(out.find("__unpack_transpose_init").unwrap() < for_at);
    assert!(out.find("__transpose_init").unwrap() < for_at);
    assert!(out.find("__pack_init").unwrap() < for_at);
}

#[test]
fn agreeing_branches_hoist_disagreeing_groups_stay_local() {
    let out = run(indoc! {"
        void kernel(pipe<T> pa, pipe<T> pb, uint32 f) {
            if (f) {
                math<T> a;
                a.copy(pa, 0, 0);
            } else {
                math<T> b;
                b.copy(pb, 0, 0);
            }
        }
    "})
    .unwrap();

    // both branches perform a copy: the math-group init is agreed upon and
    // hoisted above the if
    assert_eq!(count(&out, "__copy_init();"), 1);
    assert!(out.find("__copy_init").unwrap() < out.find("if (f)").unwrap());

    // the unpack group depends on which pipe is read: one init per branch,
    // none above the if
    assert_eq!(count(&out, "__unpack_unary_init(pa);"), 1);
    assert_eq!(count(&out, "__unpack_unary_init(pb);"), 1);
    assert!(out.find("__unpack_unary_init(pa)").unwrap() > out.find("if (f)").unwrap());
}

#[test]
fn parameter_bound_inits_stay_inside_the_callee() {
    let out = run(indoc! {"
        void helper(pipe<T> p) {
            math<T> acc;
            acc.add(p, p, 0, 0, 0);
            acc.pack(0, p);
        }

        void kernel(pipe<T> px, pipe<T> py) {
            helper(px);
            helper(py);
        }
    "})
    .unwrap();

    // the binding of `p` differs across call sites: unpack and pack inits
    // are emitted inside helper
    assert_eq!(count(&out, "__unpack_binary_init(p, p);"), 1);
    assert_eq!(count(&out, "__pack_init(p);"), 1);
    let helper_at = out.find("void helper").unwrap();
    let kernel_at = out.find("void kernel").unwrap();
    let unpack_at = out.find("__unpack_binary_init").unwrap();
    assert!(unpack_at > helper_at && unpack_at < kernel_at);

    // the argument-free math init floats up to the kernel
    assert_eq!(count(&out, "__add_init();"), 1);
    assert!(out.find("__add_init").unwrap() > kernel_at);
}

#[test]
fn consistent_call_sites_let_inits_float_to_the_caller() {
    let out = run(indoc! {"
        void helper(pipe<T> p) {
            math<T> acc;
            acc.add(p, p, 0, 0, 0);
        }

        void kernel(pipe<T> px) {
            helper(px);
            helper(px);
        }
    "})
    .unwrap();

    // every call site binds p to px: the unpack init hoists into the
    // kernel, rewritten in caller terms
    assert_eq!(count(&out, "__unpack_binary_init(px, px);"), 1);
    assert_eq!(count(&out, "__unpack_binary_init(p, p);"), 0);
    let kernel_at = out.find("void kernel").unwrap();
    assert!(out.find("__unpack_binary_init(px, px)").unwrap() > kernel_at);
}

#[test]
fn unresolvable_arguments_insert_at_the_statement_itself() {
    let out = run(indoc! {"
        void kernel(pipe<T> px, pipe<T> py, uint32 n) {
            math<T> acc;
            acc.pack(0, n ? px : py);
        }
    "})
    .unwrap();

    // the pack argument is neither a literal nor a parameter reference, so
    // nothing hoists; the init lands directly before the call with the
    // source expression
    assert_eq!(count(&out, "__pack_init(n ? px : py);"), 1);
    let init_at = out.find("__pack_init").unwrap();
    let call_at = out.find("acc.pack").unwrap();
    assert!(init_at < call_at);
    let decl_at = out.find("math<T> acc").unwrap();
    assert!(init_at > decl_at);
}

#[test]
fn sfpu_primitives_get_their_init_group() {
    let out = run(indoc! {"
        void kernel(pipe<T> px) {
            math<T> acc;
            acc.copy(px, 0, 0);
            acc.sqrt(0);
        }
    "})
    .unwrap();
    assert_eq!(count(&out, "__sqrt_init();"), 1);
    assert_eq!(count(&out, "__copy_init();"), 1);
    assert_eq!(count(&out, "__unpack_unary_init(px);"), 1);
}
