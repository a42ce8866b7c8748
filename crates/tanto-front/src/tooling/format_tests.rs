//! Unit tests for the output formatter.

use indoc::indoc;
use pretty_assertions::assert_eq;

use super::format::format_code;
use crate::Error;

#[test]
fn reflows_statements_one_per_line() {
    let out = format_code("void f() { x = 1; g(2, 3); }").unwrap();
    assert_eq!(
        out,
        indoc! {"
            void f() {
                x = 1;
                g(2, 3);
            }
        "}
    );
}

#[test]
fn splits_glued_statements() {
    let out = format_code("a();b();").unwrap();
    assert_eq!(out, "a();\nb();\n");
}

#[test]
fn nested_blocks_indent() {
    let out = format_code("void f() { if (x) { g(); } }").unwrap();
    assert_eq!(
        out,
        indoc! {"
            void f() {
                if (x) {
                    g();
                }
            }
        "}
    );
}

#[test]
fn for_header_semicolons_stay_inline() {
    let out = format_code("void f() { for (uint32 i = 0; i < n; i++) { g(); } }").unwrap();
    assert!(out.contains("for (uint32 i = 0; i < n; i++) {"));
}

#[test]
fn token_adjacency_is_preserved() {
    let out = format_code("uint32 x = get_arg_val<uint32>(0);").unwrap();
    assert_eq!(out, "uint32 x = get_arg_val<uint32>(0);\n");
}

#[test]
fn preprocessor_lines_stand_alone() {
    let out = format_code("#define T bfloat16\nvoid f() { }").unwrap();
    assert!(out.starts_with("#define T bfloat16\n"));
}

#[test]
fn comments_keep_their_line() {
    let out = format_code("// SPDX-License-Identifier: Apache-2.0\nvoid f() { }").unwrap();
    assert!(out.starts_with("// SPDX-License-Identifier: Apache-2.0\n"));
}

#[test]
fn else_attaches_to_closing_brace() {
    let out = format_code("void f() { if (x) { g(); } else { h(); } }").unwrap();
    assert!(out.contains("} else {"));
}

#[test]
fn formatting_is_idempotent() {
    let once = format_code("void f() { if (x) { g(); } else { h(); } }").unwrap();
    let twice = format_code(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn unknown_bytes_are_rejected() {
    match format_code("int x = `;") {
        Err(Error::Format(_)) => {}
        other => panic!("expected format error, got {other:?}"),
    }
}
