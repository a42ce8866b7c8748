//! Tanto kernel frontend.
//!
//! A source-to-source translator that lowers the tile-programming dialect
//! (a strict C++ subset) into one of three kernel flavors for the bare-metal
//! tile runtime:
//! - `compute` - math kernels wrapped in a `MAIN` block
//! - `read` / `write` - dataflow kernels around `kernel_main`
//!
//! Pipeline: parse (`tooling`) -> statement graph (`graph_build`) ->
//! dead-code and math-init passes (`passes`) -> rewrite rules (`rules`) ->
//! boilerplate assembly and formatting (`frontend`).

pub mod frontend;
pub mod graph_build;
pub mod graph_sort;
pub mod passes;
pub mod query;
pub mod rules;
pub mod tooling;

#[cfg(test)]
mod frontend_tests;
#[cfg(test)]
mod graph_sort_tests;
#[cfg(test)]
mod query_tests;

pub use frontend::{Frontend, Mode};

/// Errors raised by frontend phases, least to most general.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The parser reported diagnostics at error severity.
    #[error("parse error:\n{0}")]
    Parse(String),

    /// A named binding required by a matcher was absent.
    #[error("missing matcher binding `{0}`")]
    Match(String),

    /// Stencil or range evaluation failed while building edits.
    #[error("rule evaluation failed: {0}")]
    Rule(String),

    /// Conflicting or non-applicable edits.
    #[error("applying changes failed: {0}")]
    Apply(String),

    /// The output formatter refused to reflow the text.
    #[error("formatting failed: {0}")]
    Format(String),

    /// Invalid input: missing `kernel`, bad parameter, bad substitution.
    #[error("{0}")]
    Input(String),

    /// A builtin's argument descriptor does not match the call arity.
    #[error("{0}")]
    Shape(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Compilation request for [`run_frontend`].
#[derive(Debug, Clone)]
pub struct FrontendArgs {
    pub mode: Mode,
    /// Preprocessor defines, emitted as `#define name value` in order.
    pub defines: Vec<(String, String)>,
    /// Compile-time parameter substitutions `(index, value)`.
    pub params: Vec<(u32, u32)>,
}

/// Compiler entry point: lowers `input_code` according to `args`.
///
/// On success returns the emitted kernel text; on failure the ordered list
/// of error strings collected by the session.
pub fn run_frontend(
    args: &FrontendArgs,
    input_code: &str,
) -> std::result::Result<String, Vec<String>> {
    let mut frontend = Frontend::new();
    for (name, value) in &args.defines {
        frontend.add_define(name.clone(), value.clone());
    }
    for &(index, value) in &args.params {
        frontend.add_param(index, value);
    }
    frontend.compile(args.mode, input_code)
}
