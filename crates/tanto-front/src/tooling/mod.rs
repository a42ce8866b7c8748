//! AST tooling facade.
//!
//! Wraps the external parser behind a small surface the passes use:
//! - `unit` - parse a translation unit, classify nodes, report diagnostics
//! - `types` - dialect types, defines, and scoped name resolution
//! - `consteval` - integer constant-expression evaluation
//! - `rewrite` - pattern rules, textual edits, transactional application
//! - `format` - output reflow
//!
//! The parser is purely syntactic, so the semantic layers the passes need
//! (symbol table, define expansion, constant folding) live here too.

pub mod consteval;
pub mod format;
pub mod rewrite;
pub mod types;
pub mod unit;

#[cfg(test)]
mod consteval_tests;
#[cfg(test)]
mod format_tests;
#[cfg(test)]
mod rewrite_tests;
#[cfg(test)]
mod types_tests;
#[cfg(test)]
mod unit_tests;

pub use consteval::ConstTable;
pub use format::format_code;
pub use rewrite::{Edit, Rule, RuleCx, RuleSet, rewrite};
pub use types::{DataKind, DefineTable, DialectType, Distrib, TypeTable, VarDef};
pub use unit::SourceUnit;

/// Semantic layers derived from one parsed unit.
pub struct Semantics {
    pub defines: DefineTable,
    pub types: TypeTable,
    pub consts: ConstTable,
}

impl Semantics {
    pub fn build(unit: &SourceUnit) -> Self {
        let defines = DefineTable::from_unit(unit);
        let types = TypeTable::build(unit, &defines);
        let consts = ConstTable::build(unit, &defines);
        Self {
            defines,
            types,
            consts,
        }
    }
}
