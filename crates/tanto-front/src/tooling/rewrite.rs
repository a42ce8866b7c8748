//! Pattern rules and transactional text edits.
//!
//! A rewrite runs a first-match rule list over every node of a parsed unit,
//! collects the textual edits produced by matching rules, then applies the
//! whole set at once. Edits are sorted into canonical order and identical
//! duplicates are dropped; overlapping edits abort the rewrite, so partial
//! output is never produced.

use std::ops::Range;

use tree_sitter::Node;

use super::unit::{SourceUnit, walk_nodes};
use super::Semantics;
use crate::{Error, Result};

/// One textual edit: replace `start..end` with `text`. An insertion has
/// `start == end`; a removal has empty `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl Edit {
    pub fn replace(range: Range<usize>, text: impl Into<String>) -> Edit {
        Edit {
            start: range.start,
            end: range.end,
            text: text.into(),
        }
    }

    pub fn insert(at: usize, text: impl Into<String>) -> Edit {
        Edit {
            start: at,
            end: at,
            text: text.into(),
        }
    }

    pub fn remove(range: Range<usize>) -> Edit {
        Edit {
            start: range.start,
            end: range.end,
            text: String::new(),
        }
    }

}

/// Context handed to rule callbacks.
pub struct RuleCx<'u> {
    pub unit: &'u SourceUnit,
    pub sem: &'u Semantics,
}

type RuleFn = Box<dyn for<'t> Fn(&RuleCx<'t>, Node<'t>) -> Option<Result<Vec<Edit>>>>;

/// One pattern -> edit rule. The callback returns `None` when the node does
/// not match, and the edits (or a rule error) when it does.
pub struct Rule {
    pub name: &'static str,
    f: RuleFn,
}

impl Rule {
    pub fn new(
        name: &'static str,
        f: impl for<'t> Fn(&RuleCx<'t>, Node<'t>) -> Option<Result<Vec<Edit>>> + 'static,
    ) -> Rule {
        Rule { name, f: Box::new(f) }
    }

    fn try_match(&self, cx: &RuleCx<'_>, node: Node<'_>) -> Option<Result<Vec<Edit>>> {
        (self.f)(cx, node)
    }
}

/// An ordered rule list composed with first-match semantics: for every node,
/// the first matching rule wins and the rest are not consulted.
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> RuleSet {
        RuleSet { rules }
    }
}

/// Run `rules` over `unit` and produce the rewritten text.
pub fn rewrite(unit: &SourceUnit, sem: &Semantics, rules: &RuleSet) -> Result<String> {
    let cx = RuleCx { unit, sem };
    let mut edits: Vec<Edit> = Vec::new();
    let mut failure: Option<Error> = None;
    walk_nodes(unit.root(), &mut |node| {
        if failure.is_some() {
            return;
        }
        for rule in &rules.rules {
            match rule.try_match(&cx, node) {
                None => continue,
                Some(Ok(e)) => {
                    edits.extend(e);
                    break;
                }
                Some(Err(err)) => {
                    failure = Some(err);
                    break;
                }
            }
        }
    });
    if let Some(err) = failure {
        return Err(err);
    }
    apply_edits(unit.text(), edits)
}

/// Apply a set of edits to `text` transactionally.
pub fn apply_edits(text: &str, mut edits: Vec<Edit>) -> Result<String> {
    edits.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));
    edits.dedup();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0usize;
    for edit in &edits {
        if edit.end > text.len() {
            return Err(Error::Apply(format!(
                "edit range {}..{} exceeds text length {}",
                edit.start,
                edit.end,
                text.len()
            )));
        }
        if edit.start < pos {
            // a deletion entirely inside an already-consumed region is
            // subsumed by whatever consumed it (nested dead branches)
            if edit.text.is_empty() && edit.end <= pos {
                continue;
            }
            return Err(Error::Apply(format!(
                "conflicting edits at byte {}",
                edit.start
            )));
        }
        out.push_str(&text[pos..edit.start]);
        out.push_str(&edit.text);
        pos = edit.end;
    }
    out.push_str(&text[pos..]);
    Ok(out)
}
