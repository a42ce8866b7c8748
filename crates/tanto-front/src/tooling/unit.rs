//! Parsed translation unit and node classification.

use annotate_snippets::{AnnotationKind, Level, Renderer, Snippet};
use tree_sitter::{Node, Parser, Tree};

use tanto_core::{Span, StmtClass};

use crate::{Error, Result};

/// One parsed translation unit: the source text plus its syntax tree.
#[derive(Debug)]
pub struct SourceUnit {
    text: String,
    tree: Tree,
}

impl SourceUnit {
    /// Parse `text`. Fails with [`Error::Parse`] when the parser reports
    /// syntax errors or missing tokens.
    pub fn parse(text: impl Into<String>) -> Result<SourceUnit> {
        let text = text.into();
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_cpp::LANGUAGE.into())
            .map_err(|e| Error::Parse(format!("language setup failed: {e}")))?;
        let tree = parser
            .parse(&text, None)
            .ok_or_else(|| Error::Parse("parser produced no tree".into()))?;
        let unit = SourceUnit { text, tree };
        let diagnostics = unit.parse_diagnostics();
        if !diagnostics.is_empty() {
            return Err(Error::Parse(unit.render_diagnostics(&diagnostics)));
        }
        Ok(unit)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn node_text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.text.as_bytes()).unwrap_or("")
    }

    /// 1-based line/column span of a node.
    pub fn span(&self, node: Node<'_>) -> Span {
        let begin = node.start_position();
        let end = node.end_position();
        Span::new(
            begin.row as u32 + 1,
            begin.column as u32 + 1,
            end.row as u32 + 1,
            end.column as u32 + 1,
        )
    }

    fn parse_diagnostics(&self) -> Vec<(std::ops::Range<usize>, &'static str)> {
        let mut found = Vec::new();
        collect_errors(self.root(), &mut found);
        found
    }

    fn render_diagnostics(&self, found: &[(std::ops::Range<usize>, &'static str)]) -> String {
        let mut out = String::new();
        let renderer = Renderer::plain();
        for (range, label) in found.iter().take(8) {
            let range = clamp_range(range.clone(), self.text.len());
            let snippet = Snippet::source(&self.text)
                .line_start(1)
                .annotation(AnnotationKind::Primary.span(range).label(*label));
            let report = [Level::ERROR.primary_title("syntax error").element(snippet)];
            out.push_str(&renderer.render(&report));
            out.push('\n');
        }
        out
    }
}

fn collect_errors(node: Node<'_>, out: &mut Vec<(std::ops::Range<usize>, &'static str)>) {
    if node.is_error() {
        out.push((node.byte_range(), "unexpected token"));
        return;
    }
    if node.is_missing() {
        out.push((node.byte_range(), "missing token"));
        return;
    }
    if !node.has_error() {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_errors(child, out);
    }
}

fn clamp_range(range: std::ops::Range<usize>, limit: usize) -> std::ops::Range<usize> {
    let start = range.start.min(limit);
    let mut end = range.end.min(limit);
    if start == end {
        end = (start + 1).min(limit);
    }
    start..end
}

/// Named children of a node in order, comments excluded.
pub fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

/// Preorder walk of every node under `root` (including `root`).
pub fn walk_nodes<'t>(root: Node<'t>, f: &mut impl FnMut(Node<'t>)) {
    f(root);
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        walk_nodes(child, f);
    }
}

/// Map a parser node to its statement class. Returns `None` for nodes that
/// are not statements or expressions (types, declarators, punctuation) and
/// for the transparent `expression_statement` wrapper.
pub fn stmt_class_of(node: Node<'_>) -> Option<StmtClass> {
    let class = match node.kind() {
        "compound_statement" => StmtClass::Compound,
        "if_statement" => StmtClass::If,
        "for_statement" => StmtClass::For,
        "while_statement" => StmtClass::While,
        "do_statement" => StmtClass::Do,
        "return_statement" => StmtClass::Return,
        "break_statement" => StmtClass::Break,
        "continue_statement" => StmtClass::Continue,
        "declaration" => StmtClass::DeclStmt,
        "call_expression" => {
            if node
                .child_by_field_name("function")
                .is_some_and(|f| f.kind() == "field_expression")
            {
                StmtClass::MemberCall
            } else {
                StmtClass::Call
            }
        }
        "field_expression" => StmtClass::Member,
        "identifier" => StmtClass::DeclRef,
        "number_literal" => StmtClass::IntLiteral,
        "true" | "false" => StmtClass::BoolLiteral,
        "binary_expression" => StmtClass::Binary,
        "unary_expression" | "update_expression" => StmtClass::Unary,
        "assignment_expression" => StmtClass::Assign,
        "conditional_expression" => StmtClass::Cond,
        "parenthesized_expression" => StmtClass::Paren,
        "subscript_expression" => StmtClass::Subscript,
        "cast_expression" | "pointer_expression" | "sizeof_expression" | "comma_expression"
        | "char_literal" | "string_literal" | "concatenated_string" | "template_function"
        | "qualified_identifier" | "initializer_list" => StmtClass::Other,
        _ => return None,
    };
    Some(class)
}

/// Byte range of the statement a node spells: the enclosing
/// `expression_statement` when there is one (so the trailing semicolon is
/// included), the node itself otherwise.
pub fn statement_range(node: Node<'_>) -> std::ops::Range<usize> {
    match node.parent() {
        Some(parent) if parent.kind() == "expression_statement" => parent.byte_range(),
        _ => node.byte_range(),
    }
}

/// Byte range between the braces of a compound statement.
pub fn inside_range(compound: Node<'_>) -> std::ops::Range<usize> {
    let start = compound.start_byte() + 1;
    let end = compound.end_byte().saturating_sub(1).max(start);
    start..end
}

/// The expression inside an `if`/`while` condition, unwrapping the
/// condition clause or parentheses the grammar inserts.
pub fn unwrap_condition(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "condition_clause" | "parenthesized_expression" => node
            .child_by_field_name("value")
            .or_else(|| named_children(node).into_iter().last()),
        _ => Some(node),
    }
}

/// True when the condition carries its own declaration or initializer
/// (`if (auto x = ...)`, `if (init; cond)`).
pub fn condition_has_decl(node: Node<'_>) -> bool {
    if node.kind() != "condition_clause" {
        return false;
    }
    if node.child_by_field_name("initializer").is_some() {
        return true;
    }
    named_children(node)
        .iter()
        .any(|c| c.kind() == "declaration")
}

/// The statement of an `else` branch, unwrapping the `else_clause` node.
pub fn unwrap_else(node: Node<'_>) -> Option<Node<'_>> {
    match node.kind() {
        "else_clause" => named_children(node).into_iter().next(),
        _ => Some(node),
    }
}

/// Name of the variable a declarator introduces.
pub fn declarator_name<'t>(unit: &'t SourceUnit, node: Node<'t>) -> Option<(&'t str, Node<'t>)> {
    match node.kind() {
        "identifier" | "field_identifier" => Some((unit.node_text(node), node)),
        "init_declarator"
        | "pointer_declarator"
        | "array_declarator"
        | "function_declarator"
        | "reference_declarator"
        | "parenthesized_declarator" => {
            let inner = node
                .child_by_field_name("declarator")
                .or_else(|| named_children(node).into_iter().next())?;
            declarator_name(unit, inner)
        }
        _ => None,
    }
}

/// Declarator children of a `declaration` node (one per declared variable).
pub fn declaration_declarators(node: Node<'_>) -> Vec<Node<'_>> {
    named_children(node)
        .into_iter()
        .filter(|c| {
            matches!(
                c.kind(),
                "init_declarator"
                    | "identifier"
                    | "pointer_declarator"
                    | "array_declarator"
                    | "reference_declarator"
            )
        })
        .collect()
}

/// Name of a defined function, from its declarator.
pub fn function_name<'t>(unit: &'t SourceUnit, def: Node<'t>) -> Option<&'t str> {
    let declarator = def.child_by_field_name("declarator")?;
    let declarator = if declarator.kind() == "function_declarator" {
        declarator
    } else {
        // pointer return types wrap the function declarator
        let mut cur = declarator;
        loop {
            match cur.child_by_field_name("declarator") {
                Some(inner) if inner.kind() == "function_declarator" => break inner,
                Some(inner) => cur = inner,
                None => return None,
            }
        }
    };
    let name = declarator.child_by_field_name("declarator")?;
    declarator_name(unit, name).map(|(n, _)| n)
}

/// Parameter declarations of a defined function, in order.
pub fn function_params(def: Node<'_>) -> Vec<Node<'_>> {
    let Some(declarator) = def.child_by_field_name("declarator") else {
        return Vec::new();
    };
    let declarator = if declarator.kind() == "function_declarator" {
        declarator
    } else {
        match find_function_declarator(declarator) {
            Some(d) => d,
            None => return Vec::new(),
        }
    };
    let Some(params) = declarator.child_by_field_name("parameters") else {
        return Vec::new();
    };
    named_children(params)
        .into_iter()
        .filter(|p| p.kind() == "parameter_declaration")
        .collect()
}

fn find_function_declarator(node: Node<'_>) -> Option<Node<'_>> {
    if node.kind() == "function_declarator" {
        return Some(node);
    }
    let inner = node.child_by_field_name("declarator")?;
    find_function_declarator(inner)
}
