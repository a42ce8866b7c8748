//! Statement graph.
//!
//! A language-neutral view of the input kernel: functions, their parameters,
//! and a tree of statement nodes. The underlying parser exposes dozens of
//! node kinds; the graph collapses them to the small set downstream passes
//! reason about, keyed by source order rather than parser internals.
//!
//! Nodes live in arenas owned by the graph and are addressed by index
//! newtypes. Children of a statement form a doubly-linked list in source
//! order; every statement has at most one parent. Nothing mutates spans,
//! names, or class tags after the builder finishes.

use std::fmt::Write;

use crate::span::{Span, StmtKey};

/// Index of a statement node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StmtId(u32);

/// Index of a variable/parameter node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct VarId(u32);

/// Index of a function node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FuncId(u32);

impl StmtId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl VarId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl FuncId {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Statement class tag.
///
/// `Member` is the callee part of a member call; `DeclRef` covers both
/// identifier expressions and the synthetic per-variable declaration
/// statements the builder creates for `decl` statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StmtClass {
    Compound,
    If,
    For,
    While,
    Do,
    Return,
    Break,
    Continue,
    DeclStmt,
    Call,
    MemberCall,
    Member,
    DeclRef,
    IntLiteral,
    BoolLiteral,
    Binary,
    Unary,
    Assign,
    Cond,
    Paren,
    Subscript,
    Other,
}

impl StmtClass {
    pub fn name(self) -> &'static str {
        match self {
            StmtClass::Compound => "CompoundStmt",
            StmtClass::If => "IfStmt",
            StmtClass::For => "ForStmt",
            StmtClass::While => "WhileStmt",
            StmtClass::Do => "DoStmt",
            StmtClass::Return => "ReturnStmt",
            StmtClass::Break => "BreakStmt",
            StmtClass::Continue => "ContinueStmt",
            StmtClass::DeclStmt => "DeclStmt",
            StmtClass::Call => "CallExpr",
            StmtClass::MemberCall => "MemberCallExpr",
            StmtClass::Member => "MemberExpr",
            StmtClass::DeclRef => "DeclRefExpr",
            StmtClass::IntLiteral => "IntegerLiteral",
            StmtClass::BoolLiteral => "BoolLiteral",
            StmtClass::Binary => "BinaryOperator",
            StmtClass::Unary => "UnaryOperator",
            StmtClass::Assign => "AssignOperator",
            StmtClass::Cond => "ConditionalOperator",
            StmtClass::Paren => "ParenExpr",
            StmtClass::Subscript => "SubscriptExpr",
            StmtClass::Other => "Stmt",
        }
    }
}

/// A statement or expression node.
#[derive(Debug, Clone)]
pub struct StmtNode {
    pub class: StmtClass,
    pub span: Span,
    /// Source text, recorded for call arguments only.
    pub code: Option<String>,
    /// Base class name when the expression has a class type.
    pub type_name: Option<String>,
    /// Member name when this is a member access.
    pub member_name: Option<String>,
    /// Variable this expression names, if any.
    pub decl_ref: Option<VarId>,
    /// Function this expression names, if any.
    pub func_ref: Option<FuncId>,
    pub bool_literal: Option<bool>,
    pub int_literal: Option<i64>,
    pub int_const_expr: Option<i64>,
    pub parent: Option<StmtId>,
    pub prev: Option<StmtId>,
    pub next: Option<StmtId>,
    pub first_child: Option<StmtId>,
    pub last_child: Option<StmtId>,
}

impl StmtNode {
    fn new(class: StmtClass, span: Span) -> Self {
        Self {
            class,
            span,
            code: None,
            type_name: None,
            member_name: None,
            decl_ref: None,
            func_ref: None,
            bool_literal: None,
            int_literal: None,
            int_const_expr: None,
            parent: None,
            prev: None,
            next: None,
            first_child: None,
            last_child: None,
        }
    }

    pub fn key(&self) -> StmtKey {
        StmtKey::new(self.class, self.span)
    }
}

/// A variable or formal parameter.
#[derive(Debug, Clone)]
pub struct VarNode {
    pub name: String,
    pub span: Span,
    /// Position within the enclosing function's parameter list, if a formal
    /// parameter.
    pub param_index: Option<u32>,
}

/// A function.
///
/// Functions without a body are kept only so references resolve; they never
/// join the graph's function list.
#[derive(Debug, Clone)]
pub struct FuncNode {
    pub name: String,
    pub span: Span,
    pub params: Vec<VarId>,
    pub top_stmt: Option<StmtId>,
}

/// Ownership root for one compilation's statement graph.
#[derive(Debug, Default)]
pub struct StmtGraph {
    stmts: Vec<StmtNode>,
    vars: Vec<VarNode>,
    func_nodes: Vec<FuncNode>,
    /// Functions with bodies, in source order.
    funcs: Vec<FuncId>,
    main_func: Option<FuncId>,
}

impl StmtGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stmt(&mut self, class: StmtClass, span: Span) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(StmtNode::new(class, span));
        id
    }

    pub fn add_var(&mut self, name: impl Into<String>, span: Span) -> VarId {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(VarNode {
            name: name.into(),
            span,
            param_index: None,
        });
        id
    }

    pub fn add_func_node(&mut self, name: impl Into<String>, span: Span) -> FuncId {
        let id = FuncId(self.func_nodes.len() as u32);
        self.func_nodes.push(FuncNode {
            name: name.into(),
            span,
            params: Vec::new(),
            top_stmt: None,
        });
        id
    }

    /// Add a function with a body to the graph's function list.
    pub fn add_func(&mut self, func: FuncId) {
        self.funcs.push(func);
    }

    pub fn set_main_func(&mut self, func: FuncId) {
        self.main_func = Some(func);
    }

    pub fn main_func(&self) -> Option<FuncId> {
        self.main_func
    }

    pub fn funcs(&self) -> &[FuncId] {
        &self.funcs
    }

    pub fn stmt(&self, id: StmtId) -> &StmtNode {
        &self.stmts[id.index()]
    }

    pub fn stmt_mut(&mut self, id: StmtId) -> &mut StmtNode {
        &mut self.stmts[id.index()]
    }

    pub fn var(&self, id: VarId) -> &VarNode {
        &self.vars[id.index()]
    }

    pub fn var_mut(&mut self, id: VarId) -> &mut VarNode {
        &mut self.vars[id.index()]
    }

    pub fn func(&self, id: FuncId) -> &FuncNode {
        &self.func_nodes[id.index()]
    }

    pub fn func_mut(&mut self, id: FuncId) -> &mut FuncNode {
        &mut self.func_nodes[id.index()]
    }

    /// Append `child` to the child list of `parent`.
    pub fn add_child(&mut self, parent: StmtId, child: StmtId) {
        let last = self.stmts[parent.index()].last_child;
        {
            let c = &mut self.stmts[child.index()];
            c.parent = Some(parent);
            c.prev = last;
            c.next = None;
        }
        match last {
            Some(last) => self.stmts[last.index()].next = Some(child),
            None => self.stmts[parent.index()].first_child = Some(child),
        }
        self.stmts[parent.index()].last_child = Some(child);
    }

    /// Children of `stmt` in source order.
    pub fn children(&self, stmt: StmtId) -> ChildIter<'_> {
        ChildIter {
            graph: self,
            next: self.stmts[stmt.index()].first_child,
        }
    }

    /// Renders an indented dump of the graph, one node per line, with an
    /// optional annotation per statement.
    pub fn dump_with(&self, annot: impl Fn(StmtId) -> String) -> String {
        let mut out = String::new();
        out.push_str("Graph\n");
        for &func in &self.funcs {
            let f = self.func(func);
            let _ = writeln!(out, "  FunctionDecl [{}] at {}", f.name, f.span);
            for &param in &f.params {
                let v = self.var(param);
                let idx = v.param_index.map(|i| i as i64).unwrap_or(-1);
                let _ = writeln!(out, "    ParmVarDecl [{}] [{}] at {}", idx, v.name, v.span);
            }
            if let Some(top) = f.top_stmt {
                self.dump_stmt(&mut out, top, 2, &annot);
            }
        }
        out
    }

    pub fn dump(&self) -> String {
        self.dump_with(|_| String::new())
    }

    fn dump_stmt(
        &self,
        out: &mut String,
        stmt: StmtId,
        level: usize,
        annot: &impl Fn(StmtId) -> String,
    ) {
        let node = self.stmt(stmt);
        for _ in 0..level * 2 {
            out.push(' ');
        }
        let _ = write!(out, "{} at {}", node.class.name(), node.span);
        if let Some(code) = &node.code {
            let _ = write!(out, " code [{code}]");
        }
        if let Some(name) = &node.type_name {
            let _ = write!(out, " type [{name}]");
        }
        if let Some(name) = &node.member_name {
            let _ = write!(out, " member [{name}]");
        }
        if let Some(var) = node.decl_ref {
            let _ = write!(out, " decl [{}]", self.var(var).name);
        }
        if let Some(func) = node.func_ref {
            let _ = write!(out, " func [{}]", self.func(func).name);
        }
        if let Some(value) = node.bool_literal {
            let _ = write!(out, " bool [{value}]");
        }
        if let Some(value) = node.int_literal {
            let _ = write!(out, " int [{value}]");
        }
        if let Some(value) = node.int_const_expr {
            let _ = write!(out, " const [{value}]");
        }
        let extra = annot(stmt);
        if !extra.is_empty() {
            let _ = write!(out, " {extra}");
        }
        out.push('\n');
        let mut child = node.first_child;
        while let Some(c) = child {
            self.dump_stmt(out, c, level + 1, annot);
            child = self.stmt(c).next;
        }
    }
}

pub struct ChildIter<'g> {
    graph: &'g StmtGraph,
    next: Option<StmtId>,
}

impl Iterator for ChildIter<'_> {
    type Item = StmtId;

    fn next(&mut self) -> Option<StmtId> {
        let id = self.next?;
        self.next = self.graph.stmt(id).next;
        Some(id)
    }
}

/// Visitor over the graph in source order: functions, then parameters, then
/// the statement tree.
pub trait GraphVisitor {
    fn start_func(&mut self, _graph: &StmtGraph, _func: FuncId) {}
    fn end_func(&mut self, _graph: &StmtGraph, _func: FuncId) {}
    fn access_param(&mut self, _graph: &StmtGraph, _param: VarId) {}
    fn start_stmt(&mut self, _graph: &StmtGraph, _stmt: StmtId) {}
    fn end_stmt(&mut self, _graph: &StmtGraph, _stmt: StmtId) {}
}

pub fn walk_graph(graph: &StmtGraph, visitor: &mut impl GraphVisitor) {
    for &func in graph.funcs() {
        visitor.start_func(graph, func);
        for &param in &graph.func(func).params {
            visitor.access_param(graph, param);
        }
        if let Some(top) = graph.func(func).top_stmt {
            walk_stmt(graph, top, visitor);
        }
        visitor.end_func(graph, func);
    }
}

fn walk_stmt(graph: &StmtGraph, stmt: StmtId, visitor: &mut impl GraphVisitor) {
    visitor.start_stmt(graph, stmt);
    let mut child = graph.stmt(stmt).first_child;
    while let Some(c) = child {
        walk_stmt(graph, c, visitor);
        child = graph.stmt(c).next;
    }
    visitor.end_stmt(graph, stmt);
}

/// Preorder walk over every statement of every graph function.
pub fn for_each_stmt(graph: &StmtGraph, f: &mut impl FnMut(&StmtGraph, StmtId)) {
    struct V<'f, F: FnMut(&StmtGraph, StmtId)> {
        f: &'f mut F,
    }
    impl<F: FnMut(&StmtGraph, StmtId)> GraphVisitor for V<'_, F> {
        fn start_stmt(&mut self, graph: &StmtGraph, stmt: StmtId) {
            (self.f)(graph, stmt);
        }
    }
    walk_graph(graph, &mut V { f });
}
