//! Statement-graph builder.
//!
//! Walks one parsed unit and populates the graph: every function definition
//! becomes a function node with its parameters enumerated in order, every
//! reachable statement or expression becomes a statement node linked to its
//! parent in source order. Declarations synthesize one statement node per
//! declared variable so later passes can treat the declaration as a
//! first-class statement with a `decl_ref` at the variable; initializer
//! expressions hang off that synthetic node (also inside `for`
//! initializers).
//!
//! Functions that are referenced but never defined (the builtin free
//! functions) get extern function nodes so call sites resolve; they never
//! join the graph's function list.

use std::collections::HashMap;

use indexmap::IndexMap;
use tree_sitter::Node;

use tanto_core::{FuncId, StmtClass, StmtGraph, StmtId, VarId};

use crate::tooling::consteval::eval_int;
use crate::tooling::unit::{
    SourceUnit, declaration_declarators, declarator_name, function_name, function_params,
    named_children, stmt_class_of, unwrap_condition, unwrap_else,
};
use crate::tooling::Semantics;
use crate::{Error, Result};

/// Build the statement graph for `unit`. Fails when no `kernel` function is
/// defined or when two functions claim the name.
pub fn build(unit: &SourceUnit, sem: &Semantics) -> Result<StmtGraph> {
    let mut builder = Builder {
        unit,
        sem,
        graph: StmtGraph::new(),
        funcs: IndexMap::new(),
        vars: HashMap::new(),
    };
    builder.run()?;
    Ok(builder.graph)
}

struct Builder<'u> {
    unit: &'u SourceUnit,
    sem: &'u Semantics,
    graph: StmtGraph,
    /// Function name -> node, defined or extern.
    funcs: IndexMap<String, FuncId>,
    /// Resolved variable definition (by declarator byte) -> var node.
    vars: HashMap<usize, VarId>,
}

impl<'u> Builder<'u> {
    fn run(&mut self) -> Result<()> {
        let root = self.unit.root();
        let defs: Vec<Node<'u>> = named_children(root)
            .into_iter()
            .filter(|n| n.kind() == "function_definition")
            .collect();

        // register every defined function first so forward references
        // resolve regardless of definition order
        let mut defined: Vec<FuncId> = Vec::new();
        for def in &defs {
            if let Some(name) = function_name(self.unit, *def) {
                let id = self.enter_func(name, *def);
                self.enter_params(id, *def);
                defined.push(id);
            }
        }

        for def in &defs {
            let Some(name) = function_name(self.unit, *def) else {
                continue;
            };
            let func = self.funcs[name];
            if let Some(body) = def.child_by_field_name("body") {
                let top = self.build_stmt(body, None);
                if let Some(top) = top {
                    self.graph.func_mut(func).top_stmt = Some(top);
                }
            }
        }

        let mut main: Option<FuncId> = None;
        for func in defined {
            if self.graph.func(func).top_stmt.is_none() {
                continue;
            }
            self.graph.add_func(func);
            if self.graph.func(func).name == "kernel" {
                if main.is_some() {
                    return Err(Error::Input("Duplicate main function".into()));
                }
                main = Some(func);
            }
        }
        match main {
            Some(func) => self.graph.set_main_func(func),
            None => return Err(Error::Input("Missing main function".into())),
        }
        Ok(())
    }

    /// Function node by name, created on first sight. Callees with no
    /// definition here (the builtin free functions) stay extern: no top
    /// statement, never listed in the graph.
    fn enter_func(&mut self, name: &str, node: Node<'u>) -> FuncId {
        if let Some(&id) = self.funcs.get(name) {
            return id;
        }
        let span = self.unit.span(node);
        let id = self.graph.add_func_node(name, span);
        self.funcs.insert(name.to_string(), id);
        id
    }

    fn enter_params(&mut self, func: FuncId, def: Node<'u>) {
        for (index, param) in function_params(def).iter().enumerate() {
            let Some(declarator) = param.child_by_field_name("declarator") else {
                continue;
            };
            let Some((name, name_node)) = declarator_name(self.unit, declarator) else {
                continue;
            };
            let span = self.unit.span(name_node);
            let var = self.graph.add_var(name, span);
            self.graph.var_mut(var).param_index = Some(index as u32);
            self.vars.insert(name_node.start_byte(), var);
            self.graph.func_mut(func).params.push(var);
        }
    }

    /// Var node for the definition visible at `node`, created on first use.
    fn var_for(&mut self, node: Node<'u>) -> Option<VarId> {
        let def = self
            .sem
            .types
            .resolve(self.unit.node_text(node), node.start_byte())?;
        if let Some(&id) = self.vars.get(&def.byte) {
            return Some(id);
        }
        let id = self.graph.add_var(def.name.clone(), def.span);
        self.graph.var_mut(id).param_index = def.param_index;
        self.vars.insert(def.byte, id);
        Some(id)
    }

    fn build_stmt(&mut self, node: Node<'u>, parent: Option<StmtId>) -> Option<StmtId> {
        if node.kind() == "expression_statement" {
            let inner = named_children(node).into_iter().next()?;
            return self.build_stmt(inner, parent);
        }
        let class = stmt_class_of(node)?;
        let id = self.graph.add_stmt(class, self.unit.span(node));
        if let Some(parent) = parent {
            self.graph.add_child(parent, id);
        }
        match class {
            StmtClass::Compound => {
                for child in named_children(node) {
                    self.build_stmt(child, Some(id));
                }
            }
            StmtClass::If => {
                if let Some(cond) = node
                    .child_by_field_name("condition")
                    .and_then(unwrap_condition)
                {
                    self.build_stmt(cond, Some(id));
                }
                if let Some(then) = node.child_by_field_name("consequence") {
                    self.build_stmt(then, Some(id));
                }
                if let Some(alt) = node.child_by_field_name("alternative").and_then(unwrap_else) {
                    self.build_stmt(alt, Some(id));
                }
            }
            StmtClass::For => {
                if let Some(init) = node.child_by_field_name("initializer") {
                    self.build_stmt(init, Some(id));
                }
                if let Some(cond) = node.child_by_field_name("condition") {
                    self.build_stmt(cond, Some(id));
                }
                if let Some(update) = node.child_by_field_name("update") {
                    self.build_stmt(update, Some(id));
                }
                if let Some(body) = node
                    .child_by_field_name("body")
                    .or_else(|| named_children(node).into_iter().last())
                {
                    self.build_stmt(body, Some(id));
                }
            }
            StmtClass::While | StmtClass::Do => {
                if let Some(cond) = node
                    .child_by_field_name("condition")
                    .and_then(unwrap_condition)
                {
                    self.build_stmt(cond, Some(id));
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.build_stmt(body, Some(id));
                }
            }
            StmtClass::DeclStmt => {
                self.build_decl(node, id);
            }
            StmtClass::Call | StmtClass::MemberCall => {
                self.build_call(node, id, class);
            }
            StmtClass::Member => {
                self.build_member(node, id);
            }
            _ => {
                self.fill_expr_attrs(node, id);
                for child in named_children(node) {
                    self.build_stmt(child, Some(id));
                }
            }
        }
        Some(id)
    }

    /// One synthetic statement per declared variable, carrying the
    /// variable reference; the initializer expression becomes its child.
    fn build_decl(&mut self, node: Node<'u>, id: StmtId) {
        for declarator in declaration_declarators(node) {
            let Some((_, name_node)) = declarator_name(self.unit, declarator) else {
                continue;
            };
            let span = self.unit.span(declarator);
            let synth = self.graph.add_stmt(StmtClass::DeclRef, span);
            self.graph.add_child(id, synth);
            if let Some(var) = self.var_for(name_node) {
                self.graph.stmt_mut(synth).decl_ref = Some(var);
            }
            if declarator.kind() == "init_declarator" {
                if let Some(value) = declarator.child_by_field_name("value") {
                    self.build_stmt(value, Some(synth));
                }
            }
        }
    }

    fn build_call(&mut self, node: Node<'u>, id: StmtId, class: StmtClass) {
        let function = node.child_by_field_name("function");
        match class {
            StmtClass::Call => {
                if let Some(callee) = function {
                    let callee_id = self
                        .graph
                        .add_stmt(StmtClass::DeclRef, self.unit.span(callee));
                    self.graph.add_child(id, callee_id);
                    if callee.kind() == "identifier" {
                        let name = self.unit.node_text(callee).to_string();
                        let func = self.enter_func(&name, callee);
                        self.graph.stmt_mut(callee_id).func_ref = Some(func);
                    }
                }
            }
            _ => {
                if let Some(member) = function {
                    self.build_stmt(member, Some(id));
                }
            }
        }
        if let Some(arguments) = node.child_by_field_name("arguments") {
            for arg in named_children(arguments) {
                if let Some(arg_id) = self.build_stmt(arg, Some(id)) {
                    let code = self.unit.node_text(arg).to_string();
                    self.graph.stmt_mut(arg_id).code = Some(code);
                }
            }
        }
    }

    fn build_member(&mut self, node: Node<'u>, id: StmtId) {
        if let Some(field) = node.child_by_field_name("field") {
            let name = self.unit.node_text(field).to_string();
            self.graph.stmt_mut(id).member_name = Some(name);
        }
        if let Some(object) = node.child_by_field_name("argument") {
            self.build_stmt(object, Some(id));
        }
    }

    fn fill_expr_attrs(&mut self, node: Node<'u>, id: StmtId) {
        match node.kind() {
            "identifier" => {
                let class = self
                    .sem
                    .types
                    .resolve(self.unit.node_text(node), node.start_byte())
                    .and_then(|def| def.ty.class_name());
                if let Some(var) = self.var_for(node) {
                    self.graph.stmt_mut(id).decl_ref = Some(var);
                }
                if let Some(class) = class {
                    self.graph.stmt_mut(id).type_name = Some(class.to_string());
                }
            }
            "number_literal" => {
                if let Some(value) = eval_int(self.unit, node, &self.sem.consts) {
                    self.graph.stmt_mut(id).int_literal = Some(value);
                }
            }
            "true" => self.graph.stmt_mut(id).bool_literal = Some(true),
            "false" => self.graph.stmt_mut(id).bool_literal = Some(false),
            _ => {}
        }
        if let Some(value) = eval_int(self.unit, node, &self.sem.consts) {
            self.graph.stmt_mut(id).int_const_expr = Some(value);
        }
    }
}
