//! Dialect types, defines, and scoped name resolution.
//!
//! The dialect uses a handful of opaque classes (`global<T, DIST, DRAM>`,
//! `local<T>`, `pipe<T>`, `semaphore`, `math<T>`, `param`) plus `int32`,
//! `uint32`, and `float`. The parser does not expand preprocessor defines,
//! so type and template-argument resolution looks through the define table
//! (`pipe<T>` with `#define T bfloat16` is a pipe of bfloat16).

use indexmap::IndexMap;
use tree_sitter::Node;

use tanto_core::Span;

use super::unit::{
    SourceUnit, declaration_declarators, declarator_name, function_params, named_children,
    walk_nodes,
};

/// Tile element type of a templated dialect class.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataKind {
    Uint32,
    Float,
    Bfloat16,
}

impl DataKind {
    /// Byte shift applied to element offsets (log2 of the element size).
    pub fn shift(self) -> u32 {
        match self {
            DataKind::Bfloat16 => 1,
            DataKind::Uint32 | DataKind::Float => 2,
        }
    }

    pub fn parse(name: &str) -> Option<DataKind> {
        match name {
            "uint32" | "uint32_t" | "unsigned int" => Some(DataKind::Uint32),
            "float" => Some(DataKind::Float),
            "bfloat16" => Some(DataKind::Bfloat16),
            _ => None,
        }
    }
}

/// Page distribution of a global buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Distrib {
    Linear,
    Block,
    Cyclic,
}

impl Distrib {
    pub fn suffix(self) -> &'static str {
        match self {
            Distrib::Linear => "linear",
            Distrib::Block => "block",
            Distrib::Cyclic => "cyclic",
        }
    }

    fn from_value(value: i64) -> Option<Distrib> {
        match value {
            0 => Some(Distrib::Linear),
            1 => Some(Distrib::Block),
            2 => Some(Distrib::Cyclic),
            _ => None,
        }
    }
}

/// A dialect-level type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DialectType {
    Int32,
    Uint32,
    Float,
    Semaphore,
    Param,
    Global {
        item: Option<DataKind>,
        dist: Option<Distrib>,
        dram: Option<bool>,
    },
    Local {
        item: Option<DataKind>,
    },
    Pipe {
        item: Option<DataKind>,
    },
    Math {
        item: Option<DataKind>,
    },
    Named(String),
}

impl DialectType {
    /// Base class name, for member-call matching.
    pub fn class_name(&self) -> Option<&'static str> {
        match self {
            DialectType::Global { .. } => Some("global"),
            DialectType::Local { .. } => Some("local"),
            DialectType::Pipe { .. } => Some("pipe"),
            DialectType::Math { .. } => Some("math"),
            DialectType::Semaphore => Some("semaphore"),
            DialectType::Param => Some("param"),
            _ => None,
        }
    }

    pub fn item(&self) -> Option<DataKind> {
        match self {
            DialectType::Global { item, .. }
            | DialectType::Local { item }
            | DialectType::Pipe { item }
            | DialectType::Math { item } => *item,
            _ => None,
        }
    }
}

/// Object-like preprocessor defines collected from the unit.
#[derive(Debug, Clone, Default)]
pub struct DefineTable {
    map: IndexMap<String, String>,
}

impl DefineTable {
    pub fn from_unit(unit: &SourceUnit) -> Self {
        let mut map = IndexMap::new();
        walk_nodes(unit.root(), &mut |node| {
            if node.kind() == "preproc_def" {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| unit.node_text(n).to_string());
                let value = node
                    .child_by_field_name("value")
                    .map(|n| unit.node_text(n).trim().to_string());
                if let (Some(name), Some(value)) = (name, value) {
                    map.insert(name, value);
                }
            }
        });
        Self { map }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    /// Resolve a token through define chains (bounded against cycles).
    pub fn resolve<'a>(&'a self, token: &'a str) -> &'a str {
        let mut current = token;
        for _ in 0..8 {
            match self.map.get(current) {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// One declared variable or formal parameter.
#[derive(Debug, Clone)]
pub struct VarDef {
    pub name: String,
    pub ty: DialectType,
    pub span: Span,
    /// Byte offset of the declarator; a use site must not precede it.
    pub byte: usize,
    pub param_index: Option<u32>,
    /// Name of the function owning this definition, if not file scope.
    pub func: Option<String>,
}

#[derive(Debug)]
struct Scope {
    start: usize,
    end: usize,
    parent: Option<usize>,
    names: Vec<(String, usize)>,
}

/// Lexically scoped symbol table over one unit.
#[derive(Debug, Default)]
pub struct TypeTable {
    defs: Vec<VarDef>,
    scopes: Vec<Scope>,
}

impl TypeTable {
    pub fn build(unit: &SourceUnit, defines: &DefineTable) -> Self {
        let mut table = TypeTable::default();
        let root = unit.root();
        let file_scope = table.push_scope(root.start_byte(), root.end_byte(), None);
        table.collect(unit, defines, root, file_scope, None);
        table
    }

    fn push_scope(&mut self, start: usize, end: usize, parent: Option<usize>) -> usize {
        self.scopes.push(Scope {
            start,
            end,
            parent,
            names: Vec::new(),
        });
        self.scopes.len() - 1
    }

    fn collect(
        &mut self,
        unit: &SourceUnit,
        defines: &DefineTable,
        node: Node<'_>,
        scope: usize,
        func: Option<&str>,
    ) {
        match node.kind() {
            "function_definition" => {
                let name = super::unit::function_name(unit, node).map(str::to_string);
                let inner = self.push_scope(node.start_byte(), node.end_byte(), Some(scope));
                for (index, param) in function_params(node).iter().enumerate() {
                    self.enter_param(unit, defines, *param, inner, index as u32, name.as_deref());
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.collect(unit, defines, body, inner, name.as_deref());
                }
                return;
            }
            "compound_statement" | "for_statement" => {
                let inner = self.push_scope(node.start_byte(), node.end_byte(), Some(scope));
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    self.collect(unit, defines, child, inner, func);
                }
                return;
            }
            "declaration" => {
                if let Some(type_node) = node.child_by_field_name("type") {
                    let ty = parse_type(unit, type_node, defines);
                    for declarator in declaration_declarators(node) {
                        if let Some((name, name_node)) = declarator_name(unit, declarator) {
                            self.enter(
                                scope,
                                VarDef {
                                    name: name.to_string(),
                                    ty: ty.clone(),
                                    span: unit.span(name_node),
                                    byte: name_node.start_byte(),
                                    param_index: None,
                                    func: func.map(str::to_string),
                                },
                            );
                        }
                    }
                }
            }
            _ => {}
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.collect(unit, defines, child, scope, func);
        }
    }

    fn enter_param(
        &mut self,
        unit: &SourceUnit,
        defines: &DefineTable,
        param: Node<'_>,
        scope: usize,
        index: u32,
        func: Option<&str>,
    ) {
        let Some(type_node) = param.child_by_field_name("type") else {
            return;
        };
        let ty = parse_type(unit, type_node, defines);
        let Some(declarator) = param.child_by_field_name("declarator") else {
            return;
        };
        let Some((name, name_node)) = declarator_name(unit, declarator) else {
            return;
        };
        self.enter(
            scope,
            VarDef {
                name: name.to_string(),
                ty,
                span: unit.span(name_node),
                byte: name_node.start_byte(),
                param_index: Some(index),
                func: func.map(str::to_string),
            },
        );
    }

    fn enter(&mut self, scope: usize, def: VarDef) {
        let idx = self.defs.len();
        let name = def.name.clone();
        self.defs.push(def);
        self.scopes[scope].names.push((name, idx));
    }

    /// Resolve `name` as seen from byte offset `at`.
    pub fn resolve(&self, name: &str, at: usize) -> Option<&VarDef> {
        let mut scope = self.innermost(at)?;
        loop {
            let s = &self.scopes[scope];
            let mut best: Option<&VarDef> = None;
            for (n, idx) in &s.names {
                if n != name {
                    continue;
                }
                let def = &self.defs[*idx];
                if def.param_index.is_some() || def.byte <= at {
                    best = Some(def);
                }
            }
            if best.is_some() {
                return best;
            }
            scope = s.parent?;
        }
    }

    fn innermost(&self, at: usize) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, s) in self.scopes.iter().enumerate() {
            if s.start <= at && at < s.end.max(s.start + 1) {
                let better = match best {
                    Some(b) => {
                        let bs = &self.scopes[b];
                        s.end - s.start <= bs.end - bs.start
                    }
                    None => true,
                };
                if better {
                    best = Some(i);
                }
            }
        }
        best
    }

    /// Type of an identifier expression node, if it resolves to a variable.
    pub fn type_of<'a>(&'a self, unit: &SourceUnit, node: Node<'_>) -> Option<&'a DialectType> {
        if node.kind() != "identifier" {
            return None;
        }
        self.resolve(unit.node_text(node), node.start_byte())
            .map(|def| &def.ty)
    }

    pub fn defs(&self) -> &[VarDef] {
        &self.defs
    }
}

/// Parse a type node into a dialect type, looking through defines.
pub fn parse_type(unit: &SourceUnit, node: Node<'_>, defines: &DefineTable) -> DialectType {
    match node.kind() {
        "type_identifier" | "primitive_type" | "sized_type_specifier" => {
            let name = defines.resolve(unit.node_text(node));
            named_type(name)
        }
        "template_type" => {
            let base = node
                .child_by_field_name("name")
                .map(|n| unit.node_text(n))
                .unwrap_or("");
            let args = node
                .child_by_field_name("arguments")
                .map(named_children)
                .unwrap_or_default();
            let item = args
                .first()
                .and_then(|a| template_arg_kind(unit, *a, defines));
            match base {
                "global" => {
                    let dist = args
                        .get(1)
                        .and_then(|a| template_arg_value(unit, *a, defines))
                        .and_then(Distrib::from_value);
                    let dram = args
                        .get(2)
                        .and_then(|a| template_arg_value(unit, *a, defines))
                        .map(|v| v != 0);
                    DialectType::Global { item, dist, dram }
                }
                "local" => DialectType::Local { item },
                "pipe" => DialectType::Pipe { item },
                "math" => DialectType::Math { item },
                other => DialectType::Named(other.to_string()),
            }
        }
        _ => DialectType::Named(unit.node_text(node).to_string()),
    }
}

fn named_type(name: &str) -> DialectType {
    match name {
        "int32" | "int32_t" | "int" => DialectType::Int32,
        "uint32" | "uint32_t" | "unsigned int" => DialectType::Uint32,
        "float" => DialectType::Float,
        "semaphore" => DialectType::Semaphore,
        "param" => DialectType::Param,
        other => DialectType::Named(other.to_string()),
    }
}

fn template_arg_kind(
    unit: &SourceUnit,
    arg: Node<'_>,
    defines: &DefineTable,
) -> Option<DataKind> {
    let text = unit.node_text(arg);
    DataKind::parse(defines.resolve(text.trim()))
}

fn template_arg_value(unit: &SourceUnit, arg: Node<'_>, defines: &DefineTable) -> Option<i64> {
    let text = defines.resolve(unit.node_text(arg).trim());
    super::consteval::parse_int_token(text)
}
