//! Kernel parameter query.
//!
//! Reads the formal parameters of the `kernel` function and classifies each
//! into the small set of runtime-argument types the driver knows how to
//! unpack.

use crate::tooling::unit::{
    SourceUnit, declarator_name, function_name, function_params, named_children,
};
use crate::tooling::Semantics;
use crate::{Error, Result};

/// Runtime-argument type of one kernel parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataType {
    Int32,
    Uint32,
    Float,
    Global,
    Local,
    Pipe,
    Semaphore,
}

#[derive(Clone, Debug)]
pub struct KernelParam {
    pub name: String,
    pub ty: DataType,
}

/// The `kernel` parameters in declaration order.
pub fn kernel_params(unit: &SourceUnit, sem: &Semantics) -> Result<Vec<KernelParam>> {
    let kernel = named_children(unit.root())
        .into_iter()
        .filter(|n| n.kind() == "function_definition")
        .find(|def| function_name(unit, *def) == Some("kernel"))
        .ok_or_else(|| Error::Input("Missing main function".into()))?;

    let mut params = Vec::new();
    for param in function_params(kernel) {
        let Some(type_node) = param.child_by_field_name("type") else {
            continue;
        };
        let type_text = unit.node_text(type_node);
        let ty = parse_kernel_param_type(sem.defines.resolve(type_text.trim()))
            .ok_or_else(|| Error::Input(format!("Invalid kernel parameter type: {type_text}")))?;
        let name = param
            .child_by_field_name("declarator")
            .and_then(|d| declarator_name(unit, d))
            .map(|(n, _)| n.to_string())
            .ok_or_else(|| Error::Match("param".into()))?;
        params.push(KernelParam { name, ty });
    }
    Ok(params)
}

fn parse_kernel_param_type(source: &str) -> Option<DataType> {
    match source.find('<') {
        None => match source {
            "int32" => Some(DataType::Int32),
            "uint32" => Some(DataType::Uint32),
            "float" => Some(DataType::Float),
            "semaphore" => Some(DataType::Semaphore),
            _ => None,
        },
        Some(pos) => match source[..pos].trim() {
            "global" => Some(DataType::Global),
            "local" => Some(DataType::Local),
            "pipe" => Some(DataType::Pipe),
            _ => None,
        },
    }
}
