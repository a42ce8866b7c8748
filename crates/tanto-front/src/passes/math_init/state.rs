//! Init-state lattice.
//!
//! Per statement and per function the analysis tracks, for each init group,
//! which init call the code below agrees on. `None` is the neutral element,
//! `Undef` absorbs everything, and two concrete calls survive composition
//! only when they are equal.

use std::fmt;

use super::builtin::{GROUP_COUNT, InitFunc};

/// One captured init-call argument.
///
/// `param` is the enclosing-function parameter slot when the argument is a
/// plain reference to a formal parameter; `value` is set for integer and
/// boolean literals; `code` is the source text used when the call is
/// finally printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitArg {
    pub param: Option<u32>,
    pub value: Option<i64>,
    pub code: String,
}

impl InitArg {
    pub fn is_undef(&self) -> bool {
        self.param.is_none() && self.value.is_none()
    }
}

/// A concrete init call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitCallData {
    pub func: InitFunc,
    pub args: Vec<InitArg>,
}

impl InitCallData {
    pub fn any_undef_arg(&self) -> bool {
        self.args.iter().any(InitArg::is_undef)
    }

    /// Two calls are equal iff they name the same init function and every
    /// argument agrees either by parameter slot or by concrete value.
    pub fn equal(&self, other: &InitCallData) -> bool {
        if self.func != other.func || self.args.len() != other.args.len() {
            return false;
        }
        self.args.iter().zip(&other.args).all(|(a, b)| {
            if a.param.is_some() || b.param.is_some() {
                a.param == b.param
            } else if a.value.is_some() || b.value.is_some() {
                a.value == b.value
            } else {
                false
            }
        })
    }
}

/// Lattice element for one init group.
#[derive(Clone, Debug, Default)]
pub enum InitCall {
    #[default]
    None,
    Undef,
    Call(InitCallData),
}

impl InitCall {
    pub fn is_none(&self) -> bool {
        matches!(self, InitCall::None)
    }

    pub fn is_undef(&self) -> bool {
        matches!(self, InitCall::Undef)
    }

    pub fn as_call(&self) -> Option<&InitCallData> {
        match self {
            InitCall::Call(data) => Some(data),
            _ => None,
        }
    }

    /// Lattice composition: `None` is neutral, `Undef` absorbing, concrete
    /// calls must agree.
    pub fn combine(&self, other: &InitCall) -> InitCall {
        match (self, other) {
            (InitCall::Undef, _) | (_, InitCall::Undef) => InitCall::Undef,
            (InitCall::None, x) | (x, InitCall::None) => x.clone(),
            (InitCall::Call(a), InitCall::Call(b)) => {
                if a.equal(b) {
                    self.clone()
                } else {
                    InitCall::Undef
                }
            }
        }
    }
}

impl fmt::Display for InitCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitCall::None => write!(f, "[none]"),
            InitCall::Undef => write!(f, "[undef]"),
            InitCall::Call(data) => {
                write!(f, "{}(", data.func.name())?;
                for (i, arg) in data.args.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg.code)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// One lattice element per init group.
#[derive(Clone, Debug, Default)]
pub struct InitState {
    calls: [InitCall; GROUP_COUNT],
}

impl InitState {
    pub fn set(&mut self, group: usize, call: InitCall) {
        self.calls[group] = call;
    }

    pub fn at(&self, group: usize) -> &InitCall {
        &self.calls[group]
    }

    pub fn is_empty(&self) -> bool {
        self.calls.iter().all(InitCall::is_none)
    }

    /// Pointwise composition across groups.
    pub fn combine(&mut self, other: &InitState) {
        for group in 0..GROUP_COUNT {
            self.calls[group] = self.calls[group].combine(&other.calls[group]);
        }
    }

    /// Demote concrete calls that carry an unresolvable argument.
    pub fn demote_undef_args(&mut self) {
        for call in &mut self.calls {
            if call.as_call().is_some_and(InitCallData::any_undef_arg) {
                *call = InitCall::Undef;
            }
        }
    }
}

/// Per-group propagation filter used while picking insertion points.
#[derive(Clone, Debug)]
pub struct InitMask {
    flags: [bool; GROUP_COUNT],
}

impl Default for InitMask {
    fn default() -> Self {
        Self {
            flags: [true; GROUP_COUNT],
        }
    }
}

impl InitMask {
    pub fn set(&mut self, group: usize, flag: bool) {
        self.flags[group] = flag;
    }

    pub fn at(&self, group: usize) -> bool {
        self.flags[group]
    }

    pub fn is_empty(&self) -> bool {
        self.flags.iter().all(|f| !f)
    }
}
