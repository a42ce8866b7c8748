//! Builtin tables.
//!
//! Maps every tile primitive (a `math` method or a free function) to the
//! device-side init functions it requires, one slot per init group, and
//! names the positional call arguments each init call captures.

/// Init groups: every primitive reserves at most one init slot per group.
pub const UNPACK: usize = 0;
pub const MATH: usize = 1;
pub const PACK: usize = 2;
pub const SFPU: usize = 3;
pub const GROUP_COUNT: usize = 4;

/// Identity of a tile primitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BuiltinId {
    Pack,
    PackRow,
    PackCol,
    PackScalar,
    Copy,
    Add,
    Sub,
    Mul,
    AddBcastRows,
    SubBcastRows,
    MulBcastRows,
    AddBcastCols,
    SubBcastCols,
    MulBcastCols,
    AddBcastScalar,
    SubBcastScalar,
    MulBcastScalar,
    Matmul,
    ReduceMaxRows,
    ReduceMaxCols,
    ReduceMaxScalar,
    ReduceSumRows,
    ReduceSumCols,
    ReduceSumScalar,
    Transpose,
    TilizeBlock,
    UntilizeBlock,
    CopyDst,
    AddDst,
    SubDst,
    RsubDst,
    MulDst,
    DivDst,
    PowerDst,
    Abs,
    Acos,
    AddScalar,
    Asin,
    Atan,
    CastBf16U16,
    CastU16Bf16,
    Ceil,
    Cos,
    DivScalar,
    Elu,
    Eqz,
    Erf,
    Erfc,
    Erfinv,
    Exp,
    Exp2,
    Expm1,
    Fill,
    Floor,
    Gelu,
    Gez,
    Gtz,
    Heaviside,
    I0,
    IsFinite,
    IsInf,
    IsNan,
    IsNegInf,
    IsPosInf,
    LeakyRelu,
    Lez,
    Log,
    LogWithBase,
    LogicalNot,
    Ltz,
    Max,
    MulScalar,
    Nez,
    Power,
    Recip,
    Relu,
    ReluMax,
    ReluMin,
    Rsqrt,
    RsubScalar,
    Sigmoid,
    Sign,
    Signbit,
    Sin,
    Sqrt,
    Square,
    SubScalar,
    Tan,
    Tanh,
}

/// Identity of a device-side init function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InitFunc {
    // unpack
    UnpackBinary,
    UnpackBcastRows,
    UnpackBcastCols,
    UnpackBcastScalar,
    UnpackMatmul,
    UnpackUnary,
    UnpackReduceRows,
    UnpackReduceCols,
    UnpackReduceScalar,
    UnpackTranspose,
    UnpackTilizeBlock,
    UnpackUntilizeBlock,
    // pack
    Pack,
    PackRow,
    PackCol,
    PackScalar,
    // math
    Copy,
    Add,
    Sub,
    Mul,
    AddBcastRows,
    SubBcastRows,
    MulBcastRows,
    AddBcastCols,
    SubBcastCols,
    MulBcastCols,
    AddBcastScalar,
    SubBcastScalar,
    MulBcastScalar,
    Matmul,
    ReduceMaxRows,
    ReduceMaxCols,
    ReduceMaxScalar,
    ReduceSumRows,
    ReduceSumCols,
    ReduceSumScalar,
    Transpose,
    // sfpu
    CopyDst,
    AddDst,
    SubDst,
    RsubDst,
    MulDst,
    DivDst,
    PowerDst,
    Abs,
    Acos,
    Asin,
    Atan,
    BinaryScalar,
    Cast,
    Ceil,
    Cos,
    Elu,
    Eqz,
    Erf,
    Erfc,
    Erfinv,
    Exp,
    Exp2,
    Expm1,
    Fill,
    Floor,
    Gelu,
    Gez,
    Gtz,
    Heaviside,
    I0,
    IsFinite,
    IsInf,
    IsNan,
    IsNegInf,
    IsPosInf,
    LeakyRelu,
    Lez,
    Log,
    LogWithBase,
    LogicalNot,
    Ltz,
    Max,
    Nez,
    Power,
    Recip,
    Relu,
    ReluMax,
    ReluMin,
    Rsqrt,
    Sigmoid,
    Sign,
    Signbit,
    Sin,
    Sqrt,
    Square,
    Tan,
    Tanh,
}

impl InitFunc {
    /// Name used in the emitted stub `__<name>_init(...)`.
    pub fn name(self) -> &'static str {
        use InitFunc::*;
        match self {
            UnpackBinary => "unpack_binary",
            UnpackBcastRows => "unpack_bcast_rows",
            UnpackBcastCols => "unpack_bcast_cols",
            UnpackBcastScalar => "unpack_bcast_scalar",
            UnpackMatmul => "unpack_matmul",
            UnpackUnary => "unpack_unary",
            UnpackReduceRows => "unpack_reduce_rows",
            UnpackReduceCols => "unpack_reduce_cols",
            UnpackReduceScalar => "unpack_reduce_scalar",
            UnpackTranspose => "unpack_transpose",
            UnpackTilizeBlock => "unpack_tilize_block",
            UnpackUntilizeBlock => "unpack_untilize_block",
            Pack => "pack",
            PackRow => "pack_row",
            PackCol => "pack_col",
            PackScalar => "pack_scalar",
            Copy => "copy",
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            AddBcastRows => "add_bcast_rows",
            SubBcastRows => "sub_bcast_rows",
            MulBcastRows => "mul_bcast_rows",
            AddBcastCols => "add_bcast_cols",
            SubBcastCols => "sub_bcast_cols",
            MulBcastCols => "mul_bcast_cols",
            AddBcastScalar => "add_bcast_scalar",
            SubBcastScalar => "sub_bcast_scalar",
            MulBcastScalar => "mul_bcast_scalar",
            Matmul => "matmul",
            ReduceMaxRows => "reduce_max_rows",
            ReduceMaxCols => "reduce_max_cols",
            ReduceMaxScalar => "reduce_max_scalar",
            ReduceSumRows => "reduce_sum_rows",
            ReduceSumCols => "reduce_sum_cols",
            ReduceSumScalar => "reduce_sum_scalar",
            Transpose => "transpose",
            CopyDst => "copy_dst",
            AddDst => "add_dst",
            SubDst => "sub_dst",
            RsubDst => "rsub_dst",
            MulDst => "mul_dst",
            DivDst => "div_dst",
            PowerDst => "power_dst",
            Abs => "abs",
            Acos => "acos",
            Asin => "asin",
            Atan => "atan",
            BinaryScalar => "binary_scalar",
            Cast => "cast",
            Ceil => "ceil",
            Cos => "cos",
            Elu => "elu",
            Eqz => "eqz",
            Erf => "erf",
            Erfc => "erfc",
            Erfinv => "erfinv",
            Exp => "exp",
            Exp2 => "exp2",
            Expm1 => "expm1",
            Fill => "fill",
            Floor => "floor",
            Gelu => "gelu",
            Gez => "gez",
            Gtz => "gtz",
            Heaviside => "heaviside",
            I0 => "i0",
            IsFinite => "isfinite",
            IsInf => "isinf",
            IsNan => "isnan",
            IsNegInf => "isneginf",
            IsPosInf => "isposinf",
            LeakyRelu => "leaky_relu",
            Lez => "lez",
            Log => "log",
            LogWithBase => "log_with_base",
            LogicalNot => "logical_not",
            Ltz => "ltz",
            Max => "max",
            Nez => "nez",
            Power => "power",
            Recip => "recip",
            Relu => "relu",
            ReluMax => "relu_max",
            ReluMin => "relu_min",
            Rsqrt => "rsqrt",
            Sigmoid => "sigmoid",
            Sign => "sign",
            Signbit => "signbit",
            Sin => "sin",
            Sqrt => "sqrt",
            Square => "square",
            Tan => "tan",
            Tanh => "tanh",
        }
    }
}

/// Map a primitive name to its builtin identity. `class_name` is empty for
/// free functions and `math` for method calls; anything else is not a
/// builtin.
pub fn builtin_id(class_name: &str, method_name: &str) -> Option<BuiltinId> {
    use BuiltinId::*;
    if class_name.is_empty() {
        return match method_name {
            "tilize_block" => Some(TilizeBlock),
            "untilize_block" => Some(UntilizeBlock),
            _ => None,
        };
    }
    if class_name != "math" {
        return None;
    }
    let id = match method_name {
        "pack" => Pack,
        "pack_row" => PackRow,
        "pack_col" => PackCol,
        "pack_scalar" => PackScalar,
        "copy" => Copy,
        "add" => Add,
        "sub" => Sub,
        "mul" => Mul,
        "add_bcast_rows" => AddBcastRows,
        "sub_bcast_rows" => SubBcastRows,
        "mul_bcast_rows" => MulBcastRows,
        "add_bcast_cols" => AddBcastCols,
        "sub_bcast_cols" => SubBcastCols,
        "mul_bcast_cols" => MulBcastCols,
        "add_bcast_scalar" => AddBcastScalar,
        "sub_bcast_scalar" => SubBcastScalar,
        "mul_bcast_scalar" => MulBcastScalar,
        "matmul" => Matmul,
        "reduce_max_rows" => ReduceMaxRows,
        "reduce_max_cols" => ReduceMaxCols,
        "reduce_max_scalar" => ReduceMaxScalar,
        "reduce_sum_rows" => ReduceSumRows,
        "reduce_sum_cols" => ReduceSumCols,
        "reduce_sum_scalar" => ReduceSumScalar,
        "transpose" => Transpose,
        "copy_dst" => CopyDst,
        "add_dst" => AddDst,
        "sub_dst" => SubDst,
        "rsub_dst" => RsubDst,
        "mul_dst" => MulDst,
        "div_dst" => DivDst,
        "power_dst" => PowerDst,
        "abs" => Abs,
        "acos" => Acos,
        "add_scalar" => AddScalar,
        "asin" => Asin,
        "atan" => Atan,
        "cast_bf16_u16" => CastBf16U16,
        "cast_u16_bf16" => CastU16Bf16,
        "ceil" => Ceil,
        "cos" => Cos,
        "div_scalar" => DivScalar,
        "elu" => Elu,
        "eqz" => Eqz,
        "erf" => Erf,
        "erfc" => Erfc,
        "erfinv" => Erfinv,
        "exp" => Exp,
        "exp2" => Exp2,
        "expm1" => Expm1,
        "fill" => Fill,
        "floor" => Floor,
        "gelu" => Gelu,
        "gez" => Gez,
        "gtz" => Gtz,
        "heaviside" => Heaviside,
        "i0" => I0,
        "isfinite" => IsFinite,
        "isinf" => IsInf,
        "isnan" => IsNan,
        "isneginf" => IsNegInf,
        "isposinf" => IsPosInf,
        "leaky_relu" => LeakyRelu,
        "lez" => Lez,
        "log" => Log,
        "log_with_base" => LogWithBase,
        "logical_not" => LogicalNot,
        "ltz" => Ltz,
        "max" => Max,
        "mul_scalar" => MulScalar,
        "nez" => Nez,
        "power" => Power,
        "recip" => Recip,
        "relu" => Relu,
        "relu_max" => ReluMax,
        "relu_min" => ReluMin,
        "rsqrt" => Rsqrt,
        "rsub_scalar" => RsubScalar,
        "sigmoid" => Sigmoid,
        "sign" => Sign,
        "signbit" => Signbit,
        "sin" => Sin,
        "sqrt" => Sqrt,
        "square" => Square,
        "sub_scalar" => SubScalar,
        "tan" => Tan,
        "tanh" => Tanh,
        _ => return None,
    };
    Some(id)
}

/// Init functions required by a builtin, one optional slot per group.
pub fn init_funcs(id: BuiltinId) -> [Option<InitFunc>; GROUP_COUNT] {
    use BuiltinId as B;
    use InitFunc as F;
    let (unpack, math, pack, sfpu) = match id {
        B::Pack => (None, None, Some(F::Pack), None),
        B::PackRow => (None, None, Some(F::PackRow), None),
        B::PackCol => (None, None, Some(F::PackCol), None),
        B::PackScalar => (None, None, Some(F::PackScalar), None),
        B::Copy => (Some(F::UnpackUnary), Some(F::Copy), None, None),
        B::Add => (Some(F::UnpackBinary), Some(F::Add), None, None),
        B::Sub => (Some(F::UnpackBinary), Some(F::Sub), None, None),
        B::Mul => (Some(F::UnpackBinary), Some(F::Mul), None, None),
        B::AddBcastRows => (Some(F::UnpackBcastRows), Some(F::AddBcastRows), None, None),
        B::SubBcastRows => (Some(F::UnpackBcastRows), Some(F::SubBcastRows), None, None),
        B::MulBcastRows => (Some(F::UnpackBcastRows), Some(F::MulBcastRows), None, None),
        B::AddBcastCols => (Some(F::UnpackBcastCols), Some(F::AddBcastCols), None, None),
        B::SubBcastCols => (Some(F::UnpackBcastCols), Some(F::SubBcastCols), None, None),
        B::MulBcastCols => (Some(F::UnpackBcastCols), Some(F::MulBcastCols), None, None),
        B::AddBcastScalar => (
            Some(F::UnpackBcastScalar),
            Some(F::AddBcastScalar),
            None,
            None,
        ),
        B::SubBcastScalar => (
            Some(F::UnpackBcastScalar),
            Some(F::SubBcastScalar),
            None,
            None,
        ),
        B::MulBcastScalar => (
            Some(F::UnpackBcastScalar),
            Some(F::MulBcastScalar),
            None,
            None,
        ),
        B::Matmul => (Some(F::UnpackMatmul), Some(F::Matmul), None, None),
        B::ReduceMaxRows => (Some(F::UnpackReduceRows), Some(F::ReduceMaxRows), None, None),
        B::ReduceMaxCols => (Some(F::UnpackReduceCols), Some(F::ReduceMaxCols), None, None),
        B::ReduceMaxScalar => (
            Some(F::UnpackReduceScalar),
            Some(F::ReduceMaxScalar),
            None,
            None,
        ),
        B::ReduceSumRows => (Some(F::UnpackReduceRows), Some(F::ReduceSumRows), None, None),
        B::ReduceSumCols => (Some(F::UnpackReduceCols), Some(F::ReduceSumCols), None, None),
        B::ReduceSumScalar => (
            Some(F::UnpackReduceScalar),
            Some(F::ReduceSumScalar),
            None,
            None,
        ),
        B::Transpose => (Some(F::UnpackTranspose), Some(F::Transpose), None, None),
        B::TilizeBlock => (
            Some(F::UnpackTilizeBlock),
            Some(F::Copy),
            Some(F::Pack),
            None,
        ),
        B::UntilizeBlock => (
            Some(F::UnpackUntilizeBlock),
            Some(F::Copy),
            Some(F::Pack),
            None,
        ),
        B::CopyDst => (None, None, None, Some(F::CopyDst)),
        B::AddDst => (None, None, None, Some(F::AddDst)),
        B::SubDst => (None, None, None, Some(F::SubDst)),
        B::RsubDst => (None, None, None, Some(F::RsubDst)),
        B::MulDst => (None, None, None, Some(F::MulDst)),
        B::DivDst => (None, None, None, Some(F::DivDst)),
        B::PowerDst => (None, None, None, Some(F::PowerDst)),
        B::Abs => (None, None, None, Some(F::Abs)),
        B::Acos => (None, None, None, Some(F::Acos)),
        B::AddScalar => (None, None, None, Some(F::BinaryScalar)),
        B::Asin => (None, None, None, Some(F::Asin)),
        B::Atan => (None, None, None, Some(F::Atan)),
        B::CastBf16U16 => (None, None, None, Some(F::Cast)),
        B::CastU16Bf16 => (None, None, None, Some(F::Cast)),
        B::Ceil => (None, None, None, Some(F::Ceil)),
        B::Cos => (None, None, None, Some(F::Cos)),
        B::DivScalar => (None, None, None, Some(F::BinaryScalar)),
        B::Elu => (None, None, None, Some(F::Elu)),
        B::Eqz => (None, None, None, Some(F::Eqz)),
        B::Erf => (None, None, None, Some(F::Erf)),
        B::Erfc => (None, None, None, Some(F::Erfc)),
        B::Erfinv => (None, None, None, Some(F::Erfinv)),
        B::Exp => (None, None, None, Some(F::Exp)),
        B::Exp2 => (None, None, None, Some(F::Exp2)),
        B::Expm1 => (None, None, None, Some(F::Expm1)),
        B::Fill => (None, None, None, Some(F::Fill)),
        B::Floor => (None, None, None, Some(F::Floor)),
        B::Gelu => (None, None, None, Some(F::Gelu)),
        B::Gez => (None, None, None, Some(F::Gez)),
        B::Gtz => (None, None, None, Some(F::Gtz)),
        B::Heaviside => (None, None, None, Some(F::Heaviside)),
        B::I0 => (None, None, None, Some(F::I0)),
        B::IsFinite => (None, None, None, Some(F::IsFinite)),
        B::IsInf => (None, None, None, Some(F::IsInf)),
        B::IsNan => (None, None, None, Some(F::IsNan)),
        B::IsNegInf => (None, None, None, Some(F::IsNegInf)),
        B::IsPosInf => (None, None, None, Some(F::IsPosInf)),
        B::LeakyRelu => (None, None, None, Some(F::LeakyRelu)),
        B::Lez => (None, None, None, Some(F::Lez)),
        B::Log => (None, None, None, Some(F::Log)),
        B::LogWithBase => (None, None, None, Some(F::LogWithBase)),
        B::LogicalNot => (None, None, None, Some(F::LogicalNot)),
        B::Ltz => (None, None, None, Some(F::Ltz)),
        B::Max => (None, None, None, Some(F::Max)),
        B::MulScalar => (None, None, None, Some(F::BinaryScalar)),
        B::Nez => (None, None, None, Some(F::Nez)),
        B::Power => (None, None, None, Some(F::Power)),
        B::Recip => (None, None, None, Some(F::Recip)),
        B::Relu => (None, None, None, Some(F::Relu)),
        B::ReluMax => (None, None, None, Some(F::ReluMax)),
        B::ReluMin => (None, None, None, Some(F::ReluMin)),
        B::Rsqrt => (None, None, None, Some(F::Rsqrt)),
        B::RsubScalar => (None, None, None, Some(F::BinaryScalar)),
        B::Sigmoid => (None, None, None, Some(F::Sigmoid)),
        B::Sign => (None, None, None, Some(F::Sign)),
        B::Signbit => (None, None, None, Some(F::Signbit)),
        B::Sin => (None, None, None, Some(F::Sin)),
        B::Sqrt => (None, None, None, Some(F::Sqrt)),
        B::Square => (None, None, None, Some(F::Square)),
        B::SubScalar => (None, None, None, Some(F::BinaryScalar)),
        B::Tan => (None, None, None, Some(F::Tan)),
        B::Tanh => (None, None, None, Some(F::Tanh)),
    };
    let mut funcs = [None; GROUP_COUNT];
    funcs[UNPACK] = unpack;
    funcs[MATH] = math;
    funcs[PACK] = pack;
    funcs[SFPU] = sfpu;
    funcs
}
