// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::inst::IntPredicate;
use crate::module::Module;
use crate::types::Type;

/// A constant value. Floats are carried as their bit pattern so that
/// constants hash and compare structurally.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constant {
    Int { width: u32, value: BigUint },
    Float { width: u32, bits: u64 },
    /// A null pointer of the given pointer type.
    Null(Type),
    Undef(Type),
    Struct { ty: Type, fields: Vec<Constant> },
    Array { elem: Type, elems: Vec<Constant> },
    Vector { elem: Type, elems: Vec<Constant> },
    Global(usize),
    Function(usize),
    Expr(Box<ConstExpr>),
}

impl Constant {
    pub fn int(width: u32, value: u64) -> Constant {
        Constant::Int { width, value: BigUint::from(value) }
    }

    pub fn ty(&self, module: &Module) -> Type {
        match self {
            Constant::Int { width, .. } => Type::Int { width: *width },
            Constant::Float { width, .. } => Type::Float { width: *width },
            Constant::Null(t) | Constant::Undef(t) => t.clone(),
            Constant::Struct { ty, .. } => ty.clone(),
            Constant::Array { elem, elems } => Type::array(elem.clone(), elems.len() as u64),
            Constant::Vector { elem, elems } => Type::vector(elem.clone(), elems.len() as u32),
            Constant::Global(id) => {
                let global = &module.globals[*id];
                Type::pointer(global.value_type.clone(), global.address_space)
            }
            Constant::Function(id) => {
                let function = &module.functions[*id];
                Type::pointer(function.ty(), 0)
            }
            Constant::Expr(e) => e.ty().clone(),
        }
    }
}

/// The constant-expression shapes the translator covers; anything else
/// in the input is an implementation limitation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstExpr {
    Gep { base: Constant, source_elem: Type, indices: Vec<Constant>, ty: Type },
    BitCast { value: Constant, from: Type, to: Type },
    AddrSpaceCast { value: Constant, to: Type },
    IntToPtr { value: Constant, to: Type },
    PtrToInt { value: Constant, to: Type },
    ICmp { pred: IntPredicate, lhs: Constant, rhs: Constant, op_ty: Type, ty: Type },
    ZExt { value: Constant, to: Type },
    Mul { lhs: Constant, rhs: Constant, ty: Type },
    SDiv { lhs: Constant, rhs: Constant, ty: Type },
}

impl ConstExpr {
    pub fn ty(&self) -> &Type {
        match self {
            ConstExpr::Gep { ty, .. }
            | ConstExpr::BitCast { to: ty, .. }
            | ConstExpr::AddrSpaceCast { to: ty, .. }
            | ConstExpr::IntToPtr { to: ty, .. }
            | ConstExpr::PtrToInt { to: ty, .. }
            | ConstExpr::ICmp { ty, .. }
            | ConstExpr::ZExt { to: ty, .. }
            | ConstExpr::Mul { ty, .. }
            | ConstExpr::SDiv { ty, .. } => ty,
        }
    }

    pub fn opcode_name(&self) -> &'static str {
        match self {
            ConstExpr::Gep { .. } => "getelementptr",
            ConstExpr::BitCast { .. } => "bitcast",
            ConstExpr::AddrSpaceCast { .. } => "addrspacecast",
            ConstExpr::IntToPtr { .. } => "inttoptr",
            ConstExpr::PtrToInt { .. } => "ptrtoint",
            ConstExpr::ICmp { .. } => "icmp",
            ConstExpr::ZExt { .. } => "zext",
            ConstExpr::Mul { .. } => "mul",
            ConstExpr::SDiv { .. } => "sdiv",
        }
    }
}
