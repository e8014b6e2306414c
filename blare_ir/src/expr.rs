// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The expression algebra.
//!
//! Expression nodes are immutable after construction and shared through
//! reference counting; the statement simplifier relies on the counts to
//! find single-use evaluations. There is no hash-consing: sharing comes
//! from the translator reusing the expression it cached for an input SSA
//! value.
//!
//! Every constructor is a pure function that either returns a
//! constant-folded or algebraically simplified node, or allocates a new
//! one. Constructors assert the type discipline of their operands; a
//! violation is a translator bug, not an input error.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::bits::BvConst;
use crate::function::Var;
use crate::global_array::GlobalArray;
use crate::typ::Type;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessKind {
    Read,
    Write,
}

/// Binary operators that print as SMT wrapper applications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    BvAdd,
    BvSub,
    BvMul,
    BvSDiv,
    BvUDiv,
    BvSRem,
    BvURem,
    BvShl,
    BvAShr,
    BvLShr,
    BvAnd,
    BvOr,
    BvXor,
    BvUgt,
    BvUge,
    BvUlt,
    BvUle,
    BvSgt,
    BvSge,
    BvSlt,
    BvSle,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FPow,
    FLt,
    FEq,
    FUno,
    PtrLt,
    PtrLe,
    FuncPtrLt,
    FuncPtrLe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    BvZExt,
    BvSExt,
    FpConv,
    FpToSi,
    FpToUi,
    SiToFp,
    UiToFp,
    BvToFloat,
    FloatToBv,
    BvToPtr,
    PtrToBv,
    BvToBool,
    BoolToBv,
    BvToFuncPtr,
    FuncPtrToBv,
    PtrToFuncPtr,
    FuncPtrToPtr,
    FAbs,
    FCos,
    FExp,
    FLog,
    FSin,
    FSqrt,
}

#[derive(Debug)]
pub enum ExprValue {
    BoolConst(bool),
    BvConstant(BvConst),
    GlobalArrayRef(Rc<GlobalArray>),
    NullArrayRef,
    VarRef(Rc<Var>),
    /// A variable the downstream verifier defines, named by attribute
    /// (`local_id_x`, `__enabled`, ...).
    SpecialVarRef(String),
    FunctionPointerRef(String),
    NullFunctionPointer,
    Pointer {
        array: Expr,
        offset: Expr,
    },
    ArrayId(Expr),
    ArrayOffset(Expr),
    /// Disjunction over a statically known set of candidate arrays;
    /// `None` is the null array.
    ArrayMemberOf {
        array: Expr,
        candidates: Vec<Option<Rc<GlobalArray>>>,
    },
    Load {
        array: Expr,
        offset: Expr,
        temporal: bool,
    },
    Atomic {
        array: Expr,
        offset: Expr,
    },
    ArraySnapshot {
        dst: Expr,
        src: Expr,
    },
    AddNoovfl(Vec<Expr>),
    Havoc,
    Old(Expr),
    OtherInt(Expr),
    OtherBool(Expr),
    OtherPtrBase(Expr),
    AccessHasOccurred {
        array: Expr,
        access: AccessKind,
    },
    AccessOffset {
        array: Expr,
        access: AccessKind,
    },
    NotAccessed(Expr),
    UninterpretedFunction {
        name: String,
        args: Vec<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    CallMemberOf {
        pointer: Expr,
        calls: Vec<Expr>,
    },
    IfThenElse {
        cond: Expr,
        true_expr: Expr,
        false_expr: Expr,
    },
    Not(Expr),
    Eq {
        lhs: Expr,
        rhs: Expr,
    },
    Ne {
        lhs: Expr,
        rhs: Expr,
    },
    And {
        lhs: Expr,
        rhs: Expr,
    },
    Or {
        lhs: Expr,
        rhs: Expr,
    },
    Implies {
        lhs: Expr,
        rhs: Expr,
    },
    BinOp {
        op: BinaryOp,
        lhs: Expr,
        rhs: Expr,
    },
    UnOp {
        op: UnaryOp,
        expr: Expr,
    },
    BvExtract {
        expr: Expr,
        offset: u32,
        width: u32,
    },
    BvConcat {
        lhs: Expr,
        rhs: Expr,
    },
}

#[derive(Debug)]
struct ExprNode {
    typ: Type,
    value: ExprValue,
}

#[derive(Clone, Debug)]
pub struct Expr {
    node: Rc<ExprNode>,
}

impl Expr {
    fn mk(typ: Type, value: ExprValue) -> Expr {
        Expr { node: Rc::new(ExprNode { typ, value }) }
    }

    pub fn typ(&self) -> &Type {
        &self.node.typ
    }

    pub fn value(&self) -> &ExprValue {
        &self.node.value
    }

    /// Number of live handles on this node, including `self`.
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.node)
    }

    pub fn ptr_eq(&self, other: &Expr) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Stable identity of the shared node, usable as a map key.
    pub fn node_id(&self) -> usize {
        Rc::as_ptr(&self.node) as usize
    }

    pub fn as_bv_const(&self) -> Option<&BvConst> {
        match self.value() {
            ExprValue::BvConstant(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_bool_const(&self) -> Option<bool> {
        match self.value() {
            ExprValue::BoolConst(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_global_array_ref(&self) -> Option<&Rc<GlobalArray>> {
        match self.value() {
            ExprValue::GlobalArrayRef(ga) => Some(ga),
            _ => None,
        }
    }

    fn as_unop(&self, op: UnaryOp) -> Option<&Expr> {
        match self.value() {
            ExprValue::UnOp { op: o, expr } if *o == op => Some(expr),
            _ => None,
        }
    }

    fn as_binop(&self, op: BinaryOp) -> Option<(&Expr, &Expr)> {
        match self.value() {
            ExprValue::BinOp { op: o, lhs, rhs } if *o == op => Some((lhs, rhs)),
            _ => None,
        }
    }
}

/// Two types agree for the purposes of equality and if-then-else arms.
/// `Any` is the wildcard range type, and array-id types agree regardless
/// of how precisely their ranges are known.
fn types_agree(a: &Type, b: &Type) -> bool {
    a == b || a.is_any() || b.is_any() || (a.is_array_id() && b.is_array_id())
}

/// Atoms and constants.
impl Expr {
    pub fn bool_const(value: bool) -> Expr {
        Expr::mk(Type::Bool, ExprValue::BoolConst(value))
    }

    pub fn bv_const(value: BvConst) -> Expr {
        Expr::mk(Type::Bv(value.width()), ExprValue::BvConstant(value))
    }

    pub fn bv_const_u64(width: u32, value: u64) -> Expr {
        Expr::bv_const(BvConst::from_u64(width, value))
    }

    pub fn bv_zero(width: u32) -> Expr {
        Expr::bv_const(BvConst::zero(width))
    }

    pub fn global_array_ref(array: Rc<GlobalArray>) -> Expr {
        let typ = Type::array_id(array.range_type().clone());
        Expr::mk(typ, ExprValue::GlobalArrayRef(array))
    }

    pub fn null_array_ref() -> Expr {
        Expr::mk(Type::array_id(Type::Any), ExprValue::NullArrayRef)
    }

    pub fn var_ref(var: Rc<Var>) -> Expr {
        let typ = var.typ().clone();
        Expr::mk(typ, ExprValue::VarRef(var))
    }

    pub fn special_var_ref(typ: Type, attr: &str) -> Expr {
        Expr::mk(typ, ExprValue::SpecialVarRef(attr.to_string()))
    }

    pub fn function_pointer_ref(name: &str, width: u32) -> Expr {
        Expr::mk(Type::FunctionPointer(width), ExprValue::FunctionPointerRef(name.to_string()))
    }

    pub fn null_function_pointer(width: u32) -> Expr {
        Expr::mk(Type::FunctionPointer(width), ExprValue::NullFunctionPointer)
    }

    pub fn havoc(typ: Type) -> Expr {
        Expr::mk(typ, ExprValue::Havoc)
    }
}

/// Pointers and arrays.
impl Expr {
    pub fn pointer(array: Expr, offset: Expr) -> Expr {
        assert!(array.typ().is_array_id());
        assert!(offset.typ().is_bv());
        let typ = Type::Pointer(offset.typ().width());
        Expr::mk(typ, ExprValue::Pointer { array, offset })
    }

    /// Projects the array component; folds on pointer construction.
    /// `default_range` is the assumed range type when the array set is
    /// not statically known.
    pub fn array_id(pointer: Expr, default_range: Type) -> Expr {
        assert!(pointer.typ().is_pointer());
        if let ExprValue::Pointer { array, .. } = pointer.value() {
            return array.clone();
        }
        Expr::mk(Type::array_id(default_range), ExprValue::ArrayId(pointer))
    }

    /// Projects the offset component; folds on pointer construction.
    pub fn array_offset(pointer: Expr) -> Expr {
        assert!(pointer.typ().is_pointer());
        if let ExprValue::Pointer { offset, .. } = pointer.value() {
            return offset.clone();
        }
        let typ = Type::Bv(pointer.typ().width());
        Expr::mk(typ, ExprValue::ArrayOffset(pointer))
    }

    pub fn array_member_of(array: Expr, candidates: Vec<Option<Rc<GlobalArray>>>) -> Expr {
        assert!(array.typ().is_array_id());
        assert!(!candidates.is_empty());
        let mut range = Type::Any;
        for c in candidates.iter().flatten() {
            range = Type::meet(&range, c.range_type());
        }
        Expr::mk(Type::array_id(range), ExprValue::ArrayMemberOf { array, candidates })
    }

    pub fn load(array: Expr, offset: Expr, typ: Type, temporal: bool) -> Expr {
        assert!(array.typ().is_array_id());
        assert!(offset.typ().is_bv());
        Expr::mk(typ, ExprValue::Load { array, offset, temporal })
    }

    pub fn atomic(array: Expr, offset: Expr, typ: Type) -> Expr {
        assert!(array.typ().is_array_id());
        assert!(offset.typ().is_bv());
        Expr::mk(typ, ExprValue::Atomic { array, offset })
    }

    pub fn array_snapshot(dst: Expr, src: Expr) -> Expr {
        assert!(dst.typ().is_array_id());
        assert!(src.typ().is_array_id());
        Expr::mk(Type::Bool, ExprValue::ArraySnapshot { dst, src })
    }

    pub fn add_noovfl(args: Vec<Expr>) -> Expr {
        assert!(!args.is_empty());
        assert!(args.iter().all(|a| a.typ().is_bv()));
        let typ = args[0].typ().clone();
        Expr::mk(typ, ExprValue::AddNoovfl(args))
    }
}

/// Inter-thread and temporal projections.
impl Expr {
    pub fn old(expr: Expr) -> Expr {
        let typ = expr.typ().clone();
        Expr::mk(typ, ExprValue::Old(expr))
    }

    pub fn other_int(expr: Expr) -> Expr {
        assert!(expr.typ().is_bv());
        let typ = expr.typ().clone();
        Expr::mk(typ, ExprValue::OtherInt(expr))
    }

    pub fn other_bool(expr: Expr) -> Expr {
        assert!(expr.typ().is_bool());
        Expr::mk(Type::Bool, ExprValue::OtherBool(expr))
    }

    pub fn other_ptr_base(array: Expr) -> Expr {
        assert!(array.typ().is_array_id());
        let typ = array.typ().clone();
        Expr::mk(typ, ExprValue::OtherPtrBase(array))
    }

    pub fn access_has_occurred(array: Expr, access: AccessKind) -> Expr {
        assert!(array.typ().is_array_id());
        Expr::mk(Type::Bool, ExprValue::AccessHasOccurred { array, access })
    }

    pub fn access_offset(array: Expr, access: AccessKind, pointer_width: u32) -> Expr {
        assert!(array.typ().is_array_id());
        Expr::mk(Type::Bv(pointer_width), ExprValue::AccessOffset { array, access })
    }

    pub fn not_accessed(array: Expr) -> Expr {
        assert!(array.typ().is_array_id());
        Expr::mk(Type::Bool, ExprValue::NotAccessed(array))
    }
}

/// Calls.
impl Expr {
    pub fn call(callee: &str, ret: Type, args: Vec<Expr>) -> Expr {
        Expr::mk(ret, ExprValue::Call { callee: callee.to_string(), args })
    }

    pub fn call_member_of(pointer: Expr, calls: Vec<Expr>) -> Expr {
        assert!(pointer.typ().is_function_pointer());
        assert!(!calls.is_empty());
        assert!(calls.iter().all(|c| matches!(c.value(), ExprValue::Call { .. })));
        let typ = calls[0].typ().clone();
        Expr::mk(typ, ExprValue::CallMemberOf { pointer, calls })
    }

    pub fn uninterpreted_function(name: &str, args: Vec<Expr>, ret: Type) -> Expr {
        Expr::mk(ret, ExprValue::UninterpretedFunction { name: name.to_string(), args })
    }
}

/// Boolean connectives.
impl Expr {
    pub fn not(op: Expr) -> Expr {
        assert!(op.typ().is_bool());
        if let Some(b) = op.as_bool_const() {
            return Expr::bool_const(!b);
        }
        Expr::mk(Type::Bool, ExprValue::Not(op))
    }

    pub fn eq(lhs: Expr, rhs: Expr) -> Expr {
        assert!(
            types_agree(lhs.typ(), rhs.typ()),
            "eq on incompatible types {:?} and {:?}",
            lhs.typ(),
            rhs.typ()
        );
        match (lhs.value(), rhs.value()) {
            (ExprValue::BvConstant(a), ExprValue::BvConstant(b)) => {
                return Expr::bool_const(a == b);
            }
            (ExprValue::BoolConst(a), ExprValue::BoolConst(b)) => {
                return Expr::bool_const(a == b);
            }
            (ExprValue::GlobalArrayRef(a), ExprValue::GlobalArrayRef(b)) => {
                return Expr::bool_const(a == b);
            }
            (ExprValue::FunctionPointerRef(a), ExprValue::FunctionPointerRef(b)) => {
                return Expr::bool_const(a == b);
            }
            _ => {}
        }
        Expr::mk(Type::Bool, ExprValue::Eq { lhs, rhs })
    }

    pub fn ne(lhs: Expr, rhs: Expr) -> Expr {
        assert!(
            types_agree(lhs.typ(), rhs.typ()),
            "ne on incompatible types {:?} and {:?}",
            lhs.typ(),
            rhs.typ()
        );
        match (lhs.value(), rhs.value()) {
            (ExprValue::BvConstant(a), ExprValue::BvConstant(b)) => {
                return Expr::bool_const(a != b);
            }
            (ExprValue::BoolConst(a), ExprValue::BoolConst(b)) => {
                return Expr::bool_const(a != b);
            }
            (ExprValue::GlobalArrayRef(a), ExprValue::GlobalArrayRef(b)) => {
                return Expr::bool_const(a != b);
            }
            (ExprValue::FunctionPointerRef(a), ExprValue::FunctionPointerRef(b)) => {
                return Expr::bool_const(a != b);
            }
            _ => {}
        }
        Expr::mk(Type::Bool, ExprValue::Ne { lhs, rhs })
    }

    /// `bv != 0`, the standard truthiness of a C-level predicate.
    pub fn ne_zero(bv: Expr) -> Expr {
        let width = bv.typ().width();
        Expr::ne(bv, Expr::bv_zero(width))
    }

    pub fn and(lhs: Expr, rhs: Expr) -> Expr {
        assert!(lhs.typ().is_bool() && rhs.typ().is_bool());
        if let Some(a) = lhs.as_bool_const() {
            return if a { rhs } else { lhs };
        }
        if let Some(b) = rhs.as_bool_const() {
            return if b { lhs } else { rhs };
        }
        Expr::mk(Type::Bool, ExprValue::And { lhs, rhs })
    }

    pub fn or(lhs: Expr, rhs: Expr) -> Expr {
        assert!(lhs.typ().is_bool() && rhs.typ().is_bool());
        if let Some(a) = lhs.as_bool_const() {
            return if a { lhs } else { rhs };
        }
        if let Some(b) = rhs.as_bool_const() {
            return if b { rhs } else { lhs };
        }
        Expr::mk(Type::Bool, ExprValue::Or { lhs, rhs })
    }

    pub fn implies(lhs: Expr, rhs: Expr) -> Expr {
        assert!(lhs.typ().is_bool() && rhs.typ().is_bool());
        Expr::mk(Type::Bool, ExprValue::Implies { lhs, rhs })
    }

    pub fn if_then_else(cond: Expr, true_expr: Expr, false_expr: Expr) -> Expr {
        assert!(cond.typ().is_bool());
        assert!(
            types_agree(true_expr.typ(), false_expr.typ()),
            "if-then-else arms of incompatible types {:?} and {:?}",
            true_expr.typ(),
            false_expr.typ()
        );
        if let Some(b) = cond.as_bool_const() {
            return if b { true_expr } else { false_expr };
        }
        let typ = true_expr.typ().clone();
        Expr::mk(typ, ExprValue::IfThenElse { cond, true_expr, false_expr })
    }
}

fn reassociate_const_add(non_const: (&Expr, &Expr), constant: &Expr) -> Option<Expr> {
    let (lhs, rhs) = non_const;
    if lhs.as_bv_const().is_some() {
        return Some(Expr::bv_add(rhs.clone(), Expr::bv_add(lhs.clone(), constant.clone())));
    }
    if rhs.as_bv_const().is_some() {
        return Some(Expr::bv_add(lhs.clone(), Expr::bv_add(rhs.clone(), constant.clone())));
    }
    None
}

macro_rules! assert_bv_operands {
    ($lhs:expr, $rhs:expr) => {
        assert!($lhs.typ().is_bv() && $rhs.typ().is_bv());
        assert_eq!($lhs.typ().width(), $rhs.typ().width(), "bit-vector width mismatch");
    };
}

/// Bit-vector arithmetic.
impl Expr {
    pub fn bv_add(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let Some(a) = lhs.as_bv_const() {
            if a.is_zero() {
                return rhs;
            }
            if let Some(b) = rhs.as_bv_const() {
                return Expr::bv_const(a.add(b));
            }
            if let Some(parts) = rhs.as_binop(BinaryOp::BvAdd) {
                if let Some(e) = reassociate_const_add(parts, &lhs) {
                    return e;
                }
            }
        }
        if let Some(b) = rhs.as_bv_const() {
            if b.is_zero() {
                return lhs;
            }
            if let Some(parts) = lhs.as_binop(BinaryOp::BvAdd) {
                if let Some(e) = reassociate_const_add(parts, &rhs) {
                    return e;
                }
            }
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvAdd, lhs, rhs })
    }

    pub fn bv_sub(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
            return Expr::bv_const(a.sub(b));
        }
        if let Some(b) = rhs.as_bv_const() {
            if b.is_zero() {
                return lhs;
            }
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvSub, lhs, rhs })
    }

    pub fn bv_mul(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let Some(a) = lhs.as_bv_const() {
            if a.is_one() {
                return rhs;
            }
            if let Some(b) = rhs.as_bv_const() {
                return Expr::bv_const(a.mul(b));
            }
        }
        if let Some(b) = rhs.as_bv_const() {
            if b.is_one() {
                return lhs;
            }
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvMul, lhs, rhs })
    }

    pub fn bv_sdiv(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
            if !b.is_zero() {
                return Expr::bv_const(a.sdiv(b));
            }
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvSDiv, lhs, rhs })
    }

    pub fn bv_udiv(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
            if !b.is_zero() {
                return Expr::bv_const(a.udiv(b));
            }
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvUDiv, lhs, rhs })
    }

    pub fn bv_srem(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
            if !b.is_zero() {
                return Expr::bv_const(a.srem(b));
            }
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvSRem, lhs, rhs })
    }

    pub fn bv_urem(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
            if !b.is_zero() {
                return Expr::bv_const(a.urem(b));
            }
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvURem, lhs, rhs })
    }

    pub fn bv_shl(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
            return Expr::bv_const(a.shl(b));
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvShl, lhs, rhs })
    }

    pub fn bv_ashr(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
            return Expr::bv_const(a.ashr(b));
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvAShr, lhs, rhs })
    }

    pub fn bv_lshr(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
            return Expr::bv_const(a.lshr(b));
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvLShr, lhs, rhs })
    }

    pub fn bv_and(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
            return Expr::bv_const(a.bitand(b));
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvAnd, lhs, rhs })
    }

    pub fn bv_or(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
            return Expr::bv_const(a.bitor(b));
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvOr, lhs, rhs })
    }

    pub fn bv_xor(lhs: Expr, rhs: Expr) -> Expr {
        assert_bv_operands!(lhs, rhs);
        if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
            return Expr::bv_const(a.bitxor(b));
        }
        let typ = lhs.typ().clone();
        Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::BvXor, lhs, rhs })
    }
}

macro_rules! bv_cmp_ctor {
    ($name:ident, $op:ident, $fold:ident) => {
        pub fn $name(lhs: Expr, rhs: Expr) -> Expr {
            assert_bv_operands!(lhs, rhs);
            if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
                return Expr::bool_const(a.$fold(b));
            }
            Expr::mk(Type::Bool, ExprValue::BinOp { op: BinaryOp::$op, lhs, rhs })
        }
    };
}

/// Bit-vector comparisons.
impl Expr {
    bv_cmp_ctor!(bv_ugt, BvUgt, ugt);
    bv_cmp_ctor!(bv_uge, BvUge, uge);
    bv_cmp_ctor!(bv_ult, BvUlt, ult);
    bv_cmp_ctor!(bv_ule, BvUle, ule);
    bv_cmp_ctor!(bv_sgt, BvSgt, sgt);
    bv_cmp_ctor!(bv_sge, BvSge, sge);
    bv_cmp_ctor!(bv_slt, BvSlt, slt);
    bv_cmp_ctor!(bv_sle, BvSle, sle);
}

macro_rules! float_binop_ctor {
    ($name:ident, $op:ident, $typ:expr) => {
        pub fn $name(lhs: Expr, rhs: Expr) -> Expr {
            assert!(lhs.typ().is_float());
            assert_eq!(lhs.typ(), rhs.typ());
            let typ = $typ(&lhs);
            Expr::mk(typ, ExprValue::BinOp { op: BinaryOp::$op, lhs, rhs })
        }
    };
}

macro_rules! float_unop_ctor {
    ($name:ident, $op:ident) => {
        pub fn $name(expr: Expr) -> Expr {
            assert!(expr.typ().is_float());
            let typ = expr.typ().clone();
            Expr::mk(typ, ExprValue::UnOp { op: UnaryOp::$op, expr })
        }
    };
}

fn operand_type(e: &Expr) -> Type {
    e.typ().clone()
}

fn bool_type(_: &Expr) -> Type {
    Type::Bool
}

/// Floating-point operations. These never fold; the verifier's float
/// theory is uninterpreted.
impl Expr {
    float_binop_ctor!(fadd, FAdd, operand_type);
    float_binop_ctor!(fsub, FSub, operand_type);
    float_binop_ctor!(fmul, FMul, operand_type);
    float_binop_ctor!(fdiv, FDiv, operand_type);
    float_binop_ctor!(fpow, FPow, operand_type);
    float_binop_ctor!(flt, FLt, bool_type);
    float_binop_ctor!(feq, FEq, bool_type);
    float_binop_ctor!(funo, FUno, bool_type);

    float_unop_ctor!(fabs, FAbs);
    float_unop_ctor!(fcos, FCos);
    float_unop_ctor!(fexp, FExp);
    float_unop_ctor!(flog, FLog);
    float_unop_ctor!(fsin, FSin);
    float_unop_ctor!(fsqrt, FSqrt);
}

/// Pointer orderings. `<`/`<=` on pointers compare offsets when the two
/// sides name the same array and fall back to an uninterpreted total
/// order on distinct arrays.
impl Expr {
    pub fn ptr_lt(lhs: Expr, rhs: Expr) -> Expr {
        Expr::if_then_else(
            Expr::eq(
                Expr::array_id(lhs.clone(), Type::Any),
                Expr::array_id(rhs.clone(), Type::Any),
            ),
            Expr::bv_slt(Expr::array_offset(lhs.clone()), Expr::array_offset(rhs.clone())),
            Expr::ptr_lt_order(lhs, rhs),
        )
    }

    pub fn ptr_le(lhs: Expr, rhs: Expr) -> Expr {
        Expr::if_then_else(
            Expr::eq(
                Expr::array_id(lhs.clone(), Type::Any),
                Expr::array_id(rhs.clone(), Type::Any),
            ),
            Expr::bv_sle(Expr::array_offset(lhs.clone()), Expr::array_offset(rhs.clone())),
            Expr::ptr_lt_order(lhs, rhs),
        )
    }

    fn ptr_lt_order(lhs: Expr, rhs: Expr) -> Expr {
        assert!(lhs.typ().is_pointer());
        assert!(rhs.typ().is_pointer());
        Expr::mk(Type::Bool, ExprValue::BinOp { op: BinaryOp::PtrLt, lhs, rhs })
    }

    pub fn ptr_le_order(lhs: Expr, rhs: Expr) -> Expr {
        assert!(lhs.typ().is_pointer());
        assert!(rhs.typ().is_pointer());
        Expr::mk(Type::Bool, ExprValue::BinOp { op: BinaryOp::PtrLe, lhs, rhs })
    }

    pub fn func_ptr_lt(lhs: Expr, rhs: Expr) -> Expr {
        assert!(lhs.typ().is_function_pointer());
        assert!(rhs.typ().is_function_pointer());
        Expr::mk(Type::Bool, ExprValue::BinOp { op: BinaryOp::FuncPtrLt, lhs, rhs })
    }

    pub fn func_ptr_le(lhs: Expr, rhs: Expr) -> Expr {
        assert!(lhs.typ().is_function_pointer());
        assert!(rhs.typ().is_function_pointer());
        Expr::mk(Type::Bool, ExprValue::BinOp { op: BinaryOp::FuncPtrLe, lhs, rhs })
    }
}

/// Extension, extraction and concatenation.
impl Expr {
    pub fn bv_zext(width: u32, bv: Expr) -> Expr {
        assert!(bv.typ().is_bv());
        let from = bv.typ().width();
        if width == from {
            return bv;
        }
        if width < from {
            return Expr::bv_extract(bv, 0, width);
        }
        if let Some(c) = bv.as_bv_const() {
            return Expr::bv_const(c.zext(width));
        }
        Expr::mk(Type::Bv(width), ExprValue::UnOp { op: UnaryOp::BvZExt, expr: bv })
    }

    pub fn bv_sext(width: u32, bv: Expr) -> Expr {
        assert!(bv.typ().is_bv());
        let from = bv.typ().width();
        if width == from {
            return bv;
        }
        if width < from {
            return Expr::bv_extract(bv, 0, width);
        }
        if let Some(c) = bv.as_bv_const() {
            return Expr::bv_const(c.sext(width));
        }
        Expr::mk(Type::Bv(width), ExprValue::UnOp { op: UnaryOp::BvSExt, expr: bv })
    }

    /// Bits `[offset + width : offset]` of `expr`. An extract that lands
    /// entirely inside one side of a concatenation is routed into that
    /// side.
    pub fn bv_extract(expr: Expr, offset: u32, width: u32) -> Expr {
        assert!(expr.typ().is_bv());
        if offset == 0 && width == expr.typ().width() {
            return expr;
        }
        if let Some(c) = expr.as_bv_const() {
            return Expr::bv_const(c.extract(offset, width));
        }
        if let ExprValue::BvConcat { lhs, rhs } = expr.value() {
            let rhs_width = rhs.typ().width();
            if offset + width <= rhs_width {
                return Expr::bv_extract(rhs.clone(), offset, width);
            }
            if offset >= rhs_width {
                return Expr::bv_extract(lhs.clone(), offset - rhs_width, width);
            }
        }
        Expr::mk(Type::Bv(width), ExprValue::BvExtract { expr, offset, width })
    }

    /// `lhs` becomes the high bits.
    pub fn bv_concat(lhs: Expr, rhs: Expr) -> Expr {
        assert!(lhs.typ().is_bv() && rhs.typ().is_bv());
        let width = lhs.typ().width() + rhs.typ().width();
        if let (Some(a), Some(b)) = (lhs.as_bv_const(), rhs.as_bv_const()) {
            return Expr::bv_const(a.concat(b));
        }
        Expr::mk(Type::Bv(width), ExprValue::BvConcat { lhs, rhs })
    }

    /// Concatenation of a little-endian element list: `elems[0]` supplies
    /// the least significant bits.
    pub fn bv_concat_n(elems: Vec<Expr>) -> Expr {
        assert!(!elems.is_empty());
        let mut it = elems.into_iter();
        let mut acc = it.next().unwrap();
        for e in it {
            acc = Expr::bv_concat(e, acc);
        }
        acc
    }
}

/// Casts. Every pair of inverse casts cancels syntactically.
impl Expr {
    pub fn fp_conv(width: u32, expr: Expr) -> Expr {
        assert!(expr.typ().is_float());
        if width == expr.typ().width() {
            return expr;
        }
        Expr::mk(Type::Float(width), ExprValue::UnOp { op: UnaryOp::FpConv, expr })
    }

    pub fn fp_to_si(width: u32, expr: Expr) -> Expr {
        assert!(expr.typ().is_float());
        Expr::mk(Type::Bv(width), ExprValue::UnOp { op: UnaryOp::FpToSi, expr })
    }

    pub fn fp_to_ui(width: u32, expr: Expr) -> Expr {
        assert!(expr.typ().is_float());
        Expr::mk(Type::Bv(width), ExprValue::UnOp { op: UnaryOp::FpToUi, expr })
    }

    pub fn si_to_fp(width: u32, expr: Expr) -> Expr {
        assert!(expr.typ().is_bv());
        Expr::mk(Type::Float(width), ExprValue::UnOp { op: UnaryOp::SiToFp, expr })
    }

    pub fn ui_to_fp(width: u32, expr: Expr) -> Expr {
        assert!(expr.typ().is_bv());
        Expr::mk(Type::Float(width), ExprValue::UnOp { op: UnaryOp::UiToFp, expr })
    }

    pub fn bv_to_float(bv: Expr) -> Expr {
        assert!(bv.typ().is_bv());
        let width = bv.typ().width();
        assert!(width == 16 || width == 32 || width == 64);
        if let Some(sub) = bv.as_unop(UnaryOp::FloatToBv) {
            return sub.clone();
        }
        Expr::mk(Type::Float(width), ExprValue::UnOp { op: UnaryOp::BvToFloat, expr: bv })
    }

    pub fn float_to_bv(expr: Expr) -> Expr {
        assert!(expr.typ().is_float());
        let width = expr.typ().width();
        if let Some(sub) = expr.as_unop(UnaryOp::BvToFloat) {
            return sub.clone();
        }
        Expr::mk(Type::Bv(width), ExprValue::UnOp { op: UnaryOp::FloatToBv, expr })
    }

    pub fn bv_to_ptr(bv: Expr) -> Expr {
        assert!(bv.typ().is_bv());
        let width = bv.typ().width();
        if let Some(sub) = bv.as_unop(UnaryOp::PtrToBv) {
            return sub.clone();
        }
        Expr::mk(Type::Pointer(width), ExprValue::UnOp { op: UnaryOp::BvToPtr, expr: bv })
    }

    pub fn ptr_to_bv(ptr: Expr) -> Expr {
        assert!(ptr.typ().is_pointer());
        let width = ptr.typ().width();
        if let Some(sub) = ptr.as_unop(UnaryOp::BvToPtr) {
            return sub.clone();
        }
        Expr::mk(Type::Bv(width), ExprValue::UnOp { op: UnaryOp::PtrToBv, expr: ptr })
    }

    pub fn bv_to_bool(bv: Expr) -> Expr {
        assert!(bv.typ().is_bv());
        assert_eq!(bv.typ().width(), 1);
        if let Some(sub) = bv.as_unop(UnaryOp::BoolToBv) {
            return sub.clone();
        }
        Expr::mk(Type::Bool, ExprValue::UnOp { op: UnaryOp::BvToBool, expr: bv })
    }

    pub fn bool_to_bv(b: Expr) -> Expr {
        assert!(b.typ().is_bool());
        if let Some(sub) = b.as_unop(UnaryOp::BvToBool) {
            return sub.clone();
        }
        Expr::mk(Type::Bv(1), ExprValue::UnOp { op: UnaryOp::BoolToBv, expr: b })
    }

    pub fn bv_to_func_ptr(width: u32, bv: Expr) -> Expr {
        assert!(bv.typ().is_bv());
        if let Some(sub) = bv.as_unop(UnaryOp::FuncPtrToBv) {
            return sub.clone();
        }
        Expr::mk(Type::FunctionPointer(width), ExprValue::UnOp { op: UnaryOp::BvToFuncPtr, expr: bv })
    }

    pub fn func_ptr_to_bv(width: u32, fp: Expr) -> Expr {
        assert!(fp.typ().is_function_pointer());
        if let Some(sub) = fp.as_unop(UnaryOp::BvToFuncPtr) {
            return sub.clone();
        }
        Expr::mk(Type::Bv(width), ExprValue::UnOp { op: UnaryOp::FuncPtrToBv, expr: fp })
    }

    pub fn ptr_to_func_ptr(ptr: Expr) -> Expr {
        assert!(ptr.typ().is_pointer());
        let width = ptr.typ().width();
        if let Some(sub) = ptr.as_unop(UnaryOp::FuncPtrToPtr) {
            return sub.clone();
        }
        Expr::mk(Type::FunctionPointer(width), ExprValue::UnOp { op: UnaryOp::PtrToFuncPtr, expr: ptr })
    }

    pub fn func_ptr_to_ptr(fp: Expr) -> Expr {
        assert!(fp.typ().is_function_pointer());
        let width = fp.typ().width();
        if let Some(sub) = fp.as_unop(UnaryOp::PtrToFuncPtr) {
            return sub.clone();
        }
        Expr::mk(Type::Pointer(width), ExprValue::UnOp { op: UnaryOp::FuncPtrToPtr, expr: fp })
    }
}

/// Exact division and array-candidate analysis: the two queries the
/// memory-model driver asks of an offset expression.
impl Expr {
    /// `e / d` iff `d` is a power of two and provably divides `e`
    /// exactly. Recurses through additions (both halves must divide) and
    /// multiplications by a constant multiple of `d`.
    pub fn create_exact_bv_udiv(e: &Expr, d: u64) -> Option<Expr> {
        Expr::create_exact_bv_div(e, d, None, false)
    }

    /// Signed variant; an offset that is the given variable itself is
    /// accepted (loop-carried pointer updates maintain the divided
    /// invariant).
    pub fn create_exact_bv_sdiv(e: &Expr, d: u64, var: Option<&Rc<Var>>) -> Option<Expr> {
        Expr::create_exact_bv_div(e, d, var, true)
    }

    fn create_exact_bv_div(e: &Expr, d: u64, var: Option<&Rc<Var>>, signed: bool) -> Option<Expr> {
        if d == 0 || !d.is_power_of_two() {
            return None;
        }
        let width = e.typ().width();
        match e.value() {
            ExprValue::BvConstant(c) => {
                if signed {
                    let val = c.to_signed_string().parse::<i128>().ok()?;
                    if val % (d as i128) == 0 {
                        return Some(Expr::bv_const(BvConst::from_i64(
                            width,
                            (val / (d as i128)) as i64,
                        )));
                    }
                } else {
                    let val = c.as_u64();
                    if val % d == 0 {
                        return Some(Expr::bv_const_u64(width, val / d));
                    }
                }
                None
            }
            ExprValue::BinOp { op: BinaryOp::BvAdd, lhs, rhs } => {
                let l = Expr::create_exact_bv_div(lhs, d, var, signed)?;
                let r = Expr::create_exact_bv_div(rhs, d, var, signed)?;
                Some(Expr::bv_add(l, r))
            }
            ExprValue::BinOp { op: BinaryOp::BvMul, lhs, rhs } => {
                if let Some(c) = lhs.as_bv_const() {
                    return Expr::exact_div_mul(rhs, c, d);
                }
                if let Some(c) = rhs.as_bv_const() {
                    return Expr::exact_div_mul(lhs, c, d);
                }
                None
            }
            ExprValue::VarRef(v) if var.is_some_and(|w| Rc::ptr_eq(w, v)) => Some(e.clone()),
            // A loop-carried pointer's offset refers to the variable
            // being modelled; the model maintains the divided invariant.
            ExprValue::ArrayOffset(sub) => match sub.value() {
                ExprValue::VarRef(v) if var.is_some_and(|w| Rc::ptr_eq(w, v)) => Some(e.clone()),
                _ => None,
            },
            _ => None,
        }
    }

    fn exact_div_mul(non_const: &Expr, constant: &BvConst, d: u64) -> Option<Expr> {
        let mul = constant.as_u64();
        if mul % d == 0 {
            let width = non_const.typ().width();
            return Some(Expr::bv_mul(non_const.clone(), Expr::bv_const_u64(width, mul / d)));
        }
        None
    }

    /// Collects into `out` every array this expression may name, looking
    /// through pointer construction, if-then-else and member-of
    /// disjunctions. Returns `false` when the set cannot be determined
    /// statically.
    pub fn compute_array_candidates(&self, out: &mut BTreeSet<Option<Rc<GlobalArray>>>) -> bool {
        match self.value() {
            ExprValue::GlobalArrayRef(ga) => {
                out.insert(Some(ga.clone()));
                true
            }
            ExprValue::NullArrayRef => {
                out.insert(None);
                true
            }
            ExprValue::Pointer { array, .. } => array.compute_array_candidates(out),
            ExprValue::IfThenElse { true_expr, false_expr, .. } => {
                true_expr.compute_array_candidates(out) && false_expr.compute_array_candidates(out)
            }
            ExprValue::ArrayMemberOf { candidates, .. } => {
                out.extend(candidates.iter().cloned());
                true
            }
            _ => false,
        }
    }

    /// Element-type meet of a candidate set; the null array contributes
    /// the wildcard.
    pub fn array_candidate_type(candidates: &BTreeSet<Option<Rc<GlobalArray>>>) -> Type {
        let mut ty = Type::Any;
        for ga in candidates.iter().flatten() {
            ty = Type::meet(&ty, ga.range_type());
        }
        ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bv32(v: u64) -> Expr {
        Expr::bv_const_u64(32, v)
    }

    fn test_array(name: &str, range: Type) -> Rc<GlobalArray> {
        Rc::new(GlobalArray::new(
            name.to_string(),
            range,
            name.to_string(),
            "int".to_string(),
            vec![1],
        ))
    }

    #[test]
    fn pointer_projections_fold() {
        let ga = test_array("a", Type::Bv(32));
        let array = Expr::global_array_ref(ga);
        let offset = bv32(4);
        let ptr = Expr::pointer(array.clone(), offset.clone());
        assert!(Expr::array_id(ptr.clone(), Type::Any).ptr_eq(&array));
        assert!(Expr::array_offset(ptr).ptr_eq(&offset));
    }

    #[test]
    fn constant_folding() {
        assert_eq!(Expr::bv_add(bv32(2), bv32(3)).as_bv_const().unwrap().as_u64(), 5);
        assert_eq!(Expr::bv_mul(bv32(6), bv32(7)).as_bv_const().unwrap().as_u64(), 42);
        assert_eq!(Expr::not(Expr::bool_const(true)).as_bool_const(), Some(false));
        assert_eq!(Expr::eq(bv32(1), bv32(1)).as_bool_const(), Some(true));
        assert_eq!(Expr::bv_ult(bv32(1), bv32(2)).as_bool_const(), Some(true));
    }

    #[test]
    fn identities() {
        let x = Expr::var_ref(Rc::new(Var::new("x".into(), Type::Bv(32))));
        assert!(Expr::bv_add(x.clone(), bv32(0)).ptr_eq(&x));
        assert!(Expr::bv_sub(x.clone(), bv32(0)).ptr_eq(&x));
        assert!(Expr::bv_mul(x.clone(), bv32(1)).ptr_eq(&x));
        let p = Expr::var_ref(Rc::new(Var::new("p".into(), Type::Bool)));
        assert!(Expr::and(Expr::bool_const(true), p.clone()).ptr_eq(&p));
        assert!(Expr::or(Expr::bool_const(false), p.clone()).ptr_eq(&p));
        let a = bv32(1);
        assert!(Expr::if_then_else(Expr::bool_const(true), a.clone(), bv32(2)).ptr_eq(&a));
    }

    #[test]
    fn constant_reassociation_keeps_divisibility() {
        // (x + 3) + 5 becomes x + 8, which createExactBVUDiv can divide.
        let x = Expr::var_ref(Rc::new(Var::new("x".into(), Type::Bv(32))));
        let e = Expr::bv_add(Expr::bv_add(x.clone(), bv32(3)), bv32(5));
        let (lhs, rhs) = match e.value() {
            ExprValue::BinOp { op: BinaryOp::BvAdd, lhs, rhs } => (lhs, rhs),
            other => panic!("expected add, got {other:?}"),
        };
        assert!(lhs.ptr_eq(&x));
        assert_eq!(rhs.as_bv_const().unwrap().as_u64(), 8);
    }

    #[test]
    fn extract_folds_through_concat() {
        let hi = Expr::var_ref(Rc::new(Var::new("hi".into(), Type::Bv(8))));
        let lo = Expr::var_ref(Rc::new(Var::new("lo".into(), Type::Bv(8))));
        let cat = Expr::bv_concat(hi.clone(), lo.clone());
        assert!(Expr::bv_extract(cat.clone(), 0, 8).ptr_eq(&lo));
        assert!(Expr::bv_extract(cat, 8, 8).ptr_eq(&hi));
    }

    #[test]
    fn cast_cancellation() {
        let f = Expr::var_ref(Rc::new(Var::new("f".into(), Type::Float(32))));
        assert!(Expr::bv_to_float(Expr::float_to_bv(f.clone())).ptr_eq(&f));
        let p = Expr::var_ref(Rc::new(Var::new("p".into(), Type::Pointer(32))));
        assert!(Expr::bv_to_ptr(Expr::ptr_to_bv(p.clone())).ptr_eq(&p));
        let b = Expr::var_ref(Rc::new(Var::new("b".into(), Type::Bool)));
        assert!(Expr::bv_to_bool(Expr::bool_to_bv(b.clone())).ptr_eq(&b));
    }

    #[test]
    fn exact_udiv_of_scaled_terms() {
        // createExactBVUDiv(BVMul(k * d, x), d) == BVMul(k, x)
        let x = Expr::var_ref(Rc::new(Var::new("x".into(), Type::Bv(32))));
        let e = Expr::bv_mul(bv32(12), x.clone());
        let q = Expr::create_exact_bv_udiv(&e, 4).unwrap();
        let (lhs, rhs) = match q.value() {
            ExprValue::BinOp { op: BinaryOp::BvMul, lhs, rhs } => (lhs, rhs),
            other => panic!("expected mul, got {other:?}"),
        };
        assert!(lhs.ptr_eq(&x));
        assert_eq!(rhs.as_bv_const().unwrap().as_u64(), 3);
    }

    #[test]
    fn exact_udiv_of_sums_requires_both_halves() {
        let x = Expr::var_ref(Rc::new(Var::new("x".into(), Type::Bv(32))));
        let both = Expr::bv_add(Expr::bv_mul(bv32(8), x.clone()), bv32(16));
        assert!(Expr::create_exact_bv_udiv(&both, 4).is_some());
        let half = Expr::bv_add(Expr::bv_mul(bv32(8), x.clone()), bv32(2));
        assert!(Expr::create_exact_bv_udiv(&half, 4).is_none());
        assert!(Expr::create_exact_bv_udiv(&bv32(7), 4).is_none());
        assert!(Expr::create_exact_bv_udiv(&bv32(7), 3).is_none());
    }

    #[test]
    fn exact_sdiv_accepts_the_loop_carried_variable() {
        let v = Rc::new(Var::new("p".into(), Type::Bv(32)));
        let e = Expr::bv_add(Expr::var_ref(v.clone()), bv32(4));
        assert!(Expr::create_exact_bv_sdiv(&e, 4, Some(&v)).is_some());
        assert!(Expr::create_exact_bv_sdiv(&e, 4, None).is_none());
    }

    #[test]
    fn array_candidates_through_ite_and_member_of() {
        let a = test_array("a", Type::Bv(32));
        let b = test_array("b", Type::Bv(8));
        let cond = Expr::var_ref(Rc::new(Var::new("c".into(), Type::Bool)));
        let e = Expr::if_then_else(
            cond,
            Expr::pointer(Expr::global_array_ref(a.clone()), bv32(0)),
            Expr::pointer(Expr::global_array_ref(b.clone()), bv32(0)),
        );
        let mut out = BTreeSet::new();
        assert!(e.compute_array_candidates(&mut out));
        assert_eq!(out.len(), 2);
        assert_eq!(Expr::array_candidate_type(&out), Type::Bv(8));

        let unknown = Expr::var_ref(Rc::new(Var::new("p".into(), Type::Pointer(32))));
        let mut out = BTreeSet::new();
        assert!(!unknown.compute_array_candidates(&mut out));
    }

    #[test]
    fn byte_splice_of_a_constant_round_trips() {
        // Little-endian byte assembly: storing the four bytes of a
        // constant and concatenating them back yields the constant.
        let v = BvConst::from_u64(32, 0xaabb_ccdd);
        let val = Expr::bv_const(v.clone());
        let bytes: Vec<Expr> =
            (0..4).map(|i| Expr::bv_extract(val.clone(), i * 8, 8)).collect();
        let back = Expr::bv_concat_n(bytes);
        assert_eq!(back.as_bv_const(), Some(&v));
    }

    #[test]
    fn pointer_comparison_desugars() {
        let a = test_array("a", Type::Bv(32));
        let p = Expr::pointer(Expr::global_array_ref(a.clone()), bv32(0));
        let q = Expr::pointer(Expr::global_array_ref(a), bv32(4));
        // Same known array: the guard folds to true and the comparison
        // reduces to a signed offset comparison, which folds.
        assert_eq!(Expr::ptr_lt(p.clone(), q.clone()).as_bool_const(), Some(true));
        assert_eq!(Expr::ptr_le(q, p).as_bool_const(), Some(false));
    }
}
