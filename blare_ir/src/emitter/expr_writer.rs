// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The recursive expression printer.
//!
//! The common arms live in a provided trait method; the writers differ
//! only in how they resolve context: the module-context writer registers
//! on-demand intrinsic declarations and consults the integer
//! representation, the function writer additionally resolves SSA
//! temporaries, and the dumper has no context at all and prints the
//! default bit-vector spelling.

use std::collections::BTreeSet;
use std::fmt::{self, Write};
use std::rc::Rc;

use crate::bits::BvConst;
use crate::expr::{AccessKind, BinaryOp, Expr, ExprValue, UnaryOp};
use crate::global_array::GlobalArray;
use crate::module::Module;
use crate::stmt::SourceLoc;
use crate::typ::Type;

use super::int_rep::IntegerRepresentation;
use super::RaceInstrumenter;

/// Mutable emission state shared by all writers of one module: the
/// accumulated intrinsic declarations, the pointer/function-pointer
/// usage flags that decide the header, and the source-location table
/// behind `{:sourceloc_num}` attributes.
pub(crate) struct EmitCtx<'m> {
    pub module: &'m Module,
    pub int_rep: &'m dyn IntegerRepresentation,
    pub race_inst: RaceInstrumenter,
    pub intrinsics: BTreeSet<String>,
    pub uses_pointers: bool,
    pub uses_function_pointers: bool,
    pub source_locs: Vec<SourceLoc>,
}

impl<'m> EmitCtx<'m> {
    pub fn new(
        module: &'m Module,
        int_rep: &'m dyn IntegerRepresentation,
        race_inst: RaceInstrumenter,
    ) -> Self {
        EmitCtx {
            module,
            int_rep,
            race_inst,
            intrinsics: BTreeSet::new(),
            uses_pointers: false,
            uses_function_pointers: false,
            source_locs: Vec::new(),
        }
    }

    /// Requesting the same declaration twice produces exactly one copy
    /// in the output. A terminating `;` is added unless the declaration
    /// supplies its own terminator.
    pub fn add_intrinsic(&mut self, decl: String) {
        let decl = if decl.ends_with(';') || decl.ends_with('}') { decl } else { decl + ";" };
        self.intrinsics.insert(decl);
    }

    pub fn type_name(&mut self, t: &Type) -> String {
        match t {
            Type::Bool => "bool".to_string(),
            Type::Bv(w) | Type::Float(w) => self.int_rep.type_name(*w),
            Type::Pointer(_) => {
                self.uses_pointers = true;
                "ptr".to_string()
            }
            Type::FunctionPointer(_) => {
                self.uses_function_pointers = true;
                "functionPtr".to_string()
            }
            Type::ArrayId(_) => {
                self.uses_pointers = true;
                "arrayId".to_string()
            }
            Type::Any | Type::Unknown => unreachable!("unresolved type reached the emitter"),
        }
    }

    pub fn pointer_width(&self) -> u32 {
        self.module.pointer_width()
    }
}

fn fallback_type_name(t: &Type) -> String {
    match t {
        Type::Bool => "bool".to_string(),
        Type::Bv(w) | Type::Float(w) => format!("bv{w}"),
        Type::Pointer(_) => "ptr".to_string(),
        Type::FunctionPointer(_) => "functionPtr".to_string(),
        Type::ArrayId(_) => "arrayId".to_string(),
        Type::Any => "any".to_string(),
        Type::Unknown => "unknown".to_string(),
    }
}

pub(crate) trait ExprWriter<'m> {
    fn ctx(&mut self) -> Option<&mut EmitCtx<'m>>;

    /// The function writer resolves expressions that were named by an
    /// earlier `Eval` statement.
    fn resolve_temp(&self, _e: &Expr) -> Option<String> {
        None
    }

    fn note_modifies(&mut self, _name: &str) {}

    fn literal(&mut self, c: &BvConst) -> String {
        match self.ctx() {
            Some(ctx) => ctx.int_rep.literal(c),
            None => format!("{}bv{}", c.to_unsigned_string(), c.width()),
        }
    }

    fn type_name(&mut self, t: &Type) -> String {
        match self.ctx() {
            Some(ctx) => ctx.type_name(t),
            None => fallback_type_name(t),
        }
    }

    fn add_intrinsic(&mut self, decl: String) {
        if let Some(ctx) = self.ctx() {
            ctx.add_intrinsic(decl);
        }
    }

    fn race_inst(&mut self) -> RaceInstrumenter {
        self.ctx().map_or(RaceInstrumenter::Standard, |c| c.race_inst)
    }

    /// The candidate arrays a load, store or access predicate may touch.
    /// When the expression itself does not determine the set, falls back
    /// to every module global whose range type matches.
    fn array_candidates_for(
        &mut self,
        array: &Expr,
        want_range: Option<&Type>,
    ) -> Vec<Rc<GlobalArray>> {
        let mut set = BTreeSet::new();
        if array.compute_array_candidates(&mut set) {
            set.into_iter().flatten().collect()
        } else if let Some(ctx) = self.ctx() {
            ctx.module
                .globals()
                .iter()
                .filter(|g| want_range.map_or(true, |t| g.range_type() == t))
                .cloned()
                .collect()
        } else {
            Vec::new()
        }
    }

    /// Prints `leaf(last)` guarded by an if-chain comparing the array-id
    /// expression against each candidate's `$arrayId$$` constant.
    fn write_array_case_split(
        &mut self,
        out: &mut String,
        array: &Expr,
        candidates: &[Rc<GlobalArray>],
        leaf: &dyn Fn(&str) -> String,
    ) -> fmt::Result {
        assert!(!candidates.is_empty());
        let mut aid = String::new();
        self.write_expr(&mut aid, array, 0)?;
        for ga in &candidates[..candidates.len() - 1] {
            write!(out, "(if {aid} == $arrayId$${} then {} else ", ga.name(), leaf(ga.name()))?;
        }
        write!(out, "{}", leaf(candidates.last().unwrap().name()))?;
        for _ in 0..candidates.len() - 1 {
            write!(out, ")")?;
        }
        Ok(())
    }

    fn access_offset_var(&mut self, access: AccessKind, global: &str) -> String {
        let prefix = match access {
            AccessKind::Read => "READ",
            AccessKind::Write => "WRITE",
        };
        match self.race_inst() {
            RaceInstrumenter::Standard => format!("_{prefix}_OFFSET_$${global}"),
            RaceInstrumenter::WatchdogMultiple => format!("_WATCHED_OFFSET_$${global}"),
            RaceInstrumenter::WatchdogSingle => "_WATCHED_OFFSET".to_string(),
        }
    }

    fn write_args(&mut self, out: &mut String, args: &[Expr]) -> fmt::Result {
        for (i, a) in args.iter().enumerate() {
            if i > 0 {
                write!(out, ", ")?;
            }
            self.write_expr(out, a, 0)?;
        }
        Ok(())
    }

    fn write_expr(&mut self, out: &mut String, e: &Expr, depth: u32) -> fmt::Result {
        if let Some(name) = self.resolve_temp(e) {
            return write!(out, "{name}");
        }
        match e.value() {
            ExprValue::BvConstant(c) => {
                let text = self.literal(c);
                write!(out, "{text}")
            }
            ExprValue::BoolConst(b) => write!(out, "{}", if *b { "true" } else { "false" }),
            ExprValue::VarRef(v) => write!(out, "${}", v.name()),
            ExprValue::SpecialVarRef(attr) => {
                let ty = self.type_name(e.typ());
                self.add_intrinsic(format!("const {attr} : {ty}"));
                write!(out, "{attr}")
            }
            ExprValue::GlobalArrayRef(ga) => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_pointers = true;
                }
                write!(out, "$arrayId$${}", ga.name())
            }
            ExprValue::NullArrayRef => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_pointers = true;
                }
                write!(out, "$arrayId$$null$")
            }
            ExprValue::FunctionPointerRef(name) => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_function_pointers = true;
                }
                write!(out, "$functionId$${name}")
            }
            ExprValue::NullFunctionPointer => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_function_pointers = true;
                }
                write!(out, "$functionId$$null$")
            }
            ExprValue::Pointer { array, offset } => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_pointers = true;
                }
                write!(out, "MKPTR(")?;
                self.write_expr(out, array, 0)?;
                write!(out, ", ")?;
                self.write_expr(out, offset, 0)?;
                write!(out, ")")
            }
            ExprValue::ArrayId(sub) => {
                write!(out, "base#MKPTR(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            ExprValue::ArrayOffset(sub) => {
                write!(out, "offset#MKPTR(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            // A member-of expression denotes the array value itself; the
            // candidate set is static metadata.
            ExprValue::ArrayMemberOf { array, .. } => self.write_expr(out, array, depth),
            ExprValue::Load { array, offset, .. } => {
                if let Some(ga) = array.as_global_array_ref() {
                    let paren = 8 < depth;
                    if paren {
                        write!(out, "(")?;
                    }
                    write!(out, "$${}[", ga.name())?;
                    self.write_expr(out, offset, 9)?;
                    write!(out, "]")?;
                    if paren {
                        write!(out, ")")?;
                    }
                    return Ok(());
                }
                let candidates = self.array_candidates_for(array, Some(e.typ()));
                let mut ofs = String::new();
                self.write_expr(&mut ofs, offset, 0)?;
                if candidates.is_empty() {
                    // Load through the null pointer: an uninterpreted
                    // value, kept so the access itself stays visible.
                    let ty = self.type_name(e.typ());
                    let offty = self.type_name(offset.typ());
                    self.add_intrinsic(format!("function $load.null.{ty}({offty}) : {ty}"));
                    return write!(out, "$load.null.{ty}({ofs})");
                }
                self.write_array_case_split(out, array, &candidates, &|g| format!("$${g}[{ofs}]"))
            }
            ExprValue::Atomic { array, offset } => {
                // Statement position is handled by the function writer;
                // this spelling only appears in dumps.
                write!(out, "__atomic_op(")?;
                self.write_expr(out, array, 0)?;
                write!(out, ", ")?;
                self.write_expr(out, offset, 0)?;
                write!(out, ")")
            }
            ExprValue::ArraySnapshot { dst, src } => {
                write!(out, "__array_snapshot(")?;
                self.write_expr(out, dst, 0)?;
                write!(out, ", ")?;
                self.write_expr(out, src, 0)?;
                write!(out, ")")
            }
            ExprValue::AddNoovfl(args) => {
                let width = e.typ().width();
                let ty = self.type_name(e.typ());
                let n = args.len();
                let name = format!("BV{width}_ADD_NOOVFL{n}");
                let params = vec![ty.clone(); n].join(", ");
                self.add_intrinsic(format!("function {name}({params}) : {ty}"));
                write!(out, "{name}(")?;
                self.write_args(out, args)?;
                write!(out, ")")
            }
            ExprValue::Havoc => write!(out, "__havoc"),
            ExprValue::Old(sub) => {
                write!(out, "old(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            ExprValue::OtherInt(sub) => {
                let width = sub.typ().width();
                let ty = self.type_name(sub.typ());
                self.add_intrinsic(format!("function __other_bv{width}({ty}) : {ty}"));
                write!(out, "__other_bv{width}(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            ExprValue::OtherBool(sub) => {
                self.add_intrinsic("function __other_bool(bool) : bool".to_string());
                write!(out, "__other_bool(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            ExprValue::OtherPtrBase(sub) => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_pointers = true;
                }
                self.add_intrinsic("function __other_arrayId(arrayId) : arrayId".to_string());
                write!(out, "__other_arrayId(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            ExprValue::AccessHasOccurred { array, access } => {
                let var = match access {
                    AccessKind::Read => "_READ_HAS_OCCURRED_",
                    AccessKind::Write => "_WRITE_HAS_OCCURRED_",
                };
                if let Some(ga) = array.as_global_array_ref() {
                    return write!(out, "{var}$${}", ga.name());
                }
                let candidates = self.array_candidates_for(array, None);
                if candidates.is_empty() {
                    return write!(out, "false");
                }
                self.write_array_case_split(out, array, &candidates, &|g| format!("{var}$${g}"))
            }
            ExprValue::AccessOffset { array, access } => {
                let access = *access;
                if let Some(ga) = array.as_global_array_ref() {
                    let name = ga.name().to_string();
                    let var = self.access_offset_var(access, &name);
                    return write!(out, "{var}");
                }
                let candidates = self.array_candidates_for(array, None);
                if candidates.is_empty() {
                    let zero = self.literal(&BvConst::zero(e.typ().width()));
                    return write!(out, "{zero}");
                }
                let race = self.race_inst();
                self.write_array_case_split(out, array, &candidates, &move |g: &str| {
                    let prefix = match access {
                        AccessKind::Read => "READ",
                        AccessKind::Write => "WRITE",
                    };
                    match race {
                        RaceInstrumenter::Standard => format!("_{prefix}_OFFSET_$${g}"),
                        RaceInstrumenter::WatchdogMultiple => format!("_WATCHED_OFFSET_$${g}"),
                        RaceInstrumenter::WatchdogSingle => "_WATCHED_OFFSET".to_string(),
                    }
                })
            }
            ExprValue::NotAccessed(array) => {
                if let Some(ga) = array.as_global_array_ref() {
                    return write!(out, "_NOT_ACCESSED_$${}", ga.name());
                }
                let candidates = self.array_candidates_for(array, None);
                if candidates.is_empty() {
                    return write!(out, "true");
                }
                self.write_array_case_split(out, array, &candidates, &|g| {
                    format!("_NOT_ACCESSED_$${g}")
                })
            }
            ExprValue::UninterpretedFunction { name, args } => {
                let ret = self.type_name(e.typ());
                let params: Vec<String> =
                    args.iter().map(|a| a.typ().clone()).map(|t| self.type_name(&t)).collect();
                self.add_intrinsic(format!("function {name}({}) : {ret}", params.join(", ")));
                write!(out, "{name}(")?;
                self.write_args(out, args)?;
                write!(out, ")")
            }
            ExprValue::Call { callee, args } => {
                write!(out, "${callee}(")?;
                self.write_args(out, args)?;
                write!(out, ")")
            }
            ExprValue::CallMemberOf { pointer, calls } => {
                let mut ptr = String::new();
                self.write_expr(&mut ptr, pointer, 0)?;
                for call in &calls[..calls.len() - 1] {
                    let ExprValue::Call { callee, .. } = call.value() else { unreachable!() };
                    write!(out, "(if {ptr} == $functionId$${callee} then ")?;
                    self.write_expr(out, call, 0)?;
                    write!(out, " else ")?;
                }
                self.write_expr(out, calls.last().unwrap(), 0)?;
                for _ in 0..calls.len() - 1 {
                    write!(out, ")")?;
                }
                Ok(())
            }
            ExprValue::IfThenElse { cond, true_expr, false_expr } => {
                write!(out, "(if ")?;
                self.write_expr(out, cond, 0)?;
                write!(out, " then ")?;
                self.write_expr(out, true_expr, 0)?;
                write!(out, " else ")?;
                self.write_expr(out, false_expr, 0)?;
                write!(out, ")")
            }
            ExprValue::Not(sub) => {
                let paren = 7 < depth;
                if paren {
                    write!(out, "(")?;
                }
                write!(out, "!")?;
                self.write_expr(out, sub, 8)?;
                if paren {
                    write!(out, ")")?;
                }
                Ok(())
            }
            ExprValue::Eq { lhs, rhs } => self.write_infix(out, depth, 4, 4, " == ", lhs, rhs),
            ExprValue::Ne { lhs, rhs } => self.write_infix(out, depth, 4, 4, " != ", lhs, rhs),
            ExprValue::And { lhs, rhs } => self.write_infix(out, depth, 2, 3, " && ", lhs, rhs),
            ExprValue::Or { lhs, rhs } => self.write_infix(out, depth, 2, 3, " || ", lhs, rhs),
            ExprValue::Implies { lhs, rhs } => {
                self.write_infix(out, depth, 1, 2, " ==> ", lhs, rhs)
            }
            ExprValue::BvExtract { expr, offset, width } => {
                let abstracted = self.ctx().map(|c| c.int_rep.abstracts_extract());
                if abstracted == Some(true) {
                    let mut sub = String::new();
                    self.write_expr(&mut sub, expr, 0)?;
                    let ctx = self.ctx().unwrap();
                    let text = ctx.int_rep.extract_expr(&sub, offset + width, *offset);
                    let decl = ctx.int_rep.extract_decl();
                    ctx.add_intrinsic(decl);
                    return write!(out, "{text}");
                }
                let paren = 8 < depth;
                if paren {
                    write!(out, "(")?;
                }
                self.write_expr(out, expr, 9)?;
                write!(out, "[{}:{}]", offset + width, offset)?;
                if paren {
                    write!(out, ")")?;
                }
                Ok(())
            }
            ExprValue::BvConcat { lhs, rhs } => {
                let abstracted = self.ctx().map(|c| c.int_rep.abstracts_concat());
                if abstracted == Some(true) {
                    let mut l = String::new();
                    self.write_expr(&mut l, lhs, 0)?;
                    let mut r = String::new();
                    self.write_expr(&mut r, rhs, 0)?;
                    let ctx = self.ctx().unwrap();
                    let text = ctx.int_rep.concat_expr(&l, &r);
                    let decl = ctx.int_rep.concat_decl();
                    ctx.add_intrinsic(decl);
                    return write!(out, "{text}");
                }
                let paren = 4 < depth;
                if paren {
                    write!(out, "(")?;
                }
                self.write_expr(out, lhs, 4)?;
                write!(out, " ++ ")?;
                self.write_expr(out, rhs, 5)?;
                if paren {
                    write!(out, ")")?;
                }
                Ok(())
            }
            ExprValue::BinOp { op, lhs, rhs } => self.write_binop(out, e, *op, lhs, rhs),
            ExprValue::UnOp { op, expr } => self.write_unop(out, e, *op, expr),
        }
    }

    fn write_infix(
        &mut self,
        out: &mut String,
        depth: u32,
        rule: u32,
        operand_depth: u32,
        op: &str,
        lhs: &Expr,
        rhs: &Expr,
    ) -> fmt::Result {
        let paren = rule < depth;
        if paren {
            write!(out, "(")?;
        }
        self.write_expr(out, lhs, operand_depth)?;
        write!(out, "{op}")?;
        self.write_expr(out, rhs, operand_depth)?;
        if paren {
            write!(out, ")")?;
        }
        Ok(())
    }

    fn write_binop(
        &mut self,
        out: &mut String,
        e: &Expr,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> fmt::Result {
        use BinaryOp::*;
        let name = match op {
            BvAdd => "ADD",
            BvSub => "SUB",
            BvMul => "MUL",
            BvSDiv => "SDIV",
            BvUDiv => "UDIV",
            BvSRem => "SREM",
            BvURem => "UREM",
            BvShl => "SHL",
            BvAShr => "ASHR",
            BvLShr => "LSHR",
            BvAnd => "AND",
            BvOr => "OR",
            BvXor => "XOR",
            BvUgt => "UGT",
            BvUge => "UGE",
            BvUlt => "ULT",
            BvUle => "ULE",
            BvSgt => "SGT",
            BvSge => "SGE",
            BvSlt => "SLT",
            BvSle => "SLE",
            FAdd => "FADD",
            FSub => "FSUB",
            FMul => "FMUL",
            FDiv => "FDIV",
            FPow => "FPOW",
            FLt => "FLT",
            FEq => "FEQ",
            FUno => "FUNO",
            PtrLt => "PTR_LT",
            PtrLe => "PTR_LE",
            FuncPtrLt => "FUNCPTR_LT",
            FuncPtrLe => "FUNCPTR_LE",
        };
        match op {
            BvAdd | BvSub | BvMul | BvSDiv | BvUDiv | BvSRem | BvURem | BvShl | BvAShr | BvLShr
            | BvAnd | BvOr | BvXor => {
                let width = e.typ().width();
                if let Some(ctx) = self.ctx() {
                    let decl = ctx.int_rep.arith_binary_decl(name, op, width);
                    ctx.add_intrinsic(decl);
                }
                write!(out, "BV{width}_{name}")?;
            }
            BvUgt | BvUge | BvUlt | BvUle | BvSgt | BvSge | BvSlt | BvSle => {
                let width = lhs.typ().width();
                if let Some(ctx) = self.ctx() {
                    let decl = ctx.int_rep.bool_binary_decl(name, op, width);
                    ctx.add_intrinsic(decl);
                }
                write!(out, "BV{width}_{name}")?;
            }
            FAdd | FSub | FMul | FDiv | FPow => {
                let width = e.typ().width();
                let ty = self.type_name(e.typ());
                self.add_intrinsic(format!("function {name}{width}({ty}, {ty}) : {ty}"));
                write!(out, "{name}{width}")?;
            }
            FLt | FEq | FUno => {
                let width = lhs.typ().width();
                let ty = self.type_name(lhs.typ());
                self.add_intrinsic(format!("function {name}{width}({ty}, {ty}) : bool"));
                write!(out, "{name}{width}")?;
            }
            PtrLt | PtrLe => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_pointers = true;
                }
                self.add_intrinsic(format!("function {name}(ptr, ptr) : bool"));
                write!(out, "{name}")?;
            }
            FuncPtrLt | FuncPtrLe => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_function_pointers = true;
                }
                self.add_intrinsic(format!("function {name}(functionPtr, functionPtr) : bool"));
                write!(out, "{name}")?;
            }
        }
        write!(out, "(")?;
        self.write_expr(out, lhs, 0)?;
        write!(out, ", ")?;
        self.write_expr(out, rhs, 0)?;
        write!(out, ")")
    }

    fn write_unop(&mut self, out: &mut String, e: &Expr, op: UnaryOp, sub: &Expr) -> fmt::Result {
        use UnaryOp::*;
        match op {
            BvZExt => {
                let (from, to) = (sub.typ().width(), e.typ().width());
                if let Some(ctx) = self.ctx() {
                    let decl = ctx.int_rep.zero_extend_decl(from, to);
                    ctx.add_intrinsic(decl);
                }
                write!(out, "BV{from}_ZEXT{to}(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            BvSExt => {
                let (from, to) = (sub.typ().width(), e.typ().width());
                if let Some(ctx) = self.ctx() {
                    let decl = ctx.int_rep.sign_extend_decl(from, to);
                    ctx.add_intrinsic(decl);
                }
                write!(out, "BV{from}_SEXT{to}(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            FpConv => self.write_conversion(out, e, sub, &|f, t| format!("FP{f}_CONV{t}")),
            FpToSi => self.write_conversion(out, e, sub, &|f, t| format!("FP{f}_TO_SI{t}")),
            FpToUi => self.write_conversion(out, e, sub, &|f, t| format!("FP{f}_TO_UI{t}")),
            SiToFp => self.write_conversion(out, e, sub, &|f, t| format!("SI{f}_TO_FP{t}")),
            UiToFp => self.write_conversion(out, e, sub, &|f, t| format!("UI{f}_TO_FP{t}")),
            BvToFloat => {
                let width = e.typ().width();
                let from = self.type_name(sub.typ());
                let to = self.type_name(e.typ());
                self.add_intrinsic(format!("function BV{width}_TO_FLOAT({from}) : {to}"));
                write!(out, "BV{width}_TO_FLOAT(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            FloatToBv => {
                let width = e.typ().width();
                let from = self.type_name(sub.typ());
                let to = self.type_name(e.typ());
                self.add_intrinsic(format!("function FLOAT{width}_TO_BV({from}) : {to}"));
                write!(out, "FLOAT{width}_TO_BV(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            BvToPtr => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_pointers = true;
                }
                let from = self.type_name(sub.typ());
                self.add_intrinsic(format!("function BV_TO_PTR({from}) : ptr"));
                write!(out, "BV_TO_PTR(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            PtrToBv => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_pointers = true;
                }
                let to = self.type_name(e.typ());
                self.add_intrinsic(format!("function PTR_TO_BV(ptr) : {to}"));
                write!(out, "PTR_TO_BV(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            BvToBool => {
                let one = self.literal(&BvConst::from_u64(1, 1));
                write!(out, "(")?;
                self.write_expr(out, sub, 4)?;
                write!(out, " == {one})")
            }
            BoolToBv => {
                let one = self.literal(&BvConst::from_u64(1, 1));
                let zero = self.literal(&BvConst::zero(1));
                write!(out, "(if ")?;
                self.write_expr(out, sub, 0)?;
                write!(out, " then {one} else {zero})")
            }
            BvToFuncPtr => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_function_pointers = true;
                }
                let from = self.type_name(sub.typ());
                self.add_intrinsic(format!("function BV_TO_FUNCPTR({from}) : functionPtr"));
                write!(out, "BV_TO_FUNCPTR(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            FuncPtrToBv => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_function_pointers = true;
                }
                let to = self.type_name(e.typ());
                self.add_intrinsic(format!("function FUNCPTR_TO_BV(functionPtr) : {to}"));
                write!(out, "FUNCPTR_TO_BV(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            PtrToFuncPtr => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_pointers = true;
                    ctx.uses_function_pointers = true;
                }
                self.add_intrinsic("function PTR_TO_FUNCPTR(ptr) : functionPtr".to_string());
                write!(out, "PTR_TO_FUNCPTR(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            FuncPtrToPtr => {
                if let Some(ctx) = self.ctx() {
                    ctx.uses_pointers = true;
                    ctx.uses_function_pointers = true;
                }
                self.add_intrinsic("function FUNCPTR_TO_PTR(functionPtr) : ptr".to_string());
                write!(out, "FUNCPTR_TO_PTR(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
            FAbs | FCos | FExp | FLog | FSin | FSqrt => {
                let name = match op {
                    FAbs => "FABS",
                    FCos => "FCOS",
                    FExp => "FEXP",
                    FLog => "FLOG",
                    FSin => "FSIN",
                    _ => "FSQRT",
                };
                let width = e.typ().width();
                let ty = self.type_name(e.typ());
                self.add_intrinsic(format!("function {name}{width}({ty}) : {ty}"));
                write!(out, "{name}{width}(")?;
                self.write_expr(out, sub, 0)?;
                write!(out, ")")
            }
        }
    }

    fn write_conversion(
        &mut self,
        out: &mut String,
        e: &Expr,
        sub: &Expr,
        name: &dyn Fn(u32, u32) -> String,
    ) -> fmt::Result {
        let from_width = sub.typ().width();
        let to_width = e.typ().width();
        let from = self.type_name(sub.typ());
        let to = self.type_name(e.typ());
        let name = name(from_width, to_width);
        self.add_intrinsic(format!("function {name}({from}) : {to}"));
        write!(out, "{name}(")?;
        self.write_expr(out, sub, 0)?;
        write!(out, ")")
    }
}

/// The module-context writer: prints axioms, global initialisers and
/// contracts against the module's integer representation.
pub(crate) struct BplExprWriter<'a, 'm> {
    pub ctx: &'a mut EmitCtx<'m>,
}

impl<'m> ExprWriter<'m> for BplExprWriter<'_, 'm> {
    fn ctx(&mut self) -> Option<&mut EmitCtx<'m>> {
        Some(&mut *self.ctx)
    }
}

struct ExprDumper;

impl<'m> ExprWriter<'m> for ExprDumper {
    fn ctx(&mut self) -> Option<&mut EmitCtx<'m>> {
        None
    }
}

/// Prints an expression tree without any module context, in the default
/// bit-vector spelling. For debugging.
pub fn dump_expr(e: &Expr) -> String {
    let mut out = String::new();
    let _ = ExprDumper.write_expr(&mut out, e, 0);
    out
}
