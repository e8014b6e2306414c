// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-instruction lowering of one function body.
//!
//! Every instruction produces zero or more statements plus an expression
//! bound to its SSA name. Vector operations fan out element-wise over
//! bit-vector slices; loads and stores try the typed element path first
//! and fall back to byte splicing (little-endian, centralised here) or
//! to demanding a wider memory model from the refinement loop.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::Rc;

use tracing::warn;

use blare_ir::{AccessKind, BlockId, Expr, Function as IrFunction, SourceLoc, Stmt, Type, Var};
use blare_ssa as ssa;

use crate::error::{Error, Result};
use crate::lang::SourceLanguage;
use crate::special_functions::{is_uninterpreted_function, Dim, SpecialFunction};
use crate::translate_module::{ArrayKey, ModuleTranslator, ValueKey};

pub(crate) struct FunctionTranslator<'a, 'm> {
    tm: &'a mut ModuleTranslator<'m>,
    fid: usize,
    func: &'m ssa::Function,
    bf: IrFunction,
    is_entry: bool,
    value_expr_map: HashMap<ssa::LocalId, Expr>,
    block_map: Vec<BlockId>,
    phi_var_map: HashMap<ssa::LocalId, Rc<Var>>,
    phi_assigns: BTreeMap<ssa::LocalId, (ssa::Type, Vec<Expr>)>,
    return_var: Option<Rc<Var>>,
    return_vals: Vec<Expr>,
}

fn source_loc(loc: Option<&ssa::SourceLoc>) -> Option<SourceLoc> {
    loc.map(|l| SourceLoc { file: l.file.clone(), dir: l.dir.clone(), line: l.line, col: l.col })
}

fn successors(term: &ssa::Terminator) -> Vec<usize> {
    match term {
        ssa::Terminator::Br { dest } => vec![*dest],
        ssa::Terminator::CondBr { then_dest, else_dest, .. } => vec![*then_dest, *else_dest],
        ssa::Terminator::Switch { cases, default, .. } => {
            let mut out: Vec<usize> = cases.iter().map(|(_, d)| *d).collect();
            out.push(*default);
            out
        }
        ssa::Terminator::Ret { .. } | ssa::Terminator::Unreachable => Vec::new(),
    }
}

/// Orders the blocks so that a block with exactly one predecessor
/// follows that predecessor; instruction uses then never precede their
/// definitions while translating.
fn block_order(func: &ssa::Function) -> Vec<usize> {
    let n = func.blocks.len();
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, block) in func.blocks.iter().enumerate() {
        for s in successors(&block.term) {
            preds[s].push(i);
        }
    }
    fn add(i: usize, preds: &[Vec<usize>], seen: &mut [bool], list: &mut Vec<usize>) {
        if seen[i] {
            return;
        }
        seen[i] = true;
        if preds[i].len() == 1 {
            add(preds[i][0], preds, seen, list);
        }
        list.push(i);
    }
    let mut seen = vec![false; n];
    let mut list = Vec::with_capacity(n);
    for i in 0..n {
        add(i, &preds, &mut seen, &mut list);
    }
    list
}

impl<'a, 'm> FunctionTranslator<'a, 'm> {
    pub(crate) fn new(
        tm: &'a mut ModuleTranslator<'m>,
        fid: usize,
        is_entry: bool,
    ) -> Result<Self> {
        let func = &tm.src.functions[fid];
        let sig = tm.fn_sigs[fid].as_ref().expect("translating a handled function");
        let mut bf = IrFunction::new(&sig.name, func.display_name());
        if let Some(ret) = &sig.ret {
            bf.add_return(ret.clone(), "ret");
        }
        Ok(FunctionTranslator {
            tm,
            fid,
            func,
            bf,
            is_entry,
            value_expr_map: HashMap::new(),
            block_map: Vec::new(),
            phi_var_map: HashMap::new(),
            phi_assigns: BTreeMap::new(),
            return_var: None,
            return_vals: Vec::new(),
        })
    }

    /// A body translated in isolation so its return value can become a
    /// module axiom.
    pub(crate) fn new_axiom(
        tm: &'a mut ModuleTranslator<'m>,
        fid: usize,
        ret: Type,
    ) -> Result<Self> {
        let func = &tm.src.functions[fid];
        let mut bf = IrFunction::new(&func.name, func.display_name());
        bf.add_return(ret, "ret");
        Ok(FunctionTranslator {
            tm,
            fid,
            func,
            bf,
            is_entry: false,
            value_expr_map: HashMap::new(),
            block_map: Vec::new(),
            phi_var_map: HashMap::new(),
            phi_assigns: BTreeMap::new(),
            return_var: None,
            return_vals: Vec::new(),
        })
    }

    pub(crate) fn translate(mut self) -> Result<IrFunction> {
        let pw = self.tm.pointer_width();
        if self.is_entry || self.func.name == "main" {
            self.bf.set_entry_point(true);
        }
        if self.is_entry {
            self.bf.add_attribute("kernel");
        }
        if self.tm.lang == SourceLanguage::OpenCl && self.func.name == "barrier" {
            self.bf.add_attribute("barrier");
        }

        for (index, param) in self.func.params.iter().enumerate() {
            if self.is_entry && param.ty.is_pointer() {
                let ga = self
                    .tm
                    .get_global_array(ArrayKey::Param { func: self.fid, index }, true)?;
                self.value_expr_map.insert(
                    index,
                    Expr::pointer(Expr::global_array_ref(ga), Expr::bv_zero(pw)),
                );
            } else {
                let key = ValueKey::Param { func: self.fid, index };
                let typ = self.tm.modelled_type(key, &param.ty)?;
                let var = self.bf.add_argument(typ, &param.name);
                let e = self.tm.unmodel_value(key, Expr::var_ref(var))?;
                self.value_expr_map.insert(index, e);
            }
        }

        self.return_var = self.bf.returns().first().cloned();

        for block in &self.func.blocks {
            let id = self.bf.add_basic_block(&block.name);
            self.block_map.push(id);
        }
        // Phi names are plain variables; bind them up front so a use in
        // any block resolves.
        for block in &self.func.blocks {
            for phi in &block.phis {
                let var = self.phi_variable(phi)?;
                let key = ValueKey::Phi { func: self.fid, local: phi.result };
                let e = self.tm.unmodel_value(key, Expr::var_ref(var))?;
                self.value_expr_map.insert(phi.result, e);
            }
        }
        for index in block_order(self.func) {
            self.translate_basic_block(index)?;
        }

        // When everything is a byte array there is nothing left to
        // refine, so skip the model computation.
        if !self.tm.model_all_as_byte_array {
            let phi_assigns = std::mem::take(&mut self.phi_assigns);
            for (local, (ty, assigns)) in phi_assigns {
                let var = self.phi_var_map.get(&local).cloned();
                self.tm.compute_value_model(
                    ValueKey::Phi { func: self.fid, local },
                    var.as_ref(),
                    &assigns,
                    &ty,
                );
            }
            let return_vals = std::mem::take(&mut self.return_vals);
            self.tm.compute_value_model(
                ValueKey::Return { func: self.fid },
                None,
                &return_vals,
                &self.func.ret,
            );
        }

        Ok(self.bf)
    }

    fn translate_value(&mut self, v: &ssa::Value) -> Result<Expr> {
        match v {
            ssa::Value::Local(id) => Ok(self
                .value_expr_map
                .get(id)
                .expect("SSA value used before definition")
                .clone()),
            ssa::Value::Constant(c) => self.tm.translate_constant(c),
        }
    }

    fn phi_variable(&mut self, phi: &ssa::Phi) -> Result<Rc<Var>> {
        if let Some(var) = self.phi_var_map.get(&phi.result) {
            return Ok(var.clone());
        }
        let key = ValueKey::Phi { func: self.fid, local: phi.result };
        let typ = self.tm.modelled_type(key, &phi.ty)?;
        let var = self.bf.add_local(typ, &format!("phi{}", phi.result));
        self.phi_var_map.insert(phi.result, var.clone());
        Ok(var)
    }

    fn add_stmt(&mut self, bbb: BlockId, stmt: Stmt) {
        self.bf.block_mut(bbb).add_stmt(stmt);
    }

    fn add_eval(&mut self, bbb: BlockId, e: &Expr, loc: Option<SourceLoc>) {
        self.add_stmt(bbb, Stmt::eval(e.clone()).with_location(loc));
    }

    fn demand_byte_array(&mut self, ptr_arr: &Expr) {
        self.tm.need_additional_byte_array_models = true;
        let mut candidates = BTreeSet::new();
        if ptr_arr.compute_array_candidates(&mut candidates) {
            for ga in candidates.into_iter().flatten() {
                let key = self.tm.global_value_map[ga.name()];
                self.tm.model_as_byte_array.insert(key);
            }
        } else {
            self.tm.next_model_all_as_byte_array = true;
        }
    }

    /// Element-wise fan-out for binary operations on vectors. The
    /// elements of float vectors cross the bit-pattern boundary on the
    /// way in and out.
    fn simd_binary(
        &mut self,
        bbb: BlockId,
        ty: &ssa::Type,
        op_ty: &ssa::Type,
        lhs: Expr,
        rhs: Expr,
        f: &mut dyn FnMut(&mut Self, Expr, Expr) -> Result<Expr>,
    ) -> Result<Expr> {
        let Some((res_elem, n)) = ty.vector_parts() else {
            return f(self, lhs, rhs);
        };
        let (op_elem, op_n) = op_ty.vector_parts().expect("vector operands for vector result");
        assert_eq!(n, op_n);
        let elem_width = lhs.typ().width() / n;
        let mut elems = Vec::with_capacity(n as usize);
        for i in 0..n {
            let mut li = Expr::bv_extract(lhs.clone(), i * elem_width, elem_width);
            let mut ri = Expr::bv_extract(rhs.clone(), i * elem_width, elem_width);
            if op_elem.is_float() {
                li = Expr::bv_to_float(li);
                ri = Expr::bv_to_float(ri);
            }
            let mut e = f(self, li, ri)?;
            self.add_eval(bbb, &e, None);
            if res_elem.is_float() {
                e = Expr::float_to_bv(e);
                self.add_eval(bbb, &e, None);
            }
            elems.push(e);
        }
        Ok(Expr::bv_concat_n(elems))
    }

    fn simd_unary(
        &mut self,
        bbb: BlockId,
        ty: &ssa::Type,
        op_ty: &ssa::Type,
        op: Expr,
        f: &mut dyn FnMut(&mut Self, &ssa::Type, Expr) -> Result<Expr>,
    ) -> Result<Expr> {
        let Some((res_elem, n)) = ty.vector_parts() else {
            return f(self, ty, op);
        };
        let (op_elem, op_n) = op_ty.vector_parts().expect("vector operand for vector result");
        assert_eq!(n, op_n);
        let elem_width = op.typ().width() / n;
        let mut elems = Vec::with_capacity(n as usize);
        for i in 0..n {
            let mut oi = Expr::bv_extract(op.clone(), i * elem_width, elem_width);
            if op_elem.is_float() {
                oi = Expr::bv_to_float(oi);
            }
            let mut e = f(self, res_elem, oi)?;
            self.add_eval(bbb, &e, None);
            if res_elem.is_float() {
                e = Expr::float_to_bv(e);
                self.add_eval(bbb, &e, None);
            }
            elems.push(e);
        }
        Ok(Expr::bv_concat_n(elems))
    }

    fn translate_basic_block(&mut self, index: usize) -> Result<()> {
        let bbb = self.block_map[index];
        let block = &self.func.blocks[index];
        for inst in &block.insts {
            self.translate_instruction(bbb, inst)?;
        }
        self.translate_terminator(bbb, index, &block.term, source_loc(block.term_loc.as_ref()))
    }

    fn translate_instruction(&mut self, bbb: BlockId, inst: &ssa::Instruction) -> Result<()> {
        let e = match &inst.op {
            ssa::Op::Binary { op, ty, lhs, rhs } => {
                let l = self.translate_value(lhs)?;
                let r = self.translate_value(rhs)?;
                use ssa::BinOp::*;
                let f: fn(Expr, Expr) -> Expr = match op {
                    Add => Expr::bv_add,
                    FAdd => Expr::fadd,
                    Sub => Expr::bv_sub,
                    FSub => Expr::fsub,
                    Mul => Expr::bv_mul,
                    FMul => Expr::fmul,
                    SDiv => Expr::bv_sdiv,
                    UDiv => Expr::bv_udiv,
                    FDiv => Expr::fdiv,
                    SRem => Expr::bv_srem,
                    URem => Expr::bv_urem,
                    Shl => Expr::bv_shl,
                    AShr => Expr::bv_ashr,
                    LShr => Expr::bv_lshr,
                    And => Expr::bv_and,
                    Or => Expr::bv_or,
                    Xor => Expr::bv_xor,
                };
                self.simd_binary(bbb, ty, ty, l, r, &mut |_, a, b| Ok(f(a, b)))?
            }
            ssa::Op::Gep { base, source_elem, indices } => {
                let ptr = self.translate_value(base)?;
                let mut index_exprs = Vec::with_capacity(indices.len());
                for index in indices {
                    index_exprs.push(self.translate_value(index)?);
                }
                self.tm.translate_gep(ptr, source_elem, &index_exprs)?
            }
            ssa::Op::Alloca { .. } => {
                let local = inst.result.expect("alloca without a result");
                let ga = self
                    .tm
                    .get_global_array(ArrayKey::Alloca { func: self.fid, local }, false)?;
                Expr::pointer(
                    Expr::global_array_ref(ga),
                    Expr::bv_zero(self.tm.pointer_width()),
                )
            }
            ssa::Op::Load { ty, ptr } => self.translate_load(bbb, ty, ptr)?,
            ssa::Op::Store { value, value_ty, ptr } => {
                return self.translate_store(bbb, value, value_ty, ptr, source_loc(inst.loc.as_ref()));
            }
            ssa::Op::ICmp { pred, ty, op_ty, lhs, rhs } => {
                let l = self.translate_value(lhs)?;
                let r = self.translate_value(rhs)?;
                let pred = *pred;
                self.simd_binary(bbb, ty, op_ty, l, r, &mut |s, a, b| {
                    let e = s.tm.translate_icmp(pred, a, b)?;
                    s.add_eval(bbb, &e, None);
                    Ok(Expr::bool_to_bv(e))
                })?
            }
            ssa::Op::FCmp { pred, ty, op_ty, lhs, rhs } => {
                let l = self.translate_value(lhs)?;
                let r = self.translate_value(rhs)?;
                let (eq, gt, lt, uno) = pred.flags();
                self.simd_binary(bbb, ty, op_ty, l, r, &mut |s, a, b| {
                    let mut e = Expr::bool_const(false);
                    if eq {
                        e = Expr::or(e, Expr::feq(a.clone(), b.clone()));
                    }
                    if gt {
                        e = Expr::or(e, Expr::flt(b.clone(), a.clone()));
                    }
                    if lt {
                        e = Expr::or(e, Expr::flt(a.clone(), b.clone()));
                    }
                    if uno {
                        e = Expr::or(e, Expr::funo(a, b));
                    }
                    s.add_eval(bbb, &e, None);
                    Ok(Expr::bool_to_bv(e))
                })?
            }
            ssa::Op::Cast { kind, ty, op_ty, value } => {
                let op = self.translate_value(value)?;
                let original = op.clone();
                let e = self.translate_cast(bbb, *kind, ty, op_ty, op)?;
                if e.ptr_eq(&original) {
                    // Representation no-op: bind the operand directly,
                    // with no evaluation of its own.
                    if let Some(result) = inst.result {
                        self.value_expr_map.insert(result, e);
                    }
                    return Ok(());
                }
                e
            }
            ssa::Op::Select { ty: _, cond, true_value, false_value } => {
                let c = Expr::bv_to_bool(self.translate_value(cond)?);
                let t = self.translate_value(true_value)?;
                let f = self.translate_value(false_value)?;
                Expr::if_then_else(c, t, f)
            }
            ssa::Op::ExtractElement { vec_ty, vector, index } => {
                let v = self.translate_value(vector)?;
                let idx = self.translate_value(index)?;
                let (elem, _) = vec_ty.vector_parts().expect("extractelement from non-vector");
                let elem_bits = self.tm.layout.size_bits(elem) as u32;
                let i = idx
                    .as_bv_const()
                    .ok_or_else(|| {
                        Error::implementation_limitation("non-constant vector index")
                    })?
                    .as_u64() as u32;
                let mut e = Expr::bv_extract(v, elem_bits * i, elem_bits);
                if elem.is_float() {
                    e = Expr::bv_to_float(e);
                }
                e
            }
            ssa::Op::InsertElement { vec_ty, vector, element, index } => {
                let v = self.translate_value(vector)?;
                let mut new_elem = self.translate_value(element)?;
                let idx = self.translate_value(index)?;
                let (elem, n) = vec_ty.vector_parts().expect("insertelement into non-vector");
                if elem.is_float() {
                    new_elem = Expr::float_to_bv(new_elem);
                }
                let elem_bits = self.tm.layout.size_bits(elem) as u32;
                let i = idx
                    .as_bv_const()
                    .ok_or_else(|| {
                        Error::implementation_limitation("non-constant vector index")
                    })?
                    .as_u64() as u32;
                let mut elems = Vec::with_capacity(n as usize);
                for j in 0..n {
                    elems.push(if j == i {
                        new_elem.clone()
                    } else {
                        Expr::bv_extract(v.clone(), elem_bits * j, elem_bits)
                    });
                }
                Expr::bv_concat_n(elems)
            }
            ssa::Op::ShuffleVector { vec_ty, v1, v2, mask } => {
                let a = self.translate_value(v1)?;
                let b = self.translate_value(v2)?;
                let (elem, n) = vec_ty.vector_parts().expect("shuffle of non-vector");
                let elem_bits = self.tm.layout.size_bits(elem) as u32;
                let mut elems = Vec::with_capacity(mask.len());
                for &m in mask {
                    let e = if m < 0 {
                        Expr::bv_zero(elem_bits)
                    } else if (m as u32) < n {
                        Expr::bv_extract(a.clone(), elem_bits * m as u32, elem_bits)
                    } else {
                        Expr::bv_extract(b.clone(), elem_bits * (m as u32 - n), elem_bits)
                    };
                    elems.push(e);
                }
                Expr::bv_concat_n(elems)
            }
            ssa::Op::ExtractValue { agg_ty, aggregate, indices } => {
                let agg = self.translate_value(aggregate)?;
                self.translate_extract_value(agg_ty, agg, indices)?
            }
            ssa::Op::InsertValue { agg_ty, aggregate, value, indices } => {
                let agg = self.translate_value(aggregate)?;
                let value = self.translate_value(value)?;
                self.translate_insert_value(agg_ty, agg, value, indices)?
            }
            ssa::Op::Call { callee, fn_ty, args } => {
                return self.translate_call(bbb, inst, callee, fn_ty, args);
            }
        };

        if let Some(result) = inst.result {
            self.value_expr_map.insert(result, e.clone());
        }
        self.add_eval(bbb, &e, source_loc(inst.loc.as_ref()));
        Ok(())
    }

    fn translate_load(&mut self, bbb: BlockId, ty: &ssa::Type, ptr: &ssa::Value) -> Result<Expr> {
        let ptr_e = self.translate_value(ptr)?;
        let ptr_arr = Expr::array_id(ptr_e.clone(), self.tm.default_range());
        let ptr_ofs = Expr::array_offset(ptr_e);
        let arr_range = ptr_arr.typ().range();
        let load_ty = self.tm.translate_type(ty)?;
        let vec = ty.vector_parts();
        let load_el_ty = match vec {
            Some((elem, _)) => self.tm.translate_type(elem)?,
            None => load_ty.clone(),
        };
        assert!(load_ty.width() % 8 == 0, "load of sub-byte width");

        let div = if arr_range == load_el_ty || arr_range.is_any() {
            Expr::create_exact_bv_udiv(&ptr_ofs, u64::from(load_el_ty.width() / 8))
        } else {
            None
        };
        if let Some(div) = div {
            if let Some((_, n)) = vec {
                let mut parts = Vec::with_capacity(n as usize);
                for i in 0..n {
                    let elem_ofs = Expr::bv_add(
                        div.clone(),
                        Expr::bv_const_u64(div.typ().width(), u64::from(i)),
                    );
                    let mut value =
                        Expr::load(ptr_arr.clone(), elem_ofs, load_el_ty.clone(), false);
                    self.add_eval(bbb, &value, None);
                    if load_el_ty.is_pointer() {
                        value = Expr::ptr_to_bv(value);
                    } else if load_el_ty.is_float() {
                        value = Expr::float_to_bv(value);
                    }
                    parts.push(value);
                }
                return Ok(Expr::bv_concat_n(parts));
            }
            return Ok(Expr::load(ptr_arr, div, load_el_ty, false));
        }
        if arr_range == Type::Bv(8) {
            let mut bytes = Vec::with_capacity((load_ty.width() / 8) as usize);
            for i in 0..load_ty.width() / 8 {
                let byte_ofs = Expr::bv_add(
                    ptr_ofs.clone(),
                    Expr::bv_const_u64(ptr_ofs.typ().width(), u64::from(i)),
                );
                let byte = Expr::load(ptr_arr.clone(), byte_ofs, Type::Bv(8), false);
                self.add_eval(bbb, &byte, None);
                bytes.push(byte);
            }
            let mut e = Expr::bv_concat_n(bytes);
            match &load_ty {
                Type::Pointer(_) => e = Expr::bv_to_ptr(e),
                Type::FunctionPointer(w) => e = Expr::bv_to_func_ptr(*w, e),
                Type::Float(_) => e = Expr::bv_to_float(e),
                _ => {}
            }
            return Ok(e);
        }
        // The access does not fit this array's element type; demand a
        // byte-array model and yield an arbitrary value for this round.
        self.demand_byte_array(&ptr_arr);
        Ok(self.tm.translate_arbitrary(&load_ty))
    }

    fn translate_store(
        &mut self,
        bbb: BlockId,
        value: &ssa::Value,
        value_ty: &ssa::Type,
        ptr: &ssa::Value,
        loc: Option<SourceLoc>,
    ) -> Result<()> {
        let ptr_e = self.translate_value(ptr)?;
        let val = self.translate_value(value)?;
        let ptr_arr = Expr::array_id(ptr_e.clone(), self.tm.default_range());
        let ptr_ofs = Expr::array_offset(ptr_e);
        let arr_range = ptr_arr.typ().range();
        let store_ty = val.typ().clone();
        let vec = value_ty.vector_parts();
        let store_el_ty = match vec {
            Some((elem, _)) => self.tm.translate_type(elem)?,
            None => store_ty.clone(),
        };
        assert!(self.tm.layout.size_bits(value_ty) % 8 == 0, "store of sub-byte width");

        let div = if arr_range == store_el_ty {
            Expr::create_exact_bv_udiv(&ptr_ofs, u64::from(store_el_ty.width() / 8))
        } else {
            None
        };
        if let Some(div) = div {
            if let Some((_, n)) = vec {
                let elem_width = store_el_ty.width();
                for i in 0..n {
                    let elem_ofs = Expr::bv_add(
                        div.clone(),
                        Expr::bv_const_u64(div.typ().width(), u64::from(i)),
                    );
                    let mut elem = Expr::bv_extract(val.clone(), i * elem_width, elem_width);
                    if store_el_ty.is_pointer() {
                        elem = Expr::bv_to_ptr(elem);
                    } else if store_el_ty.is_float() {
                        elem = Expr::bv_to_float(elem);
                    }
                    self.add_stmt(
                        bbb,
                        Stmt::store(ptr_arr.clone(), elem_ofs, elem).with_location(loc.clone()),
                    );
                }
            } else {
                self.add_stmt(bbb, Stmt::store(ptr_arr, div, val).with_location(loc));
            }
            return Ok(());
        }
        if arr_range == Type::Bv(8) {
            let mut v = val;
            match v.typ().clone() {
                Type::Pointer(_) => {
                    v = Expr::ptr_to_bv(v);
                    self.add_eval(bbb, &v, loc.clone());
                }
                Type::FunctionPointer(w) => {
                    v = Expr::func_ptr_to_bv(w, v);
                    self.add_eval(bbb, &v, loc.clone());
                }
                Type::Float(_) => {
                    v = Expr::float_to_bv(v);
                    self.add_eval(bbb, &v, loc.clone());
                }
                _ => {}
            }
            for i in 0..v.typ().width() / 8 {
                let byte_ofs = Expr::bv_add(
                    ptr_ofs.clone(),
                    Expr::bv_const_u64(ptr_ofs.typ().width(), u64::from(i)),
                );
                // Little-endian byte assembly.
                let byte = Expr::bv_extract(v.clone(), i * 8, 8);
                self.add_stmt(
                    bbb,
                    Stmt::store(ptr_arr.clone(), byte_ofs, byte).with_location(loc.clone()),
                );
            }
            return Ok(());
        }
        self.demand_byte_array(&ptr_arr);
        Ok(())
    }

    fn translate_cast(
        &mut self,
        bbb: BlockId,
        kind: ssa::CastKind,
        ty: &ssa::Type,
        op_ty: &ssa::Type,
        op: Expr,
    ) -> Result<Expr> {
        use ssa::CastKind::*;
        let pw = self.tm.pointer_width();
        let e = match kind {
            ZExt => self.simd_unary(bbb, ty, op_ty, op, &mut |s, t, o| {
                Ok(Expr::bv_zext(s.tm.layout.size_bits(t) as u32, o))
            })?,
            SExt => self.simd_unary(bbb, ty, op_ty, op, &mut |s, t, o| {
                Ok(Expr::bv_sext(s.tm.layout.size_bits(t) as u32, o))
            })?,
            Trunc => self.simd_unary(bbb, ty, op_ty, op, &mut |s, t, o| {
                Ok(Expr::bv_extract(o, 0, s.tm.layout.size_bits(t) as u32))
            })?,
            FpExt | FpTrunc => self.simd_unary(bbb, ty, op_ty, op, &mut |s, t, o| {
                Ok(Expr::fp_conv(s.tm.layout.size_bits(t) as u32, o))
            })?,
            FpToSi => self.simd_unary(bbb, ty, op_ty, op, &mut |s, t, o| {
                Ok(Expr::fp_to_si(s.tm.layout.size_bits(t) as u32, o))
            })?,
            FpToUi => self.simd_unary(bbb, ty, op_ty, op, &mut |s, t, o| {
                Ok(Expr::fp_to_ui(s.tm.layout.size_bits(t) as u32, o))
            })?,
            SiToFp => self.simd_unary(bbb, ty, op_ty, op, &mut |s, t, o| {
                Ok(Expr::si_to_fp(s.tm.layout.size_bits(t) as u32, o))
            })?,
            UiToFp => self.simd_unary(bbb, ty, op_ty, op, &mut |s, t, o| {
                Ok(Expr::ui_to_fp(s.tm.layout.size_bits(t) as u32, o))
            })?,
            BitCast => self.tm.translate_bitcast(op_ty, ty, op)?,
            IntToPtr => {
                let op = Expr::bv_zext(pw, op);
                if ty.pointee().is_function() {
                    Expr::bv_to_func_ptr(pw, op)
                } else {
                    Expr::bv_to_ptr(op)
                }
            }
            PtrToInt => {
                let width = self.tm.layout.size_bits(ty) as u32;
                if op.typ().is_function_pointer() {
                    Expr::func_ptr_to_bv(width, op)
                } else {
                    Expr::bv_zext(width, Expr::ptr_to_bv(op))
                }
            }
            AddrSpaceCast => op,
        };
        Ok(e)
    }

    fn translate_extract_value(
        &mut self,
        agg_ty: &ssa::Type,
        agg: Expr,
        indices: &[u64],
    ) -> Result<Expr> {
        let mut current = agg_ty.clone();
        let mut value = agg;
        for &index in indices {
            match current.clone() {
                ssa::Type::Struct { fields, packed } => {
                    let offset = self.tm.layout.field_offset_bytes(&fields, packed, index as usize);
                    let field = fields[index as usize].clone();
                    let size = self.tm.layout.size_bits(&field) as u32;
                    value = Expr::bv_extract(value, (offset * 8) as u32, size);
                    current = field;
                }
                ssa::Type::Array { elem, .. } | ssa::Type::Vector { elem, .. } => {
                    let elem_size = self.tm.layout.alloc_size_bytes(&elem);
                    let size = self.tm.layout.size_bits(&elem) as u32;
                    value = Expr::bv_extract(value, (index * elem_size * 8) as u32, size);
                    current = *elem;
                }
                other => {
                    return Err(Error::implementation_limitation(format!(
                        "unhandled type {other} in value extraction"
                    )));
                }
            }
            let elem_ty = self.tm.translate_type(&current)?;
            match elem_ty {
                Type::Pointer(_) => value = Expr::bv_to_ptr(value),
                Type::FunctionPointer(w) => value = Expr::bv_to_func_ptr(w, value),
                Type::Float(_) => value = Expr::bv_to_float(value),
                _ => {}
            }
        }
        Ok(value)
    }

    fn translate_insert_value(
        &mut self,
        agg_ty: &ssa::Type,
        agg: Expr,
        value: Expr,
        indices: &[u64],
    ) -> Result<Expr> {
        let mut current = agg_ty.clone();
        let mut offset = 0u64;
        for &index in indices {
            match current.clone() {
                ssa::Type::Struct { fields, packed } => {
                    offset += self.tm.layout.field_offset_bytes(&fields, packed, index as usize);
                    current = fields[index as usize].clone();
                }
                ssa::Type::Array { elem, .. } | ssa::Type::Vector { elem, .. } => {
                    offset += index * self.tm.layout.alloc_size_bytes(&elem);
                    current = *elem;
                }
                other => {
                    return Err(Error::implementation_limitation(format!(
                        "unhandled type {other} in value insertion"
                    )));
                }
            }
        }

        let mut v = value;
        match v.typ().clone() {
            Type::Pointer(_) => v = Expr::ptr_to_bv(v),
            Type::FunctionPointer(w) => v = Expr::func_ptr_to_bv(w, v),
            Type::Float(_) => v = Expr::float_to_bv(v),
            _ => {}
        }

        let agg_width = agg.typ().width();
        let mut parts = Vec::new();
        if offset > 0 {
            parts.push(Expr::bv_extract(agg.clone(), 0, (offset * 8) as u32));
        }
        let value_end = (offset * 8) as u32 + v.typ().width();
        parts.push(v);
        if value_end < agg_width {
            parts.push(Expr::bv_extract(agg, value_end, agg_width - value_end));
        }
        Ok(Expr::bv_concat_n(parts))
    }

    fn translate_call(
        &mut self,
        bbb: BlockId,
        inst: &ssa::Instruction,
        callee: &ssa::Callee,
        fn_ty: &ssa::Type,
        args: &[ssa::Value],
    ) -> Result<()> {
        let ssa::Type::Function { ret: ret_ty, .. } = fn_ty else {
            return Err(Error::fatal("call through a non-function type"));
        };
        let mut arg_exprs = Vec::with_capacity(args.len());
        for arg in args {
            arg_exprs.push(self.translate_value(arg)?);
        }

        match callee {
            ssa::Callee::Direct(target) => {
                let target = *target;
                let name = self.tm.src.functions[target].name.clone();
                if let Some(sf) = SpecialFunction::lookup(self.tm.lang, &name) {
                    let e =
                        self.handle_special(bbb, sf, ret_ty, source_loc(inst.loc.as_ref()), &arg_exprs)?;
                    return match (e, inst.result) {
                        (Some(e), Some(result)) => {
                            self.value_expr_map.insert(result, e.clone());
                            self.add_eval(bbb, &e, source_loc(inst.loc.as_ref()));
                            Ok(())
                        }
                        (None, None) => Ok(()),
                        _ => Err(Error::fatal(format!(
                            "special function '{name}' used inconsistently"
                        ))),
                    };
                }
                if name.starts_with("llvm.") {
                    if ret_ty.is_void() {
                        warn!("intrinsic {name} not supported, treating as no-op");
                        return Ok(());
                    }
                    return Err(Error::implementation_limitation(format!(
                        "unsupported intrinsic '{name}'"
                    )));
                }
                if is_uninterpreted_function(&name) {
                    let ret = self.tm.translate_type(ret_ty)?;
                    let e = Expr::uninterpreted_function(&name, arg_exprs, ret);
                    let result = inst
                        .result
                        .ok_or_else(|| Error::fatal("uninterpreted function with no result"))?;
                    self.value_expr_map.insert(result, e.clone());
                    self.add_eval(bbb, &e, source_loc(inst.loc.as_ref()));
                    return Ok(());
                }
                if self.tm.fn_sigs[target].is_none() {
                    return Err(Error::implementation_limitation(format!(
                        "call to unsupported function '{name}'"
                    )));
                }
                if ret_ty.is_void() {
                    let stmt = self.tm.model_call_stmt(
                        fn_ty,
                        Some(target),
                        None,
                        &arg_exprs,
                        source_loc(inst.loc.as_ref()),
                    )?;
                    self.add_stmt(bbb, stmt);
                    Ok(())
                } else {
                    let e = self.tm.model_call_expr(fn_ty, Some(target), None, &arg_exprs)?;
                    self.add_eval(bbb, &e, source_loc(inst.loc.as_ref()));
                    let result = inst.result.expect("non-void call without a result");
                    let unmodelled =
                        self.tm.unmodel_value(ValueKey::Return { func: target }, e)?;
                    self.value_expr_map.insert(result, unmodelled);
                    Ok(())
                }
            }
            ssa::Callee::Indirect(pointer) => {
                let fp = self.translate_value(pointer)?;
                if ret_ty.is_void() {
                    let stmt = self.tm.model_call_stmt(
                        fn_ty,
                        None,
                        Some(fp),
                        &arg_exprs,
                        source_loc(inst.loc.as_ref()),
                    )?;
                    self.add_stmt(bbb, stmt);
                    Ok(())
                } else {
                    let e = self.tm.model_call_expr(fn_ty, None, Some(fp), &arg_exprs)?;
                    self.add_eval(bbb, &e, source_loc(inst.loc.as_ref()));
                    let result = inst.result.expect("non-void call without a result");
                    self.value_expr_map.insert(result, e);
                    Ok(())
                }
            }
        }
    }

    fn translate_terminator(
        &mut self,
        bbb: BlockId,
        index: usize,
        term: &ssa::Terminator,
        loc: Option<SourceLoc>,
    ) -> Result<()> {
        match term {
            ssa::Terminator::Br { dest } => {
                self.add_phi_assigns(bbb, index, *dest)?;
                self.add_stmt(bbb, Stmt::goto_block(self.block_map[*dest]));
                Ok(())
            }
            ssa::Terminator::CondBr { cond, then_dest, else_dest } => {
                let cond = Expr::bv_to_bool(self.translate_value(cond)?);

                let true_bb = self.bf.add_basic_block("truebb");
                self.add_stmt(true_bb, Stmt::partition_assume(cond.clone()));
                self.add_phi_assigns(true_bb, index, *then_dest)?;
                self.add_stmt(true_bb, Stmt::goto_block(self.block_map[*then_dest]));

                let false_bb = self.bf.add_basic_block("falsebb");
                self.add_stmt(false_bb, Stmt::partition_assume(Expr::not(cond)));
                self.add_phi_assigns(false_bb, index, *else_dest)?;
                self.add_stmt(false_bb, Stmt::goto_block(self.block_map[*else_dest]));

                self.add_stmt(bbb, Stmt::goto_blocks(vec![true_bb, false_bb]));
                Ok(())
            }
            ssa::Terminator::Switch { value, cases, default } => {
                let cond = self.translate_value(value)?;
                let mut default_pred = Expr::bool_const(true);
                let mut succs = Vec::with_capacity(cases.len() + 1);
                for (case, dest) in cases {
                    let case_value = self.tm.translate_constant(case)?;
                    let case_bb = self.bf.add_basic_block("casebb");
                    succs.push(case_bb);
                    self.add_stmt(
                        case_bb,
                        Stmt::partition_assume(Expr::eq(cond.clone(), case_value.clone())),
                    );
                    self.add_phi_assigns(case_bb, index, *dest)?;
                    self.add_stmt(case_bb, Stmt::goto_block(self.block_map[*dest]));
                    default_pred =
                        Expr::and(default_pred, Expr::ne(cond.clone(), case_value));
                }
                let default_bb = self.bf.add_basic_block("defaultbb");
                succs.push(default_bb);
                self.add_stmt(default_bb, Stmt::partition_assume(default_pred));
                self.add_phi_assigns(default_bb, index, *default)?;
                self.add_stmt(default_bb, Stmt::goto_block(self.block_map[*default]));

                self.add_stmt(bbb, Stmt::goto_blocks(succs));
                Ok(())
            }
            ssa::Terminator::Ret { value } => {
                if let Some(value) = value {
                    let var = self
                        .return_var
                        .clone()
                        .expect("returning a value without a return variable");
                    let e = self.translate_value(value)?;
                    let modelled =
                        self.tm.model_value(ValueKey::Return { func: self.fid }, e)?;
                    self.add_stmt(
                        bbb,
                        Stmt::assign(var, modelled.clone()).with_location(loc),
                    );
                    self.return_vals.push(modelled);
                }
                self.add_stmt(bbb, Stmt::ret());
                Ok(())
            }
            ssa::Terminator::Unreachable => {
                self.add_stmt(bbb, Stmt::assume(Expr::bool_const(false)));
                self.add_stmt(bbb, Stmt::ret());
                Ok(())
            }
        }
    }

    fn add_phi_assigns(&mut self, bbb: BlockId, pred: usize, succ: usize) -> Result<()> {
        let block = &self.func.blocks[succ];
        let mut vars = Vec::new();
        let mut values = Vec::new();
        for phi in &block.phis {
            let (value, _) = phi
                .incoming
                .iter()
                .find(|(_, p)| *p == pred)
                .ok_or_else(|| Error::fatal("phi node missing a value for its predecessor"))?;
            let var = self.phi_variable(phi)?;
            let e = self.translate_value(value)?;
            let key = ValueKey::Phi { func: self.fid, local: phi.result };
            let modelled = self.tm.model_value(key, e)?;
            vars.push(var);
            values.push(modelled.clone());
            self.phi_assigns
                .entry(phi.result)
                .or_insert_with(|| (phi.ty.clone(), Vec::new()))
                .1
                .push(modelled);
        }
        if !vars.is_empty() {
            self.add_stmt(bbb, Stmt::var_assign(vars, values));
        }
        Ok(())
    }
}

/// Handlers for the reserved-name functions.
impl FunctionTranslator<'_, '_> {
    fn dim_var(&mut self, prefix: &str, dim: &Expr, typ: Type) -> Result<Expr> {
        let index = dim
            .as_bv_const()
            .ok_or_else(|| Error::implementation_limitation("non-constant dimension argument"))?
            .as_u64();
        let dim = Dim::from_index(index)
            .ok_or_else(|| Error::implementation_limitation("unsupported dimension"))?;
        Ok(Expr::special_var_ref(typ, &format!("{prefix}{}", dim.suffix())))
    }

    fn handle_special(
        &mut self,
        bbb: BlockId,
        sf: SpecialFunction,
        ret_ty: &ssa::Type,
        loc: Option<SourceLoc>,
        args: &[Expr],
    ) -> Result<Option<Expr>> {
        use SpecialFunction::*;
        match sf {
            Noop => Ok(None),
            Assert => {
                let stmt = Stmt::assert_stmt(Expr::ne_zero(args[0].clone())).with_location(loc);
                self.add_stmt(bbb, stmt);
                Ok(None)
            }
            GlobalAssert => {
                let stmt = Stmt::global_assert(Expr::ne_zero(args[0].clone())).with_location(loc);
                self.add_stmt(bbb, stmt);
                Ok(None)
            }
            AssertFail => {
                let stmt = Stmt::assert_stmt(Expr::bool_const(false)).with_location(loc);
                self.add_stmt(bbb, stmt);
                Ok(None)
            }
            Assume => {
                self.add_stmt(bbb, Stmt::assume(Expr::ne_zero(args[0].clone())));
                Ok(None)
            }
            Requires => {
                self.bf.add_requires(Expr::ne_zero(args[0].clone()));
                Ok(None)
            }
            Ensures => {
                self.bf.add_ensures(Expr::ne_zero(args[0].clone()));
                Ok(None)
            }
            ReturnVal => {
                let var = self
                    .return_var
                    .clone()
                    .ok_or_else(|| Error::fatal("return-value query in a void function"))?;
                Ok(Some(Expr::var_ref(var)))
            }
            Old => Ok(Some(Expr::old(args[0].clone()))),
            OtherInt => Ok(Some(Expr::other_int(args[0].clone()))),
            OtherBool => Ok(Some(Expr::bool_to_bv(Expr::other_bool(Expr::bv_to_bool(
                args[0].clone(),
            ))))),
            OtherPtrBase => Ok(Some(Expr::other_ptr_base(Expr::array_id(
                args[0].clone(),
                self.tm.default_range(),
            )))),
            Implies => Ok(Some(Expr::bool_to_bv(Expr::implies(
                Expr::bv_to_bool(args[0].clone()),
                Expr::bv_to_bool(args[1].clone()),
            )))),
            Enabled => Ok(Some(Expr::bool_to_bv(Expr::special_var_ref(
                Type::Bool,
                "__enabled",
            )))),
            All => {
                let b = Expr::bv_to_bool(args[0].clone());
                Ok(Some(Expr::bool_to_bv(Expr::and(b.clone(), Expr::other_bool(b)))))
            }
            Exclusive => {
                let b = Expr::bv_to_bool(args[0].clone());
                Ok(Some(Expr::bool_to_bv(Expr::not(Expr::and(
                    b.clone(),
                    Expr::other_bool(b),
                )))))
            }
            UniformInt => Ok(Some(Expr::bool_to_bv(Expr::eq(
                args[0].clone(),
                Expr::other_int(args[0].clone()),
            )))),
            UniformBool => {
                let b = Expr::bv_to_bool(args[0].clone());
                Ok(Some(Expr::bool_to_bv(Expr::eq(b.clone(), Expr::other_bool(b)))))
            }
            DistinctInt => Ok(Some(Expr::bool_to_bv(Expr::ne(
                args[0].clone(),
                Expr::other_int(args[0].clone()),
            )))),
            DistinctBool => {
                let b = Expr::bv_to_bool(args[0].clone());
                Ok(Some(Expr::bool_to_bv(Expr::ne(b.clone(), Expr::other_bool(b)))))
            }
            ReadHasOccurred => Ok(Some(Expr::bool_to_bv(Expr::access_has_occurred(
                Expr::array_id(args[0].clone(), self.tm.default_range()),
                AccessKind::Read,
            )))),
            WriteHasOccurred => Ok(Some(Expr::bool_to_bv(Expr::access_has_occurred(
                Expr::array_id(args[0].clone(), self.tm.default_range()),
                AccessKind::Write,
            )))),
            ReadOffset => Ok(Some(self.access_offset(args, AccessKind::Read))),
            WriteOffset => Ok(Some(self.access_offset(args, AccessKind::Write))),
            PtrBase => Ok(Some(Expr::array_id(args[0].clone(), self.tm.default_range()))),
            PtrOffset => Ok(Some(Expr::array_offset(args[0].clone()))),
            NotAccessed => {
                let aid = Expr::array_id(args[0].clone(), self.tm.default_range());
                if let Some(ga) = aid.as_global_array_ref() {
                    ga.set_not_accessed();
                }
                Ok(Some(Expr::bool_to_bv(Expr::not_accessed(aid))))
            }
            GetLocalId | CudaLocalId(_) => {
                self.index_query(sf, "local_id", ret_ty, args).map(Some)
            }
            GetGroupId | CudaGroupId(_) => {
                self.index_query(sf, "group_id", ret_ty, args).map(Some)
            }
            GetLocalSize | CudaLocalSize(_) => {
                self.index_query(sf, "group_size", ret_ty, args).map(Some)
            }
            GetNumGroups | CudaNumGroups(_) => {
                self.index_query(sf, "num_groups", ret_ty, args).map(Some)
            }
            GetGlobalId => {
                let t = self.tm.translate_type(ret_ty)?;
                let group = self.dim_var("group_id", &args[0], t.clone())?;
                let size = self.dim_var("group_size", &args[0], t.clone())?;
                let local = self.dim_var("local_id", &args[0], t)?;
                Ok(Some(Expr::bv_add(Expr::bv_mul(group, size), local)))
            }
            GetGlobalSize => {
                let t = self.tm.translate_type(ret_ty)?;
                let groups = self.dim_var("num_groups", &args[0], t.clone())?;
                let size = self.dim_var("group_size", &args[0], t)?;
                Ok(Some(Expr::bv_mul(groups, size)))
            }
            WarpSize => {
                let t = self.tm.translate_type(ret_ty)?;
                Ok(Some(Expr::special_var_ref(t, "sub_group_size")))
            }
            Cos => self.simd_float_unary(bbb, ret_ty, args, Expr::fcos).map(Some),
            Exp => self.simd_float_unary(bbb, ret_ty, args, Expr::fexp).map(Some),
            Fabs => self.simd_float_unary(bbb, ret_ty, args, Expr::fabs).map(Some),
            Log => self.simd_float_unary(bbb, ret_ty, args, Expr::flog).map(Some),
            Sin => self.simd_float_unary(bbb, ret_ty, args, Expr::fsin).map(Some),
            Sqrt => self.simd_float_unary(bbb, ret_ty, args, Expr::fsqrt).map(Some),
            Pow => {
                let e = self.simd_binary(
                    bbb,
                    ret_ty,
                    ret_ty,
                    args[0].clone(),
                    args[1].clone(),
                    &mut |_, a, b| Ok(Expr::fpow(a, b)),
                )?;
                Ok(Some(e))
            }
            Fma => {
                let product = self.simd_binary(
                    bbb,
                    ret_ty,
                    ret_ty,
                    args[0].clone(),
                    args[1].clone(),
                    &mut |_, a, b| Ok(Expr::fmul(a, b)),
                )?;
                let e = self.simd_binary(
                    bbb,
                    ret_ty,
                    ret_ty,
                    product,
                    args[2].clone(),
                    &mut |_, a, b| Ok(Expr::fadd(a, b)),
                )?;
                Ok(Some(e))
            }
            AtomicOp => {
                if ret_ty.is_void() {
                    return Err(Error::implementation_limitation(
                        "atomic operation without a result",
                    ));
                }
                let ptr = args[0].clone();
                let ptr_arr = Expr::array_id(ptr.clone(), self.tm.default_range());
                let ptr_ofs = Expr::array_offset(ptr);
                let elem = self.tm.translate_type(ret_ty)?;
                if ptr_arr.typ().range() == elem {
                    if let Some(div) =
                        Expr::create_exact_bv_udiv(&ptr_ofs, u64::from(elem.width() / 8))
                    {
                        return Ok(Some(Expr::atomic(ptr_arr, div, elem)));
                    }
                }
                if ptr_arr.typ().range() == Type::Bv(8) {
                    // Byte-granularity fallback: the update is recorded at
                    // the byte offset and the result widened; the atomic's
                    // value is abstracted by the verifier anyway.
                    let byte = Expr::atomic(ptr_arr, ptr_ofs, Type::Bv(8));
                    self.add_stmt(bbb, Stmt::eval(byte.clone()).with_location(loc));
                    let widened = Expr::bv_zext(elem.width(), byte);
                    return Ok(Some(match elem {
                        Type::Float(_) => Expr::bv_to_float(widened),
                        _ => widened,
                    }));
                }
                self.demand_byte_array(&ptr_arr);
                Ok(Some(self.tm.translate_arbitrary(&elem)))
            }
            ArraySnapshot => {
                let dst = Expr::array_id(args[0].clone(), self.tm.default_range());
                let src = Expr::array_id(args[1].clone(), self.tm.default_range());
                let stmt = Stmt::eval(Expr::array_snapshot(dst, src)).with_location(loc);
                self.add_stmt(bbb, stmt);
                Ok(None)
            }
            AddNoovfl => Ok(Some(Expr::add_noovfl(args.to_vec()))),
        }
    }

    fn access_offset(&mut self, args: &[Expr], access: AccessKind) -> Expr {
        let pw = self.tm.pointer_width();
        let aid = Expr::array_id(args[0].clone(), self.tm.default_range());
        let range = aid.typ().range();
        let mut result = Expr::access_offset(aid, access, pw);
        // Offsets are tracked in elements; scale back to bytes for the
        // source-level query.
        if (range.is_bv() || range.is_float()) && range.width() > 8 {
            result = Expr::bv_mul(
                Expr::bv_const_u64(pw, u64::from(range.width() / 8)),
                result,
            );
        }
        result
    }

    fn index_query(
        &mut self,
        sf: SpecialFunction,
        prefix: &str,
        ret_ty: &ssa::Type,
        args: &[Expr],
    ) -> Result<Expr> {
        use SpecialFunction::*;
        let t = self.tm.translate_type(ret_ty)?;
        match sf {
            CudaLocalId(d) | CudaGroupId(d) | CudaLocalSize(d) | CudaNumGroups(d) => {
                Ok(Expr::special_var_ref(t, &format!("{prefix}{}", d.suffix())))
            }
            _ => self.dim_var(prefix, &args[0], t),
        }
    }

    fn simd_float_unary(
        &mut self,
        bbb: BlockId,
        ret_ty: &ssa::Type,
        args: &[Expr],
        f: fn(Expr) -> Expr,
    ) -> Result<Expr> {
        self.simd_unary(bbb, ret_ty, ret_ty, args[0].clone(), &mut |_, _, o| Ok(f(o)))
    }
}
