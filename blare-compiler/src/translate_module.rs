// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Module-level translation and the memory-model driver.
//!
//! Pointers in the input are untyped byte addresses. Translation recasts
//! every pointer as an `(arrayId, byte offset)` pair and then tries to
//! narrow each global to a typed element array so accesses become
//! indexing instead of byte splicing. Two widenings can be demanded
//! while a function body is lowered: a specific global must fall back to
//! a byte array, or (when an array id cannot be resolved to a known set)
//! every global must. Additionally a pointer-valued SSA name whose every
//! assignment points into one known global can be modelled as a bare
//! offset. All of these change the shape of already-translated code, so
//! the translator reruns until no new demand appears; the demands only
//! grow, so a fixed point exists.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::rc::Rc;

use tracing::debug;

use blare_ir::{BvConst, Expr, GlobalArray, Module as IrModule, SourceLoc, Stmt, Type};
use blare_ssa as ssa;
use blare_ssa::DataLayout;

use crate::error::{Error, Result};
use crate::lang::{AddressSpaceMap, SourceLanguage};
use crate::special_functions::{is_axiom_function, is_uninterpreted_function, SpecialFunction};
use crate::translate_function::FunctionTranslator;

/// Identifies the source of a global array across refinement iterations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum ArrayKey {
    Global(usize),
    Param { func: usize, index: usize },
    Alloca { func: usize, local: ssa::LocalId },
}

/// Identifies a pointer-valued SSA name that may be modelled as a plain
/// offset into a known global.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ValueKey {
    Param { func: usize, index: usize },
    Phi { func: usize, local: ssa::LocalId },
    Return { func: usize },
}

pub(crate) struct FnSig {
    pub name: String,
    pub ret: Option<Type>,
}

pub struct ModuleTranslator<'m> {
    pub(crate) src: &'m ssa::Module,
    pub(crate) layout: DataLayout,
    pub(crate) lang: SourceLanguage,
    pub(crate) address_spaces: AddressSpaceMap,
    entry_points: BTreeSet<String>,

    pub(crate) bm: IrModule,
    pub(crate) fn_sigs: Vec<Option<FnSig>>,
    constant_cache: HashMap<ssa::Constant, Expr>,
    value_global_map: HashMap<ArrayKey, Rc<GlobalArray>>,
    pub(crate) global_value_map: HashMap<String, ArrayKey>,
    pub(crate) call_sites: HashMap<usize, Vec<Vec<Expr>>>,

    pub(crate) need_additional_byte_array_models: bool,
    pub(crate) model_as_byte_array: HashSet<ArrayKey>,
    pub(crate) model_all_as_byte_array: bool,
    pub(crate) next_model_all_as_byte_array: bool,
    need_additional_global_offset_models: bool,
    model_ptr_as_global_offset: HashMap<ValueKey, BTreeSet<ArrayKey>>,
    next_model_ptr_as_global_offset: HashMap<ValueKey, BTreeSet<ArrayKey>>,
    ptr_may_be_null: HashSet<ValueKey>,
    next_ptr_may_be_null: HashSet<ValueKey>,
}

impl<'m> ModuleTranslator<'m> {
    pub fn new(
        src: &'m ssa::Module,
        lang: SourceLanguage,
        entry_points: BTreeSet<String>,
    ) -> Self {
        let layout = src.data_layout();
        ModuleTranslator {
            src,
            layout,
            lang,
            address_spaces: AddressSpaceMap::for_language(lang),
            entry_points,
            bm: IrModule::new(layout.pointer_width),
            fn_sigs: Vec::new(),
            constant_cache: HashMap::new(),
            value_global_map: HashMap::new(),
            global_value_map: HashMap::new(),
            call_sites: HashMap::new(),
            need_additional_byte_array_models: false,
            model_as_byte_array: HashSet::new(),
            model_all_as_byte_array: false,
            next_model_all_as_byte_array: false,
            need_additional_global_offset_models: false,
            model_ptr_as_global_offset: HashMap::new(),
            next_model_ptr_as_global_offset: HashMap::new(),
            ptr_may_be_null: HashSet::new(),
            next_ptr_may_be_null: HashSet::new(),
        }
    }

    pub fn take_module(self) -> IrModule {
        self.bm
    }

    pub(crate) fn pointer_width(&self) -> u32 {
        self.layout.pointer_width
    }

    /// The assumed range type of an array id whose array set is unknown.
    pub(crate) fn default_range(&self) -> Type {
        if self.model_all_as_byte_array { Type::Bv(8) } else { Type::Any }
    }

    pub(crate) fn is_entry_point(&self, function: &ssa::Function) -> bool {
        function.is_kernel || self.entry_points.contains(&function.name)
    }

    /// Whether the function is consumed by translation rather than
    /// translated itself.
    fn is_handled_function(&self, name: &str) -> bool {
        SpecialFunction::lookup(self.lang, name).is_some()
            || is_axiom_function(name)
            || is_uninterpreted_function(name)
            || name.starts_with("llvm.")
    }

    /// The fixed-point refinement loop.
    pub fn translate(&mut self) -> Result<()> {
        // Far more iterations than any monotone demand sequence can use;
        // running out means the refinement is not converging.
        let max_iterations = self.src.globals.len() + self.src.functions.len() + 10;
        for iteration in 0..=max_iterations {
            debug!(
                iteration,
                byte_arrays = self.model_as_byte_array.len(),
                offset_models = self.model_ptr_as_global_offset.len(),
                all_byte = self.model_all_as_byte_array,
                "translation pass"
            );
            self.need_additional_byte_array_models = false;
            self.need_additional_global_offset_models = false;
            self.bm = IrModule::new(self.pointer_width());
            self.fn_sigs.clear();
            self.constant_cache.clear();
            self.value_global_map.clear();
            self.global_value_map.clear();
            self.call_sites.clear();

            for (fid, function) in self.src.functions.iter().enumerate() {
                if self.is_handled_function(&function.name) {
                    self.fn_sigs.push(None);
                    continue;
                }
                let ret = if function.ret.is_void() {
                    None
                } else {
                    Some(self.modelled_type(ValueKey::Return { func: fid }, &function.ret)?)
                };
                self.fn_sigs.push(Some(FnSig { name: function.name.clone(), ret }));
            }

            for (fid, function) in self.src.functions.iter().enumerate() {
                if is_axiom_function(&function.name) {
                    self.translate_axiom_function(fid)?;
                } else if !self.is_handled_function(&function.name) {
                    let entry = self.is_entry_point(function);
                    let bf = FunctionTranslator::new(self, fid, entry)?.translate()?;
                    self.bm.add_function(bf);
                }
            }

            // A case split appeared: see whether any call-site parameter
            // always refers to the same global across every caller, in
            // which case modelling the parameter as an offset may avoid
            // the split.
            if !self.model_all_as_byte_array && self.next_model_all_as_byte_array {
                let call_sites = std::mem::take(&mut self.call_sites);
                let mut funcs: Vec<_> = call_sites.into_iter().collect();
                funcs.sort_by_key(|(fid, _)| *fid);
                for (fid, sites) in funcs {
                    let params = self.src.functions[fid].params.clone();
                    for (index, param) in params.iter().enumerate() {
                        let column: Vec<Expr> =
                            sites.iter().map(|args| args[index].clone()).collect();
                        self.compute_value_model(
                            ValueKey::Param { func: fid, index },
                            None,
                            &column,
                            &param.ty,
                        );
                    }
                }
            }

            if self.need_additional_global_offset_models {
                // New offset models may make a previously observed case
                // split unnecessary; only fall back to modelling
                // everything as bytes once no new models appear.
                self.model_all_as_byte_array = false;
                self.next_model_all_as_byte_array = false;
            } else {
                self.model_all_as_byte_array = self.next_model_all_as_byte_array;
            }
            self.model_ptr_as_global_offset = self.next_model_ptr_as_global_offset.clone();
            self.ptr_may_be_null = self.next_ptr_may_be_null.clone();

            if !self.need_additional_byte_array_models
                && !self.need_additional_global_offset_models
            {
                return Ok(());
            }
        }
        Err(Error::fatal("translation did not converge"))
    }

    fn translate_axiom_function(&mut self, fid: usize) -> Result<()> {
        let function = &self.src.functions[fid];
        let ret = self.translate_type(&function.ret)?;
        let bf = FunctionTranslator::new_axiom(self, fid, ret)?.translate()?;
        if bf.blocks().len() != 1 {
            return Err(Error::fatal(format!(
                "axiom function '{}' must have a single basic block",
                function.display_name()
            )));
        }
        let stmts = bf.blocks()[0].stmts();
        let value = stmts
            .iter()
            .rev()
            .find_map(|s| match s.body() {
                blare_ir::StmtBody::VarAssign { vars, values }
                    if Rc::ptr_eq(&vars[0], &bf.returns()[0]) =>
                {
                    Some(values[0].clone())
                }
                _ => None,
            })
            .ok_or_else(|| {
                Error::fatal(format!(
                    "axiom function '{}' does not return a value",
                    function.display_name()
                ))
            })?;
        self.bm.add_axiom(Expr::ne_zero(value));
        Ok(())
    }
}

/// Types.
impl ModuleTranslator<'_> {
    pub(crate) fn translate_type(&self, t: &ssa::Type) -> Result<Type> {
        match t {
            ssa::Type::Int { width } => Ok(Type::Bv(*width)),
            ssa::Type::Float { width } => Ok(Type::Float(*width)),
            ssa::Type::Pointer { pointee, .. } => {
                if pointee.is_function() {
                    Ok(Type::FunctionPointer(self.pointer_width()))
                } else {
                    Ok(Type::Pointer(self.pointer_width()))
                }
            }
            ssa::Type::Vector { .. } | ssa::Type::Array { .. } | ssa::Type::Struct { .. } => {
                Ok(Type::Bv(self.layout.size_bits(t) as u32))
            }
            ssa::Type::Void | ssa::Type::Function { .. } => Err(
                Error::implementation_limitation(format!("cannot translate unsized type {t}")),
            ),
        }
    }

    fn handle_padding(&self, el_ty: Type, t: &ssa::Type) -> Type {
        let padding = (self.layout.alloc_size_bits(t) - self.layout.size_bits(t)) as u32;
        if padding % el_ty.width() == 0 {
            el_ty
        } else {
            Type::Bv(gcd(padding, el_ty.width()))
        }
    }

    /// The most specific uniform element type of an aggregate, or
    /// `BV(8)` when its members cannot be reconciled.
    pub(crate) fn translate_array_range_type(&self, t: &ssa::Type) -> Result<Type> {
        match t {
            ssa::Type::Array { elem, .. } | ssa::Type::Vector { elem, .. } => {
                let el = self.translate_array_range_type(elem)?;
                Ok(self.handle_padding(el, t))
            }
            ssa::Type::Struct { fields, .. } => {
                let mut it = fields.iter();
                let Some(first) = it.next() else {
                    return Ok(Type::Bv(8));
                };
                let mut el = self.translate_array_range_type(first)?;
                for field in it {
                    let fty = self.translate_array_range_type(field)?;
                    el = Type::meet(&el, &fty);
                }
                if el.is_unknown() {
                    el = Type::Bv(8);
                }
                Ok(self.handle_padding(el, t))
            }
            _ => self.translate_type(t),
        }
    }

    fn source_array_range(t: &ssa::Type) -> &ssa::Type {
        match t {
            ssa::Type::Array { elem, .. } => Self::source_array_range(elem),
            _ => t,
        }
    }

    fn source_array_dimensions(t: &ssa::Type, dims: &mut Vec<u64>) {
        if let ssa::Type::Array { elem, len } = t {
            dims.push(*len);
            Self::source_array_dimensions(elem, dims);
        }
    }
}

/// Global arrays.
impl ModuleTranslator<'_> {
    fn array_source_info(&self, key: ArrayKey) -> Result<(String, String, ssa::Type, u32)> {
        match key {
            ArrayKey::Global(id) => {
                let g = &self.src.globals[id];
                Ok((
                    g.name.clone(),
                    g.display_name().to_string(),
                    g.value_type.clone(),
                    g.address_space,
                ))
            }
            ArrayKey::Param { func, index } => {
                let p = &self.src.functions[func].params[index];
                let source = p.source_name.clone().unwrap_or_else(|| p.name.clone());
                Ok((
                    p.name.clone(),
                    source,
                    p.ty.pointee().clone(),
                    p.ty.address_space(),
                ))
            }
            ArrayKey::Alloca { func, local } => {
                let function = &self.src.functions[func];
                for block in &function.blocks {
                    for inst in &block.insts {
                        if inst.result == Some(local) {
                            if let ssa::Op::Alloca { allocated } = &inst.op {
                                let name = format!("{}.stack{local}", function.name);
                                return Ok((
                                    name.clone(),
                                    name,
                                    allocated.clone(),
                                    self.address_spaces.generic,
                                ));
                            }
                        }
                    }
                }
                Err(Error::fatal("stale alloca in memory model"))
            }
        }
    }

    fn add_global_array_attribs(&self, ga: &GlobalArray, pointee: &ssa::Type, aspace: u32) {
        // A pointer in the CUDA constant space is itself constant, but
        // the memory it addresses lives in device memory.
        if self.lang == SourceLanguage::Cuda
            && pointee.is_pointer()
            && aspace == self.address_spaces.constant
        {
            ga.add_attribute("global");
        } else if matches!(self.lang, SourceLanguage::OpenCl | SourceLanguage::Cuda) {
            if aspace == self.address_spaces.global {
                ga.add_attribute("global");
            } else if aspace == self.address_spaces.group_shared {
                ga.add_attribute("group_shared");
            } else if aspace == self.address_spaces.constant {
                ga.add_attribute("constant");
            }
        }
    }

    pub(crate) fn get_global_array(
        &mut self,
        key: ArrayKey,
        is_parameter: bool,
    ) -> Result<Rc<GlobalArray>> {
        if let Some(ga) = self.value_global_map.get(&key) {
            return Ok(ga.clone());
        }
        let (name, source_name, pointee, aspace) = self.array_source_info(key)?;
        let range = if self.model_all_as_byte_array || self.model_as_byte_array.contains(&key) {
            Type::Bv(8)
        } else {
            self.translate_array_range_type(&pointee)?
        };
        let source_type = Self::source_array_range(&pointee).to_string();
        let mut dims = Vec::new();
        if is_parameter {
            dims.push(0);
        }
        Self::source_array_dimensions(&pointee, &mut dims);
        if dims.is_empty() {
            dims.push(1);
        }
        let ga = self.bm.add_global(&name, range, &source_name, &source_type, dims);
        self.add_global_array_attribs(&ga, &pointee, aspace);
        self.value_global_map.insert(key, ga.clone());
        self.global_value_map.insert(ga.name().to_string(), key);
        Ok(ga)
    }

    fn has_initializer(&self, g: &ssa::Global) -> bool {
        if g.init.is_none() {
            return false;
        }
        let gpu = matches!(self.lang, SourceLanguage::OpenCl | SourceLanguage::Cuda);
        // OpenCL __local and CUDA __shared__ initialisers are bogus, and
        // CUDA __constant__/__device__ contents may have been replaced
        // by the host program.
        if gpu && g.address_space == self.address_spaces.group_shared {
            return false;
        }
        if self.lang == SourceLanguage::Cuda
            && (g.address_space == self.address_spaces.constant
                || g.address_space == self.address_spaces.global)
        {
            return false;
        }
        true
    }

    fn translate_global_variable(&mut self, id: usize) -> Result<Expr> {
        let ga = self.get_global_array(ArrayKey::Global(id), false)?;
        if self.has_initializer(&self.src.globals[id]) {
            let init = self.src.globals[id].init.clone().unwrap();
            self.translate_global_init(&ga, 0, &init)?;
        }
        Ok(Expr::global_array_ref(ga))
    }

    fn translate_global_init(
        &mut self,
        ga: &Rc<GlobalArray>,
        byte_offset: u64,
        init: &ssa::Constant,
    ) -> Result<()> {
        match init {
            ssa::Constant::Struct { ty: ssa::Type::Struct { fields, packed }, fields: values } => {
                let (offsets, _) = self.layout.struct_layout(fields, *packed);
                for (value, offset) in values.iter().zip(offsets) {
                    self.translate_global_init(ga, byte_offset + offset, value)?;
                }
                Ok(())
            }
            ssa::Constant::Array { elem, elems } => {
                let elem_size = self.layout.alloc_size_bytes(elem);
                for (i, value) in elems.iter().enumerate() {
                    self.translate_global_init(ga, byte_offset + i as u64 * elem_size, value)?;
                }
                Ok(())
            }
            _ => {
                let mut value = self.translate_constant(init)?;
                if value.typ().width() % 8 != 0 {
                    return Err(Error::implementation_limitation(
                        "global initialiser with sub-byte width",
                    ));
                }
                if ga.range_type().width() % 8 != 0 {
                    // The byte-array model can absorb the misfit.
                    self.need_additional_byte_array_models = true;
                    let key = self.global_value_map[ga.name()];
                    self.model_as_byte_array.insert(key);
                    return Ok(());
                }
                let init_byte_width = u64::from(value.typ().width() / 8);
                let ga_ty = ga.range_type().clone();
                if ga_ty == *value.typ() && byte_offset % init_byte_width == 0 {
                    self.bm.add_global_init(ga.clone(), byte_offset / init_byte_width, value);
                    return Ok(());
                }
                let ga_byte_width = u64::from(ga_ty.width() / 8);
                if ga_ty.is_bv()
                    && byte_offset % ga_byte_width == 0
                    && init_byte_width % ga_byte_width == 0
                {
                    if value.typ().is_function_pointer() {
                        value = Expr::func_ptr_to_bv((init_byte_width * 8) as u32, value);
                    } else if value.typ().is_pointer() {
                        value = Expr::ptr_to_bv(value);
                    } else if value.typ().is_float() {
                        value = Expr::float_to_bv(value);
                    }
                    let ga_width = ga_ty.width();
                    for i in 0..init_byte_width / ga_byte_width {
                        self.bm.add_global_init(
                            ga.clone(),
                            byte_offset / ga_byte_width + i,
                            Expr::bv_extract(value.clone(), i as u32 * ga_width, ga_width),
                        );
                    }
                    return Ok(());
                }
                self.need_additional_byte_array_models = true;
                let key = self.global_value_map[ga.name()];
                self.model_as_byte_array.insert(key);
                Ok(())
            }
        }
    }
}

/// Constants.
impl ModuleTranslator<'_> {
    pub(crate) fn translate_constant(&mut self, c: &ssa::Constant) -> Result<Expr> {
        if let Some(e) = self.constant_cache.get(c) {
            return Ok(e.clone());
        }
        let e = self.do_translate_constant(c)?;
        self.constant_cache.insert(c.clone(), e.clone());
        Ok(e)
    }

    pub(crate) fn translate_arbitrary(&self, t: &Type) -> Expr {
        match t {
            Type::Pointer(w) => Expr::bv_to_ptr(Expr::bv_zero(*w)),
            Type::FunctionPointer(w) => Expr::bv_to_func_ptr(*w, Expr::bv_zero(*w)),
            Type::Float(w) => Expr::bv_to_float(Expr::bv_zero(*w)),
            Type::Bool => Expr::bool_const(false),
            _ => Expr::bv_zero(t.width()),
        }
    }

    fn do_translate_constant(&mut self, c: &ssa::Constant) -> Result<Expr> {
        match c {
            ssa::Constant::Int { width, value } => {
                Ok(Expr::bv_const(BvConst::new(*width, value.clone())))
            }
            ssa::Constant::Float { width, bits } => {
                Ok(Expr::bv_to_float(Expr::bv_const(BvConst::from_u64(*width, *bits))))
            }
            ssa::Constant::Null(t) => {
                if t.pointee().is_function() {
                    Ok(Expr::null_function_pointer(self.pointer_width()))
                } else {
                    Ok(Expr::pointer(
                        Expr::null_array_ref(),
                        Expr::bv_zero(self.pointer_width()),
                    ))
                }
            }
            ssa::Constant::Undef(t) => {
                let ty = self.translate_type(t)?;
                Ok(self.translate_arbitrary(&ty))
            }
            ssa::Constant::Global(id) => {
                let array = self.translate_global_variable(*id)?;
                Ok(Expr::pointer(array, Expr::bv_zero(self.pointer_width())))
            }
            ssa::Constant::Function(id) => {
                let function = &self.src.functions[*id];
                if self.fn_sigs[*id].is_none() {
                    return Err(Error::implementation_limitation(format!(
                        "unsupported function pointer '{}'",
                        function.display_name()
                    )));
                }
                Ok(Expr::function_pointer_ref(&function.name, self.pointer_width()))
            }
            ssa::Constant::Vector { elem, elems } => {
                let mut parts = Vec::with_capacity(elems.len());
                for value in elems {
                    parts.push(self.constant_as_bits(value)?);
                }
                Ok(Expr::bv_concat_n(parts))
            }
            ssa::Constant::Array { elem, elems } => {
                let alloc_bits = self.layout.alloc_size_bits(elem) as u32;
                let mut parts = Vec::with_capacity(elems.len());
                for value in elems {
                    let mut bits = self.constant_as_bits(value)?;
                    let width = bits.typ().width();
                    if width < alloc_bits {
                        bits = Expr::bv_concat(Expr::bv_zero(alloc_bits - width), bits);
                    }
                    parts.push(bits);
                }
                Ok(Expr::bv_concat_n(parts))
            }
            ssa::Constant::Struct { ty: ssa::Type::Struct { fields, packed }, fields: values } => {
                let (offsets, size) = self.layout.struct_layout(fields, *packed);
                let mut parts = Vec::new();
                let mut cursor_bits = 0u64;
                for (value, offset) in values.iter().zip(offsets) {
                    let offset_bits = offset * 8;
                    if offset_bits > cursor_bits {
                        parts.push(Expr::bv_zero((offset_bits - cursor_bits) as u32));
                    }
                    let bits = self.constant_as_bits(value)?;
                    cursor_bits = offset_bits + u64::from(bits.typ().width());
                    parts.push(bits);
                }
                if size * 8 > cursor_bits {
                    parts.push(Expr::bv_zero((size * 8 - cursor_bits) as u32));
                }
                Ok(Expr::bv_concat_n(parts))
            }
            ssa::Constant::Struct { .. } => {
                Err(Error::implementation_limitation("malformed struct constant"))
            }
            ssa::Constant::Expr(e) => self.translate_constant_expr(e),
        }
    }

    /// A constant flattened to its in-memory bit pattern.
    fn constant_as_bits(&mut self, c: &ssa::Constant) -> Result<Expr> {
        let e = self.translate_constant(c)?;
        Ok(match e.typ() {
            Type::Float(_) => Expr::float_to_bv(e),
            Type::FunctionPointer(w) => {
                let w = *w;
                Expr::func_ptr_to_bv(w, e)
            }
            Type::Pointer(_) => Expr::ptr_to_bv(e),
            _ => e,
        })
    }

    fn translate_constant_expr(&mut self, e: &ssa::ConstExpr) -> Result<Expr> {
        match e {
            ssa::ConstExpr::Gep { base, source_elem, indices, .. } => {
                let ptr = self.translate_constant(base)?;
                let mut index_exprs = Vec::with_capacity(indices.len());
                for i in indices {
                    index_exprs.push(self.translate_constant(i)?);
                }
                self.translate_gep(ptr, source_elem, &index_exprs)
            }
            ssa::ConstExpr::BitCast { value, from, to } => {
                let op = self.translate_constant(value)?;
                self.translate_bitcast(from, to, op)
            }
            ssa::ConstExpr::AddrSpaceCast { value, .. } => self.translate_constant(value),
            ssa::ConstExpr::Mul { lhs, rhs, ty } => {
                let l = self.translate_constant(lhs)?;
                let r = self.translate_constant(rhs)?;
                self.simd_const_binary(ty, l, r, Expr::bv_mul)
            }
            ssa::ConstExpr::SDiv { lhs, rhs, ty } => {
                let l = self.translate_constant(lhs)?;
                let r = self.translate_constant(rhs)?;
                self.simd_const_binary(ty, l, r, Expr::bv_sdiv)
            }
            ssa::ConstExpr::PtrToInt { value, to } => {
                let op = self.translate_constant(value)?;
                let width = self.layout.size_bits(to) as u32;
                if op.typ().is_function_pointer() {
                    Ok(Expr::func_ptr_to_bv(width, op))
                } else {
                    Ok(Expr::bv_zext(width, Expr::ptr_to_bv(op)))
                }
            }
            ssa::ConstExpr::IntToPtr { value, to } => {
                let op = self.translate_constant(value)?;
                let op = Expr::bv_zext(self.pointer_width(), op);
                if to.pointee().is_function() {
                    Ok(Expr::bv_to_func_ptr(self.pointer_width(), op))
                } else {
                    Ok(Expr::bv_to_ptr(op))
                }
            }
            ssa::ConstExpr::ICmp { pred, lhs, rhs, op_ty: _, ty } => {
                let l = self.translate_constant(lhs)?;
                let r = self.translate_constant(rhs)?;
                if ty.is_vector() {
                    let (_, n) = ty.vector_parts().unwrap();
                    let elem_width = l.typ().width() / n;
                    let mut elems = Vec::with_capacity(n as usize);
                    for i in 0..n {
                        let li = Expr::bv_extract(l.clone(), i * elem_width, elem_width);
                        let ri = Expr::bv_extract(r.clone(), i * elem_width, elem_width);
                        elems.push(Expr::bool_to_bv(self.translate_icmp(*pred, li, ri)?));
                    }
                    Ok(Expr::bv_concat_n(elems))
                } else {
                    Ok(Expr::bool_to_bv(self.translate_icmp(*pred, l, r)?))
                }
            }
            ssa::ConstExpr::ZExt { value, to } => {
                let op = self.translate_constant(value)?;
                let width = self.layout.size_bits(to) as u32;
                Ok(Expr::bv_zext(width, op))
            }
        }
    }

    fn simd_const_binary(
        &self,
        ty: &ssa::Type,
        lhs: Expr,
        rhs: Expr,
        f: fn(Expr, Expr) -> Expr,
    ) -> Result<Expr> {
        if let Some((_, n)) = ty.vector_parts() {
            let elem_width = lhs.typ().width() / n;
            let mut elems = Vec::with_capacity(n as usize);
            for i in 0..n {
                let li = Expr::bv_extract(lhs.clone(), i * elem_width, elem_width);
                let ri = Expr::bv_extract(rhs.clone(), i * elem_width, elem_width);
                elems.push(f(li, ri));
            }
            Ok(Expr::bv_concat_n(elems))
        } else {
            Ok(f(lhs, rhs))
        }
    }
}

/// Pointer arithmetic and comparisons.
impl ModuleTranslator<'_> {
    pub(crate) fn translate_gep(
        &mut self,
        ptr: Expr,
        source_elem: &ssa::Type,
        indices: &[Expr],
    ) -> Result<Expr> {
        let ptr_arr = Expr::array_id(ptr.clone(), self.default_range());
        let mut ofs = Expr::array_offset(ptr);
        let pw = self.pointer_width();
        let mut current = source_elem.clone();
        for (level, index) in indices.iter().enumerate() {
            if level == 0 {
                let elem_size = self.layout.alloc_size_bytes(source_elem);
                let index = Expr::bv_zext(pw, index.clone());
                let addend = Expr::bv_mul(index, Expr::bv_const_u64(pw, elem_size));
                ofs = Expr::bv_add(ofs, addend);
                continue;
            }
            match current.clone() {
                ssa::Type::Struct { fields, packed } => {
                    let field = index
                        .as_bv_const()
                        .ok_or_else(|| {
                            Error::implementation_limitation(
                                "struct offset with non-constant index",
                            )
                        })?
                        .as_u64() as usize;
                    let offset = self.layout.field_offset_bytes(&fields, packed, field);
                    ofs = Expr::bv_add(ofs, Expr::bv_const_u64(pw, offset));
                    current = fields[field].clone();
                }
                ssa::Type::Array { elem, .. } | ssa::Type::Vector { elem, .. } => {
                    let elem_size = self.layout.alloc_size_bytes(&elem);
                    let index = Expr::bv_zext(pw, index.clone());
                    let addend = Expr::bv_mul(index, Expr::bv_const_u64(pw, elem_size));
                    ofs = Expr::bv_add(ofs, addend);
                    current = *elem;
                }
                other => {
                    return Err(Error::implementation_limitation(format!(
                        "unhandled type {other} in address computation"
                    )));
                }
            }
        }
        Ok(Expr::pointer(ptr_arr, ofs))
    }

    pub(crate) fn translate_bitcast(
        &self,
        from: &ssa::Type,
        to: &ssa::Type,
        op: Expr,
    ) -> Result<Expr> {
        if from.is_pointer() && to.is_pointer() {
            return Ok(match (from.pointee().is_function(), to.pointee().is_function()) {
                (true, false) => Expr::func_ptr_to_ptr(op),
                (false, true) => Expr::ptr_to_func_ptr(op),
                _ => op,
            });
        }
        // Same-representation casts are free; a float reinterpretation
        // crosses the bit-pattern boundary.
        Ok(match (op.typ().is_float(), to.is_float() && !to.is_vector()) {
            (true, false) => Expr::float_to_bv(op),
            (false, true) => Expr::bv_to_float(op),
            _ => op,
        })
    }

    pub(crate) fn translate_icmp(
        &self,
        pred: ssa::IntPredicate,
        lhs: Expr,
        rhs: Expr,
    ) -> Result<Expr> {
        use ssa::IntPredicate::*;
        if pred == Eq {
            return Ok(Expr::eq(lhs, rhs));
        }
        if pred == Ne {
            return Ok(Expr::ne(lhs, rhs));
        }
        if lhs.typ().is_pointer() {
            assert!(rhs.typ().is_pointer());
            // Signed and unsigned orderings coincide on pointers here;
            // both desugar through the same array-aware comparison.
            return Ok(match pred {
                Ult | Slt => Expr::ptr_lt(lhs, rhs),
                Ule | Sle => Expr::ptr_le(lhs, rhs),
                Ugt | Sgt => Expr::ptr_lt(rhs, lhs),
                Uge | Sge => Expr::ptr_le(rhs, lhs),
                _ => unreachable!(),
            });
        }
        if lhs.typ().is_function_pointer() {
            assert!(rhs.typ().is_function_pointer());
            return Ok(match pred {
                Ult | Slt => Expr::func_ptr_lt(lhs, rhs),
                Ule | Sle => Expr::func_ptr_le(lhs, rhs),
                Ugt | Sgt => Expr::func_ptr_lt(rhs, lhs),
                Uge | Sge => Expr::func_ptr_le(rhs, lhs),
                _ => unreachable!(),
            });
        }
        Ok(match pred {
            Ugt => Expr::bv_ugt(lhs, rhs),
            Uge => Expr::bv_uge(lhs, rhs),
            Ult => Expr::bv_ult(lhs, rhs),
            Ule => Expr::bv_ule(lhs, rhs),
            Sgt => Expr::bv_sgt(lhs, rhs),
            Sge => Expr::bv_sge(lhs, rhs),
            Slt => Expr::bv_slt(lhs, rhs),
            Sle => Expr::bv_sle(lhs, rhs),
            Eq | Ne => unreachable!(),
        })
    }
}

/// Value models: rewriting pointer-valued SSA names into bare offsets
/// into a statically known global.
impl ModuleTranslator<'_> {
    /// Converts an unmodelled expression to modelled form.
    pub(crate) fn model_value(&mut self, key: ValueKey, e: Expr) -> Result<Expr> {
        if !e.typ().is_pointer() {
            return Ok(e);
        }
        let Some(globals) = self.model_ptr_as_global_offset.get(&key).cloned() else {
            return Ok(e);
        };
        let first = *globals.iter().next().unwrap();
        let ga = self.get_global_array(first, false)?;
        let elem_bytes = u64::from(ga.range_type().width() / 8);
        let ofs = Expr::array_offset(e.clone());
        let ofs = Expr::create_exact_bv_sdiv(&ofs, elem_bytes, None)
            .expect("modelled offset no longer divides the element width");
        if globals.len() == 1 && !self.ptr_may_be_null.contains(&key) {
            Ok(ofs)
        } else {
            Ok(Expr::pointer(Expr::array_id(e, self.default_range()), ofs))
        }
    }

    /// The surface type of a value under its current model.
    pub(crate) fn modelled_type(&mut self, key: ValueKey, ssa_ty: &ssa::Type) -> Result<Type> {
        if let Some(set) = self.model_ptr_as_global_offset.get(&key) {
            if set.len() == 1 && !self.ptr_may_be_null.contains(&key) {
                return Ok(Type::Bv(self.pointer_width()));
            }
        }
        self.translate_type(ssa_ty)
    }

    /// Converts a modelled expression back to a pointer for its uses.
    pub(crate) fn unmodel_value(&mut self, key: ValueKey, e: Expr) -> Result<Expr> {
        let Some(globals) = self.model_ptr_as_global_offset.get(&key).cloned() else {
            return Ok(e);
        };
        let first = *globals.iter().next().unwrap();
        let ga = self.get_global_array(first, false)?;
        let pw = self.pointer_width();
        let width_cst = Expr::bv_const_u64(pw, u64::from(ga.range_type().width() / 8));
        if globals.len() == 1 && !self.ptr_may_be_null.contains(&key) {
            Ok(Expr::pointer(Expr::global_array_ref(ga), Expr::bv_mul(e, width_cst)))
        } else {
            let mut candidates: Vec<Option<Rc<GlobalArray>>> = Vec::new();
            for key in globals {
                candidates.push(Some(self.get_global_array(key, false)?));
            }
            if self.ptr_may_be_null.contains(&key) {
                candidates.push(None);
            }
            let aid = Expr::array_id(e.clone(), self.default_range());
            let member = Expr::array_member_of(aid, candidates);
            let ofs = Expr::bv_mul(Expr::array_offset(e), width_cst);
            Ok(Expr::pointer(member, ofs))
        }
    }

    /// Given a value and every expression assigned to it, decide whether
    /// future iterations can model it as a plain offset.
    pub(crate) fn compute_value_model(
        &mut self,
        key: ValueKey,
        var: Option<&Rc<blare_ir::Var>>,
        assigns: &[Expr],
        ssa_ty: &ssa::Type,
    ) {
        if !ssa_ty.is_pointer() || ssa_ty.is_function_pointer() {
            return;
        }
        if assigns.is_empty() || self.model_ptr_as_global_offset.contains_key(&key) {
            return;
        }

        let mut candidates = BTreeSet::new();
        for assign in assigns {
            if !assign.compute_array_candidates(&mut candidates) {
                return;
            }
        }

        let globals_type = Expr::array_candidate_type(&candidates);
        let mut model_globals_as_byte_array =
            globals_type.is_any() || globals_type.is_unknown() || globals_type.width() % 8 != 0;
        if !model_globals_as_byte_array {
            let elem_bytes = u64::from(globals_type.width() / 8);
            for assign in assigns {
                let ofs = Expr::array_offset(assign.clone());
                if Expr::create_exact_bv_sdiv(&ofs, elem_bytes, var).is_none() {
                    model_globals_as_byte_array = true;
                    break;
                }
            }
        }

        if candidates.remove(&None) {
            self.next_ptr_may_be_null.insert(key);
        }
        if candidates.is_empty() {
            // Only the null pointer flowed in; nothing to model.
            return;
        }

        let keys: BTreeSet<ArrayKey> = candidates
            .iter()
            .flatten()
            .map(|ga| self.global_value_map[ga.name()])
            .collect();
        debug!(?key, ?keys, byte = model_globals_as_byte_array, "offset model candidate");
        self.next_model_ptr_as_global_offset.insert(key, keys.clone());
        self.need_additional_global_offset_models = true;

        if model_globals_as_byte_array {
            self.model_as_byte_array.extend(keys);
            self.need_additional_byte_array_models = true;
        }
    }
}

/// Direct and indirect call modelling. Both the statement-style and the
/// expression-style paths share `call_targets` so the candidate policy
/// cannot drift between them.
impl ModuleTranslator<'_> {
    fn call_targets(&self, fn_ty: &ssa::Type, target: Option<usize>) -> Result<Vec<usize>> {
        if let Some(fid) = target {
            return Ok(vec![fid]);
        }
        let targets: Vec<usize> = self
            .src
            .functions
            .iter()
            .enumerate()
            .filter(|(fid, f)| {
                self.fn_sigs[*fid].is_some()
                    && !self.is_entry_point(f)
                    && f.name != "main"
                    && f.ty() == *fn_ty
            })
            .map(|(fid, _)| fid)
            .collect();
        if targets.is_empty() {
            return Err(Error::fatal("no functions for function pointer found"));
        }
        Ok(targets)
    }

    fn modelled_call_args(&mut self, fid: usize, args: &[Expr]) -> Result<Vec<Expr>> {
        let mut out = Vec::with_capacity(args.len());
        for (index, arg) in args.iter().enumerate() {
            out.push(self.model_value(ValueKey::Param { func: fid, index }, arg.clone())?);
        }
        self.call_sites.entry(fid).or_default().push(out.clone());
        Ok(out)
    }

    pub(crate) fn model_call_stmt(
        &mut self,
        fn_ty: &ssa::Type,
        target: Option<usize>,
        pointer: Option<Expr>,
        args: &[Expr],
        loc: Option<SourceLoc>,
    ) -> Result<Stmt> {
        let targets = self.call_targets(fn_ty, target)?;
        let mut calls = Vec::with_capacity(targets.len());
        for fid in targets {
            let fargs = self.modelled_call_args(fid, args)?;
            let name = self.fn_sigs[fid].as_ref().unwrap().name.clone();
            calls.push(Stmt::call(&name, fargs));
        }
        if let Some(pointer) = pointer {
            Ok(Stmt::call_member_of(pointer, calls).with_location(loc))
        } else {
            Ok(calls.pop().unwrap().with_location(loc))
        }
    }

    pub(crate) fn model_call_expr(
        &mut self,
        fn_ty: &ssa::Type,
        target: Option<usize>,
        pointer: Option<Expr>,
        args: &[Expr],
    ) -> Result<Expr> {
        let targets = self.call_targets(fn_ty, target)?;
        let mut calls = Vec::with_capacity(targets.len());
        for fid in targets {
            let fargs = self.modelled_call_args(fid, args)?;
            let sig = self.fn_sigs[fid].as_ref().unwrap();
            let name = sig.name.clone();
            let ret = sig.ret.clone().ok_or_else(|| {
                Error::fatal(format!("function pointer target '{name}' returns no value"))
            })?;
            calls.push(Expr::call(&name, ret, fargs));
        }
        if let Some(pointer) = pointer {
            Ok(Expr::call_member_of(pointer, calls))
        } else {
            Ok(calls.pop().unwrap())
        }
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}
