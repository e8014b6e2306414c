// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Module-level layout of the emitted Boogie text.
//!
//! Function bodies and axioms are serialised first into a side buffer so
//! that the set of required intrinsic declarations, and the
//! pointer/function-pointer usage flags that decide the header, are
//! complete before the module top is written.

use std::collections::BTreeSet;
use std::fmt::{self, Write};
use std::io;

use crate::module::Module;
use crate::stmt::SourceLoc;
use crate::typ::Type;

use super::expr_writer::{BplExprWriter, EmitCtx, ExprWriter};
use super::function_writer::FunctionWriter;
use super::int_rep::IntegerRepresentation;
use super::{PointerRepresentation, RaceInstrumenter};

pub struct ModuleWriter<'m> {
    module: &'m Module,
    int_rep: &'m dyn IntegerRepresentation,
    race_inst: RaceInstrumenter,
    pointer_rep: PointerRepresentation,
}

// An array base value is reserved for "null" and one for "undefined".
const SPECIAL_ARRAY_BASE_VALUES: usize = 2;

fn bits_required(count: usize) -> u32 {
    ((count + SPECIAL_ARRAY_BASE_VALUES) as f64).log2().ceil() as u32
}

impl<'m> ModuleWriter<'m> {
    pub fn new(
        module: &'m Module,
        int_rep: &'m dyn IntegerRepresentation,
        race_inst: RaceInstrumenter,
        pointer_rep: PointerRepresentation,
    ) -> Self {
        ModuleWriter { module, int_rep, race_inst, pointer_rep }
    }

    pub fn write<W: io::Write>(&self, out: &mut W) -> io::Result<Vec<SourceLoc>> {
        let (text, locs) = self.write_to_string().map_err(|_| {
            io::Error::new(io::ErrorKind::Other, "formatting the module failed")
        })?;
        out.write_all(text.as_bytes())?;
        Ok(locs)
    }

    pub fn write_to_string(&self) -> Result<(String, Vec<SourceLoc>), fmt::Error> {
        let mut ctx = EmitCtx::new(self.module, self.int_rep, self.race_inst);
        let ptr_width = self.module.pointer_width();

        // Pass 1: bodies and axioms, populating the intrinsic set and the
        // usage flags.
        let mut bodies = String::new();
        for function in self.module.functions() {
            FunctionWriter::new(&mut ctx, function).write(&mut bodies)?;
        }
        for axiom in self.module.axioms() {
            let mut text = String::new();
            BplExprWriter { ctx: &mut ctx }.write_expr(&mut text, axiom, 0)?;
            writeln!(bodies, "axiom {text};")?;
        }

        // Globals of pointer range also force the pointer machinery,
        // even if no printed term touched it.
        for global in self.module.globals() {
            ctx.type_name(global.range_type());
        }

        let mut out = String::new();
        writeln!(out, "type _SIZE_T_TYPE = bv{ptr_width};")?;
        writeln!(out)?;

        if ctx.uses_pointers {
            match self.pointer_rep {
                PointerRepresentation::Datatype => {
                    writeln!(out, "type {{:datatype}} ptr;")?;
                    writeln!(out, "type arrayId;")?;
                    writeln!(
                        out,
                        "function {{:constructor}} MKPTR(base: arrayId, offset: {}) : ptr;",
                        self.int_rep.type_name(ptr_width)
                    )?;
                    writeln!(out)?;
                }
                PointerRepresentation::Flat => {
                    let base_bits = bits_required(self.module.globals().len());
                    writeln!(out, "type ptr = bv{};", ptr_width + base_bits)?;
                    writeln!(out, "type arrayId = bv{base_bits};")?;
                    writeln!(
                        out,
                        "function {{:inline true}} MKPTR(base: arrayId, offset: {}) : ptr {{\n  \
                         base ++ offset\n}}",
                        self.int_rep.type_name(ptr_width)
                    )?;
                    writeln!(out)?;
                    writeln!(
                        out,
                        "function {{:inline true}} base#MKPTR(p: ptr) : arrayId {{\n  \
                         p[{}:{}]\n}}",
                        ptr_width + base_bits,
                        ptr_width
                    )?;
                    writeln!(out)?;
                    writeln!(
                        out,
                        "function {{:inline true}} offset#MKPTR(p : ptr) : bv{ptr_width} {{\n  \
                         p[{ptr_width}:0]\n}}"
                    )?;
                    writeln!(out)?;
                }
            }
        }

        // One atomic-update procedure per distinct element size.
        let mut atomic_widths = BTreeSet::new();
        for global in self.module.globals() {
            match global.range_type() {
                Type::Bv(w) | Type::Float(w) | Type::Pointer(w) | Type::FunctionPointer(w) => {
                    atomic_widths.insert(*w);
                }
                _ => {}
            }
        }
        let pw_ty = self.int_rep.type_name(ptr_width);
        for width in atomic_widths {
            let elem_ty = self.int_rep.type_name(width);
            writeln!(
                out,
                "procedure _ATOMIC_OP{width}(x : [{pw_ty}]{elem_ty}, y : {pw_ty}) \
                 returns (z : {elem_ty}, A : [{pw_ty}]{elem_ty});"
            )?;
        }

        for global in self.module.globals() {
            write!(out, "var {{:original_name \"{}\"}} ", global.source_name())?;
            for attrib in global.attributes() {
                write!(out, "{{:{attrib}}} ")?;
            }
            let range = ctx.type_name(global.range_type());
            writeln!(out, "$${} : [{pw_ty}]{range};", global.name())?;

            if global.is_global_or_group_shared() {
                let mut attributes = String::from(" {:race_checking} ");
                if global.is_global() {
                    attributes += "{:global} ";
                } else {
                    attributes += "{:group_shared} ";
                }
                let elem_width = global.range_type().width();
                for tracker in ["_READ_HAS_OCCURRED_", "_WRITE_HAS_OCCURRED_", "_ATOMIC_HAS_OCCURRED_"] {
                    writeln!(
                        out,
                        "var{attributes}{{:elem_width {elem_width}}} {tracker}$${} : bool;",
                        global.name()
                    )?;
                }
                match self.race_inst {
                    RaceInstrumenter::Standard => {
                        for tracker in ["_READ_OFFSET_", "_WRITE_OFFSET_", "_ATOMIC_OFFSET_"] {
                            writeln!(
                                out,
                                "var{attributes}{tracker}$${} : {pw_ty};",
                                global.name()
                            )?;
                        }
                    }
                    RaceInstrumenter::WatchdogMultiple => {
                        writeln!(
                            out,
                            "const{attributes}_WATCHED_OFFSET_$${} : {pw_ty};",
                            global.name()
                        )?;
                    }
                    RaceInstrumenter::WatchdogSingle => {
                        // The single module-wide watched offset is
                        // declared below.
                    }
                }
            }

            if global.not_accessed() {
                writeln!(out, "var _NOT_ACCESSED_$${} : bool;", global.name())?;
            }

            if ctx.uses_pointers {
                writeln!(out, "const unique $arrayId$${} : arrayId;", global.name())?;
            }
            writeln!(out)?;
        }

        if self.race_inst == RaceInstrumenter::WatchdogSingle {
            writeln!(out, "const _WATCHED_OFFSET : {pw_ty};")?;
        }

        if ctx.uses_pointers {
            writeln!(out, "const unique $arrayId$$null$ : arrayId;")?;
            writeln!(out)?;
        }

        if ctx.uses_function_pointers {
            match self.pointer_rep {
                PointerRepresentation::Datatype => writeln!(out, "type functionPtr;")?,
                PointerRepresentation::Flat => {
                    let bits = bits_required(self.module.functions().len());
                    writeln!(out, "type functionPtr = bv{bits};")?;
                }
            }
            for function in self.module.functions() {
                writeln!(out, "const unique $functionId$${} : functionPtr;", function.name())?;
            }
            writeln!(out, "const unique $functionId$$null$ : functionPtr;")?;
            writeln!(out)?;
        }

        for intrinsic in &ctx.intrinsics {
            writeln!(out, "{intrinsic}")?;
        }
        if !ctx.intrinsics.is_empty() {
            writeln!(out)?;
        }

        out.push_str(&bodies);
        Ok((out, ctx.source_locs))
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::emitter::{BvRepresentation, MathRepresentation};
    use crate::{Expr, Function, Module, Stmt, Type, Var};

    use super::*;

    fn add1_module() -> Module {
        let mut m = Module::new(32);
        let mut f = Function::new("add1", "add1");
        let a = f.add_argument(Type::Bv(32), "a");
        let ret = f.add_return(Type::Bv(32), "ret");
        let bb = f.add_basic_block("entry");
        let sum = Expr::bv_add(Expr::var_ref(a), Expr::bv_const_u64(32, 1));
        f.block_mut(bb).add_stmt(Stmt::eval(sum.clone()));
        f.block_mut(bb).add_stmt(Stmt::assign(ret, sum));
        f.block_mut(bb).add_stmt(Stmt::ret());
        m.add_function(f);
        m
    }

    #[test]
    fn add1_bitvector_mode() {
        let m = add1_module();
        let int_rep = BvRepresentation;
        let writer = ModuleWriter::new(
            &m,
            &int_rep,
            RaceInstrumenter::Standard,
            PointerRepresentation::Datatype,
        );
        let (text, _) = writer.write_to_string().unwrap();
        assert!(text.starts_with("type _SIZE_T_TYPE = bv32;\n"));
        assert!(text.contains(
            "procedure {:source_name \"add1\"} $add1($a: bv32) returns ($ret: bv32)"
        ));
        assert!(text.contains("v0 := BV32_ADD($a, 1bv32);"));
        assert!(text.contains("$ret := v0;"));
        assert!(text.contains("  return;"));
        // No pointers in use, so no pointer header.
        assert!(!text.contains("MKPTR"));
        // Exactly one bvadd declaration, no matter how often it was
        // requested.
        let decl = "function {:bvbuiltin \"bvadd\"} BV32_ADD(bv32, bv32) : bv32;";
        assert_eq!(text.matches(decl).count(), 1);
    }

    #[test]
    fn add1_math_mode() {
        let m = add1_module();
        let int_rep = MathRepresentation;
        let writer = ModuleWriter::new(
            &m,
            &int_rep,
            RaceInstrumenter::Standard,
            PointerRepresentation::Datatype,
        );
        let (text, _) = writer.write_to_string().unwrap();
        assert!(text.contains("$add1($a: int) returns ($ret: int)"));
        assert!(text.contains("v0 := BV32_ADD($a, 1);"));
        assert!(text.contains("x + y"));
    }

    #[test]
    fn race_tracking_variables_per_mode() {
        let mut m = Module::new(32);
        let ga = m.add_global("g", Type::Bv(32), "g", "int", vec![1]);
        ga.add_attribute("global");
        let mut f = Function::new("k", "k");
        f.set_entry_point(true);
        let bb = f.add_basic_block("entry");
        f.block_mut(bb).add_stmt(Stmt::store(
            Expr::global_array_ref(ga.clone()),
            Expr::bv_zero(32),
            Expr::bv_const_u64(32, 1),
        ));
        f.block_mut(bb).add_stmt(Stmt::ret());
        m.add_function(f);

        let int_rep = BvRepresentation;
        let standard = ModuleWriter::new(
            &m,
            &int_rep,
            RaceInstrumenter::Standard,
            PointerRepresentation::Datatype,
        );
        let (text, _) = standard.write_to_string().unwrap();
        assert!(text.contains("var {:original_name \"g\"} {:global} $$g : [bv32]bv32;"));
        assert!(text
            .contains("var {:race_checking} {:global} {:elem_width 32} _READ_HAS_OCCURRED_$$g : bool;"));
        assert!(text.contains("var {:race_checking} {:global} _WRITE_OFFSET_$$g : bv32;"));
        assert!(text.contains("procedure _ATOMIC_OP32(x : [bv32]bv32, y : bv32) returns (z : bv32, A : [bv32]bv32);"));
        assert!(text.contains("  modifies $$g;"));

        let watchdog = ModuleWriter::new(
            &m,
            &int_rep,
            RaceInstrumenter::WatchdogSingle,
            PointerRepresentation::Datatype,
        );
        let (text, _) = watchdog.write_to_string().unwrap();
        assert!(!text.contains("_WRITE_OFFSET_"));
        assert!(text.contains("const _WATCHED_OFFSET : bv32;"));

        let multiple = ModuleWriter::new(
            &m,
            &int_rep,
            RaceInstrumenter::WatchdogMultiple,
            PointerRepresentation::Datatype,
        );
        let (text, _) = multiple.write_to_string().unwrap();
        assert!(text.contains("const {:race_checking} {:global} _WATCHED_OFFSET_$$g : bv32;"));
    }

    #[test]
    fn pointer_header_and_array_ids() {
        let mut m = Module::new(32);
        let ga = m.add_global("a", Type::Bv(32), "a", "int", vec![0]);
        ga.add_attribute("global");
        let mut f = Function::new("k", "k");
        f.set_entry_point(true);
        let p = f.add_argument(Type::Pointer(32), "p");
        let bb = f.add_basic_block("entry");
        let ptr = Expr::var_ref(p);
        let load = Expr::load(
            Expr::array_id(ptr, Type::Bv(32)),
            Expr::bv_zero(32),
            Type::Bv(32),
            false,
        );
        f.block_mut(bb).add_stmt(Stmt::eval(load));
        f.block_mut(bb).add_stmt(Stmt::ret());
        m.add_function(f);

        let int_rep = BvRepresentation;
        let writer = ModuleWriter::new(
            &m,
            &int_rep,
            RaceInstrumenter::Standard,
            PointerRepresentation::Datatype,
        );
        let (text, _) = writer.write_to_string().unwrap();
        assert!(text.contains("type {:datatype} ptr;"));
        assert!(text.contains("function {:constructor} MKPTR(base: arrayId, offset: bv32) : ptr;"));
        assert!(text.contains("const unique $arrayId$$a : arrayId;"));
        assert!(text.contains("const unique $arrayId$$null$ : arrayId;"));

        let flat = ModuleWriter::new(
            &m,
            &int_rep,
            RaceInstrumenter::Standard,
            PointerRepresentation::Flat,
        );
        let (text, _) = flat.write_to_string().unwrap();
        // One global plus two reserved base values fit in two bits.
        assert!(text.contains("type ptr = bv34;"));
        assert!(text.contains("type arrayId = bv2;"));
        assert!(text.contains("function {:inline true} base#MKPTR(p: ptr) : arrayId {\n  p[34:32]\n}"));
    }

    #[test]
    fn global_inits_become_entry_point_requires() {
        let mut m = Module::new(32);
        let ga = m.add_global("c", Type::Bv(8), "c", "char", vec![2]);
        m.add_global_init(ga.clone(), 0, Expr::bv_const_u64(8, 10));
        m.add_global_init(ga.clone(), 1, Expr::bv_const_u64(8, 20));
        let mut f = Function::new("k", "k");
        f.set_entry_point(true);
        let bb = f.add_basic_block("entry");
        f.block_mut(bb).add_stmt(Stmt::ret());
        m.add_function(f);

        let int_rep = BvRepresentation;
        let writer = ModuleWriter::new(
            &m,
            &int_rep,
            RaceInstrumenter::Standard,
            PointerRepresentation::Datatype,
        );
        let (text, _) = writer.write_to_string().unwrap();
        let first = text.find("requires $$c[0bv32] == 10bv8;").unwrap();
        let second = text.find("requires $$c[1bv32] == 20bv8;").unwrap();
        assert!(first < second);
    }

    #[test]
    fn dump_mode_needs_no_module() {
        let e = Expr::bv_add(Expr::bv_const_u64(32, 1), {
            let v = Rc::new(Var::new("x".into(), Type::Bv(32)));
            Expr::var_ref(v)
        });
        assert_eq!(crate::emitter::dump_expr(&e), "BV32_ADD(1bv32, $x)");
    }
}
