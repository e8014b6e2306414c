// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Serialises one function into a Boogie procedure.
//!
//! The body is written first so that the SSA temporary table and the
//! modifies set are complete before the signature, contracts and local
//! declarations are laid out around it.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{self, Write};

use crate::expr::{Expr, ExprValue};
use crate::function::Function;
use crate::stmt::{SourceLoc, Stmt, StmtBody};
use crate::typ::Type;

use super::expr_writer::{EmitCtx, ExprWriter};

pub(crate) struct FunctionWriter<'a, 'm> {
    ctx: &'a mut EmitCtx<'m>,
    func: &'m Function,
    ssa_ids: HashMap<usize, usize>,
    ssa_decls: Vec<(usize, Type)>,
    modifies: BTreeSet<String>,
}

impl<'m> ExprWriter<'m> for FunctionWriter<'_, 'm> {
    fn ctx(&mut self) -> Option<&mut EmitCtx<'m>> {
        Some(&mut *self.ctx)
    }

    fn resolve_temp(&self, e: &Expr) -> Option<String> {
        self.ssa_ids.get(&e.node_id()).map(|id| format!("v{id}"))
    }

    fn note_modifies(&mut self, name: &str) {
        self.modifies.insert(format!("$${name}"));
    }
}

impl<'a, 'm> FunctionWriter<'a, 'm> {
    pub fn new(ctx: &'a mut EmitCtx<'m>, func: &'m Function) -> Self {
        FunctionWriter {
            ctx,
            func,
            ssa_ids: HashMap::new(),
            ssa_decls: Vec::new(),
            modifies: BTreeSet::new(),
        }
    }

    pub fn write(&mut self, out: &mut String) -> fmt::Result {
        let mut body = String::new();
        for block in self.func.blocks() {
            self.write_basic_block(&mut body, block)?;
        }

        write!(out, "procedure {{:source_name \"{}\"}} ", self.func.source_name())?;
        for attr in self.func.attributes() {
            write!(out, "{{:{attr}}} ")?;
        }
        write!(out, "${}(", self.func.name())?;
        for (i, arg) in self.func.args().iter().enumerate() {
            if i > 0 {
                write!(out, ", ")?;
            }
            let ty = self.type_name(arg.typ());
            write!(out, "${}: {}", arg.name(), ty)?;
        }
        write!(out, ")")?;
        if !self.func.returns().is_empty() {
            write!(out, " returns (")?;
            for (i, ret) in self.func.returns().iter().enumerate() {
                if i > 0 {
                    write!(out, ", ")?;
                }
                let ty = self.type_name(ret.typ());
                write!(out, "${}: {}", ret.name(), ty)?;
            }
            write!(out, ")")?;
        }

        if self.func.blocks().is_empty() {
            writeln!(out, ";")?;
            self.write_contracts(out)?;
            writeln!(out)?;
            return Ok(());
        }

        writeln!(out)?;
        self.write_contracts(out)?;
        if !self.modifies.is_empty() {
            let names: Vec<&str> = self.modifies.iter().map(String::as_str).collect();
            writeln!(out, "  modifies {};", names.join(", "))?;
        }
        writeln!(out, "{{")?;
        for (id, typ) in std::mem::take(&mut self.ssa_decls) {
            let ty = self.type_name(&typ);
            writeln!(out, "  var v{id}: {ty};")?;
        }
        for local in self.func.locals() {
            let ty = self.type_name(local.typ());
            writeln!(out, "  var ${}: {ty};", local.name())?;
        }
        write!(out, "{body}")?;
        writeln!(out, "}}")?;
        writeln!(out)?;
        Ok(())
    }

    fn write_contracts(&mut self, out: &mut String) -> fmt::Result {
        for pred in self.func.requires() {
            let mut text = String::new();
            self.write_expr(&mut text, pred, 0)?;
            writeln!(out, "  requires {text};")?;
        }
        if self.func.is_entry_point() {
            let inits: Vec<(String, u64, Expr)> = self
                .ctx
                .module
                .global_inits()
                .iter()
                .map(|gi| (gi.array.name().to_string(), gi.offset, gi.init.clone()))
                .collect();
            for (name, offset, init) in inits {
                let index = {
                    let ctx = self.ctx().unwrap();
                    ctx.int_rep.literal_u64(offset, ctx.pointer_width())
                };
                let mut text = String::new();
                self.write_expr(&mut text, &init, 0)?;
                writeln!(out, "  requires $${name}[{index}] == {text};")?;
            }
        }
        for pred in self.func.ensures() {
            let mut text = String::new();
            self.write_expr(&mut text, pred, 0)?;
            writeln!(out, "  ensures {text};")?;
        }
        Ok(())
    }

    fn write_basic_block(
        &mut self,
        out: &mut String,
        block: &crate::basic_block::BasicBlock,
    ) -> fmt::Result {
        writeln!(out, "{}:", block.name())?;
        for stmt in block.stmts() {
            self.write_stmt(out, stmt)?;
        }
        Ok(())
    }

    fn next_temp(&mut self, e: &Expr) -> usize {
        let id = self.ssa_ids.len();
        self.ssa_ids.insert(e.node_id(), id);
        self.ssa_decls.push((id, e.typ().clone()));
        id
    }

    fn sourceloc_attr(&mut self, loc: Option<&SourceLoc>) -> String {
        match loc {
            Some(loc) => {
                self.ctx.source_locs.push(loc.clone());
                format!("{{:sourceloc_num {}}} ", self.ctx.source_locs.len() - 1)
            }
            None => String::new(),
        }
    }

    fn write_stmt(&mut self, out: &mut String, stmt: &Stmt) -> fmt::Result {
        match stmt.body() {
            StmtBody::Eval(e) => self.write_eval(out, e, stmt.loc()),
            StmtBody::Store { array, offset, value } => {
                let mut ofs = String::new();
                self.write_expr(&mut ofs, offset, 0)?;
                let mut val = String::new();
                self.write_expr(&mut val, value, 0)?;
                if let Some(ga) = array.as_global_array_ref() {
                    self.note_modifies(ga.name());
                    return writeln!(out, "  $${}[{ofs}] := {val};", ga.name());
                }
                let candidates = self.array_candidates_for(array, Some(value.typ()));
                if candidates.is_empty() {
                    // A store through the null pointer has no location to
                    // update.
                    return writeln!(out, "  assume true;");
                }
                if candidates.len() == 1 {
                    let ga = &candidates[0];
                    self.note_modifies(ga.name());
                    return writeln!(out, "  $${}[{ofs}] := {val};", ga.name());
                }
                let mut aid = String::new();
                self.write_expr(&mut aid, array, 0)?;
                for (i, ga) in candidates.iter().enumerate() {
                    self.note_modifies(ga.name());
                    if i == 0 {
                        writeln!(out, "  if ({aid} == $arrayId$${}) {{", ga.name())?;
                    } else if i + 1 == candidates.len() {
                        writeln!(out, "  }} else {{")?;
                    } else {
                        writeln!(out, "  }} else if ({aid} == $arrayId$${}) {{", ga.name())?;
                    }
                    writeln!(out, "    $${}[{ofs}] := {val};", ga.name())?;
                }
                writeln!(out, "  }}")?;
                Ok(())
            }
            StmtBody::VarAssign { vars, values } => {
                let names: Vec<String> = vars.iter().map(|v| format!("${}", v.name())).collect();
                let mut texts = Vec::new();
                for value in values {
                    let mut text = String::new();
                    self.write_expr(&mut text, value, 0)?;
                    texts.push(text);
                }
                writeln!(out, "  {} := {};", names.join(", "), texts.join(", "))
            }
            StmtBody::Goto(blocks) => {
                let names: Vec<&str> =
                    blocks.iter().map(|b| self.func.block(*b).name()).collect();
                writeln!(out, "  goto {};", names.join(", "))
            }
            StmtBody::Return => writeln!(out, "  return;"),
            StmtBody::Assume { pred, partition } => {
                let mut text = String::new();
                self.write_expr(&mut text, pred, 0)?;
                if *partition {
                    writeln!(out, "  assume {{:partition}} {text};")
                } else {
                    writeln!(out, "  assume {text};")
                }
            }
            StmtBody::Assert(pred) => {
                let attr = self.sourceloc_attr(stmt.loc());
                let mut text = String::new();
                self.write_expr(&mut text, pred, 0)?;
                writeln!(out, "  assert {attr}{text};")
            }
            StmtBody::GlobalAssert(pred) => {
                let attr = self.sourceloc_attr(stmt.loc());
                let mut text = String::new();
                self.write_expr(&mut text, pred, 0)?;
                writeln!(out, "  assert {{:global}} {attr}{text};")
            }
            StmtBody::Call { callee, args } => {
                let attr = self.sourceloc_attr(stmt.loc());
                let mut text = String::new();
                self.write_args(&mut text, args)?;
                writeln!(out, "  call {attr}${callee}({text});")
            }
            StmtBody::CallMemberOf { pointer, calls } => {
                let mut ptr = String::new();
                self.write_expr(&mut ptr, pointer, 0)?;
                for (i, call) in calls.iter().enumerate() {
                    let StmtBody::Call { callee, args } = call.body() else { unreachable!() };
                    let mut argtext = String::new();
                    self.write_args(&mut argtext, args)?;
                    if i == 0 {
                        writeln!(out, "  if ({ptr} == $functionId$${callee}) {{")?;
                    } else {
                        writeln!(out, "  }} else if ({ptr} == $functionId$${callee}) {{")?;
                    }
                    writeln!(out, "    call ${callee}({argtext});")?;
                }
                writeln!(out, "  }} else {{")?;
                writeln!(out, "    assert false;")?;
                writeln!(out, "  }}")
            }
        }
    }

    fn write_eval(&mut self, out: &mut String, e: &Expr, loc: Option<&SourceLoc>) -> fmt::Result {
        match e.value() {
            ExprValue::Havoc => {
                let id = self.next_temp(e);
                writeln!(out, "  havoc v{id};")
            }
            ExprValue::Atomic { array, offset } => {
                let width = e.typ().width();
                let mut ofs = String::new();
                self.write_expr(&mut ofs, offset, 0)?;
                let attr = self.sourceloc_attr(loc);
                let id = self.next_temp(e);
                if let Some(ga) = array.as_global_array_ref() {
                    self.note_modifies(ga.name());
                    let name = ga.name();
                    return writeln!(
                        out,
                        "  call {attr}v{id}, $${name} := _ATOMIC_OP{width}($${name}, {ofs});"
                    );
                }
                let candidates = self.array_candidates_for(array, Some(e.typ()));
                let mut aid = String::new();
                self.write_expr(&mut aid, array, 0)?;
                for (i, ga) in candidates.iter().enumerate() {
                    self.note_modifies(ga.name());
                    let name = ga.name();
                    if i == 0 {
                        writeln!(out, "  if ({aid} == $arrayId$${name}) {{")?;
                    } else {
                        writeln!(out, "  }} else if ({aid} == $arrayId$${name}) {{")?;
                    }
                    writeln!(
                        out,
                        "    call v{id}, $${name} := _ATOMIC_OP{width}($${name}, {ofs});"
                    )?;
                }
                if !candidates.is_empty() {
                    writeln!(out, "  }} else {{")?;
                    writeln!(out, "    havoc v{id};")?;
                    writeln!(out, "  }}")?;
                } else {
                    writeln!(out, "  havoc v{id};")?;
                }
                Ok(())
            }
            ExprValue::ArraySnapshot { dst, src } => {
                if let (Some(d), Some(s)) = (dst.as_global_array_ref(), src.as_global_array_ref())
                {
                    self.note_modifies(d.name());
                    return writeln!(out, "  $${} := $${};", d.name(), s.name());
                }
                writeln!(out, "  assume true;")
            }
            ExprValue::Call { callee, args } => {
                let attr = self.sourceloc_attr(loc);
                let mut argtext = String::new();
                self.write_args(&mut argtext, args)?;
                let id = self.next_temp(e);
                writeln!(out, "  call {attr}v{id} := ${callee}({argtext});")
            }
            ExprValue::CallMemberOf { pointer, calls } => {
                let mut ptr = String::new();
                self.write_expr(&mut ptr, pointer, 0)?;
                let id = self.next_temp(e);
                for (i, call) in calls.iter().enumerate() {
                    let ExprValue::Call { callee, args } = call.value() else { unreachable!() };
                    let mut argtext = String::new();
                    self.write_args(&mut argtext, args)?;
                    if i == 0 {
                        writeln!(out, "  if ({ptr} == $functionId$${callee}) {{")?;
                    } else {
                        writeln!(out, "  }} else if ({ptr} == $functionId$${callee}) {{")?;
                    }
                    writeln!(out, "    call v{id} := ${callee}({argtext});")?;
                }
                writeln!(out, "  }} else {{")?;
                writeln!(out, "    assert false;")?;
                writeln!(out, "  }}")
            }
            _ => {
                let mut text = String::new();
                self.write_expr(&mut text, e, 0)?;
                let id = self.next_temp(e);
                writeln!(out, "  v{id} := {text};")
            }
        }
    }
}
