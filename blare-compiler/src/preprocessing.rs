// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Checks that run before translation.
//!
//! Inlining itself happens upstream (the materialised input arrives
//! pre-inlined when inlining was requested); these passes establish the
//! invariants the translator then relies on: the call graph is acyclic,
//! no inlined function carries contracts, and kernels with several
//! writable global pointer arguments declared them `restrict`.

use std::collections::BTreeSet;

use tracing::warn;

use blare_ssa as ssa;

use crate::error::{Error, Result};
use crate::lang::{AddressSpaceMap, SourceLanguage};
use crate::special_functions::SpecialFunction;

fn direct_callees(function: &ssa::Function) -> BTreeSet<usize> {
    let mut out = BTreeSet::new();
    for block in &function.blocks {
        for inst in &block.insts {
            if let ssa::Op::Call { callee: ssa::Callee::Direct(target), .. } = &inst.op {
                out.insert(*target);
            }
        }
    }
    out
}

/// Rejects cyclic call graphs. Recursion cannot be inlined away, so
/// with inlining requested a cycle is fatal.
pub fn check_call_graph_acyclic(module: &ssa::Module) -> Result<()> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Unvisited,
        Visiting,
        Done,
    }

    fn visit(
        module: &ssa::Module,
        fid: usize,
        marks: &mut [Mark],
    ) -> Result<()> {
        match marks[fid] {
            Mark::Done => return Ok(()),
            Mark::Visiting => {
                return Err(Error::fatal(format!(
                    "cycle in the call graph involving '{}'",
                    module.functions[fid].display_name()
                )));
            }
            Mark::Unvisited => {}
        }
        marks[fid] = Mark::Visiting;
        for callee in direct_callees(&module.functions[fid]) {
            visit(module, callee, marks)?;
        }
        marks[fid] = Mark::Done;
        Ok(())
    }

    let mut marks = vec![Mark::Unvisited; module.functions.len()];
    for fid in 0..module.functions.len() {
        visit(module, fid, &mut marks)?;
    }
    Ok(())
}

/// With inlining requested, a pre- or post-condition on a function that
/// will disappear into its callers cannot be honoured.
pub fn check_no_contracts_on_inlined(
    module: &ssa::Module,
    lang: SourceLanguage,
    entry_points: &BTreeSet<String>,
) -> Result<()> {
    for function in &module.functions {
        if function.is_kernel || entry_points.contains(&function.name) {
            continue;
        }
        for block in &function.blocks {
            for inst in &block.insts {
                let ssa::Op::Call { callee: ssa::Callee::Direct(target), .. } = &inst.op else {
                    continue;
                };
                let callee = &module.functions[*target].name;
                if matches!(
                    SpecialFunction::lookup(lang, callee),
                    Some(SpecialFunction::Requires | SpecialFunction::Ensures)
                ) {
                    return Err(Error::fatal(format!(
                        "pre- or post-condition on '{}', which would be inlined",
                        function.display_name()
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Warns when a kernel takes several global pointer arguments and some
/// lack the `restrict` qualifier; without it the verifier must assume
/// the arrays may alias.
pub fn warn_missing_restrict(
    module: &ssa::Module,
    lang: SourceLanguage,
    entry_points: &BTreeSet<String>,
) {
    if !matches!(lang, SourceLanguage::OpenCl | SourceLanguage::Cuda) {
        return;
    }
    let spaces = AddressSpaceMap::for_language(lang);
    for function in &module.functions {
        if !function.is_kernel && !entry_points.contains(&function.name) {
            continue;
        }
        let global_pointer_params: Vec<&ssa::Param> = function
            .params
            .iter()
            .filter(|p| {
                p.ty.is_pointer()
                    && !p.ty.is_function_pointer()
                    && p.ty.address_space() == spaces.global
            })
            .collect();
        if global_pointer_params.len() < 2 {
            continue;
        }
        for param in global_pointer_params {
            if !param.no_alias {
                warn!(
                    "kernel argument '{}' of '{}' is missing the restrict qualifier",
                    param.source_name.as_deref().unwrap_or(&param.name),
                    function.display_name()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blare_ssa::{Block, Callee, Function, Instruction, Module, Op, Terminator, Type};

    fn call_inst(target: usize) -> Instruction {
        Instruction {
            result: None,
            op: Op::Call {
                callee: Callee::Direct(target),
                fn_ty: Type::Function { ret: Box::new(Type::Void), params: vec![] },
                args: vec![],
            },
            loc: None,
        }
    }

    fn function_calling(name: &str, target: usize) -> Function {
        Function {
            name: name.to_string(),
            source_name: None,
            params: vec![],
            ret: Type::Void,
            blocks: vec![Block {
                name: "entry".to_string(),
                phis: vec![],
                insts: vec![call_inst(target)],
                term: Terminator::Ret { value: None },
                term_loc: None,
            }],
            is_kernel: false,
        }
    }

    #[test]
    fn detects_call_cycles() {
        let module = Module {
            pointer_width: 32,
            globals: vec![],
            functions: vec![function_calling("f", 1), function_calling("g", 0)],
        };
        assert!(check_call_graph_acyclic(&module).is_err());

        let module = Module {
            pointer_width: 32,
            globals: vec![],
            functions: vec![function_calling("f", 1), function_calling("g", 2), {
                let mut h = function_calling("h", 0);
                h.blocks[0].insts.clear();
                h
            }],
        };
        assert!(check_call_graph_acyclic(&module).is_ok());
    }
}
