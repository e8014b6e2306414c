// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Removal of dead evaluation statements.
//!
//! Translation names every intermediate expression with an `Eval`
//! statement so that the backend can print it as an SSA temporary. Most
//! of those names are used exactly once and can be folded back into
//! their single use site; this pass removes the statements whose removal
//! cannot be observed. Side-effecting evaluations (calls, havoc, array
//! snapshots, no-overflow adds, atomics) always stay.
//!
//! The walk is in reverse so that removing a use can expose its operands
//! as dead in the same pass.

use crate::basic_block::BasicBlock;
use crate::module::Module;
use crate::stmt::{has_side_effects, is_null_pointer_load, is_temporal};

pub fn simplify_stmt(module: &mut Module) {
    for function in module.functions_mut() {
        for block in function.blocks_mut() {
            process_basic_block(block);
        }
    }
}

fn process_basic_block(block: &mut BasicBlock) {
    let stmts = block.stmts_mut();
    let mut i = stmts.len();
    while i > 0 {
        i -= 1;
        let remove = match stmts[i].get_eval_expr() {
            Some(e) if has_side_effects(e) => false,
            Some(e) => {
                // The Eval statement itself holds one reference; a count
                // of two means a single remaining use, which the backend
                // prints inline.
                let refs = e.ref_count();
                (refs == 1 && !is_null_pointer_load(e)) || (!is_temporal(e) && refs <= 2)
            }
            None => false,
        };
        if remove {
            stmts.remove(i);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::{Expr, Function, Module, Stmt, StmtBody, Type, Var};

    #[test]
    fn removes_dead_single_use_evals() {
        let mut m = Module::new(32);
        let mut f = Function::new("f", "f");
        let x = Rc::new(Var::new("x".into(), Type::Bv(32)));
        let bb = f.add_basic_block("entry");
        let e = Expr::bv_add(Expr::var_ref(x.clone()), Expr::bv_const_u64(32, 1));
        f.block_mut(bb).add_stmt(Stmt::eval(e.clone()));
        f.block_mut(bb).add_stmt(Stmt::assign(x.clone(), e));
        f.block_mut(bb).add_stmt(Stmt::ret());
        m.add_function(f);

        super::simplify_stmt(&mut m);

        let stmts = m.functions()[0].blocks()[0].stmts();
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[0].body(), StmtBody::VarAssign { .. }));
        assert!(matches!(stmts[1].body(), StmtBody::Return));
    }

    #[test]
    fn keeps_multiply_used_evals_and_side_effects() {
        let mut m = Module::new(32);
        let mut f = Function::new("f", "f");
        let x = Rc::new(Var::new("x".into(), Type::Bv(32)));
        let y = Rc::new(Var::new("y".into(), Type::Bv(32)));
        let bb = f.add_basic_block("entry");
        let e = Expr::bv_add(Expr::var_ref(x.clone()), Expr::bv_const_u64(32, 1));
        f.block_mut(bb).add_stmt(Stmt::eval(e.clone()));
        f.block_mut(bb).add_stmt(Stmt::assign(x.clone(), e.clone()));
        f.block_mut(bb).add_stmt(Stmt::assign(y.clone(), e.clone()));
        let call = Expr::call("g", Type::Bv(32), vec![]);
        f.block_mut(bb).add_stmt(Stmt::eval(call));
        m.add_function(f);
        // Three handles on `e` remain: the Eval and both assignments.
        super::simplify_stmt(&mut m);

        let stmts = m.functions()[0].blocks()[0].stmts();
        assert_eq!(stmts.len(), 4);
        assert!(matches!(stmts[0].body(), StmtBody::Eval(_)));
        assert!(matches!(stmts[3].body(), StmtBody::Eval(_)));
    }

    #[test]
    fn preserves_store_and_assume_multiset() {
        let mut m = Module::new(32);
        let mut f = Function::new("k", "k");
        let ga = m.add_global("a", Type::Bv(32), "a", "int", vec![1]);
        let bb = f.add_basic_block("entry");
        let dead = Expr::bv_mul(Expr::bv_const_u64(32, 2), Expr::var_ref(Rc::new(Var::new(
            "t".into(),
            Type::Bv(32),
        ))));
        f.block_mut(bb).add_stmt(Stmt::eval(dead));
        f.block_mut(bb).add_stmt(Stmt::store(
            Expr::global_array_ref(ga.clone()),
            Expr::bv_const_u64(32, 0),
            Expr::bv_const_u64(32, 7),
        ));
        f.block_mut(bb).add_stmt(Stmt::partition_assume(Expr::bool_const(true)));
        m.add_function(f);

        super::simplify_stmt(&mut m);

        let stmts = m.functions()[0].blocks()[0].stmts();
        assert_eq!(stmts.len(), 2);
        assert!(matches!(stmts[0].body(), StmtBody::Store { .. }));
        assert!(matches!(stmts[1].body(), StmtBody::Assume { partition: true, .. }));
    }
}
