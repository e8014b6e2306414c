// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::rc::Rc;

use crate::basic_block::BlockId;
use crate::expr::{Expr, ExprValue};
use crate::function::Var;

/// A source position carried over from the input module's debug metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceLoc {
    pub file: String,
    pub dir: String,
    pub line: u32,
    pub col: u32,
}

/// A statement. The fields are private; statements are created through
/// the constructors below, which check well-formedness, and may carry an
/// optional source location via [`Stmt::with_location`].
#[derive(Debug)]
pub struct Stmt {
    body: Box<StmtBody>,
    loc: Option<SourceLoc>,
}

#[derive(Debug)]
pub enum StmtBody {
    /// Evaluate and name an expression; the backend assigns it an SSA
    /// temporary. Removed by the statement simplifier when dead.
    Eval(Expr),
    /// `array[offset] := value`
    Store {
        array: Expr,
        offset: Expr,
        value: Expr,
    },
    /// Parallel assignment `v1, v2 := e1, e2`.
    VarAssign {
        vars: Vec<Rc<Var>>,
        values: Vec<Expr>,
    },
    Goto(Vec<BlockId>),
    Return,
    /// `partition` marks a branch guard, which the downstream verifier
    /// treats as a control-flow partition rather than an arbitrary
    /// assumption.
    Assume {
        pred: Expr,
        partition: bool,
    },
    Assert(Expr),
    GlobalAssert(Expr),
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    /// Indirect call dispatch over the candidate targets; each element is
    /// a `Call` statement guarded by a function-id comparison.
    CallMemberOf {
        pointer: Expr,
        calls: Vec<Stmt>,
    },
}

macro_rules! stmt {
    ($body:expr) => {
        Stmt { body: Box::new($body), loc: None }
    };
}

impl Stmt {
    pub fn body(&self) -> &StmtBody {
        &self.body
    }

    pub fn loc(&self) -> Option<&SourceLoc> {
        self.loc.as_ref()
    }

    pub fn with_location(mut self, loc: Option<SourceLoc>) -> Self {
        self.loc = loc;
        self
    }

    pub fn eval(expr: Expr) -> Self {
        stmt!(StmtBody::Eval(expr))
    }

    pub fn store(array: Expr, offset: Expr, value: Expr) -> Self {
        assert!(array.typ().is_array_id());
        assert!(offset.typ().is_bv());
        stmt!(StmtBody::Store { array, offset, value })
    }

    pub fn var_assign(vars: Vec<Rc<Var>>, values: Vec<Expr>) -> Self {
        assert_eq!(vars.len(), values.len());
        assert!(!vars.is_empty());
        stmt!(StmtBody::VarAssign { vars, values })
    }

    pub fn assign(var: Rc<Var>, value: Expr) -> Self {
        Stmt::var_assign(vec![var], vec![value])
    }

    pub fn goto_blocks(blocks: Vec<BlockId>) -> Self {
        assert!(!blocks.is_empty());
        stmt!(StmtBody::Goto(blocks))
    }

    pub fn goto_block(block: BlockId) -> Self {
        stmt!(StmtBody::Goto(vec![block]))
    }

    pub fn ret() -> Self {
        stmt!(StmtBody::Return)
    }

    pub fn assume(pred: Expr) -> Self {
        assert!(pred.typ().is_bool());
        stmt!(StmtBody::Assume { pred, partition: false })
    }

    pub fn partition_assume(pred: Expr) -> Self {
        assert!(pred.typ().is_bool());
        stmt!(StmtBody::Assume { pred, partition: true })
    }

    pub fn assert_stmt(pred: Expr) -> Self {
        assert!(pred.typ().is_bool());
        stmt!(StmtBody::Assert(pred))
    }

    pub fn global_assert(pred: Expr) -> Self {
        assert!(pred.typ().is_bool());
        stmt!(StmtBody::GlobalAssert(pred))
    }

    pub fn call(callee: &str, args: Vec<Expr>) -> Self {
        stmt!(StmtBody::Call { callee: callee.to_string(), args })
    }

    pub fn call_member_of(pointer: Expr, calls: Vec<Stmt>) -> Self {
        assert!(pointer.typ().is_function_pointer());
        assert!(!calls.is_empty());
        assert!(calls.iter().all(|c| matches!(c.body(), StmtBody::Call { .. })));
        stmt!(StmtBody::CallMemberOf { pointer, calls })
    }
}

/// Statement-level queries used by the simplifier.
impl Stmt {
    pub fn get_eval_expr(&self) -> Option<&Expr> {
        match self.body() {
            StmtBody::Eval(e) => Some(e),
            _ => None,
        }
    }
}

/// Expression-level queries used by the simplifier.
pub(crate) fn has_side_effects(e: &Expr) -> bool {
    matches!(
        e.value(),
        ExprValue::Call { .. }
            | ExprValue::CallMemberOf { .. }
            | ExprValue::Havoc
            | ExprValue::ArraySnapshot { .. }
            | ExprValue::AddNoovfl(_)
            | ExprValue::Atomic { .. }
    )
}

pub(crate) fn is_temporal(e: &Expr) -> bool {
    match e.value() {
        ExprValue::Load { temporal, .. } => *temporal,
        ExprValue::Havoc | ExprValue::ArraySnapshot { .. } | ExprValue::Atomic { .. } => true,
        _ => false,
    }
}

pub(crate) fn is_null_pointer_load(e: &Expr) -> bool {
    match e.value() {
        ExprValue::Load { array, .. } => array.typ().range().is_any(),
        _ => false,
    }
}
