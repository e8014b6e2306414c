// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use crate::Stmt;

/// Index of a basic block within its owning function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(pub(crate) usize);

impl BlockId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug)]
pub struct BasicBlock {
    name: String,
    stmts: Vec<Stmt>,
}

impl BasicBlock {
    pub(crate) fn new(name: String) -> Self {
        BasicBlock { name, stmts: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_stmt(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    pub fn stmts(&self) -> &[Stmt] {
        &self.stmts
    }

    pub(crate) fn stmts_mut(&mut self) -> &mut Vec<Stmt> {
        &mut self.stmts
    }
}
