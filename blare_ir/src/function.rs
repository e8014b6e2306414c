// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use crate::basic_block::{BasicBlock, BlockId};
use crate::expr::Expr;
use crate::typ::Type;

/// A procedure-local variable: argument, return value, local or phi
/// variable. Referenced from expressions by shared handle.
#[derive(Debug)]
pub struct Var {
    name: String,
    typ: Type,
}

impl Var {
    pub fn new(name: String, typ: Type) -> Self {
        Var { name, typ }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn typ(&self) -> &Type {
        &self.typ
    }
}

#[derive(Debug)]
pub struct Function {
    name: String,
    source_name: String,
    args: Vec<Rc<Var>>,
    returns: Vec<Rc<Var>>,
    locals: Vec<Rc<Var>>,
    blocks: Vec<BasicBlock>,
    requires: Vec<Expr>,
    ensures: Vec<Expr>,
    attributes: BTreeSet<String>,
    entry_point: bool,
    used_names: HashMap<String, u32>,
}

impl Function {
    pub fn new(name: &str, source_name: &str) -> Self {
        Function {
            name: name.to_string(),
            source_name: source_name.to_string(),
            args: Vec::new(),
            returns: Vec::new(),
            locals: Vec::new(),
            blocks: Vec::new(),
            requires: Vec::new(),
            ensures: Vec::new(),
            attributes: BTreeSet::new(),
            entry_point: false,
            used_names: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn set_entry_point(&mut self, entry_point: bool) {
        self.entry_point = entry_point;
    }

    pub fn is_entry_point(&self) -> bool {
        self.entry_point
    }

    pub fn add_attribute(&mut self, attrib: &str) {
        self.attributes.insert(attrib.to_string());
    }

    pub fn attributes(&self) -> impl Iterator<Item = &String> {
        self.attributes.iter()
    }

    pub fn add_argument(&mut self, typ: Type, name: &str) -> Rc<Var> {
        let var = Rc::new(Var::new(self.unique_name(name, "arg"), typ));
        self.args.push(var.clone());
        var
    }

    pub fn add_return(&mut self, typ: Type, name: &str) -> Rc<Var> {
        let var = Rc::new(Var::new(self.unique_name(name, "ret"), typ));
        self.returns.push(var.clone());
        var
    }

    pub fn add_local(&mut self, typ: Type, name: &str) -> Rc<Var> {
        let var = Rc::new(Var::new(self.unique_name(name, "v"), typ));
        self.locals.push(var.clone());
        var
    }

    pub fn add_basic_block(&mut self, name: &str) -> BlockId {
        let name = self.unique_name(name, "bb");
        self.blocks.push(BasicBlock::new(name));
        BlockId(self.blocks.len() - 1)
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0]
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [BasicBlock] {
        &mut self.blocks
    }

    pub fn args(&self) -> &[Rc<Var>] {
        &self.args
    }

    pub fn returns(&self) -> &[Rc<Var>] {
        &self.returns
    }

    pub fn locals(&self) -> &[Rc<Var>] {
        &self.locals
    }

    pub fn add_requires(&mut self, pred: Expr) {
        assert!(pred.typ().is_bool());
        self.requires.push(pred);
    }

    pub fn add_ensures(&mut self, pred: Expr) {
        assert!(pred.typ().is_bool());
        self.ensures.push(pred);
    }

    pub fn requires(&self) -> &[Expr] {
        &self.requires
    }

    pub fn ensures(&self) -> &[Expr] {
        &self.ensures
    }

    /// Sanitise an input name into a Boogie identifier and make it unique
    /// within the function.
    fn unique_name(&mut self, name: &str, fallback: &str) -> String {
        let mut base: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '$' { c } else { '_' })
            .collect();
        if base.is_empty() {
            base = fallback.to_string();
        } else if base.chars().next().unwrap().is_ascii_digit() {
            base = format!("{fallback}{base}");
        }
        let n = self.used_names.entry(base.clone()).or_insert(0);
        *n += 1;
        if *n == 1 { base } else { format!("{base}_{}", *n - 1) }
    }
}
