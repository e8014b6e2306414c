// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::collections::HashMap;
use std::rc::Rc;

use crate::expr::Expr;
use crate::function::Function;
use crate::global_array::GlobalArray;
use crate::typ::Type;

/// One element of a global's initial contents: `array[offset] == init`
/// must hold on entry to every entry point.
#[derive(Debug)]
pub struct GlobalInit {
    pub array: Rc<GlobalArray>,
    pub offset: u64,
    pub init: Expr,
}

#[derive(Debug)]
pub struct Module {
    pointer_width: u32,
    globals: Vec<Rc<GlobalArray>>,
    functions: Vec<Function>,
    axioms: Vec<Expr>,
    global_inits: Vec<GlobalInit>,
    global_names: HashMap<String, u32>,
}

impl Module {
    pub fn new(pointer_width: u32) -> Self {
        Module {
            pointer_width,
            globals: Vec::new(),
            functions: Vec::new(),
            axioms: Vec::new(),
            global_inits: Vec::new(),
            global_names: HashMap::new(),
        }
    }

    pub fn pointer_width(&self) -> u32 {
        self.pointer_width
    }

    pub fn add_global(
        &mut self,
        name: &str,
        range_type: Type,
        source_name: &str,
        source_type: &str,
        source_dims: Vec<u64>,
    ) -> Rc<GlobalArray> {
        let name = self.unique_global_name(name);
        let ga = Rc::new(GlobalArray::new(
            name,
            range_type,
            source_name.to_string(),
            source_type.to_string(),
            source_dims,
        ));
        self.globals.push(ga.clone());
        ga
    }

    pub fn globals(&self) -> &[Rc<GlobalArray>] {
        &self.globals
    }

    pub fn add_function(&mut self, function: Function) {
        self.functions.push(function);
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut [Function] {
        &mut self.functions
    }

    pub fn add_axiom(&mut self, axiom: Expr) {
        assert!(axiom.typ().is_bool());
        self.axioms.push(axiom);
    }

    pub fn axioms(&self) -> &[Expr] {
        &self.axioms
    }

    pub fn add_global_init(&mut self, array: Rc<GlobalArray>, offset: u64, init: Expr) {
        self.global_inits.push(GlobalInit { array, offset, init });
    }

    pub fn global_inits(&self) -> &[GlobalInit] {
        &self.global_inits
    }

    fn unique_global_name(&mut self, name: &str) -> String {
        let mut base: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '.' { c } else { '_' })
            .collect();
        if base.is_empty() {
            base = "g".to_string();
        } else if base.chars().next().unwrap().is_ascii_digit() {
            base = format!("g{base}");
        }
        let n = self.global_names.entry(base.clone()).or_insert(0);
        *n += 1;
        if *n == 1 { base } else { format!("{base}_{}", *n - 1) }
    }
}
