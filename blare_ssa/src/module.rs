// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde::{Deserialize, Serialize};

use crate::constant::Constant;
use crate::inst::Block;
use crate::layout::DataLayout;
use crate::types::Type;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLoc {
    pub file: String,
    #[serde(default)]
    pub dir: String,
    pub line: u32,
    pub col: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    /// Set when the source declared the parameter `restrict`.
    #[serde(default)]
    pub no_alias: bool,
    #[serde(default)]
    pub source_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub source_name: Option<String>,
    pub params: Vec<Param>,
    pub ret: Type,
    /// Empty for declarations.
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub is_kernel: bool,
}

impl Function {
    pub fn ty(&self) -> Type {
        Type::Function {
            ret: Box::new(self.ret.clone()),
            params: self.params.iter().map(|p| p.ty.clone()).collect(),
        }
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn display_name(&self) -> &str {
        self.source_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Global {
    pub name: String,
    /// The pointee type; the global itself is a pointer to this.
    pub value_type: Type,
    #[serde(default)]
    pub address_space: u32,
    #[serde(default)]
    pub init: Option<Constant>,
    #[serde(default)]
    pub source_name: Option<String>,
}

impl Global {
    pub fn display_name(&self) -> &str {
        self.source_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Module {
    pub pointer_width: u32,
    pub globals: Vec<Global>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn data_layout(&self) -> DataLayout {
        DataLayout::new(self.pointer_width)
    }

    pub fn function_named(&self, name: &str) -> Option<(usize, &Function)> {
        self.functions.iter().enumerate().find(|(_, f)| f.name == name)
    }
}
