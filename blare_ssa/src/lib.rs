// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The typed SSA-form input IR.
//!
//! This is the fully materialised object graph the translation engine
//! consumes: the shape of device code after compilation (raw bit
//! widths, byte-addressed pointers, vectors, aggregate constants), with
//! none of the source language left. Producing it (from bitcode or
//! otherwise) is a front-end concern; the whole graph derives serde so a
//! driver can load a serialised module directly.

mod constant;
mod inst;
mod layout;
mod module;
mod types;

pub use constant::{ConstExpr, Constant};
pub use inst::{
    BinOp, Block, Callee, CastKind, FloatPredicate, Instruction, IntPredicate, LocalId, Op, Phi,
    Terminator, Value,
};
pub use layout::DataLayout;
pub use module::{Function, Global, Module, Param, SourceLoc};
pub use types::Type;
