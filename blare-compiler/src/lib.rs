// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The translation engine: lowers a typed SSA-form module into the
//! Boogie-like verification IR of `blare_ir`.
//!
//! The interesting part is the memory model. Input pointers are untyped
//! byte addresses; the translator recasts them as (array, offset) pairs
//! and iterates per-global representation decisions to a fixed point;
//! see [`ModuleTranslator::translate`].

mod error;
mod lang;
pub mod preprocessing;
mod special_functions;
mod translate_function;
mod translate_module;

pub use error::{Error, Result};
pub use lang::{AddressSpaceMap, SourceLanguage};
pub use special_functions::SpecialFunction;
pub use translate_module::ModuleTranslator;
