// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Boogie text backend.
//!
//! The module writer drives emission: it serialises every function body
//! first (collecting, on demand, the set of SMT wrapper declarations the
//! printed terms need), then lays out the module header, global
//! declarations, race-tracking state and the accumulated declarations,
//! and finally the bodies themselves.

mod expr_writer;
mod function_writer;
mod int_rep;
mod module_writer;

pub use expr_writer::dump_expr;
pub use int_rep::{BvRepresentation, IntegerRepresentation, MathRepresentation};
pub use module_writer::ModuleWriter;

/// How `ptr` and `MKPTR` are declared: a Boogie datatype with
/// constructor/selectors, or a flat bit-vector with inline slicing
/// functions of the same names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PointerRepresentation {
    #[default]
    Datatype,
    Flat,
}

/// Which variety of auxiliary race-tracking declarations to emit per
/// shared global.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RaceInstrumenter {
    #[default]
    Standard,
    WatchdogSingle,
    WatchdogMultiple,
}
