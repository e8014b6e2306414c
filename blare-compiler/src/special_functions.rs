// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reserved-name functions whose calls lower to non-call constructs:
//! assertions, contract clauses, inter-thread projections, access
//! predicates, GPU index queries, math intrinsics and atomics.
//!
//! Dispatch is a closed enum plus one match in the instruction
//! translator, rather than a table of function pointers.

use crate::lang::SourceLanguage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dim {
    X,
    Y,
    Z,
}

impl Dim {
    pub fn suffix(self) -> &'static str {
        match self {
            Dim::X => "_x",
            Dim::Y => "_y",
            Dim::Z => "_z",
        }
    }

    pub fn from_index(i: u64) -> Option<Dim> {
        match i {
            0 => Some(Dim::X),
            1 => Some(Dim::Y),
            2 => Some(Dim::Z),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpecialFunction {
    Noop,
    Assert,
    GlobalAssert,
    AssertFail,
    Assume,
    Requires,
    Ensures,
    ReturnVal,
    Old,
    OtherInt,
    OtherBool,
    OtherPtrBase,
    Implies,
    Enabled,
    All,
    Exclusive,
    UniformInt,
    UniformBool,
    DistinctInt,
    DistinctBool,
    ReadHasOccurred,
    WriteHasOccurred,
    ReadOffset,
    WriteOffset,
    PtrBase,
    PtrOffset,
    NotAccessed,
    GetLocalId,
    GetGroupId,
    GetLocalSize,
    GetNumGroups,
    GetGlobalId,
    GetGlobalSize,
    CudaLocalId(Dim),
    CudaGroupId(Dim),
    CudaLocalSize(Dim),
    CudaNumGroups(Dim),
    WarpSize,
    Cos,
    Exp,
    Fabs,
    Fma,
    Log,
    Pow,
    Sin,
    Sqrt,
    AtomicOp,
    ArraySnapshot,
    AddNoovfl,
}

fn cuda_sreg(name: &str) -> Option<SpecialFunction> {
    let rest = name.strip_prefix("llvm.nvvm.read.ptx.sreg.")?;
    if rest == "warpsize" {
        return Some(SpecialFunction::WarpSize);
    }
    let (reg, dim) = rest.split_once('.')?;
    let dim = match dim {
        "x" => Dim::X,
        "y" => Dim::Y,
        "z" => Dim::Z,
        _ => return None,
    };
    match reg {
        "tid" => Some(SpecialFunction::CudaLocalId(dim)),
        "ctaid" => Some(SpecialFunction::CudaGroupId(dim)),
        "ntid" => Some(SpecialFunction::CudaLocalSize(dim)),
        "nctaid" => Some(SpecialFunction::CudaNumGroups(dim)),
        _ => None,
    }
}

impl SpecialFunction {
    pub fn lookup(lang: SourceLanguage, name: &str) -> Option<SpecialFunction> {
        use SpecialFunction::*;
        let common = match name {
            "blare_assert" | "__assert" | "__invariant" => Some(Assert),
            "__global_assert" => Some(GlobalAssert),
            "__assert_fail" => Some(AssertFail),
            "blare_assume" | "__assume" => Some(Assume),
            "blare_requires" | "__requires" => Some(Requires),
            "blare_ensures" | "__ensures" => Some(Ensures),
            "__return_val_int" | "__return_val_int4" | "__return_val_bool" => Some(ReturnVal),
            "__old_int" | "__old_bool" => Some(Old),
            "__other_int" => Some(OtherInt),
            "__other_bool" => Some(OtherBool),
            "__other_ptr_base" => Some(OtherPtrBase),
            "__implies" => Some(Implies),
            "__enabled" => Some(Enabled),
            "__all" => Some(All),
            "__exclusive" => Some(Exclusive),
            "__uniform_int" => Some(UniformInt),
            "__uniform_bool" => Some(UniformBool),
            "__distinct_int" => Some(DistinctInt),
            "__distinct_bool" => Some(DistinctBool),
            "__read_local" | "__read_global" => Some(ReadHasOccurred),
            "__write_local" | "__write_global" => Some(WriteHasOccurred),
            "__read_offset_local" | "__read_offset_global" => Some(ReadOffset),
            "__write_offset_local" | "__write_offset_global" => Some(WriteOffset),
            "__ptr_base_local" | "__ptr_base_global" => Some(PtrBase),
            "__ptr_offset_local" | "__ptr_offset_global" => Some(PtrOffset),
            "__not_accessed" => Some(NotAccessed),
            "__array_snapshot" => Some(ArraySnapshot),
            "__add_noovfl_signed" | "__add_noovfl_unsigned" => Some(AddNoovfl),
            _ => None,
        };
        if common.is_some() {
            return common;
        }

        if name.starts_with("llvm.lifetime.")
            || name.starts_with("llvm.dbg.")
            || name.starts_with("llvm.assume")
        {
            return Some(Noop);
        }
        for (prefix, sf) in [
            ("llvm.cos.", Cos),
            ("llvm.exp2.", Exp),
            ("llvm.exp.", Exp),
            ("llvm.fabs.", Fabs),
            ("llvm.fma.", Fma),
            ("llvm.log2.", Log),
            ("llvm.log.", Log),
            ("llvm.pow.", Pow),
            ("llvm.sin.", Sin),
            ("llvm.sqrt.", Sqrt),
        ] {
            if name.starts_with(prefix) {
                return Some(sf);
            }
        }
        if name.starts_with("__atomic") {
            return Some(AtomicOp);
        }

        match lang {
            SourceLanguage::OpenCl => match name {
                "get_local_id" => Some(GetLocalId),
                "get_group_id" => Some(GetGroupId),
                "get_local_size" => Some(GetLocalSize),
                "get_num_groups" => Some(GetNumGroups),
                "get_global_id" => Some(GetGlobalId),
                "get_global_size" => Some(GetGlobalSize),
                _ => None,
            },
            SourceLanguage::Cuda => cuda_sreg(name),
            SourceLanguage::C => None,
        }
    }
}

/// Functions whose single return value becomes a module axiom.
pub fn is_axiom_function(name: &str) -> bool {
    name.starts_with("__axiom")
}

/// Declarations lowered to uninterpreted Boogie functions.
pub fn is_uninterpreted_function(name: &str) -> bool {
    name.starts_with("__uninterpreted_function_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_respects_source_language() {
        assert_eq!(
            SpecialFunction::lookup(SourceLanguage::OpenCl, "get_local_id"),
            Some(SpecialFunction::GetLocalId)
        );
        assert_eq!(SpecialFunction::lookup(SourceLanguage::C, "get_local_id"), None);
        assert_eq!(
            SpecialFunction::lookup(SourceLanguage::Cuda, "llvm.nvvm.read.ptx.sreg.tid.x"),
            Some(SpecialFunction::CudaLocalId(Dim::X))
        );
        assert_eq!(
            SpecialFunction::lookup(SourceLanguage::C, "__assert"),
            Some(SpecialFunction::Assert)
        );
        assert_eq!(
            SpecialFunction::lookup(SourceLanguage::C, "llvm.sqrt.f64"),
            Some(SpecialFunction::Sqrt)
        );
        assert_eq!(SpecialFunction::lookup(SourceLanguage::C, "memcpy"), None);
    }
}
