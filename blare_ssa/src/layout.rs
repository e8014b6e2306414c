// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sizes, alignments and aggregate layout.
//!
//! Natural-alignment rules: integers and floats align to their byte size
//! rounded up to a power of two (capped at 16), pointers to the pointer
//! width, vectors to their own rounded size, structs to their widest
//! field. Struct fields are padded to their alignment and the struct is
//! tail-padded to its own.

use serde::{Deserialize, Serialize};

use crate::types::Type;

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DataLayout {
    pub pointer_width: u32,
}

fn round_up(value: u64, align: u64) -> u64 {
    value.div_ceil(align) * align
}

fn natural_align(bytes: u64) -> u64 {
    bytes.max(1).next_power_of_two().min(16)
}

impl DataLayout {
    pub fn new(pointer_width: u32) -> Self {
        assert!(pointer_width % 8 == 0, "pointer width must be byte-sized");
        DataLayout { pointer_width }
    }

    /// Size of a value of the type, in bits, without tail padding.
    pub fn size_bits(&self, t: &Type) -> u64 {
        match t {
            Type::Void => 0,
            Type::Int { width } | Type::Float { width } => u64::from(*width),
            Type::Pointer { .. } => u64::from(self.pointer_width),
            Type::Vector { elem, len } => u64::from(*len) * self.size_bits(elem),
            Type::Array { elem, len } => len * self.alloc_size_bits(elem),
            Type::Struct { fields, packed } => {
                let (_, size) = self.struct_layout(fields, *packed);
                size * 8
            }
            Type::Function { .. } => panic!("size of function type"),
        }
    }

    pub fn abi_align_bytes(&self, t: &Type) -> u64 {
        match t {
            Type::Void => 1,
            Type::Int { width } | Type::Float { width } => {
                natural_align(u64::from(*width).div_ceil(8))
            }
            Type::Pointer { .. } => u64::from(self.pointer_width / 8),
            Type::Vector { .. } => natural_align(self.size_bits(t).div_ceil(8)),
            Type::Array { elem, .. } => self.abi_align_bytes(elem),
            Type::Struct { fields, packed } => {
                if *packed {
                    1
                } else {
                    fields.iter().map(|f| self.abi_align_bytes(f)).max().unwrap_or(1)
                }
            }
            Type::Function { .. } => 1,
        }
    }

    /// Size a value occupies in memory, including tail padding.
    pub fn alloc_size_bytes(&self, t: &Type) -> u64 {
        round_up(self.size_bits(t).div_ceil(8), self.abi_align_bytes(t))
    }

    pub fn alloc_size_bits(&self, t: &Type) -> u64 {
        self.alloc_size_bytes(t) * 8
    }

    /// Byte offsets of each field plus the total (tail-padded) size.
    pub fn struct_layout(&self, fields: &[Type], packed: bool) -> (Vec<u64>, u64) {
        let mut offsets = Vec::with_capacity(fields.len());
        let mut cursor = 0u64;
        let mut max_align = 1u64;
        for field in fields {
            let align = if packed { 1 } else { self.abi_align_bytes(field) };
            max_align = max_align.max(align);
            cursor = round_up(cursor, align);
            offsets.push(cursor);
            cursor += self.alloc_size_bytes(field);
        }
        (offsets, round_up(cursor, max_align))
    }

    pub fn field_offset_bytes(&self, fields: &[Type], packed: bool, index: usize) -> u64 {
        let (offsets, _) = self.struct_layout(fields, packed);
        offsets[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_sizes() {
        let dl = DataLayout::new(64);
        assert_eq!(dl.size_bits(&Type::int(1)), 1);
        assert_eq!(dl.alloc_size_bytes(&Type::int(1)), 1);
        assert_eq!(dl.alloc_size_bytes(&Type::int(32)), 4);
        assert_eq!(dl.size_bits(&Type::pointer(Type::int(8), 0)), 64);
    }

    #[test]
    fn struct_padding() {
        let dl = DataLayout::new(32);
        // { i8, i32, i8 } lays out at 0, 4, 8 with size 12.
        let fields = vec![Type::int(8), Type::int(32), Type::int(8)];
        let (offsets, size) = dl.struct_layout(&fields, false);
        assert_eq!(offsets, vec![0, 4, 8]);
        assert_eq!(size, 12);
        let (offsets, size) = dl.struct_layout(&fields, true);
        assert_eq!(offsets, vec![0, 1, 5]);
        assert_eq!(size, 6);
    }

    #[test]
    fn arrays_use_allocation_size() {
        let dl = DataLayout::new(32);
        // [4 x i24]: each element occupies four bytes.
        assert_eq!(dl.size_bits(&Type::array(Type::int(24), 4)), 128);
    }
}
