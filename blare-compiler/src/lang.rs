// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::str::FromStr;

use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceLanguage {
    C,
    Cuda,
    OpenCl,
}

impl FromStr for SourceLanguage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "" | "c" => Ok(SourceLanguage::C),
            "cu" => Ok(SourceLanguage::Cuda),
            "cl" => Ok(SourceLanguage::OpenCl),
            other => Err(Error::parameter(format!("unsupported source language: {other}"))),
        }
    }
}

/// The numbered address spaces the input attaches to pointers. Zero is
/// always the generic space.
#[derive(Clone, Copy, Debug)]
pub struct AddressSpaceMap {
    pub generic: u32,
    pub global: u32,
    pub group_shared: u32,
    pub constant: u32,
}

impl AddressSpaceMap {
    pub fn new(global: u32, group_shared: u32, constant: u32) -> Self {
        assert!(global != 0 && global != group_shared && global != constant);
        assert!(group_shared != 0 && group_shared != constant);
        assert!(constant != 0);
        AddressSpaceMap { generic: 0, global, group_shared, constant }
    }

    pub fn for_language(lang: SourceLanguage) -> Self {
        match lang {
            // SPIR-style numbering for OpenCL, NVVM numbering for CUDA.
            SourceLanguage::C | SourceLanguage::OpenCl => AddressSpaceMap::new(1, 3, 2),
            SourceLanguage::Cuda => AddressSpaceMap::new(1, 3, 4),
        }
    }
}
