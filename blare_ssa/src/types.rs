// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Int { width: u32 },
    Float { width: u32 },
    Pointer { pointee: Box<Type>, address_space: u32 },
    Vector { elem: Box<Type>, len: u32 },
    Array { elem: Box<Type>, len: u64 },
    Struct { fields: Vec<Type>, packed: bool },
    Function { ret: Box<Type>, params: Vec<Type> },
}

impl Type {
    pub fn int(width: u32) -> Type {
        Type::Int { width }
    }

    pub fn float(width: u32) -> Type {
        Type::Float { width }
    }

    pub fn pointer(pointee: Type, address_space: u32) -> Type {
        Type::Pointer { pointee: Box::new(pointee), address_space }
    }

    pub fn vector(elem: Type, len: u32) -> Type {
        Type::Vector { elem: Box::new(elem), len }
    }

    pub fn array(elem: Type, len: u64) -> Type {
        Type::Array { elem: Box::new(elem), len }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Type::Void)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer { .. })
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float { .. })
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Vector { .. })
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function { .. })
    }

    pub fn pointee(&self) -> &Type {
        match self {
            Type::Pointer { pointee, .. } => pointee,
            _ => panic!("pointee of non-pointer type {self}"),
        }
    }

    pub fn address_space(&self) -> u32 {
        match self {
            Type::Pointer { address_space, .. } => *address_space,
            _ => panic!("address space of non-pointer type {self}"),
        }
    }

    /// Whether this is a pointer whose pointee is a function type.
    pub fn is_function_pointer(&self) -> bool {
        matches!(self, Type::Pointer { pointee, .. } if pointee.is_function())
    }

    pub fn vector_parts(&self) -> Option<(&Type, u32)> {
        match self {
            Type::Vector { elem, len } => Some((elem, *len)),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Int { width } => write!(f, "i{width}"),
            Type::Float { width: 16 } => write!(f, "half"),
            Type::Float { width: 32 } => write!(f, "float"),
            Type::Float { width: 64 } => write!(f, "double"),
            Type::Float { width } => write!(f, "f{width}"),
            Type::Pointer { pointee, address_space: 0 } => write!(f, "{pointee}*"),
            Type::Pointer { pointee, address_space } => {
                write!(f, "{pointee} addrspace({address_space})*")
            }
            Type::Vector { elem, len } => write!(f, "<{len} x {elem}>"),
            Type::Array { elem, len } => write!(f, "[{len} x {elem}]"),
            Type::Struct { fields, packed } => {
                if *packed {
                    write!(f, "<{{ ")?;
                } else {
                    write!(f, "{{ ")?;
                }
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                if *packed { write!(f, " }}>") } else { write!(f, " }}") }
            }
            Type::Function { ret, params } => {
                write!(f, "{ret} (")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ")")
            }
        }
    }
}
