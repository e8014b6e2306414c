// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Types of the verification IR.
//!
//! `ArrayId` is the type of expressions naming a global array; it carries
//! the *range* (element) type of the arrays the expression may denote.
//! `Any` is the wildcard range type of an array whose element type is not
//! yet constrained (the null array, or an unknown array-id while the
//! memory model is still being refined); `Unknown` is the result of a
//! conflicting range-type meet.

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Bool,
    Bv(u32),
    Float(u32),
    Pointer(u32),
    FunctionPointer(u32),
    ArrayId(Box<Type>),
    Any,
    Unknown,
}

impl Type {
    pub fn bv(width: u32) -> Self {
        assert!(width > 0, "zero-width bit-vector type");
        Type::Bv(width)
    }

    pub fn array_id(range: Type) -> Self {
        Type::ArrayId(Box::new(range))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Type::Bool)
    }

    pub fn is_bv(&self) -> bool {
        matches!(self, Type::Bv(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Type::Float(_))
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, Type::Pointer(_))
    }

    pub fn is_function_pointer(&self) -> bool {
        matches!(self, Type::FunctionPointer(_))
    }

    pub fn is_array_id(&self) -> bool {
        matches!(self, Type::ArrayId(_))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    /// Width in bits. Bool and the wildcard types have none.
    pub fn width(&self) -> u32 {
        match self {
            Type::Bv(w) | Type::Float(w) | Type::Pointer(w) | Type::FunctionPointer(w) => *w,
            _ => panic!("width of unsized type {self:?}"),
        }
    }

    /// The range (element) type of an array-id type.
    pub fn range(&self) -> Type {
        match self {
            Type::ArrayId(r) => (**r).clone(),
            _ => panic!("range of non-array type {self:?}"),
        }
    }

    /// The meet used when reconciling the element types of a set of
    /// candidate arrays: equal kinds are kept, differing sized kinds
    /// collapse to a bit-vector, and widths meet at their gcd. `Any`
    /// is the identity; irreconcilable kinds yield `Unknown`.
    pub fn meet(a: &Type, b: &Type) -> Type {
        if a.is_any() {
            return b.clone();
        }
        if b.is_any() {
            return a.clone();
        }
        if a.is_unknown() || b.is_unknown() {
            return Type::Unknown;
        }
        if a == b {
            return a.clone();
        }
        match (a, b) {
            (Type::Bool, _) | (_, Type::Bool) | (Type::ArrayId(_), _) | (_, Type::ArrayId(_)) => {
                Type::Unknown
            }
            (Type::Bv(x), Type::Bv(y)) => Type::Bv(gcd(*x, *y)),
            (Type::Float(x), Type::Float(y)) => Type::Float(gcd(*x, *y)),
            (Type::Pointer(x), Type::Pointer(y)) => Type::Pointer(gcd(*x, *y)),
            (Type::FunctionPointer(x), Type::FunctionPointer(y)) => {
                Type::FunctionPointer(gcd(*x, *y))
            }
            _ => Type::Bv(gcd(a.width(), b.width())),
        }
    }
}

pub(crate) fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meet_keeps_equal_kinds() {
        assert_eq!(Type::meet(&Type::Bv(32), &Type::Bv(32)), Type::Bv(32));
        assert_eq!(Type::meet(&Type::Bv(32), &Type::Bv(8)), Type::Bv(8));
        assert_eq!(Type::meet(&Type::Float(64), &Type::Float(32)), Type::Float(32));
    }

    #[test]
    fn meet_collapses_mixed_kinds_to_bv() {
        assert_eq!(Type::meet(&Type::Float(32), &Type::Bv(8)), Type::Bv(8));
        assert_eq!(Type::meet(&Type::Bv(64), &Type::Pointer(32)), Type::Bv(32));
    }

    #[test]
    fn meet_any_is_identity() {
        assert_eq!(Type::meet(&Type::Any, &Type::Bv(16)), Type::Bv(16));
        assert_eq!(Type::meet(&Type::Bv(16), &Type::Any), Type::Bv(16));
    }

    #[test]
    fn meet_bool_conflicts() {
        assert_eq!(Type::meet(&Type::Bool, &Type::Bv(8)), Type::Unknown);
    }
}
