// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer representation policy.
//!
//! The bit-vector representation maps every `BV(w)` to `bvw` and every
//! operation to its SMT builtin. The mathematical-integer representation
//! maps every width to `int`, desugars arithmetic to infix operators,
//! and leaves the genuinely bit-level operations uninterpreted apart
//! from a few trivial axioms.

use crate::bits::BvConst;
use crate::expr::BinaryOp;

pub trait IntegerRepresentation {
    fn type_name(&self, width: u32) -> String;

    fn literal(&self, value: &BvConst) -> String;

    fn literal_u64(&self, value: u64, width: u32) -> String {
        self.literal(&BvConst::from_u64(width, value))
    }

    fn zero_extend_decl(&self, from: u32, to: u32) -> String;

    fn sign_extend_decl(&self, from: u32, to: u32) -> String;

    /// Declaration of the `BV<w>_<NAME>` wrapper for an arithmetic or
    /// bitwise operator.
    fn arith_binary_decl(&self, name: &str, op: BinaryOp, width: u32) -> String;

    /// Declaration of the `BV<w>_<NAME>` wrapper for a comparison.
    fn bool_binary_decl(&self, name: &str, op: BinaryOp, width: u32) -> String;

    fn abstracts_extract(&self) -> bool;

    fn extract_expr(&self, expr: &str, upper: u32, lower: u32) -> String;

    fn extract_decl(&self) -> String;

    fn abstracts_concat(&self) -> bool;

    fn concat_expr(&self, lhs: &str, rhs: &str) -> String;

    fn concat_decl(&self) -> String;
}

pub struct BvRepresentation;

fn smt_builtin(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::BvAdd => "bvadd",
        BinaryOp::BvSub => "bvsub",
        BinaryOp::BvMul => "bvmul",
        BinaryOp::BvSDiv => "bvsdiv",
        BinaryOp::BvUDiv => "bvudiv",
        BinaryOp::BvSRem => "bvsrem",
        BinaryOp::BvURem => "bvurem",
        BinaryOp::BvShl => "bvshl",
        BinaryOp::BvAShr => "bvashr",
        BinaryOp::BvLShr => "bvlshr",
        BinaryOp::BvAnd => "bvand",
        BinaryOp::BvOr => "bvor",
        BinaryOp::BvXor => "bvxor",
        BinaryOp::BvUgt => "bvugt",
        BinaryOp::BvUge => "bvuge",
        BinaryOp::BvUlt => "bvult",
        BinaryOp::BvUle => "bvule",
        BinaryOp::BvSgt => "bvsgt",
        BinaryOp::BvSge => "bvsge",
        BinaryOp::BvSlt => "bvslt",
        BinaryOp::BvSle => "bvsle",
        _ => panic!("no SMT builtin for {op:?}"),
    }
}

impl IntegerRepresentation for BvRepresentation {
    fn type_name(&self, width: u32) -> String {
        format!("bv{width}")
    }

    fn literal(&self, value: &BvConst) -> String {
        format!("{}bv{}", value.to_unsigned_string(), value.width())
    }

    fn zero_extend_decl(&self, from: u32, to: u32) -> String {
        format!(
            "function {{:bvbuiltin \"zero_extend {}\"}} BV{from}_ZEXT{to}(bv{from}) : bv{to}",
            to - from
        )
    }

    fn sign_extend_decl(&self, from: u32, to: u32) -> String {
        format!(
            "function {{:bvbuiltin \"sign_extend {}\"}} BV{from}_SEXT{to}(bv{from}) : bv{to}",
            to - from
        )
    }

    fn arith_binary_decl(&self, name: &str, op: BinaryOp, width: u32) -> String {
        format!(
            "function {{:bvbuiltin \"{}\"}} BV{width}_{name}(bv{width}, bv{width}) : bv{width}",
            smt_builtin(op)
        )
    }

    fn bool_binary_decl(&self, name: &str, op: BinaryOp, width: u32) -> String {
        format!(
            "function {{:bvbuiltin \"{}\"}} BV{width}_{name}(bv{width}, bv{width}) : bool",
            smt_builtin(op)
        )
    }

    fn abstracts_extract(&self) -> bool {
        false
    }

    fn extract_expr(&self, expr: &str, upper: u32, lower: u32) -> String {
        format!("{expr}[{upper}:{lower}]")
    }

    fn extract_decl(&self) -> String {
        unreachable!("bit-vector extraction is not abstracted")
    }

    fn abstracts_concat(&self) -> bool {
        false
    }

    fn concat_expr(&self, lhs: &str, rhs: &str) -> String {
        format!("{lhs} ++ {rhs}")
    }

    fn concat_decl(&self) -> String {
        unreachable!("bit-vector concatenation is not abstracted")
    }
}

pub struct MathRepresentation;

impl IntegerRepresentation for MathRepresentation {
    fn type_name(&self, _width: u32) -> String {
        "int".to_string()
    }

    fn literal(&self, value: &BvConst) -> String {
        value.to_signed_string()
    }

    fn zero_extend_decl(&self, from: u32, to: u32) -> String {
        format!("function {{:inline true}} BV{from}_ZEXT{to}(x : int) : int {{\n  x\n}}")
    }

    fn sign_extend_decl(&self, from: u32, to: u32) -> String {
        format!("function BV{from}_SEXT{to}(int) : int")
    }

    fn arith_binary_decl(&self, name: &str, op: BinaryOp, width: u32) -> String {
        match op {
            BinaryOp::BvAdd
            | BinaryOp::BvSub
            | BinaryOp::BvMul
            | BinaryOp::BvUDiv
            | BinaryOp::BvSDiv
            | BinaryOp::BvURem
            | BinaryOp::BvSRem => {
                let infix = match op {
                    BinaryOp::BvAdd => "+",
                    BinaryOp::BvSub => "-",
                    BinaryOp::BvMul => "*",
                    BinaryOp::BvUDiv | BinaryOp::BvSDiv => "div",
                    _ => "mod",
                };
                format!(
                    "function {{:inline true}} BV{width}_{name}(x : int, y : int) : int {{\n  \
                     x {infix} y\n}}"
                )
            }
            BinaryOp::BvAnd => format!(
                "function {{:inline true}} BV{width}_{name}(x : int, y : int) : int {{\n  \
                 if x == y then x else (if x == 0 || y == 0 then 0 else BV{width}_{name}_UF(x, y))\n\
                 }}\nfunction BV{width}_{name}_UF(int, int) : int;"
            ),
            BinaryOp::BvOr => format!(
                "function {{:inline true}} BV{width}_{name}(x : int, y : int) : int {{\n  \
                 if x == y then x else (if x == 0 then y else (if y == 0 then x \
                 else BV{width}_{name}_UF(x, y)))\n\
                 }}\nfunction BV{width}_{name}_UF(int, int) : int;"
            ),
            BinaryOp::BvXor => {
                if width == 1 {
                    format!(
                        "function {{:inline true}} BV{width}_{name}(x : int, y : int) : int {{\n  \
                         if (x == 1 || x == -1) && (y == 1 || y == -1) then 0 else (\n    \
                         if (x == 1 || x == -1) && y == 0 then 1 else (\n      \
                         if x == 0 && (y == 1 || y == -1) then 1 else (\n        \
                         if x == y then 0 else BV{width}_{name}_UF(x, y))))\n\
                         }}\nfunction BV{width}_{name}_UF(int, int) : int;"
                    )
                } else {
                    format!(
                        "function {{:inline true}} BV{width}_{name}(x : int, y : int) : int {{\n  \
                         if x == y then 0 else (if x == 0 then y else (if y == 0 then x \
                         else BV{width}_{name}_UF(x, y)))\n\
                         }}\nfunction BV{width}_{name}_UF(int, int) : int;"
                    )
                }
            }
            BinaryOp::BvShl => format!(
                "function {{:inline true}} BV{width}_{name}(x : int, y : int) : int {{\n  \
                 if x >= 0 && y == 1 then x*2 else BV{width}_{name}_UF(x,y)\n\
                 }}\nfunction BV{width}_{name}_UF(int, int) : int;"
            ),
            BinaryOp::BvAShr | BinaryOp::BvLShr => {
                format!("function BV{width}_{name}(int, int) : int;")
            }
            _ => panic!("not an arithmetic operator: {op:?}"),
        }
    }

    fn bool_binary_decl(&self, name: &str, op: BinaryOp, width: u32) -> String {
        // Signed and unsigned comparisons coincide on mathematical
        // integers.
        let infix = match op {
            BinaryOp::BvUgt | BinaryOp::BvSgt => ">",
            BinaryOp::BvUge | BinaryOp::BvSge => ">=",
            BinaryOp::BvUlt | BinaryOp::BvSlt => "<",
            BinaryOp::BvUle | BinaryOp::BvSle => "<=",
            _ => panic!("not a comparison operator: {op:?}"),
        };
        format!(
            "function {{:inline true}} BV{width}_{name}(x : int, y : int) : bool {{\n  \
             x {infix} y\n}}"
        )
    }

    fn abstracts_extract(&self) -> bool {
        true
    }

    fn extract_expr(&self, expr: &str, upper: u32, lower: u32) -> String {
        format!("BV_EXTRACT({expr}, {upper}, {lower})")
    }

    fn extract_decl(&self) -> String {
        "function BV_EXTRACT(int, int, int) : int;".to_string()
    }

    fn abstracts_concat(&self) -> bool {
        true
    }

    fn concat_expr(&self, lhs: &str, rhs: &str) -> String {
        format!("BV_CONCAT({lhs}, {rhs})")
    }

    fn concat_decl(&self) -> String {
        "function BV_CONCAT(int, int) : int;".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bv_spellings() {
        let r = BvRepresentation;
        assert_eq!(r.type_name(32), "bv32");
        assert_eq!(r.literal_u64(5, 32), "5bv32");
        assert_eq!(
            r.arith_binary_decl("ADD", BinaryOp::BvAdd, 32),
            "function {:bvbuiltin \"bvadd\"} BV32_ADD(bv32, bv32) : bv32"
        );
        assert_eq!(
            r.zero_extend_decl(8, 32),
            "function {:bvbuiltin \"zero_extend 24\"} BV8_ZEXT32(bv8) : bv32"
        );
    }

    #[test]
    fn math_spellings() {
        let r = MathRepresentation;
        assert_eq!(r.type_name(32), "int");
        assert_eq!(r.literal(&BvConst::from_i64(32, -3)), "-3");
        assert!(r.arith_binary_decl("ADD", BinaryOp::BvAdd, 32).contains("x + y"));
        assert!(r.arith_binary_decl("SHL", BinaryOp::BvShl, 32).contains("x*2"));
        assert!(r.arith_binary_decl("AND", BinaryOp::BvAnd, 32).contains("BV32_AND_UF"));
        assert!(r.bool_binary_decl("ULT", BinaryOp::BvUlt, 32).contains("x < y"));
        assert_eq!(r.extract_expr("v0", 8, 0), "BV_EXTRACT(v0, 8, 0)");
    }
}
