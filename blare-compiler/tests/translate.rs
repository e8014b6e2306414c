// Copyright Blare Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! End-to-end translation scenarios: a source module is built by hand,
//! pushed through the translator, the statement simplifier and the
//! Boogie writer, and the emitted text is inspected.

use std::collections::BTreeSet;

use blare_compiler::{ModuleTranslator, SourceLanguage};
use blare_ir::emitter::{
    BvRepresentation, ModuleWriter, PointerRepresentation, RaceInstrumenter,
};
use blare_ir::simplify_stmt;
use blare_ssa::{
    Block, Callee, Constant, Function, Global, Instruction, Module, Op, Param, Terminator, Type,
    Value,
};

fn i32_ty() -> Type {
    Type::int(32)
}

fn global_i32_ptr() -> Type {
    Type::pointer(i32_ty(), 1)
}

fn param(name: &str, ty: Type) -> Param {
    Param { name: name.to_string(), ty, no_alias: false, source_name: None }
}

fn block(name: &str, insts: Vec<Instruction>, term: Terminator) -> Block {
    Block { name: name.to_string(), phis: vec![], insts, term, term_loc: None }
}

fn inst(result: Option<usize>, op: Op) -> Instruction {
    Instruction { result, op, loc: None }
}

fn translate(module: &Module, lang: SourceLanguage) -> String {
    let mut translator = ModuleTranslator::new(module, lang, BTreeSet::new());
    translator.translate().expect("translation failed");
    let mut bm = translator.take_module();
    simplify_stmt(&mut bm);
    let int_rep = BvRepresentation;
    let writer = ModuleWriter::new(
        &bm,
        &int_rep,
        RaceInstrumenter::Standard,
        PointerRepresentation::Datatype,
    );
    let (text, _) = writer.write_to_string().expect("emission failed");
    text
}

#[test]
fn add1_produces_a_bv32_procedure() {
    let add1 = Function {
        name: "add1".to_string(),
        source_name: None,
        params: vec![param("a", i32_ty())],
        ret: i32_ty(),
        blocks: vec![block(
            "entry",
            vec![inst(
                Some(1),
                Op::Binary {
                    op: blare_ssa::BinOp::Add,
                    ty: i32_ty(),
                    lhs: Value::Local(0),
                    rhs: Value::Constant(Constant::int(32, 1)),
                },
            )],
            Terminator::Ret { value: Some(Value::Local(1)) },
        )],
        is_kernel: false,
    };
    let module = Module { pointer_width: 32, globals: vec![], functions: vec![add1] };
    let text = translate(&module, SourceLanguage::C);

    assert!(text.contains("procedure {:source_name \"add1\"} $add1($a: bv32) returns ($ret: bv32)"));
    assert!(text.contains("$ret := BV32_ADD($a, 1bv32);"));
    assert!(text.contains("  return;"));
    let decl = "function {:bvbuiltin \"bvadd\"} BV32_ADD(bv32, bv32) : bv32;";
    assert_eq!(text.matches(decl).count(), 1);
}

#[test]
fn kernel_pointer_argument_becomes_a_global_array() {
    let kernel = Function {
        name: "k".to_string(),
        source_name: None,
        params: vec![param("arg", global_i32_ptr())],
        ret: Type::Void,
        blocks: vec![block(
            "entry",
            vec![inst(
                None,
                Op::Store {
                    value: Value::Constant(Constant::int(32, 7)),
                    value_ty: i32_ty(),
                    ptr: Value::Local(0),
                },
            )],
            Terminator::Ret { value: None },
        )],
        is_kernel: true,
    };
    let module = Module { pointer_width: 32, globals: vec![], functions: vec![kernel] };
    let text = translate(&module, SourceLanguage::OpenCl);

    assert!(text.contains("{:global} $$arg : [bv32]bv32;"));
    assert_eq!(text.matches("const unique $arrayId$$arg : arrayId;").count(), 1);
    assert!(text.contains("procedure {:source_name \"k\"} {:kernel} $k()"));
    assert!(text.contains("$$arg[0bv32] := 7bv32;"));
    assert!(text.contains("_WRITE_HAS_OCCURRED_$$arg : bool;"));
}

/// A load whose offset is a constant multiple of the element width
/// stays a typed index; no byte splicing appears.
#[test]
fn aligned_load_stays_typed() {
    let kernel = Function {
        name: "k".to_string(),
        source_name: None,
        params: vec![param("p", global_i32_ptr()), param("q", global_i32_ptr())],
        ret: Type::Void,
        blocks: vec![block(
            "entry",
            vec![
                inst(
                    Some(2),
                    Op::Gep {
                        base: Value::Local(0),
                        source_elem: i32_ty(),
                        indices: vec![Value::Constant(Constant::int(32, 1))],
                    },
                ),
                inst(Some(3), Op::Load { ty: i32_ty(), ptr: Value::Local(2) }),
                inst(
                    None,
                    Op::Store {
                        value: Value::Local(3),
                        value_ty: i32_ty(),
                        ptr: Value::Local(1),
                    },
                ),
            ],
            Terminator::Ret { value: None },
        )],
        is_kernel: true,
    };
    let module = Module { pointer_width: 32, globals: vec![], functions: vec![kernel] };
    let text = translate(&module, SourceLanguage::OpenCl);

    assert!(text.contains("$$p : [bv32]bv32;"));
    assert!(text.contains("$$q[0bv32] := $$p[1bv32];"));
}

/// The same load at a byte offset that is not provably divisible by the
/// element width forces the target global onto the byte-array model; the
/// next iteration loads four bytes and concatenates them.
#[test]
fn unaligned_load_triggers_byte_array_model() {
    let kernel = Function {
        name: "k".to_string(),
        source_name: None,
        params: vec![param("p", global_i32_ptr()), param("q", global_i32_ptr())],
        ret: Type::Void,
        blocks: vec![block(
            "entry",
            vec![
                inst(
                    Some(2),
                    Op::Gep {
                        base: Value::Local(0),
                        source_elem: Type::int(8),
                        indices: vec![Value::Constant(Constant::int(32, 1))],
                    },
                ),
                inst(Some(3), Op::Load { ty: i32_ty(), ptr: Value::Local(2) }),
                inst(
                    None,
                    Op::Store {
                        value: Value::Local(3),
                        value_ty: i32_ty(),
                        ptr: Value::Local(1),
                    },
                ),
            ],
            Terminator::Ret { value: None },
        )],
        is_kernel: true,
    };
    let module = Module { pointer_width: 32, globals: vec![], functions: vec![kernel] };
    let text = translate(&module, SourceLanguage::OpenCl);

    // The target array fell back to BV(8) elements...
    assert!(text.contains("$$p : [bv32]bv8;"));
    // ...and the load became a little-endian concatenation of four
    // one-byte loads.
    assert!(text.contains("$$q[0bv32] := $$p[4bv32] ++ $$p[3bv32] ++ $$p[2bv32] ++ $$p[1bv32];"));
}

#[test]
fn assert_and_requires_lower_to_contract_constructs() {
    let assert_decl = Function {
        name: "__assert".to_string(),
        source_name: None,
        params: vec![param("x", i32_ty())],
        ret: Type::Void,
        blocks: vec![],
        is_kernel: false,
    };
    let requires_decl = Function {
        name: "__requires".to_string(),
        source_name: None,
        params: vec![param("x", i32_ty())],
        ret: Type::Void,
        blocks: vec![],
        is_kernel: false,
    };
    let fn_ty = Type::Function { ret: Box::new(Type::Void), params: vec![i32_ty()] };
    let kernel = Function {
        name: "k".to_string(),
        source_name: None,
        params: vec![param("a", i32_ty())],
        ret: Type::Void,
        blocks: vec![block(
            "entry",
            vec![
                inst(
                    None,
                    Op::Call {
                        callee: Callee::Direct(1),
                        fn_ty: fn_ty.clone(),
                        args: vec![Value::Local(0)],
                    },
                ),
                inst(
                    None,
                    Op::Call {
                        callee: Callee::Direct(0),
                        fn_ty,
                        args: vec![Value::Local(0)],
                    },
                ),
            ],
            Terminator::Ret { value: None },
        )],
        is_kernel: true,
    };
    let module = Module {
        pointer_width: 32,
        globals: vec![],
        functions: vec![assert_decl, requires_decl, kernel],
    };
    let text = translate(&module, SourceLanguage::OpenCl);

    assert!(text.contains("  requires $a != 0bv32;"));
    assert!(text.contains("  assert $a != 0bv32;"));
    // The reserved-name functions themselves are consumed, not emitted.
    assert!(!text.contains("$__assert"));
    assert!(!text.contains("$__requires"));
}

#[test]
fn indirect_call_dispatches_over_candidate_targets() {
    let identity = |name: &str| Function {
        name: name.to_string(),
        source_name: None,
        params: vec![param("x", i32_ty())],
        ret: i32_ty(),
        blocks: vec![block(
            "entry",
            vec![],
            Terminator::Ret { value: Some(Value::Local(0)) },
        )],
        is_kernel: false,
    };
    let fn_ty = Type::Function { ret: Box::new(i32_ty()), params: vec![i32_ty()] };
    let caller = Function {
        name: "h".to_string(),
        source_name: None,
        params: vec![param("fp", Type::pointer(fn_ty.clone(), 0))],
        ret: i32_ty(),
        blocks: vec![block(
            "entry",
            vec![inst(
                Some(1),
                Op::Call {
                    callee: Callee::Indirect(Value::Local(0)),
                    fn_ty,
                    args: vec![Value::Constant(Constant::int(32, 5))],
                },
            )],
            Terminator::Ret { value: Some(Value::Local(1)) },
        )],
        is_kernel: false,
    };
    let module = Module {
        pointer_width: 32,
        globals: vec![],
        functions: vec![identity("f"), identity("g"), caller],
    };
    let text = translate(&module, SourceLanguage::C);

    assert!(text.contains("if ($fp == $functionId$$f) {"));
    assert!(text.contains("call v0 := $f(5bv32);"));
    assert!(text.contains("} else if ($fp == $functionId$$g) {"));
    assert!(text.contains("call v0 := $g(5bv32);"));
    assert!(text.contains("assert false;"));
    assert!(text.contains("const unique $functionId$$f : functionPtr;"));
    assert!(text.contains("const unique $functionId$$null$ : functionPtr;"));
}

/// A helper's pointer parameter that every caller feeds from the same
/// known global is modelled as a plain element offset: the parameter
/// becomes a bare bit-vector, and the helper's accesses index the global
/// directly instead of case-splitting over every array.
#[test]
fn call_site_parameter_is_modelled_as_global_offset() {
    let helper = Function {
        name: "h".to_string(),
        source_name: None,
        params: vec![param("p", Type::pointer(i32_ty(), 1))],
        ret: Type::Void,
        blocks: vec![block(
            "entry",
            vec![
                inst(Some(1), Op::Load { ty: i32_ty(), ptr: Value::Local(0) }),
                inst(
                    None,
                    Op::Store {
                        value: Value::Local(1),
                        value_ty: i32_ty(),
                        ptr: Value::Local(0),
                    },
                ),
            ],
            Terminator::Ret { value: None },
        )],
        is_kernel: false,
    };
    let kernel = Function {
        name: "k".to_string(),
        source_name: None,
        params: vec![],
        ret: Type::Void,
        blocks: vec![block(
            "entry",
            vec![inst(
                None,
                Op::Call {
                    callee: Callee::Direct(0),
                    fn_ty: Type::Function {
                        ret: Box::new(Type::Void),
                        params: vec![Type::pointer(i32_ty(), 1)],
                    },
                    args: vec![Value::Constant(Constant::Global(0))],
                },
            )],
            Terminator::Ret { value: None },
        )],
        is_kernel: true,
    };
    let module = Module {
        pointer_width: 32,
        globals: vec![Global {
            name: "g".to_string(),
            value_type: i32_ty(),
            address_space: 1,
            init: None,
            source_name: None,
        }],
        functions: vec![helper, kernel],
    };
    let text = translate(&module, SourceLanguage::OpenCl);

    // The helper's parameter surfaced as a bare offset...
    assert!(text.contains("procedure {:source_name \"h\"} $h($p: bv32)"));
    // ...its accesses index the known global with it...
    assert!(text.contains("$$g[$p]"));
    // ...and the call site passes the element offset of g's base.
    assert!(text.contains("call $h(0bv32);"));
    // The global kept its typed element representation.
    assert!(text.contains("$$g : [bv32]bv32;"));
}

/// An address that cannot be narrowed to a known array set escalates to
/// modelling every global as a byte array, and translation still
/// converges.
#[test]
fn unknown_array_set_escalates_to_byte_arrays_everywhere() {
    let kernel = Function {
        name: "k".to_string(),
        source_name: None,
        params: vec![param("x", i32_ty()), param("out", global_i32_ptr())],
        ret: Type::Void,
        blocks: vec![block(
            "entry",
            vec![
                inst(
                    Some(2),
                    Op::Cast {
                        kind: blare_ssa::CastKind::IntToPtr,
                        ty: Type::pointer(i32_ty(), 0),
                        op_ty: i32_ty(),
                        value: Value::Local(0),
                    },
                ),
                inst(Some(3), Op::Load { ty: i32_ty(), ptr: Value::Local(2) }),
                inst(
                    None,
                    Op::Store {
                        value: Value::Local(3),
                        value_ty: i32_ty(),
                        ptr: Value::Local(1),
                    },
                ),
            ],
            Terminator::Ret { value: None },
        )],
        is_kernel: true,
    };
    let module = Module { pointer_width: 32, globals: vec![], functions: vec![kernel] };
    let text = translate(&module, SourceLanguage::OpenCl);

    // Everything fell back to byte granularity.
    assert!(text.contains("$$out : [bv32]bv8;"));
}

/// Fixed-point termination: an arbitrary pattern of byte-array demands
/// across many globals still converges well within the iteration bound.
#[test]
fn refinement_terminates_with_many_demands() {
    let mut params = Vec::new();
    let mut insts = Vec::new();
    let mut local = 8;
    for i in 0..8 {
        params.push(param(&format!("p{i}"), global_i32_ptr()));
        // Odd parameters are accessed at a misaligned offset.
        if i % 2 == 1 {
            insts.push(inst(
                Some(local),
                Op::Gep {
                    base: Value::Local(i),
                    source_elem: Type::int(8),
                    indices: vec![Value::Constant(Constant::int(32, 3))],
                },
            ));
            insts.push(inst(
                Some(local + 1),
                Op::Load { ty: i32_ty(), ptr: Value::Local(local) },
            ));
        } else {
            insts.push(inst(
                Some(local + 1),
                Op::Load { ty: i32_ty(), ptr: Value::Local(i) },
            ));
        }
        local += 2;
    }
    let kernel = Function {
        name: "k".to_string(),
        source_name: None,
        params,
        ret: Type::Void,
        blocks: vec![block("entry", insts, Terminator::Ret { value: None })],
        is_kernel: true,
    };
    let module = Module { pointer_width: 32, globals: vec![], functions: vec![kernel] };
    let text = translate(&module, SourceLanguage::OpenCl);

    for i in 0..8 {
        if i % 2 == 1 {
            assert!(text.contains(&format!("$$p{i} : [bv32]bv8;")));
        } else {
            assert!(text.contains(&format!("$$p{i} : [bv32]bv32;")));
        }
    }
}

/// Global initialisers become per-element requires clauses on every
/// entry point, in increasing element order.
#[test]
fn global_initialisers_become_entry_requires() {
    let kernel = Function {
        name: "k".to_string(),
        source_name: None,
        params: vec![],
        ret: Type::Void,
        blocks: vec![block(
            "entry",
            vec![inst(
                Some(0),
                Op::Load {
                    ty: i32_ty(),
                    ptr: Value::Constant(Constant::Expr(Box::new(blare_ssa::ConstExpr::Gep {
                        base: Constant::Global(0),
                        source_elem: Type::array(i32_ty(), 2),
                        indices: vec![Constant::int(32, 0), Constant::int(32, 1)],
                        ty: Type::pointer(i32_ty(), 0),
                    }))),
                },
            )],
            Terminator::Ret { value: None },
        )],
        is_kernel: true,
    };
    let module = Module {
        pointer_width: 32,
        globals: vec![Global {
            name: "c".to_string(),
            value_type: Type::array(i32_ty(), 2),
            address_space: 0,
            init: Some(Constant::Array {
                elem: i32_ty(),
                elems: vec![Constant::int(32, 11), Constant::int(32, 22)],
            }),
            source_name: None,
        }],
        functions: vec![kernel],
    };
    let text = translate(&module, SourceLanguage::C);

    let first = text.find("requires $$c[0bv32] == 11bv32;").expect("first init");
    let second = text.find("requires $$c[1bv32] == 22bv32;").expect("second init");
    assert!(first < second);
}

/// The axiom-function convention: the return value of `__axiom*`
/// becomes a module-level axiom.
#[test]
fn axiom_functions_become_axioms() {
    let get_local_size = Function {
        name: "get_local_size".to_string(),
        source_name: None,
        params: vec![param("dim", i32_ty())],
        ret: i32_ty(),
        blocks: vec![],
        is_kernel: false,
    };
    let axiom = Function {
        name: "__axiom_group_size_x".to_string(),
        source_name: None,
        params: vec![],
        ret: Type::int(1),
        blocks: vec![block(
            "entry",
            vec![
                inst(
                    Some(0),
                    Op::Call {
                        callee: Callee::Direct(0),
                        fn_ty: Type::Function {
                            ret: Box::new(i32_ty()),
                            params: vec![i32_ty()],
                        },
                        args: vec![Value::Constant(Constant::int(32, 0))],
                    },
                ),
                inst(
                    Some(1),
                    Op::ICmp {
                        pred: blare_ssa::IntPredicate::Eq,
                        ty: Type::int(1),
                        op_ty: i32_ty(),
                        lhs: Value::Local(0),
                        rhs: Value::Constant(Constant::int(32, 64)),
                    },
                ),
            ],
            Terminator::Ret { value: Some(Value::Local(1)) },
        )],
        is_kernel: false,
    };
    let kernel = Function {
        name: "k".to_string(),
        source_name: None,
        params: vec![],
        ret: Type::Void,
        blocks: vec![block("entry", vec![], Terminator::Ret { value: None })],
        is_kernel: true,
    };
    let module = Module {
        pointer_width: 32,
        globals: vec![],
        functions: vec![get_local_size, axiom, kernel],
    };
    let text = translate(&module, SourceLanguage::OpenCl);

    assert!(text.contains("axiom "));
    assert!(text.contains("group_size_x == 64bv32"));
    assert!(text.contains("const group_size_x : bv32;"));
    assert!(!text.contains("$__axiom_group_size_x"));
}
