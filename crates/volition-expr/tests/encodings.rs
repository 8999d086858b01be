//! Pins the operand-source encodings the compiler produces. The set of
//! defined combinations per op is part of the instruction set, and the
//! canonicalising swaps must land every program inside it.

use volition_core::{ExpType, Name, VariableLayout};
use volition_expr::{decode_opcode, ExpressionCompiler, OperandSrc, SimpleOp};

use OperandSrc::{Constant as C, Register as R, Variable as V};

fn layout() -> VariableLayout {
    let mut layout = VariableLayout::new();
    layout.add(Name::new("NumA"), ExpType::Number);
    layout.add(Name::new("NumB"), ExpType::Number);
    layout.add(Name::new("NameC"), ExpType::Name);
    layout.add(Name::new("NameD"), ExpType::Name);
    layout
}

/// Compile `source` and decode its final (root) instruction.
fn root_encoding(source: &str) -> (SimpleOp, OperandSrc, OperandSrc) {
    let layout = layout();
    let program = ExpressionCompiler::new(&layout)
        .compile(source)
        .unwrap_or_else(|report| panic!("`{source}` failed to compile: {report}"));
    let words = program.bytecode().chunks_exact(2).last().unwrap();
    decode_opcode((words[0] >> 16) as u16)
        .unwrap_or_else(|| panic!("`{source}` produced an undecodable root opcode"))
}

#[test]
fn addition_canonicalises_to_five_encodings() {
    let cases = [
        ("(NumA + 1) + (NumB + 1)", (R, R)),
        ("5 + (NumA + 1)", (C, R)),
        ("NumA + (NumB + 1)", (V, R)),
        ("NumA + NumB", (V, V)),
        ("5 + NumA", (C, V)),
        // Swapped operands reach the same canonical forms.
        ("(NumA + 1) + 5", (C, R)),
        ("(NumA + 1) + NumB", (V, R)),
        ("NumA + 5", (C, V)),
    ];
    for (source, operands) in cases {
        assert_eq!(root_encoding(source), (SimpleOp::Add, operands.0, operands.1), "{source}");
    }
}

#[test]
fn multiplication_mirrors_addition() {
    assert_eq!(root_encoding("NumA * 5"), (SimpleOp::Mul, C, V));
    assert_eq!(root_encoding("(NumA + 1) * NumB"), (SimpleOp::Mul, V, R));
}

#[test]
fn subtraction_keeps_all_eight_encodings() {
    let cases = [
        ("(NumA + 1) - (NumB + 1)", (R, R)),
        ("5 - (NumA + 1)", (C, R)),
        ("NumA - (NumB + 1)", (V, R)),
        ("(NumA + 1) - 5", (R, C)),
        ("(NumA + 1) - NumB", (R, V)),
        ("5 - NumA", (C, V)),
        ("NumA - 5", (V, C)),
        ("NumA - NumB", (V, V)),
    ];
    for (source, operands) in cases {
        assert_eq!(root_encoding(source), (SimpleOp::Sub, operands.0, operands.1), "{source}");
    }
}

#[test]
fn division_and_modulo_are_never_swapped() {
    assert_eq!(root_encoding("NumA / 5"), (SimpleOp::Div, V, C));
    assert_eq!(root_encoding("5 / NumA"), (SimpleOp::Div, C, V));
    assert_eq!(root_encoding("NumA % 5"), (SimpleOp::Mod, V, C));
    assert_eq!(root_encoding("5 % NumA"), (SimpleOp::Mod, C, V));
}

#[test]
fn ordered_comparisons_swap_and_invert() {
    let cases = [
        ("NumA < 5", (SimpleOp::NumLt, V, C)),
        ("5 > NumA", (SimpleOp::NumLt, V, C)),
        ("5 < NumA", (SimpleOp::NumGt, V, C)),
        ("NumA < (NumB + 1)", (SimpleOp::NumLt, V, R)),
        ("(NumA + 1) < 5", (SimpleOp::NumGt, C, R)),
        ("NumA <= NumB", (SimpleOp::NumLteq, V, V)),
        ("5 >= NumA", (SimpleOp::NumLteq, V, C)),
    ];
    for (source, expected) in cases {
        assert_eq!(root_encoding(source), expected, "{source}");
    }
}

#[test]
fn numeric_equality_swaps_without_inverting() {
    assert_eq!(root_encoding("NumA == 5"), (SimpleOp::NumEq, V, C));
    assert_eq!(root_encoding("5 == NumA"), (SimpleOp::NumEq, V, C));
    assert_eq!(root_encoding("NumA != NumB"), (SimpleOp::NumNeq, V, V));
}

#[test]
fn name_comparisons_keep_constants_on_the_left() {
    assert_eq!(root_encoding("NameC == 'C'"), (SimpleOp::NameEq, C, V));
    assert_eq!(root_encoding("'C' == NameC"), (SimpleOp::NameEq, C, V));
    assert_eq!(root_encoding("NameC == NameD"), (SimpleOp::NameEq, V, V));
    assert_eq!(root_encoding("NameC != 'C'"), (SimpleOp::NameNeq, C, V));
}

#[test]
fn bool_operations_work_on_registers_only() {
    let cases = [
        ("(NumA > 1) == (NumB > 1)", SimpleOp::BoolEq),
        ("(NumA > 1) != (NumB > 1)", SimpleOp::Xor),
        ("(NumA > 1) && (NumB > 1)", SimpleOp::And),
        ("(NumA > 1) || (NumB > 1)", SimpleOp::Or),
        ("!(NumA > 1)", SimpleOp::Not),
    ];
    for (source, op) in cases {
        assert_eq!(root_encoding(source), (op, R, R), "{source}");
    }
}

#[test]
fn constant_roots_use_the_value_ops() {
    assert_eq!(root_encoding("5"), (SimpleOp::NumVal, C, C));
    assert_eq!(root_encoding("2 + 3"), (SimpleOp::NumVal, C, C));
    assert_eq!(root_encoding("true"), (SimpleOp::BoolVal, C, C));
    assert_eq!(root_encoding("1 < 2"), (SimpleOp::BoolVal, C, C));
}
