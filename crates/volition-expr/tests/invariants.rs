//! Structural checks over compiled programs: instruction shape, operand
//! bounds and constant-table discipline.

use volition_core::{ExpType, Name, SlotIndex, VariableLayout};
use volition_expr::{decode_opcode, ExpressionCompiler, ExpressionData, OperandSrc};

fn layout() -> VariableLayout {
    let mut layout = VariableLayout::new();
    layout.add(Name::new("NumA"), ExpType::Number);
    layout.add(Name::new("NumB"), ExpType::Number);
    layout.add(Name::new("NameC"), ExpType::Name);
    layout.add(Name::new("NameD"), ExpType::Name);
    layout
}

const PROGRAMS: &[&str] = &[
    "1",
    "true",
    "NumA",
    "NumA / NumB",
    "-12 % -5",
    "NumA + 5 * NumB - 2",
    "NumA > 3 || NumB > 3 && NumA < 0",
    "(NumA == 5) != (NumB > 0)",
    "NameC == 'C' && NameC != NameD",
    "!(NumA >= NumB) || NumA % 2 == 1",
];

fn check_operand(
    src: OperandSrc,
    index: SlotIndex,
    is_name_op: bool,
    program: &ExpressionData,
    layout: &VariableLayout,
) {
    match src {
        OperandSrc::Register => assert!(index < program.reg_count()),
        OperandSrc::Constant => {
            if is_name_op {
                assert!((index as usize) < program.const_names().len());
            } else {
                assert!((index as usize) < program.const_floats().len());
            }
        }
        OperandSrc::Variable => {
            if is_name_op {
                assert!(index < layout.name_count());
            } else {
                assert!(index < layout.number_count());
            }
        }
    }
}

#[test]
fn every_instruction_is_two_words_with_in_range_operands() {
    let layout = layout();
    let compiler = ExpressionCompiler::new(&layout);

    for source in PROGRAMS {
        let program = compiler.compile(source).unwrap();
        assert!(program.bytecode().len() % 2 == 0, "{source}");
        assert!(program.reg_count() >= 1, "{source}");

        for words in program.bytecode().chunks_exact(2) {
            let opcode = (words[0] >> 16) as u16;
            let result_reg = (words[0] & 0xffff) as SlotIndex;
            let left = (words[1] >> 16) as SlotIndex;
            let right = (words[1] & 0xffff) as SlotIndex;

            let (op, left_src, right_src) =
                decode_opcode(opcode).unwrap_or_else(|| panic!("bad opcode in {source}"));
            assert!(result_reg < program.reg_count(), "{source}");

            match op {
                // The value operations read only their left operand; for
                // bools it is a 0/1 literal rather than a table index.
                volition_expr::SimpleOp::BoolVal => assert!(left <= 1, "{source}"),
                volition_expr::SimpleOp::NumVal => {
                    assert!((left as usize) < program.const_floats().len(), "{source}");
                }
                op => {
                    let is_name_op = matches!(
                        op,
                        volition_expr::SimpleOp::NameEq | volition_expr::SimpleOp::NameNeq
                    );
                    check_operand(left_src, left, is_name_op, &program, &layout);
                    check_operand(right_src, right, is_name_op, &program, &layout);
                }
            }
        }
    }
}

#[test]
fn constant_tables_hold_no_duplicates() {
    let layout = layout();
    let compiler = ExpressionCompiler::new(&layout);

    for source in PROGRAMS {
        let program = compiler.compile(source).unwrap();

        let floats = program.const_floats();
        for (i, a) in floats.iter().enumerate() {
            for b in &floats[i + 1..] {
                assert_ne!(a, b, "duplicate float constant in {source}");
            }
        }

        let names = program.const_names();
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b, "duplicate name constant in {source}");
            }
        }
    }
}

#[test]
fn recompiling_yields_identical_programs() {
    let layout = layout();
    let compiler = ExpressionCompiler::new(&layout);
    for source in PROGRAMS {
        assert_eq!(
            compiler.compile(source).unwrap(),
            compiler.compile(source).unwrap(),
            "{source}"
        );
    }
}
