use volition_core::{ErrorCategory, ErrorCode, ExpType, Name, VariableLayout};
use volition_expr::ExpressionCompiler;

fn layout() -> VariableLayout {
    let mut layout = VariableLayout::new();
    layout.add(Name::new("NumA"), ExpType::Number);
    layout.add(Name::new("NameC"), ExpType::Name);
    layout
}

fn compile_err(source: &str) -> volition_core::ErrorReport {
    let layout = layout();
    ExpressionCompiler::new(&layout)
        .compile(source)
        .expect_err(source)
}

#[test]
fn syntax_errors() {
    for source in ["", "1 +", "(1 + 2", "1 ? 2", "NumA NumA"] {
        let report = compile_err(source);
        assert!(report.contains_code(ErrorCode::SyntaxError), "{source}");
        assert_eq!(report.first().unwrap().category, ErrorCategory::Syntax);
    }
}

#[test]
fn unknown_identifier() {
    let report = compile_err("Missing == 1");
    assert!(report.contains_code(ErrorCode::IdentifierNotFound));
    assert_eq!(
        report.first().unwrap().message,
        "Variable 'Missing' does not exist"
    );
}

#[test]
fn arithmetic_type_errors() {
    for source in ["1 + true", "NameC * 2", "true % false"] {
        let report = compile_err(source);
        assert!(
            report.contains_code(ErrorCode::ArithmeticTypeError),
            "{source}"
        );
    }
}

#[test]
fn comparison_type_errors() {
    // Mismatched operand types.
    let report = compile_err("NumA == NameC");
    assert!(report.contains_code(ErrorCode::ComparisonTypeError));

    // Ordered comparison on non-numbers.
    for source in ["NameC < NameC", "(NumA > 0) >= (NumA > 1)"] {
        let report = compile_err(source);
        assert!(
            report.contains_code(ErrorCode::ComparisonTypeError),
            "{source}"
        );
    }
}

#[test]
fn logic_type_errors() {
    for source in ["NumA && true", "true || NumA", "!NumA"] {
        let report = compile_err(source);
        assert!(report.contains_code(ErrorCode::LogicTypeError), "{source}");
    }
}

#[test]
fn fold_time_divide_by_zero() {
    for source in ["1 / 0", "NumA + 1 % 0"] {
        let report = compile_err(source);
        assert!(report.contains_code(ErrorCode::DivideByZero), "{source}");
        assert_eq!(report.first().unwrap().category, ErrorCategory::Math);
    }
}

#[test]
fn failure_is_fail_first() {
    // Both sides are broken; only the first failure is reported.
    let report = compile_err("Missing1 + Missing2");
    assert_eq!(report.len(), 1);
    assert_eq!(
        report.first().unwrap().message,
        "Variable 'Missing1' does not exist"
    );
}
