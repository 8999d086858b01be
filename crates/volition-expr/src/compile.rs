//! Expression compiler.
//!
//! Compilation runs, in order: parse, type-check, constant-fold, constant
//! gathering, register allocation, code generation. The first failing pass
//! aborts with its diagnostics; a successful compile yields an immutable
//! [`ExpressionData`].

use volition_core::{
    ErrorCategory, ErrorCode, ErrorReport, ExpType, Name, SlotIndex, VariableLayout,
};

use crate::ast::{ArithOp, CompOp, Expr, LogicOp};
use crate::bytecode::{encode_opcode, is_valid_encoding, ExpressionData, OperandSrc, SimpleOp};
use crate::parser;
use crate::vm::ieee_rem;

pub struct ExpressionCompiler<'a> {
    layout: &'a VariableLayout,
}

impl<'a> ExpressionCompiler<'a> {
    pub fn new(layout: &'a VariableLayout) -> Self {
        Self { layout }
    }

    pub fn compile(&self, source: &str) -> Result<ExpressionData, ErrorReport> {
        let mut report = ErrorReport::new();

        let mut expr = match parser::parse(source) {
            Ok(expr) => expr,
            Err(diagnostic) => {
                report.push_diagnostic(diagnostic);
                return Err(report);
            }
        };

        if type_check(&mut expr, self.layout, &mut report).is_err() {
            return Err(report);
        }

        let mut expr = match const_fold(expr, &mut report) {
            Ok(expr) => expr,
            Err(()) => return Err(report),
        };

        // A bare Number variable has no instruction of its own; lower it to
        // an addition with zero.
        if matches!(expr, Expr::Ident { .. }) && expr.expr_type() == ExpType::Number {
            expr = Expr::arith(ArithOp::Add, Expr::number(0.0), expr);
        }

        let result_type = expr.expr_type();
        if result_type == ExpType::Name {
            report.push(
                ErrorCategory::Const,
                ErrorCode::ConstNameExpression,
                "Expressions that evaluate to a Name type are not supported",
            );
            return Err(report);
        }

        let mut writer = ExpressionWriter::default();
        gather_consts(&mut expr, &mut writer);

        let mut max_reg: SlotIndex = 0;
        allocate_registers(&mut expr, 0, &mut max_reg);

        match &expr {
            Expr::ConstBool { value } => {
                // There is no bool constant table; the value rides in the
                // operand itself.
                writer.emit(
                    SimpleOp::BoolVal,
                    OperandSrc::Constant,
                    OperandSrc::Constant,
                    0,
                    u16::from(*value),
                    0,
                );
            }
            Expr::ConstNumber { const_slot, .. } => {
                writer.emit(
                    SimpleOp::NumVal,
                    OperandSrc::Constant,
                    OperandSrc::Constant,
                    0,
                    *const_slot,
                    0,
                );
            }
            _ => generate(&expr, &mut writer),
        }

        let data = writer.finish(result_type, max_reg + 1);
        tracing::debug!("compiled `{source}`:\n{}", data.disassemble());
        Ok(data)
    }
}

fn type_check(
    expr: &mut Expr,
    layout: &VariableLayout,
    report: &mut ErrorReport,
) -> Result<ExpType, ()> {
    match expr {
        Expr::ConstNumber { .. } => Ok(ExpType::Number),
        Expr::ConstName { .. } => Ok(ExpType::Name),
        Expr::ConstBool { .. } => Ok(ExpType::Bool),

        Expr::Ident { name, ty, slot } => match layout.get(*name) {
            Some((var_ty, var_slot)) => {
                *ty = Some(var_ty);
                *slot = var_slot;
                Ok(var_ty)
            }
            None => {
                report.push(
                    ErrorCategory::Identifier,
                    ErrorCode::IdentifierNotFound,
                    format!("Variable '{name}' does not exist"),
                );
                Err(())
            }
        },

        Expr::Not { child, .. } => {
            if type_check(child, layout, report)? != ExpType::Bool {
                report.push(
                    ErrorCategory::TypeCheck,
                    ErrorCode::LogicTypeError,
                    "Right side of ! must be boolean",
                );
                return Err(());
            }
            Ok(ExpType::Bool)
        }

        Expr::Logic {
            op, left, right, ..
        } => {
            let left_ty = type_check(left, layout, report)?;
            let right_ty = type_check(right, layout, report)?;
            if left_ty != ExpType::Bool || right_ty != ExpType::Bool {
                report.push(
                    ErrorCategory::TypeCheck,
                    ErrorCode::LogicTypeError,
                    format!("Both sides of {op} must be boolean"),
                );
                return Err(());
            }
            Ok(ExpType::Bool)
        }

        Expr::Comp {
            op, left, right, ..
        } => {
            let left_ty = type_check(left, layout, report)?;
            let right_ty = type_check(right, layout, report)?;
            if left_ty != right_ty {
                report.push(
                    ErrorCategory::TypeCheck,
                    ErrorCode::ComparisonTypeError,
                    format!("Both sides of {op} must be the same type"),
                );
                return Err(());
            }
            if left_ty != ExpType::Number && op.is_ordered() {
                report.push(
                    ErrorCategory::TypeCheck,
                    ErrorCode::ComparisonTypeError,
                    format!("Operator {op} is invalid with {left_ty} operands"),
                );
                return Err(());
            }
            Ok(ExpType::Bool)
        }

        Expr::Arith {
            op, left, right, ..
        } => {
            let left_ty = type_check(left, layout, report)?;
            let right_ty = type_check(right, layout, report)?;
            if left_ty != ExpType::Number || right_ty != ExpType::Number {
                report.push(
                    ErrorCategory::TypeCheck,
                    ErrorCode::ArithmeticTypeError,
                    format!("Both sides of {op} must be numeric"),
                );
                return Err(());
            }
            Ok(ExpType::Number)
        }
    }
}

fn const_bool(expr: &Expr) -> Option<bool> {
    match expr {
        Expr::ConstBool { value } => Some(*value),
        _ => None,
    }
}

fn const_number(expr: &Expr) -> Option<f32> {
    match expr {
        Expr::ConstNumber { value, .. } => Some(*value),
        _ => None,
    }
}

/// Post-order fold. Replaced subtrees are dropped on the spot; ownership
/// makes the parent-pointer rewrite of the walk a plain return value.
fn const_fold(expr: Expr, report: &mut ErrorReport) -> Result<Expr, ()> {
    Ok(match expr {
        leaf @ (Expr::ConstNumber { .. }
        | Expr::ConstName { .. }
        | Expr::ConstBool { .. }
        | Expr::Ident { .. }) => leaf,

        Expr::Not { child, reg } => {
            let child = const_fold(*child, report)?;
            match child {
                Expr::ConstBool { value } => Expr::boolean(!value),
                other => Expr::Not {
                    child: Box::new(other),
                    reg,
                },
            }
        }

        Expr::Logic {
            op,
            left,
            right,
            reg,
        } => {
            let left = const_fold(*left, report)?;
            let right = const_fold(*right, report)?;
            fold_logic(op, left, right, reg)
        }

        Expr::Comp {
            op,
            left,
            right,
            reg,
        } => {
            let left = const_fold(*left, report)?;
            let right = const_fold(*right, report)?;
            fold_comp(op, left, right, reg)
        }

        Expr::Arith {
            op,
            left,
            right,
            reg,
        } => {
            let left = const_fold(*left, report)?;
            let right = const_fold(*right, report)?;
            fold_arith(op, left, right, reg, report)?
        }
    })
}

fn fold_logic(op: LogicOp, left: Expr, right: Expr, reg: SlotIndex) -> Expr {
    let left_val = const_bool(&left);
    let right_val = const_bool(&right);

    match op {
        LogicOp::And => match (left_val, right_val) {
            (Some(false), _) | (_, Some(false)) => Expr::boolean(false),
            (Some(true), _) => right,
            (_, Some(true)) => left,
            (None, None) => Expr::Logic {
                op,
                left: Box::new(left),
                right: Box::new(right),
                reg,
            },
        },
        LogicOp::Or => match (left_val, right_val) {
            (Some(true), _) | (_, Some(true)) => Expr::boolean(true),
            (Some(false), _) => right,
            (_, Some(false)) => left,
            (None, None) => Expr::Logic {
                op,
                left: Box::new(left),
                right: Box::new(right),
                reg,
            },
        },
    }
}

fn fold_comp(op: CompOp, left: Expr, right: Expr, reg: SlotIndex) -> Expr {
    if left.is_constant() && right.is_constant() {
        let value = match (&left, &right) {
            (Expr::ConstBool { value: l }, Expr::ConstBool { value: r }) => match op {
                CompOp::Eq => l == r,
                CompOp::Neq => l != r,
                _ => unreachable!("ordered comparison on bools survived type-check"),
            },
            (Expr::ConstName { value: l, .. }, Expr::ConstName { value: r, .. }) => match op {
                CompOp::Eq => l == r,
                CompOp::Neq => l != r,
                _ => unreachable!("ordered comparison on names survived type-check"),
            },
            (Expr::ConstNumber { value: l, .. }, Expr::ConstNumber { value: r, .. }) => match op {
                CompOp::Eq => l == r,
                CompOp::Neq => l != r,
                CompOp::Lt => l < r,
                CompOp::Lteq => l <= r,
                CompOp::Gt => l > r,
                CompOp::Gteq => l >= r,
            },
            _ => unreachable!("mixed comparison operand types survived type-check"),
        };
        return Expr::boolean(value);
    }

    // Bool equality with one constant side folds to the other side (or its
    // negation); the instruction set only compares bool registers.
    if left.expr_type() == ExpType::Bool {
        if let Some(value) = const_bool(&left) {
            return fold_bool_comp(op, value, right);
        }
        if let Some(value) = const_bool(&right) {
            return fold_bool_comp(op, value, left);
        }
    }

    Expr::Comp {
        op,
        left: Box::new(left),
        right: Box::new(right),
        reg,
    }
}

fn fold_bool_comp(op: CompOp, constant: bool, other: Expr) -> Expr {
    let keep = match op {
        CompOp::Eq => constant,
        CompOp::Neq => !constant,
        _ => unreachable!("ordered comparison on bools survived type-check"),
    };
    if keep {
        other
    } else {
        Expr::not(other)
    }
}

fn fold_arith(
    op: ArithOp,
    left: Expr,
    right: Expr,
    reg: SlotIndex,
    report: &mut ErrorReport,
) -> Result<Expr, ()> {
    let (Some(l), Some(r)) = (const_number(&left), const_number(&right)) else {
        return Ok(Expr::Arith {
            op,
            left: Box::new(left),
            right: Box::new(right),
            reg,
        });
    };

    let value = match op {
        ArithOp::Add => l + r,
        ArithOp::Sub => l - r,
        ArithOp::Mul => l * r,
        ArithOp::Div => {
            if r == 0.0 {
                report.push(
                    ErrorCategory::Math,
                    ErrorCode::DivideByZero,
                    format!("Divide by zero detected: {l}/{r}"),
                );
                return Err(());
            }
            l / r
        }
        ArithOp::Mod => {
            if r == 0.0 {
                report.push(
                    ErrorCategory::Math,
                    ErrorCode::DivideByZero,
                    format!("Divide by zero detected: {l}%{r}"),
                );
                return Err(());
            }
            ieee_rem(l, r)
        }
    };

    Ok(Expr::number(value))
}

fn gather_consts(expr: &mut Expr, writer: &mut ExpressionWriter) {
    match expr {
        Expr::ConstNumber { value, const_slot } => *const_slot = writer.add_float(*value),
        Expr::ConstName { value, const_slot } => *const_slot = writer.add_name(*value),
        Expr::ConstBool { .. } | Expr::Ident { .. } => {}
        Expr::Not { child, .. } => gather_consts(child, writer),
        Expr::Logic { left, right, .. }
        | Expr::Comp { left, right, .. }
        | Expr::Arith { left, right, .. } => {
            gather_consts(left, writer);
            gather_consts(right, writer);
        }
    }
}

/// Registers are assigned top-down: a node keeps its own register for the
/// left child and hands the right child the next one. Evaluation is strictly
/// post-order and a register is only consumed by its parent, so reuse is
/// safe.
fn allocate_registers(expr: &mut Expr, use_reg: SlotIndex, max_reg: &mut SlotIndex) {
    match expr {
        Expr::ConstNumber { .. }
        | Expr::ConstName { .. }
        | Expr::ConstBool { .. }
        | Expr::Ident { .. } => {}

        Expr::Not { child, reg } => {
            *reg = use_reg;
            *max_reg = (*max_reg).max(use_reg);
            allocate_registers(child, use_reg, max_reg);
        }

        Expr::Logic {
            left, right, reg, ..
        }
        | Expr::Comp {
            left, right, reg, ..
        }
        | Expr::Arith {
            left, right, reg, ..
        } => {
            *reg = use_reg;
            *max_reg = (*max_reg).max(use_reg);
            allocate_registers(left, use_reg, max_reg);
            allocate_registers(right, use_reg + 1, max_reg);
        }
    }
}

fn result_info(expr: &Expr) -> (OperandSrc, SlotIndex) {
    match expr {
        Expr::ConstNumber { const_slot, .. } | Expr::ConstName { const_slot, .. } => {
            (OperandSrc::Constant, *const_slot)
        }
        Expr::ConstBool { .. } => (OperandSrc::Constant, 0),
        Expr::Ident { slot, .. } => (OperandSrc::Variable, *slot),
        Expr::Not { reg, .. }
        | Expr::Logic { reg, .. }
        | Expr::Comp { reg, .. }
        | Expr::Arith { reg, .. } => (OperandSrc::Register, *reg),
    }
}

/// Post-order emission. Children first, then one instruction specialised by
/// the children's operand sources, canonicalised to the encodings the
/// instruction set defines.
fn generate(expr: &Expr, writer: &mut ExpressionWriter) {
    match expr {
        Expr::ConstNumber { .. }
        | Expr::ConstName { .. }
        | Expr::ConstBool { .. }
        | Expr::Ident { .. } => {}

        Expr::Not { child, reg } => {
            generate(child, writer);
            let (src, index) = result_info(child);
            // The right operand is unused; mirror the left.
            writer.emit(SimpleOp::Not, src, src, *reg, index, index);
        }

        Expr::Logic {
            op,
            left,
            right,
            reg,
        } => {
            generate(left, writer);
            generate(right, writer);
            let (left_src, left_index) = result_info(left);
            let (right_src, right_index) = result_info(right);
            let simple = match op {
                LogicOp::And => SimpleOp::And,
                LogicOp::Or => SimpleOp::Or,
            };
            writer.emit(simple, left_src, right_src, *reg, left_index, right_index);
        }

        Expr::Comp {
            op,
            left,
            right,
            reg,
        } => {
            generate(left, writer);
            generate(right, writer);
            let mut lhs = result_info(left);
            let mut rhs = result_info(right);

            let simple = match left.expr_type() {
                ExpType::Number => {
                    let mut op = *op;
                    if (lhs.0 == OperandSrc::Register && rhs.0 != OperandSrc::Register)
                        || (lhs.0 == OperandSrc::Constant && rhs.0 == OperandSrc::Variable)
                    {
                        std::mem::swap(&mut lhs, &mut rhs);
                        op = op.mirrored();
                    }
                    match op {
                        CompOp::Eq => SimpleOp::NumEq,
                        CompOp::Neq => SimpleOp::NumNeq,
                        CompOp::Lt => SimpleOp::NumLt,
                        CompOp::Lteq => SimpleOp::NumLteq,
                        CompOp::Gt => SimpleOp::NumGt,
                        CompOp::Gteq => SimpleOp::NumGteq,
                    }
                }
                ExpType::Name => {
                    // Name constants only pair with variables on the right.
                    if rhs.0 == OperandSrc::Constant {
                        std::mem::swap(&mut lhs, &mut rhs);
                    }
                    match op {
                        CompOp::Eq => SimpleOp::NameEq,
                        CompOp::Neq => SimpleOp::NameNeq,
                        _ => unreachable!("ordered comparison on names survived type-check"),
                    }
                }
                ExpType::Bool => match op {
                    CompOp::Eq => SimpleOp::BoolEq,
                    CompOp::Neq => SimpleOp::Xor,
                    _ => unreachable!("ordered comparison on bools survived type-check"),
                },
            };

            writer.emit(simple, lhs.0, rhs.0, *reg, lhs.1, rhs.1);
        }

        Expr::Arith {
            op,
            left,
            right,
            reg,
        } => {
            generate(left, writer);
            generate(right, writer);
            let mut lhs = result_info(left);
            let mut rhs = result_info(right);

            // Commutative ops swap operands to reach a canonical encoding.
            if matches!(op, ArithOp::Add | ArithOp::Mul)
                && ((lhs.0 == OperandSrc::Register && rhs.0 != OperandSrc::Register)
                    || (lhs.0 == OperandSrc::Variable && rhs.0 == OperandSrc::Constant))
            {
                std::mem::swap(&mut lhs, &mut rhs);
            }

            let simple = match op {
                ArithOp::Add => SimpleOp::Add,
                ArithOp::Sub => SimpleOp::Sub,
                ArithOp::Mul => SimpleOp::Mul,
                ArithOp::Div => SimpleOp::Div,
                ArithOp::Mod => SimpleOp::Mod,
            };

            writer.emit(simple, lhs.0, rhs.0, *reg, lhs.1, rhs.1);
        }
    }
}

#[derive(Default)]
struct ExpressionWriter {
    bytecode: Vec<u32>,
    const_floats: Vec<f32>,
    const_names: Vec<Name>,
}

impl ExpressionWriter {
    fn add_float(&mut self, value: f32) -> SlotIndex {
        if let Some(index) = self.const_floats.iter().position(|&v| v == value) {
            return index as SlotIndex;
        }
        self.const_floats.push(value);
        (self.const_floats.len() - 1) as SlotIndex
    }

    fn add_name(&mut self, value: Name) -> SlotIndex {
        if let Some(index) = self.const_names.iter().position(|&v| v == value) {
            return index as SlotIndex;
        }
        self.const_names.push(value);
        (self.const_names.len() - 1) as SlotIndex
    }

    fn emit(
        &mut self,
        op: SimpleOp,
        left_src: OperandSrc,
        right_src: OperandSrc,
        result_reg: SlotIndex,
        left: SlotIndex,
        right: SlotIndex,
    ) {
        debug_assert!(
            is_valid_encoding(op, left_src, right_src),
            "undefined encoding {op:?} {left_src:?}/{right_src:?}"
        );
        let opcode = encode_opcode(op, left_src, right_src);
        self.bytecode
            .push((u32::from(opcode) << 16) | u32::from(result_reg));
        self.bytecode.push((u32::from(left) << 16) | u32::from(right));
    }

    fn finish(self, result_type: ExpType, reg_count: SlotIndex) -> ExpressionData {
        ExpressionData::new(
            result_type,
            reg_count,
            self.bytecode,
            self.const_floats,
            self.const_names,
        )
    }
}
