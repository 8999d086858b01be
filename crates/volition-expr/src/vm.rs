//! Register VM for compiled expressions.
//!
//! The evaluator walks the bytecode two words at a time, decodes each opcode
//! to `(op, left_source, right_source)` and fetches operands from the
//! register file, the program's constant tables or the variable pack. Bool
//! values are 0.0/1.0 in registers; the final result is register 0.

use thiserror::Error;
use volition_core::{
    Diagnostic, ErrorCategory, ErrorCode, ExpType, Name, SlotIndex, VariablePack,
};

use crate::bytecode::{decode_opcode, is_valid_encoding, ExpressionData, OperandSrc, SimpleOp};

/// IEEE 754 remainder: the quotient is rounded to the nearest integer, ties
/// to even. This is the `%` the language defines, at fold time and at
/// runtime, so `-12 % -5 == -2`.
pub(crate) fn ieee_rem(a: f32, b: f32) -> f32 {
    let quotient = (f64::from(a) / f64::from(b)).round_ties_even();
    (f64::from(a) - f64::from(b) * quotient) as f32
}

/// Aborts raised while executing a compiled expression. No further
/// instructions run after one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Divide by zero error")]
    DivideByZero,
    #[error("invalid opcode encoding {opcode:#06x} at instruction {instruction}")]
    InvalidOpcode { opcode: u16, instruction: usize },
}

impl EvalError {
    pub fn diagnostic(&self) -> Diagnostic {
        let (category, code) = match self {
            EvalError::DivideByZero => (ErrorCategory::Math, ErrorCode::DivideByZero),
            EvalError::InvalidOpcode { .. } => {
                (ErrorCategory::Internal, ErrorCode::InternalError)
            }
        };
        Diagnostic {
            category,
            code,
            message: self.to_string(),
        }
    }
}

/// Executes [`ExpressionData`] against a [`VariablePack`].
///
/// The register file is reused across evaluations; results are read through
/// [`bool_result`](Self::bool_result) / [`number_result`](Self::number_result)
/// after a successful run.
#[derive(Debug, Default)]
pub struct ExpressionEvaluator {
    regs: Vec<f32>,
    result_type: Option<ExpType>,
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(
        &mut self,
        program: &ExpressionData,
        vars: &VariablePack,
    ) -> Result<(), EvalError> {
        self.result_type = Some(program.result_type());
        self.regs.clear();
        self.regs.resize(program.reg_count() as usize, 0.0);

        let code = program.bytecode();
        debug_assert!(code.len() % 2 == 0);

        for (instruction, words) in code.chunks_exact(2).enumerate() {
            let opcode = (words[0] >> 16) as u16;
            let result_reg = (words[0] & 0xffff) as SlotIndex;
            let left = (words[1] >> 16) as SlotIndex;
            let right = (words[1] & 0xffff) as SlotIndex;

            let invalid = || EvalError::InvalidOpcode {
                opcode,
                instruction,
            };
            let (op, left_src, right_src) = decode_opcode(opcode).ok_or_else(invalid)?;
            if !is_valid_encoding(op, left_src, right_src) {
                return Err(invalid());
            }

            let value = match op {
                SimpleOp::Add => {
                    self.num(left_src, left, program, vars)
                        + self.num(right_src, right, program, vars)
                }
                SimpleOp::Sub => {
                    self.num(left_src, left, program, vars)
                        - self.num(right_src, right, program, vars)
                }
                SimpleOp::Mul => {
                    self.num(left_src, left, program, vars)
                        * self.num(right_src, right, program, vars)
                }
                SimpleOp::Div => {
                    let divisor = self.num(right_src, right, program, vars);
                    if divisor == 0.0 {
                        return Err(EvalError::DivideByZero);
                    }
                    self.num(left_src, left, program, vars) / divisor
                }
                SimpleOp::Mod => {
                    let divisor = self.num(right_src, right, program, vars);
                    if divisor == 0.0 {
                        return Err(EvalError::DivideByZero);
                    }
                    ieee_rem(self.num(left_src, left, program, vars), divisor)
                }

                SimpleOp::And => encode_bool(self.boolean(left) && self.boolean(right)),
                SimpleOp::Or => encode_bool(self.boolean(left) || self.boolean(right)),
                SimpleOp::Xor => encode_bool(self.boolean(left) ^ self.boolean(right)),
                SimpleOp::Not => encode_bool(!self.boolean(left)),
                SimpleOp::BoolEq => encode_bool(self.boolean(left) == self.boolean(right)),

                SimpleOp::NameEq => encode_bool(
                    name_operand(left_src, left, program, vars)
                        == name_operand(right_src, right, program, vars),
                ),
                SimpleOp::NameNeq => encode_bool(
                    name_operand(left_src, left, program, vars)
                        != name_operand(right_src, right, program, vars),
                ),

                SimpleOp::NumEq => encode_bool(
                    self.num(left_src, left, program, vars)
                        == self.num(right_src, right, program, vars),
                ),
                SimpleOp::NumNeq => encode_bool(
                    self.num(left_src, left, program, vars)
                        != self.num(right_src, right, program, vars),
                ),
                SimpleOp::NumLt => encode_bool(
                    self.num(left_src, left, program, vars)
                        < self.num(right_src, right, program, vars),
                ),
                SimpleOp::NumGt => encode_bool(
                    self.num(left_src, left, program, vars)
                        > self.num(right_src, right, program, vars),
                ),
                SimpleOp::NumLteq => encode_bool(
                    self.num(left_src, left, program, vars)
                        <= self.num(right_src, right, program, vars),
                ),
                SimpleOp::NumGteq => encode_bool(
                    self.num(left_src, left, program, vars)
                        >= self.num(right_src, right, program, vars),
                ),

                SimpleOp::NumVal => program.const_floats()[left as usize],
                SimpleOp::BoolVal => encode_bool(left > 0),
            };

            self.regs[result_reg as usize] = value;
        }

        Ok(())
    }

    /// Result type of the last evaluated program.
    pub fn result_type(&self) -> Option<ExpType> {
        self.result_type
    }

    pub fn bool_result(&self) -> bool {
        debug_assert_eq!(self.result_type, Some(ExpType::Bool));
        self.regs.first().map(|v| *v != 0.0).unwrap_or(false)
    }

    pub fn number_result(&self) -> f32 {
        debug_assert_eq!(self.result_type, Some(ExpType::Number));
        self.regs.first().copied().unwrap_or(0.0)
    }

    fn num(
        &self,
        src: OperandSrc,
        index: SlotIndex,
        program: &ExpressionData,
        vars: &VariablePack,
    ) -> f32 {
        match src {
            OperandSrc::Register => self.regs[index as usize],
            OperandSrc::Constant => program.const_floats()[index as usize],
            OperandSrc::Variable => vars.number_slot(index),
        }
    }

    fn boolean(&self, index: SlotIndex) -> bool {
        self.regs[index as usize] != 0.0
    }
}

fn encode_bool(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn name_operand(
    src: OperandSrc,
    index: SlotIndex,
    program: &ExpressionData,
    vars: &VariablePack,
) -> Name {
    match src {
        OperandSrc::Constant => program.const_names()[index as usize],
        OperandSrc::Variable => vars.name_slot(index),
        OperandSrc::Register => unreachable!("name operands never come from registers"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_rounds_the_quotient_to_nearest() {
        assert_eq!(ieee_rem(-12.0, -5.0), -2.0);
        assert_eq!(ieee_rem(12.0, 5.0), 2.0);
        assert_eq!(ieee_rem(13.0, 5.0), -2.0);
        // Halfway quotients round to even.
        assert_eq!(ieee_rem(5.0, 2.0), 1.0);
        assert_eq!(ieee_rem(7.0, 2.0), -1.0);
    }
}
