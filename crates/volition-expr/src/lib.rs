//! Expression language for volition agents.
//!
//! Authors write boolean and arithmetic expressions over an agent's typed
//! variables; [`ExpressionCompiler`] lowers them to a compact register
//! bytecode and [`ExpressionEvaluator`] executes that bytecode against a
//! [`volition_core::VariablePack`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

mod ast;
pub mod bytecode;
pub mod compile;
mod lexer;
mod parser;
pub mod vm;

pub use bytecode::{decode_opcode, encode_opcode, ExpressionData, OperandSrc, SimpleOp};
pub use compile::ExpressionCompiler;
pub use vm::{EvalError, ExpressionEvaluator};
