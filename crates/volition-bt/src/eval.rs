//! Tick interpreter.
//!
//! One evaluator drives one compiled tree for one agent. A tick walks the
//! bytecode from the top; conditions run through the expression VM, behaviour
//! instructions manage the single active executor. Evaluators are not
//! re-entrant; many evaluators may share one compiled
//! [`BtRuntimeData`](crate::BtRuntimeData), each with its own variable pack
//! and resume state.

use std::sync::Arc;

use volition_core::{ErrorCategory, ErrorCode, ErrorReport, Name, VariablePack};
use volition_expr::ExpressionEvaluator;

use crate::behaviour::{ActiveBehaviour, BtContext, BtResult};
use crate::compile::BtRuntimeData;
use crate::opcode::{unpack, BtOp};

pub struct BtEvaluator<W> {
    rt: Arc<BtRuntimeData<W>>,
    resume_counters: Vec<u16>,
    active: ActiveBehaviour<W>,
    current_node_name: Name,
    expr_vm: ExpressionEvaluator,
    errors: ErrorReport,
}

impl<W> BtEvaluator<W> {
    pub fn new(rt: Arc<BtRuntimeData<W>>) -> Self {
        let resume_counters = vec![0; rt.seq_node_count() as usize];
        Self {
            rt,
            resume_counters,
            active: ActiveBehaviour::new(),
            current_node_name: Name::default(),
            expr_vm: ExpressionEvaluator::new(),
            errors: ErrorReport::new(),
        }
    }

    /// Drive the tree one step. Expression failures mark their node as failed
    /// and are recorded on [`errors`](Self::errors); the tick still runs to
    /// completion.
    pub fn tick(&mut self, world: &mut W, vars: &mut VariablePack) -> BtResult {
        self.errors.reset();

        let rt = self.rt.clone();
        let code = rt.bytecode();
        let mut result: Option<BtResult> = None;
        let mut ip = 0usize;

        while ip < code.len() {
            let (bits, operand) = unpack(code[ip]);
            let Some(op) = BtOp::from_bits(bits) else {
                self.errors.push(
                    ErrorCategory::Internal,
                    ErrorCode::InternalError,
                    format!("invalid behaviour-tree opcode {bits:#06x} at {ip}"),
                );
                break;
            };

            match op {
                BtOp::IndicateNodeStart => {
                    self.current_node_name = rt.node_names[operand as usize];
                    ip += 1;
                }

                BtOp::SetFail => {
                    result = Some(BtResult::Failure);
                    ip += 1;
                }

                BtOp::SetSuccess => {
                    result = Some(BtResult::Success);
                    ip += 1;
                }

                BtOp::StoreSeqIdx => {
                    let value = (code[ip + 1] & 0xffff) as u16;
                    self.resume_counters[operand as usize] = value;
                    ip += 2;
                }

                BtOp::CondStoreSeqIdx => {
                    let value = (code[ip + 1] & 0xffff) as u16;
                    self.resume_counters[operand as usize] =
                        if result == Some(BtResult::InProgress) {
                            value
                        } else {
                            0
                        };
                    ip += 2;
                }

                BtOp::EvalExpr => {
                    let program = &rt.expressions[operand as usize];
                    result = Some(match self.expr_vm.evaluate(program, vars) {
                        Ok(()) => {
                            if self.expr_vm.bool_result() {
                                BtResult::Success
                            } else {
                                BtResult::Failure
                            }
                        }
                        Err(err) => {
                            self.errors.push_diagnostic(err.diagnostic());
                            BtResult::Failure
                        }
                    });
                    ip += 1;
                }

                BtOp::ExecBehaviour => {
                    let spec = rt.behaviour_specs[operand as usize].as_ref();
                    let mut ctx = BtContext {
                        world: &mut *world,
                        vars: &mut *vars,
                        errors: &mut self.errors,
                    };
                    result = Some(self.active.run(
                        operand,
                        self.current_node_name,
                        spec,
                        &mut ctx,
                    ));
                    ip += 1;
                }

                BtOp::JumpTable => {
                    let counter = self.resume_counters[operand as usize] as usize;
                    debug_assert!(counter < rt.seq_child_counts[operand as usize] as usize);
                    ip = (code[ip + 1 + counter] & 0xffff) as usize;
                }

                BtOp::JumpNotFail => {
                    if result != Some(BtResult::Failure) {
                        ip = operand as usize;
                    } else {
                        ip += 1;
                    }
                }

                BtOp::JumpNotSuccess => {
                    if result != Some(BtResult::Success) {
                        ip = operand as usize;
                    } else {
                        ip += 1;
                    }
                }
            }
        }

        result.unwrap_or(BtResult::Failure)
    }

    /// Interrupt and clean up the active behaviour, if any. Call before
    /// dropping an evaluator whose agent may still be mid-behaviour; `Drop`
    /// cannot reach the host world, so shutdown is explicit.
    pub fn abort_current(&mut self, world: &mut W, vars: &mut VariablePack) {
        let mut ctx = BtContext {
            world,
            vars,
            errors: &mut self.errors,
        };
        self.active.abort(&mut ctx);
    }

    /// Diagnostics recorded by the most recent tick.
    pub fn errors(&self) -> &ErrorReport {
        &self.errors
    }

    /// Name of the most recently started behaviour node.
    pub fn current_node_name(&self) -> Name {
        self.current_node_name
    }

    pub fn resume_counters(&self) -> &[u16] {
        &self.resume_counters
    }

    pub fn runtime(&self) -> &Arc<BtRuntimeData<W>> {
        &self.rt
    }
}
