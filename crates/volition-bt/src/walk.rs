//! Direct tree-walking evaluation.
//!
//! The walking evaluator interprets a prepared authoring tree instead of
//! bytecode: identical results, resume and interrupt semantics to
//! [`BtEvaluator`](crate::BtEvaluator), at tree-walk cost. It doubles as a
//! cross-check for the compiled form.

use std::sync::Arc;

use volition_core::{
    ErrorCategory, ErrorCode, ErrorReport, ExpType, Name, VariableLayout, VariablePack,
};
use volition_expr::{ExpressionCompiler, ExpressionData, ExpressionEvaluator};

use crate::behaviour::{ActiveBehaviour, BehaviourSpec, BtContext, BtResult, CompileContext};
use crate::node::BtNode;

enum PreparedNode<W> {
    Sequence {
        seq: u16,
        children: Vec<PreparedNode<W>>,
    },
    Selector {
        children: Vec<PreparedNode<W>>,
    },
    Condition {
        program: ExpressionData,
    },
    Behaviour {
        index: u16,
        name: Name,
        spec: Box<dyn BehaviourSpec<W>>,
    },
}

/// An authoring tree with its conditions compiled and its behaviour specs
/// cloned, ready for walking. Immutable once prepared.
pub struct PreparedTree<W> {
    layout: Arc<VariableLayout>,
    root: PreparedNode<W>,
    seq_count: u16,
}

impl<W> std::fmt::Debug for PreparedNode<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreparedNode::Sequence { seq, children } => f
                .debug_struct("Sequence")
                .field("seq", seq)
                .field("children", children)
                .finish(),
            PreparedNode::Selector { children } => {
                f.debug_struct("Selector").field("children", children).finish()
            }
            PreparedNode::Condition { program } => {
                f.debug_struct("Condition").field("program", program).finish()
            }
            PreparedNode::Behaviour { index, name, .. } => f
                .debug_struct("Behaviour")
                .field("index", index)
                .field("name", name)
                .finish(),
        }
    }
}

impl<W> std::fmt::Debug for PreparedTree<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedTree")
            .field("layout", &self.layout)
            .field("root", &self.root)
            .field("seq_count", &self.seq_count)
            .finish()
    }
}

impl<W> PreparedTree<W> {
    /// Compile every condition and clone every behaviour spec out of the
    /// authoring tree. Problems accumulate across the whole tree.
    pub fn prepare(layout: Arc<VariableLayout>, root: &BtNode<W>) -> Result<Self, ErrorReport> {
        let mut preparer = Preparer {
            layout: layout.clone(),
            errors: ErrorReport::new(),
            seq_count: 0,
            behaviour_count: 0,
        };

        let root = preparer.prepare_node(root);

        match root {
            Some(root) if preparer.errors.is_empty() => Ok(Self {
                layout,
                root,
                seq_count: preparer.seq_count,
            }),
            _ => Err(preparer.errors),
        }
    }

    pub fn layout(&self) -> &Arc<VariableLayout> {
        &self.layout
    }

    pub fn seq_node_count(&self) -> u16 {
        self.seq_count
    }
}

struct Preparer {
    layout: Arc<VariableLayout>,
    errors: ErrorReport,
    seq_count: u16,
    behaviour_count: u16,
}

impl Preparer {
    fn prepare_node<W>(&mut self, node: &BtNode<W>) -> Option<PreparedNode<W>> {
        match node {
            BtNode::Sequence { children, .. } => {
                let seq = self.seq_count;
                self.seq_count += 1;
                let children = self.prepare_children(children)?;
                Some(PreparedNode::Sequence { seq, children })
            }

            BtNode::Selector { children, .. } => {
                let children = self.prepare_children(children)?;
                Some(PreparedNode::Selector { children })
            }

            BtNode::Condition { name, expression } => {
                let compiled = ExpressionCompiler::new(&self.layout).compile(expression);
                match compiled {
                    Err(report) => {
                        self.errors.combine(&report);
                        None
                    }
                    Ok(program) if program.result_type() != ExpType::Bool => {
                        self.errors.push(
                            ErrorCategory::ExpressionType,
                            ErrorCode::ConditionTypeNotBool,
                            format!("Condition node '{name}' must be a boolean expression"),
                        );
                        None
                    }
                    Ok(program) => Some(PreparedNode::Condition { program }),
                }
            }

            BtNode::Behaviour { name, spec } => {
                let mut clone = spec.duplicate();
                let mut ctx = CompileContext {
                    layout: &self.layout,
                    errors: &mut self.errors,
                };
                clone.compile_expressions(&mut ctx);

                let index = self.behaviour_count;
                self.behaviour_count += 1;
                Some(PreparedNode::Behaviour {
                    index,
                    name: *name,
                    spec: clone,
                })
            }
        }
    }

    /// Prepare every child before deciding the outcome, so one pass reports
    /// problems from the whole tree.
    fn prepare_children<W>(&mut self, children: &[BtNode<W>]) -> Option<Vec<PreparedNode<W>>> {
        let prepared: Vec<Option<PreparedNode<W>>> = children
            .iter()
            .map(|child| self.prepare_node(child))
            .collect();
        prepared.into_iter().collect()
    }
}

/// Ticks a [`PreparedTree`] by walking it.
pub struct TreeEvaluator<W> {
    tree: Arc<PreparedTree<W>>,
    resume: Vec<u16>,
    active: ActiveBehaviour<W>,
    current_node_name: Name,
    expr_vm: ExpressionEvaluator,
    errors: ErrorReport,
}

impl<W> TreeEvaluator<W> {
    pub fn new(tree: Arc<PreparedTree<W>>) -> Self {
        let resume = vec![0; tree.seq_node_count() as usize];
        Self {
            tree,
            resume,
            active: ActiveBehaviour::new(),
            current_node_name: Name::default(),
            expr_vm: ExpressionEvaluator::new(),
            errors: ErrorReport::new(),
        }
    }

    pub fn tick(&mut self, world: &mut W, vars: &mut VariablePack) -> BtResult {
        self.errors.reset();
        let tree = self.tree.clone();
        self.eval_node(&tree.root, world, vars)
    }

    fn eval_node(
        &mut self,
        node: &PreparedNode<W>,
        world: &mut W,
        vars: &mut VariablePack,
    ) -> BtResult {
        match node {
            PreparedNode::Condition { program } => match self.expr_vm.evaluate(program, vars) {
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
            },

            PreparedNode::Behaviour { index, name, spec } => {
                self.current_node_name = *name;
                let mut ctx = BtContext {
                    world: &mut *world,
                    vars: &mut *vars,
                    errors: &mut self.errors,
                };
                self.active.run(*index, *name, spec.as_ref(), &mut ctx)
            }

            PreparedNode::Sequence { seq, children } => {
                let start = self.resume[*seq as usize] as usize;
                for (idx, child) in children.iter().enumerate().skip(start) {
                    let result = self.eval_node(child, world, vars);
                    if result != BtResult::Success {
                        self.resume[*seq as usize] = if result == BtResult::InProgress {
                            idx as u16
                        } else {
                            0
                        };
                        return result;
                    }
                }

                self.resume[*seq as usize] = 0;
                BtResult::Success
            }

            PreparedNode::Selector { children } => {
                for child in children {
                    let result = self.eval_node(child, world, vars);
                    if result != BtResult::Failure {
                        return result;
                    }
                }
                BtResult::Failure
            }
        }
    }

    /// Interrupt and clean up the active behaviour, if any.
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

    /// Name of the most recently reached behaviour node.
    pub fn current_node_name(&self) -> Name {
        self.current_node_name
    }
}
