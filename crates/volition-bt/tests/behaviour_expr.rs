//! Behaviours that carry their own expressions: the spec's compile hook runs
//! during the tree build, and executor writes to the variable pack are
//! observed by instructions later in the same tick.

use std::sync::Arc;

use volition_bt::{
    BehaviourExec, BehaviourSpec, BtCompiler, BtContext, BtEvaluator, BtNode, BtResult,
    CompileContext,
};
use volition_core::{ErrorCode, ExpType, Name, VariableLayout, VariablePack};
use volition_expr::{ExpressionCompiler, ExpressionData, ExpressionEvaluator};

struct World;

/// Evaluates a Number expression and stores the result into a variable.
#[derive(Clone)]
struct ComputeSpec {
    target: Name,
    source: String,
    program: Option<ExpressionData>,
}

impl ComputeSpec {
    fn new(target: &str, source: &str) -> Self {
        Self {
            target: Name::new(target),
            source: source.to_string(),
            program: None,
        }
    }
}

impl BehaviourSpec<World> for ComputeSpec {
    fn duplicate(&self) -> Box<dyn BehaviourSpec<World>> {
        Box::new(self.clone())
    }

    fn compile_expressions(&mut self, ctx: &mut CompileContext<'_>) {
        match ExpressionCompiler::new(ctx.layout).compile(&self.source) {
            Ok(program) => self.program = Some(program),
            Err(report) => ctx.errors.combine(&report),
        }
    }

    fn new_exec(
        &self,
        _origin: Name,
        _ctx: &mut BtContext<'_, World>,
    ) -> Box<dyn BehaviourExec<World>> {
        Box::new(ComputeExec {
            target: self.target,
            program: self.program.clone(),
        })
    }
}

struct ComputeExec {
    target: Name,
    program: Option<ExpressionData>,
}

impl BehaviourExec<World> for ComputeExec {
    fn execute(&mut self, ctx: &mut BtContext<'_, World>) -> BtResult {
        let Some(program) = &self.program else {
            return BtResult::Failure;
        };

        let mut vm = ExpressionEvaluator::new();
        match vm.evaluate(program, ctx.vars) {
            Ok(()) => {
                ctx.vars.set_number(self.target, vm.number_result());
                BtResult::Success
            }
            Err(err) => {
                ctx.errors.push_diagnostic(err.diagnostic());
                BtResult::Failure
            }
        }
    }
}

fn layout_with_charge() -> Arc<VariableLayout> {
    let mut layout = VariableLayout::new();
    layout.add(Name::new("charge"), ExpType::Number);
    Arc::new(layout)
}

#[test]
fn later_instructions_observe_executor_writes() {
    let layout = layout_with_charge();
    let tree: BtNode<World> = BtNode::sequence(
        "charge-up",
        vec![
            BtNode::behaviour("accumulate", ComputeSpec::new("charge", "charge + 1")),
            BtNode::condition("ready", "charge >= 3"),
        ],
    );

    let rt = BtCompiler::new(layout.clone()).compile(&tree).unwrap();
    let mut vars = VariablePack::new(layout, Name::default(), 0.0);
    let mut eval = BtEvaluator::new(Arc::new(rt));

    // The condition reads the value written earlier in the same tick.
    assert_eq!(eval.tick(&mut World, &mut vars), BtResult::Failure);
    assert_eq!(eval.tick(&mut World, &mut vars), BtResult::Failure);
    assert_eq!(eval.tick(&mut World, &mut vars), BtResult::Success);
    assert_eq!(vars.number(Name::new("charge")), 3.0);
}

#[test]
fn behaviour_expression_problems_fail_the_build() {
    let layout = layout_with_charge();
    let tree: BtNode<World> = BtNode::behaviour("broken", ComputeSpec::new("charge", "charge +"));

    let report = BtCompiler::new(layout).compile(&tree).unwrap_err();
    assert!(report.contains_code(ErrorCode::SyntaxError));
}
