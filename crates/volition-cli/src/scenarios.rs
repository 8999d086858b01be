//! Built-in self-check scenarios, run by `volition test`.
//!
//! Each scenario drives the public API end to end: compile against a real
//! layout, evaluate against a real pack, compare observed behaviour with the
//! expected trace.

use std::sync::Arc;

use anyhow::{bail, ensure, Context, Result};
use volition::bt::{
    BehaviourExec, BehaviourSpec, BtCompiler, BtContext, BtEvaluator, BtNode, BtResult,
};
use volition::core::{
    ErrorCode, ExpType, Name, TraceEvent, TraceLog, VariableLayout, VariablePack,
};
use volition::expr::{EvalError, ExpressionCompiler, ExpressionEvaluator};

pub fn run_all() -> Result<()> {
    let scenarios: &[(&str, fn() -> Result<()>)] = &[
        ("expression arithmetic", expression_arithmetic),
        ("expression comparison", expression_comparison),
        ("expression names", expression_names),
        ("expression errors", expression_errors),
        ("behaviour-tree sequence", sequence_counting),
        ("behaviour-tree selector", selector_interruption),
    ];

    let mut failed = 0;
    for (name, scenario) in scenarios {
        match scenario() {
            Ok(()) => tracing::info!("ok   {name}"),
            Err(err) => {
                failed += 1;
                tracing::error!("FAIL {name}: {err:#}");
            }
        }
    }

    if failed > 0 {
        bail!("{failed} scenario(s) failed");
    }
    tracing::info!("all scenarios passed");
    Ok(())
}

/*
 * Expression scenarios
 */

fn number_fixture() -> (Arc<VariableLayout>, VariablePack) {
    let mut layout = VariableLayout::new();
    layout.add(Name::new("NumA"), ExpType::Number);
    layout.add(Name::new("NumB"), ExpType::Number);
    layout.add(Name::new("NumC"), ExpType::Number);
    layout.add(Name::new("NameC"), ExpType::Name);
    layout.add(Name::new("NameD"), ExpType::Name);
    let layout = Arc::new(layout);

    let mut vars = VariablePack::new(layout.clone(), Name::default(), 0.0);
    vars.set_number(Name::new("NumA"), 5.0);
    vars.set_number(Name::new("NumB"), -3.0);
    vars.set_number(Name::new("NumC"), 2.0);
    vars.set_name(Name::new("NameC"), Name::new("C"));
    vars.set_name(Name::new("NameD"), Name::new("D"));
    (layout, vars)
}

fn eval_number(source: &str, vars: &VariablePack) -> Result<f32> {
    let program = ExpressionCompiler::new(vars.layout())
        .compile(source)
        .with_context(|| format!("compiling `{source}`"))?;
    let mut vm = ExpressionEvaluator::new();
    vm.evaluate(&program, vars)
        .with_context(|| format!("evaluating `{source}`"))?;
    Ok(vm.number_result())
}

fn eval_bool(source: &str, vars: &VariablePack) -> Result<bool> {
    let program = ExpressionCompiler::new(vars.layout())
        .compile(source)
        .with_context(|| format!("compiling `{source}`"))?;
    let mut vm = ExpressionEvaluator::new();
    vm.evaluate(&program, vars)
        .with_context(|| format!("evaluating `{source}`"))?;
    Ok(vm.bool_result())
}

fn expression_arithmetic() -> Result<()> {
    let (_, vars) = number_fixture();
    ensure!(eval_number("NumA / NumC", &vars)? == 2.5);
    ensure!(eval_number("-10 / -2", &vars)? == 5.0);
    ensure!(eval_number("-12 % -5", &vars)? == -2.0);
    Ok(())
}

fn expression_comparison() -> Result<()> {
    let (_, vars) = number_fixture();
    ensure!(eval_bool("(NumA == 5) != (NumB > 0)", &vars)?);
    ensure!(eval_bool("NumA > 3 || NumB > 3 && NumA < 0", &vars)?);
    Ok(())
}

fn expression_names() -> Result<()> {
    let (layout, vars) = number_fixture();
    ensure!(eval_bool("NameC == 'C'", &vars)?);
    ensure!(!eval_bool("NameC == NameD", &vars)?);

    let report = match ExpressionCompiler::new(&layout).compile("'A'") {
        Err(report) => report,
        Ok(_) => bail!("a bare Name literal must not compile"),
    };
    ensure!(report.contains_code(ErrorCode::ConstNameExpression));
    Ok(())
}

fn expression_errors() -> Result<()> {
    let (layout, vars) = number_fixture();

    // Not constant, so the compiler accepts it; NumA == 5 makes the divisor
    // zero at runtime.
    let program = ExpressionCompiler::new(&layout)
        .compile("NumA / (NumA - 5)")
        .context("compiling the runtime divide")?;
    let mut vm = ExpressionEvaluator::new();
    match vm.evaluate(&program, &vars) {
        Err(EvalError::DivideByZero) => {}
        other => bail!("expected a divide-by-zero abort, got {other:?}"),
    }

    match ExpressionCompiler::new(&layout).compile("1 / 0") {
        Err(report) if report.contains_code(ErrorCode::DivideByZero) => {}
        _ => bail!("constant division by zero must fail at fold time"),
    }
    Ok(())
}

/*
 * Behaviour-tree scenarios
 */

#[derive(Default)]
struct CountingWorld {
    tick: u64,
    log: TraceLog,
}

#[derive(Clone, Copy)]
struct CountSpec {
    initial: u32,
}

impl BehaviourSpec<CountingWorld> for CountSpec {
    fn duplicate(&self) -> Box<dyn BehaviourSpec<CountingWorld>> {
        Box::new(*self)
    }

    fn new_exec(
        &self,
        origin: Name,
        _ctx: &mut BtContext<'_, CountingWorld>,
    ) -> Box<dyn BehaviourExec<CountingWorld>> {
        Box::new(CountExec {
            name: origin,
            remaining: self.initial,
        })
    }
}

struct CountExec {
    name: Name,
    remaining: u32,
}

impl BehaviourExec<CountingWorld> for CountExec {
    fn execute(&mut self, ctx: &mut BtContext<'_, CountingWorld>) -> BtResult {
        tracing::debug!("behaviour={} count={}", self.name, self.remaining);
        let event = TraceEvent::new(ctx.world.tick, "count", self.name)
            .with_value(u64::from(self.remaining));
        ctx.world.log.push(event);

        self.remaining -= 1;
        if self.remaining > 0 {
            BtResult::InProgress
        } else {
            BtResult::Success
        }
    }
}

fn count(name: &str, initial: u32) -> BtNode<CountingWorld> {
    BtNode::behaviour(name, CountSpec { initial })
}

fn expect_log(log: &TraceLog, expected: &[(&str, u64)]) -> Result<()> {
    let expected: Vec<(Name, u64)> = expected.iter().map(|&(n, v)| (Name::new(n), v)).collect();
    let actual = log.name_values();
    ensure!(
        actual == expected,
        "behaviour log mismatch: expected {expected:?}, got {actual:?}"
    );
    Ok(())
}

fn sequence_counting() -> Result<()> {
    let layout = Arc::new(VariableLayout::new());
    let tree = BtNode::sequence(
        "root-seq",
        vec![count("count1", 1), count("count2", 2), count("count3", 3)],
    );

    let rt = BtCompiler::new(layout.clone())
        .compile(&tree)
        .context("compiling the sequence tree")?;
    let mut vars = VariablePack::new(layout, Name::default(), 0.0);
    let mut world = CountingWorld::default();
    let mut eval = BtEvaluator::new(Arc::new(rt));

    let mut last = BtResult::InProgress;
    for tick in 0..4 {
        world.tick = tick;
        last = eval.tick(&mut world, &mut vars);
        ensure!(eval.errors().is_empty(), "tick errors: {}", eval.errors());
    }

    ensure!(last == BtResult::Success, "4th tick must succeed, got {last:?}");
    expect_log(
        &world.log,
        &[
            ("count1", 1),
            ("count2", 2),
            ("count2", 1),
            ("count3", 3),
            ("count3", 2),
            ("count3", 1),
        ],
    )
}

fn selector_interruption() -> Result<()> {
    let mut layout = VariableLayout::new();
    layout.add(Name::new("branch"), ExpType::Number);
    let layout = Arc::new(layout);

    let tree = BtNode::selector(
        "root-sel",
        vec![
            BtNode::sequence(
                "seq1",
                vec![BtNode::condition("cond1", "branch == 1"), count("count1", 1)],
            ),
            BtNode::sequence(
                "seq2",
                vec![BtNode::condition("cond2", "branch == 2"), count("count2", 2)],
            ),
            BtNode::sequence(
                "seq3",
                vec![BtNode::condition("cond3", "branch == 3"), count("count3", 3)],
            ),
        ],
    );

    let rt = BtCompiler::new(layout.clone())
        .compile(&tree)
        .context("compiling the selector tree")?;
    let mut vars = VariablePack::new(layout, Name::default(), 0.0);
    let mut world = CountingWorld::default();
    let mut eval = BtEvaluator::new(Arc::new(rt));

    for (tick, branch) in [0.0, 2.0, 1.0, 2.0, 2.0, 2.0].into_iter().enumerate() {
        world.tick = tick as u64;
        vars.set_number(Name::new("branch"), branch);
        eval.tick(&mut world, &mut vars);
        ensure!(eval.errors().is_empty(), "tick errors: {}", eval.errors());
    }

    expect_log(
        &world.log,
        &[
            ("count2", 2),
            ("count1", 1),
            ("count2", 2),
            ("count2", 1),
            ("count2", 2),
        ],
    )
}
