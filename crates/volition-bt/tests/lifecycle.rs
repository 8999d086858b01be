//! Behaviour executor lifecycle: init once, execute while reached, cleanup
//! exactly once - on completion, on interruption, or on explicit abort.

use std::sync::Arc;

use volition_bt::{
    BehaviourExec, BehaviourSpec, BtCompiler, BtContext, BtEvaluator, BtNode, BtResult,
};
use volition_core::{ExpType, Name, TraceEvent, TraceLog, VariableLayout, VariablePack};

#[derive(Default)]
struct ProbeWorld {
    log: TraceLog,
}

impl ProbeWorld {
    fn events(&self) -> Vec<(String, Name)> {
        self.log
            .events
            .iter()
            .map(|e| (e.tag.to_string(), e.name))
            .collect()
    }
}

/// Logs every lifecycle call under the node's name.
#[derive(Clone, Copy)]
struct ProbeSpec {
    result: BtResult,
}

impl BehaviourSpec<ProbeWorld> for ProbeSpec {
    fn duplicate(&self) -> Box<dyn BehaviourSpec<ProbeWorld>> {
        Box::new(*self)
    }

    fn new_exec(
        &self,
        origin: Name,
        _ctx: &mut BtContext<'_, ProbeWorld>,
    ) -> Box<dyn BehaviourExec<ProbeWorld>> {
        Box::new(ProbeExec {
            name: origin,
            result: self.result,
        })
    }
}

struct ProbeExec {
    name: Name,
    result: BtResult,
}

impl ProbeExec {
    fn log(&self, world: &mut ProbeWorld, tag: &'static str) {
        world.log.push(TraceEvent::new(0, tag, self.name));
    }
}

impl BehaviourExec<ProbeWorld> for ProbeExec {
    fn init(&mut self, _origin: Name, ctx: &mut BtContext<'_, ProbeWorld>) {
        self.log(ctx.world, "init");
    }

    fn execute(&mut self, ctx: &mut BtContext<'_, ProbeWorld>) -> BtResult {
        self.log(ctx.world, "execute");
        self.result
    }

    fn cleanup(&mut self, ctx: &mut BtContext<'_, ProbeWorld>) {
        self.log(ctx.world, "cleanup");
    }
}

fn layout_with(name: &str) -> Arc<VariableLayout> {
    let mut layout = VariableLayout::new();
    layout.add(Name::new(name), ExpType::Number);
    Arc::new(layout)
}

fn expect(events: &[(&str, &str)]) -> Vec<(String, Name)> {
    events
        .iter()
        .map(|&(tag, name)| (tag.to_string(), Name::new(name)))
        .collect()
}

#[test]
fn completion_cleans_up_within_the_tick() {
    let layout = Arc::new(VariableLayout::new());
    let tree: BtNode<ProbeWorld> = BtNode::behaviour(
        "done",
        ProbeSpec {
            result: BtResult::Success,
        },
    );

    let rt = BtCompiler::new(layout.clone()).compile(&tree).unwrap();
    let mut vars = VariablePack::new(layout, Name::default(), 0.0);
    let mut world = ProbeWorld::default();
    let mut eval = BtEvaluator::new(Arc::new(rt));

    assert_eq!(eval.tick(&mut world, &mut vars), BtResult::Success);
    assert_eq!(
        world.events(),
        expect(&[("init", "done"), ("execute", "done"), ("cleanup", "done")])
    );

    // A fresh activation next tick: the exec was destroyed on completion.
    eval.tick(&mut world, &mut vars);
    assert_eq!(world.events().len(), 6);
}

#[test]
fn switching_behaviours_cleans_up_the_interrupted_exec_first() {
    // An earlier selector branch opening is what interrupts a running
    // behaviour further down.
    let layout = layout_with("switch");
    let tree: BtNode<ProbeWorld> = BtNode::selector(
        "root",
        vec![
            BtNode::sequence(
                "takeover",
                vec![
                    BtNode::condition("gate", "switch == 1"),
                    BtNode::behaviour(
                        "second",
                        ProbeSpec {
                            result: BtResult::InProgress,
                        },
                    ),
                ],
            ),
            BtNode::sequence(
                "normal",
                vec![
                    BtNode::condition("idle", "switch == 0"),
                    BtNode::behaviour(
                        "first",
                        ProbeSpec {
                            result: BtResult::InProgress,
                        },
                    ),
                ],
            ),
        ],
    );

    let rt = BtCompiler::new(layout.clone()).compile(&tree).unwrap();
    let mut vars = VariablePack::new(layout, Name::default(), 0.0);
    let mut world = ProbeWorld::default();
    let mut eval = BtEvaluator::new(Arc::new(rt));

    vars.set_number(Name::new("switch"), 0.0);
    assert_eq!(eval.tick(&mut world, &mut vars), BtResult::InProgress);
    assert_eq!(eval.current_node_name(), Name::new("first"));

    vars.set_number(Name::new("switch"), 1.0);
    assert_eq!(eval.tick(&mut world, &mut vars), BtResult::InProgress);

    assert_eq!(
        world.events(),
        expect(&[
            ("init", "first"),
            ("execute", "first"),
            ("cleanup", "first"),
            ("init", "second"),
            ("execute", "second"),
        ])
    );
}

#[test]
fn a_tick_that_skips_every_behaviour_retains_the_exec() {
    // When the first branch succeeds on its own, the selector ends the tick
    // without reaching any behaviour instruction.
    let layout = layout_with("go");
    let tree: BtNode<ProbeWorld> = BtNode::selector(
        "root",
        vec![
            BtNode::condition("gate", "go == 0"),
            BtNode::behaviour(
                "work",
                ProbeSpec {
                    result: BtResult::InProgress,
                },
            ),
        ],
    );

    let rt = BtCompiler::new(layout.clone()).compile(&tree).unwrap();
    let mut vars = VariablePack::new(layout, Name::default(), 0.0);
    let mut world = ProbeWorld::default();
    let mut eval = BtEvaluator::new(Arc::new(rt));

    let go = Name::new("go");

    vars.set_number(go, 1.0);
    eval.tick(&mut world, &mut vars);

    // The gate opens: no behaviour instruction runs this tick, and the exec
    // is kept alive rather than cleaned up.
    vars.set_number(go, 0.0);
    assert_eq!(eval.tick(&mut world, &mut vars), BtResult::Success);

    // The gate reopens: the retained exec resumes without a second init.
    vars.set_number(go, 1.0);
    eval.tick(&mut world, &mut vars);

    assert_eq!(
        world.events(),
        expect(&[
            ("init", "work"),
            ("execute", "work"),
            ("execute", "work"),
        ])
    );

    // Host shutdown delivers the final cleanup.
    eval.abort_current(&mut world, &mut vars);
    assert_eq!(world.events().last().unwrap().0, "cleanup");
}
