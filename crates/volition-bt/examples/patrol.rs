//! A patrol/combat agent driven by a compiled behaviour tree.
//!
//! The tree attacks while an enemy is in range and falls back to patrolling
//! otherwise; the host moves the enemy between ticks.
//!
//! Run with `cargo run -p volition-bt --example patrol`.

use std::sync::Arc;

use volition_bt::{
    BehaviourExec, BehaviourSpec, BtCompiler, BtContext, BtEvaluator, BtNode, BtResult,
};
use volition_core::{ExpType, Name, VariableLayout, VariablePack};

#[derive(Default)]
struct World {
    report: Vec<String>,
}

#[derive(Clone, Copy)]
struct PatrolSpec;

impl BehaviourSpec<World> for PatrolSpec {
    fn duplicate(&self) -> Box<dyn BehaviourSpec<World>> {
        Box::new(*self)
    }

    fn new_exec(
        &self,
        _origin: Name,
        _ctx: &mut BtContext<'_, World>,
    ) -> Box<dyn BehaviourExec<World>> {
        Box::new(PatrolExec { waypoint: 0 })
    }
}

struct PatrolExec {
    waypoint: u32,
}

impl BehaviourExec<World> for PatrolExec {
    fn execute(&mut self, ctx: &mut BtContext<'_, World>) -> BtResult {
        ctx.world
            .report
            .push(format!("patrolling towards waypoint {}", self.waypoint));
        self.waypoint = (self.waypoint + 1) % 4;
        BtResult::InProgress
    }

    fn cleanup(&mut self, ctx: &mut BtContext<'_, World>) {
        ctx.world.report.push("patrol interrupted".to_string());
    }
}

#[derive(Clone, Copy)]
struct AttackSpec {
    damage: f32,
}

impl BehaviourSpec<World> for AttackSpec {
    fn duplicate(&self) -> Box<dyn BehaviourSpec<World>> {
        Box::new(*self)
    }

    fn new_exec(
        &self,
        _origin: Name,
        _ctx: &mut BtContext<'_, World>,
    ) -> Box<dyn BehaviourExec<World>> {
        Box::new(AttackExec {
            damage: self.damage,
        })
    }
}

struct AttackExec {
    damage: f32,
}

impl BehaviourExec<World> for AttackExec {
    fn execute(&mut self, ctx: &mut BtContext<'_, World>) -> BtResult {
        let hp = Name::new("enemy_hp");
        let remaining = (ctx.vars.number(hp) - self.damage).max(0.0);
        ctx.vars.set_number(hp, remaining);
        ctx.world.report.push(format!("attacking, enemy at {remaining} hp"));

        if remaining > 0.0 {
            BtResult::InProgress
        } else {
            ctx.world.report.push("enemy down".to_string());
            BtResult::Success
        }
    }
}

fn main() {
    volition_core::init_pool();

    let mut layout = VariableLayout::new();
    layout.add(Name::new("enemy_range"), ExpType::Number);
    layout.add(Name::new("enemy_hp"), ExpType::Number);
    let layout = Arc::new(layout);

    let tree = BtNode::selector(
        "brain",
        vec![
            BtNode::sequence(
                "combat",
                vec![
                    BtNode::condition("enemy-close", "enemy_range < 10 && enemy_hp > 0"),
                    BtNode::behaviour("attack", AttackSpec { damage: 10.0 }),
                ],
            ),
            BtNode::behaviour("patrol", PatrolSpec),
        ],
    );

    let rt = match BtCompiler::new(layout.clone()).compile(&tree) {
        Ok(rt) => Arc::new(rt),
        Err(report) => {
            eprintln!("tree failed to compile: {report}");
            std::process::exit(1);
        }
    };

    let mut vars = VariablePack::new(layout, Name::default(), 0.0);
    vars.set_number(Name::new("enemy_range"), 50.0);
    vars.set_number(Name::new("enemy_hp"), 30.0);

    let mut world = World::default();
    let mut eval = BtEvaluator::new(rt);

    for tick in 0..8 {
        // The enemy closes in over the first few ticks.
        let range = (50.0 - 15.0 * tick as f32).max(0.0);
        vars.set_number(Name::new("enemy_range"), range);

        let result = eval.tick(&mut world, &mut vars);
        println!("tick {tick}: range={range:>4} -> {result:?}");
        for line in world.report.drain(..) {
            println!("        {line}");
        }
    }

    eval.abort_current(&mut world, &mut vars);
    for line in world.report.drain(..) {
        println!("        {line}");
    }
}
