use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use volition_bt::{BtCompiler, BtEvaluator, BtNode, BtResult};
use volition_core::{ExpType, Name, VariableLayout, VariablePack};

struct World;

fn bench_bt_tick(c: &mut Criterion) {
    let mut layout = VariableLayout::new();
    layout.add(Name::new("hp"), ExpType::Number);
    let layout = Arc::new(layout);

    // A selector over 32 failing guards exercises the whole dispatch loop
    // every tick.
    let children = (0..32)
        .map(|i| BtNode::condition(format!("guard{i}").as_str(), "hp < 0"))
        .collect::<Vec<BtNode<World>>>();
    let tree = BtNode::selector("root", children);

    let rt = Arc::new(BtCompiler::new(layout.clone()).compile(&tree).unwrap());
    let mut vars = VariablePack::new(layout, Name::default(), 0.0);
    vars.set_number(Name::new("hp"), 100.0);

    let mut world = World;
    let mut eval = BtEvaluator::new(rt);

    c.bench_function("volition-bt/tick(conditions=32)", |b| {
        b.iter(|| {
            let result = eval.tick(&mut world, &mut vars);
            debug_assert_eq!(result, BtResult::Failure);
            black_box(result);
        })
    });
}

criterion_group!(benches, bench_bt_tick);
criterion_main!(benches);
