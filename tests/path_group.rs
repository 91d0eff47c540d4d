//! Scheduler-level behavior: strategy ordering, step budgets, reproducible
//! random exploration.

use std::collections::VecDeque;

use whitesymex::instruction::{Instruction, Label};
use whitesymex::path_group::{ExploreConfig, PathGroup, Strategy};
use whitesymex::solver;
use whitesymex::state::create_entry_state;
use whitesymex::value::Value;
use z3::Context;

/// A symbolic stdin byte gates a real fork into two live branches, each
/// pushing a distinct byte to stdout and exiting — enough to exercise the
/// scheduler's actual `Dispatch::Forked` path rather than a statically
/// resolved jump.
fn two_way_branch() -> Vec<Instruction> {
    let left = Label(vec![false]);
    let right = Label(vec![true]);
    vec![
        Instruction::Push(0),
        Instruction::ReadChar,
        Instruction::Push(0),
        Instruction::Retrieve,
        Instruction::JumpZero(left.clone()),
        Instruction::Jump(right.clone()),
        Instruction::Mark(left),
        Instruction::Push(b'L' as i64),
        Instruction::OutChar,
        Instruction::Exit,
        Instruction::Mark(right),
        Instruction::Push(b'R' as i64),
        Instruction::OutChar,
        Instruction::Exit,
    ]
}

fn run<'ctx>(ctx: &'ctx Context, strategy: Strategy, find: &[u8]) -> PathGroup<'ctx> {
    let mut stdin = VecDeque::new();
    stdin.push_back(Value::fresh_symbolic_byte(ctx, "gate"));
    let entry = create_entry_state(ctx, stdin);
    let config = ExploreConfig { find: find.to_vec(), strategy, ..ExploreConfig::default() };
    let mut group = PathGroup::new(two_way_branch(), entry, &config);
    group.explore(&config);
    group
}

#[test]
fn bfs_and_dfs_both_locate_a_forked_branch() {
    for strategy in [Strategy::Bfs, Strategy::Dfs] {
        let ctx = solver::new_context();
        let group = run(&ctx, strategy, b"L");
        assert_eq!(group.found().len(), 1);
    }
}

#[test]
fn random_strategy_is_reproducible_given_a_fixed_seed() {
    fn run_with_seed(ctx: &Context, seed: u64) -> (u64, usize) {
        let mut stdin = VecDeque::new();
        stdin.push_back(Value::fresh_symbolic_byte(ctx, "gate"));
        let entry = create_entry_state(ctx, stdin);
        let config = ExploreConfig { find: b"L".to_vec(), strategy: Strategy::Random, seed: Some(seed), ..ExploreConfig::default() };
        let mut group = PathGroup::new(two_way_branch(), entry, &config);
        group.explore(&config);
        (group.steps_taken(), group.found().len())
    }

    let ctx1 = solver::new_context();
    let (steps1, found1) = run_with_seed(&ctx1, 42);

    let ctx2 = solver::new_context();
    let (steps2, found2) = run_with_seed(&ctx2, 42);

    assert_eq!(steps1, steps2);
    assert_eq!(found1, found2);
}

#[test]
fn max_steps_budget_halts_exploration_without_erroring() {
    let top = Label(vec![false]);
    let program = vec![Instruction::Mark(top.clone()), Instruction::Jump(top)];
    let ctx = solver::new_context();
    let entry = create_entry_state(&ctx, VecDeque::new());
    let config = ExploreConfig { max_steps: Some(3), loop_limit: 1000, ..ExploreConfig::default() };
    let mut group = PathGroup::new(program, entry, &config);
    group.explore(&config);

    assert_eq!(group.steps_taken(), 3);
    assert_eq!(group.active().len(), 1);
    assert!(group.found().is_empty());
}

#[test]
fn avoid_pattern_prunes_a_path_without_reaching_find() {
    let program = vec![
        Instruction::Push(b'X' as i64),
        Instruction::OutChar,
        Instruction::Push(b'Y' as i64),
        Instruction::OutChar,
        Instruction::Exit,
    ];
    let ctx = solver::new_context();
    let entry = create_entry_state(&ctx, VecDeque::new());
    let config = ExploreConfig { find: b"Y".to_vec(), avoid: b"X".to_vec(), ..ExploreConfig::default() };
    let mut group = PathGroup::new(program, entry, &config);
    group.explore(&config);

    assert!(group.found().is_empty());
    assert_eq!(group.avoided().len(), 1);
}
