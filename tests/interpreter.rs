//! Per-opcode interpreter behavior, independent of the path-group scheduler.

use std::collections::VecDeque;

use whitesymex::interpreter::Interpreter;
use whitesymex::instruction::{Instruction, Label};
use whitesymex::solver;
use whitesymex::state::{create_entry_state, State, Status};
use whitesymex::value::Value;
use z3::Context;

fn run_to_completion<'ctx>(ctx: &'ctx Context, program: Vec<Instruction>) -> State<'ctx> {
    let interp = Interpreter::new(program, Vec::new(), Vec::new());
    let mut state = create_entry_state(ctx, VecDeque::new());
    loop {
        if !state.status.should_continue() {
            return state;
        }
        let mut successors = interp.step(state);
        assert_eq!(successors.len(), 1, "no-branch program forked unexpectedly");
        state = successors.remove(0);
    }
}

#[test]
fn push_and_add() {
    let ctx = solver::new_context();
    let state = run_to_completion(
        &ctx,
        vec![Instruction::Push(2), Instruction::Push(3), Instruction::Add, Instruction::Exit],
    );
    assert_eq!(state.status, Status::Deadended);
    assert_eq!(state.stack.last().unwrap().as_concrete(), Some(5));
}

#[test]
fn discard_on_empty_stack_errors() {
    let ctx = solver::new_context();
    let state = run_to_completion(&ctx, vec![Instruction::Discard]);
    assert!(matches!(state.status, Status::Errored(_)));
}

#[test]
fn floor_division_matches_whitespace_convention() {
    let ctx = solver::new_context();
    let state = run_to_completion(
        &ctx,
        vec![Instruction::Push(-7), Instruction::Push(2), Instruction::Div, Instruction::Exit],
    );
    assert_eq!(state.stack.last().unwrap().as_concrete(), Some(-4));
}

#[test]
fn concrete_division_by_zero_errors_immediately() {
    let ctx = solver::new_context();
    let state = run_to_completion(&ctx, vec![Instruction::Push(5), Instruction::Push(0), Instruction::Div]);
    assert_eq!(state.status, Status::Errored(whitesymex::error::RuntimeErrorKind::DivByZero));
}

#[test]
fn store_and_retrieve_round_trip() {
    let ctx = solver::new_context();
    let state = run_to_completion(
        &ctx,
        vec![
            Instruction::Push(4),  // addr
            Instruction::Push(42), // value
            Instruction::Store,
            Instruction::Push(4),
            Instruction::Retrieve,
            Instruction::Exit,
        ],
    );
    assert_eq!(state.stack.last().unwrap().as_concrete(), Some(42));
}

#[test]
fn call_and_return_resume_after_the_call_site() {
    let label = Label(vec![false]);
    let program = vec![
        Instruction::Call(label.clone()),
        Instruction::Push(1),
        Instruction::Exit,
        Instruction::Mark(label),
        Instruction::Push(2),
        Instruction::Return,
    ];
    let ctx = solver::new_context();
    let state = run_to_completion(&ctx, program);
    assert_eq!(state.stack, vec![Value::concrete(2), Value::concrete(1)]);
}

#[test]
fn return_with_empty_call_stack_errors() {
    let ctx = solver::new_context();
    let state = run_to_completion(&ctx, vec![Instruction::Return]);
    assert_eq!(state.status, Status::Errored(whitesymex::error::RuntimeErrorKind::BadReturn));
}

#[test]
fn jump_to_undefined_label_errors() {
    let ctx = solver::new_context();
    let state = run_to_completion(&ctx, vec![Instruction::Jump(Label(vec![true]))]);
    assert_eq!(state.status, Status::Errored(whitesymex::error::RuntimeErrorKind::BadLabel));
}

#[test]
fn backward_jump_past_loop_limit_deadends() {
    let label = Label(vec![false]);
    let program = vec![Instruction::Mark(label.clone()), Instruction::Jump(label)];
    let ctx = solver::new_context();
    let interp = Interpreter::with_loop_limit(program, Vec::new(), Vec::new(), 3);
    let mut state = create_entry_state(&ctx, VecDeque::new());
    for _ in 0..50 {
        if !state.status.should_continue() {
            break;
        }
        state = interp.step(state).remove(0);
    }
    assert_eq!(state.status, Status::Deadended);
}

#[test]
fn out_char_then_exit_produces_expected_stdout() {
    let ctx = solver::new_context();
    let state = run_to_completion(&ctx, vec![Instruction::Push(65), Instruction::OutChar, Instruction::Exit]);
    assert_eq!(state.stdout.len(), 1);
    assert_eq!(state.stdout[0].as_concrete(), Some(65));
}

#[test]
fn read_char_past_end_of_stdin_errors() {
    let ctx = solver::new_context();
    let interp = Interpreter::new(vec![Instruction::Push(0), Instruction::ReadChar], Vec::new(), Vec::new());
    let state = create_entry_state(&ctx, VecDeque::new());
    let state = interp.step(state).remove(0);
    assert_eq!(state.status, Status::Errored(whitesymex::error::RuntimeErrorKind::EofStdin));
}
