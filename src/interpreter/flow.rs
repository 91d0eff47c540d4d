//! Flow-control opcodes: labels, calls, jumps, and `Exit`.
//!
//! The two conditional jumps are the interpreter's other fork point besides
//! division: a symbolic predicate forks into a taken branch and a
//! not-taken branch, each with the corresponding constraint asserted, and
//! each dropped if the solver proves it infeasible. Taken is produced first,
//! matching the reference's branch ordering (§4.4, §5).

use super::{pop, Dispatch};
use crate::error::RuntimeErrorKind;
use crate::instruction::{Instruction, Label};
use crate::interpreter::Interpreter;
use crate::state::{State, Status};
use crate::value::{Pred, Value};

pub(super) fn step<'ctx>(
    interp: &Interpreter,
    state: &mut State<'ctx>,
    instruction: &Instruction,
) -> Result<Dispatch<'ctx>, RuntimeErrorKind> {
    match instruction {
        Instruction::Mark(_) => {
            state.pc += 1;
            Ok(Dispatch::Single)
        }
        Instruction::Call(label) => {
            let target = resolve(interp, label)?;
            state.call_stack.push(state.pc + 1);
            state.jump_to(target, interp.loop_limit);
            Ok(Dispatch::Single)
        }
        Instruction::Jump(label) => {
            let target = resolve(interp, label)?;
            state.jump_to(target, interp.loop_limit);
            Ok(Dispatch::Single)
        }
        Instruction::JumpZero(label) => conditional_jump(interp, state, label, Value::is_zero),
        Instruction::JumpNegative(label) => conditional_jump(interp, state, label, Value::is_negative),
        Instruction::Return => {
            let target = state.call_stack.pop().ok_or(RuntimeErrorKind::BadReturn)?;
            state.pc = target;
            Ok(Dispatch::Single)
        }
        Instruction::Exit => {
            state.status = Status::Deadended;
            Ok(Dispatch::Single)
        }
        _ => unreachable!("flow::step only dispatches flow-control instructions"),
    }
}

fn resolve(interp: &Interpreter, label: &Label) -> Result<usize, RuntimeErrorKind> {
    interp.labels.get(label).copied().ok_or(RuntimeErrorKind::BadLabel)
}

fn conditional_jump<'ctx>(
    interp: &Interpreter,
    state: &mut State<'ctx>,
    label: &Label,
    predicate: impl FnOnce(&Value<'ctx>, &'ctx z3::Context) -> Pred<'ctx>,
) -> Result<Dispatch<'ctx>, RuntimeErrorKind> {
    let target = resolve(interp, label)?;
    let condition = pop(state)?;
    let ctx = state.solver.context();
    let pred = predicate(&condition, ctx);

    match pred.as_concrete() {
        Some(true) => {
            state.jump_to(target, interp.loop_limit);
            return Ok(Dispatch::Single);
        }
        Some(false) => {
            state.pc += 1;
            return Ok(Dispatch::Single);
        }
        None => {}
    }

    let ctx = state.solver.context();
    let ast = pred.to_ast(ctx);
    let not_ast = ast.not();

    let mut taken = state.fork();
    taken.solver.add(&ast);
    taken.status = if taken.solver.check() { Status::Active } else { Status::Unsat };
    if taken.status == Status::Active {
        taken.jump_to(target, interp.loop_limit);
    }

    let mut not_taken = state.fork();
    not_taken.solver.add(&not_ast);
    not_taken.status = if not_taken.solver.check() { Status::Active } else { Status::Unsat };
    if not_taken.status == Status::Active {
        not_taken.pc += 1;
    }

    *state = taken;
    Ok(Dispatch::Forked(vec![not_taken]))
}
