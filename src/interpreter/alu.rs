//! Arithmetic opcodes.
//!
//! `Add`/`Sub`/`Mul` never fail. `Div`/`Mod` can: if the divisor is
//! concretely zero the state errors outright, and if it's symbolic but
//! *could* be zero under the current path constraints, the step forks into
//! a normal-division successor (divisor ≠ 0 asserted) and an
//! `Errored(DivByZero)` successor (divisor == 0 asserted), per §4.1.

use super::{pop, Dispatch};
use crate::error::RuntimeErrorKind;
use crate::instruction::Instruction;
use crate::interpreter::Interpreter;
use crate::state::{State, Status};
use crate::value::Value;

pub(super) fn step<'ctx>(
    _interp: &Interpreter,
    state: &mut State<'ctx>,
    instruction: &Instruction,
) -> Result<Dispatch<'ctx>, RuntimeErrorKind> {
    let b = pop(state)?;
    let a = pop(state)?;
    let ctx = state.solver.context();

    let result = match instruction {
        Instruction::Add => a.add(&b, ctx),
        Instruction::Sub => a.sub(&b, ctx),
        Instruction::Mul => a.mul(&b, ctx),
        Instruction::Div | Instruction::Mod => return divmod(state, instruction, a, b),
        _ => unreachable!("alu::step only dispatches arithmetic instructions"),
    };
    state.stack.push(result);
    state.pc += 1;
    Ok(Dispatch::Single)
}

fn divmod<'ctx>(
    state: &mut State<'ctx>,
    instruction: &Instruction,
    a: Value<'ctx>,
    b: Value<'ctx>,
) -> Result<Dispatch<'ctx>, RuntimeErrorKind> {
    match b.as_concrete() {
        Some(0) => Err(RuntimeErrorKind::DivByZero),
        Some(_) => {
            push_quotient(state, instruction, &a, &b);
            state.pc += 1;
            Ok(Dispatch::Single)
        }
        None => fork_on_zero_divisor(state, instruction, a, b),
    }
}

fn push_quotient<'ctx>(state: &mut State<'ctx>, instruction: &Instruction, a: &Value<'ctx>, b: &Value<'ctx>) {
    let ctx = state.solver.context();
    let result = match instruction {
        Instruction::Div => a.sdiv(b, ctx),
        Instruction::Mod => a.smod(b, ctx),
        _ => unreachable!(),
    };
    state.stack.push(result);
}

fn fork_on_zero_divisor<'ctx>(
    state: &mut State<'ctx>,
    instruction: &Instruction,
    a: Value<'ctx>,
    b: Value<'ctx>,
) -> Result<Dispatch<'ctx>, RuntimeErrorKind> {
    let ctx = state.solver.context();
    let is_zero = b.is_zero(ctx).to_ast(ctx);
    let is_nonzero = is_zero.not();

    let mut continuation = state.fork();
    continuation.solver.add(&is_nonzero);
    if continuation.solver.check() {
        push_quotient(&mut continuation, instruction, &a, &b);
        continuation.pc += 1;
    } else {
        continuation.status = Status::Unsat;
    }

    let mut zero_branch = state.fork();
    zero_branch.solver.add(&is_zero);
    zero_branch.status = if zero_branch.solver.check() {
        Status::Errored(RuntimeErrorKind::DivByZero)
    } else {
        Status::Unsat
    };

    *state = continuation;
    Ok(Dispatch::Forked(vec![zero_branch]))
}
