//! I/O opcodes and the goal/avoid output scan.
//!
//! `OutChar`/`OutNum` append to `stdout`; every append is followed by a scan
//! of the whole buffer for the exploration's `find`/`avoid` byte patterns.
//! `find` is resolved optimistically: a window that *could* equal the
//! pattern under some model has that equality asserted and the state becomes
//! `Found`. `avoid` is resolved pessimistically: a window that *could* equal
//! the pattern is enough to mark the state `Avoided`, without committing to
//! the equality, since we want to prune the path rather than steer toward it
//! (§4.4).

use super::{pop, Dispatch};
use crate::error::RuntimeErrorKind;
use crate::instruction::Instruction;
use crate::interpreter::Interpreter;
use crate::state::{State, Status};
use crate::value::Value;
use z3::ast::Ast;

pub(super) fn step<'ctx>(
    interp: &Interpreter,
    state: &mut State<'ctx>,
    instruction: &Instruction,
) -> Result<Dispatch<'ctx>, RuntimeErrorKind> {
    match instruction {
        Instruction::OutChar => {
            let value = pop(state)?;
            let byte = value.truncate8();
            state.stdout.push(byte);
            state.pc += 1;
            scan_output(interp, state);
        }
        Instruction::OutNum => {
            let value = pop(state)?;
            for digit in decimal_digits(state, &value) {
                state.stdout.push(Value::concrete(digit as i64));
            }
            state.pc += 1;
            scan_output(interp, state);
        }
        Instruction::ReadChar => {
            let addr = pop(state)?;
            let byte = state.stdin.pop_front().ok_or(RuntimeErrorKind::EofStdin)?;
            state.stdin_consumed.push(byte.clone());
            state.heap.store(&addr, byte);
            state.pc += 1;
        }
        Instruction::ReadNum => {
            let addr = pop(state)?;
            let n = read_num(state)?;
            state.heap.store(&addr, Value::concrete(n));
            state.pc += 1;
        }
        _ => unreachable!("io::step only dispatches I/O instructions"),
    }
    Ok(Dispatch::Single)
}

/// Concretize `value` under the state's current model and render it as
/// ASCII decimal digits — the reference concretizes `OutNum` rather than
/// deferring it (§4.4).
fn decimal_digits<'ctx>(state: &State<'ctx>, value: &Value<'ctx>) -> Vec<u8> {
    let n = match value.as_concrete() {
        Some(n) => n,
        None => {
            let ctx = state.solver.context();
            let bv = value.to_bv(ctx);
            state.solver.model().map_or(0, |m| crate::solver::eval_bv_i64(&m, &bv))
        }
    };
    n.to_string().into_bytes()
}

/// Consume a run of stdin bytes up to and including a terminating newline,
/// parsing them as a signed decimal number. Every byte in the window must
/// already be concrete under the state's current model; a still-symbolic
/// byte is treated the same as running off the end of stdin rather than
/// forked over, which is the documented resolution of the reference's open
/// question about `ReadNum` on symbolic input (§9, DESIGN.md).
fn read_num<'ctx>(state: &mut State<'ctx>) -> Result<i64, RuntimeErrorKind> {
    let mut digits = Vec::new();
    loop {
        let byte = state.stdin.pop_front().ok_or(RuntimeErrorKind::EofStdin)?;
        let concrete = byte.as_concrete().ok_or(RuntimeErrorKind::EofStdin)? as u8;
        state.stdin_consumed.push(byte);
        if concrete == b'\n' {
            break;
        }
        digits.push(concrete);
    }
    std::str::from_utf8(&digits)
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or(RuntimeErrorKind::EofStdin)
}

fn scan_output(interp: &Interpreter, state: &mut State<'_>) {
    if !interp.avoid.is_empty() && matches_conservatively(state, &interp.avoid) {
        state.status = Status::Avoided;
        return;
    }
    if !interp.find.is_empty() && try_commit_match(state, &interp.find) {
        state.status = Status::Found;
    }
}

/// `true` if some window of `stdout` could equal `pattern` under some model,
/// without asserting anything.
fn matches_conservatively(state: &State<'_>, pattern: &[u8]) -> bool {
    windows(state, pattern).any(|equalities| {
        let mut probe = state.solver.fork();
        for eq in &equalities {
            probe.add(eq);
        }
        probe.check()
    })
}

/// Like [`matches_conservatively`], but the first feasible window has its
/// equality constraints permanently asserted into `state`'s own solver, so
/// the resulting `Found` state carries the input that produces it.
fn try_commit_match(state: &mut State<'_>, pattern: &[u8]) -> bool {
    let Some(equalities) = windows(state, pattern).find(|equalities| {
        let mut probe = state.solver.fork();
        for eq in equalities {
            probe.add(eq);
        }
        probe.check()
    }) else {
        return false;
    };
    for eq in &equalities {
        state.solver.add(eq);
    }
    true
}

/// Every contiguous window of `stdout` the length of `pattern`, each
/// represented as the list of byte-equality constraints it would take to
/// force that window to read as `pattern`.
fn windows<'a, 'ctx>(state: &'a State<'ctx>, pattern: &'a [u8]) -> impl Iterator<Item = Vec<z3::ast::Bool<'ctx>>> + 'a {
    let ctx = state.solver.context();
    let len = pattern.len();
    let window_count = if len == 0 || state.stdout.len() < len { 0 } else { state.stdout.len() - len + 1 };
    (0..window_count).map(move |start| {
        state.stdout[start..start + len]
            .iter()
            .zip(pattern)
            .map(|(v, byte)| v.to_bv(ctx)._eq(&z3::ast::BV::from_i64(ctx, *byte as i64, crate::consts::WORD_WIDTH)))
            .collect()
    })
}
