//! [`Interpreter`] implementation: one-instruction-at-a-time stepping of a
//! [`State`] over a fixed program.

use crate::consts::DEFAULT_LOOP_LIMIT;
use crate::error::RuntimeErrorKind;
use crate::instruction::Instruction;
use crate::state::{LabelTable, State, Status};
use crate::value::Value;

mod alu;
mod flow;
mod io;

/// A step either mutates its one `State` in place (the common case — no
/// branching occurred) or forks it into several. Either way the caller gets
/// back every successor, in order, for the PathGroup to re-bucket.
pub type Successors<'ctx> = Vec<State<'ctx>>;

/// The immutable program a set of states is being explored against: the
/// decoded instruction list, its pre-scanned label table, and the
/// exploration's loop bound. Stateless with respect to any one path —
/// everything path-specific lives on [`State`], so `Interpreter` itself holds
/// no z3 types and needs no lifetime of its own.
#[derive(Debug, Clone)]
pub struct Interpreter {
    program: Vec<Instruction>,
    labels: LabelTable,
    loop_limit: u64,
    find: Vec<u8>,
    avoid: Vec<u8>,
}

impl Interpreter {
    pub fn new(program: Vec<Instruction>, find: Vec<u8>, avoid: Vec<u8>) -> Self {
        Self::with_loop_limit(program, find, avoid, DEFAULT_LOOP_LIMIT)
    }

    pub fn with_loop_limit(program: Vec<Instruction>, find: Vec<u8>, avoid: Vec<u8>, loop_limit: u64) -> Self {
        let labels = build_label_table(&program);
        Self { program, labels, loop_limit, find, avoid }
    }

    /// Advance one `Active` state by exactly one instruction. Non-`Active`
    /// states are returned unchanged. The returned vector always has at
    /// least one element.
    pub fn step<'ctx>(&self, mut state: State<'ctx>) -> Successors<'ctx> {
        if !state.status.should_continue() {
            return vec![state];
        }

        let Some(instruction) = self.program.get(state.pc).cloned() else {
            state.status = Status::Deadended;
            return vec![state];
        };

        match pop_and_dispatch(self, &mut state, &instruction) {
            Ok(Dispatch::Single) => vec![state],
            Ok(Dispatch::Forked(mut successors)) => {
                successors.insert(0, state);
                successors
            }
            Err(kind) => {
                state.status = Status::Errored(kind);
                vec![state]
            }
        }
    }
}

/// The result of dispatching one instruction against a single state: either
/// it alone was mutated (the instruction wasn't a branch point), or it
/// produced additional sibling states (a feasible conditional jump, or a
/// feasible divide-by-zero).
enum Dispatch<'ctx> {
    Single,
    Forked(Vec<State<'ctx>>),
}

fn pop_and_dispatch<'ctx>(
    interp: &Interpreter,
    state: &mut State<'ctx>,
    instruction: &Instruction,
) -> Result<Dispatch<'ctx>, RuntimeErrorKind> {
    use Instruction::*;
    match instruction {
        Push(n) => {
            state.stack.push(Value::concrete(*n));
            advance(state);
        }
        Duplicate => {
            let top = peek(state, 0)?.clone();
            state.stack.push(top);
            advance(state);
        }
        Copy(n) => {
            let depth = usize::try_from(*n).map_err(|_| RuntimeErrorKind::StackUnderflow)?;
            let value = peek(state, depth)?.clone();
            state.stack.push(value);
            advance(state);
        }
        Swap => {
            let len = state.stack.len();
            if len < 2 {
                return Err(RuntimeErrorKind::StackUnderflow);
            }
            state.stack.swap(len - 1, len - 2);
            advance(state);
        }
        Discard => {
            pop(state)?;
            advance(state);
        }
        Slide(n) => {
            let top = pop(state)?;
            let count = usize::try_from(*n).unwrap_or(0).min(state.stack.len());
            state.stack.truncate(state.stack.len() - count);
            state.stack.push(top);
            advance(state);
        }

        Add | Sub | Mul | Div | Mod => return alu::step(interp, state, instruction),

        Store => {
            let value = pop(state)?;
            let addr = pop(state)?;
            state.heap.store(&addr, value);
            advance(state);
        }
        Retrieve => {
            let addr = pop(state)?;
            let value = state.heap.retrieve(&addr, state.solver.context());
            state.stack.push(value);
            advance(state);
        }

        Mark(_) | Call(_) | Jump(_) | JumpZero(_) | JumpNegative(_) | Return | Exit => {
            return flow::step(interp, state, instruction)
        }

        OutChar | OutNum | ReadChar | ReadNum => return io::step(interp, state, instruction),
    }
    Ok(Dispatch::Single)
}

fn advance(state: &mut State<'_>) {
    state.pc += 1;
}

pub(crate) fn pop<'ctx>(state: &mut State<'ctx>) -> Result<Value<'ctx>, RuntimeErrorKind> {
    state.stack.pop().ok_or(RuntimeErrorKind::StackUnderflow)
}

fn peek<'ctx>(state: &State<'ctx>, depth: usize) -> Result<&Value<'ctx>, RuntimeErrorKind> {
    let len = state.stack.len();
    if depth >= len {
        return Err(RuntimeErrorKind::StackUnderflow);
    }
    Ok(&state.stack[len - 1 - depth])
}

fn build_label_table(program: &[Instruction]) -> LabelTable {
    program
        .iter()
        .enumerate()
        .filter_map(|(i, instr)| match instr {
            Instruction::Mark(label) => Some((label.clone(), i)),
            _ => None,
        })
        .collect()
}
