//! Runtime state representation for one execution path.

use std::collections::{HashMap, VecDeque};

use z3::Context;

use crate::error::RuntimeErrorKind;
use crate::instruction::{Instruction, Label};
use crate::memory::Heap;
use crate::solver::SolverContext;
use crate::value::Value;

/// Where a state stands relative to the exploration's goal/avoid patterns and
/// the interpreter's own termination conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// Still steppable.
    Active,
    /// Hit `Exit`, the loop limit, or ran out of program.
    Deadended,
    /// Stdout matched the exploration's `find` pattern.
    Found,
    /// Stdout matched the exploration's `avoid` pattern.
    Avoided,
    /// Hit a state-local runtime error.
    Errored(RuntimeErrorKind),
    /// The solver proved the state's own path constraints infeasible.
    Unsat,
}

impl Status {
    pub const fn should_continue(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Label bitstring → instruction index, built once from a program's `Mark`
/// instructions before any state runs.
pub type LabelTable = HashMap<Label, usize>;

/// A complete snapshot of one execution path: everything the interpreter
/// needs to take the next step, and nothing it shares with any other path.
/// Deliberately not `Clone`: copying a state's solver context requires
/// [`State::fork`], which produces an independent constraint log rather than
/// an aliased one. Every symbolic field borrows the same `'ctx` `z3::Context`
/// that the state's own [`SolverContext`] does.
#[derive(Debug)]
pub struct State<'ctx> {
    pub pc: usize,
    pub stack: Vec<Value<'ctx>>,
    pub heap: Heap<'ctx>,
    pub call_stack: Vec<usize>,
    pub stdin: VecDeque<Value<'ctx>>,
    /// Bytes already popped off `stdin` by `ReadChar`/`ReadNum`, in the order
    /// they were read. Kept so a witness report can reconstruct the full
    /// input a `Found` state consumed, not just what's left unread.
    pub stdin_consumed: Vec<Value<'ctx>>,
    pub stdout: Vec<Value<'ctx>>,
    pub solver: SolverContext<'ctx>,
    pub loop_counts: HashMap<usize, u64>,
    pub status: Status,
}

impl<'ctx> State<'ctx> {
    /// A fresh entry state at `pc = 0` with an empty stack, heap, and call
    /// stack, and the given stdin queue already loaded.
    pub fn entry(ctx: &'ctx Context, stdin: VecDeque<Value<'ctx>>) -> Self {
        Self {
            pc: 0,
            stack: Vec::new(),
            heap: Heap::new(),
            call_stack: Vec::new(),
            stdin,
            stdin_consumed: Vec::new(),
            stdout: Vec::new(),
            solver: SolverContext::new(ctx),
            loop_counts: HashMap::new(),
            status: Status::Active,
        }
    }

    /// Independent copy for branch forking: same stack/heap/stdin/stdout
    /// contents, but a solver that can accumulate its own future assertions
    /// without the parent (or its sibling) observing them.
    pub fn fork(&self) -> Self {
        Self {
            pc: self.pc,
            stack: self.stack.clone(),
            heap: self.heap.clone(),
            call_stack: self.call_stack.clone(),
            stdin: self.stdin.clone(),
            stdin_consumed: self.stdin_consumed.clone(),
            stdout: self.stdout.clone(),
            solver: self.solver.fork(),
            loop_counts: self.loop_counts.clone(),
            status: self.status,
        }
    }

    /// Record a jump to `target`, bumping the loop counter and deadending
    /// the state if a backward jump has run past `loop_limit`.
    pub fn jump_to(&mut self, target: usize, loop_limit: u64) {
        if target <= self.pc {
            let count = self.loop_counts.entry(target).or_insert(0);
            *count += 1;
            if *count > loop_limit {
                self.status = Status::Deadended;
                return;
            }
        }
        self.pc = target;
    }

    /// Concrete assignment for `vars` under the state's current model.
    /// `None` if the path is unsatisfiable.
    pub fn concretize(&self, vars: &[Value<'ctx>]) -> Option<Vec<i64>> {
        let model = self.solver.model()?;
        Some(
            vars.iter()
                .map(|v| match v.as_concrete() {
                    Some(n) => n,
                    None => crate::solver::eval_bv_i64(&model, &v.to_bv(self.solver.context())),
                })
                .collect(),
        )
    }

    /// Concrete stdin bytes under the state's current model, for reporting a
    /// witness: the bytes already consumed by `ReadChar`/`ReadNum`, in read
    /// order, followed by whatever remains unread. `None` if the path is
    /// unsatisfiable.
    pub fn concretize_stdin(&self) -> Option<Vec<u8>> {
        let vars: Vec<Value<'ctx>> = self.stdin_consumed.iter().chain(self.stdin.iter()).cloned().collect();
        Some(self.concretize(&vars)?.into_iter().map(|n| n as u8).collect())
    }
}

/// Build a fresh entry state at `pc = 0` for `stdin`, rooted in `ctx`.
pub fn create_entry_state<'ctx>(ctx: &'ctx Context, stdin: VecDeque<Value<'ctx>>) -> State<'ctx> {
    State::entry(ctx, stdin)
}
