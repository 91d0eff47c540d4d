//! Scheduler over a frontier of live states.
//!
//! A [`PathGroup`] owns every [`State`] a run has ever produced, bucketed by
//! [`Status`]. Each tick it picks one `active` state per [`Strategy`], steps
//! it through the shared [`Interpreter`], and re-buckets every successor.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::consts::{DEFAULT_LOOP_LIMIT, DEFAULT_SEED};
use crate::instruction::Instruction;
use crate::interpreter::Interpreter;
use crate::state::{State, Status};

/// Order in which the `active` bucket's states are offered to the
/// interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// FIFO over insertion order — fair: any reachable state at bounded
    /// depth is eventually selected.
    Bfs,
    /// LIFO — children before siblings. No fairness guarantee.
    Dfs,
    /// Uniform choice from an explicit, seedable generator. No fairness
    /// guarantee, but reproducible given a fixed seed.
    Random,
}

/// Explicit configuration for one `explore` run, gathering what would
/// otherwise be a long, easy-to-misorder argument list. Holds no z3 types,
/// so unlike [`PathGroup`] it needs no `'ctx` lifetime of its own.
#[derive(Debug, Clone)]
pub struct ExploreConfig {
    pub find: Vec<u8>,
    pub avoid: Vec<u8>,
    pub strategy: Strategy,
    pub loop_limit: u64,
    pub max_steps: Option<u64>,
    pub seed: Option<u64>,
}

impl Default for ExploreConfig {
    fn default() -> Self {
        Self {
            find: Vec::new(),
            avoid: Vec::new(),
            strategy: Strategy::Bfs,
            loop_limit: DEFAULT_LOOP_LIMIT,
            max_steps: None,
            seed: None,
        }
    }
}

pub struct PathGroup<'ctx> {
    interpreter: Interpreter,
    strategy: Strategy,
    rng: StdRng,
    steps_taken: u64,
    /// Both BFS and DFS push new successors to the back; they differ only
    /// in which end `select_next` draws from.
    active: Vec<State<'ctx>>,
    found: Vec<State<'ctx>>,
    avoided: Vec<State<'ctx>>,
    deadended: Vec<State<'ctx>>,
    errored: Vec<State<'ctx>>,
    unsat: Vec<State<'ctx>>,
}

impl<'ctx> PathGroup<'ctx> {
    pub fn new(program: Vec<Instruction>, entry: State<'ctx>, config: &ExploreConfig) -> Self {
        let interpreter = Interpreter::with_loop_limit(program, config.find.clone(), config.avoid.clone(), config.loop_limit);
        Self {
            interpreter,
            strategy: config.strategy,
            rng: StdRng::seed_from_u64(config.seed.unwrap_or(DEFAULT_SEED)),
            steps_taken: 0,
            active: vec![entry],
            found: Vec::new(),
            avoided: Vec::new(),
            deadended: Vec::new(),
            errored: Vec::new(),
            unsat: Vec::new(),
        }
    }

    pub fn active(&self) -> &[State<'ctx>] {
        &self.active
    }

    pub fn found(&self) -> &[State<'ctx>] {
        &self.found
    }

    pub fn avoided(&self) -> &[State<'ctx>] {
        &self.avoided
    }

    pub fn deadended(&self) -> &[State<'ctx>] {
        &self.deadended
    }

    pub fn errored(&self) -> &[State<'ctx>] {
        &self.errored
    }

    pub fn unsat(&self) -> &[State<'ctx>] {
        &self.unsat
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Advance until `active` is empty or the first `found` state appears.
    pub fn explore(&mut self, config: &ExploreConfig) {
        self.explore_until(config, |pg| !pg.found.is_empty());
    }

    /// Advance until `active` is empty, `stop` fires, or `config.max_steps`
    /// is exhausted. Exhausting the step budget is not an error: `explore`
    /// simply returns with whatever classification exists so far (§4.5, §5).
    pub fn explore_until(&mut self, config: &ExploreConfig, mut stop: impl FnMut(&PathGroup<'ctx>) -> bool) {
        while !self.active.is_empty() {
            if stop(self) {
                break;
            }
            if let Some(budget) = config.max_steps {
                if self.steps_taken >= budget {
                    tracing::info!(budget, "step budget exhausted, stopping exploration");
                    break;
                }
            }
            let Some(state) = self.select_next() else { break };
            let pc = state.pc;
            let successors = self.interpreter.step(state);
            self.steps_taken += 1;
            tracing::trace!(pc, successors = successors.len(), "stepped");
            for successor in successors {
                self.classify(successor);
            }
        }
    }

    fn select_next(&mut self) -> Option<State<'ctx>> {
        if self.active.is_empty() {
            return None;
        }
        let index = match self.strategy {
            Strategy::Bfs => 0,
            Strategy::Dfs => self.active.len() - 1,
            Strategy::Random => self.rng.gen_range(0..self.active.len()),
        };
        Some(self.active.remove(index))
    }

    fn classify(&mut self, state: State<'ctx>) {
        match state.status {
            Status::Active => self.active.push(state),
            Status::Found => {
                tracing::debug!("state reached the find pattern");
                self.found.push(state);
            }
            Status::Avoided => self.avoided.push(state),
            Status::Deadended => self.deadended.push(state),
            Status::Errored(kind) => {
                tracing::debug!(%kind, "state errored");
                self.errored.push(state);
            }
            Status::Unsat => self.unsat.push(state),
        }
    }
}
