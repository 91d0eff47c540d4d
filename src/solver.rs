//! Per-state SMT solver handle.
//!
//! Every [`crate::state::State`] owns one [`SolverContext`]: a path-constraint
//! log plus the `z3::Solver` it has been asserted into. States share a single
//! `z3::Context`, borrowed for the lifetime `'ctx` rather than owned —
//! `z3::ast::Bool`/`BV` and `z3::Solver` all borrow from their `Context`, so a
//! `State`/`SolverContext` holding both an owned `Context` and values derived
//! from it would be self-referential. Borrowing `&'ctx Context` from outside
//! instead lets every state share one `Context` cheaply while never sharing a
//! `Solver` — forking a state creates a fresh `Solver` in that shared context
//! and replays the parent's assertion log into it, so the two solvers can
//! diverge from that point on without either one observing the other's future
//! assertions.

use z3::ast::Bool;
use z3::{Config, Context, Model, Params, SatResult, Solver};

/// Per-query timeout. A solver that times out reports `Unknown`, which we
/// fold into `Sat` (§4.2): treating an inconclusive query as feasible is the
/// conservative choice, since it never prunes a path that might actually be
/// reachable.
const QUERY_TIMEOUT_MS: u32 = 2_000;

/// Build the shared `z3::Context` that every state in one `explore` call
/// borrows from. Owned by the caller for as long as any state or solver
/// derived from it is alive.
pub fn new_context() -> Context {
    Context::new(&Config::new())
}

/// A solver instance plus the ordered log of everything that has been
/// asserted into it, so it can be replayed into a sibling solver at fork
/// time.
pub struct SolverContext<'ctx> {
    ctx: &'ctx Context,
    solver: Solver<'ctx>,
    assertions: Vec<Bool<'ctx>>,
}

impl std::fmt::Debug for SolverContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolverContext")
            .field("assertions", &self.assertions.len())
            .finish()
    }
}

impl<'ctx> SolverContext<'ctx> {
    /// A fresh solver with no constraints, borrowing `ctx`.
    pub fn new(ctx: &'ctx Context) -> Self {
        let solver = Solver::new(ctx);
        apply_timeout(ctx, &solver);
        Self { ctx, solver, assertions: Vec::new() }
    }

    pub fn context(&self) -> &'ctx Context {
        self.ctx
    }

    /// Assert a path constraint. Concrete predicates that are always true
    /// are skipped; callers are expected to have already short-circuited
    /// concrete-false predicates into an `unsat`/dead path rather than
    /// asserting them.
    pub fn add(&mut self, constraint: &Bool<'ctx>) {
        self.solver.assert(constraint);
        self.assertions.push(constraint.clone());
    }

    /// Check satisfiability of the accumulated constraints, folding
    /// `Unknown` (e.g. a timed-out query) into `Sat`.
    pub fn check(&self) -> bool {
        !matches!(self.solver.check(), SatResult::Unsat)
    }

    /// A model for the current constraint set, if satisfiable.
    pub fn model(&self) -> Option<Model<'ctx>> {
        match self.solver.check() {
            SatResult::Unsat => None,
            SatResult::Sat | SatResult::Unknown => self.solver.get_model(),
        }
    }

    /// Independent solver over the same constraints, borrowing the same
    /// shared context. The two `SolverContext`s can accumulate different
    /// future assertions without interfering with each other.
    pub fn fork(&self) -> Self {
        let mut child = Self::new(self.ctx);
        for assertion in &self.assertions {
            child.add(assertion);
        }
        child
    }
}

fn apply_timeout(ctx: &Context, solver: &Solver) {
    let mut params = Params::new(ctx);
    params.set_u32("timeout", QUERY_TIMEOUT_MS);
    solver.set_params(&params);
}

/// Extract a concrete `i64` for a bitvector from a satisfying model,
/// defaulting to `0` when the variable is unconstrained (the model is free
/// to pick any value for it).
pub fn eval_bv_i64<'ctx>(model: &Model<'ctx>, bv: &z3::ast::BV<'ctx>) -> i64 {
    model
        .eval(bv, true)
        .and_then(|v| v.as_i64())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::WORD_WIDTH;
    use z3::ast::{Ast, BV};

    #[test]
    fn satisfiable_constraint_set_is_sat() {
        let ctx = new_context();
        let mut solver = SolverContext::new(&ctx);
        let x = BV::new_const(&ctx, "x", WORD_WIDTH);
        let ten = BV::from_i64(&ctx, 10, WORD_WIDTH);
        solver.add(&x._eq(&ten));
        assert!(solver.check());
        let model = solver.model().expect("sat query has a model");
        assert_eq!(eval_bv_i64(&model, &x), 10);
    }

    #[test]
    fn contradictory_constraints_are_unsat() {
        let ctx = new_context();
        let mut solver = SolverContext::new(&ctx);
        let x = BV::new_const(&ctx, "x", WORD_WIDTH);
        let five = BV::from_i64(&ctx, 5, WORD_WIDTH);
        solver.add(&x._eq(&five));
        solver.add(&x._eq(&BV::from_i64(&ctx, 6, WORD_WIDTH)));
        assert!(!solver.check());
    }

    #[test]
    fn fork_diverges_independently() {
        let ctx = new_context();
        let mut parent = SolverContext::new(&ctx);
        let x = BV::new_const(&ctx, "x", WORD_WIDTH);
        parent.add(&x.bvsgt(&BV::from_i64(&ctx, 0, WORD_WIDTH)));

        let mut left = parent.fork();
        let mut right = parent.fork();
        left.add(&x._eq(&BV::from_i64(&ctx, 1, WORD_WIDTH)));
        right.add(&x._eq(&BV::from_i64(&ctx, -1, WORD_WIDTH)));

        assert!(left.check());
        assert!(!right.check(), "x > 0 and x == -1 cannot both hold");
        assert!(parent.check(), "parent's own constraints are untouched by either child");
    }
}
