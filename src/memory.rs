//! Symbolic heap.
//!
//! Whitespace's `Store`/`Retrieve` address an unbounded, sparse address
//! space. Concrete addresses are cheap: a point-wise map. A symbolic address
//! can alias anything, so rather than concretizing it (and forking on every
//! possible alias) we append it to an ordered log and fold the log into a
//! single `ite` chain whenever a read can't be answered from the point-wise
//! map directly. This keeps the state space small at the cost of a larger
//! solver query on symbolic reads.

use std::collections::HashMap;

use z3::Context;

use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct Heap<'ctx> {
    concrete: HashMap<i64, Value<'ctx>>,
    log: Vec<(Value<'ctx>, Value<'ctx>)>,
}

impl<'ctx> Heap<'ctx> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, addr: &Value<'ctx>, value: Value<'ctx>) {
        match addr.as_concrete() {
            Some(a) => {
                self.concrete.insert(a, value);
            }
            None => self.log.push((addr.clone(), value)),
        }
    }

    /// Read the value at `addr`, folding the symbolic write log when the
    /// point-wise map can't answer directly. Unwritten addresses read as
    /// `Concrete(0)`.
    pub fn retrieve(&self, addr: &Value<'ctx>, ctx: &'ctx Context) -> Value<'ctx> {
        if let Some(a) = addr.as_concrete() {
            if let Some(v) = self.concrete.get(&a) {
                return v.clone();
            }
        }
        self.log.iter().rev().fold(Value::concrete(0), |acc, (a, v)| {
            Value::ite(&addr.eq_pred(a, ctx), v, &acc, ctx)
        })
    }
}
