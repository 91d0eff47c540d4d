//! Symbolic value layer: a thin wrapper over SMT bitvectors and concrete
//! 32-bit integers, plus the arithmetic lowering rule that keeps concrete
//! computation on the fast path and only touches the solver when an operand
//! is actually symbolic.

use crate::consts::WORD_WIDTH;
use z3::ast::{Ast, Bool, BV};
use z3::Context;

/// A Whitespace number: either fully known, or a bitvector tracked by the
/// solver. Every `Value` the interpreter ever constructs is [`WORD_WIDTH`]
/// bits wide — bytes read from stdin are zero-extended to that width the
/// moment they are created, so arithmetic never has to reason about mixed
/// widths. Borrows `'ctx` from whichever `z3::Context` produced its
/// symbolic half, the same way `z3::ast::BV`/`Bool` themselves do.
#[derive(Debug, Clone)]
pub enum Value<'ctx> {
    /// A concretely known 32-bit value, stored sign-extended in an `i64` for
    /// convenient host-language arithmetic.
    Concrete(i64),
    /// A value tracked symbolically by the solver.
    Symbolic(BV<'ctx>),
}

/// A boolean predicate over `Value`s — the result of a comparison, used to
/// decide branches and to build heap `ite` chains.
#[derive(Debug, Clone)]
pub enum Pred<'ctx> {
    Concrete(bool),
    Symbolic(Bool<'ctx>),
}

impl<'ctx> Value<'ctx> {
    /// Wrap a concrete number, truncating it into the engine's word width.
    pub fn concrete(n: i64) -> Self {
        Self::Concrete(wrap32(n))
    }

    /// Allocate a fresh symbolic variable of [`WORD_WIDTH`] bits.
    pub fn fresh_symbolic(ctx: &'ctx Context, name: &str) -> Self {
        Self::Symbolic(BV::new_const(ctx, name, WORD_WIDTH))
    }

    /// Allocate a fresh symbolic byte (e.g. one stdin character), already
    /// zero-extended to [`WORD_WIDTH`].
    pub fn fresh_symbolic_byte(ctx: &'ctx Context, name: &str) -> Self {
        let byte = BV::new_const(ctx, name, crate::consts::BYTE_WIDTH);
        Self::Symbolic(byte.zero_ext(WORD_WIDTH - crate::consts::BYTE_WIDTH))
    }

    pub fn is_concrete(&self) -> bool {
        matches!(self, Self::Concrete(_))
    }

    pub fn as_concrete(&self) -> Option<i64> {
        match self {
            Self::Concrete(n) => Some(*n),
            Self::Symbolic(_) => None,
        }
    }

    /// Lift to a bitvector AST, regardless of whether `self` is concrete.
    pub fn to_bv(&self, ctx: &'ctx Context) -> BV<'ctx> {
        match self {
            Self::Concrete(n) => BV::from_i64(ctx, *n, WORD_WIDTH),
            Self::Symbolic(bv) => bv.clone(),
        }
    }

    fn binop(
        &self,
        other: &Value<'ctx>,
        ctx: &'ctx Context,
        concrete: impl FnOnce(i64, i64) -> i64,
        symbolic: impl FnOnce(&BV<'ctx>, &BV<'ctx>) -> BV<'ctx>,
    ) -> Value<'ctx> {
        match (self, other) {
            (Value::Concrete(a), Value::Concrete(b)) => Value::Concrete(concrete(*a, *b)),
            _ => Value::Symbolic(symbolic(&self.to_bv(ctx), &other.to_bv(ctx))),
        }
    }

    pub fn add(&self, other: &Value<'ctx>, ctx: &'ctx Context) -> Value<'ctx> {
        self.binop(other, ctx, |a, b| wrapping32(a, b, i32::wrapping_add), BV::bvadd)
    }

    pub fn sub(&self, other: &Value<'ctx>, ctx: &'ctx Context) -> Value<'ctx> {
        self.binop(other, ctx, |a, b| wrapping32(a, b, i32::wrapping_sub), BV::bvsub)
    }

    pub fn mul(&self, other: &Value<'ctx>, ctx: &'ctx Context) -> Value<'ctx> {
        self.binop(other, ctx, |a, b| wrapping32(a, b, i32::wrapping_mul), BV::bvmul)
    }

    /// Floor division — truncates toward negative infinity, matching Python
    /// and the Whitespace reference. Caller is responsible for the
    /// divide-by-zero feasibility check (§4.1); this assumes `other != 0`.
    pub fn sdiv(&self, other: &Value<'ctx>, ctx: &'ctx Context) -> Value<'ctx> {
        self.binop(other, ctx, floor_div, |a, b| floor_div_bv(ctx, a, b))
    }

    /// Floor modulo, sign following the divisor. Same zero-divisor caveat as
    /// [`Self::sdiv`].
    pub fn smod(&self, other: &Value<'ctx>, ctx: &'ctx Context) -> Value<'ctx> {
        self.binop(other, ctx, floor_mod, |a, b| floor_mod_bv(ctx, a, b))
    }

    pub fn eq_pred(&self, other: &Value<'ctx>, ctx: &'ctx Context) -> Pred<'ctx> {
        match (self, other) {
            (Value::Concrete(a), Value::Concrete(b)) => Pred::Concrete(a == b),
            _ => Pred::Symbolic(self.to_bv(ctx)._eq(&other.to_bv(ctx))),
        }
    }

    pub fn ne_pred(&self, other: &Value<'ctx>, ctx: &'ctx Context) -> Pred<'ctx> {
        self.eq_pred(other, ctx).not()
    }

    pub fn slt_pred(&self, other: &Value<'ctx>, ctx: &'ctx Context) -> Pred<'ctx> {
        match (self, other) {
            (Value::Concrete(a), Value::Concrete(b)) => Pred::Concrete(a < b),
            _ => Pred::Symbolic(self.to_bv(ctx).bvslt(&other.to_bv(ctx))),
        }
    }

    pub fn sle_pred(&self, other: &Value<'ctx>, ctx: &'ctx Context) -> Pred<'ctx> {
        self.slt_pred(other, ctx).or(&self.eq_pred(other, ctx), ctx)
    }

    pub fn sgt_pred(&self, other: &Value<'ctx>, ctx: &'ctx Context) -> Pred<'ctx> {
        other.slt_pred(self, ctx)
    }

    pub fn sge_pred(&self, other: &Value<'ctx>, ctx: &'ctx Context) -> Pred<'ctx> {
        other.sle_pred(self, ctx)
    }

    /// Predicate for the `JumpZero` condition.
    pub fn is_zero(&self, ctx: &'ctx Context) -> Pred<'ctx> {
        self.eq_pred(&Value::Concrete(0), ctx)
    }

    /// Predicate for the `JumpNegative` condition.
    pub fn is_negative(&self, ctx: &'ctx Context) -> Pred<'ctx> {
        self.slt_pred(&Value::Concrete(0), ctx)
    }

    /// Narrow to the low 8 bits, re-widened to [`WORD_WIDTH`] — used by
    /// `OutChar`, which preserves symbolism rather than concretizing.
    pub fn truncate8(&self) -> Value<'ctx> {
        match self {
            Value::Concrete(n) => Value::Concrete((*n as u8) as i64),
            Value::Symbolic(bv) => {
                let byte = bv.extract(crate::consts::BYTE_WIDTH - 1, 0);
                Value::Symbolic(byte.zero_ext(WORD_WIDTH - crate::consts::BYTE_WIDTH))
            }
        }
    }

    /// `ite(cond, self, other)` — used by the lazy symbolic heap to fold an
    /// association list of `(addr, value)` pairs into a single expression.
    pub fn ite(cond: &Pred<'ctx>, a: &Value<'ctx>, b: &Value<'ctx>, ctx: &'ctx Context) -> Value<'ctx> {
        match cond {
            Pred::Concrete(true) => a.clone(),
            Pred::Concrete(false) => b.clone(),
            Pred::Symbolic(c) => Value::Symbolic(c.ite(&a.to_bv(ctx), &b.to_bv(ctx))),
        }
    }
}

impl<'ctx> Pred<'ctx> {
    pub fn not(&self) -> Pred<'ctx> {
        match self {
            Pred::Concrete(b) => Pred::Concrete(!b),
            Pred::Symbolic(b) => Pred::Symbolic(b.not()),
        }
    }

    pub fn and(&self, other: &Pred<'ctx>, ctx: &'ctx Context) -> Pred<'ctx> {
        match (self, other) {
            (Pred::Concrete(a), Pred::Concrete(b)) => Pred::Concrete(*a && *b),
            (Pred::Concrete(false), _) | (_, Pred::Concrete(false)) => Pred::Concrete(false),
            (Pred::Concrete(true), p) | (p, Pred::Concrete(true)) => p.clone(),
            (a, b) => Pred::Symbolic(Bool::and(ctx, &[&a.to_ast(ctx), &b.to_ast(ctx)])),
        }
    }

    pub fn or(&self, other: &Pred<'ctx>, ctx: &'ctx Context) -> Pred<'ctx> {
        match (self, other) {
            (Pred::Concrete(a), Pred::Concrete(b)) => Pred::Concrete(*a || *b),
            (Pred::Concrete(true), _) | (_, Pred::Concrete(true)) => Pred::Concrete(true),
            (Pred::Concrete(false), p) | (p, Pred::Concrete(false)) => p.clone(),
            (a, b) => Pred::Symbolic(Bool::or(ctx, &[&a.to_ast(ctx), &b.to_ast(ctx)])),
        }
    }

    pub fn as_concrete(&self) -> Option<bool> {
        match self {
            Pred::Concrete(b) => Some(*b),
            Pred::Symbolic(_) => None,
        }
    }

    pub fn to_ast(&self, ctx: &'ctx Context) -> Bool<'ctx> {
        match self {
            Pred::Concrete(b) => Bool::from_bool(ctx, *b),
            Pred::Symbolic(b) => b.clone(),
        }
    }
}

fn wrap32(n: i64) -> i64 {
    (n as i32) as i64
}

fn wrapping32(a: i64, b: i64, f: impl FnOnce(i32, i32) -> i32) -> i64 {
    f(a as i32, b as i32) as i64
}

/// Division truncating toward negative infinity (Python/Whitespace `//`).
fn floor_div(a: i64, b: i64) -> i64 {
    let a = a as i32;
    let b = b as i32;
    let q = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    wrap32((if r != 0 && (r < 0) != (b < 0) { q - 1 } else { q }) as i64)
}

/// Modulo with the sign of the divisor (Python/Whitespace `%`).
fn floor_mod(a: i64, b: i64) -> i64 {
    let a = a as i32;
    let b = b as i32;
    let r = a.wrapping_rem(b);
    wrap32((if r != 0 && (r < 0) != (b < 0) { r + b } else { r }) as i64)
}

/// `r != 0 && sign(r) != sign(b)` — the condition under which truncating
/// division needs correcting into a floor division.
fn needs_floor_adjust<'ctx>(ctx: &'ctx Context, r: &BV<'ctx>, b: &BV<'ctx>) -> Bool<'ctx> {
    let zero = BV::from_i64(ctx, 0, WORD_WIDTH);
    let r_nonzero = r._eq(&zero).not();
    let sign_mismatch = r.bvslt(&zero)._eq(&b.bvslt(&zero)).not();
    Bool::and(ctx, &[&r_nonzero, &sign_mismatch])
}

fn floor_div_bv<'ctx>(ctx: &'ctx Context, a: &BV<'ctx>, b: &BV<'ctx>) -> BV<'ctx> {
    let q = a.bvsdiv(b);
    let r = a.bvsrem(b);
    needs_floor_adjust(ctx, &r, b).ite(&q.bvsub(&BV::from_i64(ctx, 1, WORD_WIDTH)), &q)
}

fn floor_mod_bv<'ctx>(ctx: &'ctx Context, a: &BV<'ctx>, b: &BV<'ctx>) -> BV<'ctx> {
    let r = a.bvsrem(b);
    needs_floor_adjust(ctx, &r, b).ite(&r.bvadd(b), &r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::TestResult;
    use quickcheck_macros::quickcheck;
    use z3::Config;

    #[quickcheck]
    fn floor_div_and_mod_satisfy_the_division_identity(a: i32, b: i32) -> TestResult {
        if b == 0 || (a == i32::MIN && b == -1) {
            return TestResult::discard();
        }
        let (a, b) = (a as i64, b as i64);
        let q = floor_div(a, b);
        let r = floor_mod(a, b);
        TestResult::from_bool(wrap32(b.wrapping_mul(q).wrapping_add(r)) == wrap32(a))
    }

    #[quickcheck]
    fn floor_mod_takes_the_divisor_sign(a: i32, b: i32) -> TestResult {
        if b == 0 || (a == i32::MIN && b == -1) {
            return TestResult::discard();
        }
        let r = floor_mod(a as i64, b as i64);
        TestResult::from_bool(r == 0 || (r < 0) == (b < 0))
    }

    fn ctx() -> Context {
        Context::new(&Config::new())
    }

    #[test]
    fn concrete_arithmetic_wraps_at_32_bits() {
        let ctx = ctx();
        let a = Value::concrete(i32::MAX as i64);
        let b = Value::concrete(1);
        let sum = a.add(&b, &ctx);
        assert_eq!(sum.as_concrete(), Some(i32::MIN as i64));
    }

    #[test]
    fn floor_division_matches_python_semantics() {
        assert_eq!(floor_div(-7, 2), -4);
        assert_eq!(floor_mod(-7, 2), 1);
        assert_eq!(floor_div(7, -2), -4);
        assert_eq!(floor_mod(7, -2), -1);
    }

    #[test]
    fn symbolic_plus_concrete_is_symbolic() {
        let ctx = ctx();
        let sym = Value::fresh_symbolic(&ctx, "x");
        let con = Value::concrete(5);
        let sum = sym.add(&con, &ctx);
        assert!(!sum.is_concrete());
    }
}
