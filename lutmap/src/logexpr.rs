//! Boolean expressions over numbered variables.
//!
//! A cut describes the function it implements as a [`LogExpr`] whose variable `i` stands for the cut's `i`th leaf.
//! Expressions are evaluated bit-parallel: each variable is given a 64-bit word and bit `b` of the result is the value
//! of the expression under the assignment made of bit `b` of every variable.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

use itertools::Itertools;

/// A Boolean expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LogExpr {
    /// A constant.
    Const(bool),
    /// Variable `var`, inverted if `inv` is set.
    Literal {
        /// Variable number.
        var: usize,
        /// Whether the variable is inverted.
        inv: bool,
    },
    /// The negation of a subexpression.
    Not(Box<LogExpr>),
    /// The conjunction of every operand.
    And(Vec<LogExpr>),
    /// The disjunction of every operand.
    Or(Vec<LogExpr>),
    /// The parity of every operand.
    Xor(Vec<LogExpr>),
}

impl LogExpr {
    /// Constant zero.
    #[must_use]
    pub const fn zero() -> Self {
        Self::Const(false)
    }

    /// Constant one.
    #[must_use]
    pub const fn one() -> Self {
        Self::Const(true)
    }

    /// Variable `var`, inverted if `inv` is set.
    #[must_use]
    pub const fn literal(var: usize, inv: bool) -> Self {
        Self::Literal { var, inv }
    }

    /// Variable `var`.
    #[must_use]
    pub const fn posi_literal(var: usize) -> Self {
        Self::literal(var, false)
    }

    /// The inversion of variable `var`.
    #[must_use]
    pub const fn nega_literal(var: usize) -> Self {
        Self::literal(var, true)
    }

    /// Returns true if this expression is a constant.
    #[must_use]
    pub const fn is_constant(&self) -> bool {
        matches!(self, Self::Const(_))
    }

    /// Returns one more than the largest variable number used, or zero if no variable is used.
    #[must_use]
    pub fn input_size(&self) -> usize {
        match self {
            Self::Const(_) => 0,
            Self::Literal { var, .. } => var + 1,
            Self::Not(expr) => expr.input_size(),
            Self::And(exprs) | Self::Or(exprs) | Self::Xor(exprs) => {
                exprs.iter().map(Self::input_size).max().unwrap_or(0)
            }
        }
    }

    /// Evaluates the expression for 64 assignments at once. `vals[i]` holds the values of variable `i`.
    #[must_use]
    pub fn eval(&self, vals: &[u64]) -> u64 {
        match self {
            Self::Const(false) => 0,
            Self::Const(true) => !0,
            Self::Literal { var, inv } => {
                assert!(
                    *var < vals.len(),
                    "variable {} evaluated with only {} values",
                    var,
                    vals.len()
                );
                if *inv {
                    !vals[*var]
                } else {
                    vals[*var]
                }
            }
            Self::Not(expr) => !expr.eval(vals),
            Self::And(exprs) => exprs.iter().fold(!0, |acc, expr| acc & expr.eval(vals)),
            Self::Or(exprs) => exprs.iter().fold(0, |acc, expr| acc | expr.eval(vals)),
            Self::Xor(exprs) => exprs.iter().fold(0, |acc, expr| acc ^ expr.eval(vals)),
        }
    }
}

impl Not for LogExpr {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::Const(value) => Self::Const(!value),
            Self::Literal { var, inv } => Self::Literal { var, inv: !inv },
            Self::Not(expr) => *expr,
            expr => Self::Not(Box::new(expr)),
        }
    }
}

impl BitAnd for LogExpr {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::And(mut lhs), Self::And(rhs)) => {
                lhs.extend(rhs);
                Self::And(lhs)
            }
            (Self::And(mut lhs), rhs) => {
                lhs.push(rhs);
                Self::And(lhs)
            }
            (lhs, Self::And(mut rhs)) => {
                rhs.insert(0, lhs);
                Self::And(rhs)
            }
            (lhs, rhs) => Self::And(vec![lhs, rhs]),
        }
    }
}

impl BitOr for LogExpr {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Or(mut lhs), Self::Or(rhs)) => {
                lhs.extend(rhs);
                Self::Or(lhs)
            }
            (Self::Or(mut lhs), rhs) => {
                lhs.push(rhs);
                Self::Or(lhs)
            }
            (lhs, Self::Or(mut rhs)) => {
                rhs.insert(0, lhs);
                Self::Or(rhs)
            }
            (lhs, rhs) => Self::Or(vec![lhs, rhs]),
        }
    }
}

impl BitXor for LogExpr {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Xor(mut lhs), Self::Xor(rhs)) => {
                lhs.extend(rhs);
                Self::Xor(lhs)
            }
            (Self::Xor(mut lhs), rhs) => {
                lhs.push(rhs);
                Self::Xor(lhs)
            }
            (lhs, Self::Xor(mut rhs)) => {
                rhs.insert(0, lhs);
                Self::Xor(rhs)
            }
            (lhs, rhs) => Self::Xor(vec![lhs, rhs]),
        }
    }
}

impl fmt::Display for LogExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Const(value) => write!(f, "{}", u8::from(*value)),
            Self::Literal { var, inv } => write!(f, "{}x{}", if *inv { "~" } else { "" }, var),
            Self::Not(expr) => write!(f, "~{}", expr),
            Self::And(exprs) => write!(f, "({})", exprs.iter().join(" & ")),
            Self::Or(exprs) => write!(f, "({})", exprs.iter().join(" | ")),
            Self::Xor(exprs) => write!(f, "({})", exprs.iter().join(" ^ ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LogExpr;

    /// Evaluates `expr` one assignment at a time.
    fn eval_one(expr: &LogExpr, assignment: usize, ni: usize) -> bool {
        let vals = (0..ni)
            .map(|i| if assignment & (1 << i) != 0 { !0 } else { 0 })
            .collect::<Vec<u64>>();
        expr.eval(&vals) & 1 == 1
    }

    #[test]
    fn eval_and() {
        let expr = LogExpr::posi_literal(0) & LogExpr::posi_literal(1);

        assert_eq!(
            (0..4).map(|p| eval_one(&expr, p, 2)).collect::<Vec<_>>(),
            vec![false, false, false, true]
        );
    }

    #[test]
    fn eval_mixed() {
        // (x0 | ~x1) ^ x2
        let expr = (LogExpr::posi_literal(0) | LogExpr::nega_literal(1)) ^ LogExpr::posi_literal(2);

        for p in 0..8 {
            let x0 = p & 1 != 0;
            let x1 = p & 2 != 0;
            let x2 = p & 4 != 0;
            assert_eq!(eval_one(&expr, p, 3), (x0 || !x1) ^ x2, "assignment {}", p);
        }
    }

    #[test]
    fn eval_is_bit_parallel() {
        let expr = LogExpr::posi_literal(0) & LogExpr::nega_literal(1);

        assert_eq!(expr.eval(&[0b1100, 0b1010]), 0b0100);
    }

    #[test]
    fn operators_flatten() {
        let expr = LogExpr::posi_literal(0) & LogExpr::posi_literal(1) & LogExpr::posi_literal(2);

        assert_eq!(
            expr,
            LogExpr::And(vec![
                LogExpr::posi_literal(0),
                LogExpr::posi_literal(1),
                LogExpr::posi_literal(2),
            ])
        );
    }

    #[test]
    fn negation() {
        assert_eq!(!LogExpr::zero(), LogExpr::one());
        assert_eq!(!LogExpr::posi_literal(3), LogExpr::nega_literal(3));

        let and = LogExpr::posi_literal(0) & LogExpr::posi_literal(1);
        let nand = !and.clone();
        assert_eq!(nand, LogExpr::Not(Box::new(and.clone())));
        assert_eq!(!nand.clone(), and);
        assert_eq!(
            (0..4).map(|p| eval_one(&nand, p, 2)).collect::<Vec<_>>(),
            vec![true, true, true, false]
        );
    }

    #[test]
    fn input_size() {
        assert_eq!(LogExpr::one().input_size(), 0);
        assert_eq!(
            (LogExpr::posi_literal(4) | LogExpr::nega_literal(1)).input_size(),
            5
        );
    }

    #[test]
    fn display() {
        let expr = !(LogExpr::posi_literal(0) & LogExpr::nega_literal(1)) | LogExpr::one();

        assert_eq!(expr.to_string(), "(~(x0 & ~x1) | 1)");
    }

    #[test]
    #[should_panic(expected = "variable 2 evaluated with only 2 values")]
    fn eval_missing_variable() {
        let _ = LogExpr::posi_literal(2).eval(&[0, 0]);
    }
}
