//! SAT literals and clauses, and the Tseitin encodings of the gates fed to the oracle.
//!
//! Literals follow the DIMACS convention: variable `v` (0-based) is the literal
//! `v + 1`, its negation is `-(v + 1)`.
//!
//! The AIG constant node is given a regular variable, assumed false for every query
//! (see [`crate::sat::SatOracle`]).

use std::ops::Not;

/// A SAT variable, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(u32);

impl Var {
    pub fn from_index(index: usize) -> Self {
        Var(u32::try_from(index).unwrap_or_else(|_| panic!("too many SAT variables ({})", index)))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The literal of this variable, negated iff `negated` is set.
    pub fn lit(self, negated: bool) -> Lit {
        let lit = Lit(self.0 as i64 + 1);
        if negated { !lit } else { lit }
    }
}

/// A SAT literal, in DIMACS format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit(i64);

impl Not for Lit {
    type Output = Self;

    fn not(self) -> Self::Output {
        Lit(-self.0)
    }
}

impl Lit {
    pub fn var(self) -> Var {
        Var((self.0.unsigned_abs() - 1) as u32)
    }

    pub fn is_negated(self) -> bool {
        self.0 < 0
    }

    pub fn to_dimacs(self) -> i64 {
        self.0
    }
}

/// A SAT clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause(Vec<Lit>);

impl Clause {
    pub fn lits(&self) -> &[Lit] {
        &self.0
    }
}

impl From<Vec<Lit>> for Clause {
    fn from(value: Vec<Lit>) -> Self {
        Clause(value)
    }
}

/// Clauses that encode `z = AND(a, b)`.
pub fn and_clauses(z: Lit, a: Lit, b: Lit) -> [Clause; 3] {
    [
        Clause::from(vec![a, !z]),
        Clause::from(vec![b, !z]),
        Clause::from(vec![!a, !b, z]),
    ]
}

/// Clauses that encode `z = XOR(a, b)`.
pub fn xor_clauses(z: Lit, a: Lit, b: Lit) -> [Clause; 4] {
    [
        Clause::from(vec![a, b, !z]),
        Clause::from(vec![a, !b, z]),
        Clause::from(vec![!a, b, z]),
        Clause::from(vec![!a, !b, !z]),
    ]
}
