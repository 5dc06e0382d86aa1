//! The SAT oracle used to prove or refute candidate equivalences.
//!
//! The FRAIG loop only needs an incremental solver: create variables, inject
//! the Tseitin clauses of AND and XOR gates, solve under assumptions and read
//! the model back. [`SatOracle`] captures exactly that, [`VarisatOracle`] is
//! the implementation backed by [varisat](https://docs.rs/varisat).

use varisat::ExtendFormula;

use crate::{
    AigError, Result,
    cnf::{Clause, Lit, Var, and_clauses, xor_clauses},
};

/// An incremental SAT solver.
pub trait SatOracle {
    /// Drops every variable and clause.
    fn reset(&mut self);

    fn new_var(&mut self) -> Var;

    fn add_clause(&mut self, clause: &Clause);

    /// Adds the clauses of `out = (in0 ^ in0_inv) & (in1 ^ in1_inv)`.
    fn add_and_clauses(&mut self, out: Var, in0: Var, in0_inv: bool, in1: Var, in1_inv: bool) {
        for clause in and_clauses(out.lit(false), in0.lit(in0_inv), in1.lit(in1_inv)) {
            self.add_clause(&clause);
        }
    }

    /// Adds the clauses of `out = (in0 ^ in0_inv) xor (in1 ^ in1_inv)`.
    fn add_xor_clauses(&mut self, out: Var, in0: Var, in0_inv: bool, in1: Var, in1_inv: bool) {
        for clause in xor_clauses(out.lit(false), in0.lit(in0_inv), in1.lit(in1_inv)) {
            self.add_clause(&clause);
        }
    }

    /// Assumes `var == value` for the next solve.
    fn assume(&mut self, var: Var, value: bool);

    fn clear_assumptions(&mut self);

    /// Returns true if the formula is satisfiable under the current assumptions.
    fn solve_under_assumptions(&mut self) -> Result<bool>;

    /// Value of `var` in the model of the last satisfiable solve.
    fn get_value(&self, var: Var) -> Option<bool>;
}

/// A [`SatOracle`] backed by varisat's CDCL solver.
pub struct VarisatOracle<'a> {
    solver: varisat::Solver<'a>,
    n_vars: usize,
    assumptions: Vec<varisat::Lit>,
    model: Vec<Option<bool>>,
}

impl Default for VarisatOracle<'_> {
    fn default() -> Self {
        VarisatOracle::new()
    }
}

impl VarisatOracle<'_> {
    pub fn new() -> Self {
        VarisatOracle {
            solver: varisat::Solver::new(),
            n_vars: 0,
            assumptions: Vec::new(),
            model: Vec::new(),
        }
    }

    /// Number of variables created since the last reset.
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }
}

fn to_varisat(lit: Lit) -> varisat::Lit {
    varisat::Lit::from_dimacs(lit.to_dimacs() as isize)
}

impl SatOracle for VarisatOracle<'_> {
    fn reset(&mut self) {
        self.solver = varisat::Solver::new();
        self.n_vars = 0;
        self.assumptions.clear();
        self.model.clear();
    }

    fn new_var(&mut self) -> Var {
        let var = self.solver.new_var();
        self.n_vars += 1;
        Var::from_index(var.index())
    }

    fn add_clause(&mut self, clause: &Clause) {
        let lits: Vec<varisat::Lit> = clause.lits().iter().copied().map(to_varisat).collect();
        self.solver.add_clause(&lits);
    }

    fn assume(&mut self, var: Var, value: bool) {
        self.assumptions.push(to_varisat(var.lit(!value)));
    }

    fn clear_assumptions(&mut self) {
        self.assumptions.clear();
    }

    fn solve_under_assumptions(&mut self) -> Result<bool> {
        self.solver.assume(&self.assumptions);
        self.model.clear();
        let sat = self
            .solver
            .solve()
            .map_err(|e| AigError::Sat(format!("{:?}", e)))?;
        if sat {
            self.model = vec![None; self.n_vars];
            for lit in self.solver.model().unwrap_or_default() {
                if let Some(value) = self.model.get_mut(lit.var().index()) {
                    *value = Some(lit.is_positive());
                }
            }
        }
        Ok(sat)
    }

    fn get_value(&self, var: Var) -> Option<bool> {
        self.model.get(var.index()).copied().flatten()
    }
}
