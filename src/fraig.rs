//! Functionally reduced AIGs: SAT sweeping of the FEC groups.
//!
//! Simulation only tells which nodes *might* be equivalent. The FRAIG loop
//! settles every candidate with the SAT oracle:
//! - proven pairs are merged, lazily and in batches,
//! - counterexamples are turned into new simulation patterns which split the
//!   groups further.
//!
//! Rounds are repeated until no FEC group remains. Use [`Aig::fraig`] for the
//! default setup, or [`Aig::fraig_with`] to pick the oracle and the configuration.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::{
    Aig, AigError, AigNodeKind, NodeId, Result,
    cnf::Var,
    sat::{SatOracle, VarisatOracle},
    sim::PatternBatch,
};

/// Shared flag to stop a long running operation.
///
/// Polled by the random simulation loop and between two SAT queries.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct FraigConfig {
    /// Pending merges are applied once this fraction of the topological order is processed.
    pub merge_threshold_start: f64,
    /// Added to the threshold after each batch of merges, up to 1.
    pub merge_threshold_step: f64,
    /// Seed of the random simulation run when the AIG was never simulated.
    pub seed: u64,
    pub cancel: Option<CancelToken>,
}

impl Default for FraigConfig {
    fn default() -> Self {
        FraigConfig {
            merge_threshold_start: 0.2,
            merge_threshold_step: 0.2,
            seed: 0x5eed,
            cancel: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FraigState {
    Idle,
    SatRoundSetup,
    ProveNextPair,
    Merge,
    CollectCounterexample,
    Converged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FraigStats {
    pub rounds: usize,
    pub sat_calls: usize,
    /// Pairs proven equivalent.
    pub proven: usize,
    /// Pairs split by a counterexample.
    pub disproven: usize,
    /// Nodes removed by the proven merges.
    pub merges: usize,
    /// Times pending merges were applied to the AIG.
    pub merge_batches: usize,
    /// Nodes removed by structural hashing along the way.
    pub strash_merges: usize,
    pub resimulations: usize,
    /// Random patterns simulated before the first round.
    pub random_patterns: usize,
}

/// `dead` was proven to compute `alive ^ inverted`.
#[derive(Debug, Clone, Copy)]
struct PendingMerge {
    alive: NodeId,
    dead: NodeId,
    inverted: bool,
}

/// One FRAIG run over an AIG.
pub struct Fraig<'a, S: SatOracle> {
    aig: &'a mut Aig,
    oracle: S,
    config: FraigConfig,
    state: FraigState,
    /// SAT variable of each node, undefined nodes share the constant's.
    vars: Vec<Option<Var>>,
    pending: Vec<PendingMerge>,
    counterexamples: PatternBatch,
    threshold: f64,
    stats: FraigStats,
}

impl<'a, S: SatOracle> Fraig<'a, S> {
    pub fn new(aig: &'a mut Aig, oracle: S, config: FraigConfig) -> Self {
        let counterexamples = PatternBatch::new(aig.get_inputs().len());
        let threshold = config.merge_threshold_start;
        Fraig {
            aig,
            oracle,
            config,
            state: FraigState::Idle,
            vars: Vec::new(),
            pending: Vec::new(),
            counterexamples,
            threshold,
            stats: FraigStats::default(),
        }
    }

    pub fn state(&self) -> FraigState {
        self.state
    }

    fn is_cancelled(&self) -> bool {
        self.config
            .cancel
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
    }

    /// Runs rounds until no FEC group is left.
    ///
    /// On cancellation, merges already proven are applied before returning
    /// [`AigError::Cancelled`].
    pub fn run(mut self) -> Result<FraigStats> {
        self.aig.rebuild();
        if !self.aig.simulated {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);
            self.stats.random_patterns =
                self.aig
                    .random_sim(&mut rng, None, self.config.cancel.as_ref())?;
        }
        self.stats.strash_merges += self.aig.strash();
        self.aig.sweep_invalid_fec_groups();

        while !self.aig.fec.is_empty() {
            self.setup_round()?;
            self.prove_round()?;
            self.stats.rounds += 1;

            self.aig.rebuild();
            self.stats.strash_merges += self.aig.strash();
            self.aig.sweep_invalid_fec_groups();
        }

        self.state = FraigState::Converged;
        self.stats.strash_merges += self.aig.strash();
        self.aig.simulated = false;
        log::info!(
            "Fraig converged after {} rounds: {} merged, {} split, {} SAT calls",
            self.stats.rounds,
            self.stats.merges,
            self.stats.disproven,
            self.stats.sat_calls
        );
        Ok(self.stats)
    }

    fn var(&self, id: NodeId) -> Result<Var> {
        self.vars
            .get(id)
            .copied()
            .flatten()
            .ok_or_else(|| AigError::InvalidState(format!("node {} has no SAT variable", id)))
    }

    /// Fresh solver, one variable per live node and the clauses of every reachable AND gate.
    fn setup_round(&mut self) -> Result<()> {
        self.state = FraigState::SatRoundSetup;
        self.oracle.reset();
        self.oracle.clear_assumptions();

        self.vars = vec![None; self.aig.capacity()];
        let const_var = self.oracle.new_var();
        self.vars[0] = Some(const_var);
        for node in self.aig.iter_nodes() {
            self.vars[node.get_id()] = match node.kind() {
                AigNodeKind::Input { .. } | AigNodeKind::And { .. } => Some(self.oracle.new_var()),
                // Undefined nodes simulate as 0, the SAT side must agree
                AigNodeKind::Undefined => Some(const_var),
                AigNodeKind::False | AigNodeKind::Output { .. } => continue,
            };
        }

        self.aig.build_dfs_list();
        for &id in self.aig.dfs_list() {
            if let &AigNodeKind::And { fanin0, fanin1 } = self.aig.node(id).kind() {
                let out = self.var(id)?;
                let in0 = self.var(fanin0.node)?;
                let in1 = self.var(fanin1.node)?;
                self.oracle
                    .add_and_clauses(out, in0, fanin0.complement, in1, fanin1.complement);
            }
        }

        // Members that are not reachable anymore are never visited by the walk
        let unranked: Vec<NodeId> = self
            .aig
            .fec
            .iter()
            .flat_map(|(_, group)| group.live_members())
            .filter(|member| self.aig.node(member.node).dfs_order().is_none())
            .map(|member| member.node)
            .collect();
        for id in unranked {
            self.aig.excise_from_fec(id);
        }
        self.aig.sort_fec_groups_by_dfs_order();

        self.threshold = self.config.merge_threshold_start;
        log::debug!(
            "Fraig round {}: {} FEC groups",
            self.stats.rounds + 1,
            self.aig.fec.len()
        );
        Ok(())
    }

    /// The representative of the node's group and the relative polarity,
    /// if the node is a candidate.
    fn candidate_pair(&self, id: NodeId) -> Option<(NodeId, bool)> {
        let node = self.aig.get_node(id)?;
        if !node.is_and() {
            return None;
        }
        let slot = node.fec?;
        if slot.index == 0 {
            return None;
        }
        let group = self.aig.fec.get(slot.group)?;
        Some((group.rep()?.node, group.relative_complement(slot.index)?))
    }

    /// Walks the topological order and queries every candidate against its representative.
    fn prove_round(&mut self) -> Result<()> {
        self.state = FraigState::ProveNextPair;
        let order = self.aig.dfs_list().to_vec();
        let total = order.len().max(1) as f64;

        for (position, &id) in order.iter().enumerate() {
            if self.is_cancelled() {
                self.flush_merges();
                return Err(AigError::Cancelled);
            }

            if let Some((rep, inverted)) = self.candidate_pair(id) {
                if self.prove_equivalent(rep, id, inverted)? {
                    self.aig.excise_from_fec(id);
                    self.pending.push(PendingMerge {
                        alive: rep,
                        dead: id,
                        inverted,
                    });
                    self.stats.proven += 1;
                } else {
                    self.collect_counterexample();
                    self.stats.disproven += 1;
                    if self.counterexamples.is_full() {
                        self.resimulate()?;
                    }
                }
                self.state = FraigState::ProveNextPair;
            }

            if !self.pending.is_empty() && (position + 1) as f64 / total > self.threshold {
                self.flush_merges();
                self.threshold = (self.threshold + self.config.merge_threshold_step).min(1.0);
            }
        }

        self.flush_merges();
        if !self.counterexamples.is_empty() {
            self.resimulate()?;
        }
        Ok(())
    }

    /// Returns true if `cand == rep ^ inverted` for every input assignment.
    fn prove_equivalent(&mut self, rep: NodeId, cand: NodeId, inverted: bool) -> Result<bool> {
        let rep_var = self.var(rep)?;
        let cand_var = self.var(cand)?;
        let const_var = self.var(0)?;

        let diff = self.oracle.new_var();
        self.oracle
            .add_xor_clauses(diff, rep_var, false, cand_var, inverted);
        self.oracle.clear_assumptions();
        self.oracle.assume(diff, true);
        self.oracle.assume(const_var, false);
        let sat = self.oracle.solve_under_assumptions()?;
        self.stats.sat_calls += 1;

        log::debug!(
            "SAT {} vs {}{}: {}",
            rep,
            if inverted { "!" } else { "" },
            cand,
            if sat { "distinguished" } else { "equivalent" }
        );
        Ok(!sat)
    }

    /// Reads the input assignment of the last model as a new pattern.
    fn collect_counterexample(&mut self) {
        self.state = FraigState::CollectCounterexample;
        let pattern: Vec<bool> = self
            .aig
            .get_inputs()
            .iter()
            .map(|&id| {
                self.vars[id]
                    .and_then(|var| self.oracle.get_value(var))
                    .unwrap_or(false)
            })
            .collect();
        self.counterexamples.push(pattern);
    }

    fn resimulate(&mut self) -> Result<()> {
        self.aig
            .simulate_and_classify(&self.counterexamples, &mut None)?;
        self.counterexamples.clear();
        self.stats.resimulations += 1;
        Ok(())
    }

    fn flush_merges(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.state = FraigState::Merge;
        for PendingMerge {
            alive,
            dead,
            inverted,
        } in std::mem::take(&mut self.pending)
        {
            log::info!(
                "Fraig: {} merging {}{}...",
                alive,
                if inverted { "!" } else { "" },
                dead
            );
            self.aig.merge(alive, dead, inverted);
            self.stats.merges += 1;
        }
        self.stats.merge_batches += 1;
        self.aig.compact_fec_groups();
    }
}

impl Aig {
    /// Reduces the AIG with the default configuration and a [`VarisatOracle`].
    pub fn fraig(&mut self) -> Result<FraigStats> {
        self.fraig_with(VarisatOracle::new(), FraigConfig::default())
    }

    pub fn fraig_with<S: SatOracle>(&mut self, oracle: S, config: FraigConfig) -> Result<FraigStats> {
        Fraig::new(self, oracle, config).run()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{AigEdge, cnf::Clause};

    /// `3 = 1 & 2`, `4 = !1 & !2`, `5 = 3 & !4` is `1 & 2` again; outputs 3 and 5.
    fn redundant_and() -> Aig {
        Aig::from_aag_str("aag 5 2 0 2 3\n2\n4\n6\n10\n6 2 4\n8 3 5\n10 6 9\n").unwrap()
    }

    /// Wraps an oracle and raises the token after the first proof.
    struct CancelAfterProof {
        inner: VarisatOracle<'static>,
        cancel: CancelToken,
    }

    impl SatOracle for CancelAfterProof {
        fn reset(&mut self) {
            self.inner.reset()
        }
        fn new_var(&mut self) -> Var {
            self.inner.new_var()
        }
        fn add_clause(&mut self, clause: &Clause) {
            self.inner.add_clause(clause)
        }
        fn assume(&mut self, var: Var, value: bool) {
            self.inner.assume(var, value)
        }
        fn clear_assumptions(&mut self) {
            self.inner.clear_assumptions()
        }
        fn solve_under_assumptions(&mut self) -> Result<bool> {
            let sat = self.inner.solve_under_assumptions()?;
            if !sat {
                self.cancel.cancel();
            }
            Ok(sat)
        }
        fn get_value(&self, var: Var) -> Option<bool> {
            self.inner.get_value(var)
        }
    }

    #[test]
    fn fraig_merges_into_lower_rank() {
        let mut aig = redundant_and();
        let stats = aig.fraig().unwrap();
        assert!(aig.get_node(5).is_none());
        assert_eq!(aig.output_fanin(1), Some(AigEdge::new(3, false)));
        assert_eq!(stats.merges, 1);
        assert_eq!(aig.n_dfs_ands(), 1);
        assert!(aig.fec_groups().is_empty());
        assert!(!aig.simulated);
        aig.check_integrity().unwrap();
    }

    #[test]
    fn fraig_complemented_pair() {
        // 3 = 1 & 2, 5 = !3 & !3, output 1 reads !5 which is 3
        let mut aig = Aig::from_aag_str("aag 5 2 0 2 2\n2\n4\n6\n11\n6 2 4\n10 7 7\n").unwrap();
        aig.optimize();
        // 5 = !3 & !3 was folded into !3 already, nothing left for the prover
        assert_eq!(aig.output_fanin(1), Some(AigEdge::new(3, false)));
        let stats = aig.fraig().unwrap();
        assert_eq!(stats.merges, 0);
    }

    #[test]
    fn fraig_constant_gate() {
        // 3 = 1 & 2, 4 = 3 & !1 is always false
        let mut aig = Aig::from_aag_str("aag 4 2 0 2 2\n2\n4\n6\n8\n6 2 4\n8 6 3\n").unwrap();
        let stats = aig.fraig().unwrap();
        assert_eq!(stats.merges, 1);
        assert!(aig.get_node(4).is_none());
        assert_eq!(aig.output_fanin(1), Some(AigEdge::new(0, false)));
        aig.check_integrity().unwrap();
    }

    #[test]
    fn fraig_keeps_distinct_functions() {
        // 5 is the xnor of two exclusive ANDs, no two gates are equivalent
        let mut aig = Aig::from_aag_str(
            "aag 5 2 0 2 3\n2\n4\n11\n10\n6 2 5\n8 3 4\n10 7 9\n",
        )
        .unwrap();
        let stats = aig.fraig().unwrap();
        assert_eq!(stats.merges, 0);
        assert_eq!(aig.n_ands(), 3);
        assert!(aig.fec_groups().is_empty());
    }

    #[test]
    fn fraig_cancelled_before_start() {
        let mut aig = redundant_and();
        let cancel = CancelToken::new();
        cancel.cancel();
        let config = FraigConfig {
            cancel: Some(cancel),
            ..FraigConfig::default()
        };
        assert!(matches!(
            aig.fraig_with(VarisatOracle::new(), config),
            Err(AigError::Cancelled)
        ));
        assert!(aig.get_node(5).is_some());
    }

    #[test]
    fn fraig_cancelled_keeps_proven_merges() {
        let mut aig = redundant_and();
        let cancel = CancelToken::new();
        let oracle = CancelAfterProof {
            inner: VarisatOracle::new(),
            cancel: cancel.clone(),
        };
        let config = FraigConfig {
            cancel: Some(cancel),
            ..FraigConfig::default()
        };
        assert!(matches!(aig.fraig_with(oracle, config), Err(AigError::Cancelled)));
        assert!(aig.get_node(5).is_none());
        assert_eq!(aig.output_fanin(1), Some(AigEdge::new(3, false)));
        aig.check_integrity().unwrap();
    }

    #[test]
    fn state_starts_idle() {
        let mut aig = redundant_and();
        let fraig = Fraig::new(&mut aig, VarisatOracle::new(), FraigConfig::default());
        assert_eq!(fraig.state(), FraigState::Idle);
    }
}
