//! Bit-parallel simulation.
//!
//! Each node carries a [`SimWord`]: bit `k` is the value of the node under the
//! `k`-th pattern of the current [`PatternBatch`]. One topological sweep
//! evaluates [`SIM_WIDTH`] patterns at once, then FEC groups are (re)built
//! from the resulting words.
//!
//! Patterns come from a file ([`Aig::file_sim`]) or from a pseudo random
//! generator ([`Aig::random_sim`]).

use std::io::{BufRead, Write};

use rand::Rng;

use crate::{
    Aig, AigEdge, AigNodeKind, Result,
    aig::{PatternError, PatternErrorKind},
    fraig::CancelToken,
};

/// One simulation value per pattern, packed.
pub type SimWord = u64;

/// Number of patterns simulated at once.
pub const SIM_WIDTH: usize = SimWord::BITS as usize;

/// Random simulation stops after this many consecutive rounds without any new FEC group.
///
/// Grows with the logarithm of the circuit size, never below 3.
pub fn max_fail_rounds(n_nodes: usize) -> usize {
    3 + (3.0 * (n_nodes.max(1) as f64).log10()) as usize
}

/// Up to [`SIM_WIDTH`] input patterns, stored as one word per input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternBatch {
    words: Vec<SimWord>,
    len: usize,
}

impl PatternBatch {
    pub fn new(n_inputs: usize) -> Self {
        PatternBatch {
            words: vec![0; n_inputs],
            len: 0,
        }
    }

    /// Number of patterns in the batch.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == SIM_WIDTH
    }

    pub fn n_inputs(&self) -> usize {
        self.words.len()
    }

    /// The word assigned to the `position`-th input.
    pub fn word(&self, position: usize) -> SimWord {
        self.words[position]
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
        self.len = 0;
    }

    /// Value of input `position` in pattern `k`.
    pub fn bit(&self, position: usize, k: usize) -> bool {
        (self.words[position] >> k) & 1 == 1
    }

    /// Appends a pattern, one value per input in declaration order.
    ///
    /// Panics if the batch is full or if the number of values is wrong.
    pub fn push(&mut self, bits: impl IntoIterator<Item = bool>) {
        assert!(!self.is_full(), "pattern batch is full");
        let mut count = 0;
        for (word, bit) in self.words.iter_mut().zip(bits) {
            *word |= (bit as SimWord) << self.len;
            count += 1;
        }
        assert_eq!(count, self.words.len(), "one value per input is expected");
        self.len += 1;
    }

    /// Appends a pattern written as a string of `0`/`1`, one character per input.
    pub fn push_str(&mut self, pattern: &str) -> std::result::Result<(), PatternErrorKind> {
        if pattern.chars().count() != self.words.len() {
            return Err(PatternErrorKind::LengthMismatch {
                pattern: pattern.to_string(),
                expected: self.words.len(),
            });
        }
        if let Some(ch) = pattern.chars().find(|&c| c != '0' && c != '1') {
            return Err(PatternErrorKind::NonBinary {
                pattern: pattern.to_string(),
                ch,
            });
        }
        self.push(pattern.chars().map(|c| c == '1'));
        Ok(())
    }

    /// Fills the batch with [`SIM_WIDTH`] fresh random patterns.
    ///
    /// The previous word is shifted into the new one, a full random word is drawn per input.
    pub fn randomize(&mut self, rng: &mut impl Rng) {
        for word in self.words.iter_mut() {
            *word = word.rotate_left(17) ^ rng.r#gen::<SimWord>();
        }
        self.len = SIM_WIDTH;
    }
}

impl Aig {
    fn edge_value(&self, edge: AigEdge) -> SimWord {
        let value = self.get_node(edge.node).map_or(0, |node| node.value);
        if edge.complement { !value } else { value }
    }

    /// Assigns the batch to the inputs and evaluates every node of the topological order.
    ///
    /// The constant and undefined nodes evaluate to 0.
    pub fn simulate(&mut self, batch: &PatternBatch) {
        assert_eq!(
            batch.n_inputs(),
            self.inputs.len(),
            "the batch does not match the number of inputs"
        );
        for position in 0..self.inputs.len() {
            let id = self.inputs[position];
            self.node_mut(id).value = batch.word(position);
        }
        self.node_mut(0).value = 0;

        let order = std::mem::take(&mut self.dfs_list);
        for &id in &order {
            let value = match self.get_node(id).map(|n| &n.kind) {
                Some(AigNodeKind::And { fanin0, fanin1 }) => {
                    self.edge_value(*fanin0) & self.edge_value(*fanin1)
                }
                Some(AigNodeKind::Output { fanin, .. }) => self.edge_value(*fanin),
                _ => continue,
            };
            self.node_mut(id).value = value;
        }
        self.dfs_list = order;
    }

    /// Simulates the batch, optionally logs it, and builds or refines the FEC groups.
    pub(crate) fn simulate_and_classify(
        &mut self,
        batch: &PatternBatch,
        sim_log: &mut Option<&mut dyn Write>,
    ) -> Result<()> {
        self.simulate(batch);
        if let Some(sim_log) = sim_log {
            self.write_sim_log(batch, &mut **sim_log)?;
        }
        if self.simulated {
            self.refine_classify();
        } else {
            self.init_classify();
            self.simulated = true;
        }
        Ok(())
    }

    /// One line per pattern: the input bits, a space, then the output bits.
    fn write_sim_log(&self, batch: &PatternBatch, sim_log: &mut dyn Write) -> Result<()> {
        for k in 0..batch.len() {
            let inputs: String = (0..batch.n_inputs())
                .map(|position| if batch.bit(position, k) { '1' } else { '0' })
                .collect();
            let outputs: String = self
                .outputs
                .iter()
                .map(|&id| if (self.node(id).value >> k) & 1 == 1 { '1' } else { '0' })
                .collect();
            writeln!(sim_log, "{} {}", inputs, outputs)?;
        }
        Ok(())
    }

    /// Random simulation until the number of FEC groups stops changing for
    /// [`max_fail_rounds`] consecutive rounds.
    ///
    /// Returns the number of simulated patterns.
    pub fn random_sim(
        &mut self,
        rng: &mut impl Rng,
        mut sim_log: Option<&mut dyn Write>,
        cancel: Option<&CancelToken>,
    ) -> Result<usize> {
        let max_fail = max_fail_rounds(self.dfs_list.len());
        let mut batch = PatternBatch::new(self.inputs.len());
        let mut last_count = None;
        let mut fails = 0;
        let mut n_patterns = 0;

        while fails < max_fail {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                return Err(crate::AigError::Cancelled);
            }
            batch.randomize(rng);
            self.simulate_and_classify(&batch, &mut sim_log)?;
            n_patterns += batch.len();

            let count = self.fec.len();
            if last_count == Some(count) {
                fails += 1;
            } else {
                fails = 0;
                last_count = Some(count);
            }
        }
        log::info!("{} patterns simulated.", n_patterns);
        Ok(n_patterns)
    }

    /// Simulates the patterns read from `reader`: whitespace separated strings of
    /// `0`/`1`, one character per input.
    ///
    /// Stops at the first malformed pattern. Patterns read before it are still
    /// simulated, their count is reported in the [`PatternError`].
    ///
    /// Returns the number of simulated patterns.
    pub fn file_sim<R: BufRead>(
        &mut self,
        reader: R,
        mut sim_log: Option<&mut dyn Write>,
    ) -> Result<usize> {
        if self.inputs.is_empty() {
            log::warn!("no input to simulate");
            return Ok(0);
        }

        let mut batch = PatternBatch::new(self.inputs.len());
        let mut n_patterns = 0;
        for line in reader.lines() {
            let line = line?;
            for token in line.split_whitespace() {
                if let Err(kind) = batch.push_str(token) {
                    if !batch.is_empty() {
                        self.simulate_and_classify(&batch, &mut sim_log)?;
                        n_patterns += batch.len();
                    }
                    log::info!("{} patterns simulated.", n_patterns);
                    return Err(PatternError {
                        simulated: n_patterns,
                        kind,
                    }
                    .into());
                }
                if batch.is_full() {
                    self.simulate_and_classify(&batch, &mut sim_log)?;
                    n_patterns += batch.len();
                    batch.clear();
                }
            }
        }
        if !batch.is_empty() {
            self.simulate_and_classify(&batch, &mut sim_log)?;
            n_patterns += batch.len();
        }
        log::info!("{} patterns simulated.", n_patterns);
        Ok(n_patterns)
    }
}
