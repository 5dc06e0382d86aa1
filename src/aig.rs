//! Module defining the [`Aig`] struct, as well as [`AigNode`], [`AigEdge`] and some others relevant structs.
//!
//! To start reducing a circuit, check [`crate::sim`] for simulation and [`crate::fraig`] docs.

pub mod dfs;
pub mod edge;
pub mod error;
mod integrity;
mod merge;
pub mod node;
mod parser;
pub mod report;
mod strash;
mod writer;

pub use edge::{AigEdge, FaninId};
pub use error::{AigError, ParserError, PatternError, PatternErrorKind, Result};
pub use node::{AigNode, AigNodeKind, NodeId};

use crate::fec::FecRegistry;

/// A whole combinational AIG.
///
/// Nodes live in a dense arena indexed by [`NodeId`]:
/// - index 0 is the constant node,
/// - indices `1..=max_var` are inputs, AND gates and undefined placeholders,
/// - indices `max_var + 1 ..` are the outputs, in declaration order.
///
/// Removing a node (see [`Aig::merge`]) leaves its slot vacant, ids are never reused.
///
/// The AIG also owns the bookkeeping shared by every pass: the derived node
/// lists, the traversal generation counter and the FEC groups.
///
/// Derived lists are not maintained incrementally. They are recomputed by
/// [`Aig::rebuild`] (the passes of this crate do it for you).
#[derive(Debug, Clone)]
pub struct Aig {
    pub(crate) nodes: Vec<Option<AigNode>>,
    pub(crate) max_var: usize,
    pub(crate) inputs: Vec<NodeId>,
    pub(crate) outputs: Vec<NodeId>,
    /// Topological order from the outputs, undefined nodes excluded.
    pub(crate) dfs_list: Vec<NodeId>,
    pub(crate) floating: Vec<NodeId>,
    pub(crate) unused: Vec<NodeId>,
    pub(crate) undefined: Vec<NodeId>,
    pub(crate) n_ands: usize,
    pub(crate) n_dfs_ands: usize,
    /// Must be bumped exactly once per traversal, see [`Aig::next_generation`].
    pub(crate) generation: u64,
    pub(crate) fec: FecRegistry,
    /// Whether FEC groups were initialized by a previous simulation.
    pub(crate) simulated: bool,
    pub(crate) comment: Option<String>,
}

impl Aig {
    /// Create a brand new AIG able to hold variables `1..=max_var` and `n_outputs` outputs.
    /// The constant node is included.
    pub fn new(max_var: usize, n_outputs: usize) -> Self {
        Self::try_new(max_var, n_outputs)
            .unwrap_or_else(|e| panic!("cannot allocate an AIG with {} variables: {}", max_var, e))
    }

    /// Same as [`Aig::new`], reporting an arena that cannot be allocated instead of aborting.
    pub(crate) fn try_new(
        max_var: usize,
        n_outputs: usize,
    ) -> std::result::Result<Self, std::collections::TryReserveError> {
        let len = 1 + max_var + n_outputs;
        let mut nodes = Vec::new();
        nodes.try_reserve_exact(len)?;
        nodes.resize(len, None);
        nodes[0] = Some(AigNode::constant());
        Ok(Aig {
            nodes,
            max_var,
            inputs: Vec::new(),
            outputs: Vec::new(),
            dfs_list: Vec::new(),
            floating: Vec::new(),
            unused: Vec::new(),
            undefined: Vec::new(),
            n_ands: 0,
            n_dfs_ands: 0,
            generation: 0,
            fec: FecRegistry::default(),
            simulated: false,
            comment: None,
        })
    }

    /// Retrieves a node from its id. The constant node is always there.
    pub fn get_node(&self, id: NodeId) -> Option<&AigNode> {
        self.nodes.get(id)?.as_ref()
    }

    /// Panics if the node does not exist: callers hold ids they got from the AIG itself.
    pub(crate) fn node(&self, id: NodeId) -> &AigNode {
        self.get_node(id)
            .unwrap_or_else(|| panic!("node {} is not part of the AIG", id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut AigNode {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("node {} is not part of the AIG", id))
    }

    /// Iterates over live nodes by increasing id.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &AigNode> {
        self.nodes.iter().flatten()
    }

    /// Size of the node arena (live and vacant slots).
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn max_var(&self) -> usize {
        self.max_var
    }

    /// Input ids, in declaration order.
    pub fn get_inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Output ids, in declaration order.
    pub fn get_outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    /// The edge driving the `index`-th output.
    pub fn output_fanin(&self, index: usize) -> Option<AigEdge> {
        let id = *self.outputs.get(index)?;
        match self.get_node(id)?.kind() {
            AigNodeKind::Output { fanin, .. } => Some(*fanin),
            _ => None,
        }
    }

    /// The topological order computed by the last [`Aig::rebuild`].
    ///
    /// Every node appears after its fanins. Undefined nodes are never listed.
    pub fn dfs_list(&self) -> &[NodeId] {
        &self.dfs_list
    }

    /// AND gates and outputs with a fanin on an undefined node.
    pub fn floating_list(&self) -> &[NodeId] {
        &self.floating
    }

    /// Inputs and AND gates without any fanout.
    pub fn unused_list(&self) -> &[NodeId] {
        &self.unused
    }

    pub fn undefined_list(&self) -> &[NodeId] {
        &self.undefined
    }

    /// Number of live AND gates.
    pub fn n_ands(&self) -> usize {
        self.n_ands
    }

    /// Number of AND gates reachable from the outputs.
    pub fn n_dfs_ands(&self) -> usize {
        self.n_dfs_ands
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = Some(comment.into());
    }

    /// Starts a new traversal: nodes whose mark differs from the returned value are unvisited.
    pub(crate) fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Marks the node as visited by `generation`, returns false if it already was.
    pub(crate) fn visit(&mut self, id: NodeId, generation: u64) -> bool {
        match self.nodes.get_mut(id).and_then(Option::as_mut) {
            Some(node) if node.mark != generation => {
                node.mark = generation;
                true
            }
            _ => false,
        }
    }

    fn check_var(&self, var: NodeId) -> Result<()> {
        if var > self.max_var {
            Err(AigError::IdOutOfRange(var, self.max_var))
        } else {
            Ok(())
        }
    }

    /// Returns the node for `var`, creating an undefined placeholder on first reference.
    fn query_node(&mut self, var: NodeId) -> Result<NodeId> {
        self.check_var(var)?;
        if self.nodes[var].is_none() {
            self.nodes[var] = Some(AigNode::undefined(var));
        }
        Ok(var)
    }

    /// Registers the next primary input on variable `var`.
    pub fn add_input(&mut self, var: NodeId, line: usize) -> Result<NodeId> {
        if var == 0 {
            return Err(AigError::IdZeroButNotFalse);
        }
        self.check_var(var)?;
        if self.nodes[var].is_some() {
            return Err(AigError::DuplicateId(var));
        }
        self.nodes[var] = Some(AigNode::input(var, self.inputs.len(), line));
        self.inputs.push(var);
        Ok(var)
    }

    /// Registers the next primary output, driven by the AIGER literal `lit`.
    pub fn add_output(&mut self, lit: u64, line: usize) -> Result<NodeId> {
        let index = self.outputs.len();
        let id = self.max_var + 1 + index;
        if id >= self.nodes.len() {
            return Err(AigError::IdOutOfRange(id, self.nodes.len() - 1));
        }
        let fanin = AigEdge::from_literal(lit);
        self.query_node(fanin.node)?;
        self.nodes[id] = Some(AigNode::output(id, index, fanin, line));
        self.node_mut(fanin.node)
            .add_fanout(AigEdge::new(id, fanin.complement));
        self.outputs.push(id);
        Ok(id)
    }

    /// Defines the AND gate `var = lit0 & lit1`.
    ///
    /// Fanins may reference variables not defined yet. If `var` itself was referenced
    /// before, its placeholder is turned into the gate (same id, fanouts kept).
    pub fn add_and(&mut self, var: NodeId, lit0: u64, lit1: u64, line: usize) -> Result<NodeId> {
        if var == 0 {
            return Err(AigError::IdZeroButNotFalse);
        }
        self.check_var(var)?;
        let fanin0 = AigEdge::from_literal(lit0);
        let fanin1 = AigEdge::from_literal(lit1);
        self.check_var(fanin0.node)?;
        self.check_var(fanin1.node)?;

        match &mut self.nodes[var] {
            Some(node) => node.define_and(fanin0, fanin1, line)?,
            slot @ None => *slot = Some(AigNode::and(var, fanin0, fanin1, line)),
        }
        for fanin in [fanin0, fanin1] {
            self.query_node(fanin.node)?;
            self.node_mut(fanin.node)
                .add_fanout(AigEdge::new(var, fanin.complement));
        }
        Ok(var)
    }

    pub fn set_input_symbol(&mut self, position: usize, name: impl Into<String>) -> Result<()> {
        let id = *self
            .inputs
            .get(position)
            .ok_or(AigError::NodeDoesNotExist(position))?;
        self.node_mut(id).set_symbol(name.into())
    }

    pub fn set_output_symbol(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        let id = *self
            .outputs
            .get(index)
            .ok_or(AigError::NodeDoesNotExist(self.max_var + 1 + index))?;
        self.node_mut(id).set_symbol(name.into())
    }

    /// Removes a node from the arena, its id becomes vacant.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> Option<AigNode> {
        self.nodes.get_mut(id)?.take()
    }

    /// Whether the node has a fanin on an undefined node.
    pub fn is_floating(&self, id: NodeId) -> bool {
        self.get_node(id).is_some_and(|node| {
            (node.is_and() || node.is_output())
                && node
                    .get_fanins()
                    .iter()
                    .any(|fanin| self.get_node(fanin.node).is_none_or(AigNode::is_undefined))
        })
    }

    /// Recomputes every derived list and sorts fanouts by id.
    pub fn rebuild(&mut self) {
        self.build_dfs_list();
        self.build_floating_list();
        self.build_unused_list();
        self.build_undefined_list();
        self.count_ands();
        self.sort_all_fanouts();
    }

    /// Recomputes the topological order and the topological ranks.
    pub(crate) fn build_dfs_list(&mut self) {
        let outputs = self.outputs.clone();
        self.dfs_list = self.post_order(&outputs);

        for node in self.nodes.iter_mut().flatten() {
            node.dfs_order = None;
        }
        // The constant is pinned at rank 0 so it can only ever be the surviving side of a merge.
        self.node_mut(0).dfs_order = Some(0);
        let mut n_dfs_ands = 0;
        for rank in 0..self.dfs_list.len() {
            let id = self.dfs_list[rank];
            let node = self.node_mut(id);
            if id != 0 {
                node.dfs_order = Some(rank + 1);
            }
            if node.is_and() {
                n_dfs_ands += 1;
            }
        }
        self.n_dfs_ands = n_dfs_ands;
    }

    fn build_floating_list(&mut self) {
        self.floating = (0..self.nodes.len())
            .filter(|&id| self.is_floating(id))
            .collect();
    }

    fn build_unused_list(&mut self) {
        self.unused = self
            .iter_nodes()
            .filter(|node| (node.is_and() || node.is_input()) && node.fanouts.is_empty())
            .map(AigNode::get_id)
            .collect();
    }

    fn build_undefined_list(&mut self) {
        self.undefined = self
            .iter_nodes()
            .filter(|node| node.is_undefined())
            .map(AigNode::get_id)
            .collect();
    }

    fn count_ands(&mut self) {
        self.n_ands = self.iter_nodes().filter(|node| node.is_and()).count();
    }

    fn sort_all_fanouts(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            node.sort_fanouts();
        }
    }
}
