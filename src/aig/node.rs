use crate::{fec::FecSlot, sim::SimWord};

use super::{AigEdge, AigError, FaninId, Result};

/// A node id.
///
/// Ids index the dense node arena of an [`Aig`]: the constant node has id 0,
/// inputs and AND gates use their AIGER variable index, and outputs are
/// numbered after the maximum variable index.
///
/// [`Aig`]: super::Aig
pub type NodeId = usize;

/// What a node is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AigNodeKind {
    /// The constant low/false signal.
    False,
    /// A primary input, `position` is its rank among the declared inputs.
    Input {
        position: usize,
        symbol: Option<String>,
    },
    /// A primary output, a sink with exactly one fanin.
    Output {
        index: usize,
        fanin: AigEdge,
        symbol: Option<String>,
    },
    /// An AND gate with two fanins.
    And { fanin0: AigEdge, fanin1: AigEdge },
    /// A node referenced before (or without ever) being defined.
    Undefined,
}

/// An AIG node.
///
/// The variant specific data lives in [`AigNodeKind`], everything else is shared.
///
/// Internal note: nodes carry their fanouts with them, the owning [`Aig`] is in
/// charge of keeping them coherent with the fanins.
///
/// [`Aig`]: super::Aig
#[derive(Debug, Clone)]
pub struct AigNode {
    pub(crate) id: NodeId,
    pub(crate) kind: AigNodeKind,
    /// Line of the definition in the source file (0 when unknown).
    pub(crate) line: usize,
    /// Each fanout edge points at the consumer and carries the polarity of the connection.
    pub(crate) fanouts: Vec<AigEdge>,
    pub(crate) value: SimWord,
    /// Last traversal generation which visited this node.
    pub(crate) mark: u64,
    pub(crate) fec: Option<FecSlot>,
    /// Rank in the last topological order, the constant is pinned at 0.
    pub(crate) dfs_order: Option<usize>,
}

impl PartialEq for AigNode {
    /// Structural equality: id and kind only, bookkeeping is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.kind == other.kind
    }
}

impl Eq for AigNode {}

impl AigNode {
    fn with_kind(id: NodeId, kind: AigNodeKind, line: usize) -> Self {
        AigNode {
            id,
            kind,
            line,
            fanouts: Vec::new(),
            value: 0,
            mark: 0,
            fec: None,
            dfs_order: None,
        }
    }

    pub fn constant() -> Self {
        AigNode::with_kind(0, AigNodeKind::False, 0)
    }

    pub fn input(id: NodeId, position: usize, line: usize) -> Self {
        if id == 0 {
            panic!(
                "Hey, you are trying to create an input with id=0. \
                Id=0 is reserved for the constant node."
            )
        }
        AigNode::with_kind(
            id,
            AigNodeKind::Input {
                position,
                symbol: None,
            },
            line,
        )
    }

    pub fn output(id: NodeId, index: usize, fanin: AigEdge, line: usize) -> Self {
        AigNode::with_kind(
            id,
            AigNodeKind::Output {
                index,
                fanin,
                symbol: None,
            },
            line,
        )
    }

    /// Returns a new and gate (initialize empty fanouts).
    pub fn and(id: NodeId, fanin0: AigEdge, fanin1: AigEdge, line: usize) -> Self {
        if id == 0 {
            panic!(
                "Hey, you are trying to create an AND gate with id=0. \
                Id=0 is reserved for the constant node."
            )
        }
        AigNode::with_kind(id, AigNodeKind::And { fanin0, fanin1 }, line)
    }

    pub fn undefined(id: NodeId) -> Self {
        AigNode::with_kind(id, AigNodeKind::Undefined, 0)
    }

    pub fn get_id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &AigNodeKind {
        &self.kind
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn is_false(&self) -> bool {
        matches!(self.kind, AigNodeKind::False)
    }

    pub fn is_input(&self) -> bool {
        matches!(self.kind, AigNodeKind::Input { .. })
    }

    pub fn is_output(&self) -> bool {
        matches!(self.kind, AigNodeKind::Output { .. })
    }

    pub fn is_and(&self) -> bool {
        matches!(self.kind, AigNodeKind::And { .. })
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self.kind, AigNodeKind::Undefined)
    }

    /// Short type tag used in reports.
    pub fn type_str(&self) -> &'static str {
        match self.kind {
            AigNodeKind::False => "CONST",
            AigNodeKind::Input { .. } => "PI",
            AigNodeKind::Output { .. } => "PO",
            AigNodeKind::And { .. } => "AIG",
            AigNodeKind::Undefined => "UNDEF",
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        match &self.kind {
            AigNodeKind::Input { symbol, .. } | AigNodeKind::Output { symbol, .. } => {
                symbol.as_deref()
            }
            _ => None,
        }
    }

    pub(crate) fn set_symbol(&mut self, name: String) -> Result<()> {
        match &mut self.kind {
            AigNodeKind::Input { symbol, .. } | AigNodeKind::Output { symbol, .. } => {
                *symbol = Some(name);
                Ok(())
            }
            _ => Err(AigError::InvalidState(format!(
                "node {} cannot carry a symbol",
                self.id
            ))),
        }
    }

    /// The simulation word, one pattern per bit.
    pub fn value(&self) -> SimWord {
        self.value
    }

    pub fn fanouts(&self) -> &[AigEdge] {
        &self.fanouts
    }

    pub fn dfs_order(&self) -> Option<usize> {
        self.dfs_order
    }

    pub fn get_fanins(&self) -> Vec<AigEdge> {
        match self.kind {
            AigNodeKind::Output { fanin, .. } => vec![fanin],
            AigNodeKind::And { fanin0, fanin1 } => vec![fanin0, fanin1],
            _ => vec![],
        }
    }

    pub fn get_fanin(&self, fanin_id: FaninId) -> Option<AigEdge> {
        match (&self.kind, fanin_id) {
            (AigNodeKind::And { fanin0, .. }, FaninId::Fanin0) => Some(*fanin0),
            (AigNodeKind::And { fanin1, .. }, FaninId::Fanin1) => Some(*fanin1),
            (AigNodeKind::Output { fanin, .. }, FaninId::Fanin0) => Some(*fanin),
            _ => None,
        }
    }

    pub(crate) fn add_fanout(&mut self, fanout: AigEdge) {
        self.fanouts.push(fanout);
    }

    /// Removes every fanout entry pointing at `fanout_id`, returns how many were dropped.
    pub(crate) fn remove_fanout(&mut self, fanout_id: NodeId) -> usize {
        let before = self.fanouts.len();
        self.fanouts.retain(|edge| edge.node != fanout_id);
        before - self.fanouts.len()
    }

    pub(crate) fn sort_fanouts(&mut self) {
        self.fanouts.sort_unstable();
    }

    /// Turns an undefined placeholder into an AND gate, keeping its id and fanouts.
    pub(crate) fn define_and(&mut self, fanin0: AigEdge, fanin1: AigEdge, line: usize) -> Result<()> {
        match self.kind {
            AigNodeKind::Undefined => {
                self.kind = AigNodeKind::And { fanin0, fanin1 };
                self.line = line;
                Ok(())
            }
            _ => Err(AigError::DuplicateId(self.id)),
        }
    }

    /// Points every fanin referencing `from` at `to` instead, flipping the polarity
    /// when `invert` is set. Returns the number of rewired fanins.
    pub(crate) fn redirect_fanin(&mut self, from: NodeId, to: NodeId, invert: bool) -> usize {
        let mut count = 0;
        let mut redirect = |edge: &mut AigEdge| {
            if edge.node == from {
                *edge = AigEdge::new(to, edge.complement ^ invert);
                count += 1;
            }
        };
        match &mut self.kind {
            AigNodeKind::And { fanin0, fanin1 } => {
                redirect(fanin0);
                redirect(fanin1);
            }
            AigNodeKind::Output { fanin, .. } => redirect(fanin),
            _ => (),
        }
        count
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[should_panic]
    fn and_with_id0() {
        let f = AigEdge::new(0, false);
        let _ = AigNode::and(0, f, f, 1);
    }

    #[test]
    fn define_placeholder_in_place() {
        let mut n = AigNode::undefined(4);
        n.add_fanout(AigEdge::new(7, true));
        n.define_and(AigEdge::new(1, false), AigEdge::new(2, true), 9)
            .unwrap();
        assert!(n.is_and());
        assert_eq!(n.line(), 9);
        assert_eq!(n.fanouts(), &[AigEdge::new(7, true)]);
        assert!(
            n.define_and(AigEdge::new(1, false), AigEdge::new(2, false), 10)
                .is_err()
        );
    }

    #[test]
    fn redirect_both_fanins() {
        let mut n = AigNode::and(5, AigEdge::new(3, false), AigEdge::new(3, true), 0);
        assert_eq!(n.redirect_fanin(3, 1, true), 2);
        assert_eq!(
            n.get_fanins(),
            vec![AigEdge::new(1, true), AigEdge::new(1, false)]
        );
        assert_eq!(n.redirect_fanin(3, 1, false), 0);
    }

    #[test]
    fn fanin_selector() {
        let n = AigNode::and(5, AigEdge::new(3, false), AigEdge::new(4, true), 0);
        assert_eq!(n.get_fanin(FaninId::Fanin1), Some(AigEdge::new(4, true)));
        assert_eq!(n.get_fanin(FaninId::Fanin0), Some(AigEdge::new(3, false)));
        let po = AigNode::output(9, 0, AigEdge::new(5, true), 0);
        assert_eq!(po.get_fanin(FaninId::Fanin0), Some(AigEdge::new(5, true)));
        assert_eq!(po.get_fanin(FaninId::Fanin1), None);
    }

    #[test]
    fn remove_all_fanout_entries() {
        let mut n = AigNode::input(1, 0, 2);
        n.add_fanout(AigEdge::new(5, false));
        n.add_fanout(AigEdge::new(6, false));
        n.add_fanout(AigEdge::new(5, true));
        assert_eq!(n.remove_fanout(5), 2);
        assert_eq!(n.fanouts(), &[AigEdge::new(6, false)]);
    }
}
