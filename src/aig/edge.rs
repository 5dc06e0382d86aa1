//! An [`AigEdge`] points at an [`AigNode`] and can be complemented (indicates the presence of a NOT gate).
//!
//! [`AigNode`]: crate::AigNode

use std::{
    fmt::Display,
    ops::{BitXor, Not},
};

use super::NodeId;

/// Unambiguous fanin selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaninId {
    Fanin0,
    Fanin1,
}

/// A directed edge, used both for fanins and fanouts.
///
/// The edge can carry an inverter according to the value of `complement`.
/// Two edges are equal iff they point at the same node with the same polarity.
///
/// ```rust
/// use aigfraig::AigEdge;
/// let e = AigEdge::new(3, false);
/// assert_eq!(e, !AigEdge::new(3, true));
/// assert_eq!(e.to_literal(), 6);
/// assert_eq!(AigEdge::from_literal(7), !e);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AigEdge {
    /// The node the edge is refering to.
    pub(crate) node: NodeId,
    /// Set to true if signal should be inverted.
    pub(crate) complement: bool,
}

impl Not for AigEdge {
    type Output = Self;

    fn not(mut self) -> Self::Output {
        self.complement = !self.complement;
        self
    }
}

/// `edge ^ inv` flips the polarity iff `inv` is set.
impl BitXor<bool> for AigEdge {
    type Output = Self;

    fn bitxor(mut self, inv: bool) -> Self::Output {
        self.complement ^= inv;
        self
    }
}

/// `!3` for a complemented edge to node 3, `3` otherwise.
impl Display for AigEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", if self.complement { "!" } else { "" }, self.node)
    }
}

impl AigEdge {
    pub fn new(node: NodeId, complement: bool) -> Self {
        AigEdge { node, complement }
    }

    /// Decodes an AIGER literal (`var = lit >> 1`, `inverted = lit & 1`).
    pub fn from_literal(lit: u64) -> Self {
        AigEdge {
            node: (lit >> 1) as NodeId,
            complement: lit & 1 == 1,
        }
    }

    pub fn to_literal(&self) -> u64 {
        ((self.node as u64) << 1) | self.complement as u64
    }

    pub fn get_node_id(&self) -> NodeId {
        self.node
    }

    pub fn get_complement(&self) -> bool {
        self.complement
    }

    pub fn is_cst_false(&self) -> bool {
        self.node == 0 && !self.complement
    }

    pub fn is_cst_true(&self) -> bool {
        self.node == 0 && self.complement
    }

    pub fn is_complement_of(&self, other: &AigEdge) -> bool {
        self.node == other.node && self.complement ^ other.complement
    }
}
