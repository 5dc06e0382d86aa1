//! Traversals of an [`Aig`]: a preorder DFS visitor and the post-order used
//! to build the topological order.
//!
//! Both rely on the generation counter of the AIG instead of a visited set:
//! each traversal takes a fresh generation and marks the nodes it reaches.
//!
//! [`Aig`]: crate::Aig

use crate::{Aig, NodeId};

/// A simple DFS visitor.
///
/// Nodes are yielded in preorder. You can:
/// - start a DFS from a node using [`from_node`]
/// - or visit the whole reachable AIG by starting from the outputs using [`from_outputs`].
///
/// In the latter case, it will start by the first output and its transitive fanin,
/// then explore all non-previously-explored nodes from the second output,
/// and so on until all the outputs have been processed.
///
/// Undefined nodes are yielded too, they simply have no fanin.
///
/// [`from_node`]: Dfs::from_node
/// [`from_outputs`]: Dfs::from_outputs
///
/// Example:
///
/// ```rust
/// use aigfraig::{Aig, dfs::Dfs};
/// let mut aig = Aig::from_aag_str("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n").unwrap();
/// let mut dfs = Dfs::from_outputs(&mut aig);
/// let mut visited = Vec::new();
/// while let Some(id) = dfs.next(&mut aig) {
///     visited.push(id);
/// }
/// assert_eq!(visited, vec![4, 3, 1, 2]);
/// ```
pub struct Dfs {
    /// Must maintain the following invariant:
    /// - all nodes on the stack have not been yielded yet
    /// - they are marked with `generation` to avoid adding them one more time to the stack
    /// - the outputs from which to start a DFS are in `starts`, in reverse order
    ///   (they are discarded if visited by the time we reach them).
    stack: Vec<NodeId>,
    starts: Vec<NodeId>,
    generation: u64,
}

impl Dfs {
    /// Create a DFS from the initial start node.
    /// You will only browse the fanin of this node.
    pub fn from_node(aig: &mut Aig, start: NodeId) -> Self {
        let generation = aig.next_generation();
        let stack = if aig.visit(start, generation) {
            vec![start]
        } else {
            Vec::new()
        };
        Dfs {
            stack,
            starts: Vec::new(),
            generation,
        }
    }

    /// Create a DFS from the outputs of the given AIG.
    pub fn from_outputs(aig: &mut Aig) -> Self {
        let generation = aig.next_generation();
        let mut starts = aig.get_outputs().to_vec();
        starts.reverse();
        Dfs {
            stack: Vec::new(),
            starts,
            generation,
        }
    }

    /// Returns true if we are ready to start again! Else false, we are done.
    /// Should only be called when stack is empty (ie we are done with the current fanin).
    fn new_start(&mut self, aig: &mut Aig) -> bool {
        assert!(self.stack.is_empty());

        while let Some(id) = self.starts.pop() {
            if aig.visit(id, self.generation) {
                self.stack.push(id);
                return true;
            }
        }
        false
    }

    /// Yield the next node of the DFS, or None if it is done.
    ///
    /// Fanin 0 is explored before fanin 1.
    pub fn next(&mut self, aig: &mut Aig) -> Option<NodeId> {
        if self.stack.is_empty() && !self.new_start(aig) {
            return None;
        }
        let id = self.stack.pop()?;
        if let Some(node) = aig.get_node(id) {
            for fanin in node.get_fanins().into_iter().rev() {
                if aig.visit(fanin.node, self.generation) {
                    self.stack.push(fanin.node);
                }
            }
        }
        Some(id)
    }
}

impl Aig {
    /// Post-order of the transitive fanin of `roots`, roots taken in order
    /// and fanin 0 explored before fanin 1.
    ///
    /// Undefined nodes are traversed but never listed. Vacant ids are ignored.
    pub(crate) fn post_order(&mut self, roots: &[NodeId]) -> Vec<NodeId> {
        let generation = self.next_generation();
        let mut order = Vec::new();

        for &root in roots {
            let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];
            while let Some((id, last_time)) = stack.pop() {
                // Post order check
                if last_time {
                    order.push(id);
                    continue;
                }
                if !self.visit(id, generation) {
                    continue;
                }

                let node = self.node(id);
                if node.is_undefined() {
                    continue;
                }
                stack.push((id, true));
                // Time to add potential fanins, last pushed is explored first
                for fanin in node.get_fanins().into_iter().rev() {
                    stack.push((fanin.node, false));
                }
            }
        }
        order
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// `3 = 1 & 2`, `4 = 3 & !2`, outputs `3` and `!4`, 5 floating.
    fn small_aig() -> Aig {
        let mut aig = Aig::new(5, 3);
        aig.add_input(1, 2).unwrap();
        aig.add_input(2, 3).unwrap();
        aig.add_output(6, 4).unwrap();
        aig.add_output(9, 5).unwrap();
        aig.add_output(10, 6).unwrap();
        aig.add_and(3, 2, 4, 7).unwrap();
        aig.add_and(4, 6, 5, 8).unwrap();
        aig.rebuild();
        aig
    }

    #[test]
    fn from_node_test() {
        let mut aig = small_aig();
        let mut dfs = Dfs::from_node(&mut aig, 4);
        let mut visited = Vec::new();
        while let Some(id) = dfs.next(&mut aig) {
            visited.push(id);
        }
        assert_eq!(visited, vec![4, 3, 1, 2]);
        assert!(dfs.next(&mut aig).is_none());
    }

    #[test]
    fn from_outputs_test() {
        let mut aig = small_aig();
        let mut dfs = Dfs::from_outputs(&mut aig);
        let mut visited = Vec::new();
        while let Some(id) = dfs.next(&mut aig) {
            visited.push(id);
        }
        // Undefined 5 is reached through the third output
        assert_eq!(visited, vec![6, 3, 1, 2, 7, 4, 8, 5]);
    }

    #[test]
    fn post_order_is_topological() {
        let mut aig = small_aig();
        let outputs = aig.get_outputs().to_vec();
        let order = aig.post_order(&outputs);
        assert_eq!(order, vec![1, 2, 3, 6, 4, 7, 8]);
        for (rank, &id) in order.iter().enumerate() {
            for fanin in aig.get_node(id).unwrap().get_fanins() {
                if let Some(pos) = order.iter().position(|&other| other == fanin.node) {
                    assert!(pos < rank);
                }
            }
        }
    }

    #[test]
    fn repeated_fanin() {
        let mut aig = Aig::new(2, 1);
        aig.add_input(1, 2).unwrap();
        aig.add_output(4, 3).unwrap();
        aig.add_and(2, 2, 3, 4).unwrap();
        let mut dfs = Dfs::from_node(&mut aig, 2);
        assert_eq!(dfs.next(&mut aig), Some(2));
        assert_eq!(dfs.next(&mut aig), Some(1));
        assert!(dfs.next(&mut aig).is_none());
        assert_eq!(aig.post_order(&[3]), vec![1, 2, 3]);
    }
}
