//! Graph mutations: merging equivalent nodes, trivial simplifications and sweeping.
//!
//! Every rewrite of the graph goes through [`Aig::merge`], which keeps fanins and
//! fanouts coherent. Callers are in charge of the FEC bookkeeping.

use crate::{Aig, AigNodeKind, NodeId, dfs::Dfs};

impl Aig {
    /// Declares that `dead` computes the same function as `alive`, complemented iff
    /// `inverted` is set, and rewrites the graph so that `dead` disappears:
    /// - every consumer of `dead` now reads `alive` (with the polarity flipped if needed),
    /// - `alive` inherits the fanouts of `dead`,
    /// - `dead` is detached from its own fanins and its id becomes vacant.
    ///
    /// `dead` must be an AND gate out of any FEC group, and `alive` must come before
    /// it in the topological order when both are ranked. Panics otherwise.
    pub fn merge(&mut self, alive: NodeId, dead: NodeId, inverted: bool) {
        assert_ne!(alive, dead, "cannot merge node {} with itself", dead);
        assert_ne!(dead, 0, "the constant node cannot be merged away");

        let alive_order = self.node(alive).dfs_order;
        let dead_node = self.node(dead);
        assert!(dead_node.is_and(), "only AND gates can be merged away, got {}", dead);
        debug_assert!(
            dead_node.fec.is_none(),
            "node {} must be excised from its FEC group before merging",
            dead
        );
        if let (Some(alive_order), Some(dead_order)) = (alive_order, dead_node.dfs_order) {
            assert!(
                alive_order < dead_order,
                "merging {} into {} would break the topological order",
                dead,
                alive
            );
        }

        let Some(dead_node) = self.remove_node(dead) else {
            return;
        };

        // Detach from the fanins
        for fanin in dead_node.get_fanins() {
            if let Some(node) = self.nodes.get_mut(fanin.node).and_then(Option::as_mut) {
                node.remove_fanout(dead);
            }
        }

        // Hand the fanouts over to alive
        let mut consumers = Vec::with_capacity(dead_node.fanouts.len());
        for &fanout in &dead_node.fanouts {
            self.node_mut(alive).add_fanout(fanout ^ inverted);
            consumers.push(fanout.node);
        }
        consumers.sort_unstable();
        consumers.dedup();
        for consumer in consumers {
            self.node_mut(consumer).redirect_fanin(dead, alive, inverted);
        }
    }

    /// Trivial simplifications over the topological order:
    /// - a constant-0 fanin makes the gate constant 0,
    /// - a constant-1 fanin makes the gate equal to its other fanin,
    /// - twice the same fanin makes the gate equal to that fanin,
    /// - a fanin and its complement make the gate constant 0.
    ///
    /// Returns the number of merged gates. Derived lists are rebuilt afterwards.
    pub fn optimize(&mut self) -> usize {
        let order = self.dfs_list.clone();
        let mut merged = 0;

        for id in order {
            let Some(AigNodeKind::And { fanin0, fanin1 }) = self.get_node(id).map(|n| n.kind.clone())
            else {
                continue;
            };

            let (alive, inverted) = if fanin0.is_cst_false() || fanin1.is_cst_false() {
                (0, false)
            } else if fanin0.is_cst_true() {
                (fanin1.node, fanin1.complement)
            } else if fanin1.is_cst_true() {
                (fanin0.node, fanin0.complement)
            } else if fanin0 == fanin1 {
                (fanin0.node, fanin0.complement)
            } else if fanin0.is_complement_of(&fanin1) {
                (0, false)
            } else {
                continue;
            };

            log::info!(
                "Simplifying: {} merging {}{}...",
                alive,
                if inverted { "!" } else { "" },
                id
            );
            self.excise_from_fec(id);
            self.merge(alive, id, inverted);
            merged += 1;
        }

        self.rebuild();
        if merged > 0 {
            self.compact_fec_groups();
        }
        merged
    }

    /// Removes AND gates and undefined placeholders which cannot be reached from the outputs.
    ///
    /// The topological order is left untouched, the other derived lists are rebuilt.
    /// Returns the number of removed nodes.
    pub fn sweep(&mut self) -> usize {
        let mut reachable = vec![false; self.nodes.len()];
        let mut dfs = Dfs::from_outputs(self);
        while let Some(id) = dfs.next(self) {
            reachable[id] = true;
        }

        let mut removed = 0;
        for id in 0..self.nodes.len() {
            if reachable[id] {
                continue;
            }
            let Some(node) = self.get_node(id) else {
                continue;
            };
            if !node.is_and() && !node.is_undefined() {
                continue;
            }
            log::info!("Sweeping: {}({}) removed...", node.type_str(), id);

            self.excise_from_fec(id);
            if let Some(node) = self.remove_node(id) {
                for fanin in node.get_fanins() {
                    if let Some(fanin_node) = self.nodes.get_mut(fanin.node).and_then(Option::as_mut) {
                        fanin_node.remove_fanout(id);
                    }
                }
            }
            removed += 1;
        }

        self.build_floating_list();
        self.build_unused_list();
        self.build_undefined_list();
        self.count_ands();
        self.sort_all_fanouts();
        if removed > 0 {
            self.compact_fec_groups();
        }
        removed
    }
}
