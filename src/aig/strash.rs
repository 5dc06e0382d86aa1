//! Structural hashing: AND gates with the same pair of fanins are merged.

use std::collections::{HashMap, hash_map::Entry};

use crate::{Aig, AigEdge, AigNodeKind, NodeId};

/// Unordered pair of fanins, normalized so that `AND(a, b)` and `AND(b, a)` collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StrashKey(AigEdge, AigEdge);

impl StrashKey {
    fn new(fanin0: AigEdge, fanin1: AigEdge) -> Self {
        if fanin0 <= fanin1 {
            StrashKey(fanin0, fanin1)
        } else {
            StrashKey(fanin1, fanin0)
        }
    }
}

impl Aig {
    /// Merges every AND gate whose fanins (in any order) match a gate seen earlier
    /// in the topological order. Fanins are read as they stand when the gate is
    /// reached, so merges cascade down the order in a single pass.
    ///
    /// Returns the number of merged gates. Derived lists are rebuilt afterwards.
    pub fn strash(&mut self) -> usize {
        let order = self.dfs_list.clone();
        let mut table: HashMap<StrashKey, NodeId> = HashMap::with_capacity(self.n_dfs_ands);
        let mut merged = 0;

        for id in order {
            let Some(&AigNodeKind::And { fanin0, fanin1 }) = self.get_node(id).map(|n| &n.kind) else {
                continue;
            };
            match table.entry(StrashKey::new(fanin0, fanin1)) {
                Entry::Occupied(entry) => {
                    let alive = *entry.get();
                    log::info!("Strashing: {} merging {}...", alive, id);
                    self.excise_from_fec(id);
                    self.merge(alive, id, false);
                    merged += 1;
                }
                Entry::Vacant(entry) => {
                    entry.insert(id);
                }
            }
        }

        self.rebuild();
        if merged > 0 {
            self.compact_fec_groups();
        }
        merged
    }
}
