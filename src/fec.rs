//! Functionally equivalent candidate (FEC) groups.
//!
//! Nodes whose simulation words are equal or bitwise complementary under every
//! simulated pattern are grouped together: they *might* be equivalent, up to
//! polarity. Groups only ever split as more patterns are simulated.
//!
//! Each member is stored as an [`AigEdge`] whose complement flag tells the
//! polarity of the member relative to the group's canonical word. The first
//! member is the representative, a member `i` is a candidate for
//! `rep ^ (c_i ^ c_0)`.
//!
//! Members proven equivalent are tombstoned ([`FecMember::Dead`]) rather than
//! removed, so that the slot indices held by the other nodes stay valid until
//! the next compaction.

use std::collections::HashMap;

use crate::{Aig, AigEdge, NodeId, sim::SimWord};

/// Index of a group in the [`FecRegistry`].
pub type FecId = usize;

/// Back pointer from a node to its group membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FecSlot {
    pub group: FecId,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FecMember {
    Live(AigEdge),
    /// Tombstone left by a member removed from the group.
    Dead,
}

impl FecMember {
    pub fn live(&self) -> Option<AigEdge> {
        match self {
            FecMember::Live(edge) => Some(*edge),
            FecMember::Dead => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FecGroup {
    members: Vec<FecMember>,
}

impl FecGroup {
    fn from_edges(edges: Vec<AigEdge>) -> Self {
        FecGroup {
            members: edges.into_iter().map(FecMember::Live).collect(),
        }
    }

    pub fn members(&self) -> &[FecMember] {
        &self.members
    }

    /// Live members, in order.
    pub fn live_members(&self) -> impl Iterator<Item = AigEdge> + '_ {
        self.members.iter().filter_map(FecMember::live)
    }

    pub fn live_count(&self) -> usize {
        self.live_members().count()
    }

    /// A group is only worth keeping with at least two live members.
    pub fn is_valid(&self) -> bool {
        self.live_count() > 1
    }

    /// The representative, first member of the group (if still alive).
    pub fn rep(&self) -> Option<AigEdge> {
        self.members.first()?.live()
    }

    pub fn member(&self, index: usize) -> Option<AigEdge> {
        self.members.get(index)?.live()
    }

    /// Polarity of the `index`-th member relative to the representative:
    /// the member is a candidate for `rep` complemented iff this is true.
    pub fn relative_complement(&self, index: usize) -> Option<bool> {
        Some(self.member(index)?.complement ^ self.rep()?.complement)
    }

    fn kill(&mut self, index: usize) {
        if let Some(member) = self.members.get_mut(index) {
            *member = FecMember::Dead;
        }
    }

    fn drop_dead(&mut self) {
        self.members.retain(|member| matches!(member, FecMember::Live(_)));
    }
}

/// Storage for the FEC groups: an arena of groups plus the order in which they are reported.
///
/// Group ids are reused once a group is removed.
#[derive(Debug, Clone, Default)]
pub struct FecRegistry {
    groups: Vec<Option<FecGroup>>,
    free: Vec<FecId>,
    order: Vec<FecId>,
}

impl FecRegistry {
    /// Number of groups.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: FecId) -> Option<&FecGroup> {
        self.groups.get(id)?.as_ref()
    }

    /// Groups with their id, in order.
    pub fn iter(&self) -> impl Iterator<Item = (FecId, &FecGroup)> + '_ {
        self.order
            .iter()
            .filter_map(|&id| Some((id, self.get(id)?)))
    }

    fn insert(&mut self, group: FecGroup) -> FecId {
        let id = match self.free.pop() {
            Some(id) => {
                self.groups[id] = Some(group);
                id
            }
            None => {
                self.groups.push(Some(group));
                self.groups.len() - 1
            }
        };
        self.order.push(id);
        id
    }

    fn remove(&mut self, id: FecId) -> Option<FecGroup> {
        let group = self.groups.get_mut(id)?.take()?;
        self.free.push(id);
        self.order.retain(|&other| other != id);
        Some(group)
    }

    /// Removes every group, the ids are released.
    fn take_all(&mut self) -> Vec<FecGroup> {
        let order = std::mem::take(&mut self.order);
        let groups = order
            .into_iter()
            .filter_map(|id| self.groups.get_mut(id)?.take())
            .collect();
        self.groups.clear();
        self.free.clear();
        groups
    }

    fn sort_groups_by_key<K: Ord>(&mut self, mut key: impl FnMut(&FecGroup) -> K) {
        let mut order = std::mem::take(&mut self.order);
        order.sort_by_cached_key(|&id| self.groups[id].as_ref().map(&mut key));
        self.order = order;
    }
}

/// Buckets keyed by simulation word, in order of first appearance.
#[derive(Default)]
struct Buckets {
    index: HashMap<SimWord, usize>,
    buckets: Vec<Vec<AigEdge>>,
}

impl Buckets {
    fn push(&mut self, key: SimWord, edge: AigEdge) {
        let bucket = *self.index.entry(key).or_insert_with(|| {
            self.buckets.push(Vec::new());
            self.buckets.len() - 1
        });
        self.buckets[bucket].push(edge);
    }

    /// Buckets with at least two members.
    fn into_groups(self) -> impl Iterator<Item = FecGroup> {
        self.buckets
            .into_iter()
            .filter(|bucket| bucket.len() > 1)
            .map(FecGroup::from_edges)
    }
}

impl Aig {
    pub fn fec_groups(&self) -> &FecRegistry {
        &self.fec
    }

    /// The group the node belongs to, with its slot index.
    pub fn fec_slot(&self, id: NodeId) -> Option<FecSlot> {
        self.get_node(id)?.fec
    }

    /// Other live members of the node's group, with their polarity relative to the node.
    pub fn fec_partners(&self, id: NodeId) -> Vec<AigEdge> {
        let Some(slot) = self.fec_slot(id) else {
            return Vec::new();
        };
        let Some(group) = self.fec.get(slot.group) else {
            return Vec::new();
        };
        let Some(own) = group.member(slot.index) else {
            return Vec::new();
        };
        group
            .live_members()
            .filter(|member| member.node != id)
            .map(|member| member ^ own.complement)
            .collect()
    }

    /// Builds the groups from scratch out of the current simulation words.
    ///
    /// Candidates are the constant and the AND gates of the topological order.
    /// Words are keyed on `min(v, !v)` so that complementary nodes meet.
    pub(crate) fn init_classify(&mut self) {
        self.fec.take_all();

        let candidates: Vec<NodeId> = std::iter::once(0)
            .chain(self.dfs_list.iter().copied().filter(|&id| self.node(id).is_and()))
            .collect();
        let mut buckets = Buckets::default();
        for id in candidates {
            let value = self.node(id).value;
            let key = value.min(!value);
            buckets.push(key, AigEdge::new(id, value != key));
        }
        for group in buckets.into_groups() {
            self.fec.insert(group);
        }
        self.link_fec_groups();
    }

    /// Splits every group according to the current simulation words, group order is kept.
    ///
    /// Tombstones are dropped on the way.
    pub(crate) fn refine_classify(&mut self) {
        let groups = self.fec.take_all();
        for group in groups {
            let mut buckets = Buckets::default();
            for edge in group.live_members() {
                let Some(node) = self.get_node(edge.node) else {
                    continue;
                };
                let mask = if edge.complement { !0 } else { 0 };
                buckets.push(node.value ^ mask, edge);
            }
            for group in buckets.into_groups() {
                self.fec.insert(group);
            }
        }
        self.link_fec_groups();
    }

    /// Drops tombstones and groups left with less than two members, without resimulating.
    pub(crate) fn compact_fec_groups(&mut self) {
        let groups = self.fec.take_all();
        for mut group in groups {
            group.drop_dead();
            if group.is_valid() {
                self.fec.insert(group);
            }
        }
        self.link_fec_groups();
    }

    /// Removes groups left with less than two live members.
    pub(crate) fn sweep_invalid_fec_groups(&mut self) {
        let invalid: Vec<FecId> = self
            .fec
            .iter()
            .filter(|(_, group)| !group.is_valid())
            .map(|(id, _)| id)
            .collect();
        if invalid.is_empty() {
            return;
        }
        for id in invalid {
            self.fec.remove(id);
        }
        self.link_fec_groups();
    }

    /// Tombstones the node in its group, if any.
    pub(crate) fn excise_from_fec(&mut self, id: NodeId) {
        let node = self.nodes.get_mut(id).and_then(Option::as_mut);
        let Some(slot) = node.and_then(|node| node.fec.take()) else {
            return;
        };
        if let Some(Some(group)) = self.fec.groups.get_mut(slot.group) {
            group.kill(slot.index);
        }
    }

    /// Points every live member back at its group slot, clears everyone else.
    fn link_fec_groups(&mut self) {
        for node in self.nodes.iter_mut().flatten() {
            node.fec = None;
        }
        for (group_id, group) in self.fec.iter() {
            for (index, member) in group.members.iter().enumerate() {
                if let FecMember::Live(edge) = member {
                    if let Some(Some(node)) = self.nodes.get_mut(edge.node) {
                        node.fec = Some(FecSlot {
                            group: group_id,
                            index,
                        });
                    }
                }
            }
        }
    }

    /// Sorts members by variable id, then groups by representative. Used for reports.
    pub fn sort_fec_groups_by_var(&mut self) {
        self.compact_fec_groups();
        for group in self.fec.groups.iter_mut().flatten() {
            group.members.sort_by_key(|member| member.live().map(|edge| edge.node));
        }
        self.fec
            .sort_groups_by_key(|group| group.rep().map(|edge| edge.node));
        self.link_fec_groups();
    }

    /// Sorts members by topological rank so that the representative is the
    /// earliest member, then groups by representative rank.
    pub(crate) fn sort_fec_groups_by_dfs_order(&mut self) {
        self.compact_fec_groups();
        let mut groups = std::mem::take(&mut self.fec.groups);
        for group in groups.iter_mut().flatten() {
            group.members.sort_by_key(|member| self.fec_rank(member));
        }
        self.fec.groups = groups;

        let mut order = std::mem::take(&mut self.fec.order);
        order.sort_by_cached_key(|&id| {
            let rep = self.fec.get(id).and_then(|group| group.members.first());
            rep.and_then(|member| self.fec_rank(member))
        });
        self.fec.order = order;
        self.link_fec_groups();
    }

    /// Unranked nodes go last, ties are broken by id.
    fn fec_rank(&self, member: &FecMember) -> Option<(usize, NodeId)> {
        let edge = member.live()?;
        let rank = self.get_node(edge.node).and_then(|node| node.dfs_order);
        Some((rank.unwrap_or(usize::MAX), edge.node))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Four AND gates in the topological order: 3, 4, 5 and 6.
    fn four_gates() -> Aig {
        Aig::from_aag_str(
            "aag 6 2 0 4 4\n2\n4\n6\n8\n10\n12\n6 2 4\n8 4 2\n10 3 5\n12 2 5\n",
        )
        .unwrap()
    }

    fn set_values(aig: &mut Aig, values: &[(NodeId, SimWord)]) {
        for &(id, value) in values {
            aig.node_mut(id).value = value;
        }
    }

    fn groups(aig: &Aig) -> Vec<Vec<AigEdge>> {
        aig.fec_groups()
            .iter()
            .map(|(_, group)| group.live_members().collect())
            .collect()
    }

    #[test]
    fn initial_partition() {
        let mut aig = four_gates();
        set_values(&mut aig, &[(3, 0xF0), (4, 0xF0), (5, !0xF0), (6, 0)]);
        aig.init_classify();
        assert_eq!(
            groups(&aig),
            vec![
                vec![AigEdge::new(0, false), AigEdge::new(6, false)],
                vec![AigEdge::new(3, false), AigEdge::new(4, false), AigEdge::new(5, true)],
            ]
        );
        let slot = aig.fec_slot(5).unwrap();
        assert_eq!(slot.index, 2);
        let group = aig.fec_groups().get(slot.group).unwrap();
        assert_eq!(group.relative_complement(2), Some(true));
        assert_eq!(group.relative_complement(1), Some(false));
        assert_eq!(
            aig.fec_partners(5),
            vec![AigEdge::new(3, true), AigEdge::new(4, true)]
        );
    }

    #[test]
    fn refinement_only_splits() {
        let mut aig = four_gates();
        set_values(&mut aig, &[(3, 0xF0), (4, 0xF0), (5, !0xF0), (6, 0)]);
        aig.init_classify();
        set_values(&mut aig, &[(4, 0xF1)]);
        aig.refine_classify();
        assert_eq!(
            groups(&aig),
            vec![
                vec![AigEdge::new(0, false), AigEdge::new(6, false)],
                vec![AigEdge::new(3, false), AigEdge::new(5, true)],
            ]
        );
        assert!(aig.fec_slot(4).is_none());
        assert_eq!(aig.fec_slot(5).unwrap().index, 1);
    }

    #[test]
    fn tombstones() {
        let mut aig = four_gates();
        set_values(&mut aig, &[(3, 0xF0), (4, 0xF0), (5, !0xF0), (6, 0)]);
        aig.init_classify();
        aig.excise_from_fec(6);
        aig.excise_from_fec(4);
        assert!(aig.fec_slot(6).is_none());
        // Indices of the remaining members are untouched until compaction
        assert_eq!(aig.fec_slot(5).unwrap().index, 2);
        aig.sweep_invalid_fec_groups();
        assert_eq!(aig.fec_groups().len(), 1);
        assert!(aig.fec_slot(0).is_none());

        aig.compact_fec_groups();
        assert_eq!(
            groups(&aig),
            vec![vec![AigEdge::new(3, false), AigEdge::new(5, true)]]
        );
        assert_eq!(aig.fec_slot(5).unwrap().index, 1);
    }

    #[test]
    fn dead_representative() {
        let mut aig = four_gates();
        set_values(&mut aig, &[(3, 0xF0), (4, 0xF0), (5, !0xF0), (6, 0)]);
        aig.init_classify();
        aig.excise_from_fec(3);
        aig.compact_fec_groups();
        let slot = aig.fec_slot(5).unwrap();
        let group = aig.fec_groups().get(slot.group).unwrap();
        assert_eq!(group.rep(), Some(AigEdge::new(4, false)));
        assert_eq!(group.relative_complement(slot.index), Some(true));
    }

    #[test]
    fn sort_by_var() {
        let mut aig = four_gates();
        set_values(&mut aig, &[(3, 0xF0), (4, !0xF0), (5, 0xF0), (6, !0xF0)]);
        aig.init_classify();
        assert_eq!(
            groups(&aig),
            vec![vec![
                AigEdge::new(3, false),
                AigEdge::new(4, true),
                AigEdge::new(5, false),
                AigEdge::new(6, true)
            ]]
        );
        set_values(&mut aig, &[(5, 0xF1), (6, !0xF1)]);
        aig.refine_classify();
        aig.sort_fec_groups_by_var();
        assert_eq!(
            groups(&aig),
            vec![
                vec![AigEdge::new(3, false), AigEdge::new(4, true)],
                vec![AigEdge::new(5, false), AigEdge::new(6, true)],
            ]
        );
    }
}
