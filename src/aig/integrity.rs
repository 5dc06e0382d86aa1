use crate::{Aig, AigEdge, AigError, AigNode, AigNodeKind, NodeId, Result, fec::FecMember};

fn invalid(msg: String) -> AigError {
    AigError::InvalidState(msg)
}

impl Aig {
    /// Checking if the AIG structure is correct.
    /// This function was written for debug purposes, as the library is supposed to maintain
    /// integrity of the AIG at any moment.
    ///
    /// Checks, in order:
    /// - every live node sits at the slot of its id, only slot 0 holds the constant,
    /// - inputs and outputs lists agree with the nodes they point at,
    /// - fanins and fanouts mirror each other (with multiplicity and polarity),
    /// - the graph is acyclic,
    /// - FEC back pointers agree with the groups.
    pub fn check_integrity(&self) -> Result<()> {
        for (slot, node) in self.nodes.iter().enumerate() {
            let Some(node) = node else {
                continue;
            };
            if node.id != slot {
                return Err(invalid(format!(
                    "incoherent node id: slot {} holds node {}",
                    slot, node.id
                )));
            }
            if node.is_false() != (slot == 0) {
                return Err(AigError::IdZeroButNotFalse);
            }
        }
        if self.get_node(0).is_none() {
            return Err(invalid("the constant node is missing".to_string()));
        }

        self.check_io_lists()?;
        for node in self.iter_nodes() {
            self.check_node_integrity(node)?;
        }
        self.check_acyclic()?;
        self.check_fec_integrity()
    }

    fn check_io_lists(&self) -> Result<()> {
        for (i, &id) in self.inputs.iter().enumerate() {
            match self.get_node(id).map(AigNode::kind) {
                Some(AigNodeKind::Input { position, .. }) if *position == i => (),
                _ => return Err(invalid(format!("input {} is not the input at position {}", id, i))),
            }
        }
        for (i, &id) in self.outputs.iter().enumerate() {
            match self.get_node(id).map(AigNode::kind) {
                Some(AigNodeKind::Output { index, .. })
                    if *index == i && id == self.max_var + 1 + i => {}
                _ => return Err(invalid(format!("output {} is not the output of index {}", id, i))),
            }
        }
        Ok(())
    }

    /// Each fanin must exist and list this node in its fanouts exactly as many
    /// times as it is used, and each fanout must point at a consumer using this node.
    fn check_node_integrity(&self, node: &AigNode) -> Result<()> {
        let fanins = node.get_fanins();
        for fanin in &fanins {
            let driver = self.get_node(fanin.node).ok_or(invalid(format!(
                "edge from node {} pointing at node {} which is not in the AIG anymore",
                node.id, fanin.node
            )))?;
            let expected = AigEdge::new(node.id, fanin.complement);
            let uses = fanins.iter().filter(|f| *f == fanin).count();
            let listed = driver.fanouts.iter().filter(|&&f| f == expected).count();
            if uses != listed {
                return Err(invalid(format!(
                    "node {} uses {} {} time(s) but is listed {} time(s) in its fanouts",
                    node.id, fanin, uses, listed
                )));
            }
        }

        for fanout in &node.fanouts {
            let consumer = self.get_node(fanout.node).ok_or(invalid(format!(
                "fanout {} of node {} is no longer in the AIG",
                fanout.node, node.id
            )))?;
            let used = consumer
                .get_fanins()
                .contains(&AigEdge::new(node.id, fanout.complement));
            if !used {
                return Err(invalid(format!(
                    "node {} lists {} as a fanout, but is not one of its fanins",
                    node.id, fanout
                )));
            }
        }
        Ok(())
    }

    /// Iterative DFS over fanins, a node met again while still on the path closes a cycle.
    fn check_acyclic(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Grey,
            Black,
        }
        let mut color = vec![Color::White; self.nodes.len()];

        for root in self.iter_nodes().map(|node| node.id) {
            if color[root] != Color::White {
                continue;
            }
            // (node, whether its fanins were pushed already)
            let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];
            while let Some((id, expanded)) = stack.pop() {
                if expanded {
                    color[id] = Color::Black;
                    continue;
                }
                match color[id] {
                    Color::Black => continue,
                    Color::Grey => return Err(invalid(format!("cycle through node {}", id))),
                    Color::White => (),
                }
                color[id] = Color::Grey;
                stack.push((id, true));
                for fanin in self.node(id).get_fanins() {
                    match color[fanin.node] {
                        Color::White => stack.push((fanin.node, false)),
                        Color::Grey => {
                            return Err(invalid(format!("cycle through node {}", fanin.node)));
                        }
                        Color::Black => (),
                    }
                }
            }
        }
        Ok(())
    }

    fn check_fec_integrity(&self) -> Result<()> {
        for (group_id, group) in self.fec.iter() {
            for (index, member) in group.members().iter().enumerate() {
                let FecMember::Live(edge) = member else {
                    continue;
                };
                let node = self.get_node(edge.node).ok_or(invalid(format!(
                    "FEC group {} refers to node {} which is not in the AIG anymore",
                    group_id, edge.node
                )))?;
                match node.fec {
                    Some(slot) if slot.group == group_id && slot.index == index => (),
                    _ => {
                        return Err(invalid(format!(
                            "node {} is member {} of FEC group {} but points at {:?}",
                            edge.node, index, group_id, node.fec
                        )));
                    }
                }
            }
        }
        for node in self.iter_nodes() {
            let Some(slot) = node.fec else {
                continue;
            };
            let member = self
                .fec
                .get(slot.group)
                .and_then(|group| group.member(slot.index));
            if member.map(|edge| edge.node) != Some(node.id) {
                return Err(invalid(format!(
                    "node {} points at FEC slot {:?} which does not hold it",
                    node.id, slot
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn two_gates() -> Aig {
        Aig::from_aag_str("aag 4 2 0 1 2\n2\n4\n8\n6 2 4\n8 6 3\n").unwrap()
    }

    #[test]
    fn parsed_aig_is_coherent() {
        two_gates().check_integrity().unwrap();
        Aig::from_aag_str("aag 3 1 0 1 1\n2\n6\n6 2 5\n")
            .unwrap()
            .check_integrity()
            .unwrap();
    }

    #[test]
    fn missing_fanout() {
        let mut aig = two_gates();
        aig.node_mut(3).fanouts.clear();
        assert!(matches!(
            aig.check_integrity(),
            Err(AigError::InvalidState(_))
        ));
    }

    #[test]
    fn stale_fanout() {
        let mut aig = two_gates();
        aig.node_mut(2).add_fanout(AigEdge::new(4, true));
        assert!(aig.check_integrity().is_err());
    }

    #[test]
    fn wrong_slot() {
        let mut aig = two_gates();
        aig.node_mut(3).id = 2;
        assert!(aig.check_integrity().is_err());
    }

    #[test]
    fn cycle() {
        let mut aig = two_gates();
        // 3 = 1 & 4 while 4 = 3 & !1
        aig.node_mut(3).kind = AigNodeKind::And {
            fanin0: AigEdge::new(1, false),
            fanin1: AigEdge::new(4, false),
        };
        aig.node_mut(2).remove_fanout(3);
        aig.node_mut(4).add_fanout(AigEdge::new(3, false));
        let err = aig.check_integrity().unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn fec_back_pointers() {
        let mut aig = two_gates();
        aig.node_mut(3).value = 0xF0;
        aig.node_mut(4).value = !0xF0;
        aig.init_classify();
        aig.check_integrity().unwrap();
        aig.node_mut(4).fec = None;
        assert!(aig.check_integrity().is_err());
    }
}
