//! Human readable reports, returned as strings.
//!
//! ```rust
//! use aigfraig::Aig;
//!
//! let aig = Aig::from_aag_str("aag 3 2 0 1 1\n2\n4\n6\n6 2 4\n").unwrap();
//! assert!(aig.summary_report().contains("  AIG          1"));
//! print!("{}", aig.netlist_report());
//! ```

use crate::{Aig, AigEdge, AigError, AigNode, AigNodeKind, NodeId, Result};

const GATE_REPORT_WIDTH: usize = 46;

impl Aig {
    fn is_undefined_fanin(&self, edge: AigEdge) -> bool {
        self.get_node(edge.node)
            .is_none_or(AigNode::is_undefined)
    }

    /// `*` marks an undefined fanin, `!` a complemented one.
    fn fanin_str(&self, edge: AigEdge) -> String {
        format!(
            "{}{}{}",
            if self.is_undefined_fanin(edge) { "*" } else { "" },
            if edge.complement { "!" } else { "" },
            edge.node
        )
    }

    /// One line description of a node, as listed in the netlist.
    pub fn gate_line(&self, id: NodeId) -> Option<String> {
        let node = self.get_node(id)?;
        let line = match node.kind() {
            AigNodeKind::False => "CONST0".to_string(),
            AigNodeKind::Input { symbol, .. } => match symbol {
                Some(symbol) => format!("PI  {} ({})", id, symbol),
                None => format!("PI  {}", id),
            },
            AigNodeKind::Output { fanin, symbol, .. } => {
                let fanin = self.fanin_str(*fanin);
                match symbol {
                    Some(symbol) => format!("PO  {} {} ({})", id, fanin, symbol),
                    None => format!("PO  {} {}", id, fanin),
                }
            }
            AigNodeKind::And { fanin0, fanin1 } => format!(
                "AIG {} {} {}",
                id,
                self.fanin_str(*fanin0),
                self.fanin_str(*fanin1)
            ),
            AigNodeKind::Undefined => format!("UNDEF {}", id),
        };
        Some(line)
    }

    pub fn summary_report(&self) -> String {
        let (n_pi, n_po, n_and) = (self.inputs.len(), self.outputs.len(), self.n_ands);
        let mut s = String::from("Circuit Statistics\n==================\n");
        for (name, count) in [("  PI", n_pi), ("  PO", n_po), ("  AIG", n_and)] {
            s.push_str(&format!("{:<7}{:>9}\n", name, count));
        }
        s.push_str("------------------\n");
        s.push_str(&format!("{:<7}{:>9}\n", "  Total", n_pi + n_po + n_and));
        s
    }

    /// The topological order, one node per line.
    pub fn netlist_report(&self) -> String {
        self.dfs_list
            .iter()
            .enumerate()
            .filter_map(|(i, &id)| Some(format!("[{}] {}\n", i, self.gate_line(id)?)))
            .collect()
    }

    pub fn pi_report(&self) -> String {
        let ids: String = self.inputs.iter().map(|id| format!(" {}", id)).collect();
        format!("PIs of the circuit:{}\n", ids)
    }

    pub fn po_report(&self) -> String {
        let ids: String = self.outputs.iter().map(|id| format!(" {}", id)).collect();
        format!("POs of the circuit:{}\n", ids)
    }

    /// Floating and unused lists, each line omitted when the list is empty.
    pub fn floating_report(&self) -> String {
        let mut s = String::new();
        for (title, list) in [
            ("Gates with floating fanin(s):", &self.floating),
            ("Gates defined but not used  :", &self.unused),
        ] {
            if !list.is_empty() {
                let ids: String = list.iter().map(|id| format!(" {}", id)).collect();
                s.push_str(&format!("{}{}\n", title, ids));
            }
        }
        s
    }

    /// One line per group, members complemented relative to the first one are prefixed by `!`.
    pub fn fec_report(&self) -> String {
        let mut s = String::new();
        for (k, (_, group)) in self.fec.iter().enumerate() {
            let mut members = group.live_members();
            let Some(first) = members.next() else {
                continue;
            };
            s.push_str(&format!("[{}] {}", k, first.node));
            for member in members {
                let inv = member.complement != first.complement;
                s.push_str(&format!(" {}{}", if inv { "!" } else { "" }, member.node));
            }
            s.push('\n');
        }
        s
    }

    /// A box describing a single node: kind, symbol, source line, FEC partners and simulation word.
    pub fn gate_report(&self, id: NodeId) -> Result<String> {
        let node = self.get_node(id).ok_or(AigError::NodeDoesNotExist(id))?;

        let mut info = format!("{}({})", node.type_str(), id);
        if let Some(symbol) = node.symbol() {
            info.push_str(&format!("\"{}\"", symbol));
        }
        info.push_str(&format!(", line {}", node.line()));

        let mut fecs = String::from("FECs:");
        for partner in self.fec_partners(id) {
            fecs.push_str(&format!(
                " {}{}",
                if partner.complement { "!" } else { "" },
                partner.node
            ));
        }

        let bits = format!("{:064b}", node.value());
        let bytes: Vec<&str> = (0..8).map(|i| &bits[8 * i..8 * (i + 1)]).collect();
        let value = format!("Value: {}", bytes.join("_"));

        let border = "=".repeat(GATE_REPORT_WIDTH + 4);
        let mut s = format!("{}\n", border);
        for line in [info, fecs, value] {
            s.push_str(&format!("= {:<width$} =\n", line, width = GATE_REPORT_WIDTH));
        }
        s.push_str(&format!("{}\n", border));
        Ok(s)
    }

    /// Fanin tree of the node, `level` levels deep.
    ///
    /// AND gates already expanded earlier in the report are followed by `(*)`.
    pub fn fanin_report(&mut self, id: NodeId, level: usize) -> Result<String> {
        self.tree_report(id, level, |node| node.get_fanins())
    }

    /// Fanout tree of the node, `level` levels deep, same conventions as [`Aig::fanin_report`].
    pub fn fanout_report(&mut self, id: NodeId, level: usize) -> Result<String> {
        self.tree_report(id, level, |node| node.fanouts().to_vec())
    }

    fn tree_report(
        &mut self,
        id: NodeId,
        level: usize,
        next: impl Fn(&AigNode) -> Vec<AigEdge>,
    ) -> Result<String> {
        if self.get_node(id).is_none() {
            return Err(AigError::NodeDoesNotExist(id));
        }
        let generation = self.next_generation();
        let mut s = String::new();
        // (edge, remaining levels, indentation)
        let mut stack = vec![(AigEdge::new(id, false), level, 0)];
        while let Some((edge, level, indent)) = stack.pop() {
            let Some(node) = self.get_node(edge.node) else {
                continue;
            };
            s.push_str(&format!(
                "{:indent$}{}{} {}",
                "",
                if edge.complement { "!" } else { "" },
                node.type_str(),
                edge.node,
                indent = indent
            ));
            if level == 0 {
                s.push('\n');
                continue;
            }
            if node.mark == generation {
                s.push_str(" (*)\n");
                continue;
            }
            s.push('\n');
            let children = next(node);
            if node.is_and() {
                self.visit(edge.node, generation);
            }
            // Reversed so that the first child is reported first.
            for child in children.into_iter().rev() {
                stack.push((child, level - 1, indent + 2));
            }
        }
        Ok(s)
    }
}
