//! ASCII AIGER output.
//!
//! Only the AND gates reachable from the outputs are written, in topological
//! order, so a written circuit always parses back.

use std::io::Write;

use crate::{Aig, AigEdge, AigError, AigNodeKind, NodeId, Result};

impl Aig {
    /// Writes the whole circuit in the .aag format.
    ///
    /// The header keeps the declared maximum variable index. Symbols and the
    /// comment section are written when present.
    pub fn write_aag(&self, out: &mut impl Write) -> Result<()> {
        writeln!(
            out,
            "aag {} {} 0 {} {}",
            self.max_var,
            self.inputs.len(),
            self.outputs.len(),
            self.n_dfs_ands
        )?;
        for &id in &self.inputs {
            writeln!(out, "{}", AigEdge::new(id, false).to_literal())?;
        }
        for index in 0..self.outputs.len() {
            let fanin = self
                .output_fanin(index)
                .ok_or(AigError::NodeDoesNotExist(self.max_var + 1 + index))?;
            writeln!(out, "{}", fanin.to_literal())?;
        }
        for &id in &self.dfs_list {
            if let AigNodeKind::And { fanin0, fanin1 } = self.node(id).kind() {
                writeln!(
                    out,
                    "{} {} {}",
                    2 * id,
                    fanin0.to_literal(),
                    fanin1.to_literal()
                )?;
            }
        }
        for (position, &id) in self.inputs.iter().enumerate() {
            if let Some(symbol) = self.node(id).symbol() {
                writeln!(out, "i{} {}", position, symbol)?;
            }
        }
        for (index, &id) in self.outputs.iter().enumerate() {
            if let Some(symbol) = self.node(id).symbol() {
                writeln!(out, "o{} {}", index, symbol)?;
            }
        }
        if let Some(comment) = &self.comment {
            writeln!(out, "c")?;
            writeln!(out, "{}", comment)?;
        }
        Ok(())
    }

    /// Writes the cone of a single node as a one output circuit.
    ///
    /// Header counts are derived from the cone: the maximum variable index
    /// referenced, the inputs in the cone (in declaration order) and its AND
    /// gates. When `id` is an output, its fanin cone is extracted and the output
    /// keeps its polarity and symbol.
    pub fn write_gate(&mut self, id: NodeId, out: &mut impl Write) -> Result<()> {
        let node = self.get_node(id).ok_or(AigError::NodeDoesNotExist(id))?;
        let (root, symbol) = match node.kind() {
            AigNodeKind::Output { fanin, symbol, .. } => (*fanin, symbol.clone()),
            _ => (AigEdge::new(id, false), None),
        };

        let cone = self.post_order(&[root.node]);
        let mut inputs: Vec<NodeId> = cone
            .iter()
            .copied()
            .filter(|&id| self.node(id).is_input())
            .collect();
        inputs.sort_by_key(|&id| self.input_position(id));
        let ands: Vec<NodeId> = cone
            .iter()
            .copied()
            .filter(|&id| self.node(id).is_and())
            .collect();
        // Undefined fanins are referenced without being listed.
        let max_var = cone
            .iter()
            .flat_map(|&id| {
                std::iter::once(id).chain(self.node(id).get_fanins().into_iter().map(|f| f.node))
            })
            .chain(std::iter::once(root.node))
            .max()
            .unwrap_or(0);

        writeln!(out, "aag {} {} 0 1 {}", max_var, inputs.len(), ands.len())?;
        for &id in &inputs {
            writeln!(out, "{}", 2 * id)?;
        }
        writeln!(out, "{}", root.to_literal())?;
        for &id in &ands {
            if let AigNodeKind::And { fanin0, fanin1 } = self.node(id).kind() {
                writeln!(
                    out,
                    "{} {} {}",
                    2 * id,
                    fanin0.to_literal(),
                    fanin1.to_literal()
                )?;
            }
        }
        for (position, &id) in inputs.iter().enumerate() {
            if let Some(symbol) = self.node(id).symbol() {
                writeln!(out, "i{} {}", position, symbol)?;
            }
        }
        if let Some(symbol) = symbol {
            writeln!(out, "o0 {}", symbol)?;
        }
        Ok(())
    }

    fn input_position(&self, id: NodeId) -> usize {
        match self.node(id).kind() {
            AigNodeKind::Input { position, .. } => *position,
            _ => usize::MAX,
        }
    }
}
