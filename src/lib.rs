pub mod aig;
pub mod cnf;
pub mod fec;
pub mod fraig;
pub mod sat;
pub mod sim;

// Re-exporting symbols and modules.
pub use aig::dfs;
pub use aig::{Aig, AigEdge, AigError, AigNode, AigNodeKind, FaninId, NodeId, Result};
