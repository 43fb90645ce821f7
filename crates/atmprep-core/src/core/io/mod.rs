//! Durable outputs of a preparation run: checkpoints, structure snapshots,
//! and the per-cycle observable logs.

pub mod checkpoint;
pub mod cyclelog;
pub mod pdb;
