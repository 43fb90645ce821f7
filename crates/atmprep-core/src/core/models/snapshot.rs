use serde::{Deserialize, Serialize};

/// Serialized simulation state enabling exact continuation: positions (Å),
/// velocities (Å/ps) and periodic box vectors (Å).
///
/// Written at the end of every phase and consumed exactly once by the next
/// phase; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub positions: Vec<[f64; 3]>,
    pub velocities: Vec<[f64; 3]>,
    pub box_vectors: [[f64; 3]; 3],
}

impl Snapshot {
    /// Number of particles in the snapshot.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// A snapshot is consistent when every particle carries both a position
    /// and a velocity.
    pub fn is_consistent(&self) -> bool {
        self.positions.len() == self.velocities.len()
    }
}
