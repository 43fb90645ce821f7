/// Minimal per-atom metadata the engine exposes for structure snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomRecord {
    pub name: String,
    pub residue_name: String,
    pub residue_seq: i32,
    pub chain_id: char,
    pub element: String,
}

/// Atom metadata for the whole system, in engine atom-index order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Topology {
    pub atoms: Vec<AtomRecord>,
}

impl Topology {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}
