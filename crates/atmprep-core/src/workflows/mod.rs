//! The public, user-facing layer: complete preparation protocols assembled
//! from the engine layer's phases.

pub mod prep;
